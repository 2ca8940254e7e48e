//! HTTP surface of the ledger backend.
//!
//! Every endpoint family lives in its own submodule and exposes a
//! `configure_routes()` returning an Actix `Scope` rooted at its full path:
//!
//! - `POST /api/scan`: [`scans`]
//! - `GET /api/staged`, `POST /api/staged/clear`: [`staged`]
//! - `POST /api/upload-template`: [`templates`]
//! - `POST /api/export-to-excel`: [`export`]

/// Builds a fully wired test service from a store and a config. Visible to
/// the endpoint modules declared below it.
#[cfg(test)]
macro_rules! test_app {
    ($store:expr, $config:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .configure(|cfg| crate::services::configure(cfg, $store, $config)),
        )
        .await
    };
}

pub mod export;
pub mod scans;
pub mod staged;
pub mod templates;

use crate::config::AppConfig;
use crate::error::LedgerError;
use crate::staging::StagingStore;
use actix_web::web;

/// JSON extractor settings shared by every endpoint.
///
/// Malformed bodies are reported through [`LedgerError::Validation`] so they
/// get the same `{error}` body as other rejections.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            log::warn!("Rejected JSON body: {}", err);
            LedgerError::validation(format!("Invalid JSON body: {}", err)).into()
        })
}

/// Registers the shared state and every API scope on an application.
pub fn configure(cfg: &mut web::ServiceConfig, store: StagingStore, config: AppConfig) {
    cfg.app_data(json_config(config.json_limit))
        .app_data(web::Data::new(store))
        .app_data(web::Data::new(config))
        .service(scans::configure_routes())
        .service(staged::configure_routes())
        .service(templates::configure_routes())
        .service(export::configure_routes());
}
