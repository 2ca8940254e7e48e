mod config;
mod error;
mod ledger;
mod services;
mod staging;

use crate::config::AppConfig;
use crate::staging::StagingStore;
use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;

/// Serves the built frontend, falling back to `index.html` for client-side routes.
fn configure_static(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    let index = static_dir.join("index.html");
    cfg.service(
        Files::new("/", static_dir)
            .index_file("index.html")
            .default_handler(fn_service(move |req: ServiceRequest| {
                let index = index.clone();
                async move {
                    let (req, _) = req.into_parts();
                    let file = NamedFile::open_async(index).await?;
                    let res = file.into_response(&req);
                    Ok(ServiceResponse::new(req, res))
                }
            })),
    );
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    config::ensure_dirs(&config)?;

    let template = config.template_path();
    if template.is_file() {
        info!("Using template {}", template.display());
    } else {
        warn!(
            "No template at {}; exports fail until one is uploaded",
            template.display()
        );
    }

    let serve_static = config.static_dir.join("index.html").is_file();
    if !serve_static {
        warn!(
            "Frontend bundle not found in {}; serving the API only",
            config.static_dir.display()
        );
    }

    // One store for the whole process, shared by every worker.
    let store = StagingStore::new();
    let (host, port) = config.bind_addr();
    let (host, port) = (host.to_string(), port);
    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        let static_dir = config.static_dir.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .configure(|cfg| services::configure(cfg, store.clone(), config.clone()))
            .configure(|cfg| {
                if serve_static {
                    configure_static(cfg, static_dir);
                }
            })
    })
    .bind((host, port))?
    .run()
    .await
}
