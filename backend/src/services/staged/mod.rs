//! Read and reset the staging store.
//!
//! - `GET /api/staged`: every staged record, in insertion order.
//! - `POST /api/staged/clear`: drops all staged records; `{ok: true}`.

use crate::staging::StagingStore;
use actix_web::web::{get, post, scope};
use actix_web::{web, HttpResponse, Responder, Scope};
use common::responses::Ack;
use log::info;

const API_PATH: &str = "/api/staged";

/// Configures and returns the Actix scope for the staged-record routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("/clear", post().to(clear))
}

async fn list(store: web::Data<StagingStore>) -> impl Responder {
    HttpResponse::Ok().json(store.list().await)
}

async fn clear(store: web::Data<StagingStore>) -> impl Responder {
    let dropped = store.len().await;
    store.clear().await;
    info!("Cleared {} staged record(s)", dropped);
    HttpResponse::Ok().json(Ack::OK)
}
