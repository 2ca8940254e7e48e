//! Scan ingestion.
//!
//! `POST /api/scan` turns a client submission into a canonical `ScanRecord`
//! and appends it to the staging store. The handler never deduplicates;
//! repeated detections are filtered on the client before they get here.

mod submit;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/scan";

/// Configures and returns the Actix scope for scan ingestion.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(submit::process))
}
