//! Ledger export.
//!
//! `POST /api/export-to-excel` merges the staged records into a copy of the
//! template and streams the new workbook back as a download.

mod start;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/export-to-excel";

/// Configures and returns the Actix scope for the export route.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(start::process))
}
