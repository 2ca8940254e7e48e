//! # Template Service Module
//!
//! Stores the macro-enabled master workbook every export starts from.
//!
//! ## Sub-modules:
//! - `upload`: Accepts a multipart `.xlsm` upload, checks that it opens as a
//!   workbook and moves it into the well-known template location.

mod upload;

use actix_web::web::{post, scope};
use actix_web::Scope;

/// The path of the template upload endpoint.
const API_PATH: &str = "/api/upload-template";

/// Configures and returns the Actix `Scope` for template routes.
///
/// # Registered Routes:
///
/// *   **`POST /api/upload-template`**:
///     - **Handler**: `upload::process`
///     - **Description**: Expects a multipart form with a `template` file field
///       ending in `.xlsm`. The stored template replaces any previous one and
///       the response carries the path it was written to.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(upload::process))
}
