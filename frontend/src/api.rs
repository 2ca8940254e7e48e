//! Typed client for the ledger backend's `/api/*` endpoints.
//!
//! Every call resolves to a `Result`; rejections carry the server's `{error}`
//! message so the caller can show it as status text.

use common::model::scan::ScanRecord;
use common::requests::ScanSubmission;
use common::responses::{Ack, ErrorBody, ScanAccepted};
use gloo_net::http::{Request, Response};

const SCAN_URL: &str = "/api/scan";
const STAGED_URL: &str = "/api/staged";
const CLEAR_URL: &str = "/api/staged/clear";
const EXPORT_URL: &str = "/api/export-to-excel";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-success status; carries its message.
    #[error("{0}")]
    Rejected(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// A file returned by the export endpoint.
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn network(err: gloo_net::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

fn decode(err: gloo_net::Error) -> ApiError {
    ApiError::Decode(err.to_string())
}

/// Turns a non-2xx response into `ApiError::Rejected`.
async fn check(response: Response) -> Result<Response, ApiError> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Rejected(rejection_message(status, &text)))
}

/// Best-effort human message from an error response body.
pub fn rejection_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error,
            details: Some(details),
        }) => format!("{}: {}", error, details),
        Ok(ErrorBody { error, .. }) => error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => format!("Request failed with status {}", status),
    }
}

/// `POST /api/scan`; returns the record as stored by the server.
pub async fn submit_scan(submission: &ScanSubmission) -> Result<ScanRecord, ApiError> {
    let response = Request::post(SCAN_URL)
        .json(submission)
        .map_err(decode)?
        .send()
        .await
        .map_err(network)?;
    let accepted: ScanAccepted = check(response).await?.json().await.map_err(decode)?;
    Ok(accepted.record)
}

/// `GET /api/staged`
pub async fn fetch_staged() -> Result<Vec<ScanRecord>, ApiError> {
    let response = Request::get(STAGED_URL).send().await.map_err(network)?;
    check(response).await?.json().await.map_err(decode)
}

/// `POST /api/staged/clear`
pub async fn clear_staged() -> Result<(), ApiError> {
    let response = Request::post(CLEAR_URL).send().await.map_err(network)?;
    let _: Ack = check(response).await?.json().await.map_err(decode)?;
    Ok(())
}

/// `POST /api/export-to-excel`; `fallback_name` is used when the server does
/// not name the attachment.
pub async fn export_ledger(fallback_name: String) -> Result<Download, ApiError> {
    let response = Request::post(EXPORT_URL).send().await.map_err(network)?;
    let response = check(response).await?;
    let file_name = response
        .headers()
        .get("content-disposition")
        .and_then(|h| attachment_name(&h))
        .unwrap_or(fallback_name);
    let bytes = response.binary().await.map_err(decode)?;
    Ok(Download { file_name, bytes })
}

/// Extracts the `filename` parameter of a `Content-Disposition` header.
pub fn attachment_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_quoted_and_bare_file_names() {
        assert_eq!(
            attachment_name("attachment; filename=\"Master_1757837702123.xlsm\""),
            Some("Master_1757837702123.xlsm".to_string())
        );
        assert_eq!(
            attachment_name("attachment; filename=Master_1.xlsm"),
            Some("Master_1.xlsm".to_string())
        );
        assert_eq!(attachment_name("attachment"), None);
    }

    #[test]
    fn rejection_prefers_the_server_message() {
        assert_eq!(
            rejection_message(400, r#"{"error":"serial required"}"#),
            "serial required"
        );
        assert_eq!(
            rejection_message(500, r#"{"error":"Export failed","details":"disk full"}"#),
            "Export failed: disk full"
        );
        assert_eq!(rejection_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(rejection_message(503, ""), "Request failed with status 503");
    }

    #[test]
    fn rejections_display_the_server_message() {
        let err = ApiError::Rejected(rejection_message(400, r#"{"error":"serial required"}"#));
        assert_eq!(err.to_string(), "serial required");
    }
}
