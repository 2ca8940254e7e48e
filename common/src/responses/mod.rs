use crate::model::scan::ScanRecord;
use serde::{Deserialize, Serialize};

/// `{ ok: true, record }` returned by `POST /api/scan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanAccepted {
    pub ok: bool,
    pub record: ScanRecord,
}

/// Plain acknowledgement, e.g. for `POST /api/staged/clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}

/// Returned by `POST /api/upload-template` with the path the template was stored at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStored {
    pub ok: bool,
    pub path: String,
}

/// Error body for every rejected request.
///
/// `details` carries the underlying cause for server-side failures (export)
/// and is omitted for client-correctable rejections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}
