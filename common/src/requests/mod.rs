use serde::{Deserialize, Serialize};

/// Body of `POST /api/scan`.
///
/// Every field is optional at the wire level; the backend rejects the
/// submission when `serial` is missing or blank and fills in defaults for
/// `stage`, `operator` and `timestamp`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanSubmission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wagon1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wagon2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wagon3: Option<String>,
}

impl ScanSubmission {
    pub fn with_serial(serial: impl Into<String>) -> Self {
        Self {
            serial: Some(serial.into()),
            ..Self::default()
        }
    }
}
