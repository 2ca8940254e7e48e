//! Vocabulary for the continuous barcode capture stream.
//!
//! The browser decoder (see the frontend's `scanner` module) reports one
//! `CaptureEvent` per analysed frame: either a detected text, an error, or
//! neither. Most frames of a label held in view produce the same text, which
//! is why every consumer routes events through a [`Debouncer`] before
//! submitting anything.

mod debounce;

pub use debounce::{Debouncer, DEFAULT_WINDOW_MS};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A selectable capture device as reported by the enumeration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Opaque identifier passed back when subscribing.
    pub id: String,
    /// Human-readable label; may be empty before camera permission is granted.
    pub label: String,
}

impl DeviceInfo {
    /// The label shown in the device picker, falling back to a short id.
    pub fn display_name(&self) -> String {
        if self.label.is_empty() {
            let short: String = self.id.chars().take(6).collect();
            format!("Camera {}", short)
        } else {
            self.label.clone()
        }
    }
}

/// Failures raised by the capture collaborator.
///
/// None of these are fatal to ingestion or export; they only change the
/// scanner's status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The decoder found no code in the current frame.
    #[error("no code in frame")]
    NotFound,
    #[error("Camera permission denied: {0}")]
    Permission(String),
    #[error("Camera list error: {0}")]
    Enumeration(String),
    #[error("Start error: {0}")]
    Start(String),
    #[error("{0}")]
    Decode(String),
    #[error("Torch not supported on this camera")]
    TorchUnsupported,
    #[error("Torch error: {0}")]
    Torch(String),
}

impl CaptureError {
    /// Errors that happen on nearly every frame and should not be shown.
    pub fn is_benign(&self) -> bool {
        matches!(self, CaptureError::NotFound)
    }
}

/// One callback invocation of the decoder loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureEvent {
    pub text: Option<String>,
    pub error: Option<CaptureError>,
}

impl CaptureEvent {
    pub fn detected(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(error: CaptureError) -> Self {
        Self {
            text: None,
            error: Some(error),
        }
    }

    /// Status line for the scanner view after this event.
    pub fn status(&self) -> String {
        match &self.error {
            Some(err) if !err.is_benign() => err.to_string(),
            _ => "Scanning…".to_string(),
        }
    }
}
