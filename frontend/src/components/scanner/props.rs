use yew::prelude::*;

/// Properties for the `ScannerComponent`.
#[derive(Properties, PartialEq, Clone)]
pub struct ScannerProps {
    /// Receives each detected code once per debounce window.
    pub on_detected: Callback<String>,
}
