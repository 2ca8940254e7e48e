use super::CaptureEvent;

/// Default suppression window for repeated identical detections.
pub const DEFAULT_WINDOW_MS: u64 = 1500;

/// Suppresses re-detections of the same label from a continuous scan stream.
///
/// An event `(text, now)` passes when `text` is non-empty and either differs
/// from the last accepted text or arrives more than `window_ms` after it.
/// Accepting an event makes it the new reference point.
///
/// Applying two debouncers with the same window in sequence forwards exactly
/// the events a single one would, so the capture layer and the submission
/// layer can each keep their own.
///
/// Time is passed in as Unix milliseconds so callers decide which clock to use.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    last: Option<(String, u64)>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last: None,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Returns `true` when `text` should be forwarded downstream.
    pub fn accept(&mut self, text: &str, now_ms: u64) -> bool {
        if text.is_empty() {
            return false;
        }
        if let Some((last_text, last_time)) = &self.last {
            // a clock that moved backwards counts as "still inside the window"
            if last_text == text && now_ms.saturating_sub(*last_time) <= self.window_ms {
                return false;
            }
        }
        self.last = Some((text.to_string(), now_ms));
        true
    }

    /// Applies [`Debouncer::accept`] to the text carried by a capture event.
    pub fn filter(&mut self, event: &CaptureEvent, now_ms: u64) -> Option<String> {
        let text = event.text.as_deref()?;
        self.accept(text, now_ms).then(|| text.to_string())
    }

    /// Forgets the last accepted detection.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
