//! Browser utilities shared by the components.
//!
//! - **Clock**: epoch milliseconds for the debouncers, ISO timestamps for
//!   submissions and locale strings for the start page and staged list.
//! - **Downloads**: saving exported bytes through a temporary object URL.
//! - **User Feedback**: short-lived toast notifications.

use js_sys::{Array, Date, Uint8Array};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, HtmlElement, Url};

pub const XLSM_MIME: &str = "application/vnd.ms-excel.sheet.macroEnabled.12";

pub fn now_ms() -> u64 {
    Date::now() as u64
}

/// Current instant as `2025-09-14T08:15:02.123Z`.
pub fn iso_now() -> String {
    String::from(Date::new_0().to_iso_string())
}

/// Locale-formatted `(date, time)` for display.
pub fn local_date_time() -> (String, String) {
    let now = Date::new_0();
    let locale = JsValue::UNDEFINED;
    (
        String::from(now.to_locale_date_string("default", &locale)),
        String::from(now.to_locale_time_string("default")),
    )
}

/// A stored ISO timestamp in the browser's locale, e.g. `9/14/2025, 8:15:02 AM`.
/// Text the browser cannot parse is shown as it is.
pub fn local_timestamp(iso: &str) -> String {
    let date = Date::new(&JsValue::from_str(iso));
    if date.get_time().is_nan() {
        return iso.to_string();
    }
    String::from(date.to_locale_string("default", &JsValue::UNDEFINED))
}

/// Fallback name matching the server's `Master_<unix-ms>.xlsm` scheme.
pub fn default_export_name() -> String {
    format!("Master_{}.xlsm", now_ms())
}

/// Hands `bytes` to the browser as a file download.
pub fn save_file(file_name: &str, bytes: &[u8]) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let parts = Array::of1(&Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(XLSM_MIME);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.unchecked_into();
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Url::revoke_object_url(&url)
}

/// Displays a temporary notification message at the bottom of the screen.
pub fn show_toast(message: &str) {
    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
        if let (Ok(toast), Some(body)) = (document.create_element("div"), document.body()) {
            toast.set_text_content(Some(message));
            let html_toast: HtmlElement = toast.unchecked_into();
            html_toast.set_class_name("toast");

            if body.append_child(&html_toast).is_ok() {
                wasm_bindgen_futures::spawn_local(async move {
                    gloo_timers::future::TimeoutFuture::new(3000).await;
                    if let Some(parent) = html_toast.parent_node() {
                        parent.remove_child(&html_toast).ok();
                    }
                });
            }
        }
    }
}
