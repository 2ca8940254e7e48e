//! Browser barcode capture.
//!
//! Thin bindings over the `@zxing/browser` bundle loaded by `index.html`
//! (global `ZXingBrowser`). The decoder calls back once per analysed frame;
//! each call is turned into a [`CaptureEvent`] and delivered to a Yew
//! callback until the owning [`ScanSession`] is stopped or dropped.

use common::capture::{CaptureError, CaptureEvent, DeviceInfo};
use js_sys::{Array, Function, Object, Promise, Reflect};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamTrack};
use yew::Callback;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ZXingBrowser)]
    type BrowserMultiFormatReader;

    #[wasm_bindgen(constructor, js_namespace = ZXingBrowser)]
    fn new() -> BrowserMultiFormatReader;

    #[wasm_bindgen(
        static_method_of = BrowserMultiFormatReader,
        js_namespace = ZXingBrowser,
        js_name = listVideoInputDevices,
        catch
    )]
    fn list_video_input_devices() -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, js_name = decodeFromVideoDevice, catch)]
    fn decode_from_video_device(
        this: &BrowserMultiFormatReader,
        device_id: Option<String>,
        video: &HtmlVideoElement,
        callback: &Function,
    ) -> Result<Promise, JsValue>;

    /// Returned by `decodeFromVideoDevice` once the camera is running.
    type ScannerControls;

    #[wasm_bindgen(method)]
    fn stop(this: &ScannerControls);
}

const NOT_FOUND_EXCEPTION: &str = "NotFoundException";

fn js_message(value: &JsValue) -> String {
    Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .filter(|m| !m.is_empty())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn js_name(value: &JsValue) -> Option<String> {
    Reflect::get(value, &JsValue::from_str("name"))
        .ok()
        .and_then(|n| n.as_string())
}

fn string_prop(value: &JsValue, key: &str) -> String {
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}

/// Lists the cameras the browser exposes.
pub async fn list_devices() -> Result<Vec<DeviceInfo>, CaptureError> {
    let enumeration = |e: JsValue| CaptureError::Enumeration(js_message(&e));
    let promise = BrowserMultiFormatReader::list_video_input_devices().map_err(enumeration)?;
    let devices = JsFuture::from(promise).await.map_err(enumeration)?;

    Ok(Array::from(&devices)
        .iter()
        .map(|d| DeviceInfo {
            id: string_prop(&d, "deviceId"),
            label: string_prop(&d, "label"),
        })
        .collect())
}

/// Maps one decoder callback to a capture event.
fn capture_event(result: &JsValue, error: &JsValue) -> CaptureEvent {
    let text = if result.is_null() || result.is_undefined() {
        None
    } else {
        Reflect::get(result, &JsValue::from_str("getText"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .and_then(|f| f.call0(result).ok())
            .and_then(|t| t.as_string())
    };

    let error = if error.is_null() || error.is_undefined() {
        None
    } else if js_name(error).as_deref() == Some(NOT_FOUND_EXCEPTION) {
        Some(CaptureError::NotFound)
    } else {
        Some(CaptureError::Decode(js_message(error)))
    };

    CaptureEvent { text, error }
}

/// Torch control for the running camera track.
#[derive(Clone)]
pub struct Torch {
    track: MediaStreamTrack,
}

impl Torch {
    pub fn supported(&self) -> bool {
        Reflect::get(&self.track, &JsValue::from_str("getCapabilities"))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .and_then(|f| f.call0(&self.track).ok())
            .map(|caps| Reflect::has(&caps, &JsValue::from_str("torch")).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Switches the torch and returns the new state.
    pub async fn set(self, on: bool) -> Result<bool, CaptureError> {
        if !self.supported() {
            return Err(CaptureError::TorchUnsupported);
        }
        let torch_error = |e: JsValue| CaptureError::Torch(js_message(&e));

        let setting = Object::new();
        Reflect::set(&setting, &JsValue::from_str("torch"), &JsValue::from_bool(on))
            .map_err(torch_error)?;
        let constraints = Object::new();
        Reflect::set(
            &constraints,
            &JsValue::from_str("advanced"),
            &Array::of1(&setting),
        )
        .map_err(torch_error)?;

        let apply = Reflect::get(&self.track, &JsValue::from_str("applyConstraints"))
            .and_then(|f| f.dyn_into::<Function>())
            .map_err(torch_error)?;
        let promise: Promise = apply
            .call1(&self.track, &constraints)
            .map_err(torch_error)?
            .unchecked_into();
        JsFuture::from(promise).await.map_err(torch_error)?;
        Ok(on)
    }
}

/// A running decode loop bound to one camera.
///
/// Stopping or dropping the session halts event delivery immediately and
/// releases the camera track.
pub struct ScanSession {
    controls: ScannerControls,
    track: Option<MediaStreamTrack>,
    live: Rc<Cell<bool>>,
    _callback: Closure<dyn FnMut(JsValue, JsValue, JsValue)>,
}

impl ScanSession {
    /// Starts decoding from `device_id` (or the default camera) into `video`.
    pub async fn start(
        device_id: Option<String>,
        video: HtmlVideoElement,
        on_event: Callback<CaptureEvent>,
    ) -> Result<Self, CaptureError> {
        let live = Rc::new(Cell::new(true));
        let callback = {
            let live = live.clone();
            Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(
                move |result: JsValue, error: JsValue, _controls: JsValue| {
                    if live.get() {
                        on_event.emit(capture_event(&result, &error));
                    }
                },
            )
        };

        let start_error = |e: JsValue| {
            if js_name(&e).as_deref() == Some("NotAllowedError") {
                CaptureError::Permission(js_message(&e))
            } else {
                CaptureError::Start(js_message(&e))
            }
        };

        let reader = BrowserMultiFormatReader::new();
        let promise = reader
            .decode_from_video_device(device_id, &video, callback.as_ref().unchecked_ref())
            .map_err(|e| {
                live.set(false);
                start_error(e)
            })?;
        let controls: ScannerControls = match JsFuture::from(promise).await {
            Ok(controls) => controls.unchecked_into(),
            Err(e) => {
                live.set(false);
                return Err(start_error(e));
            }
        };

        let track = video
            .src_object()
            .and_then(|s: MediaStream| s.get_video_tracks().get(0).dyn_into::<MediaStreamTrack>().ok());

        Ok(Self {
            controls,
            track,
            live,
            _callback: callback,
        })
    }

    /// Torch handle, when the session knows its camera track.
    pub fn torch(&self) -> Option<Torch> {
        self.track.clone().map(|track| Torch { track })
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.live.set(false);
        self.controls.stop();
        if let Some(track) = self.track.take() {
            track.stop();
        }
    }
}
