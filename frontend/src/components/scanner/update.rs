//! Update function for the scanner component.

use super::messages::Msg;
use super::state::ScannerComponent;
use crate::capture::ScanSession;
use crate::helpers::now_ms;
use gloo_console::{log, warn};
use web_sys::HtmlVideoElement;
use yew::platform::spawn_local;
use yew::prelude::*;

pub fn update(component: &mut ScannerComponent, ctx: &Context<ScannerComponent>, msg: Msg) -> bool {
    match msg {
        Msg::DevicesLoaded(Ok(devices)) => {
            if component.device_id.is_none() {
                component.device_id = devices.first().map(|d| d.id.clone());
            }
            log!(format!("{} camera(s) available", devices.len()));
            component.devices = devices;
            true
        }
        Msg::DevicesLoaded(Err(err)) => {
            warn!(err.to_string());
            component.message = err.to_string();
            true
        }
        Msg::SelectDevice(id) => {
            component.device_id = Some(id).filter(|id| !id.is_empty());
            if component.active() {
                component.stop();
                start(component, ctx);
            }
            true
        }
        Msg::Toggle => {
            if component.starting {
                return false;
            }
            if component.active() {
                component.stop();
            } else {
                start(component, ctx);
            }
            true
        }
        Msg::Started(session) => {
            if component.starting {
                component.session = Some(session);
                component.starting = false;
                component.message = "Scanning…".to_string();
            }
            // A session that arrives after stop is dropped here, which releases it.
            true
        }
        Msg::StartFailed(err) => {
            component.starting = false;
            component.message = err.to_string();
            true
        }
        Msg::Captured(event) => {
            if let Some(text) = component.debouncer.filter(&event, now_ms()) {
                ctx.props().on_detected.emit(text);
            }
            let status = event.status();
            if status != component.message {
                component.message = status;
                return true;
            }
            false
        }
        Msg::ToggleTorch => {
            if let Some(torch) = component.session.as_ref().and_then(|s| s.torch()) {
                let target = !component.torch_on;
                let link = ctx.link().clone();
                spawn_local(async move {
                    link.send_message(Msg::TorchChanged(torch.set(target).await));
                });
            }
            false
        }
        Msg::TorchChanged(Ok(on)) => {
            component.torch_on = on;
            true
        }
        Msg::TorchChanged(Err(err)) => {
            component.message = err.to_string();
            true
        }
    }
}

fn start(component: &mut ScannerComponent, ctx: &Context<ScannerComponent>) {
    let Some(video) = component.video_ref.cast::<HtmlVideoElement>() else {
        return;
    };
    component.starting = true;
    component.message = "Starting camera…".to_string();

    let link = ctx.link().clone();
    let on_event = ctx.link().callback(Msg::Captured);
    let device_id = component.device_id.clone();
    spawn_local(async move {
        match ScanSession::start(device_id, video, on_event).await {
            Ok(session) => link.send_message(Msg::Started(session)),
            Err(err) => link.send_message(Msg::StartFailed(err)),
        }
    });
}
