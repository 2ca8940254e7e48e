//! Runtime state of the scanner component.

use crate::capture::ScanSession;
use common::capture::{Debouncer, DeviceInfo};
use yew::prelude::*;

pub struct ScannerComponent {
    pub devices: Vec<DeviceInfo>,
    /// Selected camera; `None` lets the browser pick.
    pub device_id: Option<String>,
    /// The running decode loop. Dropping it releases the camera.
    pub session: Option<ScanSession>,
    pub starting: bool,
    pub torch_on: bool,
    /// Status line shown next to the controls.
    pub message: String,
    /// Capture-layer duplicate filter.
    pub debouncer: Debouncer,
    pub video_ref: NodeRef,
}

impl ScannerComponent {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            device_id: None,
            session: None,
            starting: false,
            torch_on: false,
            message: "Idle".to_string(),
            debouncer: Debouncer::default(),
            video_ref: NodeRef::default(),
        }
    }

    pub fn active(&self) -> bool {
        self.session.is_some()
    }

    /// Stops the running session, if any.
    pub fn stop(&mut self) {
        self.session = None;
        self.starting = false;
        self.torch_on = false;
        self.debouncer.reset();
        self.message = "Stopped".to_string();
    }
}
