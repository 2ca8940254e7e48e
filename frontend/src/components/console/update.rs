//! Update function for the console.
//!
//! Network calls run in `spawn_local` and report back through messages;
//! failures end up in the status line instead of blocking dialogs.

use super::messages::{Msg, View};
use super::state::{Console, READY};
use crate::api;
use crate::helpers::{default_export_name, iso_now, local_date_time, now_ms, save_file, show_toast};
use gloo_console::{error, log};
use yew::platform::spawn_local;
use yew::prelude::*;

pub fn update(console: &mut Console, ctx: &Context<Console>, msg: Msg) -> bool {
    match msg {
        Msg::Show(view) => {
            console.view = view;
            true
        }
        Msg::Tick => {
            let clock = local_date_time();
            if clock != console.clock {
                console.clock = clock;
                return console.view == View::Home;
            }
            false
        }
        Msg::Edit(field, value) => {
            console.set_field(field, value);
            true
        }
        Msg::Detected(serial) => {
            if !console.submissions.accept(&serial, now_ms()) {
                return false;
            }
            let submission = console.submission(serial, iso_now());
            console.status = "Saving scan...".to_string();
            let link = ctx.link().clone();
            spawn_local(async move {
                match api::submit_scan(&submission).await {
                    Ok(record) => link.send_message(Msg::ScanSaved(record)),
                    Err(err) => link.send_message(Msg::Failed(err.to_string())),
                }
            });
            true
        }
        Msg::ScanSaved(record) => {
            log!(format!("Staged {}", record.serial));
            console.staged.push(record);
            console.status = READY.to_string();
            true
        }
        Msg::StagedLoaded(records) => {
            console.staged = records;
            true
        }
        Msg::Export => {
            console.status = "Exporting...".to_string();
            let link = ctx.link().clone();
            spawn_local(async move {
                let result = api::export_ledger(default_export_name()).await;
                match result {
                    Ok(download) => match save_file(&download.file_name, &download.bytes) {
                        Ok(()) => link.send_message(Msg::Exported(download.file_name)),
                        Err(e) => link.send_message(Msg::Failed(format!("Download failed: {:?}", e))),
                    },
                    Err(err) => link.send_message(Msg::Failed(err.to_string())),
                }
            });
            true
        }
        Msg::Exported(file_name) => {
            show_toast(&format!("Saved {}", file_name));
            console.status = READY.to_string();
            true
        }
        Msg::Clear => {
            console.status = "Clearing...".to_string();
            let link = ctx.link().clone();
            spawn_local(async move {
                match api::clear_staged().await {
                    Ok(()) => link.send_message(Msg::Cleared),
                    Err(err) => link.send_message(Msg::Failed(err.to_string())),
                }
            });
            true
        }
        Msg::Cleared => {
            console.staged.clear();
            console.status = READY.to_string();
            true
        }
        Msg::Failed(message) => {
            error!(message.clone());
            console.status = message;
            true
        }
    }
}
