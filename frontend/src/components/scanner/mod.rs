//! Camera scanner: device picker, start/stop, torch and the live preview.
//!
//! Decoded frames are filtered through a capture-layer `Debouncer` before
//! `on_detected` fires, so a label held in front of the camera produces one
//! detection per window instead of one per frame.

mod messages;
mod props;
mod state;
mod update;
mod view;

use crate::capture;
use yew::platform::spawn_local;
use yew::prelude::*;

pub use messages::Msg;
pub use props::ScannerProps;
pub use state::ScannerComponent;

impl Component for ScannerComponent {
    type Message = Msg;
    type Properties = ScannerProps;

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        spawn_local(async move {
            link.send_message(Msg::DevicesLoaded(capture::list_devices().await));
        });
        ScannerComponent::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.session = None;
    }
}
