//! Operator console: the start page and the scanning screen.
//!
//! Responsibilities
//! - Load the staged list from the server on first render.
//! - Turn debounced detections from the `ScannerComponent` into submissions
//!   stamped with the operator, load and wagon fields.
//! - Trigger exports and save the returned workbook.

mod messages;
mod state;
mod update;
mod view;

use crate::api;
use gloo_timers::callback::Interval;
use yew::platform::spawn_local;
use yew::prelude::*;

pub use messages::Msg;
pub use state::Console;

const CLOCK_TICK_MS: u32 = 1000;

impl Component for Console {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let mut console = Console::new();
        let link = ctx.link().clone();
        console.ticker = Some(Interval::new(CLOCK_TICK_MS, move || {
            link.send_message(Msg::Tick)
        }));
        console
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            let link = ctx.link().clone();
            spawn_local(async move {
                match api::fetch_staged().await {
                    Ok(records) => link.send_message(Msg::StagedLoaded(records)),
                    Err(err) => link.send_message(Msg::Failed(err.to_string())),
                }
            });
        }
    }
}
