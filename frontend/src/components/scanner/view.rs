use super::messages::Msg;
use super::state::ScannerComponent;
use web_sys::HtmlSelectElement;
use yew::prelude::*;

pub fn view(component: &ScannerComponent, ctx: &Context<ScannerComponent>) -> Html {
    let link = ctx.link();
    let active = component.active();
    let selected = component.device_id.clone().unwrap_or_default();

    let on_select = link.callback(|e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        Msg::SelectDevice(select.value())
    });

    html! {
        <div class="scanner">
            <div class="scanner-controls">
                <select class="input" onchange={on_select} disabled={active || component.starting}>
                    {
                        for component.devices.iter().map(|d| html! {
                            <option value={d.id.clone()} selected={d.id == selected}>
                                { d.display_name() }
                            </option>
                        })
                    }
                    if component.devices.is_empty() {
                        <option value="">{"No cameras found"}</option>
                    }
                </select>
                <button class="btn" onclick={link.callback(|_| Msg::Toggle)} disabled={component.starting}>
                    { if active { "Stop Scanner" } else { "Start Scanner" } }
                </button>
                <button class="btn" onclick={link.callback(|_| Msg::ToggleTorch)} disabled={!active}>
                    { if component.torch_on { "Torch Off" } else { "Torch On" } }
                </button>
                <span class="status">{ &component.message }</span>
            </div>

            <div class="scanner-frame">
                <video ref={component.video_ref.clone()} muted=true playsinline=true />
                <div class="scanner-overlay" />
            </div>

            <div class="status hint">
                {"Tip: if the camera fails to start on iPhone, ensure you are using HTTPS and granted camera permissions."}
            </div>
        </div>
    }
}
