use super::messages::{Field, Msg, View};
use super::state::Console;
use crate::components::scanner::ScannerComponent;
use crate::helpers::local_timestamp;
use common::model::scan::ScanRecord;
use web_sys::HtmlInputElement;
use yew::prelude::*;

const BRAND: &str = "Rail Inventory";

pub fn view(console: &Console, ctx: &Context<Console>) -> Html {
    match console.view {
        View::Home => home(console, ctx),
        View::Scan => scan(console, ctx),
    }
}

fn header(console: &Console, ctx: &Context<Console>, badge: &str) -> Html {
    let back = (console.view == View::Scan).then(|| {
        html! {
            <button class="btn" onclick={ctx.link().callback(|_| Msg::Show(View::Home))}>
                {"← Back"}
            </button>
        }
    });
    html! {
        <header class="app-header">
            <div class="container header-row">
                <div class="header-brand">
                    { for back }
                    <span class="brand">{ BRAND }</span>
                    <span class="badge">{ badge }</span>
                </div>
                <div class="status">{ format!("Status: {}", console.status) }</div>
            </div>
        </header>
    }
}

fn footer() -> Html {
    html! {
        <footer class="footer">
            <div class="footer-inner">
                <span>{ format!("{} • Ledger console", BRAND) }</span>
            </div>
        </footer>
    }
}

fn home(console: &Console, ctx: &Context<Console>) -> Html {
    let link = ctx.link();
    let (date, time) = &console.clock;
    let operator = if console.operator.trim().is_empty() {
        "Operator"
    } else {
        console.operator.as_str()
    };

    html! {
        <>
            { header(console, ctx, "Start") }
            <main class="container">
                <div class="grid">
                    <section class="card actions">
                        <h3>{"Quick Actions"}</h3>
                        <div class="card action">
                            <div>
                                <div class="action-title">{"Scan Rails / Barcodes"}</div>
                                <div class="status">{"Open the camera scanner to capture serials into the staging list."}</div>
                            </div>
                            <button class="btn" onclick={link.callback(|_| Msg::Show(View::Scan))}>{"Start Scanning"}</button>
                        </div>
                        <div class="card action">
                            <div>
                                <div class="action-title">{"Export Master Excel"}</div>
                                <div class="status">{"Append staged scans to the macro-enabled workbook and download."}</div>
                            </div>
                            <button class="btn" onclick={link.callback(|_| Msg::Export)}>{"Export Excel"}</button>
                        </div>
                    </section>
                    <aside class="card welcome">
                        <div class="greeting">{ format!("Hi {}, welcome back", operator) }</div>
                        <div class="card clock">
                            <div class="status">{"Current Date"}</div>
                            <div class="clock-date">{ date }</div>
                            <div class="status">{"Local Time"}</div>
                            <div class="clock-time">{ time }</div>
                        </div>
                        <div class="status">{ format!("{} scan(s) staged", console.staged.len()) }</div>
                    </aside>
                </div>
            </main>
            { footer() }
        </>
    }
}

fn input(console: &Console, ctx: &Context<Console>, field: Field, label: &str, placeholder: &str) -> Html {
    let oninput = ctx.link().callback(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::Edit(field, input.value())
    });
    html! {
        <div>
            <label class="status">{ label }</label>
            <input class="input" value={console.field(field).to_string()} {oninput} placeholder={placeholder.to_string()} />
        </div>
    }
}

fn staged_item(record: &ScanRecord) -> Html {
    let context = record.has_context().then(|| {
        let or_dash = |v: &Option<String>| v.clone().filter(|v| !v.is_empty()).unwrap_or_else(|| "-".to_string());
        html! {
            <div>
                { format!(
                    "Load: {} | W1: {} | W2: {} | W3: {}",
                    or_dash(&record.load_id),
                    or_dash(&record.wagon1),
                    or_dash(&record.wagon2),
                    or_dash(&record.wagon3)
                ) }
            </div>
        }
    });
    html! {
        <div class="item">
            <div class="serial">{ &record.serial }</div>
            <div class="meta">
                { format!("{} • {} • {}", record.stage, record.operator, local_timestamp(&record.timestamp)) }
                { for context }
            </div>
        </div>
    }
}

fn scan(console: &Console, ctx: &Context<Console>) -> Html {
    let link = ctx.link();
    let on_detected = link.callback(Msg::Detected);

    html! {
        <div class="app">
            { header(console, ctx, "Scan") }
            <main class="container">
                <div class="grid">
                    <section class="card">
                        <h3>{"Scanner"}</h3>
                        <ScannerComponent {on_detected} />
                    </section>

                    <section class="card">
                        <h3>{"Controls"}</h3>
                        <div class="grid two">
                            { input(console, ctx, Field::LoadId, "Load ID", "e.g. L-2025-09-001") }
                            { input(console, ctx, Field::Operator, "Operator", "") }
                            { input(console, ctx, Field::Wagon1, "Wagon 1 (Serial)", "e.g. NPS-00123") }
                            { input(console, ctx, Field::Wagon2, "Wagon 2 (Serial)", "e.g. NPS-00456") }
                            { input(console, ctx, Field::Wagon3, "Wagon 3 (Serial)", "e.g. NPS-00789") }
                            <div class="button-row">
                                <button class="btn" onclick={link.callback(|_| Msg::Export)}>{"Export to Excel (.xlsm)"}</button>
                                <button class="btn secondary" onclick={link.callback(|_| Msg::Clear)}>{"Clear Staged"}</button>
                            </div>
                        </div>
                    </section>

                    <section class="card wide">
                        <h3>{ format!("Staged Scans ({})", console.staged.len()) }</h3>
                        <div class="list">
                            if console.staged.is_empty() {
                                <div class="item muted">{"No scans yet."}</div>
                            }
                            { for console.staged.iter().map(staged_item) }
                        </div>
                    </section>
                </div>
            </main>
            { footer() }
        </div>
    }
}
