use dioxus::prelude::*;

/// Horizontal progress bar, 0..=100.
#[component]
pub fn ProgressBar(percent: u8, #[props(default)] status: String) -> Element {
    let percent = percent.min(100);

    rsx! {
        div {
            class: "progress-bar progress-{status}",
            role: "progressbar",
            "aria-valuemin": "0",
            "aria-valuemax": "100",
            "aria-valuenow": "{percent}",
            div {
                class: "progress-bar-fill",
                style: "width: {percent}%",
            }
        }
    }
}
