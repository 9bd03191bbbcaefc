//! Status badge component.

use dioxus::prelude::*;

/// Badge for displaying upload status.
#[component]
pub fn StatusBadge(status: String) -> Element {
    let (bg_class, text) = match status.as_str() {
        "pending" => ("badge-pending", "Pending"),
        "uploading" => ("badge-uploading", "Uploading"),
        "paused" => ("badge-paused", "Paused"),
        "completed" => ("badge-completed", "Completed"),
        "error" => ("badge-failed", "Failed"),
        _ => ("badge-default", status.as_str()),
    };

    rsx! {
        span {
            class: "status-badge {bg_class}",
            {text}
        }
    }
}
