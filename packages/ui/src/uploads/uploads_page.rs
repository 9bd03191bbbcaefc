//! Main page: drop zone above the live queue.

use dioxus::prelude::*;

use upload_core::UploadId;

use super::{DropZone, UploadQueue};

/// Full upload screen: picker on top, queue below.
#[component]
pub fn UploadsPage(#[props(default)] on_select: Option<EventHandler<UploadId>>) -> Element {
    let mut version = use_signal(|| 0u64);

    rsx! {
        div { class: "uploads-page",
            div { class: "page-header",
                h1 { "Photo Uploads" }
                p { class: "page-subtitle", "Queue photos and watch them upload one by one." }
            }

            DropZone {
                on_enqueued: move |_| version += 1,
            }

            UploadQueue { version, on_select }
        }
    }
}
