//! Single upload detail page.

use dioxus::prelude::*;
use upload_core::{QueuedUpload, UploadStatus};

use super::{ProgressBar, StatusBadge, format_bytes, sleep_ms};

const REFRESH_INTERVAL_MS: u32 = 1000;

/// Props for UploadDetailPage.
#[derive(Props, Clone, PartialEq)]
pub struct UploadDetailPageProps {
    /// Upload ID as it appears in the URL.
    pub upload_id: String,
    /// Callback for the back link.
    pub on_back: EventHandler<()>,
}

/// Detail view of one upload: metadata, attempts and outcome.
#[component]
pub fn UploadDetailPage(props: UploadDetailPageProps) -> Element {
    let mut upload = use_signal(|| None::<QueuedUpload>);
    let mut loading = use_signal(|| true);
    let mut error = use_signal(|| None::<String>);

    let upload_id = props.upload_id.clone();

    use_coroutine(move |_rx: UnboundedReceiver<()>| {
        let upload_id = upload_id.clone();
        async move {
            loop {
                match api::get_upload(upload_id.clone()).await {
                    Ok(found) => {
                        upload.set(found);
                        error.set(None);
                    }
                    Err(e) => error.set(Some(format!("Failed to load upload: {}", e))),
                }
                loading.set(false);

                // Settled or removed uploads no longer change
                let done = match &*upload.peek() {
                    Some(u) => u.status.can_remove(),
                    None => error.peek().is_none(),
                };
                if done {
                    break;
                }
                sleep_ms(REFRESH_INTERVAL_MS).await;
            }
        }
    });

    rsx! {
        div { class: "upload-detail-page",
            button {
                class: "link-button back-link",
                onclick: move |_| props.on_back.call(()),
                "Back to queue"
            }

            if let Some(err) = error() {
                div { class: "error-message", "{err}" }
            }

            if loading() {
                div { class: "loading", "Loading upload..." }
            } else if let Some(current) = upload() {
                UploadDetail { upload: current }
            } else {
                div { class: "empty-state",
                    p { "Upload not found. It may have been removed." }
                }
            }
        }
    }
}

#[component]
fn UploadDetail(upload: QueuedUpload) -> Element {
    let status = upload.status.as_str().to_string();
    let meta = &upload.metadata;
    let tags = meta.tags.join(", ");
    let size = format_bytes(upload.source.size);
    let added = upload.created_at.format("%Y-%m-%d %H:%M:%S").to_string();

    let outcome = match &upload.status {
        UploadStatus::Completed { completed_at, photo } => {
            let when = completed_at.format("%H:%M:%S").to_string();
            rsx! {
                div { class: "detail-outcome success",
                    p { "Uploaded at {when}" }
                    if let Some(url) = &photo.url {
                        a { href: "{url}", target: "_blank", "View photo" }
                    }
                }
            }
        }
        UploadStatus::Error { failed_at, failure } => {
            let when = failed_at.format("%H:%M:%S").to_string();
            rsx! {
                div { class: "detail-outcome failure", role: "alert",
                    p { "Failed at {when}: {failure.message}" }
                    if let Some(detail) = &failure.detail {
                        pre { class: "failure-detail", "{detail}" }
                    }
                }
            }
        }
        _ => rsx! {},
    };

    rsx! {
        div { class: "upload-detail",
            div { class: "detail-header",
                h2 { "{meta.title}" }
                StatusBadge { status: status.clone() }
            }

            ProgressBar { percent: upload.progress, status: status.clone() }

            dl { class: "detail-grid",
                dt { "File" }
                dd { "{upload.source.file_name}" }
                dt { "Size" }
                dd { "{size}" }
                dt { "Type" }
                dd { "{upload.source.content_type}" }
                dt { "Attempts" }
                dd { "{upload.attempts}" }
                dt { "Added" }
                dd { "{added}" }
                if !meta.category.is_empty() {
                    dt { "Category" }
                    dd { "{meta.category}" }
                }
                if !tags.is_empty() {
                    dt { "Tags" }
                    dd { "{tags}" }
                }
                dt { "Featured" }
                dd { if meta.featured { "Yes" } else { "No" } }
            }

            if !meta.description.is_empty() {
                p { class: "detail-description", "{meta.description}" }
            }
            if !meta.comments.is_empty() {
                p { class: "detail-comments", "{meta.comments}" }
            }

            {outcome}
        }
    }
}
