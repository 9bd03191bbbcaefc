//! Upload item component for displaying a single queued upload.

use dioxus::prelude::*;
use upload_core::{QueuedUpload, UploadId};

use super::{ProgressBar, StatusBadge, format_bytes};

/// Props for UploadItem component.
#[derive(Props, Clone, PartialEq)]
pub struct UploadItemProps {
    /// The upload to display.
    pub upload: QueuedUpload,
    pub on_pause: EventHandler<UploadId>,
    pub on_resume: EventHandler<UploadId>,
    pub on_retry: EventHandler<UploadId>,
    pub on_remove: EventHandler<UploadId>,
    /// Callback when the file name is clicked.
    #[props(default)]
    pub on_select: Option<EventHandler<UploadId>>,
}

/// Row showing one upload with the controls its status allows.
#[component]
pub fn UploadItem(props: UploadItemProps) -> Element {
    let upload = &props.upload;
    let id = upload.id;
    let status = upload.status.as_str().to_string();
    let size = format_bytes(upload.source.size);
    let added = upload.created_at.format("%H:%M:%S").to_string();
    let show_progress = matches!(status.as_str(), "uploading" | "completed");

    rsx! {
        li { class: "upload-item upload-{status}",
            div { class: "upload-item-header",
                div { class: "upload-item-name",
                    if let Some(on_select) = props.on_select {
                        button {
                            class: "link-button upload-file-name",
                            onclick: move |_| on_select.call(id),
                            "{upload.source.file_name}"
                        }
                    } else {
                        span { class: "upload-file-name", "{upload.source.file_name}" }
                    }
                    span { class: "upload-file-size", "{size}" }
                }
                StatusBadge { status: status.clone() }
            }

            if upload.metadata.title != upload.source.file_name {
                p { class: "upload-item-title", "{upload.metadata.title}" }
            }

            if show_progress {
                div { class: "upload-item-progress",
                    ProgressBar { percent: upload.progress, status: status.clone() }
                    span { class: "upload-percent", "{upload.progress}%" }
                }
            }

            if let Some(message) = upload.error_message() {
                p { class: "upload-item-error", role: "alert", "{message}" }
            }

            div { class: "upload-item-footer",
                span { class: "upload-item-added", "Added {added}" }
                div { class: "upload-item-actions",
                    if upload.status.can_pause() {
                        button {
                            class: "btn btn-small btn-pause",
                            onclick: move |_| props.on_pause.call(id),
                            "Pause"
                        }
                    }
                    if upload.status.can_resume() {
                        button {
                            class: "btn btn-small btn-resume",
                            onclick: move |_| props.on_resume.call(id),
                            "Resume"
                        }
                    }
                    if upload.status.can_retry() {
                        button {
                            class: "btn btn-small btn-retry",
                            onclick: move |_| props.on_retry.call(id),
                            "Retry"
                        }
                    }
                    if upload.status.can_remove() {
                        button {
                            class: "btn btn-small btn-remove",
                            onclick: move |_| props.on_remove.call(id),
                            "Remove"
                        }
                    }
                }
            }
        }
    }
}
