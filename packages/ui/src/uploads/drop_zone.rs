//! File picker and metadata form that feeds the upload queue.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;
use upload_core::{FileRules, QueuedUpload, UploadMetadata};

use super::format_bytes;

/// A file that was not queued, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq)]
struct Rejected {
    file_name: String,
    reason: String,
}

/// Props for DropZone component.
#[derive(Props, Clone, PartialEq)]
pub struct DropZoneProps {
    /// Callback after each file is queued.
    pub on_enqueued: EventHandler<QueuedUpload>,
}

/// Drop area plus photo metadata fields.
///
/// Every selected file is checked against the server's [`FileRules`] before
/// its bytes are read. The same metadata is applied to each file in a batch;
/// a blank title falls back to the file name on the server.
#[component]
pub fn DropZone(props: DropZoneProps) -> Element {
    let mut title = use_signal(String::new);
    let mut description = use_signal(String::new);
    let mut category = use_signal(String::new);
    let mut tags = use_signal(String::new);
    let mut comments = use_signal(String::new);
    let mut featured = use_signal(|| false);
    let mut dragging = use_signal(|| false);
    let mut submitting = use_signal(|| false);
    let mut rejected = use_signal(Vec::<Rejected>::new);

    let rules = use_resource(|| async move { api::upload_rules().await });

    let current_rules = move || match &*rules.read() {
        Some(Ok(rules)) => rules.clone(),
        _ => FileRules::default(),
    };

    let metadata = move || UploadMetadata {
        title: title().trim().to_string(),
        description: description().trim().to_string(),
        category: category().trim().to_string(),
        tags: UploadMetadata::parse_tags(&tags()),
        comments: comments().trim().to_string(),
        featured: featured(),
    };

    let mut submit = move |files: Vec<FileData>| {
        // One batch at a time
        if files.is_empty() || submitting() {
            return;
        }
        let rules = current_rules();
        let metadata = metadata();
        submitting.set(true);
        rejected.set(Vec::new());

        spawn(async move {
            for file in files {
                match enqueue_file(&file, &rules, metadata.clone()).await {
                    Ok(upload) => props.on_enqueued.call(upload),
                    Err(reason) => {
                        tracing::debug!("Rejected {}: {}", file.name(), reason);
                        rejected.write().push(Rejected {
                            file_name: file.name(),
                            reason,
                        });
                    }
                }
            }

            submitting.set(false);
        });
    };

    let limits = match &*rules.read() {
        Some(Ok(rules)) => format!(
            "Up to {} per photo ({})",
            format_bytes(rules.max_file_bytes),
            rules.accepted_types.join(", ")
        ),
        _ => String::new(),
    };

    rsx! {
        div { class: "drop-zone-panel",
            div {
                class: if dragging() { "drop-zone dragging" } else { "drop-zone" },
                ondragover: move |evt| {
                    evt.prevent_default();
                    dragging.set(true);
                },
                ondragleave: move |_| dragging.set(false),
                ondrop: move |evt| {
                    evt.prevent_default();
                    dragging.set(false);
                    submit(evt.files());
                },

                p { class: "drop-zone-hint", "Drag photos here or" }
                label { class: "btn btn-primary drop-zone-browse",
                    "Browse files"
                    input {
                        r#type: "file",
                        accept: "image/*",
                        multiple: true,
                        disabled: submitting(),
                        class: "visually-hidden",
                        onchange: move |evt| submit(evt.files()),
                    }
                }
                if !limits.is_empty() {
                    p { class: "drop-zone-limits", "{limits}" }
                }
                if submitting() {
                    p { class: "drop-zone-status", "Adding to queue..." }
                }
            }

            if !rejected().is_empty() {
                div { class: "error-message", role: "alert",
                    p { "Some files were not added:" }
                    ul { class: "rejected-list",
                        for (index, item) in rejected().into_iter().enumerate() {
                            li { key: "{index}-{item.file_name}",
                                strong { "{item.file_name}" }
                                ": {item.reason}"
                            }
                        }
                    }
                }
            }

            div { class: "metadata-form",
                div { class: "form-group",
                    label { "Title" }
                    input {
                        r#type: "text",
                        placeholder: "Defaults to the file name",
                        value: "{title}",
                        oninput: move |e| title.set(e.value()),
                    }
                }

                div { class: "form-group",
                    label { "Description" }
                    textarea {
                        rows: "3",
                        value: "{description}",
                        oninput: move |e| description.set(e.value()),
                    }
                }

                div { class: "form-row",
                    div { class: "form-group",
                        label { "Category" }
                        input {
                            r#type: "text",
                            value: "{category}",
                            oninput: move |e| category.set(e.value()),
                        }
                    }

                    div { class: "form-group",
                        label { "Tags" }
                        input {
                            r#type: "text",
                            placeholder: "comma, separated",
                            value: "{tags}",
                            oninput: move |e| tags.set(e.value()),
                        }
                    }
                }

                div { class: "form-group",
                    label { "Comments" }
                    textarea {
                        rows: "2",
                        value: "{comments}",
                        oninput: move |e| comments.set(e.value()),
                    }
                }

                div { class: "form-group form-check",
                    label {
                        input {
                            r#type: "checkbox",
                            checked: featured(),
                            onchange: move |e| featured.set(e.checked()),
                        }
                        " Featured"
                    }
                }
            }
        }
    }
}

/// Validate one file locally, read it and hand it to the server.
async fn enqueue_file(
    file: &FileData,
    rules: &FileRules,
    metadata: UploadMetadata,
) -> Result<QueuedUpload, String> {
    let file_name = file.name();
    let declared = file.content_type();

    let content_type = rules
        .validate(&file_name, file.size(), declared.as_deref())
        .map_err(|e| e.to_string())?;

    let data = file
        .read_bytes()
        .await
        .map_err(|e| format!("Could not read file: {}", e))?;

    let request = api::EnqueueUploadRequest {
        file_name,
        content_type: Some(content_type),
        data: data.to_vec(),
        metadata,
    };

    api::enqueue_upload(request)
        .await
        .map_err(|e| format!("Failed to queue: {}", e))
}
