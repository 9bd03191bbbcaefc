//! Upload queue list with filter tabs and per-item controls.

use dioxus::prelude::*;
use upload_core::{QueueCounts, QueuedUpload, UploadFilter, UploadId};

use super::{FilterTabs, UploadItem, sleep_ms};

/// Refresh interval while uploads are pending or running.
const ACTIVE_REFRESH_MS: u32 = 750;

/// Refresh interval when nothing is moving.
const IDLE_REFRESH_MS: u32 = 5000;

/// Which queue action a control triggered.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Pause,
    Resume,
    Retry,
    Remove,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Retry => "retry",
            Action::Remove => "remove",
        }
    }
}

/// Props for UploadQueue component.
#[derive(Props, Clone, PartialEq)]
pub struct UploadQueueProps {
    /// Bumped by the parent to force a reload, e.g. after new files are queued.
    pub version: Signal<u64>,
    /// Callback when an upload is selected.
    #[props(default)]
    pub on_select: Option<EventHandler<UploadId>>,
}

/// Upload list that polls the server while uploads are active.
#[component]
pub fn UploadQueue(props: UploadQueueProps) -> Element {
    let mut version = props.version;
    let mut filter = use_signal(|| UploadFilter::All);
    let mut error = use_signal(|| None::<String>);

    let snapshot = use_resource(move || {
        let filter = filter();
        let _ = version();
        async move {
            let uploads = api::list_uploads(filter.as_str().to_string()).await?;
            let counts = api::queue_counts().await?;
            Ok::<(Vec<QueuedUpload>, QueueCounts), ServerFnError>((uploads, counts))
        }
    });

    // Auto-refresh, faster while something is queued or uploading
    use_coroutine(move |_rx: UnboundedReceiver<()>| async move {
        loop {
            let active = match &*snapshot.peek() {
                Some(Ok((_, counts))) => counts.pending + counts.uploading > 0,
                _ => false,
            };
            sleep_ms(if active { ACTIVE_REFRESH_MS } else { IDLE_REFRESH_MS }).await;
            version += 1;
        }
    });

    let run_action = move |action: Action, id: UploadId| {
        spawn(async move {
            let id = id.to_string();
            let result = match action {
                Action::Pause => api::pause_upload(id).await,
                Action::Resume => api::resume_upload(id).await,
                Action::Retry => api::retry_upload(id).await,
                Action::Remove => api::remove_upload(id).await,
            };
            match result {
                Ok(_) => error.set(None),
                Err(e) => error.set(Some(format!("Failed to {} upload: {}", action.verb(), e))),
            }
            version += 1;
        });
    };

    let clear = move |_| {
        spawn(async move {
            match api::clear_completed().await {
                Ok(removed) => {
                    tracing::debug!("Cleared {} completed uploads", removed.len());
                    error.set(None);
                }
                Err(e) => error.set(Some(format!("Failed to clear completed: {}", e))),
            }
            version += 1;
        });
    };

    let (uploads, counts, load_error, loading) = match &*snapshot.read() {
        Some(Ok((uploads, counts))) => (uploads.clone(), *counts, None, false),
        Some(Err(e)) => (Vec::new(), QueueCounts::default(), Some(e.to_string()), false),
        None => (Vec::new(), QueueCounts::default(), None, true),
    };

    rsx! {
        div { class: "upload-queue",
            div { class: "upload-queue-header",
                h2 { "Upload Queue" }
                div { class: "header-actions",
                    span { class: "queue-summary",
                        "{counts.active()} active / {counts.total()} total"
                    }
                    button {
                        class: "btn btn-secondary",
                        disabled: counts.completed == 0,
                        onclick: clear,
                        "Clear completed"
                    }
                }
            }

            FilterTabs {
                active: filter(),
                counts,
                on_select: move |f| filter.set(f),
            }

            if let Some(err) = error() {
                div { class: "error-message", "{err}" }
            }
            if let Some(err) = load_error {
                div { class: "error-message", "Failed to load uploads: {err}" }
            }

            if loading {
                div { class: "loading", "Loading uploads..." }
            } else if uploads.is_empty() {
                div { class: "empty-state",
                    p { "No uploads here yet" }
                }
            } else {
                ul { class: "upload-list",
                    for upload in uploads {
                        UploadItem {
                            key: "{upload.id}",
                            upload: upload.clone(),
                            on_pause: move |id| run_action(Action::Pause, id),
                            on_resume: move |id| run_action(Action::Resume, id),
                            on_retry: move |id| run_action(Action::Retry, id),
                            on_remove: move |id| run_action(Action::Remove, id),
                            on_select: props.on_select,
                        }
                    }
                }
            }
        }
    }
}
