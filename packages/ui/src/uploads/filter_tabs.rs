//! Filter tabs for the upload list.

use dioxus::prelude::*;
use upload_core::{QueueCounts, UploadFilter};

/// Props for FilterTabs component.
#[derive(Props, Clone, PartialEq)]
pub struct FilterTabsProps {
    /// Currently selected filter.
    pub active: UploadFilter,
    /// Counts shown next to each tab label.
    pub counts: QueueCounts,
    /// Callback when a tab is clicked.
    pub on_select: EventHandler<UploadFilter>,
}

#[component]
pub fn FilterTabs(props: FilterTabsProps) -> Element {
    rsx! {
        div { class: "filter-tabs", role: "tablist",
            for filter in UploadFilter::ALL {
                button {
                    key: "{filter.as_str()}",
                    class: if filter == props.active { "filter-tab active" } else { "filter-tab" },
                    role: "tab",
                    "aria-selected": "{filter == props.active}",
                    onclick: move |_| props.on_select.call(filter),
                    span { "{filter.label()}" }
                    span { class: "filter-count", "{props.counts.for_filter(filter)}" }
                }
            }
        }
    }
}
