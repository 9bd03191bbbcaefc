//! Upload queue components.

mod drop_zone;
mod filter_tabs;
mod format;
mod progress_bar;
mod status_badge;
mod upload_detail_page;
mod upload_item;
mod upload_queue;
mod uploads_page;

pub use drop_zone::DropZone;
pub use filter_tabs::FilterTabs;
pub use format::{format_bytes, sleep_ms};
pub use progress_bar::ProgressBar;
pub use status_badge::StatusBadge;
pub use upload_detail_page::UploadDetailPage;
pub use upload_item::UploadItem;
pub use upload_queue::UploadQueue;
pub use uploads_page::UploadsPage;
