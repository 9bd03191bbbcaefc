// Dioxus `rsx!` macro expands to unwraps internally; allow to avoid false positives.
#![allow(clippy::disallowed_methods)]

use dioxus::prelude::*;

use ui::{UploadDetailPage, UploadsPage};
use upload_core::UploadId;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(AppLayout)]
        #[route("/")]
        Uploads {},
        #[route("/uploads/:upload_id")]
        UploadDetail { upload_id: String },
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    #[cfg(feature = "server")]
    {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Photo Uploads" }
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        Router::<Route> {}
    }
}

/// Top bar shared by all pages.
#[component]
fn AppLayout() -> Element {
    rsx! {
        header { class: "app-header",
            Link {
                to: Route::Uploads {},
                class: "app-logo",
                "Photo Uploads"
            }
        }

        main { class: "app-main",
            Outlet::<Route> {}
        }
    }
}

/// Queue page.
#[component]
fn Uploads() -> Element {
    let nav = use_navigator();

    rsx! {
        UploadsPage {
            on_select: move |id: UploadId| {
                nav.push(Route::UploadDetail { upload_id: id.to_string() });
            },
        }
    }
}

/// Upload detail page.
#[component]
fn UploadDetail(upload_id: String) -> Element {
    let nav = use_navigator();

    rsx! {
        UploadDetailPage {
            upload_id,
            on_back: move |_| {
                nav.push(Route::Uploads {});
            },
        }
    }
}
