pub mod app;
pub mod event_source;
pub mod highlight;
pub mod matches;
pub mod navigation;
pub mod overlay;
pub mod panic_handler;
pub mod pdf;
pub mod settings;
pub mod snapshot;
pub mod viewer;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{App, AppAction, run_app_with_event_source};
pub use viewer::Viewer;
