pub mod hash;
pub mod keys;
pub mod list;
pub mod redisearch;
pub mod rejson;
pub mod set;
pub mod stream;
pub mod string;
pub mod tree;
pub mod zset;

use crate::store::Store;
use keylens_core::{ApiError, TelemetryEvent};
use log::debug;

use keys::KeyViewType;

/// Picks the browser or tree flavour of an event from the current view type.
pub(crate) fn view_event(
    store: &Store,
    browser: TelemetryEvent,
    tree: TelemetryEvent,
) -> TelemetryEvent {
    match store.select(|state| state.browser.keys.view_type) {
        KeyViewType::Browser => browser,
        KeyViewType::Tree => tree,
    }
}

/// Follow-up thunks raise their own toasts; the caller only notes the outcome.
pub(crate) fn settle<T>(result: Result<T, ApiError>, follow_up: &str) {
    if let Err(e) = result {
        debug!("{} did not complete: {}", follow_up, e);
    }
}
