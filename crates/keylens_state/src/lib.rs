//! Client-side state of the database browser.
//!
//! Every slice is a plain state struct, an action enum and a `reduce`
//! function. Thunks are async functions taking the [`Store`]: they dispatch a
//! start action, call the backend and dispatch the outcome.

mod action;
mod messages;
mod state;
mod store;

pub mod app;
pub mod browser;
pub mod cli;
pub mod connections;
pub mod notifications;

pub use action::Action;
pub use state::{
    AppState, BrowserState, CliState, ConnectionsState, RequestStatus, RootState, reduce,
};
pub use store::{Store, StoreBuilder};
