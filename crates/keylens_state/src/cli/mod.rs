//! Command-line pane: the server-side CLI client session, the helper panel
//! and the scrollback buffer.

pub mod format;
pub mod output;
pub mod settings;
