//! Database discovery and import from Redis Cloud and Azure.

pub mod azure;
pub mod cloud;
pub mod microsoft_auth;

use keylens_core::ImportStatus;

/// Names of the successfully imported rows, for the success toast.
pub(crate) fn added_names<'a>(
    rows: impl IntoIterator<Item = (ImportStatus, Option<&'a str>)>,
) -> Vec<String> {
    rows.into_iter()
        .filter(|(status, _)| *status == ImportStatus::Success)
        .map(|(_, name)| name.unwrap_or_default().to_string())
        .collect()
}
