use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryEvent {
    BrowserKeysScanned,
    BrowserKeysScannedWithFilterEnabled,
    BrowserKeysAdditionallyScanned,
    BrowserKeyAdded,
    BrowserKeysDeleted,
    BrowserKeyTtlChanged,
    BrowserKeyValueAdded,
    BrowserKeyValueEdited,
    BrowserKeyValueRemoved,
    BrowserFieldTtlEdited,
    BrowserJsonPropertyEdited,
    BrowserJsonPropertyAdded,
    BrowserJsonPropertyDeleted,
    TreeViewKeysScanned,
    TreeViewKeysScannedWithFilterEnabled,
    TreeViewKeysAdditionallyScanned,
    TreeViewKeyAdded,
    TreeViewKeysDeleted,
    TreeViewKeyTtlChanged,
    TreeViewKeyValueAdded,
    TreeViewKeyValueEdited,
    TreeViewKeyValueRemoved,
    TreeViewFieldTtlEdited,
    TreeViewJsonPropertyEdited,
    TreeViewJsonPropertyAdded,
    TreeViewJsonPropertyDeleted,
    SearchKeysSearched,
    SearchIndexAdded,
    CliCommandSubmitted,
    CloudImportSucceeded,
    CloudImportFailed,
}

impl TelemetryEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryEvent::BrowserKeysScanned => "BROWSER_KEYS_SCANNED",
            TelemetryEvent::BrowserKeysScannedWithFilterEnabled => {
                "BROWSER_KEYS_SCANNED_WITH_FILTER_ENABLED"
            }
            TelemetryEvent::BrowserKeysAdditionallyScanned => "BROWSER_KEYS_ADDITIONALLY_SCANNED",
            TelemetryEvent::BrowserKeyAdded => "BROWSER_KEY_ADDED",
            TelemetryEvent::BrowserKeysDeleted => "BROWSER_KEYS_DELETED",
            TelemetryEvent::BrowserKeyTtlChanged => "BROWSER_KEY_TTL_CHANGED",
            TelemetryEvent::BrowserKeyValueAdded => "BROWSER_KEY_VALUE_ADDED",
            TelemetryEvent::BrowserKeyValueEdited => "BROWSER_KEY_VALUE_EDITED",
            TelemetryEvent::BrowserKeyValueRemoved => "BROWSER_KEY_VALUE_REMOVED",
            TelemetryEvent::BrowserFieldTtlEdited => "BROWSER_FIELD_TTL_EDITED",
            TelemetryEvent::BrowserJsonPropertyEdited => "BROWSER_JSON_PROPERTY_EDITED",
            TelemetryEvent::BrowserJsonPropertyAdded => "BROWSER_JSON_PROPERTY_ADDED",
            TelemetryEvent::BrowserJsonPropertyDeleted => "BROWSER_JSON_PROPERTY_DELETED",
            TelemetryEvent::TreeViewKeysScanned => "TREE_VIEW_KEYS_SCANNED",
            TelemetryEvent::TreeViewKeysScannedWithFilterEnabled => {
                "TREE_VIEW_KEYS_SCANNED_WITH_FILTER_ENABLED"
            }
            TelemetryEvent::TreeViewKeysAdditionallyScanned => {
                "TREE_VIEW_KEYS_ADDITIONALLY_SCANNED"
            }
            TelemetryEvent::TreeViewKeyAdded => "TREE_VIEW_KEY_ADDED",
            TelemetryEvent::TreeViewKeysDeleted => "TREE_VIEW_KEYS_DELETED",
            TelemetryEvent::TreeViewKeyTtlChanged => "TREE_VIEW_KEY_TTL_CHANGED",
            TelemetryEvent::TreeViewKeyValueAdded => "TREE_VIEW_KEY_VALUE_ADDED",
            TelemetryEvent::TreeViewKeyValueEdited => "TREE_VIEW_KEY_VALUE_EDITED",
            TelemetryEvent::TreeViewKeyValueRemoved => "TREE_VIEW_KEY_VALUE_REMOVED",
            TelemetryEvent::TreeViewFieldTtlEdited => "TREE_VIEW_FIELD_TTL_EDITED",
            TelemetryEvent::TreeViewJsonPropertyEdited => "TREE_VIEW_JSON_PROPERTY_EDITED",
            TelemetryEvent::TreeViewJsonPropertyAdded => "TREE_VIEW_JSON_PROPERTY_ADDED",
            TelemetryEvent::TreeViewJsonPropertyDeleted => "TREE_VIEW_JSON_PROPERTY_DELETED",
            TelemetryEvent::SearchKeysSearched => "SEARCH_KEYS_SEARCHED",
            TelemetryEvent::SearchIndexAdded => "SEARCH_INDEX_ADDED",
            TelemetryEvent::CliCommandSubmitted => "CLI_COMMAND_SUBMITTED",
            TelemetryEvent::CloudImportSucceeded => "CONFIG_DATABASES_REDIS_CLOUD_IMPORT_SUCCEEDED",
            TelemetryEvent::CloudImportFailed => "CONFIG_DATABASES_REDIS_CLOUD_IMPORT_FAILED",
        }
    }
}

/// Fire-and-forget event emitter.
pub trait TelemetrySink: Send + Sync {
    fn send(&self, event: TelemetryEvent, data: Value);
}

/// Writes events to the log at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn send(&self, event: TelemetryEvent, data: Value) {
        log::debug!("telemetry {} {}", event.as_str(), data);
    }
}
