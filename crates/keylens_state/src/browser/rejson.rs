use crate::browser::keys::refresh_key_info_action;
use crate::browser::{settle, view_event};
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::store::Store;
use keylens_core::{
    AppendJsonArrayRequest, ApiError, GetJsonRequest, JSON_LENGTH_TO_FORCE_RETRIEVE,
    JSON_ROOT_PATH, JsonBranch, Method, RedisBuffer, RemoveJsonRequest, RequestKind,
    SetJsonRequest, TelemetryEvent, endpoints,
};
use log::debug;
use serde_json::json;

const KEY_LEVEL_ENTIRE_KEY: &str = "entireKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorType {
    /// Lazily expanded tree of properties.
    #[default]
    Default,
    /// Whole document as editable text.
    Text,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonState {
    pub loading: bool,
    pub error: Option<String>,
    pub data: JsonBranch,
    pub editor_type: EditorType,
    pub is_within_threshold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonAction {
    LoadRejsonBranch { reset: bool },
    LoadRejsonBranchSuccess(JsonBranch),
    LoadRejsonBranchFailure(String),
    AppendReJsonArrayItem,
    AppendReJsonArrayItemSuccess,
    AppendReJsonArrayItemFailure(String),
    SetReJsonData,
    SetReJsonDataSuccess,
    SetReJsonDataFailure(String),
    RemoveRejsonKey,
    RemoveRejsonKeySuccess,
    RemoveRejsonKeyFailure(String),
    SetEditorType(EditorType),
    SetIsWithinThreshold(bool),
}

pub fn reduce(state: &mut JsonState, action: JsonAction) {
    match action {
        JsonAction::LoadRejsonBranch { reset } => {
            state.loading = true;
            state.error = None;
            if reset {
                state.data = JsonBranch::default();
            }
        }
        JsonAction::LoadRejsonBranchSuccess(branch) => {
            state.loading = false;
            state.data = branch;
        }
        JsonAction::AppendReJsonArrayItem
        | JsonAction::SetReJsonData
        | JsonAction::RemoveRejsonKey => {
            state.loading = true;
            state.error = None;
        }
        JsonAction::AppendReJsonArrayItemSuccess
        | JsonAction::SetReJsonDataSuccess
        | JsonAction::RemoveRejsonKeySuccess => {
            state.loading = false;
            state.error = None;
        }
        JsonAction::LoadRejsonBranchFailure(message)
        | JsonAction::AppendReJsonArrayItemFailure(message)
        | JsonAction::SetReJsonDataFailure(message)
        | JsonAction::RemoveRejsonKeyFailure(message) => {
            state.loading = false;
            state.error = Some(message);
        }
        JsonAction::SetEditorType(editor_type) => state.editor_type = editor_type,
        JsonAction::SetIsWithinThreshold(within) => state.is_within_threshold = within,
    }
}

/// Nesting depth of a JSONPath for telemetry: `root` for the document itself,
/// otherwise the number of steps below it.
fn json_path_level(path: &str) -> String {
    let steps = path
        .trim_start_matches(JSON_ROOT_PATH)
        .split(['.', '['])
        .filter(|step| !step.is_empty())
        .count();

    if steps == 0 {
        "root".to_string()
    } else {
        steps.to_string()
    }
}

fn should_force_retrieve(editor_type: EditorType, length: Option<u64>) -> bool {
    editor_type == EditorType::Text
        || length.is_none_or(|length| length <= JSON_LENGTH_TO_FORCE_RETRIEVE)
}

/// Loads the document branch at `path`. A newer call cancels one still in flight.
///
/// Small documents, and any document shown in the text editor, are retrieved
/// in full; larger ones come back with only their top-level properties.
pub async fn fetch_re_json(
    store: &Store,
    key: &RedisBuffer,
    path: &str,
    length: Option<u64>,
    reset: bool,
) -> Result<JsonBranch, ApiError> {
    store.dispatch(JsonAction::LoadRejsonBranch { reset });

    let editor_type = store.select(|state| state.browser.rejson.editor_type);
    let token = store.requests().begin(RequestKind::JsonPath);
    let request = store
        .db_request(Method::Post, endpoints::REJSON_GET)
        .json(&GetJsonRequest {
            key_name: key.clone(),
            path: path.to_string(),
            force_retrieve: should_force_retrieve(editor_type, length),
        })
        .with_cancel(token.clone());

    let result = store.fetch::<JsonBranch>(request).await;
    store.requests().finish(RequestKind::JsonPath, &token);

    match result {
        Ok(branch) => {
            store.dispatch(JsonAction::LoadRejsonBranchSuccess(branch.clone()));
            Ok(branch)
        }
        Err(e) if e.is_cancelled() => {
            debug!("JSON fetch of path {} cancelled", path);
            Err(e)
        }
        Err(e) => {
            store.dispatch(JsonAction::LoadRejsonBranchFailure(e.message()));
            store.notify_error(&e);
            Err(e)
        }
    }
}

async fn reload_document(store: &Store, key: &RedisBuffer, length: Option<u64>) {
    settle(
        fetch_re_json(store, key, JSON_ROOT_PATH, length, false).await,
        "JSON fetch",
    );
    settle(refresh_key_info_action(store, key).await, "Key info refresh");
}

/// Writes `data` at `path`. `is_edit` tells an edit of an existing property
/// apart from an insertion.
pub async fn set_re_json_data(
    store: &Store,
    key: &RedisBuffer,
    path: &str,
    data: &str,
    is_edit: bool,
    length: Option<u64>,
) -> Result<(), ApiError> {
    store.dispatch(JsonAction::SetReJsonData);

    let request = store
        .db_request(Method::Patch, endpoints::REJSON_SET)
        .json(&SetJsonRequest {
            key_name: key.clone(),
            path: path.to_string(),
            data: data.to_string(),
        });
    if let Err(e) = store.send(request).await {
        store.dispatch(JsonAction::SetReJsonDataFailure(e.message()));
        store.notify_error(&e);
        return Err(e);
    }

    let editor_type = store.select(|state| state.browser.rejson.editor_type);
    let key_level = match editor_type {
        EditorType::Text => KEY_LEVEL_ENTIRE_KEY.to_string(),
        EditorType::Default => json_path_level(path),
    };
    let event = if is_edit {
        view_event(
            store,
            TelemetryEvent::BrowserJsonPropertyEdited,
            TelemetryEvent::TreeViewJsonPropertyEdited,
        )
    } else {
        view_event(
            store,
            TelemetryEvent::BrowserJsonPropertyAdded,
            TelemetryEvent::TreeViewJsonPropertyAdded,
        )
    };
    store.send_telemetry(
        event,
        json!({ "databaseId": store.instance_id(), "keyLevel": key_level }),
    );

    store.dispatch(JsonAction::SetReJsonDataSuccess);
    reload_document(store, key, length).await;
    Ok(())
}

pub async fn append_re_json_array_item(
    store: &Store,
    key: &RedisBuffer,
    path: &str,
    data: &str,
    length: Option<u64>,
) -> Result<(), ApiError> {
    store.dispatch(JsonAction::AppendReJsonArrayItem);

    let request = store
        .db_request(Method::Patch, endpoints::REJSON_ARRAPPEND)
        .json(&AppendJsonArrayRequest {
            key_name: key.clone(),
            path: path.to_string(),
            data: vec![data.to_string()],
        });
    if let Err(e) = store.send(request).await {
        store.dispatch(JsonAction::AppendReJsonArrayItemFailure(e.message()));
        store.notify_error(&e);
        return Err(e);
    }

    let key_level = if path == JSON_ROOT_PATH {
        "0".to_string()
    } else {
        json_path_level(&format!("{path}[0]"))
    };
    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserJsonPropertyAdded,
            TelemetryEvent::TreeViewJsonPropertyAdded,
        ),
        json!({ "databaseId": store.instance_id(), "keyLevel": key_level }),
    );

    store.dispatch(JsonAction::AppendReJsonArrayItemSuccess);
    reload_document(store, key, length).await;
    Ok(())
}

/// Removes the property at `path`; `property_name` only labels the toast.
pub async fn remove_re_json_key(
    store: &Store,
    key: &RedisBuffer,
    path: &str,
    property_name: &str,
    length: Option<u64>,
) -> Result<(), ApiError> {
    store.dispatch(JsonAction::RemoveRejsonKey);

    let request = store
        .db_request(Method::Delete, endpoints::REJSON)
        .json(&RemoveJsonRequest {
            key_name: key.clone(),
            path: path.to_string(),
        });
    if let Err(e) = store.send(request).await {
        store.dispatch(JsonAction::RemoveRejsonKeyFailure(e.message()));
        store.notify_error(&e);
        return Err(e);
    }

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserJsonPropertyDeleted,
            TelemetryEvent::TreeViewJsonPropertyDeleted,
        ),
        json!({ "databaseId": store.instance_id(), "keyLevel": json_path_level(path) }),
    );

    store.dispatch(JsonAction::RemoveRejsonKeySuccess);
    reload_document(store, key, length).await;
    store.dispatch(NotificationsAction::AddMessageNotification(
        messages::removed_key_value(key, property_name, "JSON key"),
    ));
    Ok(())
}
