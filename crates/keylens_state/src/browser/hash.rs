use crate::browser::keys::{
    KeysAction, await_key_info_refresh, delete_selected_key_cascade, fetch_key_info,
    refresh_key_info_action,
};
use crate::browser::{settle, view_event};
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::state::RequestStatus;
use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, DeleteHashFieldsRequest, DeleteResponse, GetHashFieldsRequest, HashField,
    HashFieldTtl, HashFieldsPage, HashFieldsRequest, KeyType, Method, RedisBuffer,
    TelemetryEvent, UpdateHashFieldsTtlRequest, endpoints,
};
use serde_json::json;

const DEFAULT_MATCH: &str = "*";

#[derive(Debug, Clone, PartialEq)]
pub struct HashData {
    pub total: i64,
    pub key: Option<RedisBuffer>,
    pub key_name: RedisBuffer,
    pub fields: Vec<HashField>,
    pub next_cursor: u64,
    pub pattern: String,
}

impl Default for HashData {
    fn default() -> Self {
        Self {
            total: 0,
            key: None,
            key_name: RedisBuffer::default(),
            fields: Vec::new(),
            next_cursor: 0,
            pattern: DEFAULT_MATCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HashState {
    pub loading: bool,
    pub error: String,
    pub data: HashData,
    pub update_value: RequestStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HashAction {
    SetHashInitialState,
    SetHashFields(Vec<HashField>),
    LoadHashFields { pattern: String, reset: bool },
    LoadHashFieldsSuccess(HashFieldsPage),
    LoadHashFieldsFailure(String),
    LoadMoreHashFields,
    LoadMoreHashFieldsSuccess(HashFieldsPage),
    LoadMoreHashFieldsFailure(String),
    RemoveHashFields,
    RemoveHashFieldsSuccess,
    RemoveHashFieldsFailure(String),
    RemoveFieldsFromList(Vec<RedisBuffer>),
    UpdateValue,
    UpdateValueSuccess,
    UpdateValueFailure(String),
    ResetUpdateValue,
    UpdateFieldsInList(Vec<HashField>),
    UpdateFieldsTtlInList(Vec<HashFieldTtl>),
}

pub fn reduce(state: &mut HashState, action: HashAction) {
    match action {
        HashAction::SetHashInitialState => *state = HashState::default(),
        HashAction::SetHashFields(fields) => state.data.fields = fields,
        HashAction::LoadHashFields { pattern, reset } => {
            state.loading = true;
            state.error.clear();
            if reset {
                state.data = HashData::default();
            }
            state.data.pattern = if pattern.is_empty() {
                DEFAULT_MATCH.to_string()
            } else {
                pattern
            };
        }
        HashAction::LoadHashFieldsSuccess(page) => {
            state.data.key = Some(page.key_name.clone());
            state.data.key_name = page.key_name;
            state.data.total = page.total;
            state.data.next_cursor = page.next_cursor;
            state.data.fields = page.fields;
            state.loading = false;
        }
        HashAction::LoadMoreHashFields | HashAction::RemoveHashFields => {
            state.loading = true;
            state.error.clear();
        }
        HashAction::LoadMoreHashFieldsSuccess(mut page) => {
            state.loading = false;
            state.data.key_name = page.key_name;
            state.data.total = page.total;
            state.data.next_cursor = page.next_cursor;
            state.data.fields.append(&mut page.fields);
        }
        HashAction::RemoveHashFieldsSuccess => state.loading = false,
        HashAction::LoadHashFieldsFailure(message)
        | HashAction::LoadMoreHashFieldsFailure(message)
        | HashAction::RemoveHashFieldsFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        HashAction::RemoveFieldsFromList(fields) => {
            state.data.fields.retain(|item| !fields.contains(&item.field));
            state.data.total -= 1;
        }
        HashAction::UpdateValue => state.update_value.start(),
        HashAction::UpdateValueSuccess => state.update_value.succeed(),
        HashAction::UpdateValueFailure(message) => state.update_value.fail(message),
        HashAction::ResetUpdateValue => state.update_value = RequestStatus::default(),
        HashAction::UpdateFieldsInList(updates) => {
            for item in state.data.fields.iter_mut() {
                if let Some(update) = updates.iter().find(|update| update.field == item.field) {
                    item.value = update.value.clone();
                    if update.expire.is_some() {
                        item.expire = update.expire;
                    }
                }
            }
        }
        HashAction::UpdateFieldsTtlInList(updates) => {
            for item in state.data.fields.iter_mut() {
                if let Some(update) = updates.iter().find(|update| update.field == item.field) {
                    item.expire = Some(update.expire);
                }
            }
        }
    }
}

fn fields_request(store: &Store, key: &RedisBuffer, cursor: u64, count: u32, pattern: &str) -> ApiRequest {
    store
        .db_request(Method::Post, endpoints::HASH_GET_FIELDS)
        .json(&GetHashFieldsRequest {
            key_name: key.clone(),
            cursor,
            count,
            pattern: pattern.to_string(),
        })
}

pub async fn fetch_hash_fields(
    store: &Store,
    key: &RedisBuffer,
    cursor: u64,
    count: u32,
    pattern: &str,
    reset: bool,
) -> Result<HashFieldsPage, ApiError> {
    store.dispatch(HashAction::LoadHashFields {
        pattern: pattern.to_string(),
        reset,
    });

    match store
        .fetch::<HashFieldsPage>(fields_request(store, key, cursor, count, pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(HashAction::LoadHashFieldsSuccess(page.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(HashAction::LoadHashFieldsFailure(message));
            Err(e)
        }
    }
}

/// Reloads the first page with the active field filter. Failures stay inline.
pub async fn refresh_hash_fields(store: &Store, key: &RedisBuffer, reset: bool) -> Result<HashFieldsPage, ApiError> {
    let pattern = store.select(|state| state.browser.hash.data.pattern.clone());
    store.dispatch(HashAction::LoadHashFields {
        pattern: pattern.clone(),
        reset,
    });

    let count = store.config().scan_count_default;
    match store
        .fetch::<HashFieldsPage>(fields_request(store, key, 0, count, &pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(HashAction::LoadHashFieldsSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            store.dispatch(HashAction::LoadHashFieldsFailure(e.message()));
            Err(e)
        }
    }
}

pub async fn fetch_more_hash_fields(
    store: &Store,
    key: &RedisBuffer,
    cursor: u64,
    count: u32,
    pattern: &str,
) -> Result<HashFieldsPage, ApiError> {
    store.dispatch(HashAction::LoadMoreHashFields);

    match store
        .fetch::<HashFieldsPage>(fields_request(store, key, cursor, count, pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(HashAction::LoadMoreHashFieldsSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(HashAction::LoadMoreHashFieldsFailure(message));
            Err(e)
        }
    }
}

/// Deletes fields and returns the remaining field count as computed from the
/// cached total. Zero or less means the key itself is gone.
pub async fn delete_hash_fields(
    store: &Store,
    key: &RedisBuffer,
    fields: Vec<RedisBuffer>,
) -> Result<i64, ApiError> {
    store.dispatch(HashAction::RemoveHashFields);

    let total = store.select(|state| state.browser.hash.data.total);
    let request = store
        .db_request(Method::Delete, endpoints::HASH_FIELDS)
        .json(&DeleteHashFieldsRequest {
            key_name: key.clone(),
            fields: fields.clone(),
        });

    let response = match store.fetch::<DeleteResponse>(request).await {
        Ok(response) => response,
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(HashAction::RemoveHashFieldsFailure(message));
            return Err(e);
        }
    };

    let new_total = total - response.affected;
    store.dispatch(HashAction::RemoveHashFieldsSuccess);
    store.dispatch(HashAction::RemoveFieldsFromList(fields.clone()));

    if new_total > 0 {
        store.dispatch(KeysAction::RefreshKeyInfo);
        let removed = fields
            .iter()
            .map(RedisBuffer::to_display_string)
            .collect::<Vec<_>>()
            .join(", ");
        store.dispatch(NotificationsAction::AddMessageNotification(
            messages::removed_key_value(key, &removed, "Field"),
        ));
        settle(await_key_info_refresh(store, key).await, "Key info refresh");
    } else {
        delete_selected_key_cascade(store, key);
    }

    Ok(new_total)
}

/// Adds fields and reloads the key, since the server does not echo the hash.
pub async fn add_hash_fields(store: &Store, data: &HashFieldsRequest) -> Result<(), ApiError> {
    store.dispatch(HashAction::UpdateValue);

    let request = store.db_request(Method::Put, endpoints::HASH).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(HashAction::UpdateValueFailure(message));
        return Err(e);
    }

    store.dispatch(HashAction::UpdateValueSuccess);
    settle(
        fetch_key_info(store, &data.key_name, false).await,
        "Key info fetch",
    );
    Ok(())
}

pub async fn update_hash_fields(store: &Store, data: &HashFieldsRequest) -> Result<(), ApiError> {
    store.dispatch(HashAction::UpdateValue);

    let request = store.db_request(Method::Put, endpoints::HASH).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(HashAction::UpdateValueFailure(message));
        return Err(e);
    }

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeyValueEdited,
            TelemetryEvent::TreeViewKeyValueEdited,
        ),
        json!({
            "databaseId": store.instance_id(),
            "keyType": KeyType::Hash.as_str(),
        }),
    );
    store.dispatch(HashAction::UpdateValueSuccess);
    store.dispatch(HashAction::UpdateFieldsInList(data.fields.clone()));
    settle(
        refresh_key_info_action(store, &data.key_name).await,
        "Key info refresh",
    );
    Ok(())
}

/// Sets per-field expiry. Expiring every remaining field deletes the key.
pub async fn update_hash_ttl(store: &Store, data: &UpdateHashFieldsTtlRequest) -> Result<(), ApiError> {
    store.dispatch(HashAction::UpdateValue);

    let total = store.select(|state| state.browser.hash.data.total);
    let request = store.db_request(Method::Patch, endpoints::HASH_TTL).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(HashAction::UpdateValueFailure(message));
        return Err(e);
    }

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserFieldTtlEdited,
            TelemetryEvent::TreeViewFieldTtlEdited,
        ),
        json!({ "databaseId": store.instance_id() }),
    );
    store.dispatch(HashAction::UpdateValueSuccess);

    let is_last_field_affected = total - data.fields.len() as i64 == 0;
    let is_set_to_zero = data.fields.iter().map(|field| field.expire).sum::<i64>() == 0;

    if is_last_field_affected && is_set_to_zero {
        delete_selected_key_cascade(store, &data.key_name);
    } else if is_set_to_zero {
        store.dispatch(HashAction::RemoveFieldsFromList(
            data.fields.iter().map(|field| field.field.clone()).collect(),
        ));
    } else {
        store.dispatch(HashAction::UpdateFieldsTtlInList(data.fields.clone()));
    }

    Ok(())
}
