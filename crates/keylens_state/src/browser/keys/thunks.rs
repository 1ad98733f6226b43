use super::listing::active_listing;
use super::KeysAction;
use crate::browser::hash::{HashAction, fetch_hash_fields, refresh_hash_fields};
use crate::browser::list::{ListAction, fetch_list_elements, refresh_list_elements};
use crate::browser::rejson::fetch_re_json;
use crate::browser::set::{fetch_set_members, refresh_set_members};
use crate::browser::stream::{
    StreamAction, StreamViewType, fetch_stream_entries, refresh_stream,
};
use crate::browser::string::fetch_string;
use crate::browser::tree::TreeAction;
use crate::browser::zset::{ZSetAction, fetch_zset_members, refresh_zset_members};
use crate::browser::{settle, view_event};
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::store::Store;
use keylens_core::{
    ApiError, CreateHashKey, CreateJsonKey, CreateListKey, CreateSetKey, CreateStreamKey,
    CreateStringKey, CreateZSetKey, DeleteKeysRequest, GetKeysMetadataRequest, GetKeysRequest,
    JSON_ROOT_PATH, KeyInfo, KeyListItem, KeyNameRequest, KeyType, KeysPage, Method, NewKey,
    RedisBuffer, RenameKeyRequest, RequestKind, ScanNodeResponse, SortOrder, TelemetryEvent,
    UpdateKeyTtlRequest, endpoints, parse_keys_list_response,
};
use log::{debug, info};
use serde_json::json;

const DEFAULT_SEARCH_MATCH: &str = "*";

/// Telemetry classification of a scan pattern.
fn match_type(pattern: &str) -> &'static str {
    let mut escaped = false;
    for c in pattern.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '*' | '?' | '[' | ']' if !escaped => return "PATTERN",
            _ => escaped = false,
        }
    }
    "EXACT_VALUE_NAME"
}

fn document_length(info: &KeyInfo) -> Option<u64> {
    info.length.and_then(|length| u64::try_from(length).ok())
}

fn key_type_label(key_type: Option<KeyType>) -> serde_json::Value {
    key_type.map_or(serde_json::Value::Null, |key_type| json!(key_type.as_str()))
}

async fn scan_keys(store: &Store, cursor: &str, count: u32) -> Result<Vec<ScanNodeResponse>, ApiError> {
    let (pattern, filter) = store.select(|state| {
        (state.browser.keys.search.clone(), state.browser.keys.filter)
    });

    let token = store.requests().begin(RequestKind::KeysScan);
    let request = store
        .db_request(Method::Post, endpoints::KEYS)
        .json(&GetKeysRequest {
            cursor: cursor.to_string(),
            count,
            key_type: filter,
            pattern: if pattern.is_empty() {
                DEFAULT_SEARCH_MATCH.to_string()
            } else {
                pattern
            },
            keys_info: false,
        })
        .with_cancel(token.clone());

    let result = store.fetch(request).await;
    store.requests().finish(RequestKind::KeysScan, &token);
    result
}

/// Lists keys in the active search mode.
pub async fn fetch_keys(store: &Store, cursor: &str, count: u32) -> Result<KeysPage, ApiError> {
    active_listing(store).fetch_keys(store, cursor, count).await
}

/// Loads the next page in the active search mode; `old_keys` are prepended.
pub async fn fetch_more_keys(
    store: &Store,
    old_keys: Vec<KeyListItem>,
    cursor: &str,
    count: u32,
) -> Result<KeysPage, ApiError> {
    active_listing(store)
        .fetch_more_keys(store, old_keys, cursor, count)
        .await
}

/// Pattern scan. A newer scan cancels this one, which then dispatches nothing.
pub async fn fetch_pattern_keys(store: &Store, cursor: &str, count: u32) -> Result<KeysPage, ApiError> {
    store.dispatch(KeysAction::LoadKeys);

    let nodes = match scan_keys(store, cursor, count).await {
        Ok(nodes) => nodes,
        Err(e) if e.is_cancelled() => {
            debug!("Keys scan from cursor {} cancelled", cursor);
            return Err(e);
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(KeysAction::LoadKeysFailure(message));
            return Err(e);
        }
    };

    let (pattern, filter, instance_id) = store.select(|state| {
        (
            state.browser.keys.search.clone(),
            state.browser.keys.filter,
            state.app.connected_instance.id.clone(),
        )
    });
    let (database_size, scanned) = nodes
        .first()
        .map_or((0, 0), |node| (node.total, node.scanned));

    let mut page = parse_keys_list_response(&Default::default(), nodes);
    page.last_refresh_time = Some(store.now());

    store.dispatch(KeysAction::LoadKeysSuccess {
        data: page.clone(),
        is_searched: !pattern.is_empty(),
        is_filtered: filter.is_some(),
    });

    if filter.is_some() || !pattern.is_empty() {
        let match_value = if pattern.is_empty() || pattern == DEFAULT_SEARCH_MATCH {
            DEFAULT_SEARCH_MATCH
        } else {
            match_type(&pattern)
        };
        store.send_telemetry(
            view_event(
                store,
                TelemetryEvent::BrowserKeysScannedWithFilterEnabled,
                TelemetryEvent::TreeViewKeysScannedWithFilterEnabled,
            ),
            json!({
                "databaseId": instance_id,
                "keyType": key_type_label(filter),
                "match": match_value,
                "databaseSize": database_size,
                "numberOfKeysScanned": scanned,
                "scanCount": count,
            }),
        );
    }

    if filter.is_none() && pattern.is_empty() && cursor == "0" {
        store.send_telemetry(
            view_event(
                store,
                TelemetryEvent::BrowserKeysScanned,
                TelemetryEvent::TreeViewKeysScanned,
            ),
            json!({
                "databaseId": instance_id,
                "databaseSize": database_size,
                "numberOfKeysScanned": scanned,
                "scanCount": count,
            }),
        );
    }

    Ok(page)
}

pub async fn fetch_more_pattern_keys(
    store: &Store,
    old_keys: Vec<KeyListItem>,
    cursor: &str,
    count: u32,
) -> Result<KeysPage, ApiError> {
    store.dispatch(KeysAction::LoadMoreKeys);

    let (shards_meta, previously_scanned) = store.select(|state| {
        (
            state.browser.keys.data.shards_meta.clone(),
            state.browser.keys.data.scanned,
        )
    });

    let nodes = match scan_keys(store, cursor, count).await {
        Ok(nodes) => nodes,
        Err(e) if e.is_cancelled() => {
            debug!("Keys scan from cursor {} cancelled", cursor);
            return Err(e);
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(KeysAction::LoadMoreKeysFailure(message));
            return Err(e);
        }
    };

    let (database_size, scanned) = nodes
        .first()
        .map_or((0, 0), |node| (node.total, node.scanned));

    let mut page = parse_keys_list_response(&shards_meta, nodes);
    let mut keys = old_keys;
    keys.append(&mut page.keys);
    page.keys = keys;

    store.dispatch(KeysAction::LoadMoreKeysSuccess(page.clone()));
    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeysAdditionallyScanned,
            TelemetryEvent::TreeViewKeysAdditionallyScanned,
        ),
        json!({
            "databaseId": store.instance_id(),
            "databaseSize": database_size,
            "numberOfKeysScanned": previously_scanned + scanned,
            "scanCount": count,
        }),
    );

    Ok(page)
}

/// Clears the per-type slices whose state would otherwise leak into a key
/// of the same type selected next.
pub fn set_initial_state_by_type(store: &Store, key_type: KeyType) {
    match key_type {
        KeyType::Hash => store.dispatch(HashAction::SetHashInitialState),
        KeyType::List => store.dispatch(ListAction::SetListInitialState),
        KeyType::ZSet => store.dispatch(ZSetAction::SetZSetInitialState),
        KeyType::Stream => store.dispatch(StreamAction::SetStreamInitialState),
        _ => {}
    }
}

async fn key_info(store: &Store, key: &RedisBuffer) -> Result<KeyInfo, ApiError> {
    store
        .fetch(
            store
                .db_request(Method::Post, endpoints::KEY_INFO)
                .json(&KeyNameRequest {
                    key_name: key.clone(),
                }),
        )
        .await
}

fn selected_key_is(store: &Store, key: &RedisBuffer) -> bool {
    store.select(|state| state.browser.keys.selected_key.name() == Some(key))
}

/// Loads the metadata of `key` and then the first page of its value.
pub async fn fetch_key_info(
    store: &Store,
    key: &RedisBuffer,
    reset: bool,
) -> Result<KeyInfo, ApiError> {
    store.dispatch(KeysAction::DefaultSelectedKeyAction);

    let previous = store.select(|state| state.browser.keys.selected_key.data.clone());

    let info = match key_info(store, key).await {
        Ok(info) => info,
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(KeysAction::DefaultSelectedKeyActionFailure(message));
            if e.is_not_found() {
                store.dispatch(KeysAction::ResetKeyInfo);
                store.dispatch(TreeAction::SetBrowserSelectedKey(None));
            }
            return Err(e);
        }
    };

    store.dispatch(KeysAction::LoadKeyInfoSuccess(info.clone()));
    store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
    if previous.as_ref().is_some_and(|data| &data.name == key) {
        store.dispatch(KeysAction::UpdateKeySizeFromList {
            key: key.clone(),
            size: info.size,
        });
    }

    if previous.is_some_and(|data| data.key_type != info.key_type) {
        set_initial_state_by_type(store, info.key_type);
    }

    let count = store.config().scan_count_default;
    match info.key_type {
        KeyType::Hash => settle(
            fetch_hash_fields(store, key, 0, count, DEFAULT_SEARCH_MATCH, reset).await,
            "Hash fields fetch",
        ),
        KeyType::List => settle(
            fetch_list_elements(store, key, 0, count, reset).await,
            "List elements fetch",
        ),
        KeyType::String => settle(fetch_string(store, key, reset).await, "String fetch"),
        KeyType::ZSet => settle(
            fetch_zset_members(store, key, 0, count, SortOrder::Asc, reset).await,
            "Sorted set members fetch",
        ),
        KeyType::Set => settle(
            fetch_set_members(store, key, 0, count, DEFAULT_SEARCH_MATCH, reset).await,
            "Set members fetch",
        ),
        KeyType::Json => settle(
            fetch_re_json(store, key, JSON_ROOT_PATH, document_length(&info), reset).await,
            "JSON fetch",
        ),
        KeyType::Stream => {
            let view = store.select(|state| state.browser.stream.view_type);
            if view == StreamViewType::Data {
                settle(
                    fetch_stream_entries(store, key, count, SortOrder::Desc, reset).await,
                    "Stream entries fetch",
                );
            }
        }
        _ => {}
    }

    Ok(info)
}

/// Re-reads the metadata of `key` without touching the loaded value.
pub async fn refresh_key_info_action(
    store: &Store,
    key: &RedisBuffer,
) -> Result<KeyInfo, ApiError> {
    store.dispatch(KeysAction::RefreshKeyInfo);
    await_key_info_refresh(store, key).await
}

/// Second half of [`refresh_key_info_action`], for callers that dispatch
/// `RefreshKeyInfo` themselves and have more to dispatch before the reply.
pub(crate) async fn await_key_info_refresh(
    store: &Store,
    key: &RedisBuffer,
) -> Result<KeyInfo, ApiError> {
    match key_info(store, key).await {
        Ok(info) => {
            let is_selected = selected_key_is(store, key);
            store.dispatch(KeysAction::RefreshKeyInfoSuccess(info.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            if is_selected {
                store.dispatch(KeysAction::UpdateKeySizeFromList {
                    key: key.clone(),
                    size: info.size,
                });
            }
            Ok(info)
        }
        Err(e) => {
            store.dispatch(KeysAction::RefreshKeyInfoFail);
            store.notify_error(&e);
            if e.is_not_found() {
                store.dispatch(KeysAction::ResetKeyInfo);
                store.dispatch(active_listing(store).delete_key_from_list(key.clone()));
            }
            Err(e)
        }
    }
}

/// Refreshes the metadata and then the value of `key`.
pub async fn refresh_key(
    store: &Store,
    key: &RedisBuffer,
    key_type: KeyType,
) -> Result<(), ApiError> {
    let info = refresh_key_info_action(store, key).await?;

    match key_type {
        KeyType::Hash => settle(refresh_hash_fields(store, key, false).await, "Hash refresh"),
        KeyType::List => settle(refresh_list_elements(store, key, false).await, "List refresh"),
        KeyType::Set => settle(refresh_set_members(store, key, false).await, "Set refresh"),
        KeyType::ZSet => settle(refresh_zset_members(store, key, false).await, "Sorted set refresh"),
        KeyType::String => settle(fetch_string(store, key, false).await, "String refresh"),
        KeyType::Json => settle(
            fetch_re_json(store, key, JSON_ROOT_PATH, document_length(&info), false).await,
            "JSON refresh",
        ),
        KeyType::Stream => settle(refresh_stream(store, key, false).await, "Stream refresh"),
        KeyType::Graph | KeyType::TimeSeries | KeyType::Unknown => {}
    }

    Ok(())
}

/// Creates a key of any type through its type endpoint.
pub async fn add_typed_key<K: NewKey>(store: &Store, endpoint: &str, data: &K) -> Result<(), ApiError> {
    store.dispatch(KeysAction::AddKey);

    let request = store.db_request(Method::Post, endpoint).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(KeysAction::AddKeyFailure(message));
        return Err(e);
    }

    info!("Added {} key {}", K::KEY_TYPE.as_str(), data.key_name());
    store.dispatch(KeysAction::AddKeySuccess);
    store.dispatch(NotificationsAction::AddMessageNotification(
        messages::added_new_key(data.key_name()),
    ));
    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeyAdded,
            TelemetryEvent::TreeViewKeyAdded,
        ),
        json!({
            "databaseId": store.instance_id(),
            "keyType": K::KEY_TYPE.as_str(),
        }),
    );

    Ok(())
}

pub async fn add_hash_key(store: &Store, data: &CreateHashKey) -> Result<(), ApiError> {
    add_typed_key(store, endpoints::HASH, data).await
}

pub async fn add_zset_key(store: &Store, data: &CreateZSetKey) -> Result<(), ApiError> {
    add_typed_key(store, endpoints::ZSET, data).await
}

pub async fn add_set_key(store: &Store, data: &CreateSetKey) -> Result<(), ApiError> {
    add_typed_key(store, endpoints::SET, data).await
}

pub async fn add_string_key(store: &Store, data: &CreateStringKey) -> Result<(), ApiError> {
    add_typed_key(store, endpoints::STRING, data).await
}

pub async fn add_list_key(store: &Store, data: &CreateListKey) -> Result<(), ApiError> {
    add_typed_key(store, endpoints::LIST, data).await
}

pub async fn add_rejson_key(store: &Store, data: &CreateJsonKey) -> Result<(), ApiError> {
    add_typed_key(store, endpoints::REJSON, data).await
}

pub async fn add_stream_key(store: &Store, data: &CreateStreamKey) -> Result<(), ApiError> {
    add_typed_key(store, endpoints::STREAMS, data).await
}

pub fn delete_key_from_list(store: &Store, key: RedisBuffer) {
    store.dispatch(active_listing(store).delete_key_from_list(key));
}

pub fn edit_key_from_list(
    store: &Store,
    key: RedisBuffer,
    new_key: RedisBuffer,
) {
    store.dispatch(active_listing(store).edit_key_from_list(key, new_key));
}

pub fn edit_key_ttl_from_list(store: &Store, key: RedisBuffer, ttl: i64) {
    store.dispatch(active_listing(store).edit_key_ttl_from_list(key, ttl));
}

/// What happens once the last field, member, element or entry of a key is gone.
pub fn delete_selected_key_cascade(store: &Store, key: &RedisBuffer) {
    store.dispatch(KeysAction::DeleteSelectedKeySuccess);
    delete_key_from_list(store, key.clone());
    store.dispatch(NotificationsAction::AddMessageNotification(
        messages::deleted_key(key),
    ));
}

pub async fn delete_key_action(store: &Store, key: &RedisBuffer) -> Result<(), ApiError> {
    store.dispatch(KeysAction::DeleteSelectedKey);

    let request = store
        .db_request(Method::Delete, endpoints::KEYS)
        .json(&DeleteKeysRequest {
            key_names: vec![key.clone()],
        });
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(KeysAction::DeleteSelectedKeyFailure(message));
        return Err(e);
    }

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeysDeleted,
            TelemetryEvent::TreeViewKeysDeleted,
        ),
        json!({
            "databaseId": store.instance_id(),
            "numberOfDeletedKeys": 1,
        }),
    );
    delete_selected_key_cascade(store, key);

    Ok(())
}

/// Deletes whichever key is currently selected; a no-op without a selection.
pub async fn delete_selected_key_action(store: &Store) -> Result<(), ApiError> {
    let selected = store.select(|state| state.browser.keys.selected_key.name().cloned());

    match selected {
        Some(key) => delete_key_action(store, &key).await,
        None => Ok(()),
    }
}

pub async fn edit_key(
    store: &Store,
    key: &RedisBuffer,
    new_key: &RedisBuffer,
) -> Result<(), ApiError> {
    store.dispatch(KeysAction::DefaultSelectedKeyAction);

    let request = store
        .db_request(Method::Patch, endpoints::KEY_NAME)
        .json(&RenameKeyRequest {
            key_name: key.clone(),
            new_key_name: new_key.clone(),
        });
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(KeysAction::DefaultSelectedKeyActionFailure(message));
        return Err(e);
    }

    edit_key_from_list(store, key.clone(), new_key.clone());
    Ok(())
}

/// Sets the TTL of `key`; a TTL of zero removes the key.
pub async fn edit_key_ttl(store: &Store, key: &RedisBuffer, ttl: i64) -> Result<(), ApiError> {
    store.dispatch(KeysAction::DefaultSelectedKeyAction);

    let previous_ttl = store.select(|state| {
        state
            .browser
            .keys
            .selected_key
            .data
            .as_ref()
            .map(|data| data.ttl)
    });

    let request = store
        .db_request(Method::Patch, endpoints::KEY_TTL)
        .json(&UpdateKeyTtlRequest {
            key_name: key.clone(),
            ttl,
        });
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(KeysAction::DefaultSelectedKeyActionFailure(message));
        return Err(e);
    }

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeyTtlChanged,
            TelemetryEvent::TreeViewKeyTtlChanged,
        ),
        json!({
            "databaseId": store.instance_id(),
            "ttl": if ttl >= 0 { ttl } else { -1 },
            "previousTTL": previous_ttl,
        }),
    );

    if ttl != 0 {
        edit_key_ttl_from_list(store, key.clone(), ttl);
        settle(fetch_key_info(store, key, false).await, "Key info fetch");
    } else {
        store.dispatch(KeysAction::DeleteSelectedKeySuccess);
        delete_key_from_list(store, key.clone());
    }
    store.dispatch(KeysAction::DefaultSelectedKeyActionSuccess);

    Ok(())
}

/// Type, TTL and size for a batch of listed keys. Nothing is dispatched.
pub async fn fetch_keys_metadata(
    store: &Store,
    keys: Vec<RedisBuffer>,
    key_type: Option<KeyType>,
) -> Result<Vec<KeyListItem>, ApiError> {
    let request = store
        .db_request(Method::Post, endpoints::KEYS_METADATA)
        .json(&GetKeysMetadataRequest { keys, key_type });

    store.fetch(request).await.inspect_err(|e| {
        log::warn!("Failed to load keys metadata: {}", e);
    })
}
