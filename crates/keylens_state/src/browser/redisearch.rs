use crate::browser::keys::{KeyViewType, SearchHistoryState};
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::state::RequestStatus;
use crate::store::Store;
use keylens_core::{
    ApiError, CreateSearchIndexRequest, KeyListItem, KeysPage, Method, RedisBuffer, RequestKind,
    SearchHistoryItem, SearchIndexKeysRequest, SearchIndexKeysResponse, SearchIndexListResponse,
    TelemetryEvent, endpoints,
};
use log::{debug, info};
use serde_json::json;

const DEFAULT_QUERY: &str = "*";

/// Suffix of the backend message when the selected index was dropped.
const INDEX_NOT_FOUND: &str = "index not found";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexList {
    pub loading: bool,
    pub error: String,
    pub data: Vec<RedisBuffer>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedisearchState {
    pub loading: bool,
    pub error: String,
    pub search: String,
    pub is_searched: bool,
    pub selected_index: Option<RedisBuffer>,
    pub data: KeysPage,
    pub list: IndexList,
    pub create_index: RequestStatus,
    pub search_history: SearchHistoryState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedisearchAction {
    SetRedisearchInitialState,
    LoadKeys,
    LoadKeysSuccess { data: KeysPage, is_searched: bool },
    /// `None` for a superseded scan.
    LoadKeysFailure(Option<String>),
    LoadMoreKeys,
    LoadMoreKeysSuccess(KeysPage),
    LoadMoreKeysFailure(Option<String>),
    LoadList,
    LoadListSuccess(Vec<RedisBuffer>),
    LoadListFailure(String),
    CreateIndex,
    CreateIndexSuccess,
    CreateIndexFailure(String),
    SetSelectedIndex(Option<RedisBuffer>),
    SetLastBatchRedisearchKeys(Vec<KeyListItem>),
    SetQueryRedisearch(String),
    ResetRedisearchKeysData,
    DeleteRedisearchKeyFromList(RedisBuffer),
    EditRedisearchKeyFromList { key: RedisBuffer, new_key: RedisBuffer },
    EditRedisearchKeyTtlFromList { key: RedisBuffer, ttl: i64 },
    LoadSearchHistory,
    LoadSearchHistorySuccess(Vec<SearchHistoryItem>),
    LoadSearchHistoryFailure,
    DeleteSearchHistorySuccess(Vec<String>),
}

pub fn reduce(state: &mut RedisearchState, action: RedisearchAction) {
    match action {
        RedisearchAction::SetRedisearchInitialState => *state = RedisearchState::default(),
        RedisearchAction::LoadKeys | RedisearchAction::LoadMoreKeys => {
            state.loading = true;
            state.error.clear();
        }
        RedisearchAction::LoadKeysSuccess { data, is_searched } => {
            state.data = KeysPage {
                previous_result_count: data.keys.len(),
                ..data
            };
            state.loading = false;
            state.is_searched = is_searched;
        }
        RedisearchAction::LoadKeysFailure(message)
        | RedisearchAction::LoadMoreKeysFailure(message) => {
            if let Some(message) = message {
                state.error = message;
            }
            state.loading = false;
        }
        RedisearchAction::LoadMoreKeysSuccess(page) => {
            state.data.previous_result_count = page.keys.len();
            state.data.keys = page.keys;
            state.data.total = page.total;
            state.data.scanned = page.scanned;
            state.data.next_cursor = page.next_cursor;
            state.loading = false;
        }
        RedisearchAction::LoadList => {
            state.list.loading = true;
            state.list.error.clear();
        }
        RedisearchAction::LoadListSuccess(indexes) => {
            state.list.loading = false;
            state.list.data = indexes;
        }
        RedisearchAction::LoadListFailure(message) => {
            state.list.loading = false;
            state.list.error = message;
        }
        RedisearchAction::CreateIndex => state.create_index.start(),
        RedisearchAction::CreateIndexSuccess => state.create_index.succeed(),
        RedisearchAction::CreateIndexFailure(message) => state.create_index.fail(message),
        RedisearchAction::SetSelectedIndex(index) => state.selected_index = index,
        RedisearchAction::SetLastBatchRedisearchKeys(batch) => {
            let keys = &mut state.data.keys;
            keys.truncate(keys.len().saturating_sub(batch.len()));
            keys.extend(batch);
        }
        RedisearchAction::SetQueryRedisearch(query) => state.search = query,
        RedisearchAction::ResetRedisearchKeysData => {
            state.data.total = 0;
            state.data.scanned = 0;
            state.data.keys.clear();
        }
        RedisearchAction::DeleteRedisearchKeyFromList(key) => {
            state.data.keys.retain(|item| item.name != key);
            state.data.total -= 1;
            state.data.scanned -= 1;
        }
        RedisearchAction::EditRedisearchKeyFromList { key, new_key } => {
            for item in state.data.keys.iter_mut().filter(|item| item.name == key) {
                item.name_string = Some(new_key.to_display_string());
                item.name = new_key.clone();
            }
        }
        RedisearchAction::EditRedisearchKeyTtlFromList { key, ttl } => {
            for item in state.data.keys.iter_mut().filter(|item| item.name == key) {
                item.ttl = Some(ttl);
            }
        }
        RedisearchAction::LoadSearchHistory => state.search_history.loading = true,
        RedisearchAction::LoadSearchHistorySuccess(items) => {
            state.search_history.loading = false;
            state.search_history.data = Some(items);
        }
        RedisearchAction::LoadSearchHistoryFailure => state.search_history.loading = false,
        RedisearchAction::DeleteSearchHistorySuccess(ids) => state.search_history.remove(&ids),
    }
}

async fn search_keys(store: &Store, cursor: &str, count: u32) -> Result<SearchIndexKeysResponse, ApiError> {
    let (index, query) = store.select(|state| {
        (
            state.browser.redisearch.selected_index.clone(),
            state.browser.redisearch.search.clone(),
        )
    });

    let token = store.requests().begin(RequestKind::RedisearchScan);
    let request = store
        .db_request(Method::Post, endpoints::REDISEARCH_SEARCH)
        .json(&SearchIndexKeysRequest {
            offset: cursor.parse().unwrap_or(0),
            limit: count,
            query: if query.is_empty() {
                DEFAULT_QUERY.to_string()
            } else {
                query
            },
            index: index.unwrap_or_default(),
        })
        .with_cancel(token.clone());

    let result = store.fetch(request).await;
    store.requests().finish(RequestKind::RedisearchScan, &token);
    result
}

/// Queries the selected index. A superseded query only clears `loading`.
pub async fn fetch_redisearch_keys(store: &Store, cursor: &str, count: u32) -> Result<KeysPage, ApiError> {
    store.dispatch(RedisearchAction::LoadKeys);

    match search_keys(store, cursor, count).await {
        Ok(response) => {
            let (query, view_type) = store.select(|state| {
                (
                    state.browser.redisearch.search.clone(),
                    state.browser.keys.view_type,
                )
            });
            let scanned = response.scanned;
            let mut page = response.into_page();
            page.last_refresh_time = Some(store.now());

            store.dispatch(RedisearchAction::LoadKeysSuccess {
                data: page.clone(),
                is_searched: !query.is_empty(),
            });

            if !query.is_empty() {
                let view = match view_type {
                    KeyViewType::Browser => "Browser",
                    KeyViewType::Tree => "Tree",
                };
                store.send_telemetry(
                    TelemetryEvent::SearchKeysSearched,
                    json!({
                        "view": view,
                        "databaseId": store.instance_id(),
                        "scanCount": scanned,
                    }),
                );
            }

            Ok(page)
        }
        Err(e) if e.is_cancelled() => {
            debug!("Search index query cancelled");
            store.dispatch(RedisearchAction::LoadKeysFailure(None));
            Err(e)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(RedisearchAction::LoadKeysFailure(Some(message.clone())));

            if message.to_lowercase().ends_with(INDEX_NOT_FOUND) {
                info!("Selected search index is gone, reloading the index list");
                store.dispatch(RedisearchAction::SetRedisearchInitialState);
                crate::browser::settle(
                    fetch_redisearch_list(store, true).await,
                    "Search index list fetch",
                );
            }
            Err(e)
        }
    }
}

pub async fn fetch_more_redisearch_keys(
    store: &Store,
    old_keys: Vec<KeyListItem>,
    cursor: &str,
    count: u32,
) -> Result<KeysPage, ApiError> {
    store.dispatch(RedisearchAction::LoadMoreKeys);

    match search_keys(store, cursor, count).await {
        Ok(response) => {
            let mut page = response.into_page();
            let mut keys = old_keys;
            keys.append(&mut page.keys);
            page.keys = keys;

            store.dispatch(RedisearchAction::LoadMoreKeysSuccess(page.clone()));
            Ok(page)
        }
        Err(e) if e.is_cancelled() => {
            debug!("Search index query cancelled");
            store.dispatch(RedisearchAction::LoadMoreKeysFailure(None));
            Err(e)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(RedisearchAction::LoadMoreKeysFailure(Some(message)));
            Err(e)
        }
    }
}

pub async fn fetch_redisearch_list(store: &Store, show_error: bool) -> Result<Vec<RedisBuffer>, ApiError> {
    store.dispatch(RedisearchAction::LoadList);

    let request = store.db_request(Method::Get, endpoints::REDISEARCH);
    match store.fetch::<SearchIndexListResponse>(request).await {
        Ok(response) => {
            store.dispatch(RedisearchAction::LoadListSuccess(response.indexes.clone()));
            Ok(response.indexes)
        }
        Err(e) => {
            let message = if show_error {
                store.notify_error(&e)
            } else {
                e.message()
            };
            store.dispatch(RedisearchAction::LoadListFailure(message));
            Err(e)
        }
    }
}

pub async fn create_redisearch_index(store: &Store, data: &CreateSearchIndexRequest) -> Result<(), ApiError> {
    store.dispatch(RedisearchAction::CreateIndex);

    let request = store.db_request(Method::Post, endpoints::REDISEARCH).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(RedisearchAction::CreateIndexFailure(message));
        return Err(e);
    }

    store.dispatch(RedisearchAction::CreateIndexSuccess);
    store.dispatch(NotificationsAction::AddMessageNotification(
        messages::create_index(),
    ));
    store.send_telemetry(
        TelemetryEvent::SearchIndexAdded,
        json!({
            "databaseId": store.instance_id(),
            "prefixes": data.prefixes.len(),
        }),
    );
    crate::browser::settle(
        fetch_redisearch_list(store, true).await,
        "Search index list fetch",
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(keys: &[&str]) -> KeysPage {
        KeysPage {
            total: 3,
            scanned: 3,
            next_cursor: "0".into(),
            keys: keys.iter().map(|key| KeyListItem::new(*key)).collect(),
            ..KeysPage::default()
        }
    }

    #[test]
    fn superseded_scan_keeps_previous_error() {
        let mut state = RedisearchState::default();
        reduce(&mut state, RedisearchAction::LoadKeys);
        reduce(
            &mut state,
            RedisearchAction::LoadKeysFailure(Some("boom".into())),
        );
        reduce(&mut state, RedisearchAction::LoadMoreKeys);
        reduce(&mut state, RedisearchAction::LoadMoreKeysFailure(None));

        assert!(!state.loading);
        assert!(state.error.is_empty());

        reduce(&mut state, RedisearchAction::LoadKeysFailure(Some("boom".into())));
        reduce(&mut state, RedisearchAction::LoadKeysFailure(None));
        assert_eq!(state.error, "boom");
    }

    #[test]
    fn list_mutations_match_by_bytes() {
        let mut state = RedisearchState {
            data: page(&["a", "b", "c"]),
            ..RedisearchState::default()
        };

        reduce(
            &mut state,
            RedisearchAction::DeleteRedisearchKeyFromList(RedisBuffer::new(b"b".to_vec())),
        );
        reduce(
            &mut state,
            RedisearchAction::EditRedisearchKeyFromList {
                key: "c".into(),
                new_key: "d".into(),
            },
        );

        assert_eq!(state.data.total, 2);
        assert_eq!(state.data.keys.len(), 2);
        assert_eq!(state.data.keys[1].name_string.as_deref(), Some("d"));
    }

    #[test]
    fn reset_keys_data_keeps_index_and_query() {
        let mut state = RedisearchState {
            data: page(&["a"]),
            search: "@name:foo".into(),
            selected_index: Some("idx".into()),
            ..RedisearchState::default()
        };

        reduce(&mut state, RedisearchAction::ResetRedisearchKeysData);

        assert!(state.data.keys.is_empty());
        assert_eq!(state.data.total, 0);
        assert_eq!(state.search, "@name:foo");
        assert_eq!(state.selected_index, Some(RedisBuffer::from("idx")));
    }
}
