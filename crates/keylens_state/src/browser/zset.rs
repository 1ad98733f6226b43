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
    ApiError, ApiRequest, DeleteResponse, DeleteZSetMembersRequest, GetZSetMembersRequest,
    KeyType, Method, RedisBuffer, SearchZSetMembersRequest, SortOrder, TelemetryEvent,
    ZSetMember, ZSetMembersPage, ZSetMembersRequest, endpoints,
};
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZSetData {
    pub total: i64,
    pub key: Option<RedisBuffer>,
    pub key_name: RedisBuffer,
    pub members: Vec<ZSetMember>,
    pub next_cursor: u64,
    /// Member filter of the search view; empty while browsing by rank.
    pub pattern: String,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZSetState {
    pub loading: bool,
    /// True while the view shows search results instead of a ranked page.
    pub searching: bool,
    pub error: String,
    pub data: ZSetData,
    pub update_score: RequestStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZSetAction {
    SetZSetInitialState,
    SetZSetMembers(Vec<ZSetMember>),
    LoadZSetMembers { sort_order: SortOrder, reset: bool },
    LoadZSetMembersSuccess(ZSetMembersPage),
    LoadZSetMembersFailure(String),
    LoadMoreZSetMembers,
    LoadMoreZSetMembersSuccess(ZSetMembersPage),
    LoadMoreZSetMembersFailure(String),
    SearchZSetMembers(String),
    SearchZSetMembersSuccess(ZSetMembersPage),
    SearchZSetMembersFailure(String),
    SearchMoreZSetMembers(String),
    SearchMoreZSetMembersSuccess(ZSetMembersPage),
    SearchMoreZSetMembersFailure(String),
    RemoveZSetMembers,
    RemoveZSetMembersSuccess,
    RemoveZSetMembersFailure(String),
    RemoveMembersFromList(Vec<RedisBuffer>),
    UpdateScore,
    UpdateScoreSuccess,
    UpdateScoreFailure(String),
    ResetUpdateScore,
    UpdateMembersInList(Vec<ZSetMember>),
}

fn search_pattern(pattern: &str) -> String {
    if pattern.is_empty() {
        "*".to_string()
    } else {
        pattern.to_string()
    }
}

pub fn reduce(state: &mut ZSetState, action: ZSetAction) {
    match action {
        ZSetAction::SetZSetInitialState => *state = ZSetState::default(),
        ZSetAction::SetZSetMembers(members) => state.data.members = members,
        ZSetAction::LoadZSetMembers { sort_order, reset } => {
            state.loading = true;
            state.searching = false;
            state.error.clear();
            if reset {
                state.data = ZSetData::default();
            }
            state.data.sort_order = sort_order;
        }
        ZSetAction::LoadZSetMembersSuccess(page) => {
            state.loading = false;
            state.data.key_name = page.key_name;
            state.data.members = page.members;
            state.data.total = page.total;
        }
        ZSetAction::SearchZSetMembers(pattern) => {
            state.loading = true;
            state.searching = true;
            state.error.clear();
            state.data = ZSetData {
                pattern,
                ..ZSetData::default()
            };
        }
        ZSetAction::SearchZSetMembersSuccess(page) => {
            state.loading = false;
            state.data.key = Some(page.key_name.clone());
            state.data.key_name = page.key_name;
            state.data.total = page.total;
            state.data.members = page.members;
            if let Some(cursor) = page.next_cursor {
                state.data.next_cursor = cursor;
            }
        }
        ZSetAction::SearchMoreZSetMembers(pattern) => {
            state.loading = true;
            state.searching = true;
            state.error.clear();
            state.data.pattern = pattern;
        }
        ZSetAction::SearchMoreZSetMembersSuccess(mut page) => {
            state.loading = false;
            if let Some(cursor) = page.next_cursor {
                state.data.next_cursor = cursor;
            }
            state.data.members.append(&mut page.members);
        }
        ZSetAction::LoadMoreZSetMembers => {
            state.loading = true;
            state.searching = false;
            state.error.clear();
        }
        ZSetAction::LoadMoreZSetMembersSuccess(mut page) => {
            state.loading = false;
            state.data.members.append(&mut page.members);
        }
        ZSetAction::RemoveZSetMembers => {
            state.loading = true;
            state.error.clear();
        }
        ZSetAction::RemoveZSetMembersSuccess => state.loading = false,
        ZSetAction::LoadZSetMembersFailure(message)
        | ZSetAction::LoadMoreZSetMembersFailure(message)
        | ZSetAction::SearchZSetMembersFailure(message)
        | ZSetAction::SearchMoreZSetMembersFailure(message)
        | ZSetAction::RemoveZSetMembersFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        ZSetAction::RemoveMembersFromList(names) => {
            state.data.members.retain(|member| !names.contains(&member.name));
            state.data.total -= 1;
        }
        ZSetAction::UpdateScore => state.update_score.start(),
        ZSetAction::UpdateScoreSuccess => state.update_score.succeed(),
        ZSetAction::UpdateScoreFailure(message) => state.update_score.fail(message),
        ZSetAction::ResetUpdateScore => state.update_score = RequestStatus::default(),
        ZSetAction::UpdateMembersInList(updates) => {
            for member in state.data.members.iter_mut() {
                if let Some(update) = updates.iter().find(|update| update.name == member.name) {
                    *member = update.clone();
                }
            }
        }
    }
}

fn ranked_request(store: &Store, key: &RedisBuffer, offset: u64, count: u32, sort_order: SortOrder) -> ApiRequest {
    store
        .db_request(Method::Post, endpoints::ZSET_GET_MEMBERS)
        .json(&GetZSetMembersRequest {
            key_name: key.clone(),
            offset,
            count,
            sort_order,
        })
}

fn search_request(store: &Store, key: &RedisBuffer, cursor: u64, count: u32, pattern: &str) -> ApiRequest {
    store
        .db_request(Method::Post, endpoints::ZSET_MEMBERS_SEARCH)
        .json(&SearchZSetMembersRequest {
            key_name: key.clone(),
            cursor,
            count,
            pattern: pattern.to_string(),
        })
}

pub async fn fetch_zset_members(
    store: &Store,
    key: &RedisBuffer,
    offset: u64,
    count: u32,
    sort_order: SortOrder,
    reset: bool,
) -> Result<ZSetMembersPage, ApiError> {
    store.dispatch(ZSetAction::LoadZSetMembers { sort_order, reset });

    match store
        .fetch::<ZSetMembersPage>(ranked_request(store, key, offset, count, sort_order))
        .await
    {
        Ok(page) => {
            store.dispatch(ZSetAction::LoadZSetMembersSuccess(page.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ZSetAction::LoadZSetMembersFailure(message));
            Err(e)
        }
    }
}

pub async fn fetch_more_zset_members(
    store: &Store,
    key: &RedisBuffer,
    offset: u64,
    count: u32,
    sort_order: SortOrder,
) -> Result<ZSetMembersPage, ApiError> {
    store.dispatch(ZSetAction::LoadMoreZSetMembers);

    match store
        .fetch::<ZSetMembersPage>(ranked_request(store, key, offset, count, sort_order))
        .await
    {
        Ok(page) => {
            store.dispatch(ZSetAction::LoadMoreZSetMembersSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ZSetAction::LoadMoreZSetMembersFailure(message));
            Err(e)
        }
    }
}

/// Scans members matching `pattern`. Switches the slice into search mode.
pub async fn fetch_search_zset_members(
    store: &Store,
    key: &RedisBuffer,
    cursor: u64,
    count: u32,
    pattern: &str,
) -> Result<ZSetMembersPage, ApiError> {
    store.dispatch(ZSetAction::SearchZSetMembers(search_pattern(pattern)));

    match store
        .fetch::<ZSetMembersPage>(search_request(store, key, cursor, count, pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(ZSetAction::SearchZSetMembersSuccess(page.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ZSetAction::SearchZSetMembersFailure(message));
            Err(e)
        }
    }
}

pub async fn fetch_search_more_zset_members(
    store: &Store,
    key: &RedisBuffer,
    cursor: u64,
    count: u32,
    pattern: &str,
) -> Result<ZSetMembersPage, ApiError> {
    store.dispatch(ZSetAction::SearchMoreZSetMembers(pattern.to_string()));

    match store
        .fetch::<ZSetMembersPage>(search_request(store, key, cursor, count, pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(ZSetAction::SearchMoreZSetMembersSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ZSetAction::SearchMoreZSetMembersFailure(message));
            Err(e)
        }
    }
}

/// Reloads the first page of whichever view is active, search or ranked.
pub async fn refresh_zset_members(store: &Store, key: &RedisBuffer, reset: bool) -> Result<ZSetMembersPage, ApiError> {
    let (searching, pattern, sort_order) = store.select(|state| {
        let zset = &state.browser.zset;
        (zset.searching, zset.data.pattern.clone(), zset.data.sort_order)
    });
    let count = store.config().scan_count_default;

    let (start, request) = if searching {
        (
            ZSetAction::SearchZSetMembers(search_pattern(&pattern)),
            search_request(store, key, 0, count, &pattern),
        )
    } else {
        (
            ZSetAction::LoadZSetMembers { sort_order, reset },
            ranked_request(store, key, 0, count, sort_order),
        )
    };
    store.dispatch(start);

    match store.fetch::<ZSetMembersPage>(request).await {
        Ok(page) if searching => {
            store.dispatch(ZSetAction::SearchZSetMembersSuccess(page.clone()));
            Ok(page)
        }
        Ok(page) => {
            store.dispatch(ZSetAction::LoadZSetMembersSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(if searching {
                ZSetAction::SearchZSetMembersFailure(message)
            } else {
                ZSetAction::LoadZSetMembersFailure(message)
            });
            Err(e)
        }
    }
}

async fn put_members(store: &Store, data: &ZSetMembersRequest) -> Result<(), ApiError> {
    store.dispatch(ZSetAction::UpdateScore);

    let request = store.db_request(Method::Put, endpoints::ZSET).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(ZSetAction::UpdateScoreFailure(message));
        return Err(e);
    }
    Ok(())
}

pub async fn add_zset_members(store: &Store, data: &ZSetMembersRequest) -> Result<(), ApiError> {
    put_members(store, data).await?;

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeyValueAdded,
            TelemetryEvent::TreeViewKeyValueAdded,
        ),
        json!({
            "databaseId": store.instance_id(),
            "keyType": KeyType::ZSet.as_str(),
            "numberOfAdded": data.members.len(),
        }),
    );
    store.dispatch(ZSetAction::UpdateScoreSuccess);
    settle(
        fetch_key_info(store, &data.key_name, false).await,
        "Key info fetch",
    );
    Ok(())
}

pub async fn update_zset_members(store: &Store, data: &ZSetMembersRequest) -> Result<(), ApiError> {
    put_members(store, data).await?;

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeyValueEdited,
            TelemetryEvent::TreeViewKeyValueEdited,
        ),
        json!({
            "databaseId": store.instance_id(),
            "keyType": KeyType::ZSet.as_str(),
        }),
    );
    store.dispatch(ZSetAction::UpdateScoreSuccess);
    store.dispatch(ZSetAction::UpdateMembersInList(data.members.clone()));
    settle(
        refresh_key_info_action(store, &data.key_name).await,
        "Key info refresh",
    );
    Ok(())
}

/// Returns the remaining member count computed from the cached total.
pub async fn delete_zset_members(
    store: &Store,
    key: &RedisBuffer,
    members: Vec<RedisBuffer>,
) -> Result<i64, ApiError> {
    store.dispatch(ZSetAction::RemoveZSetMembers);

    let total = store.select(|state| state.browser.zset.data.total);
    let request = store
        .db_request(Method::Delete, endpoints::ZSET_MEMBERS)
        .json(&DeleteZSetMembersRequest {
            key_name: key.clone(),
            members: members.clone(),
        });

    let response = match store.fetch::<DeleteResponse>(request).await {
        Ok(response) => response,
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ZSetAction::RemoveZSetMembersFailure(message));
            return Err(e);
        }
    };

    let new_total = total - response.affected;
    store.dispatch(ZSetAction::RemoveZSetMembersSuccess);
    store.dispatch(ZSetAction::RemoveMembersFromList(members.clone()));

    if new_total > 0 {
        store.dispatch(KeysAction::RefreshKeyInfo);
        let removed = members
            .iter()
            .map(RedisBuffer::to_display_string)
            .collect::<Vec<_>>()
            .join(", ");
        store.dispatch(NotificationsAction::AddMessageNotification(
            messages::removed_key_value(key, &removed, "Member"),
        ));
        settle(await_key_info_refresh(store, key).await, "Key info refresh");
    } else {
        delete_selected_key_cascade(store, key);
    }

    Ok(new_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(members: &[(&str, f64)], next_cursor: Option<u64>) -> ZSetMembersPage {
        ZSetMembersPage {
            key_name: "zset".into(),
            total: 3,
            members: members
                .iter()
                .map(|(name, score)| ZSetMember::new(*name, *score))
                .collect(),
            next_cursor,
        }
    }

    #[test]
    fn search_resets_data_and_keeps_pattern() {
        let mut state = ZSetState::default();
        reduce(
            &mut state,
            ZSetAction::LoadZSetMembers {
                sort_order: SortOrder::Desc,
                reset: true,
            },
        );
        reduce(&mut state, ZSetAction::LoadZSetMembersSuccess(page(&[("a", 1.0)], None)));
        assert!(!state.searching);
        assert_eq!(state.data.sort_order, SortOrder::Desc);

        reduce(&mut state, ZSetAction::SearchZSetMembers("b*".into()));
        assert!(state.searching);
        assert!(state.data.members.is_empty());
        assert_eq!(state.data.pattern, "b*");
        assert_eq!(state.data.sort_order, SortOrder::Asc);

        reduce(
            &mut state,
            ZSetAction::SearchZSetMembersSuccess(page(&[("b1", 2.0)], Some(12))),
        );
        reduce(
            &mut state,
            ZSetAction::SearchMoreZSetMembersSuccess(page(&[("b2", 3.0)], Some(0))),
        );

        assert_eq!(state.data.key, Some("zset".into()));
        assert_eq!(state.data.members.len(), 2);
        assert_eq!(state.data.next_cursor, 0);
    }

    #[test]
    fn members_are_patched_and_removed_by_name() {
        let mut state = ZSetState::default();
        reduce(
            &mut state,
            ZSetAction::LoadZSetMembersSuccess(page(&[("a", 1.0), ("b", 2.0)], None)),
        );

        reduce(
            &mut state,
            ZSetAction::UpdateMembersInList(vec![ZSetMember::new("b", 9.5)]),
        );
        assert_eq!(state.data.members[1].score, 9.5);

        reduce(
            &mut state,
            ZSetAction::RemoveMembersFromList(vec![RedisBuffer::new(b"a".to_vec())]),
        );
        assert_eq!(state.data.members, vec![ZSetMember::new("b", 9.5)]);
        assert_eq!(state.data.total, 2);
    }

    #[test]
    fn update_score_status_round_trip() {
        let mut state = ZSetState::default();
        reduce(&mut state, ZSetAction::UpdateScore);
        assert!(state.update_score.loading);
        reduce(&mut state, ZSetAction::UpdateScoreFailure("nope".into()));
        assert_eq!(state.update_score.error, "nope");
        reduce(&mut state, ZSetAction::ResetUpdateScore);
        assert_eq!(state.update_score, RequestStatus::default());
    }
}
