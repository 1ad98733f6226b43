use crate::browser::keys::{
    KeysAction, await_key_info_refresh, delete_selected_key_cascade, fetch_key_info,
};
use crate::browser::settle;
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, DeleteResponse, GetSetMembersRequest, Method, RedisBuffer,
    SetMembersPage, SetMembersRequest, endpoints,
};

const DEFAULT_MATCH: &str = "*";

#[derive(Debug, Clone, PartialEq)]
pub struct SetData {
    pub total: i64,
    pub key: Option<RedisBuffer>,
    pub key_name: RedisBuffer,
    pub members: Vec<RedisBuffer>,
    pub next_cursor: u64,
    pub pattern: String,
}

impl Default for SetData {
    fn default() -> Self {
        Self {
            total: 0,
            key: None,
            key_name: RedisBuffer::default(),
            members: Vec::new(),
            next_cursor: 0,
            pattern: DEFAULT_MATCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetState {
    pub loading: bool,
    pub error: String,
    pub data: SetData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetAction {
    SetSetMembers(Vec<RedisBuffer>),
    LoadSetMembers { pattern: String, reset: bool },
    LoadSetMembersSuccess(SetMembersPage),
    LoadSetMembersFailure(String),
    LoadMoreSetMembers,
    LoadMoreSetMembersSuccess(SetMembersPage),
    LoadMoreSetMembersFailure(String),
    AddSetMembers,
    AddSetMembersSuccess,
    AddSetMembersFailure(String),
    RemoveSetMembers,
    RemoveSetMembersSuccess,
    RemoveSetMembersFailure(String),
    RemoveMembersFromList(Vec<RedisBuffer>),
}

pub fn reduce(state: &mut SetState, action: SetAction) {
    match action {
        SetAction::SetSetMembers(members) => state.data.members = members,
        SetAction::LoadSetMembers { pattern, reset } => {
            state.loading = true;
            state.error.clear();
            if reset {
                state.data = SetData::default();
            }
            state.data.pattern = if pattern.is_empty() {
                DEFAULT_MATCH.to_string()
            } else {
                pattern
            };
        }
        SetAction::LoadSetMembersSuccess(page) => {
            state.loading = false;
            state.data.key = Some(page.key_name.clone());
            state.data.key_name = page.key_name;
            state.data.total = page.total;
            state.data.next_cursor = page.next_cursor;
            state.data.members = page.members;
        }
        SetAction::LoadMoreSetMembersSuccess(mut page) => {
            state.loading = false;
            state.data.key_name = page.key_name;
            state.data.total = page.total;
            state.data.next_cursor = page.next_cursor;
            state.data.members.append(&mut page.members);
        }
        SetAction::LoadMoreSetMembers | SetAction::AddSetMembers | SetAction::RemoveSetMembers => {
            state.loading = true;
            state.error.clear();
        }
        SetAction::AddSetMembersSuccess | SetAction::RemoveSetMembersSuccess => {
            state.loading = false;
        }
        SetAction::LoadSetMembersFailure(message)
        | SetAction::LoadMoreSetMembersFailure(message)
        | SetAction::AddSetMembersFailure(message)
        | SetAction::RemoveSetMembersFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        SetAction::RemoveMembersFromList(members) => {
            state.data.members.retain(|member| !members.contains(member));
            state.data.total -= 1;
        }
    }
}

fn members_request(store: &Store, key: &RedisBuffer, cursor: u64, count: u32, pattern: &str) -> ApiRequest {
    store
        .db_request(Method::Post, endpoints::SET_GET_MEMBERS)
        .json(&GetSetMembersRequest {
            key_name: key.clone(),
            cursor,
            count,
            pattern: pattern.to_string(),
        })
}

pub async fn fetch_set_members(
    store: &Store,
    key: &RedisBuffer,
    cursor: u64,
    count: u32,
    pattern: &str,
    reset: bool,
) -> Result<SetMembersPage, ApiError> {
    store.dispatch(SetAction::LoadSetMembers {
        pattern: pattern.to_string(),
        reset,
    });

    match store
        .fetch::<SetMembersPage>(members_request(store, key, cursor, count, pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(SetAction::LoadSetMembersSuccess(page.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(SetAction::LoadSetMembersFailure(message));
            Err(e)
        }
    }
}

pub async fn fetch_more_set_members(
    store: &Store,
    key: &RedisBuffer,
    cursor: u64,
    count: u32,
    pattern: &str,
) -> Result<SetMembersPage, ApiError> {
    store.dispatch(SetAction::LoadMoreSetMembers);

    match store
        .fetch::<SetMembersPage>(members_request(store, key, cursor, count, pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(SetAction::LoadMoreSetMembersSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(SetAction::LoadMoreSetMembersFailure(message));
            Err(e)
        }
    }
}

pub async fn refresh_set_members(store: &Store, key: &RedisBuffer, reset: bool) -> Result<SetMembersPage, ApiError> {
    let pattern = store.select(|state| state.browser.set.data.pattern.clone());
    store.dispatch(SetAction::LoadSetMembers {
        pattern: pattern.clone(),
        reset,
    });

    let count = store.config().scan_count_default;
    match store
        .fetch::<SetMembersPage>(members_request(store, key, 0, count, &pattern))
        .await
    {
        Ok(page) => {
            store.dispatch(SetAction::LoadSetMembersSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(SetAction::LoadSetMembersFailure(message));
            Err(e)
        }
    }
}

pub async fn add_set_members(store: &Store, data: &SetMembersRequest) -> Result<(), ApiError> {
    store.dispatch(SetAction::AddSetMembers);

    let request = store.db_request(Method::Put, endpoints::SET).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(SetAction::AddSetMembersFailure(message));
        return Err(e);
    }

    store.dispatch(SetAction::AddSetMembersSuccess);
    settle(
        fetch_key_info(store, &data.key_name, false).await,
        "Key info fetch",
    );
    Ok(())
}

/// Returns the remaining member count computed from the cached total.
pub async fn delete_set_members(
    store: &Store,
    key: &RedisBuffer,
    members: Vec<RedisBuffer>,
) -> Result<i64, ApiError> {
    store.dispatch(SetAction::RemoveSetMembers);

    let total = store.select(|state| state.browser.set.data.total);
    let request = store
        .db_request(Method::Delete, endpoints::SET_MEMBERS)
        .json(&SetMembersRequest {
            key_name: key.clone(),
            members: members.clone(),
        });

    let response = match store.fetch::<DeleteResponse>(request).await {
        Ok(response) => response,
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(SetAction::RemoveSetMembersFailure(message));
            return Err(e);
        }
    };

    let new_total = total - response.affected;
    store.dispatch(SetAction::RemoveSetMembersSuccess);
    store.dispatch(SetAction::RemoveMembersFromList(members.clone()));

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
