use crate::browser::keys::{
    KeysAction, delete_selected_key_cascade, fetch_key_info, refresh_key_info_action,
};
use crate::browser::{settle, view_event};
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::state::RequestStatus;
use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, DeleteListElementsRequest, DeleteListElementsResponse,
    GetListElementsRequest, KeyNameRequest, KeyType, ListElementValue, ListElementsPage, Method,
    PushListElementsRequest, RedisBuffer, SetListElementRequest, TelemetryEvent, endpoints,
};
use serde_json::json;

/// A list element together with its position in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListElement {
    pub index: u64,
    pub element: RedisBuffer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListData {
    pub total: i64,
    pub key: Option<RedisBuffer>,
    pub key_name: RedisBuffer,
    pub elements: Vec<ListElement>,
    /// Set while the view shows a single element looked up by index.
    pub searched_index: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub loading: bool,
    pub error: String,
    pub data: ListData,
    pub update_value: RequestStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListAction {
    SetListInitialState,
    LoadListElements { reset: bool },
    LoadListElementsSuccess(ListElementsPage),
    LoadListElementsFailure(String),
    LoadMoreListElements,
    LoadMoreListElementsSuccess(ListElementsPage),
    LoadMoreListElementsFailure(String),
    LoadSearchingListElement(Option<u64>),
    LoadSearchingListElementSuccess { index: u64, value: ListElementValue },
    LoadSearchingListElementFailure(String),
    UpdateValue,
    UpdateValueSuccess,
    UpdateValueFailure(String),
    ResetUpdateValue,
    UpdateElementInList(SetListElementRequest),
    InsertListElements,
    InsertListElementsSuccess,
    InsertListElementsFailure(String),
    DeleteListElements,
    DeleteListElementsSuccess,
    DeleteListElementsFailure(String),
}

fn indexed(elements: Vec<RedisBuffer>, from: u64) -> impl Iterator<Item = ListElement> {
    elements
        .into_iter()
        .zip(from..)
        .map(|(element, index)| ListElement { index, element })
}

pub fn reduce(state: &mut ListState, action: ListAction) {
    match action {
        ListAction::SetListInitialState => *state = ListState::default(),
        ListAction::LoadListElements { reset } => {
            state.loading = true;
            state.error.clear();
            if reset {
                state.data = ListData::default();
            }
        }
        ListAction::LoadListElementsSuccess(page) => {
            state.loading = false;
            state.data.key = Some(page.key_name.clone());
            state.data.key_name = page.key_name;
            state.data.total = page.total;
            state.data.elements = indexed(page.elements, 0).collect();
        }
        ListAction::LoadMoreListElements => {
            state.loading = true;
            state.error.clear();
            state.data.searched_index = None;
        }
        ListAction::LoadMoreListElementsSuccess(page) => {
            state.loading = false;
            let from = state.data.elements.len() as u64;
            state.data.elements.extend(indexed(page.elements, from));
        }
        ListAction::LoadSearchingListElement(index) => {
            state.loading = true;
            state.error.clear();
            state.data.elements.clear();
            state.data.searched_index = index;
        }
        ListAction::LoadSearchingListElementSuccess { index, value } => {
            state.loading = false;
            state.data.elements = vec![ListElement {
                index,
                element: value.value,
            }];
        }
        ListAction::InsertListElements | ListAction::DeleteListElements => {
            state.loading = true;
            state.error.clear();
        }
        ListAction::InsertListElementsSuccess | ListAction::DeleteListElementsSuccess => {
            state.loading = false;
            state.error.clear();
        }
        ListAction::LoadListElementsFailure(message)
        | ListAction::LoadMoreListElementsFailure(message)
        | ListAction::LoadSearchingListElementFailure(message)
        | ListAction::InsertListElementsFailure(message)
        | ListAction::DeleteListElementsFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        ListAction::UpdateValue => state.update_value.start(),
        ListAction::UpdateValueSuccess => state.update_value.succeed(),
        ListAction::UpdateValueFailure(message) => state.update_value.fail(message),
        ListAction::ResetUpdateValue => state.update_value = RequestStatus::default(),
        ListAction::UpdateElementInList(update) => {
            // A searched element is always the only row shown.
            let position = if state.data.elements.len() == 1 {
                Some(0)
            } else {
                usize::try_from(update.index).ok()
            };
            if let Some(slot) = position.and_then(|i| state.data.elements.get_mut(i)) {
                *slot = ListElement {
                    index: update.index,
                    element: update.element,
                };
            }
        }
    }
}

fn elements_request(store: &Store, key: &RedisBuffer, offset: u64, count: u32) -> ApiRequest {
    store
        .db_request(Method::Post, endpoints::LIST_GET_ELEMENTS)
        .json(&GetListElementsRequest {
            key_name: key.clone(),
            offset,
            count,
        })
}

pub async fn fetch_list_elements(
    store: &Store,
    key: &RedisBuffer,
    offset: u64,
    count: u32,
    reset: bool,
) -> Result<ListElementsPage, ApiError> {
    store.dispatch(ListAction::LoadListElements { reset });

    match store
        .fetch::<ListElementsPage>(elements_request(store, key, offset, count))
        .await
    {
        Ok(page) => {
            store.dispatch(ListAction::LoadListElementsSuccess(page.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ListAction::LoadListElementsFailure(message));
            Err(e)
        }
    }
}

pub async fn fetch_more_list_elements(
    store: &Store,
    key: &RedisBuffer,
    offset: u64,
    count: u32,
) -> Result<ListElementsPage, ApiError> {
    store.dispatch(ListAction::LoadMoreListElements);

    match store
        .fetch::<ListElementsPage>(elements_request(store, key, offset, count))
        .await
    {
        Ok(page) => {
            store.dispatch(ListAction::LoadMoreListElementsSuccess(page.clone()));
            Ok(page)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ListAction::LoadMoreListElementsFailure(message));
            Err(e)
        }
    }
}

/// Looks up a single element by its index in the list.
pub async fn fetch_searching_list_element(
    store: &Store,
    key: &RedisBuffer,
    index: u64,
) -> Result<ListElementValue, ApiError> {
    store.dispatch(ListAction::LoadSearchingListElement(Some(index)));

    let request = store
        .db_request(Method::Post, &endpoints::list_element_url(index))
        .json(&KeyNameRequest {
            key_name: key.clone(),
        });

    match store.fetch::<ListElementValue>(request).await {
        Ok(value) => {
            store.dispatch(ListAction::LoadSearchingListElementSuccess {
                index,
                value: value.clone(),
            });
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(value)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ListAction::LoadSearchingListElementFailure(message));
            Err(e)
        }
    }
}

/// Re-runs whichever view is active: the searched element or the first page.
pub async fn refresh_list_elements(store: &Store, key: &RedisBuffer, reset: bool) -> Result<(), ApiError> {
    let searched_index = store.select(|state| state.browser.list.data.searched_index);

    match searched_index {
        Some(index) => fetch_searching_list_element(store, key, index).await.map(|_| ()),
        None => {
            let count = store.config().scan_count_default;
            fetch_list_elements(store, key, 0, count, reset).await.map(|_| ())
        }
    }
}

pub async fn update_list_element(store: &Store, data: &SetListElementRequest) -> Result<(), ApiError> {
    store.dispatch(ListAction::UpdateValue);

    let request = store.db_request(Method::Patch, endpoints::LIST).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(ListAction::UpdateValueFailure(message));
        return Err(e);
    }

    store.dispatch(ListAction::UpdateValueSuccess);
    store.dispatch(ListAction::UpdateElementInList(data.clone()));
    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeyValueEdited,
            TelemetryEvent::TreeViewKeyValueEdited,
        ),
        json!({
            "databaseId": store.instance_id(),
            "keyType": KeyType::List.as_str(),
        }),
    );
    settle(
        refresh_key_info_action(store, &data.key_name).await,
        "Key info refresh",
    );
    Ok(())
}

pub async fn insert_list_elements(store: &Store, data: &PushListElementsRequest) -> Result<(), ApiError> {
    store.dispatch(ListAction::InsertListElements);

    let request = store.db_request(Method::Put, endpoints::LIST).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(ListAction::InsertListElementsFailure(message));
        return Err(e);
    }

    store.dispatch(ListAction::InsertListElementsSuccess);
    settle(
        fetch_key_info(store, &data.key_name, false).await,
        "Key info fetch",
    );
    Ok(())
}

/// Pops `count` elements from one end and returns the remaining element count
/// as computed from the cached total.
pub async fn delete_list_elements(store: &Store, data: &DeleteListElementsRequest) -> Result<i64, ApiError> {
    store.dispatch(ListAction::DeleteListElements);

    let total = store.select(|state| state.browser.list.data.total);
    let request = store
        .db_request(Method::Delete, endpoints::LIST_DELETE_ELEMENTS)
        .json(data);

    let response = match store.fetch::<DeleteListElementsResponse>(request).await {
        Ok(response) => response,
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(ListAction::DeleteListElementsFailure(message));
            return Err(e);
        }
    };

    let new_total = total - data.count;
    store.dispatch(ListAction::DeleteListElementsSuccess);

    if new_total > 0 {
        settle(
            fetch_key_info(store, &data.key_name, false).await,
            "Key info fetch",
        );
        store.dispatch(NotificationsAction::AddMessageNotification(
            messages::removed_list_elements(&data.key_name, data.count, &response.elements),
        ));
    } else {
        delete_selected_key_cascade(store, &data.key_name);
    }

    Ok(new_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(elements: &[&str]) -> ListElementsPage {
        ListElementsPage {
            key_name: "list".into(),
            total: 10,
            elements: elements.iter().map(|element| (*element).into()).collect(),
        }
    }

    fn values(state: &ListState) -> Vec<(u64, String)> {
        state
            .data
            .elements
            .iter()
            .map(|item| (item.index, item.element.to_display_string()))
            .collect()
    }

    #[test]
    fn load_more_continues_indexes() {
        let mut state = ListState::default();
        reduce(&mut state, ListAction::LoadListElementsSuccess(page(&["a", "b"])));
        reduce(&mut state, ListAction::LoadMoreListElementsSuccess(page(&["c"])));

        assert_eq!(state.data.key, Some("list".into()));
        assert_eq!(
            values(&state),
            vec![(0, "a".into()), (1, "b".into()), (2, "c".into())]
        );
    }

    #[test]
    fn searched_element_replaces_rows_until_more_is_loaded() {
        let mut state = ListState::default();
        reduce(&mut state, ListAction::LoadListElementsSuccess(page(&["a", "b"])));

        reduce(&mut state, ListAction::LoadSearchingListElement(Some(5)));
        assert!(state.data.elements.is_empty());
        reduce(
            &mut state,
            ListAction::LoadSearchingListElementSuccess {
                index: 5,
                value: ListElementValue {
                    key_name: "list".into(),
                    value: "f".into(),
                },
            },
        );
        assert_eq!(values(&state), vec![(5, "f".into())]);
        assert_eq!(state.data.searched_index, Some(5));

        reduce(&mut state, ListAction::LoadMoreListElements);
        assert_eq!(state.data.searched_index, None);
    }

    #[test]
    fn update_in_list_targets_the_only_row_when_searching() {
        let mut state = ListState::default();
        reduce(
            &mut state,
            ListAction::LoadSearchingListElementSuccess {
                index: 7,
                value: ListElementValue {
                    key_name: "list".into(),
                    value: "old".into(),
                },
            },
        );

        reduce(
            &mut state,
            ListAction::UpdateElementInList(SetListElementRequest {
                key_name: "list".into(),
                element: "new".into(),
                index: 7,
            }),
        );

        assert_eq!(values(&state), vec![(7, "new".into())]);
    }

    #[test]
    fn update_in_list_ignores_out_of_range_index() {
        let mut state = ListState::default();
        reduce(&mut state, ListAction::LoadListElementsSuccess(page(&["a", "b"])));

        reduce(
            &mut state,
            ListAction::UpdateElementInList(SetListElementRequest {
                key_name: "list".into(),
                element: "z".into(),
                index: 9,
            }),
        );

        assert_eq!(values(&state), vec![(0, "a".into()), (1, "b".into())]);
    }
}
