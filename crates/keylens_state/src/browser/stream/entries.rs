use super::{StreamAction, StreamViewType};
use super::groups::{fetch_consumer_groups, fetch_consumer_messages, fetch_consumers};
use crate::browser::keys::{
    KeysAction, await_key_info_refresh, delete_selected_key_cascade, refresh_key_info_action,
};
use crate::browser::{settle, view_event};
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::store::Store;
use keylens_core::{
    AddStreamEntriesRequest, ApiError, DeleteResponse, DeleteStreamEntriesRequest,
    GetStreamEntriesRequest, KeyType, Method, RedisBuffer, RequestKind, STREAM_RANGE_END,
    STREAM_RANGE_START, SortOrder, StreamEntriesPage, TelemetryEvent, endpoints,
};
use log::debug;
use serde_json::json;

fn or_default(bound: &str, default: &str) -> String {
    if bound.is_empty() {
        default.to_string()
    } else {
        bound.to_string()
    }
}

/// Loads the first page within the current range filter. A newer call
/// cancels one still in flight.
pub async fn fetch_stream_entries(
    store: &Store,
    key: &RedisBuffer,
    count: u32,
    sort_order: SortOrder,
    reset: bool,
) -> Result<StreamEntriesPage, ApiError> {
    store.dispatch(StreamAction::LoadEntries { reset });

    let range = store.select(|state| state.browser.stream.range.clone());
    let token = store.requests().begin(RequestKind::StreamEntries);
    let request = store
        .db_request(Method::Post, endpoints::STREAMS_ENTRIES_GET)
        .json(&GetStreamEntriesRequest {
            key_name: key.clone(),
            start: or_default(&range.start, STREAM_RANGE_START),
            end: or_default(&range.end, STREAM_RANGE_END),
            count,
            sort_order,
        })
        .with_cancel(token.clone());

    let result = store.fetch::<StreamEntriesPage>(request).await;
    store.requests().finish(RequestKind::StreamEntries, &token);

    match result {
        Ok(data) => {
            store.dispatch(StreamAction::LoadEntriesSuccess {
                data: data.clone(),
                sort_order,
            });
            Ok(data)
        }
        Err(e) if e.is_cancelled() => {
            debug!("Stream entries fetch for {} cancelled", key);
            Err(e)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StreamAction::LoadEntriesFailure(message));
            Err(e)
        }
    }
}

/// Loads the next page; `start` and `end` already exclude what is shown.
pub async fn fetch_more_stream_entries(
    store: &Store,
    key: &RedisBuffer,
    start: &str,
    end: &str,
    count: u32,
    sort_order: SortOrder,
) -> Result<StreamEntriesPage, ApiError> {
    store.dispatch(StreamAction::LoadMoreEntries);

    let request = store
        .db_request(Method::Post, endpoints::STREAMS_ENTRIES_GET)
        .json(&GetStreamEntriesRequest {
            key_name: key.clone(),
            start: start.to_string(),
            end: end.to_string(),
            count,
            sort_order,
        });

    match store.fetch::<StreamEntriesPage>(request).await {
        Ok(data) => {
            store.dispatch(StreamAction::LoadMoreEntriesSuccess(data.clone()));
            Ok(data)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StreamAction::LoadMoreEntriesFailure(message));
            Err(e)
        }
    }
}

pub async fn refresh_stream_entries(store: &Store, key: &RedisBuffer, reset: bool) -> Result<StreamEntriesPage, ApiError> {
    let sort_order = store.select(|state| state.browser.stream.sort_order);
    let count = store.config().scan_count_default;
    fetch_stream_entries(store, key, count, sort_order, reset).await
}

/// Refreshes whichever level of the stream view is on screen.
pub async fn refresh_stream(store: &Store, key: &RedisBuffer, reset: bool) -> Result<(), ApiError> {
    match store.select(|state| state.browser.stream.view_type) {
        StreamViewType::Data => refresh_stream_entries(store, key, reset).await.map(|_| ()),
        StreamViewType::Groups => fetch_consumer_groups(store, reset).await.map(|_| ()),
        StreamViewType::Consumers => fetch_consumers(store, reset).await.map(|_| ()),
        StreamViewType::Messages => fetch_consumer_messages(store, reset).await.map(|_| ()),
    }
}

pub async fn add_new_entries(store: &Store, data: &AddStreamEntriesRequest) -> Result<(), ApiError> {
    store.dispatch(StreamAction::AddNewEntries);

    let request = store.db_request(Method::Post, endpoints::STREAMS_ENTRIES).json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(StreamAction::AddNewEntriesFailure(message));
        return Err(e);
    }

    store.send_telemetry(
        view_event(
            store,
            TelemetryEvent::BrowserKeyValueAdded,
            TelemetryEvent::TreeViewKeyValueAdded,
        ),
        json!({
            "databaseId": store.instance_id(),
            "keyType": KeyType::Stream.as_str(),
            "numberOfAdded": data.entries.len(),
        }),
    );
    store.dispatch(StreamAction::AddNewEntriesSuccess);
    settle(
        refresh_key_info_action(store, &data.key_name).await,
        "Key info refresh",
    );
    settle(
        refresh_stream_entries(store, &data.key_name, false).await,
        "Stream entries refresh",
    );
    Ok(())
}

/// Returns the remaining entry count computed from the cached total.
pub async fn delete_stream_entries(
    store: &Store,
    key: &RedisBuffer,
    ids: Vec<String>,
) -> Result<i64, ApiError> {
    store.dispatch(StreamAction::RemoveStreamEntries);

    let total = store.select(|state| state.browser.stream.data.total);
    let request = store
        .db_request(Method::Delete, endpoints::STREAMS_ENTRIES)
        .json(&DeleteStreamEntriesRequest {
            key_name: key.clone(),
            entries: ids.clone(),
        });

    let response = match store.fetch::<DeleteResponse>(request).await {
        Ok(response) => response,
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StreamAction::RemoveStreamEntriesFailure(message));
            return Err(e);
        }
    };

    let new_total = total - response.affected;
    store.dispatch(StreamAction::RemoveStreamEntriesSuccess);
    store.dispatch(StreamAction::RemoveEntriesFromList(ids.clone()));

    if new_total > 0 {
        store.send_telemetry(
            view_event(
                store,
                TelemetryEvent::BrowserKeyValueRemoved,
                TelemetryEvent::TreeViewKeyValueRemoved,
            ),
            json!({
                "databaseId": store.instance_id(),
                "keyType": KeyType::Stream.as_str(),
                "numberOfRemoved": ids.len(),
            }),
        );
        store.dispatch(KeysAction::RefreshKeyInfo);
        store.dispatch(NotificationsAction::AddMessageNotification(
            messages::removed_key_value(key, &ids.join(", "), "Entry"),
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
    use crate::action::Action;
    use keylens_test_support::FakeApi;
    use keylens_test_support::fixtures::{DATABASE_ID, db, stream_page_json};
    use serde_json::json;

    #[tokio::test]
    async fn refresh_uses_stored_sort_order_and_full_range() {
        let api = FakeApi::new().with_response(
            Method::Post,
            db(endpoints::STREAMS_ENTRIES_GET),
            stream_page_json("stream_example", 1, &["1652942518810-0"]),
        );
        let store = Store::builder(api.clone().as_service_arc())
            .with_instance(DATABASE_ID, "local")
            .build();
        store.record_actions();

        refresh_stream_entries(&store, &"stream_example".into(), true)
            .await
            .unwrap();

        let body = api
            .last_body(Method::Post, &db(endpoints::STREAMS_ENTRIES_GET))
            .unwrap();
        assert_eq!(body["start"], json!("-"));
        assert_eq!(body["end"], json!("+"));
        assert_eq!(body["sortOrder"], json!("DESC"));

        let actions = store.take_actions();
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[0],
            Action::Stream(StreamAction::LoadEntries { reset: true })
        );
        assert!(matches!(
            &actions[1],
            Action::Stream(StreamAction::LoadEntriesSuccess {
                sort_order: SortOrder::Desc,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn failed_fetch_raises_toast_then_failure() {
        let api = FakeApi::new().with_error(
            Method::Post,
            db(endpoints::STREAMS_ENTRIES_GET),
            500,
            json!({ "message": "Something was wrong!" }),
        );
        let store = Store::builder(api.as_service_arc())
            .with_instance(DATABASE_ID, "local")
            .build();
        store.record_actions();

        let result =
            fetch_stream_entries(&store, &"stream_example".into(), 500, SortOrder::Desc, true).await;
        assert!(result.is_err());

        let actions = store.take_actions();
        assert!(matches!(
            actions[1],
            Action::Notifications(NotificationsAction::AddErrorNotification(_))
        ));
        assert_eq!(
            actions[2],
            Action::Stream(StreamAction::LoadEntriesFailure(
                "Something was wrong!".into()
            ))
        );
    }

    #[test]
    fn empty_bounds_fall_back_to_stream_limits() {
        assert_eq!(or_default("", STREAM_RANGE_START), "-");
        assert_eq!(or_default("100-0", STREAM_RANGE_START), "100-0");
    }
}
