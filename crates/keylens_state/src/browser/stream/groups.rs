use super::{StreamAction, StreamViewType};
use crate::browser::keys::KeysAction;
use crate::browser::settle;
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::store::Store;
use keylens_core::{
    AckPendingEntriesRequest, ApiError, ClaimPendingEntriesRequest, ClaimPendingEntriesResponse,
    Consumer, ConsumerGroup, CreateConsumerGroupsRequest, DeleteConsumerGroupsRequest,
    DeleteConsumersRequest, GetConsumersRequest, GetPendingMessagesRequest, KeyNameRequest,
    Method, PendingMessage, RedisBuffer, STREAM_RANGE_END, STREAM_RANGE_START,
    UpdateConsumerGroupRequest, endpoints,
};

fn selected_key(store: &Store) -> Result<RedisBuffer, ApiError> {
    store
        .select(|state| state.browser.keys.selected_key.name().cloned())
        .ok_or_else(|| ApiError::InvalidRequest("no stream key is selected".into()))
}

fn selected_group(store: &Store) -> Result<(RedisBuffer, RedisBuffer), ApiError> {
    let key = selected_key(store)?;
    let group = store
        .select(|state| state.browser.stream.groups.selected_group.clone())
        .ok_or_else(|| ApiError::InvalidRequest("no consumer group is selected".into()))?;
    Ok((key, group))
}

fn selected_consumer(store: &Store) -> Result<(RedisBuffer, RedisBuffer, RedisBuffer), ApiError> {
    let (key, group) = selected_group(store)?;
    let consumer = store
        .select(|state| state.browser.stream.groups.consumers.selected_consumer.clone())
        .ok_or_else(|| ApiError::InvalidRequest("no consumer is selected".into()))?;
    Ok((key, group, consumer))
}

/// Loads the groups of the selected stream. On failure the view drops back
/// to the entries. Without a selected key nothing is dispatched.
pub async fn fetch_consumer_groups(store: &Store, reset: bool) -> Result<Vec<ConsumerGroup>, ApiError> {
    let key = selected_key(store)?;
    store.dispatch(StreamAction::LoadConsumerGroups { reset });

    let request = store
        .db_request(Method::Post, endpoints::STREAMS_CONSUMER_GROUPS_GET)
        .json(&KeyNameRequest { key_name: key });
    match store.fetch::<Vec<ConsumerGroup>>(request).await {
        Ok(groups) => {
            let now = store.now();
            store.dispatch(StreamAction::LoadConsumerGroupsSuccess(groups.clone()));
            store.dispatch(StreamAction::UpdateGroupsRefreshTime(now));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(now));
            Ok(groups)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StreamAction::LoadConsumerGroupsFailure(message));
            store.dispatch(StreamAction::SetStreamViewType(StreamViewType::Data));
            Err(e)
        }
    }
}

/// Loads the consumers of the selected group. On failure the view drops back
/// to the groups.
pub async fn fetch_consumers(store: &Store, reset: bool) -> Result<Vec<Consumer>, ApiError> {
    let (key, group) = selected_group(store)?;
    store.dispatch(StreamAction::LoadConsumers { reset });

    let request = store
        .db_request(Method::Post, endpoints::STREAMS_CONSUMERS_GET)
        .json(&GetConsumersRequest {
            key_name: key,
            group_name: group,
        });
    match store.fetch::<Vec<Consumer>>(request).await {
        Ok(consumers) => {
            store.dispatch(StreamAction::LoadConsumersSuccess(consumers.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(consumers)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StreamAction::LoadConsumersFailure(message));
            store.dispatch(StreamAction::SetStreamViewType(StreamViewType::Groups));
            Err(e)
        }
    }
}

/// Loads the pending messages of the selected consumer. On failure the view
/// drops back to the consumers.
pub async fn fetch_consumer_messages(store: &Store, reset: bool) -> Result<Vec<PendingMessage>, ApiError> {
    let (key, group, consumer) = selected_consumer(store)?;
    store.dispatch(StreamAction::LoadConsumerMessages { reset });

    let request = store
        .db_request(Method::Post, endpoints::STREAMS_CONSUMERS_MESSAGES_GET)
        .json(&GetPendingMessagesRequest {
            key_name: key,
            group_name: group,
            consumer_name: consumer,
            start: STREAM_RANGE_START.to_string(),
            end: STREAM_RANGE_END.to_string(),
            count: store.config().scan_count_default,
        });
    match store.fetch::<Vec<PendingMessage>>(request).await {
        Ok(messages) => {
            store.dispatch(StreamAction::LoadConsumerMessagesSuccess(messages.clone()));
            store.dispatch(KeysAction::UpdateSelectedKeyRefreshTime(store.now()));
            Ok(messages)
        }
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StreamAction::LoadConsumerMessagesFailure(message));
            store.dispatch(StreamAction::SetStreamViewType(StreamViewType::Consumers));
            Err(e)
        }
    }
}

pub async fn add_new_group(store: &Store, data: &CreateConsumerGroupsRequest) -> Result<(), ApiError> {
    store.dispatch(StreamAction::AddNewGroup);

    let request = store
        .db_request(Method::Post, endpoints::STREAMS_CONSUMER_GROUPS)
        .json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(StreamAction::AddNewGroupFailure(message));
        return Err(e);
    }

    store.dispatch(StreamAction::AddNewGroupSuccess);
    settle(fetch_consumer_groups(store, false).await, "Consumer groups fetch");
    Ok(())
}

pub async fn modify_last_delivered_id(store: &Store, data: &UpdateConsumerGroupRequest) -> Result<(), ApiError> {
    store.dispatch(StreamAction::ModifyLastDeliveredId);

    let request = store
        .db_request(Method::Patch, endpoints::STREAMS_CONSUMER_GROUPS)
        .json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(StreamAction::ModifyLastDeliveredIdFailure(message));
        return Err(e);
    }

    store.dispatch(StreamAction::ModifyLastDeliveredIdSuccess);
    settle(fetch_consumer_groups(store, false).await, "Consumer groups fetch");
    Ok(())
}

pub async fn delete_consumer_groups(
    store: &Store,
    key: &RedisBuffer,
    groups: Vec<RedisBuffer>,
) -> Result<(), ApiError> {
    store.dispatch(StreamAction::DeleteConsumerGroups);

    let request = store
        .db_request(Method::Delete, endpoints::STREAMS_CONSUMER_GROUPS)
        .json(&DeleteConsumerGroupsRequest {
            key_name: key.clone(),
            consumer_groups: groups.clone(),
        });
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(StreamAction::DeleteConsumerGroupsFailure(message));
        return Err(e);
    }

    store.dispatch(StreamAction::DeleteConsumerGroupsSuccess);
    settle(fetch_consumer_groups(store, false).await, "Consumer groups fetch");
    store.dispatch(NotificationsAction::AddMessageNotification(
        messages::removed_key_value(key, &joined(&groups), "Group"),
    ));
    Ok(())
}

pub async fn delete_consumers(
    store: &Store,
    key: &RedisBuffer,
    group: &RedisBuffer,
    consumers: Vec<RedisBuffer>,
) -> Result<(), ApiError> {
    store.dispatch(StreamAction::DeleteConsumers);

    let request = store
        .db_request(Method::Delete, endpoints::STREAMS_CONSUMERS)
        .json(&DeleteConsumersRequest {
            key_name: key.clone(),
            group_name: group.clone(),
            consumer_names: consumers.clone(),
        });
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(StreamAction::DeleteConsumersFailure(message));
        return Err(e);
    }

    store.dispatch(StreamAction::DeleteConsumersSuccess);
    settle(fetch_consumers(store, false).await, "Consumers fetch");
    store.dispatch(NotificationsAction::AddMessageNotification(
        messages::removed_key_value(group, &joined(&consumers), "Consumer"),
    ));
    Ok(())
}

/// Ack and claim reload the groups twice, then the pending list.
async fn refresh_after_pending_change(store: &Store) {
    settle(fetch_consumer_groups(store, false).await, "Consumer groups fetch");
    settle(fetch_consumer_groups(store, false).await, "Consumer groups fetch");
    settle(fetch_consumer_messages(store, false).await, "Pending messages fetch");
}

/// Moves pending messages to another consumer and returns the claimed ids.
pub async fn claim_pending_messages(
    store: &Store,
    data: &ClaimPendingEntriesRequest,
) -> Result<Vec<String>, ApiError> {
    store.dispatch(StreamAction::ClaimConsumerMessages);

    let request = store
        .db_request(Method::Post, endpoints::STREAM_CLAIM_PENDING_MESSAGES)
        .json(data);
    let response = match store.fetch::<ClaimPendingEntriesResponse>(request).await {
        Ok(response) => response,
        Err(e) => {
            let message = store.notify_error(&e);
            store.dispatch(StreamAction::ClaimConsumerMessagesFailure(message));
            return Err(e);
        }
    };

    store.dispatch(StreamAction::ClaimConsumerMessagesSuccess);
    refresh_after_pending_change(store).await;
    Ok(response.affected)
}

pub async fn ack_pending_entries(store: &Store, data: &AckPendingEntriesRequest) -> Result<(), ApiError> {
    store.dispatch(StreamAction::AckPendingEntries);

    let request = store
        .db_request(Method::Post, endpoints::STREAM_ACK_PENDING_ENTRIES)
        .json(data);
    if let Err(e) = store.send(request).await {
        let message = store.notify_error(&e);
        store.dispatch(StreamAction::AckPendingEntriesFailure(message));
        return Err(e);
    }

    store.dispatch(StreamAction::AckPendingEntriesSuccess);
    refresh_after_pending_change(store).await;
    Ok(())
}

fn joined(names: &[RedisBuffer]) -> String {
    names
        .iter()
        .map(RedisBuffer::to_display_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use keylens_core::KeyType;
    use keylens_test_support::FakeApi;
    use keylens_test_support::fixtures::{DATABASE_ID, buffer_json, db, key_info};
    use serde_json::{Value, json};

    fn store_with(api: FakeApi) -> Store {
        Store::builder(api.as_service_arc())
            .with_instance(DATABASE_ID, "local")
            .build()
    }

    fn select_consumer(store: &Store) {
        store.dispatch(KeysAction::LoadKeyInfoSuccess(key_info(
            "stream_example",
            KeyType::Stream,
            -1,
            512,
        )));
        store.dispatch(StreamAction::SetSelectedGroup(Some("g1".into())));
        store.dispatch(StreamAction::SetSelectedConsumer(Some("alice".into())));
    }

    fn server_error() -> Value {
        json!({ "statusCode": 500, "message": "Connection lost", "error": "Internal" })
    }

    fn groups_json() -> Value {
        json!([{
            "name": buffer_json("g1"),
            "consumers": 1,
            "pending": 2,
            "lastDeliveredId": "1652942518810-0",
        }])
    }

    #[tokio::test]
    async fn failed_messages_fetch_drops_back_to_consumers() {
        let api = FakeApi::new().with_error(
            Method::Post,
            db(endpoints::STREAMS_CONSUMERS_MESSAGES_GET),
            500,
            server_error(),
        );
        let store = store_with(api);
        select_consumer(&store);
        store.record_actions();

        assert!(fetch_consumer_messages(&store, true).await.is_err());

        let actions = store.take_actions();
        assert_eq!(
            actions.last(),
            Some(&Action::Stream(StreamAction::SetStreamViewType(
                StreamViewType::Consumers
            )))
        );
        assert!(actions.contains(&Action::Stream(
            StreamAction::LoadConsumerMessagesFailure("Connection lost".into())
        )));
    }

    #[tokio::test]
    async fn failed_consumers_fetch_drops_back_to_groups() {
        let api = FakeApi::new().with_error(
            Method::Post,
            db(endpoints::STREAMS_CONSUMERS_GET),
            500,
            server_error(),
        );
        let store = store_with(api);
        select_consumer(&store);
        store.record_actions();

        assert!(fetch_consumers(&store, true).await.is_err());

        assert_eq!(
            store.take_actions().last(),
            Some(&Action::Stream(StreamAction::SetStreamViewType(
                StreamViewType::Groups
            )))
        );
    }

    #[tokio::test]
    async fn nothing_selected_dispatches_nothing() {
        let api = FakeApi::new();
        let store = store_with(api.clone());
        store.record_actions();

        let result = fetch_consumers(&store, true).await;

        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
        assert!(store.take_actions().is_empty());
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn ack_reloads_groups_twice_then_messages() {
        let api = FakeApi::new()
            .with_response(
                Method::Post,
                db(endpoints::STREAM_ACK_PENDING_ENTRIES),
                json!({ "affected": 1 }),
            )
            .with_response(
                Method::Post,
                db(endpoints::STREAMS_CONSUMER_GROUPS_GET),
                groups_json(),
            )
            .with_response(
                Method::Post,
                db(endpoints::STREAMS_CONSUMERS_MESSAGES_GET),
                json!([]),
            );
        let store = store_with(api.clone());
        select_consumer(&store);
        store.record_actions();

        ack_pending_entries(
            &store,
            &AckPendingEntriesRequest {
                key_name: "stream_example".into(),
                group_name: "g1".into(),
                entries: vec!["1652942518810-0".into()],
            },
        )
        .await
        .unwrap();

        let paths = api
            .requests()
            .into_iter()
            .map(|request| request.path)
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                db(endpoints::STREAM_ACK_PENDING_ENTRIES),
                db(endpoints::STREAMS_CONSUMER_GROUPS_GET),
                db(endpoints::STREAMS_CONSUMER_GROUPS_GET),
                db(endpoints::STREAMS_CONSUMERS_MESSAGES_GET),
            ]
        );

        let group_loads = store
            .take_actions()
            .into_iter()
            .filter(|action| {
                matches!(action, Action::Stream(StreamAction::LoadConsumerGroups { .. }))
            })
            .count();
        assert_eq!(group_loads, 2);
    }
}
