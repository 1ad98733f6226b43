use keylens_core::{ApiError, Method, SortOrder, endpoints};
use keylens_state::browser::keys::{KeysAction, fetch_pattern_keys};
use keylens_state::browser::rejson::{JsonAction, fetch_re_json};
use keylens_state::browser::stream::{StreamAction, fetch_stream_entries};
use keylens_state::notifications::NotificationsAction;
use keylens_state::{Action, Store};
use keylens_test_support::FakeApi;
use keylens_test_support::fixtures::{DATABASE_ID, buffer, db, scan_node_json, stream_page_json};
use serde_json::json;

fn is_error_toast(action: &Action) -> bool {
    matches!(
        action,
        Action::Notifications(NotificationsAction::AddErrorNotification(_))
    )
}

#[tokio::test]
async fn newer_scan_cancels_the_one_in_flight() {
    let api = FakeApi::new()
        .hold(Method::Post, db(endpoints::KEYS))
        .with_response(
            Method::Post,
            db(endpoints::KEYS),
            json!([scan_node_json(0, 2, 2, &["a", "b"])]),
        );
    let store = Store::builder(api.clone().as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();
    store.record_actions();

    let (first, second) = tokio::join!(
        fetch_pattern_keys(&store, "0", 500),
        fetch_pattern_keys(&store, "0", 500),
    );

    assert_eq!(first.unwrap_err(), ApiError::Cancelled);
    assert_eq!(second.unwrap().keys.len(), 2);

    let actions = store.take_actions();
    assert!(!actions.iter().any(is_error_toast));
    assert!(!actions
        .iter()
        .any(|action| matches!(action, Action::Keys(KeysAction::LoadKeysFailure(_)))));
    assert_eq!(
        actions
            .iter()
            .filter(|action| matches!(action, Action::Keys(KeysAction::LoadKeysSuccess { .. })))
            .count(),
        1
    );
    assert_eq!(api.requests_to(Method::Post, &db(endpoints::KEYS)).len(), 2);
    assert!(!store.select(|state| state.browser.keys.loading));
}

#[tokio::test]
async fn superseded_json_fetch_leaves_no_trace() {
    let api = FakeApi::new()
        .hold(Method::Post, db(endpoints::REJSON_GET))
        .with_response(
            Method::Post,
            db(endpoints::REJSON_GET),
            json!({ "downloaded": true, "path": "$", "data": { "name": "x" }, "type": "object" }),
        );
    let store = Store::builder(api.as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();
    store.record_actions();

    let key = buffer("doc");
    let (first, second) = tokio::join!(
        fetch_re_json(&store, &key, "$.name", Some(10), false),
        fetch_re_json(&store, &key, "$", Some(10), false),
    );

    assert!(first.unwrap_err().is_cancelled());
    assert_eq!(second.unwrap().data, json!({ "name": "x" }));

    let actions = store.take_actions();
    assert!(!actions.iter().any(is_error_toast));
    assert!(!actions
        .iter()
        .any(|action| matches!(action, Action::Json(JsonAction::LoadRejsonBranchFailure(_)))));
    assert!(store.select(|state| state.browser.rejson.error.is_none()));
}

#[tokio::test]
async fn newer_entries_fetch_cancels_the_one_in_flight() {
    let api = FakeApi::new()
        .hold(Method::Post, db(endpoints::STREAMS_ENTRIES_GET))
        .with_response(
            Method::Post,
            db(endpoints::STREAMS_ENTRIES_GET),
            stream_page_json("stream_example", 2, &["1652942518811-0", "1652942518810-0"]),
        );
    let store = Store::builder(api.clone().as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();
    store.record_actions();

    let key = buffer("stream_example");
    let (first, second) = tokio::join!(
        fetch_stream_entries(&store, &key, 500, SortOrder::Desc, true),
        fetch_stream_entries(&store, &key, 500, SortOrder::Desc, true),
    );

    assert_eq!(first.unwrap_err(), ApiError::Cancelled);
    assert_eq!(second.unwrap().total, 2);

    let actions = store.take_actions();
    assert!(!actions.iter().any(is_error_toast));
    assert!(!actions
        .iter()
        .any(|action| matches!(action, Action::Stream(StreamAction::LoadEntriesFailure(_)))));
    assert_eq!(
        actions
            .iter()
            .filter(|action| matches!(action, Action::Stream(StreamAction::LoadEntriesSuccess { .. })))
            .count(),
        1
    );
    assert_eq!(api.requests_to(Method::Post, &db(endpoints::STREAMS_ENTRIES_GET)).len(), 2);
}

#[tokio::test]
async fn scan_failure_raises_toast_and_failure() {
    let api = FakeApi::new().with_error(
        Method::Post,
        db(endpoints::KEYS),
        500,
        json!({ "message": "Connection lost" }),
    );
    let store = Store::builder(api.as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();
    store.record_actions();

    let result = fetch_pattern_keys(&store, "0", 500).await;
    assert!(result.is_err());

    let actions = store.take_actions();
    assert!(actions.iter().any(is_error_toast));
    assert!(actions.contains(&Action::Keys(KeysAction::LoadKeysFailure(
        "Connection lost".into()
    ))));
    assert_eq!(store.select(|state| state.browser.keys.error.clone()), "Connection lost");
}
