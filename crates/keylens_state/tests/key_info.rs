use keylens_core::{KeyType, Method, endpoints};
use keylens_state::browser::keys::{KeysAction, fetch_key_info};
use keylens_state::browser::tree::TreeAction;
use keylens_state::notifications::NotificationsAction;
use keylens_state::{Action, Store};
use keylens_test_support::FakeApi;
use keylens_test_support::fixtures::{
    DATABASE_ID, buffer, db, hash_page_json, key_info_json, set_page_json, stream_page_json,
};
use serde_json::{Value, json};

fn store_with(api: FakeApi) -> Store {
    Store::builder(api.as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build()
}

async fn loaded_paths(key_type: KeyType, value_endpoint: &str, value: Value) -> Vec<String> {
    let api = FakeApi::new()
        .with_response(
            Method::Post,
            db(endpoints::KEY_INFO),
            key_info_json("key", key_type, -1, 64, 2),
        )
        .with_response(Method::Post, db(value_endpoint), value);
    let store = store_with(api.clone());

    let info = fetch_key_info(&store, &buffer("key"), true).await.unwrap();
    assert_eq!(info.key_type, key_type);

    api.requests().into_iter().map(|request| request.path).collect()
}

#[tokio::test]
async fn key_type_picks_exactly_one_value_fetch() {
    let cases = [
        (
            KeyType::Hash,
            endpoints::HASH_GET_FIELDS,
            hash_page_json("key", 2, 0, &[("a", "1"), ("b", "2")]),
        ),
        (
            KeyType::Set,
            endpoints::SET_GET_MEMBERS,
            set_page_json("key", 2, 0, &["a", "b"]),
        ),
        (
            KeyType::Stream,
            endpoints::STREAMS_ENTRIES_GET,
            stream_page_json("key", 2, &["1652942518811-0", "1652942518810-0"]),
        ),
    ];

    for (key_type, endpoint, value) in cases {
        assert_eq!(
            loaded_paths(key_type, endpoint, value).await,
            vec![db(endpoints::KEY_INFO), db(endpoint)],
            "{key_type:?}"
        );
    }
}

#[tokio::test]
async fn missing_key_resets_selection() {
    let api = FakeApi::new().with_error(
        Method::Post,
        db(endpoints::KEY_INFO),
        404,
        json!({ "statusCode": 404, "message": "Key with this name does not exist.", "error": "Not Found" }),
    );
    let store = store_with(api.clone());
    store.record_actions();

    let result = fetch_key_info(&store, &buffer("gone"), true).await;
    assert!(result.unwrap_err().is_not_found());

    let actions = store.take_actions();
    assert_eq!(actions.len(), 5);
    assert_eq!(actions[0], Action::Keys(KeysAction::DefaultSelectedKeyAction));
    assert!(matches!(
        actions[1],
        Action::Notifications(NotificationsAction::AddErrorNotification(_))
    ));
    assert_eq!(
        actions[2],
        Action::Keys(KeysAction::DefaultSelectedKeyActionFailure(
            "Key with this name does not exist.".into()
        ))
    );
    assert_eq!(actions[3], Action::Keys(KeysAction::ResetKeyInfo));
    assert_eq!(actions[4], Action::Tree(TreeAction::SetBrowserSelectedKey(None)));
    assert_eq!(api.requests().len(), 1);
}
