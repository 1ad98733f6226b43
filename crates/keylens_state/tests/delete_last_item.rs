use keylens_core::{KeyType, Method, endpoints};
use keylens_state::browser::hash::{delete_hash_fields, fetch_hash_fields};
use keylens_state::browser::set::{delete_set_members, fetch_set_members};
use keylens_state::notifications::NotificationsAction;
use keylens_state::{Action, Store};
use keylens_test_support::FakeApi;
use keylens_test_support::fixtures::{
    DATABASE_ID, buffer, db, hash_page_json, key_info_json, set_page_json,
};
use serde_json::json;

/// Variant names of the slice actions, e.g. `RemoveHashFields`.
fn variant_names(actions: &[Action]) -> Vec<String> {
    actions
        .iter()
        .map(|action| {
            let debug = format!("{action:?}");
            let inner = debug.split_once('(').map_or(debug.as_str(), |(_, rest)| rest);
            inner
                .split(|c: char| !c.is_alphanumeric())
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

fn message_titles(actions: &[Action]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::Notifications(NotificationsAction::AddMessageNotification(payload)) => {
                Some(payload.title.clone())
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn deleting_every_field_removes_the_key() {
    let api = FakeApi::new()
        .with_response(
            Method::Post,
            db(endpoints::HASH_GET_FIELDS),
            hash_page_json("hash", 2, 0, &[("a", "1"), ("b", "2")]),
        )
        .with_response(Method::Delete, db(endpoints::HASH_FIELDS), json!({ "affected": 2 }));
    let store = Store::builder(api.clone().as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();

    let key = buffer("hash");
    fetch_hash_fields(&store, &key, 0, 500, "*", true).await.unwrap();

    store.record_actions();
    let remaining = delete_hash_fields(&store, &key, vec![buffer("a"), buffer("b")])
        .await
        .unwrap();

    assert_eq!(remaining, 0);
    let actions = store.take_actions();
    assert_eq!(
        variant_names(&actions),
        vec![
            "RemoveHashFields",
            "RemoveHashFieldsSuccess",
            "RemoveFieldsFromList",
            "DeleteSelectedKeySuccess",
            "DeletePatternKeyFromList",
            "AddMessageNotification",
        ]
    );
    assert_eq!(message_titles(&actions), vec!["Key has been deleted"]);
    assert!(api.requests_to(Method::Post, &db(endpoints::KEY_INFO)).is_empty());
}

#[tokio::test]
async fn deleting_some_fields_refreshes_the_key() {
    let api = FakeApi::new()
        .with_response(
            Method::Post,
            db(endpoints::HASH_GET_FIELDS),
            hash_page_json("hash", 10, 0, &[("a", "1"), ("b", "2")]),
        )
        .with_response(Method::Delete, db(endpoints::HASH_FIELDS), json!({ "affected": 2 }))
        .with_response(
            Method::Post,
            db(endpoints::KEY_INFO),
            key_info_json("hash", KeyType::Hash, -1, 120, 8),
        );
    let store = Store::builder(api.clone().as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();

    let key = buffer("hash");
    fetch_hash_fields(&store, &key, 0, 500, "*", true).await.unwrap();

    store.record_actions();
    let remaining = delete_hash_fields(&store, &key, vec![buffer("a"), buffer("b")])
        .await
        .unwrap();

    assert_eq!(remaining, 8);
    let actions = store.take_actions();
    assert_eq!(
        variant_names(&actions),
        vec![
            "RemoveHashFields",
            "RemoveHashFieldsSuccess",
            "RemoveFieldsFromList",
            "RefreshKeyInfo",
            "AddMessageNotification",
            "RefreshKeyInfoSuccess",
            "UpdateSelectedKeyRefreshTime",
        ]
    );
    assert_eq!(message_titles(&actions), vec!["Field has been removed"]);
    assert_eq!(api.requests_to(Method::Post, &db(endpoints::KEY_INFO)).len(), 1);
    assert_eq!(store.select(|state| state.browser.hash.data.total), 8);
}

#[tokio::test]
async fn key_info_failure_after_partial_delete_follows_the_toast() {
    let api = FakeApi::new()
        .with_response(
            Method::Post,
            db(endpoints::SET_GET_MEMBERS),
            set_page_json("set", 5, 0, &["a", "b"]),
        )
        .with_response(Method::Delete, db(endpoints::SET_MEMBERS), json!({ "affected": 1 }))
        .with_error(
            Method::Post,
            db(endpoints::KEY_INFO),
            404,
            json!({ "statusCode": 404, "message": "Key not found", "error": "Not Found" }),
        );
    let store = Store::builder(api.as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();

    let key = buffer("set");
    fetch_set_members(&store, &key, 0, 500, "*", true).await.unwrap();

    store.record_actions();
    let remaining = delete_set_members(&store, &key, vec![buffer("a")]).await.unwrap();

    assert_eq!(remaining, 4);
    assert_eq!(
        variant_names(&store.take_actions()),
        vec![
            "RemoveSetMembers",
            "RemoveSetMembersSuccess",
            "RemoveMembersFromList",
            "RefreshKeyInfo",
            "AddMessageNotification",
            "RefreshKeyInfoFail",
            "AddErrorNotification",
            "ResetKeyInfo",
            "DeletePatternKeyFromList",
        ]
    );
}

#[tokio::test]
async fn remaining_count_uses_the_cached_total() {
    let api = FakeApi::new()
        .with_response(
            Method::Post,
            db(endpoints::SET_GET_MEMBERS),
            set_page_json("set", 1, 0, &["m"]),
        )
        .with_response(Method::Delete, db(endpoints::SET_MEMBERS), json!({ "affected": 1 }));
    let store = Store::builder(api.as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();

    let key = buffer("set");
    fetch_set_members(&store, &key, 0, 500, "*", true).await.unwrap();

    store.record_actions();
    let remaining = delete_set_members(&store, &key, vec![buffer("m")]).await.unwrap();

    assert_eq!(remaining, 0);
    assert_eq!(message_titles(&store.take_actions()), vec!["Key has been deleted"]);
}
