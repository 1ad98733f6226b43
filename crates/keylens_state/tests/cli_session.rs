use keylens_core::{
    AppConfig, BrowserStorage, MemoryStorage, Method, StorageItem, endpoints, read_item,
};
use keylens_state::Store;
use keylens_state::app::{AppAction, ConnectedInstance};
use keylens_state::cli::format::{CONNECTION_CLOSED, CONNECTION_RECREATED};
use keylens_state::cli::output::{
    process_unsupported_command, send_cli_command, update_cli_history,
};
use keylens_state::cli::settings::{
    create_cli_client, fetch_unsupported_cli_commands, reset_cli_settings,
};
use keylens_test_support::FakeApi;
use keylens_test_support::fixtures::{DATABASE_ID, db};
use serde_json::json;
use std::sync::Arc;

fn send_path(uuid: &str) -> String {
    db(&endpoints::cli_command_url(uuid, endpoints::SEND_COMMAND))
}

#[tokio::test]
async fn create_then_select_switches_db() {
    let api = FakeApi::new()
        .with_response(Method::Post, db(endpoints::CLI), json!({ "uuid": "u-1" }))
        .with_response(
            Method::Post,
            send_path("u-1"),
            json!({ "response": "OK", "status": "success" }),
        );
    let session = Arc::new(MemoryStorage::new());
    let store = Store::builder(api.clone().as_service_arc())
        .with_session_storage(session.clone())
        .with_instance(DATABASE_ID, "local")
        .build();
    store.dispatch(AppAction::SetConnectedInstance(ConnectedInstance {
        id: DATABASE_ID.into(),
        name: "local".into(),
        db: 1,
    }));

    let uuid = create_cli_client(&store).await.unwrap();
    assert_eq!(uuid, "u-1");
    assert_eq!(
        read_item::<String>(session.as_ref(), StorageItem::CliClientUuid).as_deref(),
        Some("u-1")
    );
    assert_eq!(store.select(|state| state.cli.output.db), 1);

    send_cli_command(&store, "select 2").await.unwrap();

    let output = store.select(|state| state.cli.output.clone());
    assert_eq!(output.data, vec!["[db1] > select 2", "\"OK\""]);
    assert_eq!(output.db, 2);
    assert!(!output.loading);

    let body = api.last_body(Method::Post, &send_path("u-1")).unwrap();
    assert_eq!(body, json!({ "command": "select 2", "outputFormat": "RAW" }));
}

#[tokio::test]
async fn lost_client_is_recreated() {
    let api = FakeApi::new()
        .with_response(Method::Post, db(endpoints::CLI), json!({ "uuid": "u-1" }))
        .with_error(
            Method::Post,
            send_path("u-1"),
            404,
            json!({ "message": "Client not found", "error": "ClientNotFound" }),
        )
        .with_response(
            Method::Patch,
            db(&endpoints::cli_client_url("u-1")),
            json!({ "uuid": "u-1" }),
        );
    let store = Store::builder(api.as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();

    create_cli_client(&store).await.unwrap();
    let result = send_cli_command(&store, "get foo").await;
    assert!(result.is_err());

    let output = store.select(|state| state.cli.output.clone());
    assert_eq!(
        output.data,
        vec![
            "> get foo".to_string(),
            format!("(error) {CONNECTION_CLOSED}"),
            CONNECTION_RECREATED.to_string(),
        ]
    );
    assert_eq!(output.error, "Client not found");
    assert_eq!(store.select(|state| state.cli.settings.cli_client_uuid.clone()), "u-1");
}

#[tokio::test]
async fn command_error_is_printed() {
    let api = FakeApi::new()
        .with_response(Method::Post, db(endpoints::CLI), json!({ "uuid": "u-1" }))
        .with_error(
            Method::Post,
            send_path("u-1"),
            400,
            json!({ "message": "ERR wrong number of arguments" }),
        );
    let store = Store::builder(api.as_service_arc())
        .with_instance(DATABASE_ID, "local")
        .build();

    create_cli_client(&store).await.unwrap();
    let _ = send_cli_command(&store, "get").await;

    let output = store.select(|state| state.cli.output.data.clone());
    assert_eq!(output[1], "(error) ERR wrong number of arguments");
}

#[tokio::test]
async fn empty_command_sends_nothing() {
    let api = FakeApi::new();
    let store = Store::builder(api.clone().as_service_arc()).build();

    assert_eq!(send_cli_command(&store, "  ").await.unwrap(), None);
    assert!(api.requests().is_empty());
    assert!(store.select(|state| state.cli.output.data.is_empty()));
}

#[tokio::test]
async fn reset_closes_remembered_session() {
    let api = FakeApi::new().with_response(
        Method::Delete,
        db(&endpoints::cli_client_url("u-9")),
        json!({ "affected": 1 }),
    );
    let session = Arc::new(MemoryStorage::new());
    session.set(StorageItem::CliClientUuid, json!("u-9")).unwrap();
    let store = Store::builder(api.clone().as_service_arc())
        .with_session_storage(session)
        .with_instance(DATABASE_ID, "local")
        .build();

    reset_cli_settings(&store).await.unwrap();

    assert_eq!(
        api.requests_to(Method::Delete, &db(&endpoints::cli_client_url("u-9"))).len(),
        1
    );
    let settings = store.select(|state| state.cli.settings.clone());
    assert!(!settings.is_show_cli);
    assert!(settings.cli_client_uuid.is_empty());
}

#[tokio::test]
async fn history_is_newest_first_and_bounded() {
    let local = Arc::new(MemoryStorage::new());
    let store = Store::builder(FakeApi::new().as_service_arc())
        .with_local_storage(local.clone())
        .with_config(AppConfig {
            cli_history_limit: 2,
            ..AppConfig::default()
        })
        .build();

    update_cli_history(&store, "ping");
    update_cli_history(&store, "info");
    update_cli_history(&store, "info");
    update_cli_history(&store, "dbsize");

    let history = store.select(|state| state.cli.output.command_history.clone());
    assert_eq!(history, vec!["dbsize", "info"]);
    assert_eq!(
        read_item::<Vec<String>>(local.as_ref(), StorageItem::CliInputHistory),
        Some(vec!["dbsize".to_string(), "info".to_string()])
    );
}

#[tokio::test]
async fn unsupported_command_lists_others_but_monitor() {
    let api = FakeApi::new().with_response(
        Method::Get,
        endpoints::CLI_UNSUPPORTED_COMMANDS,
        json!(["MONITOR", "SUBSCRIBE", "SYNC"]),
    );
    let store = Store::builder(api.as_service_arc()).build();

    fetch_unsupported_cli_commands(&store).await.unwrap();
    process_unsupported_command(&store, "subscribe channel", "subscribe");

    let output = store.select(|state| state.cli.output.data.clone());
    assert_eq!(output.len(), 1);
    assert!(output[0].starts_with("(error) \"subscribe\" is not supported"));
    assert!(output[0].ends_with("subscribe, sync"));
}
