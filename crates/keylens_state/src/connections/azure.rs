use crate::connections::added_names;
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, AzureDatabase, AzureDatabaseAdded, AzureDatabaseRef, AzureImportResult,
    AzureSubscription, ImportAzureDatabasesRequest, TelemetryEvent, endpoints,
};
use log::info;
use serde_json::json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AzureLoaded {
    pub subscriptions: bool,
    pub databases: bool,
    pub databases_added: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AzureState {
    pub loading: bool,
    pub error: String,
    pub subscriptions: Option<Vec<AzureSubscription>>,
    pub selected_subscription: Option<AzureSubscription>,
    pub databases: Option<Vec<AzureDatabase>>,
    pub data_added: Vec<AzureDatabaseAdded>,
    pub loaded: AzureLoaded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AzureAction {
    LoadSubscriptionsAzure,
    LoadSubscriptionsAzureSuccess(Vec<AzureSubscription>),
    LoadSubscriptionsAzureFailure(String),
    SetSelectedSubscription(Option<AzureSubscription>),
    LoadDatabasesAzure,
    LoadDatabasesAzureSuccess(Vec<AzureDatabase>),
    LoadDatabasesAzureFailure(String),
    CreateDatabasesAzure,
    CreateDatabasesAzureSuccess(Vec<AzureImportResult>),
    CreateDatabasesAzureFailure(String),
    ResetDataAzure,
}

pub fn reduce(state: &mut AzureState, action: AzureAction) {
    match action {
        AzureAction::LoadSubscriptionsAzure
        | AzureAction::LoadDatabasesAzure
        | AzureAction::CreateDatabasesAzure => {
            state.loading = true;
            state.error.clear();
        }
        AzureAction::LoadSubscriptionsAzureSuccess(subscriptions) => {
            state.loading = false;
            state.loaded.subscriptions = true;
            state.subscriptions = Some(subscriptions);
        }
        AzureAction::SetSelectedSubscription(subscription) => {
            if state.selected_subscription != subscription {
                state.databases = None;
                state.loaded.databases = false;
            }
            state.selected_subscription = subscription;
        }
        AzureAction::LoadDatabasesAzureSuccess(databases) => {
            state.loading = false;
            state.loaded.databases = true;
            state.databases = Some(databases);
        }
        AzureAction::CreateDatabasesAzureSuccess(results) => {
            state.loading = false;
            state.loaded.databases_added = true;
            let known = state.databases.as_deref().unwrap_or_default();
            state.data_added = results
                .into_iter()
                .map(|result| AzureDatabaseAdded {
                    database: known.iter().find(|db| db.id == result.id).cloned(),
                    id: result.id,
                    status_added: result.status,
                    message_added: result.message,
                })
                .collect();
        }
        AzureAction::LoadSubscriptionsAzureFailure(message)
        | AzureAction::LoadDatabasesAzureFailure(message)
        | AzureAction::CreateDatabasesAzureFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        AzureAction::ResetDataAzure => *state = AzureState::default(),
    }
}

pub async fn fetch_azure_subscriptions(store: &Store) -> Result<Vec<AzureSubscription>, ApiError> {
    store.dispatch(AzureAction::LoadSubscriptionsAzure);

    match store
        .fetch::<Vec<AzureSubscription>>(ApiRequest::get(endpoints::AZURE_SUBSCRIPTIONS))
        .await
    {
        Ok(subscriptions) => {
            store.dispatch(AzureAction::LoadSubscriptionsAzureSuccess(subscriptions.clone()));
            Ok(subscriptions)
        }
        Err(e) => {
            store.dispatch(AzureAction::LoadSubscriptionsAzureFailure(e.message()));
            store.notify_error(&e);
            Err(e)
        }
    }
}

/// Selects `subscription` and lists the Redis databases it holds.
pub async fn fetch_azure_databases(
    store: &Store,
    subscription: &AzureSubscription,
) -> Result<Vec<AzureDatabase>, ApiError> {
    store.dispatch(AzureAction::SetSelectedSubscription(Some(subscription.clone())));
    store.dispatch(AzureAction::LoadDatabasesAzure);

    let request = ApiRequest::get(endpoints::azure_subscription_databases_url(
        &subscription.subscription_id,
    ));
    match store.fetch::<Vec<AzureDatabase>>(request).await {
        Ok(databases) => {
            store.dispatch(AzureAction::LoadDatabasesAzureSuccess(databases.clone()));
            Ok(databases)
        }
        Err(e) => {
            store.dispatch(AzureAction::LoadDatabasesAzureFailure(e.message()));
            store.notify_error(&e);
            Err(e)
        }
    }
}

pub async fn add_azure_databases(
    store: &Store,
    databases: &[AzureDatabase],
) -> Result<Vec<AzureDatabaseAdded>, ApiError> {
    store.dispatch(AzureAction::CreateDatabasesAzure);

    let request = ApiRequest::post(endpoints::AZURE_DATABASES).json(&ImportAzureDatabasesRequest {
        databases: databases
            .iter()
            .map(|db| AzureDatabaseRef {
                id: db.id.clone(),
                subscription_id: db.subscription_id.clone(),
            })
            .collect(),
    });

    let results = match store.fetch::<Vec<AzureImportResult>>(request).await {
        Ok(results) => results,
        Err(e) => {
            store.dispatch(AzureAction::CreateDatabasesAzureFailure(e.message()));
            store.notify_error(&e);
            store.send_telemetry(
                TelemetryEvent::CloudImportFailed,
                json!({ "source": "azure", "error": e.message() }),
            );
            return Err(e);
        }
    };

    store.dispatch(AzureAction::CreateDatabasesAzureSuccess(results));
    let added = store.select(|state| state.connections.azure.data_added.clone());
    let names = added_names(added.iter().map(|row| {
        (
            row.status_added,
            row.database.as_ref().map(|db| db.name.as_str()),
        )
    }));

    let failed = added.len() - names.len();
    info!("Imported {} Azure databases, {} failed", names.len(), failed);

    if !names.is_empty() {
        store.send_telemetry(
            TelemetryEvent::CloudImportSucceeded,
            json!({ "source": "azure", "count": names.len() }),
        );
        store.dispatch(NotificationsAction::AddMessageNotification(
            messages::added_new_instances(&names),
        ));
    }
    if failed > 0 {
        store.send_telemetry(
            TelemetryEvent::CloudImportFailed,
            json!({ "source": "azure", "count": failed }),
        );
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylens_core::{ImportStatus, Method};
    use keylens_test_support::{FakeApi, RecordingTelemetry};
    use std::sync::Arc;

    fn subscription(id: &str) -> AzureSubscription {
        AzureSubscription {
            subscription_id: id.into(),
            display_name: format!("sub {id}"),
            state: "Enabled".into(),
        }
    }

    fn database(id: &str) -> AzureDatabase {
        AzureDatabase {
            id: id.into(),
            name: format!("cache-{id}"),
            subscription_id: "s1".into(),
            resource_group: "rg".into(),
            location: "westeurope".into(),
            host: format!("{id}.redis.cache.windows.net"),
            port: 6380,
            database_type: "cache".into(),
        }
    }

    #[test]
    fn changing_subscription_drops_databases() {
        let mut state = AzureState::default();
        reduce(&mut state, AzureAction::SetSelectedSubscription(Some(subscription("s1"))));
        reduce(&mut state, AzureAction::LoadDatabasesAzureSuccess(vec![database("a")]));

        reduce(&mut state, AzureAction::SetSelectedSubscription(Some(subscription("s1"))));
        assert!(state.databases.is_some());

        reduce(&mut state, AzureAction::SetSelectedSubscription(Some(subscription("s2"))));
        assert!(state.databases.is_none());
        assert!(!state.loaded.databases);
    }

    #[test]
    fn import_rows_keep_per_database_status() {
        let mut state = AzureState {
            databases: Some(vec![database("a"), database("b")]),
            ..Default::default()
        };
        reduce(
            &mut state,
            AzureAction::CreateDatabasesAzureSuccess(vec![
                AzureImportResult {
                    id: "a".into(),
                    status: ImportStatus::Success,
                    message: "Added".into(),
                },
                AzureImportResult {
                    id: "b".into(),
                    status: ImportStatus::Fail,
                    message: "Unreachable".into(),
                },
            ]),
        );

        assert!(state.loaded.databases_added);
        assert_eq!(state.data_added[0].database.as_ref().map(|db| db.name.as_str()), Some("cache-a"));
        assert_eq!(state.data_added[1].status_added, ImportStatus::Fail);
        assert_eq!(state.data_added[1].message_added, "Unreachable");
    }

    #[tokio::test]
    async fn import_reports_successes_and_failures() {
        let api = FakeApi::new().with_response(
            Method::Post,
            endpoints::AZURE_DATABASES,
            json!([
                { "id": "a", "status": "success", "message": "Added" },
                { "id": "b", "status": "fail", "message": "Unreachable" },
            ]),
        );
        let telemetry = Arc::new(RecordingTelemetry::new());
        let store = Store::builder(api.as_service_arc())
            .with_telemetry(telemetry.clone())
            .build();
        store.dispatch(AzureAction::LoadDatabasesAzureSuccess(vec![database("a"), database("b")]));

        let added = add_azure_databases(&store, &[database("a"), database("b")])
            .await
            .unwrap();

        assert_eq!(added.len(), 2);
        assert_eq!(
            telemetry.names(),
            vec![
                TelemetryEvent::CloudImportSucceeded.as_str(),
                TelemetryEvent::CloudImportFailed.as_str(),
            ]
        );
        assert_eq!(telemetry.events()[0].1["count"], json!(1));
        assert_eq!(
            store.select(|state| state.app.notifications.messages.len()),
            1
        );
    }
}
