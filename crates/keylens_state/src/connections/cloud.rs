use crate::browser::settle;
use crate::connections::added_names;
use crate::messages;
use crate::notifications::NotificationsAction;
use crate::store::Store;
use keylens_core::{
    ApiError, ApiRequest, CloudAccount, CloudCredentials, CloudDatabaseRef, CloudImportResult,
    CloudInstance, CloudInstanceAdded, CloudSubscription, CloudSubscriptionRef,
    GetCloudInstancesRequest, ImportCloudDatabasesRequest, Method, TelemetryEvent,
    endpoints,
};
use log::info;
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudAccountState {
    pub error: String,
    pub data: Option<CloudAccount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadedCloud {
    Subscriptions,
    Instances,
    InstancesAdded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloudLoaded {
    pub subscriptions: bool,
    pub instances: bool,
    pub instances_added: bool,
}

impl CloudLoaded {
    fn set(&mut self, which: LoadedCloud, value: bool) {
        match which {
            LoadedCloud::Subscriptions => self.subscriptions = value,
            LoadedCloud::Instances => self.instances = value,
            LoadedCloud::InstancesAdded => self.instances_added = value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudState {
    pub loading: bool,
    pub error: String,
    pub credentials: Option<CloudCredentials>,
    pub subscriptions: Option<Vec<CloudSubscription>>,
    pub data: Option<Vec<CloudInstance>>,
    pub data_added: Vec<CloudInstanceAdded>,
    pub account: CloudAccountState,
    pub loaded: CloudLoaded,
    /// Discovery goes through the signed-in cloud session instead of API keys.
    pub is_autodiscovery_sso: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CloudAction {
    LoadSubscriptionsRedisCloud,
    LoadSubscriptionsRedisCloudSuccess {
        data: Vec<CloudSubscription>,
        credentials: Option<CloudCredentials>,
    },
    LoadSubscriptionsRedisCloudFailure(String),
    LoadAccountRedisCloud,
    LoadAccountRedisCloudSuccess(CloudAccount),
    LoadAccountRedisCloudFailure(String),
    LoadInstancesRedisCloud,
    LoadInstancesRedisCloudSuccess(Vec<CloudInstance>),
    LoadInstancesRedisCloudFailure(String),
    CreateInstancesRedisCloud,
    CreateInstancesRedisCloudSuccess(Vec<CloudImportResult>),
    CreateInstancesRedisCloudFailure(String),
    ResetDataRedisCloud,
    ResetSubscriptionsRedisCloud,
    ResetLoadedRedisCloud(LoadedCloud),
    SetAutodiscoverySso(bool),
}

fn subscription_name(subscriptions: Option<&Vec<CloudSubscription>>, id: i64) -> Option<String> {
    subscriptions?
        .iter()
        .find(|subscription| subscription.id == id)
        .map(|subscription| subscription.name.clone())
}

pub fn reduce(state: &mut CloudState, action: CloudAction) {
    match action {
        CloudAction::LoadSubscriptionsRedisCloud
        | CloudAction::LoadAccountRedisCloud
        | CloudAction::LoadInstancesRedisCloud
        | CloudAction::CreateInstancesRedisCloud => {
            state.loading = true;
            state.error.clear();
        }
        CloudAction::LoadSubscriptionsRedisCloudSuccess { data, credentials } => {
            state.loading = false;
            state.loaded.subscriptions = true;
            state.subscriptions = Some(data);
            state.credentials = credentials;
        }
        CloudAction::LoadAccountRedisCloudSuccess(account) => {
            state.loading = false;
            state.account = CloudAccountState {
                error: String::new(),
                data: Some(account),
            };
        }
        CloudAction::LoadAccountRedisCloudFailure(message) => {
            state.loading = false;
            state.account = CloudAccountState {
                error: message,
                data: None,
            };
        }
        CloudAction::LoadInstancesRedisCloudSuccess(instances) => {
            state.loading = false;
            state.loaded.instances = true;
            let subscriptions = state.subscriptions.as_ref();
            state.data = Some(
                instances
                    .into_iter()
                    .map(|instance| {
                        let subscription = subscriptions.and_then(|all| {
                            all.iter().find(|s| s.id == instance.subscription_id)
                        });
                        CloudInstance {
                            free: instance.free || subscription.is_some_and(|s| s.free),
                            subscription_name: Some(
                                subscription.map(|s| s.name.clone()).unwrap_or_default(),
                            ),
                            ..instance
                        }
                    })
                    .collect(),
            );
        }
        CloudAction::CreateInstancesRedisCloudSuccess(results) => {
            state.loading = false;
            state.loaded.instances_added = true;
            let subscriptions = state.subscriptions.as_ref();
            let known = state.data.as_deref().unwrap_or_default();
            state.data_added = results
                .into_iter()
                .map(|result| {
                    let instance = result.database_details.or_else(|| {
                        known
                            .iter()
                            .find(|i| {
                                i.database_id == result.database_id
                                    && i.subscription_id == result.subscription_id
                            })
                            .cloned()
                    });
                    CloudInstanceAdded {
                        instance,
                        subscription_id_added: result.subscription_id,
                        database_id_added: result.database_id,
                        status_added: result.status,
                        message_added: result.message,
                        subscription_name: Some(
                            subscription_name(subscriptions, result.subscription_id)
                                .unwrap_or_default(),
                        ),
                    }
                })
                .collect();
        }
        CloudAction::LoadSubscriptionsRedisCloudFailure(message)
        | CloudAction::LoadInstancesRedisCloudFailure(message)
        | CloudAction::CreateInstancesRedisCloudFailure(message) => {
            state.loading = false;
            state.error = message;
        }
        CloudAction::ResetDataRedisCloud => *state = CloudState::default(),
        CloudAction::ResetSubscriptionsRedisCloud => {
            state.subscriptions = None;
            state.data = None;
            state.data_added.clear();
        }
        CloudAction::ResetLoadedRedisCloud(which) => state.loaded.set(which, false),
        CloudAction::SetAutodiscoverySso(sso) => state.is_autodiscovery_sso = sso,
    }
}

/// Picks the endpoint for the discovery mode and attaches the API key
/// headers when not going through the signed-in session.
fn cloud_request(
    method: Method,
    api_keys_endpoint: &str,
    sso_endpoint: &str,
    credentials: Option<&CloudCredentials>,
    sso: bool,
) -> ApiRequest {
    if sso {
        return ApiRequest::new(method, sso_endpoint);
    }

    let request = ApiRequest::new(method, api_keys_endpoint);
    match credentials {
        Some(credentials) => credentials
            .headers()
            .into_iter()
            .fold(request, |request, (name, value)| request.with_header(name, value)),
        None => request,
    }
}

/// Lists the subscriptions, then loads the account the credentials belong to.
pub async fn fetch_subscriptions_redis_cloud(
    store: &Store,
    credentials: Option<CloudCredentials>,
    sso: bool,
) -> Result<Vec<CloudSubscription>, ApiError> {
    store.dispatch(CloudAction::LoadSubscriptionsRedisCloud);
    store.dispatch(CloudAction::SetAutodiscoverySso(sso));

    let request = cloud_request(
        Method::Get,
        endpoints::REDIS_CLOUD_SUBSCRIPTIONS,
        endpoints::CLOUD_ME_AUTODISCOVERY_SUBSCRIPTIONS,
        credentials.as_ref(),
        sso,
    );
    let subscriptions = match store.fetch::<Vec<CloudSubscription>>(request).await {
        Ok(subscriptions) => subscriptions,
        Err(e) => {
            store.dispatch(CloudAction::LoadSubscriptionsRedisCloudFailure(e.message()));
            store.notify_error(&e);
            return Err(e);
        }
    };

    store.dispatch(CloudAction::LoadSubscriptionsRedisCloudSuccess {
        data: subscriptions.clone(),
        credentials: credentials.clone(),
    });
    settle(
        fetch_account_redis_cloud(store, credentials.as_ref(), sso).await,
        "Cloud account fetch",
    );
    Ok(subscriptions)
}

pub async fn fetch_account_redis_cloud(
    store: &Store,
    credentials: Option<&CloudCredentials>,
    sso: bool,
) -> Result<CloudAccount, ApiError> {
    store.dispatch(CloudAction::LoadAccountRedisCloud);

    let request = cloud_request(
        Method::Get,
        endpoints::REDIS_CLOUD_ACCOUNT,
        endpoints::CLOUD_ME_AUTODISCOVERY_ACCOUNT,
        credentials,
        sso,
    );
    match store.fetch::<CloudAccount>(request).await {
        Ok(account) => {
            store.dispatch(CloudAction::LoadAccountRedisCloudSuccess(account.clone()));
            Ok(account)
        }
        Err(e) => {
            store.dispatch(CloudAction::LoadAccountRedisCloudFailure(e.message()));
            store.notify_error(&e);
            Err(e)
        }
    }
}

pub async fn fetch_instances_redis_cloud(
    store: &Store,
    subscriptions: Vec<CloudSubscriptionRef>,
) -> Result<Vec<CloudInstance>, ApiError> {
    store.dispatch(CloudAction::LoadInstancesRedisCloud);

    let (credentials, sso) = store.select(|state| {
        let cloud = &state.connections.cloud;
        (cloud.credentials.clone(), cloud.is_autodiscovery_sso)
    });
    let request = cloud_request(
        Method::Post,
        endpoints::REDIS_CLOUD_GET_DATABASES,
        endpoints::CLOUD_ME_AUTODISCOVERY_GET_DATABASES,
        credentials.as_ref(),
        sso,
    )
    .json(&GetCloudInstancesRequest { subscriptions });

    match store.fetch::<Vec<CloudInstance>>(request).await {
        Ok(instances) => {
            store.dispatch(CloudAction::LoadInstancesRedisCloudSuccess(instances));
            Ok(store.select(|state| state.connections.cloud.data.clone().unwrap_or_default()))
        }
        Err(e) => {
            store.dispatch(CloudAction::LoadInstancesRedisCloudFailure(e.message()));
            store.notify_error(&e);
            Err(e)
        }
    }
}

/// Imports the chosen databases. The backend answers per database, so a
/// partial import still succeeds; the rows carry each outcome.
pub async fn add_instances_redis_cloud(
    store: &Store,
    databases: Vec<CloudDatabaseRef>,
) -> Result<Vec<CloudInstanceAdded>, ApiError> {
    store.dispatch(CloudAction::CreateInstancesRedisCloud);

    let (credentials, sso) = store.select(|state| {
        let cloud = &state.connections.cloud;
        (cloud.credentials.clone(), cloud.is_autodiscovery_sso)
    });
    let request = cloud_request(
        Method::Post,
        endpoints::REDIS_CLOUD_DATABASES,
        endpoints::CLOUD_ME_AUTODISCOVERY_DATABASES,
        credentials.as_ref(),
        sso,
    )
    .json(&ImportCloudDatabasesRequest { databases });

    let results = match store.fetch::<Vec<CloudImportResult>>(request).await {
        Ok(results) => results,
        Err(e) => {
            store.dispatch(CloudAction::CreateInstancesRedisCloudFailure(e.message()));
            store.notify_error(&e);
            store.send_telemetry(TelemetryEvent::CloudImportFailed, json!({ "error": e.message() }));
            return Err(e);
        }
    };

    store.dispatch(CloudAction::CreateInstancesRedisCloudSuccess(results));
    let added = store.select(|state| state.connections.cloud.data_added.clone());

    let names = added_names(added.iter().map(|row| {
        (
            row.status_added,
            row.instance.as_ref().map(|instance| instance.name.as_str()),
        )
    }));
    let failed = added.len() - names.len();
    info!("Imported {} Redis Cloud databases, {} failed", names.len(), failed);

    if !names.is_empty() {
        store.send_telemetry(
            TelemetryEvent::CloudImportSucceeded,
            json!({ "count": names.len() }),
        );
        store.dispatch(NotificationsAction::AddMessageNotification(
            messages::added_new_instances(&names),
        ));
    }
    if failed > 0 {
        store.send_telemetry(TelemetryEvent::CloudImportFailed, json!({ "count": failed }));
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylens_core::ImportStatus;

    fn subscription(id: i64, name: &str, free: bool) -> CloudSubscription {
        CloudSubscription {
            id,
            name: name.into(),
            number_of_databases: 1,
            provider: None,
            region: None,
            status: "active".into(),
            free,
        }
    }

    fn instance(subscription_id: i64, database_id: i64) -> CloudInstance {
        CloudInstance {
            subscription_id,
            database_id,
            name: format!("db-{database_id}"),
            public_endpoint: None,
            status: "active".into(),
            modules: vec![],
            free: false,
            subscription_name: None,
        }
    }

    #[test]
    fn instances_are_annotated_from_subscriptions() {
        let mut state = CloudState::default();
        reduce(
            &mut state,
            CloudAction::LoadSubscriptionsRedisCloudSuccess {
                data: vec![subscription(1, "paid", false), subscription(2, "trial", true)],
                credentials: None,
            },
        );
        reduce(
            &mut state,
            CloudAction::LoadInstancesRedisCloudSuccess(vec![instance(1, 10), instance(2, 20), instance(3, 30)]),
        );

        let data = state.data.unwrap();
        assert_eq!(data[0].subscription_name.as_deref(), Some("paid"));
        assert!(!data[0].free);
        assert_eq!(data[1].subscription_name.as_deref(), Some("trial"));
        assert!(data[1].free);
        assert_eq!(data[2].subscription_name.as_deref(), Some(""));
        assert!(state.loaded.instances);
    }

    #[test]
    fn import_rows_fall_back_to_listed_instances() {
        let mut state = CloudState {
            subscriptions: Some(vec![subscription(1, "paid", false)]),
            data: Some(vec![instance(1, 10)]),
            ..Default::default()
        };
        reduce(
            &mut state,
            CloudAction::CreateInstancesRedisCloudSuccess(vec![CloudImportResult {
                subscription_id: 1,
                database_id: 10,
                status: ImportStatus::Fail,
                message: "Already added".into(),
                database_details: None,
            }]),
        );

        let row = &state.data_added[0];
        assert_eq!(row.instance.as_ref().map(|i| i.name.as_str()), Some("db-10"));
        assert_eq!(row.status_added, ImportStatus::Fail);
        assert_eq!(row.message_added, "Already added");
        assert_eq!(row.subscription_name.as_deref(), Some("paid"));
    }

    #[test]
    fn sso_requests_carry_no_key_headers() {
        let credentials = CloudCredentials::new("key", "secret");
        let sso = cloud_request(
            Method::Get,
            endpoints::REDIS_CLOUD_SUBSCRIPTIONS,
            endpoints::CLOUD_ME_AUTODISCOVERY_SUBSCRIPTIONS,
            Some(&credentials),
            true,
        );
        assert_eq!(sso.path, endpoints::CLOUD_ME_AUTODISCOVERY_SUBSCRIPTIONS);
        assert!(sso.headers.is_empty());

        let keys = cloud_request(
            Method::Get,
            endpoints::REDIS_CLOUD_SUBSCRIPTIONS,
            endpoints::CLOUD_ME_AUTODISCOVERY_SUBSCRIPTIONS,
            Some(&credentials),
            false,
        );
        assert_eq!(keys.headers.len(), 2);
    }

    #[test]
    fn reset_loaded_clears_one_flag() {
        let mut state = CloudState {
            loaded: CloudLoaded {
                subscriptions: true,
                instances: true,
                instances_added: true,
            },
            ..Default::default()
        };
        reduce(&mut state, CloudAction::ResetLoadedRedisCloud(LoadedCloud::Instances));

        assert!(state.loaded.subscriptions);
        assert!(!state.loaded.instances);
        assert!(state.loaded.instances_added);
    }
}
