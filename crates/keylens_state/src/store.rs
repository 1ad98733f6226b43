use crate::action::Action;
use crate::browser::keys::KeysAction;
use crate::cli::output::CliOutputAction;
use crate::notifications::{ErrorPayload, NotificationsAction};
use crate::state::{RootState, reduce};
use keylens_core::{
    ApiError, ApiRequest, ApiResponse, ApiService, AppConfig, BrowserStorage, Clock, Encoding,
    LogTelemetry, MemoryStorage, Method, RequestRegistry, StorageItem, SystemClock,
    TelemetryEvent, TelemetrySink, endpoints, write_item,
};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

/// Single source of truth for the UI: the state tree plus its collaborators.
///
/// The state lock is only taken for the duration of a reducer or selector and
/// never across an `.await`, so thunks running on other tasks always observe a
/// fully reduced tree.
pub struct Store {
    state: Mutex<RootState>,
    api: Arc<dyn ApiService>,
    local_storage: Arc<dyn BrowserStorage>,
    session_storage: Arc<dyn BrowserStorage>,
    telemetry: Arc<dyn TelemetrySink>,
    clock: Arc<dyn Clock>,
    requests: RequestRegistry,
    config: AppConfig,
    action_log: Mutex<Option<Vec<Action>>>,
}

impl Store {
    pub fn builder(api: Arc<dyn ApiService>) -> StoreBuilder {
        StoreBuilder::new(api)
    }

    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();

        if let Some(log) = lock(&self.action_log).as_mut() {
            log.push(action.clone());
        }

        reduce(&mut lock(&self.state), action.clone());
        self.persist(&action);
    }

    pub fn select<R>(&self, selector: impl FnOnce(&RootState) -> R) -> R {
        selector(&lock(&self.state))
    }

    pub fn state(&self) -> RootState {
        lock(&self.state).clone()
    }

    /// Starts keeping every dispatched action, dropping anything kept before.
    pub fn record_actions(&self) {
        *lock(&self.action_log) = Some(Vec::new());
    }

    pub fn take_actions(&self) -> Vec<Action> {
        lock(&self.action_log)
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    pub(crate) fn local_storage(&self) -> &dyn BrowserStorage {
        self.local_storage.as_ref()
    }

    pub(crate) fn session_storage(&self) -> &dyn BrowserStorage {
        self.session_storage.as_ref()
    }

    pub(crate) fn instance_id(&self) -> String {
        self.select(|state| state.app.connected_instance.id.clone())
    }

    pub(crate) fn encoding(&self) -> Encoding {
        self.select(|state| state.app.info.encoding)
    }

    pub(crate) fn database_url(&self, endpoint: &str) -> String {
        endpoints::database_url(&self.instance_id(), endpoint)
    }

    /// Request against the connected database, with the current encoding.
    pub(crate) fn db_request(&self, method: Method, endpoint: &str) -> ApiRequest {
        ApiRequest::new(method, self.database_url(endpoint)).with_encoding(self.encoding())
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.validate()?;

        let response = self.api.request(request).await?;
        if !response.is_successful() {
            return Err(ApiError::from_response(response.status, &response.data));
        }

        Ok(response)
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Pushes an error toast and returns the message for the slice's `error` field.
    pub(crate) fn notify_error(&self, error: &ApiError) -> String {
        let message = error.message();
        warn!("Request failed: {}", error);

        let instance_id = self.instance_id();
        self.dispatch(NotificationsAction::AddErrorNotification(ErrorPayload {
            name: error.name().unwrap_or("Error").to_string(),
            message: message.clone(),
            title: None,
            instance_id: (!instance_id.is_empty()).then_some(instance_id),
        }));

        message
    }

    pub(crate) fn send_telemetry(&self, event: TelemetryEvent, data: Value) {
        self.telemetry.send(event, data);
    }

    fn persist(&self, action: &Action) {
        let result = match action {
            Action::Keys(KeysAction::ChangeKeyViewType(view_type)) => {
                write_item(self.local_storage(), StorageItem::BrowserViewType, view_type)
            }
            Action::Keys(KeysAction::ChangeSearchMode(mode)) => {
                write_item(self.local_storage(), StorageItem::BrowserSearchMode, mode)
            }
            Action::Keys(KeysAction::SetViewFormat(format)) => {
                write_item(self.local_storage(), StorageItem::ViewFormat, format)
            }
            Action::CliOutput(CliOutputAction::UpdateCliCommandHistory(_)) => {
                let history = self.select(|state| state.cli.output.command_history.clone());
                write_item(self.local_storage(), StorageItem::CliInputHistory, &history)
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            error!("Failed to persist UI preference: {:?}", e);
        }
    }
}

pub struct StoreBuilder {
    api: Arc<dyn ApiService>,
    local_storage: Option<Arc<dyn BrowserStorage>>,
    session_storage: Option<Arc<dyn BrowserStorage>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    clock: Option<Arc<dyn Clock>>,
    config: AppConfig,
    instance: Option<(String, String)>,
}

impl StoreBuilder {
    pub fn new(api: Arc<dyn ApiService>) -> Self {
        Self {
            api,
            local_storage: None,
            session_storage: None,
            telemetry: None,
            clock: None,
            config: AppConfig::default(),
            instance: None,
        }
    }

    pub fn with_local_storage(mut self, storage: Arc<dyn BrowserStorage>) -> Self {
        self.local_storage = Some(storage);
        self
    }

    pub fn with_session_storage(mut self, storage: Arc<dyn BrowserStorage>) -> Self {
        self.session_storage = Some(storage);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_instance(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.instance = Some((id.into(), name.into()));
        self
    }

    pub fn build(self) -> Store {
        let local_storage = self
            .local_storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let session_storage = self
            .session_storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let mut state = RootState::initial(local_storage.as_ref(), &self.config);
        if let Some((id, name)) = self.instance {
            state.app.connected_instance.id = id;
            state.app.connected_instance.name = name;
        }

        Store {
            state: Mutex::new(state),
            api: self.api,
            local_storage,
            session_storage,
            telemetry: self.telemetry.unwrap_or_else(|| Arc::new(LogTelemetry)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            requests: RequestRegistry::new(),
            config: self.config,
            action_log: Mutex::new(None),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::keys::{KeyViewType, ViewFormat};
    use keylens_core::{StorageItem, read_item};
    use keylens_test_support::FakeApi;

    #[test]
    fn preferences_are_persisted_and_restored() {
        let local: Arc<dyn BrowserStorage> = Arc::new(MemoryStorage::new());
        let store = Store::builder(FakeApi::new().as_service_arc())
            .with_local_storage(local.clone())
            .build();

        store.dispatch(KeysAction::ChangeKeyViewType(KeyViewType::Tree));
        store.dispatch(KeysAction::SetViewFormat(ViewFormat::Json));

        assert_eq!(
            read_item::<KeyViewType>(local.as_ref(), StorageItem::BrowserViewType),
            Some(KeyViewType::Tree)
        );

        let restored = Store::builder(FakeApi::new().as_service_arc())
            .with_local_storage(local)
            .build();
        restored.select(|state| {
            assert_eq!(state.browser.keys.view_type, KeyViewType::Tree);
            assert_eq!(state.browser.keys.selected_key.view_format, ViewFormat::Json);
        });
    }

    #[test]
    fn action_log_is_opt_in() {
        let store = Store::builder(FakeApi::new().as_service_arc()).build();

        store.dispatch(KeysAction::LoadKeys);
        assert!(store.take_actions().is_empty());

        store.record_actions();
        store.dispatch(KeysAction::LoadKeys);
        assert_eq!(store.take_actions(), vec![Action::Keys(KeysAction::LoadKeys)]);
        assert!(store.take_actions().is_empty());
    }

    #[tokio::test]
    async fn non_success_response_becomes_http_error() {
        let api = FakeApi::new().with_status(
            Method::Get,
            "notifications",
            500,
            serde_json::json!({ "message": "boom" }),
        );
        let store = Store::builder(api.as_service_arc()).build();

        let error = store
            .send(ApiRequest::get("notifications"))
            .await
            .unwrap_err();
        assert_eq!(error.message(), "boom");
        assert_eq!(error.status(), Some(500));
    }
}
