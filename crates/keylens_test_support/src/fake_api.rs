use async_trait::async_trait;
use keylens_core::{ApiError, ApiRequest, ApiResponse, ApiService, Method};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Response(ApiResponse),
    Error(ApiError),
}

impl FakeOutcome {
    fn into_result(self) -> Result<ApiResponse, ApiError> {
        match self {
            Self::Response(response) if response.is_successful() => Ok(response),
            Self::Response(response) => Err(ApiError::from_response(response.status, &response.data)),
            Self::Error(error) => Err(error),
        }
    }
}

type Route = (Method, String);

#[derive(Default)]
struct FakeApiState {
    outcomes: RwLock<HashMap<Route, FakeOutcome>>,
    queued: Mutex<HashMap<Route, VecDeque<FakeOutcome>>>,
    default_outcome: RwLock<Option<FakeOutcome>>,
    held: Mutex<HashMap<Route, usize>>,
    requests: Mutex<Vec<ApiRequest>>,
}

/// In-memory backend keyed by method and path.
///
/// Queued outcomes are served first, in order, then the fixed outcome for the
/// route, then the default. A route without any outcome answers 404.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<FakeApiState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, method: Method, path: impl Into<String>, data: Value) -> Self {
        self.with_status(method, path, 200, data)
    }

    pub fn with_status(
        self,
        method: Method,
        path: impl Into<String>,
        status: u16,
        data: Value,
    ) -> Self {
        rwlock_write(&self.state.outcomes).insert(
            (method, path.into()),
            FakeOutcome::Response(ApiResponse::new(status, data)),
        );
        self
    }

    /// Non-2xx reply with a backend error body such as `{ "message": "..." }`.
    pub fn with_error(self, method: Method, path: impl Into<String>, status: u16, body: Value) -> Self {
        self.with_outcome(
            method,
            path,
            FakeOutcome::Error(ApiError::from_response(status, &body)),
        )
    }

    pub fn with_outcome(self, method: Method, path: impl Into<String>, outcome: FakeOutcome) -> Self {
        rwlock_write(&self.state.outcomes).insert((method, path.into()), outcome);
        self
    }

    /// Serves `data` once, before any fixed outcome of the same route.
    pub fn then_respond(self, method: Method, path: impl Into<String>, data: Value) -> Self {
        mutex_lock(&self.state.queued)
            .entry((method, path.into()))
            .or_default()
            .push_back(FakeOutcome::Response(ApiResponse::ok(data)));
        self
    }

    pub fn with_default_response(self, data: Value) -> Self {
        *rwlock_write(&self.state.default_outcome) =
            Some(FakeOutcome::Response(ApiResponse::ok(data)));
        self
    }

    /// The next matching request that carries a cancel token pends until cancelled.
    pub fn hold(self, method: Method, path: impl Into<String>) -> Self {
        *mutex_lock(&self.state.held)
            .entry((method, path.into()))
            .or_default() += 1;
        self
    }

    pub fn set_response(&self, method: Method, path: impl Into<String>, data: Value) {
        rwlock_write(&self.state.outcomes).insert(
            (method, path.into()),
            FakeOutcome::Response(ApiResponse::ok(data)),
        );
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        mutex_lock(&self.state.requests).clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path == path)
            .collect()
    }

    pub fn last_body(&self, method: Method, path: &str) -> Option<Value> {
        self.requests_to(method, path)
            .pop()
            .and_then(|request| request.body)
    }

    pub fn as_service_arc(self) -> Arc<dyn ApiService> {
        Arc::new(self)
    }

    fn take_hold(&self, route: &Route) -> bool {
        let mut held = mutex_lock(&self.state.held);
        match held.get_mut(route) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    fn outcome_for(&self, route: &Route) -> FakeOutcome {
        if let Some(outcome) = mutex_lock(&self.state.queued)
            .get_mut(route)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }

        if let Some(outcome) = rwlock_read(&self.state.outcomes).get(route) {
            return outcome.clone();
        }

        rwlock_read(&self.state.default_outcome)
            .clone()
            .unwrap_or_else(|| {
                FakeOutcome::Error(ApiError::not_found(format!(
                    "No fake response for {} {}",
                    route.0, route.1
                )))
            })
    }
}

#[async_trait]
impl ApiService for FakeApi {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let route = (request.method, request.path.clone());
        let cancel = request.cancel.clone();
        mutex_lock(&self.state.requests).push(request);

        if let Some(token) = cancel {
            if self.take_hold(&route) {
                token.cancelled().await;
            }
            if token.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
        }

        self.outcome_for(&route).into_result()
    }
}

fn mutex_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}

fn rwlock_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    }
}
