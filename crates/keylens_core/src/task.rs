use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

/// Request families where a newer call supersedes the one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    KeysScan,
    RedisearchScan,
    JsonPath,
    StreamEntries,
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::KeysScan => "Keys scan",
            RequestKind::RedisearchScan => "Search index scan",
            RequestKind::JsonPath => "JSON path fetch",
            RequestKind::StreamEntries => "Stream entries fetch",
        }
    }
}

struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Resolves once `cancel` has been called on this token or any clone of it.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// One in-flight token per request kind.
///
/// Owned by the store so that every test builds its own registry.
#[derive(Default)]
pub struct RequestRegistry {
    active: Mutex<HashMap<RequestKind, CancelToken>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels whatever is running for `kind` and registers a fresh token.
    pub fn begin(&self, kind: RequestKind) -> CancelToken {
        let token = CancelToken::new();

        if let Some(previous) = self.lock().insert(kind, token.clone()) {
            log::debug!("{} superseded, cancelling previous request", kind.label());
            previous.cancel();
        }

        token
    }

    /// Clears the slot only if `token` is still the current one.
    pub fn finish(&self, kind: RequestKind, token: &CancelToken) {
        let mut active = self.lock();
        if active.get(&kind).is_some_and(|current| current.same_as(token)) {
            active.remove(&kind);
        }
    }

    pub fn cancel(&self, kind: RequestKind) -> bool {
        match self.lock().remove(&kind) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, token) in self.lock().drain() {
            token.cancel();
        }
    }

    pub fn is_active(&self, kind: RequestKind) -> bool {
        self.lock().contains_key(&kind)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RequestKind, CancelToken>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn begin_cancels_previous_token_of_same_kind() {
        let registry = RequestRegistry::new();

        let first = registry.begin(RequestKind::JsonPath);
        let other_kind = registry.begin(RequestKind::KeysScan);
        let second = registry.begin(RequestKind::JsonPath);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!other_kind.is_cancelled());
    }

    #[test]
    fn finish_ignores_stale_tokens() {
        let registry = RequestRegistry::new();

        let stale = registry.begin(RequestKind::StreamEntries);
        let current = registry.begin(RequestKind::StreamEntries);

        registry.finish(RequestKind::StreamEntries, &stale);
        assert!(registry.is_active(RequestKind::StreamEntries));

        registry.finish(RequestKind::StreamEntries, &current);
        assert!(!registry.is_active(RequestKind::StreamEntries));
    }

    #[test]
    fn cancel_all_drains_registry() {
        let registry = RequestRegistry::new();
        let keys = registry.begin(RequestKind::KeysScan);
        let search = registry.begin(RequestKind::RedisearchScan);

        registry.cancel_all();

        assert!(keys.is_cancelled());
        assert!(search.is_cancelled());
        assert!(!registry.cancel(RequestKind::KeysScan));
    }

    #[tokio::test]
    async fn cancelled_future_wakes_waiters() {
        let token = CancelToken::new();
        let waiter = token.clone();

        let wait = async move {
            tokio::time::timeout(Duration::from_secs(1), waiter.cancelled())
                .await
                .is_ok()
        };
        let cancel = async {
            tokio::task::yield_now().await;
            token.cancel();
        };

        let (woke, _) = tokio::join!(wait, cancel);
        assert!(woke);
    }
}
