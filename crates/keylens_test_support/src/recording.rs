use keylens_core::{Clock, TelemetryEvent, TelemetrySink};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Keeps every event so tests can assert on what was sent.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<(TelemetryEvent, Value)>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(TelemetryEvent, Value)> {
        self.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.lock().iter().map(|(event, _)| event.as_str()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(TelemetryEvent, Value)>> {
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poison_error) => poison_error.into_inner(),
        }
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn send(&self, event: TelemetryEvent, data: Value) {
        self.lock().push((event, data));
    }
}

pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
