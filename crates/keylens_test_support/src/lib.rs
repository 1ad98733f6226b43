pub mod fake_api;
pub mod fixtures;
pub mod recording;

pub use fake_api::{FakeApi, FakeOutcome};
pub use recording::{FixedClock, RecordingTelemetry};
