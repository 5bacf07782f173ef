use tracing::info;

/// Fire-and-forget sink for product telemetry events
///
/// A capture must never block or fail a tick; implementations swallow their
/// own errors.
pub trait TelemetrySink: Send + Sync {
    fn capture(&self, event: &str, properties: serde_json::Value);
}

/// Default sink that writes events to the log
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn capture(&self, event: &str, properties: serde_json::Value) {
        info!(target: "quotebot_rs::telemetry", event, %properties, "telemetry event");
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Sink that keeps every captured event for assertions
    #[derive(Default)]
    pub struct RecordingTelemetry {
        pub events: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl TelemetrySink for RecordingTelemetry {
        fn capture(&self, event: &str, properties: serde_json::Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), properties));
        }
    }
}
