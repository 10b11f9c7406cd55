//! Log capture

use gcs_transfer::LogSink;
use std::sync::{Arc, Mutex, MutexGuard};

/// Records every `(level, message)` pair a [`LogSink`] delivers
#[derive(Debug, Clone, Default)]
pub struct LogRecorder {
    entries: Arc<Mutex<Vec<(i32, String)>>>,
}

impl LogRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install this recorder as the handler of `sink`
    pub fn install(&self, sink: &LogSink) {
        let entries = Arc::clone(&self.entries);
        sink.set_handler(move |level, message| {
            entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push((level, message.to_string()));
        });
    }

    pub fn entries(&self) -> Vec<(i32, String)> {
        self.lock().clone()
    }

    /// Whether any recorded message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|(_, message)| message.contains(needle))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(i32, String)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_filtered_messages() {
        let sink = LogSink::stdout(2, gcs_transfer::FilterMode::Absolute);
        let recorder = LogRecorder::new();
        recorder.install(&sink);

        sink.log(1, "kept");
        sink.log(4, "dropped");

        assert_eq!(recorder.entries(), vec![(1, "kept".to_string())]);
        assert!(!recorder.contains("dropped"));
    }
}
