//! Pluggable log sink with level filtering
//!
//! A [`LogSink`] holds an optional handler, an optional filter and a filter
//! level. Messages reach the handler only when a handler is installed, the
//! message is non-empty and the filter (if any) accepts the message level.
//!
//! Library code never calls the sink directly; it logs through `tracing` and
//! programs route those events into a sink with [`SinkLayer`].

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Most important messages only
pub const VERBOSITY_VERY_TERSE: i32 = 1;
/// Start/finish of operations
pub const VERBOSITY_TERSE: i32 = 2;
/// Progress within an operation
pub const VERBOSITY_INTERMEDIATE: i32 = 3;
/// Individual backend calls
pub const VERBOSITY_VERBOSE: i32 = 4;
/// Everything
pub const VERBOSITY_VERY_VERBOSE: i32 = 5;

/// Receives `(level, message)` for every message the sink emits
pub type LogHandler = Arc<dyn Fn(i32, &str) + Send + Sync>;

/// Decides emission from `(level, filter_level, message)`
pub type LogFilter = Arc<dyn Fn(i32, i32, &str) -> bool + Send + Sync>;

/// Emits when `level <= filter_level`
pub fn filter_absolute(level: i32, filter_level: i32, _message: &str) -> bool {
    level <= filter_level
}

/// Emits when `level` shares at least one bit with `filter_level`
pub fn filter_bitwise(level: i32, filter_level: i32, _message: &str) -> bool {
    (level & filter_level) != 0
}

/// Prints the message to stdout prefixed by the current UTC time
pub fn stdout_handler(_level: i32, message: &str) {
    println!("{} {}", current_time_string(), message);
}

/// Which standard filter a configuration selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// `level <= filter_level`
    #[default]
    Absolute,
    /// `level & filter_level != 0`
    Bitwise,
}

impl FilterMode {
    /// The filter function for this mode
    pub fn filter(self) -> fn(i32, i32, &str) -> bool {
        match self {
            FilterMode::Absolute => filter_absolute,
            FilterMode::Bitwise => filter_bitwise,
        }
    }
}

#[derive(Default)]
struct SinkState {
    handler: Option<LogHandler>,
    filter: Option<LogFilter>,
    level: i32,
}

/// Shared log configuration. Clones refer to the same configuration.
#[derive(Clone, Default)]
pub struct LogSink {
    state: Arc<RwLock<SinkState>>,
}

impl LogSink {
    /// Create a sink with no handler, no filter and level 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink printing to stdout through the given filter mode
    pub fn stdout(level: i32, mode: FilterMode) -> Self {
        let sink = Self::new();
        sink.set_level(level);
        sink.set_filter(mode.filter());
        sink.set_handler(stdout_handler);
        sink
    }

    /// Install the message handler, replacing any previous one
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(i32, &str) + Send + Sync + 'static,
    {
        self.write_state().handler = Some(Arc::new(handler));
    }

    /// Remove the message handler; later messages are dropped
    pub fn clear_handler(&self) {
        self.write_state().handler = None;
    }

    /// Install the filter, replacing any previous one
    pub fn set_filter<F>(&self, filter: F)
    where
        F: Fn(i32, i32, &str) -> bool + Send + Sync + 'static,
    {
        self.write_state().filter = Some(Arc::new(filter));
    }

    /// Remove the filter; every message then reaches the handler
    pub fn clear_filter(&self) {
        self.write_state().filter = None;
    }

    /// Set the level the filter compares against
    pub fn set_level(&self, level: i32) {
        self.write_state().level = level;
    }

    /// The level the filter compares against
    pub fn level(&self) -> i32 {
        self.read_state().level
    }

    /// Log a message at the given level
    pub fn log(&self, level: i32, message: &str) {
        if message.is_empty() {
            return;
        }

        // Call out with the lock released so handlers may log themselves.
        let (handler, filter, filter_level) = {
            let state = self.read_state();
            match &state.handler {
                Some(handler) => (handler.clone(), state.filter.clone(), state.level),
                None => return,
            }
        };

        if let Some(filter) = filter {
            if !filter(level, filter_level, message) {
                return;
            }
        }

        handler(level, message);
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SinkState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SinkState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("LogSink")
            .field("handler", &state.handler.is_some())
            .field("filter", &state.filter.is_some())
            .field("level", &state.level)
            .finish()
    }
}

/// Format a timestamp as `DD-MM-YYYYTHH:MM:SS.mmm +HHMM`
pub fn format_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    time.format("%d-%m-%YT%H:%M:%S%.3f %z").to_string()
}

/// The current UTC time formatted by [`format_timestamp`]
pub fn current_time_string() -> String {
    format_timestamp(&Utc::now())
}

/// Verbosity level for a `tracing` level
pub fn verbosity_for(level: &Level) -> i32 {
    match *level {
        Level::ERROR => VERBOSITY_VERY_TERSE,
        Level::WARN => VERBOSITY_TERSE,
        Level::INFO => VERBOSITY_INTERMEDIATE,
        Level::DEBUG => VERBOSITY_VERBOSE,
        Level::TRACE => VERBOSITY_VERY_VERBOSE,
    }
}

/// A tracing layer that forwards events to a [`LogSink`]
#[derive(Debug, Clone)]
pub struct SinkLayer {
    sink: LogSink,
}

impl SinkLayer {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = String::new();
        if let Some(target) = metadata.target().split("::").last() {
            message.push_str(target);
            message.push_str(": ");
        }
        message.push_str(&visitor.message);
        message.push_str(&visitor.fields);

        self.sink.log(verbosity_for(metadata.level()), &message);
    }
}

/// Visitor to format event fields, message first
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push_str(&format!(" {}=\"{}\"", field.name(), value));
        }
    }
}
