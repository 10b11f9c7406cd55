//! Per-module error slots
//!
//! Every public operation resets the slot of its module before running and
//! records at most one error into it. Callers inspect the slots, or the
//! aggregated report, right after a failed call.

use crate::error::{Module, TransferError};
use crate::log::current_time_string;
use std::fmt::Write as _;

/// Text used when a report is requested but no module holds an error
pub const ERROR_NOT_FOUND: &str = "Error not found";

/// A `(code, message)` pair; code 0 means no error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSlot {
    code: i32,
    message: String,
}

impl ErrorSlot {
    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.code != 0
    }

    fn clear(&mut self) {
        self.code = 0;
        self.message.clear();
    }

    fn set(&mut self, code: i32, message: String) {
        self.code = code;
        self.message = message;
    }
}

/// Error slots for the connection, transfer and general modules
#[derive(Debug, Clone, Default)]
pub struct ErrorState {
    connection: ErrorSlot,
    transfer: ErrorSlot,
    general: ErrorSlot,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot for one module
    pub fn slot(&self, module: Module) -> &ErrorSlot {
        match module {
            Module::Connection => &self.connection,
            Module::Transfer => &self.transfer,
            Module::General => &self.general,
        }
    }

    fn slot_mut(&mut self, module: Module) -> &mut ErrorSlot {
        match module {
            Module::Connection => &mut self.connection,
            Module::Transfer => &mut self.transfer,
            Module::General => &mut self.general,
        }
    }

    /// Error code of one module
    pub fn code(&self, module: Module) -> i32 {
        self.slot(module).code()
    }

    /// Error message of one module
    pub fn message(&self, module: Module) -> &str {
        self.slot(module).message()
    }

    /// Clear one module's slot
    pub fn reset(&mut self, module: Module) {
        self.slot_mut(module).clear();
    }

    /// Record an error in the slot of the module it belongs to
    pub fn record(&mut self, error: &TransferError) {
        self.slot_mut(error.module())
            .set(error.code(), error.to_string());
    }

    /// Run `op` with `module`'s slot reset beforehand and any error recorded
    pub fn track<T, F>(&mut self, module: Module, op: F) -> crate::Result<T>
    where
        F: FnOnce() -> crate::Result<T>,
    {
        self.reset(module);
        let result = op();
        if let Err(err) = &result {
            self.record(err);
        }
        result
    }

    /// Whether any module holds an error
    pub fn is_error(&self) -> bool {
        Module::ALL.iter().any(|m| self.slot(*m).is_error())
    }

    /// One timestamped line per module holding an error
    ///
    /// Returns a single "Error not found" line when no module has an error.
    pub fn to_error_string(&self) -> String {
        let mut report = String::new();
        for module in Module::ALL {
            let slot = self.slot(module);
            if slot.is_error() {
                let _ = writeln!(
                    report,
                    "{} {}:Error({}) : {}",
                    current_time_string(),
                    module.label(),
                    slot.code(),
                    slot.message()
                );
            }
        }

        if report.is_empty() {
            let _ = writeln!(report, "{} Error:{}", current_time_string(), ERROR_NOT_FOUND);
        }
        report
    }

    /// Write the aggregated report to stderr
    pub fn report(&self) {
        eprint!("{}", self.to_error_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_has_no_error() {
        let state = ErrorState::new();
        assert!(!state.is_error());
        for module in Module::ALL {
            assert_eq!(state.code(module), 0);
            assert!(state.message(module).is_empty());
        }
    }

    #[test]
    fn test_record_routes_to_owning_module() {
        let mut state = ErrorState::new();
        state.record(&TransferError::NotConnected);

        assert!(state.is_error());
        assert_eq!(state.code(Module::Transfer), 2);
        assert!(!state.message(Module::Transfer).is_empty());
        assert_eq!(state.code(Module::Connection), 0);
    }

    #[test]
    fn test_track_resets_before_running() {
        let mut state = ErrorState::new();
        let _ = state.track::<(), _>(Module::Transfer, || Err(TransferError::NotConnected));
        assert!(state.is_error());

        let ok = state.track(Module::Transfer, || Ok(7));
        assert_eq!(ok.unwrap(), 7);
        assert_eq!(state.code(Module::Transfer), 0);
        assert!(!state.is_error());
    }

    #[test]
    fn test_track_leaves_other_modules_alone() {
        let mut state = ErrorState::new();
        state.record(&TransferError::Connection { message: "no credentials".into() });

        let _ = state.track(Module::Transfer, || Ok(()));
        assert_eq!(state.code(Module::Connection), 1);
    }

    #[test]
    fn test_error_string_lists_each_module() {
        let mut state = ErrorState::new();
        state.record(&TransferError::Connection { message: "no credentials".into() });
        state.record(&TransferError::Config("bad chunk size".into()));

        let report = state.to_error_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Connection:Error(1) : "));
        assert!(lines[0].contains("no credentials"));
        assert!(lines[1].contains("General:Error(21) : "));
    }

    #[test]
    fn test_error_string_without_error_is_sentinel() {
        let report = ErrorState::new().to_error_string();
        assert!(report.contains(ERROR_NOT_FOUND));
        assert_eq!(report.lines().count(), 1);
    }
}
