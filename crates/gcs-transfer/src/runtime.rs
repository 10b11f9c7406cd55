//! Tokio runtime management for blocking callers

use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

/// Get or create the shared runtime that drives object store calls
pub(crate) fn shared_runtime() -> std::io::Result<Arc<Runtime>> {
    static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();

    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime.clone());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("gcs-transfer-worker")
        .build()?;

    // A concurrent initializer may have won; its runtime is kept and ours dropped.
    Ok(RUNTIME.get_or_init(|| Arc::new(runtime)).clone())
}
