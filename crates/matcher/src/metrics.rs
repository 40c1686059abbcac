// Metrics hooks for the resolver.
//
// Callers install a global `ResolverMetrics` implementation via
// [`set_resolver_metrics`]; every `Resolver::resolve` call then reports its
// latency and outcome. Instrumentation stays decoupled from any backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::Resolution;

/// Metrics observer for resolver calls.
pub trait ResolverMetrics: Send + Sync {
    /// `latency` covers all three stages; `resolution` is what the caller got back.
    fn record_resolution(&self, resolution: &Resolution, latency: Duration);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn ResolverMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn ResolverMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn ResolverMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global resolver metrics recorder.
pub fn set_resolver_metrics(recorder: Option<Arc<dyn ResolverMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("resolver metrics lock poisoned");
    *guard = recorder;
}
