use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Session lifecycle callbacks owned by the embedding application.
///
/// The client never navigates anywhere itself; it only tells the
/// application that the session is gone.
pub trait SessionHook: Send + Sync {
    /// Called at most once per failed-refresh incident.
    fn on_forced_logout(&self);
}

impl<F> SessionHook for F
where
    F: Fn() + Send + Sync,
{
    fn on_forced_logout(&self) {
        self()
    }
}

/// A hook that does nothing, for callers that only look at rejections.
pub struct NoopSessionHook;

impl SessionHook for NoopSessionHook {
    fn on_forced_logout(&self) {}
}

/// Wraps a `SessionHook` so it fires at most once per incident id.
///
/// Incident ids must be increasing; a repeated or older id is a no-op.
pub struct ForcedLogout {
    hook: Arc<dyn SessionHook>,
    last_incident: AtomicU64,
}

impl ForcedLogout {
    pub fn new(hook: Arc<dyn SessionHook>) -> Self {
        ForcedLogout {
            hook,
            last_incident: AtomicU64::new(0),
        }
    }

    /// Returns whether the hook actually ran.
    pub fn fire(&self, incident: u64) -> bool {
        if self.last_incident.fetch_max(incident, Ordering::SeqCst) >= incident {
            debug!(incident, "forced logout already signalled for this incident");
            return false;
        }
        self.hook.on_forced_logout();
        true
    }
}
