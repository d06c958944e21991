//! Single-flight access token refresh.
//!
//! At most one refresh call is in flight per coordinator. The first eligible
//! caller starts it on a spawned task and parks a shared handle in the slot;
//! everyone arriving while the slot is occupied awaits that same handle. The
//! task itself updates the credential store, clears the slot and, on
//! failure, signals the forced logout, all before any waiter sees the
//! outcome. Dropping waiters never cancels the task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use super::session::{ForcedLogout, SessionHook};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::RequestDescriptor;
use crate::store::CredentialStore;
use crate::transport::{Transport, TransportError};
use crate::utils::LogThrottle;

const JOIN_LOG_WINDOW: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("refresh rejected with status {status}")]
    Rejected { status: u16, code: Option<String> },
    #[error("refresh response did not contain an access token")]
    MissingToken,
    #[error("refresh task did not complete: {0}")]
    Aborted(String),
    #[error("session ended while the request was in flight")]
    SessionEnded,
}

impl RefreshError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            RefreshError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type RefreshResult = Result<String, RefreshError>;

type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

struct InFlight {
    incident: u64,
    handle: SharedRefresh,
}

/// Deduplicates concurrent refresh requests into one network call.
///
/// Clones share the same slot.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    refresh_path: String,
    logout: ForcedLogout,
    metrics: Metrics,
    slot: Mutex<Option<InFlight>>,
    incidents: AtomicU64,
    join_log: LogThrottle,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        refresh_path: impl Into<String>,
        hook: Arc<dyn SessionHook>,
        metrics: Metrics,
    ) -> Self {
        RefreshCoordinator {
            inner: Arc::new(Inner {
                transport,
                credentials,
                refresh_path: refresh_path.into(),
                logout: ForcedLogout::new(hook),
                metrics,
                slot: Mutex::new(None),
                incidents: AtomicU64::new(0),
                join_log: LogThrottle::new(JOIN_LOG_WINDOW),
            }),
        }
    }

    /// Obtain a fresh access token on behalf of a call that was rejected
    /// while carrying `stale_token`.
    ///
    /// Joins the in-flight refresh when there is one. When there is none and
    /// the store already holds a different token, a refresh completed after
    /// the call left and that token is returned without a network call. When
    /// the call carried a token but the store is now empty, the session was
    /// ended (failed refresh or logout) and no new incident is opened.
    pub async fn refresh(&self, stale_token: Option<&str>) -> RefreshResult {
        let handle = {
            let mut slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(in_flight) => {
                    if let Some(suppressed_count) = self.inner.join_log.should_emit() {
                        debug!(
                            event_name = "auth.refresh.joined",
                            event_domain = "auth",
                            incident = in_flight.incident,
                            suppressed_count,
                            "waiting on in-flight token refresh"
                        );
                    }
                    in_flight.handle.clone()
                }
                None => {
                    match (self.inner.credentials.token(), stale_token) {
                        (Some(current), _) if stale_token != Some(current.as_str()) => {
                            debug!("Access token already rotated; skipping refresh");
                            return Ok(current);
                        }
                        (None, Some(_)) => {
                            debug!("Session already ended; skipping refresh");
                            return Err(RefreshError::SessionEnded);
                        }
                        _ => {}
                    }

                    let incident = self.inner.incidents.fetch_add(1, Ordering::SeqCst) + 1;
                    let handle = self.launch(incident);
                    *slot = Some(InFlight {
                        incident,
                        handle: handle.clone(),
                    });
                    handle
                }
            }
        };

        handle.await
    }

    /// Whether a refresh is currently in flight.
    pub fn in_flight(&self) -> bool {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn launch(&self, incident: u64) -> SharedRefresh {
        let task = tokio::spawn(Arc::clone(&self.inner).run(incident));
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(RefreshError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared()
    }
}

/// Empties the slot when the refresh task ends, however it ends.
struct SlotGuard<'a> {
    inner: &'a Inner,
    incident: u64,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(|f| f.incident) == Some(self.incident) {
            *slot = None;
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>, incident: u64) -> RefreshResult {
        let _slot = SlotGuard {
            inner: self.as_ref(),
            incident,
        };

        info!(
            event_name = "auth.refresh.started",
            event_domain = "auth",
            incident,
            "refreshing access token"
        );

        let outcome = self.request_token().await;
        match &outcome {
            Ok(token) => {
                self.credentials.set(token.clone());
                self.metrics.record_refresh("success");
                info!(
                    event_name = "auth.refresh.succeeded",
                    event_domain = "auth",
                    incident,
                    "access token refreshed"
                );
            }
            Err(e) => {
                self.credentials.clear();
                self.metrics.record_refresh("failure");
                warn!(
                    event_name = "auth.refresh.failed",
                    event_domain = "auth",
                    incident,
                    error = %e,
                    "token refresh failed; clearing session"
                );
                if self.logout.fire(incident) {
                    warn!(
                        event_name = "auth.session.forced_logout",
                        event_domain = "auth",
                        incident,
                        "forced logout signalled"
                    );
                }
            }
        }

        outcome
    }

    async fn request_token(&self) -> RefreshResult {
        // No bearer header: the refresh credential travels as a cookie.
        let request = RequestDescriptor::post(self.refresh_path.clone()).without_refresh();
        let response = self.transport.send(&request).await?;

        let envelope = response.envelope();
        let rejected = !response.status.is_success()
            || envelope.as_ref().map_or(false, |e| e.is_failure());
        if rejected {
            return Err(RefreshError::Rejected {
                status: response.status.as_u16(),
                code: envelope.and_then(|e| e.code),
            });
        }

        envelope
            .and_then(|e| e.access_token())
            .ok_or(RefreshError::MissingToken)
    }
}
