use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::{ExclusionPolicy, RefreshCoordinator, SessionHook};
use crate::classifier::{ErrorClassifier, ErrorCodeTable};
use crate::config::{ConfigV1, EndpointConfig};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::{ApiResponse, ClassifiedError, ErrorKind, ErrorPayload, RequestDescriptor};
use crate::store::CredentialStore;
use crate::transport::{ReqwestTransport, Transport, TransportError};

/// Code reported when there is no usable access token: a login that hands
/// none out, or a stored token that cannot be sent as a header.
const INVALID_TOKEN_CODE: &str = "INVALID_TOKEN";

/// The authenticated API client.
///
/// Cheap to clone; clones share the credential store, the refresh slot and
/// the metrics registry.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    credentials: CredentialStore,
    refresher: RefreshCoordinator,
    policy: Arc<ExclusionPolicy>,
    classifier: Arc<ErrorClassifier>,
    endpoints: Arc<EndpointConfig>,
    metrics: Metrics,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &ConfigV1,
        hook: Arc<dyn SessionHook>,
    ) -> Self {
        let credentials = CredentialStore::new();
        let metrics = Metrics::new();
        let refresher = RefreshCoordinator::new(
            transport.clone(),
            credentials.clone(),
            config.endpoints.refresh_path.clone(),
            hook,
            metrics.clone(),
        );

        ApiClient {
            transport,
            credentials,
            refresher,
            policy: Arc::new(ExclusionPolicy::from_config(&config.policy, &config.endpoints)),
            classifier: Arc::new(ErrorClassifier::new(ErrorCodeTable::from_config(
                &config.messages,
            ))),
            endpoints: Arc::new(config.endpoints.clone()),
            metrics,
        }
    }

    /// Build a client that talks HTTP through `reqwest`.
    pub fn from_config(config: &ConfigV1, hook: Arc<dyn SessionHook>) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(
            &config.base_url,
            Duration::from_millis(config.timeout_in_ms),
        )?;
        info!(
            "API client configured for {} (timeout {} ms)",
            config.base_url, config.timeout_in_ms
        );
        Ok(Self::new(Arc::new(transport), config, hook))
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.get().is_logged_in
    }

    /// Run one logical call: dispatch, and on an eligible 401 refresh the
    /// token and replay exactly once. Every rejection is classified.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<ApiResponse, ClassifiedError> {
        let span = info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            url = %request.url
        );

        async move {
            let started = Instant::now();
            let outcome = self.run(request).await;
            let label = if outcome.is_ok() { "success" } else { "error" };
            self.metrics
                .record_request(label, started.elapsed().as_secs_f64());
            outcome
        }
        .instrument(span)
        .await
    }

    pub async fn get(&self, url: &str) -> Result<ApiResponse, ClassifiedError> {
        self.execute(RequestDescriptor::get(url)).await
    }

    pub async fn delete(&self, url: &str) -> Result<ApiResponse, ClassifiedError> {
        self.execute(RequestDescriptor::delete(url)).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<ApiResponse, ClassifiedError> {
        self.execute(RequestDescriptor::post(url).json(body)).await
    }

    pub async fn put(&self, url: &str, body: Value) -> Result<ApiResponse, ClassifiedError> {
        self.execute(RequestDescriptor::put(url).json(body)).await
    }

    pub async fn patch(&self, url: &str, body: Value) -> Result<ApiResponse, ClassifiedError> {
        self.execute(RequestDescriptor::patch(url).json(body)).await
    }

    /// Log in with the given credentials body and keep the issued access
    /// token. The refresh credential is left to the transport's cookie jar.
    pub async fn login(&self, body: Value) -> Result<ApiResponse, ClassifiedError> {
        let request = RequestDescriptor::post(self.endpoints.login_path.clone()).json(body);
        let response = self.execute(request).await?;

        match response.envelope().and_then(|e| e.access_token()) {
            Some(token) => {
                self.credentials.set(token);
                info!(event_name = "auth.login.succeeded", event_domain = "auth", "logged in");
                Ok(response)
            }
            None => Err(self.classify_error(ErrorPayload {
                kind: ErrorKind::Application,
                http_status: Some(response.status.as_u16()),
                code: Some(INVALID_TOKEN_CODE.to_string()),
                message: None,
                result: None,
            })),
        }
    }

    /// Tell the server the session is over, then drop the local token
    /// whatever the server said. Does not fire the forced-logout hook.
    pub async fn logout(&self) {
        let request = RequestDescriptor::post(self.endpoints.logout_path.clone()).without_refresh();
        if let Err(e) = self.execute(request).await {
            warn!(
                event_name = "auth.logout.failed",
                event_domain = "auth",
                error = %e,
                "logout call failed; clearing local session anyway"
            );
        }
        self.credentials.clear();
        info!(event_name = "auth.logout.completed", event_domain = "auth", "logged out");
    }

    async fn run(&self, mut request: RequestDescriptor) -> Result<ApiResponse, ClassifiedError> {
        let mut sent_with = match self.attach_credential(&mut request) {
            Ok(token) => token,
            Err(e) => {
                return Err(self.classify_error(ErrorPayload {
                    kind: ErrorKind::Transport,
                    http_status: None,
                    code: Some(INVALID_TOKEN_CODE.to_string()),
                    message: Some(e.to_string()),
                    result: None,
                }))
            }
        };

        // Bounded: maybe_refresh only says "replay" while `retried` is unset.
        loop {
            let payload = match inspect_outcome(self.dispatch(&request).await) {
                Ok(response) => return Ok(response),
                Err(payload) => payload,
            };

            match self.maybe_refresh(&mut request, &payload, sent_with.as_deref()).await {
                Ok(Some(token)) => sent_with = Some(token),
                Ok(None) => return Err(self.classify_error(payload)),
                Err(refresh_failure) => return Err(self.classify_error(refresh_failure)),
            }
        }
    }

    /// Put the stored token on the request. Returns the token that was
    /// attached, if any.
    fn attach_credential(&self, request: &mut RequestDescriptor) -> Result<Option<String>, TransportError> {
        let token = self.credentials.token();
        if let Some(token) = &token {
            request
                .set_bearer(token)
                .map_err(|e| TransportError::InvalidRequest(format!("invalid access token: {}", e)))?;
        }
        debug!(authenticated = token.is_some(), "credential attached");
        Ok(token)
    }

    async fn dispatch(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
        debug!(retried = request.is_retried(), "dispatching");
        self.transport.send(request).await
    }

    /// Decide whether a failed call is refreshed and replayed.
    ///
    /// `Ok(Some(token))`: the request now carries a fresh token and is marked
    /// as retried. `Ok(None)`: reject with the original payload. `Err`: the
    /// refresh itself failed.
    async fn maybe_refresh(
        &self,
        request: &mut RequestDescriptor,
        payload: &ErrorPayload,
        sent_with: Option<&str>,
    ) -> Result<Option<String>, ErrorPayload> {
        if request.is_retried() {
            debug!("replay failed; not refreshing again");
            return Ok(None);
        }

        let decision = self.policy.check(request, payload);
        if !decision.is_eligible() {
            debug!(reason = %decision, "not refreshing");
            return Ok(None);
        }

        match self.refresher.refresh(sent_with).await {
            Ok(token) => {
                request.mark_retried();
                request.set_bearer(&token).map_err(|e| {
                    ErrorPayload::network(format!("refreshed token is not a valid header: {}", e))
                })?;
                self.metrics.record_retry();
                debug!("replaying with refreshed token");
                Ok(Some(token))
            }
            Err(e) => Err(ErrorPayload::refresh_failure(e.http_status(), e.to_string())),
        }
    }

    fn classify_error(&self, payload: ErrorPayload) -> ClassifiedError {
        let classified = self.classifier.classify(payload);
        self.metrics
            .record_error(classified.kind.as_str(), classified.origin.as_str());
        debug!(
            kind = %classified.kind,
            origin = classified.origin.as_str(),
            status = ?classified.http_status(),
            code = ?classified.code(),
            "request rejected: {}",
            classified.message
        );
        classified
    }
}

/// Sort a transport outcome into a usable response or a failure payload.
///
/// A 2xx response is a failure only when its envelope says
/// `isSuccess: false`; anything else, including non-JSON bodies, passes
/// through untouched.
pub fn inspect_outcome(outcome: Result<ApiResponse, TransportError>) -> Result<ApiResponse, ErrorPayload> {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => return Err(ErrorPayload::network(e.to_string())),
    };

    if !response.status.is_success() {
        return Err(ErrorPayload::from_response(ErrorKind::Transport, &response));
    }

    if response.envelope().map_or(false, |e| e.is_failure()) {
        return Err(ErrorPayload::from_response(ErrorKind::Application, &response));
    }

    Ok(response)
}
