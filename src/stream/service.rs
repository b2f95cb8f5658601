//! Streaming estimate session: transport, dispatch, and lifecycle.
//!
//! One service instance runs at most one stream at a time. Starting a new
//! stream aborts any stream already in flight; cancellation, completion, and
//! failure all return the service to idle so the caller can retry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use futures_util::StreamExt;

use crate::adapters::ReqwestHttpClient;
use crate::config::DEFAULT_API_BASE_URL;
use crate::error::StreamError;
use crate::models::EstimateRequest;
use crate::traits::{Headers, HttpClient};

use super::bus::{EventBus, SubscriptionHandle};
use super::events::{EventKind, StreamEvent};
use super::framing::LineFramer;

/// The active stream, tagged with a session generation.
///
/// The generation lets an exiting session tell whether the stored handle is
/// its own: after a cancel-then-start restart the aborted predecessor still
/// unwinds through its exit path, and it must not clear the successor's
/// handle.
#[derive(Default)]
struct SessionSlot {
    next_generation: u64,
    active: Option<(u64, AbortHandle)>,
}

/// Client for the agent's streaming estimate API.
///
/// Subscribers register on the bus (see [`StreamingEstimateService::on`]) and
/// receive events synchronously as records arrive. The streaming call itself
/// resolves with the created project's identifier once the server closes the
/// stream.
pub struct StreamingEstimateService {
    http: Arc<dyn HttpClient>,
    base_url: String,
    bus: EventBus,
    session: Mutex<SessionSlot>,
}

impl StreamingEstimateService {
    /// Create a service against the default agent API base URL.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL.to_string())
    }

    /// Create a service against a custom base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), base_url)
    }

    /// Create a service with a custom HTTP client (used by tests to script
    /// byte streams).
    pub fn with_http_client(http: Arc<dyn HttpClient>, base_url: String) -> Self {
        Self {
            http,
            base_url,
            bus: EventBus::new(),
            session: Mutex::new(SessionSlot::default()),
        }
    }

    /// The base URL this service talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access the event bus directly.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Register an event callback. Shorthand for `bus().subscribe`.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&StreamEvent) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        self.bus.subscribe(kind, callback)
    }

    /// Remove an event callback. Shorthand for `bus().unsubscribe`.
    pub fn off(&self, handle: &SubscriptionHandle) -> bool {
        self.bus.unsubscribe(handle)
    }

    /// Whether a stream is currently being read.
    pub fn is_streaming(&self) -> bool {
        self.lock_session().active.is_some()
    }

    /// Abort the active stream, if any. Idempotent: cancelling an idle
    /// service is a no-op.
    pub fn cancel(&self) {
        if let Some((_, handle)) = self.lock_session().active.take() {
            tracing::debug!("cancelling active stream");
            handle.abort();
        }
    }

    /// Cancel any active stream and drop every subscription.
    pub fn cleanup(&self) {
        self.cancel();
        self.bus.clear();
    }

    /// Start streaming estimate generation.
    ///
    /// POSTs the request to `{base_url}/agent/stream` with a bearer token and
    /// consumes the NDJSON response, dispatching each record to subscribers.
    /// If a stream is already in flight it is cancelled first; at most one
    /// stream runs per service instance.
    ///
    /// Resolves with the project identifier captured from a
    /// `project_created` record, or `None` if the server never sent one.
    pub async fn start_streaming(
        &self,
        request: &EstimateRequest,
        access_token: &str,
    ) -> Result<Option<String>, StreamError> {
        let (handle, registration) = AbortHandle::new_pair();
        let generation = {
            // Cancel-then-start under one lock hold, so no window exists
            // where two sessions appear active.
            let mut slot = self.lock_session();
            if let Some((_, previous)) = slot.active.take() {
                tracing::debug!("aborting previous stream before starting a new one");
                previous.abort();
            }
            let generation = slot.next_generation;
            slot.next_generation += 1;
            slot.active = Some((generation, handle));
            generation
        };

        let result = self.run_stream(request, access_token, registration).await;

        // Every exit path returns the service to idle, but only for this
        // session's own handle: an aborted predecessor unwinding after a
        // restart must not clear its successor's.
        {
            let mut slot = self.lock_session();
            if matches!(slot.active, Some((current, _)) if current == generation) {
                slot.active = None;
            }
        }

        match &result {
            Ok(project_id) => {
                tracing::info!(?project_id, "stream complete");
                self.bus.notify(&StreamEvent::completed(project_id.clone()));
            }
            Err(StreamError::Cancelled) => {
                tracing::info!("stream cancelled");
                self.bus.notify(&StreamEvent::cancelled("Stream cancelled by user"));
            }
            Err(err) => {
                tracing::warn!(code = err.error_code(), %err, "stream failed");
                self.bus.notify(&StreamEvent::transport_error(&err.to_string()));
            }
        }

        result
    }

    /// Send a one-shot (non-streaming) prompt to the agent.
    pub async fn prompt(
        &self,
        request: &EstimateRequest,
        access_token: &str,
    ) -> Result<serde_json::Value, StreamError> {
        let url = format!("{}/agent/prompt", self.base_url);
        let body = encode_request(request)?;
        let headers = request_headers(access_token);

        let response = self.http.post(&url, &body, &headers).await?;
        if !response.is_success() {
            return Err(StreamError::HttpStatus {
                status: response.status,
                message: response
                    .text()
                    .unwrap_or_else(|_| "Unknown error".to_string()),
            });
        }
        response.json().map_err(|err| StreamError::Other {
            message: format!("Invalid prompt response: {}", err),
        })
    }

    async fn run_stream(
        &self,
        request: &EstimateRequest,
        access_token: &str,
        registration: AbortRegistration,
    ) -> Result<Option<String>, StreamError> {
        let url = format!("{}/agent/stream", self.base_url);
        let body = encode_request(request)?;
        let headers = request_headers(access_token);

        // The whole session (connect included) is abortable, so a cancel
        // before any bytes arrive still unwinds through the cancelled path.
        let session = async {
            tracing::debug!(url = url.as_str(), "opening estimate stream");
            let mut bytes = self.http.post_stream(&url, &body, &headers).await?;

            let mut framer = LineFramer::new();
            let mut project_id: Option<String> = None;

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(StreamError::from)?;
                for line in framer.push(&chunk) {
                    self.handle_line(&line, &mut project_id);
                }
            }
            if let Some(remainder) = framer.finish() {
                self.handle_line(&remainder, &mut project_id);
            }

            Ok(project_id)
        };

        match Abortable::new(session, registration).await {
            Ok(result) => result,
            Err(futures::future::Aborted) => Err(StreamError::Cancelled),
        }
    }

    /// Process one framed record: heartbeat, decoded event, or parse error.
    fn handle_line(&self, line: &str, project_id: &mut Option<String>) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.bus
                .notify(&StreamEvent::heartbeat(Utc::now().timestamp_millis()));
            return;
        }

        match StreamEvent::decode(trimmed) {
            Ok(event) => {
                if event.kind() == EventKind::ProjectCreated {
                    if let Some(id) = &event.project_id {
                        // Last write wins if the server repeats itself.
                        *project_id = Some(id.clone());
                    }
                }
                tracing::debug!(kind = event.raw_kind.as_str(), "stream event");
                self.bus.publish(&event);
            }
            Err(err) => {
                tracing::warn!(%err, line = trimmed, "failed to parse stream line");
                self.bus
                    .notify(&StreamEvent::parse_error(trimmed, &err.to_string()));
            }
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, SessionSlot> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StreamingEstimateService {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_request(request: &EstimateRequest) -> Result<String, StreamError> {
    serde_json::to_string(request).map_err(|err| StreamError::Other {
        message: format!("Failed to encode request: {}", err),
    })
}

fn request_headers(access_token: &str) -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert(
        "Authorization".to_string(),
        format!("Bearer {}", access_token),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_starts_idle() {
        let service = StreamingEstimateService::new();
        assert!(!service.is_streaming());
        assert_eq!(service.base_url(), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_with_base_url() {
        let service = StreamingEstimateService::with_base_url("http://custom:8080/api".to_string());
        assert_eq!(service.base_url(), "http://custom:8080/api");
    }

    #[test]
    fn test_cancel_on_idle_is_noop() {
        let service = StreamingEstimateService::new();
        service.cancel();
        service.cancel();
        assert!(!service.is_streaming());
    }

    #[test]
    fn test_cleanup_clears_subscriptions() {
        let service = StreamingEstimateService::new();
        let handle = service.on(EventKind::AiChunk, |_| {});
        service.cleanup();
        // Already removed by cleanup
        assert!(!service.off(&handle));
    }

    #[test]
    fn test_request_headers_carry_bearer_token() {
        let headers = request_headers("token-abc");
        assert_eq!(
            headers.get("Authorization"),
            Some(&"Bearer token-abc".to_string())
        );
        assert_eq!(
            headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
    }

    #[tokio::test]
    async fn test_stream_with_unreachable_server() {
        let service =
            StreamingEstimateService::with_base_url("http://127.0.0.1:1/api".to_string());
        let request = EstimateRequest::new("test");
        let result = service.start_streaming(&request, "token").await;
        assert!(result.is_err());
        assert!(!result.unwrap_err().is_cancelled());
        assert!(!service.is_streaming());
    }
}
