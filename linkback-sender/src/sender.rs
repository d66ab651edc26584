use crate::config::SenderConfig;
use crate::discovery;
use crate::error::{LinkbackError, Result};
use crate::event::LinkbackEvent;
use crate::fault::PingbackFault;
use crate::links;
use crate::result::{EndpointResult, FailureReason, LinkbackRequest, PingbackOutcome};
use crate::xmlrpc::{MethodCall, MethodResponse, Value};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, info, warn};
use url::Url;

pub const PINGBACK_METHOD: &str = "pingback.ping";

/// Sends pingbacks on behalf of one module identity.
///
/// Holds no per-call state, so a single sender can be cloned and used from
/// many tasks at once.
#[derive(Debug, Clone)]
pub struct PingbackSender {
    client: Client,
    config: SenderConfig,
}

impl PingbackSender {
    pub fn new(config: SenderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .connect_timeout(config.timeout / 2)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| LinkbackError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Name of the event this sender reacts to.
    pub fn subscribed_event(&self) -> &str {
        &self.config.event_name
    }

    /// Handle a dispatched event. Events for other subscribers are ignored.
    pub async fn on_send(&self, event: &LinkbackEvent) -> Option<PingbackOutcome> {
        if event.name != self.config.event_name {
            debug!(
                channel = %self.config.channel,
                event = %event.name,
                "Ignoring event not addressed to this sender"
            );
            return None;
        }

        info!(
            channel = %self.config.channel,
            event = %event.name,
            "Event {} received, sending pingback",
            event.name
        );
        Some(self.send(&event.request).await)
    }

    /// Find the pingback endpoint for `target`.
    ///
    /// Never fails: unreachable targets, error statuses and bad URLs are
    /// logged and reported as [`EndpointResult::NotFound`].
    pub async fn discover_endpoint(&self, target: &str) -> EndpointResult {
        match discovery::fetch_endpoint(&self.client, target).await {
            Ok(result) => result,
            Err(LinkbackError::HttpStatus { status, reason }) => {
                warn!(
                    channel = %self.config.channel,
                    url = %target,
                    error = %format!("{} {}", status, reason),
                    "Failed to fetch url {} due to HTTP error \"{} {}\"",
                    target, status, reason
                );
                EndpointResult::NotFound
            }
            Err(e) => {
                warn!(
                    channel = %self.config.channel,
                    url = %target,
                    error = %e,
                    "Failed to fetch url {} due to error \"{}\"",
                    target, e
                );
                EndpointResult::NotFound
            }
        }
    }

    /// Invoke `pingback.ping(source, target)` on `endpoint`.
    ///
    /// Faults, HTTP errors and unreadable replies all come back as errors;
    /// see [`LinkbackError::fault_code`] for how they map to numeric codes.
    pub async fn call_pingback(&self, endpoint: &str, request: &LinkbackRequest) -> Result<Value> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| LinkbackError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let call = MethodCall::new(
            PINGBACK_METHOD,
            vec![request.source.as_str().into(), request.target.as_str().into()],
        );

        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(call.to_xml())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LinkbackError::from_status(status));
        }

        let body = response.text().await?;
        MethodResponse::from_xml(&body)?.into_result()
    }

    /// Discover the target's endpoint and ping it.
    pub async fn send(&self, request: &LinkbackRequest) -> PingbackOutcome {
        let endpoint = match self.discover_endpoint(request.target.as_str()).await {
            EndpointResult::Found(endpoint) => endpoint,
            EndpointResult::NotFound => {
                debug!(
                    channel = %self.config.channel,
                    source = %request.source,
                    target = %request.target,
                    "No pingback endpoint for {}",
                    request.target
                );
                return PingbackOutcome::Failure(FailureReason::NoEndpoint);
            }
        };

        match self.call_pingback(&endpoint, request).await {
            Ok(value) if value.is_truthy() => {
                info!(
                    channel = %self.config.channel,
                    source = %request.source,
                    target = %request.target,
                    endpoint = %endpoint,
                    "Pingback to {} from {} succeeded",
                    request.target, request.source
                );
                PingbackOutcome::Success
            }
            Ok(_) => {
                let err = LinkbackError::Fault {
                    code: PingbackFault::Generic.code(),
                    description: "endpoint returned an empty result".to_string(),
                };
                self.log_failure(request, &endpoint, &err);
                PingbackOutcome::remote(&err)
            }
            Err(err) => {
                self.log_failure(request, &endpoint, &err);
                PingbackOutcome::remote(&err)
            }
        }
    }

    /// Boolean entry point for callers that only care whether it worked.
    pub async fn send_pingback(&self, source: &str, target: &str) -> bool {
        match LinkbackRequest::new(source, target) {
            Ok(request) => self.send(&request).await.is_success(),
            Err(e) => {
                warn!(
                    channel = %self.config.channel,
                    source = %source,
                    target = %target,
                    error = %e,
                    "Not sending pingback: {}",
                    e
                );
                false
            }
        }
    }

    /// Send independent pingbacks, at most `concurrency` in flight.
    ///
    /// Results come back in completion order.
    pub async fn send_all(
        &self,
        requests: Vec<LinkbackRequest>,
        concurrency: usize,
    ) -> Vec<(LinkbackRequest, PingbackOutcome)> {
        info!(
            channel = %self.config.channel,
            "Sending {} pingback(s) with concurrency {}",
            requests.len(),
            concurrency
        );

        stream::iter(requests)
            .map(|request| async move {
                let outcome = self.send(&request).await;
                (request, outcome)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }

    /// Fetch `source` and list the pages it links to.
    pub async fn outbound_links(&self, source: &Url, include_internal: bool) -> Result<Vec<Url>> {
        links::fetch_outbound_links(&self.client, source, include_internal).await
    }

    fn log_failure(&self, request: &LinkbackRequest, endpoint: &str, err: &LinkbackError) {
        let code = err.fault_code();
        let description = err.description();
        error!(
            channel = %self.config.channel,
            source = %request.source,
            target = %request.target,
            endpoint = %endpoint,
            code,
            fault = %PingbackFault::from(code),
            "Pingback to {} from {} failed. Error {}: {}",
            request.target, request.source, code, description
        );
    }
}
