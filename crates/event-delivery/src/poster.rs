//! Event poster: one HTTP POST per payload, outcome classified for the dispatcher.

use crate::{DeliveryResult, SendPolicy};
use async_trait::async_trait;
use delivery_config_and_utils::Config;
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Substring of a response body that marks an application-level error.
pub const APPLICATION_ERROR_MARKER: &str = "errors";

/// Result of a single post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The exchange completed. Success or permanent failure, either way the job is done.
    Delivered,
    /// Transient network failure; the job should be retried on a later cycle.
    RetryLater,
    /// The collector moved; the poster already points at the new destination.
    Redirected,
}

/// Transport seam used by the dispatcher.
#[async_trait]
pub trait EventPoster: Send {
    /// Limits the dispatcher applies to jobs sent through this poster.
    fn send_policy(&self) -> SendPolicy;

    /// Post one payload and classify the outcome.
    async fn post(&mut self, payload: &str) -> PostOutcome;
}

/// HTTP poster configuration.
#[derive(Debug, Clone)]
pub struct PosterConfig {
    /// Initial destination.
    pub endpoint_url: Url,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
    /// Limits handed to the dispatcher.
    pub policy: SendPolicy,
}

impl PosterConfig {
    /// Configuration with default timeouts and policy.
    pub fn new(endpoint_url: Url) -> Self {
        Self {
            endpoint_url,
            connect_timeout: Duration::from_secs(
                delivery_config_and_utils::DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
            read_timeout: Duration::from_secs(delivery_config_and_utils::DEFAULT_READ_TIMEOUT_SECS),
            policy: SendPolicy::default(),
        }
    }

    /// Build from the delivery configuration, resolving the endpoint.
    pub fn from_config(config: &Config) -> DeliveryResult<Self> {
        Ok(Self {
            endpoint_url: config.endpoint_url()?,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            policy: SendPolicy::from(&config.policy),
        })
    }
}

/// Posts payloads to the collector over HTTP.
///
/// Redirects are handled here rather than by the client: a `307` replaces the
/// destination for every later post made through this instance.
pub struct HttpEventPoster {
    url: Url,
    policy: SendPolicy,
    client: Client,
}

impl HttpEventPoster {
    /// Create a new poster.
    pub fn new(config: PosterConfig) -> DeliveryResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            url: config.endpoint_url,
            policy: config.policy,
            client,
        })
    }

    /// Current destination.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Point this poster at the `307` target.
    ///
    /// A relative `Location` is joined onto the current URL. A missing or
    /// unparseable one leaves the URL unchanged and asks for a retry.
    fn follow_redirect(&mut self, response: &Response) -> PostOutcome {
        let location = match response.headers().get(LOCATION) {
            Some(value) => value.to_str().map_err(|e| e.to_string()),
            None => Err("missing Location header".to_string()),
        };

        match location.and_then(|loc| self.url.join(loc).map_err(|e| e.to_string())) {
            Ok(next) => {
                info!(from = %self.url, to = %next, "Collector redirected event endpoint");
                self.url = next;
                PostOutcome::Redirected
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "Unusable redirect from collector");
                PostOutcome::RetryLater
            }
        }
    }

    async fn read_body(&self, response: Response) {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = %status, error = %e, "Error reading collector response");
                String::new()
            }
        };

        if body.contains(APPLICATION_ERROR_MARKER) {
            warn!(status = %status, body = %body, "Collector reported errors");
        } else if status != StatusCode::OK {
            warn!(status = %status, "Collector rejected event, not retrying");
        }
    }
}

#[async_trait]
impl EventPoster for HttpEventPoster {
    fn send_policy(&self) -> SendPolicy {
        self.policy
    }

    async fn post(&mut self, payload: &str) -> PostOutcome {
        debug!(url = %self.url, bytes = payload.len(), "Posting event");

        let response = match self
            .client
            .post(self.url.clone())
            .body(payload.to_owned())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                // request could not be built; dropped
                error!(url = %self.url, error = %e, "Event request could not be built");
                return PostOutcome::Delivered;
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "Network error while posting event");
                return PostOutcome::RetryLater;
            }
        };

        if response.status() == StatusCode::TEMPORARY_REDIRECT {
            return self.follow_redirect(&response);
        }

        self.read_body(response).await;
        PostOutcome::Delivered
    }
}
