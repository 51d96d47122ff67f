//! Home Assistant HTTP client.
//! This is the lower level client for the Home Assistant REST API.

use failsafe::{
    backoff::{self, Constant},
    failure_policy::{self, ConsecutiveFailures},
    futures::CircuitBreaker,
};
use reqwest::{Client, StatusCode, Url};
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use super::schemas::{ApiStatus, StateCreateOrUpdate};
use super::{Error, Result};

type Breaker = failsafe::StateMachine<ConsecutiveFailures<Constant>, ()>;

pub struct HttpClient {
    client: Client,
    token: String,
    base_url: Url,
    circuit_breaker: Breaker,
}

impl HttpClient {
    /// Creates a new instance of `HttpClient`.
    pub fn new(url: Url, token: String) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(Duration::from_secs(2))
            .build()?;
        Ok(HttpClient {
            client,
            token,
            base_url: url,
            circuit_breaker: Self::circuit_breaker(),
        })
    }

    /// Creates or updates the state of an entity.
    pub async fn post_state(&self, entity_id: &str, state: &StateCreateOrUpdate) -> Result<()> {
        let url = self.state_url(entity_id)?;
        let body = serde_json::to_string(state)?;
        self.call(|| self.request_post_state(&url, &body)).await
    }

    /// Get the API status message, used to check the API is reachable and the token accepted.
    pub async fn get_api_status(&self) -> Result<ApiStatus> {
        let url = self.api_url("api/")?;
        self.call(|| self.request_get_api_status(&url)).await
    }

    /// Run `operation` behind the circuit breaker, retrying server side failures.
    async fn call<T, Op, Fut>(&self, operation: Op) -> Result<T>
    where
        Op: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let operation = &operation;
        RetryIf::spawn(
            Self::retry_strategy(),
            || async move {
                self.circuit_breaker
                    .call_with(Self::is_server_failure, operation())
                    .await
                    .map_err(|err| match err {
                        failsafe::Error::Rejected => Error::RequestRejected,
                        failsafe::Error::Inner(e) => e,
                    })
            },
            Self::is_server_failure,
        )
        .await
    }

    fn state_url(&self, entity_id: &str) -> Result<Url> {
        let valid = entity_id
            .split_once('.')
            .is_some_and(|(domain, object_id)| {
                !domain.is_empty()
                    && !object_id.is_empty()
                    && entity_id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            });
        if !valid {
            return Err(Error::InvalidEntityId(entity_id.to_string()));
        }
        self.api_url(&format!("api/states/{entity_id}"))
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{}{path}: {e}", self.base_url)))
    }

    async fn request_post_state(&self, url: &Url, body: &str) -> Result<()> {
        log::debug!("Sending post state request to '{url}': {body}");
        self.client
            .post(url.clone())
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn request_get_api_status(&self, url: &Url) -> Result<ApiStatus> {
        let text = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Circuit breaker opening after 5 consecutive failures, probing again after 60 seconds.
    fn circuit_breaker() -> Breaker {
        let backoff = backoff::constant(Duration::from_secs(60));
        let policy = failure_policy::consecutive_failures(5, backoff);
        failsafe::Config::new().failure_policy(policy).build()
    }

    /// Exponential backoff starting at 10 milliseconds, with jitter, at most 3 retries.
    fn retry_strategy() -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(10).map(jitter).take(3)
    }

    /// Check if the error is a HTTP 4xx client error.
    fn is_client_error(error: &reqwest::Error) -> bool {
        error
            .status()
            .map(|status_code| StatusCode::is_client_error(&status_code))
            .unwrap_or(false)
    }

    /// Transport and 5xx errors are retried and counted by the circuit breaker.
    /// Client errors, rejections and local errors are neither.
    fn is_server_failure(error: &Error) -> bool {
        match error {
            Error::RequestFailed(err) => !Self::is_client_error(err),
            Error::RequestRejected => false,
            Error::JsonSerializationFailed(_) => false,
            Error::InvalidEntityId(_) | Error::InvalidUrl(_) => false,
        }
    }
}
