/// Client for the Reachard HTTP API.
///
/// Talks to the session and targets endpoints using the synchronous `ureq`
/// client:
///
/// | Operation        | Request                                              |
/// |------------------|------------------------------------------------------|
/// | log in           | `POST   {base}/v0/session/`                          |
/// | log out          | `DELETE {base}/v0/session/`                          |
/// | list targets     | `GET    {base}/v0/targets/[?own=true]`               |
/// | target detail    | `GET    {base}/v0/targets/{id}/`                     |
/// | add target       | `POST   {base}/v0/targets/`                          |
/// | delete target    | `DELETE {base}/v0/targets/{id}/`                     |
/// | incidents        | `GET    {base}/v0/targets/{id}/incidents/?since=`    |
/// | latencies        | `GET    {base}/v0/targets/{id}/latencies/?since=&step=` |
///
/// Authenticated calls read the token from the shared [`AuthCache`] and
/// return [`ApiError::NotLoggedIn`] without sending anything when it is
/// empty. Responses must carry `Content-Type: application/json` and the
/// expected shape; anything else is [`ApiError::MalformedResponse`].
pub mod types;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::auth::AuthCache;
use crate::config::schema::ApiConfig;
use crate::timeseries::LatencySeries;

pub use types::{NewTarget, Target};
use types::{Credentials, IncidentsPayload, LatenciesPayload};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session token is cached; the request was not sent.
    #[error("not logged in")]
    NotLoggedIn,

    /// The request never produced an HTTP response.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response was not JSON or not the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Operations the dashboard needs from the monitoring backend.
pub trait Backend: Send + Sync {
    /// Exchange credentials for a session token.
    fn log_in(&self, username: &str, password: &str) -> Result<String, ApiError>;

    /// Invalidate the current session on the server.
    fn log_out(&self) -> Result<(), ApiError>;

    /// List targets, optionally only those owned by the caller.
    fn list_targets(&self, own: bool) -> Result<Vec<Target>, ApiError>;

    fn target(&self, id: i64) -> Result<Target, ApiError>;

    fn add_target(&self, target: &NewTarget) -> Result<(), ApiError>;

    fn delete_target(&self, id: i64) -> Result<(), ApiError>;

    /// Incident timestamps for target `id` since `since` (epoch seconds).
    fn incidents(&self, id: i64, since: i64) -> Result<Vec<i64>, ApiError>;

    /// Latency samples for target `id` since `since`, aggregated to `step`
    /// seconds.
    fn latencies(&self, id: i64, since: i64, step: i64) -> Result<LatencySeries, ApiError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// `ureq`-backed [`Backend`].
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    auth: AuthCache,
}

impl ApiClient {
    /// Build a client from the resolved `[api]` config.
    pub fn from_config(config: &ApiConfig, auth: AuthCache) -> Self {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms), auth)
    }

    pub fn new(base_url: &str, timeout: Duration, auth: AuthCache) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session_url(&self) -> String {
        format!("{}/v0/session/", self.base_url)
    }

    fn targets_url(&self) -> String {
        format!("{}/v0/targets/", self.base_url)
    }

    fn target_url(&self, id: i64) -> String {
        format!("{}/v0/targets/{id}/", self.base_url)
    }

    /// `Bearer` header value, or `NotLoggedIn` when there is no token.
    fn bearer(&self) -> Result<String, ApiError> {
        let token = self.auth.get_token();
        if token.is_empty() {
            return Err(ApiError::NotLoggedIn);
        }
        Ok(format!("Bearer {token}"))
    }

    fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        let bearer = self.bearer()?;
        debug!(%url, "GET");
        let response = self
            .agent
            .get(url)
            .set("Authorization", &bearer)
            .call()
            .map_err(|e| map_ureq_error(url, e))?;
        read_json(response)
    }
}

impl Backend for ApiClient {
    fn log_in(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = self.session_url();
        debug!(%url, %username, "POST session");
        let response = self
            .agent
            .post(&url)
            .send_json(Credentials { username, password })
            .map_err(|e| map_ureq_error(&url, e))?;

        match read_json(response)? {
            Value::String(token) if !token.is_empty() => Ok(token),
            Value::String(_) => Err(ApiError::MalformedResponse(
                "session token is an empty string".to_string(),
            )),
            _ => Err(ApiError::MalformedResponse(
                "session token is not a JSON string".to_string(),
            )),
        }
    }

    fn log_out(&self) -> Result<(), ApiError> {
        let bearer = self.bearer()?;
        let url = self.session_url();
        debug!(%url, "DELETE session");
        self.agent
            .delete(&url)
            .set("Authorization", &bearer)
            .call()
            .map_err(|e| map_ureq_error(&url, e))?;
        Ok(())
    }

    fn list_targets(&self, own: bool) -> Result<Vec<Target>, ApiError> {
        let mut url = self.targets_url();
        if own {
            url.push_str("?own=true");
        }
        let value = self.get_json(&url)?;
        if !value.is_array() {
            return Err(ApiError::MalformedResponse(
                "the list of targets is not a JSON array".to_string(),
            ));
        }
        decode(value, "target list")
    }

    fn target(&self, id: i64) -> Result<Target, ApiError> {
        let value = self.get_json(&self.target_url(id))?;
        decode(value, "target")
    }

    fn add_target(&self, target: &NewTarget) -> Result<(), ApiError> {
        let bearer = self.bearer()?;
        let url = self.targets_url();
        debug!(%url, name = %target.name, "POST target");
        self.agent
            .post(&url)
            .set("Authorization", &bearer)
            .send_json(target)
            .map_err(|e| map_ureq_error(&url, e))?;
        Ok(())
    }

    fn delete_target(&self, id: i64) -> Result<(), ApiError> {
        let bearer = self.bearer()?;
        let url = self.target_url(id);
        debug!(%url, "DELETE target");
        self.agent
            .delete(&url)
            .set("Authorization", &bearer)
            .call()
            .map_err(|e| map_ureq_error(&url, e))?;
        Ok(())
    }

    fn incidents(&self, id: i64, since: i64) -> Result<Vec<i64>, ApiError> {
        let url = format!("{}incidents/?since={since}", self.target_url(id));
        let payload: IncidentsPayload = decode(self.get_json(&url)?, "incidents")?;
        Ok(payload.timestamps)
    }

    fn latencies(&self, id: i64, since: i64, step: i64) -> Result<LatencySeries, ApiError> {
        let url = format!("{}latencies/?since={since}&step={step}", self.target_url(id));
        let payload: LatenciesPayload = decode(self.get_json(&url)?, "latencies")?;
        LatencySeries::new(payload.timestamps, payload.values)
            .map_err(|e| ApiError::MalformedResponse(format!("latencies: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn map_ureq_error(url: &str, error: ureq::Error) -> ApiError {
    match error {
        ureq::Error::Status(status, _) => ApiError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(transport) => ApiError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

/// Check the media type and parse the body as JSON.
fn read_json(response: ureq::Response) -> Result<Value, ApiError> {
    let content_type = response.content_type().to_ascii_lowercase();
    if content_type != "application/json" {
        return Err(ApiError::MalformedResponse(format!(
            "expected application/json, got {content_type}"
        )));
    }

    let url = response.get_url().to_string();
    let body = response.into_string().map_err(|e| ApiError::Transport {
        url,
        message: format!("failed reading body: {e}"),
    })?;

    serde_json::from_str(&body)
        .map_err(|e| ApiError::MalformedResponse(format!("body is not valid JSON: {e}")))
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::MalformedResponse(format!("unexpected {what} shape: {e}")))
}
