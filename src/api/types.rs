//! Wire types for the Reachard HTTP API.

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// A monitored target as returned by `GET /v0/targets/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub url: String,
    pub interval_seconds: u64,
    /// Creation time in epoch seconds.
    #[serde(deserialize_with = "deserialize_epoch_seconds")]
    pub time_added: i64,
}

impl Target {
    /// Seconds since the target was added, relative to `now`.
    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.time_added)
    }

    /// Name for display, falling back to the URL for unnamed targets.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

/// Request body for `POST /v0/targets/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTarget {
    pub name: String,
    pub url: String,
    pub interval_seconds: u64,
}

/// Request body for `POST /v0/session/`.
#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response body for `GET /v0/targets/{id}/incidents/`.
#[derive(Debug, Deserialize)]
pub(crate) struct IncidentsPayload {
    pub timestamps: Vec<i64>,
}

/// Response body for `GET /v0/targets/{id}/latencies/`.
#[derive(Debug, Deserialize)]
pub(crate) struct LatenciesPayload {
    pub timestamps: Vec<i64>,
    pub values: Vec<Option<f64>>,
}

/// Accept either integer epoch seconds or an RFC 3339 timestamp.
fn deserialize_epoch_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(seconds) => Ok(seconds),
        Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.timestamp())
            .map_err(serde::de::Error::custom),
    }
}
