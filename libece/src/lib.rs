pub mod certificate;
pub mod error;
pub mod instance;

use std::fmt;
use std::str::FromStr;

pub use error::Error;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use simple_error::SimpleError;
use url::Url;

pub use certificate::{Certificate, CertificateUpload};
pub use instance::{Instance, Service, StoredService};

/// Desired state of a named resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Present,
    Absent,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Present => "present",
            State::Absent => "absent",
        }
    }
}

impl FromStr for State {
    type Err = SimpleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "present" => Ok(State::Present),
            "absent" => Ok(State::Absent),
            other => Err(SimpleError::new(format!(
                "invalid state {other}, expected present or absent"
            ))),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A string that never shows up in logs or debug output
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Login material, exchanged once per invocation for an access token
#[derive(Debug, Clone)]
pub struct Credentials {
    pub mail: String,
    pub password: Secret,
}

impl Credentials {
    pub fn new(mail: &str, password: Secret) -> Self {
        Self {
            mail: mail.to_string(),
            password,
        }
    }
}

/// Base URL of the control plane API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrl(Url);

impl ApiUrl {
    pub fn parse(s: &str) -> error::Result<Self> {
        let url = Url::parse(s.trim()).map_err(|e| Error::InvalidUrl(s.to_string(), e))?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                s.to_string(),
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self(url))
    }

    /// Joins path segments onto the base, e.g. `endpoint(&["instance", id])`
    pub fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.0.clone();
        // `parse` rejects cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }
}

impl fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First entry of a listing whose `name` is exactly `name`
fn named<'a>(entries: &'a [Value], name: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
}

/// Status code and decoded body of a single API call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    #[serde(rename = "response")]
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Decodes a raw body. Bodies that are not JSON are kept as a string.
    pub fn from_bytes(status: u16, bytes: &[u8]) -> Self {
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
        };
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `{"status": ..., "response": ...}`, the shape used for failure payloads
    pub fn to_meta(&self) -> Value {
        serde_json::json!({
            "status": self.status,
            "response": self.body,
        })
    }
}
