use libece::{ApiResponse, Credentials};
use serde::Serialize;
use serde_json::Value;

use crate::client::{access_token, Api};
use crate::error::{Error, Result};

pub mod certificate;
pub mod instance;

#[cfg(test)]
mod fake;

pub use certificate::CertificateParams;
pub use instance::InstanceParams;

/// What a reconciler did to converge the resource
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Unchanged(Value),
    Created(Value),
    Updated(Value),
    Deleted(Value),
}

impl Outcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Outcome::Unchanged(_))
    }

    pub fn meta(&self) -> &Value {
        match self {
            Outcome::Unchanged(meta)
            | Outcome::Created(meta)
            | Outcome::Updated(meta)
            | Outcome::Deleted(meta) => meta,
        }
    }
}

/// Result record of one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    pub meta: Value,
}

impl Report {
    /// Builds the record for a reconciler result. Unless `strict_auth` is
    /// set, rejected credentials are reported with a message but not as a
    /// failure.
    pub fn new(result: Result<Outcome>, strict_auth: bool) -> Self {
        match result {
            Ok(outcome) => Report {
                changed: outcome.changed(),
                failed: false,
                msg: None,
                meta: outcome.meta().clone(),
            },
            Err(error) => Report {
                changed: false,
                failed: strict_auth || !matches!(error, Error::AuthenticationFailed(_)),
                msg: Some(error.to_string()),
                meta: error.meta(),
            },
        }
    }
}

/// Exchanges the credentials for an access token
pub(crate) async fn authenticate(api: &dyn Api, credentials: &Credentials) -> Result<String> {
    let response = api.login(credentials).await?;
    match response.status {
        401 => {
            tracing::warn!(mail = credentials.mail, "authentication failed");
            Err(Error::AuthenticationFailed(response.body))
        }
        200 => access_token(&response).ok_or(Error::Unexpected(response)),
        _ => Err(Error::Unexpected(response)),
    }
}

/// Checks the status of a listing call, `fetch_error` is the message
/// reported when the server fails with 500
pub(crate) fn check_listing(response: &ApiResponse, fetch_error: &'static str) -> Result<()> {
    match response.status {
        200 => Ok(()),
        500 => Err(Error::Fetch {
            message: fetch_error,
            body: response.body.clone(),
        }),
        _ => Err(Error::Unexpected(response.clone())),
    }
}

/// Passes through the response of a create, update or delete call
pub(crate) fn mutated(
    response: ApiResponse,
    outcome: fn(Value) -> Outcome,
) -> Result<Outcome> {
    if response.is_success() {
        Ok(outcome(response.body))
    } else {
        Err(Error::Unexpected(response))
    }
}
