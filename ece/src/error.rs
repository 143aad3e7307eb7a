use std::path::PathBuf;

use libece::ApiResponse;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The API rejected the credentials with 401. Carries the login response.
    #[error("Authentication failed.")]
    AuthenticationFailed(Value),
    /// Listing the resources returned 500
    #[error("{message}")]
    Fetch { message: &'static str, body: Value },
    /// Parameters required for the chosen path were not provided
    #[error("{message}")]
    Validation {
        message: &'static str,
        response: ApiResponse,
    },
    /// The resource to delete does not exist
    #[error("{message}")]
    NotFound {
        message: &'static str,
        response: ApiResponse,
    },
    /// Any status the reconcilers don't handle
    #[error("Something went wrong")]
    Unexpected(ApiResponse),

    #[error("http client error {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("error in library {0}")]
    Lib(#[from] libece::Error),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("reading {}: {1}", .0.display())]
    ReadFile(PathBuf, std::io::Error),
    #[error("parsing services from {}: {1}", .0.display())]
    Services(PathBuf, serde_yaml::Error),
    #[error("missing setting {0}")]
    MissingSetting(&'static str),
}

impl Error {
    /// Payload reported alongside the failure message
    pub fn meta(&self) -> Value {
        match self {
            Error::AuthenticationFailed(body) => body.clone(),
            Error::Fetch { body, .. } => body.clone(),
            Error::Validation { response, .. }
            | Error::NotFound { response, .. }
            | Error::Unexpected(response) => response.to_meta(),
            _ => Value::Null,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
