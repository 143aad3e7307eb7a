use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A certificate as listed by the API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Certificate {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Certificate {
    /// Looks up `name` in the body of `GET /certificate`, which wraps the list
    /// in `data`. Only the matching entry is decoded.
    pub fn find_in(body: &Value, name: &str) -> Result<Option<Certificate>> {
        let entries = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or(Error::MalformedResponse("certificate list"))?;
        crate::named(entries, name)
            .map(|entry| {
                Certificate::deserialize(entry)
                    .map_err(|_| Error::MalformedResponse("certificate"))
            })
            .transpose()
    }
}

/// Material for `POST /certificate`, sent as multipart form data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateUpload {
    name: String,
    key: String,
    cert: String,
    chain: Option<String>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim_end)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl CertificateUpload {
    /// Returns None unless both key and cert are provided
    pub fn new(
        name: &str,
        key: Option<&str>,
        cert: Option<&str>,
        chain: Option<&str>,
    ) -> Option<Self> {
        Some(Self {
            name: name.to_string(),
            key: trimmed(key)?,
            cert: trimmed(cert)?,
            chain: trimmed(chain),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cert(&self) -> &str {
        &self.cert
    }

    pub fn chain(&self) -> Option<&str> {
        self.chain.as_deref()
    }

    /// File parts in upload order. `chain` is left out when not provided.
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        let mut files = vec![("key", self.key.as_str()), ("cert", self.cert.as_str())];
        if let Some(chain) = &self.chain {
            files.push(("chain", chain));
        }
        files
    }
}
