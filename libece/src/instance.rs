use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Routing and origin configuration for one public hostname of an instance
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    pub fqdn: String,
    pub origin_hostheader: String,
    pub origin_backend: String,
    pub provider_region: String,
    pub provider_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Recursively sorts object keys and array elements, so that two values
/// holding the same data compare and serialize identically.
fn canonical(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.into_iter().map(canonical).collect();
            items.sort_by_cached_key(|item| item.to_string());
            Value::Array(items)
        }
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.into_iter().map(|(k, v)| (k, canonical(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        other => other,
    }
}

impl Service {
    fn canonical_form(&self) -> String {
        canonical(serde_json::to_value(self).unwrap_or_default()).to_string()
    }

    /// Order-insensitive structural equality of two service lists
    pub fn same_set(a: &[Service], b: &[Service]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let mut a: Vec<String> = a.iter().map(Service::canonical_form).collect();
        let mut b: Vec<String> = b.iter().map(Service::canonical_form).collect();
        a.sort();
        b.sort();
        a == b
    }
}

/// A service as stored by the API, with the fields it assigns
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredService {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<Value>,
    #[serde(flatten)]
    pub service: Service,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Instance {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<Value>,
    #[serde(default)]
    pub services: Vec<StoredService>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instance {
    /// Looks up `name` in the body of `GET /instance`, a bare array. Only the
    /// matching entry is decoded, unrelated records may be partial.
    pub fn find_in(body: &Value, name: &str) -> Result<Option<Instance>> {
        let entries = body
            .as_array()
            .ok_or(Error::MalformedResponse("instance list"))?;
        crate::named(entries, name)
            .map(|entry| {
                Instance::deserialize(entry).map_err(|_| Error::MalformedResponse("instance"))
            })
            .transpose()
    }

    /// Stored services without `_id` and `created_date`
    pub fn services(&self) -> Vec<Service> {
        self.services.iter().map(|s| s.service.clone()).collect()
    }

    pub fn services_match(&self, desired: &[Service]) -> bool {
        Service::same_set(&self.services(), desired)
    }
}

/// Body of `POST /instance`
#[derive(Serialize, Debug)]
pub struct InstanceCreate<'a> {
    pub name: &'a str,
    pub services: &'a [Service],
}

/// Body of `PUT /instance/{id}`
#[derive(Serialize, Debug)]
pub struct InstanceUpdate<'a> {
    pub services: &'a [Service],
}
