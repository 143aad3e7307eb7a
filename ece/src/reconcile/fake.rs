//! In-memory stand-in for the control plane API

use std::sync::Mutex;

use async_trait::async_trait;
use libece::{ApiResponse, CertificateUpload, Credentials, Service};
use serde_json::{json, Value};

use crate::client::Api;
use crate::error::Result;

pub const MAIL: &str = "user@example.com";
pub const PASSWORD: &str = "password";
const TOKEN: &str = "token";
const CREATED_DATE: &str = "2017-11-02T10:00:00.000Z";

#[derive(Default)]
struct Store {
    certificates: Vec<Value>,
    instances: Vec<Value>,
    next_id: usize,
    mutations: usize,
    listing_status: Option<u16>,
}

impl Store {
    fn id(&mut self) -> String {
        self.next_id += 1;
        format!("{:024x}", self.next_id)
    }

    fn stored_services(&mut self, services: &[Service]) -> Value {
        let mut stored = Vec::new();
        for service in services {
            let mut value = json!(service);
            value["_id"] = json!(self.id());
            value["created_date"] = json!(CREATED_DATE);
            stored.push(value);
        }
        Value::Array(stored)
    }
}

#[derive(Default)]
pub struct FakeApi {
    store: Mutex<Store>,
}

fn unauthorized() -> ApiResponse {
    ApiResponse::new(
        401,
        json!({"status": "error", "message": "Invalid credentials"}),
    )
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, json!({"status": "error", "message": "Not found"}))
}

impl FakeApi {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(MAIL, PASSWORD.to_string().into())
    }

    pub fn certificates(&self) -> Vec<Value> {
        self.store.lock().unwrap().certificates.clone()
    }

    pub fn instances(&self) -> Vec<Value> {
        self.store.lock().unwrap().instances.clone()
    }

    /// Number of successful create, update and delete calls
    pub fn mutations(&self) -> usize {
        self.store.lock().unwrap().mutations
    }

    pub fn fail_listing(&self, status: u16) {
        self.store.lock().unwrap().listing_status = Some(status);
    }

    pub fn add_certificate(&self, id: &str, name: &str, key: &str) {
        self.store.lock().unwrap().certificates.push(json!({
            "_id": id,
            "name": name,
            "key": key,
            "cert": "-----BEGIN CERTIFICATE-----",
        }));
    }

    pub fn add_instance(&self, id: &str, name: &str, services: &[Service]) {
        let mut store = self.store.lock().unwrap();
        let services = store.stored_services(services);
        store.instances.push(json!({
            "_id": id,
            "name": name,
            "created_date": CREATED_DATE,
            "services": services,
        }));
    }

    fn listing(&self, token: &str, body: impl FnOnce(&Store) -> Value) -> ApiResponse {
        if token != TOKEN {
            return unauthorized();
        }
        let store = self.store.lock().unwrap();
        match store.listing_status {
            Some(status) => ApiResponse::new(status, json!({"status": "error"})),
            None => ApiResponse::new(200, body(&*store)),
        }
    }

    fn remove(
        &self,
        token: &str,
        id: &str,
        collection: fn(&mut Store) -> &mut Vec<Value>,
    ) -> ApiResponse {
        if token != TOKEN {
            return unauthorized();
        }
        let mut store = self.store.lock().unwrap();
        let items = collection(&mut *store);
        let Some(index) = items.iter().position(|item| item["_id"] == id) else {
            return not_found();
        };
        let removed = items.remove(index);
        store.mutations += 1;
        ApiResponse::new(200, json!({"status": "success", "data": removed}))
    }
}

#[async_trait]
impl Api for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse> {
        if credentials.mail == MAIL && credentials.password.expose() == PASSWORD {
            Ok(ApiResponse::new(
                200,
                json!({"status": "success", "data": {"token": TOKEN}}),
            ))
        } else {
            Ok(unauthorized())
        }
    }

    async fn list_certificates(&self, token: &str) -> Result<ApiResponse> {
        Ok(self.listing(token, |store| {
            json!({"status": "success", "data": store.certificates})
        }))
    }

    async fn create_certificate(
        &self,
        token: &str,
        upload: &CertificateUpload,
    ) -> Result<ApiResponse> {
        if token != TOKEN {
            return Ok(unauthorized());
        }
        let mut store = self.store.lock().unwrap();
        let mut certificate = json!({"_id": store.id(), "name": upload.name()});
        for (field, content) in upload.files() {
            certificate[field] = json!(content);
        }
        store.certificates.push(certificate.clone());
        store.mutations += 1;
        Ok(ApiResponse::new(
            200,
            json!({"status": "success", "data": certificate}),
        ))
    }

    async fn delete_certificate(&self, token: &str, id: &str) -> Result<ApiResponse> {
        Ok(self.remove(token, id, |store| &mut store.certificates))
    }

    async fn list_instances(&self, token: &str) -> Result<ApiResponse> {
        Ok(self.listing(token, |store| json!(store.instances)))
    }

    async fn create_instance(
        &self,
        token: &str,
        name: &str,
        services: &[Service],
    ) -> Result<ApiResponse> {
        if token != TOKEN {
            return Ok(unauthorized());
        }
        let mut store = self.store.lock().unwrap();
        let instance = json!({
            "_id": store.id(),
            "name": name,
            "created_date": CREATED_DATE,
            "services": store.stored_services(services),
        });
        store.instances.push(instance.clone());
        store.mutations += 1;
        Ok(ApiResponse::new(200, instance))
    }

    async fn update_instance(
        &self,
        token: &str,
        id: &str,
        services: &[Service],
    ) -> Result<ApiResponse> {
        if token != TOKEN {
            return Ok(unauthorized());
        }
        let mut store = self.store.lock().unwrap();
        let services = store.stored_services(services);
        let Some(instance) = store.instances.iter_mut().find(|i| i["_id"] == id) else {
            return Ok(not_found());
        };
        instance["services"] = services;
        let instance = instance.clone();
        store.mutations += 1;
        Ok(ApiResponse::new(200, instance))
    }

    async fn delete_instance(&self, token: &str, id: &str) -> Result<ApiResponse> {
        Ok(self.remove(token, id, |store| &mut store.instances))
    }
}
