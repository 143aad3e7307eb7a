use std::time::Duration;

use async_trait::async_trait;
use libece::instance::{InstanceCreate, InstanceUpdate};
use libece::{ApiResponse, ApiUrl, CertificateUpload, Credentials, Service};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

const ACCESS_TOKEN_HEADER: &str = "x-access-token";

#[derive(Serialize)]
struct LoginRequest<'a> {
    mail: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct LoginData {
    token: String,
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    data: LoginData,
}

/// Extracts the access token from a successful `POST /login` response
pub fn access_token(response: &ApiResponse) -> Option<String> {
    LoginResponse::deserialize(&response.body)
        .ok()
        .map(|login| login.data.token)
        .filter(|token| !token.is_empty())
}

/// Calls of the control plane API used by the reconcilers. Every call
/// resolves to the status and body the server answered with, whatever
/// the status is; only transport failures are errors.
#[async_trait]
pub trait Api: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse>;

    async fn list_certificates(&self, token: &str) -> Result<ApiResponse>;
    async fn create_certificate(
        &self,
        token: &str,
        upload: &CertificateUpload,
    ) -> Result<ApiResponse>;
    async fn delete_certificate(&self, token: &str, id: &str) -> Result<ApiResponse>;

    async fn list_instances(&self, token: &str) -> Result<ApiResponse>;
    async fn create_instance(
        &self,
        token: &str,
        name: &str,
        services: &[Service],
    ) -> Result<ApiResponse>;
    async fn update_instance(
        &self,
        token: &str,
        id: &str,
        services: &[Service],
    ) -> Result<ApiResponse>;
    async fn delete_instance(&self, token: &str, id: &str) -> Result<ApiResponse>;
}

pub struct Client {
    http: reqwest::Client,
    base: ApiUrl,
}

impl Client {
    pub fn new(base: ApiUrl, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    fn url(&self, segments: &[&str]) -> String {
        self.base.endpoint(segments)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiResponse> {
        let resp = request.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        let response = ApiResponse::from_bytes(status, &body);
        debug!(status, "API response");
        Ok(response)
    }

    fn get(&self, token: &str, segments: &[&str]) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(segments))
            .header(ACCESS_TOKEN_HEADER, token)
    }

    fn delete(&self, token: &str, segments: &[&str]) -> reqwest::RequestBuilder {
        self.http
            .delete(self.url(segments))
            .header(ACCESS_TOKEN_HEADER, token)
    }
}

#[async_trait]
impl Api for Client {
    async fn login(&self, credentials: &Credentials) -> Result<ApiResponse> {
        debug!(mail = credentials.mail, "logging in");
        let request = LoginRequest {
            mail: &credentials.mail,
            password: credentials.password.expose(),
        };
        self.send(self.http.post(self.url(&["login"])).json(&request))
            .await
    }

    async fn list_certificates(&self, token: &str) -> Result<ApiResponse> {
        debug!("listing certificates");
        self.send(self.get(token, &["certificate"])).await
    }

    async fn create_certificate(
        &self,
        token: &str,
        upload: &CertificateUpload,
    ) -> Result<ApiResponse> {
        debug!(
            name = upload.name(),
            chain = upload.chain().is_some(),
            "uploading certificate"
        );
        let mut form = Form::new().text("name", upload.name().to_string());
        for (field, content) in upload.files() {
            form = form.part(field, Part::text(content.to_string()).file_name(field));
        }
        let request = self
            .http
            .post(self.url(&["certificate"]))
            .header(ACCESS_TOKEN_HEADER, token)
            .multipart(form);
        self.send(request).await
    }

    async fn delete_certificate(&self, token: &str, id: &str) -> Result<ApiResponse> {
        debug!(id, "deleting certificate");
        self.send(self.delete(token, &["certificate", id])).await
    }

    async fn list_instances(&self, token: &str) -> Result<ApiResponse> {
        debug!("listing instances");
        self.send(self.get(token, &["instance"])).await
    }

    async fn create_instance(
        &self,
        token: &str,
        name: &str,
        services: &[Service],
    ) -> Result<ApiResponse> {
        debug!(name, services = services.len(), "creating instance");
        let request = self
            .http
            .post(self.url(&["instance"]))
            .header(ACCESS_TOKEN_HEADER, token)
            .json(&InstanceCreate { name, services });
        self.send(request).await
    }

    async fn update_instance(
        &self,
        token: &str,
        id: &str,
        services: &[Service],
    ) -> Result<ApiResponse> {
        debug!(id, services = services.len(), "updating instance");
        let request = self
            .http
            .put(self.url(&["instance", id]))
            .header(ACCESS_TOKEN_HEADER, token)
            .json(&InstanceUpdate { services });
        self.send(request).await
    }

    async fn delete_instance(&self, token: &str, id: &str) -> Result<ApiResponse> {
        debug!(id, "deleting instance");
        self.send(self.delete(token, &["instance", id])).await
    }
}
