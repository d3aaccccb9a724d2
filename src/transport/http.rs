//! HTTP transport
//!
//! Every attempt reads the bearer token fresh from the credential provider,
//! so a token refreshed between retries is picked up immediately.

use super::types::{PageParams, RestPage, Transport};
use crate::auth::{CredentialProvider, TokenProvider};
use crate::config::{Endpoints, SourceConfig};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::soap::{parse_retrieve_response, RetrieveRequest, RetrieveResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Transport talking to the live SOAP and REST endpoints
pub struct HttpTransport {
    client: HttpClient,
    credentials: Arc<dyn CredentialProvider>,
    endpoints: Endpoints,
}

impl HttpTransport {
    /// Create a transport from its parts
    pub fn new(
        client: HttpClient,
        credentials: Arc<dyn CredentialProvider>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            client,
            credentials,
            endpoints,
        }
    }

    /// Build the transport, token provider included, from source config
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let credentials = Arc::new(TokenProvider::new(
            config.credentials()?,
            config.auth_strategies(),
            config.request_timeout(),
        )?);
        let client = HttpClient::new(
            HttpClientConfig::default()
                .timeout(config.request_timeout())
                .retry(config.retry_policy()),
        )?;
        Ok(Self::new(client, credentials, config.endpoints()?))
    }

    /// The credential provider used for every call
    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// SOAP endpoint, preferring the instance URL learned at auth time
    async fn soap_url(&self) -> Result<String> {
        self.credentials
            .instance_urls()
            .await
            .soap_url
            .or_else(|| self.endpoints.soap_url.clone())
            .ok_or_else(|| {
                Error::config("no SOAP endpoint: set soap_url or tenant_subdomain")
            })
    }

    /// REST base, preferring the instance URL learned at auth time
    async fn rest_url(&self) -> Result<String> {
        let base = self
            .credentials
            .instance_urls()
            .await
            .rest_url
            .or_else(|| self.endpoints.rest_url.clone())
            .ok_or_else(|| {
                Error::config("no REST endpoint: set rest_url or tenant_subdomain")
            })?;
        Ok(base.trim_end_matches('/').to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<RetrieveResponse> {
        let label = format!("Retrieve {}", request.object_type);

        let response = self
            .client
            .execute(&label, |attempt| async move {
                let token = self.credentials.token().await?;
                let url = self.soap_url().await?;
                debug!(object_type = %request.object_type, attempt, "Retrieve");
                let body = self
                    .client
                    .post_soap(&url, "Retrieve", request.to_envelope(&url, &token))
                    .await?;
                parse_retrieve_response(&body)
            })
            .await
            .map_err(|e| with_object_type(e, &request.object_type))?;

        response.into_result(&request.object_type)
    }

    async fn get_page(&self, endpoint: &str, params: &PageParams) -> Result<RestPage> {
        let label = format!("GET {endpoint}");
        let query = params.to_query();

        self.client
            .execute(&label, |attempt| {
                let query = &query;
                async move {
                    let token = self.credentials.token().await?;
                    let url = format!("{}/{}", self.rest_url().await?, endpoint.trim_start_matches('/'));
                    debug!(%url, page = params.page, attempt, "GET page");
                    let body = self.client.get_json(&url, query, &token).await?;
                    Ok(RestPage::from_body(body, params))
                }
            })
            .await
            .map_err(|e| with_object_type(e, endpoint))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &self.client)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// Errors raised below the transport do not know which object they were for
fn with_object_type(error: Error, object_type: &str) -> Error {
    match error {
        Error::PermissionFailure {
            object_type: current,
            message,
        } if current.is_empty() => Error::PermissionFailure {
            object_type: object_type.to_string(),
            message,
        },
        Error::IncompatibleFieldSelection {
            object_type: current,
            message,
        } if current.is_empty() => Error::IncompatibleFieldSelection {
            object_type: object_type.to_string(),
            message,
        },
        other => other,
    }
}
