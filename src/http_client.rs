use anyhow::{Context, Result as AnyResult};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    self, RefreshOutcome, TokenStore, ACCESS_TOKEN_KEY, DEFAULT_REFRESH_PATH, REFRESH_TOKEN_KEY,
};
use crate::error::{FetchError, Result};

/// Mutable request descriptor.
/// The client rewrites `headers` and restores `body` before a retry.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and mark it as JSON
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> serde_json::Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(value)?));
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| FetchError::InvalidHeader {
                name: name.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader {
            name: name.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Token currently set as the bearer credential, if any
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    fn set_bearer(&mut self, token: &str) -> Result<()> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            FetchError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
            }
        })?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// HTTP client that attaches the stored bearer credential and renews it once
/// when the server answers 401 or 403.
///
/// Calls are independent: two requests failing at the same time each run
/// their own refresh, and the last one to finish wins in the store.
pub struct AuthFetchClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Credential storage
    store: Arc<dyn TokenStore>,

    /// Base for relative request addresses
    base_url: Url,

    /// Refresh endpoint
    refresh_url: Url,
}

impl AuthFetchClient {
    /// Create a new client. Timeouts are in seconds.
    pub fn new(
        store: Arc<dyn TokenStore>,
        base_url: Url,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> AnyResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        let refresh_url = base_url
            .join(DEFAULT_REFRESH_PATH)
            .context("Failed to build refresh URL")?;

        Ok(Self {
            client,
            store,
            base_url,
            refresh_url,
        })
    }

    /// Use a different refresh endpoint, resolved against the base URL
    pub fn with_refresh_path(mut self, path: &str) -> Result<Self> {
        self.refresh_url = self.base_url.join(path)?;
        Ok(self)
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }

    /// Issue a request, allowing one refresh-and-retry cycle
    pub async fn fetch(&self, address: &str, options: &mut RequestOptions) -> Result<Response> {
        self.request(address, options, true).await
    }

    /// Issue a request with the stored bearer credential.
    ///
    /// On 401/403 with `should_retry` set:
    /// - no refresh credential: the failed response is returned as is
    /// - refresh accepted with a new access token: it is stored and the
    ///   request is retried exactly once; the retry's response is returned
    /// - refresh accepted without an access token: the failed response is returned
    /// - refresh rejected: both credentials are cleared and
    ///   [`FetchError::SessionExpired`] is returned without further requests
    pub async fn request(
        &self,
        address: &str,
        options: &mut RequestOptions,
        should_retry: bool,
    ) -> Result<Response> {
        let url = self.base_url.join(address)?;

        if let Some(token) = auth::credential(self.store.as_ref(), ACCESS_TOKEN_KEY) {
            options.set_bearer(&token)?;
        }

        let original_body = options.body.clone();
        let response = self.send(&url, options).await?;

        if !should_retry || !is_auth_failure(response.status()) {
            return Ok(response);
        }

        let Some(refresh_token) = auth::credential(self.store.as_ref(), REFRESH_TOKEN_KEY) else {
            tracing::debug!(
                status = %response.status(),
                "No refresh token stored, returning failed response"
            );
            return Ok(response);
        };

        tracing::warn!(
            status = %response.status(),
            url = %url,
            "Received auth failure, refreshing token and retrying..."
        );

        match auth::refresh_access_token(&self.client, &self.refresh_url, &refresh_token).await? {
            RefreshOutcome::Renewed(token) => {
                self.store.set(ACCESS_TOKEN_KEY, &token);
                options.set_bearer(&token)?;
                options.body = original_body;
                self.send(&url, options).await
            }
            RefreshOutcome::Missing => Ok(response),
            RefreshOutcome::Rejected(status) => {
                auth::clear_credentials(self.store.as_ref());
                tracing::warn!(status = status, "Session expired, credentials cleared");
                Err(FetchError::SessionExpired { status })
            }
        }
    }

    async fn send(&self, url: &Url, options: &RequestOptions) -> Result<Response> {
        tracing::debug!(
            method = %options.method,
            url = %url,
            authorized = options.headers.contains_key(AUTHORIZATION),
            "Sending HTTP request"
        );

        let mut builder = self
            .client
            .request(options.method.clone(), url.clone())
            .headers(options.headers.clone());
        if let Some(body) = &options.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, url = %url, "HTTP request error");
            e
        })?;

        tracing::debug!(status = %response.status(), "Received HTTP response");
        Ok(response)
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
