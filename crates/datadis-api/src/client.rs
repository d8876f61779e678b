use crate::auth::{
    Authenticator, Credentials, DEFAULT_REFRESH_MARGIN_SECS, DEFAULT_TOKEN_LIFETIME_SECS,
};
use crate::endpoints::{join_url, Endpoint, DEFAULT_API_BASE, DEFAULT_BASE_URL};
use crate::errors::{ApiError, Result};
use crate::transport::{HttpTransport, Payload, TransportRequest, DEFAULT_TIMEOUT};
use crate::v1::{V1Raw, V1Typed};
use crate::v2::V2Typed;
use chrono::{DateTime, Utc};
use datadis_utils::RetryPolicy;
use log::{debug, error, warn};
use serde_json::Value;
use std::time::Duration;

/// Trait for providing configuration to the API client
/// This allows the main application to implement config without circular dependencies
pub trait ApiConfig {
    type Error;

    /// Get the login credentials
    fn get_credentials(&self) -> std::result::Result<Credentials, Self::Error>;

    /// Get the login base URL (optional, defaults to the official site)
    fn get_base_url(&self) -> std::result::Result<Option<String>, Self::Error> {
        Ok(None)
    }

    /// Get the data API base URL (optional, defaults to the official API)
    fn get_api_base(&self) -> std::result::Result<Option<String>, Self::Error> {
        Ok(None)
    }

    fn get_timeout(&self) -> std::result::Result<Option<Duration>, Self::Error> {
        Ok(None)
    }

    fn get_retries(&self) -> std::result::Result<Option<u32>, Self::Error> {
        Ok(None)
    }
}

/// Builder for [`DatadisClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    credentials: Credentials,
    base_url: String,
    api_base: String,
    timeout: Duration,
    retry: RetryPolicy,
    token_lifetime: Duration,
    refresh_margin: Duration,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::from_credentials(Credentials::new(username, password))
    }

    pub fn from_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            token_lifetime: Duration::from_secs(DEFAULT_TOKEN_LIFETIME_SECS as u64),
            refresh_margin: Duration::from_secs(DEFAULT_REFRESH_MARGIN_SECS as u64),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retry.retries = retries;
        self
    }

    pub fn backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.retry.base_delay = base_delay;
        self.retry.max_delay = max_delay;
        self
    }

    pub fn token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    pub fn refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn build(self) -> Result<DatadisClient> {
        DatadisClient::new(self)
    }
}

/// Authenticated client for the Datadis API
///
/// Every call that may touch the token takes `&mut self`; share a client
/// across tasks by wrapping it in a mutex.
#[derive(Debug)]
pub struct DatadisClient {
    transport: HttpTransport,
    auth: Authenticator,
    api_base: String,
}

impl DatadisClient {
    /// Create a new API client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = parse_base(&config.base_url, "base URL")?;
        let api_base = parse_base(&config.api_base, "API base URL")?;

        let token_lifetime = chrono::Duration::from_std(config.token_lifetime)
            .map_err(|e| ApiError::Config(format!("Invalid token lifetime: {}", e)))?;
        let refresh_margin = chrono::Duration::from_std(config.refresh_margin)
            .map_err(|e| ApiError::Config(format!("Invalid refresh margin: {}", e)))?;

        debug!("Creating DatadisClient");
        debug!("  User: {}", config.credentials.username());
        debug!("  Base URL: {}", base_url);
        debug!("  API base: {}", api_base);

        let transport = HttpTransport::new(config.timeout, config.retry)?;
        let auth = Authenticator::new(config.credentials, base_url)
            .with_token_lifetime(token_lifetime)
            .with_refresh_margin(refresh_margin);

        Ok(Self {
            transport,
            auth,
            api_base,
        })
    }

    /// Start a [`ClientConfig`] with the given credentials
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> ClientConfig {
        ClientConfig::new(username, password)
    }

    /// Create a client with default settings
    pub fn with_credentials(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        ClientConfig::new(username, password).build()
    }

    /// Create API client from environment variables
    pub fn from_env() -> Result<Self> {
        debug!("Creating DatadisClient from environment variables");
        let username = std::env::var("DATADIS_USERNAME")
            .or_else(|_| std::env::var("DATADIS_CIF"))
            .map_err(|_| {
                error!("DATADIS_USERNAME environment variable not set");
                ApiError::Config(
                    "DATADIS_USERNAME (or DATADIS_CIF) environment variable not set".to_string(),
                )
            })?;
        let password = std::env::var("DATADIS_PASSWORD").map_err(|_| {
            error!("DATADIS_PASSWORD environment variable not set");
            ApiError::Config("DATADIS_PASSWORD environment variable not set".to_string())
        })?;

        Self::with_credentials(username, password)
    }

    /// Create API client from any configuration implementing ApiConfig trait
    pub fn from_config<C>(config: &C) -> std::result::Result<Self, C::Error>
    where
        C: ApiConfig,
        C::Error: From<ApiError>,
    {
        debug!("Creating DatadisClient from config");
        let mut builder = ClientConfig::from_credentials(config.get_credentials()?);

        if let Some(url) = config.get_base_url()? {
            debug!("Got custom base URL from config: {}", url);
            builder = builder.base_url(url);
        }
        if let Some(url) = config.get_api_base()? {
            debug!("Got custom API base from config: {}", url);
            builder = builder.api_base(url);
        }
        if let Some(timeout) = config.get_timeout()? {
            builder = builder.timeout(timeout);
        }
        if let Some(retries) = config.get_retries()? {
            builder = builder.retries(retries);
        }

        Ok(builder.build()?)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn username(&self) -> &str {
        self.auth.credentials().username()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        self.transport.retry_policy()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.auth.expires_at()
    }

    /// Log in now instead of on the first request
    pub async fn authenticate(&mut self) -> Result<()> {
        self.auth.authenticate(&self.transport).await
    }

    /// GET a data endpoint with the bearer token, re-authenticating once on 401
    pub async fn authenticated_get(
        &mut self,
        endpoint: Endpoint,
        query: Vec<(String, String)>,
    ) -> Result<Payload> {
        self.auth.ensure_authenticated(&self.transport).await?;

        match self.send_get(endpoint, &query).await {
            Err(e) if e.is_unauthorized() => {
                warn!(
                    "Token rejected on {}, re-authenticating and retrying once",
                    endpoint.path()
                );
                self.auth.invalidate();
                self.auth.authenticate(&self.transport).await?;

                match self.send_get(endpoint, &query).await {
                    Err(e) if e.is_unauthorized() => {
                        error!("Still unauthorized after re-authentication");
                        self.auth.invalidate();
                        Err(ApiError::Authentication(
                            "request rejected with 401 after re-authentication".to_string(),
                        ))
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Same as [`authenticated_get`](Self::authenticated_get), as JSON
    pub async fn get_json(
        &mut self,
        endpoint: Endpoint,
        query: Vec<(String, String)>,
    ) -> Result<Value> {
        match self.authenticated_get(endpoint, query).await? {
            Payload::Json(value) => Ok(value),
            Payload::Text(text) => {
                error!(
                    "{} returned a non-JSON body ({} bytes)",
                    endpoint.path(),
                    text.len()
                );
                Err(ApiError::InvalidResponse(format!(
                    "{} returned a non-JSON body",
                    endpoint.path()
                )))
            }
        }
    }

    async fn send_get(&self, endpoint: Endpoint, query: &[(String, String)]) -> Result<Payload> {
        let request = TransportRequest::get(join_url(&self.api_base, endpoint.path()))
            .queries(query.to_vec())
            .header("Authorization", self.auth.bearer()?);

        self.transport.request(&request).await
    }

    /// Version 1 endpoints returning raw records
    pub fn v1(&mut self) -> V1Raw<'_> {
        V1Raw::new(self)
    }

    /// Version 1 endpoints returning typed records
    pub fn v1_typed(&mut self) -> V1Typed<'_> {
        V1Typed::new(self)
    }

    /// Version 2 endpoints returning typed records and distributor errors
    pub fn v2(&mut self) -> V2Typed<'_> {
        V2Typed::new(self)
    }

    /// Release the client; the token is discarded
    pub fn close(self) {
        debug!("Closing DatadisClient for {}", self.username());
    }
}

impl Drop for DatadisClient {
    fn drop(&mut self) {
        self.auth.invalidate();
    }
}

fn parse_base(raw: &str, what: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ApiError::Config(format!("Invalid {} '{}': {}", what, raw, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::Config(format!(
            "Invalid {} '{}': unsupported scheme {}",
            what,
            raw,
            parsed.scheme()
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Query pair helper used by the resource views
pub(crate) fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}
