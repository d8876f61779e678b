use crate::endpoints::{join_url, LOGIN_PATH};
use crate::errors::{ApiError, Result};
use crate::transport::{HttpTransport, Payload, TransportRequest};
use chrono::{DateTime, Duration, Utc};
use datadis_utils::mask_secret;
use log::{debug, error, info};
use std::fmt;

/// Tokens are treated as valid for one hour after login
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the assumed expiry
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;

/// Datadis login credentials (NIF/CIF and password)
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum TokenState {
    Unauthenticated,
    Authenticated {
        token: String,
        expires_at: DateTime<Utc>,
    },
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenState::Unauthenticated => f.write_str("Unauthenticated"),
            TokenState::Authenticated { token, expires_at } => f
                .debug_struct("Authenticated")
                .field("token", &mask_secret(token))
                .field("expires_at", expires_at)
                .finish(),
        }
    }
}

/// Owns the token lifecycle of one client
#[derive(Debug)]
pub struct Authenticator {
    credentials: Credentials,
    base_url: String,
    state: TokenState,
    token_lifetime: Duration,
    refresh_margin: Duration,
}

impl Authenticator {
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Self {
        Self {
            credentials,
            base_url: base_url.into(),
            state: TokenState::Unauthenticated,
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            refresh_margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
        }
    }

    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn state(&self) -> &TokenState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, TokenState::Authenticated { .. })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            TokenState::Authenticated { expires_at, .. } => Some(*expires_at),
            TokenState::Unauthenticated => None,
        }
    }

    /// Whether a token is held and not within the refresh margin of expiry
    pub fn has_fresh_token(&self) -> bool {
        match &self.state {
            TokenState::Authenticated { expires_at, .. } => expires_at
                .checked_sub_signed(self.refresh_margin)
                .map_or(false, |refresh_at| refresh_at > Utc::now()),
            TokenState::Unauthenticated => false,
        }
    }

    /// Log in and store a new token
    pub async fn authenticate(&mut self, transport: &HttpTransport) -> Result<()> {
        let url = join_url(&self.base_url, LOGIN_PATH);
        debug!(
            "Authenticating as {} against {}",
            self.credentials.username, url
        );

        // Never keep a stale token around while a login is in flight
        self.state = TokenState::Unauthenticated;

        let request = TransportRequest::post(url)
            .form(vec![
                ("username".to_string(), self.credentials.username.clone()),
                ("password".to_string(), self.credentials.password.clone()),
            ])
            .expect_text();

        let token = match transport.request(&request).await {
            Ok(Payload::Text(text)) => text,
            Ok(Payload::Json(value)) => match value.as_str() {
                Some(text) => text.trim().to_string(),
                None => {
                    error!("Login endpoint returned JSON instead of a token");
                    return Err(ApiError::Authentication(
                        "unexpected response from login endpoint".to_string(),
                    ));
                }
            },
            Err(ApiError::Http(e)) => {
                error!("Login rejected: {}", e);
                return Err(ApiError::Authentication(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        if token.is_empty() {
            error!("Login endpoint returned an empty token");
            return Err(ApiError::Authentication(
                "empty token received from login endpoint".to_string(),
            ));
        }

        let expires_at = Utc::now()
            .checked_add_signed(self.token_lifetime)
            .ok_or_else(|| {
                error!("Token lifetime {} is out of range", self.token_lifetime);
                ApiError::Config(format!(
                    "token lifetime {} is out of range",
                    self.token_lifetime
                ))
            })?;
        info!(
            "Authenticated as {} (token {}, valid until {})",
            self.credentials.username,
            mask_secret(&token),
            expires_at
        );

        self.state = TokenState::Authenticated { token, expires_at };
        Ok(())
    }

    /// Authenticate unless a fresh token is already held
    pub async fn ensure_authenticated(&mut self, transport: &HttpTransport) -> Result<()> {
        if self.has_fresh_token() {
            return Ok(());
        }

        if self.is_authenticated() {
            debug!("Token close to expiry, refreshing");
        }
        self.authenticate(transport).await
    }

    /// Drop the current token
    pub fn invalidate(&mut self) {
        if self.is_authenticated() {
            debug!("Invalidating token for {}", self.credentials.username);
        }
        self.state = TokenState::Unauthenticated;
    }

    /// `Authorization` header value for the current token
    pub fn bearer(&self) -> Result<String> {
        match &self.state {
            TokenState::Authenticated { token, .. } => Ok(format!("Bearer {}", token)),
            TokenState::Unauthenticated => Err(ApiError::Authentication(
                "no token available, authenticate first".to_string(),
            )),
        }
    }
}
