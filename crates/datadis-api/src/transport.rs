use crate::endpoints::USER_AGENT;
use crate::errors::{ApiError, HttpError, Result};
use datadis_core::normalize_value;
use datadis_utils::{mask_secret, RetryPolicy};
use log::{debug, error, trace, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Request body encodings
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// How a successful response body should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedBody {
    Json,
    Text,
}

/// Parsed body of a successful response
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

/// Everything needed to (re)send one request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Body>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub expect: ExpectedBody,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            query: Vec::new(),
            headers: Vec::new(),
            expect: ExpectedBody::Json,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn queries(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(Body::Form(pairs));
        self
    }

    /// Read the success body as plain text (e.g. the login endpoint)
    pub fn expect_text(mut self) -> Self {
        self.expect = ExpectedBody::Text;
        self
    }
}

/// HTTP transport with default headers, bounded retries and status mapping
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    retry: RetryPolicy,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            "Created HTTP transport (timeout: {:?}, retries: {})",
            timeout, retry.retries
        );

        Ok(Self {
            client,
            retry,
            timeout,
        })
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request, retrying timeouts, connection failures and 429s
    pub async fn request(&self, request: &TransportRequest) -> Result<Payload> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            debug!(
                "HTTP {} {} (attempt {}/{})",
                request.method,
                request.url,
                attempt + 1,
                max_attempts
            );
            log_headers(request);

            match self.send_once(request).await {
                Ok((status, _)) if status == StatusCode::TOO_MANY_REQUESTS => {
                    if self.retry.should_retry(attempt) {
                        warn!(
                            "Rate limited by {} (attempt {}/{}), backing off",
                            request.url,
                            attempt + 1,
                            max_attempts
                        );
                        self.retry.wait(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    error!("Rate limited (429) after {} attempts", attempt + 1);
                    return Err(HttpError::RateLimited {
                        attempts: attempt + 1,
                    }
                    .into());
                }
                Ok((status, text)) => {
                    debug!("Response status: {}", status);
                    return handle_response(status, text, request.expect);
                }
                Err(e) => {
                    if is_transient(&e) && self.retry.should_retry(attempt) {
                        warn!(
                            "Request to {} failed (attempt {}/{}): {}",
                            request.url,
                            attempt + 1,
                            max_attempts,
                            e
                        );
                        self.retry.wait(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    error!(
                        "Request to {} failed after {} attempts: {}",
                        request.url,
                        attempt + 1,
                        e
                    );
                    return Err(ApiError::Transport {
                        attempts: attempt + 1,
                        source: e,
                    });
                }
            }
        }
    }

    /// One round trip, including reading the body
    async fn send_once(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<(StatusCode, String), reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder = match &request.body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Form(pairs)) => builder.form(pairs),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn log_headers(request: &TransportRequest) {
    for (key, value) in &request.headers {
        if key.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
            let token = value.strip_prefix("Bearer ").unwrap_or(value);
            trace!("  {}: Bearer {}", key, mask_secret(token));
        } else {
            trace!("  {}: {}", key, value);
        }
    }
}

/// Map an HTTP status and body to a payload or an error
fn handle_response(status: StatusCode, text: String, expect: ExpectedBody) -> Result<Payload> {
    if status.is_success() {
        return Ok(match expect {
            ExpectedBody::Text => Payload::Text(text.trim().to_string()),
            ExpectedBody::Json => match serde_json::from_str::<Value>(&text) {
                Ok(value) => Payload::Json(normalize_value(value)),
                Err(e) => {
                    debug!("Response body is not JSON ({}), returning raw text", e);
                    Payload::Text(text)
                }
            },
        });
    }

    if status == StatusCode::UNAUTHORIZED {
        error!("Authentication failed (401 Unauthorized)");
        return Err(HttpError::Unauthorized.into());
    }

    let message = extract_error_message(&text, status);
    error!("HTTP error {}: {}", status.as_u16(), message);
    Err(HttpError::Status {
        status: status.as_u16(),
        message,
    }
    .into())
}

/// Best-effort message: JSON `message`, then `error`, then the raw text
fn extract_error_message(text: &str, status: StatusCode) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        for key in ["message", "error"] {
            match map.get(key) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Null) | None => {}
                Some(Value::String(_)) => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        format!("HTTP error {}", status.as_u16())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(retries: u32) -> HttpTransport {
        HttpTransport::new(
            Duration::from_millis(200),
            RetryPolicy::new(retries, Duration::from_millis(1), Duration::from_millis(5)),
        )
        .unwrap()
    }

    #[test]
    fn test_error_message_extraction() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            extract_error_message(r#"{"error": "Bad Request", "message": "Parametros invalidos"}"#, status),
            "Parametros invalidos"
        );
        assert_eq!(
            extract_error_message(r#"{"error": "Forbidden"}"#, status),
            "Forbidden"
        );
        assert_eq!(extract_error_message("gateway down", status), "gateway down");
        assert_eq!(extract_error_message("", status), "HTTP error 400");
    }

    #[tokio::test]
    async fn test_json_success_is_normalized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get-supplies"))
            .and(query_param("distributorCode", "2"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"province": "MÁLAGA"}])))
            .expect(1)
            .mount(&server)
            .await;

        let request = TransportRequest::get(format!("{}/get-supplies", server.uri()))
            .query("distributorCode", "2");
        let payload = transport(0).request(&request).await.unwrap();

        assert_eq!(payload, Payload::Json(json!([{"province": "MALAGA"}])));
    }

    #[tokio::test]
    async fn test_text_endpoint_and_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("username=user"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  token-value\n"))
            .expect(1)
            .mount(&server)
            .await;

        let request = TransportRequest::post(format!("{}/login", server.uri()))
            .form(vec![
                ("username".to_string(), "user".to_string()),
                ("password".to_string(), "secret".to_string()),
            ])
            .expect_text();
        let payload = transport(0).request(&request).await.unwrap();

        assert_eq!(payload, Payload::Text("token-value".to_string()));
    }

    #[tokio::test]
    async fn test_non_json_success_falls_back_to_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let payload = transport(0)
            .request(&TransportRequest::get(server.uri()))
            .await
            .unwrap();
        assert_eq!(payload, Payload::Text("not json".to_string()));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/unauthorized"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/server-error"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": "Internal Server Error", "message": "Error del servidor"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(3);

        let err = transport
            .request(&TransportRequest::get(format!("{}/unauthorized", server.uri())))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());

        let err = transport
            .request(&TransportRequest::get(format!("{}/server-error", server.uri())))
            .await
            .unwrap_err();
        match err {
            ApiError::Http(HttpError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Error del servidor");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_retried_then_succeeds() {
        let server = MockServer::start().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                if calls_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                    ResponseTemplate::new(429)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!([]))
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let payload = transport(3)
            .request(&TransportRequest::get(server.uri()))
            .await
            .unwrap();
        assert_eq!(payload, Payload::Json(json!([])));
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let err = transport(2)
            .request(&TransportRequest::get(server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Http(HttpError::RateLimited { attempts: 3 })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_exhausts_retries() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport(2)
            .request(&TransportRequest::get(format!("http://{}/get-supplies", addr)))
            .await
            .unwrap_err();

        match err {
            ApiError::Transport { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(source.is_connect());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .expect(3)
            .mount(&server)
            .await;

        let err = transport(2)
            .request(&TransportRequest::get(server.uri()))
            .await
            .unwrap_err();

        match err {
            ApiError::Transport { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(source.is_timeout());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
