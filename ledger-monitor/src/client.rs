use std::time::Duration;

use indexmap::IndexMap;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{credential::CredentialToken, error::FetchError};

/// Header carrying the anti-forgery token on state-changing requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Result of a state-changing admin request.
///
/// `success: false` is a business outcome reported by the server, not a transport failure.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: Option<String>,
    /// Every other top-level field of the response, in server order.
    pub fields: IndexMap<String, Value>,
}

impl ActionOutcome {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let success = map.get("success").and_then(Value::as_bool).unwrap_or(false);
        let text = |key: &'static str| {
            map.get(key)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(|text| (text.to_string(), key))
        };
        let message = text("message").or_else(|| text("error"));
        let consumed = message.as_ref().map(|(_, key)| *key);

        let fields = map
            .into_iter()
            .filter(|(key, _)| {
                key != "success" && key != "message" && Some(key.as_str()) != consumed
            })
            .collect();
        let message = message.map(|(message, _)| message);

        Self {
            success,
            message,
            fields,
        }
    }

    /// Identifier of the newly promoted primary after a failover.
    pub fn new_primary(&self) -> Option<&str> {
        self.fields.get("new_primary").and_then(Value::as_str)
    }

    /// Server timestamp attached to a backup request.
    pub fn timestamp(&self) -> Option<&str> {
        self.fields.get("timestamp").and_then(Value::as_str)
    }

    /// Server message, or a generic one when the server gave none.
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("Unknown error")
    }
}

/// Thin request/response client for the server API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    bearer: Option<CredentialToken>,
    csrf_token: Option<String>,
    timeout: Option<Duration>,
}

impl ApiClient {
    /// Construct a client rooted at `base_url`. Endpoint paths resolve beneath its path.
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            http: Client::new(),
            base_url,
            bearer: None,
            csrf_token: None,
            timeout: None,
        }
    }

    pub fn with_bearer(mut self, token: Option<CredentialToken>) -> Self {
        self.bearer = token;
        self
    }

    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path such as `/api/status` against the base url.
    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(FetchError::from)
    }

    /// `GET` a JSON document.
    pub async fn get_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        self.execute(self.http.get(url)).await
    }

    /// `POST` an admin action, with the CSRF header and an optional JSON body.
    pub async fn post_action(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<ActionOutcome, FetchError> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");

        let mut request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        let request = match body {
            Some(body) => request.json(&body),
            None => request.body("{}"),
        };

        self.execute(request).await.map(ActionOutcome::from_value)
    }

    async fn execute(&self, mut request: RequestBuilder) -> Result<Value, FetchError> {
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token.as_str());
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        decode_body(status, &body)
    }
}

/// Turn a raw HTTP status and body into a JSON document or a [`FetchError`].
pub fn decode_body(status: u16, body: &str) -> Result<Value, FetchError> {
    if !(200..300).contains(&status) {
        debug!(status, "non-success status");
        return Err(FetchError::Http { status });
    }

    serde_json::from_str(body).map_err(|error| {
        debug!(%error, raw = body, "response body is not json");
        FetchError::Decode {
            reason: error.to_string(),
            raw: body.to_string(),
        }
    })
}
