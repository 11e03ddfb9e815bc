use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

/// Fallback shown when the API reports a failure without a detail.
pub const GENERIC_FAILURE_DETAIL: &str = "The provisioning API reported an error.";

/// Any way a provisioning-API call can fail. All variants render as a
/// human-readable detail suitable for a flash message.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The API answered, but with a non-"OKAY" envelope code.
    #[error("{detail}")]
    Api { code: String, detail: String },
    #[error("provisioning API unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provisioning API returned a malformed response")]
    Malformed,
}

impl UpstreamError {
    /// Message for the operator. No internals beyond what the API said.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

/// Handle on the provisioning API: one shared HTTP client with a bounded
/// timeout, the token header, and envelope normalization. Calls are
/// never retried; a failed call surfaces immediately.
#[derive(Clone)]
pub struct Upstream {
    client: reqwest::Client,
    base_url: String,
    token: String,
    customer_id: Option<String>,
}

impl Upstream {
    pub fn new(
        base_url: &str,
        token: &str,
        timeout: Duration,
        customer_id: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Upstream {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            customer_id,
        }
    }

    /// customerId configured for ssh-key scoping, if any.
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<Value, UpstreamError> {
        self.request(Method::GET, endpoint, params, None).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> Result<Value, UpstreamError> {
        self.request(Method::POST, endpoint, &[], Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, UpstreamError> {
        self.request(Method::DELETE, endpoint, &[], None).await
    }

    /// Issue one call and unwrap the `{code, data, detail}` envelope.
    /// Returns the `data` member on `code == "OKAY"`.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%method, %endpoint, "provisioning API call");

        let mut req = self.client.request(method.clone(), &url);
        if !self.token.is_empty() {
            req = req.header("API-Token", &self.token);
        }
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(ref b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let payload: Value = resp.json().await.map_err(|_| UpstreamError::Malformed)?;
        let result = unwrap_envelope(payload);
        if let Err(ref err) = result {
            tracing::warn!(%method, %endpoint, %status, error = %err, "provisioning API call failed");
        }
        result
    }
}

fn unwrap_envelope(payload: Value) -> Result<Value, UpstreamError> {
    let code = payload
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if code == "OKAY" {
        return Ok(payload.get("data").cloned().unwrap_or(Value::Null));
    }
    if code.is_empty() {
        return Err(UpstreamError::Malformed);
    }
    let detail = payload
        .get("detail")
        .or_else(|| payload.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_FAILURE_DETAIL.to_string());
    Err(UpstreamError::Api { code, detail })
}
