// HTTP transmission of outgoing records

use async_trait::async_trait;
use base64::Engine;
use tracing::instrument;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::version;

/// A fully addressed, authenticated POST ready to hand to a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl PublishRequest {
    /// JSON POST to `url` with Basic credentials taken from `config`.
    pub fn json(url: &str, config: &Config, body: String) -> Self {
        Self {
            url: url.to_string(),
            headers: vec![
                ("Content-Type", "application/json".to_string()),
                (
                    "Authorization",
                    basic_auth(&config.username, &config.password),
                ),
                ("User-Agent", version::user_agent()),
            ],
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// `Authorization` header value for HTTP Basic authentication.
pub fn basic_auth(username: &str, password: &str) -> String {
    let token =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", token)
}

/// Sends one request and returns the response body on a 2xx status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &PublishRequest) -> Result<String>;
}

/// [`Transport`] over a shared `reqwest` client. No timeout beyond the client default.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn post(&self, request: &PublishRequest) -> Result<String> {
        let mut req = self.client.post(&request.url).body(request.body.clone());
        for (k, v) in &request.headers {
            req = req.header(*k, v);
        }

        let resp = req.send().await.map_err(|e| Error::Transport {
            url: request.url.clone(),
            status: None,
            body: None,
            message: e.to_string(),
        })?;

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read response body");
                None
            }
        };

        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "record accepted");
            return Ok(body.unwrap_or_default());
        }

        tracing::warn!(status = status.as_u16(), "remote rejected record");
        Err(Error::Transport {
            url: request.url.clone(),
            status: Some(status.as_u16()),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            body,
        })
    }
}
