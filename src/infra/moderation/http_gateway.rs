use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::moderation::{GatewayError, ModerationGateway, RawModerationResponse};

/// Header that binds a request to a server-side session.
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Upper bound on `/reset`. The session controller holds the history lock for the
/// whole call, so a hung reset would otherwise stall every reader.
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the moderation service. One attempt per call, no retries.
pub struct HttpModerationGateway {
    client: Client,
    base_url: String,
    reset_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    report: String,
}

impl HttpModerationGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("PromptGuardClient/0.1"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self::from_client(client, base_url))
    }

    fn from_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            reset_timeout: DEFAULT_RESET_TIMEOUT,
        }
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// JSON POST bound to the session through the header (the body carries it too).
    fn post_request<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        session_id: Option<&str>,
    ) -> RequestBuilder {
        let request = self.client.post(self.url(path)).json(body);
        match session_id {
            Some(session_id) => request.header(SESSION_HEADER, session_id),
            None => request,
        }
    }

    /// Send a request and hand back the response text of a 2xx answer.
    async fn send(&self, request: RequestBuilder) -> Result<String, GatewayError> {
        let resp = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }
}

/// Parse a `/chat` body. Anything that does not fit the response shape is malformed.
pub fn parse_check_body(body: &str) -> Result<RawModerationResponse, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::Malformed(e.to_string()))
}

pub fn parse_report_body(body: &str) -> Result<String, GatewayError> {
    serde_json::from_str::<ReportResponse>(body)
        .map(|r| r.report)
        .map_err(|e| GatewayError::Malformed(e.to_string()))
}

#[async_trait]
impl ModerationGateway for HttpModerationGateway {
    async fn check(
        &self,
        prompt: &str,
        session_id: Option<&str>,
    ) -> Result<RawModerationResponse, GatewayError> {
        let request = self.post_request("/chat", &ChatRequest { prompt, session_id }, session_id);
        let body = self.send(request).await?;
        parse_check_body(&body)
    }

    async fn report(&self, session_id: &str) -> Result<String, GatewayError> {
        let request = self.post_request("/report", &SessionRequest { session_id }, Some(session_id));
        let body = self.send(request).await?;
        parse_report_body(&body)
    }

    async fn reset(&self, session_id: &str) -> Result<(), GatewayError> {
        let request = self
            .post_request("/reset", &SessionRequest { session_id }, Some(session_id))
            .timeout(self.reset_timeout);
        self.send(request).await.map(|_| ())
    }

    async fn health(&self) -> Result<(), GatewayError> {
        let resp = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(GatewayError::Status {
                status: resp.status().as_u16(),
                body: String::new(),
            })
        }
    }
}
