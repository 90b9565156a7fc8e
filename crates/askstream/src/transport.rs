use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, TryStreamExt as _};
use reqwest::header::{ACCEPT, HeaderValue};
use tracing::debug;

use crate::accumulator::AskResult;
use crate::config::ClientConfig;
use crate::errors::AskError;
use crate::request::AskRequest;

const EVENT_STREAM: &str = "text/event-stream";
const JSON: &str = "application/json";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Error yielded by a response body stream.
pub type BodyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Response body as raw byte windows.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BodyError>> + Send + 'static>>;

/// A successful (2xx) response, before the body is consumed.
pub enum AskResponse {
    /// Event-stream body for the streaming core.
    Stream(ByteStream),
    /// Decoded non-streamed result document.
    Document(AskResult),
}

/// Opens ask requests against a remote service.
///
/// Implementations resolve request-level failures (connection errors,
/// non-success statuses) before returning.
#[async_trait::async_trait]
pub trait AskTransport: Send + Sync {
    async fn send(
        &self,
        request_id: uuid::Uuid,
        request: &AskRequest,
    ) -> Result<AskResponse, AskError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, AskError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AskError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl AskTransport for HttpTransport {
    async fn send(
        &self,
        request_id: uuid::Uuid,
        request: &AskRequest,
    ) -> Result<AskResponse, AskError> {
        let url = self.config.ask_url();
        debug!(%request_id, %url, stream = request.stream, "sending ask request");

        let accept = if request.stream { EVENT_STREAM } else { JSON };
        let mut http_req = self
            .client
            .post(&url)
            .header(ACCEPT, HeaderValue::from_static(accept))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(request);
        if let Some(key) = self.config.api_key.as_deref() {
            http_req = http_req.bearer_auth(key);
        }
        if !request.stream {
            http_req = http_req.timeout(self.config.timeout);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| AskError::Transport(format!("ask request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AskError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if request.stream {
            let body = response.bytes_stream().map_err(|e| Box::new(e) as BodyError);
            return Ok(AskResponse::Stream(Box::pin(body)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AskError::Transport(format!("reading ask response failed: {e}")))?;
        let result = serde_json::from_slice(&bytes)
            .map_err(|e| AskError::Decode(format!("invalid ask response: {e}")))?;
        Ok(AskResponse::Document(result))
    }
}
