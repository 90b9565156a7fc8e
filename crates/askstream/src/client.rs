use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::accumulator::AskResult;
use crate::config::ClientConfig;
use crate::driver::{AbortHandle, StreamControl, drive_stream};
use crate::errors::AskError;
use crate::handler::{EventHandler, NoopHandler};
use crate::request::{AskRequest, HistoryMessage};
use crate::transport::{AskResponse, AskTransport, HttpTransport};

/// Entry point for asking questions.
#[derive(Clone)]
pub struct AskClient {
    transport: Arc<dyn AskTransport>,
}

impl AskClient {
    /// Creates an HTTP client from explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, AskError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    /// Creates an HTTP client from `ASKSTREAM_*` environment variables.
    pub fn from_env() -> Result<Self, AskError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(transport: Arc<dyn AskTransport>) -> Self {
        Self { transport }
    }

    /// Starts building an ask for `question`. Streaming is on by default.
    pub fn ask(&self, question: impl Into<String>) -> AskBuilder {
        AskBuilder {
            transport: self.transport.clone(),
            request: AskRequest::new(question),
            control: StreamControl::new(),
        }
    }
}

/// Builder for configuring and sending a single ask.
pub struct AskBuilder {
    transport: Arc<dyn AskTransport>,
    request: AskRequest,
    control: StreamControl,
}

impl AskBuilder {
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.request.index = Some(index.into());
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.request.top_k = Some(top_k);
        self
    }

    pub fn filter(mut self, filter: serde_json::Value) -> Self {
        self.request.filter = Some(filter);
        self
    }

    /// Appends a prior conversation turn.
    pub fn history(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.request.history.push(HistoryMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Selects the event-stream response (`true`) or a single JSON document.
    pub fn stream(mut self, stream: bool) -> Self {
        self.request.stream = stream;
        self
    }

    /// Fails the ask if it has not finished within `deadline`, counted from
    /// `send`.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.control = self.control.deadline(deadline);
        self
    }

    /// Cancels the ask when `handle` is aborted.
    pub fn abort_signal(mut self, handle: &AbortHandle) -> Self {
        self.control = self.control.abort_signal(handle);
        self
    }

    /// Request body that `send` will post.
    pub fn request(&self) -> &AskRequest {
        &self.request
    }

    /// Sends the ask and returns the final result.
    ///
    /// For streamed responses `handler` sees every event as it arrives. A
    /// non-streamed response is returned as decoded, without callbacks.
    pub async fn send<H>(self, handler: &mut H) -> Result<AskResult, AskError>
    where
        H: EventHandler + Send + ?Sized,
    {
        self.validate()?;
        let Self {
            transport,
            request,
            control,
        } = self;
        let control = control.started();
        let request_id = uuid::Uuid::new_v4();
        debug!(%request_id, stream = request.stream, index = ?request.index, "starting ask");

        // Headers may stall as long as the body, so the same controls apply.
        match control.guard(transport.send(request_id, &request)).await?? {
            AskResponse::Stream(body) => {
                let result = drive_stream(body, handler, &control).await?;
                debug!(%request_id, completed = result.completed, "ask stream finished");
                Ok(result)
            }
            AskResponse::Document(result) => Ok(result),
        }
    }

    /// Sends the ask without observing individual events.
    pub async fn collect(self) -> Result<AskResult, AskError> {
        self.send(&mut NoopHandler).await
    }

    fn validate(&self) -> Result<(), AskError> {
        if self.request.question.trim().is_empty() {
            return Err(AskError::Validation("question must not be empty".into()));
        }
        if self.request.top_k == Some(0) {
            return Err(AskError::Validation("top_k must be greater than 0".into()));
        }
        if self.request.history.iter().any(|m| m.role.trim().is_empty()) {
            return Err(AskError::Validation("history role must not be empty".into()));
        }
        Ok(())
    }
}
