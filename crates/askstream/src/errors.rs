use std::time::Duration;

use crate::event::EventCategory;

/// Error type returned by caller-registered event handlers.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal state reached by one stream consumption loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalState {
    /// `done` seen, or clean end of stream.
    Done,
    /// The server sent an `error` event.
    Errored,
    /// Reading from the transport failed, was cancelled, or hit its deadline.
    TransportFailed,
    /// A caller handler returned an error.
    CallbackFailed,
}

/// Failure of a single streamed response. No partial result accompanies any
/// of these.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Reading the response body failed before a terminal event.
    #[error("stream read failed: {message}")]
    Transport { message: String },
    /// The caller aborted the stream.
    #[error("stream cancelled")]
    Cancelled,
    /// The caller deadline elapsed while waiting for data.
    #[error("stream deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    /// The server sent an `error` event.
    #[error("remote error: {message}")]
    Remote { message: String },
    /// A handler failed; `category` names the event whose handler failed.
    #[error("{category} handler failed: {source}")]
    Callback {
        category: EventCategory,
        #[source]
        source: CallbackError,
    },
}

impl StreamError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Maps this error to the terminal state that produced it.
    pub fn terminal_state(&self) -> TerminalState {
        match self {
            Self::Transport { .. } | Self::Cancelled | Self::DeadlineExceeded(_) => {
                TerminalState::TransportFailed
            }
            Self::Remote { .. } => TerminalState::Errored,
            Self::Callback { .. } => TerminalState::CallbackFailed,
        }
    }
}

/// Top-level error type for the public client API.
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid request built by the caller.
    #[error("validation error: {0}")]
    Validation(String),
    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    /// A non-streamed response body was not a valid result document.
    #[error("decode error: {0}")]
    Decode(String),
    /// The streamed response ended in failure.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl AskError {
    /// Returns the stream terminal state when this error came from the
    /// streaming core.
    pub fn terminal_state(&self) -> Option<TerminalState> {
        match self {
            Self::Stream(err) => Some(err.terminal_state()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_groups_read_failures() {
        assert_eq!(
            StreamError::transport("reset").terminal_state(),
            TerminalState::TransportFailed
        );
        assert_eq!(
            StreamError::Cancelled.terminal_state(),
            TerminalState::TransportFailed
        );
        assert_eq!(
            StreamError::DeadlineExceeded(Duration::from_secs(1)).terminal_state(),
            TerminalState::TransportFailed
        );
    }

    #[test]
    fn callback_error_names_category() {
        let err = StreamError::Callback {
            category: EventCategory::Hit,
            source: "sink closed".into(),
        };
        assert_eq!(err.to_string(), "hit handler failed: sink closed");
        assert_eq!(err.terminal_state(), TerminalState::CallbackFailed);
    }

    #[test]
    fn ask_error_exposes_stream_state() {
        let err = AskError::from(StreamError::Remote {
            message: "boom".into(),
        });
        assert_eq!(err.terminal_state(), Some(TerminalState::Errored));
        assert!(err.to_string().contains("boom"));
        assert_eq!(AskError::Validation("x".into()).terminal_state(), None);
    }
}
