//! The consumption loop for one streamed response.
//!
//! `drive_stream` owns the read → demultiplex → accumulate → dispatch cycle
//! and turns every terminal condition into a single outcome. Session state
//! lives on the stack of one call, so independent streams can run on
//! separate tasks without sharing anything.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::accumulator::{Accumulator, Applied, AskResult};
use crate::demux::Demultiplexer;
use crate::errors::StreamError;
use crate::handler::{EventHandler, dispatch};
use crate::lines::LineReader;

/// Handle used to cancel an in-flight stream.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Requests cancellation.
    ///
    /// A stream waiting on the transport ends with `StreamError::Cancelled`.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller controls observed while waiting on the transport.
///
/// The deadline is measured from `started`, or from the first wait when the
/// control was never started, so one limit covers the request and its body.
#[derive(Clone, Default)]
pub struct StreamControl {
    abort: Option<watch::Receiver<bool>>,
    deadline: Option<Duration>,
    expires_at: Option<Instant>,
}

impl StreamControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the stream when `handle` is aborted.
    pub fn abort_signal(mut self, handle: &AbortHandle) -> Self {
        self.abort = Some(handle.subscribe());
        self
    }

    /// Fails the stream if it has not terminated within `deadline`.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self.expires_at = None;
        self
    }

    /// Fixes the deadline relative to now. A started control keeps its
    /// original expiry.
    pub fn started(mut self) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self.deadline.map(|limit| Instant::now() + limit);
        }
        self
    }

    /// Runs `fut` until it completes, the caller aborts, or the deadline
    /// passes.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, StreamError> {
        let mut abort = self.abort.clone();
        let expires_at = self
            .expires_at
            .or_else(|| self.deadline.map(|limit| Instant::now() + limit));
        tokio::select! {
            biased;
            () = aborted(&mut abort) => {
                debug!("stream cancelled by caller");
                Err(StreamError::Cancelled)
            }
            () = expired(expires_at) => {
                let limit = self.deadline.unwrap_or_default();
                debug!(?limit, "stream deadline exceeded");
                Err(StreamError::DeadlineExceeded(limit))
            }
            output = fut => Ok(output),
        }
    }
}

/// Consumes one streamed response body and returns the final result.
///
/// The byte source is dropped on every exit path, which releases the
/// underlying connection. Nothing is retried here.
pub async fn drive_stream<S, E, H>(
    source: S,
    handler: &mut H,
    control: &StreamControl,
) -> Result<AskResult, StreamError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
    H: EventHandler + ?Sized,
{
    let control = control.clone().started();
    let mut reader = LineReader::new(source);
    let mut demux = Demultiplexer::default();
    let mut session = Accumulator::new();

    loop {
        let line = match control.guard(reader.next_line()).await? {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                warn!(error = %err, "stream transport failed");
                return Err(err);
            }
            None => {
                debug!(answer_len = session.answer().len(), "stream ended without done event");
                return Ok(session.finish(false));
            }
        };

        let Some(payload) = demux.feed(&line) else {
            continue;
        };
        let Some(category) = payload.category else {
            warn!(bytes = payload.data.len(), "dropping data line received before any event line");
            continue;
        };
        trace!(%category, bytes = payload.data.len(), "stream payload");

        let applied = session.apply(Some(&category), &payload.data);
        if let Applied::Malformed(err) = &applied {
            warn!(%category, error = %err, "dropping undecodable payload");
        }
        dispatch(handler, &category, &payload.data, &applied, &session).inspect_err(|err| {
            warn!(error = %err, "stream handler failed");
        })?;

        match applied {
            Applied::Done => {
                debug!(answer_len = session.answer().len(), "stream done");
                return Ok(session.finish(true));
            }
            Applied::Failed(message) => {
                debug!(%message, "stream error event");
                return Err(StreamError::Remote { message });
            }
            _ => {}
        }
    }
}

async fn aborted(abort: &mut Option<watch::Receiver<bool>>) {
    if let Some(rx) = abort {
        // A dropped sender can no longer abort.
        if rx.wait_for(|aborted| *aborted).await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}

async fn expired(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
