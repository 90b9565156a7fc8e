//! Per-category callbacks invoked while a response streams in.
//!
//! Implement [`EventHandler`] and override only the categories you care about,
//! or build a [`Callbacks`] table from closures. Every callback runs
//! synchronously on the consuming task; returning an error aborts the stream.

use std::collections::HashMap;

use crate::accumulator::{Accumulator, Applied};
use crate::errors::{CallbackError, StreamError};
use crate::event::{Classification, EventCategory};

/// Receives stream events as they are classified.
///
/// Every method defaults to a no-op.
pub trait EventHandler {
    /// Called with the decoded object after it has been stored.
    fn on_classification(&mut self, _classification: &Classification) -> Result<(), CallbackError> {
        Ok(())
    }

    fn on_reasoning(&mut self, _text: &str) -> Result<(), CallbackError> {
        Ok(())
    }

    fn on_hit(&mut self, _hit: &str) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Called after the chunk has been appended to the answer.
    fn on_answer(&mut self, _chunk: &str) -> Result<(), CallbackError> {
        Ok(())
    }

    fn on_followup_question(&mut self, _question: &str) -> Result<(), CallbackError> {
        Ok(())
    }

    fn on_done(&mut self, _payload: &str) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Called with the server's message before the stream fails.
    fn on_error(&mut self, _message: &str) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Diagnostic for a payload that could not be decoded. The stream
    /// continues.
    fn on_malformed(&mut self, _category: &EventCategory, _payload: &str, _error: &serde_json::Error) {}
}

/// Handler that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {}

type TextCallback = Box<dyn FnMut(&str) -> Result<(), CallbackError> + Send>;
type ClassificationCallback = Box<dyn FnMut(&Classification) -> Result<(), CallbackError> + Send>;
type MalformedCallback = Box<dyn FnMut(&EventCategory, &str, &serde_json::Error) + Send>;

/// Closure dispatch table keyed by event category.
///
/// Categories without a registered closure are no-ops.
#[derive(Default)]
pub struct Callbacks {
    text: HashMap<EventCategory, TextCallback>,
    classification: Option<ClassificationCallback>,
    malformed: Option<MalformedCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure for a text category (`reasoning`, `hit`, `answer`,
    /// `followup_question`, `done`, `error`).
    ///
    /// `classification` payloads are delivered decoded; use
    /// [`Callbacks::on_classification`] for them.
    pub fn on<F>(mut self, category: EventCategory, callback: F) -> Self
    where
        F: FnMut(&str) -> Result<(), CallbackError> + Send + 'static,
    {
        self.text.insert(category, Box::new(callback));
        self
    }

    pub fn on_classification<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Classification) -> Result<(), CallbackError> + Send + 'static,
    {
        self.classification = Some(Box::new(callback));
        self
    }

    pub fn on_malformed<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&EventCategory, &str, &serde_json::Error) + Send + 'static,
    {
        self.malformed = Some(Box::new(callback));
        self
    }

    fn call_text(&mut self, category: &EventCategory, payload: &str) -> Result<(), CallbackError> {
        match self.text.get_mut(category) {
            Some(callback) => callback(payload),
            None => Ok(()),
        }
    }
}

impl EventHandler for Callbacks {
    fn on_classification(&mut self, classification: &Classification) -> Result<(), CallbackError> {
        match self.classification.as_mut() {
            Some(callback) => callback(classification),
            None => Ok(()),
        }
    }

    fn on_reasoning(&mut self, text: &str) -> Result<(), CallbackError> {
        self.call_text(&EventCategory::Reasoning, text)
    }

    fn on_hit(&mut self, hit: &str) -> Result<(), CallbackError> {
        self.call_text(&EventCategory::Hit, hit)
    }

    fn on_answer(&mut self, chunk: &str) -> Result<(), CallbackError> {
        self.call_text(&EventCategory::Answer, chunk)
    }

    fn on_followup_question(&mut self, question: &str) -> Result<(), CallbackError> {
        self.call_text(&EventCategory::FollowupQuestion, question)
    }

    fn on_done(&mut self, payload: &str) -> Result<(), CallbackError> {
        self.call_text(&EventCategory::Done, payload)
    }

    fn on_error(&mut self, message: &str) -> Result<(), CallbackError> {
        self.call_text(&EventCategory::Error, message)
    }

    fn on_malformed(&mut self, category: &EventCategory, payload: &str, error: &serde_json::Error) {
        if let Some(callback) = self.malformed.as_mut() {
            callback(category, payload, error);
        }
    }
}

/// Invokes the handler for a payload the accumulator has already applied.
pub(crate) fn dispatch<H>(
    handler: &mut H,
    category: &EventCategory,
    payload: &str,
    applied: &Applied,
    session: &Accumulator,
) -> Result<(), StreamError>
where
    H: EventHandler + ?Sized,
{
    let outcome = match applied {
        Applied::Classified => match session.classification() {
            Some(classification) => handler.on_classification(classification),
            None => Ok(()),
        },
        Applied::Malformed(error) => {
            handler.on_malformed(category, payload, error);
            Ok(())
        }
        Applied::Text => match category {
            EventCategory::Reasoning => handler.on_reasoning(payload),
            EventCategory::Hit => handler.on_hit(payload),
            EventCategory::Answer => handler.on_answer(payload),
            EventCategory::FollowupQuestion => handler.on_followup_question(payload),
            _ => Ok(()),
        },
        Applied::Done => handler.on_done(payload),
        Applied::Failed(message) => handler.on_error(message),
        Applied::Ignored => Ok(()),
    };
    outcome.map_err(|source| StreamError::Callback {
        category: category.clone(),
        source,
    })
}
