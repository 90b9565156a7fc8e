use crate::event::{Classification, EventCategory};

/// Final structured result of one ask.
///
/// Also the shape of the non-streamed JSON response body.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AskResult {
    /// Concatenation of every `answer` payload in arrival order.
    #[serde(default)]
    pub answer: String,
    /// Last successfully decoded `classification` payload.
    #[serde(default)]
    pub classification: Option<Classification>,
    /// `followup_question` payloads in arrival order.
    #[serde(default)]
    pub followup_questions: Vec<String>,
    /// Whether the server signalled completion.
    ///
    /// `false` when a stream ended without a `done` event.
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

/// Outcome of applying one payload to the session.
#[derive(Debug)]
pub enum Applied {
    /// A new classification was stored.
    Classified,
    /// The classification payload did not decode; nothing was stored.
    Malformed(serde_json::Error),
    /// Stored text (`answer`, `followup_question`) or forward-only text
    /// (`reasoning`, `hit`).
    Text,
    /// `done` seen.
    Done,
    /// `error` seen with its message.
    Failed(String),
    /// Untagged or unknown category.
    Ignored,
}

/// Call-scoped session state that folds payloads into an `AskResult`.
#[derive(Debug, Default)]
pub struct Accumulator {
    result: AskResult,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one payload according to its category.
    pub fn apply(&mut self, category: Option<&EventCategory>, payload: &str) -> Applied {
        let Some(category) = category else {
            return Applied::Ignored;
        };
        match category {
            EventCategory::Classification => match Classification::from_payload(payload) {
                Ok(classification) => {
                    self.result.classification = Some(classification);
                    Applied::Classified
                }
                Err(err) => Applied::Malformed(err),
            },
            EventCategory::Reasoning | EventCategory::Hit => Applied::Text,
            EventCategory::Answer => {
                self.result.answer.push_str(payload);
                Applied::Text
            }
            EventCategory::FollowupQuestion => {
                self.result.followup_questions.push(payload.to_string());
                Applied::Text
            }
            EventCategory::Done => Applied::Done,
            EventCategory::Error => Applied::Failed(payload.to_string()),
            EventCategory::Unknown(_) => Applied::Ignored,
        }
    }

    /// Most recently stored classification.
    pub fn classification(&self) -> Option<&Classification> {
        self.result.classification.as_ref()
    }

    /// Answer text accumulated so far.
    pub fn answer(&self) -> &str {
        &self.result.answer
    }

    /// Freezes the session into its result.
    pub fn finish(mut self, completed: bool) -> AskResult {
        self.result.completed = completed;
        self.result
    }
}
