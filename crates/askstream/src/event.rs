use std::fmt;

/// Category declared by an `event:` line.
///
/// Categories the client does not know are kept as `Unknown` so newer
/// servers can add event kinds without breaking older clients.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Query routing decision (JSON payload).
    Classification,
    /// Model reasoning tokens; forwarded to handlers only.
    Reasoning,
    /// Retrieved document/hit; forwarded to handlers only.
    Hit,
    /// Answer text chunk.
    Answer,
    /// One suggested follow-up question.
    FollowupQuestion,
    /// Terminal success marker.
    Done,
    /// Terminal failure; payload is the diagnostic message.
    Error,
    /// Any category this client does not recognize.
    Unknown(String),
}

impl EventCategory {
    /// Parses a wire category name. Never fails; unrecognized names map to
    /// `Unknown`.
    pub fn parse(name: &str) -> Self {
        match name {
            "classification" => Self::Classification,
            "reasoning" => Self::Reasoning,
            "hit" => Self::Hit,
            "answer" => Self::Answer,
            "followup_question" => Self::FollowupQuestion,
            "done" => Self::Done,
            "error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the wire name of this category.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Classification => "classification",
            Self::Reasoning => "reasoning",
            Self::Hit => "hit",
            Self::Answer => "answer",
            Self::FollowupQuestion => "followup_question",
            Self::Done => "done",
            Self::Error => "error",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded `classification` payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Classification {
    /// Route chosen by the server (for example `retrieval` or `chitchat`).
    pub route: String,
    /// Query as rewritten by the server before retrieval.
    #[serde(default)]
    pub rewritten_query: String,
    /// Confidence of the routing decision.
    #[serde(default)]
    pub confidence: f64,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Classification {
    /// Decodes a `classification` payload.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
