use crate::event::EventCategory;

const EVENT_PREFIX: &str = "event: ";
const DATA_PREFIX: &str = "data: ";

/// A `data:` payload tagged with the category active when it arrived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    /// `None` when no `event:` line preceded the payload in this stream.
    pub category: Option<EventCategory>,
    pub data: String,
}

/// Tracks the current event category across lines.
///
/// The category persists until the next `event:` line; blank separator lines
/// do not reset it.
#[derive(Default, Debug)]
pub struct Demultiplexer {
    current: Option<EventCategory>,
}

impl Demultiplexer {
    /// Classifies one line. Only `data:` lines produce a payload.
    pub fn feed(&mut self, line: &str) -> Option<Payload> {
        if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
            self.current = Some(EventCategory::parse(name.trim()));
            return None;
        }
        line.strip_prefix(DATA_PREFIX).map(|data| Payload {
            category: self.current.clone(),
            data: data.to_string(),
        })
    }
}
