use std::io::Write;

use askstream::{CallbackError, Classification, EventCategory, EventHandler};
use tracing::warn;

/// Writes streamed events to the terminal as they arrive.
///
/// Answer text goes to `out`; reasoning, hits, and diagnostics go to `diag`.
pub struct TerminalPrinter<O, D> {
    out: O,
    diag: D,
    show_reasoning: bool,
    show_hits: bool,
}

impl<O: Write, D: Write> TerminalPrinter<O, D> {
    pub fn new(out: O, diag: D) -> Self {
        Self {
            out,
            diag,
            show_reasoning: false,
            show_hits: false,
        }
    }

    pub fn show_reasoning(mut self, show: bool) -> Self {
        self.show_reasoning = show;
        self
    }

    pub fn show_hits(mut self, show: bool) -> Self {
        self.show_hits = show;
        self
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, D) {
        (self.out, self.diag)
    }
}

impl<O: Write, D: Write> EventHandler for TerminalPrinter<O, D> {
    fn on_classification(&mut self, classification: &Classification) -> Result<(), CallbackError> {
        writeln!(
            self.diag,
            "[route] {} ({:.2}) {}",
            classification.route, classification.confidence, classification.rewritten_query
        )?;
        Ok(())
    }

    fn on_reasoning(&mut self, text: &str) -> Result<(), CallbackError> {
        if self.show_reasoning {
            write!(self.diag, "{text}")?;
            self.diag.flush()?;
        }
        Ok(())
    }

    fn on_hit(&mut self, hit: &str) -> Result<(), CallbackError> {
        if self.show_hits {
            writeln!(self.diag, "[hit] {hit}")?;
        }
        Ok(())
    }

    fn on_answer(&mut self, chunk: &str) -> Result<(), CallbackError> {
        write!(self.out, "{chunk}")?;
        self.out.flush()?;
        Ok(())
    }

    fn on_done(&mut self, _payload: &str) -> Result<(), CallbackError> {
        writeln!(self.out)?;
        Ok(())
    }

    fn on_malformed(&mut self, category: &EventCategory, payload: &str, error: &serde_json::Error) {
        warn!(%category, payload, %error, "server sent an undecodable payload");
    }
}
