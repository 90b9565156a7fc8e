//! Streaming client for ask/answer generation services.
//!
//! The service answers a question with an event stream
//! (`event: <category>` / `data: <payload>` lines). This crate reassembles
//! lines across read boundaries, demultiplexes payloads by category, folds
//! them into an [`AskResult`], and calls per-category handlers as data
//! arrives.
//!
//! # Usage
//!
//! ```no_run
//! use askstream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), AskError> {
//! let client = AskClient::new(ClientConfig::new("http://localhost:8080"))?;
//!
//! let mut callbacks = Callbacks::new().on(EventCategory::Answer, |chunk| {
//!     print!("{chunk}");
//!     Ok(())
//! });
//!
//! let result = client
//!     .ask("How do I rotate an index?")
//!     .index("docs")
//!     .top_k(5)
//!     .send(&mut callbacks)
//!     .await?;
//!
//! for question in &result.followup_questions {
//!     println!("\n- {question}");
//! }
//! # Ok(())
//! # }
//! ```

/// Result accumulation for one streamed response.
pub mod accumulator;
/// HTTP ask client and request builder.
pub mod client;
/// Client configuration.
pub mod config;
/// Line classification into categorized payloads.
pub mod demux;
/// The stream consumption loop, cancellation, and deadlines.
pub mod driver;
/// Public error types.
pub mod errors;
/// Event categories and typed payloads.
pub mod event;
/// Per-category event handlers.
pub mod handler;
/// Line framing over byte windows.
pub mod lines;
/// Common imports for typical usage.
pub mod prelude;
/// Request body types.
pub mod request;
/// Transport seam between the client and the network.
pub mod transport;

pub use accumulator::AskResult;
pub use client::{AskBuilder, AskClient};
pub use config::ClientConfig;
pub use driver::{AbortHandle, StreamControl, drive_stream};
pub use errors::{AskError, CallbackError, StreamError, TerminalState};
pub use event::{Classification, EventCategory};
pub use handler::{Callbacks, EventHandler, NoopHandler};
pub use request::{AskRequest, HistoryMessage};
pub use transport::{AskResponse, AskTransport, ByteStream, HttpTransport};
