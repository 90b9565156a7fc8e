//! Common imports for typical client usage.
pub use crate::{
    AbortHandle, AskBuilder, AskClient, AskError, AskResult, Callbacks, CallbackError,
    Classification, ClientConfig, EventCategory, EventHandler, NoopHandler, StreamError,
};
