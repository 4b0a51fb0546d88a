//! Status event delivery for the encodrop orchestrator.
//!
//! - [`StatusEvent`] — an addressed job status change.
//! - [`StatusDispatcher`] — in-process fire-and-forget fan-out backed by
//!   `tokio::sync::broadcast`.

pub mod dispatcher;

pub use dispatcher::{StatusDispatcher, StatusEvent};
