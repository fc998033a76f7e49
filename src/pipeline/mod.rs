//! The capture pipeline: source → transformer → storage.
//!
//! [`NextEvent`] yields raw events from a backend, [`EventTransform`]
//! normalises them, and an [`EventListener`] consumes them. The
//! [`EventLoop`] drives the three until stopped.

pub mod event_loop;
pub mod handler;

use crate::error::Result;
use crate::event::Data;

pub use event_loop::{EventLoop, StopHandle};
pub use handler::EventHandler;

/// Fetches the next event to process.
pub trait NextEvent {
    type Event;

    /// Yield the next raw event, or the error that ended the stream.
    async fn next(&mut self) -> Result<Self::Event>;
}

/// Receives events from the event loop.
pub trait EventListener<E> {
    async fn notify(&mut self, event: E) -> Result<()>;
}

/// Transforms raw events into normalised batches.
pub trait EventTransform<E> {
    fn transform_event(&mut self, event: E) -> Data;
}
