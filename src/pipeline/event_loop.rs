//! The loop pulling events from the source and notifying listeners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::pipeline::{EventListener, NextEvent};

/// A shared stop flag observed between loop iterations.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pulls events from the source and delivers them to each listener in
/// source order. The source is polled once per listener per turn.
pub struct EventLoop<S, L> {
    next_event: S,
    listeners: Vec<L>,
    stop: StopHandle,
}

impl<S, L> EventLoop<S, L>
where
    S: NextEvent,
    L: EventListener<S::Event>,
{
    pub fn new(next_event: S, listeners: Vec<L>, stop: StopHandle) -> Self {
        Self {
            next_event,
            listeners,
            stop,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Process events until stopped, surfacing the first error from the
    /// source or a listener.
    pub async fn run(mut self) -> Result<()> {
        while !self.stop.is_stopped() {
            for listener in &mut self.listeners {
                let event = self.next_event.next().await?;
                listener.notify(event).await?;
            }
        }

        Ok(())
    }
}
