//! The fan-in point between the transformer and the storage manager.

use std::sync::Arc;

use crate::error::Result;
use crate::pipeline::{EventListener, EventTransform};
use crate::storage::Store;

/// A listener that transforms each raw event and hands the resulting batch
/// to storage.
pub struct EventHandler<T> {
    storage: Arc<dyn Store>,
    transformer: T,
}

impl<T> EventHandler<T> {
    pub fn new(storage: Arc<dyn Store>, transformer: T) -> Self {
        Self {
            storage,
            transformer,
        }
    }
}

impl<E, T: EventTransform<E> + Send> EventListener<E> for EventHandler<T> {
    async fn notify(&mut self, event: E) -> Result<()> {
        self.storage
            .store_event(self.transformer.transform_event(event))
    }
}
