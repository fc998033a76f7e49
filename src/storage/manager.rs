//! Batching storage manager with dual-trigger flushes.
//!
//! Incoming batches are appended to a locking buffer. A flush happens when
//! the buffer holds at least `n_events` batches, or when the periodic timer
//! fires, whichever comes first. Flushed batches are merged into one and
//! written to every sink sequentially from a spawned task.
//!
//! ```text
//! store_event ──→ LockingVector<Data> ──┬─ len ≥ n ──→ spawn(store to sinks)
//!                                       └─ every T ──→ spawn(store to sinks)
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::event::Data;
use crate::runtime::{Interval, LockingVector, Scheduler};
use crate::storage::Store;

struct Inner {
    data: LockingVector<Data>,
    stores: Mutex<Vec<Arc<dyn Store>>>,
}

/// Buffers event batches and fans flushed writes out to the sinks.
pub struct StorageManager {
    scheduler: Arc<Scheduler>,
    inner: Arc<Inner>,
    n_events: usize,
}

impl StorageManager {
    /// Construct a storage manager and spawn its periodic flush task.
    ///
    /// `n_events` is the count trigger; `store_after` is the time trigger.
    pub fn new(
        scheduler: Arc<Scheduler>,
        stores: Vec<Arc<dyn Store>>,
        n_events: usize,
        store_after: Duration,
    ) -> Self {
        let inner = Arc::new(Inner {
            data: LockingVector::new(),
            stores: Mutex::new(stores),
        });

        let task_scheduler = Arc::clone(&scheduler);
        let task_inner = Arc::clone(&inner);
        let handler_scheduler = Arc::clone(&scheduler);
        scheduler.spawn_with_handler(
            Self::store_after_task(task_scheduler, task_inner, store_after),
            move |result| Self::result_handler(result, &handler_scheduler),
        );

        Self {
            scheduler,
            inner,
            n_events,
        }
    }

    /// Register another sink. Flushes snapshot the sink list, so a write
    /// already in flight keeps the set it started with.
    pub fn add_store(&self, store: Arc<dyn Store>) {
        self.inner.stores.lock().unwrap().push(store);
    }

    async fn store_after_task(
        scheduler: Arc<Scheduler>,
        inner: Arc<Inner>,
        store_after: Duration,
    ) -> Result<()> {
        let mut interval = Interval::new(store_after);

        while !scheduler.is_stopped() {
            tokio::select! {
                result = interval.tick() => {
                    result.map_err(|error| Error::DatabaseManager(error.to_string()))?;
                    tracing::debug!(
                        "timer threshold of {} seconds reached",
                        interval.period().as_secs()
                    );
                    let batches = inner.data.into_inner();
                    Self::spawn_store(&scheduler, &inner, batches);
                }
                // A stop aborts the wait; the loop condition is re-checked.
                () = scheduler.cancelled() => {}
            }
        }

        // Batches buffered at shutdown still reach the sinks.
        let remaining = inner.data.into_inner();
        if !remaining.is_empty() {
            Self::store_all(Self::merge(remaining), Self::snapshot(&inner)).await?;
        }

        Ok(())
    }

    fn merge(batches: Vec<Data>) -> Data {
        let mut merged = Data::new();
        for batch in batches {
            merged.merge_with(batch);
        }
        merged
    }

    fn snapshot(inner: &Inner) -> Vec<Arc<dyn Store>> {
        inner.stores.lock().unwrap().clone()
    }

    fn spawn_store(scheduler: &Arc<Scheduler>, inner: &Arc<Inner>, batches: Vec<Data>) {
        if batches.is_empty() {
            return;
        }

        let merged = Self::merge(batches);
        tracing::info!("reached threshold, storing {} events", merged.entries().len());

        let stores = Self::snapshot(inner);
        let handler_scheduler = Arc::clone(scheduler);
        scheduler.spawn_with_handler(Self::store_all(merged, stores), move |result| {
            Self::result_handler(result, &handler_scheduler)
        });
    }

    /// Write one merged batch to every sink in registration order. A
    /// failure at sink `k` aborts the batch; later sinks are not called.
    async fn store_all(data: Data, stores: Vec<Arc<dyn Store>>) -> Result<()> {
        for store in stores {
            store.store_event(data.clone())?;
        }
        Ok(())
    }

    fn result_handler(result: Result<()>, scheduler: &Scheduler) {
        if let Err(error) = result {
            tracing::error!("error storing events: {error}");
            scheduler.stop();
        }
    }
}

impl Store for StorageManager {
    fn store_event(&self, events: Data) -> Result<()> {
        self.inner.data.push_back(events);

        if let Some(batches) = self.inner.data.into_inner_at(self.n_events) {
            Self::spawn_store(&self.scheduler, &self.inner, batches);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::schema::DeviceType;
    use crate::event::MouseMove;

    /// Records every batch it receives.
    #[derive(Default)]
    struct RecordingStore {
        batches: Mutex<Vec<Data>>,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn batch_count(&self) -> usize {
            self.batches.lock().unwrap().len()
        }

        fn entry_count(&self) -> usize {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .map(|batch| batch.entries().len())
                .sum()
        }
    }

    impl Store for RecordingStore {
        fn store_event(&self, events: Data) -> Result<()> {
            if self.fail {
                return Err(Error::Database("sink failed".into()));
            }
            self.batches.lock().unwrap().push(events);
            Ok(())
        }
    }

    fn batch(entries: usize) -> Data {
        let mut data = Data::new();
        for _ in 0..entries {
            MouseMove::new().device(DeviceType::Mouse).build(&mut data);
        }
        data
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..1000 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(start_paused = true)]
    async fn count_trigger_flushes_one_merged_batch() {
        let scheduler = Arc::new(Scheduler::new());
        let store = Arc::new(RecordingStore::default());
        let manager = StorageManager::new(
            Arc::clone(&scheduler),
            vec![Arc::clone(&store) as Arc<dyn Store>],
            3,
            Duration::from_secs(3600),
        );

        manager.store_event(batch(2)).unwrap();
        manager.store_event(batch(1)).unwrap();
        assert_eq!(store.batch_count(), 0);

        manager.store_event(batch(4)).unwrap();
        wait_for(|| store.batch_count() == 1).await;
        assert_eq!(store.entry_count(), 7);

        scheduler.stop();
        scheduler.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn time_trigger_flushes_within_the_period() {
        let scheduler = Arc::new(Scheduler::new());
        let store = Arc::new(RecordingStore::default());
        let manager = StorageManager::new(
            Arc::clone(&scheduler),
            vec![Arc::clone(&store) as Arc<dyn Store>],
            usize::MAX,
            Duration::from_secs(1),
        );

        manager.store_event(batch(1)).unwrap();
        assert_eq!(store.batch_count(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        wait_for(|| store.batch_count() == 1).await;
        assert_eq!(store.entry_count(), 1);

        scheduler.stop();
        scheduler.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_flush_with_empty_buffer_writes_nothing() {
        let scheduler = Arc::new(Scheduler::new());
        let store = Arc::new(RecordingStore::default());
        let _manager = StorageManager::new(
            Arc::clone(&scheduler),
            vec![Arc::clone(&store) as Arc<dyn Store>],
            usize::MAX,
            Duration::from_secs(1),
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(store.batch_count(), 0);

        scheduler.stop();
        scheduler.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn count_of_one_flushes_every_store() {
        let scheduler = Arc::new(Scheduler::new());
        let store = Arc::new(RecordingStore::default());
        let manager = StorageManager::new(
            Arc::clone(&scheduler),
            vec![Arc::clone(&store) as Arc<dyn Store>],
            1,
            Duration::from_secs(3600),
        );

        manager.store_event(batch(1)).unwrap();
        manager.store_event(batch(1)).unwrap();
        wait_for(|| store.batch_count() == 2).await;

        scheduler.stop();
        scheduler.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failure_stops_the_scheduler_and_skips_later_sinks() {
        let scheduler = Arc::new(Scheduler::new());
        let failing = Arc::new(RecordingStore::failing());
        let healthy = Arc::new(RecordingStore::default());
        let manager = StorageManager::new(
            Arc::clone(&scheduler),
            vec![
                Arc::clone(&failing) as Arc<dyn Store>,
                Arc::clone(&healthy) as Arc<dyn Store>,
            ],
            1,
            Duration::from_secs(3600),
        );

        manager.store_event(batch(1)).unwrap();
        wait_for(|| scheduler.is_stopped()).await;
        assert_eq!(healthy.batch_count(), 0);

        scheduler.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_buffered_batches() {
        let scheduler = Arc::new(Scheduler::new());
        let store = Arc::new(RecordingStore::default());
        let manager = StorageManager::new(
            Arc::clone(&scheduler),
            vec![Arc::clone(&store) as Arc<dyn Store>],
            usize::MAX,
            Duration::from_secs(3600),
        );

        manager.store_event(batch(2)).unwrap();
        scheduler.stop();
        scheduler.join().await;

        assert_eq!(store.batch_count(), 1);
        assert_eq!(store.entry_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sinks_added_later_receive_flushes() {
        let scheduler = Arc::new(Scheduler::new());
        let store = Arc::new(RecordingStore::default());
        let manager = StorageManager::new(
            Arc::clone(&scheduler),
            Vec::new(),
            1,
            Duration::from_secs(3600),
        );

        manager.add_store(Arc::clone(&store) as Arc<dyn Store>);
        manager.store_event(batch(1)).unwrap();
        wait_for(|| store.batch_count() == 1).await;

        scheduler.stop();
        scheduler.join().await;
    }
}
