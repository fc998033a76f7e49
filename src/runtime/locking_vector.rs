//! A thread-safe append-and-drain vector.

use std::sync::Mutex;

/// A mutex-guarded vector supporting atomic appends and all-or-nothing
/// drains. A drain never returns a proper prefix of the contents.
#[derive(Debug, Default)]
pub struct LockingVector<T> {
    inner: Mutex<Vec<T>>,
}

impl<T> LockingVector<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Append a value. Thread-safe.
    pub fn push_back(&self, value: T) {
        self.inner.lock().unwrap().push(value);
    }

    /// Drain and return all contents. Thread-safe.
    pub fn into_inner(&self) -> Vec<T> {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }

    /// Drain and return the contents iff at least `size` values are present,
    /// otherwise leave the vector untouched and return `None`. Thread-safe.
    pub fn into_inner_at(&self, size: usize) -> Option<Vec<T>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.len() >= size {
            Some(std::mem::take(&mut *inner))
        } else {
            None
        }
    }

    /// Access the contents without locking; exclusivity is proven by the
    /// mutable borrow.
    pub fn get_mut(&mut self) -> &mut Vec<T> {
        self.inner.get_mut().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn push_and_drain() {
        let vector = LockingVector::new();
        vector.push_back(1);
        vector.push_back(2);

        assert_eq!(vector.into_inner(), vec![1, 2]);
        assert!(vector.into_inner().is_empty());
    }

    #[test]
    fn drain_at_threshold_is_all_or_nothing() {
        let vector = LockingVector::new();
        vector.push_back(1);

        assert_eq!(vector.into_inner_at(2), None);
        vector.push_back(2);
        assert_eq!(vector.into_inner_at(2), Some(vec![1, 2]));
        assert_eq!(vector.into_inner_at(1), None);
    }

    #[test]
    fn get_mut_bypasses_the_lock() {
        let mut vector = LockingVector::new();
        vector.get_mut().push(7);
        assert_eq!(vector.into_inner(), vec![7]);
    }

    #[test]
    fn concurrent_pushes_and_drains_lose_nothing() {
        let vector = Arc::new(LockingVector::new());
        let drained = Arc::new(Mutex::new(Vec::new()));

        let pushers: Vec<_> = (0..4)
            .map(|offset| {
                let vector = Arc::clone(&vector);
                thread::spawn(move || {
                    for i in 0..250 {
                        vector.push_back(offset * 250 + i);
                    }
                })
            })
            .collect();

        let drainers: Vec<_> = (0..2)
            .map(|_| {
                let vector = Arc::clone(&vector);
                let drained = Arc::clone(&drained);
                thread::spawn(move || {
                    for _ in 0..100 {
                        if let Some(values) = vector.into_inner_at(10) {
                            drained.lock().unwrap().extend(values);
                        }
                    }
                })
            })
            .collect();

        for handle in pushers.into_iter().chain(drainers) {
            handle.join().unwrap();
        }

        let mut all = drained.lock().unwrap().clone();
        all.extend(vector.into_inner());
        all.sort_unstable();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }
}
