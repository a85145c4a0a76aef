//! Shared read-only snapshots.
//!
//! State built at startup (the backend registry, the loaded config) is
//! published through a [`SnapshotHandle`]. Readers take a cheap `Arc` of
//! the current snapshot without locking. A reload builds a complete new
//! value and swaps it in; the old snapshot stays valid for readers that
//! still hold it.

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// Cloneable handle to an atomically replaceable snapshot
pub struct SnapshotHandle<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T> SnapshotHandle<T> {
    /// Publish an initial snapshot
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(value)),
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace the whole snapshot, returning the previous one
    pub fn replace(&self, value: T) -> Arc<T> {
        self.inner.swap(Arc::new(value))
    }
}

impl<T> Clone for SnapshotHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SnapshotHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SnapshotHandle").field(&*self.inner.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_snapshot() {
        let handle = SnapshotHandle::new(vec!["openai"]);
        let reader = handle.clone();

        handle.replace(vec!["openai", "deepseek"]);

        assert_eq!(reader.load().len(), 2);
    }

    #[test]
    fn test_old_snapshot_survives_replace() {
        let handle = SnapshotHandle::new(1);
        let before = handle.load();

        let previous = handle.replace(2);

        assert_eq!(*before, 1);
        assert_eq!(*previous, 1);
        assert_eq!(*handle.load(), 2);
    }
}
