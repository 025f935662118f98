use crate::renderer::{RendererKey, RendererRef, WeakRendererRef};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct LocalStorage<T> {
    renderer: WeakRendererRef,
    value: T,
    modified: u64,
}

/// Per-renderer state of an overlay.
///
/// Entries are keyed by renderer identity and hold only a weak handle to the
/// renderer; entries of dropped renderers are discarded on the next insert or
/// by [`Self::clear_dead`].
#[derive(Debug)]
pub struct LocalStorageHandler<T> {
    entries: Mutex<HashMap<RendererKey, LocalStorage<T>>>,
    stamp: AtomicU64,
}

impl<T> Default for LocalStorageHandler<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stamp: AtomicU64::new(0),
        }
    }
}

impl<T> LocalStorageHandler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<RendererKey, LocalStorage<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_stamp(&self) -> u64 {
        self.stamp.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Mutates the state of `renderer`, creating it with `T::default()` first
    /// if needed.
    pub fn update<R>(&self, renderer: &RendererRef, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Default,
    {
        let stamp = self.next_stamp();
        let mut entries = self.entries();
        let key = RendererKey::of(renderer);
        if !entries.contains_key(&key) {
            entries.retain(|_, entry| entry.renderer.strong_count() > 0);
        }
        let entry = entries.entry(key).or_insert_with(|| LocalStorage {
            renderer: Arc::downgrade(renderer),
            value: T::default(),
            modified: stamp,
        });
        entry.modified = stamp;
        f(&mut entry.value)
    }

    /// Reads the state of `renderer` without creating it.
    pub fn read<R>(&self, renderer: &RendererRef, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.entries()
            .get(&RendererKey::of(renderer))
            .map(|entry| f(&entry.value))
    }

    pub fn get(&self, renderer: &RendererRef) -> Option<T>
    where
        T: Clone,
    {
        self.read(renderer, T::clone)
    }

    /// Stamp of the last mutation for `renderer`. Stamps grow monotonically
    /// across all renderers of this handler.
    pub fn modified(&self, renderer: &RendererRef) -> Option<u64> {
        self.entries()
            .get(&RendererKey::of(renderer))
            .map(|entry| entry.modified)
    }

    pub fn remove(&self, renderer: &RendererRef) -> Option<T> {
        self.entries()
            .remove(&RendererKey::of(renderer))
            .map(|entry| entry.value)
    }

    pub fn clear_dead(&self) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.renderer.strong_count() > 0);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
