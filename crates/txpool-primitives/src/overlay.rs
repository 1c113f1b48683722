//! A push-down stack of overlay dictionaries with a loader fallback on miss.
//!
//! This is the generic journal an EVM state adapter can use to stage
//! speculative writes during execution without mutating the committed state
//! view underneath: `Push`/`Pop`/`PopTo` manage the frame stack; `Get` walks
//! frames from the top down and falls back to a loader on a full miss; `Put`
//! always writes to the top frame; `Journal` replays every key touched,
//! oldest first.

use std::collections::HashMap;
use std::hash::Hash;

use alloy_primitives::{Address, B256};

/// A tagged key used by the default instantiation of [`LayeredMap`] for
/// account-state style overlays (balance, nonce, code, storage slots).
/// Consumers that don't need account semantics can use their own `K` type —
/// [`LayeredMap`] is not tied to this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyVariant {
    Balance(Address),
    Energy(Address),
    Nonce(Address),
    Code(Address),
    Storage(Address, B256),
}

/// A loader invoked on a full miss (the key is absent from every frame).
pub trait Loader<K, V> {
    fn load(&self, key: &K) -> Option<V>;
}

impl<K, V, F> Loader<K, V> for F
where
    F: Fn(&K) -> Option<V>,
{
    fn load(&self, key: &K) -> Option<V> {
        self(key)
    }
}

/// A loader that never resolves a miss; useful for tests and for consumers
/// that pre-populate the base frame themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLoader;

impl<K, V> Loader<K, V> for NoopLoader {
    fn load(&self, _key: &K) -> Option<V> {
        None
    }
}

/// A push-down stack of overlay frames over a `K -> V` mapping, with a
/// loader fallback for keys not yet staged in any frame.
///
/// `frames[0]` is the base frame; `frames.last()` is the current write
/// target. Reads walk from the last frame to the first, returning the first
/// hit. `journal` records every key in the order it was first written,
/// across the whole lifetime of the map (not per-frame), so a caller can
/// replay "everything touched" regardless of which frame ultimately held it.
#[derive(Debug)]
pub struct LayeredMap<K, V, L = NoopLoader> {
    frames: Vec<HashMap<K, V>>,
    journal: Vec<K>,
    loader: L,
}

impl<K, V> LayeredMap<K, V, NoopLoader>
where
    K: Eq + Hash + Clone,
{
    /// Creates a map with a single base frame and no loader fallback.
    pub fn new() -> Self {
        Self { frames: vec![HashMap::new()], journal: Vec::new(), loader: NoopLoader }
    }
}

impl<K, V> Default for LayeredMap<K, V, NoopLoader>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, L> LayeredMap<K, V, L>
where
    K: Eq + Hash + Clone,
    L: Loader<K, V>,
{
    /// Creates a map with a single base frame and the given loader.
    pub fn with_loader(loader: L) -> Self {
        Self { frames: vec![HashMap::new()], journal: Vec::new(), loader }
    }

    /// Number of frames currently on the stack, including the base frame.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pushes a fresh, empty frame as the new write target.
    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops and discards the top frame. The base frame (index 0) is never
    /// popped; calling `pop` with only the base frame present is a no-op.
    pub fn pop(&mut self) -> Option<HashMap<K, V>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Truncates the frame stack so that exactly `depth` frames remain
    /// (`depth` must be `>= 1`). Used to unwind several nested speculative
    /// layers at once, e.g. when a batch of transactions is abandoned.
    pub fn pop_to(&mut self, depth: usize) {
        let depth = depth.max(1);
        self.frames.truncate(depth);
    }

    /// Writes `value` for `key` into the current (top) frame.
    pub fn put(&mut self, key: K, value: V) {
        if !self.journal.contains(&key) {
            self.journal.push(key.clone());
        }
        self.frames
            .last_mut()
            .expect("base frame always present")
            .insert(key, value);
    }

    /// Reads `key`, walking frames top-down, falling back to the loader on a
    /// full miss. A loader hit is cached into the base frame so repeated
    /// reads don't re-invoke it.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let mut hit_frame = None;
        for (idx, frame) in self.frames.iter().enumerate().rev() {
            if frame.contains_key(key) {
                hit_frame = Some(idx);
                break;
            }
        }
        if hit_frame.is_none() {
            if let Some(loaded) = self.loader.load(key) {
                self.frames[0].insert(key.clone(), loaded);
                hit_frame = Some(0);
            }
        }
        hit_frame.and_then(|idx| self.frames[idx].get(key))
    }

    /// Every key ever written, oldest first. Revisits of the same key are
    /// not duplicated; the position reflects the first write.
    pub fn journal(&self) -> &[K] {
        &self.journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_frames_top_down() {
        let mut map: LayeredMap<&'static str, u32> = LayeredMap::new();
        map.put("a", 1);
        map.push();
        map.put("a", 2);
        assert_eq!(map.get(&"a"), Some(&2));
        map.pop();
        assert_eq!(map.get(&"a"), Some(&1));
    }

    #[test]
    fn pop_never_removes_base_frame() {
        let mut map: LayeredMap<&'static str, u32> = LayeredMap::new();
        assert_eq!(map.pop(), None);
        assert_eq!(map.depth(), 1);
    }

    #[test]
    fn pop_to_truncates_multiple_frames() {
        let mut map: LayeredMap<&'static str, u32> = LayeredMap::new();
        map.push();
        map.push();
        map.push();
        assert_eq!(map.depth(), 4);
        map.pop_to(1);
        assert_eq!(map.depth(), 1);
    }

    #[test]
    fn loader_fallback_resolves_and_caches() {
        let mut map = LayeredMap::with_loader(|k: &&'static str| (*k == "preloaded").then_some(9));
        assert_eq!(map.get(&"preloaded"), Some(&9));
        assert_eq!(map.get(&"missing"), None);
    }

    #[test]
    fn journal_records_each_key_once_in_first_write_order() {
        let mut map: LayeredMap<&'static str, u32> = LayeredMap::new();
        map.put("b", 1);
        map.put("a", 2);
        map.put("b", 3);
        assert_eq!(map.journal(), &["b", "a"]);
    }
}
