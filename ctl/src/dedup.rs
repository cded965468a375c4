use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Maps a reference (a file offset, or a name) to the node it resolved to
/// the first time it was seen, so later references share that node.
#[derive(Debug)]
pub struct DedupMap<K, V> {
    seen: HashMap<K, V>,
}

impl<K: Eq + Hash, V: Copy> DedupMap<K, V> {
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.seen.get(key).copied()
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.seen.insert(key, value);
    }

    /// Returns the node already recorded for `key`, or builds it with
    /// `make` and records it. `make` runs at most once per key.
    pub fn get_or_try_create<E>(
        &mut self,
        key: K,
        make: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.seen.get(&key) {
            return Ok(*value);
        }
        let value = make()?;
        self.seen.insert(key, value);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<K: Eq + Hash, V: Copy> Default for DedupMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
