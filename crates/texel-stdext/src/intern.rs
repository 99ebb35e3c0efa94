//! String interning
//!
//! Control sequence names are interned so that a token is a small `Copy`
//! value and name comparisons are integer comparisons. Interning a string
//! returns a key; interning an equal string returns the same key; the
//! string is recovered from the key with [Interner::resolve]. Interned
//! strings are never deallocated.
//!
//! All interned strings live in one append-only buffer, with a vector of
//! end offsets recording where each one stops. A key is the 1-based index
//! of the string's offset entry, so resolution is two vector lookups.
//! Deduplication uses a map from string hashes to the keys bearing that
//! hash; on the rare hash collision the candidate keys are checked by
//! resolving them.
//!
//! ```
//! # use texel_stdext::intern::Interner;
//! let mut interner: Interner = Default::default();
//! let hello_1 = interner.get_or_intern("hello");
//! let world = interner.get_or_intern("world");
//! let hello_2 = interner.get_or_intern("hello");
//! assert_eq!(hello_1, hello_2);
//! assert_ne!(hello_1, world);
//! assert_eq!(interner.resolve(hello_1), Some("hello"));
//! ```

use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};
use std::num::NonZeroU32;

/// Types that can be used as interner keys.
pub trait Key: Copy {
    /// Build a key from a 0-based index. Returns `None` when the index
    /// exceeds the key type's range.
    fn try_from_index(index: usize) -> Option<Self>;
    /// Recover the 0-based index the key was built from.
    fn into_index(self) -> usize;
}

impl Key for NonZeroU32 {
    fn try_from_index(index: usize) -> Option<Self> {
        let index: u32 = index.try_into().ok()?;
        index.checked_add(1).and_then(NonZeroU32::new)
    }

    fn into_index(self) -> usize {
        self.get() as usize - 1
    }
}

/// String interner.
///
/// See the module documentation for information about this data structure.
pub struct Interner<K = NonZeroU32, S = RandomState> {
    buffer: String,
    ends: Vec<usize>,
    dedup: HashMap<u64, Vec<K>>,
    hash_builder: S,
}

impl<K, S: Default> Default for Interner<K, S> {
    fn default() -> Self {
        Self {
            buffer: Default::default(),
            ends: Default::default(),
            dedup: Default::default(),
            hash_builder: Default::default(),
        }
    }
}

impl<K: Key, S: BuildHasher> Interner<K, S> {
    /// Intern the provided string and return its key.
    pub fn get_or_intern(&mut self, s: &str) -> K {
        let hash = self.hash_builder.hash_one(s);
        if let Some(key) = self.lookup(s, hash) {
            return key;
        }
        let key = match K::try_from_index(self.ends.len()) {
            Some(key) => key,
            None => panic!("interner key space exhausted"),
        };
        self.buffer.push_str(s);
        self.ends.push(self.buffer.len());
        self.dedup.entry(hash).or_default().push(key);
        key
    }

    /// Get the key for the provided string if it has already been interned.
    pub fn get(&self, s: &str) -> Option<K> {
        self.lookup(s, self.hash_builder.hash_one(s))
    }

    fn lookup(&self, s: &str, hash: u64) -> Option<K> {
        self.dedup
            .get(&hash)?
            .iter()
            .copied()
            .find(|&key| self.resolve(key) == Some(s))
    }

    /// Return the interned string corresponding to the provided key.
    pub fn resolve(&self, key: K) -> Option<&str> {
        let i = key.into_index();
        let end = *self.ends.get(i)?;
        let start = match i.checked_sub(1) {
            None => 0,
            Some(prev) => self.ends[prev],
        };
        Some(&self.buffer[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hasher;

    #[test]
    fn round_trip() {
        let mut interner: Interner = Default::default();
        let a = interner.get_or_intern("def");
        let b = interner.get_or_intern("fi");
        assert_eq!(interner.resolve(a), Some("def"));
        assert_eq!(interner.resolve(b), Some("fi"));
        assert_eq!(interner.get("def"), Some(a));
        assert_eq!(interner.get("undefined"), None);
    }

    #[test]
    fn dedup() {
        let mut interner: Interner = Default::default();
        let a = interner.get_or_intern("par");
        let b = interner.get_or_intern("par");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_string() {
        let mut interner: Interner = Default::default();
        let key = interner.get_or_intern("");
        assert_eq!(interner.resolve(key), Some(""));
    }

    /// A hasher that maps every string to the same value, to exercise the
    /// collision path in the dedup map.
    #[derive(Default)]
    struct FixedHasher;

    impl Hasher for FixedHasher {
        fn finish(&self) -> u64 {
            12
        }
        fn write(&mut self, _: &[u8]) {}
    }

    #[test]
    fn hash_collision() {
        let mut interner: Interner<NonZeroU32, std::hash::BuildHasherDefault<FixedHasher>> =
            Default::default();
        let hello = interner.get_or_intern("hello");
        let world = interner.get_or_intern("world");
        assert_ne!(hello, world);
        assert_eq!(interner.resolve(hello), Some("hello"));
        assert_eq!(interner.resolve(world), Some("world"));
        assert_eq!(interner.get("hello"), Some(hello));
    }
}
