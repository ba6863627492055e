//! Arena-indexed visited sets.
//!
//! Every recursive walk in the verifier carries one of these to cut cycles.
//! The set is a plain bit vector over arena indices, so membership is O(1)
//! and a by-value copy (used for annotation chains) costs one small `Vec`.

use std::fmt;
use std::marker::PhantomData;

use crate::types::{ExprId, SymbolId};

/// A handle that indexes into one of the program arenas.
pub trait ArenaIndex: Copy {
    fn arena_index(self) -> usize;
}

impl ArenaIndex for ExprId {
    fn arena_index(self) -> usize {
        self.index()
    }
}

impl ArenaIndex for SymbolId {
    fn arena_index(self) -> usize {
        self.index()
    }
}

/// A bit set of visited arena handles.
///
/// Grows on demand; never shrinks.
pub struct VisitedSet<K> {
    /// Storage: each u64 holds 64 bits
    words: Vec<u64>,
    /// Number of set bits
    count: usize,
    _phantom: PhantomData<K>,
}

impl<K> VisitedSet<K> {
    const BITS_PER_WORD: usize = 64;

    /// Creates an empty set sized for an arena of `capacity` handles.
    pub fn new(capacity: usize) -> Self {
        let num_words = capacity.div_ceil(Self::BITS_PER_WORD);
        Self {
            words: vec![0; num_words],
            count: 0,
            _phantom: PhantomData,
        }
    }

    /// Returns the number of visited handles.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    fn word_and_mask(index: usize) -> (usize, u64) {
        (index / Self::BITS_PER_WORD, 1u64 << (index % Self::BITS_PER_WORD))
    }
}

impl<K: ArenaIndex> VisitedSet<K> {
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        let (word, mask) = Self::word_and_mask(key.arena_index());
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Marks `key` as visited. Returns true if it was not visited before.
    #[inline]
    pub fn insert(&mut self, key: K) -> bool {
        let (word, mask) = Self::word_and_mask(key.arena_index());
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_clear = self.words[word] & mask == 0;
        if was_clear {
            self.words[word] |= mask;
            self.count += 1;
        }
        was_clear
    }

    /// Unmarks `key`. Returns true if it was visited.
    #[inline]
    pub fn remove(&mut self, key: K) -> bool {
        let (word, mask) = Self::word_and_mask(key.arena_index());
        let Some(w) = self.words.get_mut(word) else {
            return false;
        };
        let was_set = *w & mask != 0;
        if was_set {
            *w &= !mask;
            self.count -= 1;
        }
        was_set
    }

    /// Returns a copy of this set with `key` added.
    pub fn with(&self, key: K) -> Self {
        let mut next = self.clone();
        next.insert(key);
        next
    }
}

impl<K> Clone for VisitedSet<K> {
    fn clone(&self) -> Self {
        Self {
            words: self.words.clone(),
            count: self.count,
            _phantom: PhantomData,
        }
    }
}

impl<K> Default for VisitedSet<K> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<K> fmt::Debug for VisitedSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indices: Vec<usize> = self
            .words
            .iter()
            .enumerate()
            .flat_map(|(i, &w)| {
                (0..Self::BITS_PER_WORD)
                    .filter(move |b| w & (1u64 << b) != 0)
                    .map(move |b| i * Self::BITS_PER_WORD + b)
            })
            .collect();
        f.debug_set().entries(indices).finish()
    }
}
