//! Glyph registry: every distinct glyph, exactly once
//!
//! Shaping reports glyph occurrences; the registry collapses them to the
//! set of unique `(face, glyph)` pairs and hands back the stable 64-bit
//! identity later stages join on. Interning keeps first-seen order, but
//! everything the cache hash and the packer consume goes through
//! [`GlyphRegistry::sort_for_output`] first: the `(face, glyph)` sort
//! order, not insertion order, is what identical inputs must reproduce
//! bit for bit.

use std::collections::HashMap;

use crate::hash::ContentHash;
use crate::types::{GlyphIndex, GlyphKey, GlyphRef};

#[derive(Debug, Default)]
pub struct GlyphRegistry {
    entries: Vec<GlyphRef>,
    keys: Vec<GlyphKey>,
    index: HashMap<GlyphKey, u32>,
    sorted: bool,
}

impl GlyphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `(face, glyph)` and return its identity.
    ///
    /// Unique-glyph counts stay in the low thousands, so the map index
    /// is plenty; interning must not be called after
    /// [`Self::sort_for_output`].
    pub fn intern(&mut self, face: &str, glyph: GlyphIndex) -> GlyphKey {
        debug_assert!(!self.sorted, "intern after sort_for_output");
        let key = GlyphKey::new(face, glyph);
        if !self.index.contains_key(&key) {
            self.index.insert(key, self.entries.len() as u32);
            self.entries.push(GlyphRef {
                face: face.to_string(),
                glyph,
            });
            self.keys.push(key);
        }
        key
    }

    /// Reorder by `(face name, glyph index)` ascending. Hashing and
    /// packing both require this order.
    pub fn sort_for_output(&mut self) {
        let mut paired: Vec<(GlyphRef, GlyphKey)> = self
            .entries
            .drain(..)
            .zip(self.keys.drain(..))
            .collect();
        paired.sort_by(|(a, _), (b, _)| a.face.cmp(&b.face).then(a.glyph.cmp(&b.glyph)));

        self.index = paired
            .iter()
            .enumerate()
            .map(|(pos, &(_, key))| (key, pos as u32))
            .collect();
        for (entry, key) in paired {
            self.entries.push(entry);
            self.keys.push(key);
        }
        self.sorted = true;
    }

    /// Rolling hash over the sorted identities. This is the second cache
    /// gate: it changes iff the set of used glyphs changes.
    pub fn set_hash(&self) -> u32 {
        debug_assert!(self.sorted, "set_hash before sort_for_output");
        let mut hash = ContentHash::new();
        for key in &self.keys {
            hash.write_u64(key.0);
        }
        hash.finish()
    }

    /// Position of a glyph identity in the current order.
    pub fn position(&self, key: GlyphKey) -> Option<usize> {
        self.index.get(&key).map(|&i| i as usize)
    }

    pub fn entries(&self) -> &[GlyphRef] {
        &self.entries
    }

    pub fn keys(&self) -> &[GlyphKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_occurrences_intern_once() {
        let mut reg = GlyphRegistry::new();
        let first = reg.intern("SomeFace", 7);
        for _ in 0..10 {
            assert_eq!(reg.intern("SomeFace", 7), first);
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn same_index_different_face_is_distinct() {
        let mut reg = GlyphRegistry::new();
        reg.intern("A", 7);
        reg.intern("B", 7);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn sort_orders_by_face_then_glyph() {
        let mut reg = GlyphRegistry::new();
        reg.intern("B", 2);
        reg.intern("A", 9);
        reg.intern("B", 1);
        reg.intern("A", 3);
        reg.sort_for_output();
        let order: Vec<(String, u32)> = reg
            .entries()
            .iter()
            .map(|e| (e.face.clone(), e.glyph))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), 3),
                ("A".to_string(), 9),
                ("B".to_string(), 1),
                ("B".to_string(), 2),
            ]
        );
    }

    #[test]
    fn positions_follow_the_sort() {
        let mut reg = GlyphRegistry::new();
        let b = reg.intern("B", 1);
        let a = reg.intern("A", 1);
        reg.sort_for_output();
        assert_eq!(reg.position(a), Some(0));
        assert_eq!(reg.position(b), Some(1));
        assert_eq!(reg.position(GlyphKey::new("C", 1)), None);
    }

    #[test]
    fn set_hash_ignores_insertion_order() {
        let mut one = GlyphRegistry::new();
        one.intern("A", 1);
        one.intern("B", 2);
        one.sort_for_output();

        let mut two = GlyphRegistry::new();
        two.intern("B", 2);
        two.intern("A", 1);
        two.sort_for_output();

        assert_eq!(one.set_hash(), two.set_hash());
    }

    #[test]
    fn set_hash_tracks_the_glyph_set() {
        let mut one = GlyphRegistry::new();
        one.intern("A", 1);
        one.sort_for_output();

        let mut two = GlyphRegistry::new();
        two.intern("A", 1);
        two.intern("A", 2);
        two.sort_for_output();

        assert_ne!(one.set_hash(), two.set_hash());
    }
}
