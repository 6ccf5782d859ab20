//! Iterator (C7): a forward walk of every interned string in
//! split-ordered order.
//!
//! Not synchronized with concurrent insertion: an iterator captures a
//! single snapshot of the current segment at construction and walks it to
//! completion, the same way a lock-free reader does for a single lookup.
//! Strings interned after the snapshot was taken may or may not be seen,
//! and no ordering across `position`s is guaranteed beyond "bit-reversed
//! hash order within an unchanging table size" (see
//! `hash_table::split_ordered_list`).

use core::ptr::NonNull;

use crate::handle::Handle;
use crate::hash_table::growable_array::Segment;
use crate::hash_table::node::NodeHeader;
use crate::sync::Ordering;
use crate::Dictionary;

/// Forward iterator over a [`Dictionary`]'s contents at the time it was
/// created.
pub struct Iter<'d> {
    segments: Vec<&'d Segment>,
    table_size: usize,
    /// Logical bucket index currently being walked.
    position: usize,
    /// Offset within the current bucket since its head was last (re)loaded.
    bucket_position: usize,
    /// Raw pointer to the next node to yield in the current bucket, or `0`
    /// if the bucket's head hasn't been loaded yet this step.
    cursor: usize,
    loaded: bool,
}

impl<'d> Iter<'d> {
    pub(crate) fn new(dict: &'d Dictionary) -> Self {
        match dict.segmented_array().snapshot() {
            None => Iter {
                segments: Vec::new(),
                table_size: 0,
                position: 0,
                bucket_position: 0,
                cursor: 0,
                loaded: true,
            },
            Some(current) => {
                let table_size = current.table_size;
                let segments = dict.segmented_array().ordered_from(current);
                Iter {
                    segments,
                    table_size,
                    position: 0,
                    bucket_position: 0,
                    cursor: 0,
                    loaded: false,
                }
            }
        }
    }

    /// The logical bucket index the iterator is currently positioned at.
    pub fn position(&self) -> usize {
        self.position
    }

    /// How many nodes have been yielded from the current bucket since its
    /// head was last loaded.
    pub fn bucket_position(&self) -> usize {
        self.bucket_position
    }

    fn segment_for(&self, position: usize) -> &'d Segment {
        self.segments
            .iter()
            .rev()
            .find(|seg| position >= seg.prev_table_size)
            .expect("position is within the snapshotted table range")
    }
}

impl<'d> Iterator for Iter<'d> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        loop {
            if self.position >= self.table_size {
                return None;
            }

            if !self.loaded {
                let segment = self.segment_for(self.position);
                let local = self.position - segment.prev_table_size;
                self.cursor = segment.heads[local].load(Ordering::Acquire);
                self.bucket_position = 0;
                self.loaded = true;
            }

            if self.cursor == 0 {
                self.position += 1;
                self.loaded = false;
                continue;
            }

            let node = self.cursor as *const NodeHeader;
            let hash = unsafe { (*node).hash };
            if (hash as usize) % self.table_size != self.position {
                // The list has crossed into the next bucket's span.
                self.position += 1;
                self.loaded = false;
                continue;
            }

            self.bucket_position += 1;
            let next = unsafe { (*node).next.load(Ordering::Acquire) };
            let handle = unsafe { Handle::from_node(NonNull::new_unchecked(node as *mut NodeHeader)) };
            self.cursor = next;
            return Some(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn empty_dictionary_yields_nothing() {
        let dict = Dictionary::new();
        assert_eq!(dict.iter().count(), 0);
    }

    #[test]
    fn iteration_is_complete_and_duplicate_free() {
        let dict = Dictionary::with_config(crate::Config {
            chunk_size: 1024,
            initial_buckets: 4,
            max_segments: 4,
        })
        .unwrap();
        let inputs: Vec<String> = (0..500).map(|i| format!("item-{i}")).collect();
        for s in &inputs {
            dict.intern(s.as_bytes()).unwrap();
        }
        let seen: BTreeSet<Vec<u8>> = dict.iter().map(|h| h.as_bytes().to_vec()).collect();
        let expected: BTreeSet<Vec<u8>> = inputs.iter().map(|s| s.as_bytes().to_vec()).collect();
        assert_eq!(seen, expected);
        assert_eq!(dict.iter().count(), inputs.len());
    }
}
