//! Split-ordered list and interning engine (C4/C5).
//!
//! One global singly linked list threads every interned node, ordered by
//! bit-reversed hash so that the nodes belonging to bucket `b` (those with
//! `hash mod T == b`) form a *contiguous run* of the list. That's what lets
//! growth double the table without moving a single node: splitting bucket
//! `b` into `b` and `b + T_old` only requires finding where, inside `b`'s
//! existing run, the nodes destined for `b + T_old` begin, and pointing a
//! new bucket head at that spot. The list itself is never touched.
//!
//! Reads walk this structure lock-free, using only acquire-loads. Writes
//! (new nodes, bucket-head updates, growth) are serialized by a single
//! mutex; a reader that races a concurrent insert either observes the
//! finished splice or doesn't, and falls back to the (re-checking) insert
//! path on a miss.

use core::hash::Hasher;
use core::ptr::NonNull;

use rustc_hash::FxHasher;

use crate::config::Config;
use crate::error::Error;
use crate::handle::Handle;
use crate::hash_table::growable_array::{Segment, SegmentedArray};
use crate::hash_table::node::{empty_data_ptr, NodeHeader, HEADER_SIZE};
use crate::hash_table::page::PageAllocator;
use crate::sync::{AtomicUsize, Mutex, Ordering};

/// State touched only while the insertion lock is held: the page arena and
/// the exact element count. (The array's `current` pointer is itself
/// atomic and is also only ever *written* under this lock, but is read
/// lock-free by the fast path.)
struct Writer {
    pages: PageAllocator,
}

/// A concurrent interning dictionary: lookup-or-insert of short byte
/// strings into address-stable, immortal handles.
pub struct Dictionary {
    array: SegmentedArray,
    writer: Mutex<Writer>,
    /// Approximate element count, incremented under the insertion lock but
    /// readable lock-free for diagnostics (`len`, `load_factor`). Never
    /// used to make a correctness decision outside the lock.
    count: AtomicUsize,
    config: Config,
}

// `Dictionary` is `Send + Sync` without any manual unsafe impl: every
// pointer it ever publishes (segment, bucket head, node `next`) is encoded
// as a plain `usize` rather than a raw pointer type, specifically so that
// nothing here has to opt out of the auto traits.
impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    /// A dictionary with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default()).expect("default configuration is always valid")
    }

    /// A dictionary with caller-supplied page/bucket/segment sizing.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            array: SegmentedArray::new(),
            writer: Mutex::new(Writer {
                pages: PageAllocator::new(config.chunk_size),
            }),
            count: AtomicUsize::new(0),
            config,
        })
    }

    /// Largest byte string this dictionary will accept.
    pub fn max_string_size(&self) -> usize {
        self.config.max_string_size()
    }

    /// Approximate number of distinct strings interned so far. Diagnostic
    /// only: under concurrent insertion this can be stale the instant it's
    /// read.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `len() / table_size`, or `0.0` before the table is first installed.
    pub fn load_factor(&self) -> f64 {
        match self.array.snapshot() {
            Some(seg) => self.len() as f64 / seg.table_size as f64,
            None => 0.0,
        }
    }

    /// Looks up `bytes`, inserting it if absent, and returns a handle whose
    /// data pointer is stable for the dictionary's lifetime. Two calls with
    /// equal content always return handles with identical data pointers.
    pub fn intern(&self, bytes: &[u8]) -> Result<Handle, Error> {
        if bytes.is_empty() {
            return Ok(Handle::empty());
        }
        let max = self.max_string_size();
        if bytes.len() > max {
            return Err(Error::TooLarge {
                requested: bytes.len(),
                max,
            });
        }
        let hash = hash_bytes(bytes);

        if let Some(found) = self.find_lockfree(hash, bytes) {
            return Ok(unsafe { Handle::from_node(found) });
        }

        self.insert_locked(hash, bytes)
    }

    /// Lock-free read path: only atomic acquire-loads, never blocks.
    fn find_lockfree(&self, hash: u32, bytes: &[u8]) -> Option<NonNull<NodeHeader>> {
        let seg = self.array.snapshot()?;
        let t = seg.table_size;
        let b = (hash as usize) % t;
        let head = self.array.locate(seg, b);
        let cursor = head.load(Ordering::Acquire);
        match locate_in_bucket(cursor, hash, bytes, t, b) {
            BucketWalk::Found(ptr) => Some(unsafe { NonNull::new_unchecked(ptr as *mut NodeHeader) }),
            BucketWalk::NotFound { .. } => None,
        }
    }

    fn insert_locked(&self, hash: u32, bytes: &[u8]) -> Result<Handle, Error> {
        let mut writer = self.writer.lock().unwrap();

        match self.array.snapshot() {
            None => self.init_segment0()?,
            Some(seg) => {
                if self.count.load(Ordering::Relaxed) >= seg.table_size {
                    self.grow(seg)?;
                }
            }
        }

        // Re-snapshot: growth (or the first install) may have just run.
        let seg = self.array.snapshot().expect("segment 0 installed above");
        let t = seg.table_size;
        let b = (hash as usize) % t;
        let head = self.array.locate(seg, b);

        let walk = locate_in_bucket(head.load(Ordering::Acquire), hash, bytes, t, b);
        let (prev, next) = match walk {
            BucketWalk::Found(ptr) => {
                // Another thread spliced this content in while we waited
                // for the lock (the lock-free path above missed it).
                return Ok(unsafe { Handle::from_node(NonNull::new_unchecked(ptr as *mut NodeHeader)) });
            }
            BucketWalk::NotFound { prev, next } => (prev, next),
        };

        let node_ptr = allocate_node(&mut writer.pages, hash, bytes, next)?;

        if prev == 0 {
            head.store(node_ptr.as_ptr() as usize, Ordering::Release);
        } else {
            let prev_node = prev as *const NodeHeader;
            unsafe {
                (*prev_node).next.store(node_ptr.as_ptr() as usize, Ordering::Release);
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);

        Ok(unsafe { Handle::from_node(node_ptr) })
    }

    fn init_segment0(&self) -> Result<(), Error> {
        let segment = Segment::new(0, 0, self.config.initial_buckets, 0);
        self.array.publish(segment);
        log::debug!("installed segment 0 with {} buckets", self.config.initial_buckets);
        Ok(())
    }

    /// Doubles the table by installing a new segment. Every old bucket `i`
    /// splits into `i` (unchanged) and `i + T_old` (newly headed). No node
    /// moves; the new head just points further into the existing list.
    fn grow(&self, current: &Segment) -> Result<(), Error> {
        if current.index + 1 >= self.config.max_segments {
            log::warn!(
                "dictionary reached max_segments ({}); load factor will keep climbing",
                self.config.max_segments
            );
            return Ok(());
        }

        let t_old = current.table_size;
        let t_new = t_old * 2;
        let new_segment = Segment::new(
            current.index + 1,
            t_old,
            t_new,
            current as *const Segment as usize,
        );

        for i in 0..t_old {
            let old_head = self.array.locate(current, i).load(Ordering::Acquire);
            let split = find_split_point(old_head, t_old, t_new, i, i + t_old);
            new_segment.heads[i].store(split, Ordering::Relaxed);
        }

        log::debug!("growing dictionary from {} to {} buckets", t_old, t_new);
        self.array.publish(new_segment);
        Ok(())
    }

    /// Forward iterator over every interned string, in split-ordered order.
    pub fn iter(&self) -> crate::iter::Iter<'_> {
        crate::iter::Iter::new(self)
    }

    pub(crate) fn segmented_array(&self) -> &SegmentedArray {
        &self.array
    }
}

/// Finds the first node in old bucket `old_bucket`'s run whose hash, taken
/// modulo the *doubled* table size, lands in `target_bucket`
/// (`old_bucket + T_old`) — i.e. the point where the old bucket's
/// contiguous run splits in two. Stops as soon as the walk leaves
/// `old_bucket`'s own span (`hash mod t_old != old_bucket`), so a growth
/// step costs one bounded scan per old bucket rather than risking a walk
/// into the rest of the list.
fn find_split_point(
    old_head: usize,
    t_old: usize,
    t_new: usize,
    old_bucket: usize,
    target_bucket: usize,
) -> usize {
    let mut cursor = old_head;
    while cursor != 0 {
        let node = cursor as *const NodeHeader;
        let hash = unsafe { (*node).hash } as usize;
        if hash % t_old != old_bucket {
            return 0;
        }
        if hash % t_new == target_bucket {
            return cursor;
        }
        cursor = unsafe { (*node).next.load(Ordering::Acquire) };
    }
    0
}

enum BucketWalk {
    Found(usize),
    NotFound { prev: usize, next: usize },
}

/// Walks the bucket-`b` run of the split-ordered list looking for `bytes`,
/// stopping as soon as bit-reversed order proves it can't be further down
/// the list (either a strictly larger reversed hash, or a node whose
/// `hash mod t != b`, meaning the list has crossed into the next bucket).
///
/// `prev`/`next` (the raw node pointers bracketing where `bytes` would be
/// spliced in, `0` meaning "the bucket head") are only meaningful on
/// `NotFound`, but are cheap to compute alongside the search so the
/// insertion path doesn't need a second traversal.
fn locate_in_bucket(head: usize, hash: u32, bytes: &[u8], t: usize, b: usize) -> BucketWalk {
    let target_rev = hash.reverse_bits();
    let mut prev = 0usize;
    let mut cursor = head;
    loop {
        if cursor == 0 {
            return BucketWalk::NotFound { prev, next: 0 };
        }
        let node = cursor as *const NodeHeader;
        let node_hash = unsafe { (*node).hash };
        if (node_hash as usize) % t != b {
            return BucketWalk::NotFound { prev, next: cursor };
        }
        let node_rev = node_hash.reverse_bits();
        if node_rev > target_rev {
            return BucketWalk::NotFound { prev, next: cursor };
        }
        if node_rev == target_rev && unsafe { NodeHeader::bytes(node) } == bytes {
            return BucketWalk::Found(cursor);
        }
        prev = cursor;
        cursor = unsafe { (*node).next.load(Ordering::Acquire) };
    }
}

/// Bump-allocates a node from `pages`, writes its content in full, and
/// returns it *unlinked* — the caller splices it into the list afterward
/// via a release-store.
fn allocate_node(
    pages: &mut PageAllocator,
    hash: u32,
    bytes: &[u8],
    next: usize,
) -> Result<NonNull<NodeHeader>, Error> {
    let total = NodeHeader::total_size(bytes.len());
    let raw = pages.allocate(total, core::mem::align_of::<usize>())?;
    let header = raw.as_ptr() as *mut NodeHeader;
    unsafe {
        header.write(NodeHeader {
            hash,
            size: bytes.len() as u32,
            next: AtomicUsize::new(next),
        });
        let data = NodeHeader::data_ptr(header) as *mut u8;
        core::ptr::copy_nonoverlapping(bytes.as_ptr(), data, bytes.len());
        data.add(bytes.len()).write(0); // trailing NUL
    }
    Ok(unsafe { NonNull::new_unchecked(header) })
}

fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.finish() as u32
}

static_assertions::const_assert!(HEADER_SIZE > 0);

/// So that `Handle::empty()` and an (impossible) lookup of the empty byte
/// string agree on the same pointer.
pub(crate) fn empty_handle_data() -> *const u8 {
    empty_data_ptr()
}
