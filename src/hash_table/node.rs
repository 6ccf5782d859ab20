//! Node (C2): an immutable record carrying a string's hash, length, and
//! bytes, threaded into the split-ordered list via an atomic `next` link.
//!
//! A node is written in full *before* it is published (spliced into the
//! list or made a bucket head); after that, only `next` ever changes, and
//! only via a release-store. Readers reach a node only through an
//! acquire-load on some published pointer, so a reader that sees the
//! pointer also sees the fully-written `hash`/`size`/bytes.

use core::mem::size_of;
use core::slice;

use crate::sync::{AtomicUsize, Ordering};

/// Fixed-size part of a node, immediately followed in memory by `size + 1`
/// bytes (the string content plus a trailing NUL).
#[repr(C)]
pub(crate) struct NodeHeader {
    pub(crate) hash: u32,
    pub(crate) size: u32,
    pub(crate) next: AtomicUsize,
}

/// Size of [`NodeHeader`], used to derive `max_string_size`
/// and to step from a header pointer to its trailing byte payload.
pub(crate) const HEADER_SIZE: usize = size_of::<NodeHeader>();

static_assertions::const_assert!(HEADER_SIZE >= 8);

impl NodeHeader {
    /// Total bytes a node with the given content length occupies, header
    /// included.
    pub(crate) fn total_size(content_len: usize) -> usize {
        HEADER_SIZE + content_len + 1
    }

    /// Pointer to the first content byte, immediately after the header.
    ///
    /// # Safety
    /// `header` must point at a live, fully-initialized `NodeHeader`.
    pub(crate) unsafe fn data_ptr(header: *const NodeHeader) -> *const u8 {
        (header as *const u8).add(HEADER_SIZE)
    }

    /// # Safety
    /// `header` must point at a live, fully-initialized `NodeHeader` whose
    /// trailing payload is at least `size` bytes.
    pub(crate) unsafe fn bytes<'a>(header: *const NodeHeader) -> &'a [u8] {
        let header_ref = &*header;
        slice::from_raw_parts(Self::data_ptr(header), header_ref.size as usize)
    }
}

/// The single statically allocated empty node: `size=0`,
/// `hash=0`, one trailing NUL byte. It is never linked into any bucket;
/// it only ever serves as the target of default-constructed handles.
#[repr(C)]
struct EmptySentinel {
    header: NodeHeader,
    byte: u8,
}

lazy_static::lazy_static! {
    static ref EMPTY_SENTINEL: EmptySentinel = EmptySentinel {
        header: NodeHeader {
            hash: 0,
            size: 0,
            next: AtomicUsize::new(0),
        },
        byte: 0,
    };
}

/// Pointer to the empty sentinel's (single, NUL) content byte.
pub(crate) fn empty_data_ptr() -> *const u8 {
    &EMPTY_SENTINEL.byte as *const u8
}

#[cfg(test)]
pub(crate) fn is_empty_sentinel(data: *const u8) -> bool {
    core::ptr::eq(data, empty_data_ptr())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentinel_has_zero_size_and_trailing_nul() {
        let ptr = empty_data_ptr();
        assert!(is_empty_sentinel(ptr));
        unsafe {
            assert_eq!(*ptr, 0);
        }
        let header = unsafe { &*(ptr.sub(HEADER_SIZE) as *const NodeHeader) };
        assert_eq!(header.size, 0);
        assert_eq!(header.hash, 0);
    }

    #[test]
    fn total_size_accounts_for_header_and_trailing_nul() {
        assert_eq!(NodeHeader::total_size(3), HEADER_SIZE + 4);
    }
}
