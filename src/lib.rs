//! `dictstring`: a concurrent interning dictionary for short byte strings.
//!
//! Interning maps equal byte sequences to a single canonical, address-stable
//! [`Handle`]: once [`Dictionary::intern`] returns a handle for some bytes,
//! the bytes behind it never move and never change for as long as the
//! dictionary lives, so two handles for equal content compare equal by
//! pointer and hash in O(1).
//!
//! The engine underneath is a split-ordered lock-free hash table: reads walk
//! a single global linked list (ordered by bit-reversed hash, so every
//! bucket is a contiguous run of it) using only atomic loads and never
//! block; writes are serialized by one mutex per dictionary and splice new
//! nodes into the list or double the bucket count without ever moving an
//! existing node. See `hash_table` for the implementation and `DESIGN.md`
//! in the repository root for how each piece is grounded.
//!
//! ```
//! use dictstring::Dictionary;
//!
//! let dict = Dictionary::new();
//! let a = dict.intern(b"hello").unwrap();
//! let b = dict.intern(b"hello").unwrap();
//! assert_eq!(a.data(), b.data());
//! assert_eq!(a.size(), 5);
//! ```

mod config;
mod error;
mod handle;
mod hash_table;
mod iter;
pub(crate) mod sync;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::Error;
pub use handle::Handle;
pub use hash_table::Dictionary;
pub use iter::Iter;

lazy_static::lazy_static! {
    static ref GLOBAL: Dictionary = Dictionary::new();
}

/// The process-wide dictionary, lazily initialized on first use and torn
/// down (along with every string ever interned into it) at process exit.
///
/// [`Handle::new`] interns into this dictionary; most callers never need to
/// name it directly and can build dictionary-scoped handles via
/// [`Handle::from_dictionary`] instead when a private dictionary is wanted.
pub fn global() -> &'static Dictionary {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_is_a_single_shared_instance() {
        let a = Handle::new(b"shared").unwrap();
        let b = global().intern(b"shared").unwrap();
        assert_eq!(a.data(), b.data());
    }
}
