//! Failure modes of the dictionary.

use core::fmt;

/// Everything that can go wrong when talking to a [`Dictionary`](crate::Dictionary).
///
/// There is no variant for "not found": lookups cannot fail, and a miss is
/// represented as an insertion attempt, which may itself fail with one of
/// the variants below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested byte string is larger than `max_string_size`.
    TooLarge {
        /// Length of the string the caller tried to intern.
        requested: usize,
        /// The largest string size the dictionary will accept.
        max: usize,
    },
    /// The underlying page or segment allocator refused a request.
    OutOfMemory,
    /// A [`Config`](crate::Config) passed to [`Dictionary::with_config`](crate::Dictionary::with_config)
    /// was not internally consistent.
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooLarge { requested, max } => write!(
                f,
                "string of {} bytes exceeds the maximum interned string size of {} bytes",
                requested, max
            ),
            Error::OutOfMemory => write!(f, "allocator refused to grow the dictionary"),
            Error::InvalidConfig(reason) => write!(f, "invalid dictionary configuration: {}", reason),
        }
    }
}

impl std::error::Error for Error {}
