//! Construction-time parameters for a [`Dictionary`](crate::Dictionary).

use crate::error::Error;

/// Tunable sizes behind a [`Dictionary`](crate::Dictionary).
///
/// [`Config::default`] is a 64 KiB chunk size, 8192 initial buckets, and 16
/// segments, so the table can grow to `8192 * 2^15` buckets before growth
/// simply stops. Tests that want to exercise growth or `TooLarge` without
/// multi-megabyte strings can shrink these with [`Dictionary::with_config`](crate::Dictionary::with_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Size in bytes of each page handed out by the page allocator.
    pub chunk_size: usize,
    /// Number of buckets in the first segment. Must be a power of two.
    pub initial_buckets: usize,
    /// Maximum number of segments the bucket array may grow to.
    pub max_segments: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: 65536,
            initial_buckets: 8192,
            max_segments: 16,
        }
    }
}

impl Config {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be non-zero"));
        }
        if self.initial_buckets == 0 || !self.initial_buckets.is_power_of_two() {
            return Err(Error::InvalidConfig("initial_buckets must be a power of two"));
        }
        if self.max_segments == 0 {
            return Err(Error::InvalidConfig("max_segments must be at least 1"));
        }
        let min_chunk_size = crate::hash_table::page::PAGE_HEADER_SIZE
            + crate::hash_table::node::HEADER_SIZE
            + 1;
        if self.chunk_size <= min_chunk_size {
            return Err(Error::InvalidConfig(
                "chunk_size must be larger than a page header, a node header, and a trailing NUL",
            ));
        }
        Ok(())
    }

    /// Largest byte string this configuration will accept:
    /// `chunk_size - page_header - node_header - 1` (the `- 1` leaves room
    /// for the trailing NUL every node stores after its content, per
    /// `NodeHeader::total_size`).
    pub(crate) fn max_string_size(&self) -> usize {
        self.chunk_size
            - crate::hash_table::page::PAGE_HEADER_SIZE
            - crate::hash_table::node::HEADER_SIZE
            - 1
    }
}
