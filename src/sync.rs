//! Indirection over the atomics and mutex used by the rest of the crate.
//!
//! Under the `check-loom` feature, every type here comes from `loom` instead
//! of `core`/`std`, so the same production code can be driven under loom's
//! model checker (see `tests/loom.rs`). This mirrors how the original design's
//! `hazard_pointer/retire.rs` switches `fence`/`Ordering` between `core` and
//! `loom` behind the same feature flag.

cfg_if::cfg_if! {
    if #[cfg(feature = "check-loom")] {
        pub(crate) use loom::sync::atomic::{AtomicUsize, Ordering, fence};
        pub(crate) use loom::sync::Mutex;
    } else {
        pub(crate) use core::sync::atomic::{AtomicUsize, Ordering, fence};
        pub(crate) use std::sync::Mutex;
    }
}
