//! Identifier generation strategies (spec §3, §6 `identifier_supplier`).
//!
//! The gateway correlates a response frame to the notification that
//! triggered it purely by this 32-bit identifier, so a supplier that collides
//! within a single session's lifetime will confuse the response observer.
//! The spec does not mandate uniqueness (§9, open question); both suppliers
//! below are provided so callers can pick.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::RngCore;

/// Generates the 32-bit identifier assigned to a notification at enqueue
/// time.
pub trait IdentifierSupplier: Send + Sync {
    /// Produce the next identifier. May be called concurrently by multiple
    /// producer threads.
    fn next_identifier(&self) -> u32;
}

/// Default supplier: a uniformly random 32-bit integer per call.
///
/// Collides at a birthday bound of roughly 65 000 frames in flight at once;
/// acceptable for the base spec, which does not require uniqueness. Prefer
/// [`MonotonicIdentifierSupplier`] for workloads sensitive to response
/// mis-correlation under heavy concurrent enqueue.
#[derive(Debug, Default)]
pub struct RandomIdentifierSupplier;

impl IdentifierSupplier for RandomIdentifierSupplier {
    fn next_identifier(&self) -> u32 {
        rand::thread_rng().next_u32()
    }
}

/// Alternative supplier: a monotonically increasing counter, starting from
/// an arbitrary seed.
///
/// Wraps on overflow (`u32::MAX` successors wrap to `0`); does not repeat
/// within a session's practical lifetime.
#[derive(Debug)]
pub struct MonotonicIdentifierSupplier {
    next: AtomicU32,
}

impl MonotonicIdentifierSupplier {
    /// Start the counter at `seed`.
    #[must_use]
    pub fn starting_at(seed: u32) -> Self {
        Self { next: AtomicU32::new(seed) }
    }
}

impl Default for MonotonicIdentifierSupplier {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

impl IdentifierSupplier for MonotonicIdentifierSupplier {
    fn next_identifier(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
