//! Package cache collaborator.
//!
//! The cache is an external data source: it owns the package universe and
//! the pending-action state used for upgrade enumeration. Queries treat it
//! as read-only except for `plan_upgrades`, which only touches the
//! pending-action markers.

mod snapshot;

use crate::error::QueryError;
use crate::package::PackageInstance;

pub use snapshot::SnapshotCache;

/// Progress callback invoked with a 0..=100 percentage while a cache is
/// being opened.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u32);

#[cfg_attr(test, mockall::automock)]
pub trait Cache: Send + Sync {
    /// Every package in the snapshot, in the cache's own iteration order.
    /// The order is stable for the cache's lifetime but otherwise
    /// implementation-defined.
    fn packages(&self) -> Vec<PackageInstance>;

    /// Look up one package by exact name.
    fn lookup(&self, name: &str) -> Option<PackageInstance>;

    /// Run a would-upgrade resolution pass: mark every package that an
    /// upgrade would change, without downloading or applying anything.
    /// Only the internal pending-action state is mutated.
    fn plan_upgrades(&mut self) -> Result<(), QueryError>;

    /// Packages marked for action by the last `plan_upgrades` call.
    fn changed_set(&self) -> Vec<PackageInstance>;
}
