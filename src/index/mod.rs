//! Full-text index collaborator.
//!
//! The index is an external ranked-search component kept separately from the
//! live package cache, so it can lag behind it. Document keys it returns are
//! package names; the session resolves them against the cache and drops the
//! stale ones.

mod memory;
mod query;

use crate::error::QueryError;

pub use memory::MemoryIndex;
pub use query::{TermWeight, TextQuery, parse_query};

#[cfg_attr(test, mockall::automock)]
pub trait Index: Send {
    /// Re-open the index to observe its latest committed generation.
    /// Details searches call this before querying; staleness of the index
    /// handle itself is not acceptable on that path.
    fn reopen(&mut self) -> Result<(), QueryError>;

    /// Evaluate a parsed query and return up to `limit` document keys,
    /// ordered by descending relevance. Ties are broken by the index's own
    /// internal ordering, which callers must treat as opaque.
    fn query(&self, query: &TextQuery, limit: usize) -> Result<Vec<String>, QueryError>;
}
