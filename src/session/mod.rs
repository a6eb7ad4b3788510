//! Query session: the dispatcher that runs one query at a time against
//! session-scoped cache and index handles.
//!
//! A session owns its collaborators for its whole lifetime; nothing is
//! shared across sessions, so concurrent sessions never touch each other's
//! state. Each operation runs to completion, checks the cancellation flag
//! between candidate evaluations, and terminates with exactly one
//! `on_finished` signal no matter how it went.

mod emit;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cache::Cache;
use crate::error::{Outcome, QueryError};
use crate::filter::FilterSet;
use crate::index::{Index, parse_query};
use crate::package::PackageId;
use crate::text::normalize_description;

pub use emit::{Emitter, ResultStatus, emit_package, package_id};

/// Maximum number of ranked matches requested from the index per details
/// search.
pub const DETAILS_MATCH_LIMIT: usize = 1000;

/// Group and license are not tracked by the cache; describe reports them
/// as this placeholder.
const UNKNOWN_FIELD: &str = "unknown";

/// Shared cooperative cancellation flag.
///
/// The owner of a session hands clones to whoever may cancel the running
/// query; the session checks it between candidate evaluations, never
/// mid-candidate.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One query worker over session-scoped collaborator handles.
pub struct QuerySession<C, I, E> {
    cache: C,
    index: I,
    emitter: E,
    cancel: CancelFlag,
}

impl<C: Cache, I: Index, E: Emitter> QuerySession<C, I, E> {
    pub fn new(cache: C, index: I, emitter: E) -> Self {
        QuerySession {
            cache,
            index,
            emitter,
            cancel: CancelFlag::new(),
        }
    }

    /// A clone of the session's cancellation flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Release the session's handles.
    pub fn into_parts(self) -> (C, I, E) {
        (self.cache, self.index, self.emitter)
    }

    /// Scan the package set for names containing `term` (case-sensitive)
    /// and emit every visible match. Emission follows the cache's own
    /// iteration order, which is implementation-defined.
    #[tracing::instrument(skip(self, filters))]
    pub async fn search_by_name(&mut self, filters: &FilterSet, term: &str) -> Outcome {
        log::info!("Searching for package name: {}", term);
        let result = self.run_search_by_name(filters, term).await;
        self.finish(result).await
    }

    async fn run_search_by_name(
        &mut self,
        filters: &FilterSet,
        term: &str,
    ) -> Result<Outcome, QueryError> {
        for pkg in self.cache.packages() {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            if pkg.name.contains(term) && filters.is_visible(&pkg) {
                emit_package(&mut self.emitter, &pkg, false).await?;
            }
        }
        Ok(Outcome::Success)
    }

    /// Run a ranked full-text search and emit every visible match in
    /// descending relevance order. The index handle is re-opened first so
    /// the query observes the latest committed index generation; matches
    /// naming packages absent from the cache are stale and dropped.
    ///
    /// Filters are applied on this path exactly as on the name path.
    #[tracing::instrument(skip(self, filters))]
    pub async fn search_by_details(&mut self, filters: &FilterSet, text: &str) -> Outcome {
        log::info!("Searching package details: {}", text);
        let result = self.run_search_by_details(filters, text).await;
        self.finish(result).await
    }

    async fn run_search_by_details(
        &mut self,
        filters: &FilterSet,
        text: &str,
    ) -> Result<Outcome, QueryError> {
        self.index.reopen()?;
        let query = parse_query(text);
        let keys = self.index.query(&query, DETAILS_MATCH_LIMIT)?;
        for name in keys {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            match self.cache.lookup(&name) {
                None => {
                    // Stale index entry; recovered locally, never surfaced.
                    log::debug!("Dropping stale index entry {:?}", name);
                }
                Some(pkg) => {
                    if filters.is_visible(&pkg) {
                        emit_package(&mut self.emitter, &pkg, false).await?;
                    }
                }
            }
        }
        Ok(Outcome::Success)
    }

    /// Plan a would-upgrade pass and emit every package it marked.
    /// Visibility filters never apply here.
    #[tracing::instrument(skip(self))]
    pub async fn list_upgrades(&mut self) -> Outcome {
        log::info!("Listing pending upgrades");
        let result = self.run_list_upgrades().await;
        self.finish(result).await
    }

    async fn run_list_upgrades(&mut self) -> Result<Outcome, QueryError> {
        self.cache.plan_upgrades()?;
        for pkg in self.cache.changed_set() {
            if self.cancel.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            emit_package(&mut self.emitter, &pkg, false).await?;
        }
        Ok(Outcome::Success)
    }

    /// Resolve a package id to human-readable metadata and emit exactly one
    /// description record.
    #[tracing::instrument(skip(self))]
    pub async fn describe(&mut self, id_token: &str) -> Outcome {
        log::info!("Describing package id: {}", id_token);
        let result = self.run_describe(id_token).await;
        self.finish(result).await
    }

    async fn run_describe(&mut self, id_token: &str) -> Result<Outcome, QueryError> {
        let id: PackageId = id_token.parse()?;
        let pkg = self
            .cache
            .lookup(&id.name)
            .ok_or_else(|| QueryError::PackageNotFound(id.name.clone()))?;

        let description = normalize_description(&pkg.description);
        let homepage = pkg.homepage.clone().unwrap_or_default();
        self.emitter
            .on_description(
                &id,
                UNKNOWN_FIELD,
                UNKNOWN_FIELD,
                &description,
                &homepage,
                pkg.size,
            )
            .await;
        Ok(Outcome::Success)
    }

    /// Report the operation's outcome: at most one error signal, then the
    /// single terminating finished signal.
    async fn finish(&mut self, result: Result<Outcome, QueryError>) -> Outcome {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("Query failed: {}", err);
                self.emitter.on_error(err.kind(), &err.to_string()).await;
                Outcome::Failed
            }
        };
        self.emitter.on_finished(outcome).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockCache;
    use crate::error::ErrorKind;
    use crate::index::MockIndex;
    use crate::package::PackageInstance;
    use crate::session::emit::MockEmitter;
    use mockall::Sequence;
    use mockall::predicate::{always, eq};

    fn pkg(name: &str, installed: bool) -> PackageInstance {
        PackageInstance {
            name: name.into(),
            installed_version: installed.then(|| "1.0".into()),
            candidate_version: "2.0".into(),
            architecture: "amd64".into(),
            is_installed: installed,
            section: "editors".into(),
            summary: format!("{} summary", name),
            ..Default::default()
        }
    }

    fn editor_cache() -> MockCache {
        let mut cache = MockCache::new();
        cache
            .expect_packages()
            .returning(|| vec![pkg("vim", true), pkg("vim-tiny", false), pkg("emacs", true)]);
        cache
    }

    fn session(
        cache: MockCache,
        index: MockIndex,
        emitter: MockEmitter,
    ) -> QuerySession<MockCache, MockIndex, MockEmitter> {
        QuerySession::new(cache, index, emitter)
    }

    #[tokio::test]
    async fn test_search_by_name_substring_match() {
        let mut emitter = MockEmitter::new();
        let mut seen = Sequence::new();
        for name in ["vim", "vim-tiny"] {
            emitter
                .expect_on_result()
                .withf(move |status, _, summary| {
                    *status == ResultStatus::Available && summary == format!("{} summary", name)
                })
                .times(1)
                .in_sequence(&mut seen)
                .returning(|_, _, _| ());
        }
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(editor_cache(), MockIndex::new(), emitter);
        let outcome = session.search_by_name(&FilterSet::none(), "vim").await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_search_by_name_is_case_sensitive() {
        let mut emitter = MockEmitter::new();
        emitter.expect_on_result().times(0);
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(editor_cache(), MockIndex::new(), emitter);
        session.search_by_name(&FilterSet::none(), "VIM").await;
    }

    #[tokio::test]
    async fn test_search_by_name_applies_filters() {
        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_result()
            .withf(|_, _, summary| summary == "vim summary")
            .times(1)
            .returning(|_, _, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(editor_cache(), MockIndex::new(), emitter);
        let outcome = session
            .search_by_name(&FilterSet::parse("installed"), "vim")
            .await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_search_by_name_cancellation() {
        let mut emitter = MockEmitter::new();
        emitter.expect_on_result().times(0);
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Cancelled))
            .times(1)
            .returning(|_| ());

        let mut session = session(editor_cache(), MockIndex::new(), emitter);
        session.cancel_flag().cancel();
        let outcome = session.search_by_name(&FilterSet::none(), "vim").await;
        assert_eq!(outcome, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn test_search_by_details_reopens_then_queries() {
        let mut index = MockIndex::new();
        let mut order = Sequence::new();
        index
            .expect_reopen()
            .times(1)
            .in_sequence(&mut order)
            .returning(|| Ok(()));
        index
            .expect_query()
            .withf(|_, limit| *limit == DETAILS_MATCH_LIMIT)
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _| Ok(vec!["emacs".into(), "vim".into()]));

        let mut cache = MockCache::new();
        cache
            .expect_lookup()
            .returning(|name| Some(pkg(name, false)));

        let mut emitter = MockEmitter::new();
        let mut seen = Sequence::new();
        // Rank order from the index is preserved.
        for name in ["emacs", "vim"] {
            emitter
                .expect_on_result()
                .withf(move |_, _, summary| summary == format!("{} summary", name))
                .times(1)
                .in_sequence(&mut seen)
                .returning(|_, _, _| ());
        }
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, index, emitter);
        let outcome = session
            .search_by_details(&FilterSet::none(), "editor")
            .await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_search_by_details_drops_stale_entries() {
        let mut index = MockIndex::new();
        index.expect_reopen().returning(|| Ok(()));
        index
            .expect_query()
            .returning(|_, _| Ok(vec!["gone".into(), "vim".into()]));

        let mut cache = MockCache::new();
        cache.expect_lookup().with(eq("gone")).returning(|_| None);
        cache
            .expect_lookup()
            .with(eq("vim"))
            .returning(|name| Some(pkg(name, false)));

        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_result()
            .withf(|_, _, summary| summary == "vim summary")
            .times(1)
            .returning(|_, _, _| ());
        emitter.expect_on_error().times(0);
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, index, emitter);
        let outcome = session
            .search_by_details(&FilterSet::none(), "editor")
            .await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_search_by_details_applies_filters() {
        let mut index = MockIndex::new();
        index.expect_reopen().returning(|| Ok(()));
        index
            .expect_query()
            .returning(|_, _| Ok(vec!["vim".into(), "vim-tiny".into()]));

        let mut cache = MockCache::new();
        cache
            .expect_lookup()
            .returning(|name| Some(pkg(name, name == "vim")));

        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_result()
            .withf(|_, _, summary| summary == "vim summary")
            .times(1)
            .returning(|_, _, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, index, emitter);
        session
            .search_by_details(&FilterSet::parse("installed"), "editor")
            .await;
    }

    #[tokio::test]
    async fn test_list_upgrades_ignores_filters_and_emits_all() {
        let mut cache = MockCache::new();
        let mut order = Sequence::new();
        cache
            .expect_plan_upgrades()
            .times(1)
            .in_sequence(&mut order)
            .returning(|| Ok(()));
        cache
            .expect_changed_set()
            .times(1)
            .in_sequence(&mut order)
            .returning(|| vec![pkg("vim", true), pkg("libfoo-dev", true)]);

        let mut emitter = MockEmitter::new();
        emitter.expect_on_result().times(2).returning(|_, _, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, MockIndex::new(), emitter);
        let outcome = session.list_upgrades().await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_list_upgrades_surfaces_media_change() {
        let mut cache = MockCache::new();
        cache
            .expect_plan_upgrades()
            .returning(|| Err(QueryError::MediaChange("insert installation medium".into())));

        let mut emitter = MockEmitter::new();
        emitter.expect_on_result().times(0);
        emitter
            .expect_on_error()
            .with(eq(ErrorKind::MediaChange), always())
            .times(1)
            .returning(|_, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Failed))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, MockIndex::new(), emitter);
        let outcome = session.list_upgrades().await;
        assert_eq!(outcome, Outcome::Failed);
    }

    #[tokio::test]
    async fn test_describe_emits_one_description() {
        let mut cache = MockCache::new();
        cache.expect_lookup().with(eq("vim")).returning(|_| {
            Some(PackageInstance {
                description: "Summary line\nFoo bar.\n* item one\n  item two".into(),
                homepage: Some("https://www.vim.org".into()),
                size: 2048,
                ..pkg("vim", true)
            })
        });

        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_description()
            .withf(|id, group, license, description, homepage, size| {
                id.to_string() == "vim;1.0;amd64;"
                    && group == "unknown"
                    && license == "unknown"
                    && description == "Foo bar.\n* item one\nitem two"
                    && homepage == "https://www.vim.org"
                    && *size == 2048
            })
            .times(1)
            .returning(|_, _, _, _, _, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, MockIndex::new(), emitter);
        let outcome = session.describe("vim;1.0;amd64;").await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_describe_missing_homepage_is_empty() {
        let mut cache = MockCache::new();
        cache
            .expect_lookup()
            .returning(|name| Some(pkg(name, false)));

        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_description()
            .withf(|_, _, _, _, homepage, _| homepage.is_empty())
            .times(1)
            .returning(|_, _, _, _, _, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Success))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, MockIndex::new(), emitter);
        session.describe("vim;2.0;amd64;").await;
    }

    #[tokio::test]
    async fn test_describe_malformed_id_fails_with_terminating_signal() {
        let mut emitter = MockEmitter::new();
        emitter.expect_on_description().times(0);
        emitter
            .expect_on_error()
            .with(eq(ErrorKind::MalformedIdentity), always())
            .times(1)
            .returning(|_, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Failed))
            .times(1)
            .returning(|_| ());

        let mut session = session(MockCache::new(), MockIndex::new(), emitter);
        let outcome = session.describe("not-enough-fields").await;
        assert_eq!(outcome, Outcome::Failed);
    }

    #[tokio::test]
    async fn test_describe_unknown_package_fails() {
        let mut cache = MockCache::new();
        cache.expect_lookup().returning(|_| None);

        let mut emitter = MockEmitter::new();
        emitter
            .expect_on_error()
            .with(eq(ErrorKind::PackageNotFound), always())
            .times(1)
            .returning(|_, _| ());
        emitter
            .expect_on_finished()
            .with(eq(Outcome::Failed))
            .times(1)
            .returning(|_| ());

        let mut session = session(cache, MockIndex::new(), emitter);
        let outcome = session.describe("ghost;1.0;amd64;").await;
        assert_eq!(outcome, Outcome::Failed);
    }
}
