//! Debounced, sequence-checked asynchronous search.
//!
//! [`SearchCoordinator`] turns a stream of keystrokes into at most one
//! accepted result set per settled pause:
//!
//! ```text
//! Idle --input--> Pending --debounce elapsed--> Fetching --resolve--> Resolved | Failed
//!   ^                                                                      |
//!   +------------------------------ input cleared ------------------------+
//! ```
//!
//! Two counters keep stale work out:
//!
//! - every input bumps the **generation**; a debounce timer carries the
//!   generation it was started for and is ignored if a newer one exists;
//! - every fetch gets the next **sequence number**; a response is applied only
//!   if its sequence is the one currently in flight.
//!
//! Neither timers nor fetches are cancelled. They still run to completion,
//! and whatever they deliver after being superseded is dropped on arrival.

use crate::command::Command;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A failed fetch. Surfaced as a flag next to an empty result set, never
/// propagated out of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("search failed: {message}")]
pub struct SearchError {
    message: String,
}

impl SearchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Caller-supplied asynchronous search.
pub trait SearchSource<T>: Send + Sync + 'static {
    /// Start a search for `term`. The returned future must not borrow `self`.
    fn search(&self, term: &str) -> BoxFuture<'static, Result<Vec<T>, SearchError>>;
}

/// [`SearchSource`] backed by a closure.
pub struct SearchFn<F>(F);

/// Wrap an async closure as a [`SearchSource`].
///
/// ```rust,ignore
/// let source = search_fn(|term: String| async move {
///     api.lookup(&term).await.map_err(|e| SearchError::new(e.to_string()))
/// });
/// ```
pub fn search_fn<T, F, Fut>(f: F) -> SearchFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, SearchError>> + Send + 'static,
{
    SearchFn(f)
}

impl<T, F, Fut> SearchSource<T> for SearchFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<T>, SearchError>> + Send + 'static,
{
    fn search(&self, term: &str) -> BoxFuture<'static, Result<Vec<T>, SearchError>> {
        Box::pin((self.0)(term.to_owned()))
    }
}

/// Tuning for a [`SearchCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a fetch is issued.
    pub debounce: Duration,
    /// Terms shorter than this (in characters) resolve to no results
    /// without fetching.
    pub min_term_len: usize,
    /// Cap on applied results. `None` keeps everything the source returns.
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_term_len: 1,
            max_results: None,
        }
    }
}

impl SearchConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_min_term_len(mut self, len: usize) -> Self {
        self.min_term_len = len;
        self
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

/// Where the coordinator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// No term, nothing scheduled.
    Idle,
    /// Waiting for the debounce window to elapse.
    Pending,
    /// A fetch is in flight.
    Fetching,
    /// The latest fetch resolved and its results are applied.
    Resolved,
    /// The latest fetch failed; results are empty and [`SearchCoordinator::error`] is set.
    Failed,
}

/// Messages the coordinator schedules for itself.
///
/// The owning component wraps these in its own message type and hands them
/// back to [`SearchCoordinator::update`].
#[derive(Debug, Clone)]
pub enum SearchMessage<T> {
    /// A debounce timer fired.
    DebounceElapsed { generation: u64 },
    /// A fetch finished.
    Resolved {
        seq: u64,
        result: Result<Vec<T>, SearchError>,
    },
}

/// Debounce + stale-response filter around a [`SearchSource`].
pub struct SearchCoordinator<T> {
    source: Arc<dyn SearchSource<T>>,
    config: SearchConfig,
    term: String,
    results: Vec<T>,
    status: SearchStatus,
    error: Option<SearchError>,
    generation: u64,
    last_seq: u64,
    in_flight: Option<u64>,
    mounted: bool,
}

impl<T: Send + 'static> SearchCoordinator<T> {
    pub fn new(source: impl SearchSource<T>) -> Self {
        Self::from_arc(Arc::new(source))
    }

    /// Share one source between several coordinators.
    pub fn from_arc(source: Arc<dyn SearchSource<T>>) -> Self {
        Self {
            source,
            config: SearchConfig::default(),
            term: String::new(),
            results: Vec::new(),
            status: SearchStatus::Idle,
            error: None,
            generation: 0,
            last_seq: 0,
            in_flight: None,
            mounted: true,
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The current input term. Updated synchronously on every input.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The applied result set.
    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// True while waiting on the debounce window or a fetch.
    pub fn is_pending(&self) -> bool {
        matches!(self.status, SearchStatus::Pending | SearchStatus::Fetching)
    }

    /// The failure of the latest fetch, if it failed.
    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    /// Sequence number of the fetch whose result would currently be accepted.
    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Record a new term and (re)start the debounce window.
    pub fn input(&mut self, term: impl Into<String>) -> Command<SearchMessage<T>> {
        self.term = term.into();
        self.generation += 1;
        self.in_flight = None;

        if !self.mounted {
            return Command::none();
        }

        if self.term.is_empty() {
            self.results.clear();
            self.error = None;
            self.status = SearchStatus::Idle;
            return Command::none();
        }

        self.status = SearchStatus::Pending;
        let generation = self.generation;
        Command::tick(self.config.debounce, move |_| SearchMessage::DebounceElapsed {
            generation,
        })
    }

    /// Drop the term and any applied results.
    pub fn clear(&mut self) -> Command<SearchMessage<T>> {
        self.input(String::new())
    }

    /// Handle a timer or fetch completion.
    pub fn update(&mut self, msg: SearchMessage<T>) -> Command<SearchMessage<T>> {
        match msg {
            SearchMessage::DebounceElapsed { generation } => self.debounce_elapsed(generation),
            SearchMessage::Resolved { seq, result } => {
                self.resolve(seq, result);
                Command::none()
            }
        }
    }

    /// Invalidate everything scheduled so far. Results delivered afterwards
    /// are discarded and further input schedules nothing.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.generation += 1;
        self.in_flight = None;
    }

    fn debounce_elapsed(&mut self, generation: u64) -> Command<SearchMessage<T>> {
        if !self.mounted || generation != self.generation {
            tracing::trace!(generation, current = self.generation, "superseded debounce timer");
            return Command::none();
        }

        if self.term.chars().count() < self.config.min_term_len {
            self.results.clear();
            self.error = None;
            self.status = SearchStatus::Resolved;
            return Command::none();
        }

        self.last_seq += 1;
        let seq = self.last_seq;
        self.in_flight = Some(seq);
        self.status = SearchStatus::Fetching;
        tracing::debug!(seq, term = %self.term, "issuing search");

        let fetch = self.source.search(&self.term);
        Command::perform(fetch, move |result| SearchMessage::Resolved { seq, result })
    }

    fn resolve(&mut self, seq: u64, result: Result<Vec<T>, SearchError>) {
        if !self.mounted || self.in_flight != Some(seq) {
            tracing::debug!(seq, in_flight = ?self.in_flight, "discarding stale search response");
            return;
        }
        self.in_flight = None;

        match result {
            Ok(mut items) => {
                if let Some(max) = self.config.max_results {
                    items.truncate(max);
                }
                self.results = items;
                self.error = None;
                self.status = SearchStatus::Resolved;
            }
            Err(err) => {
                tracing::warn!(seq, error = %err, "search fetch failed");
                self.results.clear();
                self.error = Some(err);
                self.status = SearchStatus::Failed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_source(calls: Arc<AtomicUsize>) -> impl SearchSource<String> {
        search_fn(move |term: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(vec![term]) }
        })
    }

    #[tokio::test]
    async fn rapid_inputs_issue_one_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut search = SearchCoordinator::new(counting_source(calls.clone()));

        // Generations are handed out sequentially, starting at 1.
        assert!(search.input("a").is_async());
        assert!(search.input("ab").is_async());
        assert!(search.input("abc").is_async());
        assert_eq!(search.status(), SearchStatus::Pending);
        assert_eq!(search.term(), "abc");

        assert!(search
            .update(SearchMessage::DebounceElapsed { generation: 1 })
            .is_none());
        assert!(search
            .update(SearchMessage::DebounceElapsed { generation: 2 })
            .is_none());
        let fetch = search.update(SearchMessage::DebounceElapsed { generation: 3 });
        assert!(fetch.is_async());
        assert_eq!(search.status(), SearchStatus::Fetching);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn late_response_for_superseded_term_is_discarded() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut search = SearchCoordinator::new(counting_source(calls));

        let _ = search.input("a");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 1 });
        assert_eq!(search.in_flight(), Some(1));

        let _ = search.input("abc");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 2 });
        assert_eq!(search.in_flight(), Some(2));

        search.update(SearchMessage::Resolved {
            seq: 2,
            result: Ok(vec!["abc".into()]),
        });
        assert_eq!(search.results(), ["abc".to_string()]);

        search.update(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec!["a".into()]),
        });
        assert_eq!(search.results(), ["abc".to_string()]);
        assert_eq!(search.status(), SearchStatus::Resolved);
    }

    #[tokio::test]
    async fn new_input_invalidates_in_flight_fetch() {
        let mut search = SearchCoordinator::new(counting_source(Arc::default()));
        let _ = search.input("a");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 1 });
        let _ = search.input("ab");
        assert_eq!(search.in_flight(), None);

        search.update(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec!["a".into()]),
        });
        assert!(search.results().is_empty());
        assert_eq!(search.status(), SearchStatus::Pending);
    }

    #[tokio::test]
    async fn failure_becomes_empty_results_with_error() {
        let mut search = SearchCoordinator::new(counting_source(Arc::default()));
        let _ = search.input("a");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 1 });
        search.update(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec!["a".into()]),
        });

        let _ = search.input("ab");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 2 });
        search.update(SearchMessage::Resolved {
            seq: 2,
            result: Err(SearchError::new("offline")),
        });
        assert!(search.results().is_empty());
        assert_eq!(search.status(), SearchStatus::Failed);
        assert_eq!(search.error().map(SearchError::message), Some("offline"));

        // The next success clears the flag.
        let _ = search.input("abc");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 3 });
        search.update(SearchMessage::Resolved {
            seq: 3,
            result: Ok(vec!["abc".into()]),
        });
        assert!(search.error().is_none());
    }

    #[tokio::test]
    async fn clearing_input_goes_idle() {
        let mut search = SearchCoordinator::new(counting_source(Arc::default()));
        let _ = search.input("a");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 1 });
        search.update(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec!["a".into()]),
        });

        let cmd = search.clear();
        assert!(cmd.is_none());
        assert_eq!(search.status(), SearchStatus::Idle);
        assert!(search.results().is_empty());
    }

    #[tokio::test]
    async fn short_terms_resolve_without_fetching() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut search = SearchCoordinator::new(counting_source(calls.clone()))
            .with_config(SearchConfig::default().with_min_term_len(3));
        let _ = search.input("ab");
        let cmd = search.update(SearchMessage::DebounceElapsed { generation: 1 });
        assert!(cmd.is_none());
        assert_eq!(search.status(), SearchStatus::Resolved);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn max_results_truncates() {
        let mut search = SearchCoordinator::new(counting_source(Arc::default()))
            .with_config(SearchConfig::default().with_max_results(2));
        let _ = search.input("a");
        let _ = search.update(SearchMessage::DebounceElapsed { generation: 1 });
        search.update(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec!["a".into(), "b".into(), "c".into()]),
        });
        assert_eq!(search.results().len(), 2);
    }

    #[tokio::test]
    async fn unmount_discards_everything_pending() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut search = SearchCoordinator::new(counting_source(calls.clone()));
        let _ = search.input("a");
        search.unmount();

        assert!(search
            .update(SearchMessage::DebounceElapsed { generation: 1 })
            .is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        search.update(SearchMessage::Resolved {
            seq: 1,
            result: Ok(vec!["a".into()]),
        });
        assert!(search.results().is_empty());
        assert!(search.input("b").is_none());
    }
}
