//! DocDB explorer tab
//!
//! Turns the search widgets into a filter, runs it against a
//! [`DocumentStore`] and publishes the result pane state on a watch channel.
//! The most recent submission wins: a response arriving after a newer
//! submission is dropped.

use crate::docdb::client::DocumentStore;
use crate::docdb::filter::{build_filter, DocFilter, PROJECTION, RESULT_LIMIT};
use crate::metrics;
use crate::view::ViewState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Prompt shown while no criteria are entered
pub const WAITING_TEXT: &str = "Enter search criteria above...";

/// Progress text while a query is outstanding
pub const QUERYING_TEXT: &str = "Querying DocDB...";

/// Status text after a successful query
pub const SUCCESS_TEXT: &str = "Query successful";

/// Search widget values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Selected project names
    #[serde(default)]
    pub project_names: Vec<String>,
    /// Subject id text input
    #[serde(default)]
    pub subject_id: String,
}

/// Result pane contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    /// Filter that produced the records
    pub filter: Value,
    /// Projected records, at most [`RESULT_LIMIT`]
    pub records: Vec<Value>,
}

impl SearchResults {
    /// Number of records returned
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// Result pane state
pub type SearchView = ViewState<SearchResults>;

/// Record count line for any pane state
pub fn count_text(view: &SearchView) -> String {
    match view.ready() {
        Some(results) => format!(
            "**Records found:** {} (showing max {})",
            results.count(),
            RESULT_LIMIT
        ),
        None => "**Records found:** 0".to_string(),
    }
}

/// Status line for any pane state
pub fn status_text(view: &SearchView) -> &str {
    view.message().unwrap_or(SUCCESS_TEXT)
}

struct Submission {
    generation: u64,
    filter: Option<DocFilter>,
}

/// One DocDB explorer instance
pub struct DocDbExplorer {
    store: Arc<dyn DocumentStore>,
    submission: Mutex<Submission>,
    state: watch::Sender<SearchView>,
}

impl DocDbExplorer {
    /// Create an explorer in the waiting state
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (state, _) = watch::channel(ViewState::Waiting(WAITING_TEXT.to_string()));
        Self {
            store,
            submission: Mutex::new(Submission {
                generation: 0,
                filter: None,
            }),
            state,
        }
    }

    /// Watch pane state changes
    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.state.subscribe()
    }

    /// Current pane state
    pub fn state(&self) -> SearchView {
        self.state.borrow().clone()
    }

    /// Submit the search widgets and return the resulting pane state
    ///
    /// Empty criteria reset the pane without a request. Criteria equal to
    /// the previous submission do not re-query unless that submission
    /// failed; the current state comes back at once, which is `InProgress`
    /// while the earlier query is still in flight. Otherwise this waits for
    /// the query, and if a newer submission lands meanwhile the returned
    /// state is the newer one's.
    pub async fn search(&self, params: &SearchParams) -> SearchView {
        let filter = build_filter(&params.project_names, &params.subject_id);

        let generation = {
            let mut submission = self.submission.lock();
            if submission.filter.as_ref() == Some(&filter) && !self.state.borrow().is_failed() {
                debug!("DocDB criteria unchanged, keeping current results");
                return self.state();
            }

            submission.generation += 1;
            submission.filter = Some(filter.clone());

            if filter.is_empty() {
                self.state
                    .send_replace(ViewState::Waiting(WAITING_TEXT.to_string()));
                return self.state();
            }

            self.state
                .send_replace(ViewState::InProgress(QUERYING_TEXT.to_string()));
            submission.generation
        };

        let result = self.store.query(&filter, &PROJECTION, RESULT_LIMIT).await;

        let submission = self.submission.lock();
        if submission.generation != generation {
            metrics::record_stale("docdb");
            debug!(generation, "Discarding superseded DocDB response");
            return self.state();
        }

        let view = match result {
            Ok(records) => ViewState::Ready(SearchResults {
                filter: filter.to_json(),
                records,
            }),
            Err(e) => {
                warn!(error = %e, "DocDB query failed");
                metrics::record_error("remote_query", "docdb_query");
                ViewState::Failed(format!("Error: {}", e))
            },
        };
        self.state.send_replace(view.clone());
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteQueryError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedStore {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DocumentStore for FixedStore {
        async fn query(
            &self,
            _filter: &DocFilter,
            projection: &[&str],
            limit: usize,
        ) -> Result<Vec<Value>, RemoteQueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(projection, &PROJECTION);
            assert_eq!(limit, RESULT_LIMIT);
            if self.fail {
                return Err(RemoteQueryError::Status {
                    status: 401,
                    body: "unauthorized".to_string(),
                });
            }
            Ok(vec![json!({"name": "ecephys_1"}), json!({"name": "ecephys_2"})])
        }
    }

    fn explorer(fail: bool) -> (DocDbExplorer, Arc<FixedStore>) {
        let store = Arc::new(FixedStore {
            calls: AtomicUsize::new(0),
            fail,
        });
        (DocDbExplorer::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_empty_criteria_do_not_query() {
        let (explorer, store) = explorer(false);
        let view = explorer.search(&SearchParams::default()).await;
        assert_eq!(view, ViewState::Waiting(WAITING_TEXT.to_string()));
        assert_eq!(count_text(&view), "**Records found:** 0");
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_query() {
        let (explorer, _) = explorer(false);
        let params = SearchParams {
            project_names: vec!["Ephys Platform".to_string()],
            subject_id: String::new(),
        };
        let view = explorer.search(&params).await;
        assert_eq!(status_text(&view), SUCCESS_TEXT);
        assert_eq!(count_text(&view), "**Records found:** 2 (showing max 10)");
        assert_eq!(explorer.state(), view);
    }

    #[tokio::test]
    async fn test_unchanged_criteria_reuse_results() {
        let (explorer, store) = explorer(false);
        let params = SearchParams {
            project_names: Vec::new(),
            subject_id: "632269".to_string(),
        };
        explorer.search(&params).await;
        explorer.search(&params).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_becomes_status_and_is_retried() {
        let (explorer, store) = explorer(true);
        let params = SearchParams {
            project_names: vec!["Behavior Platform".to_string()],
            subject_id: String::new(),
        };

        let view = explorer.search(&params).await;
        assert!(view.is_failed());
        assert_eq!(status_text(&view), "Error: HTTP 401: unauthorized");
        assert_eq!(count_text(&view), "**Records found:** 0");

        explorer.search(&params).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
