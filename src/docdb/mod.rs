//! Document store explorer
//!
//! - [`filter`]: search widgets to a MongoDB-style filter
//! - [`client`]: the [`DocumentStore`] seam and its HTTP implementation
//! - [`explorer`]: result pane state with last-write-wins submissions
//!
//! ```rust
//! use data_explorer::docdb::build_filter;
//!
//! let filter = build_filter(&["Ephys Platform"], "632269");
//! assert_eq!(filter.len(), 2);
//! assert!(build_filter::<&str>(&[], "").is_empty());
//! ```

pub mod client;
pub mod explorer;
pub mod filter;

pub use client::{DocumentStore, HttpDocumentStore};
pub use explorer::{count_text, status_text, DocDbExplorer, SearchParams, SearchResults, SearchView};
pub use filter::{build_filter, Condition, DocFilter, PROJECTION, RESULT_LIMIT};
