//! Error types for the search sink repository.

mod search_error;

pub use search_error::SearchError;
