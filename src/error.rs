
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CategorizationError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Duplicate category title: {title}")]
    DuplicateCategory { title: String },
    #[error("Unknown category: {0}")]
    UnknownCategory(String),
    #[error("Index {index} out of range for a view of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Reorder rejected: {0}")]
    Reorder(String),
    #[error("Sort predicate failed: {0}")]
    Comparator(String),
    #[error("Merge changed the identity of record {0}")]
    IdentityChanged(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("Lock contended: {0}")]
    Contended(String),
}

pub type Result<T> = std::result::Result<T, CategorizationError>;

// Helper conversions
impl From<config::ConfigError> for CategorizationError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
