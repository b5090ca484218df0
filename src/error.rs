//! Error types for normalization and input validation

use thiserror::Error;

/// Errors raised while validating or normalizing a raw graph.
///
/// Clustering never produces these; it excludes what it cannot place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Input does not have the expected shape
    #[error("validation error: {0}")]
    Validation(String),

    /// A link endpoint matches neither a node id nor a secondary address
    #[error("link {link_index} references unknown node or address '{endpoint}'")]
    MissingNode { endpoint: String, link_index: usize },

    /// A link had identical source and target before any address rewriting
    #[error("link {link_index} has identical source and target '{node}'")]
    DuplicateLinkSourceTarget { node: String, link_index: usize },
}

impl GraphError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        GraphError::Validation(msg.into())
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, GraphError>;
