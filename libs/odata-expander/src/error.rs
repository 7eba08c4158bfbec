//! Error type for the expansion engine.
//!
//! Every failure aborts the whole expansion pass; there is no partially
//! expanded success. Provider errors are wrapped with the segment path at
//! which they happened so the caller can tell which branch failed.

/// Unified error type for all expansion operations
#[derive(thiserror::Error, Debug)]
pub enum ExpandError {
    /// The provider raised an error while fetching a related entity or set.
    #[error("provider failed to fetch `{property}` at `{path}`")]
    ProviderFetchFailure {
        path: String,
        property: String,
        #[source]
        source: anyhow::Error,
    },

    /// A node requests expansion but its metadata cannot support it.
    #[error("malformed projection tree at `{path}`: {reason}")]
    MalformedProjectionTree { path: String, reason: String },

    #[error("unknown property `{property}` on resource type `{type_name}`")]
    UnknownProperty { type_name: String, property: String },

    #[error("invalid $orderby: {0}")]
    InvalidOrderBy(String),

    #[error("expand depth {depth} exceeds the configured maximum of {max}")]
    ExpandDepthExceeded { depth: usize, max: usize },

    #[error("navigation `{property}` produced {count} results, more than the allowed {max}")]
    ResultsPerCollectionExceeded {
        property: String,
        count: usize,
        max: usize,
    },

    /// Programming error: unbalanced segment stack, inconsistent configuration.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl ExpandError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedProjectionTree {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn fetch_failure(
        path: impl Into<String>,
        property: &str,
        source: anyhow::Error,
    ) -> Self {
        Self::ProviderFetchFailure {
            path: path.into(),
            property: property.to_owned(),
            source,
        }
    }

    /// True when the error originated in the provider rather than in the engine.
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::ProviderFetchFailure { .. })
    }
}
