//! Configuration for the expansion engine.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ExpandError;

/// Entity set name matching every set in [`ExpansionConfig::page_sizes`].
pub const ANY_SET: &str = "*";

/// Page size applied to every entity set unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 400;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ExpansionConfig {
    /// Maximum number of navigation segments below the request root.
    /// Default: unlimited.
    pub max_expand_depth: Option<usize>,

    /// Server-driven page size per entity set name, `*` matches any set.
    /// An expanded collection keeps at most this many entities; `0` disables
    /// paging for the set.
    /// Default: `{"*": 400}`
    pub page_sizes: BTreeMap<String, usize>,

    /// Hard cap on the size of an expanded collection. Mutually exclusive
    /// with a non-zero page size.
    /// Default: unlimited.
    pub max_results_per_collection: Option<usize>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_expand_depth: None,
            page_sizes: BTreeMap::from([(ANY_SET.to_owned(), DEFAULT_PAGE_SIZE)]),
            max_results_per_collection: None,
        }
    }
}

impl ExpansionConfig {
    /// Config without paging or limits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_expand_depth: None,
            page_sizes: BTreeMap::new(),
            max_results_per_collection: None,
        }
    }

    #[must_use]
    pub fn with_max_expand_depth(mut self, depth: usize) -> Self {
        self.max_expand_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, set_name: impl Into<String>, size: usize) -> Self {
        self.page_sizes.insert(set_name.into(), size);
        self
    }

    #[must_use]
    pub fn with_max_results_per_collection(mut self, max: usize) -> Self {
        self.max_results_per_collection = Some(max);
        self
    }

    /// Page size for `set_name`: exact entry first, then the `*` entry.
    /// `None` when the set is not paged.
    #[must_use]
    pub fn page_size_for(&self, set_name: &str) -> Option<usize> {
        self.page_sizes
            .get(set_name)
            .or_else(|| self.page_sizes.get(ANY_SET))
            .copied()
            .filter(|size| *size > 0)
    }

    /// Effective row limit for an expanded collection of `set_name`.
    #[must_use]
    pub fn effective_top(&self, set_name: &str, requested: Option<usize>) -> Option<usize> {
        match (requested, self.page_size_for(set_name)) {
            (Some(top), Some(page)) => Some(top.min(page)),
            (top, page) => top.or(page),
        }
    }

    /// Check the configuration for contradicting settings.
    ///
    /// # Errors
    /// Returns `ExpandError::InvalidOperation` when a non-zero page size is
    /// configured together with `max_results_per_collection`.
    pub fn validate(&self) -> Result<(), ExpandError> {
        if self.max_results_per_collection.is_some()
            && self.page_sizes.values().any(|size| *size > 0)
        {
            return Err(ExpandError::InvalidOperation(
                "page size and max results per collection cannot be set together".to_owned(),
            ));
        }
        Ok(())
    }
}
