//! Provider facade consumed by the engine.
//!
//! Implementations sit on top of a real store; the engine calls them
//! synchronously, one fetch at a time, in projection-tree order.

use crate::config::ExpansionConfig;
use crate::entity::Entity;
use crate::metadata::{ResourceProperty, ResourceSetWrapper, ResourceType};
use crate::order::OrderSpec;

/// Result of a related-set fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub results: Vec<Entity>,
    /// Total number of related entities before `$top`/`$skip`, when known.
    pub count: Option<u64>,
}

impl QueryResult {
    #[must_use]
    pub fn new(results: Vec<Entity>) -> Self {
        Self {
            results,
            count: None,
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

/// Per-fetch options of an expanded collection.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelatedSetQuery<'a> {
    pub order_by: Option<&'a OrderSpec>,
    pub top: Option<usize>,
    pub skip: Option<usize>,
}

pub trait ProvidersWrapper {
    fn container_name(&self) -> &str;

    /// Fetch the entity a single-valued navigation points to.
    ///
    /// # Errors
    /// Any store failure; the engine reports it as a provider fetch failure.
    fn get_related_resource_reference(
        &self,
        source_set: &ResourceSetWrapper,
        source: &Entity,
        target_set: &ResourceSetWrapper,
        property: &ResourceProperty,
    ) -> anyhow::Result<Option<Entity>>;

    /// Fetch the entities a collection-valued navigation points to.
    ///
    /// Honoring `query.order_by` and `query.top` is optional: the engine
    /// re-sorts and truncates the result anyway. `query.skip` must be applied
    /// here, the engine never re-applies it.
    ///
    /// # Errors
    /// Any store failure; the engine reports it as a provider fetch failure.
    fn get_related_resource_set(
        &self,
        source_set: &ResourceSetWrapper,
        source: &Entity,
        target_set: &ResourceSetWrapper,
        property: &ResourceProperty,
        query: RelatedSetQuery<'_>,
    ) -> anyhow::Result<QueryResult>;

    /// Target set of `property` when navigated from `set`, `None` when the
    /// association is unknown.
    fn get_resource_set_wrapper_for_navigation_property(
        &self,
        set: &ResourceSetWrapper,
        resource_type: &ResourceType,
        property: &ResourceProperty,
    ) -> Option<ResourceSetWrapper>;
}

/// A data service: provider access plus service-wide configuration.
pub trait ODataService {
    fn providers_wrapper(&self) -> &dyn ProvidersWrapper;

    fn config(&self) -> &ExpansionConfig;
}
