//! Request description handed to the engine after the top-level fetch.

use crate::entity::Entity;
use crate::metadata::ResourceSetWrapper;
use crate::projection::ProjectionNode;

/// Top-level result of a request: nothing, one entity, or a feed.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TargetResult {
    #[default]
    None,
    Single(Entity),
    Collection(Vec<Entity>),
}

impl TargetResult {
    /// True for `None` and for an empty collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            TargetResult::None => true,
            TargetResult::Single(_) => false,
            TargetResult::Collection(items) => items.is_empty(),
        }
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [Entity] {
        match self {
            TargetResult::None => &mut [],
            TargetResult::Single(entity) => std::slice::from_mut(entity),
            TargetResult::Collection(items) => items,
        }
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        match self {
            TargetResult::None => &[],
            TargetResult::Single(entity) => std::slice::from_ref(entity),
            TargetResult::Collection(items) => items,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RequestDescription {
    pub(crate) container_name: String,
    pub(crate) target_resource_set: ResourceSetWrapper,
    pub(crate) root_projection_node: Option<ProjectionNode>,
    pub(crate) target_result: TargetResult,
}

impl RequestDescription {
    #[must_use]
    pub fn new(container_name: impl Into<String>, target_resource_set: ResourceSetWrapper) -> Self {
        Self {
            container_name: container_name.into(),
            target_resource_set,
            root_projection_node: None,
            target_result: TargetResult::None,
        }
    }

    #[must_use]
    pub fn with_root_projection_node(mut self, node: ProjectionNode) -> Self {
        self.root_projection_node = Some(node);
        self
    }

    #[must_use]
    pub fn with_target_result(mut self, result: TargetResult) -> Self {
        self.target_result = result;
        self
    }

    #[must_use]
    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    #[must_use]
    pub fn target_resource_set_wrapper(&self) -> &ResourceSetWrapper {
        &self.target_resource_set
    }

    #[must_use]
    pub fn root_projection_node(&self) -> Option<&ProjectionNode> {
        self.root_projection_node.as_ref()
    }

    #[must_use]
    pub fn target_result(&self) -> &TargetResult {
        &self.target_result
    }

    #[must_use]
    pub fn into_target_result(self) -> TargetResult {
        self.target_result
    }
}
