//! Projection tree built by the URI parser and consumed read-only by the engine.
//!
//! The root node stands for the request's target set. Its children are either
//! plain `$select` projections ([`NodeKind::Selected`]) or navigation
//! expansions ([`NodeKind::Expanded`]); only expansions have children of
//! their own.

use std::sync::Arc;

use crate::metadata::{ResourceProperty, ResourceSetWrapper, ResourceType};
use crate::order::OrderSpec;

#[derive(Clone, Debug)]
pub enum NodeKind {
    Root,
    Selected,
    Expanded(Box<ExpandedNode>),
}

/// Metadata of one `$expand`ed navigation.
#[derive(Clone, Debug)]
pub struct ExpandedNode {
    property: ResourceProperty,
    resource_type: Arc<ResourceType>,
    resource_set: Option<ResourceSetWrapper>,
    order_by: Option<OrderSpec>,
    top: Option<usize>,
    skip: Option<usize>,
}

impl ExpandedNode {
    /// `resource_type` is the type of the entities the navigation leads to.
    #[must_use]
    pub fn new(property: ResourceProperty, resource_type: Arc<ResourceType>) -> Self {
        Self {
            property,
            resource_type,
            resource_set: None,
            order_by: None,
            top: None,
            skip: None,
        }
    }

    /// Pin the target set instead of resolving it through the provider.
    #[must_use]
    pub fn with_resource_set(mut self, set: ResourceSetWrapper) -> Self {
        self.resource_set = Some(set);
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, order_by: OrderSpec) -> Self {
        self.order_by = Some(order_by);
        self
    }

    #[must_use]
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn property(&self) -> &ResourceProperty {
        &self.property
    }

    #[must_use]
    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    #[must_use]
    pub fn resource_set(&self) -> Option<&ResourceSetWrapper> {
        self.resource_set.as_ref()
    }

    #[must_use]
    pub fn order_by(&self) -> Option<&OrderSpec> {
        self.order_by.as_ref()
    }

    #[must_use]
    pub fn top(&self) -> Option<usize> {
        self.top
    }

    #[must_use]
    pub fn skip(&self) -> Option<usize> {
        self.skip
    }
}

#[derive(Clone, Debug)]
pub struct ProjectionNode {
    name: Option<String>,
    kind: NodeKind,
    children: Vec<ProjectionNode>,
}

impl ProjectionNode {
    #[must_use]
    pub fn root() -> Self {
        Self {
            name: None,
            kind: NodeKind::Root,
            children: Vec::new(),
        }
    }

    /// A `$select`ed property that is not expanded.
    #[must_use]
    pub fn selected(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: NodeKind::Selected,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn expanded(node: ExpandedNode) -> Self {
        Self {
            name: Some(node.property.name().to_owned()),
            kind: NodeKind::Expanded(Box::new(node)),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: ProjectionNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn children(&self) -> &[ProjectionNode] {
        &self.children
    }

    #[must_use]
    pub fn as_expanded(&self) -> Option<&ExpandedNode> {
        match &self.kind {
            NodeKind::Expanded(node) => Some(&**node),
            NodeKind::Root | NodeKind::Selected => None,
        }
    }

    /// True when at least one direct child requests expansion.
    #[must_use]
    pub fn is_expansion_specified(&self) -> bool {
        self.children.iter().any(|c| c.as_expanded().is_some())
    }

    /// Children that request expansion, skipping plain projections.
    pub fn expanded_children(&self) -> impl Iterator<Item = (&ProjectionNode, &ExpandedNode)> {
        self.children
            .iter()
            .filter_map(|c| c.as_expanded().map(|e| (c, e)))
    }

    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<&ProjectionNode> {
        self.children.iter().find(|c| c.name() == Some(name))
    }

    /// Number of nested expansion levels below this node.
    #[must_use]
    pub fn max_expand_depth(&self) -> usize {
        self.expanded_children()
            .map(|(child, _)| 1 + child.max_expand_depth())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::metadata::ResourceTypeKind;

    fn types() -> (Arc<ResourceType>, Arc<ResourceType>) {
        let customer = ResourceType::builder("Customer", ResourceTypeKind::Entity)
            .key("Id")
            .primitive("Name")
            .collection("Orders")
            .build();
        let order = ResourceType::builder("Order", ResourceTypeKind::Entity)
            .key("Id")
            .reference("Customer")
            .build();
        (customer, order)
    }

    #[test]
    fn select_only_tree_requests_no_expansion() {
        let root = ProjectionNode::root()
            .with_child(ProjectionNode::selected("Name"))
            .with_child(ProjectionNode::selected("Id"));

        assert!(!root.is_expansion_specified());
        assert_eq!(root.expanded_children().count(), 0);
        assert_eq!(root.max_expand_depth(), 0);
    }

    #[test]
    fn expanded_children_skip_selected_nodes() {
        let (customer, order) = types();
        let orders = customer.property("Orders").unwrap().clone();
        let back = order.property("Customer").unwrap().clone();

        let root = ProjectionNode::root()
            .with_child(ProjectionNode::selected("Name"))
            .with_child(
                ProjectionNode::expanded(ExpandedNode::new(orders, Arc::clone(&order)).with_top(3))
                    .with_child(ProjectionNode::expanded(ExpandedNode::new(back, customer))),
            );

        assert!(root.is_expansion_specified());
        let expanded: Vec<&str> = root
            .expanded_children()
            .map(|(_, e)| e.property().name())
            .collect();
        assert_eq!(expanded, vec!["Orders"]);
        assert_eq!(root.max_expand_depth(), 2);

        let orders_node = root.find_node("Orders").unwrap();
        assert_eq!(orders_node.as_expanded().and_then(ExpandedNode::top), Some(3));
        assert!(orders_node.find_node("Customer").is_some());
        assert!(root.find_node("Missing").is_none());
    }
}
