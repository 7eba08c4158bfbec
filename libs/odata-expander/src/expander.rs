//! Request expansion engine.
//!
//! Walks the projection tree depth-first and, for every `$expand`ed
//! navigation, fetches the related data through the [`ProvidersWrapper`] and
//! writes it into the parent entity's slot:
//!
//! - single-valued: fetched entity (expanded first) or explicit `null`
//! - collection-valued: fetched entities, stable-sorted by the node's
//!   `$orderby`, cut to `$top` / page size, each expanded, then assigned
//!
//! Every level runs inside a [`SegmentStack`] scope that is popped on all
//! exits, errors included. Provider calls happen strictly one at a time in
//! tree order: per expanded child node, per entity of the current level.

use tracing::{debug, trace};

use crate::config::ExpansionConfig;
use crate::entity::{Entity, PropertyValue};
use crate::error::ExpandError;
use crate::metadata::{PropertyKind, ResourceSetWrapper, ResourceType, ResourceTypeKind};
use crate::order::OrderSpec;
use crate::projection::{ExpandedNode, ProjectionNode};
use crate::provider::{ODataService, ProvidersWrapper, QueryResult, RelatedSetQuery};
use crate::request::RequestDescription;
use crate::segment_stack::SegmentStack;

/// Expand `request`'s target result in place.
///
/// No service configuration applies: each node's `top` is the only row limit
/// and there is no depth limit. A no-op (the stack is not touched) when the projection tree requests no
/// expansion or the target result is empty.
///
/// # Errors
/// - `ExpandError::ProviderFetchFailure` when a provider call fails
/// - `ExpandError::MalformedProjectionTree` when a node cannot be expanded
/// - `ExpandError::ExpandDepthExceeded` / `ResultsPerCollectionExceeded` on configured limits
///
/// The segment stack is balanced again when this returns, on error too.
pub fn expand(
    request: &mut RequestDescription,
    providers: &dyn ProvidersWrapper,
    stack: &mut SegmentStack,
) -> Result<(), ExpandError> {
    let config = ExpansionConfig::unlimited();
    Expansion {
        providers,
        config: &config,
    }
    .run(request, stack)
}

/// Service-bound expander owning its segment stack.
pub struct RequestExpander<'a> {
    service: &'a dyn ODataService,
    providers: &'a dyn ProvidersWrapper,
    stack: SegmentStack,
}

impl<'a> RequestExpander<'a> {
    #[must_use]
    pub fn new(service: &'a dyn ODataService) -> Self {
        Self::with_providers(service, service.providers_wrapper())
    }

    /// Use `providers` for fetches instead of the service's own wrapper.
    #[must_use]
    pub fn with_providers(service: &'a dyn ODataService, providers: &'a dyn ProvidersWrapper) -> Self {
        Self {
            service,
            providers,
            stack: SegmentStack::new(),
        }
    }

    #[must_use]
    pub fn service(&self) -> &'a dyn ODataService {
        self.service
    }

    #[must_use]
    pub fn providers(&self) -> &'a dyn ProvidersWrapper {
        self.providers
    }

    #[must_use]
    pub fn stack(&self) -> &SegmentStack {
        &self.stack
    }

    /// Expand `request` with the service's configuration.
    ///
    /// # Errors
    /// `ExpandError::InvalidOperation` for an inconsistent configuration,
    /// otherwise the same errors as [`expand`].
    pub fn handle_expansion(&mut self, request: &mut RequestDescription) -> Result<(), ExpandError> {
        let config = self.service.config();
        config.validate()?;
        Expansion {
            providers: self.providers,
            config,
        }
        .run(request, &mut self.stack)
    }
}

struct Expansion<'a> {
    providers: &'a dyn ProvidersWrapper,
    config: &'a ExpansionConfig,
}

/// An expanded child node together with its resolved target set.
struct Branch<'n> {
    node: &'n ProjectionNode,
    expanded: &'n ExpandedNode,
    target_set: ResourceSetWrapper,
}

impl Expansion<'_> {
    fn run(
        &self,
        request: &mut RequestDescription,
        stack: &mut SegmentStack,
    ) -> Result<(), ExpandError> {
        let RequestDescription {
            container_name,
            target_resource_set,
            root_projection_node,
            target_result,
        } = request;

        let Some(root) = root_projection_node.as_ref() else {
            return Ok(());
        };
        if !root.is_expansion_specified() || target_result.is_empty() {
            return Ok(());
        }

        let entities = target_result.entities_mut();
        debug!(
            container = %container_name,
            entities = entities.len(),
            depth = root.max_expand_depth(),
            "expanding request result"
        );

        let mut scope = stack.scoped(container_name.clone(), target_resource_set.clone());
        self.expand_level(entities, root, target_resource_set.resource_type(), &mut scope)?;

        debug!(container = %container_name, "expansion finished");
        Ok(())
    }

    /// Expand every requested navigation of `node` on each of `entities`.
    /// `entity_type` is the type of `entities`, the write target for their slots.
    fn expand_level(
        &self,
        entities: &mut [Entity],
        node: &ProjectionNode,
        entity_type: &ResourceType,
        stack: &mut SegmentStack,
    ) -> Result<(), ExpandError> {
        for (child, expanded) in node.expanded_children() {
            self.check_depth(stack)?;
            match expanded.property().kind() {
                PropertyKind::ResourceReference => {
                    let branch = self.branch(stack, entity_type, child, expanded)?;
                    for entity in entities.iter_mut() {
                        self.expand_reference(entity, entity_type, &branch, stack)?;
                    }
                }
                PropertyKind::ResourceSetReference => {
                    let branch = self.branch(stack, entity_type, child, expanded)?;
                    for entity in entities.iter_mut() {
                        self.expand_collection(entity, entity_type, &branch, stack)?;
                    }
                }
                kind @ (PropertyKind::Primitive | PropertyKind::Complex) => {
                    return Err(ExpandError::malformed(
                        stack.path(),
                        format!(
                            "{kind} property `{}` cannot be expanded",
                            expanded.property().name()
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    fn expand_reference(
        &self,
        entity: &mut Entity,
        entity_type: &ResourceType,
        branch: &Branch<'_>,
        stack: &mut SegmentStack,
    ) -> Result<(), ExpandError> {
        let property = branch.expanded.property();
        let related = self
            .providers
            .get_related_resource_reference(
                current_wrapper(stack)?,
                entity,
                &branch.target_set,
                property,
            )
            .map_err(|source| ExpandError::fetch_failure(stack.path(), property.name(), source))?;

        trace!(
            path = %stack.path(),
            property = property.name(),
            found = related.is_some(),
            "fetched related entity"
        );

        let value = match related {
            Some(mut related) => {
                if branch.node.is_expansion_specified() {
                    let mut scope = stack.scoped(property.name(), branch.target_set.clone());
                    self.expand_level(
                        std::slice::from_mut(&mut related),
                        branch.node,
                        branch.expanded.resource_type(),
                        &mut scope,
                    )?;
                }
                PropertyValue::Reference(Some(Box::new(related)))
            }
            None => PropertyValue::Reference(None),
        };
        entity_type.set_property_value(entity, property, value)
    }

    fn expand_collection(
        &self,
        entity: &mut Entity,
        entity_type: &ResourceType,
        branch: &Branch<'_>,
        stack: &mut SegmentStack,
    ) -> Result<(), ExpandError> {
        let property = branch.expanded.property();
        let top = self
            .config
            .effective_top(branch.target_set.name(), branch.expanded.top());
        let query = RelatedSetQuery {
            order_by: branch.expanded.order_by(),
            top,
            skip: branch.expanded.skip(),
        };

        let QueryResult { mut results, count } = self
            .providers
            .get_related_resource_set(
                current_wrapper(stack)?,
                entity,
                &branch.target_set,
                property,
                query,
            )
            .map_err(|source| ExpandError::fetch_failure(stack.path(), property.name(), source))?;
        let fetched = results.len();

        // Providers may ignore order and limit; the final shape is enforced here.
        if let Some(order_by) = branch.expanded.order_by() {
            order_by.sort(&mut results);
        }
        if let Some(top) = top {
            results.truncate(top);
        }
        if let Some(max) = self.config.max_results_per_collection
            && results.len() > max
        {
            return Err(ExpandError::ResultsPerCollectionExceeded {
                property: property.name().to_owned(),
                count: results.len(),
                max,
            });
        }

        trace!(
            path = %stack.path(),
            property = property.name(),
            order_by = branch
                .expanded
                .order_by()
                .and_then(OrderSpec::description)
                .map(tracing::field::display),
            fetched,
            kept = results.len(),
            total = ?count,
            "fetched related set"
        );

        if !results.is_empty() && branch.node.is_expansion_specified() {
            let mut scope = stack.scoped(property.name(), branch.target_set.clone());
            self.expand_level(
                &mut results,
                branch.node,
                branch.expanded.resource_type(),
                &mut scope,
            )?;
        }
        entity_type.set_property_value(entity, property, PropertyValue::Collection(results))
    }

    /// Resolve the target set of an expanded node: pinned on the node, or
    /// looked up through the provider from the current segment's set.
    fn branch<'n>(
        &self,
        stack: &SegmentStack,
        entity_type: &ResourceType,
        node: &'n ProjectionNode,
        expanded: &'n ExpandedNode,
    ) -> Result<Branch<'n>, ExpandError> {
        let property = expanded.property();
        if property.type_kind() != ResourceTypeKind::Entity {
            return Err(ExpandError::malformed(
                stack.path(),
                format!("navigation `{}` does not target an entity type", property.name()),
            ));
        }

        let resolved = match expanded.resource_set() {
            Some(set) => Some(set.clone()),
            None => self.providers.get_resource_set_wrapper_for_navigation_property(
                current_wrapper(stack)?,
                entity_type,
                property,
            ),
        };

        match resolved {
            Some(target_set) if target_set.is_visible() => Ok(Branch {
                node,
                expanded,
                target_set,
            }),
            Some(target_set) => Err(ExpandError::malformed(
                stack.path(),
                format!(
                    "target resource set `{}` of `{}` is not visible",
                    target_set.name(),
                    property.name()
                ),
            )),
            None => Err(ExpandError::malformed(
                stack.path(),
                format!("no target resource set for navigation `{}`", property.name()),
            )),
        }
    }

    /// Navigations expanded at the current level sit `stack.depth()` segments
    /// below the request root.
    fn check_depth(&self, stack: &SegmentStack) -> Result<(), ExpandError> {
        let depth = stack.depth();
        match self.config.max_expand_depth {
            Some(max) if depth > max => Err(ExpandError::ExpandDepthExceeded { depth, max }),
            _ => Ok(()),
        }
    }
}

fn current_wrapper(stack: &SegmentStack) -> Result<&ResourceSetWrapper, ExpandError> {
    stack.current_wrapper().ok_or_else(|| {
        ExpandError::InvalidOperation("expansion outside of a segment scope".to_owned())
    })
}
