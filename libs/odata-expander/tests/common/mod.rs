#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

//! In-memory store and provider shared by the integration tests.
//!
//! Model: `Customer (Orders*, BestOrder?)`, `Order (Customer?, Lines*)`, `Line`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use odata_expander::{
    Entity, EntitySetRights, ExpandedNode, ExpansionConfig, ODataService, ProjectionNode,
    ProvidersWrapper, QueryResult, RelatedSetQuery, ResourceProperty, ResourceSetWrapper,
    ResourceType, ResourceTypeKind, Value,
};

pub const CONTAINER: &str = "Northwind";

#[derive(Clone)]
pub struct Model {
    pub customer: Arc<ResourceType>,
    pub order: Arc<ResourceType>,
    pub line: Arc<ResourceType>,
    pub customers: ResourceSetWrapper,
    pub orders: ResourceSetWrapper,
    pub lines: ResourceSetWrapper,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        let customer = ResourceType::builder("Customer", ResourceTypeKind::Entity)
            .key("CustomerID")
            .primitive("Name")
            .collection("Orders")
            .reference("BestOrder")
            .build();
        let order = ResourceType::builder("Order", ResourceTypeKind::Entity)
            .key("OrderID")
            .primitive("Total")
            .reference("Customer")
            .collection("Lines")
            .build();
        let line = ResourceType::builder("Line", ResourceTypeKind::Entity)
            .key("LineID")
            .primitive("Qty")
            .build();

        Self {
            customers: ResourceSetWrapper::new("Customers", Arc::clone(&customer)),
            orders: ResourceSetWrapper::new("Orders", Arc::clone(&order)),
            lines: ResourceSetWrapper::new("Lines", Arc::clone(&line)),
            customer,
            order,
            line,
        }
    }

    pub fn customer_prop(&self, name: &str) -> ResourceProperty {
        self.customer.property(name).unwrap().clone()
    }

    pub fn order_prop(&self, name: &str) -> ResourceProperty {
        self.order.property(name).unwrap().clone()
    }

    pub fn new_customer(&self, id: i64, name: &str) -> Entity {
        self.customer
            .create_entity([("CustomerID", Value::from(id)), ("Name", Value::from(name))])
            .unwrap()
    }

    pub fn new_order(&self, id: i64, total: i64) -> Entity {
        self.order
            .create_entity([("OrderID", id), ("Total", total)])
            .unwrap()
    }

    pub fn new_line(&self, id: i64, qty: i64) -> Entity {
        self.line
            .create_entity([("LineID", id), ("Qty", qty)])
            .unwrap()
    }

    /// `Customer.Orders` expansion node.
    pub fn orders_node(&self) -> ExpandedNode {
        ExpandedNode::new(self.customer_prop("Orders"), Arc::clone(&self.order))
    }

    /// `Customer.BestOrder` expansion node.
    pub fn best_order_node(&self) -> ExpandedNode {
        ExpandedNode::new(self.customer_prop("BestOrder"), Arc::clone(&self.order))
    }

    /// `Order.Lines` expansion node.
    pub fn lines_node(&self) -> ExpandedNode {
        ExpandedNode::new(self.order_prop("Lines"), Arc::clone(&self.line))
    }

    /// `Order.Customer` expansion node.
    pub fn order_customer_node(&self) -> ExpandedNode {
        ExpandedNode::new(self.order_prop("Customer"), Arc::clone(&self.customer))
    }

    /// Root expanding `Orders` with no nested expansion.
    pub fn expand_orders(&self) -> ProjectionNode {
        ProjectionNode::root().with_child(ProjectionNode::expanded(self.orders_node()))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

/// One recorded provider call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Reference {
        source_set: String,
        key: Option<i64>,
        property: String,
    },
    Set {
        source_set: String,
        key: Option<i64>,
        property: String,
        top: Option<usize>,
        skip: Option<usize>,
        ordered: bool,
    },
    ResolveSet {
        source_set: String,
        property: String,
    },
}

impl Call {
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        !matches!(self, Call::ResolveSet { .. })
    }
}

/// In-memory provider. Ignores `$orderby` and `$top` so the engine's own
/// ordering and truncation are observable; applies `$skip`.
#[derive(Default)]
pub struct InMemoryProvider {
    model: Model,
    links: HashMap<(String, i64, String), Vec<Entity>>,
    hidden: Vec<String>,
    unresolvable: Vec<String>,
    fail_on: Option<String>,
    calls: RefCell<Vec<Call>>,
}

impl InMemoryProvider {
    #[must_use]
    pub fn new(model: &Model) -> Self {
        Self {
            model: model.clone(),
            ..Self::default()
        }
    }

    /// Relate `targets` to the entity `(type_name, key)` through `property`.
    #[must_use]
    pub fn link(mut self, type_name: &str, key: i64, property: &str, targets: Vec<Entity>) -> Self {
        self.links
            .insert((type_name.to_owned(), key, property.to_owned()), targets);
        self
    }

    /// Resolve the target set of `property` to a set without rights.
    #[must_use]
    pub fn hide_target_of(mut self, property: &str) -> Self {
        self.hidden.push(property.to_owned());
        self
    }

    /// Report no target set for `property`.
    #[must_use]
    pub fn unresolvable(mut self, property: &str) -> Self {
        self.unresolvable.push(property.to_owned());
        self
    }

    /// Fail every fetch through `property`.
    #[must_use]
    pub fn fail_on(mut self, property: &str) -> Self {
        self.fail_on = Some(property.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn fetches(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_fetch).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn source_key(set: &ResourceSetWrapper, source: &Entity) -> Option<i64> {
        set.resource_type().key_of(source).and_then(Value::as_i64)
    }

    fn related(&self, source_set: &ResourceSetWrapper, key: Option<i64>, property: &str) -> Vec<Entity> {
        key.and_then(|key| {
            self.links.get(&(
                source_set.resource_type().name().to_owned(),
                key,
                property.to_owned(),
            ))
        })
        .cloned()
        .unwrap_or_default()
    }

    fn check_failure(&self, property: &ResourceProperty) -> anyhow::Result<()> {
        if self.fail_on.as_deref() == Some(property.name()) {
            return Err(anyhow!("store unavailable while reading `{}`", property.name()));
        }
        Ok(())
    }
}

impl ProvidersWrapper for InMemoryProvider {
    fn container_name(&self) -> &str {
        CONTAINER
    }

    fn get_related_resource_reference(
        &self,
        source_set: &ResourceSetWrapper,
        source: &Entity,
        _target_set: &ResourceSetWrapper,
        property: &ResourceProperty,
    ) -> anyhow::Result<Option<Entity>> {
        let key = Self::source_key(source_set, source);
        self.calls.borrow_mut().push(Call::Reference {
            source_set: source_set.name().to_owned(),
            key,
            property: property.name().to_owned(),
        });
        self.check_failure(property)?;
        Ok(self
            .related(source_set, key, property.name())
            .into_iter()
            .next())
    }

    fn get_related_resource_set(
        &self,
        source_set: &ResourceSetWrapper,
        source: &Entity,
        _target_set: &ResourceSetWrapper,
        property: &ResourceProperty,
        query: RelatedSetQuery<'_>,
    ) -> anyhow::Result<QueryResult> {
        let key = Self::source_key(source_set, source);
        self.calls.borrow_mut().push(Call::Set {
            source_set: source_set.name().to_owned(),
            key,
            property: property.name().to_owned(),
            top: query.top,
            skip: query.skip,
            ordered: query.order_by.is_some(),
        });
        self.check_failure(property)?;

        let all = self.related(source_set, key, property.name());
        let total = u64::try_from(all.len()).unwrap();
        let results = all.into_iter().skip(query.skip.unwrap_or(0)).collect();
        Ok(QueryResult::new(results).with_count(total))
    }

    fn get_resource_set_wrapper_for_navigation_property(
        &self,
        set: &ResourceSetWrapper,
        _resource_type: &ResourceType,
        property: &ResourceProperty,
    ) -> Option<ResourceSetWrapper> {
        self.calls.borrow_mut().push(Call::ResolveSet {
            source_set: set.name().to_owned(),
            property: property.name().to_owned(),
        });
        if self.unresolvable.iter().any(|p| p == property.name()) {
            return None;
        }
        let target = match property.name() {
            "Orders" | "BestOrder" => self.model.orders.clone(),
            "Customer" => self.model.customers.clone(),
            "Lines" => self.model.lines.clone(),
            _ => return None,
        };
        if self.hidden.iter().any(|p| p == property.name()) {
            return Some(target.with_rights(EntitySetRights::empty()));
        }
        Some(target)
    }
}

pub struct TestService {
    pub provider: InMemoryProvider,
    pub config: ExpansionConfig,
}

impl ODataService for TestService {
    fn providers_wrapper(&self) -> &dyn ProvidersWrapper {
        &self.provider
    }

    fn config(&self) -> &ExpansionConfig {
        &self.config
    }
}

/// Keys of `entities` in order.
pub fn keys(resource_type: &ResourceType, entities: &[Entity]) -> Vec<i64> {
    entities
        .iter()
        .map(|e| resource_type.key_of(e).and_then(Value::as_i64).unwrap())
        .collect()
}
