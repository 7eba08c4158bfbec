//! Entities as slot vectors indexed by [`PropertyId`].

use std::sync::Arc;

use crate::metadata::{PropertyId, PropertyKind};
use crate::value::Value;

/// Content of one property slot.
///
/// `Unset` means the property was never written (for a navigation: never
/// expanded). `Reference(None)` means it was expanded and nothing was found.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PropertyValue {
    #[default]
    Unset,
    Primitive(Value),
    Reference(Option<Box<Entity>>),
    Collection(Vec<Entity>),
}

impl PropertyValue {
    pub(crate) fn fits(&self, kind: PropertyKind) -> bool {
        match self {
            PropertyValue::Unset => true,
            PropertyValue::Primitive(_) => kind == PropertyKind::Primitive,
            PropertyValue::Reference(_) => kind == PropertyKind::ResourceReference,
            PropertyValue::Collection(_) => kind == PropertyKind::ResourceSetReference,
        }
    }

    pub(crate) fn shape_name(&self) -> &'static str {
        match self {
            PropertyValue::Unset => "unset",
            PropertyValue::Primitive(_) => "primitive",
            PropertyValue::Reference(_) => "reference",
            PropertyValue::Collection(_) => "collection",
        }
    }

    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, PropertyValue::Unset)
    }
}

/// A mutable record of one resource type.
///
/// Entities are created by a [`ResourceType`](crate::ResourceType) and only
/// written through it; the engine never constructs them, it fetches them from
/// the provider and moves them into their parent's slots.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    type_name: Arc<str>,
    values: Vec<PropertyValue>,
}

impl Entity {
    pub(crate) fn new(type_name: Arc<str>, slots: usize) -> Self {
        Self {
            type_name,
            values: vec![PropertyValue::Unset; slots],
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn value(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.values.get(id.index())
    }

    #[must_use]
    pub fn primitive(&self, id: PropertyId) -> Option<&Value> {
        match self.value(id)? {
            PropertyValue::Primitive(v) => Some(v),
            _ => None,
        }
    }

    /// The expanded entity of a single-valued navigation.
    ///
    /// `None` both when the slot is unset and when it holds `null`; use
    /// [`Entity::value`] to tell the two apart.
    #[must_use]
    pub fn reference(&self, id: PropertyId) -> Option<&Entity> {
        match self.value(id)? {
            PropertyValue::Reference(Some(e)) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn collection(&self, id: PropertyId) -> Option<&[Entity]> {
        match self.value(id)? {
            PropertyValue::Collection(items) => Some(items),
            _ => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, id: PropertyId) -> Option<&mut PropertyValue> {
        self.values.get_mut(id.index())
    }
}
