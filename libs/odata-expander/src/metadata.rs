//! Resource metadata: types, properties and access-checked entity sets.
//!
//! A [`ResourceType`] is built once through [`ResourceType::builder`], which
//! assigns every declared property a [`PropertyId`]. The id is the index of
//! the property's slot inside an [`Entity`], so the engine reads and writes
//! entity values without any name lookups.

use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;

use crate::entity::{Entity, PropertyValue};
use crate::error::ExpandError;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceTypeKind {
    Entity,
    Complex,
    Primitive,
}

/// Kind of a declared property.
///
/// `ResourceReference` is a single-valued navigation, `ResourceSetReference`
/// a collection-valued one. Only those two can be expanded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Primitive,
    Complex,
    ResourceReference,
    ResourceSetReference,
}

impl PropertyKind {
    #[must_use]
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            PropertyKind::ResourceReference | PropertyKind::ResourceSetReference
        )
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PropertyKind::Primitive => "primitive",
            PropertyKind::Complex => "complex",
            PropertyKind::ResourceReference => "reference",
            PropertyKind::ResourceSetReference => "collection",
        })
    }
}

/// Slot index of a property within its declaring type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(usize);

impl PropertyId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceProperty {
    id: PropertyId,
    name: String,
    declaring_type: Arc<str>,
    kind: PropertyKind,
    type_kind: ResourceTypeKind,
}

impl ResourceProperty {
    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Kind of the property's target type.
    #[must_use]
    pub fn type_kind(&self) -> ResourceTypeKind {
        self.type_kind
    }
}

#[derive(Debug)]
pub struct ResourceType {
    name: Arc<str>,
    kind: ResourceTypeKind,
    properties: Vec<ResourceProperty>,
    by_name: HashMap<String, PropertyId>,
    key: Option<PropertyId>,
}

impl ResourceType {
    pub fn builder(name: impl Into<String>, kind: ResourceTypeKind) -> ResourceTypeBuilder {
        ResourceTypeBuilder {
            name: Arc::from(name.into()),
            kind,
            properties: Vec::new(),
            key: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ResourceTypeKind {
        self.kind
    }

    #[must_use]
    pub fn properties(&self) -> &[ResourceProperty] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ResourceProperty> {
        self.by_name
            .get(name)
            .and_then(|id| self.properties.get(id.index()))
    }

    #[must_use]
    pub fn property_by_id(&self, id: PropertyId) -> Option<&ResourceProperty> {
        self.properties.get(id.index())
    }

    #[must_use]
    pub fn key_property(&self) -> Option<&ResourceProperty> {
        self.key.and_then(|id| self.property_by_id(id))
    }

    /// Value of the key property of `entity`, if the type declares one.
    #[must_use]
    pub fn key_of<'e>(&self, entity: &'e Entity) -> Option<&'e Value> {
        self.key.and_then(|id| entity.primitive(id))
    }

    /// A fresh entity of this type with every slot unset.
    #[must_use]
    pub fn new_entity(&self) -> Entity {
        Entity::new(Arc::clone(&self.name), self.properties.len())
    }

    /// Build an entity from `(property name, value)` pairs.
    ///
    /// # Errors
    /// Returns `ExpandError::UnknownProperty` for a name the type does not
    /// declare, and `ExpandError::MalformedProjectionTree` when a name refers
    /// to a non-primitive property.
    pub fn create_entity<I, K, V>(&self, values: I) -> Result<Entity, ExpandError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut entity = self.new_entity();
        for (name, value) in values {
            let property = self.property(name.as_ref()).ok_or_else(|| {
                ExpandError::UnknownProperty {
                    type_name: self.name().to_owned(),
                    property: name.as_ref().to_owned(),
                }
            })?;
            self.set_property_value(&mut entity, property, PropertyValue::Primitive(value.into()))?;
        }
        Ok(entity)
    }

    /// Write `value` into the slot of `property` on `entity`.
    ///
    /// This is the only way the engine mutates entities.
    ///
    /// # Errors
    /// Returns `ExpandError::UnknownProperty` when `property` is not declared
    /// by this type, and `ExpandError::MalformedProjectionTree` when the
    /// entity is of another type or the value does not fit the property kind.
    pub fn set_property_value(
        &self,
        entity: &mut Entity,
        property: &ResourceProperty,
        value: PropertyValue,
    ) -> Result<(), ExpandError> {
        if entity.type_name() != self.name() {
            return Err(ExpandError::malformed(
                self.name(),
                format!(
                    "entity of type `{}` cannot be written through `{}`",
                    entity.type_name(),
                    self.name()
                ),
            ));
        }

        let declared = self
            .property_by_id(property.id())
            .filter(|p| p.name() == property.name() && p.declaring_type() == self.name())
            .ok_or_else(|| ExpandError::UnknownProperty {
                type_name: self.name().to_owned(),
                property: property.name().to_owned(),
            })?;

        if !value.fits(declared.kind()) {
            return Err(ExpandError::malformed(
                self.name(),
                format!(
                    "a {} value cannot be stored in {} property `{}`",
                    value.shape_name(),
                    declared.kind(),
                    declared.name()
                ),
            ));
        }

        let slot = entity.slot_mut(declared.id()).ok_or_else(|| {
            ExpandError::malformed(
                self.name(),
                format!("entity has no slot for property `{}`", declared.name()),
            )
        })?;
        *slot = value;
        Ok(())
    }
}

#[must_use]
pub struct ResourceTypeBuilder {
    name: Arc<str>,
    kind: ResourceTypeKind,
    properties: Vec<ResourceProperty>,
    key: Option<PropertyId>,
}

impl ResourceTypeBuilder {
    /// Declare a property. Redeclaring a name replaces the earlier declaration.
    pub fn property(
        mut self,
        name: impl Into<String>,
        kind: PropertyKind,
        type_kind: ResourceTypeKind,
    ) -> Self {
        let name = name.into();
        if let Some(existing) = self.properties.iter_mut().find(|p| p.name == name) {
            existing.kind = kind;
            existing.type_kind = type_kind;
            return self;
        }
        self.properties.push(ResourceProperty {
            id: PropertyId(self.properties.len()),
            name,
            declaring_type: Arc::clone(&self.name),
            kind,
            type_kind,
        });
        self
    }

    /// Declare the primitive key property.
    pub fn key(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let mut this = self.primitive(name.clone());
        this.key = this
            .properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id);
        this
    }

    pub fn primitive(self, name: impl Into<String>) -> Self {
        self.property(name, PropertyKind::Primitive, ResourceTypeKind::Primitive)
    }

    pub fn complex(self, name: impl Into<String>) -> Self {
        self.property(name, PropertyKind::Complex, ResourceTypeKind::Complex)
    }

    /// Single-valued navigation to an entity type.
    pub fn reference(self, name: impl Into<String>) -> Self {
        self.property(
            name,
            PropertyKind::ResourceReference,
            ResourceTypeKind::Entity,
        )
    }

    /// Collection-valued navigation to an entity type.
    pub fn collection(self, name: impl Into<String>) -> Self {
        self.property(
            name,
            PropertyKind::ResourceSetReference,
            ResourceTypeKind::Entity,
        )
    }

    #[must_use]
    pub fn build(self) -> Arc<ResourceType> {
        let by_name = self
            .properties
            .iter()
            .map(|p| (p.name.clone(), p.id))
            .collect();
        Arc::new(ResourceType {
            name: self.name,
            kind: self.kind,
            properties: self.properties,
            by_name,
            key: self.key,
        })
    }
}

bitflags! {
    /// Access rights configured for an entity set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EntitySetRights: u8 {
        const READ_SINGLE = 1;
        const READ_MULTIPLE = 1 << 1;
        const WRITE_APPEND = 1 << 2;
        const WRITE_REPLACE = 1 << 3;
        const WRITE_DELETE = 1 << 4;
        const WRITE_MERGE = 1 << 5;
        const READ_ALL = Self::READ_SINGLE.bits() | Self::READ_MULTIPLE.bits();
        const WRITE_ALL = Self::WRITE_APPEND.bits()
            | Self::WRITE_REPLACE.bits()
            | Self::WRITE_DELETE.bits()
            | Self::WRITE_MERGE.bits();
        const ALL = Self::READ_ALL.bits() | Self::WRITE_ALL.bits();
    }
}

/// Access-checked handle to a named entity set.
#[derive(Clone, Debug)]
pub struct ResourceSetWrapper {
    name: Arc<str>,
    resource_type: Arc<ResourceType>,
    rights: EntitySetRights,
}

impl ResourceSetWrapper {
    #[must_use]
    pub fn new(name: impl Into<String>, resource_type: Arc<ResourceType>) -> Self {
        Self {
            name: Arc::from(name.into()),
            resource_type,
            rights: EntitySetRights::ALL,
        }
    }

    #[must_use]
    pub fn with_rights(mut self, rights: EntitySetRights) -> Self {
        self.rights = rights;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn resource_type(&self) -> &Arc<ResourceType> {
        &self.resource_type
    }

    #[must_use]
    pub fn rights(&self) -> EntitySetRights {
        self.rights
    }

    /// A set without any rights is hidden from the service.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.rights.is_empty()
    }
}
