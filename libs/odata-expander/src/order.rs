//! Ordering primitives and the sort adapter for expanded collections.
//!
//! [`ODataOrderBy`] is the textual, name-based form of `$orderby`.
//! [`OrderSpec`] is the resolved form: a list of key extractors with
//! directions, turned into a comparator for a stable sort.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::ExpandError;
use crate::metadata::{PropertyKind, ResourceProperty, ResourceType};
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// Apply this direction to an ascending comparison result.
    #[must_use]
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

/// Name-based `$orderby`, e.g. `Name desc, OrderID`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct ODataOrderBy(pub Vec<OrderKey>);

impl ODataOrderBy {
    /// Parse the `$orderby` query form: `field [asc|desc]` items separated by commas.
    ///
    /// # Errors
    /// Returns `ExpandError::InvalidOrderBy` for an empty clause, an empty item,
    /// an unknown direction or trailing tokens.
    pub fn parse(raw: &str) -> Result<Self, ExpandError> {
        let mut out = Vec::new();
        for item in raw.split(',') {
            let mut tokens = item.split_whitespace();
            let field = tokens
                .next()
                .ok_or_else(|| ExpandError::InvalidOrderBy(format!("empty item in `{raw}`")))?;
            let dir = match tokens.next() {
                None => SortDir::Asc,
                Some(t) if t.eq_ignore_ascii_case("asc") => SortDir::Asc,
                Some(t) if t.eq_ignore_ascii_case("desc") => SortDir::Desc,
                Some(t) => {
                    return Err(ExpandError::InvalidOrderBy(format!(
                        "unknown direction `{t}` for `{field}`"
                    )));
                }
            };
            if let Some(extra) = tokens.next() {
                return Err(ExpandError::InvalidOrderBy(format!(
                    "unexpected `{extra}` after `{field}`"
                )));
            }
            out.push(OrderKey {
                field: field.to_owned(),
                dir,
            });
        }
        Ok(Self(out))
    }

    /// Resolve field names against `resource_type` into an [`OrderSpec`].
    ///
    /// # Errors
    /// Returns `ExpandError::UnknownProperty` for an undeclared field and
    /// `ExpandError::InvalidOrderBy` for a field that is not primitive.
    pub fn resolve(&self, resource_type: &ResourceType) -> Result<OrderSpec, ExpandError> {
        let mut spec = OrderSpec::new();
        for key in &self.0 {
            let property = resource_type.property(&key.field).ok_or_else(|| {
                ExpandError::UnknownProperty {
                    type_name: resource_type.name().to_owned(),
                    property: key.field.clone(),
                }
            })?;
            if property.kind() != PropertyKind::Primitive {
                return Err(ExpandError::InvalidOrderBy(format!(
                    "`{}` is not a primitive property of `{}`",
                    key.field,
                    resource_type.name()
                )));
            }
            spec = spec.then_by_property(property, key.dir);
        }
        Ok(spec.with_description(self.clone()))
    }
}

/// Renders the `$orderby` query form with explicit directions.
impl std::fmt::Display for ODataOrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", key.field, key.dir.as_str())?;
        }
        Ok(())
    }
}

/// Maps an entity to its sort key.
pub type KeyExtractor = Arc<dyn Fn(&Entity) -> Value + Send + Sync>;

/// Resolved ordering: extractors evaluated in sequence, first non-equal key decides.
#[derive(Clone, Default)]
#[must_use]
pub struct OrderSpec {
    keys: Vec<(KeyExtractor, SortDir)>,
    description: Option<ODataOrderBy>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_by<F>(mut self, extractor: F, dir: SortDir) -> Self
    where
        F: Fn(&Entity) -> Value + Send + Sync + 'static,
    {
        self.keys.push((Arc::new(extractor), dir));
        self
    }

    /// Order by a primitive slot; unset or non-primitive slots read as `Null`.
    pub fn then_by_property(self, property: &ResourceProperty, dir: SortDir) -> Self {
        let id = property.id();
        self.then_by(
            move |e: &Entity| e.primitive(id).cloned().unwrap_or(Value::Null),
            dir,
        )
    }

    fn with_description(mut self, description: ODataOrderBy) -> Self {
        self.description = Some(description);
        self
    }

    /// The `$orderby` this spec was resolved from, when built by [`ODataOrderBy::resolve`].
    #[must_use]
    pub fn description(&self) -> Option<&ODataOrderBy> {
        self.description.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        for (extract, dir) in &self.keys {
            let ord = dir.apply(extract(a).compare(&extract(b)));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Two-argument comparator for generic sorts.
    pub fn comparator(&self) -> impl Fn(&Entity, &Entity) -> Ordering + '_ {
        move |a, b| self.compare(a, b)
    }

    /// Stable sort: entities with equal keys keep their input order.
    pub fn sort(&self, entities: &mut [Entity]) {
        if self.keys.is_empty() {
            return;
        }
        entities.sort_by(self.comparator());
    }
}

impl std::fmt::Debug for OrderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dirs: Vec<SortDir> = self.keys.iter().map(|(_, d)| *d).collect();
        f.debug_struct("OrderSpec")
            .field("keys", &dirs)
            .field("description", &self.description)
            .finish()
    }
}
