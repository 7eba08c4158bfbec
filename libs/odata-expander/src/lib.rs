#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `OData` request expansion engine.
//!
//! Given a request whose top-level result has already been fetched, the
//! engine walks the request's projection tree and materializes every
//! `$expand`ed navigation property through a [`ProvidersWrapper`]:
//!
//! - single-valued navigations are fetched, expanded recursively and written
//!   into the parent's reference slot (an absent entity is written as `null`)
//! - collection-valued navigations are fetched, ordered with the node's
//!   `$orderby` (stable), limited by `$top` and the target set's page size,
//!   expanded recursively and written into the parent's collection slot
//!
//! URI parsing, serialization and the HTTP layer live elsewhere; this crate
//! only consumes a pre-built [`ProjectionNode`] tree.
//!
//! ```ignore
//! use odata_expander::{expand, RequestDescription, SegmentStack, TargetResult};
//!
//! let mut request = RequestDescription::new("Customers", customers_set)
//!     .with_root_projection_node(root)
//!     .with_target_result(TargetResult::Collection(customers));
//! let mut stack = SegmentStack::new();
//! expand(&mut request, &provider, &mut stack)?;
//! ```

pub mod config;
pub mod edm;
pub mod entity;
pub mod error;
pub mod expander;
pub mod metadata;
pub mod order;
pub mod projection;
pub mod provider;
pub mod request;
pub mod segment_stack;
pub mod value;

pub use config::ExpansionConfig;
pub use entity::{Entity, PropertyValue};
pub use error::ExpandError;
pub use expander::{RequestExpander, expand};
pub use metadata::{
    EntitySetRights, PropertyId, PropertyKind, ResourceProperty, ResourceSetWrapper, ResourceType,
    ResourceTypeKind,
};
pub use order::{ODataOrderBy, OrderKey, OrderSpec, SortDir};
pub use projection::{ExpandedNode, NodeKind, ProjectionNode};
pub use provider::{ODataService, ProvidersWrapper, QueryResult, RelatedSetQuery};
pub use request::{RequestDescription, TargetResult};
pub use segment_stack::{SegmentGuard, SegmentStack};
pub use value::Value;
