//! EDM primitive types used for `OData` literals.
//!
//! Each type validates the literal form found in a URI, converts it to a
//! [`Value`] and renders a value back into URI form.

mod datetime;
mod double;

pub use datetime::{Clock, DateTime};
pub use double::Double;

use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeCode {
    Binary,
    Boolean,
    Byte,
    DateTime,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    String,
    Navigation,
    Void,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("invalid {type_name} literal: {literal}")]
    Invalid {
        type_name: &'static str,
        literal: String,
    },

    #[error("{type_name} cannot represent a {got} value")]
    Unsupported {
        type_name: &'static str,
        got: &'static str,
    },
}

pub trait EdmType {
    fn type_code(&self) -> TypeCode;

    /// Whether a value of `other` can be used where this type is expected.
    fn is_compatible_with(&self, other: TypeCode) -> bool;

    /// Validate a URI literal; returns its stripped form on success.
    fn validate(&self, literal: &str) -> Option<String>;

    /// Convert a stripped literal into a value.
    ///
    /// # Errors
    /// `LiteralError::Invalid` when the literal does not denote a value of this type.
    fn convert(&self, literal: &str) -> Result<Value, LiteralError>;

    /// Render `value` in URI literal form.
    ///
    /// # Errors
    /// `LiteralError::Unsupported` when `value` is of another kind.
    fn convert_to_odata(&self, value: &Value) -> Result<String, LiteralError>;

    fn full_type_name(&self) -> &'static str;

    fn name(&self) -> &'static str {
        self.full_type_name()
    }
}
