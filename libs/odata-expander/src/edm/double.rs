use std::str::FromStr;
use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use regex::Regex;

use super::{EdmType, LiteralError, TypeCode};
use crate::value::Value;

// Integral literals are doubles too; a trailing `d`/`D` forces the type.
#[allow(clippy::expect_used)] // constant pattern
static DOUBLE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d+(\.\d+)?([Ee][+-]?\d+)?[dD]?$").expect("static regex should not panic")
});

/// `Edm.Double`
#[derive(Clone, Copy, Debug, Default)]
pub struct Double;

impl EdmType for Double {
    fn type_code(&self) -> TypeCode {
        TypeCode::Double
    }

    fn is_compatible_with(&self, other: TypeCode) -> bool {
        matches!(
            other,
            TypeCode::Byte
                | TypeCode::SByte
                | TypeCode::Int16
                | TypeCode::Int32
                | TypeCode::Int64
                | TypeCode::Single
                | TypeCode::Double
        )
    }

    fn validate(&self, literal: &str) -> Option<String> {
        if !DOUBLE_LITERAL.is_match(literal) {
            return None;
        }
        Some(literal.trim_end_matches(['d', 'D']).to_owned())
    }

    fn convert(&self, literal: &str) -> Result<Value, LiteralError> {
        BigDecimal::from_str(literal.trim_end_matches(['d', 'D']))
            .map(Value::Number)
            .map_err(|_| LiteralError::Invalid {
                type_name: self.full_type_name(),
                literal: literal.to_owned(),
            })
    }

    fn convert_to_odata(&self, value: &Value) -> Result<String, LiteralError> {
        match value {
            Value::Number(n) => Ok(format!("{n}D")),
            other => Err(LiteralError::Unsupported {
                type_name: self.full_type_name(),
                got: other.kind_name(),
            }),
        }
    }

    fn full_type_name(&self) -> &'static str {
        "Edm.Double"
    }
}
