use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, LazyLock};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use regex::Regex;

use super::{EdmType, LiteralError, TypeCode};
use crate::value::Value;

#[allow(clippy::expect_used)] // constant pattern
static DATETIME_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^datetime'(\d{4})-(\d{2})-(\d{2})((\s|T)([0-1][0-9]|2[0-4]):([0-5][0-9])(:([0-5][0-9])([Z]|[\+|-]\d{2}:\d{2})?)?)?'$",
    )
    .expect("static regex should not panic")
});

const PREFIX: &str = "datetime'";
const ODATA_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Source of the current instant.
pub type Clock = Arc<dyn Fn() -> chrono::DateTime<Utc> + Send + Sync>;

/// `Edm.DateTime`
#[derive(Clone)]
pub struct DateTime {
    clock: Clock,
}

impl Default for DateTime {
    fn default() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateTime").finish_non_exhaustive()
    }
}

impl DateTime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    #[must_use]
    pub fn now(&self) -> Value {
        Value::DateTime((self.clock)())
    }

    #[must_use]
    pub fn year(value: &Value) -> Option<i32> {
        as_datetime(value).map(Datelike::year)
    }

    #[must_use]
    pub fn month(value: &Value) -> Option<u32> {
        as_datetime(value).map(Datelike::month)
    }

    #[must_use]
    pub fn day(value: &Value) -> Option<u32> {
        as_datetime(value).map(Datelike::day)
    }

    #[must_use]
    pub fn hour(value: &Value) -> Option<u32> {
        as_datetime(value).map(Timelike::hour)
    }

    #[must_use]
    pub fn minute(value: &Value) -> Option<u32> {
        as_datetime(value).map(Timelike::minute)
    }

    #[must_use]
    pub fn second(value: &Value) -> Option<u32> {
        as_datetime(value).map(Timelike::second)
    }

    /// Chronological order of two datetime values; `None` if either is not one.
    #[must_use]
    pub fn datetime_cmp(a: &Value, b: &Value) -> Option<Ordering> {
        Some(as_datetime(a)?.cmp(as_datetime(b)?))
    }

    fn invalid(&self, literal: &str) -> LiteralError {
        LiteralError::Invalid {
            type_name: self.full_type_name(),
            literal: literal.to_owned(),
        }
    }
}

impl EdmType for DateTime {
    fn type_code(&self) -> TypeCode {
        TypeCode::DateTime
    }

    fn is_compatible_with(&self, other: TypeCode) -> bool {
        other == TypeCode::DateTime
    }

    fn validate(&self, literal: &str) -> Option<String> {
        if !DATETIME_LITERAL.is_match(literal) {
            return None;
        }
        let inner = &literal[PREFIX.len()..literal.len() - 1];
        let value = strip_offset(inner);
        parse(value)?;
        Some(format!("'{value}'"))
    }

    fn convert(&self, literal: &str) -> Result<Value, LiteralError> {
        let inner = literal.trim_matches('\'');
        parse(strip_offset(inner))
            .map(|naive| Value::DateTime(naive.and_utc()))
            .ok_or_else(|| self.invalid(literal))
    }

    fn convert_to_odata(&self, value: &Value) -> Result<String, LiteralError> {
        match value {
            Value::DateTime(dt) => {
                let formatted = dt.format(ODATA_FORMAT).to_string();
                Ok(format!("{PREFIX}{}'", urlencoding::encode(&formatted)))
            }
            other => Err(LiteralError::Unsupported {
                type_name: self.full_type_name(),
                got: other.kind_name(),
            }),
        }
    }

    fn full_type_name(&self) -> &'static str {
        "Edm.DateTime"
    }
}

fn as_datetime(value: &Value) -> Option<&chrono::DateTime<Utc>> {
    match value {
        Value::DateTime(dt) => Some(dt),
        _ => None,
    }
}

/// Drop a trailing `±hh:mm` offset from a full `YYYY-MM-DDThh:mm:ss` value.
fn strip_offset(value: &str) -> &str {
    let Some(offset_at) = value.len().checked_sub(6) else {
        return value;
    };
    if offset_at > 18 && matches!(value.as_bytes().get(offset_at), Some(b'+' | b'-')) {
        return &value[..offset_at];
    }
    value
}

fn parse(value: &str) -> Option<NaiveDateTime> {
    let normalized = value.trim_end_matches('Z').replacen(' ', "T", 1);
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Value {
        Value::DateTime(Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap())
    }

    #[test]
    fn validate_strips_prefix_and_offset() {
        let dt = DateTime::new();

        assert_eq!(dt.validate("datetime'2024-02-29'").as_deref(), Some("'2024-02-29'"));
        assert_eq!(
            dt.validate("datetime'2024-02-29T10:20'").as_deref(),
            Some("'2024-02-29T10:20'")
        );
        assert_eq!(
            dt.validate("datetime'2024-02-29 10:20:30Z'").as_deref(),
            Some("'2024-02-29 10:20:30Z'")
        );
        assert_eq!(
            dt.validate("datetime'2024-02-29T10:20:30+02:00'").as_deref(),
            Some("'2024-02-29T10:20:30'")
        );
        assert_eq!(
            dt.validate("datetime'2024-02-29T10:20:30-05:00'").as_deref(),
            Some("'2024-02-29T10:20:30'")
        );
    }

    #[test]
    fn validate_rejects_bad_literals_and_impossible_dates() {
        let dt = DateTime::new();

        for bad in [
            "2024-02-29",
            "datetime'2024-2-29'",
            "datetime'2024-02-29T10'",
            "datetime'2024-02-29T10:61'",
            "datetime'2023-02-29'",
            "datetime'2024-13-01'",
            "datetime'2024-02-29T24:00:00'",
        ] {
            assert!(dt.validate(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn convert_reads_validated_form() {
        let dt = DateTime::new();
        let validated = dt.validate("datetime'2024-02-29T10:20:30+02:00'").unwrap();

        let value = dt.convert(&validated).unwrap();

        assert_eq!(value, utc(2024, 2, 29, 10, 20, 30));
        assert_eq!(dt.convert("2024-02-29").unwrap(), utc(2024, 2, 29, 0, 0, 0));
        assert!(dt.convert("'yesterday'").is_err());
    }

    #[test]
    fn convert_to_odata_urlencodes_the_value() {
        let dt = DateTime::new();

        let rendered = dt.convert_to_odata(&utc(2024, 2, 29, 10, 20, 30)).unwrap();

        assert_eq!(rendered, "datetime'2024-02-29T10%3A20%3A30'");
        assert!(dt.convert_to_odata(&Value::from(1)).is_err());
    }

    #[test]
    fn component_helpers_and_compare() {
        let a = utc(2021, 7, 4, 13, 45, 9);
        let b = utc(2021, 7, 5, 0, 0, 0);

        assert_eq!(DateTime::year(&a), Some(2021));
        assert_eq!(DateTime::month(&a), Some(7));
        assert_eq!(DateTime::day(&a), Some(4));
        assert_eq!(DateTime::hour(&a), Some(13));
        assert_eq!(DateTime::minute(&a), Some(45));
        assert_eq!(DateTime::second(&a), Some(9));
        assert_eq!(DateTime::datetime_cmp(&a, &b), Some(Ordering::Less));
        assert_eq!(DateTime::datetime_cmp(&b, &b), Some(Ordering::Equal));
        assert_eq!(DateTime::year(&Value::from("2021")), None);
        assert_eq!(DateTime::datetime_cmp(&a, &Value::Null), None);
    }

    #[test]
    fn now_reads_injected_clock() {
        let fixed = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let dt = DateTime::with_clock(Arc::new(move || fixed));

        assert_eq!(dt.now(), Value::DateTime(fixed));
        assert!(dt.is_compatible_with(TypeCode::DateTime));
        assert!(!dt.is_compatible_with(TypeCode::Double));
        assert_eq!(dt.type_code(), TypeCode::DateTime);
    }
}
