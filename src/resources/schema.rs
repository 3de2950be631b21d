use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::types::Row;

/// Value type of a resource column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Uuid,
    Number,
    Integer,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// RFC 3339 timestamp (a naive timestamp is read as UTC)
    Timestamp,
    Bool,
    /// Text restricted to a fixed set of values
    OneOf(&'static [&'static str]),
}

/// Lower bound applied to numeric fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Unbounded,
    Positive,
    NonNegative,
}

/// When a field may appear in a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present on create, never null
    Required,
    /// Accepted on create and update
    Optional,
    /// Accepted on update only
    UpdateOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Declarative description of one writable column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    pub bound: Bound,
    /// Only callers with admin rights may set this field
    pub admin_only: bool,
    /// Null is accepted and clears the column
    pub nullable: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, presence: Presence) -> Self {
        Self {
            name,
            kind,
            presence,
            bound: Bound::Unbounded,
            admin_only: false,
            nullable: !matches!(presence, Presence::Required),
        }
    }

    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, Presence::Required)
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, Presence::Optional)
    }

    pub const fn update_only(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, Presence::UpdateOnly)
    }

    /// Must be strictly greater than zero
    pub const fn positive(self) -> Self {
        Self {
            bound: Bound::Positive,
            ..self
        }
    }

    /// Must be zero or greater
    pub const fn non_negative(self) -> Self {
        Self {
            bound: Bound::NonNegative,
            ..self
        }
    }

    pub const fn admin_only(self) -> Self {
        Self {
            admin_only: true,
            ..self
        }
    }

    /// Once set, the column can only be overwritten with another value
    pub const fn non_null(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    pub fn accepted_in(&self, mode: Mode) -> bool {
        mode == Mode::Update || self.presence != Presence::UpdateOnly
    }

    /// Check and normalise a single non-null value
    fn coerce(&self, value: &Value) -> Result<Value, String> {
        let coerced = match self.kind {
            FieldKind::Text => Value::String(expect_str(value)?.to_string()),
            FieldKind::Uuid => {
                let text = expect_str(value)?;
                let id = Uuid::parse_str(text).map_err(|_| format!("Invalid UUID format: {}", text))?;
                Value::String(id.to_string())
            }
            FieldKind::Number => {
                let n = value.as_f64().ok_or_else(|| "Must be a number".to_string())?;
                self.check_bound(n)?;
                value.clone()
            }
            FieldKind::Integer => {
                let n = as_integer(value).ok_or_else(|| "Must be an integer".to_string())?;
                self.check_bound(n as f64)?;
                Value::Number(Number::from(n))
            }
            FieldKind::Date => {
                let text = expect_str(value)?;
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|_| format!("Invalid date format (expected YYYY-MM-DD): {}", text))?;
                Value::String(date.format("%Y-%m-%d").to_string())
            }
            FieldKind::Timestamp => {
                let text = expect_str(value)?;
                let at = parse_timestamp(text).ok_or_else(|| format!("Invalid timestamp format: {}", text))?;
                Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldKind::Bool => Value::Bool(value.as_bool().ok_or_else(|| "Must be a boolean".to_string())?),
            FieldKind::OneOf(allowed) => {
                let text = expect_str(value)?;
                if !allowed.contains(&text) {
                    return Err(format!("Must be one of: {}", allowed.join(", ")));
                }
                Value::String(text.to_string())
            }
        };
        Ok(coerced)
    }

    fn check_bound(&self, n: f64) -> Result<(), String> {
        match self.bound {
            Bound::Positive if n <= 0.0 => Err("Must be greater than 0".to_string()),
            Bound::NonNegative if n < 0.0 => Err("Must be greater than or equal to 0".to_string()),
            _ => Ok(()),
        }
    }
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "Must be a string".to_string())
}

fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Field-level validation failure of a request body
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationErrors {
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    fn body(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }
}

/// Validate a request body against `fields`.
///
/// Returns the normalised values of the accepted fields present in
/// `payload`. Keys that are not accepted in `mode` are dropped. Every
/// offending field is reported, not just the first.
pub fn validate(fields: &[FieldSpec], payload: &Value, mode: Mode) -> Result<Row, ValidationErrors> {
    let object = payload
        .as_object()
        .ok_or_else(|| ValidationErrors::body("Request body must be a JSON object"))?;

    let mut record = Row::new();
    let mut field_errors = BTreeMap::new();

    for field in fields.iter().filter(|f| f.accepted_in(mode)) {
        match object.get(field.name) {
            None if mode == Mode::Create && field.presence == Presence::Required => {
                field_errors.insert(field.name.to_string(), "This field is required".to_string());
            }
            None => {}
            Some(Value::Null) if !field.nullable => {
                field_errors.insert(field.name.to_string(), "This field cannot be null".to_string());
            }
            Some(Value::Null) => {
                record.insert(field.name.to_string(), Value::Null);
            }
            Some(value) => match field.coerce(value) {
                Ok(coerced) => {
                    record.insert(field.name.to_string(), coerced);
                }
                Err(reason) => {
                    field_errors.insert(field.name.to_string(), reason);
                }
            },
        }
    }

    if field_errors.is_empty() {
        Ok(record)
    } else {
        Err(ValidationErrors {
            message: "Invalid request body".to_string(),
            field_errors,
        })
    }
}

/// Names of the fields in `payload` that `fields` accepts in `mode`
pub fn recognized_fields<'a>(fields: &'a [FieldSpec], payload: &Value, mode: Mode) -> Vec<&'a str> {
    let Some(object) = payload.as_object() else {
        return vec![];
    };
    fields
        .iter()
        .filter(|f| f.accepted_in(mode) && object.contains_key(f.name))
        .map(|f| f.name)
        .collect()
}
