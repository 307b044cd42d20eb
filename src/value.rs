//! Typed field values for domain objects
//!
//! Includes the `Value` enum, SQL literal rendering, text escaping, and the
//! comparators shared by in-memory predicate evaluation and result ordering.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Render format for date values, `YYYY-MM-DD`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render format for datetime values, `YYYY-MM-DD HH:MM:SS`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A lazy reference to another domain object: target class plus primary key.
///
/// Reading a foreign-key field yields one of these (wrapped in
/// [`Value::Link`]), never an eagerly loaded object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkRef {
    /// Target domain class name
    pub class: String,
    /// Primary key of the target object
    pub key: i64,
}

impl LinkRef {
    pub fn new(class: impl Into<String>, key: i64) -> Self {
        Self {
            class: class.into(),
            key,
        }
    }
}

/// Two-value encoding pair for boolean fields (default `1`/`0`)
///
/// Encodings that parse as integers render unquoted in SQL; anything else is
/// rendered as a quoted text literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoolEncoding {
    #[serde(rename = "true")]
    pub true_repr: String,
    #[serde(rename = "false")]
    pub false_repr: String,
}

impl Default for BoolEncoding {
    fn default() -> Self {
        Self {
            true_repr: "1".to_string(),
            false_repr: "0".to_string(),
        }
    }
}

impl BoolEncoding {
    /// Create an encoding pair, e.g. `BoolEncoding::new("y", "n")`
    pub fn new(true_repr: impl Into<String>, false_repr: impl Into<String>) -> Self {
        Self {
            true_repr: true_repr.into(),
            false_repr: false_repr.into(),
        }
    }

    /// Render a boolean through this encoding as a SQL literal
    pub fn render(&self, value: bool) -> String {
        let repr = if value {
            &self.true_repr
        } else {
            &self.false_repr
        };
        if repr.parse::<i64>().is_ok() {
            repr.clone()
        } else {
            quote_text(repr)
        }
    }

    /// Decode a raw database value back into a boolean
    pub fn decode(&self, raw: &str) -> Option<bool> {
        if raw == self.true_repr {
            Some(true)
        } else if raw == self.false_repr {
            Some(false)
        } else {
            None
        }
    }
}

/// A single typed field value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Absent optional value, rendered as SQL `null`
    Null,
    Int(i64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Decimal(Decimal),
    /// Foreign-key reference: the target's primary key on write, a proxy seed on read
    Link(LinkRef),
    /// One of a field's declared enumeration variants
    Enum(String),
    /// Comma-joined on write, comma-split on read
    TextList(Vec<String>),
}

impl Value {
    /// Short name of the value's kind, used in verification messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::Bool(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Decimal(_) => "decimal",
            Value::Link(_) => "link",
            Value::Enum(_) => "enum",
            Value::TextList(_) => "text list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render this value as a SQL literal.
    ///
    /// Booleans go through the supplied encoding pair; text is single-quoted
    /// with `'` doubled and `\` escaped; dates and datetimes use the fixed
    /// formats; links render as the bare target key.
    pub fn to_sql(&self, bool_encoding: &BoolEncoding) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Text(s) => quote_text(s),
            Value::Bool(b) => bool_encoding.render(*b),
            Value::Date(d) => format!("'{}'", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => format!("'{}'", dt.format(DATETIME_FORMAT)),
            Value::Decimal(d) => d.to_string(),
            Value::Link(link) => link.key.to_string(),
            Value::Enum(variant) => quote_text(variant),
            Value::TextList(items) => quote_text(&items.join(",")),
        }
    }

    /// Parse a date from its fixed `YYYY-MM-DD` form
    pub fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| format!("'{}' is not a valid date: {}", raw, e))
    }

    /// Parse a datetime from its fixed `YYYY-MM-DD HH:MM:SS` form
    pub fn parse_datetime(raw: &str) -> std::result::Result<NaiveDateTime, String> {
        NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
            .map_err(|e| format!("'{}' is not a valid datetime: {}", raw, e))
    }
}

/// Escape a text payload for inclusion in a single-quoted SQL literal:
/// pre-existing backslashes are escaped first, then `'` is doubled.
pub fn escape_text(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "''")
}

/// Quote a text payload as a SQL literal
pub fn quote_text(raw: &str) -> String {
    format!("'{}'", escape_text(raw))
}

/// Strict same-variant comparator.
///
/// Returns `None` for null operands and mixed variants, mirroring SQL
/// comparison semantics where such comparisons match nothing.
pub fn strict_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total comparator used for in-memory `order by`: nulls sort first, mixed
/// variants fall back to a fixed variant rank.
pub fn order_cmp(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }
    if let Some(ord) = strict_cmp(left, right) {
        return ord;
    }
    match (left, right) {
        (Value::Link(a), Value::Link(b)) => a.key.cmp(&b.key),
        (Value::TextList(a), Value::TextList(b)) => a.cmp(b),
        _ => variant_rank(left).cmp(&variant_rank(right)),
    }
}

fn variant_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) => 2,
        Value::Decimal(_) => 3,
        Value::Text(_) => 4,
        Value::Enum(_) => 5,
        Value::Date(_) => 6,
        Value::DateTime(_) => 7,
        Value::Link(_) => 8,
        Value::TextList(_) => 9,
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<LinkRef> for Value {
    fn from(v: LinkRef) -> Self {
        Value::Link(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::TextList(v)
    }
}
