//! Field descriptors for domain classes
//!
//! Includes field kinds, per-field constraints, and the column mapping used
//! by SQL rendering.

use serde::{Deserialize, Serialize};

use crate::value::{BoolEncoding, Value};

/// Delete-time policy for rows holding a foreign key into a deleted object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Delete the dependent row as well
    Cascade,
    /// Null the dependent row's reference and keep the row
    Detach,
}

impl Default for DeletePolicy {
    fn default() -> Self {
        DeletePolicy::Detach
    }
}

/// Field kind with validation rules and value conversion behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    /// 64-bit integer field
    Int,

    /// Text field
    Text,

    /// Boolean field with a configurable two-value encoding (default 1/0)
    Boolean {
        #[serde(default)]
        encoding: BoolEncoding,
    },

    /// Date field, stored as `YYYY-MM-DD`
    Date,

    /// Datetime field, stored as `YYYY-MM-DD HH:MM:SS`
    #[serde(rename = "datetime")]
    DateTime,

    /// Fixed-point decimal field
    Decimal,

    /// Foreign key into another domain class
    #[serde(rename = "foreignkey")]
    ForeignKey {
        /// Target domain class name
        target: String,
        /// What happens to this row when the target is deleted
        #[serde(default, rename = "onDelete")]
        on_delete: DeletePolicy,
    },

    /// Enumeration field with allowed string variants
    Enum {
        values: Vec<String>,
    },

    /// List of text items, comma-joined in the database
    #[serde(rename = "textlist")]
    TextList,
}

impl FieldKind {
    /// Boolean kind with the default 1/0 encoding
    pub fn boolean() -> Self {
        FieldKind::Boolean {
            encoding: BoolEncoding::default(),
        }
    }

    /// Foreign key with the default detach-on-delete policy
    pub fn foreign_key(target: impl Into<String>) -> Self {
        FieldKind::ForeignKey {
            target: target.into(),
            on_delete: DeletePolicy::default(),
        }
    }

    /// Short name of the kind, used in verification messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Text => "text",
            FieldKind::Boolean { .. } => "boolean",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Decimal => "decimal",
            FieldKind::ForeignKey { .. } => "link",
            FieldKind::Enum { .. } => "enum",
            FieldKind::TextList => "text list",
        }
    }

    /// The boolean encoding pair for this kind; the default pair for
    /// non-boolean kinds (they never render a boolean).
    pub fn bool_encoding(&self) -> BoolEncoding {
        match self {
            FieldKind::Boolean { encoding } => encoding.clone(),
            _ => BoolEncoding::default(),
        }
    }

    /// Check that a value is compatible with this kind.
    ///
    /// Null is always accepted here; null-vs-`not_null` is the caller's
    /// check. Enum values must be a declared variant; links must point at the
    /// declared target class.
    pub fn check_value(&self, value: &Value) -> std::result::Result<(), String> {
        if value.is_null() {
            return Ok(());
        }

        match (self, value) {
            (FieldKind::Int, Value::Int(_)) => Ok(()),
            (FieldKind::Text, Value::Text(_)) => Ok(()),
            (FieldKind::Boolean { .. }, Value::Bool(_)) => Ok(()),
            (FieldKind::Date, Value::Date(_)) => Ok(()),
            (FieldKind::DateTime, Value::DateTime(_)) => Ok(()),
            (FieldKind::Decimal, Value::Decimal(_)) => Ok(()),
            (FieldKind::ForeignKey { target, .. }, Value::Link(link)) => {
                if link.class == *target {
                    Ok(())
                } else {
                    Err(format!(
                        "link points at class '{}', expected '{}'",
                        link.class, target
                    ))
                }
            }
            (FieldKind::Enum { values }, Value::Enum(variant)) => {
                if values.contains(variant) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is not one of the declared variants {:?}",
                        variant, values
                    ))
                }
            }
            (FieldKind::TextList, Value::TextList(_)) => Ok(()),
            _ => Err(format!(
                "expected a {} value, got {}",
                self.kind_name(),
                value.kind_name()
            )),
        }
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// A single typed field descriptor within a domain class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, unique within the class's full inherited field set
    pub name: String,

    /// Field kind with conversion and validation rules
    #[serde(flatten)]
    pub kind: FieldKind,

    /// Whether null values are rejected at verification (default: allowed)
    #[serde(default, rename = "notNull", skip_serializing_if = "is_false")]
    pub not_null: bool,

    /// Whether values must be unique across the class (default: false)
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    /// Default value applied when the field was never set
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Database column name; defaults to the field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// For foreign-key fields only: name of the reciprocal link field on the
    /// target class that this field constrains to a subset of. Used by the
    /// subset-consistency verification check.
    #[serde(rename = "subsetOf", skip_serializing_if = "Option::is_none")]
    pub subset_of: Option<String>,
}

impl FieldDef {
    /// Create a new field descriptor with a name and kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            not_null: false,
            unique: false,
            default_value: None,
            column: None,
            subset_of: None,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::boolean())
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Decimal)
    }

    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, FieldKind::foreign_key(target))
    }

    pub fn enumeration(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(name, FieldKind::Enum { values })
    }

    pub fn text_list(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::TextList)
    }

    /// Reject null values at verification
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Require values to be unique across the class
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set a default value
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Map the field onto a differently named database column
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Cascade-delete dependent rows instead of detaching them.
    /// Only meaningful on foreign-key fields.
    pub fn cascade(mut self) -> Self {
        if let FieldKind::ForeignKey { on_delete, .. } = &mut self.kind {
            *on_delete = DeletePolicy::Cascade;
        }
        self
    }

    /// Declare this link a constrained subset of the target's `field` relation
    pub fn subset_of(mut self, field: impl Into<String>) -> Self {
        self.subset_of = Some(field.into());
        self
    }

    /// Use a non-default boolean encoding pair.
    /// Only meaningful on boolean fields.
    pub fn bool_encoding(mut self, pair: BoolEncoding) -> Self {
        if let FieldKind::Boolean { encoding } = &mut self.kind {
            *encoding = pair;
        }
        self
    }

    /// The database column this field maps onto
    pub fn db_column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// Target class and delete policy, for foreign-key fields
    pub fn link_target(&self) -> Option<(&str, DeletePolicy)> {
        match &self.kind {
            FieldKind::ForeignKey { target, on_delete } => Some((target.as_str(), *on_delete)),
            _ => None,
        }
    }

    /// Render a value of this field as a SQL literal
    pub fn value_to_sql(&self, value: &Value) -> String {
        value.to_sql(&self.kind.bool_encoding())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::LinkRef;

    // =========================================================================
    // Kind Checking Tests
    // =========================================================================

    #[test]
    fn test_check_value_matching_kinds() {
        assert!(FieldKind::Int.check_value(&Value::Int(5)).is_ok());
        assert!(FieldKind::Text.check_value(&Value::Text("x".into())).is_ok());
        assert!(FieldKind::boolean().check_value(&Value::Bool(true)).is_ok());
    }

    #[test]
    fn test_check_value_mismatch() {
        let err = FieldKind::Int
            .check_value(&Value::Text("5".into()))
            .unwrap_err();
        assert!(err.contains("expected a int"));
    }

    #[test]
    fn test_check_value_null_always_ok() {
        // Null-vs-notNull is the verifier's concern, not the kind's
        assert!(FieldKind::Int.check_value(&Value::Null).is_ok());
        assert!(FieldKind::Text.check_value(&Value::Null).is_ok());
    }

    #[test]
    fn test_check_value_enum_membership() {
        let kind = FieldKind::Enum {
            values: vec!["open".to_string(), "closed".to_string()],
        };
        assert!(kind.check_value(&Value::Enum("open".into())).is_ok());
        assert!(kind.check_value(&Value::Enum("OPEN".into())).is_err());
    }

    #[test]
    fn test_check_value_link_target_class() {
        let kind = FieldKind::foreign_key("client");
        assert!(kind
            .check_value(&Value::Link(LinkRef::new("client", 1)))
            .is_ok());
        let err = kind
            .check_value(&Value::Link(LinkRef::new("invoice", 1)))
            .unwrap_err();
        assert!(err.contains("expected 'client'"));
    }

    // =========================================================================
    // Builder Tests
    // =========================================================================

    #[test]
    fn test_field_def_defaults() {
        let f = FieldDef::text("name");
        assert_eq!(f.name, "name");
        assert!(!f.not_null);
        assert!(!f.unique);
        assert!(f.default_value.is_none());
        assert_eq!(f.db_column(), "name");
    }

    #[test]
    fn test_field_def_chained_builders() {
        let f = FieldDef::text("email")
            .not_null()
            .unique()
            .column("email_addr");
        assert!(f.not_null);
        assert!(f.unique);
        assert_eq!(f.db_column(), "email_addr");
    }

    #[test]
    fn test_cascade_marks_link_field() {
        let f = FieldDef::link("client", "client").cascade();
        assert_eq!(f.link_target(), Some(("client", DeletePolicy::Cascade)));
    }

    #[test]
    fn test_link_default_policy_is_detach() {
        let f = FieldDef::link("client", "client");
        assert_eq!(f.link_target(), Some(("client", DeletePolicy::Detach)));
    }

    #[test]
    fn test_subset_of_marker() {
        let f = FieldDef::link("priority_invoice", "invoice").subset_of("client");
        assert_eq!(f.subset_of.as_deref(), Some("client"));
    }

    #[test]
    fn test_bool_encoding_builder() {
        let f = FieldDef::boolean("active").bool_encoding(BoolEncoding::new("y", "n"));
        assert_eq!(f.value_to_sql(&Value::Bool(true)), "'y'");
    }

    // =========================================================================
    // Serialization Tests
    // =========================================================================

    #[test]
    fn test_field_def_deserialization() {
        let json = r#"{"name":"email","kind":"text","notNull":true,"unique":true}"#;
        let f: FieldDef = serde_json::from_str(json).unwrap();
        assert_eq!(f.name, "email");
        assert!(matches!(f.kind, FieldKind::Text));
        assert!(f.not_null);
        assert!(f.unique);
    }

    #[test]
    fn test_foreign_key_deserialization() {
        let json = r#"{"name":"client","kind":"foreignkey","target":"client","onDelete":"cascade"}"#;
        let f: FieldDef = serde_json::from_str(json).unwrap();
        assert_eq!(f.link_target(), Some(("client", DeletePolicy::Cascade)));
    }

    #[test]
    fn test_enum_serialization_round_trip() {
        let f = FieldDef::enumeration("status", vec!["open".to_string(), "paid".to_string()]);
        let json = serde_json::to_string(&f).unwrap();
        let back: FieldDef = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
