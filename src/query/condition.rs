//! Boolean conditions over domain-class fields
//!
//! Every condition renders a fully table-qualified SQL fragment and
//! independently evaluates the same truth value against an in-memory object.
//! The two readings are kept semantically identical: a condition accepts
//! exactly the same objects through `satisfies` as its rendered SQL does
//! against their rows.

use std::cmp::Ordering;

use crate::dobj::DomainObject;
use crate::error::{Result, StoreError};
use crate::field::FieldDef;
use crate::schema::{ClassSchema, SchemaRegistry};
use crate::value::{BoolEncoding, LinkRef, Value, escape_text, strict_cmp};

/// Pseudo-field name addressing a class's primary key
pub const PK_FIELD: &str = "pk";

/// A resolved reference to a field (or the primary key) of one domain class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub class: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(class: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            field: field.into(),
        }
    }

    /// Reference a class's primary key
    pub fn pk(class: impl Into<String>) -> Self {
        Self::new(class, PK_FIELD)
    }

    pub fn is_pk(&self) -> bool {
        self.field == PK_FIELD
    }
}

/// Ordering comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Lte,
    Gte,
    Gt,
}

impl CompareOp {
    fn sql(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::Gt => ">",
        }
    }

    fn matches(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Gt => ord == Ordering::Greater,
        }
    }

    /// True for the `<`/`<=` pair
    fn is_less(self) -> bool {
        matches!(self, CompareOp::Lt | CompareOp::Lte)
    }

    /// True for the inclusive variants
    fn is_inclusive(self) -> bool {
        matches!(self, CompareOp::Lte | CompareOp::Gte)
    }
}

/// Wildcard position of a `like` comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeAnchor {
    /// `needle%`
    Prefix,
    /// `%needle`
    Suffix,
    /// `%needle%`
    Contains,
}

/// Boolean connective of a compound condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

/// A boolean expression over one domain class's fields.
///
/// Structural equality and hashing double as the query-cache fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    Equals {
        field: FieldRef,
        value: Value,
    },
    Compare {
        field: FieldRef,
        op: CompareOp,
        value: Value,
    },
    Like {
        field: FieldRef,
        needle: String,
        anchor: LikeAnchor,
    },
    In {
        field: FieldRef,
        values: Vec<Value>,
    },
    Link {
        field: FieldRef,
        target: LinkRef,
    },
    Not(Box<Condition>),
    Compound {
        op: BoolOp,
        terms: Vec<Condition>,
    },
}

impl Condition {
    /// The domain class this condition ranges over
    pub fn class(&self) -> &str {
        &self.first_field().class
    }

    fn first_field(&self) -> &FieldRef {
        match self {
            Condition::Equals { field, .. }
            | Condition::Compare { field, .. }
            | Condition::Like { field, .. }
            | Condition::In { field, .. }
            | Condition::Link { field, .. } => field,
            Condition::Not(inner) => inner.first_field(),
            Condition::Compound { terms, .. } => terms[0].first_field(),
        }
    }

    /// Combine with another condition under logical AND, preserving order
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::Compound {
                op: BoolOp::And,
                mut terms,
            } => {
                terms.push(other);
                Condition::Compound {
                    op: BoolOp::And,
                    terms,
                }
            }
            first => Condition::Compound {
                op: BoolOp::And,
                terms: vec![first, other],
            },
        }
    }

    /// Combine with another condition under logical OR, preserving order
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Compound {
                op: BoolOp::Or,
                mut terms,
            } => {
                terms.push(other);
                Condition::Compound {
                    op: BoolOp::Or,
                    terms,
                }
            }
            first => Condition::Compound {
                op: BoolOp::Or,
                terms: vec![first, other],
            },
        }
    }

    /// Negate this condition
    pub fn negate(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    /// Render this condition as a table-qualified SQL fragment.
    ///
    /// The table name comes from the owning level of the referenced field;
    /// the column is the field's DB column, or the primary-key column for
    /// key comparisons.
    pub fn to_sql(&self, registry: &SchemaRegistry) -> Result<String> {
        match self {
            Condition::Equals { field, value } => {
                let (site, def) = resolve(field, registry)?;
                if value.is_null() {
                    Ok(format!("{} is null", site))
                } else {
                    Ok(format!("{} = {}", site, literal(def, value)))
                }
            }
            Condition::Compare { field, op, value } => {
                let (site, def) = resolve(field, registry)?;
                Ok(format!("{} {} {}", site, op.sql(), literal(def, value)))
            }
            Condition::Like {
                field,
                needle,
                anchor,
            } => {
                let (site, _) = resolve(field, registry)?;
                let pattern = match anchor {
                    LikeAnchor::Prefix => format!("{}%", escape_text(needle)),
                    LikeAnchor::Suffix => format!("%{}", escape_text(needle)),
                    LikeAnchor::Contains => format!("%{}%", escape_text(needle)),
                };
                Ok(format!("{} like '{}'", site, pattern))
            }
            Condition::In { field, values } => {
                if values.is_empty() {
                    return Err(StoreError::argument(
                        "'in' condition requires at least one value",
                    ));
                }
                let (site, def) = resolve(field, registry)?;
                let rendered: Vec<String> = values.iter().map(|v| literal(def, v)).collect();
                Ok(format!("{} in ({})", site, rendered.join(", ")))
            }
            Condition::Link { field, target } => {
                let (site, _) = resolve(field, registry)?;
                Ok(format!("{} = {}", site, target.key))
            }
            Condition::Not(inner) => Ok(format!("not ({})", inner.to_sql(registry)?)),
            Condition::Compound { op, terms } => {
                if terms.is_empty() {
                    return Err(StoreError::argument(
                        "compound condition requires at least one term",
                    ));
                }
                let connective = match op {
                    BoolOp::And => " and ",
                    BoolOp::Or => " or ",
                };
                let rendered: Result<Vec<String>> =
                    terms.iter().map(|t| t.to_sql(registry)).collect();
                Ok(format!("({})", rendered?.join(connective)))
            }
        }
    }

    /// Evaluate this condition against an in-memory object by field-name
    /// dispatch. Mirrors the rendered SQL: `Link` comparisons resolve by
    /// foreign-key identity, `like` by anchored substring test, and
    /// comparisons against null match nothing.
    pub fn satisfies(&self, dobj: &DomainObject, registry: &SchemaRegistry) -> Result<bool> {
        match self {
            Condition::Not(inner) => Ok(!inner.satisfies(dobj, registry)?),
            Condition::Compound { op, terms } => {
                if terms.is_empty() {
                    return Err(StoreError::argument(
                        "compound condition requires at least one term",
                    ));
                }
                match op {
                    BoolOp::And => {
                        for term in terms {
                            if !term.satisfies(dobj, registry)? {
                                return Ok(false);
                            }
                        }
                        Ok(true)
                    }
                    BoolOp::Or => {
                        for term in terms {
                            if term.satisfies(dobj, registry)? {
                                return Ok(true);
                            }
                        }
                        Ok(false)
                    }
                }
            }
            _ => {
                if let Condition::In { values, .. } = self {
                    if values.is_empty() {
                        return Err(StoreError::argument(
                            "'in' condition requires at least one value",
                        ));
                    }
                }
                let field = self.first_field();
                // Validate the reference even though evaluation needs no column.
                resolve(field, registry)?;
                let actual = field_value(field, dobj);
                Ok(self.accepts_value(&actual))
            }
        }
    }

    /// Whether a hypothetical field value would satisfy this leaf condition.
    /// Only meaningful for single-field conditions.
    fn accepts_value(&self, actual: &Value) -> bool {
        match self {
            Condition::Equals { value, .. } => {
                if value.is_null() {
                    actual.is_null()
                } else {
                    actual == value
                }
            }
            Condition::Compare { op, value, .. } => strict_cmp(actual, value)
                .map(|ord| op.matches(ord))
                .unwrap_or(false),
            Condition::Like { needle, anchor, .. } => match actual {
                Value::Text(s) => match anchor {
                    LikeAnchor::Prefix => s.starts_with(needle),
                    LikeAnchor::Suffix => s.ends_with(needle),
                    LikeAnchor::Contains => s.contains(needle),
                },
                _ => false,
            },
            Condition::In { values, .. } => !actual.is_null() && values.contains(actual),
            Condition::Link { target, .. } => match actual {
                Value::Link(link) => link == target,
                _ => false,
            },
            Condition::Not(inner) => !inner.accepts_value(actual),
            Condition::Compound { op, terms } => match op {
                BoolOp::And => terms.iter().all(|t| t.accepts_value(actual)),
                BoolOp::Or => terms.iter().any(|t| t.accepts_value(actual)),
            },
        }
    }

    /// The single field this condition (and all of its sub-terms) ranges
    /// over, or `None` when it touches several fields
    fn single_field(&self) -> Option<&FieldRef> {
        match self {
            Condition::Equals { field, .. }
            | Condition::Compare { field, .. }
            | Condition::Like { field, .. }
            | Condition::In { field, .. }
            | Condition::Link { field, .. } => Some(field),
            Condition::Not(inner) => inner.single_field(),
            Condition::Compound { terms, .. } => {
                let first = terms.first()?.single_field()?;
                terms
                    .iter()
                    .all(|t| t.single_field() == Some(first))
                    .then_some(first)
            }
        }
    }

    /// Whether every object accepted by `self` is also accepted by `other`.
    ///
    /// Used by the query cache to answer a narrower query from a broader
    /// cached result set. Conservative: `false` means "unknown", never
    /// "disjoint".
    pub fn implies(&self, other: &Condition) -> bool {
        if self == other {
            return true;
        }

        // Decompose the broader side first.
        match other {
            Condition::Compound {
                op: BoolOp::Or,
                terms,
            } if terms.iter().any(|t| self.implies(t)) => return true,
            Condition::Compound {
                op: BoolOp::And,
                terms,
            } if !terms.is_empty() && terms.iter().all(|t| self.implies(t)) => return true,
            _ => {}
        }

        // Then the narrower side.
        match self {
            Condition::Compound {
                op: BoolOp::And,
                terms,
            } if terms.iter().any(|t| t.implies(other)) => return true,
            Condition::Compound {
                op: BoolOp::Or,
                terms,
            } if !terms.is_empty() && terms.iter().all(|t| t.implies(other)) => return true,
            _ => {}
        }

        // Single-field reasoning over the same field.
        let (Some(mine), Some(theirs)) = (self.single_field(), other.single_field()) else {
            return false;
        };
        if mine != theirs {
            return false;
        }

        match (self, other) {
            (Condition::Equals { value, .. }, _) if !value.is_null() => other.accepts_value(value),
            (Condition::In { values, .. }, _) => {
                !values.is_empty() && values.iter().all(|v| other.accepts_value(v))
            }
            (
                Condition::Compare { op: a, value: va, .. },
                Condition::Compare { op: b, value: vb, .. },
            ) => compare_implies(*a, va, *b, vb),
            (
                Condition::Like {
                    needle: a,
                    anchor: at,
                    ..
                },
                Condition::Like {
                    needle: b,
                    anchor: bt,
                    ..
                },
            ) => like_implies(a, *at, b, *bt),
            _ => false,
        }
    }
}

/// Whether `x op_a va` implies `x op_b vb` for all x
fn compare_implies(op_a: CompareOp, va: &Value, op_b: CompareOp, vb: &Value) -> bool {
    if op_a.is_less() != op_b.is_less() {
        return false;
    }
    let Some(ord) = strict_cmp(va, vb) else {
        return false;
    };
    // An inclusive narrow bound needs strict slack against an exclusive
    // broad bound; anything else only needs the bounds ordered.
    let needs_strict = op_a.is_inclusive() && !op_b.is_inclusive();
    if op_a.is_less() {
        if needs_strict {
            ord == Ordering::Less
        } else {
            ord != Ordering::Greater
        }
    } else if needs_strict {
        ord == Ordering::Greater
    } else {
        ord != Ordering::Less
    }
}

/// Whether one anchored substring test implies another
fn like_implies(a: &str, at: LikeAnchor, b: &str, bt: LikeAnchor) -> bool {
    match (at, bt) {
        (LikeAnchor::Prefix, LikeAnchor::Prefix) => a.starts_with(b),
        (LikeAnchor::Suffix, LikeAnchor::Suffix) => a.ends_with(b),
        (LikeAnchor::Contains, LikeAnchor::Contains)
        | (LikeAnchor::Prefix, LikeAnchor::Contains)
        | (LikeAnchor::Suffix, LikeAnchor::Contains) => a.contains(b),
        _ => false,
    }
}

/// Resolve a field reference to its qualified SQL site and descriptor
fn resolve<'r>(
    field: &FieldRef,
    registry: &'r SchemaRegistry,
) -> Result<(String, Option<&'r FieldDef>)> {
    if field.is_pk() {
        let levels = registry.levels(&field.class)?;
        let root = levels[0];
        Ok((format!("{}.{}", root.table_name, root.pk_column), None))
    } else {
        let (level, def): (&ClassSchema, &FieldDef) = registry.field(&field.class, &field.field)?;
        Ok((format!("{}.{}", level.table_name, def.db_column()), Some(def)))
    }
}

/// Render a literal through the field's encoding, or the default encoding
/// for primary-key comparisons
fn literal(def: Option<&FieldDef>, value: &Value) -> String {
    match def {
        Some(def) => def.value_to_sql(value),
        None => value.to_sql(&BoolEncoding::default()),
    }
}

/// Read the compared value off an object, treating the primary key as an
/// integer pseudo-field
fn field_value(field: &FieldRef, dobj: &DomainObject) -> Value {
    if field.is_pk() {
        dobj.key().map(Value::Int).unwrap_or(Value::Null)
    } else {
        dobj.value_or_null(&field.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDef;
    use crate::schema::{ClassSchema, SchemaRegistry};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .class(
                ClassSchema::new("client", "clients")
                    .field(FieldDef::text("name"))
                    .field(FieldDef::boolean("active"))
                    .field(FieldDef::decimal("rate").column("hourly_rate")),
            )
            .class(
                ClassSchema::new("invoice", "invoices")
                    .field(FieldDef::link("client", "client"))
                    .field(FieldDef::int("hours")),
            )
            .finish()
            .unwrap()
    }

    fn name_equals(value: &str) -> Condition {
        Condition::Equals {
            field: FieldRef::new("client", "name"),
            value: Value::Text(value.to_string()),
        }
    }

    fn hours_compare(op: CompareOp, hours: i64) -> Condition {
        Condition::Compare {
            field: FieldRef::new("invoice", "hours"),
            op,
            value: Value::Int(hours),
        }
    }

    // =========================================================================
    // SQL Rendering Tests
    // =========================================================================

    #[test]
    fn test_equals_sql_is_table_qualified() {
        let sql = name_equals("Acme").to_sql(&registry()).unwrap();
        assert_eq!(sql, "clients.name = 'Acme'");
    }

    #[test]
    fn test_equals_sql_uses_db_column() {
        let cond = Condition::Equals {
            field: FieldRef::new("client", "rate"),
            value: Value::Decimal("70.0".parse().unwrap()),
        };
        assert_eq!(
            cond.to_sql(&registry()).unwrap(),
            "clients.hourly_rate = 70.0"
        );
    }

    #[test]
    fn test_equals_null_renders_is_null() {
        let cond = Condition::Equals {
            field: FieldRef::new("client", "name"),
            value: Value::Null,
        };
        assert_eq!(cond.to_sql(&registry()).unwrap(), "clients.name is null");
    }

    #[test]
    fn test_pk_comparison_uses_pk_column() {
        let cond = Condition::Equals {
            field: FieldRef::pk("client"),
            value: Value::Int(7),
        };
        assert_eq!(cond.to_sql(&registry()).unwrap(), "clients.pk_id = 7");
    }

    #[test]
    fn test_compare_sql() {
        assert_eq!(
            hours_compare(CompareOp::Gte, 10).to_sql(&registry()).unwrap(),
            "invoices.hours >= 10"
        );
        assert_eq!(
            hours_compare(CompareOp::Lt, 10).to_sql(&registry()).unwrap(),
            "invoices.hours < 10"
        );
    }

    #[test]
    fn test_like_sql_anchors() {
        let like = |anchor| Condition::Like {
            field: FieldRef::new("client", "name"),
            needle: "Ac".to_string(),
            anchor,
        };
        assert_eq!(
            like(LikeAnchor::Prefix).to_sql(&registry()).unwrap(),
            "clients.name like 'Ac%'"
        );
        assert_eq!(
            like(LikeAnchor::Suffix).to_sql(&registry()).unwrap(),
            "clients.name like '%Ac'"
        );
        assert_eq!(
            like(LikeAnchor::Contains).to_sql(&registry()).unwrap(),
            "clients.name like '%Ac%'"
        );
    }

    #[test]
    fn test_in_sql() {
        let cond = Condition::In {
            field: FieldRef::new("client", "name"),
            values: vec![Value::Text("a".into()), Value::Text("b".into())],
        };
        assert_eq!(
            cond.to_sql(&registry()).unwrap(),
            "clients.name in ('a', 'b')"
        );
    }

    #[test]
    fn test_empty_in_is_error() {
        let cond = Condition::In {
            field: FieldRef::new("client", "name"),
            values: vec![],
        };
        assert!(cond.to_sql(&registry()).is_err());
    }

    #[test]
    fn test_link_sql_compares_key() {
        let cond = Condition::Link {
            field: FieldRef::new("invoice", "client"),
            target: LinkRef::new("client", 3),
        };
        assert_eq!(cond.to_sql(&registry()).unwrap(), "invoices.client = 3");
    }

    #[test]
    fn test_not_and_compound_sql() {
        let cond = name_equals("Acme")
            .and(Condition::Equals {
                field: FieldRef::new("client", "active"),
                value: Value::Bool(true),
            })
            .negate();
        assert_eq!(
            cond.to_sql(&registry()).unwrap(),
            "not ((clients.name = 'Acme' and clients.active = 1))"
        );
    }

    #[test]
    fn test_or_preserves_order() {
        let cond = name_equals("a").or(name_equals("b")).or(name_equals("c"));
        assert_eq!(
            cond.to_sql(&registry()).unwrap(),
            "(clients.name = 'a' or clients.name = 'b' or clients.name = 'c')"
        );
    }

    #[test]
    fn test_unknown_field_is_error() {
        let cond = Condition::Equals {
            field: FieldRef::new("client", "ghost"),
            value: Value::Int(1),
        };
        assert!(cond.to_sql(&registry()).is_err());
    }

    // =========================================================================
    // In-Memory Evaluation Tests
    // =========================================================================

    #[test]
    fn test_satisfies_equals() {
        let reg = registry();
        let acme = DomainObject::new("client").with("name", "Acme");
        let other = DomainObject::new("client").with("name", "Other");
        let cond = name_equals("Acme");
        assert!(cond.satisfies(&acme, &reg).unwrap());
        assert!(!cond.satisfies(&other, &reg).unwrap());
    }

    #[test]
    fn test_satisfies_null_matches_nothing_but_is_null() {
        let reg = registry();
        let unnamed = DomainObject::new("client");
        assert!(!name_equals("Acme").satisfies(&unnamed, &reg).unwrap());

        let is_null = Condition::Equals {
            field: FieldRef::new("client", "name"),
            value: Value::Null,
        };
        assert!(is_null.satisfies(&unnamed, &reg).unwrap());
    }

    #[test]
    fn test_satisfies_compare_and_null_operand() {
        let reg = registry();
        let twelve = DomainObject::new("invoice").with("hours", 12);
        let unset = DomainObject::new("invoice");
        let cond = hours_compare(CompareOp::Gte, 10);
        assert!(cond.satisfies(&twelve, &reg).unwrap());
        // A null operand matches nothing, exactly as the SQL comparison would
        assert!(!cond.satisfies(&unset, &reg).unwrap());
    }

    #[test]
    fn test_satisfies_like_anchors() {
        let reg = registry();
        let acme = DomainObject::new("client").with("name", "Acme Corp");
        let prefix = Condition::Like {
            field: FieldRef::new("client", "name"),
            needle: "Acme".to_string(),
            anchor: LikeAnchor::Prefix,
        };
        let suffix = Condition::Like {
            field: FieldRef::new("client", "name"),
            needle: "Corp".to_string(),
            anchor: LikeAnchor::Suffix,
        };
        let contains = Condition::Like {
            field: FieldRef::new("client", "name"),
            needle: "me Co".to_string(),
            anchor: LikeAnchor::Contains,
        };
        assert!(prefix.satisfies(&acme, &reg).unwrap());
        assert!(suffix.satisfies(&acme, &reg).unwrap());
        assert!(contains.satisfies(&acme, &reg).unwrap());
    }

    #[test]
    fn test_satisfies_link_by_identity() {
        let reg = registry();
        let invoice = DomainObject::new("invoice").with("client", LinkRef::new("client", 3));
        let matching = Condition::Link {
            field: FieldRef::new("invoice", "client"),
            target: LinkRef::new("client", 3),
        };
        let other = Condition::Link {
            field: FieldRef::new("invoice", "client"),
            target: LinkRef::new("client", 4),
        };
        assert!(matching.satisfies(&invoice, &reg).unwrap());
        assert!(!other.satisfies(&invoice, &reg).unwrap());
    }

    #[test]
    fn test_satisfies_pk_field() {
        let reg = registry();
        let client = DomainObject::with_key("client", 7);
        let cond = Condition::Equals {
            field: FieldRef::pk("client"),
            value: Value::Int(7),
        };
        assert!(cond.satisfies(&client, &reg).unwrap());
    }

    #[test]
    fn test_satisfies_not_and_compound() {
        let reg = registry();
        let acme = DomainObject::new("client").with("name", "Acme").with("active", true);
        let active = Condition::Equals {
            field: FieldRef::new("client", "active"),
            value: Value::Bool(true),
        };
        assert!(name_equals("Acme").and(active.clone()).satisfies(&acme, &reg).unwrap());
        assert!(!name_equals("Other").and(active.clone()).satisfies(&acme, &reg).unwrap());
        assert!(name_equals("Other").or(active).satisfies(&acme, &reg).unwrap());
        assert!(!name_equals("Acme").negate().satisfies(&acme, &reg).unwrap());
    }

    #[test]
    fn test_satisfies_in() {
        let reg = registry();
        let acme = DomainObject::new("client").with("name", "Acme");
        let cond = Condition::In {
            field: FieldRef::new("client", "name"),
            values: vec![Value::Text("Acme".into()), Value::Text("Zeta".into())],
        };
        assert!(cond.satisfies(&acme, &reg).unwrap());
    }

    // =========================================================================
    // Implication Tests
    // =========================================================================

    #[test]
    fn test_implies_reflexive() {
        let c = name_equals("Acme");
        assert!(c.implies(&c.clone()));
    }

    #[test]
    fn test_and_term_implies_broader() {
        let narrow = name_equals("Acme").and(hours_compare(CompareOp::Gt, 5));
        assert!(narrow.implies(&name_equals("Acme")));
        assert!(!name_equals("Acme").implies(&narrow));
    }

    #[test]
    fn test_term_implies_or_of_it() {
        let broad = name_equals("Acme").or(name_equals("Zeta"));
        assert!(name_equals("Acme").implies(&broad));
        assert!(!broad.implies(&name_equals("Acme")));
    }

    #[test]
    fn test_compare_bound_tightening() {
        assert!(hours_compare(CompareOp::Gt, 10).implies(&hours_compare(CompareOp::Gt, 5)));
        assert!(hours_compare(CompareOp::Gte, 10).implies(&hours_compare(CompareOp::Gt, 5)));
        assert!(!hours_compare(CompareOp::Gte, 5).implies(&hours_compare(CompareOp::Gt, 5)));
        assert!(hours_compare(CompareOp::Gt, 5).implies(&hours_compare(CompareOp::Gte, 5)));
        assert!(hours_compare(CompareOp::Lt, 5).implies(&hours_compare(CompareOp::Lte, 10)));
        assert!(!hours_compare(CompareOp::Lt, 10).implies(&hours_compare(CompareOp::Gt, 5)));
    }

    #[test]
    fn test_equals_implies_satisfied_bound() {
        let eq_twelve = Condition::Equals {
            field: FieldRef::new("invoice", "hours"),
            value: Value::Int(12),
        };
        assert!(eq_twelve.implies(&hours_compare(CompareOp::Gt, 10)));
        assert!(!eq_twelve.implies(&hours_compare(CompareOp::Gt, 20)));
    }

    #[test]
    fn test_in_implies_superset_membership() {
        let small = Condition::In {
            field: FieldRef::new("client", "name"),
            values: vec![Value::Text("a".into())],
        };
        let large = Condition::In {
            field: FieldRef::new("client", "name"),
            values: vec![Value::Text("a".into()), Value::Text("b".into())],
        };
        assert!(small.implies(&large));
        assert!(!large.implies(&small));
    }

    #[test]
    fn test_like_prefix_implies_contains() {
        let prefix = Condition::Like {
            field: FieldRef::new("client", "name"),
            needle: "Acme".to_string(),
            anchor: LikeAnchor::Prefix,
        };
        let contains = Condition::Like {
            field: FieldRef::new("client", "name"),
            needle: "cm".to_string(),
            anchor: LikeAnchor::Contains,
        };
        assert!(prefix.implies(&contains));
        assert!(!contains.implies(&prefix));
    }

    #[test]
    fn test_different_fields_never_imply() {
        assert!(!name_equals("Acme").implies(&hours_compare(CompareOp::Gt, 0)));
    }
}
