//! Query inference through explicit field handles
//!
//! Callers express `client.name equals "Acme"` style predicates without
//! writing SQL: a class handle resolves attribute names against the schema
//! and hands out field handles whose comparison operations return
//! [`Condition`] values instead of booleans. Field references are resolved
//! eagerly; a mistyped name or a value of the wrong kind fails at build time,
//! not at render time.

use crate::error::{Result, StoreError};
use crate::field::{FieldDef, FieldKind};
use crate::query::condition::{CompareOp, Condition, FieldRef, LikeAnchor};
use crate::query::Query;
use crate::schema::SchemaRegistry;
use crate::value::{LinkRef, Value};

/// Build a query by inferring its condition from a closure over a class
/// handle.
///
/// ```rust,no_run
/// # use domain_store::{SchemaRegistry, query::builder::infer};
/// # fn example(registry: &SchemaRegistry) -> domain_store::Result<()> {
/// let query = infer(registry, "invoice", |inv| {
///     Ok(inv.field("hours")?.gte(10)?.and(inv.field("paid")?.equals(false)?))
/// })?;
/// # Ok(())
/// # }
/// ```
pub fn infer<F>(registry: &SchemaRegistry, class: &str, build: F) -> Result<Query>
where
    F: FnOnce(&ClassHandle<'_>) -> Result<Condition>,
{
    let handle = ClassHandle::new(registry, class)?;
    let condition = build(&handle)?;
    Ok(Query::from_condition(condition))
}

/// A stand-in for a domain class that resolves attribute names to field
/// handles
pub struct ClassHandle<'r> {
    registry: &'r SchemaRegistry,
    class: String,
}

impl<'r> ClassHandle<'r> {
    pub(crate) fn new(registry: &'r SchemaRegistry, class: &str) -> Result<Self> {
        registry.class(class)?;
        Ok(Self {
            registry,
            class: class.to_string(),
        })
    }

    /// Resolve a schema field into a handle; unknown names are an error
    pub fn field(&self, name: &str) -> Result<FieldHandle> {
        let (_, def) = self.registry.field(&self.class, name)?;
        Ok(FieldHandle {
            fref: FieldRef::new(&self.class, name),
            def: Some(def.clone()),
        })
    }

    /// A handle on the class's primary key
    pub fn pk(&self) -> FieldHandle {
        FieldHandle {
            fref: FieldRef::pk(&self.class),
            def: None,
        }
    }
}

/// A resolved field reference whose comparison operations produce conditions
pub struct FieldHandle {
    fref: FieldRef,
    def: Option<FieldDef>,
}

impl FieldHandle {
    /// `field = value`
    pub fn equals(&self, value: impl Into<Value>) -> Result<Condition> {
        let value = value.into();
        // A link payload on a foreign-key field is a link comparison.
        if let Value::Link(target) = &value {
            return self.links_to_ref(target.clone());
        }
        self.check_value(&value)?;
        Ok(Condition::Equals {
            field: self.fref.clone(),
            value,
        })
    }

    /// `field is null`
    pub fn is_null(&self) -> Condition {
        Condition::Equals {
            field: self.fref.clone(),
            value: Value::Null,
        }
    }

    pub fn lt(&self, value: impl Into<Value>) -> Result<Condition> {
        self.compare(CompareOp::Lt, value.into())
    }

    pub fn lte(&self, value: impl Into<Value>) -> Result<Condition> {
        self.compare(CompareOp::Lte, value.into())
    }

    pub fn gte(&self, value: impl Into<Value>) -> Result<Condition> {
        self.compare(CompareOp::Gte, value.into())
    }

    pub fn gt(&self, value: impl Into<Value>) -> Result<Condition> {
        self.compare(CompareOp::Gt, value.into())
    }

    /// `field like 'needle%'`
    pub fn begins_with(&self, needle: impl Into<String>) -> Result<Condition> {
        self.like(needle.into(), LikeAnchor::Prefix)
    }

    /// `field like '%needle'`
    pub fn ends_with(&self, needle: impl Into<String>) -> Result<Condition> {
        self.like(needle.into(), LikeAnchor::Suffix)
    }

    /// `field like '%needle%'`
    pub fn contains(&self, needle: impl Into<String>) -> Result<Condition> {
        self.like(needle.into(), LikeAnchor::Contains)
    }

    /// `field in (values…)`
    pub fn one_of(&self, values: Vec<Value>) -> Result<Condition> {
        if values.is_empty() {
            return Err(StoreError::argument(
                "'one_of' requires at least one value",
            ));
        }
        for value in &values {
            self.check_value(value)?;
        }
        Ok(Condition::In {
            field: self.fref.clone(),
            values,
        })
    }

    /// Foreign-key identity comparison against the declared target class
    pub fn links_to(&self, key: i64) -> Result<Condition> {
        let Some(def) = &self.def else {
            return Err(self.wrong_use("a link comparison needs a foreign-key field"));
        };
        let Some((target, _)) = def.link_target() else {
            return Err(self.wrong_use("a link comparison needs a foreign-key field"));
        };
        self.links_to_ref(LinkRef::new(target, key))
    }

    fn links_to_ref(&self, target: LinkRef) -> Result<Condition> {
        self.check_value(&Value::Link(target.clone()))?;
        Ok(Condition::Link {
            field: self.fref.clone(),
            target,
        })
    }

    fn compare(&self, op: CompareOp, value: Value) -> Result<Condition> {
        self.check_value(&value)?;
        Ok(Condition::Compare {
            field: self.fref.clone(),
            op,
            value,
        })
    }

    fn like(&self, needle: String, anchor: LikeAnchor) -> Result<Condition> {
        match &self.def {
            Some(def) if matches!(def.kind, FieldKind::Text) => Ok(Condition::Like {
                field: self.fref.clone(),
                needle,
                anchor,
            }),
            _ => Err(self.wrong_use("'like' requires a text field")),
        }
    }

    /// Check a comparison payload against the field's kind (the primary key
    /// accepts integers only)
    fn check_value(&self, value: &Value) -> Result<()> {
        match &self.def {
            Some(def) => def
                .kind
                .check_value(value)
                .map_err(|msg| StoreError::field_value(&self.fref.class, &self.fref.field, msg)),
            None => match value {
                Value::Int(_) | Value::Null => Ok(()),
                other => Err(self.wrong_use(format!(
                    "the primary key compares against integers, got {}",
                    other.kind_name()
                ))),
            },
        }
    }

    fn wrong_use(&self, msg: impl Into<String>) -> StoreError {
        StoreError::field_value(&self.fref.class, &self.fref.field, msg)
    }
}
