//! Queries over one domain class
//!
//! A query scopes an optional condition, ordering, and limit to a target
//! class, and renders the full `select` including one table per concrete
//! inheritance level with pk-join clauses ahead of the user condition.
//! Structural equality and hashing double as the query-result cache key.

pub mod builder;
pub mod condition;

pub use builder::ClassHandle;
pub use builder::FieldHandle;
pub use condition::{BoolOp, CompareOp, Condition, FieldRef, LikeAnchor, PK_FIELD};

use crate::dobj::DomainObject;
use crate::error::Result;
use crate::schema::{ClassSchema, SchemaRegistry};
use crate::value::{order_cmp, Value};

/// Sort direction of a query's ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Offset/count window applied after ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryLimit {
    pub offset: u64,
    pub count: u64,
}

/// A condition plus ordering and limit, scoped to one domain class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    class: String,
    condition: Option<Condition>,
    order_by: Vec<String>,
    direction: SortDirection,
    limit: Option<QueryLimit>,
}

impl Query {
    /// An unconditioned query over every object of a class
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            condition: None,
            order_by: Vec::new(),
            direction: SortDirection::Asc,
            limit: None,
        }
    }

    /// Scope a query to the condition's class
    pub fn from_condition(condition: Condition) -> Self {
        let mut query = Self::new(condition.class().to_string());
        query.condition = Some(condition);
        query
    }

    /// The single-row query used for key lookups
    pub fn for_key(class: impl Into<String>, key: i64) -> Self {
        let class = class.into();
        Self::from_condition(Condition::Equals {
            field: FieldRef::pk(&class),
            value: Value::Int(key),
        })
    }

    /// Set the condition
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Order results by the given fields
    pub fn order_by(mut self, fields: Vec<String>, direction: SortDirection) -> Self {
        self.order_by = fields;
        self.direction = direction;
        self
    }

    /// Apply an offset/count window
    pub fn limit(mut self, offset: u64, count: u64) -> Self {
        self.limit = Some(QueryLimit { offset, count });
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn condition_ref(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn order_fields(&self) -> &[String] {
        &self.order_by
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn limit_ref(&self) -> Option<QueryLimit> {
        self.limit
    }

    /// Render the full select statement.
    ///
    /// For a class with N concrete ancestor levels the FROM clause lists all
    /// N+1 tables in inheritance order and the WHERE clause carries N pk-join
    /// clauses ahead of the user condition.
    pub fn to_sql(&self, registry: &SchemaRegistry) -> Result<String> {
        let levels = registry.levels(&self.class)?;
        let columns = select_columns(&levels, registry, &self.class)?;
        let tables = from_tables(&levels);
        let mut clauses = join_clauses(&levels);

        if let Some(condition) = &self.condition {
            clauses.push(condition.to_sql(registry)?);
        }

        let mut sql = format!("select {} from {}", columns.join(", "), tables);
        if !clauses.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&clauses.join(" and "));
        }

        if !self.order_by.is_empty() {
            let mut order_columns = Vec::new();
            for field in &self.order_by {
                let site = order_column(&self.class, field, registry)?;
                order_columns.push(site);
            }
            sql.push_str(&format!(
                " order by {} {}",
                order_columns.join(", "),
                self.direction.sql()
            ));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" limit {}, {}", limit.offset, limit.count));
        }

        Ok(sql)
    }
}

impl From<Condition> for Query {
    fn from(condition: Condition) -> Self {
        Query::from_condition(condition)
    }
}

/// The FROM clause: one table per concrete level, inheritance order
pub(crate) fn from_tables(levels: &[&ClassSchema]) -> String {
    levels
        .iter()
        .map(|l| l.table_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The N pk-join clauses chaining each child level to its parent
pub(crate) fn join_clauses(levels: &[&ClassSchema]) -> Vec<String> {
    levels
        .windows(2)
        .map(|pair| {
            format!(
                "{}.{} = {}.{}",
                pair[1].table_name, pair[1].pk_column, pair[0].table_name, pair[0].pk_column
            )
        })
        .collect()
}

/// The selected column list: the root level's primary key, then every field's
/// qualified column in declaration order
fn select_columns(
    levels: &[&ClassSchema],
    registry: &SchemaRegistry,
    class: &str,
) -> Result<Vec<String>> {
    let root = levels[0];
    let mut columns = vec![format!("{}.{}", root.table_name, root.pk_column)];
    for (level, field) in registry.fields(class)? {
        columns.push(format!("{}.{}", level.table_name, field.db_column()));
    }
    Ok(columns)
}

/// In-memory ordering mirroring a rendered `order by` clause: stable, so
/// ties keep their incoming (ascending key) order
pub(crate) fn sort_objects(
    objects: &mut [DomainObject],
    fields: &[String],
    direction: SortDirection,
) {
    objects.sort_by(|a, b| {
        let mut ordering = std::cmp::Ordering::Equal;
        for field in fields {
            ordering = order_cmp(&sort_value(a, field), &sort_value(b, field));
            if ordering != std::cmp::Ordering::Equal {
                break;
            }
        }
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// The value an object sorts by, treating the primary key as an integer
/// pseudo-field
pub(crate) fn sort_value(dobj: &DomainObject, field: &str) -> Value {
    if field == PK_FIELD {
        dobj.key().map(Value::Int).unwrap_or(Value::Null)
    } else {
        dobj.value_or_null(field)
    }
}

fn order_column(class: &str, field: &str, registry: &SchemaRegistry) -> Result<String> {
    if field == PK_FIELD {
        let levels = registry.levels(class)?;
        let root = levels[0];
        Ok(format!("{}.{}", root.table_name, root.pk_column))
    } else {
        let (level, def) = registry.field(class, field)?;
        Ok(format!("{}.{}", level.table_name, def.db_column()))
    }
}
