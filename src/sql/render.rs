//! DML statement rendering
//!
//! Commits translate into one statement per concrete inheritance level.
//! Inserts run parent level first; child-level rows chain the parent's
//! generated key through `LAST_INSERT_ID()`. Deletes run child level first.

use crate::dobj::DomainObject;
use crate::error::{Result, StoreError};
use crate::field::FieldDef;
use crate::query::{from_tables, join_clauses};
use crate::schema::{ClassSchema, SchemaRegistry};
use crate::value::Value;

/// Insert statements for an uncommitted object, parent level first.
///
/// The root level omits the primary-key column (the backend generates it);
/// every child level's first column is its primary key, chained to
/// `LAST_INSERT_ID()`.
pub fn insert_statements(dobj: &DomainObject, registry: &SchemaRegistry) -> Result<Vec<String>> {
    refuse_unverified(dobj)?;
    let levels = registry.levels(dobj.class())?;

    let mut statements = Vec::with_capacity(levels.len());
    for (depth, level) in levels.iter().enumerate() {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        if depth > 0 {
            columns.push(level.pk_column.clone());
            values.push("LAST_INSERT_ID()".to_string());
        }
        for field in &level.fields {
            columns.push(field.db_column().to_string());
            values.push(field_literal(dobj, field));
        }
        statements.push(format!(
            "insert into {}({}) values({})",
            level.table_name,
            columns.join(", "),
            values.join(", ")
        ));
    }
    Ok(statements)
}

/// Update statements for a committed object, parent level first.
/// Levels owning no fields have nothing to write and are skipped.
pub fn update_statements(dobj: &DomainObject, registry: &SchemaRegistry) -> Result<Vec<String>> {
    refuse_unverified(dobj)?;
    let key = require_key(dobj)?;
    let levels = registry.levels(dobj.class())?;

    let mut statements = Vec::new();
    for level in levels {
        if level.fields.is_empty() {
            continue;
        }
        let assignments: Vec<String> = level
            .fields
            .iter()
            .map(|field| format!("{} = {}", field.db_column(), field_literal(dobj, field)))
            .collect();
        statements.push(format!(
            "update {} set {} where {} = {}",
            level.table_name,
            assignments.join(", "),
            level.pk_column,
            key
        ));
    }
    Ok(statements)
}

/// Delete statements for a committed object, child level first, so no
/// intermediate state has a child row without its parent
pub fn delete_statements(dobj: &DomainObject, registry: &SchemaRegistry) -> Result<Vec<String>> {
    refuse_unverified(dobj)?;
    let key = require_key(dobj)?;
    let levels = registry.levels(dobj.class())?;

    Ok(levels
        .iter()
        .rev()
        .map(|level| {
            format!(
                "delete from {} where {} = {}",
                level.table_name, level.pk_column, key
            )
        })
        .collect())
}

/// Aggregate max statement: `max` of a field's column, or of the primary key
pub fn max_statement(
    class: &str,
    field: Option<&str>,
    registry: &SchemaRegistry,
) -> Result<String> {
    let levels = registry.levels(class)?;
    let column = match field {
        Some(name) => {
            let (level, def) = registry.field(class, name)?;
            format!("{}.{}", level.table_name, def.db_column())
        }
        None => {
            let root = levels[0];
            format!("{}.{}", root.table_name, root.pk_column)
        }
    };

    let mut sql = format!("select max({}) from {}", column, from_tables(&levels));
    let joins = join_clauses(&levels);
    if !joins.is_empty() {
        sql.push_str(" where ");
        sql.push_str(&joins.join(" and "));
    }
    Ok(sql)
}

fn refuse_unverified(dobj: &DomainObject) -> Result<()> {
    if dobj.error_messages().is_empty() {
        Ok(())
    } else {
        Err(StoreError::Initialization {
            class: dobj.class().to_string(),
            messages: dobj.error_messages().to_vec(),
        })
    }
}

fn require_key(dobj: &DomainObject) -> Result<i64> {
    dobj.key().ok_or_else(|| {
        StoreError::argument(format!(
            "'{}' object has no key to address its rows",
            dobj.class()
        ))
    })
}

/// The literal written for a field: the set value, the declared default for
/// never-set fields, or null
fn field_literal(dobj: &DomainObject, field: &FieldDef) -> String {
    let value = match dobj.value(&field.name) {
        Some(value) => value.clone(),
        None => field.default_value.clone().unwrap_or(Value::Null),
    };
    field.value_to_sql(&value)
}

/// Owning level of a class's primary-key column, for row decoding
pub fn root_level<'r>(class: &str, registry: &'r SchemaRegistry) -> Result<&'r ClassSchema> {
    let levels = registry.levels(class)?;
    Ok(levels[0])
}
