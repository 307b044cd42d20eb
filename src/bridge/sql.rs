//! MySQL storage bridge
//!
//! Renders one statement per concrete inheritance level through the DML
//! renderer, executes queries, and decodes result rows column-by-column back
//! into domain objects. Foreign-key columns decode into unresolved link
//! references, never eagerly loaded objects.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlQueryResult, MySqlRow};
use sqlx::Row;
use std::collections::HashMap;
use tracing::debug;

use crate::bridge::DbBridge;
use crate::config::StoreConfig;
use crate::dobj::{CommitKind, DomainObject};
use crate::error::{Result, StoreError};
use crate::field::{FieldDef, FieldKind};
use crate::query::Query;
use crate::schema::SchemaRegistry;
use crate::sql::render;
use crate::value::{LinkRef, Value};

/// Storage bridge over a MySQL connection pool
pub struct SqlBridge {
    pool: MySqlPool,
    last_keys: HashMap<String, i64>,
}

impl SqlBridge {
    /// Connect a new bridge from configuration
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("database connection failed: {}", e)))?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            pool,
            last_keys: HashMap::new(),
        }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Execute a select statement and return the raw rows
    pub async fn execute_select(&self, sql: &str) -> Result<Vec<MySqlRow>> {
        debug!("select: {sql}");
        Ok(sqlx::query(sql).fetch_all(&self.pool).await?)
    }

    /// Execute a write statement and return the number of affected rows
    pub async fn execute_write(&self, sql: &str) -> Result<u64> {
        Ok(self.run_write(sql).await?.rows_affected())
    }

    async fn run_write(&self, sql: &str) -> Result<MySqlQueryResult> {
        debug!("write: {sql}");
        Ok(sqlx::query(sql).execute(&self.pool).await?)
    }
}

#[async_trait]
impl DbBridge for SqlBridge {
    async fn commit(
        &mut self,
        dobj: &DomainObject,
        kind: CommitKind,
        registry: &SchemaRegistry,
    ) -> Result<Option<i64>> {
        match kind {
            CommitKind::Insert => {
                let statements = render::insert_statements(dobj, registry)?;
                let mut generated = None;
                for (depth, sql) in statements.iter().enumerate() {
                    let result = self.run_write(sql).await?;
                    if depth == 0 {
                        let key = i64::try_from(result.last_insert_id()).map_err(|_| {
                            StoreError::argument("generated key exceeds the i64 range")
                        })?;
                        generated = Some(key);
                    }
                }
                let key = generated.ok_or_else(|| {
                    StoreError::argument(format!(
                        "insert of '{}' produced no statements",
                        dobj.class()
                    ))
                })?;
                self.last_keys.insert(dobj.class().to_string(), key);
                Ok(Some(key))
            }
            CommitKind::Update => {
                for sql in render::update_statements(dobj, registry)? {
                    self.execute_write(&sql).await?;
                }
                Ok(None)
            }
            CommitKind::Delete => {
                for sql in render::delete_statements(dobj, registry)? {
                    self.execute_write(&sql).await?;
                }
                Ok(None)
            }
        }
    }

    async fn select(
        &mut self,
        query: &Query,
        registry: &SchemaRegistry,
    ) -> Result<Vec<DomainObject>> {
        let sql = query.to_sql(registry)?;
        let rows = self.execute_select(&sql).await?;
        rows.iter()
            .map(|row| decode_row(row, query.class(), registry))
            .collect()
    }

    async fn group_max(
        &mut self,
        class: &str,
        field: Option<&str>,
        registry: &SchemaRegistry,
    ) -> Result<Option<Value>> {
        let sql = render::max_statement(class, field, registry)?;
        let rows = self.execute_select(&sql).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        match field {
            Some(name) => {
                let (_, def) = registry.field(class, name)?;
                decode_scalar(row, class, def)
            }
            None => Ok(row.try_get::<Option<i64>, _>(0)?.map(Value::Int)),
        }
    }

    fn last_generated_key(&self, class: &str) -> Option<i64> {
        self.last_keys.get(class).copied()
    }
}

/// Decode one result row into a domain object.
///
/// The primary key comes from the root level's pk column; a row without it
/// is a field-match error. Foreign-key columns decode into link references.
fn decode_row(row: &MySqlRow, class: &str, registry: &SchemaRegistry) -> Result<DomainObject> {
    let root = render::root_level(class, registry)?;
    let key: i64 = row
        .try_get(root.pk_column.as_str())
        .map_err(|_| StoreError::FieldMatch {
            column: root.pk_column.clone(),
        })?;

    let mut dobj = DomainObject::with_key(class, key);
    for (_, field) in registry.fields(class)? {
        let value = decode_field(row, class, field)?;
        if !value.is_null() {
            dobj.set(field.name.clone(), value);
        }
    }
    Ok(dobj)
}

fn decode_field(row: &MySqlRow, class: &str, field: &FieldDef) -> Result<Value> {
    let column = field.db_column();
    let decoded = match &field.kind {
        FieldKind::Int => row.try_get::<Option<i64>, _>(column)?.map(Value::Int),
        FieldKind::Text => row.try_get::<Option<String>, _>(column)?.map(Value::Text),
        FieldKind::Boolean { encoding } => match raw_text(row, column)? {
            Some(raw) => {
                let flag = encoding.decode(&raw).ok_or_else(|| {
                    StoreError::field_value(
                        class,
                        &field.name,
                        format!("'{}' is not part of the boolean encoding pair", raw),
                    )
                })?;
                Some(Value::Bool(flag))
            }
            None => None,
        },
        FieldKind::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(column)?
            .map(Value::Date),
        FieldKind::DateTime => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(column)?
            .map(Value::DateTime),
        FieldKind::Decimal => row
            .try_get::<Option<Decimal>, _>(column)?
            .map(Value::Decimal),
        FieldKind::ForeignKey { target, .. } => row
            .try_get::<Option<i64>, _>(column)?
            .map(|key| Value::Link(LinkRef::new(target.clone(), key))),
        FieldKind::Enum { .. } => row.try_get::<Option<String>, _>(column)?.map(Value::Enum),
        FieldKind::TextList => row.try_get::<Option<String>, _>(column)?.map(|joined| {
            if joined.is_empty() {
                Value::TextList(Vec::new())
            } else {
                Value::TextList(joined.split(',').map(str::to_string).collect())
            }
        }),
    };
    Ok(decoded.unwrap_or(Value::Null))
}

/// Read a column as text, falling back to an integer rendering for numeric
/// boolean encodings stored in integer columns
fn raw_text(row: &MySqlRow, column: &str) -> Result<Option<String>> {
    if let Ok(text) = row.try_get::<Option<String>, _>(column) {
        return Ok(text);
    }
    Ok(row.try_get::<Option<i64>, _>(column)?.map(|i| i.to_string()))
}

fn decode_scalar(row: &MySqlRow, class: &str, field: &FieldDef) -> Result<Option<Value>> {
    let decoded = match &field.kind {
        FieldKind::Int | FieldKind::ForeignKey { .. } => {
            row.try_get::<Option<i64>, _>(0)?.map(Value::Int)
        }
        FieldKind::Text | FieldKind::Enum { .. } | FieldKind::TextList => {
            row.try_get::<Option<String>, _>(0)?.map(Value::Text)
        }
        FieldKind::Boolean { encoding } => match row.try_get::<Option<String>, _>(0)? {
            Some(raw) => {
                let flag = encoding.decode(&raw).ok_or_else(|| {
                    StoreError::field_value(
                        class,
                        &field.name,
                        format!("'{}' is not part of the boolean encoding pair", raw),
                    )
                })?;
                Some(Value::Bool(flag))
            }
            None => None,
        },
        FieldKind::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(0)?
            .map(Value::Date),
        FieldKind::DateTime => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(0)?
            .map(Value::DateTime),
        FieldKind::Decimal => row.try_get::<Option<Decimal>, _>(0)?.map(Value::Decimal),
    };
    Ok(decoded)
}
