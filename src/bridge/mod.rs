//! Storage adapter boundary
//!
//! A bridge translates commits into backend writes, executes queries into
//! decoded domain objects, tracks generated primary keys, and answers
//! aggregate group queries. Two implementations share the interface: the
//! SQL backend and an in-memory test double that filters with the same
//! condition evaluator the SQL rendering mirrors.

pub mod memory;
pub mod sql;

pub use memory::MemoryBridge;
pub use sql::SqlBridge;

use async_trait::async_trait;

use crate::dobj::{CommitKind, DomainObject};
use crate::error::Result;
use crate::query::Query;
use crate::schema::SchemaRegistry;
use crate::value::Value;

/// Backend-swappable storage adapter
#[async_trait]
pub trait DbBridge: Send + Sync {
    /// Write one object: insert, update, or delete per the commit kind.
    /// Returns the generated primary key on insert, `None` otherwise.
    async fn commit(
        &mut self,
        dobj: &DomainObject,
        kind: CommitKind,
        registry: &SchemaRegistry,
    ) -> Result<Option<i64>>;

    /// Execute a query and decode each row into a domain object
    async fn select(
        &mut self,
        query: &Query,
        registry: &SchemaRegistry,
    ) -> Result<Vec<DomainObject>>;

    /// Aggregate group query: the maximum of a field (or of the primary key
    /// when no field is named), `None` when the class has no rows
    async fn group_max(
        &mut self,
        class: &str,
        field: Option<&str>,
        registry: &SchemaRegistry,
    ) -> Result<Option<Value>>;

    /// The most recently generated primary key for a class, if any
    fn last_generated_key(&self, class: &str) -> Option<i64>;
}
