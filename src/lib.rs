//! # domain-store
//!
//! A schema-driven domain object persistence core.
//!
//! Domain classes are described by typed field schemas and mapped onto
//! relational rows, one table per concrete inheritance level. Queries are
//! expressed as composable condition trees that render to SQL *and* evaluate
//! in memory with identical semantics, so the same filter drives the MySQL
//! backend and the in-memory test double. An object cache plus a
//! query-result cache sit in front of the backend with coarse,
//! correctness-first invalidation, and foreign keys resolve lazily through
//! proxies with staleness detection.
//!
//! ## Features
//!
//! - **Typed Field Schemas**: int, text, boolean, date, datetime, decimal,
//!   foreign-key, enum, and text-list fields with per-field constraints
//! - **Multi-Table Inheritance**: one table per concrete level, pk-join
//!   chains on query, one write per level on commit
//! - **Dual-Reading Conditions**: every condition renders table-qualified
//!   SQL and evaluates the same predicate against in-memory objects
//! - **Query Inference**: build condition trees from field handles, with no
//!   hand-written SQL
//! - **Two-Level Cache**: canonical object cache plus query-result cache;
//!   any commit of a class discards that class's cached query results
//! - **Lazy Link Proxies**: foreign keys read as (class, key) references
//!   that resolve on demand and re-resolve when stale
//! - **Cascade / Detach**: per-field delete policies for dependent rows
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domain_store::{
//!     ClassSchema, DomainObject, FieldDef, MemoryBridge, ObjectStore, SchemaRegistry,
//!     StoreConfig,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = SchemaRegistry::builder()
//!         .class(
//!             ClassSchema::new("client", "clients")
//!                 .field(FieldDef::text("name").not_null())
//!                 .field(FieldDef::boolean("active").default(true)),
//!         )
//!         .class(
//!             ClassSchema::new("invoice", "invoices")
//!                 .field(FieldDef::link("client", "client").cascade())
//!                 .field(FieldDef::int("hours"))
//!                 .field(FieldDef::date("date")),
//!         )
//!         .finish()?;
//!
//!     // Tests and request-scoped contexts run on the in-memory bridge;
//!     // `ObjectStore::connect` backs the same store with MySQL.
//!     let config = StoreConfig::builder("mysql://localhost/billing").build();
//!     let mut store = ObjectStore::with_bridge(config, registry, Box::new(MemoryBridge::new()));
//!
//!     let client = store
//!         .commit(DomainObject::new("client").with("name", "Acme"))
//!         .await?;
//!
//!     let invoices = store
//!         .query_with("invoice", |inv| {
//!             Ok(inv
//!                 .field("hours")?
//!                 .gte(10)?
//!                 .and(inv.field("client")?.links_to(client.key().unwrap())?))
//!         })
//!         .await?;
//!
//!     println!("{} invoices", invoices.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Context Model
//!
//! One `ObjectStore` is one logical context (one per request or test case)
//! and is confined to a single task. Every object a store hands out is a
//! deep copy of its cached canonical one, so caller-side mutation never
//! leaks into the cache without an explicit commit.

pub mod bridge;
pub mod config;
pub mod dobj;
pub mod error;
pub mod field;
pub mod proxy;
pub mod query;
pub mod schema;
pub mod sql;
pub mod store;
pub mod value;

mod cache;
mod committer;

// Re-export main types for convenience
pub use bridge::{DbBridge, MemoryBridge, SqlBridge};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use dobj::{CommitKind, DomainObject};
pub use error::{Result, StoreError};
pub use field::{DeletePolicy, FieldDef, FieldKind};
pub use proxy::DomainObjectProxy;
pub use query::{
    BoolOp, ClassHandle, CompareOp, Condition, FieldHandle, FieldRef, LikeAnchor, Query,
    QueryLimit, SortDirection,
};
pub use schema::{ClassSchema, CommitHooks, SchemaRegistry, SchemaRegistryBuilder};
pub use store::{FetchRequest, FetchResult, ObjectStore};
pub use value::{BoolEncoding, LinkRef, Value};
