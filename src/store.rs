//! ObjectStore - the single entry point for reads, commits, and queries
//!
//! Composes the storage bridge, the two-level cache, the committer, and the
//! query-inference builder. One store instance is one logical context
//! (typically one per request or test case) and is confined to a single
//! task; every object it hands out is a clone of the cached canonical copy.

use std::collections::HashSet;
use tracing::debug;

use crate::bridge::{DbBridge, SqlBridge};
use crate::cache::StoreCache;
use crate::committer::Committer;
use crate::config::StoreConfig;
use crate::dobj::{CommitKind, DomainObject};
use crate::error::{Result, StoreError};
use crate::field::FieldDef;
use crate::query::builder::{infer, ClassHandle};
use crate::query::{sort_objects, Condition, FieldRef, Query};
use crate::schema::SchemaRegistry;
use crate::value::{LinkRef, Value};

/// A routed read request: the explicit table of "get one of T by key" /
/// "get all of T matching field" shapes
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    /// One object of a class by primary key
    One { class: String, key: i64 },
    /// Every object of a class whose field equals a value
    AllMatching {
        class: String,
        field: String,
        value: Value,
    },
    /// Every object of a class
    All { class: String },
}

/// Result of a routed read request
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    One(DomainObject),
    Many(Vec<DomainObject>),
}

/// Schema-driven domain object store with two-level caching
pub struct ObjectStore {
    config: StoreConfig,
    registry: SchemaRegistry,
    bridge: Box<dyn DbBridge>,
    cache: StoreCache,
}

impl ObjectStore {
    /// Connect a store backed by the configured MySQL database
    pub async fn connect(config: StoreConfig, registry: SchemaRegistry) -> Result<Self> {
        let bridge = SqlBridge::connect(&config).await?;
        Ok(Self::with_bridge(config, registry, Box::new(bridge)))
    }

    /// Build a store over any bridge; this is how tests run against the
    /// in-memory backend
    pub fn with_bridge(
        config: StoreConfig,
        registry: SchemaRegistry,
        bridge: Box<dyn DbBridge>,
    ) -> Self {
        Self {
            config,
            registry,
            bridge,
            cache: StoreCache::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The logical version of the last commit seen for (class, key);
    /// 0 when this store never committed it. Proxies compare against this
    /// for staleness.
    pub fn commit_version(&self, class: &str, key: i64) -> u64 {
        self.cache.version(class, key)
    }

    /// The most recently generated primary key for a class, if any
    pub fn last_generated_key(&self, class: &str) -> Option<i64> {
        self.bridge.last_generated_key(class)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get one object by primary key.
    ///
    /// A cache hit returns a clone of the canonical copy; a miss runs a
    /// single-row query, caches the canonical result, and returns a clone.
    pub async fn get(&mut self, class: &str, key: i64) -> Result<DomainObject> {
        self.registry.class(class)?;
        if let Some(copy) = self.cache.get(class, key) {
            return Ok(copy);
        }

        let query = Query::for_key(class, key);
        let mut results = self.bridge.select(&query, &self.registry).await?;
        let Some(canonical) = results.pop() else {
            return Err(StoreError::not_found(class, key));
        };
        let copy = canonical.clone();
        self.cache.save(canonical);
        Ok(copy)
    }

    /// Run a query, going to the backend only when neither the exact
    /// fingerprint nor a broader cached result can answer it
    pub async fn query(&mut self, query: impl Into<Query>) -> Result<Vec<DomainObject>> {
        let query = query.into();
        self.registry.class(query.class())?;

        if let Some(keys) = self.cache.cached_query(&query).cloned() {
            if let Some(objects) = self.replay(query.class(), &keys) {
                debug!("query cache hit for '{}'", query.class());
                return Ok(objects);
            }
        }

        if let Some(objects) = self.narrow_from_cache(&query)? {
            debug!("narrowed '{}' query from a broader cached result", query.class());
            let keys = objects.iter().filter_map(DomainObject::key).collect();
            self.cache.store_query(query, keys);
            return Ok(objects);
        }

        let results = self.bridge.select(&query, &self.registry).await?;
        let mut keys = Vec::with_capacity(results.len());
        for obj in &results {
            if let Some(key) = obj.key() {
                keys.push(key);
                self.cache.save(obj.clone());
            }
        }
        self.cache.store_query(query, keys);
        Ok(results)
    }

    /// Run a query whose condition is inferred from a closure over a class
    /// handle (see [`crate::query::builder`])
    pub async fn query_with<F>(&mut self, class: &str, build: F) -> Result<Vec<DomainObject>>
    where
        F: FnOnce(&ClassHandle<'_>) -> Result<Condition>,
    {
        let query = infer(&self.registry, class, build)?;
        self.query(query).await
    }

    /// Aggregate group query: the maximum of a field, or of the primary key
    /// when no field is named
    pub async fn max(&mut self, class: &str, field: Option<&str>) -> Result<Option<Value>> {
        self.registry.class(class)?;
        self.bridge.group_max(class, field, &self.registry).await
    }

    /// Route an explicit read-request shape; malformed shapes (unknown
    /// class-field pairs, mismatched value kinds) are argument errors
    pub async fn dispatch(&mut self, request: FetchRequest) -> Result<FetchResult> {
        match request {
            FetchRequest::One { class, key } => Ok(FetchResult::One(self.get(&class, key).await?)),
            FetchRequest::All { class } => {
                Ok(FetchResult::Many(self.query(Query::new(class)).await?))
            }
            FetchRequest::AllMatching {
                class,
                field,
                value,
            } => {
                let condition = {
                    let handle = ClassHandle::new(&self.registry, &class)
                        .map_err(|e| StoreError::argument(e.to_string()))?;
                    let field_handle = handle
                        .field(&field)
                        .map_err(|e| StoreError::argument(e.to_string()))?;
                    match value {
                        Value::Null => field_handle.is_null(),
                        other => field_handle
                            .equals(other)
                            .map_err(|e| StoreError::argument(e.to_string()))?,
                    }
                };
                Ok(FetchResult::Many(
                    self.query(Query::from_condition(condition)).await?,
                ))
            }
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Verify and commit one object: insert, update, or delete per its
    /// state. On success the canonical cache entry is saved or removed, the
    /// commit version bumped, and every cached query result for the class
    /// discarded. Returns the committed object, with its key assigned on
    /// first insert.
    pub async fn commit(&mut self, dobj: DomainObject) -> Result<DomainObject> {
        let mut dobj = dobj;
        // Deletes skip field validation: the object is leaving, not
        // changing state.
        if dobj.commit_kind()? != CommitKind::Delete {
            self.verify(&mut dobj).await?;
        }

        let (outcome, committed) = {
            let mut committer = Committer::new(self.bridge.as_mut(), &self.registry);
            let outcome = committer.commit(dobj).await;
            (outcome, committer.take_committed())
        };

        // Reconcile caches with everything actually written, even when a
        // cascade failed partway: written objects stay written.
        for (obj, kind) in committed {
            let class = obj.class().to_string();
            let Some(key) = obj.key() else { continue };
            match kind {
                CommitKind::Delete => self.cache.remove(&class, key),
                CommitKind::Insert | CommitKind::Update => self.cache.save(obj),
            }
            self.cache.note_commit(&class, key);
            self.cache.invalidate_class_queries(&class);
        }

        outcome
    }

    /// Drop the canonical cached copy of an object and every cached query
    /// result for its class
    pub fn flush(&mut self, dobj: &DomainObject) -> Result<()> {
        let key = dobj.key().ok_or_else(|| {
            StoreError::argument(format!(
                "cannot flush an uncommitted '{}' object",
                dobj.class()
            ))
        })?;
        self.cache.remove(dobj.class(), key);
        self.cache.invalidate_class_queries(dobj.class());
        Ok(())
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Verify an object against its schema: null checks, kind checks,
    /// uniqueness (via a query excluding the object's own key), and
    /// foreign-key subset consistency. All failures are recorded on the
    /// object; the first is returned as the error.
    pub async fn verify(&mut self, dobj: &mut DomainObject) -> Result<()> {
        let class = dobj.class().to_string();
        let merged: Vec<FieldDef> = self
            .registry
            .fields(&class)?
            .into_iter()
            .map(|(_, f)| f.clone())
            .collect();

        let mut failures: Vec<(String, String)> = Vec::new();

        let known: HashSet<&str> = merged.iter().map(|f| f.name.as_str()).collect();
        for (name, _) in dobj.values() {
            if !known.contains(name) {
                failures.push((name.to_string(), "no such field".to_string()));
            }
        }

        for field in &merged {
            let value = match dobj.value(&field.name) {
                Some(value) => value.clone(),
                None => field.default_value.clone().unwrap_or(Value::Null),
            };

            if value.is_null() {
                if field.not_null {
                    failures.push((field.name.clone(), "may not be null".to_string()));
                }
                continue;
            }

            if let Err(msg) = field.kind.check_value(&value) {
                failures.push((field.name.clone(), msg));
                continue;
            }

            if field.unique {
                let mut condition = Condition::Equals {
                    field: FieldRef::new(&class, &field.name),
                    value: value.clone(),
                };
                if let Some(own_key) = dobj.key() {
                    condition = condition.and(
                        Condition::Equals {
                            field: FieldRef::pk(&class),
                            value: Value::Int(own_key),
                        }
                        .negate(),
                    );
                }
                let clashes = self.query(Query::from_condition(condition)).await?;
                if !clashes.is_empty() {
                    failures.push((field.name.clone(), "value is already in use".to_string()));
                }
            }
        }

        // Subset consistency: an owner on the target class may still claim
        // this object through a reciprocal subset field; changing the link
        // away from that owner is rejected, naming it.
        if let Some(own_key) = dobj.key() {
            for field in &merged {
                let Some((target, _)) = field.link_target() else {
                    continue;
                };
                let target = target.to_string();
                let claim_fields: Vec<String> = self
                    .registry
                    .subset_claims(&class, &field.name, &target)
                    .into_iter()
                    .map(|f| f.name.clone())
                    .collect();

                for claim_field in claim_fields {
                    let condition = Condition::Link {
                        field: FieldRef::new(&target, &claim_field),
                        target: LinkRef::new(&class, own_key),
                    };
                    let owners = self.query(Query::from_condition(condition)).await?;
                    let current = dobj.value_or_null(&field.name);
                    for owner in owners {
                        let Some(owner_key) = owner.key() else { continue };
                        let expected = Value::Link(LinkRef::new(&target, owner_key));
                        if current != expected {
                            failures.push((
                                field.name.clone(),
                                format!(
                                    "cannot change: '{}' {} still claims this object through '{}'",
                                    target, owner_key, claim_field
                                ),
                            ));
                        }
                    }
                }
            }
        }

        dobj.set_error_messages(
            failures
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg))
                .collect(),
        );

        match failures.into_iter().next() {
            Some((field, msg)) => Err(StoreError::field_value(class, field, msg)),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Replay a cached key list through the primary cache; `None` when any
    /// canonical copy has been flushed since
    fn replay(&self, class: &str, keys: &[i64]) -> Option<Vec<DomainObject>> {
        keys.iter().map(|key| self.cache.get(class, *key)).collect()
    }

    /// Answer a conditioned query from a broader cached, unlimited result
    /// set by filtering with the in-memory evaluator and re-applying
    /// ordering and windowing
    fn narrow_from_cache(&self, query: &Query) -> Result<Option<Vec<DomainObject>>> {
        let Some(condition) = query.condition_ref() else {
            return Ok(None);
        };

        let mut source: Option<Vec<DomainObject>> = None;
        for (cached, keys) in self.cache.queries_for_class(query.class()) {
            if cached.limit_ref().is_some() {
                continue;
            }
            let broader = match cached.condition_ref() {
                None => true,
                Some(cached_condition) => condition.implies(cached_condition),
            };
            if !broader {
                continue;
            }
            if let Some(objects) = self.replay(query.class(), keys) {
                source = Some(objects);
                break;
            }
        }

        let Some(candidates) = source else {
            return Ok(None);
        };

        let mut matched = Vec::new();
        for obj in candidates {
            if condition.satisfies(&obj, &self.registry)? {
                matched.push(obj);
            }
        }

        if !query.order_fields().is_empty() {
            sort_objects(&mut matched, query.order_fields(), query.direction());
        }
        if let Some(limit) = query.limit_ref() {
            matched = matched
                .into_iter()
                .skip(limit.offset as usize)
                .take(limit.count as usize)
                .collect();
        }

        Ok(Some(matched))
    }
}
