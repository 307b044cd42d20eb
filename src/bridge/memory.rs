//! In-memory storage bridge for tests and request-scoped stores
//!
//! Holds objects in nested maps keyed by class then primary key, filters
//! with `Condition::satisfies` instead of SQL, and assigns monotonically
//! increasing keys per class. For equivalent data it produces the same
//! result sets as the SQL backend.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::bridge::DbBridge;
use crate::dobj::{CommitKind, DomainObject};
use crate::error::{Result, StoreError};
use crate::query::{sort_objects, sort_value, Query};
use crate::schema::SchemaRegistry;
use crate::value::{order_cmp, Value};

/// In-memory twin of the SQL bridge
#[derive(Debug, Default)]
pub struct MemoryBridge {
    objects: HashMap<String, BTreeMap<i64, DomainObject>>,
    last_keys: HashMap<String, i64>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key assignment is atomic per class: the next key is strictly greater
    /// than every key ever handed out for the class.
    fn next_key(&mut self, class: &str) -> i64 {
        let highest_stored = self
            .objects
            .get(class)
            .and_then(|rows| rows.keys().next_back().copied())
            .unwrap_or(0);
        let last = self.last_keys.get(class).copied().unwrap_or(0);
        let key = highest_stored.max(last) + 1;
        self.last_keys.insert(class.to_string(), key);
        key
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
}

#[async_trait]
impl DbBridge for MemoryBridge {
    async fn commit(
        &mut self,
        dobj: &DomainObject,
        kind: CommitKind,
        registry: &SchemaRegistry,
    ) -> Result<Option<i64>> {
        registry.class(dobj.class())?;
        Self::refuse_unverified(dobj)?;

        match kind {
            CommitKind::Insert => {
                let key = self.next_key(dobj.class());
                let mut stored = dobj.clone();
                stored.assign_key(key)?;
                self.objects
                    .entry(dobj.class().to_string())
                    .or_default()
                    .insert(key, stored);
                Ok(Some(key))
            }
            CommitKind::Update => {
                let key = dobj.key().ok_or_else(|| {
                    StoreError::argument(format!(
                        "'{}' object has no key to address its rows",
                        dobj.class()
                    ))
                })?;
                self.objects
                    .entry(dobj.class().to_string())
                    .or_default()
                    .insert(key, dobj.clone());
                Ok(None)
            }
            CommitKind::Delete => {
                let key = dobj.key().ok_or_else(|| {
                    StoreError::argument(format!(
                        "'{}' object has no key to address its rows",
                        dobj.class()
                    ))
                })?;
                if let Some(rows) = self.objects.get_mut(dobj.class()) {
                    rows.remove(&key);
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
        registry.class(query.class())?;

        let mut matches = Vec::new();
        if let Some(rows) = self.objects.get(query.class()) {
            for dobj in rows.values() {
                let keep = match query.condition_ref() {
                    Some(condition) => condition.satisfies(dobj, registry)?,
                    None => true,
                };
                if keep {
                    matches.push(dobj.clone());
                }
            }
        }

        if !query.order_fields().is_empty() {
            sort_objects(&mut matches, query.order_fields(), query.direction());
        }

        if let Some(limit) = query.limit_ref() {
            matches = matches
                .into_iter()
                .skip(limit.offset as usize)
                .take(limit.count as usize)
                .collect();
        }

        Ok(matches)
    }

    async fn group_max(
        &mut self,
        class: &str,
        field: Option<&str>,
        registry: &SchemaRegistry,
    ) -> Result<Option<Value>> {
        registry.class(class)?;
        if let Some(name) = field {
            registry.field(class, name)?;
        }

        let Some(rows) = self.objects.get(class) else {
            return Ok(None);
        };

        let mut best: Option<Value> = None;
        for dobj in rows.values() {
            let candidate = match field {
                Some(name) => sort_value(dobj, name),
                None => dobj.key().map(Value::Int).unwrap_or(Value::Null),
            };
            if candidate.is_null() {
                continue;
            }
            best = match best {
                Some(current) if order_cmp(&candidate, &current).is_le() => Some(current),
                _ => Some(candidate),
            };
        }
        Ok(best)
    }

    fn last_generated_key(&self, class: &str) -> Option<i64> {
        self.last_keys.get(class).copied()
    }
}
