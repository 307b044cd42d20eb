//! Two-level cache owned by the object store
//!
//! The primary cache holds the canonical copy of each fetched object; the
//! query cache holds ordered primary-key lists per query fingerprint.
//! Canonical objects never leave the cache: every read hands out a clone.
//! Invalidation is coarse by design: any commit or flush of a class discards
//! every cached query result for that class.

use std::collections::HashMap;

use crate::dobj::DomainObject;
use crate::query::Query;

#[derive(Debug, Default)]
pub(crate) struct StoreCache {
    objects: HashMap<String, HashMap<i64, DomainObject>>,
    queries: HashMap<Query, Vec<i64>>,
    versions: HashMap<(String, i64), u64>,
    clock: u64,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone of the canonical object, if cached
    pub fn get(&self, class: &str, key: i64) -> Option<DomainObject> {
        self.objects.get(class)?.get(&key).cloned()
    }

    pub fn contains(&self, class: &str, key: i64) -> bool {
        self.objects
            .get(class)
            .is_some_and(|rows| rows.contains_key(&key))
    }

    /// Store the canonical copy of an object. Objects without keys are never
    /// cached.
    pub fn save(&mut self, dobj: DomainObject) {
        if let Some(key) = dobj.key() {
            self.objects
                .entry(dobj.class().to_string())
                .or_default()
                .insert(key, dobj);
        }
    }

    pub fn remove(&mut self, class: &str, key: i64) {
        if let Some(rows) = self.objects.get_mut(class) {
            rows.remove(&key);
        }
    }

    /// The cached key list for an exact query fingerprint
    pub fn cached_query(&self, query: &Query) -> Option<&Vec<i64>> {
        self.queries.get(query)
    }

    /// Cached queries for one class, for implied-result reuse
    pub fn queries_for_class<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = (&'a Query, &'a Vec<i64>)> {
        self.queries
            .iter()
            .filter(move |(query, _)| query.class() == class)
    }

    pub fn store_query(&mut self, query: Query, keys: Vec<i64>) {
        self.queries.insert(query, keys);
    }

    /// Discard every cached query result for a class
    pub fn invalidate_class_queries(&mut self, class: &str) {
        self.queries.retain(|query, _| query.class() != class);
    }

    /// Record a commit of (class, key) and return the new logical version
    pub fn note_commit(&mut self, class: &str, key: i64) -> u64 {
        self.clock += 1;
        self.versions.insert((class.to_string(), key), self.clock);
        self.clock
    }

    /// The last-commit version of (class, key); 0 when never committed here
    pub fn version(&self, class: &str, key: i64) -> u64 {
        self.versions
            .get(&(class.to_string(), key))
            .copied()
            .unwrap_or(0)
    }

    /// The current logical clock
    pub fn clock(&self) -> u64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn cached_client(cache: &mut StoreCache, key: i64, name: &str) {
        cache.save(DomainObject::with_key("client", key).with("name", name));
    }

    #[test]
    fn test_get_returns_clone_not_canonical() {
        let mut cache = StoreCache::new();
        cached_client(&mut cache, 1, "Acme");

        let mut copy = cache.get("client", 1).unwrap();
        copy.set("name", "Mutated");

        let fresh = cache.get("client", 1).unwrap();
        assert_eq!(fresh.value_or_null("name"), Value::Text("Acme".into()));
    }

    #[test]
    fn test_keyless_objects_are_not_cached() {
        let mut cache = StoreCache::new();
        cache.save(DomainObject::new("client"));
        assert!(!cache.contains("client", 0));
    }

    #[test]
    fn test_class_invalidation_spares_other_classes() {
        let mut cache = StoreCache::new();
        cache.store_query(Query::new("client"), vec![1, 2]);
        cache.store_query(Query::new("invoice"), vec![3]);

        cache.invalidate_class_queries("client");

        assert!(cache.cached_query(&Query::new("client")).is_none());
        assert_eq!(cache.cached_query(&Query::new("invoice")), Some(&vec![3]));
    }

    #[test]
    fn test_commit_versions_are_strictly_increasing() {
        let mut cache = StoreCache::new();
        let v1 = cache.note_commit("client", 1);
        let v2 = cache.note_commit("client", 2);
        let v3 = cache.note_commit("client", 1);
        assert!(v1 < v2 && v2 < v3);
        assert_eq!(cache.version("client", 1), v3);
        assert_eq!(cache.version("client", 9), 0);
    }
}
