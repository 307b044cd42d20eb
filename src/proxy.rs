//! Lazy domain-object proxies
//!
//! A proxy stands in for a cross-referenced object without materializing it:
//! it holds only the target's class and key, resolves through the store on
//! first use, and re-resolves whenever the store has committed its target
//! since the snapshot was fetched. Holding (class, key) instead of an owning
//! pointer is what keeps cyclic object graphs finite.

use crate::dobj::DomainObject;
use crate::error::{Result, StoreError};
use crate::store::ObjectStore;
use crate::value::{LinkRef, Value};

/// A lazy (class, key) reference with staleness detection
#[derive(Debug, Clone)]
pub struct DomainObjectProxy {
    class: String,
    key: i64,
    snapshot: Option<DomainObject>,
    fetched_version: u64,
}

impl DomainObjectProxy {
    pub fn new(class: impl Into<String>, key: i64) -> Self {
        Self {
            class: class.into(),
            key,
            snapshot: None,
            fetched_version: 0,
        }
    }

    /// Build a proxy from a foreign-key reference
    pub fn from_link(link: LinkRef) -> Self {
        Self::new(link.class, link.key)
    }

    /// Identity, answered without resolution
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Identity, answered without resolution
    pub fn key(&self) -> i64 {
        self.key
    }

    /// Whether a snapshot is currently held
    pub fn is_resolved(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Resolve the target, re-fetching when the store's last-commit version
    /// for (class, key) is newer than this proxy's snapshot
    pub async fn resolve(&mut self, store: &mut ObjectStore) -> Result<&DomainObject> {
        let current = store.commit_version(&self.class, self.key);
        let stale = match &self.snapshot {
            None => true,
            Some(_) => current > self.fetched_version,
        };
        if stale {
            let fetched = store.get(&self.class, self.key).await?;
            self.snapshot = Some(fetched);
            self.fetched_version = current;
        }
        self.snapshot
            .as_ref()
            .ok_or_else(|| StoreError::not_found(&self.class, self.key))
    }

    /// Delegate a field read to the resolved target
    pub async fn value(&mut self, store: &mut ObjectStore, field: &str) -> Result<Value> {
        Ok(self.resolve(store).await?.value_or_null(field))
    }
}

impl From<LinkRef> for DomainObjectProxy {
    fn from(link: LinkRef) -> Self {
        Self::from_link(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_without_resolution() {
        let proxy = DomainObjectProxy::new("client", 4);
        assert_eq!(proxy.class(), "client");
        assert_eq!(proxy.key(), 4);
        assert!(!proxy.is_resolved());
    }

    #[test]
    fn test_from_link() {
        let proxy = DomainObjectProxy::from_link(LinkRef::new("invoice", 9));
        assert_eq!(proxy.class(), "invoice");
        assert_eq!(proxy.key(), 9);
    }
}
