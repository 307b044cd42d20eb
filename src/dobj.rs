//! Domain objects
//!
//! A domain object is a typed in-memory record: class identity, an optional
//! primary key, a field-name to value mapping, and commit bookkeeping.

use std::collections::BTreeMap;

use crate::error::{Result, StoreError};
use crate::value::{LinkRef, Value};

/// The three terminal commit types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// Object has no key yet; a row is inserted per concrete level
    Insert,
    /// Object has a key and is not marked for deletion
    Update,
    /// Object has a key and is marked for deletion
    Delete,
}

/// A typed in-memory record mapped onto relational rows
#[derive(Debug, Clone, PartialEq)]
pub struct DomainObject {
    class: String,
    key: Option<i64>,
    values: BTreeMap<String, Value>,
    pending_delete: bool,
    last_commit: Option<CommitKind>,
    error_messages: Vec<String>,
}

impl DomainObject {
    /// Create a new, uncommitted object of the given class
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            key: None,
            values: BTreeMap::new(),
            pending_delete: false,
            last_commit: None,
            error_messages: Vec::new(),
        }
    }

    /// Create an object that already has a primary key (row decoding)
    pub fn with_key(class: impl Into<String>, key: i64) -> Self {
        let mut dobj = Self::new(class);
        dobj.key = Some(key);
        dobj
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn key(&self) -> Option<i64> {
        self.key
    }

    /// Assign the generated primary key after a first insert.
    ///
    /// A key, once assigned, is immutable; reassignment is an error.
    pub fn assign_key(&mut self, key: i64) -> Result<()> {
        if let Some(existing) = self.key {
            return Err(StoreError::argument(format!(
                "'{}' object already has key {}; keys are immutable",
                self.class, existing
            )));
        }
        self.key = Some(key);
        Ok(())
    }

    /// Set a field value, chained-builder style
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field value in place
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Read a field value, `None` when the field was never set
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Read a field value, treating never-set fields as null
    pub fn value_or_null(&self, field: &str) -> Value {
        self.values.get(field).cloned().unwrap_or(Value::Null)
    }

    /// Read a foreign-key field as its lazy reference
    pub fn link(&self, field: &str) -> Option<LinkRef> {
        match self.values.get(field) {
            Some(Value::Link(link)) => Some(link.clone()),
            _ => None,
        }
    }

    /// Iterate over all set field values
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Mark the object for deletion on its next commit
    pub fn mark_for_delete(&mut self) {
        self.pending_delete = true;
    }

    pub fn pending_delete(&self) -> bool {
        self.pending_delete
    }

    /// The commit type the object's current state calls for.
    ///
    /// An object marked for deletion must already have a key.
    pub fn commit_kind(&self) -> Result<CommitKind> {
        match (self.key, self.pending_delete) {
            (None, true) => Err(StoreError::argument(format!(
                "cannot delete an uncommitted '{}' object",
                self.class
            ))),
            (None, false) => Ok(CommitKind::Insert),
            (Some(_), true) => Ok(CommitKind::Delete),
            (Some(_), false) => Ok(CommitKind::Update),
        }
    }

    /// Kind of the most recent successful commit, if any
    pub fn last_commit(&self) -> Option<CommitKind> {
        self.last_commit
    }

    pub(crate) fn set_last_commit(&mut self, kind: CommitKind) {
        self.last_commit = Some(kind);
    }

    /// Outstanding verification messages; non-empty blocks SQL generation
    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub(crate) fn set_error_messages(&mut self, messages: Vec<String>) {
        self.error_messages = messages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Commit Kind Tests
    // =========================================================================

    #[test]
    fn test_commit_kind_insert_without_key() {
        let dobj = DomainObject::new("client");
        assert_eq!(dobj.commit_kind().unwrap(), CommitKind::Insert);
    }

    #[test]
    fn test_commit_kind_update_with_key() {
        let dobj = DomainObject::with_key("client", 1);
        assert_eq!(dobj.commit_kind().unwrap(), CommitKind::Update);
    }

    #[test]
    fn test_commit_kind_delete_with_key_and_flag() {
        let mut dobj = DomainObject::with_key("client", 1);
        dobj.mark_for_delete();
        assert_eq!(dobj.commit_kind().unwrap(), CommitKind::Delete);
    }

    #[test]
    fn test_delete_without_key_is_error() {
        let mut dobj = DomainObject::new("client");
        dobj.mark_for_delete();
        assert!(dobj.commit_kind().is_err());
    }

    // =========================================================================
    // Key Immutability Tests
    // =========================================================================

    #[test]
    fn test_assign_key_once() {
        let mut dobj = DomainObject::new("client");
        dobj.assign_key(5).unwrap();
        assert_eq!(dobj.key(), Some(5));
    }

    #[test]
    fn test_reassigning_key_is_error() {
        let mut dobj = DomainObject::with_key("client", 5);
        assert!(dobj.assign_key(6).is_err());
        assert_eq!(dobj.key(), Some(5));
    }

    // =========================================================================
    // Field Access Tests
    // =========================================================================

    #[test]
    fn test_set_and_read_values() {
        let dobj = DomainObject::new("client")
            .with("name", "Acme")
            .with("active", true);
        assert_eq!(dobj.value("name"), Some(&Value::Text("Acme".to_string())));
        assert_eq!(dobj.value("missing"), None);
        assert_eq!(dobj.value_or_null("missing"), Value::Null);
    }

    #[test]
    fn test_link_accessor() {
        let dobj = DomainObject::new("invoice").with("client", LinkRef::new("client", 3));
        let link = dobj.link("client").unwrap();
        assert_eq!(link.class, "client");
        assert_eq!(link.key, 3);
        assert!(dobj.link("missing").is_none());
    }

    #[test]
    fn test_clone_is_deep() {
        let original = DomainObject::new("client").with("name", "Acme");
        let mut copy = original.clone();
        copy.set("name", "Other");
        assert_eq!(original.value("name"), Some(&Value::Text("Acme".to_string())));
        assert_ne!(original, copy);
    }
}
