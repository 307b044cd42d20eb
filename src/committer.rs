//! Commit pipeline
//!
//! Resolves the commit kind, runs the class's pre- and post-commit hooks,
//! cascades over dependent rows ahead of a delete, and hands each object to
//! the storage bridge. Cascade failures are not rolled back: objects written
//! before the failure stay written.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

use crate::bridge::DbBridge;
use crate::dobj::{CommitKind, DomainObject};
use crate::error::{Result, StoreError};
use crate::field::DeletePolicy;
use crate::query::{Condition, FieldRef, Query};
use crate::schema::SchemaRegistry;
use crate::value::{LinkRef, Value};

pub(crate) struct Committer<'a> {
    bridge: &'a mut dyn DbBridge,
    registry: &'a SchemaRegistry,
    committed: Vec<(DomainObject, CommitKind)>,
    /// Objects already being deleted in this cascade; guards cyclic
    /// dependency chains against unbounded recursion
    deleting: HashSet<(String, i64)>,
}

impl<'a> Committer<'a> {
    pub fn new(bridge: &'a mut dyn DbBridge, registry: &'a SchemaRegistry) -> Self {
        Self {
            bridge,
            registry,
            committed: Vec::new(),
            deleting: HashSet::new(),
        }
    }

    pub async fn commit(&mut self, dobj: DomainObject) -> Result<DomainObject> {
        self.commit_object(dobj).await
    }

    /// Everything written so far, in write order. Available even after a
    /// failed cascade so the caller can reconcile its caches with the
    /// partial state.
    pub fn take_committed(&mut self) -> Vec<(DomainObject, CommitKind)> {
        std::mem::take(&mut self.committed)
    }

    fn commit_object<'s>(
        &'s mut self,
        mut dobj: DomainObject,
    ) -> Pin<Box<dyn Future<Output = Result<DomainObject>> + Send + 's>> {
        Box::pin(async move {
            let hooks = self.registry.hooks(dobj.class()).cloned();
            if let Some(hooks) = &hooks {
                hooks.before_commit(&mut dobj)?;
            }

            // The hook may have mutated the object; the kind is decided on
            // what will actually be written.
            let kind = dobj.commit_kind()?;

            if kind == CommitKind::Delete {
                if let Some(key) = dobj.key() {
                    self.deleting.insert((dobj.class().to_string(), key));
                }
                self.cascade(&dobj).await?;
            }

            let generated = self.bridge.commit(&dobj, kind, self.registry).await?;
            if kind == CommitKind::Insert {
                match generated {
                    Some(key) => dobj.assign_key(key)?,
                    None => {
                        return Err(StoreError::argument(format!(
                            "backend returned no key for inserted '{}' object",
                            dobj.class()
                        )));
                    }
                }
            }
            dobj.set_last_commit(kind);

            if let Some(hooks) = &hooks {
                hooks.after_commit(&dobj, kind)?;
            }

            self.committed.push((dobj.clone(), kind));
            Ok(dobj)
        })
    }

    /// Resolve every row holding a foreign key into the doomed object and
    /// recursively commit it per its field's policy: cascade-delete, or
    /// detach by nulling the reference.
    async fn cascade(&mut self, dobj: &DomainObject) -> Result<()> {
        let key = dobj.key().ok_or_else(|| {
            StoreError::argument(format!(
                "cannot cascade from an uncommitted '{}' object",
                dobj.class()
            ))
        })?;

        for dep in self.registry.dependents_of(dobj.class()) {
            let condition = Condition::Link {
                field: FieldRef::new(&dep.class, &dep.field),
                target: LinkRef::new(dobj.class(), key),
            };
            let dependents = self
                .bridge
                .select(&Query::from_condition(condition), self.registry)
                .await?;

            for mut dependent in dependents {
                if dependent.class() == dobj.class() && dependent.key() == dobj.key() {
                    continue;
                }
                if let Some(dep_key) = dependent.key() {
                    if self.deleting.contains(&(dependent.class().to_string(), dep_key)) {
                        continue;
                    }
                }

                let outcome = match dep.policy {
                    DeletePolicy::Cascade => {
                        dependent.mark_for_delete();
                        self.commit_object(dependent).await
                    }
                    DeletePolicy::Detach => {
                        dependent.set(dep.field.clone(), Value::Null);
                        self.commit_object(dependent).await
                    }
                };
                if let Err(err) = outcome {
                    warn!(
                        "cascade from '{}' {} failed; earlier writes stay in place: {}",
                        dobj.class(),
                        key,
                        err
                    );
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
