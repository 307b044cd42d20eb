//! Domain class schemas and the schema registry
//!
//! A class schema describes one concrete inheritance level: its table, its
//! primary-key column, and the fields it owns. The registry holds the full
//! class set, resolves inheritance chains, and validates the whole schema
//! once at build time.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::dobj::{CommitKind, DomainObject};
use crate::error::{Result, StoreError};
use crate::field::{DeletePolicy, FieldDef, FieldKind};
use crate::sql::ident::validate_identifier;

/// Primary-key column used when a class does not configure its own
pub const DEFAULT_PK_COLUMN: &str = "pk_id";

fn default_pk_column() -> String {
    DEFAULT_PK_COLUMN.to_string()
}

/// Pre- and post-commit hooks, registered per class on the registry
pub trait CommitHooks: Send + Sync {
    /// Invoked before any SQL is generated for the object
    fn before_commit(&self, dobj: &mut DomainObject) -> Result<()> {
        let _ = dobj;
        Ok(())
    }

    /// Invoked after the object (and any cascaded dependents) were written
    fn after_commit(&self, dobj: &DomainObject, kind: CommitKind) -> Result<()> {
        let _ = (dobj, kind);
        Ok(())
    }
}

/// One concrete inheritance level of a domain class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSchema {
    /// Domain class name
    pub name: String,

    /// Database table owned by this level
    #[serde(rename = "tableName")]
    pub table_name: String,

    /// Primary-key column of this level's table (default: `pk_id`).
    /// All levels of one inheritance chain share the key *value*, not the
    /// column name.
    #[serde(default = "default_pk_column", rename = "pkColumn")]
    pub pk_column: String,

    /// Parent class for multi-table inheritance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Fields owned by this level
    pub fields: Vec<FieldDef>,
}

impl ClassSchema {
    /// Create a schema for a class mapped onto the given table
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            pk_column: default_pk_column(),
            parent: None,
            fields: Vec::new(),
        }
    }

    /// Add a field owned by this level
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare the parent class of this level
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Use a non-default primary-key column
    pub fn pk_column(mut self, column: impl Into<String>) -> Self {
        self.pk_column = column.into();
        self
    }

    /// Look up a field owned by this level
    pub fn own_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A foreign-key relation pointing into some class, as seen from the target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentLink {
    /// Class holding the foreign key
    pub class: String,
    /// Name of the foreign-key field on that class
    pub field: String,
    /// Delete-time policy configured on the field
    pub policy: DeletePolicy,
}

/// The resolved set of domain classes, validated once at build time
pub struct SchemaRegistry {
    classes: HashMap<String, ClassSchema>,
    hooks: HashMap<String, Arc<dyn CommitHooks>>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SchemaRegistry")
            .field("classes", &names)
            .finish()
    }
}

impl SchemaRegistry {
    /// Create a new registry builder
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// Build a registry from a JSON descriptor: an array of class schemas.
    ///
    /// The descriptor format is a boundary convenience; the rest of the core
    /// only ever consumes the resolved class set.
    pub fn from_json(descriptor: &str) -> Result<Self> {
        let classes: Vec<ClassSchema> = serde_json::from_str(descriptor)?;
        let mut builder = Self::builder();
        for class in classes {
            builder = builder.class(class);
        }
        builder.finish()
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Result<&ClassSchema> {
        self.classes
            .get(name)
            .ok_or_else(|| StoreError::class_resolution(name))
    }

    /// All registered class names, sorted
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The concrete inheritance levels of a class, root first.
    ///
    /// Computed once per call from the parent chain; both SQL rendering and
    /// the committer's per-level write loop consume this ordering.
    pub fn levels(&self, name: &str) -> Result<Vec<&ClassSchema>> {
        let mut chain = Vec::new();
        let mut current = Some(self.class(name)?);
        while let Some(schema) = current {
            chain.push(schema);
            current = match &schema.parent {
                Some(parent) => Some(self.class(parent)?),
                None => None,
            };
        }
        chain.reverse();
        Ok(chain)
    }

    /// The full field list of a class, each paired with its owning level,
    /// root-level fields first
    pub fn fields(&self, name: &str) -> Result<Vec<(&ClassSchema, &FieldDef)>> {
        let mut merged = Vec::new();
        for level in self.levels(name)? {
            for field in &level.fields {
                merged.push((level, field));
            }
        }
        Ok(merged)
    }

    /// Resolve a field name against a class's full field set.
    ///
    /// Unknown names are an error naming the class and field.
    pub fn field(&self, class: &str, field: &str) -> Result<(&ClassSchema, &FieldDef)> {
        self.fields(class)?
            .into_iter()
            .find(|(_, f)| f.name == field)
            .ok_or_else(|| StoreError::field_value(class, field, "no such field"))
    }

    /// Every foreign-key relation held by any class into `target`
    pub fn dependents_of(&self, target: &str) -> Vec<DependentLink> {
        let mut dependents = Vec::new();
        for schema in self.classes.values() {
            for field in &schema.fields {
                if let Some((link_target, policy)) = field.link_target() {
                    if link_target == target {
                        dependents.push(DependentLink {
                            class: schema.name.clone(),
                            field: field.name.clone(),
                            policy,
                        });
                    }
                }
            }
        }
        dependents.sort_by(|a, b| (&a.class, &a.field).cmp(&(&b.class, &b.field)));
        dependents
    }

    /// Fields on `target` that declare `via_field` of `class` a constrained
    /// subset: `(field on target)` pairs used by subset-consistency checks
    pub fn subset_claims(&self, class: &str, via_field: &str, target: &str) -> Vec<&FieldDef> {
        let Some(schema) = self.classes.get(target) else {
            return Vec::new();
        };
        schema
            .fields
            .iter()
            .filter(|f| {
                f.subset_of.as_deref() == Some(via_field)
                    && f.link_target().is_some_and(|(t, _)| t == class)
            })
            .collect()
    }

    /// Commit hooks registered for a class, if any
    pub fn hooks(&self, class: &str) -> Option<&Arc<dyn CommitHooks>> {
        self.hooks.get(class)
    }
}

/// Builder for [`SchemaRegistry`]
#[derive(Default)]
pub struct SchemaRegistryBuilder {
    classes: Vec<ClassSchema>,
    hooks: HashMap<String, Arc<dyn CommitHooks>>,
}

impl SchemaRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class schema
    pub fn class(mut self, schema: ClassSchema) -> Self {
        self.classes.push(schema);
        self
    }

    /// Register commit hooks for a class
    pub fn hooks(mut self, class: impl Into<String>, hooks: Arc<dyn CommitHooks>) -> Self {
        self.hooks.insert(class.into(), hooks);
        self
    }

    /// Validate the class set and produce the registry.
    ///
    /// Checks: identifier hygiene, parent resolution and cycle freedom,
    /// field-name and column uniqueness across each full inherited set,
    /// foreign-key target resolution, and subset-marker reciprocity.
    pub fn finish(self) -> Result<SchemaRegistry> {
        let mut classes: HashMap<String, ClassSchema> = HashMap::new();
        for schema in self.classes {
            if classes.contains_key(&schema.name) {
                return Err(StoreError::schema(format!(
                    "class '{}' declared twice",
                    schema.name
                )));
            }
            classes.insert(schema.name.clone(), schema);
        }

        let registry = SchemaRegistry {
            classes,
            hooks: self.hooks,
        };

        for schema in registry.classes.values() {
            validate_class(&registry, schema)?;
        }
        for class in registry.hooks.keys() {
            if !registry.classes.contains_key(class) {
                return Err(StoreError::schema(format!(
                    "hooks registered for unknown class '{}'",
                    class
                )));
            }
        }

        Ok(registry)
    }
}

fn validate_class(registry: &SchemaRegistry, schema: &ClassSchema) -> Result<()> {
    let bad = |msg: String| StoreError::schema(format!("class '{}': {}", schema.name, msg));

    validate_identifier(&schema.name).map_err(|e| bad(e))?;
    validate_identifier(&schema.table_name).map_err(|e| bad(e))?;
    validate_identifier(&schema.pk_column).map_err(|e| bad(e))?;

    // Parent chain must resolve and must not cycle back.
    let mut seen = HashSet::new();
    seen.insert(schema.name.as_str());
    let mut current = schema.parent.as_deref();
    while let Some(parent) = current {
        if !seen.insert(parent) {
            return Err(bad(format!("inheritance cycle through '{}'", parent)));
        }
        let parent_schema = registry
            .classes
            .get(parent)
            .ok_or_else(|| bad(format!("unknown parent class '{}'", parent)))?;
        current = parent_schema.parent.as_deref();
    }

    // Field names and DB columns must be unique across the merged set, and
    // no field column may shadow a level's primary-key column.
    let levels = registry.levels(&schema.name)?;
    let pk_columns: HashSet<&str> = levels.iter().map(|l| l.pk_column.as_str()).collect();
    let mut field_names = HashSet::new();
    let mut columns = HashSet::new();
    for (_, field) in registry.fields(&schema.name)? {
        validate_identifier(&field.name).map_err(|e| bad(e))?;
        validate_identifier(field.db_column()).map_err(|e| bad(e))?;
        if !field_names.insert(field.name.as_str()) {
            return Err(bad(format!(
                "field '{}' appears more than once in the inherited field set",
                field.name
            )));
        }
        if pk_columns.contains(field.db_column()) {
            return Err(bad(format!(
                "field '{}' maps onto a primary-key column",
                field.name
            )));
        }
        if !columns.insert(field.db_column()) {
            return Err(bad(format!(
                "column '{}' mapped by more than one field",
                field.db_column()
            )));
        }
    }

    // Foreign keys must target known classes; subset markers must name a
    // reciprocal link field on the target.
    for field in &schema.fields {
        if let FieldKind::Enum { values } = &field.kind {
            if values.is_empty() {
                return Err(bad(format!("enum field '{}' has no variants", field.name)));
            }
        }
        if let Some((target, _)) = field.link_target() {
            let target_schema = registry
                .classes
                .get(target)
                .ok_or_else(|| bad(format!(
                    "field '{}' links to unknown class '{}'",
                    field.name, target
                )))?;
            if let Some(subset_of) = &field.subset_of {
                let reciprocal = target_schema.own_field(subset_of).ok_or_else(|| {
                    bad(format!(
                        "field '{}' marks subset of '{}.{}', which does not exist",
                        field.name, target, subset_of
                    ))
                })?;
                let points_back = reciprocal
                    .link_target()
                    .is_some_and(|(t, _)| t == schema.name);
                if !points_back {
                    return Err(bad(format!(
                        "field '{}' marks subset of '{}.{}', which does not link back to '{}'",
                        field.name, target, subset_of, schema.name
                    )));
                }
            }
        } else if field.subset_of.is_some() {
            return Err(bad(format!(
                "field '{}' carries a subset marker but is not a foreign key",
                field.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_invoice_registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .class(
                ClassSchema::new("client", "clients")
                    .field(FieldDef::text("name").not_null())
                    .field(FieldDef::link("priority_invoice", "invoice").subset_of("client")),
            )
            .class(
                ClassSchema::new("invoice", "invoices")
                    .field(FieldDef::link("client", "client"))
                    .field(FieldDef::decimal("rate")),
            )
            .finish()
            .unwrap()
    }

    // =========================================================================
    // Lookup Tests
    // =========================================================================

    #[test]
    fn test_class_lookup() {
        let registry = client_invoice_registry();
        assert_eq!(registry.class("client").unwrap().table_name, "clients");
        assert!(matches!(
            registry.class("widget"),
            Err(StoreError::ClassResolution(_))
        ));
    }

    #[test]
    fn test_field_lookup_unknown_name_is_error() {
        let registry = client_invoice_registry();
        assert!(registry.field("client", "name").is_ok());
        assert!(registry.field("client", "nope").is_err());
    }

    // =========================================================================
    // Inheritance Tests
    // =========================================================================

    fn user_admin_registry() -> SchemaRegistry {
        SchemaRegistry::builder()
            .class(
                ClassSchema::new("user", "users")
                    .field(FieldDef::text("email").not_null().unique()),
            )
            .class(
                ClassSchema::new("admin", "admins")
                    .parent("user")
                    .field(FieldDef::boolean("superuser")),
            )
            .finish()
            .unwrap()
    }

    #[test]
    fn test_levels_root_first() {
        let registry = user_admin_registry();
        let levels = registry.levels("admin").unwrap();
        let names: Vec<&str> = levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["user", "admin"]);
    }

    #[test]
    fn test_merged_fields_include_inherited() {
        let registry = user_admin_registry();
        let fields: Vec<&str> = registry
            .fields("admin")
            .unwrap()
            .into_iter()
            .map(|(_, f)| f.name.as_str())
            .collect();
        assert_eq!(fields, vec!["email", "superuser"]);
    }

    #[test]
    fn test_inherited_field_resolves_to_owning_level() {
        let registry = user_admin_registry();
        let (level, field) = registry.field("admin", "email").unwrap();
        assert_eq!(level.name, "user");
        assert_eq!(field.name, "email");
    }

    #[test]
    fn test_duplicate_inherited_field_rejected() {
        let result = SchemaRegistry::builder()
            .class(ClassSchema::new("user", "users").field(FieldDef::text("email")))
            .class(
                ClassSchema::new("admin", "admins")
                    .parent("user")
                    .field(FieldDef::text("email")),
            )
            .finish();
        assert!(matches!(result, Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_inheritance_cycle_rejected() {
        let result = SchemaRegistry::builder()
            .class(ClassSchema::new("a", "t_a").parent("b"))
            .class(ClassSchema::new("b", "t_b").parent("a"))
            .finish();
        assert!(matches!(result, Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let result = SchemaRegistry::builder()
            .class(ClassSchema::new("a", "t_a").parent("ghost"))
            .finish();
        assert!(matches!(result, Err(StoreError::Schema(_))));
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_bad_identifier_rejected() {
        let result = SchemaRegistry::builder()
            .class(ClassSchema::new("Client", "clients"))
            .finish();
        assert!(matches!(result, Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_unknown_link_target_rejected() {
        let result = SchemaRegistry::builder()
            .class(ClassSchema::new("invoice", "invoices").field(FieldDef::link("client", "client")))
            .finish();
        assert!(matches!(result, Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_field_shadowing_pk_column_rejected() {
        let result = SchemaRegistry::builder()
            .class(ClassSchema::new("client", "clients").field(FieldDef::int("pk_id")))
            .finish();
        assert!(matches!(result, Err(StoreError::Schema(_))));
    }

    #[test]
    fn test_subset_marker_must_point_back() {
        let result = SchemaRegistry::builder()
            .class(
                ClassSchema::new("client", "clients")
                    .field(FieldDef::link("priority_invoice", "invoice").subset_of("total")),
            )
            .class(
                ClassSchema::new("invoice", "invoices").field(FieldDef::decimal("total")),
            )
            .finish();
        assert!(matches!(result, Err(StoreError::Schema(_))));
    }

    // =========================================================================
    // Dependents Tests
    // =========================================================================

    #[test]
    fn test_dependents_of_target() {
        let registry = client_invoice_registry();
        let dependents = registry.dependents_of("client");
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].class, "invoice");
        assert_eq!(dependents[0].field, "client");
        assert_eq!(dependents[0].policy, DeletePolicy::Detach);
    }

    #[test]
    fn test_subset_claims() {
        let registry = client_invoice_registry();
        let claims = registry.subset_claims("invoice", "client", "client");
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].name, "priority_invoice");
    }

    // =========================================================================
    // Descriptor Tests
    // =========================================================================

    #[test]
    fn test_from_json_descriptor() {
        let descriptor = r#"[
            {
                "name": "client",
                "tableName": "clients",
                "fields": [
                    {"name": "name", "kind": "text", "notNull": true}
                ]
            },
            {
                "name": "invoice",
                "tableName": "invoices",
                "fields": [
                    {"name": "client", "kind": "foreignkey", "target": "client", "onDelete": "cascade"},
                    {"name": "paid", "kind": "boolean"}
                ]
            }
        ]"#;
        let registry = SchemaRegistry::from_json(descriptor).unwrap();
        assert_eq!(registry.class_names(), vec!["client", "invoice"]);
        let dependents = registry.dependents_of("client");
        assert_eq!(dependents[0].policy, DeletePolicy::Cascade);
    }

    #[test]
    fn test_from_json_invalid_descriptor_is_error() {
        assert!(matches!(
            SchemaRegistry::from_json("not json"),
            Err(StoreError::Descriptor(_))
        ));
    }
}
