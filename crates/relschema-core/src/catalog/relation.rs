//! Relation definitions between models.

use std::fmt;
use std::sync::Arc;

use super::registry::Model;

/// Cardinality of a relation, seen from the declaring model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    /// One-to-one relation.
    OneToOne,
    /// One-to-many relation (foreign key on the target).
    OneToMany,
    /// Many-to-one relation (foreign key on the declaring model).
    ManyToOne,
    /// Many-to-many relation (join table).
    ManyToMany,
}

impl RelationType {
    /// Whether the relation points at a list of records.
    pub fn is_to_many(self) -> bool {
        matches!(self, RelationType::OneToMany | RelationType::ManyToMany)
    }

    /// Whether the relation points at a single record.
    pub fn is_to_one(self) -> bool {
        !self.is_to_many()
    }
}

/// Behavior when a referenced record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteBehavior {
    /// Delete related records.
    Cascade,
    /// Prevent deletion if related records exist.
    Restrict,
    /// Set foreign key to null.
    SetNull,
    /// Leave it to the database.
    NoAction,
}

/// Deferred lookup of a relation's target model.
///
/// The resolver names the target and is only invoked while validating a
/// payload, never while schemas are being built. Resolvers created by
/// [`ModelRegistry::resolver`](super::ModelRegistry::resolver) hold a weak
/// handle to the registry so relation cycles never keep models alive.
#[derive(Clone)]
pub struct ModelResolver {
    target: String,
    resolve: Arc<dyn Fn() -> Option<Arc<Model>> + Send + Sync>,
}

impl ModelResolver {
    /// Create a resolver from a closure.
    pub fn new(
        target: impl Into<String>,
        resolve: impl Fn() -> Option<Arc<Model>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            target: target.into(),
            resolve: Arc::new(resolve),
        }
    }

    /// Name of the target model.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Dereference the target.
    pub fn resolve(&self) -> Option<Arc<Model>> {
        (self.resolve)()
    }
}

impl fmt::Debug for ModelResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModelResolver").field(&self.target).finish()
    }
}

/// A relation definition on a model.
#[derive(Debug, Clone)]
pub struct RelationDef {
    /// Relation name (unique within the model, disjoint from field names).
    pub name: String,
    /// Relation cardinality.
    pub relation_type: RelationType,
    /// Whether the related record may be absent.
    pub optional: bool,
    /// Deferred target.
    pub target: ModelResolver,
    /// Foreign-key field, on whichever side holds it.
    pub foreign_key: Option<String>,
    /// Delete behavior.
    pub on_delete: DeleteBehavior,
}

impl RelationDef {
    fn new(name: impl Into<String>, relation_type: RelationType, target: ModelResolver) -> Self {
        Self {
            name: name.into(),
            relation_type,
            optional: false,
            target,
            foreign_key: None,
            on_delete: DeleteBehavior::Restrict,
        }
    }

    /// Create a one-to-one relation.
    pub fn one_to_one(name: impl Into<String>, target: ModelResolver) -> Self {
        Self::new(name, RelationType::OneToOne, target)
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(name: impl Into<String>, target: ModelResolver) -> Self {
        Self::new(name, RelationType::OneToMany, target)
    }

    /// Create a many-to-one relation.
    pub fn many_to_one(name: impl Into<String>, target: ModelResolver) -> Self {
        Self::new(name, RelationType::ManyToOne, target)
    }

    /// Create a many-to-many relation.
    pub fn many_to_many(name: impl Into<String>, target: ModelResolver) -> Self {
        Self::new(name, RelationType::ManyToMany, target).with_on_delete(DeleteBehavior::Cascade)
    }

    /// Allow the related record to be absent.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Set the foreign-key field.
    pub fn with_foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_key = Some(field.into());
        self
    }

    /// Set delete behavior.
    pub fn with_on_delete(mut self, on_delete: DeleteBehavior) -> Self {
        self.on_delete = on_delete;
        self
    }

    /// Whether the relation points at a list of records.
    pub fn is_to_many(&self) -> bool {
        self.relation_type.is_to_many()
    }

    /// Name of the target model.
    pub fn target_name(&self) -> &str {
        self.target.target()
    }
}
