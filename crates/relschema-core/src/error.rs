//! Core error types.

use thiserror::Error;

/// Engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A model declaration violated a structural rule.
    #[error("invalid declaration of model '{model}': {source}")]
    Declaration {
        /// Model being declared.
        model: String,
        /// The violated rule.
        #[source]
        source: DeclarationError,
    },

    /// A model with the same name is already declared.
    #[error("model '{0}' is already declared")]
    DuplicateModel(String),

    /// The registry was hydrated and accepts no more declarations.
    #[error("model registry is sealed after hydration")]
    RegistrySealed,

    /// No model with this name is declared.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// A relation target could not be dereferenced.
    #[error("relation '{model}.{relation}' targets unresolved model '{target}'")]
    UnresolvedRelation {
        /// Declaring model.
        model: String,
        /// Relation name.
        relation: String,
        /// Target model name.
        target: String,
    },

    /// An operation name that does not exist.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
}

/// Structural rules checked when a model is declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// The model has no name.
    #[error("model name must not be empty")]
    EmptyModelName,

    /// Two fields share a name.
    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    /// Two relations share a name.
    #[error("duplicate relation '{0}'")]
    DuplicateRelation(String),

    /// A relation reuses a field name.
    #[error("relation '{0}' has the same name as a field")]
    RelationShadowsField(String),

    /// A constraint, index or omit entry names an undeclared field.
    #[error("{context} references undeclared field '{field}'")]
    UnknownField {
        /// Where the reference appears.
        context: String,
        /// The undeclared field.
        field: String,
    },

    /// A compound constraint or index lists no fields.
    #[error("{0} must list at least one field")]
    EmptyConstraint(String),

    /// More than one identifier is declared.
    #[error("model declares more than one identifier: {}", .0.join(", "))]
    MultipleIds(Vec<String>),

    /// An identifier field accepts null.
    #[error("identifier field '{0}' cannot be nullable")]
    NullableId(String),

    /// `SetNull` on a foreign key that cannot hold null.
    #[error("relation '{relation}' uses SetNull but foreign key '{field}' is not nullable")]
    SetNullOnRequired {
        /// Relation name.
        relation: String,
        /// Foreign-key field.
        field: String,
    },

    /// Two compound constraints resolve to the same name.
    #[error("compound constraint name '{0}' is used more than once")]
    CompoundNameCollision(String),
}
