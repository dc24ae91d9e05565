//! relschema core - model catalog and schema composition.
//!
//! Models are declared into a [`ModelRegistry`]. For every model the engine
//! derives a [`SchemaBundle`]: where/create/update/select/include/orderBy
//! schemas and the argument shape of every query operation, wired across
//! relations (including cyclic ones) through deferred resolvers.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod primitive;
pub mod schema;

pub use builder::{aggregate_filter, Operation, OperationArgs, ScalarSchemas, SchemaBundle};
pub use catalog::{
    AutoGenerate, CompoundConstraint, CustomValidator, DefaultValue, DeleteBehavior, FieldDef,
    HydrationReport, Model, ModelDef, ModelRegistry, ModelResolver, ModelState, RelationDef,
    RelationType, ScalarKind,
};
pub use config::{EngineConfig, UnknownKeys};
pub use error::{DeclarationError, Error};
pub use primitive::FieldSchemaSet;
pub use schema::{Issue, IssueCode, ParseOptions, PathSegment, Schema, ValidationFailure};
