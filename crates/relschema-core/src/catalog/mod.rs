//! Model catalog for relschema.
//!
//! The catalog holds model declarations (fields, relations, compound
//! constraints) and the registry they are resolved against.

mod field;
mod model;
mod registry;
mod relation;
mod types;

pub use field::{AutoGenerate, CustomValidator, DefaultValue, FieldDef};
pub use model::{CompoundConstraint, ModelDef};
pub use registry::{HydrationReport, Model, ModelRegistry, ModelState};
pub use relation::{DeleteBehavior, ModelResolver, RelationDef, RelationType};
pub use types::ScalarKind;
