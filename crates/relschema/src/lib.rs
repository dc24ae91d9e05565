//! relschema - relational model schemas and request payload validation.
//!
//! # Quick Start
//!
//! ```ignore
//! use relschema::{Client, EngineConfig, FieldDef, ModelDef, Operation, RelationDef};
//! use serde_json::json;
//!
//! let client = Client::new(EngineConfig::default());
//! client.declare(
//!     ModelDef::new("Post")
//!         .with_field(FieldDef::string("id").id())
//!         .with_field(FieldDef::string("authorId"))
//!         .with_relation(
//!             RelationDef::many_to_one("author", client.resolver("Author"))
//!                 .with_foreign_key("authorId"),
//!         ),
//! )?;
//! client.declare(
//!     ModelDef::new("Author")
//!         .with_field(FieldDef::string("id").id())
//!         .with_field(FieldDef::string("name")),
//! )?;
//! client.hydrate()?;
//!
//! let args = client.validate(
//!     "Post",
//!     Operation::FindMany,
//!     &json!({"where": {"author": {"is": {"name": "Alice"}}}}),
//! )?;
//! ```

pub mod client;
pub mod error;

pub use client::Client;
pub use error::Error;

pub use relschema_core::{
    AutoGenerate, CompoundConstraint, DeleteBehavior, EngineConfig, FieldDef, HydrationReport,
    Issue, IssueCode, ModelDef, ModelResolver, Operation, RelationDef, RelationType, ScalarKind,
    SchemaBundle, UnknownKeys, ValidationFailure,
};

/// Re-export the engine crate.
pub use relschema_core as engine;
