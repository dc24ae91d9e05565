//! Schema builders.
//!
//! A model's schemas are built in two phases. Phase 1 ([`ScalarSchemas`])
//! only looks at the model's own fields. Phase 2 ([`SchemaBundle`]) adds the
//! relation schemas, which reach other models through deferred resolvers,
//! then derives `having` and every operation's arguments.

mod args;
mod bundle;
mod having;
mod relation;
mod scalar;
pub(crate) mod where_unique;

pub use args::{Operation, OperationArgs};
pub use bundle::SchemaBundle;
pub use having::aggregate_filter;
pub(crate) use scalar::build_scalar_schemas;
pub use scalar::ScalarSchemas;
