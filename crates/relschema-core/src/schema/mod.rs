//! Runtime validation schemas.
//!
//! Schemas validate `serde_json::Value` payloads and return a normalized copy
//! (defaults filled in, shorthands expanded, single values wrapped into
//! arrays) or a [`ValidationFailure`].

mod context;
mod issue;
mod object;
mod schema;

pub use context::{ParseOptions, DEFAULT_MAX_DEPTH};
pub use issue::{Issue, IssueCode, PathSegment, ValidationFailure};
pub use object::{DefaultFn, KeyPolicy, ObjectField, ObjectSchema};
pub use schema::{LazyFn, RefineFn, Schema, TransformFn};
