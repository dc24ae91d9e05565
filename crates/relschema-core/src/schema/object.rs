//! Object shapes: ordered keys, optional slots, defaults and unknown-key policy.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::context::ParseContext;
use super::issue::{type_name, IssueCode, PathSegment};
use super::schema::Schema;

/// Produces a value for a key missing from the payload.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// What to do with keys an object shape does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Reject with `UnrecognizedKeys`.
    #[default]
    Strict,
    /// Drop them from the output.
    Strip,
    /// Reject each with `InvalidFieldReference` (keys are field names).
    FieldReference,
}

/// A key in an object shape.
#[derive(Clone)]
pub struct ObjectField {
    /// Schema applied to the value.
    pub schema: Schema,
    /// Whether the key may be absent.
    pub optional: bool,
    /// Value inserted when the key is absent.
    pub default: Option<DefaultFn>,
}

impl ObjectField {
    /// A key that must be present.
    pub fn required(schema: Schema) -> Self {
        Self {
            schema,
            optional: false,
            default: None,
        }
    }

    /// A key that may be absent.
    pub fn optional(schema: Schema) -> Self {
        Self {
            schema,
            optional: true,
            default: None,
        }
    }

    /// Attach a default, which also makes the key optional.
    pub fn with_default(mut self, default: DefaultFn) -> Self {
        self.optional = true;
        self.default = Some(default);
        self
    }
}

impl fmt::Debug for ObjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectField")
            .field("schema", &self.schema)
            .field("optional", &self.optional)
            .field("default", &self.default.is_some())
            .finish()
    }
}

/// An ordered object shape.
#[derive(Clone, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, ObjectField>,
    policy: KeyPolicy,
}

impl ObjectSchema {
    /// Empty strict shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required key.
    pub fn required(self, key: impl Into<String>, schema: Schema) -> Self {
        self.field(key, ObjectField::required(schema))
    }

    /// Add an optional key.
    pub fn optional(self, key: impl Into<String>, schema: Schema) -> Self {
        self.field(key, ObjectField::optional(schema))
    }

    /// Add (or replace) a key.
    pub fn field(mut self, key: impl Into<String>, field: ObjectField) -> Self {
        self.fields.insert(key.into(), field);
        self
    }

    /// Add (or replace) a key in place.
    pub fn insert(&mut self, key: impl Into<String>, field: ObjectField) {
        self.fields.insert(key.into(), field);
    }

    /// Append every key of `other`; existing keys are replaced.
    pub fn extend(mut self, other: &ObjectSchema) -> Self {
        for (key, field) in &other.fields {
            self.fields.insert(key.clone(), field.clone());
        }
        self
    }

    /// Remove the given keys.
    pub fn without<S: AsRef<str>>(mut self, keys: &[S]) -> Self {
        for key in keys {
            self.fields.shift_remove(key.as_ref());
        }
        self
    }

    /// Set the unknown-key policy.
    pub fn with_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The unknown-key policy.
    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// Declared keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&ObjectField> {
        self.fields.get(key)
    }

    /// Whether the key is declared.
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of declared keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no keys are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Wrap into a schema.
    pub fn into_schema(self) -> Schema {
        Schema::object(self)
    }

    pub(crate) fn parse_in(&self, value: &Value, cx: &mut ParseContext) -> Option<Value> {
        let Value::Object(input) = value else {
            cx.report(IssueCode::InvalidType {
                expected: "object".into(),
                received: type_name(value).into(),
            });
            return None;
        };

        let mut output = Map::new();
        let mut ok = true;

        for (key, field) in &self.fields {
            match input.get(key) {
                Some(item) => {
                    if !cx.enter(PathSegment::Key(key.clone())) {
                        ok = false;
                        continue;
                    }
                    match field.schema.parse_in(item, cx) {
                        Some(parsed) => {
                            output.insert(key.clone(), parsed);
                        }
                        None => ok = false,
                    }
                    cx.leave();
                }
                None => {
                    if let Some(default) = &field.default {
                        output.insert(key.clone(), default());
                    } else if !field.optional {
                        cx.report_at(key, IssueCode::Required);
                        ok = false;
                    }
                }
            }
        }

        let unknown: Vec<&String> = input
            .keys()
            .filter(|key| !self.fields.contains_key(key.as_str()))
            .collect();

        if !unknown.is_empty() {
            match self.policy {
                KeyPolicy::Strip => {}
                KeyPolicy::Strict => {
                    cx.report(IssueCode::UnrecognizedKeys {
                        keys: unknown.into_iter().cloned().collect(),
                    });
                    ok = false;
                }
                KeyPolicy::FieldReference => {
                    let valid: Vec<String> = self.fields.keys().cloned().collect();
                    for key in unknown {
                        cx.report_at(
                            key,
                            IssueCode::InvalidFieldReference {
                                field: key.clone(),
                                valid: valid.clone(),
                            },
                        );
                    }
                    ok = false;
                }
            }
        }

        ok.then_some(Value::Object(output))
    }
}

impl fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSchema")
            .field("keys", &self.fields.keys().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish()
    }
}
