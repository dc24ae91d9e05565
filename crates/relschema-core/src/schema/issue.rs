//! Validation issues and the failure value returned by schema parsing.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// One step in the path from the payload root to an offending value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// What went wrong at a given path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IssueCode {
    /// The value has the wrong JSON type.
    #[error("expected {expected}, received {received}")]
    InvalidType {
        /// Expected type name.
        expected: String,
        /// Received type name.
        received: String,
    },

    /// The value differs from the only accepted literal.
    #[error("invalid literal, expected {expected}")]
    InvalidLiteral {
        /// The accepted literal.
        expected: Value,
    },

    /// A string outside the allowed enum options.
    #[error("invalid enum value '{received}', expected one of: {}", .options.join(", "))]
    InvalidEnumValue {
        /// Received value.
        received: String,
        /// Allowed options.
        options: Vec<String>,
    },

    /// A required key is missing.
    #[error("required")]
    Required,

    /// An object carries keys the schema does not declare.
    #[error("unrecognized key(s): {}", .keys.join(", "))]
    UnrecognizedKeys {
        /// The offending keys.
        keys: Vec<String>,
    },

    /// No alternative of a union matched.
    #[error("value does not match any accepted form")]
    InvalidUnion,

    /// A number below the allowed minimum.
    #[error("number must be greater than or equal to {minimum}")]
    TooSmall {
        /// Inclusive minimum.
        minimum: i64,
    },

    /// A unique lookup named none of the identifying fields.
    #[error("at least one of {} must be provided", .expected.join(", "))]
    MissingUniqueIdentifier {
        /// Every valid identifying slot.
        expected: Vec<String>,
    },

    /// A field name that the model does not declare.
    #[error("unknown field '{field}', expected one of: {}", .valid.join(", "))]
    InvalidFieldReference {
        /// The unknown field name.
        field: String,
        /// The declared scalar field names.
        valid: Vec<String>,
    },

    /// A relation target could not be resolved when the value was validated.
    #[error("relation target '{target}' is not resolved")]
    CircularResolutionPlaceholder {
        /// Name of the target model.
        target: String,
    },

    /// The payload nests deeper than the configured limit.
    #[error("payload exceeds the maximum nesting depth of {max_depth}")]
    DepthExceeded {
        /// The configured limit.
        max_depth: usize,
    },

    /// A failed refinement or custom validator.
    #[error("{message}")]
    Custom {
        /// Human readable message.
        message: String,
    },
}

impl IssueCode {
    /// Build a custom issue.
    pub fn custom(message: impl Into<String>) -> Self {
        IssueCode::Custom {
            message: message.into(),
        }
    }
}

/// A single validation issue annotated with its path.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Path from the payload root.
    pub path: Vec<PathSegment>,
    /// What went wrong.
    pub code: IssueCode,
}

impl Issue {
    /// Create a new issue.
    pub fn new(path: Vec<PathSegment>, code: IssueCode) -> Self {
        Self { path, code }
    }

    /// Render the path as `a.b[0].c`.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(_) => out.push_str(&segment.to_string()),
            }
        }
        out
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.path_string(), self.code)
        }
    }
}

/// A failed validation: every issue found in the payload.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed with {} issue(s): {}", .issues.len(), summary(.issues))]
pub struct ValidationFailure {
    issues: Vec<Issue>,
}

fn summary(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationFailure {
    /// Create a failure from a non-empty issue list.
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    /// All issues.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// The first issue.
    pub fn first(&self) -> Option<&Issue> {
        self.issues.first()
    }

    /// Find the first issue whose code satisfies the predicate.
    pub fn find(&self, predicate: impl Fn(&IssueCode) -> bool) -> Option<&Issue> {
        self.issues.iter().find(|issue| predicate(&issue.code))
    }

    /// Whether a `MissingUniqueIdentifier` issue was raised.
    pub fn is_missing_unique_identifier(&self) -> bool {
        self.find(|code| matches!(code, IssueCode::MissingUniqueIdentifier { .. }))
            .is_some()
    }

    /// Whether an `InvalidFieldReference` issue was raised.
    pub fn is_invalid_field_reference(&self) -> bool {
        self.find(|code| matches!(code, IssueCode::InvalidFieldReference { .. }))
            .is_some()
    }

    /// Consume into the issue list.
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// JSON type name used in `InvalidType` issues.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
