//! The validation schema value.
//!
//! A [`Schema`] is an immutable, cheaply clonable tree (`Arc` nodes). Parsing
//! a payload either returns the normalized value or a [`ValidationFailure`]
//! listing every issue found. Two nodes break cycles without eager inlining:
//!
//! - `SelfRef` holds a `Weak` pointer back to an enclosing node created by
//!   [`Schema::recursive`], for self-referential shapes such as `AND`/`OR`.
//! - `Lazy` holds a resolver closure evaluated only at parse time, used for
//!   relation targets that may not be built yet (or at all).

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::{trace, warn};

use super::context::{ParseContext, ParseOptions};
use super::issue::{type_name, Issue, IssueCode, PathSegment, ValidationFailure};
use super::object::ObjectSchema;

/// Post-validation value mapping.
pub type TransformFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Cross-field check run on a successfully parsed value. Issue paths are
/// relative to the checked value.
pub type RefineFn = Arc<dyn Fn(&Value) -> Vec<Issue> + Send + Sync>;

/// Deferred schema lookup.
pub type LazyFn = Arc<dyn Fn() -> Option<Schema> + Send + Sync>;

/// A validation schema.
#[derive(Clone)]
pub struct Schema(Arc<SchemaNode>);

pub(crate) enum SchemaNode {
    Any,
    Null,
    Boolean,
    String,
    Integer,
    Number,
    Literal(Value),
    Enum(Vec<String>),
    FieldRef(Vec<String>),
    Array(Schema),
    Object(ObjectSchema),
    Union(Vec<Schema>),
    Nullable(Schema),
    Preprocess { inner: Schema, transform: TransformFn },
    Transform { inner: Schema, transform: TransformFn },
    Refine { inner: Schema, check: RefineFn },
    Lazy { target: String, resolve: LazyFn },
    SelfRef(Weak<SchemaNode>),
    Alias(Schema),
}

impl Schema {
    fn from_node(node: SchemaNode) -> Self {
        Schema(Arc::new(node))
    }

    /// Accepts any value unchanged.
    pub fn any() -> Self {
        Self::from_node(SchemaNode::Any)
    }

    /// Accepts only `null`.
    pub fn null() -> Self {
        Self::from_node(SchemaNode::Null)
    }

    /// Accepts booleans.
    pub fn boolean() -> Self {
        Self::from_node(SchemaNode::Boolean)
    }

    /// Accepts strings.
    pub fn string() -> Self {
        Self::from_node(SchemaNode::String)
    }

    /// Accepts integral numbers.
    pub fn integer() -> Self {
        Self::from_node(SchemaNode::Integer)
    }

    /// Accepts integers greater than or equal to zero.
    pub fn non_negative_integer() -> Self {
        Self::integer().refine(|value| match value.as_i64() {
            Some(n) if n < 0 => Err(IssueCode::TooSmall { minimum: 0 }),
            _ => Ok(()),
        })
    }

    /// Accepts any number.
    pub fn number() -> Self {
        Self::from_node(SchemaNode::Number)
    }

    /// Accepts exactly `value`.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::from_node(SchemaNode::Literal(value.into()))
    }

    /// Accepts one of the given strings.
    pub fn enumeration<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self::from_node(SchemaNode::Enum(
            options.into_iter().map(Into::into).collect(),
        ))
    }

    /// Accepts one of the given field names, reporting unknown names as
    /// `InvalidFieldReference`.
    pub fn field_ref<S: Into<String>>(valid: impl IntoIterator<Item = S>) -> Self {
        Self::from_node(SchemaNode::FieldRef(
            valid.into_iter().map(Into::into).collect(),
        ))
    }

    /// Accepts arrays whose items match `item`.
    pub fn array(item: Schema) -> Self {
        Self::from_node(SchemaNode::Array(item))
    }

    /// Accepts objects matching the shape.
    pub fn object(shape: ObjectSchema) -> Self {
        Self::from_node(SchemaNode::Object(shape))
    }

    /// Accepts the first matching alternative.
    pub fn union(alternatives: Vec<Schema>) -> Self {
        Self::from_node(SchemaNode::Union(alternatives))
    }

    /// Accepts `item` or an array of `item`, unchanged.
    pub fn one_or_many(item: Schema) -> Self {
        Self::union(vec![item.clone(), Self::array(item)])
    }

    /// Accepts `item` or an array of `item`; a single value is wrapped into a
    /// one-element array.
    pub fn ensure_array(item: Schema) -> Self {
        Self::array(item).preprocess(|value| match value {
            Value::Array(_) => value,
            single => Value::Array(vec![single]),
        })
    }

    /// Build a self-referential schema. `build` receives a handle to the
    /// schema being built; the handle is only dereferenced while parsing.
    pub fn recursive(build: impl FnOnce(Schema) -> Schema) -> Self {
        Schema(Arc::new_cyclic(|weak: &Weak<SchemaNode>| {
            let this = Schema::from_node(SchemaNode::SelfRef(weak.clone()));
            SchemaNode::Alias(build(this))
        }))
    }

    /// Defer to a schema produced at parse time. When `resolve` yields
    /// nothing the placeholder issue `CircularResolutionPlaceholder` is
    /// reported for `target`.
    pub fn lazy(
        target: impl Into<String>,
        resolve: impl Fn() -> Option<Schema> + Send + Sync + 'static,
    ) -> Self {
        Self::from_node(SchemaNode::Lazy {
            target: target.into(),
            resolve: Arc::new(resolve),
        })
    }

    /// Also accept `null`.
    pub fn nullable(self) -> Self {
        Self::from_node(SchemaNode::Nullable(self))
    }

    /// Map the value before validating it.
    pub fn preprocess(self, transform: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::from_node(SchemaNode::Preprocess {
            inner: self,
            transform: Arc::new(transform),
        })
    }

    /// Map the value after a successful validation.
    pub fn map(self, transform: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::from_node(SchemaNode::Transform {
            inner: self,
            transform: Arc::new(transform),
        })
    }

    /// Add a check reported at the value's own path.
    pub fn refine(
        self,
        check: impl Fn(&Value) -> Result<(), IssueCode> + Send + Sync + 'static,
    ) -> Self {
        self.refine_issues(move |value| match check(value) {
            Ok(()) => Vec::new(),
            Err(code) => vec![Issue::new(Vec::new(), code)],
        })
    }

    /// Add a check that may report several issues at relative paths.
    pub fn refine_issues(
        self,
        check: impl Fn(&Value) -> Vec<Issue> + Send + Sync + 'static,
    ) -> Self {
        Self::from_node(SchemaNode::Refine {
            inner: self,
            check: Arc::new(check),
        })
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The object shape, looking through aliases and self references.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self.0.as_ref() {
            SchemaNode::Object(shape) => Some(shape),
            SchemaNode::Alias(inner) => inner.as_object(),
            _ => None,
        }
    }

    /// Validate with default options.
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationFailure> {
        self.parse_with(value, &ParseOptions::default())
    }

    /// Validate `value`, returning the normalized value or every issue found.
    pub fn parse_with(
        &self,
        value: &Value,
        options: &ParseOptions,
    ) -> Result<Value, ValidationFailure> {
        let mut cx = ParseContext::new(options);
        match self.parse_in(value, &mut cx) {
            Some(parsed) => Ok(parsed),
            None => {
                let mut issues = cx.into_issues();
                if issues.is_empty() {
                    issues.push(Issue::new(Vec::new(), IssueCode::InvalidUnion));
                }
                Err(ValidationFailure::new(issues))
            }
        }
    }

    /// Whether `value` validates.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.parse(value).is_ok()
    }

    pub(crate) fn parse_in(&self, value: &Value, cx: &mut ParseContext) -> Option<Value> {
        match self.0.as_ref() {
            SchemaNode::Any => Some(value.clone()),
            SchemaNode::Null => expect(value.is_null(), "null", value, cx),
            SchemaNode::Boolean => expect(value.is_boolean(), "boolean", value, cx),
            SchemaNode::String => expect(value.is_string(), "string", value, cx),
            SchemaNode::Integer => {
                let integral = value.is_i64() || value.is_u64();
                expect(integral, "integer", value, cx)
            }
            SchemaNode::Number => expect(value.is_number(), "number", value, cx),
            SchemaNode::Literal(expected) => {
                if value == expected {
                    Some(value.clone())
                } else {
                    cx.report(IssueCode::InvalidLiteral {
                        expected: expected.clone(),
                    });
                    None
                }
            }
            SchemaNode::Enum(options) => match value.as_str() {
                Some(s) if options.iter().any(|o| o == s) => Some(value.clone()),
                Some(s) => {
                    cx.report(IssueCode::InvalidEnumValue {
                        received: s.to_string(),
                        options: options.clone(),
                    });
                    None
                }
                None => expect(false, "string", value, cx),
            },
            SchemaNode::FieldRef(valid) => match value.as_str() {
                Some(s) if valid.iter().any(|f| f == s) => Some(value.clone()),
                Some(s) => {
                    cx.report(IssueCode::InvalidFieldReference {
                        field: s.to_string(),
                        valid: valid.clone(),
                    });
                    None
                }
                None => expect(false, "string", value, cx),
            },
            SchemaNode::Array(item) => {
                let Value::Array(items) = value else {
                    return expect(false, "array", value, cx);
                };
                let mut output = Vec::with_capacity(items.len());
                let mut ok = true;
                for (index, entry) in items.iter().enumerate() {
                    if !cx.enter(PathSegment::Index(index)) {
                        ok = false;
                        break;
                    }
                    match item.parse_in(entry, cx) {
                        Some(parsed) => output.push(parsed),
                        None => ok = false,
                    }
                    cx.leave();
                }
                ok.then_some(Value::Array(output))
            }
            SchemaNode::Object(shape) => shape.parse_in(value, cx),
            SchemaNode::Union(alternatives) => parse_union(alternatives, value, cx),
            SchemaNode::Nullable(inner) => {
                if value.is_null() {
                    Some(Value::Null)
                } else {
                    inner.parse_in(value, cx)
                }
            }
            SchemaNode::Preprocess { inner, transform } => {
                let prepared = transform(value.clone());
                inner.parse_in(&prepared, cx)
            }
            SchemaNode::Transform { inner, transform } => {
                inner.parse_in(value, cx).map(|parsed| transform(parsed))
            }
            SchemaNode::Refine { inner, check } => {
                let parsed = inner.parse_in(value, cx)?;
                let issues = check(&parsed);
                if issues.is_empty() {
                    Some(parsed)
                } else {
                    for issue in issues {
                        cx.report_relative(issue);
                    }
                    None
                }
            }
            SchemaNode::Lazy { target, resolve } => match resolve() {
                Some(schema) => {
                    trace!(target = %target, "resolved deferred schema");
                    schema.parse_in(value, cx)
                }
                None => {
                    warn!(target = %target, "deferred schema evaluated against an unresolved target");
                    cx.report(IssueCode::CircularResolutionPlaceholder {
                        target: target.clone(),
                    });
                    None
                }
            },
            SchemaNode::SelfRef(weak) => match weak.upgrade() {
                Some(node) => Schema(node).parse_in(value, cx),
                None => {
                    cx.report(IssueCode::CircularResolutionPlaceholder {
                        target: "self".into(),
                    });
                    None
                }
            },
            SchemaNode::Alias(inner) => inner.parse_in(value, cx),
        }
    }

    fn describe(&self) -> String {
        match self.0.as_ref() {
            SchemaNode::Any => "any".into(),
            SchemaNode::Null => "null".into(),
            SchemaNode::Boolean => "boolean".into(),
            SchemaNode::String => "string".into(),
            SchemaNode::Integer => "integer".into(),
            SchemaNode::Number => "number".into(),
            SchemaNode::Literal(v) => format!("literal({})", v),
            SchemaNode::Enum(options) => format!("enum({})", options.join("|")),
            SchemaNode::FieldRef(valid) => format!("field({})", valid.join("|")),
            SchemaNode::Array(item) => format!("array<{}>", item.describe()),
            SchemaNode::Object(shape) => {
                format!("object{{{}}}", shape.keys().collect::<Vec<_>>().join(", "))
            }
            SchemaNode::Union(alternatives) => alternatives
                .iter()
                .map(Schema::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            SchemaNode::Nullable(inner) => format!("{}?", inner.describe()),
            SchemaNode::Preprocess { inner, .. }
            | SchemaNode::Transform { inner, .. }
            | SchemaNode::Refine { inner, .. }
            | SchemaNode::Alias(inner) => inner.describe(),
            SchemaNode::Lazy { target, .. } => format!("lazy({})", target),
            SchemaNode::SelfRef(_) => "self".into(),
        }
    }
}

fn expect(ok: bool, expected: &str, value: &Value, cx: &mut ParseContext) -> Option<Value> {
    if ok {
        Some(value.clone())
    } else {
        cx.report(IssueCode::InvalidType {
            expected: expected.into(),
            received: type_name(value).into(),
        });
        None
    }
}

/// First matching alternative wins. On failure, the issues of the first
/// alternative that matched the value's shape are kept since they point at
/// the real problem; otherwise a single `InvalidUnion` is reported.
fn parse_union(alternatives: &[Schema], value: &Value, cx: &mut ParseContext) -> Option<Value> {
    let mut closest: Option<ParseContext> = None;
    for alternative in alternatives {
        let mut attempt = cx.fork();
        if let Some(parsed) = alternative.parse_in(value, &mut attempt) {
            return Some(parsed);
        }
        if closest.is_none() && !attempt.only_shape_mismatch() {
            closest = Some(attempt);
        }
    }
    match closest {
        Some(attempt) => cx.absorb(attempt),
        None => cx.report(IssueCode::InvalidUnion),
    }
    None
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({})", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert!(Schema::string().is_valid(&json!("a")));
        assert!(!Schema::string().is_valid(&json!(1)));
        assert!(Schema::integer().is_valid(&json!(-3)));
        assert!(!Schema::integer().is_valid(&json!(1.5)));
        assert!(Schema::number().is_valid(&json!(1.5)));
        assert!(Schema::literal(true).is_valid(&json!(true)));
        assert!(!Schema::literal(true).is_valid(&json!(false)));
        assert!(Schema::string().nullable().is_valid(&json!(null)));
    }

    #[test]
    fn test_enum_and_field_ref() {
        let order = Schema::enumeration(["asc", "desc"]);
        assert!(order.is_valid(&json!("asc")));
        let failure = order.parse(&json!("up")).unwrap_err();
        assert!(matches!(
            failure.issues()[0].code,
            IssueCode::InvalidEnumValue { .. }
        ));

        let fields = Schema::field_ref(["id", "name"]);
        let failure = fields.parse(&json!("age")).unwrap_err();
        assert_eq!(
            failure.issues()[0].code,
            IssueCode::InvalidFieldReference {
                field: "age".into(),
                valid: vec!["id".into(), "name".into()],
            }
        );
    }

    #[test]
    fn test_ensure_array() {
        let schema = Schema::ensure_array(Schema::integer());
        assert_eq!(schema.parse(&json!(1)).unwrap(), json!([1]));
        assert_eq!(schema.parse(&json!([1, 2])).unwrap(), json!([1, 2]));
        assert_eq!(schema.parse(&json!([])).unwrap(), json!([]));
    }

    #[test]
    fn test_array_issue_paths() {
        let failure = Schema::array(Schema::string())
            .parse(&json!(["a", 1, "c", 2]))
            .unwrap_err();
        let paths: Vec<String> = failure.issues().iter().map(Issue::path_string).collect();
        assert_eq!(paths, vec!["[1]", "[3]"]);
    }

    #[test]
    fn test_union_reports_closest_alternative() {
        let schema = Schema::union(vec![
            Schema::string(),
            ObjectSchema::new()
                .required("equals", Schema::string())
                .into_schema(),
        ]);
        let failure = schema.parse(&json!({"equals": 5})).unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "equals");

        let failure = schema.parse(&json!(5)).unwrap_err();
        assert_eq!(failure.issues()[0].code, IssueCode::InvalidUnion);
    }

    #[test]
    fn test_map_and_refine() {
        let shorthand = Schema::string().map(|v| json!({ "equals": v }));
        assert_eq!(shorthand.parse(&json!("x")).unwrap(), json!({"equals": "x"}));

        let short = Schema::string().refine(|v| {
            if v.as_str().map_or(0, str::len) > 3 {
                Err(IssueCode::custom("too long"))
            } else {
                Ok(())
            }
        });
        assert!(short.is_valid(&json!("abc")));
        assert_eq!(
            short.parse(&json!("abcd")).unwrap_err().issues()[0].code,
            IssueCode::custom("too long")
        );
    }

    #[test]
    fn test_recursive_schema() {
        let tree = Schema::recursive(|this| {
            ObjectSchema::new()
                .required("value", Schema::integer())
                .optional("children", Schema::array(this))
                .into_schema()
        });

        let payload = json!({"value": 1, "children": [{"value": 2, "children": [{"value": 3}]}]});
        assert_eq!(tree.parse(&payload).unwrap(), payload);

        let failure = tree
            .parse(&json!({"value": 1, "children": [{"value": "x"}]}))
            .unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "children[0].value");
        assert!(tree.as_object().is_some());
    }

    #[test]
    fn test_recursion_depth_is_bounded() {
        let tree = Schema::recursive(|this| {
            ObjectSchema::new()
                .optional("next", this)
                .into_schema()
        });
        let mut payload = json!({});
        for _ in 0..10 {
            payload = json!({ "next": payload });
        }
        let failure = tree
            .parse_with(&payload, &ParseOptions::default().with_max_depth(4))
            .unwrap_err();
        assert_eq!(
            failure.issues()[0].code,
            IssueCode::DepthExceeded { max_depth: 4 }
        );
    }

    #[test]
    fn test_lazy_placeholder() {
        let unresolved = Schema::lazy("Ghost", || None);
        let failure = unresolved.parse(&json!({})).unwrap_err();
        assert_eq!(
            failure.issues()[0].code,
            IssueCode::CircularResolutionPlaceholder {
                target: "Ghost".into()
            }
        );

        let resolved = Schema::lazy("Number", || Some(Schema::number()));
        assert!(resolved.is_valid(&json!(2)));
    }

    #[test]
    fn test_non_negative_integer() {
        let skip = Schema::non_negative_integer();
        assert!(skip.is_valid(&json!(0)));
        assert_eq!(
            skip.parse(&json!(-1)).unwrap_err().issues()[0].code,
            IssueCode::TooSmall { minimum: 0 }
        );
    }
}
