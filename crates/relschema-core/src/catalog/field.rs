//! Field definitions for models.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::types::ScalarKind;
use crate::schema::DefaultFn;

/// A scalar field definition within a model.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Scalar kind.
    pub kind: ScalarKind,
    /// Whether `null` is an accepted value.
    pub nullable: bool,
    /// Whether the field holds a list of values.
    pub array: bool,
    /// Whether the field is unique on its own.
    pub unique: bool,
    /// Whether the field is the model's single-field identifier.
    pub id: bool,
    /// Default value if not provided.
    pub default: Option<DefaultValue>,
    /// Value generated by the database.
    pub auto_generate: Option<AutoGenerate>,
    /// Extra check applied to every accepted non-null value.
    pub validator: Option<CustomValidator>,
}

/// Default value for a field.
#[derive(Clone)]
pub enum DefaultValue {
    /// Fixed value.
    Static(Value),
    /// Evaluated every time a default is needed.
    Generated(Arc<dyn Fn() -> Value + Send + Sync>),
}

/// Values the storage layer generates on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoGenerate {
    /// Random UUID.
    Uuid,
    /// Collision resistant id.
    Cuid,
    /// Sequence number.
    AutoIncrement,
    /// Current timestamp on insert.
    Now,
    /// Current timestamp on every write.
    UpdatedAt,
}

/// A user supplied value check.
#[derive(Clone)]
pub struct CustomValidator(Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>);

impl CustomValidator {
    /// Wrap a check returning an error message on failure.
    pub fn new(check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(check))
    }

    /// Run the check.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        (self.0)(value)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidator")
    }
}

impl DefaultValue {
    /// Produce the default value.
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::Generated(generate) => generate(),
        }
    }

    pub(crate) fn to_default_fn(&self) -> DefaultFn {
        match self {
            DefaultValue::Static(value) => {
                let value = value.clone();
                Arc::new(move || value.clone())
            }
            DefaultValue::Generated(generate) => {
                let generate = Arc::clone(generate);
                Arc::new(move || generate())
            }
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Generated(_) => f.write_str("Generated"),
        }
    }
}

impl FieldDef {
    /// Create a new required field.
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            array: false,
            unique: false,
            id: false,
            default: None,
            auto_generate: None,
            validator: None,
        }
    }

    /// Create a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::String)
    }

    /// Create an integer field.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Int)
    }

    /// Create a float field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Float)
    }

    /// Create a decimal field.
    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Decimal)
    }

    /// Create a big integer field.
    pub fn bigint(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::BigInt)
    }

    /// Create a boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Boolean)
    }

    /// Create a timestamp field.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::DateTime)
    }

    /// Create a JSON field.
    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Json)
    }

    /// Create a UUID field.
    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Uuid)
    }

    /// Create a binary field.
    pub fn bytes(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Bytes)
    }

    /// Create an enum field.
    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        enum_name: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(name, ScalarKind::enum_type(enum_name, variants))
    }

    /// Accept `null`.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Hold a list of values.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as the model identifier.
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Set a static default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Set a generated default value.
    pub fn with_default_fn(mut self, generate: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Generated(Arc::new(generate)));
        self
    }

    /// Let the storage layer generate the value.
    pub fn with_auto(mut self, strategy: AutoGenerate) -> Self {
        self.auto_generate = Some(strategy);
        self
    }

    /// Attach a custom value check.
    pub fn with_validator(
        mut self,
        check: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(CustomValidator::new(check));
        self
    }

    /// Check if this field has a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// A field may be omitted on create when it has a default, is generated
    /// or is nullable.
    pub fn is_optional_on_create(&self) -> bool {
        self.has_default() || self.auto_generate.is_some() || self.nullable
    }

    /// Whether the field identifies a record on its own.
    pub fn is_identifying(&self) -> bool {
        self.id || self.unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_def_builder() {
        let field = FieldDef::uuid("id").id().with_auto(AutoGenerate::Uuid);

        assert_eq!(field.name, "id");
        assert!(field.id);
        assert!(field.is_identifying());
        assert!(field.is_optional_on_create());
        assert!(!field.has_default());
    }

    #[test]
    fn test_optional_on_create() {
        assert!(!FieldDef::string("name").is_optional_on_create());
        assert!(FieldDef::string("bio").nullable().is_optional_on_create());
        assert!(FieldDef::boolean("active")
            .with_default(true)
            .is_optional_on_create());
    }

    #[test]
    fn test_default_values() {
        let fixed = FieldDef::int("count").with_default(0);
        assert_eq!(fixed.default.as_ref().unwrap().produce(), json!(0));

        let generated = FieldDef::string("token").with_default_fn(|| json!("generated"));
        let default_fn = generated.default.as_ref().unwrap().to_default_fn();
        assert_eq!(default_fn(), json!("generated"));
    }


    #[test]
    fn test_validator() {
        let field = FieldDef::string("email").with_validator(|value| {
            if value.as_str().is_some_and(|s| s.contains('@')) {
                Ok(())
            } else {
                Err("invalid email".into())
            }
        });
        let validator = field.validator.unwrap();
        assert!(validator.check(&json!("a@b.com")).is_ok());
        assert_eq!(validator.check(&json!("nope")), Err("invalid email".to_string()));
    }
}
