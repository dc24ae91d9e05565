//! Core type definitions for the catalog.

/// Scalar kinds a field can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarKind {
    /// UTF-8 string.
    String,
    /// Integer that fits in 64 bits.
    Int,
    /// Floating point number.
    Float,
    /// Arbitrary precision decimal (number or numeric string).
    Decimal,
    /// Big integer (integer or string of digits).
    BigInt,
    /// Boolean value.
    Boolean,
    /// RFC 3339 timestamp or `YYYY-MM-DD` date.
    DateTime,
    /// Arbitrary JSON document.
    Json,
    /// UUID in hyphenated form.
    Uuid,
    /// Binary data (encoded string).
    Bytes,
    /// An enumeration type.
    Enum {
        /// Name of the enum type.
        name: String,
        /// Allowed variant values.
        variants: Vec<String>,
    },
}

impl ScalarKind {
    /// Create an enum kind.
    pub fn enum_type<S: Into<String>>(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
    ) -> Self {
        ScalarKind::Enum {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if this kind is numeric (eligible for `_avg` / `_sum`).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ScalarKind::Int | ScalarKind::Float | ScalarKind::Decimal | ScalarKind::BigInt
        )
    }

    /// Check if values of this kind are ordered (`lt`, `gte`, ...).
    pub fn is_comparable(&self) -> bool {
        self.is_numeric() || matches!(self, ScalarKind::DateTime | ScalarKind::String)
    }

    /// Check if this kind is a free-form string.
    pub fn is_string_like(&self) -> bool {
        matches!(self, ScalarKind::String)
    }

    /// Human readable kind name.
    pub fn name(&self) -> &str {
        match self {
            ScalarKind::String => "String",
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::BigInt => "BigInt",
            ScalarKind::Boolean => "Boolean",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::Json => "Json",
            ScalarKind::Uuid => "Uuid",
            ScalarKind::Bytes => "Bytes",
            ScalarKind::Enum { name, .. } => name,
        }
    }
}
