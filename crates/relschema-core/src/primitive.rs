//! Per-field primitive schemas.
//!
//! Every scalar field contributes four schemas to its model: `base` (the
//! value itself), `filter` (where-clause operators), `create` and `update`
//! (write operators). The composition layer only ever sees this contract.

use serde_json::{Map, Value};

use crate::catalog::{FieldDef, ScalarKind};
use crate::schema::{IssueCode, ObjectSchema, Schema};

/// The four schemas a scalar field contributes.
#[derive(Debug, Clone)]
pub struct FieldSchemaSet {
    /// The field value, honoring `array` and `nullable`.
    pub base: Schema,
    /// Filter operators, or a bare value meaning `{equals: value}`.
    pub filter: Schema,
    /// Value accepted on create.
    pub create: Schema,
    /// Update operators, or a bare value meaning `{set: value}`.
    pub update: Schema,
}

impl FieldSchemaSet {
    /// Build the schemas for a field.
    pub fn for_field(field: &FieldDef) -> Self {
        let item = item_schema(&field.kind);
        let value = if field.array {
            Schema::array(item.clone())
        } else {
            item.clone()
        };
        let value = match &field.validator {
            Some(validator) => {
                let validator = validator.clone();
                value.refine(move |v| validator.check(v).map_err(IssueCode::custom))
            }
            None => value,
        };
        let base = if field.nullable {
            value.nullable()
        } else {
            value
        };

        let filter = if field.array {
            list_filter(&item, &base)
        } else {
            scalar_filter(&field.kind, &item, &base)
        };

        Self {
            filter,
            create: base.clone(),
            update: update_schema(field, &item, &base),
            base,
        }
    }
}

fn item_schema(kind: &ScalarKind) -> Schema {
    match kind {
        ScalarKind::String | ScalarKind::Bytes => Schema::string(),
        ScalarKind::Int => Schema::integer(),
        ScalarKind::Float => Schema::number(),
        ScalarKind::Boolean => Schema::boolean(),
        ScalarKind::Json => Schema::any(),
        ScalarKind::Decimal => Schema::union(vec![
            Schema::number(),
            Schema::string().refine(|v| {
                let finite = v
                    .as_str()
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .is_some_and(f64::is_finite);
                if finite {
                    Ok(())
                } else {
                    Err(IssueCode::custom("invalid decimal"))
                }
            }),
        ]),
        ScalarKind::BigInt => Schema::union(vec![
            Schema::integer(),
            Schema::string().refine(|v| {
                let s = v.as_str().unwrap_or_default();
                let digits = s.strip_prefix('-').unwrap_or(s);
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    Ok(())
                } else {
                    Err(IssueCode::custom("invalid big integer"))
                }
            }),
        ]),
        ScalarKind::DateTime => Schema::string().refine(|v| {
            let s = v.as_str().unwrap_or_default();
            let valid = chrono::DateTime::parse_from_rfc3339(s).is_ok()
                || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok();
            if valid {
                Ok(())
            } else {
                Err(IssueCode::custom("invalid datetime"))
            }
        }),
        ScalarKind::Uuid => Schema::string().refine(|v| {
            match uuid::Uuid::parse_str(v.as_str().unwrap_or_default()) {
                Ok(_) => Ok(()),
                Err(_) => Err(IssueCode::custom("invalid uuid")),
            }
        }),
        ScalarKind::Enum { variants, .. } => Schema::enumeration(variants.iter().cloned()),
    }
}

fn scalar_filter(kind: &ScalarKind, item: &Schema, base: &Schema) -> Schema {
    let operators = Schema::recursive(|this| {
        let mut ops = ObjectSchema::new()
            .optional("equals", base.clone())
            .optional("in", Schema::array(item.clone()))
            .optional("notIn", Schema::array(item.clone()));
        if kind.is_comparable() {
            for op in ["lt", "lte", "gt", "gte"] {
                ops = ops.optional(op, item.clone());
            }
        }
        if kind.is_string_like() {
            for op in ["contains", "startsWith", "endsWith"] {
                ops = ops.optional(op, Schema::string());
            }
            ops = ops.optional("mode", Schema::enumeration(["default", "insensitive"]));
        }
        ops.optional("not", Schema::union(vec![this, base.clone()]))
            .into_schema()
    });
    with_shorthand(operators, base, "equals")
}

fn list_filter(item: &Schema, base: &Schema) -> Schema {
    let operators = ObjectSchema::new()
        .optional("equals", base.clone())
        .optional("has", item.clone())
        .optional("hasEvery", Schema::array(item.clone()))
        .optional("hasSome", Schema::array(item.clone()))
        .optional("isEmpty", Schema::boolean())
        .into_schema();
    with_shorthand(operators, base, "equals")
}

fn update_schema(field: &FieldDef, item: &Schema, base: &Schema) -> Schema {
    let mut ops = ObjectSchema::new().optional("set", base.clone());
    if field.array {
        ops = ops.optional("push", Schema::one_or_many(item.clone()));
    } else if field.kind.is_numeric() {
        for op in ["increment", "decrement", "multiply", "divide"] {
            ops = ops.optional(op, item.clone());
        }
    }
    with_shorthand(ops.into_schema(), base, "set")
}

/// Operators first; otherwise a bare value wrapped as `{key: value}`.
fn with_shorthand(operators: Schema, base: &Schema, key: &'static str) -> Schema {
    Schema::union(vec![
        operators,
        base.clone().map(move |value| {
            let mut wrapped = Map::new();
            wrapped.insert(key.to_string(), value);
            Value::Object(wrapped)
        }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_filter_shorthand() {
        let set = FieldSchemaSet::for_field(&FieldDef::string("title"));
        assert_eq!(
            set.filter.parse(&json!("hello")).unwrap(),
            set.filter.parse(&json!({"equals": "hello"})).unwrap()
        );
        assert_eq!(
            set.filter
                .parse(&json!({"contains": "ell", "mode": "insensitive"}))
                .unwrap(),
            json!({"contains": "ell", "mode": "insensitive"})
        );
    }

    #[test]
    fn test_filter_not_is_recursive() {
        let set = FieldSchemaSet::for_field(&FieldDef::int("age"));
        assert!(set.filter.is_valid(&json!({"not": {"not": {"gt": 3}}})));
        assert!(set.filter.is_valid(&json!({"not": 5})));
        assert!(!set.filter.is_valid(&json!({"contains": "x"})));
    }

    #[test]
    fn test_filter_operator_type_error_path() {
        let set = FieldSchemaSet::for_field(&FieldDef::string("title"));
        let failure = set.filter.parse(&json!({"equals": 5})).unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "equals");
    }

    #[test]
    fn test_nullable_filter() {
        let required = FieldSchemaSet::for_field(&FieldDef::string("bio"));
        let nullable = FieldSchemaSet::for_field(&FieldDef::string("bio").nullable());
        assert!(!required.filter.is_valid(&json!(null)));
        assert_eq!(
            nullable.filter.parse(&json!(null)).unwrap(),
            json!({"equals": null})
        );
    }

    #[test]
    fn test_update_shorthand() {
        let set = FieldSchemaSet::for_field(&FieldDef::int("views"));
        assert_eq!(set.update.parse(&json!(3)).unwrap(), json!({"set": 3}));
        assert_eq!(
            set.update.parse(&json!({"increment": 1})).unwrap(),
            json!({"increment": 1})
        );

        let text = FieldSchemaSet::for_field(&FieldDef::string("title"));
        assert!(!text.update.is_valid(&json!({"increment": 1})));
    }

    #[test]
    fn test_list_field() {
        let set = FieldSchemaSet::for_field(&FieldDef::string("tags").array());
        assert!(set.base.is_valid(&json!(["a", "b"])));
        assert!(!set.base.is_valid(&json!("a")));
        assert!(set.filter.is_valid(&json!({"has": "a"})));
        assert!(set.filter.is_valid(&json!({"hasSome": ["a"], "isEmpty": false})));
        assert_eq!(
            set.update.parse(&json!({"push": "c"})).unwrap(),
            json!({"push": "c"})
        );
    }

    #[test]
    fn test_kind_checks() {
        let at = FieldSchemaSet::for_field(&FieldDef::datetime("at"));
        assert!(at.base.is_valid(&json!("2024-05-01T10:00:00Z")));
        assert!(at.base.is_valid(&json!("2024-05-01")));
        assert!(!at.base.is_valid(&json!("yesterday")));

        let id = FieldSchemaSet::for_field(&FieldDef::uuid("id"));
        assert!(id.base.is_valid(&json!("67e55044-10b1-426f-9247-bb680e5fe0c8")));
        assert!(!id.base.is_valid(&json!("nope")));

        let big = FieldSchemaSet::for_field(&FieldDef::bigint("n"));
        assert!(big.base.is_valid(&json!("-92233720368547758070")));
        assert!(big.base.is_valid(&json!(7)));
        assert!(!big.base.is_valid(&json!("1.5")));

        let price = FieldSchemaSet::for_field(&FieldDef::decimal("price"));
        assert!(price.base.is_valid(&json!("19.99")));
        assert!(!price.base.is_valid(&json!("cheap")));

        let role = FieldSchemaSet::for_field(&FieldDef::enumeration("role", "Role", ["ADMIN"]));
        assert!(role.base.is_valid(&json!("ADMIN")));
        assert!(!role.base.is_valid(&json!("GUEST")));
    }

    #[test]
    fn test_custom_validator() {
        let field = FieldDef::string("email")
            .nullable()
            .with_validator(|v| match v.as_str() {
                Some(s) if s.contains('@') => Ok(()),
                _ => Err("must contain @".to_string()),
            });
        let set = FieldSchemaSet::for_field(&field);
        assert!(set.create.is_valid(&json!("a@b.c")));
        assert!(set.create.is_valid(&json!(null)));
        assert_eq!(
            set.create.parse(&json!("abc")).unwrap_err().issues()[0].code,
            IssueCode::custom("must contain @")
        );
    }
}
