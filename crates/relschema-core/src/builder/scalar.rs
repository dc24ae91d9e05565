//! Phase 1: schemas derived from a model's own scalar fields.

use indexmap::IndexMap;
use tracing::debug;

use super::where_unique::build_where_unique;
use crate::catalog::ModelDef;
use crate::config::EngineConfig;
use crate::primitive::FieldSchemaSet;
use crate::schema::{KeyPolicy, ObjectField, ObjectSchema, Schema};

/// Scalar-only schemas of a model. Built without touching any other model.
#[derive(Debug, Clone)]
pub struct ScalarSchemas {
    /// Per-field primitive schemas, in declaration order.
    pub field_sets: IndexMap<String, FieldSchemaSet>,
    /// Field filters, without combinators.
    pub where_shape: ObjectSchema,
    /// Field filters plus `AND`/`OR`/`NOT`.
    pub where_input: Schema,
    /// Create shape; defaults are filled in.
    pub create_shape: ObjectSchema,
    /// Scalar-only create input.
    pub create_input: Schema,
    /// Update shape; every key optional.
    pub update_shape: ObjectSchema,
    /// Scalar-only update input.
    pub update_input: Schema,
    /// `select` shape: a boolean per scalar field.
    pub select_shape: ObjectSchema,
    /// `select` input.
    pub select: Schema,
    /// `include` shape: a boolean per relation.
    pub include_shape: ObjectSchema,
    /// `include` input.
    pub include: Schema,
    /// `orderBy` for one object (callers accept one or many).
    pub order_by: Schema,
    /// Identifying slots.
    pub where_unique_shape: ObjectSchema,
    /// `whereUnique` input.
    pub where_unique: Schema,
    /// A declared scalar field name.
    pub scalar_fields: Schema,
}

/// Build phase-1 schemas for a model.
pub(crate) fn build_scalar_schemas(model: &ModelDef, config: &EngineConfig) -> ScalarSchemas {
    let policy = config.key_policy();
    let field_sets: IndexMap<String, FieldSchemaSet> = model
        .fields
        .iter()
        .map(|f| (f.name.clone(), FieldSchemaSet::for_field(f)))
        .collect();

    let mut where_shape = ObjectSchema::new().with_policy(policy);
    let mut create_shape = ObjectSchema::new().with_policy(policy);
    let mut update_shape = ObjectSchema::new().with_policy(policy);
    let mut select_shape = ObjectSchema::new().with_policy(policy);
    let mut order_by = ObjectSchema::new().with_policy(KeyPolicy::FieldReference);

    let direction = Schema::enumeration(["asc", "desc"]);
    let sort = Schema::union(vec![
        direction.clone(),
        ObjectSchema::new()
            .required("sort", direction)
            .optional("nulls", Schema::enumeration(["first", "last"]))
            .into_schema(),
    ]);

    for field in &model.fields {
        let Some(set) = field_sets.get(&field.name) else {
            continue;
        };
        where_shape.insert(&field.name, ObjectField::optional(set.filter.clone()));

        let create = match &field.default {
            Some(default) => ObjectField::optional(set.create.clone())
                .with_default(default.to_default_fn()),
            None if field.is_optional_on_create() => ObjectField::optional(set.create.clone()),
            None => ObjectField::required(set.create.clone()),
        };
        create_shape.insert(&field.name, create);

        update_shape.insert(&field.name, ObjectField::optional(set.update.clone()));
        select_shape.insert(&field.name, ObjectField::optional(Schema::boolean()));
        order_by.insert(&field.name, ObjectField::optional(sort.clone()));
    }

    let include_shape = model
        .relations
        .iter()
        .fold(ObjectSchema::new().with_policy(policy), |shape, rel| {
            shape.optional(rel.name.as_str(), Schema::boolean())
        });

    let (where_unique_shape, where_unique) = build_where_unique(model, &field_sets, policy);

    debug!(
        model = %model.name,
        fields = field_sets.len(),
        "scalar schemas built"
    );

    ScalarSchemas {
        where_input: with_logical_combinators(where_shape.clone()),
        where_shape,
        create_input: create_shape.clone().into_schema(),
        create_shape,
        update_input: update_shape.clone().into_schema(),
        update_shape,
        select: select_shape.clone().into_schema(),
        select_shape,
        include: include_shape.clone().into_schema(),
        include_shape,
        order_by: order_by.into_schema(),
        where_unique_shape,
        where_unique,
        scalar_fields: Schema::field_ref(model.scalar_names()),
        field_sets,
    }
}

/// Add `AND` (one or many), `OR` (many) and `NOT` (one or many) of the
/// filter itself.
pub(crate) fn with_logical_combinators(shape: ObjectSchema) -> Schema {
    Schema::recursive(|this| {
        shape
            .optional("AND", Schema::one_or_many(this.clone()))
            .optional("OR", Schema::array(this.clone()))
            .optional("NOT", Schema::one_or_many(this))
            .into_schema()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AutoGenerate, FieldDef};
    use crate::schema::IssueCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn post() -> ModelDef {
        ModelDef::new("Post")
            .with_field(FieldDef::string("id").id().with_auto(AutoGenerate::Cuid))
            .with_field(FieldDef::string("title"))
            .with_field(FieldDef::boolean("published").with_default(false))
            .with_field(FieldDef::int("views").with_default_fn(|| json!(0)))
            .with_field(FieldDef::string("summary").nullable())
    }

    fn build(model: &ModelDef) -> ScalarSchemas {
        build_scalar_schemas(model, &EngineConfig::default())
    }

    #[test]
    fn test_create_defaults() {
        let schemas = build(&post());
        let parsed = schemas.create_input.parse(&json!({"title": "Hello"})).unwrap();
        assert_eq!(
            parsed,
            json!({"title": "Hello", "published": false, "views": 0})
        );

        let failure = schemas.create_input.parse(&json!({})).unwrap_err();
        assert_eq!(failure.issues().len(), 1);
        assert_eq!(failure.issues()[0].path_string(), "title");
        assert_eq!(failure.issues()[0].code, IssueCode::Required);
    }

    #[test]
    fn test_where_combinators() {
        let schemas = build(&post());
        let parsed = schemas
            .where_input
            .parse(&json!({
                "AND": {"title": "a"},
                "OR": [{"views": {"gt": 10}}, {"NOT": {"published": true}}],
            }))
            .unwrap();
        assert_eq!(
            parsed,
            json!({
                "AND": {"title": {"equals": "a"}},
                "OR": [{"views": {"gt": 10}}, {"NOT": {"published": {"equals": true}}}],
            })
        );

        let failure = schemas.where_input.parse(&json!({"OR": {"title": "a"}})).unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "OR");
    }

    #[test]
    fn test_update_all_optional() {
        let schemas = build(&post());
        assert_eq!(schemas.update_input.parse(&json!({})).unwrap(), json!({}));
        assert_eq!(
            schemas.update_input.parse(&json!({"views": 5})).unwrap(),
            json!({"views": {"set": 5}})
        );
    }

    #[test]
    fn test_order_by() {
        let schemas = build(&post());
        assert!(schemas.order_by.is_valid(&json!({"title": "asc"})));
        assert!(schemas
            .order_by
            .is_valid(&json!({"summary": {"sort": "desc", "nulls": "last"}})));
        assert!(!schemas.order_by.is_valid(&json!({"title": "up"})));

        let failure = schemas.order_by.parse(&json!({"rating": "asc"})).unwrap_err();
        assert!(failure.is_invalid_field_reference());
    }

    #[test]
    fn test_select_and_unknown_keys() {
        let schemas = build(&post());
        assert!(schemas.select.is_valid(&json!({"id": true, "title": false})));
        assert!(matches!(
            schemas.select.parse(&json!({"body": true})).unwrap_err().issues()[0].code,
            IssueCode::UnrecognizedKeys { .. }
        ));

        let lenient = build_scalar_schemas(
            &post(),
            &EngineConfig::new().with_unknown_keys(crate::config::UnknownKeys::Strip),
        );
        assert_eq!(
            lenient.select.parse(&json!({"id": true, "body": true})).unwrap(),
            json!({"id": true})
        );
    }
}
