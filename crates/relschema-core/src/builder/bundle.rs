//! The per-model schema bundle.

use serde_json::Value;
use tracing::debug;

use super::args::{ArgInputs, Operation, OperationArgs};
use super::having::build_having;
use super::relation::{
    build_count_select, build_relation_schemas, local_foreign_keys, nested_many_args,
    nested_one_args, ForeignKeyLink,
};
use super::scalar::{with_logical_combinators, ScalarSchemas};
use crate::catalog::ModelDef;
use crate::config::EngineConfig;
use crate::schema::{
    Issue, IssueCode, ObjectField, ObjectSchema, ParseOptions, PathSegment, Schema,
    ValidationFailure,
};

/// Every derived schema of one model. Built once, then shared read-only.
#[derive(Debug)]
pub struct SchemaBundle {
    /// Model name.
    pub model: String,
    /// Scalar and relation filters with `AND`/`OR`/`NOT`.
    pub where_input: Schema,
    /// Identifying slots; at least one must be supplied.
    pub where_unique: Schema,
    /// Create input including nested relation writes.
    pub create_input: Schema,
    /// Create input restricted to scalar fields.
    pub create_scalar: Schema,
    /// Update input including nested relation writes.
    pub update_input: Schema,
    /// Update input restricted to scalar fields.
    pub update_scalar: Schema,
    /// Field and relation selection.
    pub select: Schema,
    /// Relation inclusion.
    pub include: Schema,
    /// One `orderBy` object.
    pub order_by: Schema,
    /// A declared scalar field name.
    pub scalar_fields: Schema,
    /// `_count` of to-many relations, when the model has any.
    pub count_select: Option<Schema>,
    /// groupBy `having`.
    pub having: Schema,
    /// This model selected through a to-one relation.
    pub relation_one_args: Schema,
    /// This model selected through a to-many relation.
    pub relation_many_args: Schema,
    /// Operation arguments.
    pub args: OperationArgs,
    parse_options: ParseOptions,
    create_shape: ObjectSchema,
    fk_links: Vec<ForeignKeyLink>,
}

impl SchemaBundle {
    pub(crate) fn build(model: &ModelDef, scalar: &ScalarSchemas, config: &EngineConfig) -> Self {
        let policy = config.key_policy();
        let fk_links = local_foreign_keys(model);

        let mut where_shape = scalar.where_shape.clone();
        let mut create_shape = scalar.create_shape.clone();
        let mut update_shape = scalar.update_shape.clone();
        let mut select_shape = scalar.select_shape.clone();
        let mut include_shape = scalar.include_shape.clone();

        for link in fk_links.iter().filter(|link| link.required) {
            if let Some(field) = create_shape.get(&link.field) {
                let relaxed = ObjectField {
                    optional: true,
                    ..field.clone()
                };
                create_shape.insert(link.field.as_str(), relaxed);
            }
        }

        for rel in &model.relations {
            let schemas = build_relation_schemas(model, rel);
            where_shape.insert(rel.name.as_str(), ObjectField::optional(schemas.filter));
            create_shape.insert(rel.name.as_str(), ObjectField::optional(schemas.create));
            update_shape.insert(rel.name.as_str(), ObjectField::optional(schemas.update));
            select_shape.insert(rel.name.as_str(), ObjectField::optional(schemas.select.clone()));
            include_shape.insert(rel.name.as_str(), ObjectField::optional(schemas.select));
        }

        let count_select = build_count_select(model);
        if let Some(count) = &count_select {
            select_shape.insert("_count", ObjectField::optional(count.clone()));
            include_shape.insert("_count", ObjectField::optional(count.clone()));
        }

        let where_input = with_logical_combinators(where_shape);
        let create_input = require_foreign_keys(create_shape.clone(), fk_links.clone());
        let update_input = update_shape.into_schema();
        let select = select_shape.into_schema();
        let include = include_shape.into_schema();
        let having = build_having(model, &scalar.field_sets, policy);

        let relation_one_args = nested_one_args(&select, &include);
        let relation_many_args = nested_many_args(
            &select,
            &include,
            &where_input,
            &scalar.order_by,
            &scalar.where_unique,
            &scalar.scalar_fields,
        );

        let args = OperationArgs::build(&ArgInputs {
            model,
            policy,
            where_input: &where_input,
            where_unique: &scalar.where_unique,
            create_input: &create_input,
            create_scalar: &scalar.create_input,
            update_input: &update_input,
            update_scalar: &scalar.update_input,
            select: &select,
            include: &include,
            order_by: &scalar.order_by,
            scalar_fields: &scalar.scalar_fields,
            having: &having,
        });

        debug!(
            model = %model.name,
            fields = model.fields.len(),
            relations = model.relations.len(),
            "schema bundle built"
        );

        Self {
            model: model.name.clone(),
            where_input,
            where_unique: scalar.where_unique.clone(),
            create_input,
            create_scalar: scalar.create_input.clone(),
            update_input,
            update_scalar: scalar.update_input.clone(),
            select,
            include,
            order_by: scalar.order_by.clone(),
            scalar_fields: scalar.scalar_fields.clone(),
            count_select,
            having,
            relation_one_args,
            relation_many_args,
            args,
            parse_options: config.parse_options(),
            create_shape,
            fk_links,
        }
    }

    /// The argument schema of an operation.
    pub fn args(&self, operation: Operation) -> &Schema {
        self.args.get(operation)
    }

    /// Validate the arguments of an operation, returning them normalized.
    pub fn validate(&self, operation: Operation, payload: &Value) -> Result<Value, ValidationFailure> {
        self.args(operation).parse_with(payload, &self.parse_options)
    }

    /// Create input for a nested create whose parent supplies `foreign_key`:
    /// the key and the relations it backs are left out.
    pub(crate) fn create_input_without(&self, foreign_key: &str) -> Schema {
        let (dropped, kept): (Vec<ForeignKeyLink>, Vec<ForeignKeyLink>) = self
            .fk_links
            .iter()
            .cloned()
            .partition(|link| link.field == foreign_key);

        let mut keys = vec![foreign_key.to_string()];
        keys.extend(dropped.into_iter().map(|link| link.relation));

        require_foreign_keys(self.create_shape.clone().without(&keys), kept)
    }
}

/// Each required foreign key must be given directly or through its relation.
fn require_foreign_keys(shape: ObjectSchema, links: Vec<ForeignKeyLink>) -> Schema {
    let schema = shape.into_schema();
    let links: Vec<ForeignKeyLink> = links.into_iter().filter(|link| link.required).collect();
    if links.is_empty() {
        return schema;
    }
    schema.refine_issues(move |value| {
        let Value::Object(map) = value else {
            return Vec::new();
        };
        links
            .iter()
            .filter(|link| !map.contains_key(&link.field) && !map.contains_key(&link.relation))
            .map(|link| Issue::new(vec![PathSegment::Key(link.field.clone())], IssueCode::Required))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_scalar_schemas;
    use crate::catalog::{FieldDef, ModelResolver, RelationDef};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn comment() -> ModelDef {
        ModelDef::new("Comment")
            .with_field(FieldDef::string("id").id())
            .with_field(FieldDef::string("body"))
            .with_field(FieldDef::string("postId"))
            .with_relation(
                RelationDef::many_to_one("post", ModelResolver::new("Post", || None))
                    .with_foreign_key("postId"),
            )
    }

    fn bundle(model: &ModelDef) -> SchemaBundle {
        let config = EngineConfig::default();
        let scalar = build_scalar_schemas(model, &config);
        SchemaBundle::build(model, &scalar, &config)
    }

    #[test]
    fn test_foreign_key_or_relation() {
        let bundle = bundle(&comment());

        assert!(bundle
            .create_input
            .is_valid(&json!({"id": "c1", "body": "hi", "postId": "p1"})));

        let failure = bundle
            .create_input
            .parse(&json!({"id": "c1", "body": "hi"}))
            .unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "postId");
        assert_eq!(failure.issues()[0].code, IssueCode::Required);

        // The scalar-only input keeps the key mandatory.
        assert!(!bundle.create_scalar.is_valid(&json!({"id": "c1", "body": "hi"})));
    }

    #[test]
    fn test_create_without_foreign_key() {
        let bundle = bundle(&comment());
        let nested = bundle.create_input_without("postId");

        assert_eq!(
            nested.parse(&json!({"id": "c1", "body": "hi"})).unwrap(),
            json!({"id": "c1", "body": "hi"})
        );
        assert!(!nested.is_valid(&json!({"id": "c1", "body": "hi", "postId": "p1"})));
        assert!(!nested.is_valid(&json!({"id": "c1", "body": "hi", "post": {}})));
    }

    #[test]
    fn test_operation_args() {
        let bundle = bundle(&comment());

        assert!(bundle
            .validate(Operation::FindUnique, &json!({"where": {"id": "c1"}}))
            .is_ok());
        assert!(bundle
            .validate(Operation::FindUnique, &json!({"where": {}}))
            .unwrap_err()
            .is_missing_unique_identifier());
        assert!(bundle.args(Operation::FindUniqueOrThrow).ptr_eq(bundle.args(Operation::FindUnique)));

        let parsed = bundle
            .validate(
                Operation::CreateMany,
                &json!({"data": {"id": "c1", "body": "hi", "postId": "p1"}}),
            )
            .unwrap();
        assert_eq!(
            parsed,
            json!({"data": [{"id": "c1", "body": "hi", "postId": "p1"}]})
        );
    }

    #[test]
    fn test_find_many_args() {
        let bundle = bundle(&comment());
        let parsed = bundle
            .validate(
                Operation::FindMany,
                &json!({
                    "where": {"body": {"contains": "rust"}},
                    "orderBy": [{"id": "desc"}],
                    "take": -10,
                    "skip": 5,
                    "distinct": "postId",
                }),
            )
            .unwrap();
        assert_eq!(parsed["distinct"], json!(["postId"]));

        let failure = bundle
            .validate(Operation::FindMany, &json!({"skip": -1}))
            .unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "skip");
        assert_eq!(failure.issues()[0].code, IssueCode::TooSmall { minimum: 0 });

        for distinct in [json!(["nope"]), json!("nope")] {
            let failure = bundle
                .validate(Operation::FindMany, &json!({"distinct": distinct}))
                .unwrap_err();
            assert!(failure.is_invalid_field_reference());
            assert_eq!(failure.issues()[0].path_string(), "distinct[0]");
        }
    }

    #[test]
    fn test_aggregate_selectors() {
        let model = comment().with_field(FieldDef::int("likes"));
        let bundle = bundle(&model);

        assert!(bundle
            .validate(
                Operation::Aggregate,
                &json!({"_count": {"_all": true}, "_avg": {"likes": true}, "_max": {"body": true}}),
            )
            .is_ok());

        let failure = bundle
            .validate(Operation::Aggregate, &json!({"_sum": {"body": true}}))
            .unwrap_err();
        assert_eq!(
            failure.issues()[0].code,
            IssueCode::InvalidFieldReference {
                field: "body".into(),
                valid: vec!["likes".into()],
            }
        );
    }

    #[test]
    fn test_group_by_requires_fields() {
        let bundle = bundle(&comment());
        let parsed = bundle
            .validate(
                Operation::GroupBy,
                &json!({"by": "postId", "having": {"id": {"_count": {"gt": 1}}}}),
            )
            .unwrap();
        assert_eq!(parsed["by"], json!(["postId"]));

        let failure = bundle
            .validate(Operation::GroupBy, &json!({"by": []}))
            .unwrap_err();
        assert_eq!(failure.issues()[0].code, IssueCode::TooSmall { minimum: 1 });
        assert!(bundle.validate(Operation::GroupBy, &json!({})).is_err());
    }
}
