//! Phase 2: relation schemas.
//!
//! Every reference to another model goes through [`Schema::lazy`], so the
//! target's resolver runs only while a payload is validated. Building a
//! model therefore never depends on the order in which models are declared,
//! and cyclic graphs (including self relations) build in one pass.

use std::sync::Arc;

use crate::catalog::{Model, ModelDef, RelationDef, RelationType};
use crate::schema::{KeyPolicy, ObjectSchema, Schema};

/// Schemas a relation contributes to its model's inputs.
pub(crate) struct RelationSchemas {
    pub filter: Schema,
    pub create: Schema,
    pub update: Schema,
    pub select: Schema,
}

/// A scalar foreign key backing a to-one relation of the same model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ForeignKeyLink {
    pub field: String,
    pub relation: String,
    /// The key must be supplied on create, directly or through the relation.
    pub required: bool,
}

/// Defer to a schema of the relation target.
fn deferred(
    rel: &RelationDef,
    pick: impl Fn(&Arc<Model>) -> Schema + Send + Sync + 'static,
) -> Schema {
    let target = rel.target.clone();
    Schema::lazy(rel.target_name(), move || target.resolve().map(|m| pick(&m)))
}

/// The foreign key of `rel` when it is stored on the target model.
pub(crate) fn foreign_key_on_target<'a>(model: &ModelDef, rel: &'a RelationDef) -> Option<&'a str> {
    let fk = rel.foreign_key.as_deref()?;
    match rel.relation_type {
        RelationType::OneToMany => Some(fk),
        RelationType::OneToOne if model.get_field(fk).is_none() => Some(fk),
        _ => None,
    }
}

/// Scalar foreign keys of this model that back a to-one relation.
pub(crate) fn local_foreign_keys(model: &ModelDef) -> Vec<ForeignKeyLink> {
    model
        .relations
        .iter()
        .filter(|rel| rel.relation_type.is_to_one())
        .filter_map(|rel| {
            let fk = rel.foreign_key.as_deref()?;
            let field = model.get_field(fk)?;
            Some(ForeignKeyLink {
                field: field.name.clone(),
                relation: rel.name.clone(),
                required: !field.is_optional_on_create(),
            })
        })
        .collect()
}

pub(crate) fn build_relation_schemas(model: &ModelDef, rel: &RelationDef) -> RelationSchemas {
    let where_input = deferred(rel, |m| m.bundle().where_input.clone());
    let where_unique = deferred(rel, |m| m.bundle().where_unique.clone());
    let update_input = deferred(rel, |m| m.bundle().update_input.clone());

    let nested_create = match foreign_key_on_target(model, rel) {
        Some(fk) => {
            let fk = fk.to_string();
            deferred(rel, move |m| m.create_input_without(&fk))
        }
        None => deferred(rel, |m| m.bundle().create_input.clone()),
    };

    let connect_or_create = ObjectSchema::new()
        .required("where", where_unique.clone())
        .required("create", nested_create.clone())
        .into_schema();

    if rel.is_to_many() {
        let many = Schema::ensure_array;
        let update_scalar = deferred(rel, |m| m.bundle().update_scalar.clone());

        RelationSchemas {
            filter: ObjectSchema::new()
                .optional("some", where_input.clone())
                .optional("every", where_input.clone())
                .optional("none", where_input.clone())
                .into_schema(),
            create: ObjectSchema::new()
                .optional("create", many(nested_create.clone()))
                .optional("connect", many(where_unique.clone()))
                .optional("connectOrCreate", many(connect_or_create.clone()))
                .into_schema(),
            update: ObjectSchema::new()
                .optional("create", many(nested_create.clone()))
                .optional("connect", many(where_unique.clone()))
                .optional("connectOrCreate", many(connect_or_create))
                .optional("set", many(where_unique.clone()))
                .optional("disconnect", many(where_unique.clone()))
                .optional("delete", many(where_unique.clone()))
                .optional(
                    "update",
                    many(
                        ObjectSchema::new()
                            .required("where", where_unique.clone())
                            .required("data", update_input.clone())
                            .into_schema(),
                    ),
                )
                .optional(
                    "updateMany",
                    many(
                        ObjectSchema::new()
                            .required("where", where_input.clone())
                            .required("data", update_scalar)
                            .into_schema(),
                    ),
                )
                .optional(
                    "upsert",
                    many(
                        ObjectSchema::new()
                            .required("where", where_unique)
                            .required("create", nested_create)
                            .required("update", update_input)
                            .into_schema(),
                    ),
                )
                .optional("deleteMany", many(where_input))
                .into_schema(),
            select: deferred(rel, |m| m.bundle().relation_many_args.clone()),
        }
    } else {
        let target_where = if rel.optional {
            where_input.nullable()
        } else {
            where_input
        };

        let mut update = ObjectSchema::new()
            .optional("create", nested_create.clone())
            .optional("connect", where_unique.clone())
            .optional("connectOrCreate", connect_or_create.clone())
            .optional("update", update_input.clone())
            .optional(
                "upsert",
                ObjectSchema::new()
                    .required("create", nested_create.clone())
                    .required("update", update_input)
                    .into_schema(),
            );
        if rel.optional {
            update = update
                .optional("disconnect", Schema::boolean())
                .optional("delete", Schema::boolean());
        }

        RelationSchemas {
            filter: ObjectSchema::new()
                .optional("is", target_where.clone())
                .optional("isNot", target_where)
                .into_schema(),
            create: ObjectSchema::new()
                .optional("create", nested_create)
                .optional("connect", where_unique)
                .optional("connectOrCreate", connect_or_create)
                .into_schema(),
            update: update.into_schema(),
            select: deferred(rel, |m| m.bundle().relation_one_args.clone()),
        }
    }
}

/// `_count` selection over the to-many relations, if there are any.
pub(crate) fn build_count_select(model: &ModelDef) -> Option<Schema> {
    let relations = model
        .relations
        .iter()
        .filter(|rel| rel.is_to_many())
        .fold(ObjectSchema::new().with_policy(KeyPolicy::FieldReference), |shape, rel| {
            shape.optional(rel.name.as_str(), Schema::boolean())
        });
    if relations.is_empty() {
        return None;
    }
    Some(Schema::union(vec![
        Schema::boolean(),
        ObjectSchema::new()
            .required("select", relations.into_schema())
            .into_schema(),
    ]))
}

/// How this model may be selected through a to-one relation of another.
pub(crate) fn nested_one_args(select: &Schema, include: &Schema) -> Schema {
    Schema::union(vec![
        Schema::boolean(),
        ObjectSchema::new()
            .optional("select", select.clone())
            .optional("include", include.clone())
            .into_schema(),
    ])
}

/// How this model may be selected through a to-many relation of another.
pub(crate) fn nested_many_args(
    select: &Schema,
    include: &Schema,
    where_input: &Schema,
    order_by: &Schema,
    where_unique: &Schema,
    scalar_fields: &Schema,
) -> Schema {
    Schema::union(vec![
        Schema::boolean(),
        ObjectSchema::new()
            .optional("select", select.clone())
            .optional("include", include.clone())
            .optional("where", where_input.clone())
            .optional("orderBy", Schema::one_or_many(order_by.clone()))
            .optional("cursor", where_unique.clone())
            .optional("take", Schema::integer())
            .optional("skip", Schema::non_negative_integer())
            .optional("distinct", Schema::ensure_array(scalar_fields.clone()))
            .into_schema(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldDef, ModelResolver};
    use pretty_assertions::assert_eq;

    fn unresolved(name: &str) -> ModelResolver {
        ModelResolver::new(name, || None)
    }

    fn post() -> ModelDef {
        ModelDef::new("Post")
            .with_field(FieldDef::string("id").id())
            .with_field(FieldDef::string("authorId"))
            .with_field(FieldDef::string("editorId").nullable())
            .with_relation(
                RelationDef::many_to_one("author", unresolved("Author"))
                    .with_foreign_key("authorId"),
            )
            .with_relation(
                RelationDef::many_to_one("editor", unresolved("Author"))
                    .optional()
                    .with_foreign_key("editorId"),
            )
            .with_relation(
                RelationDef::one_to_many("comments", unresolved("Comment"))
                    .with_foreign_key("postId"),
            )
    }

    #[test]
    fn test_foreign_key_side() {
        let model = post();
        assert_eq!(foreign_key_on_target(&model, &model.relations[0]), None);
        assert_eq!(
            foreign_key_on_target(&model, &model.relations[2]),
            Some("postId")
        );
    }

    #[test]
    fn test_local_foreign_keys() {
        assert_eq!(
            local_foreign_keys(&post()),
            vec![
                ForeignKeyLink {
                    field: "authorId".into(),
                    relation: "author".into(),
                    required: true,
                },
                ForeignKeyLink {
                    field: "editorId".into(),
                    relation: "editor".into(),
                    required: false,
                },
            ]
        );
    }

    #[test]
    fn test_count_select() {
        let count = build_count_select(&post()).unwrap();
        assert!(count.is_valid(&serde_json::json!(true)));
        assert!(count.is_valid(&serde_json::json!({"select": {"comments": true}})));
        assert!(!count.is_valid(&serde_json::json!({"select": {"author": true}})));

        let lonely = ModelDef::new("Tag").with_field(FieldDef::string("id").id());
        assert!(build_count_select(&lonely).is_none());
    }

    #[test]
    fn test_schemas_build_without_resolving() {
        // Unresolvable targets are fine at build time; only parsing reports them.
        let model = post();
        let schemas = build_relation_schemas(&model, &model.relations[0]);
        let failure = schemas
            .filter
            .parse(&serde_json::json!({"is": {"name": "x"}}))
            .unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "is");
        assert!(schemas.filter.is_valid(&serde_json::json!({})));
    }
}
