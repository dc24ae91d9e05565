//! `having` clauses for groupBy.

use std::sync::OnceLock;

use indexmap::IndexMap;

use super::scalar::with_logical_combinators;
use crate::catalog::ModelDef;
use crate::primitive::FieldSchemaSet;
use crate::schema::{KeyPolicy, ObjectField, ObjectSchema, Schema};

static AGGREGATE_FILTER: OnceLock<Schema> = OnceLock::new();

/// Numeric comparison applied to an aggregate value.
///
/// Built once per process and shared by the `having` clause of every model.
pub fn aggregate_filter() -> Schema {
    AGGREGATE_FILTER
        .get_or_init(|| {
            Schema::recursive(|this| {
                let number = Schema::number();
                ObjectSchema::new()
                    .optional("equals", number.clone())
                    .optional("not", Schema::union(vec![number.clone(), this]))
                    .optional("gt", number.clone())
                    .optional("gte", number.clone())
                    .optional("lt", number.clone())
                    .optional("lte", number.clone())
                    .optional("in", Schema::array(number.clone()))
                    .optional("notIn", Schema::array(number))
                    .into_schema()
            })
        })
        .clone()
}

/// Build a model's `having` input. Each field accepts its own filter or
/// aggregate operators; `_avg`/`_sum` only on numeric fields.
pub(crate) fn build_having(
    model: &ModelDef,
    field_sets: &IndexMap<String, FieldSchemaSet>,
    policy: KeyPolicy,
) -> Schema {
    let aggregate = aggregate_filter();
    let common = ObjectSchema::new()
        .optional("_count", aggregate.clone())
        .optional("_min", aggregate.clone())
        .optional("_max", aggregate.clone());
    let numeric = common
        .clone()
        .optional("_avg", aggregate.clone())
        .optional("_sum", aggregate)
        .into_schema();
    let common = common.into_schema();

    let mut shape = ObjectSchema::new().with_policy(policy);
    for field in &model.fields {
        let Some(set) = field_sets.get(&field.name) else {
            continue;
        };
        let operators = if field.kind.is_numeric() && !field.array {
            numeric.clone()
        } else {
            common.clone()
        };
        shape.insert(
            &field.name,
            ObjectField::optional(Schema::union(vec![operators, set.filter.clone()])),
        );
    }

    with_logical_combinators(shape)
}
