//! Operation argument shapes.

use std::fmt;
use std::str::FromStr;

use crate::catalog::ModelDef;
use crate::error::Error;
use crate::schema::{IssueCode, KeyPolicy, ObjectSchema, Schema};

/// A query operation whose arguments can be validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindMany,
    FindFirst,
    /// Same arguments as [`Operation::FindFirst`].
    FindFirstOrThrow,
    FindUnique,
    /// Same arguments as [`Operation::FindUnique`].
    FindUniqueOrThrow,
    Create,
    /// Scalar-only rows; relations cannot be written here.
    CreateMany,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
    Upsert,
    Count,
    Exist,
    Aggregate,
    GroupBy,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 16] = [
        Operation::FindMany,
        Operation::FindFirst,
        Operation::FindFirstOrThrow,
        Operation::FindUnique,
        Operation::FindUniqueOrThrow,
        Operation::Create,
        Operation::CreateMany,
        Operation::Update,
        Operation::UpdateMany,
        Operation::Delete,
        Operation::DeleteMany,
        Operation::Upsert,
        Operation::Count,
        Operation::Exist,
        Operation::Aggregate,
        Operation::GroupBy,
    ];

    /// The camelCase operation name.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::FindMany => "findMany",
            Operation::FindFirst => "findFirst",
            Operation::FindFirstOrThrow => "findFirstOrThrow",
            Operation::FindUnique => "findUnique",
            Operation::FindUniqueOrThrow => "findUniqueOrThrow",
            Operation::Create => "create",
            Operation::CreateMany => "createMany",
            Operation::Update => "update",
            Operation::UpdateMany => "updateMany",
            Operation::Delete => "delete",
            Operation::DeleteMany => "deleteMany",
            Operation::Upsert => "upsert",
            Operation::Count => "count",
            Operation::Exist => "exist",
            Operation::Aggregate => "aggregate",
            Operation::GroupBy => "groupBy",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

/// Inputs the argument shapes are assembled from.
pub(crate) struct ArgInputs<'a> {
    pub model: &'a ModelDef,
    pub policy: KeyPolicy,
    pub where_input: &'a Schema,
    pub where_unique: &'a Schema,
    pub create_input: &'a Schema,
    pub create_scalar: &'a Schema,
    pub update_input: &'a Schema,
    pub update_scalar: &'a Schema,
    pub select: &'a Schema,
    pub include: &'a Schema,
    pub order_by: &'a Schema,
    pub scalar_fields: &'a Schema,
    pub having: &'a Schema,
}

/// Argument schema of every operation of one model.
#[derive(Debug, Clone)]
pub struct OperationArgs {
    pub find_many: Schema,
    pub find_first: Schema,
    pub find_unique: Schema,
    pub create: Schema,
    pub create_many: Schema,
    pub update: Schema,
    pub update_many: Schema,
    pub delete: Schema,
    pub delete_many: Schema,
    pub upsert: Schema,
    pub count: Schema,
    pub exist: Schema,
    pub aggregate: Schema,
    pub group_by: Schema,
}

impl OperationArgs {
    pub(crate) fn build(inputs: &ArgInputs<'_>) -> Self {
        let policy = inputs.policy;
        let object = || ObjectSchema::new().with_policy(policy);
        let order_by = Schema::one_or_many(inputs.order_by.clone());
        let take = Schema::integer();
        let skip = Schema::non_negative_integer();

        let find = object()
            .optional("where", inputs.where_input.clone())
            .optional("orderBy", order_by.clone())
            .optional("cursor", inputs.where_unique.clone())
            .optional("take", take.clone())
            .optional("skip", skip.clone())
            .optional("select", inputs.select.clone())
            .optional("include", inputs.include.clone())
            .optional("distinct", Schema::ensure_array(inputs.scalar_fields.clone()))
            .into_schema();

        let find_unique = object()
            .required("where", inputs.where_unique.clone())
            .optional("select", inputs.select.clone())
            .optional("include", inputs.include.clone())
            .into_schema();

        let create = object()
            .required("data", inputs.create_input.clone())
            .optional("select", inputs.select.clone())
            .optional("include", inputs.include.clone())
            .into_schema();

        let create_many = object()
            .required("data", Schema::ensure_array(inputs.create_scalar.clone()))
            .optional("skipDuplicates", Schema::boolean())
            .into_schema();

        let update = object()
            .required("where", inputs.where_unique.clone())
            .required("data", inputs.update_input.clone())
            .optional("select", inputs.select.clone())
            .optional("include", inputs.include.clone())
            .into_schema();

        let update_many = object()
            .optional("where", inputs.where_input.clone())
            .required("data", inputs.update_scalar.clone())
            .into_schema();

        let delete = object()
            .required("where", inputs.where_unique.clone())
            .optional("select", inputs.select.clone())
            .optional("include", inputs.include.clone())
            .into_schema();

        let where_only = object()
            .optional("where", inputs.where_input.clone())
            .into_schema();

        let upsert = object()
            .required("where", inputs.where_unique.clone())
            .required("create", inputs.create_input.clone())
            .required("update", inputs.update_input.clone())
            .optional("select", inputs.select.clone())
            .optional("include", inputs.include.clone())
            .into_schema();

        let model = inputs.model;
        let scalar_names = model.scalar_names();
        let numeric_names = model.numeric_field_names();
        let count_fields = field_flags(scalar_names.iter().map(String::as_str).chain(["_all"]));
        let count_selector = Schema::union(vec![Schema::boolean(), count_fields.clone()]);
        let numeric_selector = field_flags(numeric_names.iter().map(String::as_str));
        let any_selector = field_flags(scalar_names.iter().map(String::as_str));

        let count = object()
            .optional("where", inputs.where_input.clone())
            .optional("orderBy", order_by.clone())
            .optional("cursor", inputs.where_unique.clone())
            .optional("take", take.clone())
            .optional("skip", skip.clone())
            .optional("select", count_fields)
            .into_schema();

        let aggregates = ObjectSchema::new()
            .optional("_count", count_selector)
            .optional("_avg", numeric_selector.clone())
            .optional("_sum", numeric_selector)
            .optional("_min", any_selector.clone())
            .optional("_max", any_selector);

        let aggregate = object()
            .optional("where", inputs.where_input.clone())
            .optional("orderBy", order_by.clone())
            .optional("cursor", inputs.where_unique.clone())
            .optional("take", take.clone())
            .optional("skip", skip.clone())
            .extend(&aggregates)
            .into_schema();

        let by = Schema::ensure_array(inputs.scalar_fields.clone()).refine(|value| {
            match value.as_array() {
                Some(names) if names.is_empty() => Err(IssueCode::TooSmall { minimum: 1 }),
                _ => Ok(()),
            }
        });

        let group_by = object()
            .optional("where", inputs.where_input.clone())
            .optional("orderBy", order_by)
            .required("by", by)
            .optional("having", inputs.having.clone())
            .optional("take", take)
            .optional("skip", skip)
            .extend(&aggregates)
            .into_schema();

        Self {
            find_first: find.clone(),
            find_many: find,
            find_unique,
            create,
            create_many,
            update,
            update_many,
            delete,
            delete_many: where_only.clone(),
            upsert,
            count,
            exist: where_only,
            aggregate,
            group_by,
        }
    }

    /// The argument schema of an operation. The `OrThrow` forms share the
    /// schema of their plain counterpart.
    pub fn get(&self, operation: Operation) -> &Schema {
        match operation {
            Operation::FindMany => &self.find_many,
            Operation::FindFirst | Operation::FindFirstOrThrow => &self.find_first,
            Operation::FindUnique | Operation::FindUniqueOrThrow => &self.find_unique,
            Operation::Create => &self.create,
            Operation::CreateMany => &self.create_many,
            Operation::Update => &self.update,
            Operation::UpdateMany => &self.update_many,
            Operation::Delete => &self.delete,
            Operation::DeleteMany => &self.delete_many,
            Operation::Upsert => &self.upsert,
            Operation::Count => &self.count,
            Operation::Exist => &self.exist,
            Operation::Aggregate => &self.aggregate,
            Operation::GroupBy => &self.group_by,
        }
    }
}

/// `{field: bool}` over the given names; other keys are invalid references.
fn field_flags<'a>(names: impl IntoIterator<Item = &'a str>) -> Schema {
    names
        .into_iter()
        .fold(
            ObjectSchema::new().with_policy(KeyPolicy::FieldReference),
            |shape, name| shape.optional(name, Schema::boolean()),
        )
        .into_schema()
}
