//! `whereUnique` schemas: one optional slot per identifying field or
//! compound constraint, at least one of which must be supplied.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::catalog::ModelDef;
use crate::primitive::FieldSchemaSet;
use crate::schema::{IssueCode, KeyPolicy, ObjectField, ObjectSchema, Schema};

/// A single identifying slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniqueSlot {
    pub name: String,
    pub fields: Vec<String>,
    pub compound: bool,
}

#[derive(Debug, Default)]
pub(crate) struct UniqueSlots {
    pub slots: Vec<UniqueSlot>,
    /// Effective names dropped because an earlier slot already used them.
    pub collisions: Vec<String>,
}

impl UniqueSlots {
    pub fn names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.name.clone()).collect()
    }
}

/// Collect identifying slots in registration order: single `id`/`unique`
/// fields, then the compound id, then compound uniques. A name already
/// taken keeps its first registration.
pub(crate) fn collect_unique_slots(model: &ModelDef) -> UniqueSlots {
    let mut out = UniqueSlots::default();

    for field in model.fields.iter().filter(|f| f.is_identifying()) {
        out.slots.push(UniqueSlot {
            name: field.name.clone(),
            fields: vec![field.name.clone()],
            compound: false,
        });
    }

    let compounds = model.compound_id.iter().chain(model.compound_uniques.iter());
    for constraint in compounds {
        let name = constraint.effective_name();
        if out.slots.iter().any(|s| s.name == name) {
            out.collisions.push(name);
            continue;
        }
        out.slots.push(UniqueSlot {
            name,
            fields: constraint.fields.clone(),
            compound: true,
        });
    }

    out
}

/// Build the `whereUnique` shape and its schema.
pub(crate) fn build_where_unique(
    model: &ModelDef,
    field_sets: &IndexMap<String, FieldSchemaSet>,
    policy: KeyPolicy,
) -> (ObjectSchema, Schema) {
    let unique = collect_unique_slots(model);
    for name in &unique.collisions {
        warn!(
            model = %model.name,
            constraint = %name,
            "compound constraint name already registered, keeping the first"
        );
    }

    let mut shape = ObjectSchema::new().with_policy(policy);
    for slot in &unique.slots {
        let schema = if slot.compound {
            slot.fields
                .iter()
                .filter_map(|f| field_sets.get(f).map(|set| (f, set)))
                .fold(ObjectSchema::new(), |members, (name, set)| {
                    members.required(name.as_str(), set.base.clone())
                })
                .into_schema()
        } else {
            match field_sets.get(&slot.name) {
                Some(set) => set.base.clone(),
                None => continue,
            }
        };
        shape.insert(slot.name.as_str(), ObjectField::optional(schema));
    }

    let expected = unique.names();
    let schema = shape.clone().into_schema().refine(move |value| {
        let supplied = match value {
            Value::Object(map) => expected.iter().any(|name| map.contains_key(name)),
            _ => false,
        };
        if supplied {
            Ok(())
        } else {
            Err(IssueCode::MissingUniqueIdentifier {
                expected: expected.clone(),
            })
        }
    });

    (shape, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CompoundConstraint, FieldDef};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sets(model: &ModelDef) -> IndexMap<String, FieldSchemaSet> {
        model
            .fields
            .iter()
            .map(|f| (f.name.clone(), FieldSchemaSet::for_field(f)))
            .collect()
    }

    fn member() -> ModelDef {
        ModelDef::new("Member")
            .with_field(FieldDef::string("email"))
            .with_field(FieldDef::string("orgId"))
            .with_field(FieldDef::string("handle").unique())
            .with_compound_id(CompoundConstraint::new(["email", "orgId"]))
    }

    #[test]
    fn test_slot_order() {
        let unique = collect_unique_slots(&member());
        assert_eq!(unique.names(), vec!["handle", "email_orgId"]);
        assert!(unique.collisions.is_empty());
    }

    #[test]
    fn test_compound_slot() {
        let model = member();
        let (_, schema) = build_where_unique(&model, &sets(&model), KeyPolicy::Strict);

        let payload = json!({"email_orgId": {"email": "a@b.com", "orgId": "o1"}});
        assert_eq!(schema.parse(&payload).unwrap(), payload);

        let failure = schema.parse(&json!({"email_orgId": {"email": "a@b.com"}})).unwrap_err();
        assert_eq!(failure.issues()[0].path_string(), "email_orgId.orgId");
    }

    #[test]
    fn test_missing_identifier() {
        let model = member();
        let (_, schema) = build_where_unique(&model, &sets(&model), KeyPolicy::Strict);

        let failure = schema.parse(&json!({})).unwrap_err();
        assert!(failure.is_missing_unique_identifier());
        assert_eq!(
            failure.issues()[0].code,
            IssueCode::MissingUniqueIdentifier {
                expected: vec!["handle".into(), "email_orgId".into()],
            }
        );
    }

    #[test]
    fn test_first_registration_wins() {
        let model = member()
            .with_compound_unique(CompoundConstraint::named("email_orgId", ["orgId", "email"]))
            .with_compound_unique(CompoundConstraint::named("handle", ["email"]));
        let unique = collect_unique_slots(&model);

        assert_eq!(unique.names(), vec!["handle", "email_orgId"]);
        assert_eq!(unique.collisions, vec!["email_orgId", "handle"]);
        assert_eq!(unique.slots[1].fields, vec!["email", "orgId"]);
    }
}
