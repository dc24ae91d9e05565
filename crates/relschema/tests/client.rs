//! Integration tests for the client API.

use pretty_assertions::assert_eq;
use relschema::{
    Client, CompoundConstraint, EngineConfig, Error, FieldDef, IssueCode, ModelDef, Operation,
    RelationDef,
};
use serde_json::json;

fn shop() -> Client {
    let client = Client::new(EngineConfig::default());

    client
        .declare(
            ModelDef::new("Order")
                .with_field(FieldDef::int("id").id())
                .with_field(FieldDef::int("customerId"))
                .with_field(FieldDef::decimal("total"))
                .with_field(
                    FieldDef::enumeration("status", "OrderStatus", ["PENDING", "PAID"])
                        .with_default("PENDING"),
                )
                .with_relation(
                    RelationDef::many_to_one("customer", client.resolver("Customer"))
                        .with_foreign_key("customerId"),
                )
                .with_relation(
                    RelationDef::one_to_many("lines", client.resolver("OrderLine"))
                        .with_foreign_key("orderId"),
                ),
        )
        .unwrap();

    client
        .declare(
            ModelDef::new("OrderLine")
                .with_field(FieldDef::int("orderId"))
                .with_field(FieldDef::string("sku"))
                .with_field(FieldDef::int("quantity").with_default(1))
                .with_compound_id(CompoundConstraint::new(["orderId", "sku"]))
                .with_relation(
                    RelationDef::many_to_one("order", client.resolver("Order"))
                        .with_foreign_key("orderId"),
                ),
        )
        .unwrap();

    client
        .declare(
            ModelDef::new("Customer")
                .with_field(FieldDef::int("id").id())
                .with_field(FieldDef::string("email").unique())
                .with_relation(
                    RelationDef::one_to_many("orders", client.resolver("Order"))
                        .with_foreign_key("customerId"),
                ),
        )
        .unwrap();

    client
}

#[test]
fn test_hydrate_and_validate() {
    let client = shop();
    let report = client.hydrate().unwrap();
    assert_eq!(report.models, 3);
    assert_eq!(report.relations, 4);

    let parsed = client
        .validate(
            "Order",
            Operation::Create,
            &json!({
                "data": {
                    "id": 1,
                    "total": "19.90",
                    "customer": {"connect": {"email": "a@x.io"}},
                    "lines": {"create": [{"sku": "A-1"}, {"sku": "B-2", "quantity": 3}]},
                },
            }),
        )
        .unwrap();
    assert_eq!(
        parsed["data"]["lines"]["create"],
        json!([{"sku": "A-1", "quantity": 1}, {"sku": "B-2", "quantity": 3}])
    );
    assert_eq!(parsed["data"]["status"], json!("PENDING"));
}

#[test]
fn test_validate_by_operation_name() {
    let client = shop();

    let parsed = client
        .validate_named(
            "OrderLine",
            "findUniqueOrThrow",
            &json!({"where": {"orderId_sku": {"orderId": 1, "sku": "A-1"}}}),
        )
        .unwrap();
    assert_eq!(
        parsed,
        json!({"where": {"orderId_sku": {"orderId": 1, "sku": "A-1"}}})
    );

    assert!(matches!(
        client.validate_named("OrderLine", "findEverything", &json!({})),
        Err(Error::Core(relschema::engine::Error::UnknownOperation(_)))
    ));
}

#[test]
fn test_validation_error_carries_issues() {
    let client = shop();

    let err = client
        .validate("Customer", Operation::FindUnique, &json!({"where": {}}))
        .unwrap_err();
    let failure = err.validation_failure().unwrap();
    assert_eq!(
        failure.issues()[0].code,
        IssueCode::MissingUniqueIdentifier {
            expected: vec!["id".into(), "email".into()],
        }
    );
    assert!(err.to_string().starts_with("invalid findUnique arguments for model 'Customer'"));
}

#[test]
fn test_unknown_model() {
    let client = shop();
    assert!(matches!(
        client.validate("Invoice", Operation::FindMany, &json!({})),
        Err(Error::Core(relschema::engine::Error::UnknownModel(name))) if name == "Invoice"
    ));
}

#[test]
fn test_group_by_having() {
    let client = shop();

    let parsed = client
        .validate(
            "Order",
            Operation::GroupBy,
            &json!({
                "by": "customerId",
                "_sum": {"total": true},
                "having": {"total": {"_sum": {"gte": 100}}},
            }),
        )
        .unwrap();
    assert_eq!(parsed["by"], json!(["customerId"]));

    let err = client
        .validate("Order", Operation::GroupBy, &json!({"by": ["region"]}))
        .unwrap_err();
    assert!(err.validation_failure().unwrap().is_invalid_field_reference());
}

#[test]
fn test_declare_after_hydrate_fails() {
    let client = shop();
    client.hydrate().unwrap();

    let err = client
        .declare(ModelDef::new("Coupon").with_field(FieldDef::string("code").id()))
        .unwrap_err();
    assert!(matches!(err, Error::Core(relschema::engine::Error::RegistrySealed)));
}
