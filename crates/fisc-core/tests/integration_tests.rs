//! End-to-end tests across the core subsystems: extraction feeding the
//! document store, gated by the ability engine.

use serde_json::{json, Value};

use fisc_core::ability::{AbilitySet, Action, SubjectKind, SubjectRef};
use fisc_core::ai::{AIClient, MockBackend};
use fisc_core::extract::schema::payslip_schema;
use fisc_core::{Extractor, MediaPayload, Role, Store};

fn attrs(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().unwrap().clone()
}

#[tokio::test]
async fn extraction_result_round_trips_through_store() {
    let store = Store::in_memory().unwrap();
    let extractor = Extractor::new(AIClient::mock());

    let document = MediaPayload::pdf(b"%PDF-1.4 payslip".to_vec());
    let record = extractor
        .extract(&document, &payslip_schema())
        .await
        .unwrap();

    // User confirms; only then is the result persisted.
    let body = Value::Object(record.clone());
    let id = store.write("payslips", &body).unwrap();

    let reloaded = store.get("payslips", id).unwrap().unwrap();
    assert_eq!(reloaded.body, body);
    assert_eq!(reloaded.body.as_object().unwrap(), &record);
}

#[tokio::test]
async fn ability_gates_persisting_extracted_expenses() {
    let store = Store::in_memory().unwrap();
    let owner = store.upsert_user("ana@example.com", "Ana").unwrap();
    let other = store.upsert_user("bob@example.com", "Bob").unwrap();

    let extractor = Extractor::new(AIClient::Mock(MockBackend::with_response(
        r#"[{"amount": -42.10, "date": "2026-07-02", "description": "SUPERMARKET"}]"#,
    )));
    let document = MediaPayload::pdf(b"%PDF-1.4 statement".to_vec());
    let transactions = extractor.extract_statement(&document.bytes).await.unwrap();
    assert_eq!(transactions.len(), 1);

    let abilities = AbilitySet::for_user(Some(&owner));

    // Writing under the owner's own id is permitted.
    let own = attrs(json!({"owner_id": owner.id}));
    assert!(abilities.can(Action::Create, SubjectRef::record(SubjectKind::Expense, &own), None));

    // Writing under someone else's id is not.
    let foreign = attrs(json!({"owner_id": other.id}));
    assert!(!abilities.can(Action::Create, SubjectRef::record(SubjectKind::Expense, &foreign), None));

    let body = json!({
        "owner_id": owner.id,
        "category": "Groceries",
        "description": transactions[0].description,
        "amount": transactions[0].amount,
        "date": transactions[0].date,
    });
    let id = store.write("expenses", &body).unwrap();
    assert_eq!(store.get("expenses", id).unwrap().unwrap().body, body);
}

#[test]
fn superadmin_projection_drives_abilities() {
    let store = Store::in_memory().unwrap();
    let user = store.upsert_user("root@example.com", "Root").unwrap();
    let admin = store.set_user_role(user.id, Role::Superadmin).unwrap();

    let abilities = AbilitySet::for_user(Some(&admin));
    assert!(abilities.can(Action::Create, SubjectRef::kind(SubjectKind::Plan), None));

    let own = attrs(json!({"id": admin.id}));
    assert!(!abilities.can(Action::Delete, SubjectRef::record(SubjectKind::User, &own), None));
}
