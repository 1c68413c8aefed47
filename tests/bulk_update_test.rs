mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;
use uuid::Uuid;

use assetflow_api::{
    entities::{
        action_log::{self, ActionType},
        asset,
        custom_field::CustomFieldFormat,
    },
    errors::ServiceError,
    events::Event,
    services::bulk_assets::CompanyAssignment,
};

use common::*;

#[tokio::test]
async fn updates_fields_and_records_a_diff_per_asset() {
    let mut ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let repair = create_test_status(db, "Repair", false).await;
    let model = create_test_model(db, "Laptop", None).await;
    let first = create_test_asset(db, "LAP", model.id, ready.id).await;
    let second = create_test_asset(db, "LAP", model.id, ready.id).await;
    let actor = Uuid::new_v4();

    let mut input = update_input(vec![first.id, second.id]);
    input.status_id = Some(repair.id);
    input.order_number = Some("PO-7781".to_string());
    input.warranty_months = Some(24);

    let summary = ctx
        .service
        .bulk_update(Some(actor), input)
        .await
        .expect("bulk update");

    assert_eq!(summary.matched, 2);
    assert_eq!(summary.updated, 2);
    assert!(summary.errors.is_empty());

    let reloaded = asset::Entity::find_by_id(first.id)
        .one(db)
        .await
        .expect("reload asset")
        .expect("asset present");
    assert_eq!(reloaded.status_id, repair.id);
    assert_eq!(reloaded.order_number.as_deref(), Some("PO-7781"));
    assert_eq!(reloaded.warranty_months, Some(24));

    let logs = action_log::Entity::find()
        .filter(action_log::Column::ItemId.eq(first.id))
        .filter(action_log::Column::ActionType.eq(ActionType::Update))
        .all(db)
        .await
        .expect("load action logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].user_id, Some(actor));

    let meta = logs[0].log_meta.clone().expect("diff recorded");
    assert_eq!(meta["status_id"]["old"], json!(ready.id));
    assert_eq!(meta["status_id"]["new"], json!(repair.id));
    assert_eq!(meta["order_number"]["new"], json!("PO-7781"));

    let updated_events = ctx
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, Event::AssetUpdated(_)))
        .count();
    assert_eq!(updated_events, 2);
}

#[tokio::test]
async fn unchanged_values_write_nothing() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let model = create_test_model(db, "Monitor", None).await;
    let mut fixture = asset_fixture("MON", model.id, ready.id);
    fixture.order_number = Set(Some("PO-1".to_string()));
    let existing = fixture.insert(db).await.expect("insert asset");

    let mut input = update_input(vec![existing.id]);
    input.order_number = Some("PO-1".to_string());

    let summary = ctx
        .service
        .bulk_update(None, input)
        .await
        .expect("bulk update");

    assert_eq!(summary.matched, 1);
    assert_eq!(summary.updated, 0);

    let logs = action_log::Entity::find()
        .filter(action_log::Column::ItemId.eq(existing.id))
        .all(db)
        .await
        .expect("load action logs");
    assert!(logs.is_empty());
}

#[tokio::test]
async fn purchase_cost_updates_and_lands_in_the_diff() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let model = create_test_model(db, "Switch", None).await;
    let existing = create_test_asset(db, "SWI", model.id, ready.id).await;

    let mut input = update_input(vec![existing.id]);
    input.purchase_cost = Some(dec!(1499.90));

    let summary = ctx
        .service
        .bulk_update(None, input)
        .await
        .expect("bulk update");
    assert_eq!(summary.updated, 1);

    let reloaded = asset::Entity::find_by_id(existing.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.purchase_cost, Some(dec!(1499.90)));

    let logs = action_log::Entity::find()
        .filter(action_log::Column::ItemId.eq(existing.id))
        .all(db)
        .await
        .expect("load action logs");
    assert_eq!(logs.len(), 1);
    let meta = logs[0].log_meta.clone().expect("diff recorded");
    // Decimals serialize as strings in the diff
    assert_eq!(meta["purchase_cost"]["new"], json!("1499.90"));
}

#[tokio::test]
async fn company_can_be_cleared_or_assigned() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let model = create_test_model(db, "Phone", None).await;
    let company = create_test_company(db, "Initech").await;

    let mut fixture = asset_fixture("PHN", model.id, ready.id);
    fixture.company_id = Set(Some(company.id));
    let owned = fixture.insert(db).await.expect("insert asset");
    let unowned = create_test_asset(db, "PHN", model.id, ready.id).await;

    let mut clear = update_input(vec![owned.id]);
    clear.company_id = Some(CompanyAssignment::Clear);
    ctx.service
        .bulk_update(None, clear)
        .await
        .expect("clear company");

    let reloaded = asset::Entity::find_by_id(owned.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.company_id, None);

    let mut assign = update_input(vec![unowned.id]);
    assign.company_id = Some(CompanyAssignment::Assign(company.id));
    ctx.service
        .bulk_update(None, assign)
        .await
        .expect("assign company");

    let reloaded = asset::Entity::find_by_id(unowned.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.company_id, Some(company.id));
}

#[tokio::test]
async fn null_checkboxes_clear_date_fields() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let model = create_test_model(db, "Tablet", None).await;

    let mut fixture = asset_fixture("TAB", model.id, ready.id);
    fixture.purchase_date = Set(NaiveDate::from_ymd_opt(2023, 1, 10));
    fixture.expected_checkin = Set(NaiveDate::from_ymd_opt(2024, 6, 1));
    fixture.next_audit_date = Set(NaiveDate::from_ymd_opt(2025, 3, 15));
    let existing = fixture.insert(db).await.expect("insert asset");

    let mut input = update_input(vec![existing.id]);
    input.null_purchase_date = true;
    input.null_expected_checkin_date = true;
    input.null_next_audit_date = true;
    // A provided date loses to its null checkbox
    input.purchase_date = NaiveDate::from_ymd_opt(2020, 1, 1);

    let summary = ctx
        .service
        .bulk_update(None, input)
        .await
        .expect("bulk update");
    assert_eq!(summary.updated, 1);

    let reloaded = asset::Entity::find_by_id(existing.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.purchase_date, None);
    assert_eq!(reloaded.expected_checkin, None);
    assert_eq!(reloaded.next_audit_date, None);
}

#[tokio::test]
async fn default_location_update_can_move_the_asset_too() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let model = create_test_model(db, "Printer", None).await;
    let warehouse = create_test_location(db, "Warehouse", None).await;
    let staying = create_test_asset(db, "PRN", model.id, ready.id).await;
    let moving = create_test_asset(db, "PRN", model.id, ready.id).await;

    let mut input = update_input(vec![staying.id]);
    input.rtd_location_id = Some(warehouse.id);
    ctx.service
        .bulk_update(None, input)
        .await
        .expect("update default location");

    let reloaded = asset::Entity::find_by_id(staying.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.rtd_location_id, Some(warehouse.id));
    assert_eq!(reloaded.location_id, None);

    let mut input = update_input(vec![moving.id]);
    input.rtd_location_id = Some(warehouse.id);
    input.update_real_location = true;
    ctx.service
        .bulk_update(None, input)
        .await
        .expect("update both locations");

    let reloaded = asset::Entity::find_by_id(moving.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.rtd_location_id, Some(warehouse.id));
    assert_eq!(reloaded.location_id, Some(warehouse.id));
}

#[tokio::test]
async fn custom_field_values_validate_against_the_model_fieldset() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let fieldset = create_test_fieldset(db, "Hardware").await;
    let ram_column = unique("ram_gb");
    let email_column = unique("support_email");
    create_test_custom_field(db, "RAM", &ram_column, CustomFieldFormat::Numeric, fieldset.id).await;
    create_test_custom_field(
        db,
        "Support Email",
        &email_column,
        CustomFieldFormat::Email,
        fieldset.id,
    )
    .await;
    let model = create_test_model(db, "Server", Some(fieldset.id)).await;
    let existing = create_test_asset(db, "SRV", model.id, ready.id).await;

    let mut input = update_input(vec![existing.id]);
    input.custom_fields.insert(ram_column.clone(), "64".to_string());
    input
        .custom_fields
        .insert(email_column.clone(), "not-an-email".to_string());

    let summary = ctx
        .service
        .bulk_update(None, input)
        .await
        .expect("bulk update");

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.errors, vec!["Support Email".to_string()]);

    let reloaded = asset::Entity::find_by_id(existing.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.custom_fields[&ram_column], json!("64"));
    assert!(reloaded.custom_fields.get(&email_column).is_none());
}

#[tokio::test]
async fn empty_custom_field_value_clears_the_key() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let fieldset = create_test_fieldset(db, "Hardware").await;
    let os_column = unique("os");
    create_test_custom_field(db, "OS", &os_column, CustomFieldFormat::Any, fieldset.id).await;
    let model = create_test_model(db, "Desktop", Some(fieldset.id)).await;

    let mut fixture = asset_fixture("DSK", model.id, ready.id);
    fixture.custom_fields = Set(json!({ os_column.clone(): "Ubuntu 22.04" }));
    let existing = fixture.insert(db).await.expect("insert asset");

    let mut input = update_input(vec![existing.id]);
    input.custom_fields.insert(os_column.clone(), "".to_string());

    let summary = ctx
        .service
        .bulk_update(None, input)
        .await
        .expect("bulk update");
    assert_eq!(summary.updated, 1);

    let reloaded = asset::Entity::find_by_id(existing.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert!(reloaded.custom_fields.get(&os_column).is_none());
}

#[tokio::test]
async fn unknown_reference_fails_before_touching_assets() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let model = create_test_model(db, "Camera", None).await;
    let existing = create_test_asset(db, "CAM", model.id, ready.id).await;

    let mut input = update_input(vec![existing.id]);
    input.status_id = Some(Uuid::new_v4());
    input.order_number = Some("PO-9".to_string());

    let err = ctx
        .service
        .bulk_update(None, input)
        .await
        .expect_err("unknown status must fail");
    assert_matches!(err, ServiceError::NotFound(_));

    let reloaded = asset::Entity::find_by_id(existing.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.order_number, None);
}

#[tokio::test]
async fn deleted_assets_are_not_matched() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let ready = create_test_status(db, "Ready", true).await;
    let model = create_test_model(db, "Scanner", None).await;
    let mut fixture = asset_fixture("SCN", model.id, ready.id);
    fixture.deleted_at = Set(Some(chrono::Utc::now()));
    let removed = fixture.insert(db).await.expect("insert asset");

    let mut input = update_input(vec![removed.id]);
    input.warranty_months = Some(12);

    let summary = ctx
        .service
        .bulk_update(None, input)
        .await
        .expect("bulk update");
    assert_eq!(summary.matched, 0);
    assert_eq!(summary.updated, 0);
}

#[tokio::test]
async fn empty_selection_is_rejected() {
    let ctx = TestContext::new().await;

    let err = ctx
        .service
        .bulk_update(None, update_input(Vec::new()))
        .await
        .expect_err("empty selection must fail");
    assert_matches!(err, ServiceError::BadRequest(_));
}
