mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use assetflow_api::{
    entities::{asset::CheckoutTargetType, custom_field::CustomFieldFormat},
    errors::ServiceError,
    services::bulk_assets::BulkAction,
};

use common::*;

#[tokio::test]
async fn edit_action_collects_models_and_their_custom_fields() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let status = create_test_status(db, "In Use", true).await;
    let fieldset = create_test_fieldset(db, "Laptop fields").await;
    create_test_custom_field(db, "RAM", "edit_ram", CustomFieldFormat::Numeric, fieldset.id).await;
    create_test_custom_field(db, "IMEI", "edit_imei", CustomFieldFormat::Any, fieldset.id).await;

    let laptop_model = create_test_model(db, "Laptop", Some(fieldset.id)).await;
    let plain_model = create_test_model(db, "Monitor", None).await;
    let unrelated_model = create_test_model(db, "Printer", None).await;

    let laptop = create_test_asset(db, "LAP", laptop_model.id, status.id).await;
    let monitor = create_test_asset(db, "MON", plain_model.id, status.id).await;
    // Parked on a model nothing in the selection uses
    create_test_asset(db, "PRN", unrelated_model.id, status.id).await;

    let selection = ctx
        .service
        .bulk_edit_view(vec![laptop.id, monitor.id, laptop.id], BulkAction::Edit)
        .await
        .expect("bulk edit view");

    assert_eq!(selection.action, BulkAction::Edit);
    // The duplicated id resolves to a single asset
    assert_eq!(selection.assets.len(), 2);
    assert!(!selection.status_labels.is_empty());

    let model_ids: Vec<Uuid> = selection.models.iter().map(|m| m.id).collect();
    assert_eq!(model_ids.len(), 2);
    assert!(model_ids.contains(&laptop_model.id));
    assert!(model_ids.contains(&plain_model.id));
    assert!(!model_ids.contains(&unrelated_model.id));

    // Only the fieldset-carrying model contributes custom fields
    assert_eq!(selection.custom_fields.len(), 2);
    assert!(selection
        .custom_fields
        .iter()
        .all(|field| field.fieldset_id == fieldset.id));
}

#[tokio::test]
async fn labels_action_returns_just_the_asset_list() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let status = create_test_status(db, "In Use", true).await;
    let model = create_test_model(db, "Scanner", None).await;
    let asset = create_test_asset(db, "SCN", model.id, status.id).await;

    let selection = ctx
        .service
        .bulk_edit_view(vec![asset.id], BulkAction::Labels)
        .await
        .expect("bulk edit view");

    assert_eq!(selection.assets.len(), 1);
    assert!(selection.status_labels.is_empty());
    assert!(selection.models.is_empty());
    assert!(selection.custom_fields.is_empty());
}

#[tokio::test]
async fn checkin_action_adds_status_labels_to_the_list() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let status = create_test_status(db, "In Use", true).await;
    let model = create_test_model(db, "Tablet", None).await;
    let asset = create_test_asset(db, "TAB", model.id, status.id).await;

    let selection = ctx
        .service
        .bulk_edit_view(vec![asset.id], BulkAction::Checkin)
        .await
        .expect("bulk edit view");

    assert_eq!(selection.assets.len(), 1);
    assert!(!selection.status_labels.is_empty());
    assert!(selection.models.is_empty());
    assert!(selection.custom_fields.is_empty());
}

#[tokio::test]
async fn restore_action_includes_soft_deleted_assets() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();

    let status = create_test_status(db, "In Use", true).await;
    let model = create_test_model(db, "Phone", None).await;

    let mut fixture = asset_fixture("GONE", model.id, status.id);
    fixture.deleted_at = Set(Some(Utc::now()));
    let gone = fixture.insert(db).await.expect("insert deleted asset");
    let live = create_test_asset(db, "LIVE", model.id, status.id).await;

    let restore = ctx
        .service
        .bulk_edit_view(vec![gone.id, live.id], BulkAction::Restore)
        .await
        .expect("bulk edit view");
    assert_eq!(restore.assets.len(), 2);

    // Every other action skips the deleted row
    let labels = ctx
        .service
        .bulk_edit_view(vec![gone.id, live.id], BulkAction::Labels)
        .await
        .expect("bulk edit view");
    let ids: Vec<Uuid> = labels.assets.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![live.id]);
}

#[tokio::test]
async fn an_empty_selection_cannot_be_staged() {
    let ctx = TestContext::new().await;

    let err = ctx
        .service
        .bulk_edit_view(Vec::new(), BulkAction::Labels)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::BadRequest(_));
}

#[tokio::test]
async fn checkout_form_names_every_target_type() {
    let ctx = TestContext::new().await;

    let view = ctx.service.checkout_form().await.expect("checkout form");

    assert_eq!(
        view.target_types,
        vec![
            CheckoutTargetType::User,
            CheckoutTargetType::Location,
            CheckoutTargetType::Asset,
        ]
    );
    // The migrations seed at least one status label
    assert!(!view.status_labels.is_empty());
}
