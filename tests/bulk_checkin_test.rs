mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use assetflow_api::{
    db::DbPool,
    entities::{
        action_log::{self, ActionType},
        asset,
        asset::CheckoutTargetType,
        checkout_acceptance, license_seat, setting,
    },
    errors::ServiceError,
    events::Event,
    services::bulk_assets::BulkCheckinInput,
};

use common::*;

// Every test in this binary runs under a settings row that names a default
// checkin status. The migrations seed one; the fallback only fires if that
// row ever loses its default.
async fn settings_with_default_status(db: &DbPool) -> setting::Model {
    if let Some(existing) = setting::Entity::find().one(db).await.expect("read settings") {
        if existing.default_checkin_status_id.is_some() {
            return existing;
        }
    }
    let fallback = create_test_status(db, "Ready to Deploy", true).await;
    ensure_settings(db, false, false, Some(fallback.id)).await
}

#[tokio::test]
async fn checkin_clears_assignment_and_returns_to_default_location() {
    let mut ctx = TestContext::new().await;
    let db = ctx.db.as_ref();
    let settings = settings_with_default_status(db).await;
    let default_status = settings
        .default_checkin_status_id
        .expect("default status configured");

    let in_use = create_test_status(db, "In Use", true).await;
    let model = create_test_model(db, "Laptop", None).await;
    let home = create_test_location(db, "IT Storage", None).await;
    let desk = create_test_location(db, "Desk 3", None).await;
    let holder = create_test_user(db, "casey", None, None).await;
    let actor = Uuid::new_v4();

    let mut fixture = asset_fixture("LAP", model.id, in_use.id);
    fixture.assigned_to = Set(Some(holder.id));
    fixture.assigned_type = Set(Some(CheckoutTargetType::User));
    fixture.rtd_location_id = Set(Some(home.id));
    fixture.location_id = Set(Some(desk.id));
    fixture.expected_checkin = Set(chrono::NaiveDate::from_ymd_opt(2026, 12, 1));
    fixture.last_checkout = Set(Some(Utc::now()));
    fixture.accepted = Set(Some("pending".to_string()));
    let laptop = fixture.insert(db).await.expect("insert asset");

    let acceptance = create_pending_acceptance(db, laptop.id, holder.id).await;
    let seat = create_test_license_seat(db, Some(laptop.id), Some(holder.id)).await;

    let summary = ctx
        .service
        .bulk_checkin(
            Some(actor),
            BulkCheckinInput {
                ids: vec![laptop.id],
                note: Some("Returned at offboarding".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("bulk checkin");
    assert_eq!(summary.checked_in, 1);

    let reloaded = asset::Entity::find_by_id(laptop.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.assigned_to, None);
    assert_eq!(reloaded.assigned_type, None);
    assert_eq!(reloaded.expected_checkin, None);
    assert_eq!(reloaded.last_checkout, None);
    assert_eq!(reloaded.accepted, None);
    // Without a requested name the field is cleared
    assert_eq!(reloaded.name, None);
    // Back to the default location, status falls back to the configured one
    assert_eq!(reloaded.location_id, Some(home.id));
    assert_eq!(reloaded.rtd_location_id, Some(home.id));
    assert_eq!(reloaded.status_id, default_status);

    let acceptance = checkout_acceptance::Entity::find_by_id(acceptance.id)
        .one(db)
        .await
        .expect("reload acceptance")
        .expect("acceptance present");
    assert!(acceptance.deleted_at.is_some());

    let seat = license_seat::Entity::find_by_id(seat.id)
        .one(db)
        .await
        .expect("reload seat")
        .expect("seat present");
    assert_eq!(seat.assigned_to, None);
    assert_eq!(seat.asset_id, Some(laptop.id));

    let logs = action_log::Entity::find()
        .filter(action_log::Column::ItemId.eq(laptop.id))
        .filter(action_log::Column::ActionType.eq(ActionType::Checkin))
        .all(db)
        .await
        .expect("load action logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].user_id, Some(actor));
    assert_eq!(logs[0].note.as_deref(), Some("Returned at offboarding"));

    let checkin_events = ctx
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, Event::AssetCheckedIn(_)))
        .count();
    assert_eq!(checkin_events, 1);
}

#[tokio::test]
async fn checkin_honors_explicit_name_status_and_location() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();
    settings_with_default_status(db).await;

    let in_use = create_test_status(db, "In Use", true).await;
    let archived = create_test_status(db, "Archived", false).await;
    let model = create_test_model(db, "Monitor", None).await;
    let home = create_test_location(db, "Storage A", None).await;
    let repair_bench = create_test_location(db, "Repair Bench", None).await;
    let holder = create_test_user(db, "jesse", None, None).await;

    let mut fixture = asset_fixture("MON", model.id, in_use.id);
    fixture.assigned_to = Set(Some(holder.id));
    fixture.assigned_type = Set(Some(CheckoutTargetType::User));
    fixture.rtd_location_id = Set(Some(home.id));
    let kept_default = fixture.insert(db).await.expect("insert asset");

    ctx.service
        .bulk_checkin(
            None,
            BulkCheckinInput {
                ids: vec![kept_default.id],
                name: Some("Spare monitor".to_string()),
                status_id: Some(archived.id),
                location_id: Some(repair_bench.id),
                update_default_location: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("bulk checkin");

    let reloaded = asset::Entity::find_by_id(kept_default.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.name.as_deref(), Some("Spare monitor"));
    assert_eq!(reloaded.status_id, archived.id);
    assert_eq!(reloaded.location_id, Some(repair_bench.id));
    // The default location is untouched unless the request says otherwise
    assert_eq!(reloaded.rtd_location_id, Some(home.id));

    let mut fixture = asset_fixture("MON", model.id, in_use.id);
    fixture.assigned_to = Set(Some(holder.id));
    fixture.assigned_type = Set(Some(CheckoutTargetType::User));
    fixture.rtd_location_id = Set(Some(home.id));
    let moved_default = fixture.insert(db).await.expect("insert asset");

    ctx.service
        .bulk_checkin(
            None,
            BulkCheckinInput {
                ids: vec![moved_default.id],
                location_id: Some(repair_bench.id),
                update_default_location: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("bulk checkin");

    let reloaded = asset::Entity::find_by_id(moved_default.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.location_id, Some(repair_bench.id));
    assert_eq!(reloaded.rtd_location_id, Some(repair_bench.id));
}

#[tokio::test]
async fn checkin_fails_fast_but_earlier_checkins_stick() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();
    settings_with_default_status(db).await;

    let in_use = create_test_status(db, "In Use", true).await;
    let model = create_test_model(db, "Phone", None).await;
    let holder = create_test_user(db, "robin", None, None).await;

    let assigned = create_assigned_asset(
        db,
        "PHN",
        model.id,
        in_use.id,
        CheckoutTargetType::User,
        holder.id,
    )
    .await;
    let never_out = create_test_asset(db, "PHN", model.id, in_use.id).await;

    let err = ctx
        .service
        .bulk_checkin(
            None,
            BulkCheckinInput {
                ids: vec![assigned.id, never_out.id],
                ..Default::default()
            },
        )
        .await
        .expect_err("unassigned asset must fail the request");
    assert_matches!(err, ServiceError::InvalidOperation(_));
    assert!(err.to_string().contains(&never_out.asset_tag));

    // The checkin that ran before the failure is not rolled back
    let reloaded = asset::Entity::find_by_id(assigned.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.assigned_to, None);

    let err = ctx
        .service
        .bulk_checkin(
            None,
            BulkCheckinInput {
                ids: vec![Uuid::new_v4()],
                ..Default::default()
            },
        )
        .await
        .expect_err("unknown asset must fail the request");
    assert_matches!(err, ServiceError::NotFound(_));

    // Soft-deleted assets are unknown to checkin as well
    let mut fixture = asset_fixture("PHN", model.id, in_use.id);
    fixture.assigned_to = Set(Some(holder.id));
    fixture.assigned_type = Set(Some(CheckoutTargetType::User));
    fixture.deleted_at = Set(Some(Utc::now()));
    let removed = fixture.insert(db).await.expect("insert asset");

    let err = ctx
        .service
        .bulk_checkin(
            None,
            BulkCheckinInput {
                ids: vec![removed.id],
                ..Default::default()
            },
        )
        .await
        .expect_err("deleted asset must fail the request");
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn zeroed_legacy_locations_are_treated_as_unset() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();
    settings_with_default_status(db).await;

    let in_use = create_test_status(db, "In Use", true).await;
    let model = create_test_model(db, "Tablet", None).await;
    let desk = create_test_location(db, "Desk 9", None).await;
    let holder = create_test_user(db, "taylor", None, None).await;

    let mut fixture = asset_fixture("TAB", model.id, in_use.id);
    fixture.assigned_to = Set(Some(holder.id));
    fixture.assigned_type = Set(Some(CheckoutTargetType::User));
    fixture.rtd_location_id = Set(Some(Uuid::nil()));
    fixture.location_id = Set(Some(desk.id));
    let imported = fixture.insert(db).await.expect("insert asset");

    ctx.service
        .bulk_checkin(
            None,
            BulkCheckinInput {
                ids: vec![imported.id],
                ..Default::default()
            },
        )
        .await
        .expect("bulk checkin");

    let reloaded = asset::Entity::find_by_id(imported.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.rtd_location_id, None);
    assert_eq!(reloaded.location_id, None);
}

#[tokio::test]
async fn unknown_status_in_request_is_rejected() {
    let ctx = TestContext::new().await;
    let db = ctx.db.as_ref();
    settings_with_default_status(db).await;

    let in_use = create_test_status(db, "In Use", true).await;
    let model = create_test_model(db, "Camera", None).await;
    let holder = create_test_user(db, "dana", None, None).await;
    let camera = create_assigned_asset(
        db,
        "CAM",
        model.id,
        in_use.id,
        CheckoutTargetType::User,
        holder.id,
    )
    .await;

    let err = ctx
        .service
        .bulk_checkin(
            None,
            BulkCheckinInput {
                ids: vec![camera.id],
                status_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
        )
        .await
        .expect_err("unknown status must fail");
    assert_matches!(err, ServiceError::NotFound(_));

    let reloaded = asset::Entity::find_by_id(camera.id)
        .one(db)
        .await
        .expect("reload")
        .expect("asset present");
    assert_eq!(reloaded.assigned_to, Some(holder.id));
}
