#![allow(dead_code)]

use std::{env, sync::Arc};

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde_json::json;
use tokio::sync::{mpsc, OnceCell};
use uuid::Uuid;

use assetflow_api::{
    db::{self, DbPool},
    entities::{
        asset,
        asset::CheckoutTargetType,
        asset_model, checkout_acceptance, company, custom_field,
        custom_field::CustomFieldFormat,
        custom_fieldset, license, license_seat, location, setting, status_label, user,
    },
    events::{Event, EventSender},
    services::bulk_assets::{BulkAssetService, BulkCheckoutInput, BulkUpdateInput},
};

const TEST_JWT_SECRET: &str = "kY3sQ9vTn4xW8mZj2bHc6wRf5gPd7uLa0eNi1oXs4yVq8tKm3rGb5hJd9cWp2zFn";

/// Service harness backed by the process-shared in-memory SQLite database.
/// Fixtures use fresh UUIDs throughout, so tests in the same binary can run
/// in parallel against the shared schema.
pub struct TestContext {
    pub db: Arc<DbPool>,
    pub service: BulkAssetService,
    event_rx: mpsc::Receiver<Event>,
}

impl TestContext {
    pub async fn new() -> Self {
        // A named shared-cache memory database: sqlx maps a plain
        // `sqlite::memory:` URL to a fresh database per pool, so the name is
        // what lets every pool in this process reach the same database.
        env::set_var(
            "APP__DATABASE_URL",
            "sqlite:file:assetflow_tests?mode=memory&cache=shared",
        );
        env::set_var("APP__JWT_SECRET", TEST_JWT_SECRET);

        let db_pool = Arc::new(db::create_db_pool().await.expect("Failed to create DB pool"));

        // Tests in one binary share the in-memory database; run the
        // migrations exactly once per process. The cell keeps the migrating
        // pool alive for the whole process: the shared database is dropped
        // the moment no connection holds it open.
        static MIGRATIONS: OnceCell<Arc<DbPool>> = OnceCell::const_new();
        MIGRATIONS
            .get_or_init(|| async {
                db::run_migrations(db_pool.as_ref())
                    .await
                    .expect("Failed to run migrations");
                db_pool.clone()
            })
            .await;

        let (tx, event_rx) = mpsc::channel(256);
        let service = BulkAssetService::new(db_pool.clone(), Arc::new(EventSender::new(tx)));

        Self {
            db: db_pool,
            service,
            event_rx,
        }
    }

    /// Drain whatever events the service has emitted so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Suffix a fixture label with a UUID so unique columns never collide
/// between tests sharing the database.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// The settings table holds a single row, seeded by the migrations.
/// Rewrite it to the policy this test binary runs under. Tests sharing a
/// binary must agree on the values they pass here, so concurrent callers
/// converge on the same row.
pub async fn ensure_settings(
    db: &DbPool,
    full_multiple_companies_support: bool,
    require_acceptance: bool,
    default_checkin_status_id: Option<Uuid>,
) -> setting::Model {
    match setting::Entity::find().one(db).await.expect("read settings") {
        Some(existing) => {
            let mut active = existing.into_active_model();
            active.full_multiple_companies_support = Set(full_multiple_companies_support);
            active.require_acceptance = Set(require_acceptance);
            active.default_checkin_status_id = Set(default_checkin_status_id);
            active.update(db).await.expect("update settings")
        }
        None => setting::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_multiple_companies_support: Set(full_multiple_companies_support),
            require_acceptance: Set(require_acceptance),
            default_checkin_status_id: Set(default_checkin_status_id),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .expect("seed settings"),
    }
}

pub async fn create_test_status(db: &DbPool, name: &str, deployable: bool) -> status_label::Model {
    status_label::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique(name)),
        deployable: Set(deployable),
        pending: Set(false),
        archived: Set(false),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert status label")
}

pub async fn create_test_model(
    db: &DbPool,
    name: &str,
    fieldset_id: Option<Uuid>,
) -> asset_model::Model {
    asset_model::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique(name)),
        fieldset_id: Set(fieldset_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert asset model")
}

pub async fn create_test_company(db: &DbPool, name: &str) -> company::Model {
    company::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique(name)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert company")
}

pub async fn create_test_location(
    db: &DbPool,
    name: &str,
    company_id: Option<Uuid>,
) -> location::Model {
    location::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique(name)),
        company_id: Set(company_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert location")
}

pub async fn create_test_user(
    db: &DbPool,
    name: &str,
    company_id: Option<Uuid>,
    location_id: Option<Uuid>,
) -> user::Model {
    let username = unique(name);
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.clone()),
        email: Set(format!("{}@example.com", username)),
        first_name: Set(name.to_string()),
        last_name: Set(None),
        location_id: Set(location_id),
        company_id: Set(company_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn create_test_fieldset(db: &DbPool, name: &str) -> custom_fieldset::Model {
    custom_fieldset::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique(name)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert custom fieldset")
}

pub async fn create_test_custom_field(
    db: &DbPool,
    name: &str,
    db_column: &str,
    format: CustomFieldFormat,
    fieldset_id: Uuid,
) -> custom_field::Model {
    custom_field::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        db_column: Set(db_column.to_string()),
        format: Set(format),
        fieldset_id: Set(fieldset_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert custom field")
}

/// Baseline available asset. Tests tweak fields on the returned ActiveModel
/// before inserting when the default shape does not fit.
pub fn asset_fixture(tag_prefix: &str, model_id: Uuid, status_id: Uuid) -> asset::ActiveModel {
    let tag = unique(tag_prefix);
    asset::ActiveModel {
        id: Set(Uuid::new_v4()),
        asset_tag: Set(tag.clone()),
        serial: Set(None),
        name: Set(Some(format!("Asset {}", tag))),
        model_id: Set(model_id),
        status_id: Set(status_id),
        company_id: Set(None),
        location_id: Set(None),
        rtd_location_id: Set(None),
        supplier_id: Set(None),
        assigned_to: Set(None),
        assigned_type: Set(None),
        purchase_date: Set(None),
        purchase_cost: Set(None),
        order_number: Set(None),
        warranty_months: Set(None),
        next_audit_date: Set(None),
        expected_checkin: Set(None),
        last_checkout: Set(None),
        requestable: Set(false),
        notes: Set(None),
        accepted: Set(None),
        custom_fields: Set(json!({})),
        deleted_at: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
}

pub async fn create_test_asset(
    db: &DbPool,
    tag_prefix: &str,
    model_id: Uuid,
    status_id: Uuid,
) -> asset::Model {
    asset_fixture(tag_prefix, model_id, status_id)
        .insert(db)
        .await
        .expect("insert asset")
}

/// An asset currently checked out to the given target.
pub async fn create_assigned_asset(
    db: &DbPool,
    tag_prefix: &str,
    model_id: Uuid,
    status_id: Uuid,
    target_type: CheckoutTargetType,
    target_id: Uuid,
) -> asset::Model {
    let mut fixture = asset_fixture(tag_prefix, model_id, status_id);
    fixture.assigned_to = Set(Some(target_id));
    fixture.assigned_type = Set(Some(target_type));
    fixture.last_checkout = Set(Some(Utc::now()));
    fixture.insert(db).await.expect("insert assigned asset")
}

/// A license seat occupied through the given asset.
pub async fn create_test_license_seat(
    db: &DbPool,
    asset_id: Option<Uuid>,
    assigned_to: Option<Uuid>,
) -> license_seat::Model {
    let license = license::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(unique("License")),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert license");

    license_seat::ActiveModel {
        id: Set(Uuid::new_v4()),
        license_id: Set(license.id),
        assigned_to: Set(assigned_to),
        asset_id: Set(asset_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert license seat")
}

pub async fn create_pending_acceptance(
    db: &DbPool,
    asset_id: Uuid,
    user_id: Uuid,
) -> checkout_acceptance::Model {
    checkout_acceptance::ActiveModel {
        id: Set(Uuid::new_v4()),
        checkoutable_type: Set("asset".to_string()),
        checkoutable_id: Set(asset_id),
        assigned_to_id: Set(user_id),
        accepted_at: Set(None),
        declined_at: Set(None),
        created_at: Set(Utc::now()),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
    .expect("insert checkout acceptance")
}

/// Update input with nothing set besides the selection.
pub fn update_input(ids: Vec<Uuid>) -> BulkUpdateInput {
    BulkUpdateInput {
        ids,
        ..Default::default()
    }
}

/// Checkout input with no target or selection filled in yet.
pub fn checkout_input(target_type: CheckoutTargetType) -> BulkCheckoutInput {
    BulkCheckoutInput {
        target_type,
        assigned_user_id: None,
        assigned_location_id: None,
        assigned_asset_id: None,
        asset_ids: Vec::new(),
        asset_serials: Vec::new(),
        asset_tags: Vec::new(),
        checkout_at: None,
        expected_checkin: None,
        note: None,
    }
}
