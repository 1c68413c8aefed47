use crate::{
    db::DbPool,
    entities::{
        action_log::{self, ActionType},
        asset::{self, CheckoutTargetType},
        asset_model, checkout_acceptance, company, custom_field,
        custom_field::CustomFieldFormat,
        license_seat, location, setting, status_label, user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{sea_query::Expr, Set, TransactionTrait, *};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

pub struct BulkAssetService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl BulkAssetService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Load the selected assets together with the reference data the
    /// requested bulk action needs
    pub async fn bulk_edit_view(
        &self,
        ids: Vec<Uuid>,
        action: BulkAction,
    ) -> Result<BulkEditSelection, ServiceError> {
        let db = self.db_pool.as_ref();

        if ids.is_empty() {
            return Err(ServiceError::BadRequest("No assets selected".to_string()));
        }
        let ids = dedupe(ids);

        let mut query = asset::Entity::find().filter(asset::Column::Id.is_in(ids));
        // Restore works on soft-deleted assets, every other action skips them
        if action != BulkAction::Restore {
            query = query.filter(asset::Column::DeletedAt.is_null());
        }
        let assets = query.all(db).await.map_err(ServiceError::db_error)?;

        let mut selection = BulkEditSelection {
            action,
            assets,
            status_labels: Vec::new(),
            models: Vec::new(),
            custom_fields: Vec::new(),
        };

        // Edit and checkin both offer a status picker
        if matches!(action, BulkAction::Edit | BulkAction::Checkin) {
            selection.status_labels = status_label::Entity::find()
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;
        }

        // Edit also needs the distinct models of the selection and the
        // custom fields their fieldsets define
        if action == BulkAction::Edit {
            let model_ids: Vec<Uuid> = dedupe(selection.assets.iter().map(|a| a.model_id).collect());
            selection.models = asset_model::Entity::find()
                .filter(asset_model::Column::Id.is_in(model_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;

            let fieldset_ids: Vec<Uuid> = selection
                .models
                .iter()
                .filter_map(|model| model.fieldset_id)
                .collect();
            if !fieldset_ids.is_empty() {
                selection.custom_fields = custom_field::Entity::find()
                    .filter(custom_field::Column::FieldsetId.is_in(fieldset_ids))
                    .all(db)
                    .await
                    .map_err(ServiceError::db_error)?;
            }
        }

        Ok(selection)
    }

    /// Apply the provided field values to every selected asset, recording a
    /// per-asset change diff in the action log
    pub async fn bulk_update(
        &self,
        actor_id: Option<Uuid>,
        input: BulkUpdateInput,
    ) -> Result<BulkUpdateSummary, ServiceError> {
        let db = self.db_pool.as_ref();

        if input.ids.is_empty() {
            return Err(ServiceError::BadRequest("No assets selected".to_string()));
        }
        let ids = dedupe(input.ids.clone());
        info!("Bulk updating {} assets", ids.len());

        self.validate_update_references(db, &input).await?;

        let assets = asset::Entity::find()
            .filter(asset::Column::Id.is_in(ids))
            .filter(asset::Column::DeletedAt.is_null())
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Custom fields apply per asset, through the fieldset of the model
        // the asset will have after this update
        let fields_by_fieldset = self.load_custom_fields(db, &input, &assets).await?;

        let matched = assets.len();
        let mut updated = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for current in assets {
            let mut active = current.clone().into_active_model();
            let mut changed = serde_json::Map::new();

            if let Some(model_id) = input.model_id {
                if current.model_id != model_id {
                    changed.insert(
                        "model_id".to_string(),
                        json!({ "old": current.model_id, "new": model_id }),
                    );
                    active.model_id = Set(model_id);
                }
            }

            if let Some(status_id) = input.status_id {
                if current.status_id != status_id {
                    changed.insert(
                        "status_id".to_string(),
                        json!({ "old": current.status_id, "new": status_id }),
                    );
                    active.status_id = Set(status_id);
                }
            }

            if input.null_purchase_date {
                if current.purchase_date.is_some() {
                    changed.insert(
                        "purchase_date".to_string(),
                        json!({ "old": current.purchase_date, "new": null }),
                    );
                    active.purchase_date = Set(None);
                }
            } else if let Some(purchase_date) = input.purchase_date {
                if current.purchase_date != Some(purchase_date) {
                    changed.insert(
                        "purchase_date".to_string(),
                        json!({ "old": current.purchase_date, "new": purchase_date }),
                    );
                    active.purchase_date = Set(Some(purchase_date));
                }
            }

            if input.null_expected_checkin_date {
                if current.expected_checkin.is_some() {
                    changed.insert(
                        "expected_checkin".to_string(),
                        json!({ "old": current.expected_checkin, "new": null }),
                    );
                    active.expected_checkin = Set(None);
                }
            } else if let Some(expected_checkin) = input.expected_checkin {
                if current.expected_checkin != Some(expected_checkin) {
                    changed.insert(
                        "expected_checkin".to_string(),
                        json!({ "old": current.expected_checkin, "new": expected_checkin }),
                    );
                    active.expected_checkin = Set(Some(expected_checkin));
                }
            }

            if input.null_next_audit_date {
                if current.next_audit_date.is_some() {
                    changed.insert(
                        "next_audit_date".to_string(),
                        json!({ "old": current.next_audit_date, "new": null }),
                    );
                    active.next_audit_date = Set(None);
                }
            } else if let Some(next_audit_date) = input.next_audit_date {
                if current.next_audit_date != Some(next_audit_date) {
                    changed.insert(
                        "next_audit_date".to_string(),
                        json!({ "old": current.next_audit_date, "new": next_audit_date }),
                    );
                    active.next_audit_date = Set(Some(next_audit_date));
                }
            }

            if let Some(purchase_cost) = input.purchase_cost {
                if current.purchase_cost != Some(purchase_cost) {
                    changed.insert(
                        "purchase_cost".to_string(),
                        json!({ "old": current.purchase_cost, "new": purchase_cost }),
                    );
                    active.purchase_cost = Set(Some(purchase_cost));
                }
            }

            if let Some(order_number) = &input.order_number {
                if current.order_number.as_deref() != Some(order_number.as_str()) {
                    changed.insert(
                        "order_number".to_string(),
                        json!({ "old": current.order_number, "new": order_number }),
                    );
                    active.order_number = Set(Some(order_number.clone()));
                }
            }

            if let Some(warranty_months) = input.warranty_months {
                if current.warranty_months != Some(warranty_months) {
                    changed.insert(
                        "warranty_months".to_string(),
                        json!({ "old": current.warranty_months, "new": warranty_months }),
                    );
                    active.warranty_months = Set(Some(warranty_months));
                }
            }

            if let Some(requestable) = input.requestable {
                if current.requestable != requestable {
                    changed.insert(
                        "requestable".to_string(),
                        json!({ "old": current.requestable, "new": requestable }),
                    );
                    active.requestable = Set(requestable);
                }
            }

            if let Some(supplier_id) = input.supplier_id {
                if current.supplier_id != Some(supplier_id) {
                    changed.insert(
                        "supplier_id".to_string(),
                        json!({ "old": current.supplier_id, "new": supplier_id }),
                    );
                    active.supplier_id = Set(Some(supplier_id));
                }
            }

            if let Some(assignment) = input.company_id {
                let target = match assignment {
                    CompanyAssignment::Clear => None,
                    CompanyAssignment::Assign(company_id) => Some(company_id),
                };
                if current.company_id != target {
                    changed.insert(
                        "company_id".to_string(),
                        json!({ "old": current.company_id, "new": target }),
                    );
                    active.company_id = Set(target);
                }
            }

            if let Some(rtd_location_id) = input.rtd_location_id {
                if current.rtd_location_id != Some(rtd_location_id) {
                    changed.insert(
                        "rtd_location_id".to_string(),
                        json!({ "old": current.rtd_location_id, "new": rtd_location_id }),
                    );
                    active.rtd_location_id = Set(Some(rtd_location_id));
                }
                // Optionally move the asset itself, not just its default
                if input.update_real_location && current.location_id != Some(rtd_location_id) {
                    changed.insert(
                        "location_id".to_string(),
                        json!({ "old": current.location_id, "new": rtd_location_id }),
                    );
                    active.location_id = Set(Some(rtd_location_id));
                }
            }

            if !input.custom_fields.is_empty() {
                let effective_model = input.model_id.unwrap_or(current.model_id);
                let applicable = fields_by_fieldset
                    .get(&effective_model)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let mut values = current
                    .custom_fields
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                let mut dirty = false;

                for field in applicable {
                    let Some(raw) = input.custom_fields.get(&field.db_column) else {
                        continue;
                    };
                    if raw.trim().is_empty() {
                        if let Some(old) = values.remove(&field.db_column) {
                            changed.insert(
                                field.db_column.clone(),
                                json!({ "old": old, "new": null }),
                            );
                            dirty = true;
                        }
                        continue;
                    }
                    if !validate_custom_value(field.format, raw) {
                        if !errors.contains(&field.name) {
                            errors.push(field.name.clone());
                        }
                        continue;
                    }
                    let new_value = serde_json::Value::String(raw.clone());
                    if values.get(&field.db_column) != Some(&new_value) {
                        changed.insert(
                            field.db_column.clone(),
                            json!({ "old": values.get(&field.db_column), "new": raw }),
                        );
                        values.insert(field.db_column.clone(), new_value);
                        dirty = true;
                    }
                }

                if dirty {
                    active.custom_fields = Set(serde_json::Value::Object(values));
                }
            }

            if changed.is_empty() {
                continue;
            }

            action_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                action_type: Set(ActionType::Update),
                item_type: Set("asset".to_string()),
                item_id: Set(current.id),
                target_type: Set(None),
                target_id: Set(None),
                user_id: Set(actor_id),
                note: Set(None),
                log_meta: Set(Some(serde_json::Value::Object(changed))),
                created_at: Set(Utc::now()),
            }
            .insert(db)
            .await
            .map_err(ServiceError::db_error)?;

            active.update(db).await.map_err(ServiceError::db_error)?;
            updated.push(current.id);
        }

        for asset_id in &updated {
            self.event_sender
                .send(Event::AssetUpdated(*asset_id))
                .await
                .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;
        }

        info!(
            "Bulk update touched {} of {} matched assets",
            updated.len(),
            matched
        );

        Ok(BulkUpdateSummary {
            matched,
            updated: updated.len(),
            errors,
        })
    }

    /// Soft delete the selected assets, clearing any assignment they carry
    pub async fn bulk_delete(
        &self,
        actor_id: Option<Uuid>,
        ids: Vec<Uuid>,
    ) -> Result<BulkDeleteSummary, ServiceError> {
        let db = self.db_pool.as_ref();

        if ids.is_empty() {
            return Err(ServiceError::BadRequest("No assets selected".to_string()));
        }
        let ids = dedupe(ids);

        let assets = asset::Entity::find()
            .filter(asset::Column::Id.is_in(ids))
            .filter(asset::Column::DeletedAt.is_null())
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let now = Utc::now();
        let mut deleted = 0;

        for current in assets {
            let mut active = current.clone().into_active_model();
            active.deleted_at = Set(Some(now));
            active.assigned_to = Set(None);
            active.assigned_type = Set(None);
            active.update(db).await.map_err(ServiceError::db_error)?;

            action_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                action_type: Set(ActionType::Delete),
                item_type: Set("asset".to_string()),
                item_id: Set(current.id),
                target_type: Set(None),
                target_id: Set(None),
                user_id: Set(actor_id),
                note: Set(None),
                log_meta: Set(None),
                created_at: Set(now),
            }
            .insert(db)
            .await
            .map_err(ServiceError::db_error)?;

            self.event_sender
                .send(Event::AssetDeleted(current.id))
                .await
                .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

            deleted += 1;
        }

        info!("Soft deleted {} assets", deleted);
        Ok(BulkDeleteSummary { deleted })
    }

    /// Bring soft-deleted assets back. A selected id that matches no asset
    /// at all fails the request; restores applied before the failure stick.
    pub async fn bulk_restore(
        &self,
        actor_id: Option<Uuid>,
        ids: Vec<Uuid>,
    ) -> Result<BulkRestoreSummary, ServiceError> {
        let db = self.db_pool.as_ref();

        if ids.is_empty() {
            return Err(ServiceError::BadRequest("No assets selected".to_string()));
        }
        let ids = dedupe(ids);

        let mut restored = 0;

        for asset_id in ids {
            let current = asset::Entity::find_by_id(asset_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Asset {} does not exist", asset_id))
                })?;

            if current.deleted_at.is_none() {
                continue;
            }

            let mut active = current.clone().into_active_model();
            active.deleted_at = Set(None);
            active.update(db).await.map_err(ServiceError::db_error)?;

            action_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                action_type: Set(ActionType::Restore),
                item_type: Set("asset".to_string()),
                item_id: Set(current.id),
                target_type: Set(None),
                target_id: Set(None),
                user_id: Set(actor_id),
                note: Set(None),
                log_meta: Set(None),
                created_at: Set(Utc::now()),
            }
            .insert(db)
            .await
            .map_err(ServiceError::db_error)?;

            self.event_sender
                .send(Event::AssetRestored(current.id))
                .await
                .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

            restored += 1;
        }

        info!("Restored {} assets", restored);
        Ok(BulkRestoreSummary { restored })
    }

    /// Reference data for the bulk checkout form
    pub async fn checkout_form(&self) -> Result<CheckoutFormView, ServiceError> {
        let db = self.db_pool.as_ref();

        let status_labels = status_label::Entity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(CheckoutFormView {
            target_types: vec![
                CheckoutTargetType::User,
                CheckoutTargetType::Location,
                CheckoutTargetType::Asset,
            ],
            status_labels,
        })
    }

    /// Check the selected assets out to a user, location or another asset.
    /// Validation happens up front; the writes run in one transaction so a
    /// failure on any asset leaves none of them checked out.
    pub async fn bulk_checkout(
        &self,
        actor_id: Option<Uuid>,
        input: BulkCheckoutInput,
    ) -> Result<BulkCheckoutSummary, ServiceError> {
        let db = self.db_pool.as_ref();

        let target = self.resolve_checkout_target(db, &input).await?;
        let candidates = self.resolve_checkout_assets(db, &input).await?;

        if input.target_type == CheckoutTargetType::Asset
            && candidates.iter().any(|a| a.id == target.id)
        {
            return Err(ServiceError::InvalidOperation(
                "You cannot check an asset out to itself.".to_string(),
            ));
        }

        let settings = self.settings(db).await?;
        if settings.full_multiple_companies_support {
            for candidate in &candidates {
                if candidate.company_id != target.company_id {
                    return Err(ServiceError::InvalidOperation(format!(
                        "Asset {} does not belong to the same company as the checkout target",
                        candidate.asset_tag
                    )));
                }
            }
        }

        let checkout_time = resolve_event_time(input.checkout_at);
        let require_acceptance =
            settings.require_acceptance && input.target_type == CheckoutTargetType::User;

        info!(
            "Checking out {} assets to {} {}",
            candidates.len(),
            input.target_type,
            target.id
        );

        let target_type = input.target_type;
        let target_id = target.id;
        let target_location = target.location_id;
        let expected_checkin = input.expected_checkin;
        let note = input.note.clone();

        let checked_out = db
            .transaction::<_, Vec<Uuid>, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut checked_out = Vec::with_capacity(candidates.len());

                    for candidate in candidates {
                        let current = asset::Entity::find_by_id(candidate.id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Asset {} does not exist",
                                    candidate.id
                                ))
                            })?;

                        if current.assigned_to.is_some() {
                            return Err(ServiceError::Conflict(format!(
                                "Asset {} was checked out by another request",
                                current.asset_tag
                            )));
                        }

                        let mut active = current.clone().into_active_model();
                        active.assigned_to = Set(Some(target_id));
                        active.assigned_type = Set(Some(target_type));
                        active.last_checkout = Set(Some(checkout_time));
                        active.expected_checkin = Set(expected_checkin);
                        // A target without a location leaves the asset where it is
                        if let Some(location_id) = target_location {
                            active.location_id = Set(Some(location_id));
                        }
                        if require_acceptance {
                            active.accepted = Set(Some("pending".to_string()));
                        }
                        active.update(txn).await.map_err(ServiceError::db_error)?;

                        action_log::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            action_type: Set(ActionType::Checkout),
                            item_type: Set("asset".to_string()),
                            item_id: Set(current.id),
                            target_type: Set(Some(target_type)),
                            target_id: Set(Some(target_id)),
                            user_id: Set(actor_id),
                            note: Set(note.clone()),
                            log_meta: Set(None),
                            created_at: Set(checkout_time),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        if require_acceptance {
                            checkout_acceptance::ActiveModel {
                                id: Set(Uuid::new_v4()),
                                checkoutable_type: Set("asset".to_string()),
                                checkoutable_id: Set(current.id),
                                assigned_to_id: Set(target_id),
                                accepted_at: Set(None),
                                declined_at: Set(None),
                                created_at: Set(checkout_time),
                                deleted_at: Set(None),
                            }
                            .insert(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                        }

                        checked_out.push(current.id);
                    }

                    Ok(checked_out)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        for asset_id in &checked_out {
            self.event_sender
                .send(Event::AssetCheckedOut {
                    asset_id: *asset_id,
                    target_type,
                    target_id,
                })
                .await
                .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;
        }

        Ok(BulkCheckoutSummary {
            checked_out,
            target_type,
            target_id,
        })
    }

    /// Check the selected assets back in from their assignees. A missing or
    /// unassigned asset fails the request; assets already processed in the
    /// same request keep their checkin.
    pub async fn bulk_checkin(
        &self,
        actor_id: Option<Uuid>,
        input: BulkCheckinInput,
    ) -> Result<BulkCheckinSummary, ServiceError> {
        let db = self.db_pool.as_ref();

        if input.ids.is_empty() {
            return Err(ServiceError::BadRequest("No assets selected".to_string()));
        }
        let ids = dedupe(input.ids.clone());

        if let Some(status_id) = input.status_id {
            status_label::Entity::find_by_id(status_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Status label {} not found", status_id))
                })?;
        }

        let settings = self.settings(db).await?;
        let effective_status = input.status_id.or(settings.default_checkin_status_id);
        let checkin_time = resolve_event_time(input.checkin_at);

        let mut checked_in = 0;

        for asset_id in ids {
            let current = asset::Entity::find_by_id(asset_id)
                .filter(asset::Column::DeletedAt.is_null())
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Asset {} does not exist", asset_id))
                })?;

            if current.assigned_to.is_none() {
                return Err(ServiceError::InvalidOperation(format!(
                    "Asset {} is already checked in",
                    current.asset_tag
                )));
            }

            // Zeroed location ids survive from imported data; treat them as unset
            let mut rtd_location_id = current.rtd_location_id;
            if rtd_location_id == Some(Uuid::nil()) {
                debug!(
                    "Asset {} has a zeroed default location, treating it as unset",
                    current.asset_tag
                );
                rtd_location_id = None;
            }
            if current.location_id == Some(Uuid::nil()) {
                debug!(
                    "Asset {} has a zeroed location, it returns to its default",
                    current.asset_tag
                );
            }

            // Checkin returns the asset to its default location unless the
            // request names one explicitly
            let mut location_id = rtd_location_id;
            if let Some(requested) = input.location_id {
                location_id = Some(requested);
                if input.update_default_location.unwrap_or(false) {
                    rtd_location_id = Some(requested);
                }
            }

            let mut active = current.clone().into_active_model();
            active.assigned_to = Set(None);
            active.assigned_type = Set(None);
            active.expected_checkin = Set(None);
            active.last_checkout = Set(None);
            active.accepted = Set(None);
            active.name = Set(input.name.clone());
            active.rtd_location_id = Set(rtd_location_id);
            active.location_id = Set(location_id);
            if let Some(status_id) = effective_status {
                active.status_id = Set(status_id);
            }
            active.update(db).await.map_err(ServiceError::db_error)?;

            // Seats assigned through this asset are freed up
            license_seat::Entity::update_many()
                .col_expr(license_seat::Column::AssignedTo, Expr::value(Option::<Uuid>::None))
                .filter(license_seat::Column::AssetId.eq(current.id))
                .exec(db)
                .await
                .map_err(ServiceError::db_error)?;

            // Pending acceptances for this asset are withdrawn
            checkout_acceptance::Entity::update_many()
                .col_expr(
                    checkout_acceptance::Column::DeletedAt,
                    Expr::value(Some(checkin_time)),
                )
                .filter(checkout_acceptance::Column::CheckoutableType.eq("asset"))
                .filter(checkout_acceptance::Column::CheckoutableId.eq(current.id))
                .filter(checkout_acceptance::Column::AcceptedAt.is_null())
                .filter(checkout_acceptance::Column::DeclinedAt.is_null())
                .filter(checkout_acceptance::Column::DeletedAt.is_null())
                .exec(db)
                .await
                .map_err(ServiceError::db_error)?;

            action_log::ActiveModel {
                id: Set(Uuid::new_v4()),
                action_type: Set(ActionType::Checkin),
                item_type: Set("asset".to_string()),
                item_id: Set(current.id),
                target_type: Set(None),
                target_id: Set(None),
                user_id: Set(actor_id),
                note: Set(input.note.clone()),
                log_meta: Set(None),
                created_at: Set(checkin_time),
            }
            .insert(db)
            .await
            .map_err(ServiceError::db_error)?;

            self.event_sender
                .send(Event::AssetCheckedIn(current.id))
                .await
                .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

            checked_in += 1;
        }

        info!("Checked in {} assets", checked_in);
        Ok(BulkCheckinSummary { checked_in })
    }

    async fn settings(&self, db: &DatabaseConnection) -> Result<setting::Model, ServiceError> {
        setting::Entity::find()
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::InternalError("Application settings are not initialized".to_string())
            })
    }

    /// Reject update references that point at records which do not exist,
    /// before any asset is touched
    async fn validate_update_references(
        &self,
        db: &DatabaseConnection,
        input: &BulkUpdateInput,
    ) -> Result<(), ServiceError> {
        if let Some(model_id) = input.model_id {
            asset_model::Entity::find_by_id(model_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Asset model {} not found", model_id))
                })?;
        }
        if let Some(status_id) = input.status_id {
            status_label::Entity::find_by_id(status_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Status label {} not found", status_id))
                })?;
        }
        if let Some(CompanyAssignment::Assign(company_id)) = input.company_id {
            company::Entity::find_by_id(company_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Company {} not found", company_id))
                })?;
        }
        if let Some(location_id) = input.rtd_location_id {
            location::Entity::find_by_id(location_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Location {} not found", location_id))
                })?;
        }
        Ok(())
    }

    /// Custom field definitions grouped by the model they apply to, limited
    /// to the models of the assets in this update
    async fn load_custom_fields(
        &self,
        db: &DatabaseConnection,
        input: &BulkUpdateInput,
        assets: &[asset::Model],
    ) -> Result<HashMap<Uuid, Vec<custom_field::Model>>, ServiceError> {
        if input.custom_fields.is_empty() {
            return Ok(HashMap::new());
        }

        let model_ids: HashSet<Uuid> = assets
            .iter()
            .map(|a| input.model_id.unwrap_or(a.model_id))
            .collect();
        let models = asset_model::Entity::find()
            .filter(asset_model::Column::Id.is_in(model_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let fieldset_ids: HashSet<Uuid> = models.iter().filter_map(|m| m.fieldset_id).collect();
        let fields = custom_field::Entity::find()
            .filter(custom_field::Column::FieldsetId.is_in(fieldset_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut by_fieldset: HashMap<Uuid, Vec<custom_field::Model>> = HashMap::new();
        for field in fields {
            by_fieldset.entry(field.fieldset_id).or_default().push(field);
        }

        let mut by_model = HashMap::new();
        for model in models {
            if let Some(fieldset_id) = model.fieldset_id {
                if let Some(fields) = by_fieldset.get(&fieldset_id) {
                    by_model.insert(model.id, fields.clone());
                }
            }
        }
        Ok(by_model)
    }

    async fn resolve_checkout_target(
        &self,
        db: &DatabaseConnection,
        input: &BulkCheckoutInput,
    ) -> Result<CheckoutTarget, ServiceError> {
        match input.target_type {
            CheckoutTargetType::User => {
                let user_id = input.assigned_user_id.ok_or_else(|| {
                    ServiceError::BadRequest(
                        "assigned_user_id is required when checking out to a user".to_string(),
                    )
                })?;
                let target = user::Entity::find_by_id(user_id)
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("User {} not found", user_id))
                    })?;
                Ok(CheckoutTarget {
                    id: target.id,
                    company_id: target.company_id,
                    location_id: target.location_id,
                })
            }
            CheckoutTargetType::Location => {
                let location_id = input.assigned_location_id.ok_or_else(|| {
                    ServiceError::BadRequest(
                        "assigned_location_id is required when checking out to a location"
                            .to_string(),
                    )
                })?;
                let target = location::Entity::find_by_id(location_id)
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Location {} not found", location_id))
                    })?;
                Ok(CheckoutTarget {
                    id: target.id,
                    company_id: target.company_id,
                    location_id: Some(target.id),
                })
            }
            CheckoutTargetType::Asset => {
                let asset_id = input.assigned_asset_id.ok_or_else(|| {
                    ServiceError::BadRequest(
                        "assigned_asset_id is required when checking out to an asset".to_string(),
                    )
                })?;
                let target = asset::Entity::find_by_id(asset_id)
                    .filter(asset::Column::DeletedAt.is_null())
                    .one(db)
                    .await
                    .map_err(ServiceError::db_error)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Asset {} not found", asset_id))
                    })?;
                Ok(CheckoutTarget {
                    id: target.id,
                    company_id: target.company_id,
                    location_id: target.location_id,
                })
            }
        }
    }

    /// Resolve the asset selection for a checkout from exactly one of the
    /// three selector groups, rejecting any entry that is missing,
    /// ambiguous, already assigned, or not in a deployable status
    async fn resolve_checkout_assets(
        &self,
        db: &DatabaseConnection,
        input: &BulkCheckoutInput,
    ) -> Result<Vec<asset::Model>, ServiceError> {
        let groups_used = [
            !input.asset_ids.is_empty(),
            !input.asset_serials.is_empty(),
            !input.asset_tags.is_empty(),
        ]
        .iter()
        .filter(|used| **used)
        .count();

        match groups_used {
            0 => {
                return Err(ServiceError::BadRequest(
                    "No assets selected for checkout".to_string(),
                ))
            }
            1 => {}
            _ => {
                return Err(ServiceError::BadRequest(
                    "Choose only one way to select assets: ids, serials, or asset tags"
                        .to_string(),
                ))
            }
        }

        let deployable = self.deployable_status_ids(db).await?;

        if !input.asset_ids.is_empty() {
            let ids = dedupe(input.asset_ids.clone());
            let found = asset::Entity::find()
                .filter(asset::Column::Id.is_in(ids.clone()))
                .filter(asset::Column::DeletedAt.is_null())
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;
            let by_id: HashMap<Uuid, asset::Model> =
                found.into_iter().map(|a| (a.id, a)).collect();

            let mut assets = Vec::with_capacity(ids.len());
            let mut offenders = Vec::new();
            for id in ids {
                match by_id.get(&id) {
                    Some(a) if a.assigned_to.is_none() && deployable.contains(&a.status_id) => {
                        assets.push(a.clone());
                    }
                    _ => offenders.push(id.to_string()),
                }
            }
            if !offenders.is_empty() {
                return Err(ServiceError::InvalidOperation(format!(
                    "These assets are not available for checkout: {}",
                    offenders.join(", ")
                )));
            }
            return Ok(assets);
        }

        if !input.asset_serials.is_empty() {
            let serials = dedupe(input.asset_serials.clone());
            let mut assets = Vec::with_capacity(serials.len());
            let mut offenders = Vec::new();
            for serial in serials {
                // Serials carry no unique constraint; a duplicated serial
                // cannot identify an asset and counts as an offender
                let found = asset::Entity::find()
                    .filter(asset::Column::Serial.eq(serial.clone()))
                    .filter(asset::Column::DeletedAt.is_null())
                    .all(db)
                    .await
                    .map_err(ServiceError::db_error)?;
                match found.as_slice() {
                    [a] if a.assigned_to.is_none() && deployable.contains(&a.status_id) => {
                        assets.push(a.clone());
                    }
                    _ => offenders.push(serial),
                }
            }
            if !offenders.is_empty() {
                return Err(ServiceError::InvalidOperation(format!(
                    "These serials could not be checked out, please check them again: {}",
                    offenders.join(", ")
                )));
            }
            return Ok(assets);
        }

        let tags = dedupe(input.asset_tags.clone());
        let mut assets = Vec::with_capacity(tags.len());
        let mut offenders = Vec::new();
        for tag in tags {
            let found = asset::Entity::find()
                .filter(asset::Column::AssetTag.eq(tag.clone()))
                .filter(asset::Column::DeletedAt.is_null())
                .one(db)
                .await
                .map_err(ServiceError::db_error)?;
            match found {
                Some(a) if a.assigned_to.is_none() && deployable.contains(&a.status_id) => {
                    assets.push(a);
                }
                _ => offenders.push(tag),
            }
        }
        if !offenders.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "These asset tags could not be checked out, please check them again: {}",
                offenders.join(", ")
            )));
        }
        Ok(assets)
    }

    async fn deployable_status_ids(
        &self,
        db: &DatabaseConnection,
    ) -> Result<HashSet<Uuid>, ServiceError> {
        let labels = status_label::Entity::find()
            .filter(status_label::Column::Deployable.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(labels.into_iter().map(|l| l.id).collect())
    }
}

struct CheckoutTarget {
    id: Uuid,
    company_id: Option<Uuid>,
    location_id: Option<Uuid>,
}

/// A request-provided date resolves to the current instant when it names
/// today, to midnight otherwise
fn resolve_event_time(date: Option<NaiveDate>) -> DateTime<Utc> {
    match date {
        Some(date) if date == Utc::now().date_naive() => Utc::now(),
        Some(date) => date.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    }
}

fn dedupe<T: Eq + Hash + Clone>(values: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

fn validate_custom_value(format: CustomFieldFormat, value: &str) -> bool {
    match format {
        CustomFieldFormat::Any => true,
        CustomFieldFormat::Numeric => value.trim().parse::<f64>().is_ok(),
        CustomFieldFormat::Email => validator::validate_email(value),
        CustomFieldFormat::Url => validator::validate_url(value),
        CustomFieldFormat::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        CustomFieldFormat::Boolean => {
            matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "0" | "1"
            )
        }
    }
}

/// Bulk actions a selection of assets can be staged for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BulkAction {
    Labels,
    Edit,
    Delete,
    Restore,
    Checkin,
}

/// Company column assignment, distinguishing "set to this company" from
/// "clear the company"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyAssignment {
    Clear,
    Assign(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct BulkUpdateInput {
    pub ids: Vec<Uuid>,
    pub model_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub purchase_date: Option<NaiveDate>,
    pub expected_checkin: Option<NaiveDate>,
    pub next_audit_date: Option<NaiveDate>,
    pub null_purchase_date: bool,
    pub null_expected_checkin_date: bool,
    pub null_next_audit_date: bool,
    pub purchase_cost: Option<Decimal>,
    pub order_number: Option<String>,
    pub warranty_months: Option<i32>,
    pub requestable: Option<bool>,
    pub supplier_id: Option<Uuid>,
    pub company_id: Option<CompanyAssignment>,
    pub rtd_location_id: Option<Uuid>,
    pub update_real_location: bool,
    pub custom_fields: HashMap<String, String>,
}

impl BulkUpdateInput {
    /// Whether the request carries anything to apply
    pub fn has_updates(&self) -> bool {
        self.model_id.is_some()
            || self.status_id.is_some()
            || self.purchase_date.is_some()
            || self.expected_checkin.is_some()
            || self.next_audit_date.is_some()
            || self.null_purchase_date
            || self.null_expected_checkin_date
            || self.null_next_audit_date
            || self.purchase_cost.is_some()
            || self.order_number.is_some()
            || self.warranty_months.is_some()
            || self.requestable.is_some()
            || self.supplier_id.is_some()
            || self.company_id.is_some()
            || self.rtd_location_id.is_some()
            || !self.custom_fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BulkCheckoutInput {
    pub target_type: CheckoutTargetType,
    pub assigned_user_id: Option<Uuid>,
    pub assigned_location_id: Option<Uuid>,
    pub assigned_asset_id: Option<Uuid>,
    pub asset_ids: Vec<Uuid>,
    pub asset_serials: Vec<String>,
    pub asset_tags: Vec<String>,
    pub checkout_at: Option<NaiveDate>,
    pub expected_checkin: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BulkCheckinInput {
    pub ids: Vec<Uuid>,
    pub name: Option<String>,
    pub status_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub update_default_location: Option<bool>,
    pub checkin_at: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Selected assets plus the reference data the requested action needs.
/// Actions that only confirm a list (labels, delete, restore) leave the
/// reference vectors empty.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkEditSelection {
    pub action: BulkAction,
    pub assets: Vec<asset::Model>,
    pub status_labels: Vec<status_label::Model>,
    /// Distinct models of the selected assets (edit action only)
    pub models: Vec<asset_model::Model>,
    /// Custom fields defined by the fieldsets of those models
    pub custom_fields: Vec<custom_field::Model>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutFormView {
    pub target_types: Vec<CheckoutTargetType>,
    pub status_labels: Vec<status_label::Model>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkUpdateSummary {
    pub matched: usize,
    pub updated: usize,
    /// Display names of custom fields whose values failed validation
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkDeleteSummary {
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkRestoreSummary {
    pub restored: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkCheckoutSummary {
    pub checked_out: Vec<Uuid>,
    pub target_type: CheckoutTargetType,
    pub target_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkCheckinSummary {
    pub checked_in: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(CustomFieldFormat::Any, "anything at all", true; "any accepts text")]
    #[test_case(CustomFieldFormat::Numeric, "42.5", true; "numeric accepts decimals")]
    #[test_case(CustomFieldFormat::Numeric, "12 units", false; "numeric rejects text")]
    #[test_case(CustomFieldFormat::Email, "ops@example.com", true; "email accepts address")]
    #[test_case(CustomFieldFormat::Email, "not-an-email", false; "email rejects plain text")]
    #[test_case(CustomFieldFormat::Url, "https://example.com/warranty", true; "url accepts https")]
    #[test_case(CustomFieldFormat::Url, "example dot com", false; "url rejects prose")]
    #[test_case(CustomFieldFormat::Date, "2024-06-01", true; "date accepts iso")]
    #[test_case(CustomFieldFormat::Date, "06/01/2024", false; "date rejects locale format")]
    #[test_case(CustomFieldFormat::Boolean, "true", true; "boolean accepts words")]
    #[test_case(CustomFieldFormat::Boolean, "1", true; "boolean accepts digits")]
    #[test_case(CustomFieldFormat::Boolean, "maybe", false; "boolean rejects other text")]
    fn custom_value_validation(format: CustomFieldFormat, value: &str, expected: bool) {
        assert_eq!(validate_custom_value(format, value), expected);
    }

    #[test]
    fn dedupe_preserves_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert_eq!(dedupe(vec![a, b, a, c, b]), vec![a, b, c]);
    }

    #[test]
    fn event_time_for_today_is_now_not_midnight() {
        let resolved = resolve_event_time(Some(Utc::now().date_naive()));
        assert!(resolved.time() != NaiveTime::MIN || Utc::now().time() == NaiveTime::MIN);
    }

    #[test]
    fn event_time_for_another_day_is_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let resolved = resolve_event_time(Some(date));
        assert_eq!(resolved.date_naive(), date);
        assert_eq!(resolved.time(), NaiveTime::MIN);
    }

    #[test]
    fn empty_update_input_has_no_updates() {
        let input = BulkUpdateInput {
            ids: vec![Uuid::new_v4()],
            ..Default::default()
        };
        assert!(!input.has_updates());
    }

    #[test]
    fn null_checkbox_counts_as_an_update() {
        let input = BulkUpdateInput {
            ids: vec![Uuid::new_v4()],
            null_purchase_date: true,
            ..Default::default()
        };
        assert!(input.has_updates());
    }
}
