use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::consts as perm;
use crate::entities::asset::CheckoutTargetType;
use crate::services::bulk_assets::{
    BulkAction, BulkCheckinInput, BulkCheckinSummary, BulkCheckoutInput, BulkCheckoutSummary,
    BulkDeleteSummary, BulkEditSelection, BulkRestoreSummary, BulkUpdateInput, BulkUpdateSummary,
    CheckoutFormView, CompanyAssignment,
};
use crate::{auth::AuthUser, errors::ServiceError, ApiResponse, AppState};

// The permission a bulk action requires depends on what the action does,
// not on the route it arrives through
fn required_permission_for(action: BulkAction) -> &'static str {
    match action {
        BulkAction::Labels => perm::ASSETS_VIEW,
        BulkAction::Delete => perm::ASSETS_DELETE,
        BulkAction::Edit | BulkAction::Restore => perm::ASSETS_UPDATE,
        BulkAction::Checkin => perm::ASSETS_CHECKIN,
    }
}

fn parse_id_list(raw: &str) -> Result<Vec<Uuid>, ServiceError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part).map_err(|_| {
                ServiceError::ValidationError(format!("'{}' is not a valid asset id", part))
            })
        })
        .collect()
}

fn flatten_validation_errors(validation_errors: validator::ValidationErrors) -> Vec<String> {
    validation_errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            let field = field.clone();
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error.message.as_ref().unwrap_or(&"Invalid value".into())
                )
            })
        })
        .collect()
}

fn company_assignment_from(raw: Option<&str>) -> Result<Option<CompanyAssignment>, ServiceError> {
    match raw {
        None => Ok(None),
        Some("clear") => Ok(Some(CompanyAssignment::Clear)),
        Some(value) => {
            let company_id = Uuid::parse_str(value).map_err(|_| {
                ServiceError::ValidationError(
                    "company_id must be a UUID or the string \"clear\"".to_string(),
                )
            })?;
            Ok(Some(CompanyAssignment::Assign(company_id)))
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BulkEditQuery {
    /// Comma separated asset ids
    pub ids: Option<String>,
    pub bulk_action: Option<BulkAction>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BulkUpdateRequest {
    #[validate(length(min = 1, message = "select at least one asset"))]
    pub ids: Vec<Uuid>,

    pub model_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub purchase_date: Option<NaiveDate>,
    pub expected_checkin: Option<NaiveDate>,
    pub next_audit_date: Option<NaiveDate>,

    /// Clear the purchase date regardless of any value supplied for it
    #[serde(default)]
    pub null_purchase_date: bool,
    #[serde(default)]
    pub null_expected_checkin_date: bool,
    #[serde(default)]
    pub null_next_audit_date: bool,

    pub purchase_cost: Option<Decimal>,
    pub order_number: Option<String>,
    #[validate(range(min = 0, message = "warranty_months cannot be negative"))]
    pub warranty_months: Option<i32>,
    pub requestable: Option<bool>,
    pub supplier_id: Option<Uuid>,

    /// Company id, or the string "clear" to detach the assets from any company
    pub company_id: Option<String>,

    pub rtd_location_id: Option<Uuid>,
    /// Also move the assets to the new default location
    #[serde(default)]
    pub update_real_location: bool,

    /// Custom field values keyed by the field's db_column
    #[serde(default)]
    pub custom_fields: HashMap<String, String>,
}

impl BulkUpdateRequest {
    fn into_input(self) -> Result<BulkUpdateInput, ServiceError> {
        let company_id = company_assignment_from(self.company_id.as_deref())?;
        Ok(BulkUpdateInput {
            ids: self.ids,
            model_id: self.model_id,
            status_id: self.status_id,
            purchase_date: self.purchase_date,
            expected_checkin: self.expected_checkin,
            next_audit_date: self.next_audit_date,
            null_purchase_date: self.null_purchase_date,
            null_expected_checkin_date: self.null_expected_checkin_date,
            null_next_audit_date: self.null_next_audit_date,
            purchase_cost: self.purchase_cost,
            order_number: self.order_number,
            warranty_months: self.warranty_months,
            requestable: self.requestable,
            supplier_id: self.supplier_id,
            company_id,
            rtd_location_id: self.rtd_location_id,
            update_real_location: self.update_real_location,
            custom_fields: self.custom_fields,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BulkIdsRequest {
    #[validate(length(min = 1, message = "select at least one asset"))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BulkCheckoutRequest {
    /// What kind of record the assets are checked out to
    pub checkout_to_type: CheckoutTargetType,

    pub assigned_user_id: Option<Uuid>,
    pub assigned_location_id: Option<Uuid>,
    pub assigned_asset_id: Option<Uuid>,

    /// Select assets by id; mutually exclusive with serials and tags
    #[serde(default)]
    pub asset_ids: Vec<Uuid>,
    /// Select assets by serial number
    #[serde(default)]
    pub asset_serials: Vec<String>,
    /// Select assets by asset tag
    #[serde(default)]
    pub asset_tags: Vec<String>,

    pub checkout_at: Option<NaiveDate>,
    pub expected_checkin: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BulkCheckinRequest {
    #[validate(length(min = 1, message = "select at least one asset"))]
    pub ids: Vec<Uuid>,

    /// New asset name; leaving it out clears the name on every asset
    pub name: Option<String>,
    pub status_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Also make location_id the new default return location
    pub update_default_location: Option<bool>,
    pub checkin_at: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "note is too long"))]
    pub note: Option<String>,
}

/// Stage a bulk action for a selection of assets
#[utoipa::path(
    get,
    path = "/api/v1/assets/bulk/edit",
    summary = "Stage a bulk action",
    description = "Load the selected assets together with the reference data the requested bulk action needs",
    params(BulkEditQuery),
    responses(
        (status = 200, description = "Selection staged", body = ApiResponse<BulkEditSelection>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "No assets or no action selected", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_edit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(query): Query<BulkEditQuery>,
) -> Result<Json<ApiResponse<BulkEditSelection>>, ServiceError> {
    let action = query
        .bulk_action
        .ok_or_else(|| ServiceError::BadRequest("No action selected".to_string()))?;

    if !auth_user.can(required_permission_for(action)) {
        return Err(ServiceError::Forbidden(format!(
            "Insufficient permissions for the {} bulk action",
            action
        )));
    }

    let ids = parse_id_list(query.ids.as_deref().unwrap_or_default())?;
    let selection = state
        .services
        .bulk_assets
        .bulk_edit_view(ids, action)
        .await?;

    Ok(Json(ApiResponse::success(selection)))
}

/// Apply field updates to a selection of assets
#[utoipa::path(
    post,
    path = "/api/v1/assets/bulk/update",
    summary = "Bulk update assets",
    description = "Apply the provided field values to every selected asset, recording a change diff per asset",
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "Update applied", body = ApiResponse<BulkUpdateSummary>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "A referenced record does not exist", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_update(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BulkUpdateSummary>>), ServiceError> {
    if !auth_user.can(perm::ASSETS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update assets".to_string(),
        ));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                validation_errors,
            ))),
        ));
    }

    let input = request.into_input()?;
    if !input.has_updates() {
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::success_message(
                "No fields were selected, nothing was updated",
            )),
        ));
    }

    let summary = state
        .services
        .bulk_assets
        .bulk_update(auth_user.user_uuid(), input)
        .await?;

    let message = format!(
        "Updated {} of {} selected assets",
        summary.updated, summary.matched
    );
    let field_errors = summary.errors.clone();
    let mut response = ApiResponse::success(summary);
    response.message = Some(message);
    if !field_errors.is_empty() {
        response.errors = Some(field_errors);
    }

    Ok((StatusCode::OK, Json(response)))
}

/// Soft delete a selection of assets
#[utoipa::path(
    post,
    path = "/api/v1/assets/bulk/delete",
    summary = "Bulk delete assets",
    description = "Soft delete the selected assets and clear any assignment they carry",
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "Assets deleted", body = ApiResponse<BulkDeleteSummary>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_delete(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<BulkIdsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BulkDeleteSummary>>), ServiceError> {
    if !auth_user.can(perm::ASSETS_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete assets".to_string(),
        ));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                validation_errors,
            ))),
        ));
    }

    let summary = state
        .services
        .bulk_assets
        .bulk_delete(auth_user.user_uuid(), request.ids)
        .await?;

    let message = format!("Deleted {} assets", summary.deleted);
    let mut response = ApiResponse::success(summary);
    response.message = Some(message);

    Ok((StatusCode::OK, Json(response)))
}

/// Restore a selection of soft-deleted assets
#[utoipa::path(
    post,
    path = "/api/v1/assets/bulk/restore",
    summary = "Bulk restore assets",
    description = "Bring soft-deleted assets back into service",
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "Assets restored", body = ApiResponse<BulkRestoreSummary>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "A selected asset does not exist", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_restore(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<BulkIdsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BulkRestoreSummary>>), ServiceError> {
    if !auth_user.can(perm::ASSETS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to restore assets".to_string(),
        ));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                validation_errors,
            ))),
        ));
    }

    let summary = state
        .services
        .bulk_assets
        .bulk_restore(auth_user.user_uuid(), request.ids)
        .await?;

    let message = format!("Restored {} assets", summary.restored);
    let mut response = ApiResponse::success(summary);
    response.message = Some(message);

    Ok((StatusCode::OK, Json(response)))
}

/// Reference data for the bulk checkout form
#[utoipa::path(
    get,
    path = "/api/v1/assets/bulk/checkout",
    summary = "Bulk checkout form data",
    description = "Target types assets can be checked out to, plus the status label list",
    responses(
        (status = 200, description = "Form data", body = ApiResponse<CheckoutFormView>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn checkout_form(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<CheckoutFormView>>, ServiceError> {
    if !auth_user.can(perm::ASSETS_CHECKOUT) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to check out assets".to_string(),
        ));
    }

    let view = state.services.bulk_assets.checkout_form().await?;
    Ok(Json(ApiResponse::success(view)))
}

/// Check a selection of assets out to a user, location or asset
#[utoipa::path(
    post,
    path = "/api/v1/assets/bulk/checkout",
    summary = "Bulk checkout assets",
    description = "Check the selected assets out to one target; all assets succeed or none do",
    request_body = BulkCheckoutRequest,
    responses(
        (status = 200, description = "Assets checked out", body = ApiResponse<BulkCheckoutSummary>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data or selection not available for checkout", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "The checkout target does not exist", body = crate::errors::ErrorResponse),
        (status = 409, description = "An asset was checked out concurrently", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_checkout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<BulkCheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BulkCheckoutSummary>>), ServiceError> {
    if !auth_user.can(perm::ASSETS_CHECKOUT) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to check out assets".to_string(),
        ));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                validation_errors,
            ))),
        ));
    }

    let input = BulkCheckoutInput {
        target_type: request.checkout_to_type,
        assigned_user_id: request.assigned_user_id,
        assigned_location_id: request.assigned_location_id,
        assigned_asset_id: request.assigned_asset_id,
        asset_ids: request.asset_ids,
        asset_serials: request.asset_serials,
        asset_tags: request.asset_tags,
        checkout_at: request.checkout_at,
        expected_checkin: request.expected_checkin,
        note: request.note,
    };

    let summary = state
        .services
        .bulk_assets
        .bulk_checkout(auth_user.user_uuid(), input)
        .await?;

    let message = format!("Checked out {} assets", summary.checked_out.len());
    let mut response = ApiResponse::success(summary);
    response.message = Some(message);

    Ok((StatusCode::OK, Json(response)))
}

/// Check a selection of assets back in
#[utoipa::path(
    post,
    path = "/api/v1/assets/bulk/checkin",
    summary = "Bulk checkin assets",
    description = "Return the selected assets from their assignees, releasing license seats and pending acceptances",
    request_body = BulkCheckinRequest,
    responses(
        (status = 200, description = "Assets checked in", body = ApiResponse<BulkCheckinSummary>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data or an asset already checked in", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "A selected asset does not exist", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn bulk_checkin(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<BulkCheckinRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BulkCheckinSummary>>), ServiceError> {
    if !auth_user.can(perm::ASSETS_CHECKIN) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to check in assets".to_string(),
        ));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                validation_errors,
            ))),
        ));
    }

    let input = BulkCheckinInput {
        ids: request.ids,
        name: request.name,
        status_id: request.status_id,
        location_id: request.location_id,
        update_default_location: request.update_default_location,
        checkin_at: request.checkin_at,
        note: request.note,
    };

    let summary = state
        .services
        .bulk_assets
        .bulk_checkin(auth_user.user_uuid(), input)
        .await?;

    let message = format!("Checked in {} assets", summary.checked_in);
    let mut response = ApiResponse::success(summary);
    response.message = Some(message);

    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_parses_and_trims() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let raw = format!(" {} , {} ", a, b);
        assert_eq!(parse_id_list(&raw).unwrap(), vec![a, b]);
    }

    #[test]
    fn id_list_rejects_garbage() {
        assert!(parse_id_list("not-a-uuid").is_err());
    }

    #[test]
    fn empty_id_list_is_empty_not_an_error() {
        assert!(parse_id_list("").unwrap().is_empty());
    }

    #[test]
    fn company_assignment_distinguishes_clear_from_id() {
        let company_id = Uuid::new_v4();
        assert_eq!(
            company_assignment_from(Some("clear")).unwrap(),
            Some(CompanyAssignment::Clear)
        );
        assert_eq!(
            company_assignment_from(Some(&company_id.to_string())).unwrap(),
            Some(CompanyAssignment::Assign(company_id))
        );
        assert_eq!(company_assignment_from(None).unwrap(), None);
        assert!(company_assignment_from(Some("KLM")).is_err());
    }

    #[test]
    fn edit_permission_depends_on_action() {
        assert_eq!(required_permission_for(BulkAction::Labels), perm::ASSETS_VIEW);
        assert_eq!(
            required_permission_for(BulkAction::Delete),
            perm::ASSETS_DELETE
        );
        assert_eq!(
            required_permission_for(BulkAction::Restore),
            perm::ASSETS_UPDATE
        );
        assert_eq!(
            required_permission_for(BulkAction::Checkin),
            perm::ASSETS_CHECKIN
        );
    }
}
