use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AssetFlow API",
        version = "1.0.0",
        description = r#"
# AssetFlow Asset Management API

An API for managing the lifecycle of physical assets in bulk: staging a
selection for an action, applying field updates across many assets at once,
soft deleting and restoring, and moving assets between holders with checkout
and checkin.

## Features

- **Bulk Edit**: Stage a selection of assets and fetch the reference data an action needs
- **Bulk Update**: Apply field values to many assets with a per-asset change diff in the audit log
- **Bulk Delete / Restore**: Soft delete assets and bring them back
- **Bulk Checkout**: Assign assets to a user, location or another asset, transactionally
- **Bulk Checkin**: Return assets, releasing license seats and pending acceptances

## Authentication

All API endpoints require a JWT bearer token. Include it in the Authorization header:

```
Authorization: Bearer <your-jwt-token>
```

## Error Handling

The API uses consistent error response formats with appropriate HTTP status codes:

```json
{
  "success": false,
  "error": "Bad Request",
  "message": "Validation failed",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Bulk Assets", description = "Bulk asset operation endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    modifiers(&SecurityAddon),
    paths(
        crate::handlers::bulk_assets::bulk_edit,
        crate::handlers::bulk_assets::bulk_update,
        crate::handlers::bulk_assets::bulk_delete,
        crate::handlers::bulk_assets::bulk_restore,
        crate::handlers::bulk_assets::checkout_form,
        crate::handlers::bulk_assets::bulk_checkout,
        crate::handlers::bulk_assets::bulk_checkin,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,

            // Request types
            crate::handlers::bulk_assets::BulkUpdateRequest,
            crate::handlers::bulk_assets::BulkIdsRequest,
            crate::handlers::bulk_assets::BulkCheckoutRequest,
            crate::handlers::bulk_assets::BulkCheckinRequest,

            // Result types
            crate::services::bulk_assets::BulkAction,
            crate::services::bulk_assets::BulkEditSelection,
            crate::services::bulk_assets::CheckoutFormView,
            crate::services::bulk_assets::BulkUpdateSummary,
            crate::services::bulk_assets::BulkDeleteSummary,
            crate::services::bulk_assets::BulkRestoreSummary,
            crate::services::bulk_assets::BulkCheckoutSummary,
            crate::services::bulk_assets::BulkCheckinSummary,

            // Entities embedded in result payloads
            crate::entities::asset::Model,
            crate::entities::asset::CheckoutTargetType,
            crate::entities::status_label::Model,
            crate::entities::asset_model::Model,
            crate::entities::custom_field::Model,
            crate::entities::custom_field::CustomFieldFormat,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
