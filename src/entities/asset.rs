use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// What kind of record an asset can be checked out to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckoutTargetType {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "location")]
    Location,
    #[sea_orm(string_value = "asset")]
    Asset,
}

/// The `assets` table: one row per trackable inventory item.
#[derive(
    Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate, utoipa::ToSchema,
)]
#[sea_orm(table_name = "assets")]
#[schema(as = Asset)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Organization-wide unique tag printed on the physical asset.
    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 255))]
    pub asset_tag: String,

    pub serial: Option<String>,
    pub name: Option<String>,
    pub model_id: Uuid,
    pub status_id: Uuid,
    pub company_id: Option<Uuid>,

    /// Where the asset currently sits.
    pub location_id: Option<Uuid>,
    /// Default location the asset returns to on checkin.
    pub rtd_location_id: Option<Uuid>,

    pub supplier_id: Option<Uuid>,

    /// Current holder; interpreted through `assigned_type`.
    pub assigned_to: Option<Uuid>,
    pub assigned_type: Option<CheckoutTargetType>,

    pub purchase_date: Option<NaiveDate>,
    pub purchase_cost: Option<Decimal>,
    pub order_number: Option<String>,
    pub warranty_months: Option<i32>,
    pub next_audit_date: Option<NaiveDate>,
    pub expected_checkin: Option<NaiveDate>,
    pub last_checkout: Option<DateTime<Utc>>,
    pub requestable: bool,
    pub notes: Option<String>,

    /// Acceptance state of the current assignment ("pending" until accepted).
    pub accepted: Option<String>,

    /// Values for the custom fields of this asset's model, keyed by db_column.
    pub custom_fields: Json,

    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset_model::Entity",
        from = "Column::ModelId",
        to = "super::asset_model::Column::Id"
    )]
    AssetModel,
    #[sea_orm(
        belongs_to = "super::status_label::Entity",
        from = "Column::StatusId",
        to = "super::status_label::Column::Id"
    )]
    StatusLabel,
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::RtdLocationId",
        to = "super::location::Column::Id"
    )]
    RtdLocation,
    #[sea_orm(has_many = "super::license_seat::Entity")]
    LicenseSeats,
}

impl Related<super::asset_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetModel.def()
    }
}

impl Related<super::status_label::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusLabel.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::license_seat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LicenseSeats.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
            if let ActiveValue::NotSet = active_model.custom_fields {
                active_model.custom_fields = Set(serde_json::json!({}));
            }
        } else if let ActiveValue::NotSet = active_model.updated_at {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
