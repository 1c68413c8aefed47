use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value format a custom field accepts.
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
pub enum CustomFieldFormat {
    #[sea_orm(string_value = "any")]
    Any,
    #[sea_orm(string_value = "numeric")]
    Numeric,
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "url")]
    Url,
    #[sea_orm(string_value = "date")]
    Date,
    #[sea_orm(string_value = "boolean")]
    Boolean,
}

/// The `custom_fields` table: dynamically defined extra columns on assets.
/// `db_column` keys the value inside the asset's custom_fields JSON map,
/// `name` is what users see.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "custom_fields")]
#[schema(as = CustomField)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub db_column: String,
    pub format: CustomFieldFormat,
    pub fieldset_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::custom_fieldset::Entity",
        from = "Column::FieldsetId",
        to = "super::custom_fieldset::Column::Id"
    )]
    CustomFieldset,
}

impl Related<super::custom_fieldset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomFieldset.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(Utc::now());
            }
        }
        Ok(active_model)
    }
}
