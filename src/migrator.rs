use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_companies_table::Migration),
            Box::new(m20240301_000002_create_locations_table::Migration),
            Box::new(m20240301_000003_create_users_table::Migration),
            Box::new(m20240301_000004_create_status_labels_table::Migration),
            Box::new(m20240301_000005_create_custom_fieldsets_table::Migration),
            Box::new(m20240301_000006_create_custom_fields_table::Migration),
            Box::new(m20240301_000007_create_asset_models_table::Migration),
            Box::new(m20240301_000008_create_assets_table::Migration),
            Box::new(m20240301_000009_create_licenses_table::Migration),
            Box::new(m20240301_000010_create_license_seats_table::Migration),
            Box::new(m20240301_000011_create_action_logs_table::Migration),
            Box::new(m20240301_000012_create_checkout_acceptances_table::Migration),
            Box::new(m20240301_000013_create_settings_table::Migration),
            Box::new(m20240301_000014_seed_defaults::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_companies_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_companies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Companies::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(ColumnDef::new(Companies::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Companies {
        Table,
        Id,
        Name,
        CreatedAt,
    }
}

mod m20240301_000002_create_locations_table {

    use sea_orm_migration::prelude::*;

    use super::m20240301_000001_create_companies_table::Companies;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::CompanyId).uuid().null())
                        .col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_locations_company_id")
                                .from(Locations::Table, Locations::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_company_id")
                        .table(Locations::Table)
                        .col(Locations::CompanyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Locations {
        Table,
        Id,
        Name,
        CompanyId,
        CreatedAt,
    }
}

mod m20240301_000003_create_users_table {

    use sea_orm_migration::prelude::*;

    use super::m20240301_000001_create_companies_table::Companies;
    use super::m20240301_000002_create_locations_table::Locations;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::FirstName).string().not_null())
                        .col(ColumnDef::new(Users::LastName).string().null())
                        .col(ColumnDef::new(Users::LocationId).uuid().null())
                        .col(ColumnDef::new(Users::CompanyId).uuid().null())
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_location_id")
                                .from(Users::Table, Users::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_company_id")
                                .from(Users::Table, Users::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Username,
        Email,
        FirstName,
        LastName,
        LocationId,
        CompanyId,
        CreatedAt,
    }
}

mod m20240301_000004_create_status_labels_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_status_labels_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StatusLabels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StatusLabels::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StatusLabels::Name).string().not_null())
                        .col(
                            ColumnDef::new(StatusLabels::Deployable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StatusLabels::Pending)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StatusLabels::Archived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StatusLabels::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StatusLabels::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StatusLabels {
        Table,
        Id,
        Name,
        Deployable,
        Pending,
        Archived,
        CreatedAt,
    }
}

mod m20240301_000005_create_custom_fieldsets_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_custom_fieldsets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomFieldsets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomFieldsets::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomFieldsets::Name).string().not_null())
                        .col(
                            ColumnDef::new(CustomFieldsets::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomFieldsets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CustomFieldsets {
        Table,
        Id,
        Name,
        CreatedAt,
    }
}

mod m20240301_000006_create_custom_fields_table {

    use sea_orm_migration::prelude::*;

    use super::m20240301_000005_create_custom_fieldsets_table::CustomFieldsets;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_custom_fields_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CustomFields::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CustomFields::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CustomFields::Name).string().not_null())
                        .col(
                            ColumnDef::new(CustomFields::DbColumn)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(CustomFields::Format)
                                .string_len(16)
                                .not_null()
                                .default("any"),
                        )
                        .col(ColumnDef::new(CustomFields::FieldsetId).uuid().not_null())
                        .col(
                            ColumnDef::new(CustomFields::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_custom_fields_fieldset_id")
                                .from(CustomFields::Table, CustomFields::FieldsetId)
                                .to(CustomFieldsets::Table, CustomFieldsets::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_custom_fields_fieldset_id")
                        .table(CustomFields::Table)
                        .col(CustomFields::FieldsetId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CustomFields::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CustomFields {
        Table,
        Id,
        Name,
        DbColumn,
        Format,
        FieldsetId,
        CreatedAt,
    }
}

mod m20240301_000007_create_asset_models_table {

    use sea_orm_migration::prelude::*;

    use super::m20240301_000005_create_custom_fieldsets_table::CustomFieldsets;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_asset_models_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AssetModels::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AssetModels::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AssetModels::Name).string().not_null())
                        .col(ColumnDef::new(AssetModels::FieldsetId).uuid().null())
                        .col(
                            ColumnDef::new(AssetModels::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_asset_models_fieldset_id")
                                .from(AssetModels::Table, AssetModels::FieldsetId)
                                .to(CustomFieldsets::Table, CustomFieldsets::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AssetModels::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum AssetModels {
        Table,
        Id,
        Name,
        FieldsetId,
        CreatedAt,
    }
}

mod m20240301_000008_create_assets_table {

    use sea_orm_migration::prelude::*;

    use super::m20240301_000001_create_companies_table::Companies;
    use super::m20240301_000002_create_locations_table::Locations;
    use super::m20240301_000004_create_status_labels_table::StatusLabels;
    use super::m20240301_000007_create_asset_models_table::AssetModels;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000008_create_assets_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Assets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Assets::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Assets::AssetTag)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Assets::Serial).string().null())
                        .col(ColumnDef::new(Assets::Name).string().null())
                        .col(ColumnDef::new(Assets::ModelId).uuid().not_null())
                        .col(ColumnDef::new(Assets::StatusId).uuid().not_null())
                        .col(ColumnDef::new(Assets::CompanyId).uuid().null())
                        .col(ColumnDef::new(Assets::LocationId).uuid().null())
                        .col(ColumnDef::new(Assets::RtdLocationId).uuid().null())
                        .col(ColumnDef::new(Assets::SupplierId).uuid().null())
                        .col(ColumnDef::new(Assets::AssignedTo).uuid().null())
                        .col(ColumnDef::new(Assets::AssignedType).string_len(16).null())
                        .col(ColumnDef::new(Assets::PurchaseDate).date().null())
                        .col(ColumnDef::new(Assets::PurchaseCost).decimal().null())
                        .col(ColumnDef::new(Assets::OrderNumber).string().null())
                        .col(ColumnDef::new(Assets::WarrantyMonths).integer().null())
                        .col(ColumnDef::new(Assets::NextAuditDate).date().null())
                        .col(ColumnDef::new(Assets::ExpectedCheckin).date().null())
                        .col(ColumnDef::new(Assets::LastCheckout).timestamp().null())
                        .col(
                            ColumnDef::new(Assets::Requestable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Assets::Notes).string().null())
                        .col(ColumnDef::new(Assets::Accepted).string().null())
                        .col(
                            ColumnDef::new(Assets::CustomFields)
                                .json()
                                .not_null()
                                .default("{}"),
                        )
                        .col(ColumnDef::new(Assets::DeletedAt).timestamp().null())
                        .col(ColumnDef::new(Assets::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Assets::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assets_model_id")
                                .from(Assets::Table, Assets::ModelId)
                                .to(AssetModels::Table, AssetModels::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assets_status_id")
                                .from(Assets::Table, Assets::StatusId)
                                .to(StatusLabels::Table, StatusLabels::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assets_company_id")
                                .from(Assets::Table, Assets::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assets_location_id")
                                .from(Assets::Table, Assets::LocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_assets_rtd_location_id")
                                .from(Assets::Table, Assets::RtdLocationId)
                                .to(Locations::Table, Locations::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // The bulk loops resolve by serial/tag and filter on assignment
            // and soft-delete state
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_serial")
                        .table(Assets::Table)
                        .col(Assets::Serial)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_assigned_to")
                        .table(Assets::Table)
                        .col(Assets::AssignedTo)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_status_id")
                        .table(Assets::Table)
                        .col(Assets::StatusId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_model_id")
                        .table(Assets::Table)
                        .col(Assets::ModelId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_assets_deleted_at")
                        .table(Assets::Table)
                        .col(Assets::DeletedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Assets::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Assets {
        Table,
        Id,
        AssetTag,
        Serial,
        Name,
        ModelId,
        StatusId,
        CompanyId,
        LocationId,
        RtdLocationId,
        SupplierId,
        AssignedTo,
        AssignedType,
        PurchaseDate,
        PurchaseCost,
        OrderNumber,
        WarrantyMonths,
        NextAuditDate,
        ExpectedCheckin,
        LastCheckout,
        Requestable,
        Notes,
        Accepted,
        CustomFields,
        DeletedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000009_create_licenses_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000009_create_licenses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Licenses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Licenses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Licenses::Name).string().not_null())
                        .col(ColumnDef::new(Licenses::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Licenses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Licenses {
        Table,
        Id,
        Name,
        CreatedAt,
    }
}

mod m20240301_000010_create_license_seats_table {

    use sea_orm_migration::prelude::*;

    use super::m20240301_000008_create_assets_table::Assets;
    use super::m20240301_000009_create_licenses_table::Licenses;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000010_create_license_seats_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(LicenseSeats::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LicenseSeats::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(LicenseSeats::LicenseId).uuid().not_null())
                        .col(ColumnDef::new(LicenseSeats::AssignedTo).uuid().null())
                        .col(ColumnDef::new(LicenseSeats::AssetId).uuid().null())
                        .col(
                            ColumnDef::new(LicenseSeats::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_license_seats_license_id")
                                .from(LicenseSeats::Table, LicenseSeats::LicenseId)
                                .to(Licenses::Table, Licenses::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_license_seats_asset_id")
                                .from(LicenseSeats::Table, LicenseSeats::AssetId)
                                .to(Assets::Table, Assets::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_license_seats_asset_id")
                        .table(LicenseSeats::Table)
                        .col(LicenseSeats::AssetId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LicenseSeats::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum LicenseSeats {
        Table,
        Id,
        LicenseId,
        AssignedTo,
        AssetId,
        CreatedAt,
    }
}

mod m20240301_000011_create_action_logs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000011_create_action_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ActionLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ActionLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ActionLogs::ActionType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ActionLogs::ItemType).string().not_null())
                        .col(ColumnDef::new(ActionLogs::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(ActionLogs::TargetType)
                                .string_len(16)
                                .null(),
                        )
                        .col(ColumnDef::new(ActionLogs::TargetId).uuid().null())
                        .col(ColumnDef::new(ActionLogs::UserId).uuid().null())
                        .col(ColumnDef::new(ActionLogs::Note).string().null())
                        .col(ColumnDef::new(ActionLogs::LogMeta).json().null())
                        .col(
                            ColumnDef::new(ActionLogs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_action_logs_item")
                        .table(ActionLogs::Table)
                        .col(ActionLogs::ItemType)
                        .col(ActionLogs::ItemId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_action_logs_created_at")
                        .table(ActionLogs::Table)
                        .col(ActionLogs::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ActionLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ActionLogs {
        Table,
        Id,
        ActionType,
        ItemType,
        ItemId,
        TargetType,
        TargetId,
        UserId,
        Note,
        LogMeta,
        CreatedAt,
    }
}

mod m20240301_000012_create_checkout_acceptances_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000012_create_checkout_acceptances_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CheckoutAcceptances::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CheckoutAcceptances::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutAcceptances::CheckoutableType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutAcceptances::CheckoutableId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutAcceptances::AssignedToId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutAcceptances::AcceptedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutAcceptances::DeclinedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutAcceptances::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CheckoutAcceptances::DeletedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_checkout_acceptances_checkoutable")
                        .table(CheckoutAcceptances::Table)
                        .col(CheckoutAcceptances::CheckoutableType)
                        .col(CheckoutAcceptances::CheckoutableId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CheckoutAcceptances::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum CheckoutAcceptances {
        Table,
        Id,
        CheckoutableType,
        CheckoutableId,
        AssignedToId,
        AcceptedAt,
        DeclinedAt,
        CreatedAt,
        DeletedAt,
    }
}

mod m20240301_000013_create_settings_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000013_create_settings_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Settings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Settings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Settings::FullMultipleCompaniesSupport)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Settings::RequireAcceptance)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Settings::DefaultCheckinStatusId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(Settings::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Settings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Settings {
        Table,
        Id,
        FullMultipleCompaniesSupport,
        RequireAcceptance,
        DefaultCheckinStatusId,
        CreatedAt,
    }
}

mod m20240301_000014_seed_defaults {

    use chrono::Utc;
    use sea_orm_migration::prelude::*;
    use uuid::Uuid;

    use super::m20240301_000004_create_status_labels_table::StatusLabels;
    use super::m20240301_000013_create_settings_table::Settings;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000014_seed_defaults"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let now = Utc::now();
            let ready_to_deploy = Uuid::new_v4();

            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(StatusLabels::Table)
                        .columns([
                            StatusLabels::Id,
                            StatusLabels::Name,
                            StatusLabels::Deployable,
                            StatusLabels::Pending,
                            StatusLabels::Archived,
                            StatusLabels::CreatedAt,
                        ])
                        .values_panic([
                            ready_to_deploy.into(),
                            "Ready to Deploy".into(),
                            true.into(),
                            false.into(),
                            false.into(),
                            now.into(),
                        ])
                        .to_owned(),
                )
                .await?;

            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(Settings::Table)
                        .columns([
                            Settings::Id,
                            Settings::FullMultipleCompaniesSupport,
                            Settings::RequireAcceptance,
                            Settings::DefaultCheckinStatusId,
                            Settings::CreatedAt,
                        ])
                        .values_panic([
                            Uuid::new_v4().into(),
                            false.into(),
                            false.into(),
                            ready_to_deploy.into(),
                            now.into(),
                        ])
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .exec_stmt(Query::delete().from_table(Settings::Table).to_owned())
                .await?;

            manager
                .exec_stmt(Query::delete().from_table(StatusLabels::Table).to_owned())
                .await
        }
    }
}
