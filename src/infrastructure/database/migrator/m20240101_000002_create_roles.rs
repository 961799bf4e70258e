//! Create Roles table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Roles::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Roles::Name).string_len(256).null())
                    .col(
                        ColumnDef::new(Roles::NormalizedName)
                            .string_len(256)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Roles::ConcurrencyStamp).string().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "Roles"]
pub enum Roles {
    Table,
    Id,
    Name,
    NormalizedName,
    ConcurrencyStamp,
}
