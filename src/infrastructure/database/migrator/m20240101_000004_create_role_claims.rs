//! Create RoleClaims table migration

use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_roles::Roles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoleClaims::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoleClaims::RoleId).string().not_null())
                    .col(ColumnDef::new(RoleClaims::ClaimType).text().null())
                    .col(ColumnDef::new(RoleClaims::ClaimValue).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_claims_role_id")
                            .from(RoleClaims::Table, RoleClaims::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_claims_role_id")
                    .table(RoleClaims::Table)
                    .col(RoleClaims::RoleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleClaims::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "RoleClaims"]
pub enum RoleClaims {
    Table,
    Id,
    RoleId,
    ClaimType,
    ClaimValue,
}
