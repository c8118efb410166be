//! Create supervisors table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Supervisors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Supervisors::Id)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Supervisors::Email).string_len(320))
                    .col(ColumnDef::new(Supervisors::BlockId).string_len(64))
                    .col(
                        ColumnDef::new(Supervisors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Supervisors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Supervisors {
    Table,
    Id,
    Email,
    BlockId,
    CreatedAt,
}
