//! Create reports table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reports::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reports::UserId).string_len(128).not_null())
                    .col(ColumnDef::new(Reports::Title).string_len(256))
                    .col(ColumnDef::new(Reports::Description).text())
                    .col(ColumnDef::new(Reports::Contact).string_len(256))
                    .col(ColumnDef::new(Reports::Location).string_len(512))
                    .col(ColumnDef::new(Reports::Coords).string_len(256))
                    .col(ColumnDef::new(Reports::ImageUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Reports::Status)
                            .string_len(32)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Reports::WorkerName).string_len(256))
                    .col(ColumnDef::new(Reports::EstimatedTime).string_len(128))
                    .col(ColumnDef::new(Reports::SupervisorId).string_len(128))
                    .col(
                        ColumnDef::new(Reports::RequiresManualReview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Reports::ResolvedPhoto).string_len(1024))
                    .col(ColumnDef::new(Reports::ResolvedImageUrl).string_len(1024))
                    .col(ColumnDef::new(Reports::ResolvedClass).string_len(64))
                    .col(ColumnDef::new(Reports::ResolvedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Reports::LikesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Reports::CommentsCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Reports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Reports::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: created_at (dashboard ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_reports_created_at")
                    .table(Reports::Table)
                    .col(Reports::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, created_at) for per-submitter listing
        manager
            .create_index(
                Index::create()
                    .name("idx_reports_user_id_created_at")
                    .table(Reports::Table)
                    .col(Reports::UserId)
                    .col(Reports::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_status")
                    .table(Reports::Table)
                    .col(Reports::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reports {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Contact,
    Location,
    Coords,
    ImageUrl,
    Status,
    WorkerName,
    EstimatedTime,
    SupervisorId,
    RequiresManualReview,
    ResolvedPhoto,
    ResolvedImageUrl,
    ResolvedClass,
    ResolvedAt,
    LikesCount,
    CommentsCount,
    CreatedAt,
    UpdatedAt,
}
