//! Create report status logs table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportStatusLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportStatusLogs::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportStatusLogs::ReportId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportStatusLogs::NewStatus)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportStatusLogs::AdminId).string_len(128))
                    .col(
                        ColumnDef::new(ReportStatusLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_status_logs_report")
                            .from(ReportStatusLogs::Table, ReportStatusLogs::ReportId)
                            .to(Reports::Table, Reports::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_logs_report_id")
                    .table(ReportStatusLogs::Table)
                    .col(ReportStatusLogs::ReportId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportStatusLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportStatusLogs {
    Table,
    Id,
    ReportId,
    NewStatus,
    AdminId,
    CreatedAt,
}

#[derive(Iden)]
enum Reports {
    Table,
    Id,
}
