use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // reports 表
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::CallerId).string().not_null())
                    .col(ColumnDef::new(Report::Host).string().not_null())
                    .col(ColumnDef::new(Report::Port).integer().null())
                    .col(ColumnDef::new(Report::Kind).string().not_null())
                    .col(ColumnDef::new(Report::Concurrency).integer().null())
                    .col(ColumnDef::new(Report::DurationSecs).big_integer().null())
                    .col(ColumnDef::new(Report::Payload).text().not_null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string()
                            .not_null()
                            .default("completed"),
                    )
                    .col(ColumnDef::new(Report::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Report::CompletedAt).string().null())
                    .to_owned(),
            )
            .await?;

        // 按调用方查询历史
        manager
            .create_index(
                Index::create()
                    .name("idx_reports_caller_created")
                    .table(Report::Table)
                    .col(Report::CallerId)
                    .col(Report::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_reports_caller_created")
                    .table(Report::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Report {
    #[sea_orm(iden = "reports")]
    Table,
    Id,
    CallerId,
    Host,
    Port,
    Kind,
    Concurrency,
    DurationSecs,
    Payload,
    Status,
    CreatedAt,
    CompletedAt,
}
