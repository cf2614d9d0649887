use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GuestLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GuestLinks::Id)
                            .string_len(16)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GuestLinks::Label)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(GuestLinks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GuestLinks::UrlExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GuestLinks::FileLifetimeDays).integer())
                    .col(ColumnDef::new(GuestLinks::MaxFileBytes).big_integer())
                    .col(ColumnDef::new(GuestLinks::MaxFileUploads).integer())
                    .to_owned(),
            )
            .await?;

        // Supports querying links by expiration time
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-guest_links-url_expires_at")
                    .table(GuestLinks::Table)
                    .col(GuestLinks::UrlExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GuestLinks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GuestLinks {
    Table,
    Id,
    Label,
    CreatedAt,
    UrlExpiresAt,
    FileLifetimeDays,
    MaxFileBytes,
    MaxFileUploads,
}
