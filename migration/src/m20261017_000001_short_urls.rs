use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShortUrl::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ShortUrl::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ShortUrl::UserId).string().not_null())
                    .col(ColumnDef::new(ShortUrl::CorrelationId).string().null())
                    .col(ColumnDef::new(ShortUrl::OriginalUrl).text().not_null())
                    .col(ColumnDef::new(ShortUrl::ShortUrl).string().not_null())
                    .col(
                        ColumnDef::new(ShortUrl::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ShortUrl::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // First writer wins on the original URL
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_short_urls_original_url")
                    .table(ShortUrl::Table)
                    .col(ShortUrl::OriginalUrl)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Aliases are unique within one caller's namespace
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_short_urls_user_short")
                    .table(ShortUrl::Table)
                    .col(ShortUrl::UserId)
                    .col(ShortUrl::ShortUrl)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_short_urls_user_short").to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("uq_short_urls_original_url").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ShortUrl::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShortUrl {
    #[sea_orm(iden = "short_urls")]
    Table,
    Id,
    UserId,
    CorrelationId,
    OriginalUrl,
    ShortUrl,
    IsDeleted,
    CreatedAt,
}
