//! Create `conversation` table.
//!
//! `content` holds the serialized conversation body; listings never select it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Conversation::Table)
                    .if_not_exists()
                    .col(string_len(Conversation::Id, 64).primary_key())
                    .col(string(Conversation::Title).not_null())
                    .col(
                        ColumnDef::new(Conversation::Excerpt)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Conversation::Author)
                            .string_len(255)
                            .null(),
                    )
                    .col(text(Conversation::Content).not_null())
                    .col(big_integer(Conversation::Views).not_null().default(0))
                    .col(timestamp_with_time_zone(Conversation::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Conversation::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Conversation { Table, Id, Title, Excerpt, Author, Content, Views, CreatedAt }
