use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Newest-first listing
        manager
            .create_index(
                Index::create()
                    .name("idx_conversation_created_at")
                    .table(Conversation::Table)
                    .col(Conversation::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Most-viewed listing
        manager
            .create_index(
                Index::create()
                    .name("idx_conversation_views")
                    .table(Conversation::Table)
                    .col(Conversation::Views)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_conversation_views").table(Conversation::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_conversation_created_at").table(Conversation::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Conversation { Table, CreatedAt, Views }
