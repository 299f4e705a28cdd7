use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key to sessions: history outlives the session.
        manager
            .create_table(
                Table::create()
                    .table(ScoreHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScoreHistory::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(ScoreHistory::SessionId).string().not_null())
                    .col(ColumnDef::new(ScoreHistory::UserId).string().not_null())
                    .col(ColumnDef::new(ScoreHistory::DisplayName).string().not_null())
                    .col(ColumnDef::new(ScoreHistory::RoundIndex).integer().not_null())
                    .col(ColumnDef::new(ScoreHistory::BaseWord).string().not_null())
                    .col(ColumnDef::new(ScoreHistory::Words).text().not_null())
                    .col(ColumnDef::new(ScoreHistory::ClaimedScore).integer().not_null())
                    .col(ColumnDef::new(ScoreHistory::Score).integer().not_null())
                    .col(
                        ColumnDef::new(ScoreHistory::Flagged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ScoreHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_score_history_round")
                    .table(ScoreHistory::Table)
                    .col(ScoreHistory::SessionId)
                    .col(ScoreHistory::UserId)
                    .col(ScoreHistory::RoundIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_score_history_user")
                    .table(ScoreHistory::Table)
                    .col(ScoreHistory::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScoreHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScoreHistory {
    Table,
    Id,
    SessionId,
    UserId,
    DisplayName,
    RoundIndex,
    BaseWord,
    Words,
    ClaimedScore,
    Score,
    Flagged,
    CreatedAt,
}
