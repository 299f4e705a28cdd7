use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Sessions::BaseWord).string().not_null())
                    .col(ColumnDef::new(Sessions::Phase).string().not_null())
                    .col(
                        ColumnDef::new(Sessions::RoundIndex)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Sessions::TimeLimitSeconds).integer().not_null())
                    .col(ColumnDef::new(Sessions::MaxPlayers).integer().not_null())
                    .col(
                        ColumnDef::new(Sessions::IsPublic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Sessions::CountdownEndsAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Sessions::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Sessions::ValidWords).text().not_null())
                    .col(
                        ColumnDef::new(Sessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sessions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Discovery listing filters on these
        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_public_phase")
                    .table(Sessions::Table)
                    .col(Sessions::IsPublic)
                    .col(Sessions::Phase)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SessionPlayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionPlayers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SessionPlayers::SessionId).string().not_null())
                    .col(ColumnDef::new(SessionPlayers::UserId).string().not_null())
                    .col(ColumnDef::new(SessionPlayers::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(SessionPlayers::IsHost)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SessionPlayers::Ready)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SessionPlayers::Score)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SessionPlayers::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_players_session")
                            .from(SessionPlayers::Table, SessionPlayers::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per user per session; re-joins update this row
        manager
            .create_index(
                Index::create()
                    .name("idx_session_players_session_user")
                    .table(SessionPlayers::Table)
                    .col(SessionPlayers::SessionId)
                    .col(SessionPlayers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // At most one host per session
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_session_players_one_host \
                 ON session_players (session_id) WHERE is_host",
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FoundWords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FoundWords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FoundWords::SessionId).string().not_null())
                    .col(ColumnDef::new(FoundWords::UserId).string().not_null())
                    .col(ColumnDef::new(FoundWords::RoundIndex).integer().not_null())
                    .col(ColumnDef::new(FoundWords::Word).string().not_null())
                    .col(ColumnDef::new(FoundWords::Points).integer().not_null())
                    .col(
                        ColumnDef::new(FoundWords::FoundAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_found_words_session")
                            .from(FoundWords::Table, FoundWords::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The at-most-once scoring guard
        manager
            .create_index(
                Index::create()
                    .name("idx_found_words_unique")
                    .table(FoundWords::Table)
                    .col(FoundWords::SessionId)
                    .col(FoundWords::UserId)
                    .col(FoundWords::RoundIndex)
                    .col(FoundWords::Word)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FoundWords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SessionPlayers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    BaseWord,
    Phase,
    RoundIndex,
    TimeLimitSeconds,
    MaxPlayers,
    IsPublic,
    CountdownEndsAt,
    StartedAt,
    ValidWords,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SessionPlayers {
    Table,
    Id,
    SessionId,
    UserId,
    DisplayName,
    IsHost,
    Ready,
    Score,
    JoinedAt,
}

#[derive(DeriveIden)]
enum FoundWords {
    Table,
    Id,
    SessionId,
    UserId,
    RoundIndex,
    Word,
    Points,
    FoundAt,
}
