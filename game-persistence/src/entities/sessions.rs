use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub base_word: String,
    pub phase: String,
    pub round_index: i32,
    pub time_limit_seconds: i32,
    pub max_players: i32,
    pub is_public: bool,
    pub countdown_ends_at: Option<DateTimeWithTimeZone>,
    pub started_at: Option<DateTimeWithTimeZone>,
    /// JSON array of lowercase words, replaced together with `base_word`.
    #[sea_orm(column_type = "Text")]
    pub valid_words: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_players::Entity")]
    SessionPlayers,
    #[sea_orm(has_many = "super::found_words::Entity")]
    FoundWords,
}

impl Related<super::session_players::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionPlayers.def()
    }
}

impl Related<super::found_words::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoundWords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
