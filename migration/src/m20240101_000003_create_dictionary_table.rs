use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DictionaryWords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DictionaryWords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DictionaryWords::Word)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(DictionaryWords::Canonical).string().not_null())
                    .col(ColumnDef::new(DictionaryWords::Length).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Solver lookups are by canonical form
        manager
            .create_index(
                Index::create()
                    .name("idx_dictionary_words_canonical")
                    .table(DictionaryWords::Table)
                    .col(DictionaryWords::Canonical)
                    .to_owned(),
            )
            .await?;

        // Base word selection is by length
        manager
            .create_index(
                Index::create()
                    .name("idx_dictionary_words_length")
                    .table(DictionaryWords::Table)
                    .col(DictionaryWords::Length)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DictionaryWords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DictionaryWords {
    Table,
    Id,
    Word,
    Canonical,
    Length,
}
