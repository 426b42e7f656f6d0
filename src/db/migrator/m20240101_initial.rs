use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        for stmt in [
            schema.create_table_from_entity(Anime).if_not_exists().to_owned(),
            schema.create_table_from_entity(AnimeSource).if_not_exists().to_owned(),
            schema.create_table_from_entity(Episode).if_not_exists().to_owned(),
            schema.create_table_from_entity(AnimeMetadata).if_not_exists().to_owned(),
            schema.create_table_from_entity(AnimeAliases).if_not_exists().to_owned(),
            schema.create_table_from_entity(TmdbEpisodeMapping).if_not_exists().to_owned(),
            schema.create_table_from_entity(TaskHistory).if_not_exists().to_owned(),
            schema.create_table_from_entity(RateLimitState).if_not_exists().to_owned(),
            schema.create_table_from_entity(CacheEntry).if_not_exists().to_owned(),
            schema.create_table_from_entity(ConfigKv).if_not_exists().to_owned(),
            schema.create_table_from_entity(User).if_not_exists().to_owned(),
            schema.create_table_from_entity(UserSession).if_not_exists().to_owned(),
            schema.create_table_from_entity(ApiToken).if_not_exists().to_owned(),
            schema.create_table_from_entity(ExternalApiLog).if_not_exists().to_owned(),
            schema.create_table_from_entity(TokenAccessLog).if_not_exists().to_owned(),
        ] {
            manager.create_table(stmt).await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_anime_source_provider_media")
                    .table(AnimeSource)
                    .col(crate::entities::anime_source::Column::ProviderName)
                    .col(crate::entities::anime_source::Column::MediaId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_episode_source_index")
                    .table(Episode)
                    .col(crate::entities::episode::Column::SourceId)
                    .col(crate::entities::episode::Column::EpisodeIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_history_unique_key")
                    .table(TaskHistory)
                    .col(crate::entities::task_history::Column::UniqueKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TokenAccessLog).to_owned()).await?;
        manager.drop_table(Table::drop().table(ExternalApiLog).to_owned()).await?;
        manager.drop_table(Table::drop().table(ApiToken).to_owned()).await?;
        manager.drop_table(Table::drop().table(UserSession).to_owned()).await?;
        manager.drop_table(Table::drop().table(User).to_owned()).await?;
        manager.drop_table(Table::drop().table(ConfigKv).to_owned()).await?;
        manager.drop_table(Table::drop().table(CacheEntry).to_owned()).await?;
        manager.drop_table(Table::drop().table(RateLimitState).to_owned()).await?;
        manager.drop_table(Table::drop().table(TaskHistory).to_owned()).await?;
        manager.drop_table(Table::drop().table(TmdbEpisodeMapping).to_owned()).await?;
        manager.drop_table(Table::drop().table(AnimeAliases).to_owned()).await?;
        manager.drop_table(Table::drop().table(AnimeMetadata).to_owned()).await?;
        manager.drop_table(Table::drop().table(Episode).to_owned()).await?;
        manager.drop_table(Table::drop().table(AnimeSource).to_owned()).await?;
        manager.drop_table(Table::drop().table(Anime).to_owned()).await?;
        Ok(())
    }
}
