//! Create like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Like::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Like::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Like::VideoId).string_len(32))
                    .col(ColumnDef::new(Like::CommentId).string_len(32))
                    .col(ColumnDef::new(Like::TweetId).string_len(32))
                    .col(ColumnDef::new(Like::LikedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Like::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_like_liked_by")
                            .from(Like::Table, Like::LikedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Exactly one target per like
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE "like"
                ADD CONSTRAINT chk_like_single_target
                CHECK (num_nonnulls(video_id, comment_id, tweet_id) = 1);
                "#,
            )
            .await?;

        // One like per user per target. NULL targets never collide.
        for (name, target) in [
            ("idx_like_liked_by_video", Like::VideoId),
            ("idx_like_liked_by_comment", Like::CommentId),
            ("idx_like_liked_by_tweet", Like::TweetId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Like::Table)
                        .col(Like::LikedBy)
                        .col(target)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        // Index: video_id for counting likes on a channel's videos
        manager
            .create_index(
                Index::create()
                    .name("idx_like_video_id")
                    .table(Like::Table)
                    .col(Like::VideoId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Like::Table).to_owned())
            .await
    }
}

#[derive(Iden, Clone, Copy)]
enum Like {
    Table,
    Id,
    VideoId,
    CommentId,
    TweetId,
    LikedBy,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
