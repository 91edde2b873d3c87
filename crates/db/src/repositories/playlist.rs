//! Playlist repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Playlist, PlaylistVideo, Video, playlist, playlist_video, video};
use crate::repositories::write_err;
use crate::views::{VideoWithOwner, attach_video_owners};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use vidtube_common::{AppError, AppResult};

/// Playlist repository for database operations.
#[derive(Clone)]
pub struct PlaylistRepository {
    db: Arc<DatabaseConnection>,
}

impl PlaylistRepository {
    /// Create a new playlist repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a playlist by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<playlist::Model>> {
        Playlist::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new playlist.
    pub async fn create(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a playlist.
    pub async fn update(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a playlist. Its entries are removed by the foreign key cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Playlist::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Playlists owned by a user, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<playlist::Model>> {
        Playlist::find()
            .filter(playlist::Column::OwnerId.eq(owner_id))
            .order_by_desc(playlist::Column::CreatedAt)
            .order_by_desc(playlist::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the entry for `video_id` in a playlist.
    pub async fn find_entry(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<Option<playlist_video::Model>> {
        PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_video::Column::VideoId.eq(video_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Append a video to the end of a playlist.
    ///
    /// Returns `false` if the video was already in the playlist.
    pub async fn add_video(
        &self,
        entry_id: String,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<bool> {
        if self.find_entry(playlist_id, video_id).await?.is_some() {
            return Ok(false);
        }

        #[derive(FromQueryResult)]
        struct MaxPosition {
            max_position: Option<i32>,
        }

        let last = PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .select_only()
            .column_as(playlist_video::Column::Position.max(), "max_position")
            .into_model::<MaxPosition>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let position = last.and_then(|r| r.max_position).map_or(0, |p| p + 1);

        let entry = playlist_video::ActiveModel {
            id: Set(entry_id),
            playlist_id: Set(playlist_id.to_string()),
            video_id: Set(video_id.to_string()),
            position: Set(position),
            created_at: Set(Utc::now().into()),
        };

        match entry.insert(self.db.as_ref()).await {
            Ok(_) => Ok(true),
            // Added concurrently
            Err(e) => match write_err(e, "Video already in playlist") {
                AppError::Conflict(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    /// Remove a video from a playlist.
    ///
    /// Returns `false` if the video was not in the playlist.
    pub async fn remove_video(&self, playlist_id: &str, video_id: &str) -> AppResult<bool> {
        let result = PlaylistVideo::delete_many()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_video::Column::VideoId.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Videos in a playlist in position order, joined with their owners.
    ///
    /// Entries whose video no longer exists are skipped.
    pub async fn find_videos(&self, playlist_id: &str) -> AppResult<Vec<VideoWithOwner>> {
        let entries = PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_video::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let video_ids: Vec<String> = entries.iter().map(|e| e.video_id.clone()).collect();
        let mut videos: HashMap<String, video::Model> = Video::find()
            .filter(video::Column::Id.is_in(video_ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        let ordered = entries
            .iter()
            .filter_map(|entry| videos.remove(&entry.video_id))
            .collect();

        attach_video_owners(self.db.as_ref(), ordered).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_entry(id: &str, video_id: &str, position: i32) -> playlist_video::Model {
        playlist_video::Model {
            id: id.to_string(),
            playlist_id: "p1".to_string(),
            video_id: video_id.to_string(),
            position,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_video(id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            title: format!("Video {id}"),
            description: String::new(),
            video_url: format!("memory://media/videos/{id}.mp4"),
            thumbnail_url: format!("memory://media/thumbnails/{id}.png"),
            duration: 10,
            views: 0,
            is_published: true,
            owner_id: "u1".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_user() -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password_hash: "hash".to_string(),
            avatar_url: "memory://media/avatars/u1.png".to_string(),
            cover_image_url: None,
            token: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_add_video_already_present() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_entry("e1", "v1", 0)]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let added = repo.add_video("e2".to_string(), "p1", "v1").await.unwrap();
        assert!(!added);
    }

    #[tokio::test]
    async fn test_add_video_appends() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<playlist_video::Model>::new()])
                .append_query_results([[maplit::btreemap! {
                    "max_position" => sea_orm::Value::Int(Some(1))
                }]])
                .append_query_results([[create_test_entry("e3", "v3", 2)]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let added = repo.add_video("e3".to_string(), "p1", "v3").await.unwrap();
        assert!(added);
    }

    #[tokio::test]
    async fn test_remove_video_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        assert!(!repo.remove_video("p1", "v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_videos_keeps_position_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_entry("e1", "v2", 0),
                    create_test_entry("e2", "gone", 1),
                    create_test_entry("e3", "v1", 2),
                ]])
                // Database order differs from playlist order
                .append_query_results([[create_test_video("v1"), create_test_video("v2")]])
                .append_query_results([[create_test_user()]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let videos = repo.find_videos("p1").await.unwrap();

        let ids: Vec<_> = videos.iter().map(|v| v.video.id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v1"]);
    }
}
