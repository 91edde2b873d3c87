//! Playlist service.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;
use vidtube_common::{AppError, AppResult, IdGenerator};
use vidtube_db::{
    entities::playlist,
    repositories::{PlaylistRepository, UserRepository, VideoRepository},
    views::VideoWithOwner,
};

use super::{ensure_owner, not_blank};

/// Playlist service for business logic.
#[derive(Clone)]
pub struct PlaylistService {
    playlist_repo: PlaylistRepository,
    video_repo: VideoRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a playlist.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistInput {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: String,

    #[validate(length(max = 1000))]
    #[serde(default)]
    pub description: String,
}

/// Input for updating a playlist. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePlaylistInput {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// A playlist with the videos the viewer may see, in playlist order.
#[derive(Debug, Clone)]
pub struct PlaylistDetails {
    pub playlist: playlist::Model,
    pub videos: Vec<VideoWithOwner>,
}

impl PlaylistService {
    /// Create a new playlist service.
    #[must_use]
    pub const fn new(
        playlist_repo: PlaylistRepository,
        video_repo: VideoRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            playlist_repo,
            video_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a playlist owned by `user_id`.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreatePlaylistInput,
    ) -> AppResult<playlist::Model> {
        input.validate()?;

        let model = playlist::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description.trim().to_string()),
            owner_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let playlist = self.playlist_repo.create(model).await?;
        info!(playlist_id = %playlist.id, user_id, "Created playlist");
        Ok(playlist)
    }

    /// A playlist and its videos as seen by `viewer_id`.
    pub async fn get(&self, id: &str, viewer_id: Option<&str>) -> AppResult<PlaylistDetails> {
        let playlist = self.find(id).await?;

        let videos = self
            .playlist_repo
            .find_videos(id)
            .await?
            .into_iter()
            .filter(|v| v.video.is_published || viewer_id == Some(v.video.owner_id.as_str()))
            .collect();

        Ok(PlaylistDetails { playlist, videos })
    }

    /// Playlists of `user_id`, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<playlist::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.playlist_repo.find_by_owner(user_id).await
    }

    /// Append `video_id` to a playlist. Adding a video twice is a no-op.
    pub async fn add_video(
        &self,
        id: &str,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<playlist::Model> {
        let playlist = self.get_owned(id, user_id).await?;

        if self.video_repo.find_by_id(video_id).await?.is_none() {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        let added = self
            .playlist_repo
            .add_video(self.id_gen.generate(), id, video_id)
            .await?;
        if added {
            info!(playlist_id = id, video_id, "Added video to playlist");
        }
        Ok(playlist)
    }

    /// Remove `video_id` from a playlist. Removing an absent video is a no-op.
    pub async fn remove_video(
        &self,
        id: &str,
        video_id: &str,
        user_id: &str,
    ) -> AppResult<playlist::Model> {
        let playlist = self.get_owned(id, user_id).await?;

        if self.playlist_repo.remove_video(id, video_id).await? {
            info!(playlist_id = id, video_id, "Removed video from playlist");
        }
        Ok(playlist)
    }

    /// Rename or re-describe a playlist.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: UpdatePlaylistInput,
    ) -> AppResult<playlist::Model> {
        input.validate()?;
        if input.name.is_none() && input.description.is_none() {
            return Err(AppError::invalid("name or description is required"));
        }

        let playlist = self.get_owned(id, user_id).await?;
        let mut active: playlist::ActiveModel = playlist.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description.trim().to_string());
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.playlist_repo.update(active).await
    }

    /// Delete a playlist and its entries.
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        self.get_owned(id, user_id).await?;
        self.playlist_repo.delete(id).await?;

        info!(playlist_id = id, user_id, "Deleted playlist");
        Ok(())
    }

    async fn find(&self, id: &str) -> AppResult<playlist::Model> {
        self.playlist_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))
    }

    async fn get_owned(&self, id: &str, user_id: &str) -> AppResult<playlist::Model> {
        let playlist = self.find(id).await?;
        ensure_owner(&playlist.owner_id, user_id, "playlist")?;
        Ok(playlist)
    }
}
