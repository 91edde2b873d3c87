//! Video service: publishing, listing and managing videos.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};
use vidtube_common::{
    AppError, AppResult, IdGenerator, MediaKind, Page, PageQuery, SortDirection, ensure_valid_id,
};
use vidtube_db::{
    entities::video,
    repositories::{VideoRepository, VideoSearch, VideoSortField},
    views::VideoWithOwner,
};

use super::{
    ensure_owner,
    media::{MediaService, MediaUpload},
    not_blank, validate_with_files,
};

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    video_repo: VideoRepository,
    media: MediaService,
    id_gen: IdGenerator,
}

/// Input for publishing a video.
#[derive(Debug, Validate)]
pub struct PublishVideoInput {
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub title: String,

    #[validate(custom(function = "not_blank"), length(max = 5000))]
    pub description: String,

    /// Length in seconds, as sent by the client.
    #[validate(custom(function = "valid_duration"))]
    pub duration: String,

    pub video_file: Option<MediaUpload>,
    pub thumbnail: Option<MediaUpload>,
}

/// Input for updating a video. Absent fields are left unchanged.
#[derive(Debug, Default, Validate)]
pub struct UpdateVideoInput {
    #[validate(custom(function = "not_blank"), length(max = 200))]
    pub title: Option<String>,

    #[validate(custom(function = "not_blank"), length(max = 5000))]
    pub description: Option<String>,

    pub thumbnail: Option<MediaUpload>,
}

/// Query parameters of the public video listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

fn parse_duration(value: &str) -> Option<i32> {
    let seconds: f64 = value.trim().parse().ok()?;
    if seconds.is_finite() && (0.0..=f64::from(i32::MAX)).contains(&seconds) {
        Some(seconds.round() as i32)
    } else {
        None
    }
}

fn valid_duration(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("is required".into());
        return Err(err);
    }
    if parse_duration(value).is_none() {
        let mut err = ValidationError::new("duration");
        err.message = Some("must be a non-negative number of seconds".into());
        return Err(err);
    }
    Ok(())
}

impl VideoListQuery {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }

    /// Turn the raw parameters into a search, collecting every bad value.
    fn to_search(&self) -> AppResult<VideoSearch> {
        let mut violations = Vec::new();

        let sort_by = match self.sort_by.as_deref() {
            None | Some("") => VideoSortField::default(),
            Some(value) => VideoSortField::parse(value).unwrap_or_else(|| {
                violations.push(format!(
                    "sortBy: must be one of createdAt, views, duration, title (got {value})"
                ));
                VideoSortField::default()
            }),
        };

        let direction = match self.sort_type.as_deref().map(str::to_ascii_lowercase) {
            None => SortDirection::default(),
            Some(value) => match value.as_str() {
                "" | "desc" => SortDirection::Desc,
                "asc" => SortDirection::Asc,
                _ => {
                    violations.push(format!("sortType: must be asc or desc (got {value})"));
                    SortDirection::default()
                }
            },
        };

        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        let owner_id = match self.user_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(id) => Some(ensure_valid_id(id, "user")?),
        };

        Ok(VideoSearch {
            query: self.query.clone(),
            owner_id,
            sort_by,
            direction,
        })
    }
}

impl VideoService {
    /// Create a new video service.
    #[must_use]
    pub const fn new(video_repo: VideoRepository, media: MediaService) -> Self {
        Self {
            video_repo,
            media,
            id_gen: IdGenerator::new(),
        }
    }

    /// Publish a new video owned by `owner_id`.
    ///
    /// Nothing is uploaded unless the whole input is valid.
    pub async fn publish(
        &self,
        owner_id: &str,
        input: PublishVideoInput,
    ) -> AppResult<video::Model> {
        validate_with_files(
            &input,
            &[
                (MediaKind::Video.field_name(), input.video_file.is_some()),
                (MediaKind::Thumbnail.field_name(), input.thumbnail.is_some()),
            ],
        )?;

        let (Some(video_file), Some(thumbnail_file)) = (&input.video_file, &input.thumbnail)
        else {
            return Err(AppError::invalid("videoFile: file is required"));
        };
        let duration = parse_duration(&input.duration)
            .ok_or_else(|| AppError::invalid("duration: must be a non-negative number"))?;

        let video_asset = self
            .media
            .upload(MediaKind::Video, owner_id, video_file)
            .await?;
        let thumbnail_asset = match self
            .media
            .upload(MediaKind::Thumbnail, owner_id, thumbnail_file)
            .await
        {
            Ok(asset) => asset,
            Err(e) => {
                self.media.discard(&video_asset.url).await;
                return Err(e);
            }
        };

        let model = video::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description.trim().to_string()),
            video_url: Set(video_asset.url.clone()),
            thumbnail_url: Set(thumbnail_asset.url.clone()),
            duration: Set(duration),
            views: Set(0),
            is_published: Set(true),
            owner_id: Set(owner_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        match self.video_repo.create(model).await {
            Ok(video) => {
                info!(video_id = %video.id, owner_id, "Published video");
                Ok(video)
            }
            Err(e) => {
                self.media.discard(&video_asset.url).await;
                self.media.discard(&thumbnail_asset.url).await;
                Err(e)
            }
        }
    }

    /// Public listing of published videos.
    pub async fn list(&self, query: &VideoListQuery) -> AppResult<Page<VideoWithOwner>> {
        let search = query.to_search()?;
        self.video_repo.search(&search, &query.page_query()).await
    }

    /// Fetch a video for `viewer_id` and count the view.
    ///
    /// Drafts are only visible to their owner.
    pub async fn get(&self, id: &str, viewer_id: Option<&str>) -> AppResult<VideoWithOwner> {
        let mut found = self
            .video_repo
            .find_with_owner(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        if !found.video.is_published && viewer_id != Some(found.video.owner_id.as_str()) {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        self.video_repo.increment_views(id).await?;
        found.video.views += 1;
        Ok(found)
    }

    /// Update title, description and/or thumbnail of a video.
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        input: UpdateVideoInput,
    ) -> AppResult<video::Model> {
        input.validate()?;
        if input.title.is_none() && input.description.is_none() && input.thumbnail.is_none() {
            return Err(AppError::invalid(
                "title, description or thumbnail is required",
            ));
        }

        let video = self.get_owned(id, user_id).await?;
        let old_thumbnail = video.thumbnail_url.clone();

        let new_thumbnail = match &input.thumbnail {
            Some(file) => Some(
                self.media
                    .upload(MediaKind::Thumbnail, user_id, file)
                    .await?
                    .url,
            ),
            None => None,
        };

        let mut active: video::ActiveModel = video.into();
        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(url) = &new_thumbnail {
            active.thumbnail_url = Set(url.clone());
        }
        active.updated_at = Set(Some(Utc::now().into()));

        match self.video_repo.update(active).await {
            Ok(video) => {
                if new_thumbnail.is_some() {
                    self.media.discard(&old_thumbnail).await;
                }
                Ok(video)
            }
            Err(e) => {
                if let Some(url) = new_thumbnail {
                    self.media.discard(&url).await;
                }
                Err(e)
            }
        }
    }

    /// Delete a video and release its assets.
    pub async fn delete(&self, id: &str, user_id: &str) -> AppResult<()> {
        let video = self.get_owned(id, user_id).await?;

        self.media.delete_url(&video.video_url).await?;
        self.media.delete_url(&video.thumbnail_url).await?;
        self.video_repo.delete(id).await?;

        info!(video_id = id, user_id, "Deleted video");
        Ok(())
    }

    /// Flip a video between draft and published.
    pub async fn toggle_publish(&self, id: &str, user_id: &str) -> AppResult<video::Model> {
        let video = self.get_owned(id, user_id).await?;
        let published = !video.is_published;

        let mut active: video::ActiveModel = video.into();
        active.is_published = Set(published);
        active.updated_at = Set(Some(Utc::now().into()));
        let video = self.video_repo.update(active).await?;

        info!(video_id = id, published, "Toggled publish status");
        Ok(video)
    }

    async fn get_owned(&self, id: &str, user_id: &str) -> AppResult<video::Model> {
        let video = self
            .video_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        ensure_owner(&video.owner_id, user_id, "video")?;
        Ok(video)
    }
}
