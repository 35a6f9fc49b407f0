use std::{fmt::Debug, sync::Arc};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::error_code::ErrorCode;

pub(crate) mod sled;

pub(crate) type ArcRepo = Arc<dyn VideoRepo>;

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub(crate) struct Video {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) video_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct NewVideo {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
}

impl Video {
    pub(crate) fn draft(user_id: Uuid, new: NewVideo) -> Self {
        let now = OffsetDateTime::now_utc();

        Video {
            id: Uuid::new_v4(),
            user_id,
            title: new.title,
            description: new.description,
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RepoError {
    #[error("Error in sled")]
    SledError(#[from] crate::repo::sled::SledError),

    #[error("Video {0} does not exist")]
    Missing(Uuid),
}

impl RepoError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::SledError(e) => e.error_code(),
            Self::Missing(_) => ErrorCode::VIDEO_NOT_FOUND,
        }
    }
}

#[async_trait::async_trait(?Send)]
pub(crate) trait VideoRepo: Debug + Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;

    async fn video(&self, id: Uuid) -> Result<Option<Video>, RepoError>;

    async fn create_video(&self, video: &Video) -> Result<(), RepoError>;

    /// Replace an existing record, failing with [`RepoError::Missing`] if it is gone
    async fn update_video(&self, video: &Video) -> Result<(), RepoError>;
}
