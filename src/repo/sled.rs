use std::path::Path;

use sled::{Db, IVec, Tree};
use uuid::Uuid;

use crate::{
    error_code::ErrorCode,
    repo::{RepoError, Video, VideoRepo},
};

macro_rules! b {
    ($self:ident.$ident:ident, $expr:expr) => {{
        let $ident = $self.$ident.clone();

        let span = tracing::Span::current();

        actix_web::rt::task::spawn_blocking(move || span.in_scope(|| $expr))
            .await
            .map_err(|_| SledError::Panic)?
            .map_err(SledError::from)?
    }};
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SledError {
    #[error("Error in database")]
    Sled(#[from] sled::Error),

    #[error("Invalid video json")]
    Video(#[from] serde_json::Error),

    #[error("Operation panicked")]
    Panic,
}

impl SledError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Sled(_) | Self::Video(_) => ErrorCode::SLED_ERROR,
            Self::Panic => ErrorCode::PANIC,
        }
    }
}

#[derive(Clone)]
pub(crate) struct SledRepo {
    videos: Tree,
    db: Db,
}

impl std::fmt::Debug for SledRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledRepo").finish()
    }
}

impl SledRepo {
    #[tracing::instrument]
    pub(crate) fn build(path: &Path, cache_capacity: u64) -> Result<Self, SledError> {
        let db = sled::Config::new()
            .path(path)
            .cache_capacity(cache_capacity)
            .open()?;

        Self::new(db)
    }

    pub(crate) fn new(db: Db) -> Result<Self, SledError> {
        Ok(SledRepo {
            videos: db.open_tree("tubely-videos-tree")?,
            db,
        })
    }
}

fn video_bytes(video: &Video) -> Result<IVec, SledError> {
    Ok(IVec::from(serde_json::to_vec(video)?))
}

#[async_trait::async_trait(?Send)]
impl VideoRepo for SledRepo {
    async fn health_check(&self) -> Result<(), RepoError> {
        let next = self.db.generate_id().map_err(SledError::from)?;

        tracing::trace!("Generated health check id {next}");

        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self))]
    async fn video(&self, id: Uuid) -> Result<Option<Video>, RepoError> {
        let opt = b!(self.videos, videos.get(id.as_bytes()));

        let Some(ivec) = opt else {
            return Ok(None);
        };

        let video = serde_json::from_slice(&ivec).map_err(SledError::from)?;

        Ok(Some(video))
    }

    #[tracing::instrument(level = "trace", skip(self, video), fields(id = %video.id))]
    async fn create_video(&self, video: &Video) -> Result<(), RepoError> {
        let key = video.id;
        let value = video_bytes(video)?;

        b!(self.videos, videos.insert(key.as_bytes(), value));

        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self, video), fields(id = %video.id))]
    async fn update_video(&self, video: &Video) -> Result<(), RepoError> {
        let key = video.id;
        let value = video_bytes(video)?;

        let previous = b!(
            self.videos,
            videos.fetch_and_update(key.as_bytes(), |current| current.map(|_| value.clone()))
        );

        if previous.is_none() {
            return Err(RepoError::Missing(key));
        }

        Ok(())
    }
}
