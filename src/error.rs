use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use color_eyre::Report;
use uuid::Uuid;

use crate::error_code::ErrorCode;

pub(crate) struct Error {
    inner: color_eyre::Report,
}

impl Error {
    pub(crate) fn kind(&self) -> Option<&UploadError> {
        self.inner.downcast_ref()
    }

    pub(crate) fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        self.inner.root_cause()
    }

    pub(crate) fn error_code(&self) -> ErrorCode {
        self.kind()
            .map(|e| e.error_code())
            .unwrap_or(ErrorCode::UNKNOWN_ERROR)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.inner, f)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl<T> From<T> for Error
where
    UploadError: From<T>,
{
    fn from(error: T) -> Self {
        Error {
            inner: Report::from(UploadError::from(error)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("Video id is not a valid uuid")]
    InvalidVideoId(#[source] uuid::Error),

    #[error("Couldn't authenticate request")]
    Auth(#[from] crate::auth::AuthError),

    #[error("Video {0} does not exist")]
    RecordNotFound(Uuid),

    #[error("Video is owned by another user")]
    Forbidden,

    #[error("Upload exceeds the maximum size of {0} bytes")]
    PayloadTooLarge(u64),

    #[error("No video present in upload")]
    MissingFile,

    #[error("Unsupported media type {0}, expected video/mp4")]
    UnsupportedMediaType(String),

    #[error("Couldn't parse upload")]
    Form(#[from] actix_form_data::Error),

    #[error("Failed to stage upload")]
    Staging(#[source] std::io::Error),

    #[error("Failed to classify aspect ratio")]
    Classification(#[source] crate::probe::ProbeError),

    #[error("Failed to prepare video for streaming")]
    Transcode(#[source] crate::faststart::FastStartError),

    #[error("Failed to move processed video into place")]
    Rename(#[source] std::io::Error),

    #[error("Error interacting with filesystem")]
    Io(#[from] std::io::Error),

    #[error("Failed to generate storage key")]
    KeyGeneration(#[from] crate::object_key::KeyError),

    #[error("Error in store")]
    Store(#[from] crate::store::StoreError),

    #[error("Error in DB")]
    Repo(#[from] crate::repo::RepoError),
}

impl UploadError {
    const fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidVideoId(_) => ErrorCode::INVALID_VIDEO_ID,
            Self::Auth(e) => e.error_code(),
            Self::RecordNotFound(_) => ErrorCode::VIDEO_NOT_FOUND,
            Self::Forbidden => ErrorCode::NOT_VIDEO_OWNER,
            Self::PayloadTooLarge(_) => ErrorCode::VALIDATE_FILE_SIZE,
            Self::MissingFile => ErrorCode::VALIDATE_NO_FILES,
            Self::UnsupportedMediaType(_) => ErrorCode::VALIDATE_MEDIA_TYPE,
            Self::Form(_) => ErrorCode::FILE_UPLOAD_ERROR,
            Self::Staging(_) => ErrorCode::STAGING_ERROR,
            Self::Classification(e) => e.error_code(),
            Self::Transcode(e) => e.error_code(),
            Self::Rename(_) => ErrorCode::RENAME_ERROR,
            Self::Io(_) => ErrorCode::IO_ERROR,
            Self::KeyGeneration(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Repo(e) => e.error_code(),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            Some(
                UploadError::InvalidVideoId(_)
                | UploadError::MissingFile
                | UploadError::UnsupportedMediaType(_)
                | UploadError::Form(_),
            ) => StatusCode::BAD_REQUEST,
            Some(UploadError::Auth(_)) => StatusCode::UNAUTHORIZED,
            Some(UploadError::Forbidden) => StatusCode::FORBIDDEN,
            Some(
                UploadError::RecordNotFound(_)
                | UploadError::Repo(crate::repo::RepoError::Missing(_)),
            ) => StatusCode::NOT_FOUND,
            Some(UploadError::PayloadTooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let msg = self
            .kind()
            .map(|e| e.to_string())
            .unwrap_or_else(|| self.to_string());

        HttpResponse::build(self.status_code())
            .content_type("application/json")
            .body(
                serde_json::to_string(&serde_json::json!({
                    "msg": msg,
                    "cause": self.root_cause().to_string(),
                    "code": self.error_code()
                }))
                .unwrap_or_else(|_| {
                    r#"{"msg":"Request failed","code":"unknown-error"}"#.to_string()
                }),
            )
    }
}
