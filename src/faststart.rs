use std::{ffi::OsStr, path::Path};

use crate::{
    error_code::ErrorCode,
    process::{Process, ProcessError},
    tmp_file::TmpFile,
};

const PROCESSING_SUFFIX: &str = ".processing";

#[derive(Debug, thiserror::Error)]
pub(crate) enum FastStartError {
    #[error("Error in ffmpeg process")]
    Process(#[source] ProcessError),

    #[error("ffmpeg exited successfully without producing output")]
    MissingOutput,
}

impl FastStartError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Process(e) => e.error_code(),
            Self::MissingOutput => ErrorCode::COMMAND_FAILURE,
        }
    }
}

/// The path ffmpeg writes to while remuxing `input`
fn processing_path(input: &Path) -> std::path::PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(PROCESSING_SUFFIX);
    path.into()
}

/// Remux `input` so the moov atom sits ahead of the media data
///
/// Streams are copied without re-encoding. The output lives next to the input with a
/// `.processing` suffix and is owned by the returned guard, which removes it on any failure.
#[tracing::instrument(skip(ffmpeg))]
pub(crate) async fn fast_start(ffmpeg: &str, input: &Path) -> Result<TmpFile, FastStartError> {
    let output = TmpFile::new(processing_path(input));

    let process = Process::run(
        ffmpeg,
        &[
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            output.as_os_str(),
        ],
    )
    .map_err(FastStartError::Process)?;

    process.wait().await.map_err(FastStartError::Process)?;

    if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
        return Err(FastStartError::MissingOutput);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::process::ProcessError;

    use super::FastStartError;

    #[test]
    fn processing_path() {
        let processing = super::processing_path(Path::new("/tmp/tubely/upload.mp4"));

        assert_eq!(processing, Path::new("/tmp/tubely/upload.mp4.processing"));
    }

    #[tokio::test]
    async fn missing_ffmpeg() {
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let input = scratch.path().join("upload.mp4");
        std::fs::write(&input, b"video").expect("Wrote input");

        let res = super::fast_start("/nonexistent/ffmpeg", &input).await;

        assert!(
            matches!(res, Err(FastStartError::Process(ProcessError::NotFound(_)))),
            "{res:?}"
        );
        assert!(!super::processing_path(&input).exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn remuxes_next_to_input() {
        let tools = crate::testing::FakeTools::get();
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let input = scratch.path().join("upload.mp4");
        std::fs::write(&input, b"video").expect("Wrote input");

        let output = super::fast_start(&tools.ffmpeg, &input)
            .await
            .expect("Remuxed");

        assert_eq!(&*output, super::processing_path(&input));
        assert_eq!(std::fs::read(&output).expect("Read output"), b"video");

        let path = output.to_path_buf();
        drop(output);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_leaves_no_output() {
        let tools = crate::testing::FakeTools::get();
        let scratch = tempfile::tempdir().expect("Created scratch dir");
        let input = scratch.path().join("upload.mp4");
        std::fs::write(&input, b"video").expect("Wrote input");

        let res = super::fast_start(&tools.partial_ffmpeg, &input).await;

        assert!(
            matches!(res, Err(FastStartError::Process(ProcessError::Status(..)))),
            "{res:?}"
        );
        assert!(!super::processing_path(&input).exists());
    }
}
