#[cfg(test)]
mod tests;

use std::{ffi::OsStr, path::Path};

use crate::{
    config::AspectLabels,
    error_code::ErrorCode,
    process::{Process, ProcessError},
};

#[derive(Debug, serde::Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

// audio and data streams carry no dimensions
#[derive(Debug, serde::Deserialize)]
struct ProbeStream {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProbeError {
    #[error("Error in ffprobe process")]
    Process(#[source] ProcessError),

    #[error("Invalid ffprobe output")]
    Json(#[source] serde_json::Error),

    #[error("Unable to find width and height details about the video")]
    NoStreams,
}

impl ProbeError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Process(e) => e.error_code(),
            Self::Json(_) => ErrorCode::PROBE_OUTPUT,
            Self::NoStreams => ErrorCode::PROBE_NO_STREAMS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    pub(crate) fn from_dimensions(width: u32, height: u32) -> Self {
        let ratio = f64::from(width) / f64::from(height);

        if (1.7..=1.8).contains(&ratio) {
            AspectRatio::Landscape
        } else if (0.5..=0.6).contains(&ratio) {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub(crate) fn label<'a>(&self, labels: &'a AspectLabels) -> &'a str {
        match self {
            AspectRatio::Landscape => &labels.landscape,
            AspectRatio::Portrait => &labels.portrait,
            AspectRatio::Other => &labels.other,
        }
    }
}

/// Classify the first stream of the media file at `path`
#[tracing::instrument(skip(ffprobe))]
pub(crate) async fn aspect_ratio(ffprobe: &str, path: &Path) -> Result<AspectRatio, ProbeError> {
    let process = Process::run(
        ffprobe,
        &[
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_streams"),
            path.as_os_str(),
        ],
    )
    .map_err(ProbeError::Process)?;

    let output = process.output().await.map_err(ProbeError::Process)?;

    let aspect = parse_aspect_ratio(&output)?;

    tracing::debug!("Classified as {aspect:?}");

    Ok(aspect)
}

fn parse_aspect_ratio(output: &[u8]) -> Result<AspectRatio, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(output).map_err(ProbeError::Json)?;

    let stream = output.streams.first().ok_or(ProbeError::NoStreams)?;

    Ok(AspectRatio::from_dimensions(stream.width, stream.height))
}
