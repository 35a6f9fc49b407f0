use crate::{config::AspectLabels, process::ProcessError};

use super::{AspectRatio, ProbeError};

fn classification_tests() -> [(&'static str, AspectRatio); 4] {
    [
        ("landscape", AspectRatio::Landscape),
        ("portrait", AspectRatio::Portrait),
        ("square", AspectRatio::Other),
        // only the first stream is consulted, and it has no dimensions
        ("audio_first", AspectRatio::Other),
    ]
}

#[test]
fn parse_fixtures() {
    for (case, expected) in classification_tests() {
        let bytes = std::fs::read(format!("./src/probe/ffprobe_{case}.json")).expect("Read file");

        let output = super::parse_aspect_ratio(&bytes).expect("Parsed output");

        assert_eq!(output, expected, "{case}");
    }
}

#[test]
fn no_streams() {
    let bytes = std::fs::read("./src/probe/ffprobe_no_streams.json").expect("Read file");

    let res = super::parse_aspect_ratio(&bytes);
    assert!(matches!(res, Err(ProbeError::NoStreams)), "{res:?}");

    let res = super::parse_aspect_ratio(b"{}");
    assert!(matches!(res, Err(ProbeError::NoStreams)), "{res:?}");
}

#[test]
fn invalid_output() {
    let res = super::parse_aspect_ratio(b"Invalid data found when processing input");

    assert!(matches!(res, Err(ProbeError::Json(_))), "{res:?}");
}

#[test]
fn inclusive_boundaries() {
    let cases = [
        (1700, 1000, AspectRatio::Landscape),
        (1800, 1000, AspectRatio::Landscape),
        (1920, 1080, AspectRatio::Landscape),
        (1699, 1000, AspectRatio::Other),
        (1801, 1000, AspectRatio::Other),
        (500, 1000, AspectRatio::Portrait),
        (600, 1000, AspectRatio::Portrait),
        (1080, 1920, AspectRatio::Portrait),
        (499, 1000, AspectRatio::Other),
        (601, 1000, AspectRatio::Other),
        (1000, 1000, AspectRatio::Other),
        (0, 0, AspectRatio::Other),
        (1920, 0, AspectRatio::Other),
    ];

    for (width, height, expected) in cases {
        assert_eq!(
            AspectRatio::from_dimensions(width, height),
            expected,
            "{width}x{height}"
        );
    }
}

#[test]
fn label_conventions() {
    let orientation = AspectLabels::orientation();
    let ratio = AspectLabels::ratio();

    assert_eq!(AspectRatio::Landscape.label(&orientation), "landscape");
    assert_eq!(AspectRatio::Portrait.label(&orientation), "portrait");
    assert_eq!(AspectRatio::Other.label(&orientation), "other");

    assert_eq!(AspectRatio::Landscape.label(&ratio), "16:9");
    assert_eq!(AspectRatio::Portrait.label(&ratio), "9:16");
    assert_eq!(AspectRatio::Other.label(&ratio), "other");
}

#[tokio::test]
async fn missing_ffprobe() {
    let res = super::aspect_ratio(
        "/nonexistent/ffprobe",
        std::path::Path::new("/nonexistent/video.mp4"),
    )
    .await;

    assert!(
        matches!(res, Err(ProbeError::Process(ProcessError::NotFound(_)))),
        "{res:?}"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn runs_ffprobe() {
    let tools = crate::testing::FakeTools::get();

    let aspect = super::aspect_ratio(&tools.ffprobe_portrait, std::path::Path::new("video.mp4"))
        .await
        .expect("Classified");
    assert_eq!(aspect, AspectRatio::Portrait);

    let res = super::aspect_ratio(&tools.failing, std::path::Path::new("video.mp4")).await;
    assert!(
        matches!(res, Err(ProbeError::Process(ProcessError::Status(..)))),
        "{res:?}"
    );
}
