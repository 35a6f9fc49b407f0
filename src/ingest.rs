
use std::{io::SeekFrom, time::Instant};

use actix_web::web::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    error::{Error, UploadError},
    object_key::ObjectKey,
    repo::{ArcRepo, Video},
    state::State,
    store::Store,
    tmp_file::{TmpDir, TmpFile},
};

const ACCEPTED_MEDIA_TYPE: &str = "video/mp4";

/// An upload written to the scratch directory, rewound and ready for processing
///
/// Dropping it closes the handle and removes the file.
#[derive(Debug)]
pub(crate) struct StagedUpload {
    handle: tokio::fs::File,
    file: TmpFile,
    content_type: mime::Mime,
}

fn validate_content_type(content_type: Option<mime::Mime>) -> Result<mime::Mime, UploadError> {
    match content_type {
        Some(content_type) if content_type.essence_str() == ACCEPTED_MEDIA_TYPE => Ok(content_type),
        Some(content_type) => Err(UploadError::UnsupportedMediaType(
            content_type.essence_str().to_string(),
        )),
        None => Err(UploadError::UnsupportedMediaType(String::from("none"))),
    }
}

/// Fetch the video record and ensure `user_id` owns it
#[tracing::instrument(skip(repo))]
pub(crate) async fn authorize(
    repo: &ArcRepo,
    user_id: Uuid,
    video_id: Uuid,
) -> Result<Video, Error> {
    let Some(video) = repo.video(video_id).await? else {
        return Err(UploadError::RecordNotFound(video_id).into());
    };

    if video.user_id != user_id {
        return Err(UploadError::Forbidden.into());
    }

    Ok(video)
}

/// Copy an uploaded file part into the scratch directory
///
/// The part must declare a media type of `video/mp4`, and no more than `limit` bytes are
/// accepted.
#[tracing::instrument(skip(tmp_dir, stream))]
pub(crate) async fn stage<S, E>(
    tmp_dir: &TmpDir,
    content_type: Option<mime::Mime>,
    mut stream: S,
    limit: u64,
) -> Result<StagedUpload, Error>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    UploadError: From<E>,
{
    let content_type = validate_content_type(content_type)?;

    let file = tmp_dir.tmp_file(Some(".mp4"));

    let mut handle = tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(&file)
        .await
        .map_err(UploadError::Staging)?;

    let mut written: u64 = 0;

    while let Some(bytes) = stream.next().await {
        let bytes = bytes?;

        written += bytes.len() as u64;
        if written > limit {
            return Err(UploadError::PayloadTooLarge(limit).into());
        }

        handle
            .write_all(&bytes)
            .await
            .map_err(UploadError::Staging)?;
    }

    handle.flush().await.map_err(UploadError::Staging)?;
    handle
        .seek(SeekFrom::Start(0))
        .await
        .map_err(UploadError::Staging)?;

    tracing::debug!("Staged {written} bytes");

    Ok(StagedUpload {
        handle,
        file,
        content_type,
    })
}

/// Classify, remux and publish a staged upload, then record its public url on `video`
///
/// Every temporary file is gone by the time this returns, whether or not it succeeded.
#[tracing::instrument(name = "Ingest", skip_all, fields(video_id = %video.id))]
pub(crate) async fn ingest_video<S: Store + 'static>(
    state: &State<S>,
    video: Video,
    staged: StagedUpload,
) -> Result<Video, Error> {
    let start = Instant::now();

    let res = do_ingest(state, video, staged).await;

    let completed = res.is_ok().to_string();
    metrics::histogram!(crate::init_metrics::INGEST_DURATION, "completed" => completed.clone())
        .record(start.elapsed().as_secs_f64());
    metrics::counter!(crate::init_metrics::INGEST_END, "completed" => completed).increment(1);

    res
}

async fn do_ingest<S: Store + 'static>(
    state: &State<S>,
    video: Video,
    staged: StagedUpload,
) -> Result<Video, Error> {
    let media = &state.config.media;

    // staged stays whole until cleanup so the handle closes before the file is removed
    let aspect_ratio = crate::probe::aspect_ratio(&media.ffprobe, &staged.file)
        .await
        .map_err(UploadError::Classification)?;

    let processing = crate::faststart::fast_start(&media.ffmpeg, &staged.file)
        .await
        .map_err(UploadError::Transcode)?;

    let final_path = staged.file.to_path_buf();

    let StagedUpload {
        handle,
        file,
        content_type,
    } = staged;

    drop(handle);
    file.cleanup().await.map_err(UploadError::Staging)?;

    let processed = processing
        .rename(final_path)
        .await
        .map_err(UploadError::Rename)?;

    let reader = tokio::fs::File::open(&processed).await?;

    let label = aspect_ratio.label(&media.aspect_labels);
    let key = ObjectKey::generate(media.prefix_keys.then_some(label))?;

    state
        .store
        .save_async_read(reader, &key, &content_type)
        .instrument(tracing::info_span!("Upload video", %key))
        .await?;

    let url = state.store.public_url(&key)?;

    let video = Video {
        video_url: Some(url.to_string()),
        ..video
    };

    state.repo.update_video(&video).await?;

    if let Err(e) = processed.cleanup().await {
        tracing::warn!("Failed to remove processed video: {e}");
    }

    Ok(video)
}
