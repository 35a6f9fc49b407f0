use std::{
    collections::HashMap,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, OnceLock,
    },
};

use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;
use uuid::Uuid;

use crate::{
    config::ConfigSource,
    object_key::ObjectKey,
    repo::{NewVideo, RepoError, Video, VideoRepo},
    state::State,
    store::{object_store::ObjectError, Store, StoreError},
    tmp_file::TmpDir,
};

pub(crate) const JWT_SECRET: &str = "test-secret";
pub(crate) const BUCKET: &str = "tubely-test";
pub(crate) const REGION: &str = "us-east-1";

/// Shell scripts standing in for ffprobe and ffmpeg
pub(crate) struct FakeTools {
    _dir: tempfile::TempDir,
    pub(crate) ffprobe_landscape: String,
    pub(crate) ffprobe_portrait: String,
    pub(crate) ffprobe_square: String,
    pub(crate) ffprobe_no_streams: String,
    /// copies its input to its output, like a successful remux
    pub(crate) ffmpeg: String,
    /// writes its output, then exits with failure
    pub(crate) partial_ffmpeg: String,
    pub(crate) failing: String,
}

impl FakeTools {
    pub(crate) fn get() -> &'static FakeTools {
        static TOOLS: OnceLock<FakeTools> = OnceLock::new();

        TOOLS.get_or_init(FakeTools::install)
    }

    fn install() -> FakeTools {
        let dir = tempfile::tempdir().expect("Created tools dir");

        let ffprobe = |case: &str| {
            let fixture = Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("src/probe")
                .join(format!("ffprobe_{case}.json"));

            script(
                dir.path(),
                &format!("ffprobe_{case}"),
                &format!("cat '{}'", fixture.display()),
            )
        };

        FakeTools {
            ffprobe_landscape: ffprobe("landscape"),
            ffprobe_portrait: ffprobe("portrait"),
            ffprobe_square: ffprobe("square"),
            ffprobe_no_streams: ffprobe("no_streams"),
            // ffmpeg -i <input> -c copy -movflags faststart -f mp4 <output>
            ffmpeg: script(dir.path(), "ffmpeg", r#"cp "$2" "$9""#),
            partial_ffmpeg: script(
                dir.path(),
                "partial_ffmpeg",
                "echo partial > \"$9\"\necho 'Conversion failed!' >&2\nexit 1",
            ),
            failing: script(dir.path(), "failing", "echo 'Invalid data' >&2\nexit 1"),
            _dir: dir,
        }
    }
}

// Written by a child shell so no writable handle to the script is ever open in this process
// while other tests spawn processes.
fn script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    let path = path.to_str().expect("Utf8 path");

    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(format!(
            "cat > '{path}' <<'TUBELY_SCRIPT'\n#!/bin/sh\n{body}\nTUBELY_SCRIPT\nchmod +x '{path}'"
        ))
        .status()
        .expect("Spawned sh");
    assert!(status.success(), "Failed to write {name}");

    path.to_string()
}

#[derive(Clone, Debug)]
pub(crate) struct StoredObject {
    pub(crate) key: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

/// A store that keeps uploads in memory
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordingStore {
    objects: Arc<Mutex<Vec<StoredObject>>>,
    fail: bool,
}

impl RecordingStore {
    pub(crate) fn failing() -> Self {
        RecordingStore {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait::async_trait(?Send)]
impl Store for RecordingStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_async_read<Reader>(
        &self,
        mut reader: Reader,
        key: &ObjectKey,
        content_type: &mime::Mime,
    ) -> Result<(), StoreError>
    where
        Reader: AsyncRead + Unpin + 'static,
    {
        if self.fail {
            return Err(ObjectError::Io(std::io::Error::other("bucket unavailable")).into());
        }

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .await
            .map_err(ObjectError::Io)?;

        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });

        Ok(())
    }

    fn public_url(&self, key: &ObjectKey) -> Result<Url, StoreError> {
        crate::store::object_url(None, BUCKET, REGION, key).map_err(StoreError::Url)
    }
}

#[derive(Debug, Default)]
pub(crate) struct MemoryRepo {
    videos: Mutex<HashMap<Uuid, Video>>,
    updates: AtomicUsize,
}

impl MemoryRepo {
    pub(crate) fn insert(&self, video: &Video) {
        self.videos.lock().unwrap().insert(video.id, video.clone());
    }

    pub(crate) fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }

    pub(crate) fn updates(&self) -> usize {
        self.updates.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait(?Send)]
impl VideoRepo for MemoryRepo {
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }

    async fn video(&self, id: Uuid) -> Result<Option<Video>, RepoError> {
        Ok(self.get(id))
    }

    async fn create_video(&self, video: &Video) -> Result<(), RepoError> {
        self.insert(video);
        Ok(())
    }

    async fn update_video(&self, video: &Video) -> Result<(), RepoError> {
        let mut videos = self.videos.lock().unwrap();

        let Some(existing) = videos.get_mut(&video.id) else {
            return Err(RepoError::Missing(video.id));
        };

        *existing = video.clone();
        self.updates.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }
}

pub(crate) fn draft(user_id: Uuid) -> Video {
    Video::draft(
        user_id,
        NewVideo {
            title: String::from("Boots"),
            description: String::from("A short clip of boots"),
        },
    )
}

/// Application state backed by in-memory storage and the fake tools
pub(crate) struct TestState {
    pub(crate) state: State<RecordingStore>,
    pub(crate) repo: Arc<MemoryRepo>,
    pub(crate) store: RecordingStore,
    _scratch: tempfile::TempDir,
}

impl TestState {
    /// `media` is merged over the default media configuration
    pub(crate) async fn new(media: serde_json::Value, store: RecordingStore) -> Self {
        let scratch = tempfile::tempdir().expect("Created scratch dir");

        let configuration = crate::config::configure_without_clap(
            ConfigSource::memory(serde_json::json!({
                "server": {
                    "jwt_secret": JWT_SECRET,
                    "temporary_directory": scratch.path(),
                },
                "media": media,
                "store": {
                    "bucket_name": BUCKET,
                    "region": REGION,
                },
            })),
            None::<&str>,
        )
        .expect("Configured");

        let tmp_dir = TmpDir::init(scratch.path())
            .await
            .expect("Created tmp dir");

        let repo = Arc::new(MemoryRepo::default());

        TestState {
            state: State {
                config: configuration.config,
                tmp_dir,
                repo: repo.clone(),
                store: store.clone(),
            },
            repo,
            store,
            _scratch: scratch,
        }
    }

    /// Descriptors this process still holds on anything in the scratch directory
    #[cfg(target_os = "linux")]
    pub(crate) fn open_tmp_handles(&self) -> Vec<std::path::PathBuf> {
        let tmp_dir = std::fs::canonicalize(self.state.tmp_dir.path()).expect("Canonical tmp dir");

        std::fs::read_dir("/proc/self/fd")
            .expect("Read fd dir")
            .filter_map(|entry| std::fs::read_link(entry.ok()?.path()).ok())
            .filter(|target| target.starts_with(&tmp_dir))
            .collect()
    }

    pub(crate) fn tmp_files(&self) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(self.state.tmp_dir.path())
            .expect("Read tmp dir")
            .map(|entry| entry.expect("Read entry").path())
            .collect()
    }
}
