mod auth;
mod config;
mod error;
mod error_code;
mod faststart;
mod ingest;
mod init_metrics;
mod init_tracing;
mod object_key;
mod probe;
mod process;
mod repo;
mod state;
mod store;
mod stream;
#[cfg(test)]
mod testing;
mod tmp_file;

use actix_form_data::{Field, Form, FormData, Multipart, Value};
use actix_web::{
    http::header::CONTENT_LENGTH, web, App, FromRequest, HttpRequest, HttpResponse, HttpServer,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{marker::PhantomData, path::Path, sync::Arc};
use tracing::Instrument;
use tracing_actix_web::TracingLogger;
use uuid::Uuid;

use self::{
    config::Operation,
    error::{Error, UploadError},
    ingest::StagedUpload,
    init_tracing::init_tracing,
    repo::{sled::SledRepo, ArcRepo, NewVideo, Video},
    state::State,
    store::{object_store::ObjectStore, Store},
    stream::LocalBoxStream,
    tmp_file::TmpDir,
};

pub use self::config::{ConfigSource, TubelyConfiguration};

const MEGABYTES: u64 = 1024 * 1024;

struct VideoUpload<S: Store + 'static>(StagedUpload, PhantomData<S>);

impl<S: Store + 'static> FormData for VideoUpload<S> {
    type Item = StagedUpload;
    type Error = Error;

    fn form(req: &HttpRequest) -> Result<Form<Self::Item, Self::Error>, Self::Error> {
        // Create a new Multipart Form validator
        //
        // This form is expecting a single file field, 'video'
        let state = req
            .app_data::<web::Data<State<S>>>()
            .expect("No state in request")
            .clone();

        let limit = state.config.media.max_file_size_bytes();

        Ok(Form::new()
            .max_files(1)
            .max_file_size(usize::try_from(limit).unwrap_or(usize::MAX))
            .transform_error(transform_form_error)
            .field(
                "video",
                Field::file(move |filename, content_type, stream| {
                    let state = state.clone();

                    metrics::counter!(init_metrics::FILES).increment(1);

                    let span = tracing::info_span!("file-upload", ?filename);

                    Box::pin(
                        async move {
                            ingest::stage(&state.tmp_dir, content_type, stream, limit).await
                        }
                        .instrument(span),
                    )
                }),
            ))
    }

    fn extract(value: Value<Self::Item>) -> Result<Self, Self::Error> {
        value
            .map()
            .and_then(|mut fields| fields.remove("video"))
            .and_then(|video| video.file())
            .map(|file| VideoUpload(file.result, PhantomData))
            .ok_or_else(|| UploadError::MissingFile.into())
    }
}

fn transform_form_error(error: actix_form_data::Error) -> actix_web::Error {
    let error: Error = error.into();
    let error: actix_web::Error = error.into();
    error
}

fn parse_video_id(video_id: &str) -> Result<Uuid, Error> {
    Ok(Uuid::parse_str(video_id).map_err(UploadError::InvalidVideoId)?)
}

fn content_length(req: &HttpRequest) -> Option<u64> {
    req.headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Create a draft video record owned by the caller
#[tracing::instrument(name = "Creating video", skip(req, new_video, state))]
async fn create_video<S: Store + 'static>(
    req: HttpRequest,
    new_video: web::Json<NewVideo>,
    state: web::Data<State<S>>,
) -> Result<HttpResponse, Error> {
    let user_id = auth::authenticate(req.headers(), &state.config.server.jwt_secret)?;

    let video = Video::draft(user_id, new_video.into_inner());
    state.repo.create_video(&video).await?;

    tracing::info!("Created video {}", video.id);

    Ok(HttpResponse::Created().json(&video))
}

#[tracing::instrument(name = "Fetching video", skip(req, state))]
async fn get_video<S: Store + 'static>(
    req: HttpRequest,
    video_id: web::Path<String>,
    state: web::Data<State<S>>,
) -> Result<HttpResponse, Error> {
    let video_id = parse_video_id(&video_id)?;
    let user_id = auth::authenticate(req.headers(), &state.config.server.jwt_secret)?;

    let video = ingest::authorize(&state.repo, user_id, video_id).await?;

    Ok(HttpResponse::Ok().json(&video))
}

/// Accept a multipart upload for an existing video and publish it
///
/// The caller is authenticated and the record's ownership checked before any of the body is read.
#[tracing::instrument(name = "Uploading video", skip(req, payload, state))]
async fn upload_video<S: Store + 'static>(
    req: HttpRequest,
    payload: web::Payload,
    video_id: web::Path<String>,
    state: web::Data<State<S>>,
) -> Result<HttpResponse, actix_web::Error> {
    let video_id = parse_video_id(&video_id)?;
    let user_id = auth::authenticate(req.headers(), &state.config.server.jwt_secret)
        .map_err(Error::from)?;

    let limit = state.config.media.max_file_size_bytes();

    if content_length(&req).is_some_and(|length| length > limit) {
        return Err(Error::from(UploadError::PayloadTooLarge(limit)).into());
    }

    let video = ingest::authorize(&state.repo, user_id, video_id).await?;

    let (limited, exceeded) = stream::limit(payload, limit);
    let limited: LocalBoxStream<'static, _> = Box::pin(limited);
    let mut payload = actix_web::dev::Payload::from(limited);

    let Multipart(VideoUpload(staged, _)) =
        match Multipart::<VideoUpload<S>>::from_request(&req, &mut payload).await {
            Ok(upload) => upload,
            Err(_) if exceeded.get() => {
                return Err(Error::from(UploadError::PayloadTooLarge(limit)).into());
            }
            Err(e) => return Err(e.into()),
        };

    let video = ingest::ingest_video(&state, video, staged).await?;

    tracing::info!("Published video {} to {:?}", video.id, video.video_url);

    Ok(HttpResponse::Ok().json(&video))
}

async fn healthz<S: Store>(state: web::Data<State<S>>) -> Result<HttpResponse, Error> {
    state.repo.health_check().await?;
    state.store.health_check().await?;
    Ok(HttpResponse::Ok().finish())
}

fn configure_endpoints<S: Store + 'static>(config: &mut web::ServiceConfig, state: State<S>) {
    config
        .app_data(web::Data::new(state))
        .route("/healthz", web::get().to(healthz::<S>))
        .service(
            web::scope("/api")
                .service(web::resource("/videos").route(web::post().to(create_video::<S>)))
                .service(
                    web::resource("/videos/{video_id}").route(web::get().to(get_video::<S>)),
                )
                .service(
                    web::resource("/video_upload/{video_id}")
                        .route(web::post().to(upload_video::<S>)),
                ),
        );
}

async fn launch<S: Store + Send + 'static>(state: State<S>) -> std::io::Result<()> {
    let address = state.config.server.address;

    tracing::info!("Starting tubely on {address}");

    HttpServer::new(move || {
        let state = state.clone();

        App::new()
            .wrap(TracingLogger::default())
            .configure(move |sc| configure_endpoints(sc, state))
    })
    .bind(address)?
    .run()
    .await
}

impl<P: AsRef<Path>, T: serde::Serialize> ConfigSource<P, T> {
    /// Initialize tubely's configuration
    ///
    /// This takes an optional config_file path which is a valid tubely configuration file, and an
    /// optional save_to path, which the generated configuration will be saved into. Since many
    /// parameters have defaults, it can be useful to dump a valid configuration with default values
    /// to see what is available for tweaking.
    ///
    /// When running tubely as a library, configuration is limited to environment variables and
    /// configuration files. Commandline options are not available.
    ///
    /// ```rust
    /// fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     tubely::ConfigSource::memory(serde_json::json!({
    ///         "server": {
    ///             "address": "127.0.0.1:8091",
    ///             "jwt_secret": "change-me"
    ///         },
    ///         "repo": {
    ///             "path": "./sled-repo"
    ///         },
    ///         "store": {
    ///             "bucket_name": "tubely-videos",
    ///             "region": "us-east-2"
    ///         }
    ///     })).init::<&str>(None)?;
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn init<Q: AsRef<Path>>(
        self,
        save_to: Option<Q>,
    ) -> color_eyre::Result<TubelyConfiguration> {
        config::configure_without_clap(self, save_to)
    }
}

impl TubelyConfiguration {
    /// Build the tubely configuration from commandline arguments
    ///
    /// This is probably not useful for 3rd party applications that handle their own commandline
    pub fn build_default() -> color_eyre::Result<Self> {
        config::configure()
    }

    /// Install the default tubely tracer
    ///
    /// This is probably not useful for 3rd party applications that install their own tracing
    /// subscribers.
    pub fn install_tracing(self) -> color_eyre::Result<Self> {
        init_tracing(&self.config.tracing)?;
        Ok(self)
    }

    pub fn install_metrics(self) -> color_eyre::Result<Self> {
        if let Some(addr) = self.config.metrics.prometheus_address {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
            tracing::info!("Starting prometheus endpoint on {addr}");
        }

        init_metrics::init_metrics();

        Ok(self)
    }

    /// Run the tubely application
    ///
    /// This must be called after `init_config`, or else the default configuration builder will run and
    /// fail.
    pub async fn run(self) -> color_eyre::Result<()> {
        let TubelyConfiguration { config, operation } = self;

        match operation {
            Operation::Run => (),
        }

        let tmp_dir = TmpDir::init(&config.server.temporary_directory).await?;

        let repo: ArcRepo = Arc::new(SledRepo::build(
            &config.repo.path,
            config.repo.cache_capacity,
        )?);

        let store = ObjectStore::build(&config.store)?;

        let state = State {
            config,
            tmp_dir: tmp_dir.clone(),
            repo,
            store,
        };

        launch(state).await?;

        tmp_dir.cleanup().await?;

        Ok(())
    }
}
