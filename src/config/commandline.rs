use crate::config::primitives::{AspectLabels, LabelPreset, LogFormat, Targets};
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf};
use url::Url;

impl Args {
    pub(super) fn into_output(self) -> Output {
        let Args {
            config_file,
            log_format,
            log_targets,
            log_spans,
            opentelemetry_url,
            opentelemetry_service_name,
            opentelemetry_targets,
            save_to,
            command,
        } = self;

        let tracing = Tracing {
            logging: Logging {
                format: log_format,
                targets: log_targets,
                log_spans,
            },
            opentelemetry: OpenTelemetry {
                url: opentelemetry_url,
                service_name: opentelemetry_service_name,
                targets: opentelemetry_targets,
            },
        };

        match command {
            Command::Run(Run {
                address,
                jwt_secret,
                temporary_directory,
                metrics_prometheus_address,
                media_max_file_size,
                media_ffprobe,
                media_ffmpeg,
                media_label_preset,
                media_prefix_keys,
                sled_path,
                sled_cache_capacity,
                object_storage_endpoint,
                object_storage_use_path_style,
                object_storage_bucket_name,
                object_storage_region,
                object_storage_access_key,
                object_storage_secret_key,
                object_storage_session_token,
                object_storage_public_endpoint,
            }) => {
                let server = Server {
                    address,
                    jwt_secret,
                    temporary_directory,
                };

                let metrics = Metrics {
                    prometheus_address: metrics_prometheus_address,
                };

                let media = Media {
                    max_file_size: media_max_file_size,
                    ffprobe: media_ffprobe,
                    ffmpeg: media_ffmpeg,
                    aspect_labels: media_label_preset.map(LabelPreset::labels),
                    prefix_keys: media_prefix_keys,
                };

                let repo = Sled {
                    path: sled_path,
                    cache_capacity: sled_cache_capacity,
                };

                let store = ObjectStorage {
                    endpoint: object_storage_endpoint,
                    use_path_style: object_storage_use_path_style,
                    bucket_name: object_storage_bucket_name,
                    region: object_storage_region,
                    access_key: object_storage_access_key,
                    secret_key: object_storage_secret_key,
                    session_token: object_storage_session_token,
                    public_endpoint: object_storage_public_endpoint,
                };

                Output {
                    config_format: ConfigFormat {
                        server,
                        tracing,
                        metrics,
                        media,
                        repo,
                        store,
                    },
                    operation: Operation::Run,
                    save_to,
                    config_file,
                }
            }
        }
    }
}

pub(super) struct Output {
    pub(super) config_format: ConfigFormat,
    pub(super) operation: Operation,
    pub(super) save_to: Option<PathBuf>,
    pub(super) config_file: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub(crate) enum Operation {
    Run,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) struct ConfigFormat {
    server: Server,
    tracing: Tracing,
    metrics: Metrics,
    media: Media,
    repo: Sled,
    store: ObjectStorage,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Server {
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    jwt_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temporary_directory: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Tracing {
    logging: Logging,
    opentelemetry: OpenTelemetry,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Logging {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<LogFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    targets: Option<Targets>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    log_spans: bool,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct OpenTelemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    targets: Option<Targets>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Metrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    prometheus_address: Option<SocketAddr>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Media {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_file_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ffprobe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ffmpeg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_labels: Option<AspectLabels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix_keys: Option<bool>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct Sled {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_capacity: Option<u64>,
}

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct ObjectStorage {
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<Url>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    use_path_style: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_endpoint: Option<Url>,
}

/// Run the tubely video hosting backend
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Args {
    /// Path to the tubely configuration file
    #[arg(short, long)]
    config_file: Option<PathBuf>,

    /// Format of logs printed to stdout
    #[arg(long)]
    log_format: Option<LogFormat>,
    /// Log levels to print to stdout, respects RUST_LOG formatting
    #[arg(long)]
    log_targets: Option<Targets>,
    /// Whether to log openning and closing of tracing spans to stdout
    #[arg(long)]
    log_spans: bool,

    /// URL to send OpenTelemetry metrics
    #[arg(long)]
    opentelemetry_url: Option<Url>,
    /// Service Name to use for OpenTelemetry
    #[arg(long)]
    opentelemetry_service_name: Option<String>,
    /// Log levels to use for OpenTelemetry, respects RUST_LOG formatting
    #[arg(long)]
    opentelemetry_targets: Option<Targets>,

    /// File to save the current configuration for reproducible runs
    #[arg(long)]
    save_to: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the tubely web server
    Run(Run),
}

#[derive(Debug, Parser)]
struct Run {
    /// The address and port to bind the tubely web server
    #[arg(short, long)]
    address: Option<SocketAddr>,

    /// The secret used to verify HS256 access tokens
    #[arg(long)]
    jwt_secret: Option<String>,

    /// The temporary directory tubely should use when staging uploads
    #[arg(long)]
    temporary_directory: Option<PathBuf>,

    /// Address and port to expose tubely's prometheus metrics
    #[arg(long)]
    metrics_prometheus_address: Option<SocketAddr>,

    /// The maximum size, in megabytes, of an uploaded video
    #[arg(long)]
    media_max_file_size: Option<usize>,

    /// The ffprobe binary used to classify uploads
    #[arg(long)]
    media_ffprobe: Option<String>,

    /// The ffmpeg binary used to prepare uploads for streaming
    #[arg(long)]
    media_ffmpeg: Option<String>,

    /// Which set of names to use for aspect ratio classifications
    #[arg(long)]
    media_label_preset: Option<LabelPreset>,

    /// Whether to prefix storage keys with the aspect ratio classification
    #[arg(long)]
    media_prefix_keys: Option<bool>,

    /// The path to the sled database
    #[arg(long)]
    sled_path: Option<PathBuf>,

    /// The cache capacity, in bytes, allowed to sled for in-memory operations
    #[arg(long)]
    sled_cache_capacity: Option<u64>,

    /// The base endpoint for an S3-compatible object storage service
    #[arg(long)]
    object_storage_endpoint: Option<Url>,

    /// Whether to use path style or virtual hosted style requests
    #[arg(long)]
    object_storage_use_path_style: bool,

    /// The bucket in which to store uploaded videos
    #[arg(long)]
    object_storage_bucket_name: Option<String>,

    /// The region the bucket is located in
    #[arg(long)]
    object_storage_region: Option<String>,

    /// The Access Key for the user accessing the bucket
    #[arg(long)]
    object_storage_access_key: Option<String>,

    /// The secret key for the user accessing the bucket
    #[arg(long)]
    object_storage_secret_key: Option<String>,

    /// The session token for accessing the bucket
    #[arg(long)]
    object_storage_session_token: Option<String>,

    /// The base url clients use to fetch uploaded videos
    #[arg(long)]
    object_storage_public_endpoint: Option<Url>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Args, Operation};

    #[test]
    fn overrides_only_what_was_passed() {
        let output = Args::parse_from([
            "tubely",
            "--log-format",
            "json",
            "run",
            "--jwt-secret",
            "secret",
            "--media-label-preset",
            "ratio",
            "--media-prefix-keys",
            "false",
        ])
        .into_output();

        assert!(matches!(output.operation, Operation::Run));
        assert!(output.config_file.is_none());

        let value = serde_json::to_value(&output.config_format).expect("Serialized");

        assert_eq!(value["tracing"]["logging"]["format"], "json");
        assert_eq!(value["server"]["jwt_secret"], "secret");
        assert!(value["server"].get("address").is_none());
        assert_eq!(value["media"]["aspect_labels"]["landscape"], "16:9");
        assert_eq!(value["media"]["prefix_keys"], false);
        assert!(value["store"].get("use_path_style").is_none());
    }
}
