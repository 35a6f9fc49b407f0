use clap::Parser;
use std::path::Path;

mod commandline;
mod defaults;
mod file;
mod primitives;

use commandline::{Args, Output};
use config::Config;
use defaults::Defaults;

pub(crate) use commandline::Operation;
pub(crate) use file::{ConfigFile as Configuration, ObjectStorage, OpenTelemetry, Tracing};
pub(crate) use primitives::{AspectLabels, LogFormat};

/// Source for tubely's configuration when not reading from the commandline
pub enum ConfigSource<P, T> {
    /// A configuration value that serializes into tubely's configuration format
    Memory { values: T },
    /// A path to a configuration file
    File { path: P },
    /// Nothing but defaults and environment variables
    Empty,
}

impl<T> ConfigSource<&'static str, T>
where
    T: serde::Serialize,
{
    pub fn memory(values: T) -> Self {
        ConfigSource::Memory { values }
    }
}

impl<P> ConfigSource<P, ()>
where
    P: AsRef<Path>,
{
    pub fn file(path: P) -> Self {
        ConfigSource::File { path }
    }
}

impl ConfigSource<&'static str, ()> {
    pub fn empty() -> Self {
        ConfigSource::Empty
    }
}

/// A complete tubely configuration, and what to do with it
pub struct TubelyConfiguration {
    pub(crate) config: Configuration,
    pub(crate) operation: Operation,
}

const ENV_PREFIX: &str = "TUBELY";
const ENV_SEPARATOR: &str = "__";

pub(crate) fn configure_without_clap<P: AsRef<Path>, T: serde::Serialize, Q: AsRef<Path>>(
    source: ConfigSource<P, T>,
    save_to: Option<Q>,
) -> color_eyre::Result<TubelyConfiguration> {
    let config = Config::builder().add_source(config::Config::try_from(&Defaults::default())?);

    let config = match source {
        ConfigSource::Memory { values } => {
            config.add_source(config::Config::try_from(&values)?)
        }
        ConfigSource::File { path } => config.add_source(config::File::from(path.as_ref())),
        ConfigSource::Empty => config,
    };

    let built = config
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()?;

    let config: Configuration = built.try_deserialize()?;

    if let Some(save_to) = save_to {
        let output = toml::to_string_pretty(&config)?;
        std::fs::write(save_to, output)?;
    }

    Ok(TubelyConfiguration {
        config,
        operation: Operation::Run,
    })
}

pub(crate) fn configure() -> color_eyre::Result<TubelyConfiguration> {
    let Output {
        config_format,
        operation,
        save_to,
        config_file,
    } = Args::parse().into_output();

    let config = Config::builder().add_source(config::Config::try_from(&Defaults::default())?);

    let config = if let Some(config_file) = config_file {
        config.add_source(config::File::from(config_file))
    } else {
        config
    };

    let built = config
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .add_source(config::Config::try_from(&config_format)?)
        .build()?;

    let config: Configuration = built.try_deserialize()?;

    if let Some(save_to) = save_to {
        let output = toml::to_string_pretty(&config)?;
        std::fs::write(save_to, output)?;
    }

    Ok(TubelyConfiguration { config, operation })
}
