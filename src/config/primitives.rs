use clap::ValueEnum;
use std::{fmt::Display, str::FromStr};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LogFormat {
    Compact,
    Json,
    Normal,
    Pretty,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LabelPreset {
    /// landscape, portrait and other
    Orientation,
    /// 16:9, 9:16 and other
    Ratio,
}

/// The names given to each aspect ratio bucket, also used as storage key prefixes
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct AspectLabels {
    pub(crate) landscape: String,
    pub(crate) portrait: String,
    pub(crate) other: String,
}

impl AspectLabels {
    pub(crate) fn orientation() -> Self {
        AspectLabels {
            landscape: String::from("landscape"),
            portrait: String::from("portrait"),
            other: String::from("other"),
        }
    }

    pub(crate) fn ratio() -> Self {
        AspectLabels {
            landscape: String::from("16:9"),
            portrait: String::from("9:16"),
            other: String::from("other"),
        }
    }
}

impl Default for AspectLabels {
    fn default() -> Self {
        Self::orientation()
    }
}

impl LabelPreset {
    pub(crate) fn labels(self) -> AspectLabels {
        match self {
            Self::Orientation => AspectLabels::orientation(),
            Self::Ratio => AspectLabels::ratio(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Targets {
    pub(crate) targets: tracing_subscriber::filter::Targets,
}

impl FromStr for Targets {
    type Err = <tracing_subscriber::filter::Targets as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Targets {
            targets: s.parse()?,
        })
    }
}

impl Display for Targets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let targets = self
            .targets
            .iter()
            .map(|(path, level)| format!("{path}={level}"))
            .collect::<Vec<_>>()
            .join(",");

        let max_level = [
            tracing::Level::TRACE,
            tracing::Level::DEBUG,
            tracing::Level::INFO,
            tracing::Level::WARN,
            tracing::Level::ERROR,
        ]
        .iter()
        .fold(None, |found, level| {
            if found.is_none()
                && self
                    .targets
                    .would_enable("not_a_real_target_so_nothing_can_conflict", level)
            {
                Some(level.to_string().to_lowercase())
            } else {
                found
            }
        });

        match (max_level, targets.is_empty()) {
            (Some(level), false) => write!(f, "{level},{targets}"),
            (Some(level), true) => write!(f, "{level}"),
            (None, _) => write!(f, "{targets}"),
        }
    }
}

impl serde::Serialize for Targets {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Targets {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}
