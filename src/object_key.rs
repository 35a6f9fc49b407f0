use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, TryRngCore};

use crate::error_code::ErrorCode;

const KEY_BYTES: usize = 32;
const EXTENSION: &str = ".mp4";

#[derive(Debug, thiserror::Error)]
pub(crate) enum KeyError {
    #[error("Failed to read random bytes: {0}")]
    Random(String),
}

impl KeyError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        ErrorCode::KEY_GENERATION
    }
}

/// The key an uploaded video is stored under, e.g. `landscape/<43 base64 chars>.mp4`
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ObjectKey(String);

impl ObjectKey {
    pub(crate) fn generate(prefix: Option<&str>) -> Result<Self, KeyError> {
        Self::generate_from(&mut OsRng, prefix)
    }

    pub(crate) fn generate_from<R>(rng: &mut R, prefix: Option<&str>) -> Result<Self, KeyError>
    where
        R: TryRngCore + ?Sized,
    {
        let mut bytes = [0u8; KEY_BYTES];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| KeyError::Random(e.to_string()))?;

        let name = URL_SAFE_NO_PAD.encode(bytes);

        match prefix {
            Some(prefix) if !prefix.is_empty() => {
                Ok(ObjectKey(format!("{prefix}/{name}{EXTENSION}")))
            }
            _ => Ok(ObjectKey(format!("{name}{EXTENSION}"))),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_string(key: String) -> Self {
        ObjectKey(key)
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
