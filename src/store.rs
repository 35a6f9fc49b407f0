use std::fmt::Debug;

use tokio::io::AsyncRead;
use url::Url;

use crate::{error_code::ErrorCode, object_key::ObjectKey};

pub(crate) mod object_store;

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("Error in object store")]
    ObjectStore(#[source] crate::store::object_store::ObjectError),

    #[error("Failed to build public url for object")]
    Url(#[source] url::ParseError),
}

impl StoreError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ObjectStore(e) => e.error_code(),
            Self::Url(_) => ErrorCode::INVALID_OBJECT_URL,
        }
    }
}

impl From<crate::store::object_store::ObjectError> for StoreError {
    fn from(value: crate::store::object_store::ObjectError) -> Self {
        Self::ObjectStore(value)
    }
}

#[async_trait::async_trait(?Send)]
pub(crate) trait Store: Clone + Debug {
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Upload everything `reader` produces under `key`
    async fn save_async_read<Reader>(
        &self,
        reader: Reader,
        key: &ObjectKey,
        content_type: &mime::Mime,
    ) -> Result<(), StoreError>
    where
        Reader: AsyncRead + Unpin + 'static;

    /// The address clients fetch a stored object from
    fn public_url(&self, key: &ObjectKey) -> Result<Url, StoreError>;
}

/// Build the public address of `key`
///
/// Without a public endpoint this is the virtual-hosted S3 address
/// `https://{bucket}.s3.{region}.amazonaws.com/{key}`. A public endpoint replaces that base and
/// keeps any path it already has.
pub(crate) fn object_url(
    public_endpoint: Option<&Url>,
    bucket: &str,
    region: &str,
    key: &ObjectKey,
) -> Result<Url, url::ParseError> {
    let mut url = match public_endpoint {
        Some(endpoint) => endpoint.clone(),
        None => Url::parse(&format!("https://{bucket}.s3.{region}.amazonaws.com/"))?,
    };

    url.path_segments_mut()
        .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(key.as_str().split('/'));

    Ok(url)
}

#[cfg(test)]
mod tests {
    use url::Url;

    use crate::object_key::ObjectKey;

    #[test]
    fn virtual_hosted_url() {
        let key = ObjectKey::from_string(String::from("landscape/abc_-XYZ.mp4"));

        let url = super::object_url(None, "tubely-videos", "us-east-2", &key).expect("Built url");

        assert_eq!(
            url.as_str(),
            "https://tubely-videos.s3.us-east-2.amazonaws.com/landscape/abc_-XYZ.mp4"
        );
    }

    #[test]
    fn unprefixed_key() {
        let key = ObjectKey::from_string(String::from("abc.mp4"));

        let url = super::object_url(None, "bucket", "eu-west-1", &key).expect("Built url");

        assert_eq!(url.as_str(), "https://bucket.s3.eu-west-1.amazonaws.com/abc.mp4");
    }

    #[test]
    fn public_endpoint_keeps_path() {
        let key = ObjectKey::from_string(String::from("16:9/abc.mp4"));

        for endpoint in ["https://cdn.example.com/videos", "https://cdn.example.com/videos/"] {
            let endpoint = Url::parse(endpoint).expect("Valid endpoint");

            let url = super::object_url(Some(&endpoint), "bucket", "us-east-1", &key)
                .expect("Built url");

            assert_eq!(url.as_str(), "https://cdn.example.com/videos/16:9/abc.mp4");
        }
    }

    #[test]
    fn invalid_bucket_name() {
        let key = ObjectKey::from_string(String::from("abc.mp4"));

        assert!(super::object_url(None, "not a bucket", "us-east-1", &key).is_err());
    }
}
