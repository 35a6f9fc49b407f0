use std::{sync::Arc, time::Instant};

use object_store::{
    aws::AmazonS3Builder, path::Path, Attribute, AttributeValue, Attributes, ObjectStore as _,
    PutMultipartOpts, WriteMultipart,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

use crate::{
    config::ObjectStorage,
    error_code::ErrorCode,
    object_key::ObjectKey,
    store::{Store, StoreError},
};

const CHUNK_SIZE: usize = 8 * 1024 * 1024;
const READ_BUFFER: usize = 64 * 1024;
const MAX_CONCURRENT_PARTS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ObjectError {
    #[error("Failed to build object storage client")]
    Build(#[source] object_store::Error),

    #[error("Error making request to object storage")]
    Request(#[source] object_store::Error),

    #[error("Failed to read upload")]
    Io(#[source] std::io::Error),
}

impl ObjectError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Build(_) | Self::Request(_) => ErrorCode::OBJECT_REQUEST_ERROR,
            Self::Io(_) => ErrorCode::OBJECT_IO_ERROR,
        }
    }
}

#[derive(Clone)]
pub(crate) struct ObjectStore {
    client: Arc<dyn object_store::ObjectStore>,
    bucket_name: Arc<str>,
    region: Arc<str>,
    public_endpoint: Option<Url>,
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("public_endpoint", &self.public_endpoint.as_ref().map(Url::as_str))
            .finish()
    }
}

#[async_trait::async_trait(?Send)]
impl Store for ObjectStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .list_with_delimiter(None)
            .await
            .map_err(ObjectError::Request)?;

        Ok(())
    }

    #[tracing::instrument(skip(self, reader))]
    async fn save_async_read<Reader>(
        &self,
        mut reader: Reader,
        key: &ObjectKey,
        content_type: &mime::Mime,
    ) -> Result<(), StoreError>
    where
        Reader: AsyncRead + Unpin + 'static,
    {
        let start = Instant::now();
        metrics::counter!(crate::init_metrics::OBJECT_STORAGE_PUT_OBJECT).increment(1);

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.essence_str().to_string()),
        );

        let upload = self
            .client
            .put_multipart_opts(
                &Path::from(key.as_str()),
                PutMultipartOpts {
                    attributes,
                    ..Default::default()
                },
            )
            .await
            .map_err(ObjectError::Request)?;

        let mut writer = WriteMultipart::new_with_chunk_size(upload, CHUNK_SIZE);
        let mut buf = vec![0u8; READ_BUFFER];
        let mut total = 0u64;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    let _ = writer.abort().await;
                    return Err(ObjectError::Io(e).into());
                }
            };

            if let Err(e) = writer.wait_for_capacity(MAX_CONCURRENT_PARTS).await {
                let _ = writer.abort().await;
                return Err(ObjectError::Request(e).into());
            }

            writer.write(&buf[..n]);
            total += n as u64;
        }

        writer.finish().await.map_err(ObjectError::Request)?;

        metrics::histogram!(crate::init_metrics::OBJECT_STORAGE_PUT_OBJECT_DURATION)
            .record(start.elapsed().as_secs_f64());

        tracing::debug!("Uploaded {total} bytes");

        Ok(())
    }

    fn public_url(&self, key: &ObjectKey) -> Result<Url, StoreError> {
        crate::store::object_url(
            self.public_endpoint.as_ref(),
            &self.bucket_name,
            &self.region,
            key,
        )
        .map_err(StoreError::Url)
    }
}

impl ObjectStore {
    /// Configure a client for the bucket, falling back to `AWS_*` variables for anything unset
    pub(crate) fn build(config: &ObjectStorage) -> Result<Self, StoreError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket_name)
            .with_region(&config.region)
            .with_virtual_hosted_style_request(!config.use_path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint.as_str().trim_end_matches('/'))
                .with_allow_http(endpoint.scheme() == "http");
        }

        if let Some(access_key) = &config.access_key {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(secret_key) = &config.secret_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if let Some(session_token) = &config.session_token {
            builder = builder.with_token(session_token);
        }

        let client = builder.build().map_err(ObjectError::Build)?;

        Ok(ObjectStore {
            client: Arc::new(client),
            bucket_name: Arc::from(config.bucket_name.as_str()),
            region: Arc::from(config.region.as_str()),
            public_endpoint: config.public_endpoint.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use crate::{config::ObjectStorage, object_key::ObjectKey, store::Store};

    use super::ObjectStore;

    fn storage() -> ObjectStorage {
        ObjectStorage {
            endpoint: Some(Url::parse("http://localhost:9000").expect("Valid url")),
            use_path_style: true,
            bucket_name: String::from("tubely-videos"),
            region: String::from("us-east-2"),
            access_key: Some(String::from("access")),
            secret_key: Some(String::from("secret")),
            session_token: None,
            public_endpoint: None,
        }
    }

    #[test]
    fn public_url_from_bucket_and_region() {
        let store = ObjectStore::build(&storage()).expect("Built store");
        let key = ObjectKey::from_string(String::from("portrait/abc.mp4"));

        let url = store.public_url(&key).expect("Built url");

        assert_eq!(
            url.as_str(),
            "https://tubely-videos.s3.us-east-2.amazonaws.com/portrait/abc.mp4"
        );
    }

    #[test]
    fn public_url_from_public_endpoint() {
        let store = ObjectStore::build(&ObjectStorage {
            public_endpoint: Some(Url::parse("https://cdn.example.com").expect("Valid url")),
            ..storage()
        })
        .expect("Built store");
        let key = ObjectKey::from_string(String::from("other/abc.mp4"));

        let url = store.public_url(&key).expect("Built url");

        assert_eq!(url.as_str(), "https://cdn.example.com/other/abc.mp4");
    }
}
