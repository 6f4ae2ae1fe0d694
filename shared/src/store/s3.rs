use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use super::{BlobStore, StoreError};

/// Lifetime of generated download locators (the S3 presigning maximum).
const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// S3-backed blob store. Download locators are presigned GET URLs and go
/// stale after `DOWNLOAD_URL_TTL`; callers that need fresh content should
/// resolve by storage path, not by a stored URL.
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        S3BlobStore {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a store from the ambient AWS environment.
    /// The bucket name comes from `S3_BUCKET_NAME`.
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        let client = S3Client::new(&config);
        let bucket = std::env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "stride-app".to_string());
        S3BlobStore::new(client, bucket)
    }

    async fn download_url(&self, path: &str) -> Result<String, StoreError> {
        let config = PresigningConfig::expires_in(DOWNLOAD_URL_TTL)
            .map_err(|e| StoreError::Unavailable(format!("S3 presigning config error: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(config)
            .await
            .map_err(|e| StoreError::Unavailable(format!("S3 presign error: {}", e)))?;

        Ok(presigned.uri().to_string())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("S3 put_object error: {}", e)))?;

        self.download_url(path).await
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(StoreError::NotFound(path.to_string()));
                }
                return Err(StoreError::Unavailable(format!(
                    "S3 get_object error: {}",
                    service_err
                )));
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Unavailable(format!("S3 body read error: {}", e)))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("S3 delete_object error: {}", e)))?;

        Ok(())
    }
}
