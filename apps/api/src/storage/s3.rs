use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::config::S3Config;
use crate::storage::{BlobStore, StorageError};

/// Blob store on an S3-compatible bucket (AWS, MinIO, Supabase storage S3 API).
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs a client from static credentials and an optional custom endpoint.
    pub async fn from_config(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            config.secret_access_key.expose(),
            None,
            None,
            "vitae-static",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let base = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&base)
            .force_path_style(true)
            .build();

        Self::new(S3Client::from_conf(s3_config), config.bucket.clone())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Blob(format!("S3 upload of {path} failed: {e}")))?;

        debug!("Uploaded s3://{}/{}", self.bucket, path);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    return Ok(None);
                }
                return Err(StorageError::Blob(format!(
                    "S3 download of {path} failed: {e}"
                )));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Blob(format!("failed to read {path}: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(Some(bytes))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    Ok(false)
                } else {
                    Err(StorageError::Blob(format!("S3 head of {path} failed: {e}")))
                }
            }
        }
    }

    async fn create_signed_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<Option<String>, StorageError> {
        let presign_config = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::Blob(format!("invalid presign expiry: {e}")))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::Blob(format!("failed to presign {path}: {e}")))?;

        Ok(Some(presigned.uri().to_string()))
    }
}
