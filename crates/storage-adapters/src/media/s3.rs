//! S3-compatible implementation of `ObjectStore`.
//!
//! Objects are uploaded with the `public-read` canned ACL and served from
//! `public_url` (a bucket website endpoint or CDN in front of it).

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;
use domains::{DomainError, DomainResult, ObjectStore};
use tracing::debug;

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3ObjectStore {
    /// Builds a client from the ambient AWS credential chain. `endpoint`
    /// switches to path-style addressing for S3-compatible services.
    pub async fn connect(
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<String>,
        public_url: impl Into<String>,
    ) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;

        let mut config = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            config = config.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(config.build()),
            bucket: bucket.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn s3_err(key: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::Storage(format!("{key}: {e}"))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> DomainResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size as i64)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| s3_err(key, aws_sdk_s3::error::DisplayErrorContext(e)))?;
        debug!(%key, size, "object uploaded");
        Ok(())
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_err(key, aws_sdk_s3::error::DisplayErrorContext(e)))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> DomainResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(s3_err(key, aws_sdk_s3::error::DisplayErrorContext(e))),
        }
    }

    fn public_url(&self, key: &str) -> String {
        domains::public_link(&self.public_url, key)
    }
}
