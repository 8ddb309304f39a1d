use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use docket_core::DocketConfigSnapshot;

use crate::store::CapabilitySigner;
use crate::{BlobError, BlobResult};

pub const DEFAULT_BUCKET: &str = "legal-contract-uploads";
pub const DEFAULT_REGION: &str = "ap-south-1";

/// S3 connection settings.
///
/// Credentials are optional: without them the SDK's default provider chain
/// (env, profile, instance metadata) is used.
#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Required by most S3-compatible servers (MinIO, RustFS)
    pub force_path_style: bool,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("force_path_style", &self.force_path_style)
            .finish_non_exhaustive()
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

impl S3Config {
    /// Read `s3.*` keys from a config snapshot.
    pub fn from_config(config: &DocketConfigSnapshot) -> BlobResult<Self> {
        let access_key_id = config.get_string("s3.access_key_id");
        let secret_access_key = config.get_string("s3.secret_access_key");
        if access_key_id.is_some() != secret_access_key.is_some() {
            return Err(BlobError::invalid(
                "s3.access_key_id and s3.secret_access_key must be set together",
            ));
        }

        let endpoint_url = config.get_string("s3.endpoint");
        Ok(Self {
            bucket: config.get_or("s3.bucket", DEFAULT_BUCKET),
            region: config.get_or("s3.region", DEFAULT_REGION),
            force_path_style: config
                .get_bool("s3.force_path_style")
                .unwrap_or(endpoint_url.is_some()),
            endpoint_url,
            access_key_id,
            secret_access_key,
        })
    }
}

/// Presigns capability URLs against an S3-compatible bucket.
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> Self {
        let bucket = config.bucket.clone();
        let client = Self::create_client(config).await;
        Self { client, bucket }
    }

    async fn create_client(config: S3Config) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (config.access_key_id, config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "docket",
            ));
        }

        if let Some(endpoint_url) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let aws_config = loader.load().await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(config.force_path_style)
                .build(),
        )
    }

    fn presigning(expires_in: Duration) -> BlobResult<PresigningConfig> {
        PresigningConfig::expires_in(expires_in).map_err(BlobError::backend)
    }
}

#[async_trait]
impl CapabilitySigner for S3CompatibleStore {
    async fn sign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> BlobResult<String> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presigning(expires_in)?)
            .await
            .map_err(BlobError::backend)?;

        Ok(request.uri().to_string())
    }

    async fn sign_get(&self, key: &str, expires_in: Duration) -> BlobResult<String> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning(expires_in)?)
            .await
            .map_err(BlobError::backend)?;

        Ok(request.uri().to_string())
    }
}
