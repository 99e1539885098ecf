use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use opendal::{services::S3, Operator};

use crate::config::RemoteConfig;
use crate::error::DeployError;
use crate::fs::backend::ObjectStore;
use crate::fs::types::{ObjectMetadata, RemoteObject};

/// S3-compatible storage providers
#[derive(Debug, Clone, PartialEq)]
pub enum S3Provider {
    Aws,
    DigitalOcean,
    Hetzner,
    MinIO,
    CloudflareR2,
    Wasabi,
    Custom { endpoint: String },
}

impl S3Provider {
    /// Pick a provider from the `provider`/`endpoint` settings.
    ///
    /// A bare `endpoint` implies a custom provider.
    pub fn from_settings(name: Option<&str>, endpoint: Option<&str>) -> Result<Self, DeployError> {
        let endpoint = endpoint.map(str::trim).filter(|e| !e.is_empty());
        let name = name.map(|n| n.trim().to_lowercase());

        match (name.as_deref(), endpoint) {
            (None | Some(""), None) | (Some("aws"), None) => Ok(S3Provider::Aws),
            (None | Some("") | Some("custom"), Some(endpoint)) => Ok(S3Provider::Custom {
                endpoint: endpoint.to_string(),
            }),
            (Some("custom"), None) => Err(DeployError::config(
                "The custom provider requires an endpoint.",
            )),
            (Some("digitalocean"), None) => Ok(S3Provider::DigitalOcean),
            (Some("hetzner"), None) => Ok(S3Provider::Hetzner),
            (Some("minio"), None) => Ok(S3Provider::MinIO),
            (Some("r2"), None) => Ok(S3Provider::CloudflareR2),
            (Some("wasabi"), None) => Ok(S3Provider::Wasabi),
            (Some(other), Some(_)) if other != "custom" => Err(DeployError::config(format!(
                "An endpoint can only be set for the custom provider, not {}.",
                other
            ))),
            (Some(other), _) => Err(DeployError::config(format!(
                "Unknown provider: {}. Use aws, digitalocean, hetzner, minio, r2, wasabi or custom.",
                other
            ))),
        }
    }

    /// Get the endpoint URL for this provider
    pub fn endpoint(&self, region: &str) -> Option<String> {
        match self {
            S3Provider::Aws => None, // Use default AWS endpoint
            S3Provider::DigitalOcean => Some(format!("https://{}.digitaloceanspaces.com", region)),
            S3Provider::Hetzner => Some(format!("https://{}.your-objectstorage.com", region)),
            S3Provider::MinIO => Some("http://localhost:9000".to_string()),
            S3Provider::CloudflareR2 => Some(format!("https://{}.r2.cloudflarestorage.com", region)),
            S3Provider::Wasabi => Some(format!("https://s3.{}.wasabisys.com", region)),
            S3Provider::Custom { endpoint } => Some(endpoint.clone()),
        }
    }
}

/// S3 and S3-compatible bucket using OpenDAL
pub struct S3Store {
    operator: Operator,
    bucket: String,
}

impl S3Store {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let mut builder = S3::default()
            .bucket(&config.bucket)
            .region(&config.region)
            .access_key_id(&config.access_key)
            .secret_access_key(&config.secret_key);

        // Set custom endpoint for S3-compatible providers
        if let Some(endpoint) = config.provider.endpoint(&config.region) {
            builder = builder.endpoint(&endpoint);
        }

        let operator = Operator::new(builder)
            .context("Failed to configure S3 client")?
            .finish();

        Ok(Self {
            operator,
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self) -> Result<Vec<RemoteObject>> {
        let mut lister = self
            .operator
            .lister_with("")
            .recursive(true)
            .await
            .context("Failed to list S3 bucket")?;

        let mut objects = Vec::new();
        while let Some(entry) = lister.try_next().await.context("Failed to list S3 bucket")? {
            let meta = entry.metadata();
            if meta.is_dir() {
                continue;
            }

            let key = entry.path().trim_start_matches('/').to_string();
            if key.is_empty() {
                continue;
            }

            objects.push(RemoteObject {
                key,
                fingerprint: meta.etag().map(|s| s.trim_matches('"').to_string()).unwrap_or_default(),
            });
        }

        Ok(objects)
    }

    async fn put(&self, key: &str, data: Vec<u8>, metadata: &ObjectMetadata) -> Result<()> {
        // Public read comes from the bucket policy: opendal has no canned ACLs.
        let mut write = self.operator.write_with(key, data);
        if let Some(cache_control) = &metadata.cache_control {
            write = write.cache_control(cache_control);
        }
        if let Some(content_type) = &metadata.content_type {
            write = write.content_type(content_type);
        }
        if let Some(content_encoding) = &metadata.content_encoding {
            write = write.content_encoding(content_encoding);
        }

        write.await.context("Failed to upload to S3")?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.operator
            .delete(key)
            .await
            .context("Failed to delete S3 object")?;
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn display_path(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key.trim_start_matches('/'))
    }
}
