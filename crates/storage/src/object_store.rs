//! Object storage interface for rendered maps (R2/S3 compatible).

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path, ClientOptions, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use genmap_common::{GenMapError, GenMapResult};

/// Default bound on a single upload.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// S3-compatible endpoint URL
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Region ("auto" for R2)
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
    /// Upper bound on a single PUT
    pub upload_timeout: Duration,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            bucket: "typhoon-maps".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "auto".to_string(),
            allow_http: true,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

impl ObjectStorageConfig {
    /// S3 API endpoint of a Cloudflare account's R2 storage.
    pub fn r2_endpoint(account_id: &str) -> String {
        format!("https://{}.r2.cloudflarestorage.com", account_id)
    }
}

/// Object storage client for rendered map images.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    upload_timeout: Duration,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> GenMapResult<Self> {
        let client_options = ClientOptions::new()
            .with_content_type_for_suffix("webp", "image/webp")
            .with_content_type_for_suffix("png", "image/png");

        let builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region)
            .with_allow_http(config.allow_http)
            .with_client_options(client_options);

        let store = builder
            .build()
            .map_err(|e| GenMapError::Storage(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
            upload_timeout: config.upload_timeout,
        })
    }

    /// Wrap an existing store, e.g. `object_store::memory::InMemory`.
    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            upload_timeout,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn upload_timeout(&self) -> Duration {
        self.upload_timeout
    }

    /// Write bytes to a key in the bucket, bounded by the upload timeout.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, key = %key))]
    pub async fn put(&self, key: &str, data: Bytes) -> GenMapResult<()> {
        let location = Path::from(key);
        debug!(size = data.len(), "Writing object");

        match tokio::time::timeout(self.upload_timeout, self.store.put(&location, data)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(GenMapError::Storage(format!(
                "Failed to write {}: {}",
                key, e
            ))),
            Err(_) => Err(GenMapError::UploadTimeout(self.upload_timeout)),
        }
    }

    /// Read bytes from a key.
    #[instrument(skip(self), fields(bucket = %self.bucket, key = %key))]
    pub async fn get(&self, key: &str) -> GenMapResult<Bytes> {
        let location = Path::from(key);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| GenMapError::Storage(format!("Failed to read {}: {}", key, e)))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| GenMapError::Storage(format!("Failed to read bytes: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }
}
