//! Storage backends for uploaded files
//!
//! Every variant takes an already-staged local file and pushes it to its
//! destination, returning the URL the file is retrievable at. The active
//! backend is selected once at startup from configuration and shared for
//! the lifetime of the process.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use serde::{Deserialize, Serialize};

use crate::core::config::{Config, S3Config, SupabaseConfig};
use crate::core::error::{AppError, AppResult};

/// Which backend handled an upload. Serialized into upload records and
/// shown to users in replies, so the string forms are part of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    S3,
    Supabase,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageMode::Local => "local",
            StorageMode::S3 => "s3",
            StorageMode::Supabase => "supabase",
        };
        f.write_str(name)
    }
}

impl FromStr for StorageMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(StorageMode::Local),
            "s3" => Ok(StorageMode::S3),
            "supabase" => Ok(StorageMode::Supabase),
            _ => Err(()),
        }
    }
}

/// A sink for staged uploads.
///
/// `store` assumes the file already exists at `local_path`; no variant
/// manages the staging step, and the caller does not retry on failure.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Pushes the staged file under `file_name` and returns its URL.
    async fn store(&self, local_path: &Path, file_name: &str) -> AppResult<String>;

    /// Which variant this is.
    fn mode(&self) -> StorageMode;
}

/// Selects and constructs the configured backend once, at startup.
pub fn create_backend(config: &Config) -> AppResult<Arc<dyn StorageBackend>> {
    match config.storage_mode {
        StorageMode::Local => Ok(Arc::new(LocalBackend)),
        StorageMode::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| AppError::Config("S3 credentials missing".to_string()))?;
            Ok(Arc::new(S3Backend::new(s3)?))
        }
        StorageMode::Supabase => {
            let supabase = config
                .supabase
                .as_ref()
                .ok_or_else(|| AppError::Config("Supabase credentials missing".to_string()))?;
            Ok(Arc::new(SupabaseBackend::new(supabase)?))
        }
    }
}

/// Keeps files on local disk; the staging write already put the bytes in
/// place, so storing is just answering with the serving path.
pub struct LocalBackend;

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn store(&self, _local_path: &Path, file_name: &str) -> AppResult<String> {
        Ok(format!("/files/{file_name}"))
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }
}

/// Uploads to an S3 bucket via the `rust-s3` client.
pub struct S3Backend {
    bucket: Box<Bucket>,
    bucket_name: String,
    region: String,
}

impl S3Backend {
    pub fn new(config: &S3Config) -> AppResult<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Config(format!("Invalid S3 credentials: {e}")))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: format!("https://s3.{}.amazonaws.com", config.region),
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| AppError::Config(format!("Failed to create S3 bucket handle: {e}")))?;

        Ok(Self {
            bucket,
            bucket_name: config.bucket.clone(),
            region: config.region.clone(),
        })
    }

    /// Public object URL in the virtual-hosted style.
    fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket_name, self.region, key
        )
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn store(&self, local_path: &Path, file_name: &str) -> AppResult<String> {
        let bytes = tokio::fs::read(local_path).await?;

        self.bucket
            .put_object(file_name, &bytes)
            .await
            .map_err(|e| AppError::BackendUpload(format!("S3 upload of '{file_name}' failed: {e}")))?;

        log::info!(
            "Uploaded '{}' to s3://{} ({} bytes)",
            file_name,
            self.bucket_name,
            bytes.len()
        );
        Ok(self.public_url(file_name))
    }

    fn mode(&self) -> StorageMode {
        StorageMode::S3
    }
}

/// Upload acknowledgment from the Supabase storage gateway.
///
/// Some gateway versions echo a ready-made public URL under `publicURL`
/// or `public_url`; when neither is present the canonical public object
/// URL is derived from the bucket and key instead.
#[derive(Debug, Default, Deserialize)]
struct PublicUrlPayload {
    #[serde(rename = "publicURL", alias = "public_url")]
    public_url: Option<String>,
}

impl PublicUrlPayload {
    fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

/// Uploads to Supabase Storage over its REST API with upsert semantics.
pub struct SupabaseBackend {
    client: reqwest::Client,
    url: String,
    key: String,
    bucket: String,
}

impl SupabaseBackend {
    pub fn new(config: &SupabaseConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(crate::core::config::network::timeout())
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            key: config.key.clone(),
            bucket: config.bucket.clone(),
        })
    }

    fn object_endpoint(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.url, self.bucket, key)
    }

    fn public_object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.url, self.bucket, key)
    }

    /// Resolves the retrievable URL from the gateway's acknowledgment,
    /// falling back to the canonical public object URL.
    fn resolve_public_url(&self, ack_body: &str, key: &str) -> String {
        PublicUrlPayload::parse(ack_body)
            .public_url
            .unwrap_or_else(|| self.public_object_url(key))
    }
}

#[async_trait]
impl StorageBackend for SupabaseBackend {
    async fn store(&self, local_path: &Path, file_name: &str) -> AppResult<String> {
        let bytes = tokio::fs::read(local_path).await?;

        let response = self
            .client
            .post(self.object_endpoint(file_name))
            .bearer_auth(&self.key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::BackendUpload(format!("Supabase upload of '{file_name}' failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::BackendUpload(format!(
                "Supabase upload of '{file_name}' failed with status {status}: {body}"
            )));
        }

        log::info!("Uploaded '{}' to supabase bucket '{}'", file_name, self.bucket);
        Ok(self.resolve_public_url(&body, file_name))
    }

    fn mode(&self) -> StorageMode {
        StorageMode::Supabase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_mode_round_trip() {
        for (raw, mode) in [
            ("local", StorageMode::Local),
            ("s3", StorageMode::S3),
            ("supabase", StorageMode::Supabase),
        ] {
            assert_eq!(raw.parse::<StorageMode>().unwrap(), mode);
            assert_eq!(mode.to_string(), raw);
        }
        assert!("ftp".parse::<StorageMode>().is_err());
    }

    #[test]
    fn test_storage_mode_serde_strings() {
        let json = serde_json::to_string(&StorageMode::Supabase).unwrap();
        assert_eq!(json, "\"supabase\"");
        let back: StorageMode = serde_json::from_str("\"s3\"").unwrap();
        assert_eq!(back, StorageMode::S3);
    }

    #[tokio::test]
    async fn test_local_backend_returns_serving_path() {
        let backend = LocalBackend;
        let url = backend.store(Path::new("static/files/a.pdf"), "a.pdf").await.unwrap();
        assert_eq!(url, "/files/a.pdf");
        assert_eq!(backend.mode(), StorageMode::Local);
    }

    #[test]
    fn test_s3_public_url_shape() {
        let backend = S3Backend::new(&S3Config {
            bucket: "books".to_string(),
            access_key: "AK".to_string(),
            secret_key: "SK".to_string(),
            region: "us-east-1".to_string(),
        })
        .unwrap();

        assert_eq!(
            backend.public_url("a.pdf"),
            "https://books.s3.us-east-1.amazonaws.com/a.pdf"
        );
        assert_eq!(
            backend.public_url("b.pdf"),
            "https://books.s3.us-east-1.amazonaws.com/b.pdf"
        );
    }

    fn supabase_backend() -> SupabaseBackend {
        SupabaseBackend::new(&SupabaseConfig {
            url: "https://proj.supabase.co".to_string(),
            key: "service-key".to_string(),
            bucket: "books".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_supabase_public_url_from_camel_case_payload() {
        let backend = supabase_backend();
        let url = backend.resolve_public_url(r#"{"publicURL": "https://cdn/x.pdf"}"#, "x.pdf");
        assert_eq!(url, "https://cdn/x.pdf");
    }

    #[test]
    fn test_supabase_public_url_from_snake_case_payload() {
        let backend = supabase_backend();
        let url = backend.resolve_public_url(r#"{"public_url": "https://cdn/y.pdf"}"#, "y.pdf");
        assert_eq!(url, "https://cdn/y.pdf");
    }

    #[test]
    fn test_supabase_public_url_fallback_is_constructed() {
        let backend = supabase_backend();
        let url = backend.resolve_public_url(r#"{"Key": "books/z.pdf"}"#, "z.pdf");
        assert_eq!(url, "https://proj.supabase.co/storage/v1/object/public/books/z.pdf");

        let url = backend.resolve_public_url("not json at all", "z.pdf");
        assert_eq!(url, "https://proj.supabase.co/storage/v1/object/public/books/z.pdf");
    }
}
