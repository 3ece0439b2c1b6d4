//! Document storage: local filesystem or S3 / MinIO.
//!
//! Objects are addressed by key (`applications/{application_id}/{document_id}.{ext}`).
//! The local backend maps keys to paths under a root directory and is used
//! in development and tests.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use secrecy::ExposeSecret;
use tracing::info;
use uuid::Uuid;

use crate::config::{S3Settings, StorageBackendKind, StorageSettings};
use crate::error::{AppError, AppResult};
use crate::models::mime_for_extension;

#[derive(Clone)]
enum Backend {
    Local { root: PathBuf },
    S3 { client: Client, bucket: String },
}

/// Storage client wrapper.
#[derive(Clone)]
pub struct Storage {
    backend: Backend,
}

impl Storage {
    /// Create the configured storage backend.
    pub async fn new(config: &StorageSettings) -> AppResult<Self> {
        match config.backend {
            StorageBackendKind::Local => Self::local(&config.local_dir).await,
            StorageBackendKind::S3 => Self::s3(&config.s3).await,
        }
    }

    /// Filesystem storage rooted at `root` (created if missing).
    pub async fn local(root: &Path) -> AppResult<Self> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;
        info!("Local storage initialized: root={}", root.display());
        Ok(Self {
            backend: Backend::Local {
                root: root.to_path_buf(),
            },
        })
    }

    /// S3 / MinIO storage. The bucket is created if it does not exist.
    pub async fn s3(config: &S3Settings) -> AppResult<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            config.secret_key.expose_secret(),
            None,
            None,
            "handi",
        );

        let region = Region::new(config.region.clone());

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .force_path_style(true); // Required for MinIO

        if let Some(ref endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());
        ensure_bucket_exists(&client, &config.bucket).await?;

        info!("S3 storage initialized: bucket={}", config.bucket);

        Ok(Self {
            backend: Backend::S3 {
                client,
                bucket: config.bucket.clone(),
            },
        })
    }

    /// Build the object key of an application document.
    pub fn document_key(application_id: Uuid, document_id: Uuid, extension: &str) -> String {
        format!(
            "applications/{}/{}.{}",
            application_id,
            document_id,
            extension.to_lowercase()
        )
    }

    /// Store an object.
    pub async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> AppResult<()> {
        match &self.backend {
            Backend::Local { root } => {
                let path = local_path(root, key)?;
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::Storage(format!("Failed to create directory for {}: {}", key, e))
                    })?;
                }
                // Write then rename so readers never see a partial file.
                let tmp = path.with_extension("part");
                tokio::fs::write(&tmp, &data)
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))?;
                tokio::fs::rename(&tmp, &path)
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to move {}: {}", key, e)))?;
                Ok(())
            }
            Backend::S3 { client, bucket } => {
                let body = aws_sdk_s3::primitives::ByteStream::from(data);
                let mut request = client.put_object().bucket(bucket).key(key).body(body);

                if let Some(ct) = content_type {
                    request = request.content_type(ct);
                }

                request
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to upload file to S3: {}", e)))?;
                Ok(())
            }
        }
    }

    /// Get an object's bytes and content type.
    pub async fn get(&self, key: &str) -> AppResult<(Vec<u8>, Option<String>)> {
        match &self.backend {
            Backend::Local { root } => {
                let path = local_path(root, key)?;
                let data = tokio::fs::read(&path).await.map_err(|e| {
                    if e.kind() == ErrorKind::NotFound {
                        AppError::NotFound(format!("File not found: {}", key))
                    } else {
                        AppError::Storage(format!("Failed to read {}: {}", key, e))
                    }
                })?;
                let content_type = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(|e| mime_for_extension(&e.to_lowercase()))
                    .map(str::to_string);
                Ok((data, content_type))
            }
            Backend::S3 { client, bucket } => {
                let response = client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| {
                        let service_error = e.into_service_error();
                        if service_error.is_no_such_key() {
                            AppError::NotFound(format!("File not found: {}", key))
                        } else {
                            AppError::Storage(format!(
                                "Failed to get file from S3: {}",
                                service_error
                            ))
                        }
                    })?;

                let content_type = response.content_type().map(String::from);
                let data = response
                    .body
                    .collect()
                    .await
                    .map_err(|e| {
                        AppError::Storage(format!("Failed to read S3 response body: {}", e))
                    })?
                    .into_bytes()
                    .to_vec();

                Ok((data, content_type))
            }
        }
    }

    /// Delete an object. Deleting a missing object succeeds.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        match &self.backend {
            Backend::Local { root } => {
                let path = local_path(root, key)?;
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(AppError::Storage(format!("Failed to delete {}: {}", key, e))),
                }
            }
            Backend::S3 { client, bucket } => {
                client
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::Storage(format!("Failed to delete file from S3: {}", e))
                    })?;
                Ok(())
            }
        }
    }
}

/// Ensure the bucket exists, creating it if necessary.
async fn ensure_bucket_exists(client: &Client, bucket: &str) -> AppResult<()> {
    match client.head_bucket().bucket(bucket).send().await {
        Ok(_) => {
            info!("S3 bucket '{}' exists", bucket);
            Ok(())
        }
        Err(e) => {
            let service_error = e.into_service_error();
            if service_error.is_not_found() {
                info!("Creating S3 bucket '{}'", bucket);
                client
                    .create_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to create bucket: {}", e)))?;
                Ok(())
            } else {
                Err(AppError::Storage(format!(
                    "Failed to access bucket '{}': {}",
                    bucket, service_error
                )))
            }
        }
    }
}

/// Resolve a key under the storage root. Keys must be relative and must
/// not climb out of the root.
fn local_path(root: &Path, key: &str) -> AppResult<PathBuf> {
    let relative = Path::new(key);
    let safe = !key.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(AppError::Storage(format!("Invalid storage key: {}", key)));
    }
    Ok(root.join(relative))
}
