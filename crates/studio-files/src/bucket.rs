//! Bucket-scoped upload and URL helpers.

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use studio_auth::{read_json, SessionManager};
use studio_core::{ApiError, ApiResponse};

const UPLOAD_PATH: &str = "/api/upload";

/// Options for [`BucketApi::upload`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: Option<String>,
    /// Overwrite an existing object. Sent only when set.
    pub upsert: Option<bool>,
}

/// `data` of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadData {
    pub path: String,
}

/// Entry point for file storage, sharing the session of the auth shim.
#[derive(Debug, Clone)]
pub struct StorageClient {
    auth: Arc<SessionManager>,
}

impl StorageClient {
    pub fn new(auth: Arc<SessionManager>) -> Self {
        Self { auth }
    }

    /// Operations scoped to one bucket.
    pub fn from(&self, bucket: &str) -> BucketApi {
        BucketApi {
            auth: self.auth.clone(),
            bucket: bucket.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BucketApi {
    auth: Arc<SessionManager>,
    bucket: String,
}

impl BucketApi {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload `bytes` to `path` inside the bucket as a multipart form.
    ///
    /// The request goes through the session's authenticated fetch, so a 401
    /// signs the user out.
    pub async fn upload(
        &self,
        path: &str,
        bytes: impl Into<Vec<u8>>,
        options: UploadOptions,
    ) -> ApiResponse<UploadData> {
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let mut file = Part::bytes(bytes.into()).file_name(file_name);
        if let Some(content_type) = &options.content_type {
            file = match file.mime_str(content_type) {
                Ok(file) => file,
                Err(e) => {
                    return ApiResponse::err(ApiError::with_code(
                        format!("Invalid content type {:?}: {}", content_type, e),
                        ApiError::INVALID_REQUEST,
                    ))
                }
            };
        }

        let mut form = Form::new()
            .part("file", file)
            .text("path", path.to_string())
            .text("bucket", self.bucket.clone());
        if let Some(content_type) = options.content_type {
            form = form.text("contentType", content_type);
        }
        if let Some(upsert) = options.upsert {
            form = form.text("upsert", upsert.to_string());
        }

        tracing::debug!(bucket = %self.bucket, path = %path, "Uploading file");
        let request = self
            .auth
            .http_client()
            .post(format!("{}{}", self.auth.backend_url(), UPLOAD_PATH))
            .multipart(form);

        match read_json(self.auth.send(request).await, "Upload failed").await {
            Ok(body) => {
                let stored = body
                    .get("path")
                    .and_then(Value::as_str)
                    .unwrap_or(path)
                    .to_string();
                ApiResponse::ok(UploadData { path: stored })
            }
            Err(error) => {
                tracing::warn!(bucket = %self.bucket, path = %path, error = %error, "Upload failed");
                ApiResponse::err(error)
            }
        }
    }

    /// `{backend}/files/{bucket}/{path}`. Pure templating; the object need not exist.
    pub fn get_public_url(&self, path: &str) -> String {
        format!("{}/files/{}/{}", self.auth.backend_url(), self.bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_storage::{MemoryStorage, SessionStore};

    fn storage(backend: &str) -> StorageClient {
        let store = SessionStore::new(Box::new(MemoryStorage::new()));
        StorageClient::new(Arc::new(SessionManager::new(store, backend).unwrap()))
    }

    #[test]
    fn test_public_url() {
        let videos = storage("https://studio.example.com").from("videos");
        assert_eq!(
            videos.get_public_url("a/b.png"),
            "https://studio.example.com/files/videos/a/b.png"
        );
    }

    #[test]
    fn test_public_url_trims_backend_slash() {
        let thumbs = storage("https://studio.example.com/").from("thumbnails");
        assert_eq!(thumbs.bucket(), "thumbnails");
        assert_eq!(
            thumbs.get_public_url("cover.jpg"),
            "https://studio.example.com/files/thumbnails/cover.jpg"
        );
    }

    #[tokio::test]
    async fn test_invalid_content_type_is_not_sent() {
        let videos = storage("http://127.0.0.1:1").from("videos");
        let response = videos
            .upload(
                "clip.mp4",
                vec![0u8; 4],
                UploadOptions {
                    content_type: Some("not a mime".to_string()),
                    upsert: None,
                },
            )
            .await;
        assert_eq!(
            response.error.unwrap().code.as_deref(),
            Some(ApiError::INVALID_REQUEST)
        );
    }
}
