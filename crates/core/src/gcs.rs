//! Google Cloud Storage client over the JSON API
//!
//! Uses the `storage/v1` REST surface directly with a service-account bearer
//! token. Folders are the usual GCS convention: zero-byte placeholder objects
//! whose name ends in `/`.

use crate::error::{Error, Result};
use crate::fsutil::{guess_mime_type, md5_digest};
use crate::google_token::{scopes, TokenProvider};
use crate::net;
use crate::settings::GcsSettings;
use crate::types::{split_object_name, BucketFile, DownloadBucketFile};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const API_BASE: &str = "https://storage.googleapis.com/storage/v1";
const UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Default per-request timeout for uploads, in seconds
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 300;

/// Options controlling a single upload
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Skip the upload when an object with the same MD5 already exists in the
    /// target folder
    pub check_if_exists: bool,
    /// Probe upstream bandwidth and widen the timeout for large files
    pub estimate_upload_time: bool,
    /// Upload timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            check_if_exists: false,
            estimate_upload_time: false,
            timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
        }
    }
}

/// Object resource as returned by the JSON API.
/// Numeric fields arrive as strings.
#[derive(Debug, Deserialize)]
struct ObjectResource {
    id: Option<String>,
    name: String,
    bucket: String,
    size: Option<String>,
    #[serde(rename = "timeCreated")]
    time_created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    #[serde(rename = "md5Hash")]
    md5_hash: Option<String>,
    #[serde(rename = "crc32c")]
    crc32c: Option<String>,
    #[serde(rename = "contentType")]
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    prefixes: Vec<String>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BucketResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BucketList {
    #[serde(default)]
    items: Vec<BucketResource>,
}

/// Google Cloud Storage client bound to one bucket
pub struct GcsClient {
    http_client: reqwest::Client,
    token: TokenProvider,
    bucket: String,
}

impl GcsClient {
    /// Build a client from decrypted settings and verify the bucket exists
    pub async fn new(settings: &GcsSettings) -> Result<Self> {
        let token = TokenProvider::from_file(&settings.service_account, scopes::STORAGE)?;
        let client = Self {
            http_client: reqwest::Client::new(),
            token,
            bucket: settings.bucket_name.clone(),
        };
        client.check_bucket().await?;
        Ok(client)
    }

    /// Bucket this client operates on
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Verify the configured bucket exists and is reachable
    pub async fn check_bucket(&self) -> Result<()> {
        let url = format!("{}/b/{}", API_BASE, self.bucket);
        let response = self.get(&url, &[]).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::BucketNotFound(self.bucket.clone()));
        }
        handle_response(response).await?;
        Ok(())
    }

    /// List the buckets of the service account's project
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let url = format!("{}/b", API_BASE);
        let response = self
            .get(&url, &[("project", self.token.project_id())])
            .await?;
        let list: BucketList = handle_response(response).await?.json().await?;
        Ok(list.items.into_iter().map(|b| b.name).collect())
    }

    /// Upload a local file into a bucket folder
    pub async fn upload_file(
        &self,
        local_path: &Path,
        bucket_folder: &str,
        options: &UploadOptions,
    ) -> Result<BucketFile> {
        if !local_path.is_file() {
            return Err(Error::NotFound(format!(
                "File not found in {}",
                local_path.display()
            )));
        }

        let folder = normalize_folder(bucket_folder);
        let basename = crate::fsutil::basename(local_path);
        let object_name = format!("{}{}", folder, basename);

        if options.check_if_exists {
            let local_md5 = STANDARD.encode(md5_digest(local_path)?);
            if let Some(existing) = self.find_by_md5(&folder, &local_md5).await? {
                tracing::info!(object = %existing.file_path_in_bucket, "Identical object already in bucket, skipping upload");
                return Ok(existing);
            }
        }

        let bytes = tokio::fs::read(local_path).await?;
        let mut timeout_secs = options.timeout_secs;
        if options.estimate_upload_time {
            let file_size_mb = (bytes.len() as u64) / (1024 * 1024);
            if let Ok(estimate) = net::estimate_upload_time(file_size_mb).await {
                timeout_secs = timeout_secs.max(estimate.ceil() as u64 + 30);
            }
        }

        let content_type = guess_mime_type(local_path);
        self.upload_object(&object_name, bytes, &content_type, timeout_secs)
            .await
    }

    /// Upload an in-memory payload as `folder/name`
    pub async fn upload_bytes(
        &self,
        bytes: Vec<u8>,
        bucket_folder: &str,
        name: &str,
        content_type: &str,
        options: &UploadOptions,
    ) -> Result<BucketFile> {
        let folder = normalize_folder(bucket_folder);
        let object_name = format!("{}{}", folder, name);

        if options.check_if_exists {
            let local_md5 = STANDARD.encode(md5::compute(&bytes).0);
            if let Some(existing) = self.find_by_md5(&folder, &local_md5).await? {
                tracing::info!(object = %existing.file_path_in_bucket, "Identical object already in bucket, skipping upload");
                return Ok(existing);
            }
        }

        self.upload_object(&object_name, bytes, content_type, options.timeout_secs)
            .await
    }

    /// Fetch metadata for one object. Returns `None` for missing objects and
    /// for folder placeholders.
    pub async fn get_file(&self, bucket_path: &str) -> Result<Option<BucketFile>> {
        if bucket_path.ends_with('/') {
            return Ok(None);
        }

        let url = format!(
            "{}/b/{}/o/{}",
            API_BASE,
            self.bucket,
            urlencoding::encode(bucket_path)
        );
        let response = self.get(&url, &[]).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let resource: ObjectResource = handle_response(response).await?.json().await?;
        Ok(Some(self.to_bucket_file(resource)))
    }

    /// List the files under a folder, skipping folder placeholders
    pub async fn list_files(&self, bucket_folder: &str) -> Result<Vec<BucketFile>> {
        let folder = normalize_folder(bucket_folder);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = format!("{}/b/{}/o", API_BASE, self.bucket);
            let mut query: Vec<(&str, String)> = vec![("prefix", folder.clone())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self.get_with_query(&url, &query).await?;
            let list: ObjectList = handle_response(response).await?.json().await?;

            for item in list.items {
                if item.name.ends_with('/') {
                    continue;
                }
                files.push(self.to_bucket_file(item));
            }

            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    /// List the immediate subfolders of a folder
    pub async fn list_folders(&self, bucket_folder: &str) -> Result<Vec<String>> {
        let folder = normalize_folder(bucket_folder);
        let mut folders = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = format!("{}/b/{}/o", API_BASE, self.bucket);
            let mut query: Vec<(&str, String)> = vec![
                ("prefix", folder.clone()),
                ("delimiter", "/".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self.get_with_query(&url, &query).await?;
            let list: ObjectList = handle_response(response).await?.json().await?;
            folders.extend(list.prefixes);

            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(folders)
    }

    /// Create a folder placeholder object
    pub async fn create_folder(&self, folder_name: &str) -> Result<String> {
        let folder = normalize_folder(folder_name);
        if folder.is_empty() {
            return Err(Error::InvalidInput("Folder name cannot be empty".to_string()));
        }

        let url = format!("{}/b/{}/o", UPLOAD_BASE, self.bucket);
        let token = self.token.token().await?;
        let response = self
            .http_client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", folder.as_str())])
            .bearer_auth(token)
            .header(
                "Content-Type",
                "application/x-www-form-urlencoded;charset=UTF-8",
            )
            .body(Vec::new())
            .send()
            .await?;

        handle_response(response).await?;
        Ok(folder)
    }

    /// Delete the given objects. Fails with the list of objects that could
    /// not be deleted.
    pub async fn delete_files(&self, bucket_paths: &[String]) -> Result<()> {
        let mut failed = Vec::new();

        for path in bucket_paths {
            let url = format!(
                "{}/b/{}/o/{}",
                API_BASE,
                self.bucket,
                urlencoding::encode(path)
            );
            let token = self.token.token().await?;
            let response = self
                .http_client
                .delete(&url)
                .bearer_auth(token)
                .send()
                .await?;

            if !response.status().is_success() {
                failed.push(path.clone());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::GcsOperation(format!(
                "Could not delete: {}",
                failed.join(", ")
            )))
        }
    }

    /// Download an object into memory
    pub async fn download_bytes(&self, bucket_path: &str) -> Result<Vec<u8>> {
        let response = self.get_object_media(bucket_path).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Download an object to a local path, streaming to disk
    pub async fn download_file(&self, bucket_path: &str, destination: &Path) -> Result<()> {
        let response = self.get_object_media(bucket_path).await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)));
        let mut reader = tokio_util::io::StreamReader::new(stream);
        let mut file = tokio::fs::File::create(destination).await?;
        tokio::io::copy(&mut reader, &mut file).await?;

        tracing::debug!(object = %bucket_path, dest = %destination.display(), "Downloaded object");
        Ok(())
    }

    async fn get_object_media(&self, bucket_path: &str) -> Result<reqwest::Response> {
        let url = format!(
            "{}/b/{}/o/{}?alt=media",
            API_BASE,
            self.bucket,
            urlencoding::encode(bucket_path)
        );
        let token = self.token.token().await?;
        let response = self.http_client.get(&url).bearer_auth(token).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "Object not found: {}",
                bucket_path
            )));
        }

        handle_response(response).await
    }

    /// Download many objects with bounded concurrency. All downloads are
    /// attempted; failures are collected and reported together.
    pub async fn download_many(
        &self,
        files: &[DownloadBucketFile],
        max_concurrency: usize,
    ) -> Result<()> {
        let concurrency = max_concurrency.max(1);

        let results: Vec<(String, Result<()>)> = stream::iter(files)
            .map(|entry| async move {
                let outcome = self
                    .download_file(&entry.bucket_path, &entry.target_path())
                    .await;
                (entry.bucket_path.clone(), outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let failed: Vec<String> = results
            .into_iter()
            .filter_map(|(path, outcome)| match outcome {
                Ok(()) => None,
                Err(e) => Some(format!("{}: {}", path, e)),
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::GcsOperation(format!(
                "{} download(s) failed: {}",
                failed.len(),
                failed.join("; ")
            )))
        }
    }

    /// Server-side copy within the bucket
    pub async fn copy_file(&self, source_path: &str, destination_path: &str) -> Result<BucketFile> {
        let url = format!(
            "{}/b/{}/o/{}/copyTo/b/{}/o/{}",
            API_BASE,
            self.bucket,
            urlencoding::encode(source_path),
            self.bucket,
            urlencoding::encode(destination_path)
        );
        let token = self.token.token().await?;
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .header("Content-Length", "0")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "Object not found: {}",
                source_path
            )));
        }

        let resource: ObjectResource = handle_response(response).await?.json().await?;
        Ok(self.to_bucket_file(resource))
    }

    /// Copy then delete the source
    pub async fn move_file(&self, source_path: &str, destination_path: &str) -> Result<BucketFile> {
        let copied = self.copy_file(source_path, destination_path).await?;
        self.delete_files(&[source_path.to_string()]).await?;
        Ok(copied)
    }

    async fn upload_object(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        timeout_secs: u64,
    ) -> Result<BucketFile> {
        let url = format!("{}/b/{}/o", UPLOAD_BASE, self.bucket);
        let token = self.token.token().await?;

        tracing::debug!(object = %object_name, size = bytes.len(), "Uploading object");

        let response = self
            .http_client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object_name)])
            .bearer_auth(token)
            .header("Content-Type", content_type)
            .timeout(Duration::from_secs(timeout_secs))
            .body(bytes)
            .send()
            .await?;

        let resource: ObjectResource = handle_response(response).await?.json().await?;
        Ok(self.to_bucket_file(resource))
    }

    /// Find an object in `folder` whose MD5 matches. Errors when more than
    /// one object carries the same digest.
    async fn find_by_md5(&self, folder: &str, md5_b64: &str) -> Result<Option<BucketFile>> {
        let matches: Vec<BucketFile> = self
            .list_files(folder)
            .await?
            .into_iter()
            .filter(|f| f.md5_hash.as_deref() == Some(md5_b64))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.into_iter().next()),
            n => Err(Error::GcsOperation(format!(
                "{} objects in {} share the same MD5, refusing to pick one",
                n, folder
            ))),
        }
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let token = self.token.token().await?;
        Ok(self
            .http_client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?)
    }

    async fn get_with_query(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let token = self.token.token().await?;
        Ok(self
            .http_client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?)
    }

    fn to_bucket_file(&self, resource: ObjectResource) -> BucketFile {
        resource_to_bucket_file(resource)
    }
}

/// Ensure a folder path ends with exactly one `/` and has no leading `/`.
/// The bucket root is the empty string.
fn normalize_folder(folder: &str) -> String {
    let trimmed = folder.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Public HTTP URL of an object. Path separators stay literal; only the
/// segments between them are percent-encoded.
fn public_url(bucket: &str, object_name: &str) -> String {
    let encoded = object_name
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("https://storage.googleapis.com/{}/{}", bucket, encoded)
}

/// Browser URL requiring a signed-in Google account
fn authenticated_url(bucket: &str, object_name: &str) -> String {
    public_url(bucket, object_name).replace("googleapis", "cloud.google")
}

fn resource_to_bucket_file(resource: ObjectResource) -> BucketFile {
    let (basename, extension) = split_object_name(&resource.name);
    let size_bytes = resource
        .size
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    BucketFile {
        id: resource.id,
        basename,
        extension,
        public_url: public_url(&resource.bucket, &resource.name),
        authenticated_url: Some(authenticated_url(&resource.bucket, &resource.name)),
        file_path_in_bucket: resource.name,
        bucket_name: resource.bucket,
        size_bytes,
        creation_date: resource.time_created,
        modification_date: resource.updated,
        md5_hash: resource.md5_hash,
        crc32c_checksum: resource.crc32c,
        content_type: resource.content_type,
    }
}

/// Map a non-success JSON API response to a typed error
async fn handle_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Err(
            Error::Authentication(format!("GCS rejected the request: {}", body)),
        ),
        reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound(body)),
        _ => Err(Error::GcsOperation(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str, size: Option<&str>) -> ObjectResource {
        ObjectResource {
            id: Some(format!("my-bucket/{}/123", name)),
            name: name.to_string(),
            bucket: "my-bucket".to_string(),
            size: size.map(|s| s.to_string()),
            time_created: None,
            updated: None,
            md5_hash: Some("XrY7u+Ae7tCTyyK7j1rNww==".to_string()),
            crc32c: Some("yZRlqg==".to_string()),
            content_type: Some("text/plain".to_string()),
        }
    }

    #[test]
    fn test_normalize_folder() {
        assert_eq!(normalize_folder("docs"), "docs/");
        assert_eq!(normalize_folder("docs/"), "docs/");
        assert_eq!(normalize_folder("/docs/2024/"), "docs/2024/");
        assert_eq!(normalize_folder(""), "");
        assert_eq!(normalize_folder("/"), "");
    }

    #[test]
    fn test_object_urls() {
        assert_eq!(
            public_url("my-bucket", "docs/report.pdf"),
            "https://storage.googleapis.com/my-bucket/docs/report.pdf"
        );
        assert_eq!(
            authenticated_url("my-bucket", "docs/report.pdf"),
            "https://storage.cloud.google.com/my-bucket/docs/report.pdf"
        );
    }

    #[test]
    fn test_object_url_encodes_within_segments() {
        assert_eq!(
            public_url("my-bucket", "docs/Q3 report & notes.pdf"),
            "https://storage.googleapis.com/my-bucket/docs/Q3%20report%20%26%20notes.pdf"
        );
    }

    #[test]
    fn test_resource_conversion_parses_string_size() {
        let file = resource_to_bucket_file(resource("docs/report.pdf", Some("2048")));
        assert_eq!(file.basename, "report.pdf");
        assert_eq!(file.extension, "pdf");
        assert_eq!(file.size_bytes, 2048);
        assert_eq!(file.bucket_name, "my-bucket");
        assert_eq!(file.md5_hash.as_deref(), Some("XrY7u+Ae7tCTyyK7j1rNww=="));
    }

    #[test]
    fn test_resource_conversion_missing_size() {
        let file = resource_to_bucket_file(resource("x.bin", None));
        assert_eq!(file.size_bytes, 0);
    }

    #[test]
    fn test_object_list_deserializes_prefixes() {
        let json = r#"{"kind":"storage#objects","prefixes":["docs/a/","docs/b/"]}"#;
        let list: ObjectList = serde_json::from_str(json).unwrap();
        assert!(list.items.is_empty());
        assert_eq!(list.prefixes, vec!["docs/a/", "docs/b/"]);
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_object_list_pages_carry_prefixes_and_token() {
        // A prefix listing larger than one page: the token must be followed
        // and every page's prefixes kept.
        let pages = [
            r#"{"prefixes":["docs/a/"],"nextPageToken":"page-2"}"#,
            r#"{"prefixes":["docs/b/","docs/c/"]}"#,
        ];

        let mut folders = Vec::new();
        let mut token: Option<String> = None;
        for (i, raw) in pages.iter().enumerate() {
            if i > 0 {
                assert_eq!(token.as_deref(), Some("page-2"));
            }
            let list: ObjectList = serde_json::from_str(raw).unwrap();
            folders.extend(list.prefixes);
            token = list.next_page_token;
        }

        assert!(token.is_none());
        assert_eq!(folders, vec!["docs/a/", "docs/b/", "docs/c/"]);
    }
}
