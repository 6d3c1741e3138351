//! Shared data types for the object-storage clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata for an object stored in a bucket, normalized across providers.
/// Fields a provider does not report are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketFile {
    /// Provider-specific object id, when the provider has one
    pub id: Option<String>,
    /// Object basename, e.g. `report.pdf`
    pub basename: String,
    /// File extension without the dot, empty when there is none
    pub extension: String,
    /// Full object key inside the bucket
    pub file_path_in_bucket: String,
    /// Bucket the object lives in
    pub bucket_name: String,
    /// Unauthenticated public URL (valid only for public objects)
    pub public_url: String,
    /// Browser URL requiring a signed-in Google account (GCS only)
    pub authenticated_url: Option<String>,
    pub size_bytes: u64,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    /// Base64-encoded MD5 digest, as reported by the provider
    pub md5_hash: Option<String>,
    /// Base64-encoded CRC32C checksum (GCS only)
    pub crc32c_checksum: Option<String>,
    pub content_type: Option<String>,
}

/// One entry of a bulk download request
#[derive(Debug, Clone)]
pub struct DownloadBucketFile {
    /// Object key in the bucket
    pub bucket_path: String,
    /// Local directory to download into
    pub download_directory: PathBuf,
    /// Filename to write; defaults to the object basename when `None`
    pub filename_on_disk: Option<String>,
}

impl DownloadBucketFile {
    pub fn new(bucket_path: impl Into<String>, download_directory: impl Into<PathBuf>) -> Self {
        Self {
            bucket_path: bucket_path.into(),
            download_directory: download_directory.into(),
            filename_on_disk: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename_on_disk = Some(filename.into());
        self
    }

    /// Local path this entry downloads to
    pub fn target_path(&self) -> PathBuf {
        let name = match &self.filename_on_disk {
            Some(name) => name.clone(),
            None => self
                .bucket_path
                .rsplit('/')
                .next()
                .unwrap_or(&self.bucket_path)
                .to_string(),
        };
        self.download_directory.join(name)
    }
}

/// Split an object key into basename and extension (without the dot)
pub(crate) fn split_object_name(key: &str) -> (String, String) {
    let basename = key.rsplit('/').next().unwrap_or(key).to_string();
    let extension = match basename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
        _ => String::new(),
    };
    (basename, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_object_name() {
        assert_eq!(
            split_object_name("docs/2024/report.pdf"),
            ("report.pdf".to_string(), "pdf".to_string())
        );
        assert_eq!(
            split_object_name("README"),
            ("README".to_string(), String::new())
        );
        assert_eq!(
            split_object_name("dir/.hidden"),
            (".hidden".to_string(), String::new())
        );
        assert_eq!(
            split_object_name("archive.tar.gz"),
            ("archive.tar.gz".to_string(), "gz".to_string())
        );
    }

    #[test]
    fn test_download_target_path_defaults_to_basename() {
        let entry = DownloadBucketFile::new("videos/clip.mp4", "/tmp/out");
        assert_eq!(entry.target_path(), PathBuf::from("/tmp/out/clip.mp4"));
    }

    #[test]
    fn test_download_target_path_honors_explicit_filename() {
        let entry =
            DownloadBucketFile::new("videos/clip.mp4", "/tmp/out").with_filename("renamed.mp4");
        assert_eq!(entry.target_path(), PathBuf::from("/tmp/out/renamed.mp4"));
    }
}
