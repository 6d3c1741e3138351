//! Backblaze B2 client over the native REST API
//!
//! The native API exposes bucket types, file ids and download authorization
//! tokens that the S3-compatible endpoint does not, so this client talks to
//! `b2api/v2` directly.

use crate::error::{Error, Result};
use crate::fsutil::guess_mime_type;
use crate::settings::B2Settings;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::Path;

const AUTHORIZE_URL: &str = "https://api.backblazeb2.com/b2api/v2/b2_authorize_account";

/// Default validity of a temporary download link, in seconds
pub const DEFAULT_LINK_VALIDITY_SECS: u64 = 900;

/// B2 bucket visibility type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum B2BucketType {
    #[serde(rename = "allPublic")]
    AllPublic,
    #[serde(rename = "allPrivate")]
    AllPrivate,
    #[serde(rename = "snapshot")]
    Snapshot,
}

impl fmt::Display for B2BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            B2BucketType::AllPublic => "allPublic",
            B2BucketType::AllPrivate => "allPrivate",
            B2BucketType::Snapshot => "snapshot",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for B2BucketType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "allPublic" => Ok(B2BucketType::AllPublic),
            "allPrivate" => Ok(B2BucketType::AllPrivate),
            "snapshot" => Ok(B2BucketType::Snapshot),
            other => Err(Error::InvalidInput(format!(
                "Unknown bucket type '{}' (expected allPublic, allPrivate or snapshot)",
                other
            ))),
        }
    }
}

/// A B2 bucket
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct B2Bucket {
    pub bucket_id: String,
    pub bucket_name: String,
    pub bucket_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketListResponse {
    buckets: Vec<B2Bucket>,
}

/// A file version stored in B2
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct B2File {
    pub file_id: String,
    pub file_name: String,
    pub content_length: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_sha1: Option<String>,
    #[serde(default)]
    pub upload_timestamp: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeResponse {
    account_id: String,
    authorization_token: String,
    api_url: String,
    download_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlResponse {
    upload_url: String,
    authorization_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadAuthResponse {
    authorization_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Authorized Backblaze B2 API session
pub struct B2Client {
    http_client: reqwest::Client,
    account_id: String,
    auth_token: String,
    api_url: String,
    download_url: String,
}

impl B2Client {
    /// Authorize against the account and return a ready client
    pub async fn authorize(settings: &B2Settings) -> Result<Self> {
        let http_client = reqwest::Client::new();
        let response = http_client
            .get(AUTHORIZE_URL)
            .basic_auth(&settings.app_id, Some(&settings.app_key))
            .send()
            .await?;

        let auth: AuthorizeResponse = handle_response(response).await?.json().await?;
        tracing::debug!(account_id = %auth.account_id, "Authorized B2 account");

        Ok(Self {
            http_client,
            account_id: auth.account_id,
            auth_token: auth.authorization_token,
            api_url: auth.api_url,
            download_url: auth.download_url,
        })
    }

    /// List all buckets of the account
    pub async fn list_buckets(&self) -> Result<Vec<B2Bucket>> {
        let response = self
            .post_json(
                "b2_list_buckets",
                json!({ "accountId": self.account_id }),
            )
            .await?;
        let list: BucketListResponse = response.json().await?;
        Ok(list.buckets)
    }

    /// Create a bucket
    pub async fn create_bucket(&self, name: &str, bucket_type: B2BucketType) -> Result<B2Bucket> {
        let response = self
            .post_json(
                "b2_create_bucket",
                json!({
                    "accountId": self.account_id,
                    "bucketName": name,
                    "bucketType": bucket_type.to_string(),
                }),
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Delete a bucket by id
    pub async fn delete_bucket(&self, bucket_id: &str) -> Result<B2Bucket> {
        let response = self
            .post_json(
                "b2_delete_bucket",
                json!({
                    "accountId": self.account_id,
                    "bucketId": bucket_id,
                }),
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Change a bucket's type
    pub async fn update_bucket(
        &self,
        bucket_id: &str,
        bucket_type: B2BucketType,
    ) -> Result<B2Bucket> {
        let response = self
            .post_json(
                "b2_update_bucket",
                json!({
                    "accountId": self.account_id,
                    "bucketId": bucket_id,
                    "bucketType": bucket_type.to_string(),
                }),
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Find a bucket by name
    pub async fn get_bucket_by_name(&self, name: &str) -> Result<B2Bucket> {
        self.list_buckets()
            .await?
            .into_iter()
            .find(|b| b.bucket_name == name)
            .ok_or_else(|| Error::BucketNotFound(name.to_string()))
    }

    /// Upload a local file into a bucket
    pub async fn upload_file(
        &self,
        bucket_id: &str,
        local_path: &Path,
        b2_file_name: Option<&str>,
    ) -> Result<B2File> {
        if !local_path.is_file() {
            return Err(Error::NotFound(format!(
                "File not found in {}",
                local_path.display()
            )));
        }

        let file_name = match b2_file_name {
            Some(name) => name.to_string(),
            None => crate::fsutil::basename(local_path),
        };

        let upload = self.get_upload_url(bucket_id).await?;
        let bytes = tokio::fs::read(local_path).await?;
        let sha1_hex = hex_sha1(&bytes);
        let content_type = guess_mime_type(local_path);

        tracing::debug!(file = %file_name, size = bytes.len(), "Uploading to B2");

        let response = self
            .http_client
            .post(&upload.upload_url)
            .header("Authorization", &upload.authorization_token)
            .header("X-Bz-File-Name", urlencoding::encode(&file_name).as_ref())
            .header("Content-Type", content_type)
            .header("X-Bz-Content-Sha1", sha1_hex)
            .body(bytes)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Delete one version of a file
    pub async fn delete_file_version(&self, file_id: &str, file_name: &str) -> Result<()> {
        self.post_json(
            "b2_delete_file_version",
            json!({
                "fileId": file_id,
                "fileName": file_name,
            }),
        )
        .await?;
        Ok(())
    }

    /// Fetch metadata of a file version
    pub async fn get_file_info(&self, file_id: &str) -> Result<B2File> {
        let response = self
            .post_json("b2_get_file_info", json!({ "fileId": file_id }))
            .await?;
        Ok(response.json().await?)
    }

    /// Public download URL for a file by bucket and name
    pub fn download_url_by_name(&self, bucket_name: &str, file_name: &str) -> String {
        format!(
            "{}/file/{}/{}",
            self.download_url,
            bucket_name,
            urlencoding::encode(file_name)
        )
    }

    /// Public download URL for a file by id
    pub fn download_url_by_id(&self, file_id: &str) -> String {
        format!(
            "{}/b2api/v2/b2_download_file_by_id?fileId={}",
            self.download_url, file_id
        )
    }

    /// Build a time-limited download link for a private bucket
    pub async fn temporary_download_link(
        &self,
        bucket_id: &str,
        bucket_name: &str,
        file_name: &str,
        valid_secs: u64,
    ) -> Result<String> {
        if valid_secs == 0 {
            return Err(Error::InvalidInput(
                "Link validity must be a positive number of seconds".to_string(),
            ));
        }

        let response = self
            .post_json(
                "b2_get_download_authorization",
                json!({
                    "bucketId": bucket_id,
                    "fileNamePrefix": file_name,
                    "validDurationInSeconds": valid_secs,
                }),
            )
            .await?;
        let auth: DownloadAuthResponse = response.json().await?;

        Ok(format!(
            "{}?Authorization={}",
            self.download_url_by_name(bucket_name, file_name),
            auth.authorization_token
        ))
    }

    async fn get_upload_url(&self, bucket_id: &str) -> Result<UploadUrlResponse> {
        let response = self
            .post_json("b2_get_upload_url", json!({ "bucketId": bucket_id }))
            .await?;
        Ok(response.json().await?)
    }

    async fn post_json(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/b2api/v2/{}", self.api_url, endpoint);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", &self.auth_token)
            .json(&body)
            .send()
            .await?;
        handle_response(response).await
    }
}

fn hex_sha1(bytes: &[u8]) -> String {
    let digest = Sha1::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Map B2's JSON error envelope to typed errors
async fn handle_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let api_error: ApiError = serde_json::from_str(&body).unwrap_or(ApiError {
        code: String::new(),
        message: body.clone(),
    });

    match status {
        reqwest::StatusCode::UNAUTHORIZED => Err(Error::Authentication(format!(
            "B2 authorization failed: {}",
            api_error.message
        ))),
        reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound(api_error.message)),
        _ => Err(Error::B2Api(format!(
            "{} (HTTP {}): {}",
            api_error.code,
            status.as_u16(),
            api_error.message
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_bucket_type_round_trip() {
        for (s, t) in [
            ("allPublic", B2BucketType::AllPublic),
            ("allPrivate", B2BucketType::AllPrivate),
            ("snapshot", B2BucketType::Snapshot),
        ] {
            assert_eq!(B2BucketType::from_str(s).unwrap(), t);
            assert_eq!(t.to_string(), s);
        }
        assert!(B2BucketType::from_str("public").is_err());
    }

    #[test]
    fn test_hex_sha1_known_value() {
        // sha1("hello world")
        assert_eq!(
            hex_sha1(b"hello world"),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn test_authorize_response_parsing() {
        let json = r#"{
            "accountId": "abc123",
            "authorizationToken": "token_xyz",
            "apiUrl": "https://api002.backblazeb2.com",
            "downloadUrl": "https://f002.backblazeb2.com",
            "recommendedPartSize": 100000000
        }"#;
        let auth: AuthorizeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(auth.account_id, "abc123");
        assert_eq!(auth.download_url, "https://f002.backblazeb2.com");
    }

    #[test]
    fn test_zero_validity_link_is_rejected() {
        let client = B2Client {
            http_client: reqwest::Client::new(),
            account_id: "acct".to_string(),
            auth_token: "tok".to_string(),
            api_url: "https://api002.backblazeb2.com".to_string(),
            download_url: "https://f002.backblazeb2.com".to_string(),
        };
        let result = tokio_test::block_on(client.temporary_download_link(
            "bucket-id",
            "my-bucket",
            "photos/cat.jpg",
            0,
        ));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_download_urls() {
        let client = B2Client {
            http_client: reqwest::Client::new(),
            account_id: "acct".to_string(),
            auth_token: "tok".to_string(),
            api_url: "https://api002.backblazeb2.com".to_string(),
            download_url: "https://f002.backblazeb2.com".to_string(),
        };
        assert_eq!(
            client.download_url_by_name("my-bucket", "photos/cat.jpg"),
            "https://f002.backblazeb2.com/file/my-bucket/photos%2Fcat.jpg"
        );
        assert_eq!(
            client.download_url_by_id("4_z27c88f1d182b150646ff0b16_f200ec3"),
            "https://f002.backblazeb2.com/b2api/v2/b2_download_file_by_id?fileId=4_z27c88f1d182b150646ff0b16_f200ec3"
        );
    }
}
