//! Google Drive client (REST v3)

use crate::error::{Error, Result};
use crate::fsutil::{basename, guess_mime_type};
use crate::google_token::{scopes, TokenProvider};
use crate::settings::DriveSettings;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A file or folder on Drive
#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Reported as a string by the API; absent for folders
    #[serde(default)]
    pub size: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// What a share grant allows
#[derive(Debug, Clone)]
pub enum ShareGrant {
    /// Anyone with the link can read
    AnyoneReader,
    /// A specific user can write
    UserWriter { email: String },
}

/// Google Drive client using a service account
pub struct DriveClient {
    http_client: reqwest::Client,
    token: TokenProvider,
}

impl DriveClient {
    pub fn new(settings: &DriveSettings) -> Result<Self> {
        let token = TokenProvider::from_file(&settings.service_account, scopes::DRIVE)?;
        Ok(Self {
            http_client: reqwest::Client::new(),
            token,
        })
    }

    /// Find folders by exact name
    pub async fn find_folders(&self, name: &str) -> Result<Vec<DriveFile>> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\'', "\\'"),
            FOLDER_MIME_TYPE
        );
        let response = self
            .get(&format!("{}/files", API_BASE), &[("q", query.as_str())])
            .await?;
        let list: FileList = handle_response(response).await?.json().await?;
        Ok(list.files)
    }

    /// Create a folder, optionally under a parent folder
    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<DriveFile> {
        let mut metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
        });
        if let Some(parent) = parent_id {
            metadata["parents"] = json!([parent]);
        }

        let token = self.token.token().await?;
        let response = self
            .http_client
            .post(format!("{}/files", API_BASE))
            .bearer_auth(token)
            .json(&metadata)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Upload a local file into a folder (multipart upload)
    pub async fn upload_file(&self, folder_id: &str, local_path: &Path) -> Result<DriveFile> {
        if !local_path.is_file() {
            return Err(Error::NotFound(format!(
                "File not found in {}",
                local_path.display()
            )));
        }

        let file_name = basename(local_path);
        let mime_type = guess_mime_type(local_path);
        let bytes = tokio::fs::read(local_path).await?;

        let metadata = json!({
            "name": file_name,
            "parents": [folder_id],
        });

        let metadata_part = reqwest::multipart::Part::text(metadata.to_string())
            .mime_str("application/json; charset=UTF-8")
            .map_err(|e| Error::DriveApi(e.to_string()))?;
        let media_part = reqwest::multipart::Part::bytes(bytes)
            .mime_str(&mime_type)
            .map_err(|e| Error::DriveApi(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("metadata", metadata_part)
            .part("media", media_part);

        let token = self.token.token().await?;
        tracing::debug!(file = %file_name, folder = %folder_id, "Uploading to Drive");

        let response = self
            .http_client
            .post(format!("{}/files", UPLOAD_BASE))
            .query(&[("uploadType", "multipart"), ("fields", "id,name,mimeType,size")])
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Download a file's content to a local path
    pub async fn download_file(&self, file_id: &str, destination: &Path) -> Result<()> {
        let token = self.token.token().await?;
        let response = self
            .http_client
            .get(format!("{}/files/{}", API_BASE, file_id))
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await?;

        let response = handle_response(response).await?;
        let bytes = response.bytes().await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &bytes).await?;
        Ok(())
    }

    /// List the direct children of a folder
    pub async fn list_files(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let query = format!("'{}' in parents and trashed = false", folder_id);
        let response = self
            .get(
                &format!("{}/files", API_BASE),
                &[
                    ("q", query.as_str()),
                    ("fields", "files(id,name,mimeType,size)"),
                ],
            )
            .await?;
        let list: FileList = handle_response(response).await?.json().await?;
        Ok(list.files)
    }

    /// Delete a file or folder
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let token = self.token.token().await?;
        let response = self
            .http_client
            .delete(format!("{}/files/{}", API_BASE, file_id))
            .bearer_auth(token)
            .send()
            .await?;

        handle_response(response).await?;
        Ok(())
    }

    /// Grant a permission on a file
    pub async fn share(&self, file_id: &str, grant: &ShareGrant) -> Result<()> {
        let body = grant_body(grant)?;
        let token = self.token.token().await?;
        let response = self
            .http_client
            .post(format!("{}/files/{}/permissions", API_BASE, file_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        handle_response(response).await?;
        Ok(())
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
}

/// Permission resource for a share grant
fn grant_body(grant: &ShareGrant) -> Result<serde_json::Value> {
    match grant {
        ShareGrant::AnyoneReader => Ok(json!({
            "type": "anyone",
            "role": "reader",
        })),
        ShareGrant::UserWriter { email } => {
            if email.is_empty() {
                return Err(Error::InvalidInput(
                    "An email address is required to grant writer access".to_string(),
                ));
            }
            Ok(json!({
                "type": "user",
                "role": "writer",
                "emailAddress": email,
            }))
        }
    }
}

async fn handle_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Err(
            Error::Authentication(format!("Drive rejected the request: {}", body)),
        ),
        reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound(body)),
        _ => Err(Error::DriveApi(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_file_parsing() {
        let json = r#"{
            "id": "1abc",
            "name": "report.pdf",
            "mimeType": "application/pdf",
            "size": "2048"
        }"#;
        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert!(!file.is_folder());
        assert_eq!(file.size_bytes(), Some(2048));
    }

    #[test]
    fn test_folder_has_no_size() {
        let json = r#"{
            "id": "1def",
            "name": "Invoices",
            "mimeType": "application/vnd.google-apps.folder"
        }"#;
        let file: DriveFile = serde_json::from_str(json).unwrap();
        assert!(file.is_folder());
        assert_eq!(file.size_bytes(), None);
    }

    #[test]
    fn test_grant_bodies() {
        let anyone = grant_body(&ShareGrant::AnyoneReader).unwrap();
        assert_eq!(anyone["type"], "anyone");
        assert_eq!(anyone["role"], "reader");

        let writer = grant_body(&ShareGrant::UserWriter {
            email: "dev@example.com".to_string(),
        })
        .unwrap();
        assert_eq!(writer["role"], "writer");
        assert_eq!(writer["emailAddress"], "dev@example.com");
    }

    #[test]
    fn test_writer_grant_requires_email() {
        let err = grant_body(&ShareGrant::UserWriter {
            email: String::new(),
        });
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }
}
