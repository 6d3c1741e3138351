//! Firebase Auth user lookups via the Identity Toolkit API

use crate::error::{Error, Result};
use crate::google_token::{scopes, TokenProvider};
use crate::settings::FirebaseSettings;
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default page size for user listings
pub const DEFAULT_LIST_MAX_RESULTS: u32 = 100;

/// A Firebase Auth account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseUser {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
    /// Creation time in epoch milliseconds, as a string
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One page of a user listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    #[serde(default, rename = "users")]
    pub users: Vec<FirebaseUser>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<FirebaseUser>,
}

/// Identity Toolkit client for one Firebase project
pub struct FirebaseClient {
    http_client: reqwest::Client,
    token: TokenProvider,
}

impl FirebaseClient {
    pub fn new(settings: &FirebaseSettings) -> Result<Self> {
        let token =
            TokenProvider::from_file(&settings.service_account, scopes::IDENTITY_TOOLKIT)?;
        Ok(Self {
            http_client: reqwest::Client::new(),
            token,
        })
    }

    /// Look up a user by their Firebase uid
    pub async fn get_user_by_id(&self, local_id: &str) -> Result<FirebaseUser> {
        self.lookup(json!({ "localId": [local_id] }), local_id).await
    }

    /// Look up a user by email address
    pub async fn get_user_by_email(&self, email: &str) -> Result<FirebaseUser> {
        self.lookup(json!({ "email": [email] }), email).await
    }

    /// Look up a user by E.164 phone number
    pub async fn get_user_by_phone_number(&self, phone_number: &str) -> Result<FirebaseUser> {
        self.lookup(json!({ "phoneNumber": [phone_number] }), phone_number)
            .await
    }

    /// List users, one page at a time
    pub async fn list_users(
        &self,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<UserPage> {
        let url = format!(
            "{}/projects/{}/accounts:batchGet",
            API_BASE,
            self.token.project_id()
        );

        let mut query: Vec<(&str, String)> = vec![("maxResults", max_results.to_string())];
        if let Some(token) = page_token {
            query.push(("nextPageToken", token.to_string()));
        }

        let token = self.token.token().await?;
        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .bearer_auth(token)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    async fn lookup(&self, body: serde_json::Value, identifier: &str) -> Result<FirebaseUser> {
        let url = format!(
            "{}/projects/{}/accounts:lookup",
            API_BASE,
            self.token.project_id()
        );

        let token = self.token.token().await?;
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let lookup: LookupResponse = handle_response(response).await?.json().await?;
        lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Firebase user not found: {}", identifier)))
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
            Error::Authentication(format!("Firebase rejected the request: {}", body)),
        ),
        reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound(body)),
        _ => Err(Error::FirebaseApi(format!(
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
    fn test_user_parsing() {
        let json = r#"{
            "localId": "uid123",
            "email": "ada@example.com",
            "emailVerified": true,
            "displayName": "Ada",
            "createdAt": "1700000000000"
        }"#;
        let user: FirebaseUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.local_id, "uid123");
        assert!(user.email_verified);
        assert!(!user.disabled);
        assert_eq!(user.phone_number, None);
    }

    #[test]
    fn test_user_page_parsing() {
        let json = r#"{
            "users": [{"localId": "a"}, {"localId": "b"}],
            "nextPageToken": "tok123"
        }"#;
        let page: UserPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.users.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("tok123"));
    }

    #[test]
    fn test_empty_lookup_means_not_found() {
        let lookup: LookupResponse = serde_json::from_str(r#"{"kind":"x"}"#).unwrap();
        assert!(lookup.users.is_empty());
    }
}
