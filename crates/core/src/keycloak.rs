//! Keycloak client over the OpenID Connect endpoints

use crate::error::{Error, Result};
use crate::settings::KeycloakSettings;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Token bundle returned by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct KeycloakToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    /// Absolute expiry, computed locally at receive time
    #[serde(skip)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl KeycloakToken {
    fn with_expiry(mut self) -> Self {
        self.expires_at = Some(Utc::now() + Duration::seconds(self.expires_in));
        self
    }
}

/// Result of a token introspection call
#[derive(Debug, Clone, Deserialize)]
pub struct Introspection {
    pub active: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: Value,
}

/// Keycloak client for one realm and client id
pub struct KeycloakClient {
    http_client: reqwest::Client,
    server_url: String,
    realm: String,
    client_id: String,
    client_secret: Option<String>,
}

impl KeycloakClient {
    pub fn new(settings: &KeycloakSettings) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            server_url: settings.server_url.trim_end_matches('/').to_string(),
            realm: settings.realm.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{}",
            self.server_url, self.realm, name
        )
    }

    /// Resource-owner password grant
    pub async fn login(&self, username: &str, password: &str) -> Result<KeycloakToken> {
        let mut form = vec![
            ("grant_type", "password".to_string()),
            ("client_id", self.client_id.clone()),
            ("username", username.to_string()),
            ("password", password.to_string()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let token = self.token_request(&form).await?;
        tracing::debug!(username, "Keycloak login succeeded");
        Ok(token)
    }

    /// Exchange a refresh token for a fresh bundle
    pub async fn refresh(&self, refresh_token: &str) -> Result<KeycloakToken> {
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", self.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        self.token_request(&form).await
    }

    /// Invalidate a session's refresh token
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let mut form = vec![
            ("client_id", self.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let response = self
            .http_client
            .post(self.endpoint("logout"))
            .form(&form)
            .send()
            .await?;

        handle_response(response).await?;
        Ok(())
    }

    /// Fetch the userinfo claims for an access token
    pub async fn userinfo(&self, access_token: &str) -> Result<Value> {
        let response = self
            .http_client
            .get(self.endpoint("userinfo"))
            .bearer_auth(access_token)
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Introspect a token using the client credentials
    pub async fn introspect(&self, token: &str) -> Result<Introspection> {
        let secret = self.client_secret.as_deref().ok_or_else(|| {
            Error::Keycloak("Token introspection requires a client secret".to_string())
        })?;

        let response = self
            .http_client
            .post(self.endpoint("token/introspect"))
            .basic_auth(&self.client_id, Some(secret))
            .form(&[("token", token)])
            .send()
            .await?;

        Ok(handle_response(response).await?.json().await?)
    }

    /// Whether the token carries a realm or client role.
    /// Uses the unverified payload; signature checks stay on the server side.
    pub fn has_role(&self, access_token: &str, role: &str, realm_role: bool) -> Result<bool> {
        let claims = decode_claims(access_token)?;

        let roles = if realm_role {
            claims
                .pointer("/realm_access/roles")
                .cloned()
                .unwrap_or(Value::Null)
        } else {
            claims
                .pointer(&format!("/resource_access/{}/roles", self.client_id))
                .cloned()
                .unwrap_or(Value::Null)
        };

        Ok(roles
            .as_array()
            .map(|list| list.iter().any(|r| r.as_str() == Some(role)))
            .unwrap_or(false))
    }

    async fn token_request(&self, form: &[(&str, String)]) -> Result<KeycloakToken> {
        let response = self
            .http_client
            .post(self.endpoint("token"))
            .form(form)
            .send()
            .await?;

        let token: KeycloakToken = handle_response(response).await?.json().await?;
        Ok(token.with_expiry())
    }
}

/// Decode a JWT payload without verifying the signature
pub fn decode_claims(token: &str) -> Result<Value> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::Keycloak("Malformed JWT: missing payload segment".to_string()))?;

    let decoded = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::Keycloak(format!("Malformed JWT payload: {}", e)))?;

    Ok(serde_json::from_slice(&decoded)?)
}

async fn handle_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::BAD_REQUEST => Err(
            Error::Authentication(format!("Keycloak rejected the request: {}", body)),
        ),
        reqwest::StatusCode::NOT_FOUND => Err(Error::NotFound(body)),
        _ => Err(Error::Keycloak(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn fake_jwt(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{}.{}.signature", header, body)
    }

    fn client() -> KeycloakClient {
        KeycloakClient {
            http_client: reqwest::Client::new(),
            server_url: "https://auth.example.com".to_string(),
            realm: "myrealm".to_string(),
            client_id: "myapp".to_string(),
            client_secret: None,
        }
    }

    #[test]
    fn test_endpoint_urls() {
        let c = client();
        assert_eq!(
            c.endpoint("token"),
            "https://auth.example.com/realms/myrealm/protocol/openid-connect/token"
        );
        assert_eq!(
            c.endpoint("token/introspect"),
            "https://auth.example.com/realms/myrealm/protocol/openid-connect/token/introspect"
        );
    }

    #[test]
    fn test_decode_claims() {
        let token = fake_jwt(&serde_json::json!({"sub": "user-1", "preferred_username": "ada"}));
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims["preferred_username"], "ada");
    }

    #[test]
    fn test_decode_claims_rejects_garbage() {
        assert!(decode_claims("not-a-jwt").is_err());
        assert!(decode_claims("a.!!!.c").is_err());
    }

    #[test]
    fn test_has_realm_role() {
        let c = client();
        let token = fake_jwt(&serde_json::json!({
            "realm_access": { "roles": ["admin", "user"] }
        }));
        assert!(c.has_role(&token, "admin", true).unwrap());
        assert!(!c.has_role(&token, "auditor", true).unwrap());
    }

    #[test]
    fn test_has_client_role() {
        let c = client();
        let token = fake_jwt(&serde_json::json!({
            "resource_access": { "myapp": { "roles": ["uploader"] } }
        }));
        assert!(c.has_role(&token, "uploader", false).unwrap());
        assert!(!c.has_role(&token, "uploader", true).unwrap());
    }

    #[test]
    fn test_token_expiry_is_computed() {
        let json = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "token_type": "Bearer",
            "expires_in": 300
        }"#;
        let token: KeycloakToken = serde_json::from_str(json).unwrap();
        assert!(token.expires_at.is_none());
        let token = token.with_expiry();
        let expires_at = token.expires_at.unwrap();
        assert!(expires_at > Utc::now() + Duration::seconds(290));
    }
}
