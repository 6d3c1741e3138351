//! Decrypted per-service settings
//!
//! Accessors verify the supplied password against the stored sentinel, then
//! decrypt the service's credential fields. A missing field maps to
//! [`Error::NotConfigured`], a failed decrypt to [`Error::InvalidPassword`].

use crate::config::ConfigFile;
use crate::error::{Error, Result};
use crate::secrets::SecretBox;
use std::path::PathBuf;

/// Google Cloud Storage settings
#[derive(Debug, Clone)]
pub struct GcsSettings {
    pub bucket_name: String,
    pub service_account: PathBuf,
}

/// Backblaze B2 settings
#[derive(Debug, Clone)]
pub struct B2Settings {
    pub app_id: String,
    pub app_key: String,
}

/// AWS S3 settings
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
}

/// Google Drive settings
#[derive(Debug, Clone)]
pub struct DriveSettings {
    pub service_account: PathBuf,
}

/// Firebase Auth settings
#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    pub service_account: PathBuf,
}

/// Keycloak settings
#[derive(Debug, Clone)]
pub struct KeycloakSettings {
    pub server_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Stripe settings
#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub api_key: String,
}

/// Unsplash settings
#[derive(Debug, Clone)]
pub struct UnsplashSettings {
    pub access_key: String,
}

fn decrypt_required(
    secrets: &SecretBox,
    field: &Option<String>,
    service: &str,
) -> Result<String> {
    let token = field
        .as_deref()
        .ok_or_else(|| Error::NotConfigured(service.to_string()))?;
    secrets.decrypt(token)
}

/// Decrypt the stored GCS configuration
pub fn gcs_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<GcsSettings> {
    secrets.verify(config)?;
    Ok(GcsSettings {
        bucket_name: decrypt_required(secrets, &config.gcs_bucket_name, "GCS")?,
        service_account: decrypt_required(secrets, &config.gcs_service_account, "GCS")?.into(),
    })
}

/// Decrypt the stored Backblaze B2 configuration
pub fn b2_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<B2Settings> {
    secrets.verify(config)?;
    Ok(B2Settings {
        app_id: decrypt_required(secrets, &config.bb2_app_id, "Black Blaze")?,
        app_key: decrypt_required(secrets, &config.bb2_app_key, "Black Blaze")?,
    })
}

/// Decrypt the stored AWS configuration
pub fn aws_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<AwsSettings> {
    secrets.verify(config)?;
    Ok(AwsSettings {
        region: decrypt_required(secrets, &config.aws_region, "AWS")?,
        access_key: decrypt_required(secrets, &config.aws_access_key, "AWS")?,
        secret_key: decrypt_required(secrets, &config.aws_secret_key, "AWS")?,
        bucket_name: decrypt_required(secrets, &config.aws_bucket_name, "AWS")?,
    })
}

/// Decrypt the stored Google Drive configuration
pub fn drive_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<DriveSettings> {
    secrets.verify(config)?;
    Ok(DriveSettings {
        service_account: decrypt_required(secrets, &config.drive_service_account, "Google Drive")?
            .into(),
    })
}

/// Decrypt the stored Firebase configuration
pub fn firebase_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<FirebaseSettings> {
    secrets.verify(config)?;
    Ok(FirebaseSettings {
        service_account: decrypt_required(secrets, &config.firebase_service_account, "Firebase")?
            .into(),
    })
}

/// Decrypt the stored Keycloak configuration
pub fn keycloak_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<KeycloakSettings> {
    secrets.verify(config)?;
    let client_secret = match &config.keycloak_client_secret {
        Some(token) => Some(secrets.decrypt(token)?),
        None => None,
    };
    Ok(KeycloakSettings {
        server_url: decrypt_required(secrets, &config.keycloak_server_url, "Keycloak")?,
        realm: decrypt_required(secrets, &config.keycloak_realm, "Keycloak")?,
        client_id: decrypt_required(secrets, &config.keycloak_client_id, "Keycloak")?,
        client_secret,
    })
}

/// Decrypt the stored Stripe configuration
pub fn stripe_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<StripeSettings> {
    secrets.verify(config)?;
    Ok(StripeSettings {
        api_key: decrypt_required(secrets, &config.stripe_api_key, "Stripe")?,
    })
}

/// Decrypt the stored Unsplash configuration
pub fn unsplash_settings(config: &ConfigFile, secrets: &SecretBox) -> Result<UnsplashSettings> {
    secrets.verify(config)?;
    Ok(UnsplashSettings {
        access_key: decrypt_required(secrets, &config.unsplash_access_key, "Unsplash")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(secrets: &SecretBox) -> ConfigFile {
        ConfigFile {
            match_password: Some(secrets.sentinel()),
            gcs_bucket_name: Some(secrets.encrypt("my-bucket")),
            gcs_service_account: Some(secrets.encrypt("/etc/sa.json")),
            bb2_app_id: Some(secrets.encrypt("app-id")),
            bb2_app_key: Some(secrets.encrypt("app-key")),
            ..ConfigFile::default()
        }
    }

    #[test]
    fn test_gcs_settings_decrypts() {
        let secrets = SecretBox::new("hunter2").unwrap();
        let config = configured(&secrets);

        let gcs = gcs_settings(&config, &secrets).unwrap();
        assert_eq!(gcs.bucket_name, "my-bucket");
        assert_eq!(gcs.service_account, PathBuf::from("/etc/sa.json"));
    }

    #[test]
    fn test_missing_service_is_not_configured() {
        let secrets = SecretBox::new("hunter2").unwrap();
        let config = configured(&secrets);

        assert!(matches!(
            aws_settings(&config, &secrets),
            Err(Error::NotConfigured(_))
        ));
    }

    #[test]
    fn test_wrong_password_is_rejected_before_decryption() {
        let secrets = SecretBox::new("hunter2").unwrap();
        let config = configured(&secrets);

        let wrong = SecretBox::new("letmein").unwrap();
        assert!(matches!(
            b2_settings(&config, &wrong),
            Err(Error::InvalidPassword)
        ));
    }

    #[test]
    fn test_keycloak_client_secret_is_optional() {
        let secrets = SecretBox::new("hunter2").unwrap();
        let config = ConfigFile {
            match_password: Some(secrets.sentinel()),
            keycloak_server_url: Some(secrets.encrypt("https://kc.example.com")),
            keycloak_realm: Some(secrets.encrypt("master")),
            keycloak_client_id: Some(secrets.encrypt("cli")),
            ..ConfigFile::default()
        };

        let kc = keycloak_settings(&config, &secrets).unwrap();
        assert_eq!(kc.realm, "master");
        assert!(kc.client_secret.is_none());
    }
}
