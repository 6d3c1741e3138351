//! Handlers for the `config` command group

use super::{prompt_or, prompt_password, unlock};
use crate::ConfigAction;
use anyhow::Result;
use dialoguer::Confirm;
use flextk_core::{get_config_path, load_config, save_config, ConfigFile, SecretBox};
use std::path::{Path, PathBuf};

pub async fn handle_config(action: ConfigAction, password: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::SetPassword => set_password().await,
        ConfigAction::ResetPassword => reset_password().await,
        ConfigAction::Show => show().await,
        ConfigAction::Gcs {
            bucket,
            service_account,
        } => configure_gcs(password, bucket, service_account).await,
        ConfigAction::Bb2 { app_id, app_key } => configure_b2(password, app_id, app_key).await,
        ConfigAction::S3 {
            region,
            access_key,
            secret_key,
            bucket,
        } => configure_s3(password, region, access_key, secret_key, bucket).await,
        ConfigAction::Drive { service_account } => {
            configure_drive(password, service_account).await
        }
        ConfigAction::Firebase { service_account } => {
            configure_firebase(password, service_account).await
        }
        ConfigAction::Keycloak {
            server_url,
            realm,
            client_id,
            client_secret,
        } => configure_keycloak(password, server_url, realm, client_id, client_secret).await,
        ConfigAction::Stripe { api_key } => configure_stripe(password, api_key).await,
        ConfigAction::Unsplash { access_key } => configure_unsplash(password, access_key).await,
    }
}

async fn set_password() -> Result<()> {
    let mut config = load_config()?;

    if config.match_password.is_some() {
        anyhow::bail!(
            "A password is already set. Use 'flextk config reset-password' to replace it."
        );
    }

    let password = prompt_password("New configuration password")?;
    let confirmation = prompt_password("Confirm password")?;
    if password != confirmation {
        anyhow::bail!("Passwords do not match");
    }

    let secrets = SecretBox::new(&password)?;
    config.match_password = Some(secrets.sentinel());
    save_config(&config)?;

    println!("  ✅ Password set");
    println!("  File: {}", get_config_path()?.display());
    Ok(())
}

async fn reset_password() -> Result<()> {
    let config = load_config()?;

    if config.match_password.is_none() {
        anyhow::bail!("No password set yet. Run 'flextk config set-password' instead.");
    }

    println!("  ⚠️  Resetting the password wipes all stored service configuration.");
    let proceed = Confirm::new()
        .with_prompt("Continue?")
        .default(false)
        .interact()?;
    if !proceed {
        println!("Aborted.");
        return Ok(());
    }

    let password = prompt_password("New configuration password")?;
    let confirmation = prompt_password("Confirm password")?;
    if password != confirmation {
        anyhow::bail!("Passwords do not match");
    }

    let secrets = SecretBox::new(&password)?;
    let fresh = ConfigFile {
        match_password: Some(secrets.sentinel()),
        ..ConfigFile::default()
    };
    save_config(&fresh)?;

    println!("  ✅ Password replaced, service configuration cleared");
    Ok(())
}

async fn show() -> Result<()> {
    let config = load_config()?;

    println!("Configuration file: {}", get_config_path()?.display());
    println!();
    println!(
        "  Password:  {}",
        if config.match_password.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("  GCS:       {}", configured_mark(config.gcs_bucket_name.is_some()));
    println!("  B2:        {}", configured_mark(config.bb2_app_id.is_some()));
    println!("  AWS S3:    {}", configured_mark(config.aws_bucket_name.is_some()));
    println!(
        "  Drive:     {}",
        configured_mark(config.drive_service_account.is_some())
    );
    println!(
        "  Firebase:  {}",
        configured_mark(config.firebase_service_account.is_some())
    );
    println!(
        "  Keycloak:  {}",
        configured_mark(config.keycloak_server_url.is_some())
    );
    println!("  Stripe:    {}", configured_mark(config.stripe_api_key.is_some()));
    println!(
        "  Unsplash:  {}",
        configured_mark(config.unsplash_access_key.is_some())
    );

    Ok(())
}

fn configured_mark(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "-"
    }
}

async fn configure_gcs(
    password: Option<&str>,
    bucket: Option<String>,
    service_account: Option<PathBuf>,
) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let bucket = prompt_or(bucket.as_deref(), "GCS bucket name")?;
    let sa_path = match service_account {
        Some(path) => path,
        None => PathBuf::from(prompt_or(None, "Service account JSON path")?),
    };
    validate_service_account_path(&sa_path)?;

    config.gcs_bucket_name = Some(secrets.encrypt(&bucket));
    config.gcs_service_account = Some(secrets.encrypt(&sa_path.display().to_string()));
    save_config(&config)?;

    println!("  ✅ GCS configuration stored");
    Ok(())
}

async fn configure_b2(
    password: Option<&str>,
    app_id: Option<String>,
    app_key: Option<String>,
) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let app_id = prompt_or(app_id.as_deref(), "B2 application key id")?;
    let app_key = match app_key {
        Some(key) => key,
        None => prompt_password("B2 application key")?,
    };

    config.bb2_app_id = Some(secrets.encrypt(&app_id));
    config.bb2_app_key = Some(secrets.encrypt(&app_key));
    save_config(&config)?;

    println!("  ✅ Backblaze B2 configuration stored");
    Ok(())
}

async fn configure_s3(
    password: Option<&str>,
    region: Option<String>,
    access_key: Option<String>,
    secret_key: Option<String>,
    bucket: Option<String>,
) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let region = prompt_or(region.as_deref(), "AWS region")?;
    let access_key = prompt_or(access_key.as_deref(), "AWS access key id")?;
    let secret_key = match secret_key {
        Some(key) => key,
        None => prompt_password("AWS secret access key")?,
    };
    let bucket = prompt_or(bucket.as_deref(), "S3 bucket name")?;

    config.aws_region = Some(secrets.encrypt(&region));
    config.aws_access_key = Some(secrets.encrypt(&access_key));
    config.aws_secret_key = Some(secrets.encrypt(&secret_key));
    config.aws_bucket_name = Some(secrets.encrypt(&bucket));
    save_config(&config)?;

    println!("  ✅ AWS S3 configuration stored");
    Ok(())
}

async fn configure_drive(password: Option<&str>, service_account: Option<PathBuf>) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let sa_path = match service_account {
        Some(path) => path,
        None => PathBuf::from(prompt_or(None, "Service account JSON path")?),
    };
    validate_service_account_path(&sa_path)?;

    config.drive_service_account = Some(secrets.encrypt(&sa_path.display().to_string()));
    save_config(&config)?;

    println!("  ✅ Google Drive configuration stored");
    Ok(())
}

async fn configure_firebase(
    password: Option<&str>,
    service_account: Option<PathBuf>,
) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let sa_path = match service_account {
        Some(path) => path,
        None => PathBuf::from(prompt_or(None, "Service account JSON path")?),
    };
    validate_service_account_path(&sa_path)?;

    config.firebase_service_account = Some(secrets.encrypt(&sa_path.display().to_string()));
    save_config(&config)?;

    println!("  ✅ Firebase configuration stored");
    Ok(())
}

async fn configure_keycloak(
    password: Option<&str>,
    server_url: Option<String>,
    realm: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let server_url = prompt_or(server_url.as_deref(), "Keycloak server URL")?;
    let realm = prompt_or(realm.as_deref(), "Realm")?;
    let client_id = prompt_or(client_id.as_deref(), "Client id")?;

    config.keycloak_server_url = Some(secrets.encrypt(&server_url));
    config.keycloak_realm = Some(secrets.encrypt(&realm));
    config.keycloak_client_id = Some(secrets.encrypt(&client_id));
    config.keycloak_client_secret = client_secret.map(|s| secrets.encrypt(&s));
    save_config(&config)?;

    println!("  ✅ Keycloak configuration stored");
    Ok(())
}

async fn configure_stripe(password: Option<&str>, api_key: Option<String>) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let api_key = match api_key {
        Some(key) => key,
        None => prompt_password("Stripe API key")?,
    };

    config.stripe_api_key = Some(secrets.encrypt(&api_key));
    save_config(&config)?;

    println!("  ✅ Stripe configuration stored");
    Ok(())
}

async fn configure_unsplash(password: Option<&str>, access_key: Option<String>) -> Result<()> {
    let (mut config, secrets) = unlock(password)?;

    let access_key = match access_key {
        Some(key) => key,
        None => prompt_password("Unsplash access key")?,
    };

    config.unsplash_access_key = Some(secrets.encrypt(&access_key));
    save_config(&config)?;

    println!("  ✅ Unsplash configuration stored");
    Ok(())
}

/// Service-account keys must be existing JSON files
fn validate_service_account_path(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("Service account file not found: {}", path.display());
    }
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        anyhow::bail!(
            "Service account file must be a .json file: {}",
            path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_service_account_path() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("sa.json");
        std::fs::write(&json, "{}").unwrap();
        assert!(validate_service_account_path(&json).is_ok());

        let txt = dir.path().join("sa.txt");
        std::fs::write(&txt, "{}").unwrap();
        assert!(validate_service_account_path(&txt).is_err());

        assert!(validate_service_account_path(Path::new("/nonexistent/sa.json")).is_err());
    }
}
