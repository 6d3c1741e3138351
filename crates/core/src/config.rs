//! Configuration management for flextk
//!
//! The configuration lives at `~/.config/flex_tk/config.json`. Every value
//! except structural defaults is stored as a Fernet token produced by
//! [`crate::secrets::SecretBox`]; this module only moves the opaque strings
//! in and out of the file.

use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration directory name
const CONFIG_DIR: &str = "flex_tk";

/// Configuration file name
const CONFIG_FILE: &str = "config.json";

/// On-disk configuration. All credential fields hold Fernet tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Encrypted sentinel used to verify the configuration password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_bucket_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_service_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bb2_app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bb2_app_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_secret_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_bucket_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub drive_service_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub firebase_service_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keycloak_server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keycloak_realm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keycloak_client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keycloak_client_secret: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsplash_access_key: Option<String>,
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let home =
        home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    let config_dir = home.join(".config").join(CONFIG_DIR);

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    Ok(config_dir)
}

/// Get the configuration file path
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

/// Load configuration from file. A missing file yields an empty configuration.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from an explicit path
pub fn load_config_from(config_path: &PathBuf) -> Result<ConfigFile> {
    if !config_path.exists() {
        return Ok(ConfigFile::default());
    }

    if !config_path.is_file()
        || config_path
            .extension()
            .map(|ext| !ext.eq_ignore_ascii_case("json"))
            .unwrap_or(true)
    {
        return Err(Error::ConfigNotAFile(config_path.clone()));
    }

    let content = fs::read_to_string(config_path)
        .map_err(|e| Error::InvalidConfig(format!("Failed to read config file: {}", e)))?;

    let config: ConfigFile = serde_json::from_str(&content)
        .map_err(|e| Error::InvalidConfig(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}

/// Save configuration to an explicit path
pub fn save_config_to(config: &ConfigFile, config_path: &PathBuf) -> Result<()> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))?;

    fs::write(config_path, content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

    // Secrets live in this file; owner read/write only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(config_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(config_path, perms)?;
    }

    Ok(())
}

/// Check if configuration exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = load_config_from(&path).unwrap();
        assert!(config.match_password.is_none());
        assert!(config.gcs_bucket_name.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = ConfigFile {
            match_password: Some("token".to_string()),
            gcs_bucket_name: Some("encrypted-bucket".to_string()),
            ..ConfigFile::default()
        };
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.match_password.as_deref(), Some("token"));
        assert_eq!(loaded.gcs_bucket_name.as_deref(), Some("encrypted-bucket"));
        assert!(loaded.bb2_app_id.is_none());
    }

    #[test]
    fn test_none_fields_not_serialized() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_non_json_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(Error::ConfigNotAFile(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_config_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        save_config_to(&ConfigFile::default(), &path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
