//! Password-derived encryption for stored credentials
//!
//! The key scheme matches the original toolkit: the password is left-padded
//! with zeros to 32 characters and urlsafe-base64 encoded, which yields a
//! valid Fernet key. A Fernet-encrypted sentinel stored in the configuration
//! (`match_password`) lets later invocations verify a supplied password
//! without keeping the password itself anywhere.

use crate::config::ConfigFile;
use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use fernet::Fernet;

/// Maximum password length accepted (the padded key must be 32 bytes)
pub const MAX_PASSWORD_LEN: usize = 32;

/// Plaintext encrypted into `match_password` when a password is set
const PASSWORD_SENTINEL: &[u8] = b"flex_tk";

/// Derive the urlsafe-base64 Fernet key from a configuration password.
pub fn derive_key(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(Error::InvalidInput("Password cannot be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "Can't use a password with length more than {} letters",
            MAX_PASSWORD_LEN
        )));
    }

    let padded = format!("{:0>width$}", password, width = MAX_PASSWORD_LEN);
    Ok(URL_SAFE.encode(padded.as_bytes()))
}

/// Symmetric encryption handle bound to one configuration password.
pub struct SecretBox {
    fernet: Fernet,
}

impl SecretBox {
    /// Create a secret box from a configuration password
    pub fn new(password: &str) -> Result<Self> {
        let key = derive_key(password)?;
        let fernet = Fernet::new(&key)
            .ok_or_else(|| Error::Config("Derived key is not a valid Fernet key".to_string()))?;
        Ok(Self { fernet })
    }

    /// Encrypt a configuration value
    pub fn encrypt(&self, value: &str) -> String {
        self.fernet.encrypt(value.as_bytes())
    }

    /// Decrypt a configuration value. Failure means the wrong password.
    pub fn decrypt(&self, token: &str) -> Result<String> {
        let plain = self
            .fernet
            .decrypt(token)
            .map_err(|_| Error::InvalidPassword)?;
        String::from_utf8(plain).map_err(|_| Error::InvalidPassword)
    }

    /// Produce the encrypted sentinel stored as `match_password`
    pub fn sentinel(&self) -> String {
        self.fernet.encrypt(PASSWORD_SENTINEL)
    }

    /// Verify this password against the stored sentinel
    pub fn verify(&self, config: &ConfigFile) -> Result<()> {
        let stored = config
            .match_password
            .as_deref()
            .ok_or(Error::PasswordNotSet)?;
        self.fernet
            .decrypt(stored)
            .map_err(|_| Error::InvalidPassword)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_pads_short_passwords() {
        let key = derive_key("hunter2").unwrap();
        let decoded = URL_SAFE.decode(&key).unwrap();
        assert_eq!(decoded.len(), 32);
        assert!(decoded.starts_with(b"0000"));
        assert!(decoded.ends_with(b"hunter2"));
    }

    #[test]
    fn test_derive_key_rejects_long_passwords() {
        let long = "x".repeat(33);
        assert!(derive_key(&long).is_err());
    }

    #[test]
    fn test_derive_key_rejects_empty_password() {
        assert!(derive_key("").is_err());
    }

    #[test]
    fn test_exact_length_password_is_unchanged() {
        let password = "a".repeat(32);
        let key = derive_key(&password).unwrap();
        assert_eq!(URL_SAFE.decode(&key).unwrap(), password.as_bytes());
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let secrets = SecretBox::new("hunter2").unwrap();
        let token = secrets.encrypt("my-bucket");
        assert_ne!(token, "my-bucket");
        assert_eq!(secrets.decrypt(&token).unwrap(), "my-bucket");
    }

    #[test]
    fn test_wrong_password_fails_decrypt() {
        let right = SecretBox::new("hunter2").unwrap();
        let wrong = SecretBox::new("letmein").unwrap();
        let token = right.encrypt("my-bucket");
        assert!(matches!(
            wrong.decrypt(&token),
            Err(Error::InvalidPassword)
        ));
    }

    #[test]
    fn test_verify_against_sentinel() {
        let secrets = SecretBox::new("hunter2").unwrap();
        let config = ConfigFile {
            match_password: Some(secrets.sentinel()),
            ..ConfigFile::default()
        };

        assert!(secrets.verify(&config).is_ok());

        let wrong = SecretBox::new("letmein").unwrap();
        assert!(matches!(wrong.verify(&config), Err(Error::InvalidPassword)));
    }

    #[test]
    fn test_verify_without_password_set() {
        let secrets = SecretBox::new("hunter2").unwrap();
        let config = ConfigFile::default();
        assert!(matches!(secrets.verify(&config), Err(Error::PasswordNotSet)));
    }
}
