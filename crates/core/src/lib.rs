//! flextk-core - Core library for the flextk CLI
//!
//! This library wraps the services the toolkit talks to: Google Cloud Storage,
//! Backblaze B2, AWS S3, Google Drive, Keycloak, Firebase Auth and Stripe,
//! plus local media tooling (ffmpeg, ImageMagick, LibreOffice). Credentials
//! are stored Fernet-encrypted under a password-derived key.

pub mod b2;
pub mod config;
pub mod drive;
pub mod error;
pub mod firebase;
pub mod fsutil;
pub mod gcs;
pub mod google_token;
pub mod keycloak;
pub mod media;
pub mod net;
pub mod s3;
pub mod secrets;
pub mod settings;
pub mod stripe;
pub mod types;

// Re-export commonly used types
pub use b2::{B2Bucket, B2BucketType, B2Client, B2File, DEFAULT_LINK_VALIDITY_SECS};
pub use config::{
    config_exists, get_config_dir, get_config_path, load_config, save_config, ConfigFile,
};
pub use drive::{DriveClient, DriveFile, ShareGrant};
pub use error::{Error, Result};
pub use firebase::{FirebaseClient, FirebaseUser, UserPage, DEFAULT_LIST_MAX_RESULTS};
pub use gcs::{GcsClient, UploadOptions};
pub use google_token::{ServiceAccountKey, TokenProvider};
pub use keycloak::{decode_claims, Introspection, KeycloakClient, KeycloakToken};
pub use s3::S3Client;
pub use secrets::{SecretBox, MAX_PASSWORD_LEN};
pub use settings::{
    aws_settings, b2_settings, drive_settings, firebase_settings, gcs_settings, keycloak_settings,
    stripe_settings, unsplash_settings, AwsSettings, B2Settings, DriveSettings, FirebaseSettings,
    GcsSettings, KeycloakSettings, StripeSettings, UnsplashSettings,
};
pub use stripe::{PaymentIntent, Refund, RefundReason, StripeClient};
pub use types::{BucketFile, DownloadBucketFile};
