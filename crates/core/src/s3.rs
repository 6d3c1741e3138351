//! AWS S3 client using the AWS S3 SDK

use crate::error::{Error, Result};
use crate::fsutil::{basename, guess_mime_type};
use crate::settings::AwsSettings;
use crate::types::{split_object_name, BucketFile};
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    operation::head_bucket::HeadBucketError,
    operation::head_object::HeadObjectError,
    primitives::ByteStream,
    Client,
};
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

/// S3 client bound to one bucket
pub struct S3Client {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Client {
    /// Create a new S3 client and verify the bucket is reachable
    pub async fn new(settings: &AwsSettings) -> Result<Self> {
        if settings.access_key.is_empty() || settings.secret_key.is_empty() {
            return Err(Error::NoCredentials);
        }

        let credentials = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None,
            None,
            "flextk",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_client = Self {
            client: Client::new(&sdk_config),
            bucket: settings.bucket_name.clone(),
            region: settings.region.clone(),
        };

        s3_client.check_bucket().await?;
        Ok(s3_client)
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Verify the configured bucket exists and the credentials can see it
    pub async fn check_bucket(&self) -> Result<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => Err(head_bucket_error(e, &self.bucket)),
        }
    }

    /// Upload a file; the object key defaults to the file's basename
    pub async fn upload_file(
        &self,
        file_path: &Path,
        object_name: Option<&str>,
    ) -> Result<BucketFile> {
        if !file_path.is_file() {
            return Err(Error::NotFound(format!(
                "File not found in {}",
                file_path.display()
            )));
        }

        let key = match object_name {
            Some(name) => name.to_string(),
            None => basename(file_path),
        };
        let content_type = guess_mime_type(file_path);
        let body = tokio::fs::read(file_path).await?;
        let size = body.len() as u64;

        tracing::debug!(key = %key, size, "Uploading to S3");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(&content_type)
            .send()
            .await?;

        Ok(self.build_bucket_file(&key, size, None, Some(content_type), None))
    }

    /// Get object metadata. Returns `None` when the key does not exist.
    pub async fn get_file(&self, key: &str) -> Result<Option<BucketFile>> {
        let response = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if object_missing(&e) => return Ok(None),
            Err(e) => return Err(Error::S3Operation(DisplayErrorContext(&e).to_string())),
        };

        let size = response.content_length().unwrap_or(0).max(0) as u64;
        let content_type = response.content_type().map(|s| s.to_string());
        let modified = response
            .last_modified()
            .map(|t| smithy_to_chrono(t.to_owned()));

        Ok(Some(self.build_bucket_file(
            key,
            size,
            response.e_tag().map(|s| s.trim_matches('"').to_string()),
            content_type,
            modified,
        )))
    }

    /// Download an object to a local path
    pub async fn download_file(&self, key: &str, dest_path: &Path) -> Result<()> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        let body = response.body.collect().await?.into_bytes();

        if let Some(parent) = dest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest_path, body.as_ref()).await?;
        Ok(())
    }

    /// List objects under a prefix
    pub async fn list_objects(&self, prefix: Option<&str>) -> Result<Vec<BucketFile>> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(prefix.map(|s| s.to_string()))
            .send()
            .await?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let size = obj.size().unwrap_or(0).max(0) as u64;
                let etag = obj.e_tag().map(|s| s.trim_matches('"').to_string());
                let modified = obj.last_modified().map(|t| smithy_to_chrono(t.to_owned()));
                Some(self.build_bucket_file(&key, size, etag, None, modified))
            })
            .collect();

        Ok(objects)
    }

    /// Delete an object
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        Ok(())
    }

    fn build_bucket_file(
        &self,
        key: &str,
        size_bytes: u64,
        etag: Option<String>,
        content_type: Option<String>,
        modification_date: Option<DateTime<Utc>>,
    ) -> BucketFile {
        let (file_basename, extension) = split_object_name(key);
        BucketFile {
            id: None,
            basename: file_basename,
            extension,
            file_path_in_bucket: key.to_string(),
            bucket_name: self.bucket.clone(),
            public_url: object_url(&self.bucket, &self.region, key),
            authenticated_url: None,
            size_bytes,
            creation_date: None,
            modification_date,
            md5_hash: etag,
            crc32c_checksum: None,
            content_type,
        }
    }
}

/// Classify a head_bucket failure. Display on `SdkError` is opaque
/// ("service error"), so match the typed variants instead.
fn head_bucket_error(err: SdkError<HeadBucketError>, bucket: &str) -> Error {
    if err
        .as_service_error()
        .is_some_and(HeadBucketError::is_not_found)
    {
        return Error::BucketNotFound(bucket.to_string());
    }
    match err {
        SdkError::DispatchFailure(_) | SdkError::ConstructionFailure(_) => Error::NoCredentials,
        other => Error::S3Operation(DisplayErrorContext(&other).to_string()),
    }
}

/// True when head_object failed because the key does not exist
fn object_missing(err: &SdkError<HeadObjectError>) -> bool {
    err.as_service_error()
        .is_some_and(HeadObjectError::is_not_found)
}

/// Virtual-hosted style object URL
fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

fn smithy_to_chrono(t: aws_smithy_types::DateTime) -> DateTime<Utc> {
    Utc.timestamp_opt(t.secs(), t.subsec_nanos())
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url() {
        assert_eq!(
            object_url("my-bucket", "eu-west-1", "docs/report.pdf"),
            "https://my-bucket.s3.eu-west-1.amazonaws.com/docs/report.pdf"
        );
    }

    #[test]
    fn test_smithy_datetime_conversion() {
        let t = aws_smithy_types::DateTime::from_secs(1_700_000_000);
        let chrono_time = smithy_to_chrono(t);
        assert_eq!(chrono_time.timestamp(), 1_700_000_000);
    }

    mod error_classification {
        use super::super::*;
        use aws_sdk_s3::types::error::NotFound;
        use aws_smithy_runtime_api::http::{Response, StatusCode};
        use aws_smithy_types::body::SdkBody;

        fn raw_response(status: u16) -> Response {
            let status = StatusCode::try_from(status).unwrap();
            Response::new(status, SdkBody::empty())
        }

        #[test]
        fn test_missing_bucket_maps_to_bucket_not_found() {
            let err = SdkError::service_error(
                HeadBucketError::NotFound(NotFound::builder().build()),
                raw_response(404),
            );
            match head_bucket_error(err, "my-bucket") {
                Error::BucketNotFound(name) => assert_eq!(name, "my-bucket"),
                other => panic!("expected BucketNotFound, got {other}"),
            }
        }

        #[test]
        fn test_failure_before_dispatch_means_no_credentials() {
            let err: SdkError<HeadBucketError> =
                SdkError::construction_failure("no credentials loaded");
            assert!(matches!(
                head_bucket_error(err, "my-bucket"),
                Error::NoCredentials
            ));
        }

        #[test]
        fn test_other_service_errors_keep_their_message() {
            let err = SdkError::service_error(
                HeadBucketError::unhandled("access denied"),
                raw_response(403),
            );
            match head_bucket_error(err, "my-bucket") {
                Error::S3Operation(message) => assert!(message.contains("access denied")),
                other => panic!("expected S3Operation, got {other}"),
            }
        }

        #[test]
        fn test_missing_object_is_detected_from_typed_error() {
            let err = SdkError::service_error(
                HeadObjectError::NotFound(NotFound::builder().build()),
                raw_response(404),
            );
            assert!(object_missing(&err));
        }

        #[test]
        fn test_other_head_object_errors_are_not_missing() {
            let err: SdkError<HeadObjectError> = SdkError::construction_failure("boom");
            assert!(!object_missing(&err));
        }
    }
}
