//! Handlers for the `cloud` command group (GCS, Backblaze B2, AWS S3)

use super::{format_bytes, format_date, unlock};
use crate::{B2Action, GcsAction, S3Action};
use anyhow::Result;
use flextk_core::{
    aws_settings, b2_settings, gcs_settings, B2BucketType, B2Client, BucketFile,
    DownloadBucketFile, GcsClient, S3Client, UploadOptions,
};
use std::str::FromStr;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Type")]
    content_type: String,
}

impl From<&BucketFile> for FileRow {
    fn from(file: &BucketFile) -> Self {
        Self {
            path: file.file_path_in_bucket.clone(),
            size: format_bytes(file.size_bytes),
            modified: format_date(file.modification_date),
            content_type: file.content_type.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn print_files(files: &[BucketFile]) {
    if files.is_empty() {
        println!("No files found.");
        return;
    }
    let rows: Vec<FileRow> = files.iter().map(FileRow::from).collect();
    println!("{}", Table::new(rows));
}

fn print_file_details(file: &BucketFile) {
    println!("  Path:          {}", file.file_path_in_bucket);
    println!("  Bucket:        {}", file.bucket_name);
    println!("  Size:          {}", format_bytes(file.size_bytes));
    println!(
        "  Content type:  {}",
        file.content_type.as_deref().unwrap_or("-")
    );
    println!("  Created:       {}", format_date(file.creation_date));
    println!("  Modified:      {}", format_date(file.modification_date));
    if let Some(md5) = &file.md5_hash {
        println!("  MD5:           {}", md5);
    }
    if let Some(crc) = &file.crc32c_checksum {
        println!("  CRC32C:        {}", crc);
    }
    println!("  Public URL:    {}", file.public_url);
    if let Some(url) = &file.authenticated_url {
        println!("  Auth URL:      {}", url);
    }
}

/// Handle `cloud gcs` commands
pub async fn handle_gcs(action: GcsAction, password: Option<&str>) -> Result<()> {
    let (config, secrets) = unlock(password)?;
    let settings = gcs_settings(&config, &secrets)?;
    let client = GcsClient::new(&settings).await?;

    match action {
        GcsAction::Ls { folder } => {
            let files = client.list_files(folder.as_deref().unwrap_or("")).await?;
            print_files(&files);
        }
        GcsAction::Folders { folder } => {
            let folders = client.list_folders(folder.as_deref().unwrap_or("")).await?;
            if folders.is_empty() {
                println!("No folders found.");
            } else {
                for folder in folders {
                    println!("{}", folder);
                }
            }
        }
        GcsAction::Buckets => {
            for bucket in client.list_buckets().await? {
                println!("{}", bucket);
            }
        }
        GcsAction::Upload {
            file,
            folder,
            skip_existing,
            estimate_time,
        } => {
            let options = UploadOptions {
                check_if_exists: skip_existing,
                estimate_upload_time: estimate_time,
                ..UploadOptions::default()
            };
            let content_type = mime_guess::from_path(&file).first_or_octet_stream();
            println!("Uploading {} ({})...", file.display(), content_type);
            let uploaded = client.upload_file(&file, &folder, &options).await?;
            println!("  ✅ Uploaded {}", uploaded.file_path_in_bucket);
            println!("  URL: {}", uploaded.public_url);
        }
        GcsAction::Download { path, dest } => {
            client.download_file(&path, &dest).await?;
            println!("  ✅ Downloaded to {}", dest.display());
        }
        GcsAction::DownloadMany {
            paths,
            dir,
            concurrency,
        } => {
            let entries: Vec<DownloadBucketFile> = paths
                .iter()
                .map(|p| DownloadBucketFile::new(p.clone(), dir.clone()))
                .collect();

            let spinner = indicatif::ProgressBar::new_spinner();
            spinner.set_message(format!("Downloading {} file(s)...", entries.len()));
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));

            let result = client.download_many(&entries, concurrency).await;
            spinner.finish_and_clear();
            result?;

            println!("  ✅ Downloaded {} file(s) to {}", entries.len(), dir.display());
        }
        GcsAction::Info { path } => match client.get_file(&path).await? {
            Some(file) => print_file_details(&file),
            None => println!("  ⚠️  Not found: {}", path),
        },
        GcsAction::Rm { paths } => {
            client.delete_files(&paths).await?;
            println!("  ✅ Deleted {} object(s)", paths.len());
        }
        GcsAction::Mkdir { folder } => {
            let created = client.create_folder(&folder).await?;
            println!("  ✅ Created folder {}", created);
        }
        GcsAction::Cp { source, dest } => {
            let copied = client.copy_file(&source, &dest).await?;
            println!("  ✅ Copied to {}", copied.file_path_in_bucket);
        }
        GcsAction::Mv { source, dest } => {
            let moved = client.move_file(&source, &dest).await?;
            println!("  ✅ Moved to {}", moved.file_path_in_bucket);
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct B2BucketRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Type")]
    bucket_type: String,
}

/// Handle `cloud bb2` commands
pub async fn handle_b2(action: B2Action, password: Option<&str>) -> Result<()> {
    let (config, secrets) = unlock(password)?;
    let settings = b2_settings(&config, &secrets)?;
    let client = B2Client::authorize(&settings).await?;

    match action {
        B2Action::Buckets => {
            let buckets = client.list_buckets().await?;
            if buckets.is_empty() {
                println!("No buckets found.");
            } else {
                let rows: Vec<B2BucketRow> = buckets
                    .iter()
                    .map(|b| B2BucketRow {
                        name: b.bucket_name.clone(),
                        id: b.bucket_id.clone(),
                        bucket_type: b.bucket_type.clone(),
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }
        }
        B2Action::CreateBucket { name, bucket_type } => {
            let bucket_type = B2BucketType::from_str(&bucket_type)?;
            let bucket = client.create_bucket(&name, bucket_type).await?;
            println!("  ✅ Created bucket {} ({})", bucket.bucket_name, bucket.bucket_id);
        }
        B2Action::DeleteBucket { bucket_id } => {
            let bucket = client.delete_bucket(&bucket_id).await?;
            println!("  ✅ Deleted bucket {}", bucket.bucket_name);
        }
        B2Action::UpdateBucket {
            bucket_id,
            bucket_type,
        } => {
            let bucket_type = B2BucketType::from_str(&bucket_type)?;
            let bucket = client.update_bucket(&bucket_id, bucket_type).await?;
            println!(
                "  ✅ Bucket {} is now {}",
                bucket.bucket_name, bucket.bucket_type
            );
        }
        B2Action::Upload { bucket, file, name } => {
            let target = client.get_bucket_by_name(&bucket).await?;
            let uploaded = client
                .upload_file(&target.bucket_id, &file, name.as_deref())
                .await?;
            println!("  ✅ Uploaded {} ({})", uploaded.file_name, uploaded.file_id);
        }
        B2Action::Rm { file_id, file_name } => {
            client.delete_file_version(&file_id, &file_name).await?;
            println!("  ✅ Deleted {}", file_name);
        }
        B2Action::Info { file_id } => {
            let info = client.get_file_info(&file_id).await?;
            println!("  Name:          {}", info.file_name);
            println!("  Id:            {}", info.file_id);
            println!("  Size:          {}", format_bytes(info.content_length));
            println!(
                "  Content type:  {}",
                info.content_type.as_deref().unwrap_or("-")
            );
            if let Some(sha1) = &info.content_sha1 {
                println!("  SHA1:          {}", sha1);
            }
        }
        B2Action::Url {
            bucket,
            file_name,
            file_id,
        } => {
            let url = match file_id {
                Some(id) => client.download_url_by_id(&id),
                None => client.download_url_by_name(&bucket, &file_name),
            };
            println!("{}", url);
        }
        B2Action::Link {
            bucket,
            file_name,
            valid_secs,
        } => {
            let target = client.get_bucket_by_name(&bucket).await?;
            let link = client
                .temporary_download_link(&target.bucket_id, &bucket, &file_name, valid_secs)
                .await?;
            println!("{}", link);
            println!("  (valid for {} seconds)", valid_secs);
        }
    }

    Ok(())
}

/// Handle `cloud s3` commands
pub async fn handle_s3(action: S3Action, password: Option<&str>) -> Result<()> {
    let (config, secrets) = unlock(password)?;
    let settings = aws_settings(&config, &secrets)?;
    let client = S3Client::new(&settings).await?;

    match action {
        S3Action::Upload { file, key } => {
            let uploaded = client.upload_file(&file, key.as_deref()).await?;
            println!("  ✅ Uploaded {}", uploaded.file_path_in_bucket);
            println!("  URL: {}", uploaded.public_url);
        }
        S3Action::Info { key } => match client.get_file(&key).await? {
            Some(file) => print_file_details(&file),
            None => println!("  ⚠️  Not found: {}", key),
        },
        S3Action::Ls { prefix } => {
            let files = client.list_objects(prefix.as_deref()).await?;
            print_files(&files);
        }
        S3Action::Download { key, dest } => {
            client.download_file(&key, &dest).await?;
            println!("  ✅ Downloaded to {}", dest.display());
        }
        S3Action::Rm { key } => {
            client.delete_object(&key).await?;
            println!("  ✅ Deleted {}", key);
        }
    }

    Ok(())
}
