//! Handlers for the `drive` command group

use super::{format_bytes, unlock};
use crate::DriveAction;
use anyhow::Result;
use flextk_core::{drive_settings, DriveClient, DriveFile, ShareGrant};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct DriveRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl From<&DriveFile> for DriveRow {
    fn from(file: &DriveFile) -> Self {
        Self {
            name: file.name.clone(),
            id: file.id.clone(),
            kind: if file.is_folder() { "folder" } else { "file" }.to_string(),
            size: file
                .size_bytes()
                .map(format_bytes)
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn print_drive_files(files: &[DriveFile]) {
    if files.is_empty() {
        println!("Nothing found.");
        return;
    }
    let rows: Vec<DriveRow> = files.iter().map(DriveRow::from).collect();
    println!("{}", Table::new(rows));
}

pub async fn handle_drive(action: DriveAction, password: Option<&str>) -> Result<()> {
    let (config, secrets) = unlock(password)?;
    let settings = drive_settings(&config, &secrets)?;
    let client = DriveClient::new(&settings)?;

    match action {
        DriveAction::Folders { name } => {
            let folders = client.find_folders(&name).await?;
            print_drive_files(&folders);
        }
        DriveAction::Mkdir { name, parent } => {
            let folder = client.create_folder(&name, parent.as_deref()).await?;
            println!("  ✅ Created folder {} ({})", folder.name, folder.id);
        }
        DriveAction::Upload { folder_id, file } => {
            let uploaded = client.upload_file(&folder_id, &file).await?;
            println!("  ✅ Uploaded {} ({})", uploaded.name, uploaded.id);
        }
        DriveAction::Download { file_id, dest } => {
            client.download_file(&file_id, &dest).await?;
            println!("  ✅ Downloaded to {}", dest.display());
        }
        DriveAction::Ls { folder_id } => {
            let files = client.list_files(&folder_id).await?;
            print_drive_files(&files);
        }
        DriveAction::Rm { file_id } => {
            client.delete_file(&file_id).await?;
            println!("  ✅ Deleted {}", file_id);
        }
        DriveAction::Share {
            file_id,
            anyone,
            writer,
        } => {
            if !anyone && writer.is_none() {
                anyhow::bail!("Nothing to grant: pass --anyone and/or --writer <email>");
            }
            if anyone {
                client.share(&file_id, &ShareGrant::AnyoneReader).await?;
                println!("  ✅ Anyone with the link can now read {}", file_id);
            }
            if let Some(email) = writer {
                client
                    .share(&file_id, &ShareGrant::UserWriter { email: email.clone() })
                    .await?;
                println!("  ✅ {} can now edit {}", email, file_id);
            }
        }
    }

    Ok(())
}
