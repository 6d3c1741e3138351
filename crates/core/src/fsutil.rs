//! Local file helpers shared by the storage and media modules

use crate::error::{Error, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Create a temporary file with the given extension and contents.
/// The file is not deleted on drop; callers clean up with [`remove_files`].
pub fn create_temp_file(file_bytes: &[u8], file_extension: &str) -> Result<PathBuf> {
    let temp = tempfile::Builder::new()
        .suffix(file_extension)
        .tempfile()?;
    let (mut file, path) = temp.keep().map_err(|e| Error::Io(e.error))?;
    use std::io::Write;
    file.write_all(file_bytes)?;
    Ok(path)
}

/// Remove the given files, returning the paths that did not exist.
pub fn remove_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut not_found = Vec::new();

    for path in paths {
        if path.exists() {
            fs::remove_file(path)?;
        } else {
            not_found.push(path.clone());
        }
    }

    Ok(not_found)
}

/// Read and parse a JSON file
pub fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "JSON file not found in {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Guess the MIME type of a file from its name
pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Compute the raw MD5 digest of a file
pub fn md5_digest(path: &Path) -> Result<[u8; 16]> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "File not found in {}",
            path.display()
        )));
    }

    let mut file = fs::File::open(path)?;
    let mut context = md5::Context::new();
    let mut buffer = [0u8; 4096];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }

    Ok(context.compute().0)
}

/// Compute the MD5 hash of a file as a lowercase hex string
pub fn calculate_md5_hash(path: &Path) -> Result<String> {
    let digest = md5_digest(path)?;
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Compute the CRC32C checksum of a file
pub fn calculate_crc32c_checksum(path: &Path) -> Result<u32> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "File not found in {}",
            path.display()
        )));
    }

    let data = fs::read(path)?;
    Ok(crc32c::crc32c(&data))
}

/// File basename as a string, empty when the path has none
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_temp_file_keeps_extension() {
        let path = create_temp_file(b"hello", ".txt").unwrap();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with(".txt"));
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_remove_files_reports_missing() {
        let existing = create_temp_file(b"x", ".bin").unwrap();
        let missing = PathBuf::from("/nonexistent/never-here.bin");

        let not_found = remove_files(&[existing.clone(), missing.clone()]).unwrap();
        assert_eq!(not_found, vec![missing]);
        assert!(!existing.exists());
    }

    #[test]
    fn test_md5_of_known_content() {
        let path = create_temp_file(b"hello world", ".txt").unwrap();
        // md5("hello world")
        assert_eq!(
            calculate_md5_hash(&path).unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_crc32c_of_known_content() {
        let path = create_temp_file(b"123456789", ".txt").unwrap();
        // CRC32C check value for "123456789"
        assert_eq!(calculate_crc32c_checksum(&path).unwrap(), 0xE306_9283);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_md5_missing_file() {
        assert!(matches!(
            calculate_md5_hash(Path::new("/nonexistent/file")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(Path::new("movie.mp4")), "video/mp4");
        assert_eq!(
            guess_mime_type(Path::new("unknown.zzz")),
            "application/octet-stream"
        );
    }
}
