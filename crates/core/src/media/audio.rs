//! Audio conversion and extraction (ffmpeg)

use super::tools::{self, Tool};
use crate::error::{Error, Result};
use std::path::Path;

/// Audio formats the converter accepts
pub const SUPPORTED_FORMATS: [&str; 5] = ["mp3", "wav", "flac", "ogg", "aac"];

/// Convert an audio file between supported formats
pub async fn convert(input: &Path, output: &Path) -> Result<()> {
    check_format(input)?;
    check_format(output)?;
    if !input.is_file() {
        return Err(Error::NotFound(format!(
            "File not found in {}",
            input.display()
        )));
    }

    let args = convert_args(input, output);
    tools::run(Tool::Ffmpeg, &args).await?;
    Ok(())
}

/// Extract the audio track of a video into an audio file
pub async fn extract_from_video(video: &Path, output: &Path) -> Result<()> {
    check_format(output)?;
    if !video.is_file() {
        return Err(Error::NotFound(format!(
            "File not found in {}",
            video.display()
        )));
    }

    let args = extract_args(video, output);
    tools::run(Tool::Ffmpeg, &args).await?;
    Ok(())
}

fn convert_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        output.display().to_string(),
    ]
}

fn extract_args(video: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        video.display().to_string(),
        "-vn".to_string(),
        output.display().to_string(),
    ]
}

fn check_format(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if SUPPORTED_FORMATS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Unsupported audio format '{}' (supported: {})",
            extension,
            SUPPORTED_FORMATS.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_format() {
        assert!(check_format(Path::new("song.mp3")).is_ok());
        assert!(check_format(Path::new("song.FLAC")).is_ok());
        assert!(check_format(Path::new("song.wma")).is_err());
    }

    #[test]
    fn test_extract_args_drop_video_stream() {
        let args = extract_args(Path::new("clip.mp4"), Path::new("track.mp3"));
        assert_eq!(args, vec!["-y", "-i", "clip.mp4", "-vn", "track.mp3"]);
    }

    #[test]
    fn test_convert_args() {
        let args = convert_args(Path::new("a.wav"), Path::new("a.ogg"));
        assert_eq!(args, vec!["-y", "-i", "a.wav", "a.ogg"]);
    }
}
