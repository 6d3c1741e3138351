//! Video probing, conversion and frame extraction (ffmpeg/ffprobe)

use super::tools::{self, Tool};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Container formats the converter accepts
pub const SUPPORTED_FORMATS: [&str; 5] = ["mp4", "avi", "mov", "mkv", "ts"];

/// Summary of a probed video
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub bit_rate: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    bit_rate: Option<String>,
}

/// Probe a video file with ffprobe
pub async fn probe(video: &Path) -> Result<VideoInfo> {
    if !video.is_file() {
        return Err(Error::NotFound(format!(
            "File not found in {}",
            video.display()
        )));
    }

    let args = probe_args(video);
    let stdout = tools::run(Tool::Ffprobe, &args).await?;
    let parsed: ProbeOutput = serde_json::from_slice(&stdout)?;
    video_info_from_probe(parsed)
}

/// Convert a video between supported container formats
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

/// Extract frames as numbered PNGs into a directory
pub async fn extract_frames(video: &Path, out_dir: &Path, fps: Option<f64>) -> Result<()> {
    if !video.is_file() {
        return Err(Error::NotFound(format!(
            "File not found in {}",
            video.display()
        )));
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let args = extract_frames_args(video, out_dir, fps);
    tools::run(Tool::Ffmpeg, &args).await?;
    Ok(())
}

fn probe_args(video: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "quiet".to_string(),
        "-print_format".to_string(),
        "json".to_string(),
        "-show_format".to_string(),
        "-show_streams".to_string(),
        video.display().to_string(),
    ]
}

fn convert_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.display().to_string(),
        output.display().to_string(),
    ]
}

fn extract_frames_args(video: &Path, out_dir: &Path, fps: Option<f64>) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        video.display().to_string(),
    ];
    if let Some(fps) = fps {
        args.push("-vf".to_string());
        args.push(format!("fps={}", fps));
    }
    args.push(out_dir.join("frame_%04d.png").display().to_string());
    args
}

/// Reject paths whose extension is not a supported container format
fn check_format(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if SUPPORTED_FORMATS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Unsupported video format '{}' (supported: {})",
            extension,
            SUPPORTED_FORMATS.join(", ")
        )))
    }
}

fn video_info_from_probe(parsed: ProbeOutput) -> Result<VideoInfo> {
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| Error::InvalidInput("No video stream found".to_string()))?;

    let duration_secs = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0.0);
    let bit_rate = parsed.format.bit_rate.as_deref().and_then(|b| b.parse().ok());
    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .unwrap_or(0.0);

    Ok(VideoInfo {
        duration_secs,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        fps,
        bit_rate,
    })
}

/// ffprobe reports frame rates as a fraction, e.g. `30000/1001`
fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => rate.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        let ntsc = parse_frame_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("24"), Some(24.0));
    }

    #[test]
    fn test_check_format() {
        assert!(check_format(Path::new("clip.mp4")).is_ok());
        assert!(check_format(Path::new("clip.MKV")).is_ok());
        assert!(check_format(Path::new("clip.webm")).is_err());
        assert!(check_format(Path::new("clip")).is_err());
    }

    #[test]
    fn test_convert_args() {
        let args = convert_args(Path::new("in.avi"), Path::new("out.mp4"));
        assert_eq!(args, vec!["-y", "-i", "in.avi", "out.mp4"]);
    }

    #[test]
    fn test_extract_frames_args_with_fps() {
        let args = extract_frames_args(Path::new("clip.mp4"), &PathBuf::from("frames"), Some(2.0));
        assert_eq!(
            args,
            vec!["-y", "-i", "clip.mp4", "-vf", "fps=2", "frames/frame_%04d.png"]
        );
    }

    #[test]
    fn test_extract_frames_args_native_rate() {
        let args = extract_frames_args(Path::new("clip.mp4"), &PathBuf::from("frames"), None);
        assert_eq!(args, vec!["-y", "-i", "clip.mp4", "frames/frame_%04d.png"]);
    }

    #[test]
    fn test_probe_output_parsing() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio"},
                {"codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "25/1"}
            ],
            "format": {"duration": "12.5", "bit_rate": "4000000"}
        }"#;
        let parsed: ProbeOutput = serde_json::from_str(json).unwrap();
        let info = video_info_from_probe(parsed).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.duration_secs - 12.5).abs() < 1e-9);
        assert_eq!(info.bit_rate, Some(4_000_000));
        assert!((info.fps - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_probe_without_video_stream_fails() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        let parsed: ProbeOutput = serde_json::from_str(json).unwrap();
        assert!(video_info_from_probe(parsed).is_err());
    }
}
