//! Image operations via ImageMagick

use super::tools::{self, Tool};
use crate::error::{Error, Result};
use std::path::Path;

/// Convert an image to whatever format the output extension names
pub async fn convert(input: &Path, output: &Path) -> Result<()> {
    ensure_exists(input)?;
    let args = convert_args(input, output);
    tools::run(Tool::Magick, &args).await?;
    Ok(())
}

/// Resize an image to exact pixel dimensions
pub async fn resize(input: &Path, output: &Path, width: u32, height: u32) -> Result<()> {
    ensure_exists(input)?;
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(
            "Width and height must be positive".to_string(),
        ));
    }

    let args = resize_args(input, output, width, height);
    tools::run(Tool::Magick, &args).await?;
    Ok(())
}

/// Convert an image to grayscale
pub async fn grayscale(input: &Path, output: &Path) -> Result<()> {
    ensure_exists(input)?;
    let args = grayscale_args(input, output);
    tools::run(Tool::Magick, &args).await?;
    Ok(())
}

/// Rotate an image clockwise by the given degrees
pub async fn rotate(input: &Path, output: &Path, degrees: f64) -> Result<()> {
    ensure_exists(input)?;
    let args = rotate_args(input, output, degrees);
    tools::run(Tool::Magick, &args).await?;
    Ok(())
}

fn convert_args(input: &Path, output: &Path) -> Vec<String> {
    vec![input.display().to_string(), output.display().to_string()]
}

fn resize_args(input: &Path, output: &Path, width: u32, height: u32) -> Vec<String> {
    vec![
        input.display().to_string(),
        "-resize".to_string(),
        format!("{}x{}!", width, height),
        output.display().to_string(),
    ]
}

fn grayscale_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        input.display().to_string(),
        "-colorspace".to_string(),
        "Gray".to_string(),
        output.display().to_string(),
    ]
}

fn rotate_args(input: &Path, output: &Path, degrees: f64) -> Vec<String> {
    vec![
        input.display().to_string(),
        "-rotate".to_string(),
        degrees.to_string(),
        output.display().to_string(),
    ]
}

fn ensure_exists(input: &Path) -> Result<()> {
    if input.is_file() {
        Ok(())
    } else {
        Err(Error::NotFound(format!(
            "File not found in {}",
            input.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_args_force_exact_size() {
        let args = resize_args(Path::new("in.png"), Path::new("out.png"), 640, 480);
        assert_eq!(args, vec!["in.png", "-resize", "640x480!", "out.png"]);
    }

    #[test]
    fn test_grayscale_args() {
        let args = grayscale_args(Path::new("in.jpg"), Path::new("out.jpg"));
        assert_eq!(args, vec!["in.jpg", "-colorspace", "Gray", "out.jpg"]);
    }

    #[test]
    fn test_rotate_args() {
        let args = rotate_args(Path::new("in.png"), Path::new("out.png"), 90.0);
        assert_eq!(args, vec!["in.png", "-rotate", "90", "out.png"]);
    }

    #[test]
    fn test_convert_args() {
        let args = convert_args(Path::new("photo.png"), Path::new("photo.webp"));
        assert_eq!(args, vec!["photo.png", "photo.webp"]);
    }
}
