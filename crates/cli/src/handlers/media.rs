//! Handlers for the `media` command group

use crate::{AudioAction, DocAction, ImageAction, VideoAction};
use anyhow::Result;
use flextk_core::media::{audio, image, office, video};

pub async fn handle_video(action: VideoAction) -> Result<()> {
    match action {
        VideoAction::Probe { video: path } => {
            let info = video::probe(&path).await?;
            println!("  Duration:   {:.2}s", info.duration_secs);
            println!("  Dimensions: {}x{}", info.width, info.height);
            println!("  FPS:        {:.2}", info.fps);
            match info.bit_rate {
                Some(rate) => println!("  Bit rate:   {} b/s", rate),
                None => println!("  Bit rate:   -"),
            }
        }
        VideoAction::Convert { input, output } => {
            video::convert(&input, &output).await?;
            println!("  ✅ Converted to {}", output.display());
        }
        VideoAction::Frames {
            video: path,
            out_dir,
            fps,
        } => {
            video::extract_frames(&path, &out_dir, fps).await?;
            println!("  ✅ Frames written to {}", out_dir.display());
        }
    }

    Ok(())
}

pub async fn handle_audio(action: AudioAction) -> Result<()> {
    match action {
        AudioAction::Convert { input, output } => {
            audio::convert(&input, &output).await?;
            println!("  ✅ Converted to {}", output.display());
        }
        AudioAction::Extract { video, output } => {
            audio::extract_from_video(&video, &output).await?;
            println!("  ✅ Audio track written to {}", output.display());
        }
    }

    Ok(())
}

pub async fn handle_image(action: ImageAction) -> Result<()> {
    match action {
        ImageAction::Convert { input, output } => {
            image::convert(&input, &output).await?;
            println!("  ✅ Converted to {}", output.display());
        }
        ImageAction::Resize {
            input,
            output,
            width,
            height,
        } => {
            image::resize(&input, &output, width, height).await?;
            println!("  ✅ Resized to {}x{}: {}", width, height, output.display());
        }
        ImageAction::Grayscale { input, output } => {
            image::grayscale(&input, &output).await?;
            println!("  ✅ Grayscale image written to {}", output.display());
        }
        ImageAction::Rotate {
            input,
            output,
            degrees,
        } => {
            image::rotate(&input, &output, degrees).await?;
            println!("  ✅ Rotated by {}°: {}", degrees, output.display());
        }
    }

    Ok(())
}

pub async fn handle_doc(action: DocAction) -> Result<()> {
    match action {
        DocAction::Convert {
            input,
            format,
            out_dir,
        } => {
            let converted = office::convert_document(&input, &format, &out_dir).await?;
            println!("  ✅ Converted to {}", converted.display());
        }
    }

    Ok(())
}
