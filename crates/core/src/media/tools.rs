//! External tool registry and subprocess runner

use crate::error::{Error, Result};
use std::fmt;
use tokio::process::Command;

/// The external tools the media operations shell out to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
    /// ImageMagick 7 front-end
    Magick,
    /// LibreOffice headless converter
    Soffice,
}

/// All tools, for probing in one go
pub const ALL_TOOLS: [Tool; 4] = [Tool::Ffmpeg, Tool::Ffprobe, Tool::Magick, Tool::Soffice];

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
            Tool::Magick => "magick",
            Tool::Soffice => "soffice",
        }
    }

    /// Executable to invoke. LibreOffice installs outside the PATH on macOS.
    pub fn executable(&self) -> &'static str {
        match self {
            Tool::Soffice => {
                if cfg!(target_os = "macos") {
                    "/Applications/LibreOffice.app/Contents/MacOS/soffice"
                } else {
                    "soffice"
                }
            }
            other => other.name(),
        }
    }

    /// Flag that makes the tool print its version and exit
    fn version_flag(&self) -> &'static str {
        match self {
            Tool::Ffmpeg | Tool::Ffprobe => "-version",
            Tool::Magick | Tool::Soffice => "--version",
        }
    }

    /// How to get the tool on this machine
    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Ffmpeg | Tool::Ffprobe => {
                "Install ffmpeg (e.g. 'apt install ffmpeg' or 'brew install ffmpeg')."
            }
            Tool::Magick => {
                "Install ImageMagick (e.g. 'apt install imagemagick' or 'brew install imagemagick')."
            }
            Tool::Soffice => {
                "Install LibreOffice (e.g. 'apt install libreoffice' or 'brew install --cask libreoffice')."
            }
        }
    }

    /// Probe whether the tool can be executed
    pub async fn is_installed(&self) -> bool {
        Command::new(self.executable())
            .arg(self.version_flag())
            .output()
            .await
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    /// Fail with an install hint when the tool is missing
    pub async fn ensure_installed(&self) -> Result<()> {
        if self.is_installed().await {
            Ok(())
        } else {
            Err(Error::ToolMissing {
                tool: self.name().to_string(),
                hint: self.install_hint().to_string(),
            })
        }
    }
}

/// Run a tool with the given argv and return its stdout.
/// The tool is probed first; a non-zero exit captures stderr into the error.
pub async fn run(tool: Tool, args: &[String]) -> Result<Vec<u8>> {
    tool.ensure_installed().await?;

    tracing::debug!(tool = tool.name(), ?args, "Running external tool");

    let output = Command::new(tool.executable()).args(args).output().await?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(Error::ToolFailed {
            tool: tool.name().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names() {
        assert_eq!(Tool::Ffmpeg.name(), "ffmpeg");
        assert_eq!(Tool::Soffice.to_string(), "soffice");
    }

    #[test]
    fn test_every_tool_has_a_hint() {
        for tool in ALL_TOOLS {
            assert!(!tool.install_hint().is_empty());
        }
    }

    #[test]
    fn test_missing_tool_probe_is_false() {
        // Probing a nonexistent binary must not error, just report false
        tokio_test::block_on(async {
            let probe = Command::new("definitely-not-a-real-tool-xyz")
                .arg("--version")
                .output()
                .await;
            assert!(probe.is_err());
        });
    }
}
