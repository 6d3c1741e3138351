//! Document conversion via headless LibreOffice

use super::tools::{self, Tool};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Convert a document to the given format (e.g. `pdf`, `docx`, `odt`).
/// Returns the path of the converted file inside `out_dir`.
pub async fn convert_document(input: &Path, format: &str, out_dir: &Path) -> Result<PathBuf> {
    if !input.is_file() {
        return Err(Error::NotFound(format!(
            "File not found in {}",
            input.display()
        )));
    }
    if format.is_empty() {
        return Err(Error::InvalidInput(
            "Target format cannot be empty".to_string(),
        ));
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let args = convert_args(input, format, out_dir);
    tools::run(Tool::Soffice, &args).await?;

    let converted = output_path(input, format, out_dir);
    if converted.is_file() {
        Ok(converted)
    } else {
        Err(Error::ToolFailed {
            tool: Tool::Soffice.name().to_string(),
            stderr: format!(
                "Conversion produced no output at {}",
                converted.display()
            ),
        })
    }
}

fn convert_args(input: &Path, format: &str, out_dir: &Path) -> Vec<String> {
    vec![
        "--headless".to_string(),
        "--convert-to".to_string(),
        format.to_string(),
        "--outdir".to_string(),
        out_dir.display().to_string(),
        input.display().to_string(),
    ]
}

/// soffice writes `<stem>.<format>` into the output directory
fn output_path(input: &Path, format: &str, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("{}.{}", stem, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_args() {
        let args = convert_args(Path::new("report.docx"), "pdf", Path::new("/tmp/out"));
        assert_eq!(
            args,
            vec![
                "--headless",
                "--convert-to",
                "pdf",
                "--outdir",
                "/tmp/out",
                "report.docx"
            ]
        );
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("docs/report.docx"), "pdf", Path::new("/tmp/out")),
            PathBuf::from("/tmp/out/report.pdf")
        );
    }
}
