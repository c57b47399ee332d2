use crate::config::OUTPUT_EXTENSION;
use crate::models::RenderedEntry;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Output file for a revision: `<output_dir>/<revision_id>.html`
pub fn output_path(output_dir: &Path, revision_id: &str) -> PathBuf {
    output_dir.join(format!("{revision_id}.{OUTPUT_EXTENSION}"))
}

/// Writes the raw rendered HTML and returns the path written.
pub async fn write_rendered(output_dir: &Path, entry: &RenderedEntry) -> Result<PathBuf> {
    let path = output_path(output_dir, &entry.revision_id);
    info!(title = %entry.title, path = %path.display(), "Writing rendered entry");
    tokio::fs::write(&path, entry.html.as_bytes())
        .await
        .with_context(|| format!("Failed to write rendered entry: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn path_is_named_by_revision_id() {
        let path = output_path(Path::new("out"), "12345");
        assert_eq!(path, Path::new("out").join("12345.html"));
    }

    #[tokio::test]
    async fn writes_html_body() {
        let dir = TempDir::new().unwrap();
        let entry = RenderedEntry {
            title: "hi".to_string(),
            revision_id: "7".to_string(),
            html: "<p>hi</p>".to_string(),
        };
        let path = write_rendered(dir.path(), &entry).await.unwrap();
        assert_eq!(path, dir.path().join("7.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn overwrites_zero_byte_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("8.html"), "").unwrap();
        let entry = RenderedEntry {
            title: "t".to_string(),
            revision_id: "8".to_string(),
            html: "<b>x</b>".to_string(),
        };
        write_rendered(dir.path(), &entry).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("8.html")).unwrap(),
            "<b>x</b>"
        );
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let entry = RenderedEntry {
            title: "t".to_string(),
            revision_id: "9".to_string(),
            html: String::new(),
        };
        let err = write_rendered(&missing, &entry).await.unwrap_err();
        assert!(format!("{err:#}").contains("9.html"));
    }
}
