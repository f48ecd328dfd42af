use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::info;

use crate::error::{NewsletterError, Result};

/// File name for an issue, e.g. `AIDT Weekly-제12호.html`.
pub fn file_name(issue_number: u32) -> String {
    format!("AIDT Weekly-제{}호.html", issue_number)
}

/// Self-contained `data:` URI carrying the whole document.
pub fn data_uri(html: &str) -> String {
    format!("data:text/html;base64,{}", STANDARD.encode(html.as_bytes()))
}

/// Anchor that downloads the document when clicked.
pub fn download_link(html: &str, file_name: &str) -> String {
    format!(
        "<a href=\"{}\" download=\"{}\" style=\"display: inline-block; margin-top: 20px; \
         padding: 10px 20px; background-color: #ff5722; color: white; text-decoration: none; \
         border-radius: 5px; font-weight: bold;\">뉴스레터 다운로드</a>",
        data_uri(html),
        crate::newsletter::escape_html(file_name)
    )
}

/// Documents directory if there is one, else the current directory.
pub fn default_output_dir() -> PathBuf {
    dirs::document_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn save_html(html: &str, dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| NewsletterError::io(dir, e))?;
    let filepath = dir.join(file_name);
    fs::write(&filepath, html).map_err(|e| NewsletterError::io(&filepath, e))?;
    info!(path = %filepath.display(), bytes = html.len(), "Wrote newsletter HTML");
    Ok(filepath)
}
