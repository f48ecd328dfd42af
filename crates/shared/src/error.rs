//! Error types for the newsletter pipeline.
//!
//! Only [`NewsletterError::Configuration`] aborts a build. Digest and
//! generation failures are caught at the section/digest level and turned
//! into visible placeholder content by the pipeline.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum NewsletterError {
    /// Missing credential or invalid build request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Search service failure, or no articles inside the clamped window.
    #[error("news fetch failed{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    DigestFetch { status: Option<u16>, message: String },

    /// Text-generation failure for a single request.
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, NewsletterError>;

impl NewsletterError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn digest(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::DigestFetch {
            status,
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// A file that exists but whose contents can't be used.
    pub fn invalid_data(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, msg.into()),
        )
    }

    /// True for errors that must abort the whole build.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Io { .. })
    }
}
