// Public modules
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod io;
pub mod markdown;
pub mod models;
pub mod news;
pub mod newsletter;
pub mod pipeline;
pub mod prompts;

// Re-export commonly used types
pub use config::Config;
pub use error::{NewsletterError, Result};
pub use generator::{OpenAiClient, SectionGenerator, TextGenerator};
pub use models::{
    BannerConfig, Document, DocumentSummary, NewsDigest, NewsItem, NewsletterOptions, Section,
    SectionKind, SectionStatus, TemplateVariant,
};
pub use news::{DigestBuilder, NewsApiClient, SearchClient};
pub use newsletter::DocumentAssembler;
pub use pipeline::{BuildRequest, NewsQuery, NewsletterPipeline};
