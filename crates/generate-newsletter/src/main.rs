use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    export, io, BannerConfig, BuildRequest, Config, NewsApiClient, NewsQuery, NewsletterOptions,
    NewsletterPipeline, OpenAiClient, SearchClient, SectionKind, SectionStatus, TemplateVariant,
};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "generate-newsletter")]
#[command(about = "Generate an AIDT Weekly newsletter issue as a standalone HTML file")]
struct Args {
    /// Issue number (defaults to one past the last issue in the output directory)
    #[arg(short, long)]
    issue: Option<u32>,

    /// Ground the main news section in recent search results
    #[arg(long)]
    news: bool,

    /// Search query for the news digest
    #[arg(long)]
    query: Option<String>,

    /// Language code for the news digest
    #[arg(long, default_value = "en")]
    language: String,

    /// Days to look back for news (the search service allows at most 7)
    #[arg(long, default_value = "7")]
    days: i64,

    /// Replace a generated section with markdown from a file, e.g. success_story=story.md
    #[arg(long = "override", value_name = "SECTION=FILE", value_parser = parse_override)]
    overrides: Vec<(SectionKind, PathBuf)>,

    /// Page layout: standard or compact
    #[arg(short, long, default_value = "standard")]
    template: TemplateVariant,

    /// Leave out the highlight banner
    #[arg(long)]
    no_banner: bool,

    #[arg(long)]
    banner_title: Option<String>,

    #[arg(long)]
    banner_subtitle: Option<String>,

    #[arg(long)]
    banner_link_text: Option<String>,

    #[arg(long)]
    banner_link_url: Option<String>,

    /// Generate all sections at the same time instead of one by one
    #[arg(long)]
    concurrent: bool,

    /// Where to write the HTML and metadata files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,
}

fn parse_override(value: &str) -> std::result::Result<(SectionKind, PathBuf), String> {
    let (key, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SECTION=FILE, got '{value}'"))?;
    let kind = SectionKind::from_key(key.trim()).ok_or_else(|| {
        let keys: Vec<&str> = SectionKind::ALL.iter().map(|k| k.key()).collect();
        format!("unknown section '{}' (one of: {})", key.trim(), keys.join(", "))
    })?;
    Ok((kind, PathBuf::from(path.trim())))
}

impl Args {
    fn banner(&self) -> Option<BannerConfig> {
        if self.no_banner {
            return None;
        }
        let defaults = BannerConfig::default();
        Some(BannerConfig {
            title: self.banner_title.clone().unwrap_or(defaults.title),
            subtitle: self.banner_subtitle.clone().unwrap_or(defaults.subtitle),
            link_text: self.banner_link_text.clone().unwrap_or(defaults.link_text),
            link_url: self.banner_link_url.clone().unwrap_or(defaults.link_url),
        })
    }

    fn news_query(&self) -> NewsQuery {
        let defaults = NewsQuery::default();
        NewsQuery {
            query: self.query.clone().unwrap_or(defaults.query),
            language: self.language.clone(),
            lookback_days: self.days,
        }
    }

    /// Environment config with any credentials given on the command line.
    fn config(&self) -> Result<Config> {
        let config = Config::from_lookup(|key| match key {
            "OPENAI_API_KEY" => self.openai_api_key.clone(),
            "NEWS_API_KEY" => self.news_api_key.clone(),
            _ => env::var(key).ok(),
        })?;
        Ok(config)
    }

    fn read_overrides(&self) -> Result<BTreeMap<SectionKind, String>> {
        let mut overrides = BTreeMap::new();
        for (kind, path) in &self.overrides {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read override file: {}", path.display()))?;
            overrides.insert(*kind, text);
        }
        Ok(overrides)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    Config::load_dotenv();
    let args = Args::parse();

    // Credentials are checked before any network call.
    let config = args.config()?;
    debug!(?config, "Loaded configuration");
    let generator = OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
        config.openai_base_url.clone(),
    )?;
    let search = if args.news {
        Some(NewsApiClient::new(
            config.require_news_api_key()?,
            config.news_api_base_url.clone(),
        )?)
    } else {
        None
    };

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(export::default_output_dir);
    let issue_number = match args.issue {
        Some(n) => n,
        None => io::next_issue_number(&output_dir)
            .context("Failed to read previous issues from the output directory")?,
    };

    let request = BuildRequest {
        issue_number,
        options: NewsletterOptions {
            use_news_digest: args.news,
            highlight_banner: args.banner(),
            template_variant: args.template,
            concurrent_sections: args.concurrent,
        },
        news: args.news_query(),
        overrides: args.read_overrides()?,
    };

    println!("📰 Building AIDT Weekly 제{}호...", issue_number);
    if args.news {
        println!(
            "🔎 News digest: \"{}\" ({}, last {} days)",
            request.news.query, request.news.language, request.news.lookback_days
        );
    }
    println!("🤖 Generating sections with {}...", config.openai_model);
    println!("  (This may take a minute or two...)");

    let pipeline = NewsletterPipeline::new(
        &generator,
        search.as_ref().map(|s| s as &dyn SearchClient),
    );
    let document = pipeline
        .build(&request)
        .await
        .context("Failed to build newsletter")?;

    if let Some(notice) = &document.notice {
        println!("\n⚠ {}", notice);
    }

    println!();
    for section in &document.sections {
        let marker = match section.status {
            SectionStatus::Ok => "✓",
            SectionStatus::Overridden => "✎",
            SectionStatus::Failed => "✗",
        };
        println!("  {} {} ({})", marker, section.kind.title(), section.status);
        if let Some(error) = &section.error {
            println!("    {}", error);
        }
    }

    let file_name = export::file_name(issue_number);
    let html_path = export::save_html(&document.html, &output_dir, &file_name)
        .context("Failed to save newsletter HTML")?;
    let summary_path = io::save_summary(&document.summary(), &output_dir)
        .context("Failed to save newsletter metadata")?;
    info!(html = %html_path.display(), metadata = %summary_path.display(), "Issue saved");

    println!("\n✅ Newsletter saved to: {}", html_path.display());
    println!("   Metadata: {}", summary_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        let (kind, path) = parse_override("success_story=story.md").unwrap();
        assert_eq!(kind, SectionKind::SuccessStory);
        assert_eq!(path, PathBuf::from("story.md"));
    }

    #[test]
    fn test_parse_override_rejects_unknown_section() {
        let err = parse_override("sports=x.md").unwrap_err();
        assert!(err.contains("unknown section 'sports'"));
        assert!(parse_override("no-equals").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["generate-newsletter"]);
        assert_eq!(args.issue, None);
        assert!(!args.news);
        assert_eq!(args.template, TemplateVariant::Standard);
        assert_eq!(args.banner(), Some(BannerConfig::default()));
        assert_eq!(args.news_query().lookback_days, 7);
    }

    #[test]
    fn test_cli_flags() {
        let args = Args::parse_from([
            "generate-newsletter",
            "-i",
            "12",
            "--news",
            "--query",
            "LLM",
            "--days",
            "30",
            "--template",
            "compact",
            "--override",
            "qa=qa.md",
            "--banner-title",
            "스터디 모집",
        ]);
        assert_eq!(args.issue, Some(12));
        assert!(args.news);
        assert_eq!(args.news_query().query, "LLM");
        assert_eq!(args.news_query().lookback_days, 30);
        assert_eq!(args.template, TemplateVariant::Compact);
        assert_eq!(args.overrides, vec![(SectionKind::Qa, PathBuf::from("qa.md"))]);
        assert_eq!(args.banner().unwrap().title, "스터디 모집");
    }

    #[test]
    fn test_no_banner() {
        let args = Args::parse_from(["generate-newsletter", "--no-banner"]);
        assert!(args.banner().is_none());
    }
}
