use anyhow::{Context, Result};
use clap::Parser;
use shared::config::DEFAULT_NEWS_API_BASE_URL;
use shared::news::effective_lookback_days;
use shared::{Config, DigestBuilder, NewsApiClient, NewsQuery};
use std::env;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "news-digest")]
#[command(about = "Print a digest of recent AI news, formatted for newsletter prompts")]
struct Args {
    /// Search query (defaults to the newsletter's AI news query)
    query: Option<String>,

    /// Language code
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Days to look back (the search service allows at most 7)
    #[arg(short, long, default_value = "7")]
    days: i64,

    /// Print the raw items as JSON instead of the prompt text
    #[arg(long)]
    json: bool,

    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    news_api_key: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
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
    debug!(query = ?args.query, language = %args.language, days = args.days, "Parsed CLI arguments");

    let base_url =
        env::var("NEWS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_NEWS_API_BASE_URL.to_string());
    let api_key = args.news_api_key.as_deref().unwrap_or_default();
    let client = NewsApiClient::new(api_key, base_url)
        .context("NEWS_API_KEY not set; add it to ~/.config/aidt-weekly/.env or pass --news-api-key")?;

    let query = args.query.unwrap_or_else(|| NewsQuery::default().query);
    let days = effective_lookback_days(args.days);
    if days != args.days {
        eprintln!("⚠ Looking back {} days instead of {} (service limit)", days, args.days);
    }

    eprintln!("🔎 Searching \"{}\" ({}, last {} days)...", query, args.language, days);
    let digest = DigestBuilder::new(&client)
        .build_digest(&query, &args.language, days)
        .await
        .context("Failed to build news digest")?;
    eprintln!("✓ Found {} articles", digest.items.len());

    if args.json {
        let json = serde_json::to_string_pretty(&digest.items)
            .context("Failed to serialize news items")?;
        println!("{}", json);
    } else {
        print!("{}", digest.text());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["news-digest"]);
        assert_eq!(args.query, None);
        assert_eq!(args.language, "en");
        assert_eq!(args.days, 7);
        assert!(!args.json);
    }

    #[test]
    fn test_cli_query_and_days() {
        let args = Args::parse_from(["news-digest", "AI 교육", "-l", "ko", "-d", "3", "--json"]);
        assert_eq!(args.query.as_deref(), Some("AI 교육"));
        assert_eq!(args.language, "ko");
        assert_eq!(args.days, 3);
        assert!(args.json);
    }
}
