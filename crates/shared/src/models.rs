use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of newsletter sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    MainNews,
    AidtTips,
    SuccessStory,
    Events,
    Qa,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::MainNews,
        SectionKind::AidtTips,
        SectionKind::SuccessStory,
        SectionKind::Events,
        SectionKind::Qa,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SectionKind::MainNews => "main_news",
            SectionKind::AidtTips => "aidt_tips",
            SectionKind::SuccessStory => "success_story",
            SectionKind::Events => "events",
            SectionKind::Qa => "qa",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::MainNews => "주요 소식",
            SectionKind::AidtTips => "이번 주 AIDT 팁",
            SectionKind::SuccessStory => "성공 사례",
            SectionKind::Events => "다가오는 이벤트",
            SectionKind::Qa => "질문 & 답변",
        }
    }

    /// Extra CSS classes: `.0` on the section box, `.1` on its container.
    pub fn css_classes(&self) -> (&'static str, &'static str) {
        match self {
            SectionKind::MainNews => ("", "main-news"),
            SectionKind::SuccessStory => ("success-case", ""),
            _ => ("", ""),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Ok,
    Overridden,
    Failed,
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SectionStatus::Ok => "ok",
            SectionStatus::Overridden => "overridden",
            SectionStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One rendered section. Built once per document and never mutated.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub body: String,
    pub status: SectionStatus,
    pub error: Option<String>,
}

/// A single article returned by the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub published_at: String,
    pub description: Option<String>,
    pub source: String,
    pub url: String,
}

/// Recent articles plus the query that produced them.
#[derive(Debug, Clone)]
pub struct NewsDigest {
    pub query: String,
    pub language: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub items: Vec<NewsItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerConfig {
    pub title: String,
    pub subtitle: String,
    pub link_text: String,
    pub link_url: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            title: "중부Infra AT/DT 뉴스레터 개시".to_string(),
            subtitle: "AI, 어떻게 시작할지 막막하다면?".to_string(),
            link_text: "AT/DT 추진방향 →".to_string(),
            link_url: "#".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVariant {
    /// Header, intro paragraph, banner, sections, footer.
    #[default]
    Standard,
    /// Same skeleton without the intro paragraph.
    Compact,
}

impl FromStr for TemplateVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(TemplateVariant::Standard),
            "compact" => Ok(TemplateVariant::Compact),
            other => Err(format!(
                "unknown template variant '{other}' (expected 'standard' or 'compact')"
            )),
        }
    }
}

/// Pipeline switches that replace per-variant code paths.
#[derive(Debug, Clone, Default)]
pub struct NewsletterOptions {
    pub use_news_digest: bool,
    pub highlight_banner: Option<BannerConfig>,
    pub template_variant: TemplateVariant,
    pub concurrent_sections: bool,
}

#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub issue_number: u32,
    pub generated_at: DateTime<Local>,
    pub banner: Option<BannerConfig>,
    pub template_variant: TemplateVariant,
}

impl DocumentMeta {
    pub fn date_label(&self) -> String {
        format_issue_date(&self.generated_at)
    }

    pub fn year(&self) -> i32 {
        self.generated_at.year()
    }
}

pub fn format_issue_date(date: &DateTime<Local>) -> String {
    date.format("%Y년 %m월 %d일").to_string()
}

/// The finished issue: metadata, sections in slot order, and rendered HTML.
#[derive(Debug, Clone)]
pub struct Document {
    pub meta: DocumentMeta,
    pub sections: Vec<Section>,
    pub notice: Option<String>,
    pub html: String,
}

impl Document {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            version: SUMMARY_VERSION.to_string(),
            issue_number: self.meta.issue_number,
            date: self.meta.date_label(),
            created_at: self.meta.generated_at.to_rfc3339(),
            notice: self.notice.clone(),
            sections: self
                .sections
                .iter()
                .map(|s| SectionSummary {
                    key: s.kind,
                    title: s.kind.title().to_string(),
                    status: s.status,
                    error: s.error.clone(),
                })
                .collect(),
        }
    }
}

pub const SUMMARY_VERSION: &str = "1.0";

/// Issue metadata handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub version: String,
    pub issue_number: u32,
    pub date: String,
    pub created_at: String,
    #[serde(default)]
    pub notice: Option<String>,
    pub sections: Vec<SectionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    pub key: SectionKind,
    pub title: String,
    pub status: SectionStatus,
    #[serde(default)]
    pub error: Option<String>,
}
