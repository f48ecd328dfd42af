//! End-to-end build of one newsletter issue.
//!
//! Order of work: validate the request (the only fatal step), build the
//! news digest if enabled, generate every section, assemble the document.
//! Digest and section failures are contained and surface as visible text.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Local;
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::error::{NewsletterError, Result};
use crate::generator::{SectionGenerator, TextGenerator};
use crate::models::{
    format_issue_date, Document, DocumentMeta, NewsletterOptions, Section, SectionKind,
    SectionStatus,
};
use crate::news::{DigestBuilder, SearchClient, MAX_LOOKBACK_DAYS};
use crate::newsletter::DocumentAssembler;
use crate::prompts::{self, PromptContext, SYSTEM_PROMPT, TEMPERATURE, TIP_TOPICS};

/// Search parameters for news-backed issues.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub query: String,
    pub language: String,
    pub lookback_days: i64,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            query: "\"artificial intelligence\" OR \"generative AI\"".to_string(),
            language: "en".to_string(),
            lookback_days: MAX_LOOKBACK_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub issue_number: u32,
    pub options: NewsletterOptions,
    pub news: NewsQuery,
    pub overrides: BTreeMap<SectionKind, String>,
}

pub struct NewsletterPipeline<'a> {
    generator: &'a dyn TextGenerator,
    search: Option<&'a dyn SearchClient>,
}

impl<'a> NewsletterPipeline<'a> {
    pub fn new(generator: &'a dyn TextGenerator, search: Option<&'a dyn SearchClient>) -> Self {
        Self { generator, search }
    }

    fn validate(&self, request: &BuildRequest) -> Result<()> {
        if request.issue_number == 0 {
            return Err(NewsletterError::config("issue number must be at least 1"));
        }
        if request.options.use_news_digest && self.search.is_none() {
            return Err(NewsletterError::config(
                "news-backed issue requested but no search client is configured",
            ));
        }
        if request.options.use_news_digest && request.news.query.trim().is_empty() {
            return Err(NewsletterError::config("news query is empty"));
        }
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(issue = request.issue_number, news = request.options.use_news_digest))]
    pub async fn build(&self, request: &BuildRequest) -> Result<Document> {
        self.validate(request)?;

        let t0 = Instant::now();
        let generated_at = Local::now();
        let meta = DocumentMeta {
            issue_number: request.issue_number,
            generated_at,
            banner: request.options.highlight_banner.clone(),
            template_variant: request.options.template_variant,
        };

        let (news_text, notice) = self.news_context(request).await;

        let mut context = PromptContext::new()
            .with("date", format_issue_date(&generated_at))
            .with("issue", request.issue_number.to_string())
            .with("news", news_text);
        if let Some(topic) = prompts::rotate_topic(&TIP_TOPICS, request.issue_number) {
            context.set("tip_topic", topic);
        }

        let generator = SectionGenerator::new(self.generator, SYSTEM_PROMPT, TEMPERATURE);
        let sections = if request.options.concurrent_sections {
            Self::generate_concurrently(&generator, request, &context).await
        } else {
            Self::generate_sequentially(&generator, request, &context).await
        };

        let failed = sections
            .iter()
            .filter(|s| s.status == SectionStatus::Failed)
            .count();
        info!(
            sections = sections.len(),
            failed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Newsletter sections ready"
        );

        Ok(DocumentAssembler::assemble(meta, sections, notice))
    }

    /// Digest text for `{news}` plus an optional visible notice on failure.
    async fn news_context(&self, request: &BuildRequest) -> (String, Option<String>) {
        let search = match (request.options.use_news_digest, self.search) {
            (true, Some(search)) => search,
            _ => return (String::new(), None),
        };

        let news = &request.news;
        match DigestBuilder::new(search)
            .build_digest(&news.query, &news.language, news.lookback_days)
            .await
        {
            Ok(digest) => (digest.text(), None),
            Err(e) => {
                warn!(error = %e, "News digest unavailable; continuing without it");
                (String::new(), Some(format!("최신 뉴스를 불러오지 못했습니다: {e}")))
            }
        }
    }

    async fn generate_sequentially(
        generator: &SectionGenerator<'_>,
        request: &BuildRequest,
        context: &PromptContext,
    ) -> Vec<Section> {
        let mut sections = Vec::with_capacity(SectionKind::ALL.len());
        for kind in SectionKind::ALL {
            sections.push(Self::generate_one(generator, request, context, kind).await);
        }
        sections
    }

    async fn generate_concurrently(
        generator: &SectionGenerator<'_>,
        request: &BuildRequest,
        context: &PromptContext,
    ) -> Vec<Section> {
        join_all(
            SectionKind::ALL
                .into_iter()
                .map(|kind| Self::generate_one(generator, request, context, kind)),
        )
        .await
    }

    async fn generate_one(
        generator: &SectionGenerator<'_>,
        request: &BuildRequest,
        context: &PromptContext,
        kind: SectionKind,
    ) -> Section {
        let template = prompts::template_for(kind, request.options.use_news_digest);
        let override_text = request.overrides.get(&kind).map(String::as_str);
        generator
            .generate_section(kind, template, context, override_text)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsItem, TemplateVariant};
    use crate::news::SearchRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails whenever the prompt contains `fail_marker`.
    struct ScriptedGenerator {
        fail_marker: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(fail_marker: Option<&'static str>) -> Self {
            Self {
                fail_marker,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(&self, _system: &str, user: &str, _temperature: f32) -> Result<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            match self.fail_marker {
                Some(marker) if user.contains(marker) => {
                    Err(NewsletterError::generation("upstream 503"))
                }
                _ => Ok("## 생성됨\n\n본문".to_string()),
            }
        }
    }

    struct FakeSearch {
        result: std::result::Result<usize, u16>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl SearchClient for FakeSearch {
        async fn search(&self, _request: &SearchRequest) -> Result<Vec<NewsItem>> {
            *self.calls.lock().unwrap() += 1;
            match self.result {
                Ok(count) => Ok((1..=count)
                    .map(|n| NewsItem {
                        title: format!("Headline {n}"),
                        published_at: "2026-02-01T10:00:00Z".to_string(),
                        description: None,
                        source: "Wire".to_string(),
                        url: format!("https://news.example/{n}"),
                    })
                    .collect()),
                Err(status) => Err(NewsletterError::digest(Some(status), "too many requests")),
            }
        }
    }

    fn request(issue_number: u32) -> BuildRequest {
        BuildRequest {
            issue_number,
            ..BuildRequest::default()
        }
    }

    #[tokio::test]
    async fn test_one_failing_section_is_isolated() {
        let generator = ScriptedGenerator::new(Some("'다가오는 이벤트'"));
        let pipeline = NewsletterPipeline::new(&generator, None);
        let doc = pipeline.build(&request(1)).await.unwrap();

        assert_eq!(doc.sections.len(), 5);
        let failed: Vec<_> = doc
            .sections
            .iter()
            .filter(|s| s.status == SectionStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind, SectionKind::Events);
        assert!(failed[0].body.contains("upstream 503"));
        assert_eq!(
            doc.sections
                .iter()
                .filter(|s| s.status == SectionStatus::Ok)
                .count(),
            4
        );
        assert!(doc.html.contains("upstream 503"));
        assert_eq!(generator.calls(), 5);
    }

    #[tokio::test]
    async fn test_override_section_never_calls_client() {
        let generator = ScriptedGenerator::new(None);
        let pipeline = NewsletterPipeline::new(&generator, None);
        let mut req = request(2);
        req.overrides
            .insert(SectionKind::SuccessStory, "## 직접 입력한 사례\n\n내용".to_string());

        let doc = pipeline.build(&req).await.unwrap();

        assert_eq!(generator.calls(), 4);
        assert!(generator
            .prompts
            .lock()
            .unwrap()
            .iter()
            .all(|p| !p.contains("'성공 사례'")));
        let story = doc.section(SectionKind::SuccessStory).unwrap();
        assert_eq!(story.status, SectionStatus::Overridden);
        assert!(story.body.contains("<h2>직접 입력한 사례</h2>"));
    }

    #[tokio::test]
    async fn test_zero_issue_number_is_fatal_before_any_call() {
        let generator = ScriptedGenerator::new(None);
        let pipeline = NewsletterPipeline::new(&generator, None);
        let err = pipeline.build(&request(0)).await.unwrap_err();

        assert!(matches!(err, NewsletterError::Configuration(_)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_news_mode_without_search_client_is_fatal() {
        let generator = ScriptedGenerator::new(None);
        let pipeline = NewsletterPipeline::new(&generator, None);
        let mut req = request(1);
        req.options.use_news_digest = true;

        let err = pipeline.build(&req).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_digest_is_injected_into_main_news_prompt() {
        let generator = ScriptedGenerator::new(None);
        let search = FakeSearch {
            result: Ok(3),
            calls: Mutex::new(0),
        };
        let pipeline = NewsletterPipeline::new(&generator, Some(&search));
        let mut req = request(1);
        req.options.use_news_digest = true;

        let doc = pipeline.build(&req).await.unwrap();

        assert_eq!(*search.calls.lock().unwrap(), 1);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("1. Headline 1"));
        assert!(prompts[0].contains("3. Headline 3"));
        assert!(doc.notice.is_none());
    }

    #[tokio::test]
    async fn test_digest_failure_leaves_notice_and_empty_news() {
        let generator = ScriptedGenerator::new(None);
        let search = FakeSearch {
            result: Err(429),
            calls: Mutex::new(0),
        };
        let pipeline = NewsletterPipeline::new(&generator, Some(&search));
        let mut req = request(1);
        req.options.use_news_digest = true;

        let doc = pipeline.build(&req).await.unwrap();

        let notice = doc.notice.as_deref().unwrap();
        assert!(notice.contains("429"));
        assert!(doc.html.contains("class=\"notice\""));
        assert_eq!(doc.section(SectionKind::MainNews).unwrap().status, SectionStatus::Ok);
        let prompts = generator.prompts.lock().unwrap();
        assert!(!prompts[0].contains("{news}"));
        assert!(!prompts[0].contains("Headline"));
    }

    struct SingleHeadline(&'static str);

    #[async_trait]
    impl SearchClient for SingleHeadline {
        async fn search(&self, _request: &SearchRequest) -> Result<Vec<NewsItem>> {
            Ok(vec![NewsItem {
                title: self.0.to_string(),
                published_at: "2026-02-01T10:00:00Z".to_string(),
                description: Some("{date} 기준".to_string()),
                source: "Wire".to_string(),
                url: "https://news.example/1".to_string(),
            }])
        }
    }

    #[tokio::test]
    async fn test_digest_text_reaches_prompt_verbatim() {
        let generator = ScriptedGenerator::new(None);
        let search = SingleHeadline("Template syntax {tip_topic} explained");
        let pipeline = NewsletterPipeline::new(&generator, Some(&search));
        let mut req = request(1);
        req.options.use_news_digest = true;

        pipeline.build(&req).await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("1. Template syntax {tip_topic} explained"));
        assert!(prompts[0].contains("요약: {date} 기준"));
        assert!(!prompts[0].contains(TIP_TOPICS[0]));
    }

    #[tokio::test]
    async fn test_search_not_called_when_news_disabled() {
        let generator = ScriptedGenerator::new(None);
        let search = FakeSearch {
            result: Ok(3),
            calls: Mutex::new(0),
        };
        let pipeline = NewsletterPipeline::new(&generator, Some(&search));
        pipeline.build(&request(1)).await.unwrap();

        assert_eq!(*search.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tip_topic_follows_issue_number() {
        let generator = ScriptedGenerator::new(None);
        let pipeline = NewsletterPipeline::new(&generator, None);
        pipeline.build(&request(9)).await.unwrap();

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[1].contains(TIP_TOPICS[0]));
        assert!(prompts[1].contains("9호"));
    }

    #[tokio::test]
    async fn test_concurrent_mode_keeps_slot_order() {
        let generator = ScriptedGenerator::new(Some("'Q&A'"));
        let pipeline = NewsletterPipeline::new(&generator, None);
        let mut req = request(3);
        req.options.concurrent_sections = true;
        req.options.template_variant = TemplateVariant::Compact;

        let doc = pipeline.build(&req).await.unwrap();

        let kinds: Vec<SectionKind> = doc.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::ALL.to_vec());
        assert_eq!(doc.section(SectionKind::Qa).unwrap().status, SectionStatus::Failed);
        assert_eq!(generator.calls(), 5);
    }
}
