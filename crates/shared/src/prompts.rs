//! Prompt templates, the tip-topic rotation, and placeholder substitution.
//!
//! Templates use `{name}` placeholders filled from a [`PromptContext`]:
//! `{date}`, `{issue}`, `{tip_topic}` and `{news}`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::SectionKind;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

pub const SYSTEM_PROMPT: &str = "AI 디지털 트랜스포메이션 뉴스레터 콘텐츠 생성 전문가. \
간결하고 핵심적인 내용만 포함한 뉴스레터를 작성합니다.";

pub const TEMPERATURE: f32 = 0.7;

/// Candidate topics for the tip section, cycled by issue number.
pub const TIP_TOPICS: [&str; 8] = [
    "프롬프트 작성의 기본 원칙",
    "회의록 요약 자동화",
    "엑셀 수식과 데이터 정리",
    "보고서 초안 작성",
    "이메일 작성과 교정",
    "이미지 생성 도구 활용",
    "업무 자료 번역",
    "반복 업무 자동화 스크립트",
];

const MAIN_NEWS: &str = r#"
AIDT Weekly 뉴스레터의 '주요 소식' 섹션을 생성해주세요.
최근 한달 이내의 최신 소식만 다루어 주세요. 오늘 날짜는 {date}입니다.
형식:

## [주제]의 [핵심 강점/특징]은 [주목할만합니다/확인됐습니다/중요합니다].

간략한 내용을 1-2문장으로 작성하고 왜 중요한지를 강조해주세요.
구체적인 수치나 인용구가 있다면 추가해주세요.
마지막에는 "[출처 제목](출처 URL)에서 전체 내용을 확인할 수 있습니다." 형식으로 출처를 밝혀주세요.

같은 형식으로 총 세 개의 소식을 작성하고, 각 소식 사이에 빈 줄을 두세요.
가상의 정보는 절대 포함하지 말고, 모든 소식에 원본 출처 링크를 [제목](URL) 형식으로 제공하세요.
가장 중요한 한 문장은 [강조]...[/강조]로 감싸 주세요.
"#;

const MAIN_NEWS_WITH_DIGEST: &str = r#"
AIDT Weekly 뉴스레터의 '주요 소식' 섹션을 생성해주세요. 오늘 날짜는 {date}입니다.
아래는 검색 서비스에서 가져온 최신 기사 목록입니다. 이 목록에 있는 기사만 사용하세요.

{news}

형식:

## [주제]의 [핵심 강점/특징]은 [주목할만합니다/확인됐습니다/중요합니다].

간략한 내용을 1-2문장으로 작성하고 왜 중요한지를 강조해주세요.
마지막에는 "[출처 제목](출처 URL)에서 전체 내용을 확인할 수 있습니다." 형식으로 위 목록의 링크를 밝혀주세요.

목록에서 가장 중요한 기사 세 개를 골라 같은 형식으로 작성하고, 각 소식 사이에 빈 줄을 두세요.
기사 목록이 비어 있다면 "이번 주에는 확인된 주요 소식이 없습니다."라고만 작성하세요.
가장 중요한 한 문장은 [강조]...[/강조]로 감싸 주세요.
"#;

const AIDT_TIPS: &str = r#"
AIDT Weekly 뉴스레터의 'AI 활용 팁' 섹션을 생성해주세요.
이번 호({issue}호)의 주제는 '{tip_topic}'입니다.
형식:

## 이번 주 팁: 팁 제목

팁에 대한 설명을 2-3문장으로 간결하게 작성해주세요.

**핵심 단계:**
- 첫 번째 단계
- 두 번째 단계
- 세 번째 단계

이 팁을 활용했을 때의 이점을 한 문장으로 작성해주세요.
"#;

const SUCCESS_STORY: &str = r#"
AIDT Weekly 뉴스레터의 '성공 사례' 섹션을 생성해주세요.
한국 기업 사례 1개와 외국 기업 사례 1개를 생성해야 합니다.
각 사례는 제목과 3개의 단락으로 구성하고, 단락 사이에는 빈 줄을 두세요.

형식:

## [한국 기업명]의 AI 혁신 사례

첫 번째 단락: 기업이 직면한 문제와 배경을 구체적인 수치와 함께 3~4줄로 설명합니다.

두 번째 단락: 도입한 AI 솔루션과 구현 방식을 3~4줄로 설명합니다.

세 번째 단락: 도입 후 얻은 정량적 성과를 3~4줄로 설명합니다.

## [외국 기업명]의 AI 혁신 사례

(같은 구성으로 세 단락)
"#;

const EVENTS: &str = r#"
AIDT Weekly 뉴스레터의 '다가오는 이벤트' 섹션을 생성해주세요.
현재 날짜는 {date}입니다.
형식:

## 컨퍼런스/웨비나 제목
- 날짜/시간: [날짜 정보]
- 장소/형식: [장소 또는 온라인 여부]
- 내용: 한 문장으로 간략한 설명

## 다른 이벤트 제목
- 날짜/시간: [날짜 정보]
- 장소/형식: [장소 또는 온라인 여부]
- 내용: 한 문장으로 간략한 설명
"#;

const QA: &str = r#"
AIDT Weekly 뉴스레터의 'Q&A' 섹션을 생성해주세요.
형식:

## 간단명료한 질문?

답변을 2-3문장으로 간결하게 작성해주세요. 불필요한 설명은 제외하고 핵심 정보만 포함해주세요.
"#;

/// Prompt template for a section; main news switches on news-backed mode.
pub fn template_for(kind: SectionKind, use_news_digest: bool) -> &'static str {
    match kind {
        SectionKind::MainNews if use_news_digest => MAIN_NEWS_WITH_DIGEST,
        SectionKind::MainNews => MAIN_NEWS,
        SectionKind::AidtTips => AIDT_TIPS,
        SectionKind::SuccessStory => SUCCESS_STORY,
        SectionKind::Events => EVENTS,
        SectionKind::Qa => QA,
    }
}

/// `topics[(issue - 1) mod len]`; `None` only for an empty list.
pub fn rotate_topic<'a>(topics: &[&'a str], issue_number: u32) -> Option<&'a str> {
    if topics.is_empty() {
        return None;
    }
    let index = issue_number.saturating_sub(1) as usize % topics.len();
    Some(topics[index])
}

/// Named values substituted into `{name}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    values: BTreeMap<String, String>,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Replace every known `{key}` in one pass over the template; unknown
    /// placeholders stay in place and inserted values are never rescanned.
    pub fn resolve(&self, template: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures| match self.values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
