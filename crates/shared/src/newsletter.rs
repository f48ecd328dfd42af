use crate::models::{
    BannerConfig, Document, DocumentMeta, Section, SectionKind, SectionStatus, TemplateVariant,
};

const NEWSLETTER_NAME: &str = "중부Infra AT/DT Weekly";
const TITLE_PREFIX: &str = "AIDT Weekly";
const INTRO: &str = "중부Infra AT/DT 뉴스레터는 모두가 AI발전 속도에 뒤쳐지지 않고 \
업무에 적용할 수 있도록 가장 흥미로운 AI 활용법을 전합니다.";
const EMPTY_SLOT: &str = "<p class=\"empty\"></p>";

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', Arial, sans-serif; line-height: 1.5; color: #333; margin: 0; padding: 0; background-color: #f9f9f9; }
    .container { max-width: 600px; margin: 0 auto; background-color: #ffffff; }
    .content { padding: 20px; }
    .header { background-color: #333333; color: white; padding: 15px 20px; text-align: left; }
    .title { margin: 0; font-size: 20px; font-weight: bold; }
    .issue-info { margin-top: 5px; font-size: 10pt; }
    .section { margin-bottom: 25px; border-bottom: 1px solid #eee; padding-bottom: 20px; }
    .section:last-child { border-bottom: none; }
    .section-title { color: #ffffff; font-size: 16px; font-weight: bold; margin-bottom: 10px; background-color: #3e3e3e; padding: 8px 10px; border-radius: 4px; }
    .section-container { padding: 0 15px; }
    h2, h3 { font-size: 14px; margin-bottom: 5px; color: #333333; }
    .main-news h2 { color: #ff5722; font-size: 14px; margin-top: 15px; margin-bottom: 5px; }
    .main-news a { color: #ff5722; text-decoration: none; }
    .main-news a:hover { text-decoration: underline; }
    p, li { font-size: 10pt; margin: 0 0 8px; }
    ul { padding-left: 20px; margin-top: 5px; margin-bottom: 8px; }
    li { margin-bottom: 3px; }
    .error, .notice { color: #e74c3c; font-style: italic; }
    .footer { background-color: #f1f1f1; padding: 10px; text-align: center; font-size: 9pt; color: #666; }
    .highlight-box { background-color: #fff9f5; border: 1px solid #ffe0cc; border-radius: 5px; padding: 15px; margin: 10px 0; }
    .highlight-title { color: #ff5722; font-size: 16px; font-weight: bold; margin-bottom: 10px; text-align: center; }
    .highlight-subtitle { color: #666; font-size: 12px; text-align: center; margin-bottom: 15px; }
"#;

/// Merges rendered sections into the fixed newsletter skeleton.
pub struct DocumentAssembler;

impl DocumentAssembler {
    /// Always yields one slot per [`SectionKind`], in order. A kind with no
    /// section gets an empty placeholder; extra or duplicate sections are
    /// ignored after the first.
    pub fn assemble(meta: DocumentMeta, sections: Vec<Section>, notice: Option<String>) -> Document {
        let ordered: Vec<Section> = SectionKind::ALL
            .iter()
            .map(|kind| {
                sections
                    .iter()
                    .find(|s| s.kind == *kind)
                    .cloned()
                    .unwrap_or_else(|| Section {
                        kind: *kind,
                        body: EMPTY_SLOT.to_string(),
                        status: SectionStatus::Failed,
                        error: Some("section missing".to_string()),
                    })
            })
            .collect();

        let html = Self::render(&meta, &ordered, notice.as_deref());
        Document {
            meta,
            sections: ordered,
            notice,
            html,
        }
    }

    fn render(meta: &DocumentMeta, sections: &[Section], notice: Option<&str>) -> String {
        let mut html = String::new();
        let date = meta.date_label();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!(
            "  <title>{} - 제{}호</title>\n",
            TITLE_PREFIX, meta.issue_number
        ));
        html.push_str("  <style>");
        html.push_str(STYLE);
        html.push_str("  </style>\n");
        html.push_str("</head>\n<body>\n<div class=\"container\">\n");

        html.push_str("  <div class=\"header\">\n");
        html.push_str(&format!("    <div class=\"title\">{}</div>\n", NEWSLETTER_NAME));
        html.push_str(&format!(
            "    <div class=\"issue-info\">제{}호 | {}</div>\n",
            meta.issue_number, date
        ));
        html.push_str("  </div>\n");

        html.push_str("  <div class=\"content\">\n");

        if meta.template_variant == TemplateVariant::Standard {
            html.push_str(&format!(
                "    <div class=\"newsletter-intro\"><p>{}</p></div>\n",
                INTRO
            ));
        }

        if let Some(banner) = &meta.banner {
            html.push_str(&Self::render_banner(banner));
        }

        for section in sections {
            let (box_class, container_class) = section.kind.css_classes();
            html.push_str(&format!(
                "    <div class=\"{}\" data-section=\"{}\" data-status=\"{}\">\n",
                join_classes("section", box_class),
                section.kind.key(),
                section.status
            ));
            html.push_str(&format!(
                "      <div class=\"section-title\">{}</div>\n",
                section.kind.title()
            ));
            html.push_str(&format!(
                "      <div class=\"{}\">\n",
                join_classes("section-container", container_class)
            ));
            if section.kind == SectionKind::MainNews {
                if let Some(text) = notice {
                    html.push_str(&format!(
                        "        <p class=\"notice\">{}</p>\n",
                        escape_html(text)
                    ));
                }
            }
            html.push_str("        ");
            html.push_str(&section.body);
            html.push_str("\n      </div>\n    </div>\n");
        }

        html.push_str("  </div>\n");

        html.push_str("  <div class=\"footer\">\n");
        html.push_str(&format!(
            "    <p>© {} {} | 뉴스레터 구독을 감사드립니다.</p>\n",
            meta.year(),
            TITLE_PREFIX
        ));
        html.push_str("    <p>문의사항이나 제안이 있으시면 언제든지 연락해 주세요.</p>\n");
        html.push_str("  </div>\n");

        html.push_str("</div>\n</body>\n</html>");
        html
    }

    fn render_banner(banner: &BannerConfig) -> String {
        let mut html = String::new();
        html.push_str("    <div class=\"highlight-box\">\n");
        html.push_str(&format!(
            "      <div class=\"highlight-title\">{}</div>\n",
            escape_html(&banner.title)
        ));
        html.push_str(&format!(
            "      <div class=\"highlight-subtitle\">{}</div>\n",
            escape_html(&banner.subtitle)
        ));
        html.push_str(&format!(
            "      <p style=\"text-align: right; margin-top: 5px; font-size: 9pt;\"><a href=\"{}\" style=\"color: #ff5722;\">{}</a></p>\n",
            escape_html(&banner.link_url),
            escape_html(&banner.link_text)
        ));
        html.push_str("    </div>\n");
        html
    }
}

fn join_classes(base: &str, extra: &str) -> String {
    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{base} {extra}")
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
