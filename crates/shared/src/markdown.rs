//! Markdown-subset to HTML conversion for generated section bodies.
//!
//! The passes run in a fixed order and each one works on the output of the
//! previous pass: bold must be replaced before italic, and paragraph
//! segmentation relies on the `<h`/`<li>` tags produced earlier.
//! Text outside the supported subset passes through unchanged.

use std::sync::LazyLock;

use regex::Regex;

/// Accent color used for `[강조]...[/강조]` highlight spans.
pub const HIGHLIGHT_COLOR: &str = "#e74c3c";

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.*)$").expect("valid regex"));
static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## (.*)$").expect("valid regex"));
static H3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^### (.*)$").expect("valid regex"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("valid regex"));
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^- (.*?)$").expect("valid regex"));
static HIGHLIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[강조\](.*?)\[/강조\]").expect("valid regex"));

/// Convert markdown-subset text into structural HTML.
pub fn to_html(text: &str) -> String {
    let mut html = convert_headings(text);
    html = convert_bold(&html);
    html = convert_italic(&html);
    html = convert_links(&html);
    html = convert_list_items(&html);
    html = convert_highlights(&html);
    wrap_blocks(&html)
}

fn convert_headings(text: &str) -> String {
    let text = H1_RE.replace_all(text, "<h1>${1}</h1>");
    let text = H2_RE.replace_all(&text, "<h2>${1}</h2>");
    H3_RE.replace_all(&text, "<h3>${1}</h3>").into_owned()
}

fn convert_bold(text: &str) -> String {
    BOLD_RE
        .replace_all(text, "<strong>${1}</strong>")
        .into_owned()
}

fn convert_italic(text: &str) -> String {
    ITALIC_RE.replace_all(text, "<em>${1}</em>").into_owned()
}

fn convert_links(text: &str) -> String {
    LINK_RE
        .replace_all(text, "<a href=\"${2}\">${1}</a>")
        .into_owned()
}

fn convert_list_items(text: &str) -> String {
    LIST_ITEM_RE.replace_all(text, "<li>${1}</li>").into_owned()
}

fn convert_highlights(text: &str) -> String {
    let replacement =
        format!("<span style=\"color:{HIGHLIGHT_COLOR}; font-weight:bold;\">${{1}}</span>");
    HIGHLIGHT_RE
        .replace_all(text, replacement.as_str())
        .into_owned()
}

/// Split on blank lines and wrap each block.
///
/// Heading-led blocks stay as they are. Any block holding list items,
/// including one that starts with a list item, becomes a single `<ul>`;
/// prose lines inside such a block are not paragraph-wrapped. Everything
/// else becomes a `<p>`. Remaining newlines turn into `<br>`.
fn wrap_blocks(text: &str) -> String {
    text.split("\n\n")
        .map(|block| {
            let wrapped = if block.starts_with("<h") {
                block.to_string()
            } else if block.contains("<li>") {
                format!("<ul>{block}</ul>")
            } else {
                format!("<p>{block}</p>")
            };
            wrapped.replace('\n', "<br>")
        })
        .collect()
}
