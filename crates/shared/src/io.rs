use std::fs;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use tracing::warn;

use crate::error::{NewsletterError, Result};
use crate::models::{DocumentSummary, SectionKind, SUMMARY_VERSION};

/// Sidecar file name for an issue's metadata.
pub fn summary_file_name(issue_number: u32) -> String {
    format!("aidt-weekly-{:04}.json", issue_number)
}

/// Save issue metadata next to the HTML.
pub fn save_summary(summary: &DocumentSummary, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| NewsletterError::io(dir, e))?;
    let filepath = dir.join(summary_file_name(summary.issue_number));

    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| NewsletterError::invalid_data(&filepath, e.to_string()))?;

    fs::write(&filepath, json).map_err(|e| NewsletterError::io(&filepath, e))?;
    Ok(filepath)
}

/// Load and validate a metadata sidecar.
pub fn load_summary(filepath: &Path) -> Result<DocumentSummary> {
    let content = fs::read_to_string(filepath).map_err(|e| NewsletterError::io(filepath, e))?;

    let summary: DocumentSummary = serde_json::from_str(&content).map_err(|e| {
        NewsletterError::invalid_data(filepath, format!("failed to parse issue metadata: {e}"))
    })?;

    if summary.version != SUMMARY_VERSION {
        return Err(NewsletterError::invalid_data(
            filepath,
            format!(
                "unsupported metadata version {} (expected {SUMMARY_VERSION})",
                summary.version
            ),
        ));
    }

    if summary.sections.len() != SectionKind::ALL.len() {
        return Err(NewsletterError::invalid_data(
            filepath,
            format!(
                "metadata lists {} sections, expected {}",
                summary.sections.len(),
                SectionKind::ALL.len()
            ),
        ));
    }

    Ok(summary)
}

/// All readable sidecars in `dir`, newest first. Unreadable files are skipped.
pub fn list_summaries(dir: &Path) -> Result<Vec<(PathBuf, DocumentSummary)>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }

    for entry in fs::read_dir(dir).map_err(|e| NewsletterError::io(dir, e))? {
        let path = entry.map_err(|e| NewsletterError::io(dir, e))?.path();
        let is_sidecar = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("aidt-weekly-") && n.ends_with(".json"))
            .unwrap_or(false);
        if !is_sidecar {
            continue;
        }

        match load_summary(&path) {
            Ok(summary) => files.push((path, summary)),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable metadata"),
        }
    }

    files.sort_by(|a, b| {
        let time_a = DateTime::parse_from_rfc3339(&a.1.created_at).ok();
        let time_b = DateTime::parse_from_rfc3339(&b.1.created_at).ok();
        time_b.cmp(&time_a)
    });

    Ok(files)
}

/// One past the highest issue number saved in `dir`, or 1.
pub fn next_issue_number(dir: &Path) -> Result<u32> {
    Ok(list_summaries(dir)?
        .iter()
        .map(|(_, s)| s.issue_number)
        .max()
        .map_or(1, |n| n.saturating_add(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SectionStatus, SectionSummary};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aidt-io-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn summary(issue_number: u32, created_at: &str) -> DocumentSummary {
        DocumentSummary {
            version: SUMMARY_VERSION.to_string(),
            issue_number,
            date: "2026년 02월 01일".to_string(),
            created_at: created_at.to_string(),
            notice: None,
            sections: SectionKind::ALL
                .iter()
                .map(|k| SectionSummary {
                    key: *k,
                    title: k.title().to_string(),
                    status: SectionStatus::Ok,
                    error: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = temp_dir("roundtrip");
        let path = save_summary(&summary(4, "2026-02-01T12:00:00+09:00"), &dir).unwrap();
        assert!(path.ends_with("aidt-weekly-0004.json"));

        let loaded = load_summary(&path).unwrap();
        assert_eq!(loaded.issue_number, 4);
        assert_eq!(loaded.sections[1].key, SectionKind::AidtTips);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_wrong_version() {
        let dir = temp_dir("version");
        let mut s = summary(1, "2026-02-01T12:00:00+09:00");
        s.version = "0.9".to_string();
        let path = save_summary(&s, &dir).unwrap();

        let err = load_summary(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported metadata version"));
        assert!(matches!(
            &err,
            NewsletterError::Io { source, .. } if source.kind() == std::io::ErrorKind::InvalidData
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_bad_json_and_section_count() {
        let dir = temp_dir("invalid");
        fs::create_dir_all(&dir).unwrap();
        let garbage = dir.join("aidt-weekly-0001.json");
        fs::write(&garbage, "{ not json").unwrap();
        let err = load_summary(&garbage).unwrap_err();
        assert!(matches!(err, NewsletterError::Io { .. }));
        assert!(!matches!(err, NewsletterError::Configuration(_)));

        let mut s = summary(2, "2026-02-01T12:00:00+09:00");
        s.sections.pop();
        let path = save_summary(&s, &dir).unwrap();
        let err = load_summary(&path).unwrap_err();
        assert!(err.to_string().contains("metadata lists 4 sections, expected 5"));
        assert!(matches!(err, NewsletterError::Io { .. }));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_list_newest_first_and_next_issue() {
        let dir = temp_dir("list");
        save_summary(&summary(1, "2026-01-01T09:00:00+09:00"), &dir).unwrap();
        save_summary(&summary(2, "2026-01-08T09:00:00+09:00"), &dir).unwrap();
        fs::write(dir.join("notes.txt"), "ignore me").unwrap();

        let listed = list_summaries(&dir).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].1.issue_number, 2);
        assert_eq!(next_issue_number(&dir).unwrap(), 3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_next_issue_in_missing_dir_is_one() {
        let dir = temp_dir("missing");
        assert_eq!(next_issue_number(&dir).unwrap(), 1);
    }
}
