//! LLM-driven organization extraction.
//!
//! The model gets the disease name and the first slice of page text, and is
//! asked for a fixed JSON shape. Model output is messy: the JSON object is
//! sliced out between the first `{` and the last `}`, rows without a usable
//! name are dropped whole, and a missing URL is recovered from the page text
//! afterwards.

use crate::discovery::fetcher::PageContent;
use crate::registry::models::{NewOrganization, OrganizationCategory};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Characters of page text included in the prompt.
const PROMPT_TEXT_CHARS: usize = 3000;

/// Score assigned to every pipeline-discovered organization.
pub const DEFAULT_RELEVANCE: f64 = 90.0;

/// Placeholder name from the prompt's JSON example.
const TEMPLATE_NAME: &str = "団体名";

const PROMPT_TEMPLATE: &str = r#"以下のテキストから、「{disease_name}」に関連する患者会や支援団体の情報を抽出してください。

テキスト：
{page_text}

以下の形式でJSONを返してください：
{
  "organizations": [
    {
      "name": "団体名",
      "url": "ウェブサイトURL",
      "description": "簡単な説明",
      "contact": "連絡先情報",
      "type": "patient/family/support"
    }
  ]
}"#;

/// Extraction prompt for one page.
pub fn build_prompt(disease_name: &str, page_text: &str) -> String {
    let text: String = page_text.chars().take(PROMPT_TEXT_CHARS).collect();
    PROMPT_TEMPLATE
        .replace("{disease_name}", disease_name)
        .replace("{page_text}", &text)
}

/// One row of model output.
#[derive(Debug)]
pub enum Candidate {
    /// Usable: has a real name. Source URL is filled in by the pipeline.
    Recognized(NewOrganization),
    /// No usable name; kept only for the debug log.
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    organizations: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawOrganization {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    contact: Option<String>,
    #[serde(default, rename = "type")]
    category: Option<String>,
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse raw model output into candidates. Returns nothing when the output
/// carries no parsable JSON object.
pub fn parse_candidates(raw: &str) -> Vec<Candidate> {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }
    let payload: ExtractionPayload = match serde_json::from_str(&raw[start..=end]) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "extraction output was not valid JSON");
            return Vec::new();
        }
    };

    payload
        .organizations
        .into_iter()
        .map(|value| {
            let row: RawOrganization =
                serde_json::from_value(value.clone()).unwrap_or_default();
            let name = row.name.trim().to_string();
            if name.is_empty() || name == TEMPLATE_NAME {
                return Candidate::Unrecognized(value);
            }
            Candidate::Recognized(NewOrganization {
                name,
                url: none_if_blank(row.url),
                description: none_if_blank(row.description),
                contact: none_if_blank(row.contact),
                category: row
                    .category
                    .as_deref()
                    .and_then(OrganizationCategory::parse)
                    .unwrap_or(OrganizationCategory::Support),
                source_url: None,
                relevance_score: DEFAULT_RELEVANCE,
            })
        })
        .collect()
}

/// Whether a candidate URL needs recovery from the page.
pub fn needs_url_recovery(url: Option<&str>) -> bool {
    match url {
        None => true,
        Some(u) => u.is_empty() || u == "不明",
    }
}

/// Find a URL for an organization: first near its name in the page text,
/// then anywhere in the page, then the page's own URL.
pub fn recover_url(page: &PageContent, org_name: &str) -> String {
    if !org_name.is_empty() {
        if let Some(window) = window_around(&page.text, org_name, 500) {
            if let Some(url) = first_url_match(window) {
                return url;
            }
        }
    }
    if let Some(url) = first_url_match(&page.text) {
        return url;
    }
    page.url.clone()
}

fn url_patterns() -> Vec<Regex> {
    [
        r"(https?://[\w\.-]+\.[\w\.-]+(?:/[\w\.-]*)*)/?",
        r"(https?://www\.[\w\.-]+\.[a-zA-Z]{2,})/?",
        r"(www\.[\w\.-]+\.[a-zA-Z]{2,})/?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("url regex is valid"))
    .collect()
}

fn first_url_match(text: &str) -> Option<String> {
    for pattern in url_patterns() {
        if let Some(caps) = pattern.captures(text) {
            if let Some(m) = caps.get(1) {
                let url = m.as_str();
                return Some(if url.starts_with("http") {
                    url.to_string()
                } else {
                    format!("https://{url}")
                });
            }
        }
    }
    None
}

/// Slice of `text` spanning `radius` characters either side of the first
/// occurrence of `needle` (measured from its start).
fn window_around<'a>(text: &'a str, needle: &str, radius: usize) -> Option<&'a str> {
    let hit = text.find(needle)?;
    let start = text[..hit]
        .char_indices()
        .rev()
        .nth(radius - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = text[hit..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| hit + i)
        .unwrap_or(text.len());
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, text: &str) -> PageContent {
        PageContent {
            url: url.to_string(),
            title: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_prompt_contains_name_and_truncated_text() {
        let long_text = "あ".repeat(4000);
        let prompt = build_prompt("ファブリー病", &long_text);
        assert!(prompt.contains("「ファブリー病」"));
        assert!(prompt.contains(&"あ".repeat(3000)));
        assert!(!prompt.contains(&"あ".repeat(3001)));
        assert!(prompt.contains(r#""organizations""#));
    }

    #[test]
    fn test_parse_slices_json_out_of_chatter() {
        let raw = r#"はい、抽出しました。
```json
{"organizations": [{"name": "日本ファブリー病の会", "url": "https://fabry.example.org", "type": "patient"}]}
```
以上です。"#;
        let candidates = parse_candidates(raw);
        assert_eq!(candidates.len(), 1);
        match &candidates[0] {
            Candidate::Recognized(org) => {
                assert_eq!(org.name, "日本ファブリー病の会");
                assert_eq!(org.url.as_deref(), Some("https://fabry.example.org"));
                assert_eq!(org.category, OrganizationCategory::Patient);
                assert_eq!(org.relevance_score, DEFAULT_RELEVANCE);
            }
            Candidate::Unrecognized(_) => panic!("expected recognized"),
        }
    }

    #[test]
    fn test_parse_tolerates_garbage() {
        assert!(parse_candidates("組織は見つかりませんでした。").is_empty());
        assert!(parse_candidates("{not json}").is_empty());
        assert!(parse_candidates("").is_empty());
        // object without the organizations key
        assert!(parse_candidates(r#"{"note": "none"}"#).is_empty());
    }

    #[test]
    fn test_template_and_nameless_rows_are_unrecognized() {
        let raw = r#"{"organizations": [
            {"name": "団体名", "url": "ウェブサイトURL"},
            {"url": "https://example.org"},
            {"name": "実在の患者会"}
        ]}"#;
        let candidates = parse_candidates(raw);
        assert_eq!(candidates.len(), 3);
        assert!(matches!(candidates[0], Candidate::Unrecognized(_)));
        assert!(matches!(candidates[1], Candidate::Unrecognized(_)));
        assert!(matches!(candidates[2], Candidate::Recognized(_)));
    }

    #[test]
    fn test_unknown_category_defaults_to_support() {
        let raw = r#"{"organizations": [{"name": "会", "type": "patient/family/support"}]}"#;
        match &parse_candidates(raw)[0] {
            Candidate::Recognized(org) => {
                assert_eq!(org.category, OrganizationCategory::Support)
            }
            Candidate::Unrecognized(_) => panic!("expected recognized"),
        }
    }

    #[test]
    fn test_needs_url_recovery() {
        assert!(needs_url_recovery(None));
        assert!(needs_url_recovery(Some("")));
        assert!(needs_url_recovery(Some("不明")));
        assert!(!needs_url_recovery(Some("https://example.org")));
    }

    #[test]
    fn test_recover_url_prefers_window_near_name() {
        let filler = "この団体は難病患者の支援を行っています。".repeat(40);
        let text = format!(
            "https://far-away.example.jp {filler} 日本ALS協会 連絡先 https://alsjapan.example.org/contact {filler}"
        );
        let url = recover_url(&page("https://page.example", &text), "日本ALS協会");
        assert_eq!(url, "https://alsjapan.example.org/contact");
    }

    #[test]
    fn test_recover_url_scans_whole_page_when_name_missing() {
        let text = "お問い合わせは www.example.co.jp まで".to_string();
        let url = recover_url(&page("https://page.example", &text), "存在しない会名");
        assert_eq!(url, "https://www.example.co.jp");
    }

    #[test]
    fn test_recover_url_falls_back_to_page_url() {
        let url = recover_url(&page("https://page.example/about", "本文にURLなし"), "会");
        assert_eq!(url, "https://page.example/about");
    }
}
