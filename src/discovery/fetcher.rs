//! Page fetching and text extraction.
//!
//! Plain HTTP with a browser user-agent, not a headless browser. Retries on
//! 5xx and connection errors with exponential backoff plus jitter. HTML is
//! reduced to visible text (script/style dropped, whitespace collapsed) and
//! truncated before it reaches the extraction prompt.

use crate::error::{RegistryError, Result};
use rand::Rng;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/131.0.0.0 Safari/537.36";

/// Visible-text cap per page, in characters.
const MAX_TEXT_CHARS: usize = 5000;

const MAX_RETRIES: u32 = 2;

/// Text form of a fetched page.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// HTTP fetcher for organization pages.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// GET a page and reduce it to text. Retries 5xx and transport errors;
    /// any other non-success status fails the fetch.
    pub async fn fetch(&self, url: &str) -> Result<PageContent> {
        let mut retries = 0u32;
        loop {
            match self.client.get(url).send().await {
                Ok(r) => {
                    let status = r.status();
                    if status.is_server_error() && retries < MAX_RETRIES {
                        retries += 1;
                        tokio::time::sleep(backoff(retries)).await;
                        continue;
                    }
                    if !status.is_success() {
                        return Err(RegistryError::external(
                            "fetch",
                            format!("{url}: status {status}"),
                        ));
                    }
                    let html = r.text().await.unwrap_or_default();
                    let (title, text) = extract_text(&html);
                    debug!(url, chars = text.chars().count(), "fetched page");
                    return Ok(PageContent {
                        url: url.to_string(),
                        title,
                        text,
                    });
                }
                Err(e) => {
                    if retries < MAX_RETRIES {
                        retries += 1;
                        tokio::time::sleep(backoff(retries)).await;
                        continue;
                    }
                    return Err(RegistryError::external("fetch", format!("{url}: {e}")));
                }
            }
        }
    }
}

fn backoff(retries: u32) -> Duration {
    let base = 500 * 2u64.pow(retries - 1);
    let jitter = rand::thread_rng().gen_range(0..250);
    Duration::from_millis(base + jitter)
}

/// Title plus visible text, whitespace collapsed, capped at
/// `MAX_TEXT_CHARS` characters.
fn extract_text(html: &str) -> (Option<String>, String) {
    let doc = Html::parse_document(html);

    // Literal selector, cannot fail.
    let title_selector = Selector::parse("title").unwrap();
    let title = doc
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let mut raw = String::new();
    for node in doc.tree.root().descendants() {
        if let scraper::Node::Text(t) = node.value() {
            let skipped = node.ancestors().any(|a| match a.value() {
                scraper::Node::Element(el) => {
                    matches!(el.name(), "script" | "style" | "noscript")
                }
                _ => false,
            });
            if !skipped {
                raw.push_str(t);
                raw.push(' ');
            }
        }
    }

    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() > MAX_TEXT_CHARS {
        text = text.chars().take(MAX_TEXT_CHARS).collect();
    }
    (title, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_drops_script_and_style() {
        let html = r#"<html><head><title>日本ALS協会</title>
            <style>body { color: red; }</style></head>
            <body><h1>患者会の ご案内</h1>
            <script>var tracking = "nope";</script>
            <p>連絡先は  こちら</p></body></html>"#;
        let (title, text) = extract_text(html);
        assert_eq!(title.as_deref(), Some("日本ALS協会"));
        assert_eq!(text, "日本ALS協会 患者会の ご案内 連絡先は こちら");
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn test_extract_caps_text_length() {
        let body = "あ".repeat(9000);
        let html = format!("<html><body><p>{body}</p></body></html>");
        let (_, text) = extract_text(&html);
        assert_eq!(text.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_extract_without_title() {
        let (title, text) = extract_text("<html><body>本文のみ</body></html>");
        assert!(title.is_none());
        assert_eq!(text, "本文のみ");
    }
}
