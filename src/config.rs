//! Runtime configuration, read once from environment variables.
//!
//! Every knob has a default so a bare `nando serve` works against a local
//! SQLite file and a local OpenAI-compatible LLM server. Malformed numeric
//! values fall back to their defaults with a warning rather than failing
//! startup.

use crate::taxonomy::ClassifierMode;
use std::path::PathBuf;
use tracing::warn;

/// Default Google Custom Search endpoint. Overridable for tests.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Default OpenAI-compatible LLM base URL (LM Studio's default port).
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:1234/v1";

/// Default extraction model name.
pub const DEFAULT_LLM_MODEL: &str = "qwen2.5-7b-instruct-q4_k_m";

/// All runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub http_port: u16,
    pub classifier_mode: ClassifierMode,
    pub google_api_key: String,
    pub google_cse_id: String,
    pub google_endpoint: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_terms: usize,
    pub max_results_per_term: usize,
    pub result_delay_ms: u64,
}

impl Settings {
    /// Read settings from the environment, applying defaults.
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("NANDO_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_database_path()),
            http_port: env_parse("NANDO_HTTP_PORT", 8000),
            classifier_mode: std::env::var("NANDO_CLASSIFIER_MODE")
                .ok()
                .map(|v| ClassifierMode::parse_lenient(&v))
                .unwrap_or(ClassifierMode::Heuristic),
            google_api_key: env_or("GOOGLE_API_KEY", ""),
            google_cse_id: env_or("GOOGLE_CSE_ID", ""),
            google_endpoint: env_or("GOOGLE_API_ENDPOINT", DEFAULT_SEARCH_ENDPOINT),
            llm_base_url: env_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_timeout_secs: env_parse("LLM_TIMEOUT_SECS", 120),
            fetch_timeout_secs: env_parse("NANDO_FETCH_TIMEOUT_SECS", 15),
            max_terms: env_parse("NANDO_MAX_TERMS", 3),
            max_results_per_term: env_parse("NANDO_MAX_RESULTS_PER_TERM", 5),
            result_delay_ms: env_parse("NANDO_RESULT_DELAY_MS", 1000),
        }
    }

    /// Whether the web-search credentials are present.
    pub fn search_configured(&self) -> bool {
        !self.google_api_key.is_empty() && !self.google_cse_id.is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            http_port: 8000,
            classifier_mode: ClassifierMode::Heuristic,
            google_api_key: String::new(),
            google_cse_id: String::new(),
            google_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout_secs: 120,
            fetch_timeout_secs: 15,
            max_terms: 3,
            max_results_per_term: 5,
            result_delay_ms: 1000,
        }
    }
}

/// Default data location: ~/.nando/registry.db.
pub fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".nando")
        .join("registry.db")
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("ignoring malformed {key}={raw:?}, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.http_port, 8000);
        assert_eq!(s.max_terms, 3);
        assert_eq!(s.max_results_per_term, 5);
        assert_eq!(s.classifier_mode, ClassifierMode::Heuristic);
        assert!(!s.search_configured());
    }

    #[test]
    fn test_env_parse_malformed_falls_back() {
        std::env::set_var("NANDO_TEST_PORT_VALUE", "not-a-number");
        let v: u16 = env_parse("NANDO_TEST_PORT_VALUE", 8000);
        assert_eq!(v, 8000);
        std::env::remove_var("NANDO_TEST_PORT_VALUE");
    }

    #[test]
    fn test_search_configured() {
        let mut s = Settings::default();
        s.google_api_key = "key".into();
        assert!(!s.search_configured());
        s.google_cse_id = "cx".into();
        assert!(s.search_configured());
    }
}
