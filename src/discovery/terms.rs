//! Search term generation for a disease.
//!
//! Terms are the disease name (plus english name and curated keywords when
//! present) combined with organization suffixes matching the script of each
//! base term. First occurrence wins, insertion order is kept, so downstream
//! caps always hit the primary name's terms first.

use crate::registry::models::Disease;
use std::collections::HashSet;

const JA_SUFFIXES: [&str; 6] = [
    "患者会",
    "患者の会",
    "家族会",
    "支援団体",
    "支援グループ",
    "協会",
];

const EN_SUFFIXES: [&str; 4] = ["patient association", "support group", "foundation", "society"];

/// Any Hiragana, Katakana, or CJK ideograph marks a Japanese term.
pub fn contains_japanese(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, 'ぁ'..='ん' | 'ァ'..='ン' | '一'..='龥'))
}

/// Queries for one disease, deduplicated, in generation order.
pub fn generate_terms(disease: &Disease) -> Vec<String> {
    let mut bases: Vec<&str> = vec![disease.name.as_str()];
    if let Some(en) = disease.name_english.as_deref() {
        if !en.trim().is_empty() {
            bases.push(en);
        }
    }
    for keyword in &disease.search_keywords {
        if !keyword.trim().is_empty() {
            bases.push(keyword);
        }
    }

    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for base in bases {
        let suffixes: &[&str] = if contains_japanese(base) {
            &JA_SUFFIXES
        } else {
            &EN_SUFFIXES
        };
        for suffix in suffixes {
            let term = format!("{base} {suffix}");
            if seen.insert(term.clone()) {
                terms.push(term);
            }
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disease(name: &str, english: Option<&str>, keywords: &[&str]) -> Disease {
        Disease {
            id: 1,
            external_id: None,
            name: name.to_string(),
            name_kana: None,
            name_english: english.map(String::from),
            overview: None,
            parent_external_id: None,
            search_keywords: keywords.iter().map(|s| s.to_string()).collect(),
            is_searchable: true,
            is_designated_intractable: false,
            is_chronic_childhood: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_japanese_name_gets_japanese_suffixes() {
        let terms = generate_terms(&disease("筋萎縮性側索硬化症", None, &[]));
        assert_eq!(terms.len(), 6);
        assert_eq!(terms[0], "筋萎縮性側索硬化症 患者会");
        assert_eq!(terms[5], "筋萎縮性側索硬化症 協会");
    }

    #[test]
    fn test_latin_name_gets_english_suffixes() {
        let terms = generate_terms(&disease("Fabry disease", None, &[]));
        assert_eq!(terms.len(), 4);
        assert_eq!(terms[0], "Fabry disease patient association");
        assert!(terms.iter().all(|t| t.starts_with("Fabry disease ")));
    }

    #[test]
    fn test_script_detection() {
        assert!(contains_japanese("パーキンソン病"));
        assert!(contains_japanese("もやもや病"));
        assert!(contains_japanese("ALSと生きる")); // mixed counts as Japanese
        assert!(!contains_japanese("ALS"));
        assert!(!contains_japanese(""));
    }

    #[test]
    fn test_bases_fold_in_english_and_keywords() {
        let terms = generate_terms(&disease(
            "ファブリー病",
            Some("Fabry disease"),
            &["ライソゾーム病"],
        ));
        // 6 ja + 4 en + 6 ja
        assert_eq!(terms.len(), 16);
        // primary name first so caps prefer it
        assert_eq!(terms[0], "ファブリー病 患者会");
        assert!(terms.contains(&"Fabry disease society".to_string()));
        assert!(terms.contains(&"ライソゾーム病 家族会".to_string()));
    }

    #[test]
    fn test_duplicate_bases_collapse() {
        let terms = generate_terms(&disease("もやもや病", None, &["もやもや病", " "]));
        assert_eq!(terms.len(), 6);
    }
}
