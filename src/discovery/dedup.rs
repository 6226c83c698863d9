//! Run-scoped duplicate suppression for extracted organizations.
//!
//! The same organization surfaces on many pages under slightly different
//! names. Names are normalized (whitespace, hyphens, and bracket characters
//! stripped, lowercased) and compared by bidirectional containment, so
//! `日本ALS協会` and `日本ALS協会（本部）` collapse. Template echo rows the
//! model sometimes returns verbatim are rejected outright.

use crate::registry::models::NewOrganization;

/// Placeholder name the extraction prompt uses in its JSON example.
const TEMPLATE_NAME: &str = "団体名";
/// Placeholder URL from the same example.
const TEMPLATE_URL: &str = "ウェブサイトURL";

/// Strip whitespace and bracket/hyphen punctuation, lowercase the rest.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '　' | '-' | '(' | ')' | '（' | '）'))
        .collect::<String>()
        .to_lowercase()
}

/// Whether a candidate should be dropped given the organizations already
/// accepted in this run.
pub fn is_duplicate(candidate: &NewOrganization, accepted: &[NewOrganization]) -> bool {
    let name = candidate.name.trim();
    if name.is_empty() || name == TEMPLATE_NAME {
        return true;
    }
    if candidate.url.as_deref() == Some(TEMPLATE_URL) {
        return true;
    }

    let norm = normalize_name(name);
    for seen in accepted {
        let seen_norm = normalize_name(&seen.name);
        if !norm.is_empty()
            && !seen_norm.is_empty()
            && (norm.contains(&seen_norm) || seen_norm.contains(&norm))
        {
            return true;
        }
        if let (Some(a), Some(b)) = (candidate.contact.as_deref(), seen.contact.as_deref()) {
            if !a.is_empty() && a == b {
                return true;
            }
        }
    }
    false
}
