//! Heuristic searchable-disease classification.
//!
//! A disease is worth searching for organizations when it is a concrete
//! leaf-like entry: not an administrative grouping, not an excluded broad
//! category, and not a subtype variant of a parent disease. The rules here
//! mirror the curation practice for the NANDO taxonomy.

use crate::registry::models::Disease;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Parent id marking a taxonomy root. Nodes pointing at it have no parent.
pub const ROOT_SENTINEL: &str = "owl:Thing";

/// Broad administrative categories never offered for search. These names
/// match taxonomy grouping nodes, not concrete diseases.
const EXCLUDED_CATEGORIES: [&str; 19] = [
    "遺伝検査用疾患群",
    "指定難病",
    "神経・筋疾患",
    "代謝系疾患",
    "皮膚・結合組織疾患",
    "免疫系疾患",
    "循環器系疾患",
    "血液系疾患",
    "腎・泌尿器系疾患",
    "骨・関節系疾患",
    "内分泌系疾患",
    "呼吸器系疾患",
    "視覚系疾患",
    "聴覚・平衡機能系疾患",
    "消化器系疾患",
    "染色体または遺伝子に変化を伴う症候群",
    "耳鼻科系疾患",
    "難病",
    "小児慢性特定疾病",
];

/// Name patterns identifying subtype variants (type I/II, congenital,
/// acute/chronic, severity). Order matters only for reporting; matching is
/// any-of.
const SUBTYPE_PATTERNS: [&str; 20] = [
    r"^.+[IⅠ1一][型]?$",
    r"^.+[IIⅡ2二][型]?$",
    r"^.+[IIIⅢ3三][型]?$",
    r"^.+[IVⅣ4四][型]?$",
    r"^.+[VⅤ5五][型]?$",
    r"^.+タイプ[1-9]$",
    r"^.+[型][A-Z]$",
    r"脱髄型.+$",
    r"軸索型.+$",
    r"中間型.+$",
    r"^.+早期発症型$",
    r"^.+遅発型$",
    r"^.+先天性$",
    r"^.+後天性$",
    r"^.+家族性$",
    r"^.+孤発性$",
    r"^.+急性$",
    r"^.+慢性$",
    r"^.+重症型$",
    r"^.+軽症型$",
];

/// Sub-entry identifiers carry a dotted suffix (`NANDO:1234.5`).
const SUBENTRY_ID: &str = r"NANDO:\d+\.\d+";

/// How the searchable set is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    /// Derive the set from the taxonomy rules below.
    Heuristic,
    /// Trust only the operator-set `is_searchable` flags.
    Manual,
}

impl ClassifierMode {
    /// Lenient parse: anything that is not `manual` is heuristic.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Self::Manual,
            _ => Self::Heuristic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Manual => "manual",
        }
    }
}

/// Compiled classification rules.
pub struct ClassifierRules {
    pub excluded_categories: Vec<String>,
    pub subtype_patterns: Vec<Regex>,
    pub subentry_id: Regex,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        // Patterns are literals, compilation cannot fail.
        Self {
            excluded_categories: EXCLUDED_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            subtype_patterns: SUBTYPE_PATTERNS
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
            subentry_id: Regex::new(SUBENTRY_ID).unwrap(),
        }
    }
}

/// Classifier over a taxonomy snapshot.
pub struct HierarchyClassifier {
    rules: ClassifierRules,
    excluded_names: HashSet<String>,
}

impl Default for HierarchyClassifier {
    fn default() -> Self {
        Self::new(ClassifierRules::default())
    }
}

impl HierarchyClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        let excluded_names = rules.excluded_categories.iter().cloned().collect();
        Self {
            rules,
            excluded_names,
        }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Whether a disease is a subtype variant. Checks the sub-entry id
    /// pattern, the name patterns, and finally the name-variant rule: the
    /// resolved parent's name contained in a strictly longer child name.
    pub fn is_subtype(&self, disease: &Disease, parent: Option<&Disease>) -> bool {
        if let Some(id) = &disease.external_id {
            if self.rules.subentry_id.is_match(id) {
                return true;
            }
        }
        if self
            .rules
            .subtype_patterns
            .iter()
            .any(|p| p.is_match(&disease.name))
        {
            return true;
        }
        if let Some(parent) = parent {
            if disease.name.contains(&parent.name) && disease.name.len() > parent.name.len() {
                return true;
            }
        }
        false
    }

    /// External ids excluded by category, propagated down the tree until the
    /// set stops growing. Descendants of an excluded grouping are excluded
    /// no matter how deep they sit.
    fn excluded_external_ids(&self, diseases: &[Disease]) -> HashSet<String> {
        let mut excluded: HashSet<String> = diseases
            .iter()
            .filter(|d| self.excluded_names.contains(&d.name))
            .filter_map(|d| d.external_id.clone())
            .collect();
        loop {
            let mut grew = false;
            for d in diseases {
                let Some(id) = &d.external_id else { continue };
                if excluded.contains(id) {
                    continue;
                }
                if let Some(parent) = &d.parent_external_id {
                    if excluded.contains(parent) {
                        excluded.insert(id.clone());
                        grew = true;
                    }
                }
            }
            if !grew {
                break;
            }
        }
        excluded
    }

    /// Ids of diseases that should be searchable under the heuristic rules:
    /// not excluded, not a subtype, and either childless or a parent whose
    /// children are all subtype variants of it.
    pub fn compute_searchable(&self, diseases: &[Disease]) -> HashSet<i64> {
        let by_external = index_by_external(diseases);
        let mut children: HashMap<&str, Vec<&Disease>> = HashMap::new();
        for d in diseases {
            if let Some(parent) = d.parent_external_id.as_deref() {
                if parent != ROOT_SENTINEL {
                    children.entry(parent).or_default().push(d);
                }
            }
        }
        let excluded_ids = self.excluded_external_ids(diseases);

        let mut searchable = HashSet::new();
        for d in diseases {
            if self.excluded_names.contains(&d.name) {
                continue;
            }
            if d.external_id
                .as_deref()
                .is_some_and(|id| excluded_ids.contains(id))
            {
                continue;
            }
            if d.parent_external_id
                .as_deref()
                .is_some_and(|p| excluded_ids.contains(p))
            {
                continue;
            }
            if self.is_subtype(d, resolve_parent(d, &by_external)) {
                continue;
            }
            let leaf_like = match d.external_id.as_deref().and_then(|id| children.get(id)) {
                None => true,
                Some(kids) => kids.iter().all(|c| self.is_subtype(c, Some(d))),
            };
            if leaf_like {
                searchable.insert(d.id);
            }
        }
        searchable
    }

    /// How many diseases in the snapshot are subtype variants.
    pub fn count_subtypes(&self, diseases: &[Disease]) -> usize {
        let by_external = index_by_external(diseases);
        diseases
            .iter()
            .filter(|d| self.is_subtype(d, resolve_parent(d, &by_external)))
            .count()
    }
}

fn index_by_external(diseases: &[Disease]) -> HashMap<&str, &Disease> {
    diseases
        .iter()
        .filter_map(|d| d.external_id.as_deref().map(|id| (id, d)))
        .collect()
}

fn resolve_parent<'a>(
    disease: &Disease,
    by_external: &HashMap<&str, &'a Disease>,
) -> Option<&'a Disease> {
    disease
        .parent_external_id
        .as_deref()
        .filter(|p| *p != ROOT_SENTINEL)
        .and_then(|p| by_external.get(p).copied())
}
