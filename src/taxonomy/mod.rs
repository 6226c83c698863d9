//! Taxonomy queries: hierarchy lookups, searchable-set selection, stats.

pub mod classifier;

pub use classifier::{ClassifierMode, ClassifierRules, HierarchyClassifier, ROOT_SENTINEL};

use crate::error::{RegistryError, Result};
use crate::registry::models::Disease;
use crate::registry::store::RegistryStore;
use serde::Serialize;

/// Compact node reference used for parents and children.
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseSummary {
    pub id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub is_searchable: bool,
}

impl From<&Disease> for DiseaseSummary {
    fn from(d: &Disease) -> Self {
        Self {
            id: d.id,
            external_id: d.external_id.clone(),
            name: d.name.clone(),
            is_searchable: d.is_searchable,
        }
    }
}

/// One node with its immediate surroundings.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyInfo {
    pub disease: Disease,
    pub parent: Option<DiseaseSummary>,
    pub children: Vec<DiseaseSummary>,
    pub is_subtype: bool,
}

/// Snapshot counters over the whole taxonomy.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyStats {
    pub total_diseases: usize,
    pub searchable_diseases: usize,
    pub excluded_categories: Vec<String>,
    /// Share of the taxonomy filtered out, formatted `"93.2%"`.
    pub reduction_rate: String,
    pub subtype_count: usize,
    pub subtype_pattern_count: usize,
}

/// The searchable set under the configured mode. Manual trusts the stored
/// flags; heuristic derives the set from the classifier rules.
pub fn searchable_diseases(
    store: &RegistryStore,
    mode: ClassifierMode,
    classifier: &HierarchyClassifier,
) -> Result<Vec<Disease>> {
    match mode {
        ClassifierMode::Manual => store.searchable_flagged(),
        ClassifierMode::Heuristic => {
            let all = store.all_diseases()?;
            let ids = classifier.compute_searchable(&all);
            Ok(all.into_iter().filter(|d| ids.contains(&d.id)).collect())
        }
    }
}

/// A disease with its resolved parent and direct children.
pub fn hierarchy_info(
    store: &RegistryStore,
    classifier: &HierarchyClassifier,
    id: i64,
) -> Result<HierarchyInfo> {
    let disease = store
        .get_disease(id)?
        .ok_or_else(|| RegistryError::not_found("disease", id))?;

    let parent = match disease.parent_external_id.as_deref() {
        Some(pid) if pid != ROOT_SENTINEL => store.get_disease_by_external_id(pid)?,
        _ => None,
    };
    let children = match disease.external_id.as_deref() {
        Some(ext) => store.children_of(ext)?,
        None => Vec::new(),
    };
    let is_subtype = classifier.is_subtype(&disease, parent.as_ref());

    Ok(HierarchyInfo {
        parent: parent.as_ref().map(DiseaseSummary::from),
        children: children.iter().map(DiseaseSummary::from).collect(),
        is_subtype,
        disease,
    })
}

/// Taxonomy-wide counters for the stats endpoint and the CLI.
pub fn hierarchy_stats(
    store: &RegistryStore,
    mode: ClassifierMode,
    classifier: &HierarchyClassifier,
) -> Result<HierarchyStats> {
    let all = store.all_diseases()?;
    let total = all.len();
    let searchable = match mode {
        ClassifierMode::Manual => all.iter().filter(|d| d.is_searchable).count(),
        ClassifierMode::Heuristic => classifier.compute_searchable(&all).len(),
    };
    let reduction_rate = if total == 0 {
        "0%".to_string()
    } else {
        format!("{:.1}%", (1.0 - searchable as f64 / total as f64) * 100.0)
    };
    Ok(HierarchyStats {
        total_diseases: total,
        searchable_diseases: searchable,
        excluded_categories: classifier.rules().excluded_categories.clone(),
        reduction_rate,
        subtype_count: classifier.count_subtypes(&all),
        subtype_pattern_count: classifier.rules().subtype_patterns.len(),
    })
}
