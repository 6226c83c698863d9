//! Data model: taxonomy nodes (diseases) and extracted support organizations.
//!
//! Timestamps are RFC 3339 strings, written by the store on insert/update.
//! `search_keywords` is persisted as a JSON array in a TEXT column and
//! surfaces here as a plain `Vec<String>`.

use serde::{Deserialize, Serialize};

/// A disease node in the NANDO taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disease {
    pub id: i64,
    /// NANDO identifier, unique when present. Import is lenient: parent
    /// links may dangle.
    pub external_id: Option<String>,
    pub name: String,
    pub name_kana: Option<String>,
    pub name_english: Option<String>,
    pub overview: Option<String>,
    /// External id of the parent node. `owl:Thing` marks a root.
    pub parent_external_id: Option<String>,
    /// Operator-curated extra query terms.
    pub search_keywords: Vec<String>,
    pub is_searchable: bool,
    pub is_designated_intractable: bool,
    pub is_chronic_childhood: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for inserting a disease row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDisease {
    pub external_id: Option<String>,
    pub name: String,
    pub name_kana: Option<String>,
    pub name_english: Option<String>,
    pub overview: Option<String>,
    pub parent_external_id: Option<String>,
    pub search_keywords: Vec<String>,
    pub is_searchable: bool,
    pub is_designated_intractable: bool,
    pub is_chronic_childhood: bool,
}

/// Partial update of curated disease fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiseaseUpdate {
    pub name: Option<String>,
    pub name_kana: Option<String>,
    pub name_english: Option<String>,
    pub overview: Option<String>,
    pub search_keywords: Option<Vec<String>>,
}

/// What kind of group an extracted organization is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationCategory {
    Patient,
    Family,
    Support,
}

impl OrganizationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Family => "family",
            Self::Support => "support",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "patient" => Some(Self::Patient),
            "family" => Some(Self::Family),
            "support" => Some(Self::Support),
            _ => None,
        }
    }
}

/// Review state of an extracted organization. Starts at `Pending`; only the
/// verification step moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A stored patient/family/support organization tied to one disease.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub disease_id: i64,
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub category: OrganizationCategory,
    /// Page the record was extracted from.
    pub source_url: Option<String>,
    pub relevance_score: f64,
    pub verification_status: VerificationStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// An extracted organization candidate, accepted by the pipeline but not
/// yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub contact: Option<String>,
    pub category: OrganizationCategory,
    pub source_url: Option<String>,
    pub relevance_score: f64,
}
