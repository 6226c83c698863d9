//! Error taxonomy for the registry.
//!
//! Heuristic code (classifier, deduplicator, term generator) never returns
//! these: absence of a match is `false` or an empty collection. Errors are
//! reserved for missing entities, malformed operator input, external-service
//! failures, and the store.

use thiserror::Error;

/// Errors surfaced by registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// An entity id did not resolve. Carries what was looked up and the id.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// Malformed operator input (bad columns, bad flag values). The
    /// operation that raised this performed zero writes.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A search API, page fetch, or LLM call failed. Inside the discovery
    /// pipeline these are caught per result and skipped; they only escape
    /// when a run cannot start at all.
    #[error("{service} error: {reason}")]
    ExternalService { service: &'static str, reason: String },

    /// SQLite failure. A failed batch commit rolls back the whole batch.
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl RegistryError {
    /// Shorthand for a NotFound on a numeric id.
    pub fn not_found(what: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            what,
            id: id.to_string(),
        }
    }

    /// Shorthand for an ExternalService error.
    pub fn external(service: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::ExternalService {
            service,
            reason: reason.to_string(),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, RegistryError>;
