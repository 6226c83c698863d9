//! Disease and organization records plus the SQLite store behind them.

pub mod models;
pub mod store;

pub use models::{
    Disease, DiseaseUpdate, NewDisease, NewOrganization, Organization, OrganizationCategory,
    VerificationStatus,
};
pub use store::{RegistryStore, UpsertOutcome};
