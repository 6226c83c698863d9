//! Organization discovery for searchable diseases.

pub mod dedup;
pub mod extractor;
pub mod fetcher;
pub mod pipeline;
pub mod terms;
pub mod websearch;

pub use pipeline::{DiscoveryPipeline, RunReport, RunState, RunStatus, SweepReport};
pub use websearch::{GoogleSearch, SearchResult, WebSearch};
