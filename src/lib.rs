//! Impact analysis of library evolution on client code.
//!
//! Given two versions of a library, the crate turns the raw API diff into a
//! [`Delta`] of breaking changes, resolved against the old version's source
//! model. Each change becomes a detector; one traversal per client collects
//! the [`BrokenUse`]s, the places where client code stops compiling or
//! changes behavior. Clients are analyzed in parallel and fail in isolation.
//!
//! ```no_run
//! use api_impact::{AnalysisQuery, ClientSpec, JsonDiffProvider, JsonModelProvider, LibraryVersion};
//! use std::sync::Arc;
//!
//! let query = AnalysisQuery::builder()
//!     .old(LibraryVersion::new("org.lib:core:1.0"))
//!     .new_version(LibraryVersion::new("org.lib:core:2.0"))
//!     .library("lib-1.0")
//!     .client(ClientSpec::new("app", "clients/app"))
//!     .build()?;
//! let result = api_impact::analyze(
//!     &query,
//!     &JsonDiffProvider::new("diff.json"),
//!     Arc::new(JsonModelProvider),
//! )?;
//! for client in result.broken_clients() {
//!     println!("{client} is broken");
//! }
//! # Ok::<(), api_impact::ImpactError>(())
//! ```

pub mod analysis;
pub mod compat;
pub mod config;
pub mod delta;
pub mod error;
pub mod impact;
pub mod model;
pub mod orchestrator;

pub use analysis::{AnalysisQuery, AnalysisResult, analyze, analyze_with, build_delta};
pub use compat::{ApiUse, BrokenUse, Detector, Traversal};
pub use config::AnalysisOptions;
pub use delta::{
    ApiDiffProvider, BreakingChange, ChangeKind, ChangeMetadata, Delta, JsonDiffProvider,
    LibraryVersion, RawChange,
};
pub use error::{ImpactError, Result};
pub use impact::DeltaImpact;
pub use model::{CodeModel, JsonModelProvider, SemanticModel, SourceModelProvider, SymbolRef};
pub use orchestrator::{ClientSource, ClientSpec, LocalClients, Orchestrator};
