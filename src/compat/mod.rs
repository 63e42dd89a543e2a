//! Broken-use detection.
//!
//! Each breaking change is turned into a detector by the [`registry`]; a
//! [`Traversal`] then runs the detector set over one client's source tree
//! and collects the [`BrokenUse`]s it reports.

pub mod detector;
pub mod engine;
pub mod field_rules;
pub mod handlers;
pub mod method_rules;
pub mod registry;
pub mod roles;
pub mod type_rules;
pub mod types;

pub use detector::{Detector, Rule};
pub use engine::{Deadline, Traversal};
pub use registry::{make_detector, supported_kinds, verify_registry};
pub use roles::classify;
pub use types::{ApiUse, BrokenUse, BrokenUseSink};
