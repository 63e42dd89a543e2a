//! Error taxonomy for delta construction, detection and client orchestration.

use crate::delta::ChangeKind;
use crate::model::DeclarationLevel;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, ImpactError>;

/// Errors raised while building a delta or analyzing a client.
///
/// Variants carry owned strings so a failure can be cloned into the
/// per-client [`DeltaImpact`](crate::impact::DeltaImpact) record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImpactError {
    /// Absent delta, missing version or a client root that is not a source tree.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A change kind was attached to a declaration level it cannot apply to.
    #[error("{kind} cannot apply to a {level} declaration ({subject})")]
    InapplicableChange {
        kind: ChangeKind,
        level: DeclarationLevel,
        subject: String,
    },

    /// The metadata carried by a change does not have the kind's shape.
    #[error("Malformed {kind} change on {subject}: {reason}")]
    MalformedChange {
        kind: ChangeKind,
        subject: String,
        reason: String,
    },

    /// A type reference was found in a syntactic role with no `ApiUse` mapping.
    #[error("Unmanaged reference role: {0}")]
    UnmanagedRole(String),

    /// No expected-type rule exists for the enclosing syntactic context.
    #[error("Unhandled enclosing context {context} at {location}")]
    UnhandledContext { context: String, location: String },

    /// A client phase ran past its deadline.
    #[error("{phase} timed out after {seconds}s")]
    Timeout { phase: String, seconds: u64 },

    /// An external collaborator (diff or source model provider, client source) failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Client analysis panicked; the payload message is kept.
    #[error("Client analysis panicked: {0}")]
    Panicked(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImpactError {
    /// Stable machine-readable code for reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InapplicableChange { .. } => "INAPPLICABLE_CHANGE",
            Self::MalformedChange { .. } => "MALFORMED_CHANGE",
            Self::UnmanagedRole(_) => "UNMANAGED_ROLE",
            Self::UnhandledContext { .. } => "UNHANDLED_CONTEXT",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Provider(_) => "PROVIDER",
            Self::Panicked(_) => "PANICKED",
            Self::Config(_) => "CONFIG",
        }
    }

    /// True for errors that indicate a bug in this crate rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::InapplicableChange { .. }
                | Self::MalformedChange { .. }
                | Self::UnmanagedRole(_)
                | Self::UnhandledContext { .. }
        )
    }
}

impl From<std::io::Error> for ImpactError {
    fn from(e: std::io::Error) -> Self {
        Self::Provider(e.to_string())
    }
}

impl From<serde_json::Error> for ImpactError {
    fn from(e: serde_json::Error) -> Self {
        Self::Provider(e.to_string())
    }
}
