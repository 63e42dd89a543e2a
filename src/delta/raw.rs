//! Raw entries from the binary API diff, before they are contextualized
//! into [`BreakingChange`](crate::delta::BreakingChange)s.

use crate::delta::kinds::ChangeKind;
use crate::error::{ImpactError, Result};
use crate::model::{AccessLevel, JavaType, SymbolRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Handle to one version of a library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryVersion {
    /// Coordinates such as `group:artifact:1.2.0`.
    pub coordinates: String,
    /// Compiled artifact or API description consumed by the diff provider.
    #[serde(default)]
    pub artifact: Option<PathBuf>,
}

impl LibraryVersion {
    pub fn new(coordinates: impl Into<String>) -> Self {
        Self {
            coordinates: coordinates.into(),
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }
}

impl std::fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.coordinates)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    New,
    Removed,
    Modified,
    Unchanged,
}

/// Declaration facts on one side of the diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFacet {
    #[serde(default = "present")]
    pub present: bool,
    #[serde(default)]
    pub access: Option<AccessLevel>,
    /// Field type or method return type.
    #[serde(default)]
    pub ty: Option<JavaType>,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

fn present() -> bool {
    true
}

/// One entry of the diff: a symbol and the breaking kinds reported on it.
///
/// Kinds reported on an added method (`status: new`) describe its declaring
/// type, e.g. `MEMBER_ADDED_TO_INTERFACE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    pub symbol: SymbolRef,
    pub status: EntryStatus,
    #[serde(default)]
    pub kinds: Vec<ChangeKind>,
    #[serde(default)]
    pub before: RawFacet,
    #[serde(default)]
    pub after: RawFacet,
    /// Structural anonymity flag when the provider knows it.
    #[serde(default)]
    pub anonymous: Option<bool>,
}

impl RawChange {
    pub fn new(symbol: SymbolRef, status: EntryStatus) -> Self {
        Self {
            symbol,
            status,
            kinds: Vec::new(),
            before: RawFacet {
                present: status != EntryStatus::New,
                ..RawFacet::default()
            },
            after: RawFacet {
                present: status != EntryStatus::Removed,
                ..RawFacet::default()
            },
            anonymous: None,
        }
    }

    pub fn kind(mut self, kind: ChangeKind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn access(mut self, before: AccessLevel, after: AccessLevel) -> Self {
        self.before.access = Some(before);
        self.after.access = Some(after);
        self
    }

    pub fn types(mut self, before: JavaType, after: JavaType) -> Self {
        self.before.ty = Some(before);
        self.after.ty = Some(after);
        self
    }

    pub fn superclass(mut self, before: Option<&str>, after: Option<&str>) -> Self {
        self.before.superclass = before.map(str::to_string);
        self.after.superclass = after.map(str::to_string);
        self
    }

    pub fn interfaces(mut self, before: &[&str], after: &[&str]) -> Self {
        self.before.interfaces = before.iter().map(|s| s.to_string()).collect();
        self.after.interfaces = after.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Structural flag first, binary-name heuristic otherwise.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
            .unwrap_or_else(|| crate::model::types::looks_anonymous(self.symbol.owner_type()))
    }
}

/// Compares two library versions and reports raw change entries.
pub trait ApiDiffProvider: Send + Sync {
    fn diff(&self, old: &LibraryVersion, new: &LibraryVersion) -> Result<Vec<RawChange>>;
}

/// Reads a pre-computed diff: a JSON array of [`RawChange`] entries.
#[derive(Debug, Clone)]
pub struct JsonDiffProvider {
    path: PathBuf,
}

impl JsonDiffProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(json: &str) -> Result<Vec<RawChange>> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ApiDiffProvider for JsonDiffProvider {
    fn diff(&self, _old: &LibraryVersion, _new: &LibraryVersion) -> Result<Vec<RawChange>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ImpactError::Provider(format!("failed to read diff '{}': {e}", self.path.display()))
        })?;
        Self::parse(&content)
    }
}
