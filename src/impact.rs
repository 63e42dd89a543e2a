//! Per-client impact of a delta.

use crate::compat::{ApiUse, BrokenUse};
use crate::delta::ChangeKind;
use crate::error::{ImpactError, Result};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Broken uses found in one client, or the reason its analysis failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaImpact {
    pub client: String,
    pub broken_uses: BTreeSet<BrokenUse>,
    #[serde(serialize_with = "serialize_failure")]
    pub failure: Option<ImpactError>,
}

impl DeltaImpact {
    pub fn success(client: impl Into<String>, broken_uses: BTreeSet<BrokenUse>) -> Self {
        Self {
            client: client.into(),
            broken_uses,
            failure: None,
        }
    }

    pub fn failure(client: impl Into<String>, error: ImpactError) -> Self {
        Self {
            client: client.into(),
            broken_uses: BTreeSet::new(),
            failure: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub fn is_broken(&self) -> bool {
        !self.broken_uses.is_empty()
    }

    /// Number of broken uses per change kind.
    pub fn summary(&self) -> BTreeMap<ChangeKind, usize> {
        let mut summary = BTreeMap::new();
        for broken in &self.broken_uses {
            *summary.entry(broken.kind).or_insert(0) += 1;
        }
        summary
    }

    pub fn uses_of(&self, api_use: ApiUse) -> impl Iterator<Item = &BrokenUse> {
        self.broken_uses.iter().filter(move |b| b.api_use == api_use)
    }

    /// SHA-256 of the canonical JSON form of the broken-use set. Two runs
    /// over the same inputs yield the same fingerprint.
    pub fn fingerprint(&self) -> Result<String> {
        let json_string = serde_json::to_string_pretty(&self.broken_uses)?;

        let mut hasher = Sha256::new();
        hasher.update(json_string.as_bytes());
        let hash_result = hasher.finalize();

        Ok(format!("{:x}", hash_result))
    }
}

fn serialize_failure<S: Serializer>(
    failure: &Option<ImpactError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match failure {
        Some(error) => {
            let mut state = serializer.serialize_struct("Failure", 2)?;
            state.serialize_field("code", error.code())?;
            state.serialize_field("message", &error.to_string())?;
            state.end()
        }
        None => serializer.serialize_none(),
    }
}
