//! A single breaking change between two library versions.

use crate::delta::kinds::{ChangeKind, MetadataShape};
use crate::error::{ImpactError, Result};
use crate::model::{AccessLevel, JavaType, SourceElement, SymbolRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Kind-specific data carried by a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChangeMetadata {
    None,
    Access { old: AccessLevel, new: AccessLevel },
    TypeChange { old: JavaType, new: JavaType },
    Supertypes { types: BTreeSet<String> },
}

impl ChangeMetadata {
    pub fn shape(&self) -> MetadataShape {
        match self {
            ChangeMetadata::None => MetadataShape::None,
            ChangeMetadata::Access { .. } => MetadataShape::Access,
            ChangeMetadata::TypeChange { .. } => MetadataShape::TypeChange,
            ChangeMetadata::Supertypes { .. } => MetadataShape::Supertypes,
        }
    }
}

/// Immutable record of one breaking change.
///
/// The only late write is [`BreakingChange::set_origin`], which records where
/// the subject is declared in the old library's sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingChange {
    kind: ChangeKind,
    subject: SymbolRef,
    metadata: ChangeMetadata,
    #[serde(
        default,
        rename = "origin_declaration",
        serialize_with = "serialize_origin",
        deserialize_with = "deserialize_origin"
    )]
    origin: OnceLock<SourceElement>,
}

impl BreakingChange {
    /// Creates a change after checking that `kind` can apply to the
    /// subject's declaration level.
    pub fn new(kind: ChangeKind, subject: SymbolRef, metadata: ChangeMetadata) -> Result<Self> {
        let level = subject.level();
        if !kind.applies_to(level) {
            return Err(ImpactError::InapplicableChange {
                kind,
                level,
                subject: subject.to_string(),
            });
        }
        Ok(Self {
            kind,
            subject,
            metadata,
            origin: OnceLock::new(),
        })
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn subject(&self) -> &SymbolRef {
        &self.subject
    }

    pub fn metadata(&self) -> &ChangeMetadata {
        &self.metadata
    }

    pub fn origin(&self) -> Option<&SourceElement> {
        self.origin.get()
    }

    /// Records the origin declaration. Returns `false` if one was already set.
    pub fn set_origin(&self, element: SourceElement) -> bool {
        self.origin.set(element).is_ok()
    }

    /// Checks the metadata against the kind's shape.
    pub fn check_metadata(&self) -> Result<()> {
        let expected = self.kind.metadata_shape();
        if self.metadata.shape() == expected {
            return Ok(());
        }
        Err(self.malformed(format!(
            "expected {expected:?} metadata, found {:?}",
            self.metadata.shape()
        )))
    }

    pub fn new_access(&self) -> Result<AccessLevel> {
        match &self.metadata {
            ChangeMetadata::Access { new, .. } => Ok(*new),
            _ => Err(self.malformed("missing access levels".to_string())),
        }
    }

    pub fn type_change(&self) -> Result<(&JavaType, &JavaType)> {
        match &self.metadata {
            ChangeMetadata::TypeChange { old, new } => Ok((old, new)),
            _ => Err(self.malformed("missing old/new types".to_string())),
        }
    }

    pub fn supertypes(&self) -> Result<&BTreeSet<String>> {
        match &self.metadata {
            ChangeMetadata::Supertypes { types } if !types.is_empty() => Ok(types),
            ChangeMetadata::Supertypes { .. } => {
                Err(self.malformed("empty supertype set".to_string()))
            }
            _ => Err(self.malformed("missing supertype set".to_string())),
        }
    }

    pub(crate) fn malformed(&self, reason: String) -> ImpactError {
        ImpactError::MalformedChange {
            kind: self.kind,
            subject: self.subject.to_string(),
            reason,
        }
    }
}

impl PartialEq for BreakingChange {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.subject == other.subject && self.metadata == other.metadata
    }
}

impl Eq for BreakingChange {}

impl std::fmt::Display for BreakingChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.subject)
    }
}

fn serialize_origin<S: Serializer>(
    origin: &OnceLock<SourceElement>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    origin.get().serialize(serializer)
}

fn deserialize_origin<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<OnceLock<SourceElement>, D::Error> {
    let cell = OnceLock::new();
    if let Some(element) = Option::<SourceElement>::deserialize(deserializer)? {
        let _ = cell.set(element);
    }
    Ok(cell)
}
