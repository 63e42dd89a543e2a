//! The delta between two library versions: the breaking changes a client
//! may be exposed to.

pub mod change;
pub mod kinds;
pub mod mapper;
pub mod raw;

pub use change::{BreakingChange, ChangeMetadata};
pub use kinds::{ChangeKind, MetadataShape};
pub use raw::{ApiDiffProvider, EntryStatus, JsonDiffProvider, LibraryVersion, RawChange, RawFacet};

use crate::compat::{Detector, make_detector};
use crate::config::AnalysisOptions;
use crate::error::Result;
use crate::model::{SemanticModel, SymbolRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Why a raw entry did not make it into the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Anonymous classes cannot be referenced from client code.
    Anonymous,
    /// Types and members that only exist in the new version.
    NewDeclaration,
    /// Kind excluded by the analysis options.
    Excluded,
    /// Symbol not found in the old library's model.
    UnresolvedSymbol,
    /// Deprecation reported on a member the source model does not expose.
    DeprecatedMemberInvisible,
    /// `values()`/`valueOf()` of an enum.
    SyntheticEnumMember,
    /// Supertype change inherited through another supertype: no direct
    /// superclass or interface edge differs between the two versions.
    IndirectSupertype,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub symbol: SymbolRef,
    pub kind: Option<ChangeKind>,
    pub reason: SkipReason,
}

/// Breaking changes between `old` and `new`, resolved against the old
/// version's model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delta {
    pub old: LibraryVersion,
    pub new: LibraryVersion,
    changes: Vec<BreakingChange>,
    #[serde(default)]
    skipped: Vec<SkippedEntry>,
}

impl Delta {
    pub fn new(old: LibraryVersion, new: LibraryVersion, changes: Vec<BreakingChange>) -> Self {
        let mut delta = Self {
            old,
            new,
            changes: Vec::with_capacity(changes.len()),
            skipped: Vec::new(),
        };
        for change in changes {
            delta.push(change);
        }
        delta
    }

    /// Builds a delta from raw diff entries.
    ///
    /// Anonymous classes, new declarations, synthetic enum members and
    /// excluded kinds are dropped. Remaining entries must resolve in
    /// `library` (the old version's model); unresolved ones are skipped with
    /// a warning, as are supertype changes with no direct edge to attach to.
    /// Entries missing the access or type facets a kind needs, or kinds
    /// attached to the wrong declaration level, fail the whole delta.
    pub fn from_raw(
        old: LibraryVersion,
        new: LibraryVersion,
        entries: &[RawChange],
        library: &dyn SemanticModel,
        options: &AnalysisOptions,
    ) -> Result<Self> {
        let start = Instant::now();
        let mut delta = Self::new(old, new, Vec::new());

        for entry in entries {
            if entry.kinds.is_empty() {
                continue;
            }
            if entry.is_anonymous() {
                delta.skip(&entry.symbol, None, SkipReason::Anonymous);
                continue;
            }
            if mapper::is_synthetic_enum_member(entry, library) {
                delta.skip(&entry.symbol, None, SkipReason::SyntheticEnumMember);
                continue;
            }
            if entry.status == EntryStatus::New && !mapper::is_added_method(entry) {
                delta.skip(&entry.symbol, None, SkipReason::NewDeclaration);
                continue;
            }

            let subject = mapper::subject_of(entry);
            for kind in &entry.kinds {
                if options.is_excluded(*kind) {
                    delta.skip(&entry.symbol, Some(*kind), SkipReason::Excluded);
                    continue;
                }
                if !library.resolves(&subject) {
                    let reason = if *kind == ChangeKind::AnnotationDeprecatedAdded {
                        debug!(symbol = %subject, "Deprecated member not visible in the library model");
                        SkipReason::DeprecatedMemberInvisible
                    } else {
                        warn!(symbol = %subject, kind = %kind, "Couldn't resolve symbol in the library model");
                        SkipReason::UnresolvedSymbol
                    };
                    delta.skip(&entry.symbol, Some(*kind), reason);
                    continue;
                }
                if kind.metadata_shape() == MetadataShape::Supertypes
                    && mapper::supertype_delta(entry, *kind).is_empty()
                {
                    warn!(symbol = %subject, kind = %kind, "No direct supertype edge changed");
                    delta.skip(&entry.symbol, Some(*kind), SkipReason::IndirectSupertype);
                    continue;
                }
                delta.push(mapper::to_change(entry, *kind)?);
            }
        }

        info!(
            old = %delta.old,
            new = %delta.new,
            changes = delta.changes.len(),
            skipped = delta.skipped.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Delta built"
        );
        Ok(delta)
    }

    fn push(&mut self, change: BreakingChange) {
        if !self.changes.contains(&change) {
            self.changes.push(change);
        }
    }

    fn skip(&mut self, symbol: &SymbolRef, kind: Option<ChangeKind>, reason: SkipReason) {
        self.skipped.push(SkippedEntry {
            symbol: symbol.clone(),
            kind,
            reason,
        });
    }

    /// Records where each change's subject is declared in the old library's
    /// sources. Returns the changes that could not be located.
    pub fn populate_locations(&self, sources: &dyn SemanticModel) -> Vec<SkippedEntry> {
        let mut unmapped = Vec::new();
        for change in &self.changes {
            if change.origin().is_some() {
                continue;
            }
            match mapper::locate(sources, change.subject()) {
                Some(element) => {
                    change.set_origin(element);
                }
                None => {
                    let reason = if change.kind() == ChangeKind::AnnotationDeprecatedAdded {
                        SkipReason::DeprecatedMemberInvisible
                    } else {
                        SkipReason::UnresolvedSymbol
                    };
                    warn!(change = %change, "Couldn't locate change in library sources");
                    unmapped.push(SkippedEntry {
                        symbol: change.subject().clone(),
                        kind: Some(change.kind()),
                        reason,
                    });
                }
            }
        }
        unmapped
    }

    pub fn changes(&self) -> &[BreakingChange] {
        &self.changes
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes per kind.
    pub fn summary(&self) -> BTreeMap<ChangeKind, usize> {
        let mut summary = BTreeMap::new();
        for change in &self.changes {
            *summary.entry(change.kind()).or_insert(0) += 1;
        }
        summary
    }

    /// A fresh detector set, in change order. Kinds without a detector are
    /// left out.
    pub fn detectors(&self) -> Result<Vec<Detector<'_>>> {
        let mut detectors = Vec::with_capacity(self.changes.len());
        for change in &self.changes {
            if let Some(detector) = make_detector(change)? {
                detectors.push(detector);
            }
        }
        Ok(detectors)
    }
}
