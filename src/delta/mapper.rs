//! Mapping between raw diff entries, breaking changes and library sources.

use crate::delta::change::{BreakingChange, ChangeMetadata};
use crate::delta::kinds::{ChangeKind, MetadataShape};
use crate::delta::raw::{EntryStatus, RawChange};
use crate::error::{ImpactError, Result};
use crate::model::{DeclarationLevel, SemanticModel, SourceElement, SymbolRef};
use std::collections::BTreeSet;

/// Compiler-generated members of every enum; never part of a delta.
const SYNTHETIC_ENUM_MEMBERS: &[&str] = &["values", "valueOf"];

/// Whether `entry` is a method that exists only in the new version.
/// Kinds reported on such entries are attached to the declaring type.
pub fn is_added_method(entry: &RawChange) -> bool {
    entry.status == EntryStatus::New && entry.symbol.level() == DeclarationLevel::Executable
}

pub fn is_synthetic_enum_member(entry: &RawChange, library: &dyn SemanticModel) -> bool {
    let SymbolRef::Executable { owner, name, .. } = &entry.symbol else {
        return false;
    };
    SYNTHETIC_ENUM_MEMBERS.contains(&name.as_str())
        && library
            .type_info(owner)
            .is_none_or(|t| t.kind == crate::model::TypeKind::Enum)
}

/// The symbol a change of `entry` is attached to.
pub fn subject_of(entry: &RawChange) -> SymbolRef {
    if is_added_method(entry) {
        SymbolRef::ty(entry.symbol.owner_type())
    } else {
        entry.symbol.clone()
    }
}

/// Builds the change for one kind of `entry`, deriving its metadata from the
/// entry's before/after facets.
pub fn to_change(entry: &RawChange, kind: ChangeKind) -> Result<BreakingChange> {
    let subject = subject_of(entry);
    let malformed = |reason: &str| ImpactError::MalformedChange {
        kind,
        subject: subject.to_string(),
        reason: reason.to_string(),
    };
    let metadata = match kind.metadata_shape() {
        MetadataShape::None => ChangeMetadata::None,
        MetadataShape::Access => match (entry.before.access, entry.after.access) {
            (Some(old), Some(new)) => ChangeMetadata::Access { old, new },
            _ => return Err(malformed("entry carries no before/after access levels")),
        },
        MetadataShape::TypeChange => match (&entry.before.ty, &entry.after.ty) {
            (Some(old), Some(new)) => ChangeMetadata::TypeChange {
                old: old.clone(),
                new: new.clone(),
            },
            _ => return Err(malformed("entry carries no before/after types")),
        },
        MetadataShape::Supertypes => {
            let types = supertype_delta(entry, kind);
            if types.is_empty() {
                return Err(malformed("before/after supertypes do not differ"));
            }
            ChangeMetadata::Supertypes { types }
        }
    };
    BreakingChange::new(kind, subject, metadata)
}

/// Supertypes gained or lost between the two facets of a type entry.
pub fn supertype_delta(entry: &RawChange, kind: ChangeKind) -> BTreeSet<String> {
    let (before, after) = (&entry.before, &entry.after);
    match kind {
        ChangeKind::SupertypeAdded => after
            .superclass
            .iter()
            .filter(|sup| before.superclass.as_ref() != Some(*sup))
            .cloned()
            .collect(),
        ChangeKind::SupertypeRemoved => before
            .superclass
            .iter()
            .filter(|sup| after.superclass.as_ref() != Some(*sup))
            .cloned()
            .collect(),
        ChangeKind::InterfaceAdded => after
            .interfaces
            .iter()
            .filter(|i| !before.interfaces.contains(i))
            .cloned()
            .collect(),
        ChangeKind::InterfaceRemoved => before
            .interfaces
            .iter()
            .filter(|i| !after.interfaces.contains(i))
            .cloned()
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Declaration of `symbol` in the library's own sources. Executables
/// without a position of their own (e.g. default constructors) are located
/// at their declaring type.
pub fn locate(sources: &dyn SemanticModel, symbol: &SymbolRef) -> Option<SourceElement> {
    let position = match symbol {
        SymbolRef::Type { .. } | SymbolRef::Field { .. } => sources.declaration_position(symbol),
        SymbolRef::Executable { owner, .. } => sources
            .declaration_position(symbol)
            .or_else(|| sources.declaration_position(&SymbolRef::ty(owner.as_str()))),
    }?;
    let label = match symbol {
        SymbolRef::Type { .. } => format!("type {symbol}"),
        SymbolRef::Field { .. } => format!("field {symbol}"),
        SymbolRef::Executable { .. } if symbol.is_constructor() => format!("constructor {symbol}"),
        SymbolRef::Executable { .. } => format!("method {symbol}"),
    };
    Some(SourceElement {
        position: Some(position.clone()),
        label,
    })
}
