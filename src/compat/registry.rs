//! Detector factory.
//!
//! Every [`ChangeKind`] has exactly one entry in [`DETECTOR_TABLE`]. Kinds
//! without a source-level detection algorithm have no factory and yield
//! `Ok(None)`; adding support for a kind is an edit to this table.

use crate::compat::detector::Detector;
use crate::compat::field_rules::{
    FieldLessAccessibleRule, FieldNoLongerStaticRule, FieldReferenceRule, FieldTypeChangedRule,
};
use crate::compat::method_rules::{
    ConstructorReferenceRule, ExecutableLessAccessibleRule, MethodNowAbstractRule, MethodNowFinalRule,
    MethodReferenceRule, MethodReturnTypeChangedRule,
};
use crate::compat::type_rules::{
    MemberAddedToInterfaceRule, SupertypeAddedRule, SupertypeRemovedRule, TypeLessAccessibleRule,
    TypeNowAbstractRule, TypeNowCheckedExceptionRule, TypeNowFinalRule, TypeReferenceRule,
};
use crate::delta::{BreakingChange, ChangeKind};
use crate::error::Result;
use crate::model::DeclarationLevel;
use tracing::debug;

type DetectorFactory = fn(&BreakingChange) -> Result<Option<Detector<'_>>>;

/// Builds the detector for `change`, or `None` when its kind has no
/// source-level detection algorithm.
pub fn make_detector(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    change.check_metadata()?;
    let factory = DETECTOR_TABLE
        .iter()
        .find(|(kind, _)| *kind == change.kind())
        .and_then(|(_, factory)| *factory);
    let detector = match factory {
        Some(factory) => factory(change)?,
        None => None,
    };
    if detector.is_none() {
        debug!(kind = %change.kind(), subject = %change.subject(), "No detector for change kind");
    }
    Ok(detector)
}

/// Kinds with a detection algorithm.
pub fn supported_kinds() -> Vec<ChangeKind> {
    DETECTOR_TABLE
        .iter()
        .filter(|(_, factory)| factory.is_some())
        .map(|(kind, _)| *kind)
        .collect()
}

pub fn is_supported(kind: ChangeKind) -> bool {
    supported_kinds().contains(&kind)
}

pub const fn get_detector_count() -> usize {
    DETECTOR_TABLE.len()
}

/// Checks that the table covers every kind exactly once.
pub fn verify_registry() -> std::result::Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for (kind, _) in DETECTOR_TABLE {
        if !seen.insert(kind) {
            return Err(format!("Duplicate detector entry: {kind}"));
        }
    }
    if let Some(missing) = ChangeKind::all().iter().find(|k| !seen.contains(k)) {
        return Err(format!("Missing detector entry: {missing}"));
    }
    Ok(())
}

const DETECTOR_TABLE: &[(ChangeKind, Option<DetectorFactory>)] = &[
    // Type-level kinds
    (ChangeKind::TypeRemoved, Some(type_reference)),
    (ChangeKind::TypeNowFinal, Some(type_now_final)),
    (ChangeKind::TypeNowAbstract, Some(type_now_abstract)),
    (ChangeKind::TypeLessAccessible, Some(type_less_accessible)),
    (ChangeKind::TypeNowCheckedException, Some(type_now_checked_exception)),
    (ChangeKind::TypeKindChanged, None),
    (ChangeKind::SupertypeAdded, Some(supertype_added)),
    (ChangeKind::SupertypeRemoved, Some(supertype_removed)),
    (ChangeKind::InterfaceAdded, Some(supertype_added)),
    (ChangeKind::InterfaceRemoved, Some(supertype_removed)),
    (ChangeKind::MemberAddedToInterface, Some(member_added_to_interface)),
    (ChangeKind::AbstractMethodAddedToClass, None),
    (ChangeKind::MethodNewDefault, None),
    (ChangeKind::TypeNoLongerPublic, None),
    (ChangeKind::MethodAddedToPublicClass, None),
    (ChangeKind::MethodAbstractAddedInImplementedInterface, None),
    (ChangeKind::MethodRemovedInSuperclass, None),
    (ChangeKind::FieldRemovedInSuperclass, None),
    (ChangeKind::MethodAbstractAddedInSuperclass, None),
    (ChangeKind::MethodDefaultAddedInImplementedInterface, None),
    // Field-level kinds
    (ChangeKind::FieldRemoved, Some(field_reference)),
    (ChangeKind::FieldNowFinal, Some(field_now_final)),
    (ChangeKind::FieldNoLongerStatic, Some(field_no_longer_static)),
    (ChangeKind::FieldNowStatic, None),
    (ChangeKind::FieldLessAccessible, Some(field_less_accessible)),
    (ChangeKind::FieldTypeChanged, Some(field_type_changed)),
    (ChangeKind::FieldStaticAndOverridesStatic, None),
    (ChangeKind::FieldGenericsChanged, None),
    (ChangeKind::FieldLessAccessibleThanInSuperclass, None),
    // Executable-level kinds
    (ChangeKind::MethodRemoved, Some(method_reference)),
    (ChangeKind::ConstructorRemoved, Some(constructor_reference)),
    (ChangeKind::MethodNowFinal, Some(method_now_final)),
    (ChangeKind::MethodNowAbstract, Some(method_now_abstract)),
    (ChangeKind::MethodReturnTypeChanged, Some(method_return_type_changed)),
    (ChangeKind::MethodLessAccessible, Some(executable_less_accessible)),
    (ChangeKind::ConstructorLessAccessible, Some(executable_less_accessible)),
    (ChangeKind::MethodNowStatic, None),
    (ChangeKind::MethodNoLongerStatic, None),
    (ChangeKind::MethodIsStaticAndOverridesNotStatic, None),
    (ChangeKind::MethodNowThrowsCheckedException, None),
    (ChangeKind::MethodNoLongerThrowsCheckedException, None),
    (ChangeKind::MethodAbstractNowDefault, None),
    // Any level
    (ChangeKind::AnnotationDeprecatedAdded, Some(deprecated)),
];

fn type_reference(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::TypeReference(TypeReferenceRule {
        change,
        target: change.subject().owner_type(),
    })))
}

fn type_now_final(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::TypeNowFinal(TypeNowFinalRule {
        change,
        target: change.subject().owner_type(),
    })))
}

fn type_now_abstract(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::TypeNowAbstract(TypeNowAbstractRule {
        change,
        target: change.subject().owner_type(),
    })))
}

fn type_less_accessible(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::TypeLessAccessible(TypeLessAccessibleRule {
        change,
        target: change.subject().owner_type(),
        new_access: change.new_access()?,
    })))
}

fn type_now_checked_exception(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::TypeNowCheckedException(TypeNowCheckedExceptionRule {
        change,
        target: change.subject().owner_type(),
    })))
}

fn supertype_added(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::SupertypeAdded(SupertypeAddedRule {
        change,
        target: change.subject().owner_type(),
        added: change.supertypes()?,
    })))
}

fn supertype_removed(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::SupertypeRemoved(SupertypeRemovedRule {
        change,
        target: change.subject().owner_type(),
        removed: change.supertypes()?,
    })))
}

fn member_added_to_interface(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::MemberAddedToInterface(MemberAddedToInterfaceRule {
        change,
        target: change.subject().owner_type(),
    })))
}

fn field_reference(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::FieldReference(FieldReferenceRule {
        change,
        field: change.subject(),
        writes_only: false,
    })))
}

fn field_now_final(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::FieldReference(FieldReferenceRule {
        change,
        field: change.subject(),
        writes_only: true,
    })))
}

fn field_no_longer_static(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::FieldNoLongerStatic(FieldNoLongerStaticRule {
        change,
        field: change.subject(),
    })))
}

fn field_less_accessible(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::FieldLessAccessible(FieldLessAccessibleRule {
        change,
        field: change.subject(),
        new_access: change.new_access()?,
    })))
}

fn field_type_changed(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    let (_, new_type) = change.type_change()?;
    Ok(Some(Detector::FieldTypeChanged(FieldTypeChangedRule {
        change,
        field: change.subject(),
        new_type,
    })))
}

fn method_reference(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::MethodReference(MethodReferenceRule {
        change,
        method: change.subject(),
    })))
}

fn constructor_reference(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::ConstructorReference(ConstructorReferenceRule {
        change,
        constructor: change.subject(),
    })))
}

fn method_now_final(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::MethodNowFinal(MethodNowFinalRule {
        change,
        method: change.subject(),
    })))
}

fn method_now_abstract(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::MethodNowAbstract(MethodNowAbstractRule {
        change,
        method: change.subject(),
    })))
}

fn method_return_type_changed(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    let (_, new_type) = change.type_change()?;
    Ok(Some(Detector::MethodReturnTypeChanged(MethodReturnTypeChangedRule {
        change,
        method: change.subject(),
        new_type,
    })))
}

fn executable_less_accessible(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    Ok(Some(Detector::ExecutableLessAccessible(ExecutableLessAccessibleRule {
        change,
        executable: change.subject(),
        new_access: change.new_access()?,
    })))
}

/// Deprecation breaks (under `-Werror`) every use a removal would break.
fn deprecated(change: &BreakingChange) -> Result<Option<Detector<'_>>> {
    let subject = change.subject();
    match subject.level() {
        DeclarationLevel::Type => type_reference(change),
        DeclarationLevel::Field => field_reference(change),
        DeclarationLevel::Executable if subject.is_constructor() => constructor_reference(change),
        DeclarationLevel::Executable => method_reference(change),
    }
}
