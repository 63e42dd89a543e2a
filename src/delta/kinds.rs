//! Breaking change kinds: the closed taxonomy, the declaration levels each
//! kind may attach to and the metadata shape it carries.

use crate::model::DeclarationLevel;
use serde::{Deserialize, Serialize};

const TYPE: &[DeclarationLevel] = &[DeclarationLevel::Type];
const FIELD: &[DeclarationLevel] = &[DeclarationLevel::Field];
const EXECUTABLE: &[DeclarationLevel] = &[DeclarationLevel::Executable];
const ANY: &[DeclarationLevel] = &[
    DeclarationLevel::Type,
    DeclarationLevel::Field,
    DeclarationLevel::Executable,
];

/// Every breaking change kind the diff provider can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    // Types
    TypeRemoved,
    TypeNowFinal,
    TypeNowAbstract,
    TypeLessAccessible,
    TypeNowCheckedException,
    TypeKindChanged,
    SupertypeAdded,
    SupertypeRemoved,
    InterfaceAdded,
    InterfaceRemoved,
    MemberAddedToInterface,
    AbstractMethodAddedToClass,
    MethodNewDefault,
    TypeNoLongerPublic,
    MethodAddedToPublicClass,
    MethodAbstractAddedInImplementedInterface,
    MethodRemovedInSuperclass,
    FieldRemovedInSuperclass,
    MethodAbstractAddedInSuperclass,
    MethodDefaultAddedInImplementedInterface,

    // Fields
    FieldRemoved,
    FieldNowFinal,
    FieldNoLongerStatic,
    FieldNowStatic,
    FieldLessAccessible,
    FieldTypeChanged,
    FieldStaticAndOverridesStatic,
    FieldGenericsChanged,
    FieldLessAccessibleThanInSuperclass,

    // Methods and constructors
    MethodRemoved,
    ConstructorRemoved,
    MethodNowFinal,
    MethodNowAbstract,
    MethodReturnTypeChanged,
    MethodLessAccessible,
    ConstructorLessAccessible,
    MethodNowStatic,
    MethodNoLongerStatic,
    MethodIsStaticAndOverridesNotStatic,
    MethodNowThrowsCheckedException,
    MethodNoLongerThrowsCheckedException,
    MethodAbstractNowDefault,

    // Any level
    AnnotationDeprecatedAdded,
}

/// Shape of the metadata a change of a given kind carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataShape {
    None,
    /// Old and new access level.
    Access,
    /// Old and new field or return type.
    TypeChange,
    /// Supertypes added or removed by the change.
    Supertypes,
}

impl ChangeKind {
    /// Stable identifier used in diffs, configs and reports.
    pub fn id(&self) -> &'static str {
        match self {
            ChangeKind::TypeRemoved => "TYPE_REMOVED",
            ChangeKind::TypeNowFinal => "TYPE_NOW_FINAL",
            ChangeKind::TypeNowAbstract => "TYPE_NOW_ABSTRACT",
            ChangeKind::TypeLessAccessible => "TYPE_LESS_ACCESSIBLE",
            ChangeKind::TypeNowCheckedException => "TYPE_NOW_CHECKED_EXCEPTION",
            ChangeKind::TypeKindChanged => "TYPE_KIND_CHANGED",
            ChangeKind::SupertypeAdded => "SUPERTYPE_ADDED",
            ChangeKind::SupertypeRemoved => "SUPERTYPE_REMOVED",
            ChangeKind::InterfaceAdded => "INTERFACE_ADDED",
            ChangeKind::InterfaceRemoved => "INTERFACE_REMOVED",
            ChangeKind::MemberAddedToInterface => "MEMBER_ADDED_TO_INTERFACE",
            ChangeKind::AbstractMethodAddedToClass => "ABSTRACT_METHOD_ADDED_TO_CLASS",
            ChangeKind::MethodNewDefault => "METHOD_NEW_DEFAULT",
            ChangeKind::TypeNoLongerPublic => "TYPE_NO_LONGER_PUBLIC",
            ChangeKind::MethodAddedToPublicClass => "METHOD_ADDED_TO_PUBLIC_CLASS",
            ChangeKind::MethodAbstractAddedInImplementedInterface => {
                "METHOD_ABSTRACT_ADDED_IN_IMPLEMENTED_INTERFACE"
            }
            ChangeKind::MethodRemovedInSuperclass => "METHOD_REMOVED_IN_SUPERCLASS",
            ChangeKind::FieldRemovedInSuperclass => "FIELD_REMOVED_IN_SUPERCLASS",
            ChangeKind::MethodAbstractAddedInSuperclass => "METHOD_ABSTRACT_ADDED_IN_SUPERCLASS",
            ChangeKind::MethodDefaultAddedInImplementedInterface => {
                "METHOD_DEFAULT_ADDED_IN_IMPLEMENTED_INTERFACE"
            }
            ChangeKind::FieldRemoved => "FIELD_REMOVED",
            ChangeKind::FieldNowFinal => "FIELD_NOW_FINAL",
            ChangeKind::FieldNoLongerStatic => "FIELD_NO_LONGER_STATIC",
            ChangeKind::FieldNowStatic => "FIELD_NOW_STATIC",
            ChangeKind::FieldLessAccessible => "FIELD_LESS_ACCESSIBLE",
            ChangeKind::FieldTypeChanged => "FIELD_TYPE_CHANGED",
            ChangeKind::FieldStaticAndOverridesStatic => "FIELD_STATIC_AND_OVERRIDES_STATIC",
            ChangeKind::FieldGenericsChanged => "FIELD_GENERICS_CHANGED",
            ChangeKind::FieldLessAccessibleThanInSuperclass => {
                "FIELD_LESS_ACCESSIBLE_THAN_IN_SUPERCLASS"
            }
            ChangeKind::MethodRemoved => "METHOD_REMOVED",
            ChangeKind::ConstructorRemoved => "CONSTRUCTOR_REMOVED",
            ChangeKind::MethodNowFinal => "METHOD_NOW_FINAL",
            ChangeKind::MethodNowAbstract => "METHOD_NOW_ABSTRACT",
            ChangeKind::MethodReturnTypeChanged => "METHOD_RETURN_TYPE_CHANGED",
            ChangeKind::MethodLessAccessible => "METHOD_LESS_ACCESSIBLE",
            ChangeKind::ConstructorLessAccessible => "CONSTRUCTOR_LESS_ACCESSIBLE",
            ChangeKind::MethodNowStatic => "METHOD_NOW_STATIC",
            ChangeKind::MethodNoLongerStatic => "METHOD_NO_LONGER_STATIC",
            ChangeKind::MethodIsStaticAndOverridesNotStatic => {
                "METHOD_IS_STATIC_AND_OVERRIDES_NOT_STATIC"
            }
            ChangeKind::MethodNowThrowsCheckedException => "METHOD_NOW_THROWS_CHECKED_EXCEPTION",
            ChangeKind::MethodNoLongerThrowsCheckedException => {
                "METHOD_NO_LONGER_THROWS_CHECKED_EXCEPTION"
            }
            ChangeKind::MethodAbstractNowDefault => "METHOD_ABSTRACT_NOW_DEFAULT",
            ChangeKind::AnnotationDeprecatedAdded => "ANNOTATION_DEPRECATED_ADDED",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.id() == id)
    }

    /// All kinds, in declaration order.
    pub fn all() -> &'static [ChangeKind] {
        use ChangeKind::*;
        &[
            TypeRemoved,
            TypeNowFinal,
            TypeNowAbstract,
            TypeLessAccessible,
            TypeNowCheckedException,
            TypeKindChanged,
            SupertypeAdded,
            SupertypeRemoved,
            InterfaceAdded,
            InterfaceRemoved,
            MemberAddedToInterface,
            AbstractMethodAddedToClass,
            MethodNewDefault,
            TypeNoLongerPublic,
            MethodAddedToPublicClass,
            MethodAbstractAddedInImplementedInterface,
            MethodRemovedInSuperclass,
            FieldRemovedInSuperclass,
            MethodAbstractAddedInSuperclass,
            MethodDefaultAddedInImplementedInterface,
            FieldRemoved,
            FieldNowFinal,
            FieldNoLongerStatic,
            FieldNowStatic,
            FieldLessAccessible,
            FieldTypeChanged,
            FieldStaticAndOverridesStatic,
            FieldGenericsChanged,
            FieldLessAccessibleThanInSuperclass,
            MethodRemoved,
            ConstructorRemoved,
            MethodNowFinal,
            MethodNowAbstract,
            MethodReturnTypeChanged,
            MethodLessAccessible,
            ConstructorLessAccessible,
            MethodNowStatic,
            MethodNoLongerStatic,
            MethodIsStaticAndOverridesNotStatic,
            MethodNowThrowsCheckedException,
            MethodNoLongerThrowsCheckedException,
            MethodAbstractNowDefault,
            AnnotationDeprecatedAdded,
        ]
    }

    /// Declaration levels a change of this kind may be attached to.
    pub fn levels(&self) -> &'static [DeclarationLevel] {
        use ChangeKind::*;
        match self {
            TypeRemoved
            | TypeNowFinal
            | TypeNowAbstract
            | TypeLessAccessible
            | TypeNowCheckedException
            | TypeKindChanged
            | SupertypeAdded
            | SupertypeRemoved
            | InterfaceAdded
            | InterfaceRemoved
            | MemberAddedToInterface
            | AbstractMethodAddedToClass
            | MethodNewDefault
            | TypeNoLongerPublic
            | MethodAddedToPublicClass
            | MethodAbstractAddedInImplementedInterface
            | MethodRemovedInSuperclass
            | FieldRemovedInSuperclass
            | MethodAbstractAddedInSuperclass
            | MethodDefaultAddedInImplementedInterface => TYPE,
            FieldRemoved
            | FieldNowFinal
            | FieldNoLongerStatic
            | FieldNowStatic
            | FieldLessAccessible
            | FieldTypeChanged
            | FieldStaticAndOverridesStatic
            | FieldGenericsChanged
            | FieldLessAccessibleThanInSuperclass => FIELD,
            MethodRemoved
            | ConstructorRemoved
            | MethodNowFinal
            | MethodNowAbstract
            | MethodReturnTypeChanged
            | MethodLessAccessible
            | ConstructorLessAccessible
            | MethodNowStatic
            | MethodNoLongerStatic
            | MethodIsStaticAndOverridesNotStatic
            | MethodNowThrowsCheckedException
            | MethodNoLongerThrowsCheckedException
            | MethodAbstractNowDefault => EXECUTABLE,
            AnnotationDeprecatedAdded => ANY,
        }
    }

    pub fn applies_to(&self, level: DeclarationLevel) -> bool {
        self.levels().contains(&level)
    }

    pub fn metadata_shape(&self) -> MetadataShape {
        use ChangeKind::*;
        match self {
            TypeLessAccessible
            | FieldLessAccessible
            | MethodLessAccessible
            | ConstructorLessAccessible => MetadataShape::Access,
            FieldTypeChanged | MethodReturnTypeChanged => MetadataShape::TypeChange,
            SupertypeAdded | SupertypeRemoved | InterfaceAdded | InterfaceRemoved => {
                MetadataShape::Supertypes
            }
            _ => MetadataShape::None,
        }
    }

    /// Kinds redundant with another reported kind, or source compatible.
    /// Excluded from a delta unless the configuration says otherwise.
    pub fn default_excluded() -> &'static [ChangeKind] {
        use ChangeKind::*;
        &[
            TypeNoLongerPublic,
            MethodAddedToPublicClass,
            MethodAbstractAddedInImplementedInterface,
            MethodRemovedInSuperclass,
            FieldLessAccessibleThanInSuperclass,
            FieldRemovedInSuperclass,
            MethodAbstractAddedInSuperclass,
            MethodDefaultAddedInImplementedInterface,
        ]
    }

    pub fn description(&self) -> &'static str {
        use ChangeKind::*;
        match self {
            TypeRemoved => "Type removed.",
            TypeNowFinal => "Type is now final and can no longer be extended.",
            TypeNowAbstract => "Type is now abstract and can no longer be instantiated.",
            TypeLessAccessible => "Type access level was reduced.",
            TypeNowCheckedException => "Exception type is now checked.",
            TypeKindChanged => "Type changed kind (class, interface, enum, annotation).",
            SupertypeAdded => "Superclass added.",
            SupertypeRemoved => "Superclass removed.",
            InterfaceAdded => "Interface added to the implemented set.",
            InterfaceRemoved => "Interface removed from the implemented set.",
            MemberAddedToInterface => "Abstract method added to an interface.",
            AbstractMethodAddedToClass => "Abstract method added to a class.",
            MethodNewDefault => "Default method added to an interface.",
            TypeNoLongerPublic => "Type is no longer public.",
            MethodAddedToPublicClass => "Method added to a public class.",
            MethodAbstractAddedInImplementedInterface => {
                "Abstract method added in an implemented interface."
            }
            MethodRemovedInSuperclass => "Method removed in a superclass.",
            FieldRemovedInSuperclass => "Field removed in a superclass.",
            MethodAbstractAddedInSuperclass => "Abstract method added in a superclass.",
            MethodDefaultAddedInImplementedInterface => {
                "Default method added in an implemented interface."
            }
            FieldRemoved => "Field removed.",
            FieldNowFinal => "Field is now final.",
            FieldNoLongerStatic => "Field is no longer static.",
            FieldNowStatic => "Field is now static.",
            FieldLessAccessible => "Field access level was reduced.",
            FieldTypeChanged => "Field type changed.",
            FieldStaticAndOverridesStatic => "Static field hides a static field of a supertype.",
            FieldGenericsChanged => "Field generic arguments changed.",
            FieldLessAccessibleThanInSuperclass => {
                "Field is less accessible than the field it hides."
            }
            MethodRemoved => "Method removed.",
            ConstructorRemoved => "Constructor removed.",
            MethodNowFinal => "Method is now final and can no longer be overridden.",
            MethodNowAbstract => "Method is now abstract.",
            MethodReturnTypeChanged => "Method return type changed.",
            MethodLessAccessible => "Method access level was reduced.",
            ConstructorLessAccessible => "Constructor access level was reduced.",
            MethodNowStatic => "Method is now static.",
            MethodNoLongerStatic => "Method is no longer static.",
            MethodIsStaticAndOverridesNotStatic => "Static method hides an instance method.",
            MethodNowThrowsCheckedException => "Method now throws a checked exception.",
            MethodNoLongerThrowsCheckedException => "Method no longer throws a checked exception.",
            MethodAbstractNowDefault => "Abstract method now has a default implementation.",
            AnnotationDeprecatedAdded => "Declaration is now deprecated.",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| format!("Unknown change kind: {s}"))
    }
}
