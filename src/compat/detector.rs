//! Detector dispatch.
//!
//! A detector binds one breaking change to the rule that finds its broken
//! uses. The set of rules is closed, so dispatch is a `match` over
//! [`Detector`] rather than a trait object.

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
use crate::compat::types::BrokenUseSink;
use crate::delta::BreakingChange;
use crate::error::Result;
use crate::model::{NodeId, NodeTag, SemanticModel};

/// One detection algorithm.
pub trait Rule {
    /// Node kinds the rule needs to see. Other nodes never reach `inspect`.
    fn interests(&self) -> &'static [NodeTag];

    /// Reports every broken use found at `node` into `sink`.
    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()>;
}

#[derive(Debug)]
pub enum Detector<'a> {
    TypeReference(TypeReferenceRule<'a>),
    TypeLessAccessible(TypeLessAccessibleRule<'a>),
    TypeNowFinal(TypeNowFinalRule<'a>),
    TypeNowAbstract(TypeNowAbstractRule<'a>),
    TypeNowCheckedException(TypeNowCheckedExceptionRule<'a>),
    SupertypeAdded(SupertypeAddedRule<'a>),
    SupertypeRemoved(SupertypeRemovedRule<'a>),
    MemberAddedToInterface(MemberAddedToInterfaceRule<'a>),
    FieldReference(FieldReferenceRule<'a>),
    FieldLessAccessible(FieldLessAccessibleRule<'a>),
    FieldNoLongerStatic(FieldNoLongerStaticRule<'a>),
    FieldTypeChanged(FieldTypeChangedRule<'a>),
    MethodReference(MethodReferenceRule<'a>),
    ConstructorReference(ConstructorReferenceRule<'a>),
    MethodNowFinal(MethodNowFinalRule<'a>),
    MethodNowAbstract(MethodNowAbstractRule<'a>),
    MethodReturnTypeChanged(MethodReturnTypeChangedRule<'a>),
    ExecutableLessAccessible(ExecutableLessAccessibleRule<'a>),
}

macro_rules! dispatch {
    ($detector:expr, $rule:ident => $body:expr) => {
        match $detector {
            Detector::TypeReference($rule) => $body,
            Detector::TypeLessAccessible($rule) => $body,
            Detector::TypeNowFinal($rule) => $body,
            Detector::TypeNowAbstract($rule) => $body,
            Detector::TypeNowCheckedException($rule) => $body,
            Detector::SupertypeAdded($rule) => $body,
            Detector::SupertypeRemoved($rule) => $body,
            Detector::MemberAddedToInterface($rule) => $body,
            Detector::FieldReference($rule) => $body,
            Detector::FieldLessAccessible($rule) => $body,
            Detector::FieldNoLongerStatic($rule) => $body,
            Detector::FieldTypeChanged($rule) => $body,
            Detector::MethodReference($rule) => $body,
            Detector::ConstructorReference($rule) => $body,
            Detector::MethodNowFinal($rule) => $body,
            Detector::MethodNowAbstract($rule) => $body,
            Detector::MethodReturnTypeChanged($rule) => $body,
            Detector::ExecutableLessAccessible($rule) => $body,
        }
    };
}

impl<'a> Detector<'a> {
    /// The change this detector reports against.
    pub fn change(&self) -> &'a BreakingChange {
        dispatch!(self, rule => rule.change)
    }

    pub fn interests(&self) -> &'static [NodeTag] {
        dispatch!(self, rule => rule.interests())
    }

    pub fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        dispatch!(self, rule => rule.inspect(model, node, sink))
    }
}
