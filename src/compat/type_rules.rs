//! Detection rules for type-level changes.

use crate::compat::detector::Rule;
use crate::compat::handlers::{access_violated, declared_type, exception_handled, subtype_path, thrown_type};
use crate::compat::roles::classify;
use crate::compat::types::{ApiUse, BrokenUseSink};
use crate::delta::BreakingChange;
use crate::error::Result;
use crate::model::{AccessLevel, NodeId, NodeKind, NodeTag, SemanticModel, SymbolRef};
use std::collections::BTreeSet;

/// Every reference to the type. Used for removals and deprecations.
#[derive(Debug)]
pub struct TypeReferenceRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
}

impl Rule for TypeReferenceRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::TypeReference]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        let reference = tree.node(node);
        let NodeKind::TypeReference { target } = &reference.kind else {
            return Ok(());
        };
        if target != self.target {
            return Ok(());
        }
        let api_use = classify(reference.role)?;
        let located = tree.parent(node).unwrap_or(node);
        sink.report(tree, located, SymbolRef::ty(target.as_str()), self.change, api_use);
        Ok(())
    }
}

/// References to a type whose access level was reduced.
#[derive(Debug)]
pub struct TypeLessAccessibleRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
    pub new_access: AccessLevel,
}

impl Rule for TypeLessAccessibleRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::TypeReference]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        let reference = tree.node(node);
        let NodeKind::TypeReference { target } = &reference.kind else {
            return Ok(());
        };
        if target != self.target || !access_violated(model, node, self.target, self.new_access) {
            return Ok(());
        }
        let api_use = classify(reference.role)?;
        let located = tree.parent(node).unwrap_or(node);
        sink.report(tree, located, SymbolRef::ty(target.as_str()), self.change, api_use);
        Ok(())
    }
}

/// Subclasses of a now-final type and overrides of its methods.
///
/// Anonymous classes are visited once, through their class declaration;
/// the enclosing instantiation expression is not inspected.
#[derive(Debug)]
pub struct TypeNowFinalRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
}

impl Rule for TypeNowFinalRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::TypeDeclaration, NodeTag::MethodDeclaration]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        match &tree.node(node).kind {
            NodeKind::TypeDeclaration { .. } => {
                let extends_target = declared_type(model, node)
                    .and_then(|info| info.superclass.as_deref())
                    .is_some_and(|sup| sup == self.target);
                if extends_target {
                    sink.report(tree, node, SymbolRef::ty(self.target), self.change, ApiUse::Extends);
                }
            }
            NodeKind::MethodDeclaration { method } => {
                let overridden = model
                    .overridden_executables(method)
                    .into_iter()
                    .find(|sup| sup.owner_type() == self.target);
                if let Some(overridden) = overridden {
                    sink.report(tree, node, overridden, self.change, ApiUse::MethodOverride);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// `new T(...)` and `new T(...) { ... }` of a now-abstract type.
#[derive(Debug)]
pub struct TypeNowAbstractRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
}

impl Rule for TypeNowAbstractRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::ConstructorCall, NodeTag::NewClass]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        match &tree.node(node).kind {
            NodeKind::ConstructorCall { executable } | NodeKind::NewClass { executable }
                if executable.owner_type() == self.target =>
            {
                sink.report(tree, node, executable.clone(), self.change, ApiUse::Instantiation);
            }
            _ => {}
        }
        Ok(())
    }
}

/// `throw` sites of an exception type that became checked, when neither an
/// enclosing `try` nor the enclosing executable handles it.
#[derive(Debug)]
pub struct TypeNowCheckedExceptionRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
}

impl Rule for TypeNowCheckedExceptionRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::Throw]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let Some(thrown) = thrown_type(model, node) else {
            return Ok(());
        };
        if model.is_subtype(&thrown, self.target) && !exception_handled(model, node, &thrown) {
            sink.report(model.tree(), node, SymbolRef::ty(thrown), self.change, ApiUse::Throws);
        }
        Ok(())
    }
}

/// Concrete subtypes that inherit new abstract obligations through an added
/// superclass or interface.
#[derive(Debug)]
pub struct SupertypeAddedRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
    pub added: &'a BTreeSet<String>,
}

impl SupertypeAddedRule<'_> {
    /// Whether an added supertype brings an abstract member `class` does not
    /// implement. Supertypes unknown to the model are assumed to.
    fn introduces_obligation(&self, model: &dyn SemanticModel, class: &str) -> bool {
        self.added.iter().any(|added| {
            let Some(info) = model.type_info(added) else {
                return true;
            };
            std::iter::once(info)
                .chain(model.all_supertypes(added).iter().filter_map(|s| model.type_info(s)))
                .flat_map(|ty| ty.executables.iter().map(move |e| (ty, e)))
                .filter(|(_, e)| e.is_abstract && !e.is_static)
                .any(|(ty, e)| model.implementation_in(class, &e.symbol(&ty.name)).is_none())
        })
    }
}

impl Rule for SupertypeAddedRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::TypeDeclaration]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let Some(class) = declared_type(model, node) else {
            return Ok(());
        };
        if !class.is_concrete_class() {
            return Ok(());
        }
        let path = subtype_path(model, class, self.target);
        if !path.any() || !self.introduces_obligation(model, &class.name) {
            return Ok(());
        }
        let tree = model.tree();
        let used = SymbolRef::ty(self.target);
        if path.via_interfaces {
            sink.report(tree, node, used.clone(), self.change, ApiUse::Implements);
        }
        if path.via_superclass {
            sink.report(tree, node, used, self.change, ApiUse::Extends);
        }
        Ok(())
    }
}

/// Overrides, in subtypes of the changed type, of members only the removed
/// supertypes declared.
#[derive(Debug)]
pub struct SupertypeRemovedRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
    pub removed: &'a BTreeSet<String>,
}

impl Rule for SupertypeRemovedRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::MethodDeclaration]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        let NodeKind::MethodDeclaration { method } = &tree.node(node).kind else {
            return Ok(());
        };
        if !model.is_subtype(method.owner_type(), self.target) {
            return Ok(());
        }
        let mut lost_family: BTreeSet<String> = self.removed.clone();
        for removed in self.removed {
            lost_family.extend(model.all_supertypes(removed));
        }
        let overridden = model.overridden_executables(method);
        let from_removed = overridden
            .iter()
            .find(|sup| self.removed.contains(sup.owner_type()));
        let still_overrides = overridden
            .iter()
            .any(|sup| !lost_family.contains(sup.owner_type()));
        if let (Some(lost), false) = (from_removed, still_overrides) {
            sink.report(tree, node, lost.clone(), self.change, ApiUse::MethodOverride);
        }
        Ok(())
    }
}

/// Concrete classes implementing an interface that gained an abstract method.
#[derive(Debug)]
pub struct MemberAddedToInterfaceRule<'a> {
    pub change: &'a BreakingChange,
    pub target: &'a str,
}

impl Rule for MemberAddedToInterfaceRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::TypeDeclaration]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let Some(class) = declared_type(model, node) else {
            return Ok(());
        };
        if !class.is_concrete_class() {
            return Ok(());
        }
        let path = subtype_path(model, class, self.target);
        let tree = model.tree();
        let used = SymbolRef::ty(self.target);
        if path.via_interfaces {
            sink.report(tree, node, used.clone(), self.change, ApiUse::Implements);
        }
        if path.via_superclass {
            sink.report(tree, node, used, self.change, ApiUse::Extends);
        }
        Ok(())
    }
}
