//! Detection rules for executable-level changes.

use crate::compat::detector::Rule;
use crate::compat::handlers::{access_violated, declared_return, declared_type, subtype_path};
use crate::compat::types::{ApiUse, BrokenUseSink};
use crate::delta::BreakingChange;
use crate::error::Result;
use crate::model::typing::{expected_type, is_return_substitutable};
use crate::model::{AccessLevel, JavaType, NodeId, NodeKind, NodeTag, SemanticModel, SymbolRef};

fn invoked(model: &dyn SemanticModel, node: NodeId) -> Option<&SymbolRef> {
    match &model.tree().node(node).kind {
        NodeKind::Invocation { executable } => Some(executable),
        _ => None,
    }
}

/// Whether the method declared at `node` overrides `method`.
fn overrides(model: &dyn SemanticModel, node: NodeId, method: &SymbolRef) -> bool {
    match &model.tree().node(node).kind {
        NodeKind::MethodDeclaration { method: declared } => {
            model.overridden_executables(declared).contains(method)
        }
        _ => false,
    }
}

/// Invocations and overrides of a removed or deprecated method.
#[derive(Debug)]
pub struct MethodReferenceRule<'a> {
    pub change: &'a BreakingChange,
    pub method: &'a SymbolRef,
}

impl Rule for MethodReferenceRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::Invocation, NodeTag::MethodDeclaration]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        if invoked(model, node) == Some(self.method) {
            sink.report(tree, node, self.method.clone(), self.change, ApiUse::MethodInvocation);
        } else if overrides(model, node, self.method) {
            sink.report(tree, node, self.method.clone(), self.change, ApiUse::MethodOverride);
        }
        Ok(())
    }
}

/// Every way client code can reach a removed or deprecated constructor:
/// `new T(..)`, anonymous subclasses, and `super(..)` from subclass
/// constructors, including the implicit one the compiler inserts.
#[derive(Debug)]
pub struct ConstructorReferenceRule<'a> {
    pub change: &'a BreakingChange,
    pub constructor: &'a SymbolRef,
}

impl Rule for ConstructorReferenceRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::ConstructorCall, NodeTag::NewClass, NodeTag::Invocation]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        match &tree.node(node).kind {
            NodeKind::ConstructorCall { executable } | NodeKind::NewClass { executable }
                if executable == self.constructor =>
            {
                sink.report(tree, node, executable.clone(), self.change, ApiUse::Instantiation);
            }
            NodeKind::Invocation { executable } if executable == self.constructor => {
                sink.report_explicit(tree, node, executable.clone(), self.change, ApiUse::MethodInvocation);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Overrides of a method that became final.
#[derive(Debug)]
pub struct MethodNowFinalRule<'a> {
    pub change: &'a BreakingChange,
    pub method: &'a SymbolRef,
}

impl Rule for MethodNowFinalRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::MethodDeclaration]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        if overrides(model, node, self.method) {
            sink.report(model.tree(), node, self.method.clone(), self.change, ApiUse::MethodOverride);
        }
        Ok(())
    }
}

/// A method that became abstract breaks concrete subtypes that inherit no
/// implementation, and every invocation of it.
#[derive(Debug)]
pub struct MethodNowAbstractRule<'a> {
    pub change: &'a BreakingChange,
    pub method: &'a SymbolRef,
}

impl Rule for MethodNowAbstractRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::TypeDeclaration, NodeTag::Invocation]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        if invoked(model, node) == Some(self.method) {
            sink.report(tree, node, self.method.clone(), self.change, ApiUse::MethodInvocation);
            return Ok(());
        }
        let Some(class) = declared_type(model, node) else {
            return Ok(());
        };
        let owner = self.method.owner_type();
        if !class.is_concrete_class() || class.name == owner {
            return Ok(());
        }
        let path = subtype_path(model, class, owner);
        if !path.any() || model.implementation_in(&class.name, self.method).is_some() {
            return Ok(());
        }
        let api_use = if model.type_info(owner).is_some_and(|t| t.is_interface()) {
            ApiUse::Implements
        } else {
            ApiUse::Extends
        };
        sink.report(tree, node, SymbolRef::ty(owner), self.change, api_use);
        Ok(())
    }
}

/// Invocations whose context rejects the new return type, and overrides
/// whose return type no longer substitutes for it.
#[derive(Debug)]
pub struct MethodReturnTypeChangedRule<'a> {
    pub change: &'a BreakingChange,
    pub method: &'a SymbolRef,
    pub new_type: &'a JavaType,
}

impl Rule for MethodReturnTypeChangedRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::Invocation, NodeTag::MethodDeclaration]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        if invoked(model, node) == Some(self.method) {
            if !expected_type(model, node)?.accepts(model, self.new_type) {
                sink.report(tree, node, self.method.clone(), self.change, ApiUse::MethodInvocation);
            }
            return Ok(());
        }
        if !overrides(model, node, self.method) {
            return Ok(());
        }
        let substitutable = declared_return(model, node)
            .is_some_and(|own| is_return_substitutable(model, self.new_type, &own));
        if !substitutable {
            sink.report(tree, node, self.method.clone(), self.change, ApiUse::MethodOverride);
        }
        Ok(())
    }
}

/// Invocations and instantiations that can no longer see the executable.
#[derive(Debug)]
pub struct ExecutableLessAccessibleRule<'a> {
    pub change: &'a BreakingChange,
    pub executable: &'a SymbolRef,
    pub new_access: AccessLevel,
}

impl Rule for ExecutableLessAccessibleRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        &[NodeTag::Invocation, NodeTag::ConstructorCall, NodeTag::NewClass]
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tree = model.tree();
        let api_use = match &tree.node(node).kind {
            NodeKind::Invocation { executable } if executable == self.executable => {
                ApiUse::MethodInvocation
            }
            NodeKind::ConstructorCall { executable } | NodeKind::NewClass { executable }
                if executable == self.executable =>
            {
                ApiUse::Instantiation
            }
            _ => return Ok(()),
        };
        if access_violated(model, node, self.executable.owner_type(), self.new_access) {
            sink.report(tree, node, self.executable.clone(), self.change, api_use);
        }
        Ok(())
    }
}
