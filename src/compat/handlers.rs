//! Helpers shared by the detection rules: the reduced-accessibility rule,
//! subtype-edge queries and exception handling analysis.

use crate::model::types::package_of;
use crate::model::{AccessLevel, JavaType, NodeId, NodeKind, Role, SemanticModel, TypeInfo};

/// Whether a use at `node` of a member of `declaring_type` (or of the type
/// itself) is broken once the declaration's access becomes `new_access`.
///
/// * `private`: always.
/// * package-restricted: when the use sits in another package.
/// * `protected`: when the using type is not a subtype of the declaring type
///   (or of its outermost type) and the packages differ.
pub fn access_violated(
    model: &dyn SemanticModel,
    node: NodeId,
    declaring_type: &str,
    new_access: AccessLevel,
) -> bool {
    let tree = model.tree();
    let same_package = tree.package_of(node) == package_of(declaring_type);
    match new_access {
        AccessLevel::Private => true,
        AccessLevel::Package => !same_package,
        AccessLevel::Protected => {
            let outermost = outermost_type(declaring_type);
            let subtype = tree.enclosing_type(node).is_some_and(|using| {
                model.is_subtype(using, declaring_type) || model.is_subtype(using, outermost)
            });
            !subtype && !same_package
        }
        AccessLevel::Public => false,
    }
}

/// `a.Outer` for `a.Outer$Inner$Deeper`.
pub fn outermost_type(name: &str) -> &str {
    name.split('$').next().unwrap_or(name)
}

/// Type information for a type declaration node.
pub fn declared_type<'m>(model: &'m dyn SemanticModel, node: NodeId) -> Option<&'m TypeInfo> {
    match &model.tree().node(node).kind {
        NodeKind::TypeDeclaration { name } => model.type_info(name),
        _ => None,
    }
}

/// How a concrete class reaches `target`: through its superclass chain,
/// through its interfaces, or both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtypePath {
    pub via_superclass: bool,
    pub via_interfaces: bool,
}

impl SubtypePath {
    pub fn any(&self) -> bool {
        self.via_superclass || self.via_interfaces
    }
}

pub fn subtype_path(model: &dyn SemanticModel, class: &TypeInfo, target: &str) -> SubtypePath {
    SubtypePath {
        via_superclass: class
            .superclass
            .as_deref()
            .is_some_and(|sup| model.is_subtype(sup, target)),
        via_interfaces: class
            .interfaces
            .iter()
            .any(|iface| model.is_subtype(iface, target)),
    }
}

/// Whether a `throw` of `thrown` at `node` is caught by an enclosing `try`
/// or declared by the enclosing executable. Lambdas cannot declare checked
/// exceptions, so the search stops at the first one.
pub fn exception_handled(model: &dyn SemanticModel, node: NodeId, thrown: &str) -> bool {
    let tree = model.tree();
    let mut child = node;
    for ancestor in tree.ancestors(node) {
        let ancestor_node = tree.node(ancestor);
        match &ancestor_node.kind {
            NodeKind::Try if tree.node(child).role == Role::Body => {
                let caught = tree.children(ancestor).iter().any(|c| match &tree.node(*c).kind {
                    NodeKind::Catch { caught } => {
                        caught.iter().any(|handler| model.is_subtype(thrown, handler))
                    }
                    _ => false,
                });
                if caught {
                    return true;
                }
            }
            NodeKind::MethodDeclaration { method: executable }
            | NodeKind::ConstructorDeclaration {
                constructor: executable,
            } => {
                return model.executable_info(executable).is_some_and(|info| {
                    info.thrown.iter().any(|declared| model.is_subtype(thrown, declared))
                });
            }
            NodeKind::Lambda | NodeKind::TypeDeclaration { .. } => return false,
            _ => {}
        }
        child = ancestor;
    }
    false
}

/// Static type of the expression thrown by a `throw` node.
pub fn thrown_type(model: &dyn SemanticModel, throw: NodeId) -> Option<String> {
    let tree = model.tree();
    let expression = tree
        .child_with_role(throw, Role::Expression)
        .or_else(|| tree.children(throw).first().copied())?;
    tree.node(expression)
        .ty
        .as_ref()
        .and_then(|t| t.as_reference())
        .map(str::to_string)
}

/// Declared return type of a method declaration node, from the tree or the model.
pub fn declared_return(model: &dyn SemanticModel, node: NodeId) -> Option<JavaType> {
    let declaration = model.tree().node(node);
    if let Some(ty) = &declaration.ty {
        return Some(ty.clone());
    }
    match &declaration.kind {
        NodeKind::MethodDeclaration { method } => {
            model.executable_info(method).map(|info| info.returns.clone())
        }
        _ => None,
    }
}
