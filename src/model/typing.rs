//! Assignability and expected-type inference.
//!
//! A changed field or return type only breaks a use when the new type no
//! longer fits what the surrounding syntax expects. [`expected_type`] derives
//! that expectation from the node's parent and role; contexts without a rule
//! are reported as errors instead of being treated as compatible.

use crate::error::{ImpactError, Result};
use crate::model::semantic::{SemanticModel, TypeKind};
use crate::model::tree::{BinaryOp, NodeId, NodeKind, NodeTag, Role, UnaryOp};
use crate::model::types::{ITERABLE, JavaType, OBJECT, Primitive, SymbolRef, THROWABLE};

/// Reference types every array is assignable to.
const ARRAY_SUPERTYPES: &[&str] = &[OBJECT, "java.lang.Cloneable", "java.io.Serializable"];

/// Reference types every boxed primitive is assignable to.
const BOXED_SUPERTYPES: &[&str] = &[OBJECT, "java.io.Serializable", "java.lang.Comparable"];

/// `given` can be assigned to a variable of type `expected`, allowing
/// boxing, unboxing and widening primitive conversions.
pub fn is_assignable_from(model: &dyn SemanticModel, expected: &JavaType, given: &JavaType) -> bool {
    if expected == given {
        return true;
    }
    match (expected, given) {
        (JavaType::Primitive(Primitive::Void), _) | (_, JavaType::Primitive(Primitive::Void)) => false,
        (JavaType::Primitive(p), _) => given.unboxed().is_some_and(|q| q.widens_to(*p)),
        (JavaType::Reference(_), JavaType::Primitive(q)) => match q.boxed_name() {
            Some(boxed) => reference_accepts(model, expected, boxed),
            None => false,
        },
        _ => is_assignable_from_no_boxing(model, expected, given),
    }
}

/// Assignability without boxing conversions: identity and widening between
/// primitives, subtyping between references and arrays.
pub fn is_assignable_from_no_boxing(
    model: &dyn SemanticModel,
    expected: &JavaType,
    given: &JavaType,
) -> bool {
    if expected == given {
        return true;
    }
    match (expected, given) {
        (JavaType::Primitive(p), JavaType::Primitive(q)) => {
            *p != Primitive::Void && *q != Primitive::Void && q.widens_to(*p)
        }
        (JavaType::Reference(_) | JavaType::Array(_), JavaType::Null) => true,
        (JavaType::Reference(e), JavaType::Reference(g)) => model.is_subtype(g, e),
        (JavaType::Reference(e), JavaType::Array(_)) => ARRAY_SUPERTYPES.contains(&e.as_str()),
        (JavaType::Array(e), JavaType::Array(g)) => match (e.as_ref(), g.as_ref()) {
            (JavaType::Primitive(a), JavaType::Primitive(b)) => a == b,
            (JavaType::Primitive(_), _) | (_, JavaType::Primitive(_)) => false,
            (e, g) => is_assignable_from_no_boxing(model, e, g),
        },
        _ => false,
    }
}

/// A method overriding one declared with `declared` may keep returning
/// `overriding`: identical primitives, or a reference subtype.
pub fn is_return_substitutable(
    model: &dyn SemanticModel,
    declared: &JavaType,
    overriding: &JavaType,
) -> bool {
    match (declared, overriding) {
        (JavaType::Primitive(a), JavaType::Primitive(b)) => a == b,
        (JavaType::Primitive(_), _) | (_, JavaType::Primitive(_)) => false,
        _ => is_assignable_from_no_boxing(model, declared, overriding),
    }
}

fn reference_accepts(model: &dyn SemanticModel, expected: &JavaType, boxed: &str) -> bool {
    let Some(name) = expected.as_reference() else {
        return false;
    };
    if name == boxed || BOXED_SUPERTYPES.contains(&name) {
        return true;
    }
    if name == "java.lang.Number" {
        return Primitive::from_boxed_name(boxed)
            .is_some_and(|p| p.is_numeric() && p != Primitive::Char);
    }
    model.is_subtype(boxed, name)
}

/// What the syntax around an expression requires of its type.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Value is discarded or compared by identity.
    Unconstrained,
    Type(JavaType),
    /// Arithmetic or comparison operand.
    Numeric,
    /// `for (x : expr)`.
    Iterable,
    /// `expr[i]`.
    Array,
    /// `switch (expr)`.
    Switchable,
    /// `(T) expr`.
    Castable(JavaType),
    /// Last parameter of a varargs executable: the array or one element.
    Varargs(JavaType),
}

impl Expectation {
    pub fn accepts(&self, model: &dyn SemanticModel, given: &JavaType) -> bool {
        match self {
            Expectation::Unconstrained => true,
            Expectation::Type(expected) => is_assignable_from(model, expected, given),
            Expectation::Numeric => given.is_numeric(),
            Expectation::Iterable => match given {
                JavaType::Array(_) => true,
                JavaType::Reference(name) => model.is_subtype(name, ITERABLE),
                _ => false,
            },
            Expectation::Array => matches!(given, JavaType::Array(_)),
            Expectation::Switchable => match given {
                _ if given.is_string() => true,
                JavaType::Reference(name) => {
                    matches!(given.unboxed(), Some(Primitive::Char | Primitive::Byte | Primitive::Short | Primitive::Int))
                        || model.type_info(name).is_some_and(|t| t.kind == TypeKind::Enum)
                }
                JavaType::Primitive(p) => {
                    matches!(p, Primitive::Char | Primitive::Byte | Primitive::Short | Primitive::Int)
                }
                _ => false,
            },
            Expectation::Castable(target) => {
                (target.is_numeric() && given.is_numeric())
                    || is_assignable_from(model, target, given)
                    || is_assignable_from(model, given, target)
            }
            Expectation::Varargs(array) => {
                is_assignable_from(model, array, given)
                    || array
                        .component()
                        .is_some_and(|component| is_assignable_from(model, component, given))
            }
        }
    }
}

/// Expected type of the expression `node` in its enclosing context.
pub fn expected_type(model: &dyn SemanticModel, node: NodeId) -> Result<Expectation> {
    let tree = model.tree();
    let role = tree.node(node).role;
    let Some(parent) = tree.parent(node) else {
        return Err(unhandled(model, node));
    };
    let parent_node = tree.node(parent);

    let expectation = match &parent_node.kind {
        NodeKind::Block => Expectation::Unconstrained,
        NodeKind::Assignment { compound } => match role {
            Role::Assigned => Expectation::Unconstrained,
            Role::AssignedValue if *compound => Expectation::Unconstrained,
            Role::AssignedValue => declared(parent_node.ty.as_ref()),
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::LocalVariable { .. } | NodeKind::FieldDeclaration { .. } => match role {
            Role::DefaultExpression => declared(parent_node.ty.as_ref()),
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::Return => {
            let owner = tree.enclosing(parent, &[NodeTag::Lambda, NodeTag::MethodDeclaration]);
            match owner.map(|o| tree.node(o)) {
                Some(owner) => declared(owner.ty.as_ref()),
                None => return Err(unhandled(model, node)),
            }
        }
        NodeKind::Conditional => match role {
            Role::Condition => Expectation::Type(JavaType::BOOLEAN),
            Role::Then | Role::Else => expected_type(model, parent)?,
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::Throw => Expectation::Type(JavaType::reference(THROWABLE)),
        NodeKind::If | NodeKind::While | NodeKind::DoWhile | NodeKind::For => match role {
            Role::Condition => Expectation::Type(JavaType::BOOLEAN),
            _ if is_statement_role(role) => Expectation::Unconstrained,
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::Assert => match role {
            Role::Condition => Expectation::Type(JavaType::BOOLEAN),
            _ => Expectation::Unconstrained,
        },
        NodeKind::ForEach => match role {
            Role::Expression => Expectation::Iterable,
            _ if is_statement_role(role) => Expectation::Unconstrained,
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::Switch => match role {
            Role::Selector => Expectation::Switchable,
            _ if is_statement_role(role) => Expectation::Unconstrained,
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::Synchronized => match role {
            Role::Expression => Expectation::Type(JavaType::reference(OBJECT)),
            _ if is_statement_role(role) => Expectation::Unconstrained,
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::ArrayAccess => match role {
            Role::Index => Expectation::Type(JavaType::INT),
            Role::Target => Expectation::Array,
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::NewArray => match role {
            Role::Dimension => Expectation::Type(JavaType::INT),
            Role::Element => declared(parent_node.ty.as_ref().and_then(JavaType::component)),
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::BinaryOperator { op } => binary_operand(*op, parent_node.ty.as_ref()),
        NodeKind::UnaryOperator { op } => match op {
            UnaryOp::Not => Expectation::Type(JavaType::BOOLEAN),
            _ => Expectation::Numeric,
        },
        NodeKind::Lambda => match role {
            Role::Body | Role::Expression => declared(parent_node.ty.as_ref()),
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::Invocation { executable }
        | NodeKind::ConstructorCall { executable }
        | NodeKind::NewClass { executable } => match role {
            Role::Argument(index) => argument(executable, index as usize),
            Role::Target => Expectation::Type(JavaType::reference(executable.owner_type())),
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::FieldRead { field } | NodeKind::FieldWrite { field } => match role {
            Role::Target => Expectation::Type(JavaType::reference(field.owner_type())),
            _ => return Err(unhandled(model, node)),
        },
        NodeKind::Cast => match parent_node.ty.clone() {
            Some(target) => Expectation::Castable(target),
            None => Expectation::Unconstrained,
        },
        _ => return Err(unhandled(model, node)),
    };
    Ok(expectation)
}

fn is_statement_role(role: Role) -> bool {
    matches!(
        role,
        Role::Statement
            | Role::Body
            | Role::Then
            | Role::Else
            | Role::ForInit
            | Role::ForUpdate
            | Role::Case
            | Role::Finalizer
    )
}

/// `void` and unknown declarations put no constraint on the value.
fn declared(ty: Option<&JavaType>) -> Expectation {
    match ty {
        Some(ty) if !ty.is_void() => Expectation::Type(ty.clone()),
        _ => Expectation::Unconstrained,
    }
}

fn binary_operand(op: BinaryOp, result: Option<&JavaType>) -> Expectation {
    match op {
        BinaryOp::And | BinaryOp::Or => Expectation::Type(JavaType::BOOLEAN),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::InstanceOf => Expectation::Unconstrained,
        BinaryOp::Plus if result.is_some_and(JavaType::is_string) => Expectation::Unconstrained,
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor
            if result.is_some_and(|t| t.unboxed() == Some(Primitive::Boolean)) =>
        {
            Expectation::Type(JavaType::BOOLEAN)
        }
        _ => Expectation::Numeric,
    }
}

/// Declared parameter type; trailing arguments of a varargs call match the
/// component of the last parameter.
fn argument(executable: &SymbolRef, index: usize) -> Expectation {
    let SymbolRef::Executable { params, .. } = executable else {
        return Expectation::Unconstrained;
    };
    match params.get(index) {
        Some(last @ JavaType::Array(_)) if index + 1 == params.len() => {
            Expectation::Varargs(last.clone())
        }
        Some(ty) => Expectation::Type(ty.clone()),
        None => match params.last() {
            Some(JavaType::Array(component)) => Expectation::Type(component.as_ref().clone()),
            _ => Expectation::Unconstrained,
        },
    }
}

fn unhandled(model: &dyn SemanticModel, node: NodeId) -> ImpactError {
    let tree = model.tree();
    let context = match tree.parent(node) {
        Some(parent) => format!("{:?} (role {:?})", tree.node(parent).tag(), tree.node(node).role),
        None => "<root>".to_string(),
    };
    ImpactError::UnhandledContext {
        context,
        location: tree.element(node).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::semantic::{CodeModel, TypeInfo};
    use crate::model::tree::{Node, SourceTree};
    use crate::model::types::STRING;

    fn model() -> CodeModel {
        CodeModel::new()
            .with_type(TypeInfo::class("lib.Animal"))
            .with_type(TypeInfo::class("lib.Dog").extends("lib.Animal"))
            .with_type(TypeInfo::class("lib.Bag").implements(ITERABLE))
            .with_type(TypeInfo::enumeration("lib.Color"))
    }

    fn r(name: &str) -> JavaType {
        JavaType::reference(name)
    }

    #[test]
    fn test_assignable_references() {
        let m = model();
        assert!(is_assignable_from(&m, &r("lib.Animal"), &r("lib.Dog")));
        assert!(!is_assignable_from(&m, &r("lib.Dog"), &r("lib.Animal")));
        assert!(is_assignable_from(&m, &r(OBJECT), &r("lib.Dog")));
        assert!(is_assignable_from(&m, &r("lib.Dog"), &JavaType::Null));
    }

    #[test]
    fn test_assignable_primitives_and_boxing() {
        let m = model();
        assert!(is_assignable_from(&m, &JavaType::reference("java.lang.Long"), &r("java.lang.Long")));
        assert!(is_assignable_from(&m, &"long".parse().unwrap(), &JavaType::INT));
        assert!(!is_assignable_from(&m, &JavaType::INT, &"long".parse().unwrap()));
        assert!(is_assignable_from(&m, &JavaType::INT, &r("java.lang.Integer")));
        assert!(is_assignable_from(&m, &r("java.lang.Integer"), &JavaType::INT));
        assert!(!is_assignable_from(&m, &r("java.lang.Long"), &JavaType::INT));
        assert!(is_assignable_from(&m, &r("java.lang.Number"), &JavaType::INT));
        assert!(is_assignable_from(&m, &r(OBJECT), &JavaType::BOOLEAN));
        assert!(!is_assignable_from(&m, &r(STRING), &JavaType::INT));
    }

    #[test]
    fn test_no_boxing_variant() {
        let m = model();
        assert!(!is_assignable_from_no_boxing(&m, &JavaType::INT, &r("java.lang.Integer")));
        assert!(is_assignable_from_no_boxing(&m, &"double".parse().unwrap(), &JavaType::INT));
    }

    #[test]
    fn test_arrays() {
        let m = model();
        let dogs = JavaType::array_of(r("lib.Dog"));
        let animals = JavaType::array_of(r("lib.Animal"));
        assert!(is_assignable_from(&m, &animals, &dogs));
        assert!(!is_assignable_from(&m, &dogs, &animals));
        assert!(is_assignable_from(&m, &r(OBJECT), &dogs));
        let ints = JavaType::array_of(JavaType::INT);
        let longs = JavaType::array_of("long".parse().unwrap());
        assert!(!is_assignable_from(&m, &longs, &ints));
    }

    #[test]
    fn test_return_substitutable() {
        let m = model();
        assert!(is_return_substitutable(&m, &r("lib.Animal"), &r("lib.Dog")));
        assert!(!is_return_substitutable(&m, &"long".parse().unwrap(), &JavaType::INT));
        assert!(!is_return_substitutable(&m, &r("lib.Dog"), &r("lib.Animal")));
    }

    #[test]
    fn test_expectations_accept() {
        let m = model();
        assert!(Expectation::Iterable.accepts(&m, &r("lib.Bag")));
        assert!(!Expectation::Iterable.accepts(&m, &r("lib.Dog")));
        assert!(Expectation::Switchable.accepts(&m, &r("lib.Color")));
        assert!(Expectation::Switchable.accepts(&m, &r(STRING)));
        assert!(!Expectation::Switchable.accepts(&m, &"long".parse().unwrap()));
        assert!(Expectation::Castable(r("lib.Dog")).accepts(&m, &r("lib.Animal")));
        assert!(!Expectation::Castable(r("lib.Dog")).accepts(&m, &JavaType::BOOLEAN));
        assert!(Expectation::Numeric.accepts(&m, &r("java.lang.Short")));
        let varargs = Expectation::Varargs(JavaType::array_of(r("lib.Animal")));
        assert!(varargs.accepts(&m, &r("lib.Dog")));
        assert!(varargs.accepts(&m, &JavaType::array_of(r("lib.Dog"))));
        assert!(!varargs.accepts(&m, &JavaType::INT));
    }

    fn tree_with(parent: NodeKind, parent_ty: Option<JavaType>, role: Role) -> (CodeModel, NodeId) {
        let mut m = model();
        let tree: &mut SourceTree = m.tree_mut();
        let unit = tree.add_unit("app", "App.java");
        let class = tree.add(unit, Node::new(NodeKind::TypeDeclaration { name: "app.App".into() }, Role::Member));
        let method = tree.add(
            class,
            Node::new(
                NodeKind::MethodDeclaration { method: SymbolRef::method("app.App", "run", vec![]) },
                Role::Member,
            )
            .typed(r("lib.Animal")),
        );
        let mut p = Node::new(parent, Role::Statement);
        p.ty = parent_ty;
        let p = tree.add(method, p);
        let child = tree.add(
            p,
            Node::new(NodeKind::FieldRead { field: SymbolRef::field("lib.Zoo", "pet") }, role).at("App.java", 7),
        );
        (m, child)
    }

    #[test]
    fn test_expected_type_contexts() {
        let (m, n) = tree_with(NodeKind::Return, None, Role::Expression);
        assert_eq!(expected_type(&m, n).unwrap(), Expectation::Type(r("lib.Animal")));

        let (m, n) = tree_with(NodeKind::If, None, Role::Condition);
        assert_eq!(expected_type(&m, n).unwrap(), Expectation::Type(JavaType::BOOLEAN));

        let (m, n) = tree_with(NodeKind::Throw, None, Role::Expression);
        assert_eq!(expected_type(&m, n).unwrap(), Expectation::Type(r(THROWABLE)));

        let (m, n) = tree_with(
            NodeKind::BinaryOperator { op: BinaryOp::Plus },
            Some(r(STRING)),
            Role::LeftOperand,
        );
        assert_eq!(expected_type(&m, n).unwrap(), Expectation::Unconstrained);

        let (m, n) = tree_with(
            NodeKind::Invocation {
                executable: SymbolRef::method("lib.Vet", "treat", vec![r("lib.Animal"), JavaType::INT]),
            },
            None,
            Role::Argument(1),
        );
        assert_eq!(expected_type(&m, n).unwrap(), Expectation::Type(JavaType::INT));

        let (m, n) = tree_with(NodeKind::ArrayAccess, None, Role::Index);
        assert_eq!(expected_type(&m, n).unwrap(), Expectation::Type(JavaType::INT));
    }

    #[test]
    fn test_unhandled_context_is_an_error() {
        let (m, n) = tree_with(NodeKind::Try, None, Role::Expression);
        let err = expected_type(&m, n).unwrap_err();
        assert!(matches!(err, ImpactError::UnhandledContext { .. }));
        assert!(err.to_string().contains("App.java:7"));
    }
}
