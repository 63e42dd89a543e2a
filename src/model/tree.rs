//! Arena tree over a client's sources: compilation units, their imports and
//! the declaration/statement/expression nodes below them.

use crate::error::{ImpactError, Result};
use crate::model::types::{JavaType, SymbolRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Index of a node inside its [`SourceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Location of a node in a source file. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: PathBuf,
    pub line: u32,
    pub end_line: u32,
    #[serde(default)]
    pub column: u32,
}

impl SourcePosition {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            end_line: line,
            column: 0,
        }
    }

    pub fn spanning(file: impl Into<PathBuf>, line: u32, end_line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            end_line,
            column: 0,
        }
    }

    /// Number of lines covered, inclusive.
    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.line) + 1
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.end_line > self.line {
            write!(f, "{}:{}-{}", self.file.display(), self.line, self.end_line)
        } else {
            write!(f, "{}:{}", self.file.display(), self.line)
        }
    }
}

/// A located source element: what a finding or an origin declaration points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceElement {
    pub position: Option<SourcePosition>,
    pub label: String,
}

impl fmt::Display for SourceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{} ({})", self.label, position),
            None => write!(f, "{}", self.label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    Ushr,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Compl,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn is_increment(&self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }
}

/// Closed node taxonomy. Payloads carry resolved symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeKind {
    CompilationUnit { package: String },
    Import,
    /// Class, interface, enum, record or anonymous class body.
    TypeDeclaration { name: String },
    FieldDeclaration { field: SymbolRef },
    MethodDeclaration { method: SymbolRef },
    ConstructorDeclaration { constructor: SymbolRef },
    LocalVariable { name: String },
    Parameter { name: String },
    /// `ty` of a lambda node is its return type.
    Lambda,
    Block,
    Return,
    If,
    While,
    DoWhile,
    For,
    ForEach,
    Switch,
    Synchronized,
    Throw,
    Try,
    Catch { caught: Vec<String> },
    Assert,
    Assignment { compound: bool },
    BinaryOperator { op: BinaryOp },
    UnaryOperator { op: UnaryOp },
    Conditional,
    ArrayAccess,
    NewArray,
    Cast,
    FieldRead { field: SymbolRef },
    FieldWrite { field: SymbolRef },
    /// Static access target such as `Foo` in `Foo.bar()`.
    TypeAccess { target: String },
    VariableAccess { name: String },
    ThisAccess,
    SuperAccess,
    Literal,
    Invocation { executable: SymbolRef },
    ConstructorCall { executable: SymbolRef },
    /// Anonymous class instantiation; the class body is a child declaration.
    NewClass { executable: SymbolRef },
    TypeReference { target: String },
    Annotation,
}

/// Fieldless mirror of [`NodeKind`] used for detector subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeTag {
    CompilationUnit,
    Import,
    TypeDeclaration,
    FieldDeclaration,
    MethodDeclaration,
    ConstructorDeclaration,
    LocalVariable,
    Parameter,
    Lambda,
    Block,
    Return,
    If,
    While,
    DoWhile,
    For,
    ForEach,
    Switch,
    Synchronized,
    Throw,
    Try,
    Catch,
    Assert,
    Assignment,
    BinaryOperator,
    UnaryOperator,
    Conditional,
    ArrayAccess,
    NewArray,
    Cast,
    FieldRead,
    FieldWrite,
    TypeAccess,
    VariableAccess,
    ThisAccess,
    SuperAccess,
    Literal,
    Invocation,
    ConstructorCall,
    NewClass,
    TypeReference,
    Annotation,
}

impl NodeTag {
    pub const COUNT: usize = 41;

    pub fn index(self) -> usize {
        self as usize
    }
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::CompilationUnit { .. } => NodeTag::CompilationUnit,
            NodeKind::Import => NodeTag::Import,
            NodeKind::TypeDeclaration { .. } => NodeTag::TypeDeclaration,
            NodeKind::FieldDeclaration { .. } => NodeTag::FieldDeclaration,
            NodeKind::MethodDeclaration { .. } => NodeTag::MethodDeclaration,
            NodeKind::ConstructorDeclaration { .. } => NodeTag::ConstructorDeclaration,
            NodeKind::LocalVariable { .. } => NodeTag::LocalVariable,
            NodeKind::Parameter { .. } => NodeTag::Parameter,
            NodeKind::Lambda => NodeTag::Lambda,
            NodeKind::Block => NodeTag::Block,
            NodeKind::Return => NodeTag::Return,
            NodeKind::If => NodeTag::If,
            NodeKind::While => NodeTag::While,
            NodeKind::DoWhile => NodeTag::DoWhile,
            NodeKind::For => NodeTag::For,
            NodeKind::ForEach => NodeTag::ForEach,
            NodeKind::Switch => NodeTag::Switch,
            NodeKind::Synchronized => NodeTag::Synchronized,
            NodeKind::Throw => NodeTag::Throw,
            NodeKind::Try => NodeTag::Try,
            NodeKind::Catch { .. } => NodeTag::Catch,
            NodeKind::Assert => NodeTag::Assert,
            NodeKind::Assignment { .. } => NodeTag::Assignment,
            NodeKind::BinaryOperator { .. } => NodeTag::BinaryOperator,
            NodeKind::UnaryOperator { .. } => NodeTag::UnaryOperator,
            NodeKind::Conditional => NodeTag::Conditional,
            NodeKind::ArrayAccess => NodeTag::ArrayAccess,
            NodeKind::NewArray => NodeTag::NewArray,
            NodeKind::Cast => NodeTag::Cast,
            NodeKind::FieldRead { .. } => NodeTag::FieldRead,
            NodeKind::FieldWrite { .. } => NodeTag::FieldWrite,
            NodeKind::TypeAccess { .. } => NodeTag::TypeAccess,
            NodeKind::VariableAccess { .. } => NodeTag::VariableAccess,
            NodeKind::ThisAccess => NodeTag::ThisAccess,
            NodeKind::SuperAccess => NodeTag::SuperAccess,
            NodeKind::Literal => NodeTag::Literal,
            NodeKind::Invocation { .. } => NodeTag::Invocation,
            NodeKind::ConstructorCall { .. } => NodeTag::ConstructorCall,
            NodeKind::NewClass { .. } => NodeTag::NewClass,
            NodeKind::TypeReference { .. } => NodeTag::TypeReference,
            NodeKind::Annotation => NodeTag::Annotation,
        }
    }

    /// Short human label used for located findings.
    pub fn describe(&self) -> String {
        match self {
            NodeKind::CompilationUnit { package } => format!("compilation unit {package}"),
            NodeKind::Import => "import".to_string(),
            NodeKind::TypeDeclaration { name } => format!("type {name}"),
            NodeKind::FieldDeclaration { field } => format!("field {field}"),
            NodeKind::MethodDeclaration { method } => format!("method {method}"),
            NodeKind::ConstructorDeclaration { constructor } => {
                format!("constructor {constructor}")
            }
            NodeKind::LocalVariable { name } => format!("variable {name}"),
            NodeKind::Parameter { name } => format!("parameter {name}"),
            NodeKind::Catch { .. } => "catch".to_string(),
            NodeKind::Assignment { .. } => "assignment".to_string(),
            NodeKind::BinaryOperator { op } => format!("binary operator {op:?}"),
            NodeKind::UnaryOperator { op } => format!("unary operator {op:?}"),
            NodeKind::FieldRead { field } => format!("read of {field}"),
            NodeKind::FieldWrite { field } => format!("write of {field}"),
            NodeKind::TypeAccess { target } => format!("type access {target}"),
            NodeKind::VariableAccess { name } => format!("variable access {name}"),
            NodeKind::Invocation { executable } => format!("invocation of {executable}"),
            NodeKind::ConstructorCall { executable } => format!("instantiation {executable}"),
            NodeKind::NewClass { executable } => format!("anonymous instantiation {executable}"),
            NodeKind::TypeReference { target } => format!("reference to {target}"),
            other => format!("{:?}", other.tag()).to_lowercase(),
        }
    }
}

/// Syntactic role of a node inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    // Roles a type reference can take.
    Cast,
    /// Declared type of a variable, field, parameter or return.
    Type,
    ArgumentType,
    Thrown,
    TypeArgument,
    SuperType,
    Interface,
    AnnotationType,
    Import,
    AccessedType,
    BoundingType,
    DeclaringType,
    MultiType,
    TypeRef,
    DeclaredTypeRef,

    // Structural roles.
    Root,
    Member,
    Body,
    Statement,
    Parameter,
    Condition,
    Then,
    Else,
    Expression,
    Target,
    Argument(u32),
    Assigned,
    AssignedValue,
    DefaultExpression,
    LeftOperand,
    RightOperand,
    Operand,
    Index,
    Dimension,
    Element,
    Selector,
    Case,
    Catcher,
    Finalizer,
    ForInit,
    ForUpdate,
    Annotation,
    Value,
}

/// One node of the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub role: Role,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
    /// Compiler-inserted (implicit `this`, default constructor, implicit `super()` ...).
    #[serde(default)]
    pub implicit: bool,
    /// Static type for expressions; declared type for variables and methods.
    #[serde(default)]
    pub ty: Option<JavaType>,
}

impl Node {
    pub fn new(kind: NodeKind, role: Role) -> Self {
        Self {
            kind,
            role,
            parent: None,
            children: Vec::new(),
            position: None,
            implicit: false,
            ty: None,
        }
    }

    pub fn at(mut self, file: impl Into<PathBuf>, line: u32) -> Self {
        self.position = Some(SourcePosition::new(file, line));
        self
    }

    pub fn spanning(mut self, file: impl Into<PathBuf>, line: u32, end_line: u32) -> Self {
        self.position = Some(SourcePosition::spanning(file, line, end_line));
        self
    }

    pub fn typed(mut self, ty: JavaType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }

    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }
}

/// Arena holding every node of a client; compilation units are the roots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTree {
    nodes: Vec<Node>,
    units: Vec<NodeId>,
}

impl SourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a compilation unit root.
    pub fn add_unit(&mut self, package: impl Into<String>, file: impl Into<PathBuf>) -> NodeId {
        let node = Node::new(
            NodeKind::CompilationUnit {
                package: package.into(),
            },
            Role::Root,
        )
        .at(file, 1);
        let id = self.push(node);
        self.units.push(id);
        id
    }

    /// Appends `node` as the last child of `parent`.
    pub fn add(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        node.parent = Some(parent);
        let id = self.push(node);
        self.nodes[parent.index()].children.push(id);
        id
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn units(&self) -> &[NodeId] {
        &self.units
    }

    /// Node by id. Ids handed out by this tree (or accepted by
    /// [`SourceTree::validate`]) are always in range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// First child playing `role`.
    pub fn child_with_role(&self, id: NodeId, role: Role) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.node(*c).role == role)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Nearest strict ancestor whose tag is one of `tags`.
    pub fn enclosing(&self, id: NodeId, tags: &[NodeTag]) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| tags.contains(&self.node(*a).tag()))
    }

    /// Qualified name of the nearest enclosing type declaration, the node
    /// itself included.
    pub fn enclosing_type(&self, id: NodeId) -> Option<&str> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|a| match &self.node(a).kind {
                NodeKind::TypeDeclaration { name } => Some(name.as_str()),
                _ => None,
            })
    }

    /// Package of the compilation unit holding `id`.
    pub fn package_of(&self, id: NodeId) -> &str {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find_map(|a| match &self.node(a).kind {
                NodeKind::CompilationUnit { package } => Some(package.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }

    /// The node itself when it has a position, else the nearest locatable ancestor.
    pub fn locatable(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|a| self.node(*a).position.is_some())
    }

    /// Located element for `id`, falling back to the first locatable parent.
    pub fn element(&self, id: NodeId) -> SourceElement {
        match self.locatable(id) {
            Some(located) => {
                let node = self.node(located);
                SourceElement {
                    position: node.position.clone(),
                    label: node.kind.describe(),
                }
            }
            None => SourceElement {
                position: None,
                label: self.node(id).kind.describe(),
            },
        }
    }

    /// Pre-order walk of the subtree rooted at `root`.
    pub fn walk(&self, root: NodeId) -> Walk<'_> {
        Walk {
            tree: self,
            stack: vec![root],
        }
    }

    /// Checks parent/child links of a deserialized tree.
    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len() as u32;
        for unit in &self.units {
            if unit.0 >= len {
                return Err(ImpactError::Provider(format!(
                    "compilation unit {} out of range",
                    unit.0
                )));
            }
            if !matches!(self.node(*unit).kind, NodeKind::CompilationUnit { .. }) {
                return Err(ImpactError::Provider(format!(
                    "root {} is not a compilation unit",
                    unit.0
                )));
            }
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                let Some(child_node) = self.nodes.get(child.index()) else {
                    return Err(ImpactError::Provider(format!(
                        "node {idx} has dangling child {}",
                        child.0
                    )));
                };
                if child_node.parent != Some(NodeId(idx as u32)) {
                    return Err(ImpactError::Provider(format!(
                        "node {} does not point back to parent {idx}",
                        child.0
                    )));
                }
            }
        }

        // Every node hangs below exactly one unit, so parent chains end.
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = self.units.clone();
        for unit in &self.units {
            if self.node(*unit).parent.is_some() {
                return Err(ImpactError::Provider(format!(
                    "compilation unit {} has a parent",
                    unit.0
                )));
            }
        }
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut seen[current.index()], true) {
                return Err(ImpactError::Provider(format!(
                    "node {} is reachable twice",
                    current.0
                )));
            }
            stack.extend(self.node(current).children.iter().copied());
        }
        if let Some(orphan) = seen.iter().position(|visited| !visited) {
            return Err(ImpactError::Provider(format!(
                "node {orphan} is not reachable from a compilation unit"
            )));
        }
        Ok(())
    }
}

pub struct Ancestors<'a> {
    tree: &'a SourceTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Walk<'a> {
    tree: &'a SourceTree,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}
