//! Semantic source model of library and client code.
//!
//! The model is what detectors query: a closed node taxonomy arranged as an
//! arena tree, declared types with their members, and subtype/override
//! resolution. [`CodeModel`] is the in-memory implementation used by the
//! JSON provider and by tests.

pub mod semantic;
pub mod tree;
pub mod types;
pub mod typing;

pub use semantic::{
    CodeModel, ExecutableInfo, FieldInfo, JsonModelProvider, MODEL_FILE_NAME, SemanticModel,
    SourceModelProvider, TypeInfo, TypeKind,
};
pub use tree::{
    BinaryOp, Node, NodeId, NodeKind, NodeTag, Role, SourceElement, SourcePosition, SourceTree,
    UnaryOp,
};
pub use types::{AccessLevel, DeclarationLevel, JavaType, Primitive, SymbolRef};
