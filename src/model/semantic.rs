//! Semantic source model: declared types and members, subtype and
//! overriding queries, plus the in-memory/JSON implementation.

use crate::error::{ImpactError, Result};
use crate::model::tree::{SourcePosition, SourceTree};
use crate::model::types::{AccessLevel, JavaType, OBJECT, SymbolRef, package_of};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

const DEPRECATED: &str = "java.lang.Deprecated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub ty: JavaType,
    #[serde(default = "default_access")]
    pub access: AccessLevel,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableInfo {
    pub name: String,
    #[serde(default)]
    pub params: Vec<JavaType>,
    #[serde(default = "default_return")]
    pub returns: JavaType,
    #[serde(default = "default_access")]
    pub access: AccessLevel,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub thrown: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

fn default_access() -> AccessLevel {
    AccessLevel::Public
}

fn default_return() -> JavaType {
    JavaType::VOID
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default = "default_access")]
    pub access: AccessLevel,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_final: bool,
    /// Structural anonymity flag. Models that cannot provide it leave it
    /// unset and callers fall back to the binary-name heuristic.
    #[serde(default)]
    pub anonymous: Option<bool>,
    #[serde(default)]
    pub enclosing: Option<String>,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub executables: Vec<ExecutableInfo>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub position: Option<SourcePosition>,
}

impl TypeInfo {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            access: AccessLevel::Public,
            is_abstract: kind == TypeKind::Interface,
            is_final: false,
            anonymous: None,
            enclosing: None,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            executables: Vec::new(),
            annotations: Vec::new(),
            position: None,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn final_class(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn anonymous_in(mut self, enclosing: impl Into<String>) -> Self {
        self.anonymous = Some(true);
        self.enclosing = Some(enclosing.into());
        self
    }

    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn executable(mut self, executable: ExecutableInfo) -> Self {
        self.executables.push(executable);
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn at(mut self, file: impl Into<PathBuf>, line: u32, end_line: u32) -> Self {
        self.position = Some(SourcePosition::spanning(file, line, end_line));
        self
    }

    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Concrete class that must implement every inherited abstract member.
    pub fn is_concrete_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class | TypeKind::Enum | TypeKind::Record) && !self.is_abstract
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
            .unwrap_or_else(|| crate::model::types::looks_anonymous(&self.name))
    }

    /// Direct supertypes: superclass first, then interfaces in declaration order.
    pub fn direct_supertypes(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_executable(&self, name: &str, params: &[JavaType]) -> Option<&ExecutableInfo> {
        self.executables
            .iter()
            .find(|e| e.name == name && e.params == params)
    }
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, ty: JavaType) -> Self {
        Self {
            name: name.into(),
            ty,
            access: AccessLevel::Public,
            is_static: false,
            is_final: false,
            annotations: Vec::new(),
            position: None,
        }
    }

    pub fn access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn static_field(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn at(mut self, file: impl Into<PathBuf>, line: u32) -> Self {
        self.position = Some(SourcePosition::new(file, line));
        self
    }
}

impl ExecutableInfo {
    pub fn method(name: impl Into<String>, params: Vec<JavaType>, returns: JavaType) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            access: AccessLevel::Public,
            is_abstract: false,
            is_static: false,
            is_final: false,
            is_default: false,
            thrown: Vec::new(),
            annotations: Vec::new(),
            position: None,
        }
    }

    pub fn constructor(params: Vec<JavaType>) -> Self {
        Self::method(crate::model::types::CONSTRUCTOR_NAME, params, JavaType::VOID)
    }

    pub fn abstract_method(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn throws(mut self, exception: impl Into<String>) -> Self {
        self.thrown.push(exception.into());
        self
    }

    pub fn annotated(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn at(mut self, file: impl Into<PathBuf>, line: u32) -> Self {
        self.position = Some(SourcePosition::new(file, line));
        self
    }

    pub fn symbol(&self, owner: &str) -> SymbolRef {
        SymbolRef::method(owner, self.name.clone(), self.params.clone())
    }

    pub fn is_constructor(&self) -> bool {
        self.name == crate::model::types::CONSTRUCTOR_NAME
    }

    /// Can take part in overriding: instance, non-private, not a constructor.
    pub fn is_overridable(&self) -> bool {
        !self.is_static && !self.is_constructor() && self.access != AccessLevel::Private
    }
}

/// Read access to a type-resolved source tree.
///
/// Implementors only need [`SemanticModel::tree`] and
/// [`SemanticModel::type_info`]; every other query derives from them.
pub trait SemanticModel {
    fn tree(&self) -> &SourceTree;

    fn type_info(&self, name: &str) -> Option<&TypeInfo>;

    /// Reflexive, transitive subtype test over superclasses and interfaces.
    /// Every type is a subtype of `java.lang.Object`.
    fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == OBJECT {
            return true;
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sub.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(info) = self.type_info(&current) else {
                continue;
            };
            for parent in info.direct_supertypes() {
                if parent == sup {
                    return true;
                }
                queue.push_back(parent.to_string());
            }
        }
        false
    }

    /// Every known supertype of `name`, breadth first, excluding `name`.
    fn all_supertypes(&self, name: &str) -> Vec<String> {
        let mut seen = HashSet::from([name.to_string()]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            let Some(info) = self.type_info(&current) else {
                continue;
            };
            for parent in info.direct_supertypes() {
                if seen.insert(parent.to_string()) {
                    out.push(parent.to_string());
                    queue.push_back(parent.to_string());
                }
            }
        }
        out
    }

    fn field_info(&self, field: &SymbolRef) -> Option<&FieldInfo> {
        match field {
            SymbolRef::Field { owner, name } => self.type_info(owner)?.find_field(name),
            _ => None,
        }
    }

    fn executable_info(&self, executable: &SymbolRef) -> Option<&ExecutableInfo> {
        match executable {
            SymbolRef::Executable { owner, name, params } => {
                self.type_info(owner)?.find_executable(name, params)
            }
            _ => None,
        }
    }

    /// Whether the symbol is declared in this model.
    fn resolves(&self, symbol: &SymbolRef) -> bool {
        match symbol {
            SymbolRef::Type { name } => self.type_info(name).is_some(),
            SymbolRef::Field { .. } => self.field_info(symbol).is_some(),
            SymbolRef::Executable { .. } => self.executable_info(symbol).is_some(),
        }
    }

    fn access_of(&self, symbol: &SymbolRef) -> Option<AccessLevel> {
        match symbol {
            SymbolRef::Type { name } => self.type_info(name).map(|t| t.access),
            SymbolRef::Field { .. } => self.field_info(symbol).map(|f| f.access),
            SymbolRef::Executable { .. } => self.executable_info(symbol).map(|e| e.access),
        }
    }

    fn is_annotated(&self, symbol: &SymbolRef, annotation: &str) -> bool {
        let annotations = match symbol {
            SymbolRef::Type { name } => self.type_info(name).map(|t| &t.annotations),
            SymbolRef::Field { .. } => self.field_info(symbol).map(|f| &f.annotations),
            SymbolRef::Executable { .. } => self.executable_info(symbol).map(|e| &e.annotations),
        };
        annotations.is_some_and(|a| a.iter().any(|n| n == annotation))
    }

    fn is_deprecated(&self, symbol: &SymbolRef) -> bool {
        self.is_annotated(symbol, DEPRECATED)
    }

    fn declaration_position(&self, symbol: &SymbolRef) -> Option<&SourcePosition> {
        match symbol {
            SymbolRef::Type { name } => self.type_info(name)?.position.as_ref(),
            SymbolRef::Field { .. } => self.field_info(symbol)?.position.as_ref(),
            SymbolRef::Executable { .. } => self.executable_info(symbol)?.position.as_ref(),
        }
    }

    /// Executables `method` overrides, searched through every supertype of
    /// its declaring type. `method` need not be declared in this model as
    /// long as its owner is.
    fn overridden_executables(&self, method: &SymbolRef) -> Vec<SymbolRef> {
        let SymbolRef::Executable { owner, name, params } = method else {
            return Vec::new();
        };
        if method.is_constructor() {
            return Vec::new();
        }
        if self
            .executable_info(method)
            .is_some_and(|own| !own.is_overridable())
        {
            return Vec::new();
        }
        self.all_supertypes(owner)
            .into_iter()
            .filter_map(|sup| {
                let info = self.type_info(&sup)?;
                let candidate = info.find_executable(name, params)?;
                candidate.is_overridable().then(|| candidate.symbol(&sup))
            })
            .collect()
    }

    /// Non-abstract executable matching `method`'s signature in `ty` or one of
    /// its supertypes, other than `method` itself.
    fn implementation_in(&self, ty: &str, method: &SymbolRef) -> Option<SymbolRef> {
        let SymbolRef::Executable { name, params, .. } = method else {
            return None;
        };
        std::iter::once(ty.to_string())
            .chain(self.all_supertypes(ty))
            .filter(|candidate| candidate != method.owner_type())
            .find_map(|candidate| {
                let info = self.type_info(&candidate)?;
                let found = info.find_executable(name, params)?;
                (!found.is_abstract && !found.is_static).then(|| found.symbol(&candidate))
            })
    }
}

/// Serializable in-memory model: type table plus source tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModelDocument", into = "ModelDocument")]
pub struct CodeModel {
    types: BTreeMap<String, TypeInfo>,
    tree: SourceTree,
}

#[derive(Serialize, Deserialize)]
struct ModelDocument {
    #[serde(default)]
    types: Vec<TypeInfo>,
    #[serde(default)]
    tree: SourceTree,
}

impl From<ModelDocument> for CodeModel {
    fn from(doc: ModelDocument) -> Self {
        let mut model = CodeModel {
            types: BTreeMap::new(),
            tree: doc.tree,
        };
        for ty in doc.types {
            model.add_type(ty);
        }
        model
    }
}

impl From<CodeModel> for ModelDocument {
    fn from(model: CodeModel) -> Self {
        ModelDocument {
            types: model.types.into_values().collect(),
            tree: model.tree,
        }
    }
}

impl CodeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a type declaration.
    pub fn add_type(&mut self, info: TypeInfo) -> &mut Self {
        self.types.insert(info.name.clone(), info);
        self
    }

    pub fn with_type(mut self, info: TypeInfo) -> Self {
        self.add_type(info);
        self
    }

    pub fn tree_mut(&mut self) -> &mut SourceTree {
        &mut self.tree
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.values()
    }

    /// Adds the types of `other` that this model does not declare itself.
    /// Used to put library declarations on a client's classpath.
    pub fn merge_types_from(&mut self, other: &CodeModel) {
        for (name, info) in &other.types {
            self.types
                .entry(name.clone())
                .or_insert_with(|| info.clone());
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let model: CodeModel = serde_json::from_str(json)?;
        model.tree.validate()?;
        Ok(model)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ImpactError::Provider(format!("failed to read model '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }
}

impl SemanticModel for CodeModel {
    fn tree(&self) -> &SourceTree {
        &self.tree
    }

    fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }
}

/// Produces a semantic model for a source root.
pub trait SourceModelProvider: Send + Sync {
    fn load(&self, root: &Path, classpath: &[PathBuf]) -> Result<Box<dyn SemanticModel>>;
}

/// File a [`JsonModelProvider`] expects at the root of every source tree.
pub const MODEL_FILE_NAME: &str = "impact-model.json";

/// Loads `<root>/impact-model.json`; classpath entries are further model
/// files whose declarations become visible to the client.
#[derive(Debug, Clone, Default)]
pub struct JsonModelProvider;

impl SourceModelProvider for JsonModelProvider {
    fn load(&self, root: &Path, classpath: &[PathBuf]) -> Result<Box<dyn SemanticModel>> {
        if !root.is_dir() {
            return Err(ImpactError::InvalidInput(format!(
                "{} is not a source directory",
                root.display()
            )));
        }
        let mut model = CodeModel::from_json_file(&root.join(MODEL_FILE_NAME))?;
        for entry in classpath {
            let path = if entry.is_dir() {
                entry.join(MODEL_FILE_NAME)
            } else {
                entry.clone()
            };
            let library = CodeModel::from_json_file(&path)?;
            model.merge_types_from(&library);
        }
        Ok(Box::new(model))
    }
}
