#![allow(dead_code)]

use api_impact::compat::make_detector;
use api_impact::model::{
    ExecutableInfo, FieldInfo, JavaType, Node, NodeId, NodeKind, Role, SourceModelProvider, TypeInfo,
};
use api_impact::{
    ApiDiffProvider, ApiUse, BreakingChange, BrokenUse, ChangeKind, ChangeMetadata, ClientSource,
    ClientSpec, CodeModel, ImpactError, LibraryVersion, RawChange, SemanticModel, SymbolRef, Traversal,
};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Old version of the library every scenario runs against.
pub fn library() -> CodeModel {
    CodeModel::new()
        .with_type(
            TypeInfo::class("lib.Foo")
                .at("lib/Foo.java", 1, 40)
                .executable(ExecutableInfo::constructor(vec![]).at("lib/Foo.java", 4))
                .executable(ExecutableInfo::method("foo", vec![], JavaType::VOID).at("lib/Foo.java", 6))
                .executable(ExecutableInfo::method("count", vec![], JavaType::INT).at("lib/Foo.java", 8))
                .field(FieldInfo::new("x", JavaType::INT).at("lib/Foo.java", 2))
                .field(FieldInfo::new("LIMIT", JavaType::INT).static_field().at("lib/Foo.java", 3)),
        )
        .with_type(
            TypeInfo::interface("lib.Shape")
                .at("lib/Shape.java", 1, 5)
                .executable(ExecutableInfo::method("area", vec![], JavaType::INT).abstract_method()),
        )
        .with_type(
            TypeInfo::class("lib.Widget")
                .implements("lib.Shape")
                .at("lib/Widget.java", 1, 10)
                .executable(ExecutableInfo::method("area", vec![], JavaType::INT)),
        )
        .with_type(
            TypeInfo::class("lib.Base")
                .abstract_class()
                .at("lib/Base.java", 1, 10)
                .executable(ExecutableInfo::method("run", vec![], JavaType::VOID).at("lib/Base.java", 3)),
        )
        .with_type(TypeInfo::class("lib.Failure").extends("java.lang.RuntimeException"))
}

/// A client model with the library on its classpath.
pub fn client_model() -> CodeModel {
    let mut model = CodeModel::new();
    model.merge_types_from(&library());
    model
}

pub fn old_version() -> LibraryVersion {
    LibraryVersion::new("org.example:lib:1.0.0")
}

pub fn new_version() -> LibraryVersion {
    LibraryVersion::new("org.example:lib:2.0.0")
}

pub fn change(kind: ChangeKind, subject: SymbolRef, metadata: ChangeMetadata) -> BreakingChange {
    BreakingChange::new(kind, subject, metadata).unwrap()
}

pub fn foo_method() -> SymbolRef {
    SymbolRef::method("lib.Foo", "foo", vec![])
}

pub fn foo_constructor() -> SymbolRef {
    SymbolRef::constructor("lib.Foo", vec![])
}

pub fn node(kind: NodeKind, role: Role, file: &str, line: u32) -> Node {
    Node::new(kind, role).at(file, line)
}

pub fn type_ref(target: &str, role: Role) -> Node {
    Node::new(NodeKind::TypeReference { target: target.to_string() }, role)
}

/// Adds a class declaration spanning `line..end_line` to `unit`.
pub fn class(model: &mut CodeModel, unit: NodeId, name: &str, file: &str, line: u32, end_line: u32) -> NodeId {
    model.tree_mut().add(
        unit,
        Node::new(NodeKind::TypeDeclaration { name: name.to_string() }, Role::Member)
            .spanning(file, line, end_line),
    )
}

/// Adds a method declaration with an empty body; returns (method, body).
pub fn method(
    model: &mut CodeModel,
    class: NodeId,
    symbol: SymbolRef,
    returns: JavaType,
    file: &str,
    line: u32,
) -> (NodeId, NodeId) {
    let tree = model.tree_mut();
    let method = tree.add(
        class,
        node(NodeKind::MethodDeclaration { method: symbol }, Role::Member, file, line).typed(returns),
    );
    let body = tree.add(method, Node::new(NodeKind::Block, Role::Body));
    (method, body)
}

/// Runs a fresh detector set for `changes` over `model`.
pub fn detect(changes: &[BreakingChange], model: &dyn SemanticModel) -> Result<BTreeSet<BrokenUse>, ImpactError> {
    let mut detectors = Vec::new();
    for change in changes {
        if let Some(detector) = make_detector(change)? {
            detectors.push(detector);
        }
    }
    Traversal::new(detectors).run(model)
}

/// (use, line) of every finding, ordered by line.
pub fn found(uses: &BTreeSet<BrokenUse>) -> Vec<(ApiUse, u32)> {
    let mut found: Vec<_> = uses
        .iter()
        .map(|u| (u.api_use, u.element.position.as_ref().map(|p| p.line).unwrap_or(0)))
        .collect();
    found.sort_by_key(|(api_use, line)| (*line, *api_use));
    found
}

/// `app.Main` calling `new Foo().foo()` at line 4 of `app/Main.java`.
pub fn method_removed_client() -> CodeModel {
    let file = "app/Main.java";
    let mut model = client_model().with_type(
        TypeInfo::class("app.Main").executable(ExecutableInfo::method("main", vec![], JavaType::VOID)),
    );
    let unit = model.tree_mut().add_unit("app", file);
    let main = class(&mut model, unit, "app.Main", file, 1, 10);
    let (_, body) = method(
        &mut model,
        main,
        SymbolRef::method("app.Main", "main", vec![]),
        JavaType::VOID,
        file,
        3,
    );
    let tree = model.tree_mut();
    let call = tree.add(
        body,
        node(NodeKind::Invocation { executable: foo_method() }, Role::Statement, file, 4).typed(JavaType::VOID),
    );
    tree.add(
        call,
        node(NodeKind::ConstructorCall { executable: foo_constructor() }, Role::Target, file, 4)
            .typed(JavaType::reference("lib.Foo")),
    );
    model
}

/// Diff provider returning a fixed set of entries.
pub struct StaticDiff(pub Vec<RawChange>);

impl ApiDiffProvider for StaticDiff {
    fn diff(&self, _old: &LibraryVersion, _new: &LibraryVersion) -> api_impact::Result<Vec<RawChange>> {
        Ok(self.0.clone())
    }
}

/// Models keyed by source root. Loading a root listed in `panics` panics.
#[derive(Default)]
pub struct StaticModels {
    pub models: HashMap<PathBuf, CodeModel>,
    pub panics: Vec<PathBuf>,
}

impl StaticModels {
    pub fn with(mut self, root: &str, model: CodeModel) -> Self {
        self.models.insert(PathBuf::from(root), model);
        self
    }

    pub fn panicking(mut self, root: &str) -> Self {
        self.panics.push(PathBuf::from(root));
        self
    }
}

impl SourceModelProvider for StaticModels {
    fn load(&self, root: &Path, _classpath: &[PathBuf]) -> api_impact::Result<Box<dyn SemanticModel>> {
        if self.panics.iter().any(|p| p == root) {
            panic!("model provider crashed on {}", root.display());
        }
        match self.models.get(root) {
            Some(model) => Ok(Box::new(model.clone())),
            None => Err(ImpactError::Provider(format!("no model for {}", root.display()))),
        }
    }
}

/// Client source that stalls while fetching the listed clients.
#[derive(Default)]
pub struct SlowSource {
    pub slow: Vec<String>,
    pub delay: Duration,
}

impl ClientSource for SlowSource {
    fn fetch(&self, client: &ClientSpec) -> api_impact::Result<PathBuf> {
        if self.slow.contains(&client.id) {
            std::thread::sleep(self.delay);
        }
        Ok(client.root.clone())
    }

    fn build(&self, client: &ClientSpec, _root: &Path) -> api_impact::Result<Vec<PathBuf>> {
        Ok(client.classpath.clone())
    }
}
