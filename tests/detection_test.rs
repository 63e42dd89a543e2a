mod common;

use api_impact::model::{AccessLevel, ExecutableInfo, JavaType, Node, NodeKind, Role, TypeInfo};
use api_impact::{ApiUse, ChangeKind, ChangeMetadata, ImpactError, SymbolRef};
use common::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

#[test]
fn test_removed_method_breaks_invocation_not_instantiation() {
    let removed = change(ChangeKind::MethodRemoved, foo_method(), ChangeMetadata::None);
    let uses = detect(&[removed], &method_removed_client()).unwrap();

    assert_eq!(found(&uses), vec![(ApiUse::MethodInvocation, 4)]);
    let broken = uses.iter().next().unwrap();
    assert_eq!(broken.used_symbol, foo_method());
    assert_eq!(broken.changed_subject, foo_method());
    assert_eq!(broken.kind, ChangeKind::MethodRemoved);
}

#[test]
fn test_removed_method_breaks_overrides() {
    let file = "app/Sub.java";
    let mut model = client_model().with_type(
        TypeInfo::class("app.Sub")
            .extends("lib.Foo")
            .executable(ExecutableInfo::method("foo", vec![], JavaType::VOID)),
    );
    let unit = model.tree_mut().add_unit("app", file);
    let sub = class(&mut model, unit, "app.Sub", file, 1, 8);
    method(&mut model, sub, SymbolRef::method("app.Sub", "foo", vec![]), JavaType::VOID, file, 3);

    let removed = change(ChangeKind::MethodRemoved, foo_method(), ChangeMetadata::None);
    let uses = detect(&[removed.clone()], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodOverride, 3)]);

    let now_final = change(ChangeKind::MethodNowFinal, foo_method(), ChangeMetadata::None);
    let uses = detect(&[now_final], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodOverride, 3)]);
}

#[test]
fn test_removed_type_breaks_every_reference_role() {
    let file = "app/Main.java";
    let mut model = client_model().with_type(TypeInfo::class("app.Main").extends("lib.Foo"));
    let tree = model.tree_mut();
    let unit = tree.add_unit("app", file);
    let import = tree.add(unit, node(NodeKind::Import, Role::Member, file, 2));
    tree.add(import, type_ref("lib.Foo", Role::Import));
    let main = class(&mut model, unit, "app.Main", file, 4, 12);
    let tree = model.tree_mut();
    tree.add(main, type_ref("lib.Foo", Role::SuperType));
    let field = tree.add(
        main,
        node(
            NodeKind::FieldDeclaration { field: SymbolRef::field("app.Main", "foo") },
            Role::Member,
            file,
            6,
        ),
    );
    tree.add(field, type_ref("lib.Foo", Role::Type));
    let other = tree.add(
        main,
        node(
            NodeKind::FieldDeclaration { field: SymbolRef::field("app.Main", "shape") },
            Role::Member,
            file,
            7,
        ),
    );
    tree.add(other, type_ref("lib.Shape", Role::Type));

    let removed = change(ChangeKind::TypeRemoved, SymbolRef::ty("lib.Foo"), ChangeMetadata::None);
    let uses = detect(&[removed], &model).unwrap();
    assert_eq!(
        found(&uses),
        vec![(ApiUse::Import, 2), (ApiUse::Extends, 4), (ApiUse::TypeDependency, 6)]
    );
}

#[test]
fn test_type_reference_in_unknown_role_fails() {
    let file = "app/Main.java";
    let mut model = client_model();
    let unit = model.tree_mut().add_unit("app", file);
    let main = class(&mut model, unit, "app.Main", file, 1, 5);
    model.tree_mut().add(main, type_ref("lib.Foo", Role::Condition));

    let removed = change(ChangeKind::TypeRemoved, SymbolRef::ty("lib.Foo"), ChangeMetadata::None);
    assert!(matches!(detect(&[removed], &model), Err(ImpactError::UnmanagedRole(_))));
}

/// One field of type `lib.Foo` in package `lib` and one in package `app`.
fn two_package_client() -> api_impact::CodeModel {
    let mut model = client_model().with_type(TypeInfo::class("app.Sub").extends("lib.Foo"));
    for (package, file, name) in [("lib", "lib/Helper.java", "lib.Helper"), ("app", "app/Sub.java", "app.Sub")] {
        let unit = model.tree_mut().add_unit(package, file);
        let declared = class(&mut model, unit, name, file, 1, 9);
        let field = model.tree_mut().add(
            declared,
            node(
                NodeKind::FieldDeclaration { field: SymbolRef::field(name, "foo") },
                Role::Member,
                file,
                3,
            ),
        );
        model.tree_mut().add(field, type_ref("lib.Foo", Role::Type));
    }
    model
}

fn less_accessible(new: AccessLevel) -> api_impact::BreakingChange {
    change(
        ChangeKind::TypeLessAccessible,
        SymbolRef::ty("lib.Foo"),
        ChangeMetadata::Access { old: AccessLevel::Public, new },
    )
}

#[test]
fn test_package_restricted_type_breaks_other_packages_only() {
    let uses = detect(&[less_accessible(AccessLevel::Package)], &two_package_client()).unwrap();
    assert_eq!(uses.len(), 1);
    let position = uses.iter().next().unwrap().element.position.clone().unwrap();
    assert_eq!(position.file, std::path::PathBuf::from("app/Sub.java"));
}

#[test]
fn test_reduced_accessibility_truth_table() {
    let model = two_package_client();
    assert_eq!(detect(&[less_accessible(AccessLevel::Private)], &model).unwrap().len(), 2);
    // app.Sub extends lib.Foo, lib.Helper shares its package.
    assert_eq!(detect(&[less_accessible(AccessLevel::Protected)], &model).unwrap().len(), 0);
    assert_eq!(detect(&[less_accessible(AccessLevel::Public)], &model).unwrap().len(), 0);
}

/// `int y = foo.x;` at line 4, `foo.x = 1;` at line 5, `Object o = foo.x;` at line 6.
fn field_client() -> api_impact::CodeModel {
    let file = "app/Main.java";
    let x = SymbolRef::field("lib.Foo", "x");
    let mut model = client_model().with_type(TypeInfo::class("app.Main"));
    let unit = model.tree_mut().add_unit("app", file);
    let main = class(&mut model, unit, "app.Main", file, 1, 10);
    let (_, body) = method(
        &mut model,
        main,
        SymbolRef::method("app.Main", "run", vec![]),
        JavaType::VOID,
        file,
        3,
    );
    let tree = model.tree_mut();
    let y = tree.add(
        body,
        node(NodeKind::LocalVariable { name: "y".into() }, Role::Statement, file, 4).typed(JavaType::INT),
    );
    tree.add(
        y,
        node(NodeKind::FieldRead { field: x.clone() }, Role::DefaultExpression, file, 4).typed(JavaType::INT),
    );
    let assignment = tree.add(
        body,
        node(NodeKind::Assignment { compound: false }, Role::Statement, file, 5).typed(JavaType::INT),
    );
    tree.add(
        assignment,
        node(NodeKind::FieldWrite { field: x.clone() }, Role::Assigned, file, 5).typed(JavaType::INT),
    );
    tree.add(
        assignment,
        node(NodeKind::Literal, Role::AssignedValue, file, 5).typed(JavaType::INT),
    );
    let o = tree.add(
        body,
        node(NodeKind::LocalVariable { name: "o".into() }, Role::Statement, file, 6)
            .typed(JavaType::reference("java.lang.Object")),
    );
    tree.add(
        o,
        node(NodeKind::FieldRead { field: x }, Role::DefaultExpression, file, 6).typed(JavaType::INT),
    );
    model
}

#[test]
fn test_field_removed_and_now_final() {
    let x = SymbolRef::field("lib.Foo", "x");
    let removed = change(ChangeKind::FieldRemoved, x.clone(), ChangeMetadata::None);
    let uses = detect(&[removed], &field_client()).unwrap();
    assert_eq!(
        found(&uses),
        vec![(ApiUse::FieldAccess, 4), (ApiUse::FieldAccess, 5), (ApiUse::FieldAccess, 6)]
    );

    let now_final = change(ChangeKind::FieldNowFinal, x, ChangeMetadata::None);
    let uses = detect(&[now_final], &field_client()).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::FieldAccess, 5)]);
}

#[test]
fn test_field_type_changed_checks_each_context() {
    let x = SymbolRef::field("lib.Foo", "x");
    let to_string = change(
        ChangeKind::FieldTypeChanged,
        x,
        ChangeMetadata::TypeChange {
            old: JavaType::INT,
            new: JavaType::reference("java.lang.String"),
        },
    );
    let uses = detect(&[to_string], &field_client()).unwrap();
    // `Object o = foo.x` still compiles.
    assert_eq!(found(&uses), vec![(ApiUse::FieldAccess, 4), (ApiUse::FieldAccess, 5)]);
}

#[test]
fn test_field_type_changed_in_unknown_context_fails() {
    let file = "app/Main.java";
    let x = SymbolRef::field("lib.Foo", "x");
    let mut model = client_model();
    let unit = model.tree_mut().add_unit("app", file);
    let main = class(&mut model, unit, "app.Main", file, 1, 10);
    let (_, body) = method(&mut model, main, SymbolRef::method("app.Main", "run", vec![]), JavaType::INT, file, 2);
    let tree = model.tree_mut();
    let ret = tree.add(body, node(NodeKind::Return, Role::Statement, file, 3));
    tree.add(ret, node(NodeKind::FieldWrite { field: x.clone() }, Role::Expression, file, 3));

    let changed = change(
        ChangeKind::FieldTypeChanged,
        x,
        ChangeMetadata::TypeChange { old: JavaType::INT, new: JavaType::BOOLEAN },
    );
    assert!(matches!(detect(&[changed], &model), Err(ImpactError::UnhandledContext { .. })));
}

#[test]
fn test_field_no_longer_static_breaks_explicit_static_access() {
    let file = "app/Main.java";
    let limit = SymbolRef::field("lib.Foo", "LIMIT");
    let mut model = client_model().with_type(TypeInfo::class("app.Sub").extends("lib.Foo"));
    let unit = model.tree_mut().add_unit("app", file);
    let sub = class(&mut model, unit, "app.Sub", file, 1, 10);
    let (_, body) = method(&mut model, sub, SymbolRef::method("app.Sub", "run", vec![]), JavaType::VOID, file, 2);
    let tree = model.tree_mut();
    let explicit = tree.add(body, node(NodeKind::FieldRead { field: limit.clone() }, Role::Statement, file, 3));
    tree.add(explicit, node(NodeKind::TypeAccess { target: "lib.Foo".into() }, Role::Target, file, 3));
    let unqualified = tree.add(
        body,
        node(NodeKind::FieldRead { field: SymbolRef::field("app.Sub", "LIMIT") }, Role::Statement, file, 4),
    );
    tree.add(
        unqualified,
        Node::new(NodeKind::TypeAccess { target: "app.Sub".into() }, Role::Target).implicit(),
    );

    let changed = change(ChangeKind::FieldNoLongerStatic, limit, ChangeMetadata::None);
    let uses = detect(&[changed], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::FieldAccess, 3)]);
}

#[test]
fn test_removed_constructor_breaks_implicit_super_call() {
    let file = "app/Sub.java";
    let mut model = client_model()
        .with_type(TypeInfo::class("app.Sub").extends("lib.Foo"))
        .with_type(TypeInfo::class("app.Main"));
    let unit = model.tree_mut().add_unit("app", file);
    let sub = class(&mut model, unit, "app.Sub", file, 10, 20);
    let tree = model.tree_mut();
    let ctor = tree.add(
        sub,
        Node::new(
            NodeKind::ConstructorDeclaration { constructor: SymbolRef::constructor("app.Sub", vec![]) },
            Role::Member,
        )
        .implicit(),
    );
    let body = tree.add(ctor, Node::new(NodeKind::Block, Role::Body).implicit());
    tree.add(
        body,
        Node::new(NodeKind::Invocation { executable: foo_constructor() }, Role::Statement).implicit(),
    );
    let main = class(&mut model, unit, "app.Main", file, 22, 30);
    let (_, body) = method(&mut model, main, SymbolRef::method("app.Main", "make", vec![]), JavaType::VOID, file, 23);
    model.tree_mut().add(
        body,
        node(NodeKind::ConstructorCall { executable: foo_constructor() }, Role::Statement, file, 24),
    );

    let removed = change(ChangeKind::ConstructorRemoved, foo_constructor(), ChangeMetadata::None);
    let uses = detect(&[removed], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodInvocation, 10), (ApiUse::Instantiation, 24)]);
}

#[test]
fn test_method_now_abstract_breaks_concrete_subclasses_without_implementation() {
    let file = "app/Impl.java";
    let mut model = client_model()
        .with_type(TypeInfo::class("app.Impl").extends("lib.Base"))
        .with_type(
            TypeInfo::class("app.Done")
                .extends("lib.Base")
                .executable(ExecutableInfo::method("run", vec![], JavaType::VOID)),
        )
        .with_type(TypeInfo::class("app.Partial").extends("lib.Base").abstract_class());
    let unit = model.tree_mut().add_unit("app", file);
    class(&mut model, unit, "app.Impl", file, 1, 5);
    class(&mut model, unit, "app.Done", file, 7, 12);
    class(&mut model, unit, "app.Partial", file, 14, 16);

    let run = SymbolRef::method("lib.Base", "run", vec![]);
    let changed = change(ChangeKind::MethodNowAbstract, run, ChangeMetadata::None);
    let uses = detect(&[changed], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::Extends, 1)]);
    assert_eq!(uses.iter().next().unwrap().used_symbol, SymbolRef::ty("lib.Base"));
}

#[test]
fn test_member_added_to_interface_breaks_concrete_implementors() {
    let file = "app/Square.java";
    let mut model = client_model()
        .with_type(TypeInfo::class("app.Square").implements("lib.Shape"))
        .with_type(TypeInfo::class("app.Tile").extends("lib.Widget"))
        .with_type(TypeInfo::class("app.Outline").implements("lib.Shape").abstract_class());
    let unit = model.tree_mut().add_unit("app", file);
    class(&mut model, unit, "app.Square", file, 1, 5);
    class(&mut model, unit, "app.Tile", file, 7, 9);
    class(&mut model, unit, "app.Outline", file, 11, 13);

    let added = change(ChangeKind::MemberAddedToInterface, SymbolRef::ty("lib.Shape"), ChangeMetadata::None);
    let uses = detect(&[added], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::Implements, 1), (ApiUse::Extends, 7)]);
}

#[test]
fn test_removed_interface_breaks_overrides_it_alone_declared() {
    let file = "app/Tile.java";
    let mut model = client_model().with_type(
        TypeInfo::class("app.Tile")
            .extends("lib.Widget")
            .executable(ExecutableInfo::method("area", vec![], JavaType::INT)),
    );
    let unit = model.tree_mut().add_unit("app", file);
    let tile = class(&mut model, unit, "app.Tile", file, 1, 6);
    method(&mut model, tile, SymbolRef::method("app.Tile", "area", vec![]), JavaType::INT, file, 3);

    let removed = change(
        ChangeKind::InterfaceRemoved,
        SymbolRef::ty("lib.Widget"),
        ChangeMetadata::Supertypes { types: BTreeSet::from(["lib.Shape".to_string()]) },
    );
    let uses = detect(&[removed], &model).unwrap();
    // lib.Widget still declares area(), so the override survives.
    assert!(uses.is_empty());

    // Same client against a lib.Widget that never declared area() itself.
    let mut stripped = model.clone();
    stripped.add_type(TypeInfo::class("lib.Widget").implements("lib.Shape"));
    let removed = change(
        ChangeKind::InterfaceRemoved,
        SymbolRef::ty("lib.Widget"),
        ChangeMetadata::Supertypes { types: BTreeSet::from(["lib.Shape".to_string()]) },
    );
    let uses = detect(&[removed], &stripped).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodOverride, 3)]);
    assert_eq!(
        uses.iter().next().unwrap().used_symbol,
        SymbolRef::method("lib.Shape", "area", vec![])
    );
}

#[test]
fn test_checked_exception_breaks_unhandled_throws() {
    let file = "app/Main.java";
    let failure = JavaType::reference("lib.Failure");
    let mut model = client_model().with_type(
        TypeInfo::class("app.Main")
            .executable(ExecutableInfo::method("fail", vec![], JavaType::VOID))
            .executable(ExecutableInfo::method("declared", vec![], JavaType::VOID).throws("lib.Failure")),
    );
    let unit = model.tree_mut().add_unit("app", file);
    let main = class(&mut model, unit, "app.Main", file, 1, 20);
    for (name, line) in [("fail", 3), ("declared", 8)] {
        let (_, body) = method(&mut model, main, SymbolRef::method("app.Main", name, vec![]), JavaType::VOID, file, line);
        let tree = model.tree_mut();
        let throw = tree.add(body, node(NodeKind::Throw, Role::Statement, file, line + 1));
        tree.add(
            throw,
            node(
                NodeKind::ConstructorCall { executable: SymbolRef::constructor("lib.Failure", vec![]) },
                Role::Expression,
                file,
                line + 1,
            )
            .typed(failure.clone()),
        );
    }

    let checked = change(
        ChangeKind::TypeNowCheckedException,
        SymbolRef::ty("lib.Failure"),
        ChangeMetadata::None,
    );
    let uses = detect(&[checked], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::Throws, 4)]);
}

#[test]
fn test_return_type_change_checks_invocation_context() {
    let file = "app/Main.java";
    let count = SymbolRef::method("lib.Foo", "count", vec![]);
    let mut model = client_model();
    let unit = model.tree_mut().add_unit("app", file);
    let main = class(&mut model, unit, "app.Main", file, 1, 10);
    let (_, body) = method(&mut model, main, SymbolRef::method("app.Main", "run", vec![]), JavaType::VOID, file, 2);
    let tree = model.tree_mut();
    let c = tree.add(
        body,
        node(NodeKind::LocalVariable { name: "c".into() }, Role::Statement, file, 3).typed(JavaType::INT),
    );
    tree.add(
        c,
        node(NodeKind::Invocation { executable: count.clone() }, Role::DefaultExpression, file, 3)
            .typed(JavaType::INT),
    );
    tree.add(
        body,
        node(NodeKind::Invocation { executable: count.clone() }, Role::Statement, file, 4).typed(JavaType::INT),
    );

    let changed = change(
        ChangeKind::MethodReturnTypeChanged,
        count,
        ChangeMetadata::TypeChange {
            old: JavaType::INT,
            new: JavaType::reference("java.lang.String"),
        },
    );
    let uses = detect(&[changed], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodInvocation, 3)]);
}

#[test]
fn test_deprecation_breaks_like_removal() {
    let deprecated = change(ChangeKind::AnnotationDeprecatedAdded, foo_method(), ChangeMetadata::None);
    let uses = detect(&[deprecated], &method_removed_client()).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodInvocation, 4)]);
    assert_eq!(uses.iter().next().unwrap().kind, ChangeKind::AnnotationDeprecatedAdded);
}

#[test]
fn test_unsupported_kinds_find_nothing() {
    let changes = [
        change(ChangeKind::MethodNowStatic, foo_method(), ChangeMetadata::None),
        change(ChangeKind::TypeKindChanged, SymbolRef::ty("lib.Foo"), ChangeMetadata::None),
    ];
    assert!(detect(&changes, &method_removed_client()).unwrap().is_empty());
}

#[test]
fn test_each_change_reports_separately() {
    let changes = [
        change(ChangeKind::MethodRemoved, foo_method(), ChangeMetadata::None),
        change(ChangeKind::AnnotationDeprecatedAdded, foo_method(), ChangeMetadata::None),
    ];
    let uses = detect(&changes, &method_removed_client()).unwrap();
    let kinds: Vec<_> = uses.iter().map(|u| u.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&ChangeKind::MethodRemoved));
    assert!(kinds.contains(&ChangeKind::AnnotationDeprecatedAdded));
}

/// `app.Sub extends Foo` (lines 1-8, overriding `foo()` at 3) and `app.Main`
/// with `new Foo()` at 12 and `new Foo() { .. }` spanning 14-16.
fn subclassing_client() -> api_impact::CodeModel {
    let file = "app/Main.java";
    let mut model = client_model()
        .with_type(
            TypeInfo::class("app.Sub")
                .extends("lib.Foo")
                .executable(ExecutableInfo::method("foo", vec![], JavaType::VOID)),
        )
        .with_type(TypeInfo::class("app.Main"))
        .with_type(TypeInfo::class("app.Main$1").extends("lib.Foo").anonymous_in("app.Main"));
    let unit = model.tree_mut().add_unit("app", file);
    let sub = class(&mut model, unit, "app.Sub", file, 1, 8);
    method(&mut model, sub, SymbolRef::method("app.Sub", "foo", vec![]), JavaType::VOID, file, 3);
    let main = class(&mut model, unit, "app.Main", file, 10, 20);
    let (_, body) = method(&mut model, main, SymbolRef::method("app.Main", "make", vec![]), JavaType::VOID, file, 11);
    let tree = model.tree_mut();
    tree.add(
        body,
        node(NodeKind::ConstructorCall { executable: foo_constructor() }, Role::Statement, file, 12)
            .typed(JavaType::reference("lib.Foo")),
    );
    let anonymous = tree.add(
        body,
        node(NodeKind::NewClass { executable: foo_constructor() }, Role::Statement, file, 14)
            .typed(JavaType::reference("app.Main$1")),
    );
    tree.add(
        anonymous,
        Node::new(NodeKind::TypeDeclaration { name: "app.Main$1".into() }, Role::Member)
            .spanning(file, 14, 16),
    );
    model
}

#[test]
fn test_final_type_breaks_subclasses_and_overrides() {
    let now_final = change(ChangeKind::TypeNowFinal, SymbolRef::ty("lib.Foo"), ChangeMetadata::None);
    let uses = detect(&[now_final], &subclassing_client()).unwrap();

    // The anonymous class counts once, through its declaration.
    assert_eq!(
        found(&uses),
        vec![(ApiUse::Extends, 1), (ApiUse::MethodOverride, 3), (ApiUse::Extends, 14)]
    );
    let overridden = uses.iter().find(|u| u.api_use == ApiUse::MethodOverride).unwrap();
    assert_eq!(overridden.used_symbol, foo_method());
}

#[test]
fn test_abstract_type_breaks_instantiations() {
    let now_abstract = change(ChangeKind::TypeNowAbstract, SymbolRef::ty("lib.Foo"), ChangeMetadata::None);
    let uses = detect(&[now_abstract], &subclassing_client()).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::Instantiation, 12), (ApiUse::Instantiation, 14)]);
    assert!(uses.iter().all(|u| u.used_symbol == foo_constructor()));
}

#[test]
fn test_added_interface_breaks_concrete_subclasses_missing_its_methods() {
    let file = "app/Impl.java";
    let mut model = client_model()
        .with_type(TypeInfo::class("app.Impl").extends("lib.Base"))
        .with_type(
            TypeInfo::class("app.Sized")
                .extends("lib.Base")
                .executable(ExecutableInfo::method("area", vec![], JavaType::INT)),
        )
        .with_type(TypeInfo::class("app.Partial").extends("lib.Base").abstract_class())
        .with_type(TypeInfo::class("app.Unrelated"));
    let unit = model.tree_mut().add_unit("app", file);
    class(&mut model, unit, "app.Impl", file, 1, 5);
    class(&mut model, unit, "app.Sized", file, 7, 12);
    class(&mut model, unit, "app.Partial", file, 14, 16);
    class(&mut model, unit, "app.Unrelated", file, 18, 20);

    let added = change(
        ChangeKind::InterfaceAdded,
        SymbolRef::ty("lib.Base"),
        ChangeMetadata::Supertypes { types: BTreeSet::from(["lib.Shape".to_string()]) },
    );
    let uses = detect(&[added], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::Extends, 1)]);
    assert_eq!(uses.iter().next().unwrap().used_symbol, SymbolRef::ty("lib.Base"));
}

#[test]
fn test_added_superclass_obligations() {
    let file = "app/Car.java";
    let mut model = client_model().with_type(TypeInfo::class("app.Car").extends("lib.Foo"));
    let unit = model.tree_mut().add_unit("app", file);
    class(&mut model, unit, "app.Car", file, 1, 5);

    let added = |superclass: &str| {
        change(
            ChangeKind::SupertypeAdded,
            SymbolRef::ty("lib.Foo"),
            ChangeMetadata::Supertypes { types: BTreeSet::from([superclass.to_string()]) },
        )
    };
    // lib.Base declares no abstract member.
    assert!(detect(&[added("lib.Base")], &model).unwrap().is_empty());
    // A superclass the model does not know may bring anything.
    let uses = detect(&[added("lib.Engine")], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::Extends, 1)]);
}

#[test]
fn test_removed_superclass_breaks_overrides_of_its_members_only() {
    let file = "app/Job.java";
    let mut model = client_model()
        .with_type(
            TypeInfo::class("lib.Task")
                .extends("lib.Base")
                .executable(ExecutableInfo::method("step", vec![], JavaType::VOID)),
        )
        .with_type(
            TypeInfo::class("app.Job")
                .extends("lib.Task")
                .executable(ExecutableInfo::method("run", vec![], JavaType::VOID))
                .executable(ExecutableInfo::method("step", vec![], JavaType::VOID)),
        );
    let unit = model.tree_mut().add_unit("app", file);
    let job = class(&mut model, unit, "app.Job", file, 1, 10);
    method(&mut model, job, SymbolRef::method("app.Job", "run", vec![]), JavaType::VOID, file, 3);
    method(&mut model, job, SymbolRef::method("app.Job", "step", vec![]), JavaType::VOID, file, 6);

    let removed = change(
        ChangeKind::SupertypeRemoved,
        SymbolRef::ty("lib.Task"),
        ChangeMetadata::Supertypes { types: BTreeSet::from(["lib.Base".to_string()]) },
    );
    let uses = detect(&[removed], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodOverride, 3)]);
    assert_eq!(
        uses.iter().next().unwrap().used_symbol,
        SymbolRef::method("lib.Base", "run", vec![])
    );
}

/// `foo()` at line 4 and `new Foo()` at line 5 from `lib.Helper` (same
/// package), `app.Sub extends Foo` and the unrelated `app.Other`.
fn executable_access_client() -> api_impact::CodeModel {
    let mut model = client_model()
        .with_type(TypeInfo::class("lib.Helper"))
        .with_type(TypeInfo::class("app.Sub").extends("lib.Foo"))
        .with_type(TypeInfo::class("app.Other"));
    for (package, file, name) in [
        ("lib", "lib/Helper.java", "lib.Helper"),
        ("app", "app/Sub.java", "app.Sub"),
        ("app", "app/Other.java", "app.Other"),
    ] {
        let unit = model.tree_mut().add_unit(package, file);
        let declared = class(&mut model, unit, name, file, 1, 9);
        let (_, body) = method(&mut model, declared, SymbolRef::method(name, "go", vec![]), JavaType::VOID, file, 3);
        let tree = model.tree_mut();
        tree.add(
            body,
            node(NodeKind::Invocation { executable: foo_method() }, Role::Statement, file, 4).typed(JavaType::VOID),
        );
        tree.add(
            body,
            node(NodeKind::ConstructorCall { executable: foo_constructor() }, Role::Statement, file, 5)
                .typed(JavaType::reference("lib.Foo")),
        );
    }
    model
}

fn broken_files(uses: &BTreeSet<api_impact::BrokenUse>) -> Vec<String> {
    let mut files: Vec<_> = uses
        .iter()
        .filter_map(|u| u.element.position.as_ref())
        .map(|p| p.file.display().to_string())
        .collect();
    files.sort();
    files
}

#[test]
fn test_less_accessible_executables_follow_access_truth_table() {
    let model = executable_access_client();
    let cases = [
        (ChangeKind::MethodLessAccessible, foo_method(), ApiUse::MethodInvocation),
        (ChangeKind::ConstructorLessAccessible, foo_constructor(), ApiUse::Instantiation),
    ];
    for (kind, subject, api_use) in cases {
        let restricted = |new: AccessLevel| {
            change(
                kind,
                subject.clone(),
                ChangeMetadata::Access { old: AccessLevel::Public, new },
            )
        };

        let uses = detect(&[restricted(AccessLevel::Private)], &model).unwrap();
        assert_eq!(uses.len(), 3, "{kind}");
        assert!(uses.iter().all(|u| u.api_use == api_use && u.used_symbol == subject));

        let uses = detect(&[restricted(AccessLevel::Package)], &model).unwrap();
        assert_eq!(broken_files(&uses), vec!["app/Other.java", "app/Sub.java"], "{kind}");

        let uses = detect(&[restricted(AccessLevel::Protected)], &model).unwrap();
        assert_eq!(broken_files(&uses), vec!["app/Other.java"], "{kind}");

        assert!(detect(&[restricted(AccessLevel::Public)], &model).unwrap().is_empty());
    }
}

#[test]
fn test_method_now_abstract_breaks_invocations() {
    let file = "app/Main.java";
    let run = SymbolRef::method("lib.Base", "run", vec![]);
    let mut model = client_model().with_type(TypeInfo::class("app.Main"));
    let unit = model.tree_mut().add_unit("app", file);
    let main = class(&mut model, unit, "app.Main", file, 1, 10);
    let (_, body) = method(&mut model, main, SymbolRef::method("app.Main", "go", vec![]), JavaType::VOID, file, 2);
    model.tree_mut().add(
        body,
        node(NodeKind::Invocation { executable: run.clone() }, Role::Statement, file, 3).typed(JavaType::VOID),
    );

    let changed = change(ChangeKind::MethodNowAbstract, run.clone(), ChangeMetadata::None);
    let uses = detect(&[changed], &model).unwrap();
    assert_eq!(found(&uses), vec![(ApiUse::MethodInvocation, 3)]);
    assert_eq!(uses.iter().next().unwrap().used_symbol, run);
}
