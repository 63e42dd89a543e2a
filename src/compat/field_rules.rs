//! Detection rules for field-level changes.

use crate::compat::detector::Rule;
use crate::compat::handlers::access_violated;
use crate::compat::types::{ApiUse, BrokenUseSink};
use crate::delta::BreakingChange;
use crate::error::{ImpactError, Result};
use crate::model::typing::{expected_type, is_assignable_from};
use crate::model::{AccessLevel, JavaType, NodeId, NodeKind, NodeTag, Role, SemanticModel, SymbolRef};

const FIELD_ACCESSES: &[NodeTag] = &[NodeTag::FieldRead, NodeTag::FieldWrite];

/// The field symbol accessed at `node`, if it is a field access.
fn accessed_field(model: &dyn SemanticModel, node: NodeId) -> Option<&SymbolRef> {
    match &model.tree().node(node).kind {
        NodeKind::FieldRead { field } | NodeKind::FieldWrite { field } => Some(field),
        _ => None,
    }
}

/// Reads and writes of a field; with `writes_only`, writes alone.
#[derive(Debug)]
pub struct FieldReferenceRule<'a> {
    pub change: &'a BreakingChange,
    pub field: &'a SymbolRef,
    pub writes_only: bool,
}

impl Rule for FieldReferenceRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        if self.writes_only {
            &[NodeTag::FieldWrite]
        } else {
            FIELD_ACCESSES
        }
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        if accessed_field(model, node) == Some(self.field) {
            sink.report(model.tree(), node, self.field.clone(), self.change, ApiUse::FieldAccess);
        }
        Ok(())
    }
}

/// Accesses to a field whose access level was reduced.
#[derive(Debug)]
pub struct FieldLessAccessibleRule<'a> {
    pub change: &'a BreakingChange,
    pub field: &'a SymbolRef,
    pub new_access: AccessLevel,
}

impl Rule for FieldLessAccessibleRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        FIELD_ACCESSES
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        if accessed_field(model, node) != Some(self.field) {
            return Ok(());
        }
        if access_violated(model, node, self.field.owner_type(), self.new_access) {
            sink.report(model.tree(), node, self.field.clone(), self.change, ApiUse::FieldAccess);
        }
        Ok(())
    }
}

/// Explicit static accesses (`Owner.field`, `Sub.field`) to a field that is
/// no longer static. Unqualified accesses inside subclasses carry an implicit
/// type target and keep compiling.
#[derive(Debug)]
pub struct FieldNoLongerStaticRule<'a> {
    pub change: &'a BreakingChange,
    pub field: &'a SymbolRef,
}

impl Rule for FieldNoLongerStaticRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        FIELD_ACCESSES
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let Some(accessed) = accessed_field(model, node) else {
            return Ok(());
        };
        let same_field = accessed.simple_name() == self.field.simple_name()
            && model.is_subtype(accessed.owner_type(), self.field.owner_type());
        if !same_field {
            return Ok(());
        }
        let tree = model.tree();
        let explicit_static = tree
            .child_with_role(node, Role::Target)
            .map(|target| tree.node(target))
            .is_some_and(|target| {
                matches!(target.kind, NodeKind::TypeAccess { .. }) && !target.implicit
            });
        if explicit_static {
            sink.report(tree, node, accessed.clone(), self.change, ApiUse::FieldAccess);
        }
        Ok(())
    }
}

/// Accesses whose context no longer accepts the field's new type.
#[derive(Debug)]
pub struct FieldTypeChangedRule<'a> {
    pub change: &'a BreakingChange,
    pub field: &'a SymbolRef,
    pub new_type: &'a JavaType,
}

impl FieldTypeChangedRule<'_> {
    fn write_broken(&self, model: &dyn SemanticModel, node: NodeId) -> Result<bool> {
        let tree = model.tree();
        let Some(parent) = tree.parent(node) else {
            return Ok(false);
        };
        match &tree.node(parent).kind {
            NodeKind::Assignment { compound: false } => {
                let assigned = tree
                    .child_with_role(parent, Role::AssignedValue)
                    .and_then(|value| tree.node(value).ty.as_ref())
                    .or(tree.node(parent).ty.as_ref());
                Ok(assigned.is_some_and(|ty| !is_assignable_from(model, self.new_type, ty)))
            }
            NodeKind::Assignment { compound: true } => {
                Ok(!(self.new_type.is_numeric() || self.new_type.is_string()))
            }
            NodeKind::UnaryOperator { op } if op.is_increment() => Ok(!self.new_type.is_numeric()),
            other => Err(ImpactError::UnhandledContext {
                context: format!("field write under {:?}", other.tag()),
                location: tree.element(node).to_string(),
            }),
        }
    }
}

impl Rule for FieldTypeChangedRule<'_> {
    fn interests(&self) -> &'static [NodeTag] {
        FIELD_ACCESSES
    }

    fn inspect(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        if accessed_field(model, node) != Some(self.field) {
            return Ok(());
        }
        let broken = match model.tree().node(node).tag() {
            NodeTag::FieldWrite => self.write_broken(model, node)?,
            _ => !expected_type(model, node)?.accepts(model, self.new_type),
        };
        if broken {
            sink.report(model.tree(), node, self.field.clone(), self.change, ApiUse::FieldAccess);
        }
        Ok(())
    }
}
