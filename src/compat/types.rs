//! Broken uses and the per-run accumulator detectors report into.

use crate::delta::{BreakingChange, ChangeKind};
use crate::model::{NodeId, SourceElement, SourceTree, SymbolRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a use site references a changed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiUse {
    TypeDependency,
    Extends,
    Implements,
    Annotation,
    Import,
    FieldAccess,
    MethodInvocation,
    MethodOverride,
    Instantiation,
    Throws,
}

impl ApiUse {
    pub fn id(&self) -> &'static str {
        match self {
            ApiUse::TypeDependency => "TYPE_DEPENDENCY",
            ApiUse::Extends => "EXTENDS",
            ApiUse::Implements => "IMPLEMENTS",
            ApiUse::Annotation => "ANNOTATION",
            ApiUse::Import => "IMPORT",
            ApiUse::FieldAccess => "FIELD_ACCESS",
            ApiUse::MethodInvocation => "METHOD_INVOCATION",
            ApiUse::MethodOverride => "METHOD_OVERRIDE",
            ApiUse::Instantiation => "INSTANTIATION",
            ApiUse::Throws => "THROWS",
        }
    }

    pub fn all() -> &'static [ApiUse] {
        &[
            ApiUse::TypeDependency,
            ApiUse::Extends,
            ApiUse::Implements,
            ApiUse::Annotation,
            ApiUse::Import,
            ApiUse::FieldAccess,
            ApiUse::MethodInvocation,
            ApiUse::MethodOverride,
            ApiUse::Instantiation,
            ApiUse::Throws,
        ]
    }
}

impl std::fmt::Display for ApiUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A located occurrence in client code where a breaking change bites.
///
/// Equality and ordering cover all five fields, so two findings at the same
/// position for the same symbols, use and kind are one finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrokenUse {
    pub element: SourceElement,
    pub used_symbol: SymbolRef,
    pub changed_subject: SymbolRef,
    #[serde(rename = "use")]
    pub api_use: ApiUse,
    pub kind: ChangeKind,
}

impl std::fmt::Display for BrokenUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{} {}] uses {} via {}",
            self.element, self.kind, self.changed_subject, self.used_symbol, self.api_use
        )
    }
}

/// Deduplicating accumulator owned by one traversal run.
#[derive(Debug, Default)]
pub struct BrokenUseSink {
    uses: BTreeSet<BrokenUse>,
}

impl BrokenUseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a broken use at `node`. Implicit nodes are not in the client's
    /// source and are skipped; nodes without a position are located at their
    /// first locatable ancestor.
    pub fn report(
        &mut self,
        tree: &SourceTree,
        node: NodeId,
        used_symbol: SymbolRef,
        change: &BreakingChange,
        api_use: ApiUse,
    ) {
        if tree.node(node).implicit {
            return;
        }
        self.insert(tree.element(node), used_symbol, change, api_use);
    }

    /// Like [`BrokenUseSink::report`], but an implicit node is located at its
    /// nearest explicit ancestor instead of being dropped. Used for
    /// compiler-inserted `super()` calls, which break the declaring class.
    pub fn report_explicit(
        &mut self,
        tree: &SourceTree,
        node: NodeId,
        used_symbol: SymbolRef,
        change: &BreakingChange,
        api_use: ApiUse,
    ) {
        let explicit = std::iter::once(node)
            .chain(tree.ancestors(node))
            .find(|n| !tree.node(*n).implicit);
        if let Some(explicit) = explicit {
            self.insert(tree.element(explicit), used_symbol, change, api_use);
        }
    }

    fn insert(
        &mut self,
        element: SourceElement,
        used_symbol: SymbolRef,
        change: &BreakingChange,
        api_use: ApiUse,
    ) {
        self.uses.insert(BrokenUse {
            element,
            used_symbol,
            changed_subject: change.subject().clone(),
            api_use,
            kind: change.kind(),
        });
    }

    pub fn len(&self) -> usize {
        self.uses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrokenUse> {
        self.uses.iter()
    }

    pub fn into_set(self) -> BTreeSet<BrokenUse> {
        self.uses
    }
}
