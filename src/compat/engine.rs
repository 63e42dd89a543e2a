//! Single-pass traversal of a client's source tree.
//!
//! Every node is offered to the detectors subscribed to its [`NodeTag`], in
//! registration order. Imports are visited first, then the declarations of
//! each compilation unit. The traversal holds no findings of its own: each
//! run reports into a fresh [`BrokenUseSink`].

use crate::compat::detector::Detector;
use crate::compat::types::{BrokenUse, BrokenUseSink};
use crate::error::{ImpactError, Result};
use crate::model::{NodeId, NodeKind, NodeTag, SemanticModel};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Nodes visited between two deadline checks.
const DEADLINE_POLL_INTERVAL: usize = 1024;

/// Point in time after which a client's analysis is abandoned.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires: Option<Instant>,
    limit: Duration,
}

impl Deadline {
    pub fn none() -> Self {
        Self {
            expires: None,
            limit: Duration::MAX,
        }
    }

    pub fn after(limit: Duration) -> Self {
        Self {
            expires: Instant::now().checked_add(limit),
            limit,
        }
    }

    pub fn expired(&self) -> bool {
        self.expires.is_some_and(|at| Instant::now() >= at)
    }

    /// Fails with [`ImpactError::Timeout`] once the deadline has passed.
    pub fn check(&self, phase: &str) -> Result<()> {
        if self.expired() {
            return Err(ImpactError::Timeout {
                phase: phase.to_string(),
                seconds: self.limit.as_secs(),
            });
        }
        Ok(())
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

/// Detector set bound to one client run.
#[derive(Debug)]
pub struct Traversal<'a> {
    detectors: Vec<Detector<'a>>,
    subscriptions: Vec<Vec<usize>>,
    max_class_lines: Option<u32>,
    deadline: Deadline,
}

impl<'a> Traversal<'a> {
    pub fn new(detectors: Vec<Detector<'a>>) -> Self {
        let mut subscriptions = vec![Vec::new(); NodeTag::COUNT];
        for (idx, detector) in detectors.iter().enumerate() {
            for tag in detector.interests() {
                subscriptions[tag.index()].push(idx);
            }
        }
        Self {
            detectors,
            subscriptions,
            max_class_lines: None,
            deadline: Deadline::none(),
        }
    }

    /// Class declarations spanning more lines than `limit` are skipped
    /// together with everything they contain.
    pub fn with_max_class_lines(mut self, limit: Option<u32>) -> Self {
        self.max_class_lines = limit;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Runs every detector over the client's tree and returns the
    /// deduplicated broken uses.
    pub fn run(&self, model: &dyn SemanticModel) -> Result<BTreeSet<BrokenUse>> {
        let mut sink = BrokenUseSink::new();
        if self.detectors.is_empty() {
            return Ok(sink.into_set());
        }
        self.deadline.check("analyze")?;

        let tree = model.tree();
        let mut visited = 0usize;
        for unit in tree.units() {
            for child in tree.children(*unit) {
                if matches!(tree.node(*child).kind, NodeKind::Import) {
                    self.visit(model, *child, &mut sink, &mut visited)?;
                }
            }
        }
        for unit in tree.units() {
            self.dispatch(model, *unit, &mut sink)?;
            for child in tree.children(*unit) {
                if !matches!(tree.node(*child).kind, NodeKind::Import) {
                    self.visit(model, *child, &mut sink, &mut visited)?;
                }
            }
        }
        debug!(nodes = visited, broken_uses = sink.len(), "Traversal finished");
        Ok(sink.into_set())
    }

    fn visit(
        &self,
        model: &dyn SemanticModel,
        root: NodeId,
        sink: &mut BrokenUseSink,
        visited: &mut usize,
    ) -> Result<()> {
        let tree = model.tree();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            *visited += 1;
            if *visited % DEADLINE_POLL_INTERVAL == 0 {
                self.deadline.check("analyze")?;
            }
            if self.oversized(model, current) {
                continue;
            }
            self.dispatch(model, current, sink)?;
            stack.extend(tree.children(current).iter().rev().copied());
        }
        Ok(())
    }

    fn dispatch(&self, model: &dyn SemanticModel, node: NodeId, sink: &mut BrokenUseSink) -> Result<()> {
        let tag = model.tree().node(node).tag();
        for idx in &self.subscriptions[tag.index()] {
            self.detectors[*idx].inspect(model, node, sink)?;
        }
        Ok(())
    }

    fn oversized(&self, model: &dyn SemanticModel, node: NodeId) -> bool {
        let Some(limit) = self.max_class_lines else {
            return false;
        };
        let declaration = model.tree().node(node);
        let NodeKind::TypeDeclaration { name } = &declaration.kind else {
            return false;
        };
        let Some(position) = &declaration.position else {
            return false;
        };
        let span = position.end_line.saturating_sub(position.line);
        if span <= limit {
            return false;
        }
        info!(
            class = %name,
            lines = span,
            limit,
            "Skipping the analysis of an oversized class"
        );
        true
    }
}
