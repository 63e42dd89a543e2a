//! Runs a delta against many clients.
//!
//! Each client goes through fetch, build, model loading and traversal on a
//! bounded worker pool. A client's failure, timeout or panic becomes that
//! client's [`DeltaImpact::failure`] and never reaches its siblings. Workers
//! share nothing but the read-only [`Delta`].

use crate::compat::{BrokenUse, Deadline, Traversal};
use crate::config::AnalysisOptions;
use crate::delta::Delta;
use crate::error::{ImpactError, Result};
use crate::impact::DeltaImpact;
use crate::model::SourceModelProvider;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A client project to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSpec {
    pub id: String,
    pub root: PathBuf,
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
}

impl ClientSpec {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
            classpath: Vec::new(),
        }
    }

    pub fn with_classpath(mut self, entry: impl Into<PathBuf>) -> Self {
        self.classpath.push(entry.into());
        self
    }
}

/// Makes a client's sources available and builds it.
pub trait ClientSource: Send + Sync {
    /// Fetches the sources; returns the local source root.
    fn fetch(&self, client: &ClientSpec) -> Result<PathBuf>;

    /// Builds the fetched client; returns its resolved classpath.
    fn build(&self, client: &ClientSpec, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Clients already checked out and built on the local file system.
#[derive(Debug, Clone, Default)]
pub struct LocalClients;

impl ClientSource for LocalClients {
    fn fetch(&self, client: &ClientSpec) -> Result<PathBuf> {
        if !client.root.is_dir() {
            return Err(ImpactError::Provider(format!(
                "client {} has no source directory at {}",
                client.id,
                client.root.display()
            )));
        }
        Ok(client.root.clone())
    }

    fn build(&self, client: &ClientSpec, _root: &Path) -> Result<Vec<PathBuf>> {
        Ok(client.classpath.clone())
    }
}

pub struct Orchestrator {
    delta: Arc<Delta>,
    models: Arc<dyn SourceModelProvider>,
    source: Arc<dyn ClientSource>,
    options: AnalysisOptions,
    library_classpath: Vec<PathBuf>,
}

impl Orchestrator {
    pub fn new(
        delta: Arc<Delta>,
        models: Arc<dyn SourceModelProvider>,
        source: Arc<dyn ClientSource>,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            delta,
            models,
            source,
            options,
            library_classpath: Vec::new(),
        }
    }

    /// Classpath entries added to every client, typically the old library.
    pub fn with_library_classpath(mut self, entries: Vec<PathBuf>) -> Self {
        self.library_classpath = entries;
        self
    }

    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    /// Analyzes every client on a pool of `options.workers` threads.
    /// Results are keyed by client id.
    pub fn analyze_all(&self, clients: &[ClientSpec]) -> Result<BTreeMap<String, DeltaImpact>> {
        self.options.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .thread_name(|idx| format!("impact-worker-{idx}"))
            .build()
            .map_err(|e| ImpactError::Config(format!("failed to start worker pool: {e}")))?;
        info!(
            clients = clients.len(),
            workers = self.options.workers,
            changes = self.delta.changes().len(),
            "Analyzing clients"
        );
        let impacts = pool.install(|| {
            clients
                .par_iter()
                .map(|client| (client.id.clone(), self.analyze_client(client)))
                .collect::<BTreeMap<_, _>>()
        });
        Ok(impacts)
    }

    /// Analyzes one client. Never fails: errors and panics are recorded in
    /// the returned impact.
    pub fn analyze_client(&self, client: &ClientSpec) -> DeltaImpact {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_client(client)))
            .unwrap_or_else(|payload| Err(ImpactError::Panicked(panic_message(payload.as_ref()))));
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(broken_uses) => {
                info!(client = %client.id, broken_uses = broken_uses.len(), elapsed_ms, "Client analyzed");
                DeltaImpact::success(client.id.clone(), broken_uses)
            }
            Err(error) => {
                warn!(client = %client.id, error = %error, elapsed_ms, "Client analysis failed");
                DeltaImpact::failure(client.id.clone(), error)
            }
        }
    }

    fn run_client(&self, client: &ClientSpec) -> Result<BTreeSet<BrokenUse>> {
        if self.delta.is_empty() {
            return Ok(BTreeSet::new());
        }

        let source = Arc::clone(&self.source);
        let spec = client.clone();
        let root = run_bounded("clone", self.options.clone_timeout(), move || source.fetch(&spec))?;

        let build_deadline = deadline(self.options.build_timeout());
        let source = Arc::clone(&self.source);
        let spec = client.clone();
        let fetched = root.clone();
        let mut classpath = run_bounded("build", self.options.build_timeout(), move || {
            source.build(&spec, &fetched)
        })?;
        classpath.extend(self.library_classpath.iter().cloned());
        let model = self.models.load(&root, &classpath)?;
        build_deadline.check("build")?;

        let traversal = Traversal::new(self.delta.detectors()?)
            .with_max_class_lines(self.options.max_class_lines)
            .with_deadline(deadline(self.options.analyze_timeout()));
        traversal.run(model.as_ref())
    }
}

fn deadline(limit: Option<Duration>) -> Deadline {
    limit.map(Deadline::after).unwrap_or_default()
}

/// Runs `job` on a helper thread and gives up on it after `limit`. The
/// abandoned thread is detached; its result is discarded.
fn run_bounded<T, F>(phase: &str, limit: Option<Duration>, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let Some(limit) = limit else {
        return job();
    };
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name(format!("impact-{phase}"))
        .spawn(move || {
            let _ = tx.send(job());
        })
        .map_err(|e| ImpactError::Provider(format!("failed to spawn {phase} thread: {e}")))?;
    match rx.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ImpactError::Timeout {
            phase: phase.to_string(),
            seconds: limit.as_secs(),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(ImpactError::Panicked(format!(
            "{phase} thread exited without a result"
        ))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
