//! End-to-end analysis: diff two library versions, build the delta and
//! measure its impact on a set of clients.

use crate::compat::BrokenUse;
use crate::config::AnalysisOptions;
use crate::delta::{ApiDiffProvider, Delta, LibraryVersion};
use crate::error::{ImpactError, Result};
use crate::impact::DeltaImpact;
use crate::model::SourceModelProvider;
use crate::orchestrator::{ClientSource, ClientSpec, LocalClients, Orchestrator};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// A validated analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisQuery {
    pub old: LibraryVersion,
    pub new: LibraryVersion,
    /// Model root of the old library version; symbols are resolved here and
    /// it is added to every client's classpath.
    pub library: PathBuf,
    /// Library sources used to locate changes, when they differ from `library`.
    pub library_sources: Option<PathBuf>,
    pub clients: Vec<ClientSpec>,
    pub options: AnalysisOptions,
}

impl AnalysisQuery {
    pub fn builder() -> AnalysisQueryBuilder {
        AnalysisQueryBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisQueryBuilder {
    old: Option<LibraryVersion>,
    new: Option<LibraryVersion>,
    library: Option<PathBuf>,
    library_sources: Option<PathBuf>,
    clients: Vec<ClientSpec>,
    options: Option<AnalysisOptions>,
}

impl AnalysisQueryBuilder {
    pub fn old(mut self, version: LibraryVersion) -> Self {
        self.old = Some(version);
        self
    }

    pub fn new_version(mut self, version: LibraryVersion) -> Self {
        self.new = Some(version);
        self
    }

    pub fn library(mut self, root: impl Into<PathBuf>) -> Self {
        self.library = Some(root.into());
        self
    }

    pub fn library_sources(mut self, root: impl Into<PathBuf>) -> Self {
        self.library_sources = Some(root.into());
        self
    }

    pub fn client(mut self, client: ClientSpec) -> Self {
        self.clients.push(client);
        self
    }

    pub fn clients(mut self, clients: impl IntoIterator<Item = ClientSpec>) -> Self {
        self.clients.extend(clients);
        self
    }

    pub fn options(mut self, options: AnalysisOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn build(self) -> Result<AnalysisQuery> {
        let old = self
            .old
            .ok_or_else(|| ImpactError::InvalidInput("old library version is required".to_string()))?;
        let new = self
            .new
            .ok_or_else(|| ImpactError::InvalidInput("new library version is required".to_string()))?;
        let library = self
            .library
            .ok_or_else(|| ImpactError::InvalidInput("library model root is required".to_string()))?;
        if !library.is_dir() {
            return Err(ImpactError::InvalidInput(format!(
                "library root {} is not a directory",
                library.display()
            )));
        }
        if let Some(sources) = &self.library_sources {
            if !sources.is_dir() {
                return Err(ImpactError::InvalidInput(format!(
                    "library sources {} is not a directory",
                    sources.display()
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for client in &self.clients {
            if !client.root.is_dir() {
                return Err(ImpactError::InvalidInput(format!(
                    "client {} root {} is not a directory",
                    client.id,
                    client.root.display()
                )));
            }
            if !seen.insert(client.id.as_str()) {
                return Err(ImpactError::InvalidInput(format!(
                    "duplicate client id {}",
                    client.id
                )));
            }
        }

        let options = self.options.unwrap_or_default();
        options.validate()?;

        Ok(AnalysisQuery {
            old,
            new,
            library,
            library_sources: self.library_sources,
            clients: self.clients,
            options,
        })
    }
}

/// The delta and its impact on every client of the query.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub delta: Delta,
    pub impacts: BTreeMap<String, DeltaImpact>,
}

impl AnalysisResult {
    /// Broken uses across all clients.
    pub fn all_broken_uses(&self) -> BTreeSet<&BrokenUse> {
        self.impacts
            .values()
            .flat_map(|impact| impact.broken_uses.iter())
            .collect()
    }

    /// Ids of clients with at least one broken use.
    pub fn broken_clients(&self) -> Vec<&str> {
        self.impacts
            .values()
            .filter(|impact| impact.is_broken())
            .map(|impact| impact.client.as_str())
            .collect()
    }

    pub fn failed_clients(&self) -> Vec<&str> {
        self.impacts
            .values()
            .filter(|impact| impact.is_failure())
            .map(|impact| impact.client.as_str())
            .collect()
    }

    pub fn impact_for(&self, client: &str) -> Option<&DeltaImpact> {
        self.impacts.get(client)
    }
}

/// Runs `query` against clients already present on the local file system.
pub fn analyze(
    query: &AnalysisQuery,
    diff: &dyn ApiDiffProvider,
    models: Arc<dyn SourceModelProvider>,
) -> Result<AnalysisResult> {
    analyze_with(query, diff, models, Arc::new(LocalClients))
}

pub fn analyze_with(
    query: &AnalysisQuery,
    diff: &dyn ApiDiffProvider,
    models: Arc<dyn SourceModelProvider>,
    source: Arc<dyn ClientSource>,
) -> Result<AnalysisResult> {
    let delta = build_delta(query, diff, models.as_ref())?;

    if delta.is_empty() {
        info!(old = %query.old, new = %query.new, "Empty delta, no client can be impacted");
        let impacts = query
            .clients
            .iter()
            .map(|client| (client.id.clone(), DeltaImpact::success(client.id.clone(), BTreeSet::new())))
            .collect();
        return Ok(AnalysisResult { delta, impacts });
    }

    let delta = Arc::new(delta);
    let orchestrator = Orchestrator::new(Arc::clone(&delta), models, source, query.options.clone())
        .with_library_classpath(vec![query.library.clone()]);
    let impacts = orchestrator.analyze_all(&query.clients)?;
    drop(orchestrator);

    let delta = Arc::try_unwrap(delta).unwrap_or_else(|shared| (*shared).clone());
    Ok(AnalysisResult { delta, impacts })
}

/// Diffs the query's versions and contextualizes the entries against the
/// old library, locating each change in the library sources.
pub fn build_delta(
    query: &AnalysisQuery,
    diff: &dyn ApiDiffProvider,
    models: &dyn SourceModelProvider,
) -> Result<Delta> {
    let entries = diff.diff(&query.old, &query.new)?;
    let library = models.load(&query.library, &[])?;
    let delta = Delta::from_raw(
        query.old.clone(),
        query.new.clone(),
        &entries,
        library.as_ref(),
        &query.options,
    )?;

    let unmapped = match &query.library_sources {
        Some(root) => {
            let sources = models.load(root, &[])?;
            delta.populate_locations(sources.as_ref())
        }
        None => delta.populate_locations(library.as_ref()),
    };
    if !unmapped.is_empty() {
        info!(unmapped = unmapped.len(), "Some changes have no source location");
    }
    Ok(delta)
}
