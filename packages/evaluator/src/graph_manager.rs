/// Dependency graph manager and incremental render session
///
/// Tracks which documents instantiate or extend components of which other
/// documents, and re-renders a document only when its own source, one of its
/// dependencies, or an explicit invalidation says the cached rendering is stale.
use crate::evaluator::Evaluator;
use crate::resolver::ReferenceIndex;
use crate::vdom::VDocument;
use crate::vdom_differ::{Differ, Op};
use paperclip_common::{Diagnostic, DiagnosticKind};
use paperclip_model::Module;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Document '{uri}' is not part of the snapshot")]
    UnknownDocument { uri: String },
}

/// Manages dependency graph (document -> documents it depends on)
#[derive(Clone, Debug, Default)]
pub struct GraphManager {
    /// Dependency graph: document -> documents whose components it uses
    dependencies: HashMap<String, BTreeSet<String>>,

    /// Reverse lookup: document -> documents that use it
    dependents: HashMap<String, BTreeSet<String>>,
}

impl GraphManager {
    pub fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
            dependents: HashMap::new(),
        }
    }

    /// Set all dependencies for a document at once
    pub fn set_dependencies(&mut self, source: &str, targets: BTreeSet<String>) {
        // Remove old dependents relationships
        if let Some(old_targets) = self.dependencies.get(source) {
            for old_target in old_targets {
                if let Some(deps) = self.dependents.get_mut(old_target) {
                    deps.remove(source);
                }
            }
        }

        for target in &targets {
            self.dependents
                .entry(target.clone())
                .or_default()
                .insert(source.to_string());
        }

        self.dependencies.insert(source.to_string(), targets);
    }

    pub fn get_dependencies(&self, uri: &str) -> Option<&BTreeSet<String>> {
        self.dependencies.get(uri)
    }

    pub fn get_dependents(&self, uri: &str) -> Option<&BTreeSet<String>> {
        self.dependents.get(uri)
    }

    /// All documents reachable by following `edges` from `uri`, excluding it
    fn transitive(edges: &HashMap<String, BTreeSet<String>>, uri: &str) -> BTreeSet<String> {
        let mut visited = HashSet::new();
        let mut result = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(uri.to_string());

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current != uri {
                result.insert(current.clone());
            }
            if let Some(next) = edges.get(&current) {
                queue.extend(next.iter().filter(|n| !visited.contains(*n)).cloned());
            }
        }

        result
    }

    /// Get transitive dependencies (all dependencies, recursively)
    pub fn get_transitive_dependencies(&self, uri: &str) -> BTreeSet<String> {
        Self::transitive(&self.dependencies, uri)
    }

    /// Get transitive dependents (everything that would see a change to `uri`)
    pub fn get_transitive_dependents(&self, uri: &str) -> BTreeSet<String> {
        Self::transitive(&self.dependents, uri)
    }

    /// Remove a document from the graph
    pub fn remove_file(&mut self, uri: &str) {
        if let Some(deps) = self.dependencies.remove(uri) {
            for dep in deps {
                if let Some(dependents) = self.dependents.get_mut(&dep) {
                    dependents.remove(uri);
                    if dependents.is_empty() {
                        self.dependents.remove(&dep);
                    }
                }
            }
        }

        if let Some(dependents) = self.dependents.remove(uri) {
            for dependent in dependents {
                if let Some(deps) = self.dependencies.get_mut(&dependent) {
                    deps.remove(uri);
                    if deps.is_empty() {
                        self.dependencies.remove(&dependent);
                    }
                }
            }
        }
    }
}

/// Result of rendering one document
#[derive(Debug, Clone)]
pub struct RenderUpdate {
    pub document: VDocument,
    /// Ops from the previous rendering (from an empty document the first time)
    pub ops: Vec<Op>,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the document was actually re-evaluated
    pub evaluated: bool,
}

#[derive(Debug, Clone)]
struct Rendered {
    document: VDocument,
    snapshot: u64,
    diagnostics: Vec<Diagnostic>,
}

impl Rendered {
    /// Renderings with unresolved references may change when any document does
    fn has_unresolved(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::UnresolvedReference { .. }))
    }
}

/// Per-document render cache driving evaluate → diff
#[derive(Debug, Default)]
pub struct RenderSession {
    graph: GraphManager,
    rendered: HashMap<String, Rendered>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `uri` out of the `modules` snapshot
    #[instrument(skip(self, modules), fields(modules = modules.len()))]
    pub fn render(&mut self, uri: &str, modules: &[Module]) -> Result<RenderUpdate, SessionError> {
        let module = modules
            .iter()
            .find(|module| module.uri == uri)
            .ok_or_else(|| SessionError::UnknownDocument {
                uri: uri.to_string(),
            })?;

        if let Some(previous) = self.rendered.get(uri) {
            if !previous.has_unresolved() && previous.snapshot == self.snapshot(uri, modules) {
                debug!("Snapshot unchanged, reusing rendering");
                return Ok(RenderUpdate {
                    document: previous.document.clone(),
                    ops: Vec::new(),
                    diagnostics: previous.diagnostics.clone(),
                    evaluated: false,
                });
            }
        }

        let index = ReferenceIndex::new(modules);
        let evaluation = Evaluator::new(&index).evaluate_module(module);

        let mut dependencies = evaluation.dependencies;
        dependencies.remove(uri);
        self.graph.set_dependencies(uri, dependencies);

        let empty = VDocument::new();
        let previous = self
            .rendered
            .get(uri)
            .map(|rendered| &rendered.document)
            .unwrap_or(&empty);
        let mut differ = Differ::new();
        let ops = differ.diff(previous, &evaluation.document);

        let mut diagnostics: Vec<Diagnostic> = index.diagnostics().to_vec();
        diagnostics.extend(evaluation.diagnostics);
        diagnostics.extend(differ.take_diagnostics());

        info!(ops = ops.len(), diagnostics = diagnostics.len(), "Rendered document");

        let snapshot = self.snapshot(uri, modules);
        self.rendered.insert(
            uri.to_string(),
            Rendered {
                document: evaluation.document.clone(),
                snapshot,
                diagnostics: diagnostics.clone(),
            },
        );

        Ok(RenderUpdate {
            document: evaluation.document,
            ops,
            diagnostics,
            evaluated: true,
        })
    }

    /// Drop the cached rendering of `uri` and of everything depending on it
    ///
    /// Returns the invalidated documents that had a cached rendering.
    pub fn invalidate(&mut self, uri: &str) -> Vec<String> {
        let mut affected = self.graph.get_transitive_dependents(uri);
        affected.insert(uri.to_string());

        let invalidated: Vec<String> = affected
            .into_iter()
            .filter(|uri| self.rendered.remove(uri).is_some())
            .collect();

        debug!(uri, invalidated = ?invalidated, "Invalidated renderings");
        invalidated
    }

    /// Forget a document entirely (e.g. it was deleted)
    pub fn remove(&mut self, uri: &str) {
        self.invalidate(uri);
        self.graph.remove_file(uri);
    }

    pub fn document(&self, uri: &str) -> Option<&VDocument> {
        self.rendered.get(uri).map(|rendered| &rendered.document)
    }

    pub fn graph(&self) -> &GraphManager {
        &self.graph
    }

    /// Hash of `uri`'s module and of every module it (transitively) depends on
    fn snapshot(&self, uri: &str, modules: &[Module]) -> u64 {
        let mut uris = self.graph.get_transitive_dependencies(uri);
        uris.insert(uri.to_string());

        let mut hasher = DefaultHasher::new();
        for uri in &uris {
            uri.hash(&mut hasher);
            modules
                .iter()
                .find(|module| &module.uri == uri)
                .hash(&mut hasher);
        }
        hasher.finish()
    }
}
