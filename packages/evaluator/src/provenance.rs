/// Provenance of rendered nodes
///
/// Every rendered node remembers which source node produced it, qualified by
/// the chain of component instances it was instantiated through. The same
/// template node instantiated twice yields two different provenances, and the
/// same source document evaluated twice yields identical ones. The differ
/// uses provenance (not tree position) as the identity of a node across edits.
use paperclip_model::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered list of source node ids: instance ids followed by the node's own id
///
/// Structured replacement for space-joined path strings; two paths are equal
/// iff their id sequences are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstancePath {
    ids: Vec<NodeId>,
}

impl InstancePath {
    pub fn new(ids: Vec<NodeId>) -> Self {
        Self { ids }
    }

    /// The empty path (outside of any instance)
    pub fn root() -> Self {
        Self { ids: Vec::new() }
    }

    /// Append an id to create a child path
    pub fn append(&self, id: &str) -> InstancePath {
        let mut ids = self.ids.clone();
        ids.push(id.to_string());
        InstancePath { ids }
    }

    /// Append a whole relative path (e.g. an override's target id path)
    pub fn join(&self, relative: &[NodeId]) -> InstancePath {
        let mut ids = self.ids.clone();
        ids.extend(relative.iter().cloned());
        InstancePath { ids }
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ids.join(" "))
    }
}

/// Document uri + instance-qualified node id
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub uri: String,
    pub path: InstancePath,
}

impl Provenance {
    pub fn new(uri: impl Into<String>, path: InstancePath) -> Self {
        Self {
            uri: uri.into(),
            path,
        }
    }

    /// Instance-qualified node id, e.g. `page card label`
    pub fn node_id(&self) -> String {
        self.path.to_string()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.uri, self.path)
    }
}
