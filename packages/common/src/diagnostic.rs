//! Structured diagnostics reported alongside (possibly degraded) results.
//!
//! Nothing in evaluation or diffing throws: every recoverable problem becomes a
//! [`Diagnostic`] so an editor can keep working on partially-invalid documents.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticLevel {
    /// Recovered locally; output is still faithful to the document
    Warning,
    /// A subtree was replaced or approximated
    Error,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagnosticKind {
    #[error("Unresolved reference '{id}' from node '{from}'")]
    UnresolvedReference { id: String, from: String },

    #[error("Cyclic inheritance: {}", chain.join(" → "))]
    CyclicInheritance { chain: Vec<String> },

    #[error("Recursive component instance '{component}'\nInstance stack: {}", stack.join(" → "))]
    RecursiveInstance {
        component: String,
        stack: Vec<String>,
    },

    #[error("Override '{override_id}' on '{scope}' targets unknown path [{}]", target_id_path.join(", "))]
    InvalidOverrideTarget {
        override_id: String,
        scope: String,
        target_id_path: Vec<String>,
    },

    #[error("{count} sibling nodes share provenance '{provenance}'")]
    DiffIdentityCollision { provenance: String, count: usize },

    #[error("Duplicate node id '{id}' in '{uri}' (first defined in '{first_uri}')")]
    DuplicateNodeId {
        id: String,
        uri: String,
        first_uri: String,
    },
}

impl DiagnosticKind {
    pub fn default_level(&self) -> DiagnosticLevel {
        match self {
            DiagnosticKind::UnresolvedReference { .. }
            | DiagnosticKind::InvalidOverrideTarget { .. }
            | DiagnosticKind::DuplicateNodeId { .. } => DiagnosticLevel::Warning,
            DiagnosticKind::CyclicInheritance { .. }
            | DiagnosticKind::RecursiveInstance { .. }
            | DiagnosticKind::DiffIdentityCollision { .. } => DiagnosticLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            kind,
        }
    }

    pub fn error(kind: DiagnosticKind) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            kind,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

impl From<DiagnosticKind> for Diagnostic {
    fn from(kind: DiagnosticKind) -> Self {
        Self {
            level: kind.default_level(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Error => "error",
        };
        write!(f, "{}: {}", level, self.kind)
    }
}
