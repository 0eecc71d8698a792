/// Development mode validators for detecting unstable patterns
use crate::vdom::{VDocument, VNode};
use crate::vdom_differ::collisions;
use paperclip_common::Diagnostic;
use tracing::warn;

/// Validator for rendered documents
pub struct Validator {
    /// Whether dev mode is enabled
    dev_mode: bool,
}

impl Validator {
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }

    /// Run every check enabled for this validator
    pub fn validate(&self, document: &VDocument) -> Vec<Diagnostic> {
        if !self.dev_mode {
            return vec![];
        }
        Self::check_provenance(document)
    }

    /// Report sibling lists in which several nodes share provenance
    ///
    /// Such siblings cannot be told apart by the differ, which then falls back
    /// to first-match pairing.
    pub fn check_provenance(document: &VDocument) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        check_siblings(&document.nodes, &mut diagnostics);

        for diagnostic in &diagnostics {
            warn!(diagnostic = %diagnostic.kind, "Unstable provenance");
        }
        diagnostics
    }
}

fn check_siblings(nodes: &[VNode], diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.extend(collisions(nodes).into_iter().map(Diagnostic::from));
    for node in nodes {
        check_siblings(node.children(), diagnostics);
    }
}
