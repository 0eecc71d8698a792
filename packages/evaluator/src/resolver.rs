//! Reference resolution
//!
//! Maps node ids to source nodes across one snapshot of documents. Lookups are
//! pure; an unknown id is an ordinary [`Resolution::Unresolved`] outcome since
//! templates may reference components from documents that are still loading.

use paperclip_common::{walk_module, walk_node, Diagnostic, DiagnosticKind, Visitor};
use paperclip_model::{Component, Module, Node, NodeId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of an id lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Found { uri: &'a str, node: &'a Node },
    Unresolved,
}

impl<'a> Resolution<'a> {
    pub fn node(&self) -> Option<&'a Node> {
        match self {
            Resolution::Found { node, .. } => Some(node),
            Resolution::Unresolved => None,
        }
    }

    pub fn uri(&self) -> Option<&'a str> {
        match self {
            Resolution::Found { uri, .. } => Some(uri),
            Resolution::Unresolved => None,
        }
    }
}

/// Id → node lookup the evaluator is driven by
pub trait Resolver {
    fn resolve(&self, id: &str) -> Resolution<'_>;

    fn is_component(&self, id: &str) -> bool {
        matches!(
            self.resolve(id),
            Resolution::Found {
                node: Node::Component(_),
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexedNode<'a> {
    uri: &'a str,
    node: &'a Node,
}

/// Id index over a snapshot of modules, built once and borrowed from them
pub struct ReferenceIndex<'a> {
    nodes: HashMap<&'a str, IndexedNode<'a>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ReferenceIndex<'a> {
    pub fn new(modules: &'a [Module]) -> Self {
        let mut builder = IndexBuilder {
            uri: "",
            nodes: HashMap::new(),
            diagnostics: Vec::new(),
        };
        for module in modules {
            builder.visit_module(module);
        }

        debug!(
            modules = modules.len(),
            nodes = builder.nodes.len(),
            "Built reference index"
        );

        Self {
            nodes: builder.nodes,
            diagnostics: builder.diagnostics,
        }
    }

    /// Problems found while indexing (duplicate ids)
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl<'a> Resolver for ReferenceIndex<'a> {
    fn resolve(&self, id: &str) -> Resolution<'_> {
        match self.nodes.get(id) {
            Some(indexed) => Resolution::Found {
                uri: indexed.uri,
                node: indexed.node,
            },
            None => Resolution::Unresolved,
        }
    }
}

struct IndexBuilder<'a> {
    uri: &'a str,
    nodes: HashMap<&'a str, IndexedNode<'a>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Visitor<'a> for IndexBuilder<'a> {
    fn visit_module(&mut self, module: &'a Module) {
        self.uri = &module.uri;
        walk_module(self, module);
    }

    fn visit_node(&mut self, node: &'a Node) {
        let id = node.id();
        if let Some(existing) = self.nodes.get(id) {
            warn!(id, uri = self.uri, first_uri = existing.uri, "Duplicate node id");
            self.diagnostics.push(Diagnostic::from(DiagnosticKind::DuplicateNodeId {
                id: id.to_string(),
                uri: self.uri.to_string(),
                first_uri: existing.uri.to_string(),
            }));
        } else {
            self.nodes.insert(id, IndexedNode { uri: self.uri, node });
        }
        walk_node(self, node);
    }
}

/// One component of an extends chain, with the document it lives in
#[derive(Debug, Clone, Copy)]
pub struct ChainLink<'a> {
    pub uri: &'a str,
    pub component: &'a Component,
}

/// Extends chain, most derived component first
#[derive(Debug, Clone)]
pub struct InheritanceChain<'a> {
    pub links: Vec<ChainLink<'a>>,
    /// Base id that could not be resolved, terminating the chain early
    pub unresolved: Option<NodeId>,
}

impl<'a> InheritanceChain<'a> {
    /// Template content: children of the most derived component declaring any
    pub fn template(&self) -> (&'a str, &'a [Node]) {
        self.links
            .iter()
            .find(|link| !link.component.children.is_empty())
            .map(|link| (link.uri, link.component.children.as_slice()))
            .unwrap_or((self.links[0].uri, &[]))
    }

    /// Native tag of the chain's terminal component
    pub fn tag(&self) -> Option<&'a str> {
        self.links
            .iter()
            .rev()
            .find_map(|link| link.component.tag.as_deref())
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.links
            .iter()
            .map(|link| link.component.id.clone())
            .collect()
    }
}

/// Follow `is` references from `component` until a component without one
///
/// A revisited id is a fatal `CyclicInheritance`; an unresolvable base ends
/// the chain and is reported through [`InheritanceChain::unresolved`].
pub fn resolve_chain<'a, R: Resolver + ?Sized>(
    resolver: &'a R,
    uri: &'a str,
    component: &'a Component,
) -> Result<InheritanceChain<'a>, DiagnosticKind> {
    let mut links = vec![ChainLink { uri, component }];
    let mut visited: Vec<&str> = vec![component.id.as_str()];
    let mut current = component;

    while let Some(base_id) = current.is.as_deref() {
        if visited.contains(&base_id) {
            let mut chain: Vec<String> = visited.iter().map(|id| id.to_string()).collect();
            chain.push(base_id.to_string());
            return Err(DiagnosticKind::CyclicInheritance { chain });
        }

        match resolver.resolve(base_id) {
            Resolution::Found {
                uri,
                node: Node::Component(base),
            } => {
                visited.push(base_id);
                links.push(ChainLink {
                    uri,
                    component: base,
                });
                current = base;
            }
            _ => {
                return Ok(InheritanceChain {
                    links,
                    unresolved: Some(base_id.to_string()),
                });
            }
        }
    }

    Ok(InheritanceChain {
        links,
        unresolved: None,
    })
}

/// Find `id` inside one template scope
///
/// Plain elements are transparent; an instance's call-site children belong to
/// the same scope, but its component's template does not.
pub fn find_in_scope<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Node> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Node::Element(element) = node {
            if let Some(found) = find_in_scope(&element.children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Whether an override's `target_id_path` names a node reachable from the
/// component's template by following exactly that id sequence
pub fn resolve_target_path<'a, R: Resolver + ?Sized>(
    resolver: &'a R,
    chain: &InheritanceChain<'a>,
    target_id_path: &[NodeId],
) -> bool {
    let (_, mut scope) = chain.template();

    for (index, id) in target_id_path.iter().enumerate() {
        let Some(node) = find_in_scope(scope, id) else {
            return false;
        };

        if index + 1 == target_id_path.len() {
            return true;
        }

        // Only instances open a nested scope to keep walking into
        let Some(component_id) = node.as_element().and_then(|element| element.is.as_deref()) else {
            return false;
        };
        let Resolution::Found {
            uri,
            node: Node::Component(component),
        } = resolver.resolve(component_id)
        else {
            return false;
        };
        match resolve_chain(resolver, uri, component) {
            Ok(nested) => scope = nested.template().1,
            Err(_) => return false,
        }
    }

    true
}
