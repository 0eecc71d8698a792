//! Operational-transform differ
//!
//! Produces the ordered edit script that turns one rendered document into
//! another. Children are matched by provenance rather than by position, so a
//! node that moved (e.g. slot content projected under a renamed slot) is moved
//! and patched in place instead of being removed and re-inserted.
//!
//! Every `node_path` in the script is valid against the tree as it looks when
//! that op is applied, i.e. after all preceding ops of the same script.

use crate::provenance::Provenance;
use crate::vdom::{NodeKind, VDocument, VNode};
use paperclip_common::{Diagnostic, DiagnosticKind};
use paperclip_model::{AttributeMap, StyleMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, error, instrument};

/// Child-index path from the document root; `[]` is the document itself
pub type NodePath = Vec<usize>;

/// One property of a rendered node, with its new value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "camelCase")]
pub enum Property {
    Tag(String),
    /// Text value
    Value(String),
    Style(StyleMap),
    Attributes(AttributeMap),
    Source(Provenance),
    IsContentNode(bool),
    IsCreatedFromComponentInstance(bool),
    IsComponentInstance(bool),
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::Tag(_) => "tag",
            Property::Value(_) => "value",
            Property::Style(_) => "style",
            Property::Attributes(_) => "attributes",
            Property::Source(_) => "source",
            Property::IsContentNode(_) => "isContentNode",
            Property::IsCreatedFromComponentInstance(_) => "isCreatedFromComponentInstance",
            Property::IsComponentInstance(_) => "isComponentInstance",
        }
    }
}

/// Primitive tree edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Op {
    #[serde(rename_all = "camelCase")]
    SetProperty {
        node_path: NodePath,
        #[serde(flatten)]
        property: Property,
    },
    #[serde(rename_all = "camelCase")]
    InsertChild {
        node_path: NodePath,
        index: usize,
        child: VNode,
    },
    #[serde(rename_all = "camelCase")]
    RemoveChild { node_path: NodePath, index: usize },
    #[serde(rename_all = "camelCase")]
    MoveChild {
        node_path: NodePath,
        old_index: usize,
        new_index: usize,
    },
}

impl Op {
    pub fn node_path(&self) -> &[usize] {
        match self {
            Op::SetProperty { node_path, .. }
            | Op::InsertChild { node_path, .. }
            | Op::RemoveChild { node_path, .. }
            | Op::MoveChild { node_path, .. } => node_path,
        }
    }

    /// Same op addressed from `prefix` instead of the pair it was computed for
    fn rebased(&self, prefix: &[usize]) -> Op {
        let mut op = self.clone();
        let node_path = match &mut op {
            Op::SetProperty { node_path, .. }
            | Op::InsertChild { node_path, .. }
            | Op::RemoveChild { node_path, .. }
            | Op::MoveChild { node_path, .. } => node_path,
        };
        let mut absolute = prefix.to_vec();
        absolute.append(node_path);
        *node_path = absolute;
        op
    }
}

/// Diff identity of a rendered node
type Identity<'a> = (&'a Provenance, NodeKind);

fn identity(node: &VNode) -> Identity<'_> {
    (node.source(), node.kind())
}

/// Address of a node while both trees of one `diff` call are borrowed
type NodeAddress = *const VNode;

/// Differ with a memo of already-diffed node pairs
///
/// The memo lives for one `diff` call and is keyed by node address, so
/// rendered ids that repeat across trees (e.g. documents loaded from JSON)
/// never alias two different pairs. Collision diagnostics accumulate across
/// calls until taken.
#[derive(Debug, Default)]
pub struct Differ {
    /// `(old, new)` → ops relative to the pair
    memo: HashMap<(NodeAddress, NodeAddress), Rc<Vec<Op>>>,
    diagnostics: Vec<Diagnostic>,
}

impl Differ {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip_all, fields(old = old.nodes.len(), new = new.nodes.len()))]
    pub fn diff(&mut self, old: &VDocument, new: &VDocument) -> Vec<Op> {
        let mut ops = Vec::new();
        self.diff_children(&[], &old.nodes, &new.nodes, &mut ops);
        debug!(ops = ops.len(), pairs = self.memo.len(), "Diff complete");
        self.memo.clear();
        ops
    }

    /// Identity collisions seen since the last call
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Pairs memoized by an unfinished `diff` (always 0 between calls)
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Ops turning `old` into `new`, relative to the pair
    fn diff_pair(&mut self, old: &VNode, new: &VNode) -> Rc<Vec<Op>> {
        let key: (NodeAddress, NodeAddress) = (old, new);
        if let Some(cached) = self.memo.get(&key) {
            return Rc::clone(cached);
        }

        let mut ops = Vec::new();
        diff_properties(old, new, &mut ops);
        self.diff_children(&[], old.children(), new.children(), &mut ops);

        let ops = Rc::new(ops);
        self.memo.insert(key, Rc::clone(&ops));
        ops
    }

    fn diff_children(&mut self, path: &[usize], old: &[VNode], new: &[VNode], ops: &mut Vec<Op>) {
        self.check_collisions(old);
        self.check_collisions(new);

        // First unmatched new child with the same identity, in document order
        let mut new_match: Vec<Option<usize>> = vec![None; new.len()];
        let mut old_matched = vec![false; old.len()];
        for (i, old_child) in old.iter().enumerate() {
            let key = identity(old_child);
            if let Some(j) = (0..new.len()).find(|&j| new_match[j].is_none() && identity(&new[j]) == key) {
                new_match[j] = Some(i);
                old_matched[i] = true;
            }
        }

        // Evolving old list: `Some(old index)` for kept children, `None` for inserted ones
        let mut current: Vec<Option<usize>> = (0..old.len()).map(Some).collect();

        for i in (0..old.len()).rev() {
            if !old_matched[i] {
                ops.push(Op::RemoveChild {
                    node_path: path.to_vec(),
                    index: i,
                });
                current.remove(i);
            }
        }

        for (j, new_child) in new.iter().enumerate() {
            match new_match[j] {
                Some(i) => {
                    let position = current
                        .iter()
                        .position(|entry| *entry == Some(i))
                        .unwrap_or(j);
                    if position != j {
                        ops.push(Op::MoveChild {
                            node_path: path.to_vec(),
                            old_index: position,
                            new_index: j,
                        });
                        let entry = current.remove(position);
                        current.insert(j, entry);
                    }

                    let mut child_path = path.to_vec();
                    child_path.push(j);
                    let child_ops = self.diff_pair(&old[i], new_child);
                    ops.extend(child_ops.iter().map(|op| op.rebased(&child_path)));
                }
                None => {
                    ops.push(Op::InsertChild {
                        node_path: path.to_vec(),
                        index: j,
                        child: new_child.clone(),
                    });
                    current.insert(j, None);
                }
            }
        }
    }

    fn check_collisions(&mut self, siblings: &[VNode]) {
        for kind in collisions(siblings) {
            let diagnostic = Diagnostic::from(kind);
            if !self.diagnostics.contains(&diagnostic) {
                error!(diagnostic = %diagnostic.kind, "Diff identity collision");
                self.diagnostics.push(diagnostic);
            }
        }
    }
}

/// Shared-provenance groups within one sibling list, in document order
pub(crate) fn collisions(siblings: &[VNode]) -> Vec<DiagnosticKind> {
    if siblings.len() < 2 {
        return Vec::new();
    }

    let mut counts: HashMap<Identity<'_>, usize> = HashMap::new();
    for sibling in siblings {
        *counts.entry(identity(sibling)).or_default() += 1;
    }

    let mut reported = Vec::new();
    let mut found = Vec::new();
    for sibling in siblings {
        let key = identity(sibling);
        let count = counts[&key];
        if count > 1 && !reported.contains(&key) {
            reported.push(key);
            found.push(DiagnosticKind::DiffIdentityCollision {
                provenance: sibling.source().to_string(),
                count,
            });
        }
    }
    found
}

fn diff_properties(old: &VNode, new: &VNode, ops: &mut Vec<Op>) {
    let mut set = |property: Property| {
        ops.push(Op::SetProperty {
            node_path: Vec::new(),
            property,
        })
    };

    if old.source() != new.source() {
        set(Property::Source(new.source().clone()));
    }

    match (old, new) {
        (VNode::Element(a), VNode::Element(b)) => {
            if a.tag != b.tag {
                set(Property::Tag(b.tag.clone()));
            }
            if a.attributes != b.attributes {
                set(Property::Attributes(b.attributes.clone()));
            }
        }
        (VNode::Text(a), VNode::Text(b)) => {
            if a.value != b.value {
                set(Property::Value(b.value.clone()));
            }
        }
        // Pairs are matched by kind, so this never lines up differently
        _ => {}
    }

    if old.style() != new.style() {
        set(Property::Style(new.style().clone()));
    }

    let (a, b) = (old.flags(), new.flags());
    if a.is_content_node != b.is_content_node {
        set(Property::IsContentNode(b.is_content_node));
    }
    if a.is_created_from_component_instance != b.is_created_from_component_instance {
        set(Property::IsCreatedFromComponentInstance(
            b.is_created_from_component_instance,
        ));
    }
    if a.is_component_instance != b.is_component_instance {
        set(Property::IsComponentInstance(b.is_component_instance));
    }
}

/// Diff two documents with a throwaway [`Differ`]
pub fn diff_vdocument(old: &VDocument, new: &VDocument) -> Vec<Op> {
    Differ::new().diff(old, new)
}
