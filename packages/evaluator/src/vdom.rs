use crate::provenance::Provenance;
use paperclip_model::{AttributeMap, StyleMap};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a process-wide unique rendered node id
///
/// Ids are never reused, so an id always names one immutable node value.
pub fn fresh_id() -> String {
    format!("v{}", NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Flags describing where a rendered node came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFlags {
    /// Root of a top-level renderable document
    pub is_content_node: bool,
    /// Produced from a component template
    pub is_created_from_component_instance: bool,
    /// Rendered root of a component instance element
    pub is_component_instance: bool,
}

/// Rendered (synthetic) node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    Element(VElement),
    Text(VText),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VElement {
    pub id: String,
    pub source: Provenance,
    pub tag: String,
    pub attributes: AttributeMap,
    pub style: StyleMap,
    pub children: Vec<VNode>,
    pub flags: NodeFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VText {
    pub id: String,
    pub source: Provenance,
    pub value: String,
    pub style: StyleMap,
    pub flags: NodeFlags,
}

/// Kind of a rendered node; part of its diff identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
}

impl VNode {
    pub fn element(tag: impl Into<String>, source: Provenance) -> Self {
        VNode::Element(VElement {
            id: fresh_id(),
            source,
            tag: tag.into(),
            attributes: AttributeMap::new(),
            style: StyleMap::new(),
            children: Vec::new(),
            flags: NodeFlags::default(),
        })
    }

    pub fn text(value: impl Into<String>, source: Provenance) -> Self {
        VNode::Text(VText {
            id: fresh_id(),
            source,
            value: value.into(),
            style: StyleMap::new(),
            flags: NodeFlags::default(),
        })
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element(element) = &mut self {
            element.attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.style_mut().insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element(element) = &mut self {
            element.children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element(element) = &mut self {
            element.children.extend(new_children);
        }
        self
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        *self.flags_mut() = flags;
        self
    }

    pub fn id(&self) -> &str {
        match self {
            VNode::Element(element) => &element.id,
            VNode::Text(text) => &text.id,
        }
    }

    pub fn source(&self) -> &Provenance {
        match self {
            VNode::Element(element) => &element.source,
            VNode::Text(text) => &text.source,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            VNode::Element(_) => NodeKind::Element,
            VNode::Text(_) => NodeKind::Text,
        }
    }

    pub fn style(&self) -> &StyleMap {
        match self {
            VNode::Element(element) => &element.style,
            VNode::Text(text) => &text.style,
        }
    }

    pub fn style_mut(&mut self) -> &mut StyleMap {
        match self {
            VNode::Element(element) => &mut element.style,
            VNode::Text(text) => &mut text.style,
        }
    }

    pub fn flags(&self) -> NodeFlags {
        match self {
            VNode::Element(element) => element.flags,
            VNode::Text(text) => text.flags,
        }
    }

    pub fn flags_mut(&mut self) -> &mut NodeFlags {
        match self {
            VNode::Element(element) => &mut element.flags,
            VNode::Text(text) => &mut text.flags,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(element) => &element.children,
            VNode::Text(_) => &[],
        }
    }

    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            VNode::Element(element) => Some(element),
            VNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&VText> {
        match self {
            VNode::Text(text) => Some(text),
            VNode::Element(_) => None,
        }
    }

    /// Replace this node's id with a fresh one
    pub fn refresh_id(&mut self) {
        let id = fresh_id();
        match self {
            VNode::Element(element) => element.id = id,
            VNode::Text(text) => text.id = id,
        }
    }

    /// Concatenated text of all text descendants
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text(text) => text.value.clone(),
            VNode::Element(element) => element
                .children
                .iter()
                .map(VNode::text_content)
                .collect::<String>(),
        }
    }

    /// Equality of everything except the per-evaluation ids
    pub fn structural_eq(&self, other: &VNode) -> bool {
        match (self, other) {
            (VNode::Element(a), VNode::Element(b)) => {
                a.source == b.source
                    && a.tag == b.tag
                    && a.attributes == b.attributes
                    && a.style == b.style
                    && a.flags == b.flags
                    && a.children.len() == b.children.len()
                    && a
                        .children
                        .iter()
                        .zip(&b.children)
                        .all(|(x, y)| x.structural_eq(y))
            }
            (VNode::Text(a), VNode::Text(b)) => {
                a.source == b.source && a.value == b.value && a.style == b.style && a.flags == b.flags
            }
            _ => false,
        }
    }
}

/// Rendered document: the ordered list of evaluated roots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VDocument {
    pub nodes: Vec<VNode>,
}

impl VDocument {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn add_node(&mut self, node: VNode) {
        self.nodes.push(node);
    }

    /// Locate a node by child indices from the document root
    pub fn get(&self, path: &[usize]) -> Option<&VNode> {
        let (first, rest) = path.split_first()?;
        let mut current = self.nodes.get(*first)?;
        for index in rest {
            current = current.children().get(*index)?;
        }
        Some(current)
    }

    pub fn structural_eq(&self, other: &VDocument) -> bool {
        self.nodes.len() == other.nodes.len()
            && self
                .nodes
                .iter()
                .zip(&other.nodes)
                .all(|(a, b)| a.structural_eq(b))
    }
}
