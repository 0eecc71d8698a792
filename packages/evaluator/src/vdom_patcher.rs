//! Operational-transform patcher
//!
//! Applies a differ script to a rendered document, op by op, each op seeing
//! the result of the ones before it. [`patch`] leaves its input untouched;
//! [`apply_op`] edits a document in place for consumers that own one.

use crate::vdom::{VDocument, VNode};
use crate::vdom_differ::{Op, Property};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Node path {path:?} does not resolve")]
    PathOutOfRange { path: Vec<usize> },

    #[error("Index {index} is out of range for {len} children at {path:?}")]
    IndexOutOfRange {
        path: Vec<usize>,
        index: usize,
        len: usize,
    },

    #[error("Node at {path:?} is not an element")]
    NotAnElement { path: Vec<usize> },

    #[error("Property '{property}' does not apply to the node at {path:?}")]
    PropertyMismatch { path: Vec<usize>, property: String },
}

pub type PatchResult<T> = Result<T, PatchError>;

/// Apply `ops` to a copy of `document`
///
/// Any error means the ops and the document are out of sync; the caller
/// should fall back to a full re-evaluation.
#[instrument(skip_all, fields(ops = ops.len()))]
pub fn patch(ops: &[Op], document: &VDocument) -> PatchResult<VDocument> {
    let mut patched = document.clone();
    for op in ops {
        apply_op(&mut patched, op)?;
    }
    debug!(roots = patched.nodes.len(), "Patch applied");
    Ok(patched)
}

/// Apply one op in place
///
/// Every node on the path to the op's target gets a fresh id, since its
/// value changes.
pub fn apply_op(document: &mut VDocument, op: &Op) -> PatchResult<()> {
    match op {
        Op::SetProperty {
            node_path,
            property,
        } => {
            let node = node_mut(document, node_path)?;
            set_property(node, property).ok_or_else(|| PatchError::PropertyMismatch {
                path: node_path.clone(),
                property: property.name().to_string(),
            })
        }
        Op::InsertChild {
            node_path,
            index,
            child,
        } => {
            let children = children_mut(document, node_path)?;
            if *index > children.len() {
                return Err(out_of_range(node_path, *index, children.len()));
            }
            children.insert(*index, child.clone());
            Ok(())
        }
        Op::RemoveChild { node_path, index } => {
            let children = children_mut(document, node_path)?;
            if *index >= children.len() {
                return Err(out_of_range(node_path, *index, children.len()));
            }
            children.remove(*index);
            Ok(())
        }
        Op::MoveChild {
            node_path,
            old_index,
            new_index,
        } => {
            let children = children_mut(document, node_path)?;
            let len = children.len();
            if *old_index >= len {
                return Err(out_of_range(node_path, *old_index, len));
            }
            if *new_index >= len {
                return Err(out_of_range(node_path, *new_index, len));
            }
            let child = children.remove(*old_index);
            children.insert(*new_index, child);
            Ok(())
        }
    }
}

fn out_of_range(path: &[usize], index: usize, len: usize) -> PatchError {
    PatchError::IndexOutOfRange {
        path: path.to_vec(),
        index,
        len,
    }
}

fn node_mut<'a>(document: &'a mut VDocument, path: &[usize]) -> PatchResult<&'a mut VNode> {
    let out_of_range = || PatchError::PathOutOfRange {
        path: path.to_vec(),
    };

    let (first, rest) = path.split_first().ok_or_else(out_of_range)?;
    let mut current = document.nodes.get_mut(*first).ok_or_else(out_of_range)?;
    current.refresh_id();

    for index in rest {
        current = match current {
            VNode::Element(element) => element.children.get_mut(*index).ok_or_else(out_of_range)?,
            VNode::Text(_) => return Err(out_of_range()),
        };
        current.refresh_id();
    }

    Ok(current)
}

fn children_mut<'a>(document: &'a mut VDocument, path: &[usize]) -> PatchResult<&'a mut Vec<VNode>> {
    if path.is_empty() {
        return Ok(&mut document.nodes);
    }

    match node_mut(document, path)? {
        VNode::Element(element) => Ok(&mut element.children),
        VNode::Text(_) => Err(PatchError::NotAnElement {
            path: path.to_vec(),
        }),
    }
}

/// `None` when the property does not exist on this kind of node
fn set_property(node: &mut VNode, property: &Property) -> Option<()> {
    match (node, property) {
        (VNode::Element(element), Property::Tag(tag)) => element.tag = tag.clone(),
        (VNode::Element(element), Property::Attributes(attributes)) => {
            element.attributes = attributes.clone()
        }
        (VNode::Text(text), Property::Value(value)) => text.value = value.clone(),
        (VNode::Element(_), Property::Value(_))
        | (VNode::Text(_), Property::Tag(_) | Property::Attributes(_)) => return None,
        (node, Property::Style(style)) => *node.style_mut() = style.clone(),
        (VNode::Element(element), Property::Source(source)) => element.source = source.clone(),
        (VNode::Text(text), Property::Source(source)) => text.source = source.clone(),
        (node, Property::IsContentNode(value)) => node.flags_mut().is_content_node = *value,
        (node, Property::IsCreatedFromComponentInstance(value)) => {
            node.flags_mut().is_created_from_component_instance = *value
        }
        (node, Property::IsComponentInstance(value)) => {
            node.flags_mut().is_component_instance = *value
        }
    }
    Some(())
}
