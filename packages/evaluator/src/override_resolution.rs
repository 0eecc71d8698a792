//! Override registry
//!
//! Overrides are registered scope by scope while the evaluator descends
//! through component instances, keyed by the absolute instance path of the
//! node they target. Registration is cumulative:
//!
//! - within one batch (one declaring scope) a later override wins over an
//!   earlier one for the same path and property;
//! - across batches the earlier (outer, more specific) registration wins, so
//!   call-site overrides beat a component's own, which beat its base's;
//! - CHILDREN is always first-registered-wins.

use crate::provenance::InstancePath;
use paperclip_model::{AttributeMap, Node, NodeId, Override, OverrideValue, StyleMap};
use std::collections::HashMap;
use tracing::debug;

/// Replacement child list together with the document that declared it
#[derive(Debug, Clone, Copy)]
pub struct OverrideChildren<'a> {
    pub uri: &'a str,
    pub nodes: &'a [Node],
}

/// Everything overridden at one path
#[derive(Debug, Clone, Default)]
pub struct ResolvedOverride<'a> {
    pub style: StyleMap,
    pub attributes: AttributeMap,
    pub children: Option<OverrideChildren<'a>>,
    pub text: Option<String>,
    pub variant: Option<Vec<NodeId>>,
}

impl<'a> ResolvedOverride<'a> {
    /// Apply one override, letting it replace what is already set
    fn apply_latest(&mut self, uri: &'a str, value: &'a OverrideValue) {
        match value {
            OverrideValue::Style(style) => {
                self.style
                    .extend(style.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            OverrideValue::Attributes(attributes) => {
                self.attributes
                    .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            OverrideValue::Children(nodes) => {
                if self.children.is_none() {
                    self.children = Some(OverrideChildren { uri, nodes });
                }
            }
            OverrideValue::Text(text) => self.text = Some(text.clone()),
            OverrideValue::Variant(variant) => self.variant = Some(variant.clone()),
        }
    }

    /// Merge a batch from an inner scope underneath what is already registered
    fn merge_inner(&mut self, inner: ResolvedOverride<'a>) {
        for (key, value) in inner.style {
            self.style.entry(key).or_insert(value);
        }
        for (key, value) in inner.attributes {
            self.attributes.entry(key).or_insert(value);
        }
        if self.children.is_none() {
            self.children = inner.children;
        }
        if self.text.is_none() {
            self.text = inner.text;
        }
        if self.variant.is_none() {
            self.variant = inner.variant;
        }
    }
}

/// Path-keyed registry of overrides for one evaluation pass
#[derive(Debug, Default)]
pub struct OverrideRegistry<'a> {
    entries: HashMap<InstancePath, ResolvedOverride<'a>>,
}

impl<'a> OverrideRegistry<'a> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register the overrides one scope declares against the instance at `scope`
    ///
    /// Callers filter by active variant and target validity beforehand.
    pub fn register_batch<I>(&mut self, scope: &InstancePath, uri: &'a str, overrides: I)
    where
        I: IntoIterator<Item = &'a Override>,
    {
        let mut batch: Vec<(InstancePath, ResolvedOverride<'a>)> = Vec::new();

        for override_def in overrides {
            let path = scope.join(&override_def.target_id_path);
            let position = match batch.iter().position(|(existing, _)| *existing == path) {
                Some(position) => position,
                None => {
                    batch.push((path, ResolvedOverride::default()));
                    batch.len() - 1
                }
            };
            batch[position].1.apply_latest(uri, &override_def.property);
        }

        for (path, resolved) in batch {
            debug!(path = %path, "Registering override");
            self.entries.entry(path).or_default().merge_inner(resolved);
        }
    }

    pub fn get(&self, path: &InstancePath) -> Option<&ResolvedOverride<'a>> {
        self.entries.get(path)
    }
}
