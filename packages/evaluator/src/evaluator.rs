//! # Paperclip Evaluator
//!
//! Evaluates source trees (components, elements, text, variants, overrides) to
//! a rendered tree annotated with provenance.
//!
//! ## Purpose
//!
//! The evaluator instantiates components: it follows `is` inheritance chains,
//! selects the active variants of every instance, registers overrides at the
//! instance paths they target, projects call-site content into slots and emits
//! a [`VDocument`] whose nodes remember the source node they came from.
//!
//! ## Scopes and paths
//!
//! A node's *self path* is the instance path it is evaluated at plus its own id.
//! Only component instances (and root components) open a new scope: their
//! template children are evaluated at the instance's self path, while the
//! children of plain elements stay at the enclosing instance path. Overrides
//! are keyed by `self path of the declaring instance + target id path`, so a
//! template node picks up exactly the overrides whose key equals its self path.
//!
//! ## Determinism Contract
//!
//! Evaluating the same source snapshot twice yields identical trees except for
//! the freshly generated node ids:
//!
//! - style and attribute maps are ordered (`BTreeMap`)
//! - hash sets are only used for membership tests, never iterated into output
//! - provenance is derived purely from ids and instance paths
//!
//! ## Error Recovery
//!
//! Nothing here fails. Problems become [`Diagnostic`]s next to the output:
//!
//! - unresolved `is` on an element: rendered as a plain element
//! - unresolved base of a component: the chain ends there
//! - cyclic inheritance or recursive instantiation: an empty placeholder
//! - override target that does not resolve: the override is dropped
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paperclip_evaluator::{Evaluator, ReferenceIndex};
//!
//! let index = ReferenceIndex::new(&modules);
//! let mut evaluator = Evaluator::new(&index);
//! let evaluation = evaluator.evaluate_module(&modules[0]);
//! ```

use crate::override_resolution::{OverrideChildren, OverrideRegistry};
use crate::provenance::{InstancePath, Provenance};
use crate::resolver::{resolve_chain, resolve_target_path, InheritanceChain, Resolution, Resolver};
use crate::vdom::{fresh_id, NodeFlags, VDocument, VElement, VNode, VText};
use paperclip_common::{Diagnostic, DiagnosticKind, DiagnosticLevel};
use paperclip_model::{Component, Element, Module, Node, NodeId, Override, TextNode, DEFAULT_TAG};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, error, info, instrument, warn};

/// Uri given to roots that are not part of any indexed document
pub const ANONYMOUS_URI: &str = "<anonymous>";

/// Output of one evaluation pass
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub document: VDocument,
    pub diagnostics: Vec<Diagnostic>,
    /// Documents whose components were instantiated or extended
    pub dependencies: BTreeSet<String>,
}

impl Evaluation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Where nodes are being evaluated
#[derive(Debug, Clone)]
struct Frame<'r> {
    /// Document the nodes were authored in
    uri: &'r str,
    path: InstancePath,
    /// Variants active on the enclosing component
    active_variants: Rc<HashSet<NodeId>>,
    /// Call-site content of the enclosing instance
    slots: Option<Rc<SlotContent<'r>>>,
    in_template: bool,
    /// Components currently being instantiated, outermost first
    stack: Vec<&'r str>,
}

impl<'r> Frame<'r> {
    fn root(uri: &'r str) -> Self {
        Self {
            uri,
            path: InstancePath::root(),
            active_variants: Rc::new(HashSet::new()),
            slots: None,
            in_template: false,
            stack: Vec::new(),
        }
    }

    fn flags(&self) -> NodeFlags {
        NodeFlags {
            is_created_from_component_instance: self.in_template,
            ..NodeFlags::default()
        }
    }
}

/// Call-site children of an instance, partitioned by requested slot
#[derive(Debug)]
struct SlotContent<'r> {
    /// Frame the content was authored in
    caller: Frame<'r>,
    named: HashMap<&'r str, Vec<&'r Node>>,
    default: Vec<&'r Node>,
}

impl<'r> SlotContent<'r> {
    fn new(caller: Frame<'r>, children: &'r [Node]) -> Self {
        let mut named: HashMap<&'r str, Vec<&'r Node>> = HashMap::new();
        let mut default = Vec::new();

        for child in children {
            match child {
                Node::Element(element) => match element.slot_target() {
                    Some(slot) => named.entry(slot).or_default().push(child),
                    None => default.push(child),
                },
                _ => default.push(child),
            }
        }

        Self {
            caller,
            named,
            default,
        }
    }

    fn content_for(&self, slot_name: Option<&str>) -> &[&'r Node] {
        match slot_name {
            Some(name) => self.named.get(name).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.default,
        }
    }
}

enum Instance<'r> {
    /// Top-level component rendered on its own
    Root(&'r Component),
    /// Element referencing a component
    Element {
        element: &'r Element,
        component: &'r Component,
        component_uri: &'r str,
    },
}

fn is_active(variant_id: Option<&str>, active: &HashSet<NodeId>) -> bool {
    variant_id.map_or(true, |id| active.contains(id))
}

fn placeholder(source: Provenance, flags: NodeFlags) -> VNode {
    VNode::element(DEFAULT_TAG, source).with_flags(flags)
}

/// Evaluator over one resolver snapshot
///
/// Extends chains are memoized per evaluator, so a new snapshot needs a new
/// evaluator.
pub struct Evaluator<'r, R: Resolver + ?Sized> {
    resolver: &'r R,
    /// Keyed by (document uri, component id); duplicate ids across documents stay apart
    chains: HashMap<(&'r str, &'r str), Result<Rc<InheritanceChain<'r>>, DiagnosticKind>>,
    registry: OverrideRegistry<'r>,
    diagnostics: Vec<Diagnostic>,
    dependencies: BTreeSet<String>,
}

impl<'r, R: Resolver + ?Sized> Evaluator<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self {
            resolver,
            chains: HashMap::new(),
            registry: OverrideRegistry::new(),
            diagnostics: Vec::new(),
            dependencies: BTreeSet::new(),
        }
    }

    /// Evaluate a list of root nodes
    ///
    /// Each root's document uri is looked up through the resolver.
    #[instrument(skip(self, roots), fields(roots = roots.len()))]
    pub fn evaluate(&mut self, roots: &'r [Node]) -> Evaluation {
        info!("Starting evaluation");

        let mut document = VDocument::new();
        for root in roots {
            match root {
                Node::Module(module) => {
                    for child in &module.children {
                        self.evaluate_root(child, &module.uri, &mut document);
                    }
                }
                _ => {
                    let uri = self.resolver.resolve(root.id()).uri().unwrap_or(ANONYMOUS_URI);
                    self.evaluate_root(root, uri, &mut document);
                }
            }
        }

        self.finish(document)
    }

    /// Evaluate every top-level node of one document
    #[instrument(skip(self, module), fields(uri = %module.uri, roots = module.children.len()))]
    pub fn evaluate_module(&mut self, module: &'r Module) -> Evaluation {
        info!("Starting module evaluation");

        let mut document = VDocument::new();
        for child in &module.children {
            self.evaluate_root(child, &module.uri, &mut document);
        }

        self.finish(document)
    }

    fn finish(&mut self, document: VDocument) -> Evaluation {
        let evaluation = Evaluation {
            document,
            diagnostics: std::mem::take(&mut self.diagnostics),
            dependencies: std::mem::take(&mut self.dependencies),
        };

        info!(
            nodes = evaluation.document.nodes.len(),
            diagnostics = evaluation.diagnostics.len(),
            "Evaluation complete"
        );
        evaluation
    }

    fn evaluate_root(&mut self, root: &'r Node, uri: &'r str, document: &mut VDocument) {
        self.registry = OverrideRegistry::new();
        let frame = Frame::root(uri);

        let vnode = match root {
            Node::Component(component) => {
                debug!(component = %component.id, "Evaluating root component");
                Some(self.evaluate_instance(Instance::Root(component), &frame))
            }
            Node::Element(_) | Node::Text(_) => self.evaluate_node(root, &frame),
            _ => {
                debug!(id = root.id(), "Skipping non-visual root");
                None
            }
        };

        if let Some(mut vnode) = vnode {
            vnode.flags_mut().is_content_node = true;
            document.add_node(vnode);
        }
    }

    fn evaluate_node(&mut self, node: &'r Node, frame: &Frame<'r>) -> Option<VNode> {
        match node {
            Node::Text(text) => Some(self.evaluate_text(text, frame)),
            Node::Element(element) => Some(self.evaluate_element(element, frame)),
            Node::Component(component) => {
                debug!(component = %component.id, "Skipping component definition nested in content");
                None
            }
            Node::Module(_) | Node::Variant(_) | Node::Override(_) => None,
        }
    }

    fn evaluate_children(&mut self, nodes: &'r [Node], frame: &Frame<'r>) -> Vec<VNode> {
        nodes
            .iter()
            .filter_map(|node| self.evaluate_node(node, frame))
            .collect()
    }

    /// Evaluate `nodes` unless a CHILDREN override at `path` replaces them
    fn evaluate_overridable_children(
        &mut self,
        path: &InstancePath,
        nodes: &'r [Node],
        frame: &Frame<'r>,
    ) -> Vec<VNode> {
        match self.registry.get(path).and_then(|resolved| resolved.children) {
            Some(OverrideChildren { uri, nodes }) => {
                debug!(path = %path, "Replacing children from override");
                let frame = Frame {
                    uri,
                    ..frame.clone()
                };
                self.evaluate_children(nodes, &frame)
            }
            None => self.evaluate_children(nodes, frame),
        }
    }

    fn evaluate_text(&mut self, text: &'r TextNode, frame: &Frame<'r>) -> VNode {
        let path = frame.path.append(&text.id);
        let mut value = text.value.clone();
        let mut style = text.style.clone();

        if let Some(resolved) = self.registry.get(&path) {
            if let Some(overridden) = &resolved.text {
                value = overridden.clone();
            }
            style.extend(resolved.style.clone());
        }

        VNode::Text(VText {
            id: fresh_id(),
            source: Provenance::new(frame.uri, path),
            value,
            style,
            flags: frame.flags(),
        })
    }

    fn evaluate_element(&mut self, element: &'r Element, frame: &Frame<'r>) -> VNode {
        if let Some(component_id) = element.is.as_deref() {
            match self.resolver.resolve(component_id) {
                Resolution::Found {
                    uri,
                    node: Node::Component(component),
                } => {
                    return self.evaluate_instance(
                        Instance::Element {
                            element,
                            component,
                            component_uri: uri,
                        },
                        frame,
                    );
                }
                _ => self.report(DiagnosticKind::UnresolvedReference {
                    id: component_id.to_string(),
                    from: element.id.clone(),
                }),
            }
        }

        let path = frame.path.append(&element.id);
        let children = if element.is_slot() {
            self.evaluate_slot(element, &path, frame)
        } else {
            self.evaluate_overridable_children(&path, &element.children, frame)
        };

        let mut attributes = element.attributes.clone();
        let mut style = element.style.clone();
        if let Some(resolved) = self.registry.get(&path) {
            attributes.extend(resolved.attributes.clone());
            style.extend(resolved.style.clone());
        }

        VNode::Element(VElement {
            id: fresh_id(),
            source: Provenance::new(frame.uri, path),
            tag: element.tag.clone(),
            attributes,
            style,
            children,
            flags: frame.flags(),
        })
    }

    /// Children of a slot marker: projected call-site content or the default
    fn evaluate_slot(
        &mut self,
        slot: &'r Element,
        path: &InstancePath,
        frame: &Frame<'r>,
    ) -> Vec<VNode> {
        if self.registry.get(path).and_then(|resolved| resolved.children).is_some() {
            return self.evaluate_overridable_children(path, &slot.children, frame);
        }

        if let Some(slots) = frame.slots.clone() {
            let content = slots.content_for(slot.slot_name());
            if !content.is_empty() {
                debug!(slot = ?slot.slot_name(), count = content.len(), "Projecting slot content");
                return content
                    .iter()
                    .copied()
                    .filter_map(|node| self.evaluate_node(node, &slots.caller))
                    .collect();
            }
        }

        self.evaluate_children(&slot.children, frame)
    }

    fn evaluate_instance(&mut self, instance: Instance<'r>, frame: &Frame<'r>) -> VNode {
        let (element, component, component_uri) = match instance {
            Instance::Root(component) => (None, component, frame.uri),
            Instance::Element {
                element,
                component,
                component_uri,
            } => (Some(element), component, component_uri),
        };
        let instance_id = element.map_or(component.id.as_str(), |element| element.id.as_str());
        let self_path = frame.path.append(instance_id);
        let source = Provenance::new(frame.uri, self_path.clone());
        let flags = NodeFlags {
            is_component_instance: element.is_some(),
            ..frame.flags()
        };

        if frame.stack.contains(&component.id.as_str()) {
            let mut stack: Vec<String> = frame.stack.iter().map(|id| id.to_string()).collect();
            stack.push(component.id.clone());
            self.report(DiagnosticKind::RecursiveInstance {
                component: component.id.clone(),
                stack,
            });
            return placeholder(source, flags);
        }

        let chain = match self.chain(component_uri, component) {
            Ok(chain) => chain,
            Err(kind) => {
                self.report(kind);
                return placeholder(source, flags);
            }
        };

        if let Some(base) = &chain.unresolved {
            let from = chain
                .links
                .last()
                .map(|link| link.component.id.clone())
                .unwrap_or_default();
            self.report(DiagnosticKind::UnresolvedReference {
                id: base.clone(),
                from,
            });
        }
        for link in &chain.links {
            self.dependencies.insert(link.uri.to_string());
        }

        // Call-site overrides first: they are the most specific scope, and a
        // VARIANT override at the instance root selects its active variants
        if let Some(element) = element {
            let call_site: Vec<&'r Override> = element
                .overrides
                .iter()
                .filter(|o| is_active(o.variant_id.as_deref(), &frame.active_variants))
                .collect();
            let valid = self.validate_targets(&chain, instance_id, call_site);
            self.registry.register_batch(&self_path, frame.uri, valid);
        }

        let active = self.active_variants(&chain, element, &self_path);
        debug!(
            instance = instance_id,
            chain = ?chain.ids(),
            active = ?active,
            "Evaluating component instance"
        );

        for link in chain.links.iter().copied() {
            let component: &'r Component = link.component;
            let mut declared: Vec<&'r Override> = component
                .overrides
                .iter()
                .filter(|o| is_active(o.variant_id.as_deref(), &active))
                .collect();
            for variant in &component.variants {
                declared.extend(variant.overrides.iter().filter(|o| {
                    active.contains(o.variant_id.as_deref().unwrap_or(variant.id.as_str()))
                }));
            }
            let valid = self.validate_targets(&chain, &component.id, declared);
            self.registry.register_batch(&self_path, link.uri, valid);
        }

        // Base first, so derived components, the call site and overrides win
        let mut style = paperclip_model::StyleMap::new();
        let mut attributes = paperclip_model::AttributeMap::new();
        for link in chain.links.iter().rev() {
            style.extend(link.component.style.clone());
            attributes.extend(link.component.attributes.clone());
        }
        if let Some(element) = element {
            style.extend(element.style.clone());
            attributes.extend(element.attributes.clone());
        }
        if let Some(resolved) = self.registry.get(&self_path) {
            style.extend(resolved.style.clone());
            attributes.extend(resolved.attributes.clone());
        }

        let slots = element.map(|element| Rc::new(SlotContent::new(frame.clone(), &element.children)));
        let mut stack = frame.stack.clone();
        stack.push(component.id.as_str());

        let (template_uri, template) = chain.template();
        let child_frame = Frame {
            uri: template_uri,
            path: self_path.clone(),
            active_variants: Rc::new(active),
            slots,
            in_template: true,
            stack,
        };
        let children = self.evaluate_overridable_children(&self_path, template, &child_frame);

        VNode::Element(VElement {
            id: fresh_id(),
            source,
            tag: chain.tag().unwrap_or(DEFAULT_TAG).to_string(),
            attributes,
            style,
            children,
            flags,
        })
    }

    /// Default variants along the chain plus the instance's selection
    ///
    /// A VARIANT override registered at the instance replaces the selection
    /// written on the instance element itself.
    fn active_variants(
        &self,
        chain: &InheritanceChain<'r>,
        element: Option<&'r Element>,
        self_path: &InstancePath,
    ) -> HashSet<NodeId> {
        let mut active: HashSet<NodeId> = chain
            .links
            .iter()
            .flat_map(|link| link.component.default_variants())
            .map(|variant| variant.id.clone())
            .collect();

        match self.registry.get(self_path).and_then(|resolved| resolved.variant.as_ref()) {
            Some(selected) => active.extend(selected.iter().cloned()),
            None => {
                if let Some(element) = element {
                    active.extend(element.variant.iter().cloned());
                }
            }
        }

        active
    }

    /// Drop overrides whose target path does not exist in the template
    fn validate_targets(
        &mut self,
        chain: &InheritanceChain<'r>,
        scope: &str,
        overrides: Vec<&'r Override>,
    ) -> Vec<&'r Override> {
        let mut valid = Vec::with_capacity(overrides.len());
        for override_def in overrides {
            if resolve_target_path(self.resolver, chain, &override_def.target_id_path) {
                valid.push(override_def);
            } else {
                self.report(DiagnosticKind::InvalidOverrideTarget {
                    override_id: override_def.id.clone(),
                    scope: scope.to_string(),
                    target_id_path: override_def.target_id_path.clone(),
                });
            }
        }
        valid
    }

    fn chain(
        &mut self,
        uri: &'r str,
        component: &'r Component,
    ) -> Result<Rc<InheritanceChain<'r>>, DiagnosticKind> {
        let key = (uri, component.id.as_str());
        if let Some(cached) = self.chains.get(&key) {
            return cached.clone();
        }

        let resolved = resolve_chain(self.resolver, uri, component).map(Rc::new);
        self.chains.insert(key, resolved.clone());
        resolved
    }

    fn report(&mut self, kind: DiagnosticKind) {
        let diagnostic = Diagnostic::from(kind);
        match diagnostic.level {
            DiagnosticLevel::Warning => warn!(diagnostic = %diagnostic.kind, "Evaluation warning"),
            DiagnosticLevel::Error => error!(diagnostic = %diagnostic.kind, "Evaluation error"),
        }
        if !self.diagnostics.contains(&diagnostic) {
            self.diagnostics.push(diagnostic);
        }
    }
}

/// Evaluate every module's content against an index of all of them
pub fn evaluate_modules(modules: &[Module]) -> Vec<Evaluation> {
    let index = crate::resolver::ReferenceIndex::new(modules);
    let mut evaluator = Evaluator::new(&index);
    modules
        .iter()
        .map(|module| evaluator.evaluate_module(module))
        .collect()
}
