use paperclip_model::*;

/// Visitor pattern for traversing source nodes immutably
///
/// This trait provides default implementations that walk the entire tree,
/// including variant overrides and the node lists carried by CHILDREN overrides.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor<'ast>: Sized {
    fn visit_module(&mut self, module: &'ast Module) {
        walk_module(self, module);
    }

    fn visit_node(&mut self, node: &'ast Node) {
        walk_node(self, node);
    }

    fn visit_component(&mut self, component: &'ast Component) {
        walk_component(self, component);
    }

    fn visit_element(&mut self, element: &'ast Element) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &'ast TextNode) {
        // Leaf node, no children to walk
    }

    fn visit_variant(&mut self, variant: &'ast Variant) {
        walk_variant(self, variant);
    }

    fn visit_override(&mut self, override_def: &'ast Override) {
        walk_override(self, override_def);
    }
}

pub fn walk_module<'ast, V: Visitor<'ast>>(visitor: &mut V, module: &'ast Module) {
    for child in &module.children {
        visitor.visit_node(child);
    }
}

pub fn walk_node<'ast, V: Visitor<'ast>>(visitor: &mut V, node: &'ast Node) {
    match node {
        Node::Module(module) => visitor.visit_module(module),
        Node::Component(component) => visitor.visit_component(component),
        Node::Element(element) => visitor.visit_element(element),
        Node::Text(text) => visitor.visit_text(text),
        Node::Variant(variant) => visitor.visit_variant(variant),
        Node::Override(override_def) => visitor.visit_override(override_def),
    }
}

pub fn walk_component<'ast, V: Visitor<'ast>>(visitor: &mut V, component: &'ast Component) {
    for child in &component.children {
        visitor.visit_node(child);
    }
    for variant in &component.variants {
        visitor.visit_variant(variant);
    }
    for override_def in &component.overrides {
        visitor.visit_override(override_def);
    }
}

pub fn walk_element<'ast, V: Visitor<'ast>>(visitor: &mut V, element: &'ast Element) {
    for child in &element.children {
        visitor.visit_node(child);
    }
    for override_def in &element.overrides {
        visitor.visit_override(override_def);
    }
}

pub fn walk_variant<'ast, V: Visitor<'ast>>(visitor: &mut V, variant: &'ast Variant) {
    for override_def in &variant.overrides {
        visitor.visit_override(override_def);
    }
}

pub fn walk_override<'ast, V: Visitor<'ast>>(visitor: &mut V, override_def: &'ast Override) {
    if let OverrideValue::Children(children) = &override_def.property {
        for child in children {
            visitor.visit_node(child);
        }
    }
}
