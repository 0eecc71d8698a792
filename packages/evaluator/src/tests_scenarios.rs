/// End-to-end scenarios: evaluate, diff, patch
use crate::evaluator::{Evaluation, Evaluator};
use crate::resolver::ReferenceIndex;
use crate::vdom::{VDocument, VNode};
use crate::vdom_differ::{diff_vdocument, Op, Property};
use crate::vdom_patcher::patch;
use paperclip_model::{AttributeMap, Component, Element, Module, Node, Override, TextNode};

const URI: &str = "file:///test.pc";

fn render(modules: &[Module]) -> Evaluation {
    let index = ReferenceIndex::new(modules);
    let mut evaluator = Evaluator::new(&index);
    evaluator.evaluate_module(&modules[0])
}

fn render_roots(modules: &[Module], roots: &[Node]) -> VDocument {
    let index = ReferenceIndex::new(modules);
    let mut evaluator = Evaluator::new(&index);
    evaluator.evaluate(roots).document
}

#[test]
fn test_component_with_span_and_text() {
    let modules = vec![Module::new("m", URI).with_child(
        Component::new("test")
            .with_tag("span")
            .with_child(TextNode::new("text", "hello")),
    )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());
    assert_eq!(evaluation.document.nodes.len(), 1);

    let span = evaluation.document.nodes[0].as_element().unwrap();
    assert_eq!(span.tag, "span");
    assert_eq!(span.children.len(), 1);
    assert_eq!(span.children[0].as_text().unwrap().value, "hello");
}

#[test]
fn test_named_and_default_slots() {
    let modules = vec![Module::new("m", URI)
        .with_child(
            Component::new("test")
                .with_child(Element::slot("slot-a", Some("a")))
                .with_child(Element::slot("slot-default", None)),
        )
        .with_child(
            Element::instance("inst", "test")
                .with_child(
                    Element::new("b-span", "span")
                        .with_attr("slot", "a")
                        .with_child(TextNode::new("b-text", "b")),
                )
                .with_child(TextNode::new("a-text", "a"))
                .with_child(TextNode::new("c-text", "c")),
        )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let instance = &evaluation.document.nodes[1];
    assert!(instance.flags().is_component_instance);
    assert_eq!(instance.children().len(), 2);

    let slot_a = &instance.children()[0];
    assert_eq!(slot_a.source().node_id(), "inst slot-a");
    assert_eq!(slot_a.children().len(), 1);
    assert_eq!(slot_a.children()[0].as_element().unwrap().tag, "span");
    assert_eq!(slot_a.text_content(), "b");

    let default_slot = &instance.children()[1];
    let values: Vec<String> = default_slot.children().iter().map(VNode::text_content).collect();
    assert_eq!(values, vec!["a", "c"]);

    // projected content keeps the caller's provenance
    assert_eq!(slot_a.children()[0].source().node_id(), "b-span");
    assert!(!default_slot.children()[0].flags().is_created_from_component_instance);
}

fn slot_document(slot_name: &str) -> Vec<Module> {
    vec![Module::new("m", URI).with_child(
        Component::new("test")
            .with_child(Element::slot("named", Some(slot_name)))
            .with_child(Element::slot("default", None)),
    )]
}

#[test]
fn test_renaming_slot_only_sets_attributes() {
    let roots: Vec<Node> = vec![Element::instance("inst", "test")
        .with_child(TextNode::new("content", "hello"))
        .into()];

    let old = render_roots(&slot_document("test"), &roots);
    let new = render_roots(&slot_document("test2"), &roots);

    let ops = diff_vdocument(&old, &new);
    let mut attributes = AttributeMap::new();
    attributes.insert("name".to_string(), "test2".to_string());
    assert_eq!(
        ops,
        vec![Op::SetProperty {
            node_path: vec![0, 0],
            property: Property::Attributes(attributes),
        }]
    );

    let patched = patch(&ops, &old).unwrap();
    assert!(patched.structural_eq(&new));
    assert_eq!(patched.nodes[0].children()[1].text_content(), "hello");
}

#[test]
fn test_inherited_style() {
    let modules = vec![Module::new("m", URI)
        .with_child(Component::new("a").extends("b"))
        .with_child(Component::new("b").with_style("color", "red"))];

    let evaluation = render(&modules);
    let a = &evaluation.document.nodes[0];
    assert_eq!(a.source().node_id(), "a");
    assert_eq!(a.style().get("color").map(String::as_str), Some("red"));
}

#[test]
fn test_derived_style_wins() {
    let modules = vec![Module::new("m", URI)
        .with_child(
            Component::new("child")
                .extends("parent")
                .with_style("color", "blue"),
        )
        .with_child(
            Component::new("parent")
                .with_style("color", "red")
                .with_style("padding", "4px"),
        )];

    let evaluation = render(&modules);
    let child = &evaluation.document.nodes[0];
    assert_eq!(child.style().get("color").map(String::as_str), Some("blue"));
    assert_eq!(child.style().get("padding").map(String::as_str), Some("4px"));
}

#[test]
fn test_derived_override_beats_base_override() {
    let modules = vec![Module::new("m", URI)
        .with_child(
            Component::new("child")
                .extends("parent")
                .with_override(Override::style("child-o", &["label"], &[("color", "green")])),
        )
        .with_child(
            Component::new("parent")
                .with_child(TextNode::new("label", "Hi").with_style("color", "red"))
                .with_override(Override::style("parent-o", &["label"], &[("color", "blue"), ("margin", "0")])),
        )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let label = &evaluation.document.nodes[0].children()[0];
    assert_eq!(label.source().node_id(), "child label");
    assert_eq!(label.style().get("color").map(String::as_str), Some("green"));
    assert_eq!(label.style().get("margin").map(String::as_str), Some("0"));

    let parent_label = &evaluation.document.nodes[1].children()[0];
    assert_eq!(parent_label.style().get("color").map(String::as_str), Some("blue"));
}

#[test]
fn test_round_trip_after_edit() {
    let before = vec![Module::new("m", URI).with_child(
        Component::new("card")
            .with_child(Element::new("title", "h1").with_child(TextNode::new("title-text", "Hello")))
            .with_child(Element::new("body", "p").with_child(TextNode::new("body-text", "Body"))),
    )];
    let after = vec![Module::new("m", URI).with_child(
        Component::new("card")
            .with_style("padding", "8px")
            .with_child(Element::new("body", "p").with_child(TextNode::new("body-text", "Body!")))
            .with_child(Element::new("footer", "footer"))
            .with_child(Element::new("title", "h2").with_child(TextNode::new("title-text", "Hello"))),
    )];

    let old = render(&before).document;
    let new = render(&after).document;

    let ops = diff_vdocument(&old, &new);
    assert!(!ops.is_empty());
    assert!(ops.iter().all(|op| !matches!(op, Op::RemoveChild { .. })));

    let patched = patch(&ops, &old).unwrap();
    assert!(patched.structural_eq(&new));
    assert!(diff_vdocument(&patched, &new).is_empty());
}
