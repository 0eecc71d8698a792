/// Tests for slot projection and fallback content
use crate::evaluator::{Evaluation, Evaluator};
use crate::resolver::ReferenceIndex;
use crate::validator::Validator;
use paperclip_model::{Component, Element, Module, Override, TextNode};

const URI: &str = "file:///slots.pc";

fn render(modules: &[Module]) -> Evaluation {
    let index = ReferenceIndex::new(modules);
    let mut evaluator = Evaluator::new(&index);
    evaluator.evaluate_module(&modules[0])
}

fn card() -> Component {
    Component::new("card")
        .with_child(
            Element::new("header", "header").with_child(
                Element::slot("title-slot", Some("title"))
                    .with_child(TextNode::new("default-title", "Default title")),
            ),
        )
        .with_child(
            Element::slot("body-slot", None).with_child(TextNode::new("default-body", "Default body")),
        )
}

#[test]
fn test_slot_with_default_content() {
    let modules = vec![Module::new("m", URI)
        .with_child(card())
        .with_child(Element::instance("c1", "card"))];

    let evaluation = render(&modules);
    let instance = &evaluation.document.nodes[1];

    let title = &instance.children()[0].children()[0];
    assert_eq!(title.text_content(), "Default title");

    let fallback = &title.children()[0];
    assert_eq!(fallback.source().node_id(), "c1 default-title");
    assert!(fallback.flags().is_created_from_component_instance);

    assert_eq!(instance.children()[1].text_content(), "Default body");
}

#[test]
fn test_slot_with_inserted_content() {
    let modules = vec![Module::new("m", URI).with_child(card()).with_child(
        Element::instance("c1", "card").with_child(TextNode::new("inserted", "Inserted content")),
    )];

    let evaluation = render(&modules);
    let instance = &evaluation.document.nodes[1];

    // default slot replaced, named slot falls back
    let body = &instance.children()[1];
    assert_eq!(body.children().len(), 1);
    assert_eq!(body.text_content(), "Inserted content");
    assert_eq!(body.children()[0].source().node_id(), "inserted");
    assert_eq!(instance.children()[0].text_content(), "Default title");
}

#[test]
fn test_content_for_unknown_slot_is_dropped() {
    let modules = vec![Module::new("m", URI).with_child(card()).with_child(
        Element::instance("c1", "card").with_child(
            Element::new("stray", "span")
                .with_attr("slot", "missing")
                .with_child(TextNode::new("stray-text", "lost")),
        ),
    )];

    let evaluation = render(&modules);
    let instance = &evaluation.document.nodes[1];
    assert!(!instance.text_content().contains("lost"));
    assert_eq!(instance.children()[1].text_content(), "Default body");
}

#[test]
fn test_projected_content_uses_caller_scope() {
    // page > card instance > projected label; the page can override the label
    // because it authored it
    let modules = vec![Module::new("m", URI).with_child(card()).with_child(
        Component::new("page")
            .with_child(
                Element::instance("c1", "card")
                    .with_child(TextNode::new("label", "From page")),
            )
            .with_override(Override::style("o1", &["label"], &[("color", "red")])),
    )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let page = &evaluation.document.nodes[1];
    let label = &page.children()[0].children()[1].children()[0];
    assert_eq!(label.source().node_id(), "page label");
    assert_eq!(label.style().get("color").map(String::as_str), Some("red"));
    assert!(label.flags().is_created_from_component_instance);
}

#[test]
fn test_nested_instance_as_slot_content() {
    let modules = vec![Module::new("m", URI)
        .with_child(Component::new("box").with_child(Element::slot("box-slot", None)))
        .with_child(
            Element::instance("outer", "box").with_child(
                Element::instance("inner", "box").with_child(TextNode::new("leaf", "leaf")),
            ),
        )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let outer = &evaluation.document.nodes[1];
    let inner = &outer.children()[0].children()[0];
    assert!(inner.flags().is_component_instance);
    assert_eq!(inner.source().node_id(), "inner");
    assert_eq!(inner.text_content(), "leaf");
}

#[test]
fn test_slot_forwarding_through_nested_component() {
    // frame's slot receives the content given to panel
    let modules = vec![Module::new("m", URI)
        .with_child(Component::new("frame").with_child(Element::slot("frame-slot", None)))
        .with_child(
            Component::new("panel").with_child(
                Element::instance("panel-frame", "frame").with_child(Element::slot("panel-slot", None)),
            ),
        )
        .with_child(Element::instance("p1", "panel").with_child(TextNode::new("content", "Hello")))];

    let evaluation = render(&modules);
    let p1 = &evaluation.document.nodes[2];
    assert_eq!(p1.text_content(), "Hello");

    let content = &p1.children()[0].children()[0].children()[0].children()[0];
    assert_eq!(content.source().node_id(), "content");
}

#[test]
fn test_content_projected_into_two_default_slots() {
    let modules = vec![Module::new("m", URI)
        .with_child(
            Component::new("twice")
                .with_child(Element::slot("first", None))
                .with_child(Element::new("wrapper", "div").with_child(Element::slot("second", None))),
        )
        .with_child(Element::instance("t1", "twice").with_child(TextNode::new("once", "once")))];

    let evaluation = render(&modules);
    let instance = &evaluation.document.nodes[1];
    assert_eq!(instance.text_content(), "onceonce");

    // the two copies live in different sibling lists, so the differ can still tell them apart
    assert!(Validator::check_provenance(&evaluation.document).is_empty());
}
