/// Tests for error recovery - evaluation degrades locally and keeps going
use crate::evaluator::{Evaluation, Evaluator};
use crate::resolver::ReferenceIndex;
use paperclip_common::{Diagnostic, DiagnosticKind};
use paperclip_model::{Component, Element, Module, Override, TextNode};

const URI: &str = "file:///errors.pc";

fn render(modules: &[Module]) -> Evaluation {
    let index = ReferenceIndex::new(modules);
    let mut evaluator = Evaluator::new(&index);
    evaluator.evaluate_module(&modules[0])
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<&DiagnosticKind> {
    diagnostics.iter().map(|diagnostic| &diagnostic.kind).collect()
}

#[test]
fn test_cyclic_inheritance_renders_placeholder() {
    let modules = vec![Module::new("m", URI).with_child(
        Element::new("page", "div")
            .with_child(Element::instance("broken", "a"))
            .with_child(Element::instance("broken-again", "a"))
            .with_child(TextNode::new("after", "still here")),
    )
    .with_child(Component::new("a").extends("b").with_child(TextNode::new("a-text", "a")))
    .with_child(Component::new("b").extends("a"))];

    let evaluation = render(&modules);

    // one diagnostic per distinct cycle, however many instances hit it
    assert!(evaluation.has_errors());
    assert!(evaluation.diagnostics.iter().all(|d| matches!(
        d.kind,
        DiagnosticKind::CyclicInheritance { .. }
    )));
    assert_eq!(
        kinds(&evaluation.diagnostics)[0],
        &DiagnosticKind::CyclicInheritance {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()]
        }
    );

    let page = &evaluation.document.nodes[0];
    assert_eq!(page.children().len(), 3);

    let placeholder = page.children()[0].as_element().unwrap();
    assert_eq!(placeholder.tag, "div");
    assert!(placeholder.children.is_empty());
    assert_eq!(placeholder.source.node_id(), "broken");
    assert!(placeholder.flags.is_component_instance);

    assert_eq!(page.children()[2].text_content(), "still here");
}

#[test]
fn test_recursive_instance_is_cut_off() {
    let modules = vec![Module::new("m", URI).with_child(
        Component::new("tree")
            .with_child(TextNode::new("node-label", "node"))
            .with_child(Element::instance("subtree", "tree")),
    )];

    let evaluation = render(&modules);
    assert_eq!(
        kinds(&evaluation.diagnostics),
        vec![&DiagnosticKind::RecursiveInstance {
            component: "tree".to_string(),
            stack: vec!["tree".to_string(), "tree".to_string()],
        }]
    );

    let tree = &evaluation.document.nodes[0];
    assert_eq!(tree.children().len(), 2);
    assert_eq!(tree.children()[1].source().node_id(), "tree subtree");
    assert!(tree.children()[1].children().is_empty());
}

#[test]
fn test_mutual_recursion_through_two_components() {
    let modules = vec![Module::new("m", URI)
        .with_child(Component::new("ping").with_child(Element::instance("to-pong", "pong")))
        .with_child(Component::new("pong").with_child(Element::instance("to-ping", "ping")))];

    let evaluation = render(&modules);
    assert!(evaluation.has_errors());

    let ping = &evaluation.document.nodes[0];
    let pong = &ping.children()[0];
    let cut = &pong.children()[0];
    assert_eq!(cut.source().node_id(), "ping to-pong to-ping");
    assert!(cut.children().is_empty());
}

#[test]
fn test_unresolved_base_component() {
    let modules = vec![Module::new("m", URI).with_child(
        Component::new("fancy")
            .extends("ghost")
            .with_child(TextNode::new("t", "fancy")),
    )];

    let evaluation = render(&modules);
    assert_eq!(
        kinds(&evaluation.diagnostics),
        vec![&DiagnosticKind::UnresolvedReference {
            id: "ghost".to_string(),
            from: "fancy".to_string(),
        }]
    );
    assert!(!evaluation.has_errors());
    assert_eq!(evaluation.document.nodes[0].text_content(), "fancy");
}

#[test]
fn test_invalid_override_target_is_dropped() {
    let modules = vec![Module::new("m", URI)
        .with_child(Component::new("card").with_child(TextNode::new("title", "Title")))
        .with_child(
            Element::instance("c1", "card")
                .with_override(Override::text("stale", &["removed-node"], "gone"))
                .with_override(Override::text("fine", &["title"], "New title")),
        )];

    let evaluation = render(&modules);
    assert_eq!(
        kinds(&evaluation.diagnostics),
        vec![&DiagnosticKind::InvalidOverrideTarget {
            override_id: "stale".to_string(),
            scope: "c1".to_string(),
            target_id_path: vec!["removed-node".to_string()],
        }]
    );
    assert_eq!(evaluation.document.nodes[1].text_content(), "New title");
}

#[test]
fn test_override_into_plain_element_is_invalid() {
    // only instances open a scope to walk into
    let modules = vec![Module::new("m", URI)
        .with_child(
            Component::new("card").with_child(
                Element::new("body", "div").with_child(TextNode::new("t", "x")),
            ),
        )
        .with_child(
            Element::instance("c1", "card")
                .with_override(Override::text("nested", &["body", "t"], "y")),
        )];

    let evaluation = render(&modules);
    assert_eq!(evaluation.diagnostics.len(), 1);
    assert_eq!(evaluation.document.nodes[1].text_content(), "x");
}

#[test]
fn test_duplicate_ids_are_reported_by_the_index() {
    let modules = vec![
        Module::new("a", "file:///a.pc").with_child(Component::new("shared").with_tag("span")),
        Module::new("b", "file:///b.pc")
            .with_child(Component::new("shared").with_tag("p"))
            .with_child(Element::instance("use", "shared")),
    ];

    let index = ReferenceIndex::new(&modules);
    assert_eq!(index.diagnostics().len(), 1);

    let mut evaluator = Evaluator::new(&index);
    let evaluation = evaluator.evaluate_module(&modules[1]);
    assert_eq!(evaluation.document.nodes[1].as_element().unwrap().tag, "span");
}
