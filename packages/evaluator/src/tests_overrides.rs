/// Tests for override registration, variant scoping and precedence
use crate::evaluator::{Evaluation, Evaluator};
use crate::resolver::ReferenceIndex;
use crate::vdom::VNode;
use paperclip_model::{Component, Element, Module, Override, TextNode, Variant};

const URI: &str = "file:///overrides.pc";

fn render(modules: &[Module]) -> Evaluation {
    let index = ReferenceIndex::new(modules);
    let mut evaluator = Evaluator::new(&index);
    evaluator.evaluate_module(&modules[0])
}

fn color(node: &VNode) -> Option<&str> {
    node.style().get("color").map(String::as_str)
}

/// button > label, with a non-default `dark` variant and a default `large` one
fn button() -> Component {
    Component::new("button")
        .with_tag("button")
        .with_child(TextNode::new("label", "Click").with_style("color", "black"))
        .with_variant(
            Variant::new("v-dark", "dark")
                .with_override(Override::style("dark-label", &["label"], &[("color", "white")])),
        )
        .with_variant(
            Variant::new("v-large", "large")
                .as_default()
                .with_override(Override::style("large-root", &[], &[("padding", "16px")])),
        )
        .with_override(
            Override::style("dark-root", &[], &[("background", "black")]).for_variant("v-dark"),
        )
}

#[test]
fn test_inactive_variant_has_no_effect() {
    let modules = vec![Module::new("m", URI)
        .with_child(button())
        .with_child(Element::instance("b1", "button"))];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let b1 = &evaluation.document.nodes[1];
    assert_eq!(color(&b1.children()[0]), Some("black"));
    assert!(b1.style().get("background").is_none());
    // default variant applies without being selected
    assert_eq!(b1.style().get("padding").map(String::as_str), Some("16px"));
}

#[test]
fn test_selected_variant_applies() {
    let modules = vec![Module::new("m", URI)
        .with_child(button())
        .with_child(Element::instance("b1", "button").with_variant("v-dark"))];

    let evaluation = render(&modules);
    let b1 = &evaluation.document.nodes[1];
    assert_eq!(color(&b1.children()[0]), Some("white"));
    assert_eq!(b1.style().get("background").map(String::as_str), Some("black"));
    assert_eq!(b1.style().get("padding").map(String::as_str), Some("16px"));
}

#[test]
fn test_variant_override_selects_nested_variant() {
    let modules = vec![Module::new("m", URI).with_child(button()).with_child(
        Component::new("toolbar")
            .with_child(Element::instance("save", "button"))
            .with_child(Element::instance("cancel", "button"))
            .with_override(Override::variant("dark-save", &["save"], &["v-dark"])),
    )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let toolbar = &evaluation.document.nodes[1];
    assert_eq!(color(&toolbar.children()[0].children()[0]), Some("white"));
    assert_eq!(color(&toolbar.children()[1].children()[0]), Some("black"));
}

#[test]
fn test_root_variant_override_at_call_site() {
    let page = Component::new("page")
        .with_variant(Variant::new("v-hover", "hover"))
        .with_child(
            Element::instance("b", "button")
                .with_override(Override::variant("pick-dark", &[], &["v-dark"]).for_variant("v-hover")),
        );
    let modules = vec![Module::new("m", URI)
        .with_child(button())
        .with_child(page)
        .with_child(Element::instance("hovered", "page").with_variant("v-hover"))
        .with_child(Element::instance("idle", "page"))];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let hovered = &evaluation.document.nodes[2].children()[0];
    assert_eq!(hovered.style().get("background").map(String::as_str), Some("black"));
    assert_eq!(color(&hovered.children()[0]), Some("white"));

    let idle = &evaluation.document.nodes[3].children()[0];
    assert!(idle.style().get("background").is_none());
    assert_eq!(color(&idle.children()[0]), Some("black"));
}

#[test]
fn test_call_site_override_scoped_to_enclosing_variant() {
    let toolbar = Component::new("toolbar")
        .with_variant(Variant::new("v-compact", "compact"))
        .with_child(
            Element::instance("save", "button").with_override(
                Override::text("compact-label", &["label"], "S").for_variant("v-compact"),
            ),
        );
    let modules = vec![Module::new("m", URI)
        .with_child(button())
        .with_child(toolbar)
        .with_child(Element::instance("compact", "toolbar").with_variant("v-compact"))];

    let evaluation = render(&modules);

    let plain = &evaluation.document.nodes[1];
    assert_eq!(plain.text_content(), "Click");

    let compact = &evaluation.document.nodes[2];
    assert_eq!(compact.text_content(), "S");
    assert_eq!(
        compact.children()[0].children()[0].source().node_id(),
        "compact save label"
    );
}

#[test]
fn test_call_site_beats_component_override() {
    let modules = vec![Module::new("m", URI).with_child(button()).with_child(
        Element::instance("b1", "button")
            .with_variant("v-dark")
            .with_override(Override::style("mine", &["label"], &[("color", "hotpink")])),
    )];

    let evaluation = render(&modules);
    let b1 = &evaluation.document.nodes[1];
    assert_eq!(color(&b1.children()[0]), Some("hotpink"));
}

#[test]
fn test_later_override_in_same_scope_wins() {
    let modules = vec![Module::new("m", URI).with_child(button()).with_child(
        Element::instance("b1", "button")
            .with_override(Override::style("first", &["label"], &[("color", "red")]))
            .with_override(Override::style("second", &["label"], &[("color", "blue")])),
    )];

    let evaluation = render(&modules);
    assert_eq!(color(&evaluation.document.nodes[1].children()[0]), Some("blue"));
}

#[test]
fn test_instance_style_cascade() {
    let modules = vec![Module::new("m", URI)
        .with_child(button().with_style("color", "gray").with_attr("type", "button"))
        .with_child(
            Element::instance("b1", "button")
                .with_style("color", "green")
                .with_attr("type", "submit"),
        )
        .with_child(
            Component::new("form").with_child(
                Element::instance("submit", "button")
                    .with_style("color", "green")
                    .with_attr("type", "submit"),
            )
            .with_override(Override::style("form-submit", &["submit"], &[("color", "navy")]))
            .with_override(Override::attributes("form-attr", &["submit"], &[("disabled", "true")])),
        )];

    let evaluation = render(&modules);

    let b1 = evaluation.document.nodes[1].as_element().unwrap();
    assert_eq!(b1.tag, "button");
    assert_eq!(b1.style.get("color").unwrap(), "green");
    assert_eq!(b1.attributes.get("type").unwrap(), "submit");

    let submit = evaluation.document.nodes[2].children()[0].as_element().unwrap();
    assert_eq!(submit.style.get("color").unwrap(), "navy");
    assert_eq!(submit.attributes.get("type").unwrap(), "submit");
    assert_eq!(submit.attributes.get("disabled").unwrap(), "true");
}

#[test]
fn test_children_override_replaces_template_children() {
    let modules = vec![Module::new("m", URI)
        .with_child(
            Component::new("card").with_child(
                Element::new("body", "div").with_child(TextNode::new("original", "Original")),
            ),
        )
        .with_child(Element::instance("c1", "card").with_override(Override::children(
            "replace",
            &["body"],
            vec![TextNode::new("replacement", "Replaced").into()],
        )))];

    let evaluation = render(&modules);
    let body = &evaluation.document.nodes[1].children()[0];
    assert_eq!(body.children().len(), 1);
    assert_eq!(body.text_content(), "Replaced");
    assert_eq!(body.children()[0].source().node_id(), "c1 replacement");
}

#[test]
fn test_text_override_reaches_nested_instance() {
    let modules = vec![Module::new("m", URI)
        .with_child(button())
        .with_child(Component::new("dialog").with_child(Element::instance("ok", "button")))
        .with_child(
            Element::instance("d1", "dialog")
                .with_override(Override::text("ok-text", &["ok", "label"], "OK")),
        )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let d1 = &evaluation.document.nodes[2];
    let label = &d1.children()[0].children()[0];
    assert_eq!(label.text_content(), "OK");
    assert_eq!(label.source().node_id(), "d1 ok label");

    // the dialog's own rendering is untouched
    assert_eq!(evaluation.document.nodes[1].text_content(), "Click");
}

#[test]
fn test_plain_elements_do_not_open_a_scope() {
    let modules = vec![Module::new("m", URI)
        .with_child(
            Component::new("card").with_child(
                Element::new("wrapper", "div")
                    .with_child(Element::new("inner", "div").with_child(TextNode::new("t", "x"))),
            ),
        )
        .with_child(
            Element::instance("c1", "card")
                .with_override(Override::style("deep", &["t"], &[("color", "red")])),
        )];

    let evaluation = render(&modules);
    assert!(evaluation.diagnostics.is_empty());

    let text = &evaluation.document.nodes[1].children()[0].children()[0].children()[0];
    assert_eq!(text.source().node_id(), "c1 t");
    assert_eq!(color(text), Some("red"));
}
