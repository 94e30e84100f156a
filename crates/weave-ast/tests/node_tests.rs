use weave_ast::{Kind, Node, Site};
use weave_value::Value;

fn site() -> Site {
    Site::new("archetype.xml", 42)
}

#[test]
fn attr_accessors_project_by_shape() {
    let node = Node::new(Kind::InputBool, site())
        .with_attr("name", "useTests")
        .with_attr("default", true)
        .with_attr("order", Value::Int(3));

    assert_eq!(node.attr_str("name"), Some("useTests"));
    assert_eq!(node.attr_bool("default"), Some(true));
    assert_eq!(node.attr_int("order"), Some(3));
    assert_eq!(node.attr_str("order"), None);
}

#[test]
fn condition_source_reads_the_if_attribute() {
    let node = Node::new(Kind::Step, site()).with_attr("if", "${useTests}==true");
    assert_eq!(node.condition_source(), Some("${useTests}==true"));

    let unguarded = Node::new(Kind::Step, site());
    assert_eq!(unguarded.condition_source(), None);
}

#[test]
fn children_of_kind_filters_mixed_children() {
    let bool_input = Node::new(Kind::InputBool, site());
    let text_input = Node::new(Kind::InputText, site());
    let step = Node::new(Kind::Step, site())
        .with_child(bool_input)
        .with_child(text_input.clone())
        .with_child(text_input);

    let texts: Vec<_> = step.children_of_kind(Kind::InputText).collect();
    assert_eq!(texts.len(), 2);
}

#[test]
fn invocation_kinds_are_recognized() {
    assert!(Kind::InvokeSource.is_invocation());
    assert!(Kind::InvokeExec.is_invocation());
    assert!(Kind::InvokeMethod.is_invocation());
    assert!(Kind::InvokeCall.is_invocation());
    assert!(!Kind::Step.is_invocation());
}
