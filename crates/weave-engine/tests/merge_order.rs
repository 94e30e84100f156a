//! E4: a `modelList` merged from two fragments — one value at order 0,
//! one at order 100 — renders with the higher-order entry first. List
//! merge sorts by *decreasing* order, unlike every other model-merge
//! rule here where the lower order wins.

use weave_ast::{Kind, Node, Site};
use weave_context::Context;
use weave_engine::{render, TemplateModel};
use weave_value::Value;

fn site() -> Site {
    Site::new("m.xml", 1)
}

fn list_fragment(item_value: &str, order: i64) -> Node {
    let item = Node::new(Kind::ModelValue, site())
        .with_attr("order", Value::Int(order))
        .with_raw(Value::String(item_value.to_string()));
    Node::new(Kind::ModelList, site())
        .with_attr("key", "data")
        .with_child(item)
}

#[test]
fn a_higher_order_list_fragment_renders_before_a_lower_order_one() {
    let mut model = TemplateModel::new();
    model.add(&list_fragment("bar1", 0)).unwrap();
    model.add(&list_fragment("bar2", 100)).unwrap();

    let ctx = Context::new();
    let rendered = render("{{#data}}{{.}},{{/data}}", &model, None, &ctx).unwrap();

    assert_eq!(rendered, "bar2,bar1,");
}
