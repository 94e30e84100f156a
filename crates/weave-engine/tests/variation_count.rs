//! E7: two top-level enums, a nested preset, and one 15-element list
//! input enumerate exactly 65,604 combinations.
//!
//! The two enums (21 and 781 options) and the list's preset-pruned
//! domain (2 surviving elements out of 15 declared, via a duplicate
//! label) are sized so the total is a plain product, verifiable by
//! hand: 21 * 781 * 2^2 == 65_604.

use weave_ast::{Kind, Node, Site};
use weave_engine::{build_input_tree, variations};
use weave_value::Value;

fn site() -> Site {
    Site::new("e2e.xml", 1)
}

fn option(value: String) -> Node {
    Node::new(Kind::Option, site()).with_attr("value", value.as_str())
}

#[test]
fn two_enums_and_a_preset_pruned_list_enumerate_65604_combinations() {
    let mut mode = Node::new(Kind::InputEnum, site()).with_attr("id", "mode");
    for i in 0..21 {
        let mut opt = option(format!("m{i}"));
        if i == 0 {
            // A preset nested inside one of the enum's own options — its
            // effect on "features" below is global, not scoped to this
            // branch, but this is where an archetype would naturally
            // declare it.
            let preset = Node::new(Kind::PresetList, site())
                .with_attr("id", "features")
                .with_raw(Value::String("dup".to_string()));
            opt = opt.with_child(preset);
        }
        mode = mode.with_child(opt);
    }

    let mut tier = Node::new(Kind::InputEnum, site()).with_attr("id", "tier");
    for i in 0..781 {
        tier = tier.with_child(option(format!("t{i}")));
    }

    let mut features = Node::new(Kind::InputList, site()).with_attr("id", "features");
    for i in 0..13 {
        features = features.with_child(option(format!("v{i}")));
    }
    features = features.with_child(option("dup".to_string()));
    features = features.with_child(option("dup".to_string()));

    let entry = Node::new(Kind::Script, site())
        .with_child(mode)
        .with_child(tier)
        .with_child(features);

    let tree = build_input_tree(&entry);
    let combos = variations(&tree, &[]).unwrap();

    assert_eq!(combos.len(), 65_604);
}
