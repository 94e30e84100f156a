use crate::error::AstError;
use crate::kind::Kind;
use crate::node::Node;
use indexmap::IndexMap;
use std::sync::Arc;

/// A fully parsed script: its root node plus the methods declared
/// anywhere in it, indexed by name for O(1) lookup from a `call` site.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub path: Arc<str>,
    pub root: Node,
    pub methods: IndexMap<String, Node>,
}

impl Script {
    /// Builds a `Script` from a parsed root node, collecting every
    /// `method` declaration reachable from it. Method names must be
    /// unique within one script; a collision is a load-time error rather
    /// than a silent last-write-wins, since the ambiguity a duplicate
    /// implies is exactly the kind of thing an archetype author wants to
    /// hear about immediately.
    pub fn new(path: impl Into<Arc<str>>, root: Node) -> Result<Self, AstError> {
        let path = path.into();
        let mut methods = IndexMap::new();
        collect_methods(&root, &path, &mut methods)?;
        Ok(Self { path, root, methods })
    }

    pub fn method(&self, name: &str) -> Option<&Node> {
        self.methods.get(name)
    }
}

fn collect_methods(
    node: &Node,
    path: &Arc<str>,
    methods: &mut IndexMap<String, Node>,
) -> Result<(), AstError> {
    if node.kind == Kind::InvokeMethod {
        let name = node
            .attr_str("name")
            .ok_or_else(|| AstError::UnnamedMethod {
                path: path.to_string(),
            })?
            .to_string();
        if methods.contains_key(&name) {
            return Err(AstError::DuplicateMethod {
                path: path.to_string(),
                name,
            });
        }
        methods.insert(name, node.clone());
    }
    for child in &node.children {
        collect_methods(child, path, methods)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Site;

    fn site() -> Site {
        Site::new("test.xml", 1)
    }

    #[test]
    fn collects_methods_declared_anywhere_in_the_tree() {
        let method = Node::new(Kind::InvokeMethod, site()).with_attr("name", "setup");
        let step = Node::new(Kind::Step, site()).with_child(method);
        let root = Node::new(Kind::Script, site()).with_child(step);

        let script = Script::new("test.xml", root).unwrap();
        assert!(script.method("setup").is_some());
    }

    #[test]
    fn duplicate_method_names_are_rejected() {
        let a = Node::new(Kind::InvokeMethod, site()).with_attr("name", "setup");
        let b = Node::new(Kind::InvokeMethod, site()).with_attr("name", "setup");
        let root = Node::new(Kind::Script, site()).with_child(a).with_child(b);

        let err = Script::new("test.xml", root).unwrap_err();
        assert_eq!(
            err,
            AstError::DuplicateMethod {
                path: "test.xml".to_string(),
                name: "setup".to_string(),
            }
        );
    }

    #[test]
    fn unnamed_method_is_rejected() {
        let method = Node::new(Kind::InvokeMethod, site());
        let root = Node::new(Kind::Script, site()).with_child(method);

        let err = Script::new("test.xml", root).unwrap_err();
        assert_eq!(
            err,
            AstError::UnnamedMethod {
                path: "test.xml".to_string()
            }
        );
    }
}
