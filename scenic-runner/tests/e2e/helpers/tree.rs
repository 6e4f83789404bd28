//! Test tree inspection helpers.

use scenic_core::tree::{DynamicTest, TestNode};

/// Names of the given nodes, in order.
pub fn names(nodes: &[TestNode]) -> Vec<String> {
    nodes.iter().map(|n| n.name().to_owned()).collect()
}

/// Children of the container named `name`.
///
/// # Panics
///
/// Panics if there is no top-level container with that name.
#[allow(dead_code)]
pub fn container<'a>(nodes: &'a [TestNode], name: &str) -> &'a [TestNode] {
    nodes
        .iter()
        .find_map(|n| match n {
            TestNode::Container(c) if c.name() == name => Some(c.children()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no container named '{name}'"))
}

/// Detach the first leaf named `name`, searching containers depth-first.
#[allow(dead_code)]
pub fn take_leaf(nodes: Vec<TestNode>, name: &str) -> Option<DynamicTest> {
    for node in nodes {
        match node {
            TestNode::Test(test) if test.name() == name => return Some(test),
            TestNode::Test(_) => {}
            TestNode::Container(c) => {
                if let Some(test) = take_leaf(c.into_children(), name) {
                    return Some(test);
                }
            }
        }
    }
    None
}
