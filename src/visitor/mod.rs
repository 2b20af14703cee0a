//! Traversal protocol over built nodes.
//!
//! For every node the walker calls, in order:
//!
//! ```text
//! pre_visit(node)                       false: skip the node entirely
//! visit_start(name, index, node)
//! visit(name, index, node)              false: skip the children only
//!     ... children ...
//! visit_end(name, index, node)
//! post_visit(node)
//! ```
//!
//! Children of a resource are visited as `id`, `meta`, `implicitRules`,
//! `language`, `text`, `contained`, `extension`, `modifierExtension`, then
//! the declared fields in schema order. Other composites visit `id`,
//! `extension`, `modifierExtension` and their fields; primitives visit `id`,
//! `extension` and their value. List elements carry their position as
//! `index`; single values use `None`.

mod modifier;
mod path;

pub use modifier::ModifierExtensionGuard;
pub use path::PathVisitor;

use crate::types::{FieldValue, Node, NodeKind, PrimitiveValue};

/// Callbacks fired by [`walk`]. Every method has a no-op default.
pub trait Visitor {
    fn pre_visit(&mut self, _node: &Node) -> bool {
        true
    }

    fn visit_start(&mut self, _name: &str, _index: Option<usize>, _node: &Node) {}

    /// Return false to skip the node's children
    fn visit(&mut self, _name: &str, _index: Option<usize>, _node: &Node) -> bool {
        true
    }

    fn visit_end(&mut self, _name: &str, _index: Option<usize>, _node: &Node) {}

    fn post_visit(&mut self, _node: &Node) {}

    /// Before the elements of a non-empty list field
    fn visit_list_start(&mut self, _name: &str, _nodes: &[Node]) {}

    fn visit_list_end(&mut self, _name: &str, _nodes: &[Node]) {}

    /// Element id or resource logical id
    fn visit_id(&mut self, _id: &str) {}

    /// Value of a primitive node
    fn visit_value(&mut self, _value: &PrimitiveValue) {}

    /// Dotted path of `node`, supplied by [`PathVisitor`] right before `visit`
    fn visit_path(&mut self, _path: &str, _node: &Node) {}
}

/// Walk `node` and its subtree. The root is visited under its type name.
pub fn walk<V: Visitor + ?Sized>(node: &Node, visitor: &mut V) {
    walk_named(node.type_name(), None, node, visitor);
}

/// Walk `node` as the element `name` (at `index` within a list)
pub fn walk_named<V: Visitor + ?Sized>(
    name: &str,
    index: Option<usize>,
    node: &Node,
    visitor: &mut V,
) {
    if !visitor.pre_visit(node) {
        return;
    }
    visitor.visit_start(name, index, node);
    if visitor.visit(name, index, node) {
        walk_children(node, visitor);
    }
    visitor.visit_end(name, index, node);
    visitor.post_visit(node);
}

fn walk_single<V: Visitor + ?Sized>(name: &str, node: Option<&Node>, visitor: &mut V) {
    if let Some(node) = node {
        walk_named(name, None, node, visitor);
    }
}

fn walk_list<V: Visitor + ?Sized>(name: &str, nodes: &[Node], visitor: &mut V) {
    if nodes.is_empty() {
        return;
    }
    visitor.visit_list_start(name, nodes);
    for (index, node) in nodes.iter().enumerate() {
        walk_named(name, Some(index), node, visitor);
    }
    visitor.visit_list_end(name, nodes);
}

fn walk_children<V: Visitor + ?Sized>(node: &Node, visitor: &mut V) {
    if let Some(id) = node.id() {
        visitor.visit_id(id);
    }
    if let Some(envelope) = node.envelope() {
        walk_single("meta", envelope.meta.as_ref(), visitor);
        walk_single("implicitRules", envelope.implicit_rules.as_ref(), visitor);
        walk_single("language", envelope.language.as_ref(), visitor);
        walk_single("text", envelope.text.as_ref(), visitor);
        walk_list("contained", &envelope.contained, visitor);
    }
    walk_list("extension", node.extension(), visitor);
    walk_list("modifierExtension", node.modifier_extension(), visitor);

    if node.kind() == NodeKind::Primitive {
        if let Some(value) = node.value() {
            visitor.visit_value(value);
        }
        return;
    }

    for (descriptor, value) in node.fields() {
        match value {
            FieldValue::Single(child) => walk_named(&descriptor.name, None, child, visitor),
            FieldValue::Choice(choice) => {
                walk_named(&descriptor.name, None, choice.value(), visitor)
            }
            FieldValue::List(children) => walk_list(&descriptor.name, children, visitor),
        }
    }
}
