use super::Visitor;
use crate::types::{Node, PrimitiveValue};

/// Wraps a visitor and tracks the dotted path of the current node, e.g.
/// `DeviceRequest.parameter[0].value`. The wrapped visitor receives the path
/// through [`Visitor::visit_path`] right before each `visit`.
#[derive(Debug, Clone)]
pub struct PathVisitor<V> {
    inner: V,
    segments: Vec<String>,
}

impl<V> PathVisitor<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            segments: Vec::new(),
        }
    }

    /// Path of the node currently being visited; empty outside a walk
    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut V {
        &mut self.inner
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V: Visitor> Visitor for PathVisitor<V> {
    fn pre_visit(&mut self, node: &Node) -> bool {
        self.inner.pre_visit(node)
    }

    fn visit_start(&mut self, name: &str, index: Option<usize>, node: &Node) {
        self.segments.push(match index {
            Some(i) => format!("{name}[{i}]"),
            None => name.to_string(),
        });
        self.inner.visit_start(name, index, node);
    }

    fn visit(&mut self, name: &str, index: Option<usize>, node: &Node) -> bool {
        let path = self.path();
        self.inner.visit_path(&path, node);
        self.inner.visit(name, index, node)
    }

    fn visit_end(&mut self, name: &str, index: Option<usize>, node: &Node) {
        self.inner.visit_end(name, index, node);
        self.segments.pop();
    }

    fn post_visit(&mut self, node: &Node) {
        self.inner.post_visit(node);
    }

    fn visit_list_start(&mut self, name: &str, nodes: &[Node]) {
        self.inner.visit_list_start(name, nodes);
    }

    fn visit_list_end(&mut self, name: &str, nodes: &[Node]) {
        self.inner.visit_list_end(name, nodes);
    }

    fn visit_id(&mut self, id: &str) {
        self.inner.visit_id(id);
    }

    fn visit_value(&mut self, value: &PrimitiveValue) {
        self.inner.visit_value(value);
    }
}
