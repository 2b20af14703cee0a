//! The immutable record tree.
//!
//! Every element of a record, from a `code` primitive up to a whole
//! `DeviceRequest`, is a [`Node`]. A node is a cheap handle to shared
//! immutable data; cloning it never copies the subtree. Nodes are only
//! produced by [`NodeBuilder`](crate::builder::NodeBuilder).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::builder::NodeBuilder;
use crate::config::BuildConfig;
use crate::schema::{FieldDescriptor, TypeSchema};
use crate::types::primitive::{PrimitiveType, PrimitiveValue};

/// Structural role of a node in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Leaf carrying a primitive value
    Primitive,
    /// Composite datatype (Coding, Reference, ...)
    Element,
    /// Composite that may carry modifier extensions
    Backbone,
    /// Root of a record, with identity metadata
    Resource,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Primitive => "primitive",
            NodeKind::Element => "element",
            NodeKind::Backbone => "backbone",
            NodeKind::Resource => "resource",
        }
    }

    pub fn is_composite(&self) -> bool {
        !matches!(self, NodeKind::Primitive)
    }

    pub fn allows_modifier_extension(&self) -> bool {
        matches!(self, NodeKind::Backbone | NodeKind::Resource)
    }
}

/// Value of a declared field. Absent fields and empty lists are not stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Single(Node),
    List(Vec<Node>),
    Choice(ChoiceValue),
}

impl FieldValue {
    /// The field's nodes in order, whatever its shape
    pub fn nodes(&self) -> &[Node] {
        match self {
            FieldValue::Single(node) => std::slice::from_ref(node),
            FieldValue::List(nodes) => nodes,
            FieldValue::Choice(choice) => std::slice::from_ref(&choice.value),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }
}

/// One alternative of a choice field: the runtime type plus its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceValue {
    type_name: String,
    value: Node,
}

impl ChoiceValue {
    pub fn new(value: Node) -> Self {
        Self {
            type_name: value.type_name().to_string(),
            value,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub fn into_value(self) -> Node {
        self.value
    }

    /// Serialized element name for this alternative, e.g. `valueQuantity`
    /// for base `value` and type `Quantity`.
    pub fn element_name(&self, base: &str) -> String {
        let mut chars = self.type_name.chars();
        match chars.next() {
            Some(first) => format!("{base}{}{}", first.to_uppercase(), chars.as_str()),
            None => base.to_string(),
        }
    }
}

/// Identity metadata carried by resource nodes only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceEnvelope {
    pub meta: Option<Node>,
    pub implicit_rules: Option<Node>,
    pub language: Option<Node>,
    pub text: Option<Node>,
    pub contained: Vec<Node>,
}

impl ResourceEnvelope {
    pub fn is_empty(&self) -> bool {
        self.meta.is_none()
            && self.implicit_rules.is_none()
            && self.language.is_none()
            && self.text.is_none()
            && self.contained.is_empty()
    }
}

pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) type_name: String,
    pub(crate) schema: Option<Arc<TypeSchema>>,
    pub(crate) id: Option<String>,
    pub(crate) extension: Vec<Node>,
    pub(crate) modifier_extension: Vec<Node>,
    pub(crate) value: Option<PrimitiveValue>,
    pub(crate) envelope: Option<ResourceEnvelope>,
    /// Aligned with `schema.fields`
    pub(crate) fields: Vec<Option<FieldValue>>,
    /// Configuration the node was built with; not part of its structure
    pub(crate) config: BuildConfig,
    pub(crate) hash: OnceLock<u64>,
}

impl NodeData {
    fn same_schema(&self, other: &Self) -> bool {
        match (&self.schema, &other.schema) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a == b,
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for NodeData {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.type_name == other.type_name
            && self.same_schema(other)
            && self.id == other.id
            && self.value == other.value
            && self.extension == other.extension
            && self.modifier_extension == other.modifier_extension
            && self.envelope == other.envelope
            && self.fields == other.fields
    }
}

/// Immutable, structurally shared node of a record tree.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub(crate) fn from_data(data: NodeData) -> Self {
        Node(Arc::new(data))
    }

    pub(crate) fn data(&self) -> &NodeData {
        &self.0
    }

    /// Unchecked primitive, recorded as built with [`BuildConfig::trusted`].
    /// Its parent checks it when built; use [`NodeBuilder::primitive`] to
    /// check it on its own or to give it an id or extensions.
    pub fn primitive(primitive: PrimitiveType, value: impl Into<PrimitiveValue>) -> Self {
        Node::from_data(NodeData {
            kind: NodeKind::Primitive,
            type_name: primitive.as_str().to_string(),
            schema: None,
            id: None,
            extension: Vec::new(),
            modifier_extension: Vec::new(),
            value: Some(value.into()),
            envelope: None,
            fields: Vec::new(),
            config: BuildConfig::trusted(),
            hash: OnceLock::new(),
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::String, value.into())
    }

    pub fn code(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::Code, value.into())
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::Uri, value.into())
    }

    pub fn id_value(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::Id, value.into())
    }

    pub fn markdown(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::Markdown, value.into())
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::Date, value.into())
    }

    pub fn date_time(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::DateTime, value.into())
    }

    pub fn instant(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::Instant, value.into())
    }

    pub fn boolean(value: bool) -> Self {
        Self::primitive(PrimitiveType::Boolean, value)
    }

    pub fn integer(value: i64) -> Self {
        Self::primitive(PrimitiveType::Integer, value)
    }

    pub fn decimal(value: impl Into<String>) -> Self {
        Self::primitive(PrimitiveType::Decimal, PrimitiveValue::Decimal(value.into()))
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    /// Descriptor the node was built from; `None` for primitives
    pub fn schema(&self) -> Option<&Arc<TypeSchema>> {
        self.0.schema.as_ref()
    }

    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self.0.kind {
            NodeKind::Primitive => PrimitiveType::parse(&self.0.type_name),
            _ => None,
        }
    }

    /// Element id, or the logical id of a resource
    pub fn id(&self) -> Option<&str> {
        self.0.id.as_deref()
    }

    pub fn extension(&self) -> &[Node] {
        &self.0.extension
    }

    pub fn modifier_extension(&self) -> &[Node] {
        &self.0.modifier_extension
    }

    /// Extensions with the given url, in order
    pub fn extensions_by_url<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.0
            .extension
            .iter()
            .filter(move |ext| crate::types::extension::url(ext) == Some(url))
    }

    pub fn value(&self) -> Option<&PrimitiveValue> {
        self.0.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.0.value.is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(PrimitiveValue::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value().and_then(PrimitiveValue::as_bool)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.value().and_then(PrimitiveValue::as_i64)
    }

    pub fn envelope(&self) -> Option<&ResourceEnvelope> {
        self.0.envelope.as_ref()
    }

    pub fn meta(&self) -> Option<&Node> {
        self.envelope().and_then(|e| e.meta.as_ref())
    }

    pub fn implicit_rules(&self) -> Option<&Node> {
        self.envelope().and_then(|e| e.implicit_rules.as_ref())
    }

    pub fn language(&self) -> Option<&Node> {
        self.envelope().and_then(|e| e.language.as_ref())
    }

    pub fn text(&self) -> Option<&Node> {
        self.envelope().and_then(|e| e.text.as_ref())
    }

    pub fn contained(&self) -> &[Node] {
        self.envelope().map(|e| e.contained.as_slice()).unwrap_or(&[])
    }

    /// Resolve a local `#id` reference against this resource's contained
    /// resources. A bare `#` refers to the container itself.
    pub fn contained_by_reference(&self, reference: &str) -> Option<&Node> {
        let local_id = reference.strip_prefix('#')?;
        if local_id.is_empty() {
            return Some(self);
        }
        self.contained().iter().find(|c| c.id() == Some(local_id))
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        let index = self.schema()?.field_index(name)?;
        self.0.fields.get(index)?.as_ref()
    }

    /// Value of a single or choice field
    pub fn single(&self, name: &str) -> Option<&Node> {
        match self.field(name)? {
            FieldValue::Single(node) => Some(node),
            FieldValue::Choice(choice) => Some(choice.value()),
            FieldValue::List(_) => None,
        }
    }

    /// Elements of a list field; empty when unset
    pub fn list(&self, name: &str) -> &[Node] {
        match self.field(name) {
            Some(FieldValue::List(nodes)) => nodes,
            _ => &[],
        }
    }

    pub fn choice(&self, name: &str) -> Option<&ChoiceValue> {
        match self.field(name)? {
            FieldValue::Choice(choice) => Some(choice),
            _ => None,
        }
    }

    /// Set fields with their descriptors, in schema order
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &FieldValue)> {
        let descriptors: &[FieldDescriptor] = self
            .schema()
            .map(|s| s.fields.as_slice())
            .unwrap_or(&[]);
        descriptors
            .iter()
            .zip(self.0.fields.iter())
            .filter_map(|(descriptor, value)| value.as_ref().map(|v| (descriptor, v)))
    }

    /// Whether the node has any child element. Element ids and primitive
    /// values are attributes, not children; a resource's logical id counts.
    pub fn has_children(&self) -> bool {
        let data = &self.0;
        let own = !data.extension.is_empty()
            || !data.modifier_extension.is_empty()
            || data.fields.iter().any(Option::is_some);
        match data.kind {
            NodeKind::Resource => {
                own || data.id.is_some() || data.envelope.as_ref().is_some_and(|e| !e.is_empty())
            }
            _ => own,
        }
    }

    /// Configuration the node was built with, carried over by [`Node::to_builder`]
    pub fn build_config(&self) -> &BuildConfig {
        &self.0.config
    }

    pub fn to_builder(&self) -> NodeBuilder {
        NodeBuilder::from_existing(self)
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// In-process structural hash, computed once and cached
    pub fn structural_hash(&self) -> u64 {
        *self.0.hash.get_or_init(|| {
            let data = &self.0;
            let mut hasher = DefaultHasher::new();
            data.kind.hash(&mut hasher);
            data.type_name.hash(&mut hasher);
            data.id.hash(&mut hasher);
            data.value.hash(&mut hasher);
            data.extension.hash(&mut hasher);
            data.modifier_extension.hash(&mut hasher);
            data.envelope.hash(&mut hasher);
            data.fields.hash(&mut hasher);
            hasher.finish()
        })
    }

    /// SHA-256 digest of the node's structure, stable across processes
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        self.feed_canonical(&mut hasher);
        format!("{:x}", hasher.finalize())
    }

    fn feed_canonical(&self, hasher: &mut Sha256) {
        fn feed_str(hasher: &mut Sha256, s: &str) {
            hasher.update((s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        fn feed_nodes(hasher: &mut Sha256, tag: &str, nodes: &[Node]) {
            feed_str(hasher, tag);
            hasher.update((nodes.len() as u64).to_le_bytes());
            for node in nodes {
                node.feed_canonical(hasher);
            }
        }
        fn feed_opt(hasher: &mut Sha256, tag: &str, node: Option<&Node>) {
            feed_nodes(hasher, tag, node.map(std::slice::from_ref).unwrap_or(&[]));
        }

        let data = &self.0;
        feed_str(hasher, data.kind.as_str());
        feed_str(hasher, &data.type_name);
        feed_str(hasher, data.id.as_deref().unwrap_or(""));
        hasher.update([data.id.is_some() as u8]);
        match &data.value {
            Some(value) => {
                feed_str(hasher, value.representation());
                feed_str(hasher, &value.to_string());
            }
            None => feed_str(hasher, "-"),
        }
        feed_nodes(hasher, "extension", &data.extension);
        feed_nodes(hasher, "modifierExtension", &data.modifier_extension);
        if let Some(envelope) = &data.envelope {
            feed_opt(hasher, "meta", envelope.meta.as_ref());
            feed_opt(hasher, "implicitRules", envelope.implicit_rules.as_ref());
            feed_opt(hasher, "language", envelope.language.as_ref());
            feed_opt(hasher, "text", envelope.text.as_ref());
            feed_nodes(hasher, "contained", &envelope.contained);
        }
        for (descriptor, value) in self.fields() {
            feed_str(hasher, &descriptor.name);
            if let FieldValue::Choice(choice) = value {
                feed_str(hasher, choice.type_name());
            }
            feed_nodes(hasher, if value.is_list() { "[]" } else { "1" }, value.nodes());
        }
    }

    pub fn accept<V: crate::visitor::Visitor + ?Sized>(&self, visitor: &mut V) {
        crate::visitor::walk(self, visitor);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.structural_hash() == other.structural_hash() && self.0 == other.0)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = &self.0;
        let mut s = f.debug_struct(&data.type_name);
        if let Some(id) = &data.id {
            s.field("id", id);
        }
        if let Some(value) = &data.value {
            s.field("value", value);
        }
        if !data.extension.is_empty() {
            s.field("extension", &data.extension);
        }
        if !data.modifier_extension.is_empty() {
            s.field("modifierExtension", &data.modifier_extension);
        }
        if let Some(envelope) = data.envelope.as_ref().filter(|e| !e.is_empty()) {
            s.field("envelope", envelope);
        }
        for (descriptor, value) in self.fields() {
            s.field(&descriptor.name, value);
        }
        s.finish()
    }
}
