//! Mutable staging for immutable nodes.
//!
//! A [`NodeBuilder`] is consumed by [`NodeBuilder::build`]; every setter takes
//! the builder by value and hands it back, so calls chain with `?`:
//!
//! ```ignore
//! let request = registry
//!     .builder("DeviceRequest")?
//!     .set("intent", Node::code("order"))?
//!     .set("code", concept)?
//!     .set("subject", reference::literal("Patient/1")?)?
//!     .build()?;
//! ```

use std::sync::{Arc, OnceLock};

use crate::config::BuildConfig;
use crate::error::{FhirNodeError, Result, ValidationError, ViolationKind};
use crate::schema::{FieldKind, TypeSchema};
use crate::types::node::{ChoiceValue, FieldValue, NodeData, ResourceEnvelope};
use crate::types::{Node, NodeKind, PrimitiveType, PrimitiveValue};
use crate::validation::{self, cardinality};

#[derive(Debug, Clone, Default)]
enum Staged {
    #[default]
    Unset,
    Single(Node),
    List(Vec<Option<Node>>),
}

#[derive(Debug, Clone, Default)]
struct StagedEnvelope {
    meta: Option<Node>,
    implicit_rules: Option<Node>,
    language: Option<Node>,
    text: Option<Node>,
    contained: Vec<Option<Node>>,
}

/// Builder for any node kind. Obtain one from
/// [`SchemaRegistry::builder`](crate::schema::SchemaRegistry::builder),
/// [`NodeBuilder::new`], [`NodeBuilder::primitive`] or
/// [`Node::to_builder`].
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    kind: NodeKind,
    type_name: String,
    schema: Option<Arc<TypeSchema>>,
    id: Option<String>,
    extension: Vec<Option<Node>>,
    modifier_extension: Vec<Option<Node>>,
    value: Option<PrimitiveValue>,
    envelope: Option<StagedEnvelope>,
    fields: Vec<Staged>,
    config: BuildConfig,
}

impl NodeBuilder {
    /// Empty builder for a composite or resource type
    pub fn new(schema: Arc<TypeSchema>) -> Self {
        let envelope = schema.is_resource().then(StagedEnvelope::default);
        Self {
            kind: schema.kind,
            type_name: schema.name.clone(),
            fields: vec![Staged::Unset; schema.fields.len()],
            schema: Some(schema),
            id: None,
            extension: Vec::new(),
            modifier_extension: Vec::new(),
            value: None,
            envelope,
            config: BuildConfig::default(),
        }
    }

    /// Empty builder for a primitive of type `primitive`
    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self {
            kind: NodeKind::Primitive,
            type_name: primitive.as_str().to_string(),
            schema: None,
            id: None,
            extension: Vec::new(),
            modifier_extension: Vec::new(),
            value: None,
            envelope: None,
            fields: Vec::new(),
            config: BuildConfig::default(),
        }
    }

    /// Builder pre-populated with every field of `node`. Children are shared
    /// with the source node, not copied. The node's build configuration is
    /// kept, so a node built without validation rebuilds without it.
    pub fn from_existing(node: &Node) -> Self {
        let data = node.data();
        let fields = data
            .fields
            .iter()
            .map(|value| match value {
                None => Staged::Unset,
                Some(FieldValue::Single(node)) => Staged::Single(node.clone()),
                Some(FieldValue::Choice(choice)) => Staged::Single(choice.value().clone()),
                Some(FieldValue::List(nodes)) => {
                    Staged::List(nodes.iter().cloned().map(Some).collect())
                }
            })
            .collect();
        let envelope = data.envelope.as_ref().map(|e| StagedEnvelope {
            meta: e.meta.clone(),
            implicit_rules: e.implicit_rules.clone(),
            language: e.language.clone(),
            text: e.text.clone(),
            contained: e.contained.iter().cloned().map(Some).collect(),
        });
        Self {
            kind: data.kind,
            type_name: data.type_name.clone(),
            schema: data.schema.clone(),
            id: data.id.clone(),
            extension: data.extension.iter().cloned().map(Some).collect(),
            modifier_extension: data.modifier_extension.iter().cloned().map(Some).collect(),
            value: data.value.clone(),
            envelope,
            fields,
            config: data.config.clone(),
        }
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Turn build-time validation on or off for this builder only
    pub fn validating(mut self, enabled: bool) -> Self {
        self.config.validate = enabled;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    fn field_slot(&mut self, name: &str) -> Result<(usize, bool)> {
        let schema = self.schema.as_ref().ok_or_else(|| {
            FhirNodeError::invalid_argument(format!(
                "Primitive {} has no field '{}'",
                self.type_name, name
            ))
        })?;
        let index = schema.field_index(name).ok_or_else(|| {
            FhirNodeError::invalid_argument(format!(
                "Unknown field '{}' for type {}",
                name, self.type_name
            ))
        })?;
        Ok((index, schema.fields[index].is_list()))
    }

    /// Assign a single or choice field. `None` unsets it; a new choice
    /// alternative replaces the previous one.
    pub fn set(mut self, name: &str, value: impl Into<Option<Node>>) -> Result<Self> {
        let (index, is_list) = self.field_slot(name)?;
        if is_list {
            return Err(FhirNodeError::invalid_argument(format!(
                "Field '{}' of {} is a list; use append or replace",
                name, self.type_name
            )));
        }
        self.fields[index] = match value.into() {
            Some(node) => Staged::Single(node),
            None => Staged::Unset,
        };
        Ok(self)
    }

    /// Add values to the end of a list field, keeping their order
    pub fn append<I, T>(mut self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Node>>,
    {
        let (index, is_list) = self.field_slot(name)?;
        if !is_list {
            return Err(FhirNodeError::invalid_argument(format!(
                "Field '{}' of {} holds a single value; use set",
                name, self.type_name
            )));
        }
        let slot = &mut self.fields[index];
        if !matches!(slot, Staged::List(_)) {
            *slot = Staged::List(Vec::new());
        }
        if let Staged::List(items) = slot {
            items.extend(values.into_iter().map(Into::into));
        }
        Ok(self)
    }

    /// Discard a list field's values and copy in `values`. An empty sequence
    /// clears the field; an absent one is rejected.
    pub fn replace<I, T>(mut self, name: &str, values: Option<I>) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Node>>,
    {
        let values = values.ok_or_else(|| {
            FhirNodeError::invalid_argument(format!(
                "Replacement for '{}' of {} must not be absent",
                name, self.type_name
            ))
        })?;
        let (index, is_list) = self.field_slot(name)?;
        if !is_list {
            return Err(FhirNodeError::invalid_argument(format!(
                "Field '{}' of {} holds a single value; use set",
                name, self.type_name
            )));
        }
        self.fields[index] = Staged::List(values.into_iter().map(Into::into).collect());
        Ok(self)
    }

    /// Unset a field of either cardinality
    pub fn clear(mut self, name: &str) -> Result<Self> {
        let (index, _) = self.field_slot(name)?;
        self.fields[index] = Staged::Unset;
        Ok(self)
    }

    /// Element id, or the logical id of a resource
    pub fn id(mut self, id: impl Into<Option<String>>) -> Self {
        self.id = id.into();
        self
    }

    pub fn extension<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Node>>,
    {
        self.extension.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn replace_extension<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Node>>,
    {
        self.extension = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn modifier_extension<I, T>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Node>>,
    {
        if !self.kind.allows_modifier_extension() {
            return Err(FhirNodeError::invalid_argument(format!(
                "{} ({}) cannot carry modifier extensions",
                self.type_name,
                self.kind.as_str()
            )));
        }
        self.modifier_extension
            .extend(values.into_iter().map(Into::into));
        Ok(self)
    }

    /// Primitive value; `None` leaves a primitive carrying only id/extensions
    pub fn value(mut self, value: impl Into<Option<PrimitiveValue>>) -> Result<Self> {
        if self.kind != NodeKind::Primitive {
            return Err(FhirNodeError::invalid_argument(format!(
                "{} is not a primitive and has no value",
                self.type_name
            )));
        }
        self.value = value.into();
        Ok(self)
    }

    fn envelope_mut(&mut self, what: &str) -> Result<&mut StagedEnvelope> {
        let type_name = &self.type_name;
        self.envelope.as_mut().ok_or_else(|| {
            FhirNodeError::invalid_argument(format!(
                "{type_name} is not a resource and has no '{what}'"
            ))
        })
    }

    pub fn meta(mut self, meta: impl Into<Option<Node>>) -> Result<Self> {
        self.envelope_mut("meta")?.meta = meta.into();
        Ok(self)
    }

    pub fn implicit_rules(mut self, uri: impl Into<Option<Node>>) -> Result<Self> {
        self.envelope_mut("implicitRules")?.implicit_rules = uri.into();
        Ok(self)
    }

    pub fn language(mut self, code: impl Into<Option<Node>>) -> Result<Self> {
        self.envelope_mut("language")?.language = code.into();
        Ok(self)
    }

    pub fn text(mut self, narrative: impl Into<Option<Node>>) -> Result<Self> {
        self.envelope_mut("text")?.text = narrative.into();
        Ok(self)
    }

    /// Append embedded resources
    pub fn contained<I, T>(mut self, resources: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Node>>,
    {
        self.envelope_mut("contained")?
            .contained
            .extend(resources.into_iter().map(Into::into));
        Ok(self)
    }

    /// Freeze the staged values into an immutable node.
    ///
    /// Absent list elements are always rejected since a built node cannot
    /// hold them. With validation enabled every check runs in a fixed order
    /// and the first violation is returned.
    pub fn build(self) -> Result<Node> {
        if self.config.validate {
            if let Some(schema) = &self.schema {
                cardinality::check_required(schema, |index| match &self.fields[index] {
                    Staged::Unset => false,
                    Staged::Single(_) => true,
                    Staged::List(items) => !items.is_empty(),
                })?;
            }
        }
        self.check_absent_elements()?;

        let node = self.freeze();
        let config = node.build_config();
        if config.validate {
            if let Err(err) = validation::check_content(&node, config) {
                tracing::debug!("Build of {} rejected: {}", node.type_name(), err);
                return Err(err.into());
            }
        }
        tracing::debug!("Built {} ({})", node.type_name(), node.kind().as_str());
        Ok(node)
    }

    fn check_absent_elements(&self) -> std::result::Result<(), ValidationError> {
        let mut lists: Vec<(&str, &[Option<Node>])> = vec![
            ("extension", &self.extension),
            ("modifierExtension", &self.modifier_extension),
        ];
        if let Some(envelope) = &self.envelope {
            lists.push(("contained", &envelope.contained));
        }
        if let Some(schema) = &self.schema {
            for (descriptor, staged) in schema.fields.iter().zip(&self.fields) {
                if let Staged::List(items) = staged {
                    lists.push((descriptor.name.as_str(), items));
                }
            }
        }
        for (field, items) in lists {
            if let Some(index) = items.iter().position(Option::is_none) {
                return Err(validation::local_error(
                    &self.type_name,
                    ViolationKind::NullElementInList {
                        field: field.to_string(),
                        index,
                    },
                ));
            }
        }
        Ok(())
    }

    fn freeze(self) -> Node {
        fn present(items: Vec<Option<Node>>) -> Vec<Node> {
            items.into_iter().flatten().collect()
        }

        let fields = match &self.schema {
            Some(schema) => schema
                .fields
                .iter()
                .zip(self.fields)
                .map(|(descriptor, staged)| match staged {
                    Staged::Unset => None,
                    Staged::Single(node) => Some(match descriptor.kind {
                        FieldKind::Choice { .. } => FieldValue::Choice(ChoiceValue::new(node)),
                        _ => FieldValue::Single(node),
                    }),
                    Staged::List(items) => {
                        let nodes = present(items);
                        (!nodes.is_empty()).then_some(FieldValue::List(nodes))
                    }
                })
                .collect(),
            None => Vec::new(),
        };
        let envelope = self.envelope.map(|e| ResourceEnvelope {
            meta: e.meta,
            implicit_rules: e.implicit_rules,
            language: e.language,
            text: e.text,
            contained: present(e.contained),
        });

        Node::from_data(NodeData {
            kind: self.kind,
            type_name: self.type_name,
            schema: self.schema,
            id: self.id,
            extension: present(self.extension),
            modifier_extension: present(self.modifier_extension),
            value: self.value,
            envelope,
            fields,
            config: self.config,
            hash: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::schema::{FieldDescriptor, SchemaRegistry};

    fn order_schema() -> Arc<TypeSchema> {
        Arc::new(
            TypeSchema::new("Order", NodeKind::Resource)
                .with_field(FieldDescriptor::scalar("status", PrimitiveType::Code).required())
                .with_field(FieldDescriptor::scalar("tag", PrimitiveType::String).list())
                .with_field(FieldDescriptor::choice("detail", &["string", "boolean"])),
        )
    }

    #[test]
    fn test_set_and_read_back() {
        let node = NodeBuilder::new(order_schema())
            .set("status", Node::code("active"))
            .unwrap()
            .set("detail", Node::boolean(true))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(node.single("status").and_then(Node::as_str), Some("active"));
        let choice = node.choice("detail").unwrap();
        assert_eq!(choice.type_name(), "boolean");
        assert!(node.list("tag").is_empty());
    }

    #[test]
    fn test_append_then_replace() {
        let builder = NodeBuilder::new(order_schema())
            .set("status", Node::code("active"))
            .unwrap()
            .append("tag", [Node::string("a"), Node::string("b")])
            .unwrap()
            .append("tag", [Node::string("c")])
            .unwrap();
        let node = builder.clone().build().unwrap();
        let tags: Vec<_> = node.list("tag").iter().filter_map(Node::as_str).collect();
        assert_eq!(tags, ["a", "b", "c"]);

        let node = builder
            .replace("tag", Some([Node::string("x"), Node::string("y")]))
            .unwrap()
            .build()
            .unwrap();
        let tags: Vec<_> = node.list("tag").iter().filter_map(Node::as_str).collect();
        assert_eq!(tags, ["x", "y"]);
    }

    #[test]
    fn test_replace_absent_is_invalid_argument() {
        let err = NodeBuilder::new(order_schema())
            .replace("tag", None::<Vec<Node>>)
            .unwrap_err();
        assert!(matches!(err, FhirNodeError::InvalidArgument { .. }));

        // An empty sequence is fine and leaves the list empty
        let node = NodeBuilder::new(order_schema())
            .set("status", Node::code("active"))
            .unwrap()
            .append("tag", [Node::string("a")])
            .unwrap()
            .replace("tag", Some(Vec::<Node>::new()))
            .unwrap()
            .build()
            .unwrap();
        assert!(node.field("tag").is_none());
    }

    #[test]
    fn test_wrong_cardinality_operations() {
        let builder = NodeBuilder::new(order_schema());
        assert!(builder.clone().set("tag", Node::string("a")).is_err());
        assert!(builder.clone().append("status", [Node::code("a")]).is_err());
        assert!(builder.clone().set("missing", Node::string("a")).is_err());
        assert!(builder.value(PrimitiveValue::from("x")).is_err());
    }

    #[test]
    fn test_envelope_only_on_resources() {
        let registry = SchemaRegistry::new();
        let coding = registry.builder("Coding").unwrap();
        let err = coding.clone().meta(Node::string("x")).unwrap_err();
        assert!(matches!(err, FhirNodeError::InvalidArgument { .. }));
        assert!(coding.modifier_extension([Node::string("x")]).is_err());
    }

    #[test]
    fn test_required_field_missing() {
        let err = NodeBuilder::new(order_schema()).build().unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.code, ErrorCode::RequiredFieldMissing);
        assert_eq!(err.path, "Order.status");

        let node = NodeBuilder::new(order_schema())
            .validating(false)
            .build()
            .unwrap();
        assert!(node.single("status").is_none());
    }

    #[test]
    fn test_absent_list_element_always_rejected() {
        for validate in [true, false] {
            let err = NodeBuilder::new(order_schema())
                .validating(validate)
                .set("status", Node::code("active"))
                .unwrap()
                .append("tag", [Some(Node::string("a")), None])
                .unwrap()
                .build()
                .unwrap_err();
            let err = err.as_validation().unwrap();
            assert_eq!(
                err.kind,
                ViolationKind::NullElementInList {
                    field: "tag".to_string(),
                    index: 1
                }
            );
        }
    }

    #[test]
    fn test_choice_overwrites_previous_alternative() {
        let node = NodeBuilder::new(order_schema())
            .set("status", Node::code("active"))
            .unwrap()
            .set("detail", Node::string("first"))
            .unwrap()
            .set("detail", Node::boolean(false))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(node.choice("detail").unwrap().type_name(), "boolean");
    }

    #[test]
    fn test_rebuild_from_existing_is_equal() {
        let node = NodeBuilder::new(order_schema())
            .id(Some("o1".to_string()))
            .set("status", Node::code("active"))
            .unwrap()
            .append("tag", [Node::string("a")])
            .unwrap()
            .build()
            .unwrap();
        let rebuilt = node.to_builder().build().unwrap();
        assert_eq!(node, rebuilt);
        assert!(node.list("tag")[0].ptr_eq(&rebuilt.list("tag")[0]));
    }

    #[test]
    fn test_rebuild_keeps_build_config() {
        let unvalidated = NodeBuilder::new(order_schema())
            .validating(false)
            .build()
            .unwrap();
        assert!(!unvalidated.build_config().validate);

        let rebuilt = unvalidated.to_builder().build().unwrap();
        assert_eq!(rebuilt, unvalidated);
        assert!(!rebuilt.build_config().validate);

        // Turning validation back on is an explicit choice
        let err = unvalidated
            .to_builder()
            .validating(true)
            .build()
            .unwrap_err();
        assert_eq!(
            err.as_validation().unwrap().code,
            ErrorCode::RequiredFieldMissing
        );
    }

    #[test]
    fn test_primitive_builder_checks_format() {
        let node = NodeBuilder::primitive(PrimitiveType::Date)
            .value(PrimitiveValue::from("2024-02-29"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(node.as_str(), Some("2024-02-29"));

        let err = NodeBuilder::primitive(PrimitiveType::Date)
            .value(PrimitiveValue::from("2023-02-29"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.as_validation().unwrap().code, ErrorCode::InvalidPrimitive);
    }
}
