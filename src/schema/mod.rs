//! Declarative type descriptors.
//!
//! A [`TypeSchema`] describes one composite type (a resource, a backbone
//! element or a datatype) as an ordered list of [`FieldDescriptor`]s. The
//! field order is the traversal order of every node built from the schema.
//!
//! Descriptors are plain data and deserialize from JSON:
//!
//! ```json
//! {
//!   "name": "DeviceRequest",
//!   "kind": "resource",
//!   "fields": [
//!     { "name": "intent", "required": true, "kind": "scalar", "type": "code" },
//!     { "name": "code", "required": true, "kind": "choice",
//!       "types": ["Reference", "CodeableConcept"], "targets": ["Device"] },
//!     { "name": "note", "cardinality": "list", "kind": "composite", "type": "Annotation" }
//!   ]
//! }
//! ```

pub mod builtin;
pub mod registry;
pub mod resource_types;

pub use registry::SchemaRegistry;

use serde::{Deserialize, Serialize};

use crate::types::{NodeKind, PrimitiveType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Single,
    List,
}

/// Shape of the values a field accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    /// A primitive of exactly this type
    Scalar {
        #[serde(rename = "type")]
        primitive: PrimitiveType,
    },
    /// A composite of exactly this type
    Composite {
        #[serde(rename = "type")]
        type_name: String,
    },
    /// One value out of a closed set of types; an empty set accepts any type
    Choice {
        types: Vec<String>,
        /// Target kinds for the `Reference` alternative
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        targets: Vec<String>,
    },
    /// A `Reference`; an empty target set accepts any kind
    Reference {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        targets: Vec<String>,
    },
    /// Any resource node
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::Single,
            required: false,
            kind,
        }
    }

    pub fn scalar(name: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self::new(name, FieldKind::Scalar { primitive })
    }

    pub fn composite(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Composite {
                type_name: type_name.into(),
            },
        )
    }

    pub fn choice(name: impl Into<String>, types: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Choice {
                types: types.iter().map(|t| t.to_string()).collect(),
                targets: Vec::new(),
            },
        )
    }

    pub fn reference(name: impl Into<String>, targets: &[&str]) -> Self {
        Self::new(
            name,
            FieldKind::Reference {
                targets: targets.iter().map(|t| t.to_string()).collect(),
            },
        )
    }

    pub fn resource(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Resource)
    }

    pub fn list(mut self) -> Self {
        self.cardinality = Cardinality::List;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the `Reference` alternative of a choice field
    pub fn with_targets(mut self, kinds: &[&str]) -> Self {
        match &mut self.kind {
            FieldKind::Choice { targets, .. } | FieldKind::Reference { targets } => {
                *targets = kinds.iter().map(|t| t.to_string()).collect();
            }
            _ => {}
        }
        self
    }

    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::List
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice { .. })
    }

    /// Type names a value of this field may have; empty means any
    pub fn accepted_types(&self) -> Vec<String> {
        match &self.kind {
            FieldKind::Scalar { primitive } => vec![primitive.as_str().to_string()],
            FieldKind::Composite { type_name } => vec![type_name.clone()],
            FieldKind::Choice { types, .. } => types.clone(),
            FieldKind::Reference { .. } => vec!["Reference".to_string()],
            FieldKind::Resource => vec!["Resource".to_string()],
        }
    }

    /// Permitted reference target kinds; empty means unrestricted
    pub fn reference_targets(&self) -> &[String] {
        match &self.kind {
            FieldKind::Choice { targets, .. } | FieldKind::Reference { targets } => targets,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSchema {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypeSchema {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            description: None,
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn is_resource(&self) -> bool {
        self.kind == NodeKind::Resource
    }
}
