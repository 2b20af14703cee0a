use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use super::{FieldKind, TypeSchema, builtin, resource_types};
use crate::builder::NodeBuilder;
use crate::config::BuildConfig;
use crate::error::{FhirNodeError, Result};
use crate::types::{NodeKind, PrimitiveType};

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Many(Vec<TypeSchema>),
    One(TypeSchema),
}

/// Read-only table of type descriptors, keyed by type name.
///
/// Populate it once at startup, then share it; every lookup hands out an
/// `Arc` so built nodes can keep their descriptor alive.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    types: HashMap<String, Arc<TypeSchema>>,
    config: BuildConfig,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Registry preloaded with the builtin datatypes
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for schema in builtin::all() {
            types.insert(schema.name.clone(), Arc::new(schema));
        }
        Self {
            types,
            config: BuildConfig::default(),
        }
    }

    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            config: BuildConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Add one descriptor. Re-registering an identical descriptor is a no-op;
    /// a different descriptor under a known name is rejected.
    pub fn register(&mut self, schema: TypeSchema) -> Result<Arc<TypeSchema>> {
        if schema.kind == NodeKind::Primitive {
            return Err(FhirNodeError::schema(format!(
                "Type {} cannot be declared as primitive",
                schema.name
            )));
        }
        if PrimitiveType::is_primitive_name(&schema.name) {
            return Err(FhirNodeError::schema(format!(
                "Type name {} is reserved for a primitive",
                schema.name
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(FhirNodeError::schema(format!(
                    "Field {}.{} is declared twice",
                    schema.name, field.name
                )));
            }
        }

        if let Some(existing) = self.types.get(&schema.name) {
            if **existing == schema {
                tracing::warn!("Ignoring duplicate definition of {}", schema.name);
                return Ok(existing.clone());
            }
            return Err(FhirNodeError::schema(format!(
                "Type {} is already registered with a different definition",
                schema.name
            )));
        }

        let schema = Arc::new(schema);
        self.types.insert(schema.name.clone(), schema.clone());
        Ok(schema)
    }

    /// Load one descriptor or an array of descriptors from JSON. The whole
    /// document is checked for dangling type names; on any error the registry
    /// is left as it was.
    pub fn load_json_str(&mut self, json: &str) -> Result<usize> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        self.load_document(document)
    }

    pub fn load_reader<R: Read>(&mut self, reader: R) -> Result<usize> {
        let document: SchemaDocument = serde_json::from_reader(reader)?;
        self.load_document(document)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let count = self.load_reader(std::io::BufReader::new(file))?;
        tracing::info!("Loaded {} type schemas from {}", count, path.display());
        Ok(count)
    }

    fn load_document(&mut self, document: SchemaDocument) -> Result<usize> {
        let schemas = match document {
            SchemaDocument::Many(schemas) => schemas,
            SchemaDocument::One(schema) => vec![schema],
        };
        let count = schemas.len();
        let mut staged = self.clone();
        for schema in schemas {
            staged.register(schema)?;
        }
        staged.check_consistency()?;
        *self = staged;
        tracing::info!(
            "Registered {} type schemas ({} total)",
            count,
            self.types.len()
        );
        Ok(count)
    }

    /// Every composite, choice and resource type a field names must be known.
    pub fn check_consistency(&self) -> Result<()> {
        for schema in self.types.values() {
            for field in &schema.fields {
                let names: Vec<&str> = match &field.kind {
                    FieldKind::Scalar { .. } | FieldKind::Resource => continue,
                    FieldKind::Composite { type_name } => vec![type_name.as_str()],
                    FieldKind::Choice { types, .. } => types.iter().map(String::as_str).collect(),
                    FieldKind::Reference { .. } => vec![builtin::REFERENCE],
                };
                for name in names {
                    if !self.is_known_type(name) {
                        return Err(FhirNodeError::schema(format!(
                            "Field {}.{} refers to unknown type {}",
                            schema.name, field.name, name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Primitive names, registered types and the `Resource` wildcard
    pub fn is_known_type(&self, name: &str) -> bool {
        name == resource_types::ANY_RESOURCE
            || PrimitiveType::is_primitive_name(name)
            || self.types.contains_key(name)
    }

    /// Registered resource descriptors or any standard resource name
    pub fn is_resource_type(&self, name: &str) -> bool {
        self.types.get(name).is_some_and(|s| s.is_resource())
            || resource_types::is_resource_type(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<TypeSchema>> {
        self.types.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<TypeSchema>> {
        self.get(name)
            .ok_or_else(|| FhirNodeError::unknown_type(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Builder for `name`, carrying this registry's build configuration
    pub fn builder(&self, name: &str) -> Result<NodeBuilder> {
        Ok(NodeBuilder::new(self.require(name)?).with_config(self.config.clone()))
    }

    /// Builder for an `Extension` with the given url
    pub fn extension(&self, url: &str) -> Result<NodeBuilder> {
        self.builder(builtin::EXTENSION)?
            .set("url", crate::types::Node::uri(url))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
