//! # OctoFHIR FHIRNode
//!
//! Schema-driven construction, validation and traversal of immutable FHIR
//! resource trees.
//!
//! ## Features
//!
//! - **One generic model**: every element is a [`Node`]; per-type knowledge
//!   lives in declarative [`TypeSchema`] descriptors loaded from JSON
//! - **Builders**: stage fields on a [`NodeBuilder`], freeze with `build()`,
//!   copy-and-mutate with [`Node::to_builder`]
//! - **Validation**: required fields, absent list elements, choice types,
//!   reference targets, primitive formats, reporting the first violation
//! - **Traversal**: a [`Visitor`] protocol walking fields in schema order
//! - **Batch validation**: validate independent resources on the tokio
//!   blocking pool (feature `batch`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octofhir_fhirnode::*;
//!
//! # fn example() -> Result<()> {
//! let mut registry = SchemaRegistry::new();
//! registry.load_file("schemas/device-request.json")?;
//!
//! let request = registry
//!     .builder("DeviceRequest")?
//!     .set("intent", Node::code("order"))?
//!     .set("code", reference::literal("Device/infusion-pump")?)?
//!     .set("subject", reference::literal("Patient/123")?)?
//!     .build()?;
//!
//! let copy = request.to_builder().build()?;
//! assert_eq!(request, copy);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "batch")]
pub mod batch;
pub mod builder;
pub mod config;
pub mod error;
pub mod schema;
pub mod types;
pub mod validation;
pub mod visitor;

#[cfg(feature = "batch")]
pub use batch::{BatchReport, validate_batch};
pub use builder::NodeBuilder;
pub use config::{BatchConfig, BuildConfig, FhirNodeConfig};
pub use error::Result;
pub use error::{ErrorCode, FhirNodeError, ValidationError, ViolationKind};
pub use schema::{Cardinality, FieldDescriptor, FieldKind, SchemaRegistry, TypeSchema};
pub use types::extension;
pub use types::{ChoiceValue, FieldValue, Node, NodeKind, PrimitiveType, PrimitiveValue};
pub use validation::reference;
pub use validation::{validate, validate_tree};
pub use visitor::{ModifierExtensionGuard, PathVisitor, Visitor, walk};
