pub mod extension;
pub mod node;
pub mod primitive;

pub use node::{ChoiceValue, FieldValue, Node, NodeKind, ResourceEnvelope};
pub use primitive::{PRIMITIVE_TYPES, PrimitiveType, PrimitiveValue};
