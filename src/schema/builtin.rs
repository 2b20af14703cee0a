//! Descriptors for the general-purpose datatypes every record uses.

use super::{FieldDescriptor, TypeSchema};
use crate::types::{NodeKind, PrimitiveType};

pub const EXTENSION: &str = "Extension";
pub const REFERENCE: &str = "Reference";
pub const META: &str = "Meta";
pub const NARRATIVE: &str = "Narrative";

/// Reference target kinds an Annotation author may point at
const ANNOTATION_AUTHORS: &[&str] = &[
    "Practitioner",
    "PractitionerRole",
    "Patient",
    "RelatedPerson",
    "Organization",
];

pub fn extension() -> TypeSchema {
    TypeSchema::new(EXTENSION, NodeKind::Element)
        .with_description("Additional content defined by implementations")
        .with_field(FieldDescriptor::scalar("url", PrimitiveType::Uri).required())
        .with_field(FieldDescriptor::choice("value", &[]))
}

pub fn reference() -> TypeSchema {
    TypeSchema::new(REFERENCE, NodeKind::Element)
        .with_description("A reference from one resource to another")
        .with_field(FieldDescriptor::scalar("reference", PrimitiveType::String))
        .with_field(FieldDescriptor::scalar("type", PrimitiveType::Uri))
        .with_field(FieldDescriptor::composite("identifier", "Identifier"))
        .with_field(FieldDescriptor::scalar("display", PrimitiveType::String))
}

pub fn identifier() -> TypeSchema {
    TypeSchema::new("Identifier", NodeKind::Element)
        .with_field(FieldDescriptor::scalar("use", PrimitiveType::Code))
        .with_field(FieldDescriptor::composite("type", "CodeableConcept"))
        .with_field(FieldDescriptor::scalar("system", PrimitiveType::Uri))
        .with_field(FieldDescriptor::scalar("value", PrimitiveType::String))
        .with_field(FieldDescriptor::composite("period", "Period"))
        .with_field(FieldDescriptor::reference("assigner", &["Organization"]))
}

pub fn coding() -> TypeSchema {
    TypeSchema::new("Coding", NodeKind::Element)
        .with_field(FieldDescriptor::scalar("system", PrimitiveType::Uri))
        .with_field(FieldDescriptor::scalar("version", PrimitiveType::String))
        .with_field(FieldDescriptor::scalar("code", PrimitiveType::Code))
        .with_field(FieldDescriptor::scalar("display", PrimitiveType::String))
        .with_field(FieldDescriptor::scalar("userSelected", PrimitiveType::Boolean))
}

pub fn codeable_concept() -> TypeSchema {
    TypeSchema::new("CodeableConcept", NodeKind::Element)
        .with_field(FieldDescriptor::composite("coding", "Coding").list())
        .with_field(FieldDescriptor::scalar("text", PrimitiveType::String))
}

pub fn period() -> TypeSchema {
    TypeSchema::new("Period", NodeKind::Element)
        .with_field(FieldDescriptor::scalar("start", PrimitiveType::DateTime))
        .with_field(FieldDescriptor::scalar("end", PrimitiveType::DateTime))
}

pub fn quantity() -> TypeSchema {
    TypeSchema::new("Quantity", NodeKind::Element)
        .with_field(FieldDescriptor::scalar("value", PrimitiveType::Decimal))
        .with_field(FieldDescriptor::scalar("comparator", PrimitiveType::Code))
        .with_field(FieldDescriptor::scalar("unit", PrimitiveType::String))
        .with_field(FieldDescriptor::scalar("system", PrimitiveType::Uri))
        .with_field(FieldDescriptor::scalar("code", PrimitiveType::Code))
}

pub fn range() -> TypeSchema {
    TypeSchema::new("Range", NodeKind::Element)
        .with_field(FieldDescriptor::composite("low", "Quantity"))
        .with_field(FieldDescriptor::composite("high", "Quantity"))
}

pub fn annotation() -> TypeSchema {
    TypeSchema::new("Annotation", NodeKind::Element)
        .with_field(
            FieldDescriptor::choice("author", &["Reference", "string"])
                .with_targets(ANNOTATION_AUTHORS),
        )
        .with_field(FieldDescriptor::scalar("time", PrimitiveType::DateTime))
        .with_field(FieldDescriptor::scalar("text", PrimitiveType::Markdown).required())
}

pub fn meta() -> TypeSchema {
    TypeSchema::new(META, NodeKind::Element)
        .with_field(FieldDescriptor::scalar("versionId", PrimitiveType::Id))
        .with_field(FieldDescriptor::scalar("lastUpdated", PrimitiveType::Instant))
        .with_field(FieldDescriptor::scalar("source", PrimitiveType::Uri))
        .with_field(FieldDescriptor::scalar("profile", PrimitiveType::Canonical).list())
        .with_field(FieldDescriptor::composite("security", "Coding").list())
        .with_field(FieldDescriptor::composite("tag", "Coding").list())
}

pub fn narrative() -> TypeSchema {
    TypeSchema::new(NARRATIVE, NodeKind::Element)
        .with_field(FieldDescriptor::scalar("status", PrimitiveType::Code).required())
        .with_field(FieldDescriptor::scalar("div", PrimitiveType::Xhtml).required())
}

/// Every builtin datatype, in dependency-free order
pub fn all() -> Vec<TypeSchema> {
    vec![
        extension(),
        reference(),
        identifier(),
        coding(),
        codeable_concept(),
        period(),
        quantity(),
        range(),
        annotation(),
        meta(),
        narrative(),
    ]
}
