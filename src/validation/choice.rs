//! Field type conformance and choice resolution.

use super::{CheckResult, local_error};
use crate::error::ViolationKind;
use crate::schema::builtin::{EXTENSION, META, NARRATIVE, REFERENCE};
use crate::schema::resource_types::ANY_RESOURCE;
use crate::schema::{FieldDescriptor, FieldKind};
use crate::types::{Node, NodeKind, PrimitiveType};

/// Declared alternative that `value` satisfies, or `None` when it satisfies
/// none. Open choices (no declared types) resolve to the value's own type.
pub fn resolve<'a>(descriptor: &'a FieldDescriptor, value: &'a Node) -> Option<&'a str> {
    match &descriptor.kind {
        FieldKind::Choice { types, .. } if types.is_empty() => Some(value.type_name()),
        FieldKind::Choice { types, .. } => types
            .iter()
            .find(|ty| is_instance_of(value, ty))
            .map(String::as_str),
        _ => conforms(descriptor, value).then(|| value.type_name()),
    }
}

/// Whether `value` may be stored in a field described by `descriptor`
pub fn conforms(descriptor: &FieldDescriptor, value: &Node) -> bool {
    match &descriptor.kind {
        FieldKind::Scalar { primitive } => is_primitive(value, *primitive),
        FieldKind::Composite { type_name } => {
            value.kind().is_composite() && value.type_name() == type_name
        }
        FieldKind::Choice { .. } => resolve(descriptor, value).is_some(),
        FieldKind::Reference { .. } => is_instance_of(value, REFERENCE),
        FieldKind::Resource => value.kind() == NodeKind::Resource,
    }
}

fn is_instance_of(value: &Node, type_name: &str) -> bool {
    if type_name == ANY_RESOURCE {
        return value.kind() == NodeKind::Resource;
    }
    match PrimitiveType::parse(type_name) {
        Some(primitive) => is_primitive(value, primitive),
        None => value.kind().is_composite() && value.type_name() == type_name,
    }
}

fn is_primitive(value: &Node, primitive: PrimitiveType) -> bool {
    value.primitive_type() == Some(primitive)
}

fn mismatch(owner: &Node, field: &str, found: &Node, expected: Vec<String>) -> CheckResult {
    Err(local_error(
        owner.type_name(),
        ViolationKind::TypeMismatch {
            field: field.to_string(),
            found: found.type_name().to_string(),
            expected,
        },
    ))
}

/// Check extensions, envelope members and every declared field of `node`
pub fn check_types(node: &Node) -> CheckResult {
    let extensions = [
        ("extension", node.extension()),
        ("modifierExtension", node.modifier_extension()),
    ];
    for (field, items) in extensions {
        if let Some(bad) = items.iter().find(|ext| !is_instance_of(ext, EXTENSION)) {
            return mismatch(node, field, bad, vec![EXTENSION.to_string()]);
        }
    }

    if let Some(envelope) = node.envelope() {
        let members = [
            ("meta", envelope.meta.as_ref(), META),
            ("implicitRules", envelope.implicit_rules.as_ref(), "uri"),
            ("language", envelope.language.as_ref(), "code"),
            ("text", envelope.text.as_ref(), NARRATIVE),
        ];
        for (field, value, expected) in members {
            if let Some(value) = value.filter(|v| !is_instance_of(v, expected)) {
                return mismatch(node, field, value, vec![expected.to_string()]);
            }
        }
        if let Some(bad) = envelope
            .contained
            .iter()
            .find(|c| c.kind() != NodeKind::Resource)
        {
            return mismatch(node, "contained", bad, vec![ANY_RESOURCE.to_string()]);
        }
    }

    for (descriptor, value) in node.fields() {
        if let Some(bad) = value.nodes().iter().find(|v| !conforms(descriptor, v)) {
            return mismatch(node, &descriptor.name, bad, descriptor.accepted_types());
        }
    }
    Ok(())
}
