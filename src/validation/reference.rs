//! Reference target kinds.
//!
//! The kind of a literal reference is the resource-type segment of
//! `[base/]Type/id[/_history/version]`. Local (`#id`) and logical (`urn:`)
//! references carry no kind of their own, so `Reference.type` stands in for
//! it. Absolute urls whose type segment is not a known resource type, and
//! references without any determinable kind, are accepted unchecked.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::{CheckResult, local_error};
use crate::builder::NodeBuilder;
use crate::error::{Result, ViolationKind};
use crate::schema::builtin::{self, REFERENCE};
use crate::schema::resource_types::{ANY_RESOURCE, is_resource_type};
use crate::schema::{FieldDescriptor, TypeSchema};
use crate::types::{Node, NodeKind};

static LITERAL_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<base>(https?)://([A-Za-z0-9\-\\\.:%\$]*/)+)?(?P<kind>[A-Z][A-Za-z]+)/(?P<id>[A-Za-z0-9\-\.]{1,64})(/_history/(?P<version>[A-Za-z0-9\-\.]{1,64}))?$",
    )
    .expect("literal reference pattern is valid")
});

static REFERENCE_SCHEMA: Lazy<Arc<TypeSchema>> = Lazy::new(|| Arc::new(builtin::reference()));

/// Parts of a literal reference such as
/// `http://example.org/fhir/Patient/123/_history/2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralReference<'a> {
    /// Service base, including the trailing slash
    pub base: Option<&'a str>,
    pub kind: &'a str,
    pub id: &'a str,
    pub version: Option<&'a str>,
}

/// Parse a literal reference, ignoring any `?query` suffix. Local and `urn:`
/// references are not literal.
pub fn parse_literal(reference: &str) -> Option<LiteralReference<'_>> {
    if is_local(reference) || is_logical(reference) {
        return None;
    }
    let path = reference.split('?').next().unwrap_or(reference);
    let captures = LITERAL_REFERENCE.captures(path)?;
    Some(LiteralReference {
        base: captures.name("base").map(|m| m.as_str()),
        kind: captures.name("kind")?.as_str(),
        id: captures.name("id")?.as_str(),
        version: captures.name("version").map(|m| m.as_str()),
    })
}

/// `#id` reference into the container's contained resources
pub fn is_local(reference: &str) -> bool {
    reference.starts_with('#')
}

pub fn is_logical(reference: &str) -> bool {
    reference.starts_with("urn:")
}

/// A `Reference` node with only `reference` set
pub fn literal(reference: &str) -> Result<Node> {
    NodeBuilder::new(REFERENCE_SCHEMA.clone())
        .set("reference", Node::string(reference))?
        .build()
}

/// A `Reference` node with both `reference` and `type` set
pub fn typed(reference: &str, kind: &str) -> Result<Node> {
    NodeBuilder::new(REFERENCE_SCHEMA.clone())
        .set("reference", Node::string(reference))?
        .set("type", Node::uri(kind))?
        .build()
}

fn reference_value(node: &Node) -> Option<&str> {
    node.single("reference").and_then(Node::as_str)
}

fn type_value(node: &Node) -> Option<&str> {
    node.single("type").and_then(Node::as_str)
}

/// Kind a `Reference` node points at, as far as it can be told lexically.
///
/// A relative literal always yields its leading segment. An absolute url only
/// does when the segment is a standard resource type or one of
/// `extra_kinds` (typically the field's declared targets); otherwise the
/// service context is unknown. Without a literal kind, `Reference.type` is
/// used under the same rule.
pub fn target_kind<'a>(node: &'a Node, extra_kinds: &[String]) -> Option<&'a str> {
    let known = |kind: &str| is_resource_type(kind) || extra_kinds.iter().any(|k| k == kind);
    let literal_kind = reference_value(node)
        .and_then(parse_literal)
        .filter(|literal| literal.base.is_none() || known(literal.kind))
        .map(|literal| literal.kind);
    literal_kind.or_else(|| type_value(node).filter(|kind| known(kind)))
}

fn is_restricted(targets: &[String]) -> bool {
    !targets.is_empty() && !targets.iter().any(|t| t == ANY_RESOURCE)
}

/// Every reference stored in a field with declared targets must point at one
/// of them.
pub fn check_target_kinds(node: &Node) -> CheckResult {
    for (descriptor, value) in node.fields() {
        let targets = descriptor.reference_targets();
        if !is_restricted(targets) {
            continue;
        }
        for reference in value.nodes().iter().filter(|n| is_reference(n)) {
            check_allowed(node, descriptor, reference)?;
        }
    }
    Ok(())
}

fn check_allowed(owner: &Node, descriptor: &FieldDescriptor, reference: &Node) -> CheckResult {
    let targets = descriptor.reference_targets();
    match target_kind(reference, targets) {
        Some(kind) if !targets.iter().any(|t| t == kind) => Err(local_error(
            owner.type_name(),
            ViolationKind::ReferenceTypeViolation {
                field: descriptor.name.clone(),
                found: kind.to_string(),
                allowed: targets.to_vec(),
            },
        )),
        _ => Ok(()),
    }
}

fn is_reference(node: &Node) -> bool {
    node.kind() == NodeKind::Element && node.type_name() == REFERENCE
}

/// A `Reference` node's `type`, when present, must be a resource type and
/// must agree with the kind of its literal reference.
pub fn check_consistency(node: &Node) -> CheckResult {
    if !is_reference(node) {
        return Ok(());
    }
    let Some(declared) = type_value(node) else {
        return Ok(());
    };
    let reference = reference_value(node).unwrap_or_default();
    let invalid = |reason: String| {
        Err(local_error(
            node.type_name(),
            ViolationKind::InvalidReference {
                field: "type".to_string(),
                reference: reference.to_string(),
                reason,
            },
        ))
    };

    if !is_resource_type(declared) {
        return invalid(format!(
            "Reference.type '{declared}' must be a valid resource type name"
        ));
    }
    if let Some(literal) = parse_literal(reference) {
        if is_resource_type(literal.kind) && literal.kind != declared {
            return invalid(format!(
                "resource type '{}' does not match Reference.type '{declared}'",
                literal.kind
            ));
        }
    }
    Ok(())
}
