//! Primitive datatype conformance.
//!
//! A primitive's value must use the representation of its type. With format
//! checks on, the lexical form must also match the FHIR definition of the
//! type. A composite checks its direct primitive children, so values made
//! with the unchecked `Node` constructors are caught when their parent is
//! built.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::{CheckResult, local_error};
use crate::error::ViolationKind;
use crate::types::{Node, NodeKind, PrimitiveType, PrimitiveValue};

/// Longest string value accepted, in bytes
pub const MAX_STRING_LENGTH: usize = 1024 * 1024;

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("primitive pattern is valid")
}

// FHIR ID pattern: [A-Za-z0-9\-\.]{1,64}
static ID: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z0-9\-\.]{1,64}$"));
static CODE: Lazy<Regex> = Lazy::new(|| pattern(r"^[^\s]+(\s[^\s]+)*$"));
static OID: Lazy<Regex> = Lazy::new(|| pattern(r"^urn:oid:[0-2](\.(0|[1-9][0-9]*))+$"));
static UUID: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^urn:uuid:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
});
static URI: Lazy<Regex> = Lazy::new(|| pattern(r"^\S*$"));
static BASE64: Lazy<Regex> = Lazy::new(|| pattern(r"^(\s*([0-9a-zA-Z+/=]){4}\s*)+$"));
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| pattern(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$"));
// Year, year-month or full date
static DATE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^[0-9]{4}(-(0[1-9]|1[0-2])(-(0[1-9]|[12][0-9]|3[01]))?)?$"));
static TIME: Lazy<Regex> =
    Lazy::new(|| pattern(r"^([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]{1,9})?$"));
static INSTANT: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])T([01][0-9]|2[0-3]):[0-5][0-9]:([0-5][0-9]|60)(\.[0-9]{1,9})?(Z|[+-]((0[0-9]|1[0-3]):[0-5][0-9]|14:00))$",
    )
});

/// Check `node` as a primitive, or the primitive children of a composite.
/// Representation mismatches are `TypeMismatch`; with `check_format` on, the
/// lexical form of every primitive (and a resource's logical id) is checked
/// too. Children are anchored at the field holding them.
pub fn check(node: &Node, check_format: bool) -> CheckResult {
    if node.kind() == NodeKind::Primitive {
        return check_value(node.type_name(), None, node, check_format);
    }
    if check_format && node.kind() == NodeKind::Resource {
        check_resource_id(node)?;
    }
    if let Some(envelope) = node.envelope() {
        let members = [
            ("implicitRules", envelope.implicit_rules.as_ref()),
            ("language", envelope.language.as_ref()),
        ];
        for (field, child) in members {
            if let Some(child) = child {
                check_value(node.type_name(), Some(field), child, check_format)?;
            }
        }
    }
    for (descriptor, value) in node.fields() {
        let field = Some(descriptor.name.as_str());
        for child in value.nodes() {
            check_value(node.type_name(), field, child, check_format)?;
        }
    }
    Ok(())
}

/// Representation and format of one primitive. `field` is the owner's field
/// holding it; `None` checks the primitive as the failing node itself.
fn check_value(
    owner: &str,
    field: Option<&str>,
    node: &Node,
    check_format: bool,
) -> CheckResult {
    let (Some(primitive), Some(value)) = (node.primitive_type(), node.value()) else {
        return Ok(());
    };
    if !primitive.accepts(value) {
        return Err(local_error(
            owner,
            ViolationKind::TypeMismatch {
                field: field.unwrap_or("value").to_string(),
                found: value.representation().to_string(),
                expected: vec![primitive.as_str().to_string()],
            },
        ));
    }
    if check_format && !is_valid(primitive, value) {
        return Err(local_error(
            owner,
            ViolationKind::InvalidPrimitive {
                field: field.map(str::to_string),
                type_name: primitive.as_str().to_string(),
                value: abbreviate(&value.to_string()),
            },
        ));
    }
    Ok(())
}

fn check_resource_id(node: &Node) -> CheckResult {
    match node.id() {
        Some(id) if !ID.is_match(id) => Err(local_error(
            node.type_name(),
            ViolationKind::InvalidPrimitive {
                field: Some("id".to_string()),
                type_name: PrimitiveType::Id.as_str().to_string(),
                value: abbreviate(id),
            },
        )),
        _ => Ok(()),
    }
}

fn abbreviate(value: &str) -> String {
    const SHOWN: usize = 64;
    match value.char_indices().nth(SHOWN) {
        Some((end, _)) => format!("{}...", &value[..end]),
        None => value.to_string(),
    }
}

/// Whether `value` is a lexically valid `primitive`. The value must already
/// use the type's representation.
pub fn is_valid(primitive: PrimitiveType, value: &PrimitiveValue) -> bool {
    match value {
        PrimitiveValue::Boolean(_) => true,
        PrimitiveValue::Integer(i) => match primitive {
            PrimitiveType::Integer => i32::try_from(*i).is_ok(),
            PrimitiveType::PositiveInt => (1..=i32::MAX as i64).contains(i),
            PrimitiveType::UnsignedInt => (0..=i32::MAX as i64).contains(i),
            _ => true,
        },
        PrimitiveValue::Decimal(s) => DECIMAL.is_match(s),
        PrimitiveValue::String(s) => is_valid_text(primitive, s),
    }
}

fn is_valid_text(primitive: PrimitiveType, s: &str) -> bool {
    if s.len() > MAX_STRING_LENGTH {
        return false;
    }
    match primitive {
        PrimitiveType::Code => CODE.is_match(s),
        PrimitiveType::Id => ID.is_match(s),
        PrimitiveType::Oid => OID.is_match(s),
        PrimitiveType::Uuid => UUID.is_match(s),
        PrimitiveType::Uri | PrimitiveType::Canonical => URI.is_match(s),
        PrimitiveType::Url => Url::parse(s).is_ok(),
        PrimitiveType::Base64Binary => s.is_empty() || BASE64.is_match(s),
        PrimitiveType::Date => is_valid_date(s),
        PrimitiveType::DateTime => is_valid_date_time(s),
        PrimitiveType::Instant => {
            INSTANT.is_match(s) && DateTime::parse_from_rfc3339(s).is_ok()
        }
        PrimitiveType::Time => TIME.is_match(s),
        PrimitiveType::Xhtml => !s.trim().is_empty(),
        _ => true,
    }
}

fn is_valid_date(s: &str) -> bool {
    DATE.is_match(s) && (s.len() < 10 || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
}

fn is_valid_date_time(s: &str) -> bool {
    match s.split_once('T') {
        None => is_valid_date(s),
        Some((date, _)) => date.len() == 10 && is_valid_date(date) && INSTANT.is_match(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::error::ErrorCode;
    use crate::schema::{SchemaRegistry, TypeSchema};

    fn valid(primitive: PrimitiveType, value: &str) -> bool {
        is_valid(primitive, &PrimitiveValue::from(value))
    }

    #[test]
    fn test_string_formats() {
        assert!(valid(PrimitiveType::Id, "device-request.1"));
        assert!(!valid(PrimitiveType::Id, "has space"));
        assert!(!valid(PrimitiveType::Id, &"a".repeat(65)));

        assert!(valid(PrimitiveType::Code, "order"));
        assert!(valid(PrimitiveType::Code, "two words"));
        assert!(!valid(PrimitiveType::Code, " leading"));

        assert!(valid(PrimitiveType::Oid, "urn:oid:1.2.3"));
        assert!(!valid(PrimitiveType::Oid, "1.2.3"));
        assert!(valid(
            PrimitiveType::Uuid,
            "urn:uuid:0b2f7c1e-3d4f-4b4a-9a57-8f1e2d3c4b5a"
        ));

        assert!(valid(PrimitiveType::Uri, "Patient/1"));
        assert!(!valid(PrimitiveType::Uri, "not a uri"));
        assert!(valid(PrimitiveType::Url, "https://example.org/fhir"));
        assert!(!valid(PrimitiveType::Url, "relative/path"));

        assert!(valid(PrimitiveType::Base64Binary, "aGVsbG8="));
        assert!(!valid(PrimitiveType::Base64Binary, "abc"));
    }

    #[test]
    fn test_date_time_formats() {
        assert!(valid(PrimitiveType::Date, "2024"));
        assert!(valid(PrimitiveType::Date, "2024-02"));
        assert!(valid(PrimitiveType::Date, "2024-02-29"));
        assert!(!valid(PrimitiveType::Date, "2023-02-29"));
        assert!(!valid(PrimitiveType::Date, "2024-13"));

        assert!(valid(PrimitiveType::DateTime, "2024-05-01"));
        assert!(valid(PrimitiveType::DateTime, "2024-05-01T10:30:00Z"));
        assert!(valid(PrimitiveType::DateTime, "2024-05-01T10:30:00.123+02:00"));
        assert!(!valid(PrimitiveType::DateTime, "2024-05-01T10:30:00"));

        assert!(valid(PrimitiveType::Instant, "2024-05-01T10:30:00Z"));
        assert!(!valid(PrimitiveType::Instant, "2024-05-01"));

        assert!(valid(PrimitiveType::Time, "23:59:59"));
        assert!(!valid(PrimitiveType::Time, "24:00:00"));
    }

    #[test]
    fn test_numeric_ranges() {
        assert!(is_valid(PrimitiveType::PositiveInt, &PrimitiveValue::Integer(1)));
        assert!(!is_valid(PrimitiveType::PositiveInt, &PrimitiveValue::Integer(0)));
        assert!(is_valid(PrimitiveType::UnsignedInt, &PrimitiveValue::Integer(0)));
        assert!(!is_valid(PrimitiveType::Integer, &PrimitiveValue::Integer(i64::MAX)));
        assert!(is_valid(PrimitiveType::Integer64, &PrimitiveValue::Integer(i64::MAX)));
        assert!(is_valid(
            PrimitiveType::Decimal,
            &PrimitiveValue::Decimal("-1.50".into())
        ));
        assert!(!is_valid(
            PrimitiveType::Decimal,
            &PrimitiveValue::Decimal("1.".into())
        ));
    }

    #[test]
    fn test_string_length_cap() {
        let long = "x".repeat(MAX_STRING_LENGTH + 1);
        assert!(!valid(PrimitiveType::String, &long));
        assert!(valid(PrimitiveType::String, &long[1..]));
    }

    #[test]
    fn test_wrong_representation_is_type_mismatch() {
        let node = Node::primitive(PrimitiveType::Boolean, "true");
        let err = check(&node, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeMismatch);
        assert_eq!(err.path, "boolean.value");
    }

    #[test]
    fn test_composite_checks_child_formats() {
        let registry = SchemaRegistry::new();
        let coding = registry
            .builder("Coding")
            .unwrap()
            .validating(false)
            .set("system", Node::uri("http://loinc.org"))
            .unwrap()
            .set("code", Node::code("  two  spaces "))
            .unwrap()
            .build()
            .unwrap();

        let err = check(&coding, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrimitive);
        assert_eq!(err.path, "Coding.code");
        assert_eq!(err.field(), Some("code"));
        assert!(check(&coding, false).is_ok());

        let err = registry
            .builder("Coding")
            .unwrap()
            .set("system", Node::uri("not a uri"))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.as_validation().unwrap().path, "Coding.system");
    }

    #[test]
    fn test_resource_id_pattern() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(TypeSchema::new("Task", NodeKind::Resource))
            .unwrap();

        let err = registry
            .builder("Task")
            .unwrap()
            .id(Some("has space".to_string()))
            .build()
            .unwrap_err();
        let err = err.as_validation().unwrap();
        assert_eq!(err.code, ErrorCode::InvalidPrimitive);
        assert_eq!(err.path, "Task.id");

        assert!(
            registry
                .builder("Task")
                .unwrap()
                .id(Some("task-1.a".to_string()))
                .build()
                .is_ok()
        );
        let lenient = BuildConfig::default().with_primitive_format_checks(false);
        assert!(
            registry
                .builder("Task")
                .unwrap()
                .with_config(lenient)
                .id(Some("has space".to_string()))
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_format_skipped_when_disabled() {
        let node = Node::date("yesterday");
        assert!(check(&node, false).is_ok());
        let err = check(&node, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrimitive);
    }
}
