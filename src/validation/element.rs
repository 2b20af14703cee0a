use super::{CheckResult, local_error};
use crate::error::ViolationKind;
use crate::types::{Node, NodeKind};

/// dom-2: a contained resource must not contain other resources
pub fn check_nested_contained(node: &Node) -> CheckResult {
    match node.contained().iter().position(|c| !c.contained().is_empty()) {
        Some(index) => Err(local_error(
            node.type_name(),
            ViolationKind::NestedContained { index },
        )),
        None => Ok(()),
    }
}

/// ele-1: every element must have a value or children. Resources are exempt.
pub fn check_value_or_children(node: &Node) -> CheckResult {
    if node.kind() == NodeKind::Resource || node.has_value() || node.has_children() {
        return Ok(());
    }
    Err(local_error(
        node.type_name(),
        ViolationKind::EmptyElement {
            type_name: node.type_name().to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NodeBuilder;
    use crate::error::ErrorCode;
    use crate::schema::SchemaRegistry;
    use crate::types::PrimitiveType;

    #[test]
    fn test_empty_element_detected() {
        let registry = SchemaRegistry::new();
        let empty = registry.builder("Coding").unwrap().build().unwrap();
        let err = check_value_or_children(&empty).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyElement);

        let id_only = NodeBuilder::primitive(PrimitiveType::String)
            .id(Some("s1".to_string()))
            .build()
            .unwrap();
        assert!(check_value_or_children(&id_only).is_err());

        assert!(check_value_or_children(&Node::string("x")).is_ok());
    }
}
