//! Shorthands for `Extension` nodes.

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::builder::NodeBuilder;
use crate::error::Result;
use crate::schema::{TypeSchema, builtin};
use crate::types::Node;

static EXTENSION_SCHEMA: Lazy<Arc<TypeSchema>> = Lazy::new(|| Arc::new(builtin::extension()));

/// Builder for an extension with `url` already set. Nested extensions go
/// through [`NodeBuilder::extension`].
pub fn builder(url: &str) -> Result<NodeBuilder> {
    NodeBuilder::new(EXTENSION_SCHEMA.clone()).set("url", Node::uri(url))
}

/// Extension carrying a single `value[x]`
pub fn simple(url: &str, value: Node) -> Result<Node> {
    builder(url)?.set("value", value)?.build()
}

/// Url of an extension node
pub fn url(extension: &Node) -> Option<&str> {
    extension.single("url").and_then(Node::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://example.org/fhir/StructureDefinition/priority-reason";

    #[test]
    fn test_simple_extension() {
        let ext = simple(URL, Node::string("urgent")).unwrap();
        assert_eq!(url(&ext), Some(URL));
        let value = ext.choice("value").unwrap();
        assert_eq!(value.type_name(), "string");
        assert_eq!(value.element_name("value"), "valueString");
    }

    #[test]
    fn test_complex_extension() {
        let part = simple("part", Node::code("a")).unwrap();
        let ext = builder(URL).unwrap().extension([part]).build().unwrap();
        assert_eq!(ext.extension().len(), 1);
        assert!(ext.choice("value").is_none());
        assert_eq!(ext.extensions_by_url("part").count(), 1);
    }
}
