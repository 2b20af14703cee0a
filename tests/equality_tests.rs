mod common;

use common::*;
use octofhir_fhirnode::*;
use std::collections::HashSet;

#[test]
fn test_independent_builds_are_equal() {
    let registry = registry();
    let a = request(&registry);
    let b = request(&registry);

    assert!(!a.ptr_eq(&b));
    assert_eq!(a, b);
    assert_eq!(a.structural_hash(), b.structural_hash());
    assert_eq!(a.fingerprint(), b.fingerprint());

    let set: HashSet<Node> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_single_differences_break_equality() {
    let registry = registry();
    let base = request(&registry);
    let variants = vec![
        base.to_builder().id(Some("x".to_string())).build().unwrap(),
        base.to_builder()
            .set("priority", Node::code("urgent"))
            .unwrap()
            .build()
            .unwrap(),
        base.to_builder()
            .set("intent", Node::code("plan"))
            .unwrap()
            .build()
            .unwrap(),
        base.to_builder()
            .language(Node::code("en"))
            .unwrap()
            .build()
            .unwrap(),
        base.to_builder()
            .extension([extension::simple("http://example.org/e", Node::boolean(true)).unwrap()])
            .build()
            .unwrap(),
        base.to_builder()
            .modifier_extension([
                extension::simple("http://example.org/m", Node::boolean(true)).unwrap(),
            ])
            .unwrap()
            .build()
            .unwrap(),
        base.to_builder()
            .set("occurrence", Node::date_time("2024-01-01"))
            .unwrap()
            .build()
            .unwrap(),
    ];

    for variant in &variants {
        assert_ne!(&base, variant);
        assert_ne!(base.fingerprint(), variant.fingerprint());
    }
}

#[test]
fn test_choice_alternative_type_matters() {
    let registry = registry();
    let a = parameter(&registry, Node::boolean(true));
    let b = parameter(&registry, Node::boolean(true));
    assert_eq!(a, b);

    let as_string = registry
        .builder("DeviceRequest.parameter")
        .unwrap()
        .validating(false)
        .set("code", concept("http://example.org/params", "rate"))
        .unwrap()
        .set("value", Node::string("true"))
        .unwrap()
        .build()
        .unwrap();
    assert_ne!(a, as_string);
}

#[test]
fn test_id_versus_extension_namespace() {
    // An element id and an extension never alias each other
    let with_id = Node::string("v").to_builder().id(Some("a".to_string())).build().unwrap();
    let with_ext = Node::string("v")
        .to_builder()
        .extension([extension::simple("a", Node::string("a")).unwrap()])
        .build()
        .unwrap();
    assert_ne!(with_id, with_ext);
    assert_ne!(with_id, Node::string("v"));
}
