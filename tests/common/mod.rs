use octofhir_fhirnode::*;
use serde_json::{Value, json};

/// DeviceRequest and its parameter backbone, in the shape schema files use
#[allow(dead_code)]
pub fn device_request_schema_json() -> Value {
    json!([
        {
            "name": "DeviceRequest",
            "kind": "resource",
            "description": "Medical device request",
            "fields": [
                { "name": "identifier", "cardinality": "list", "kind": "composite", "type": "Identifier" },
                { "name": "instantiatesUri", "cardinality": "list", "kind": "scalar", "type": "uri" },
                { "name": "status", "kind": "scalar", "type": "code" },
                { "name": "intent", "required": true, "kind": "scalar", "type": "code" },
                { "name": "priority", "kind": "scalar", "type": "code" },
                {
                    "name": "code", "required": true, "kind": "choice",
                    "types": ["Reference", "CodeableConcept"], "targets": ["Device"]
                },
                { "name": "parameter", "cardinality": "list", "kind": "composite", "type": "DeviceRequest.parameter" },
                {
                    "name": "subject", "required": true, "kind": "reference",
                    "targets": ["Patient", "Group", "Location", "Device"]
                },
                {
                    "name": "occurrence", "kind": "choice",
                    "types": ["dateTime", "Period"]
                },
                { "name": "authoredOn", "kind": "scalar", "type": "dateTime" },
                { "name": "reasonCode", "cardinality": "list", "kind": "composite", "type": "CodeableConcept" },
                {
                    "name": "supportingInfo", "cardinality": "list", "kind": "reference",
                    "targets": ["Resource"]
                },
                { "name": "note", "cardinality": "list", "kind": "composite", "type": "Annotation" }
            ]
        },
        {
            "name": "DeviceRequest.parameter",
            "kind": "backbone",
            "fields": [
                { "name": "code", "kind": "composite", "type": "CodeableConcept" },
                {
                    "name": "value", "kind": "choice",
                    "types": ["CodeableConcept", "Quantity", "Range", "boolean"]
                }
            ]
        }
    ])
}

#[allow(dead_code)]
pub fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry
        .load_json_str(&device_request_schema_json().to_string())
        .expect("fixture schema loads");
    registry
}

#[allow(dead_code)]
pub fn concept(system: &str, code: &str) -> Node {
    let coding = SchemaRegistry::new()
        .builder("Coding")
        .and_then(|b| b.set("system", Node::uri(system)))
        .and_then(|b| b.set("code", Node::code(code)))
        .and_then(|b| b.build())
        .expect("coding builds");
    SchemaRegistry::new()
        .builder("CodeableConcept")
        .and_then(|b| b.append("coding", [coding]))
        .and_then(|b| b.build())
        .expect("concept builds")
}

#[allow(dead_code)]
pub fn parameter(registry: &SchemaRegistry, value: Node) -> Node {
    registry
        .builder("DeviceRequest.parameter")
        .and_then(|b| b.set("code", concept("http://example.org/params", "rate")))
        .and_then(|b| b.set("value", value))
        .and_then(|b| b.build())
        .expect("parameter builds")
}

/// A minimal valid request builder: intent, code and subject set
#[allow(dead_code)]
pub fn request_builder(registry: &SchemaRegistry) -> NodeBuilder {
    registry
        .builder("DeviceRequest")
        .and_then(|b| b.set("intent", Node::code("order")))
        .and_then(|b| b.set("code", concept("http://snomed.info/sct", "469616006")))
        .and_then(|b| b.set("subject", reference::literal("Patient/example").unwrap()))
        .expect("request builder")
}

#[allow(dead_code)]
pub fn request(registry: &SchemaRegistry) -> Node {
    request_builder(registry).build().expect("request builds")
}

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
