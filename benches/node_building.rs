use criterion::{Criterion, criterion_group, criterion_main};
use octofhir_fhirnode::*;
use std::hint::black_box;

fn create_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    let mut schema = TypeSchema::new("BenchmarkRequest", NodeKind::Resource)
        .with_field(FieldDescriptor::scalar("status", PrimitiveType::Code).required())
        .with_field(
            FieldDescriptor::reference("subject", &["Patient", "Group"]).required(),
        )
        .with_field(FieldDescriptor::composite("reason", "CodeableConcept").list());

    // Add multiple optional fields
    for i in 0..50 {
        schema = schema.with_field(FieldDescriptor::scalar(
            format!("field{i}"),
            PrimitiveType::String,
        ));
    }
    registry.register(schema).unwrap();
    registry
}

fn create_reason(registry: &SchemaRegistry, i: usize) -> Node {
    let coding = registry
        .builder("Coding")
        .unwrap()
        .set("system", Node::uri("http://snomed.info/sct"))
        .unwrap()
        .set("code", Node::code(format!("{i}")))
        .unwrap()
        .build()
        .unwrap();
    registry
        .builder("CodeableConcept")
        .unwrap()
        .append("coding", [coding])
        .unwrap()
        .build()
        .unwrap()
}

fn build_request(registry: &SchemaRegistry, reasons: &[Node]) -> Node {
    let mut builder = registry
        .builder("BenchmarkRequest")
        .unwrap()
        .set("status", Node::code("active"))
        .unwrap()
        .set("subject", reference::literal("Patient/bench").unwrap())
        .unwrap()
        .append("reason", reasons.iter().cloned())
        .unwrap();
    for i in 0..50 {
        builder = builder
            .set(&format!("field{i}"), Node::string(format!("value {i}")))
            .unwrap();
    }
    builder.build().unwrap()
}

fn bench_build(c: &mut Criterion) {
    let registry = create_registry();
    let reasons: Vec<Node> = (0..20).map(|i| create_reason(&registry, i)).collect();

    c.bench_function("build_validated", |b| {
        b.iter(|| black_box(build_request(&registry, &reasons)))
    });

    let trusted = registry.clone().with_config(BuildConfig::trusted());
    c.bench_function("build_trusted", |b| {
        b.iter(|| black_box(build_request(&trusted, &reasons)))
    });
}

fn bench_validate_tree(c: &mut Criterion) {
    let registry = create_registry();
    let reasons: Vec<Node> = (0..20).map(|i| create_reason(&registry, i)).collect();
    let request = build_request(&registry, &reasons);
    let config = BuildConfig::default();

    c.bench_function("validate_tree", |b| {
        b.iter(|| black_box(validate_tree(&request, &config)).unwrap())
    });
}

fn bench_walk_and_compare(c: &mut Criterion) {
    struct Counter(usize);
    impl Visitor for Counter {
        fn visit(&mut self, _name: &str, _index: Option<usize>, _node: &Node) -> bool {
            self.0 += 1;
            true
        }
    }

    let registry = create_registry();
    let reasons: Vec<Node> = (0..20).map(|i| create_reason(&registry, i)).collect();
    let left = build_request(&registry, &reasons);
    let right = build_request(&registry, &reasons);

    c.bench_function("walk", |b| {
        b.iter(|| {
            let mut counter = Counter(0);
            walk(&left, &mut counter);
            black_box(counter.0)
        })
    });

    c.bench_function("rebuild_and_compare", |b| {
        b.iter(|| black_box(left.to_builder().build().unwrap() == right))
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_validate_tree,
    bench_walk_and_compare
);
criterion_main!(benches);
