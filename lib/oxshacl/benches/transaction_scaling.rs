use codspeed_criterion_compat::{BenchmarkId, Criterion, criterion_group, criterion_main};
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Dataset, Graph, GraphName, Literal, NamedNode, Quad, Triple};
use oxrdfio::{RdfFormat, RdfParser};
use oxshacl::{ApproachOverride, MemoryStore, ShaclValidator, ValidationSettings};

const SHAPES: &str = r#"
    @prefix sh: <http://www.w3.org/ns/shacl#> .
    @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
    @prefix ex: <http://example.org/> .
    ex:PersonShape a sh:NodeShape ;
        sh:targetClass ex:Person ;
        sh:property [ sh:path ex:name ; sh:minCount 1 ; sh:maxCount 1 ; sh:datatype xsd:string ] ;
        sh:property [ sh:path ex:age ; sh:minInclusive 0 ] ;
        sh:property [ sh:path ex:knows ; sh:class ex:Person ] .
"#;

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.org/{name}"))
}

fn validator() -> ShaclValidator {
    let graph = RdfParser::from_format(RdfFormat::Turtle)
        .for_slice(SHAPES.as_bytes())
        .map(|q| q.map(Triple::from))
        .collect::<Result<Graph, _>>()
        .unwrap();
    ShaclValidator::from_graph(&graph).unwrap()
}

fn person(i: usize) -> [Quad; 4] {
    let person = ex(&format!("person{i}"));
    [
        Quad::new(person.clone(), rdf::TYPE, ex("Person"), GraphName::DefaultGraph),
        Quad::new(
            person.clone(),
            ex("name"),
            Literal::new_simple_literal(format!("Person {i}")),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            person.clone(),
            ex("age"),
            Literal::new_typed_literal((i % 100).to_string(), xsd::INTEGER),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            person,
            ex("knows"),
            ex(&format!("person{}", i / 2)),
            GraphName::DefaultGraph,
        ),
    ]
}

fn store(size: usize) -> MemoryStore {
    MemoryStore::from((0..size).flat_map(person).collect::<Dataset>())
}

/// A small transaction validated against stores of growing sizes.
///
/// The incremental validation cost should not grow with the store.
fn transaction_vs_store_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction vs store size");
    let incremental = validator();
    let sparql = validator().with_settings(
        ValidationSettings::default().with_approach(ApproachOverride::SparqlBased),
    );
    for size in [100, 1_000, 10_000] {
        let mut store = store(size);
        group.bench_with_input(BenchmarkId::new("incremental", size), &size, |b, &size| {
            b.iter(|| {
                let mut transaction = store.transaction();
                transaction.extend(person(size));
                incremental.validate_transaction(&transaction).unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("sparql", size), &size, |b, &size| {
            b.iter(|| {
                let mut transaction = store.transaction();
                transaction.extend(person(size));
                sparql.validate_transaction(&transaction).unwrap()
            })
        });
    }
    group.finish();
}

/// Transactions of growing sizes on a fixed store.
fn transaction_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction size");
    let validator = validator();
    let mut store = store(10_000);
    for size in [1, 10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut transaction = store.transaction();
                transaction.extend((10_000..10_000 + size).flat_map(person));
                validator.validate_transaction(&transaction).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(validation, transaction_vs_store_size, transaction_size);

criterion_main!(validation);
