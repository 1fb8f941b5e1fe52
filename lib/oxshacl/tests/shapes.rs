//! Shapes graph loading and report serialization.
#![cfg(test)]

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Graph, GraphName, Literal, NamedNode, Quad, Triple};
use oxrdfio::{RdfFormat, RdfParser};
use oxshacl::vocab::sh;
use oxshacl::{MemoryStore, ShaclError, ShaclValidator, ShapeError};

const PREFIXES: &str = "
    @prefix sh: <http://www.w3.org/ns/shacl#> .
    @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
    @prefix ex: <http://example.org/> .
";

fn parse_turtle(turtle: &str) -> Graph {
    let mut graph = Graph::new();
    for quad in RdfParser::from_format(RdfFormat::Turtle)
        .for_reader(format!("{PREFIXES}{turtle}").as_bytes())
    {
        graph.insert(&Triple::from(quad.unwrap()));
    }
    graph
}

fn load(shapes: &str) -> Result<ShaclValidator, ShaclError> {
    ShaclValidator::from_graph(&parse_turtle(shapes))
}

#[test]
fn test_load_shapes() {
    let validator = load(
        "
        ex:PersonShape a sh:NodeShape ;
            sh:targetClass ex:Person ;
            sh:property ex:NameShape ;
            sh:or ( ex:A ex:B ) .
        ex:NameShape a sh:PropertyShape ; sh:path ex:name ; sh:minCount 1 .
        ex:A sh:class ex:Student .
        ex:B sh:class ex:Teacher .
    ",
    )
    .unwrap();
    assert_eq!(validator.shapes().len(), 4);
    assert_eq!(validator.shapes().roots().len(), 1);
}

#[test]
fn test_malformed_shapes() {
    assert!(matches!(
        load("ex:S a sh:PropertyShape ; sh:minCount 1 ."),
        Err(ShaclError::Shape(ShapeError::MissingProperty { .. }))
    ));
    assert!(matches!(
        load("ex:S a sh:PropertyShape ; sh:path ex:a, ex:b ."),
        Err(ShaclError::Shape(ShapeError::DuplicateProperty { .. }))
    ));
    assert!(matches!(
        load("ex:S sh:targetNode ex:a ; sh:pattern \"(\" ."),
        Err(ShaclError::Shape(ShapeError::InvalidRegex { .. }))
    ));
    assert!(matches!(
        load("ex:S sh:targetNode ex:a ; sh:maxLength \"long\" ."),
        Err(ShaclError::Shape(ShapeError::InvalidPropertyValue { .. }))
    ));
}

#[test]
fn test_unsupported_features() {
    for shapes in [
        "ex:S sh:targetNode ex:a ; sh:closed true .",
        "ex:S sh:targetNode ex:a ; sh:property [ sh:path ex:p ; sh:lessThan ex:q ] .",
        "ex:S sh:targetNode ex:a ; sh:property [ sh:path ex:p ; sh:disjoint ex:q ] .",
        "ex:S sh:targetNode ex:a ; sh:property [ sh:path [ sh:zeroOrMorePath ex:p ] ; sh:minCount 1 ] .",
        "ex:S sh:targetNode ex:a ; sh:property [ sh:path ( ex:p ex:q ) ; sh:minCount 1 ] .",
        "ex:S sh:targetNode ex:a ; sh:sparql [ sh:select \"SELECT $this WHERE {}\" ] .",
    ] {
        let result = load(shapes);
        assert!(
            matches!(result, Err(ShaclError::Unsupported { .. })),
            "{shapes}: {result:?}"
        );
    }
}

#[test]
fn test_report_graph() {
    let validator = load(
        "
        ex:ValueShape a sh:NodeShape ;
            sh:targetNode ex:a ;
            sh:property [
                sh:path ex:value ;
                sh:or ( [ sh:datatype xsd:string ] [ sh:datatype xsd:integer ] ) ;
                sh:message \"a string or an integer\"
            ] .
    ",
    )
    .unwrap();
    let mut store = MemoryStore::new();
    let mut transaction = store.transaction();
    for quad in RdfParser::from_format(RdfFormat::Turtle)
        .for_reader(format!("{PREFIXES} ex:a ex:value 1.5 .").as_bytes())
    {
        transaction.insert(quad.unwrap());
    }
    let error = transaction.commit(&validator).unwrap_err();
    let report = error.validation_report().unwrap();
    assert_eq!(report.violation_count(), 1);
    assert_eq!(
        report.results()[0].result_message.as_deref(),
        Some("a string or an integer")
    );

    let graph = report.to_graph();
    let reports = graph
        .subjects_for_predicate_object(rdf::TYPE, sh::VALIDATION_REPORT)
        .collect::<Vec<_>>();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        graph.object_for_subject_predicate(reports[0], sh::CONFORMS),
        Some(Literal::new_typed_literal("false", xsd::BOOLEAN).as_ref().into())
    );
    assert_eq!(graph.triples_for_predicate(sh::RESULT).count(), 1);
    assert_eq!(graph.triples_for_predicate(sh::DETAIL).count(), 2);
    assert_eq!(graph.triples_for_predicate(sh::VALUE).count(), 3);
    assert_eq!(
        graph
            .subjects_for_predicate_object(rdf::TYPE, sh::VALIDATION_RESULT)
            .count(),
        3
    );
}

#[test]
fn test_conforming_report_graph() {
    let validator = load("ex:S sh:targetNode ex:a ; sh:nodeKind sh:IRI .").unwrap();
    let mut store = MemoryStore::new();
    let mut transaction = store.transaction();
    transaction.insert(Quad::new(
        NamedNode::new_unchecked("http://example.org/a"),
        rdf::TYPE,
        NamedNode::new_unchecked("http://example.org/Thing"),
        GraphName::DefaultGraph,
    ));
    let report = transaction.commit(&validator).unwrap();
    assert!(report.conforms());
    let graph = report.to_graph();
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.triples_for_predicate(sh::RESULT).count(), 0);
}
