//! Shapes and their loading from a shapes graph.
//!
//! Shapes are stored in an arena, [`Shapes`], and refer to each other with [`ShapeIndex`]es.
//! This makes recursive shapes (a shape reachable from itself through `sh:node`, `sh:property`
//! or a logical constraint) plain data: the loader reserves the slot of a shape before loading
//! the shapes it refers to.

use crate::constraint::{ConstraintComponent, NodeKind};
use crate::error::{ShaclError, ShapeError};
use crate::path::PropertyPath;
use crate::report::Severity;
use crate::target::Target;
use crate::vocab::{rsx, sh};
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{BlankNode, Graph, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, Term};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::fmt;

/// Unique identifier for a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeId {
    /// Named shape (IRI).
    Named(NamedNode),
    /// Anonymous shape (blank node).
    Blank(BlankNode),
}

impl ShapeId {
    pub fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::NamedNode(n) => Some(Self::Named(n.clone())),
            Term::BlankNode(b) => Some(Self::Blank(b.clone())),
            _ => None,
        }
    }

    pub fn to_term(&self) -> Term {
        match self {
            Self::Named(n) => n.clone().into(),
            Self::Blank(b) => b.clone().into(),
        }
    }

    pub fn as_named(&self) -> Option<&NamedNode> {
        match self {
            Self::Named(n) => Some(n),
            Self::Blank(_) => None,
        }
    }
}

impl From<NamedNode> for ShapeId {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for ShapeId {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

impl From<NamedOrBlankNode> for ShapeId {
    fn from(node: NamedOrBlankNode) -> Self {
        match node {
            NamedOrBlankNode::NamedNode(n) => Self::Named(n),
            NamedOrBlankNode::BlankNode(b) => Self::Blank(b),
        }
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => write!(f, "<{}>", n.as_str()),
            Self::Blank(b) => write!(f, "_:{}", b.as_str()),
        }
    }
}

/// Position of a shape in its [`Shapes`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeIndex(usize);

impl ShapeIndex {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ShapeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Node,
    Property(PropertyPath),
}

/// A node or property shape.
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Target declarations. Only the shapes with targets are validated on their own.
    pub targets: Vec<Target>,
    pub components: Vec<ConstraintComponent>,
    /// The `sh:property` shapes.
    pub properties: Vec<ShapeIndex>,
    pub severity: Severity,
    pub message: Option<String>,
    pub name: Option<String>,
    /// A deactivated shape never produces violations.
    pub deactivated: bool,
}

impl Shape {
    fn new(id: ShapeId) -> Self {
        Self {
            id,
            kind: ShapeKind::Node,
            targets: Vec::new(),
            components: Vec::new(),
            properties: Vec::new(),
            severity: Severity::Violation,
            message: None,
            name: None,
            deactivated: false,
        }
    }

    /// The path of a property shape.
    pub fn path(&self) -> Option<&PropertyPath> {
        match &self.kind {
            ShapeKind::Node => None,
            ShapeKind::Property(path) => Some(path),
        }
    }

    pub fn is_property_shape(&self) -> bool {
        matches!(self.kind, ShapeKind::Property(_))
    }
}

/// All the shapes of a shapes graph.
#[derive(Debug, Clone, Default)]
pub struct Shapes {
    shapes: Vec<Shape>,
    index: FxHashMap<ShapeId, ShapeIndex>,
    roots: Vec<ShapeIndex>,
}

impl Shapes {
    /// Loads the shapes of a graph.
    ///
    /// Shapes are the instances of `sh:NodeShape` and `sh:PropertyShape`, the subjects of target
    /// declarations and the shapes referred to by them.
    /// Loading fails on the first malformed shape or on the first feature the engine can't validate.
    pub fn from_graph(graph: &Graph) -> Result<Self, ShaclError> {
        let mut candidates = Vec::new();
        for class in [sh::NODE_SHAPE, sh::PROPERTY_SHAPE] {
            candidates.extend(
                graph
                    .subjects_for_predicate_object(rdf::TYPE, class)
                    .map(|s| s.into_owned()),
            );
        }
        for predicate in [
            sh::TARGET_CLASS,
            sh::TARGET_NODE,
            sh::TARGET_SUBJECTS_OF,
            sh::TARGET_OBJECTS_OF,
            sh::TARGET,
            rsx::COMPOUND_TARGET,
        ] {
            candidates.extend(
                graph
                    .triples_for_predicate(predicate)
                    .map(|t| t.subject.into_owned()),
            );
        }
        let mut candidates = candidates
            .into_iter()
            .map(Term::from)
            .collect::<Vec<_>>();
        candidates.sort_by_cached_key(Term::to_string);
        candidates.dedup();

        let mut loader = Loader {
            graph,
            shapes: Self::default(),
        };
        for candidate in &candidates {
            loader.load(candidate)?;
        }
        let mut shapes = loader.shapes;
        shapes.roots = shapes
            .shapes
            .iter()
            .enumerate()
            .filter(|(_, shape)| !shape.targets.is_empty() && !shape.deactivated)
            .map(|(i, _)| ShapeIndex(i))
            .collect();
        tracing::debug!(
            shapes = shapes.shapes.len(),
            roots = shapes.roots.len(),
            "loaded shapes graph"
        );
        Ok(shapes)
    }

    /// The shape at `index`.
    ///
    /// Indices are only handed out by the arena itself, so they are always in range.
    pub fn shape(&self, index: ShapeIndex) -> &Shape {
        &self.shapes[index.0]
    }

    pub fn get(&self, id: &ShapeId) -> Option<&Shape> {
        self.index.get(id).map(|i| self.shape(*i))
    }

    pub fn index_of(&self, id: &ShapeId) -> Option<ShapeIndex> {
        self.index.get(id).copied()
    }

    /// The shapes with targets, validated on their own.
    pub fn roots(&self) -> &[ShapeIndex] {
        &self.roots
    }

    pub fn all(&self) -> impl Iterator<Item = (ShapeIndex, &Shape)> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| (ShapeIndex(i), shape))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

struct Loader<'g> {
    graph: &'g Graph,
    shapes: Shapes,
}

impl Loader<'_> {
    /// Loads the shape `node` if not already done.
    fn load(&mut self, node: &Term) -> Result<ShapeIndex, ShaclError> {
        let Some(id) = ShapeId::from_term(node) else {
            return Err(ShapeError::invalid_shape(
                node.clone(),
                "a shape must be an IRI or a blank node",
            )
            .into());
        };
        if let Some(index) = self.shapes.index.get(&id) {
            return Ok(*index);
        }
        let index = ShapeIndex(self.shapes.shapes.len());
        self.shapes.shapes.push(Shape::new(id.clone()));
        self.shapes.index.insert(id.clone(), index);
        let shape = self.parse(id, node)?;
        self.shapes.shapes[index.0] = shape;
        Ok(index)
    }

    fn parse(&mut self, id: ShapeId, node: &Term) -> Result<Shape, ShaclError> {
        let graph = self.graph;
        for unsupported in [
            sh::SPARQL,
            sh::TARGET,
            sh::EQUALS,
            sh::LESS_THAN_OR_EQUALS,
            sh::QUALIFIED_VALUE_SHAPE,
        ] {
            if object_of(graph, node, unsupported).is_some() {
                return Err(ShaclError::unsupported(
                    unsupported.as_str(),
                    Some(node.clone()),
                ));
            }
        }

        let mut shape = Shape::new(id);
        if let Some(path) = single(graph, node, sh::PATH)? {
            let path = PropertyPath::parse(graph, path.as_ref())?;
            path.ensure_supported(node)?;
            shape.kind = ShapeKind::Property(path);
        } else if has_type(graph, node, sh::PROPERTY_SHAPE) {
            return Err(ShapeError::missing_property(node.clone(), sh::PATH).into());
        }

        self.parse_targets(node, &mut shape)?;
        self.parse_components(node, &mut shape)?;
        for property in objects_of(graph, node, sh::PROPERTY) {
            let index = self.load(&property)?;
            if !self.shapes.shape(index).is_property_shape() {
                return Err(ShapeError::missing_property(property, sh::PATH).into());
            }
            shape.properties.push(index);
        }

        shape.deactivated = boolean(graph, node, sh::DEACTIVATED)?.unwrap_or(false);
        if let Some(severity) = single(graph, node, sh::SEVERITY)? {
            shape.severity = match &severity {
                Term::NamedNode(iri) => Severity::from_iri(iri.as_ref()),
                _ => None,
            }
            .ok_or_else(|| {
                ShapeError::invalid_property_value(
                    node.clone(),
                    sh::SEVERITY,
                    "sh:Violation, sh:Warning or sh:Info",
                    severity.clone(),
                )
            })?;
        }
        shape.message = string(graph, node, sh::MESSAGE)?;
        shape.name = string(graph, node, sh::NAME)?;
        Ok(shape)
    }

    fn parse_targets(&self, node: &Term, shape: &mut Shape) -> Result<(), ShaclError> {
        let graph = self.graph;
        let mut classes = objects_of(graph, node, sh::TARGET_CLASS)
            .into_iter()
            .map(|class| named_node(node, sh::TARGET_CLASS, class))
            .collect::<Result<Vec<_>, _>>()?;
        if let Term::NamedNode(iri) = node {
            if has_type(graph, node, rdfs::CLASS)
                && (has_type(graph, node, sh::NODE_SHAPE) || has_type(graph, node, sh::PROPERTY_SHAPE))
            {
                classes.push(iri.clone());
            }
        }
        if !classes.is_empty() {
            classes.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
            classes.dedup();
            shape.targets.push(Target::Class(classes));
        }
        let nodes = objects_of(graph, node, sh::TARGET_NODE);
        if !nodes.is_empty() {
            shape.targets.push(Target::Node(nodes));
        }
        for predicate in objects_of(graph, node, sh::TARGET_SUBJECTS_OF) {
            shape.targets.push(Target::SubjectsOf(named_node(
                node,
                sh::TARGET_SUBJECTS_OF,
                predicate,
            )?));
        }
        for predicate in objects_of(graph, node, sh::TARGET_OBJECTS_OF) {
            shape.targets.push(Target::ObjectsOf(named_node(
                node,
                sh::TARGET_OBJECTS_OF,
                predicate,
            )?));
        }
        for compound in objects_of(graph, node, rsx::COMPOUND_TARGET) {
            let predicate = single(graph, &compound, rsx::TARGET_PREDICATE)?
                .ok_or_else(|| ShapeError::missing_property(node.clone(), rsx::TARGET_PREDICATE))?;
            let class = single(graph, &compound, rsx::TARGET_CLASS)?
                .ok_or_else(|| ShapeError::missing_property(node.clone(), rsx::TARGET_CLASS))?;
            shape.targets.push(Target::Compound {
                predicate: named_node(node, rsx::TARGET_PREDICATE, predicate)?,
                class: named_node(node, rsx::TARGET_CLASS, class)?,
            });
        }
        Ok(())
    }

    fn parse_components(&mut self, node: &Term, shape: &mut Shape) -> Result<(), ShaclError> {
        let graph = self.graph;
        let is_property_shape = shape.is_property_shape();
        let components = &mut shape.components;

        for class in objects_of(graph, node, sh::CLASS) {
            components.push(ConstraintComponent::Class(named_node(
                node,
                sh::CLASS,
                class,
            )?));
        }
        if let Some(datatype) = single(graph, node, sh::DATATYPE)? {
            components.push(ConstraintComponent::Datatype(named_node(
                node,
                sh::DATATYPE,
                datatype,
            )?));
        }
        if let Some(kind) = single(graph, node, sh::NODE_KIND)? {
            let parsed = match &kind {
                Term::NamedNode(iri) => NodeKind::from_iri(iri.as_ref()),
                _ => None,
            };
            components.push(ConstraintComponent::NodeKind(parsed.ok_or_else(|| {
                ShapeError::invalid_property_value(node.clone(), sh::NODE_KIND, "a node kind", kind)
            })?));
        }

        let cardinality = [
            (sh::MIN_COUNT, ConstraintComponent::MinCount as fn(u64) -> ConstraintComponent),
            (sh::MAX_COUNT, ConstraintComponent::MaxCount),
        ];
        for (predicate, build) in cardinality {
            if let Some(count) = integer(graph, node, predicate)? {
                if !is_property_shape {
                    return Err(ShapeError::invalid_shape(
                        node.clone(),
                        format!("{predicate} is only allowed on property shapes"),
                    )
                    .into());
                }
                components.push(build(count));
            }
        }

        let ranges = [
            (sh::MIN_EXCLUSIVE, ConstraintComponent::MinExclusive as fn(Literal) -> ConstraintComponent),
            (sh::MAX_EXCLUSIVE, ConstraintComponent::MaxExclusive),
            (sh::MIN_INCLUSIVE, ConstraintComponent::MinInclusive),
            (sh::MAX_INCLUSIVE, ConstraintComponent::MaxInclusive),
        ];
        for (predicate, build) in ranges {
            if let Some(bound) = single(graph, node, predicate)? {
                let Term::Literal(bound) = bound else {
                    return Err(ShapeError::invalid_property_value(
                        node.clone(),
                        predicate,
                        "a literal",
                        bound,
                    )
                    .into());
                };
                components.push(build(bound));
            }
        }

        if let Some(length) = integer(graph, node, sh::MIN_LENGTH)? {
            components.push(ConstraintComponent::MinLength(length));
        }
        if let Some(length) = integer(graph, node, sh::MAX_LENGTH)? {
            components.push(ConstraintComponent::MaxLength(length));
        }

        let patterns = objects_of(graph, node, sh::PATTERN);
        if !patterns.is_empty() {
            let flags = string(graph, node, sh::FLAGS)?;
            for pattern in patterns {
                let Term::Literal(pattern) = pattern else {
                    return Err(ShapeError::invalid_property_value(
                        node.clone(),
                        sh::PATTERN,
                        "a string literal",
                        pattern,
                    )
                    .into());
                };
                let pattern = pattern.value().to_owned();
                let regex = compile_pattern(&pattern, flags.as_deref())?;
                components.push(ConstraintComponent::Pattern {
                    pattern,
                    flags: flags.clone(),
                    regex,
                });
            }
        }

        if let Some(list) = single(graph, node, sh::LANGUAGE_IN)? {
            let ranges = parse_list(graph, list, node)?
                .into_iter()
                .map(|item| match item {
                    Term::Literal(literal) => Ok(literal.value().to_owned()),
                    other => Err(ShapeError::invalid_property_value(
                        node.clone(),
                        sh::LANGUAGE_IN,
                        "a list of string literals",
                        other,
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            components.push(ConstraintComponent::LanguageIn(ranges));
        }
        if boolean(graph, node, sh::UNIQUE_LANG)?.unwrap_or(false) {
            if !is_property_shape {
                return Err(ShapeError::invalid_shape(
                    node.clone(),
                    "sh:uniqueLang is only allowed on property shapes",
                )
                .into());
            }
            components.push(ConstraintComponent::UniqueLang);
        }
        if let Some(list) = single(graph, node, sh::IN)? {
            components.push(ConstraintComponent::In(parse_list(graph, list, node)?));
        }
        for value in objects_of(graph, node, sh::HAS_VALUE) {
            components.push(ConstraintComponent::HasValue(value));
        }

        for (predicate, build) in [
            (sh::AND, ConstraintComponent::And as fn(Vec<ShapeIndex>) -> ConstraintComponent),
            (sh::OR, ConstraintComponent::Or),
            (sh::XONE, ConstraintComponent::Xone),
        ] {
            for list in objects_of(graph, node, predicate) {
                let mut children = Vec::new();
                for child in parse_list(graph, list, node)? {
                    children.push(self.load(&child)?);
                }
                components.push(build(children));
            }
        }
        for child in objects_of(graph, node, sh::NOT) {
            components.push(ConstraintComponent::Not(self.load(&child)?));
        }
        for child in objects_of(graph, node, sh::NODE) {
            components.push(ConstraintComponent::Node(self.load(&child)?));
        }

        if boolean(graph, node, sh::CLOSED)?.unwrap_or(false) {
            let ignored_properties = match single(graph, node, sh::IGNORED_PROPERTIES)? {
                Some(list) => parse_list(graph, list, node)?
                    .into_iter()
                    .map(|p| named_node(node, sh::IGNORED_PROPERTIES, p))
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            components.push(ConstraintComponent::Closed { ignored_properties });
        }
        for property in objects_of(graph, node, sh::DISJOINT) {
            components.push(ConstraintComponent::Disjoint(named_node(
                node,
                sh::DISJOINT,
                property,
            )?));
        }
        for property in objects_of(graph, node, sh::LESS_THAN) {
            components.push(ConstraintComponent::LessThan(named_node(
                node,
                sh::LESS_THAN,
                property,
            )?));
        }

        for component in &shape.components {
            if matches!(
                component,
                ConstraintComponent::Closed { .. }
                    | ConstraintComponent::Disjoint(_)
                    | ConstraintComponent::LessThan(_)
            ) {
                return Err(ShaclError::unsupported(
                    component.source_constraint_component().to_string(),
                    Some(node.clone()),
                ));
            }
        }
        Ok(())
    }
}

/// Compiles a `sh:pattern` with its `sh:flags`.
fn compile_pattern(pattern: &str, flags: Option<&str>) -> Result<Regex, ShapeError> {
    let mut inline = String::new();
    for flag in flags.unwrap_or_default().chars() {
        match flag {
            'i' | 'm' | 's' | 'x' => {
                if !inline.contains(flag) {
                    inline.push(flag);
                }
            }
            _ => {
                return Err(ShapeError::invalid_regex(
                    pattern,
                    format!("unsupported flag '{flag}'"),
                ));
            }
        }
    }
    let full = if inline.is_empty() {
        pattern.to_owned()
    } else {
        format!("(?{inline}){pattern}")
    };
    Regex::new(&full).map_err(|e| ShapeError::invalid_regex(pattern, e.to_string()))
}

fn has_type(graph: &Graph, node: &Term, class: NamedNodeRef<'_>) -> bool {
    objects_of(graph, node, rdf::TYPE)
        .iter()
        .any(|t| matches!(t, Term::NamedNode(n) if n.as_ref() == class))
}

fn named_node(
    shape: &Term,
    property: NamedNodeRef<'_>,
    value: Term,
) -> Result<NamedNode, ShapeError> {
    match value {
        Term::NamedNode(node) => Ok(node),
        other => Err(ShapeError::invalid_property_value(
            shape.clone(),
            property,
            "an IRI",
            other,
        )),
    }
}

/// The value of a single-valued property.
fn single(
    graph: &Graph,
    subject: &Term,
    predicate: NamedNodeRef<'_>,
) -> Result<Option<Term>, ShapeError> {
    let mut objects = objects_of(graph, subject, predicate).into_iter();
    let first = objects.next();
    if objects.next().is_some() {
        return Err(ShapeError::duplicate_property(subject.clone(), predicate));
    }
    Ok(first)
}

fn integer(
    graph: &Graph,
    subject: &Term,
    predicate: NamedNodeRef<'_>,
) -> Result<Option<u64>, ShapeError> {
    let Some(value) = single(graph, subject, predicate)? else {
        return Ok(None);
    };
    match &value {
        Term::Literal(literal) => literal.value().trim().parse().map(Some).ok(),
        _ => None,
    }
    .ok_or_else(|| {
        ShapeError::invalid_property_value(
            subject.clone(),
            predicate,
            "a non-negative integer",
            value.clone(),
        )
    })
}

fn boolean(
    graph: &Graph,
    subject: &Term,
    predicate: NamedNodeRef<'_>,
) -> Result<Option<bool>, ShapeError> {
    let Some(value) = single(graph, subject, predicate)? else {
        return Ok(None);
    };
    match &value {
        Term::Literal(literal) => match literal.value() {
            "true" | "1" => Some(Some(true)),
            "false" | "0" => Some(Some(false)),
            _ => None,
        },
        _ => None,
    }
    .ok_or_else(|| {
        ShapeError::invalid_property_value(subject.clone(), predicate, "a boolean", value.clone())
    })
}

fn string(
    graph: &Graph,
    subject: &Term,
    predicate: NamedNodeRef<'_>,
) -> Result<Option<String>, ShapeError> {
    match single(graph, subject, predicate)? {
        None => Ok(None),
        Some(Term::Literal(literal)) => Ok(Some(literal.value().to_owned())),
        Some(other) => Err(ShapeError::invalid_property_value(
            subject.clone(),
            predicate,
            "a literal",
            other,
        )),
    }
}

pub(crate) fn object_of(
    graph: &Graph,
    subject: &Term,
    predicate: NamedNodeRef<'_>,
) -> Option<Term> {
    match subject {
        Term::NamedNode(n) => graph
            .object_for_subject_predicate(n, predicate)
            .map(|t| t.into_owned()),
        Term::BlankNode(b) => graph
            .object_for_subject_predicate(b, predicate)
            .map(|t| t.into_owned()),
        _ => None,
    }
}

pub(crate) fn objects_of(graph: &Graph, subject: &Term, predicate: NamedNodeRef<'_>) -> Vec<Term> {
    let mut objects = match subject {
        Term::NamedNode(n) => graph
            .objects_for_subject_predicate(n, predicate)
            .map(|t| t.into_owned())
            .collect(),
        Term::BlankNode(b) => graph
            .objects_for_subject_predicate(b, predicate)
            .map(|t| t.into_owned())
            .collect(),
        _ => Vec::new(),
    };
    objects.sort_by_cached_key(Term::to_string);
    objects
}

/// Reads an RDF list.
pub(crate) fn parse_list(graph: &Graph, head: Term, shape: &Term) -> Result<Vec<Term>, ShapeError> {
    let mut items = Vec::new();
    let mut visited = Vec::new();
    let mut current = head;
    loop {
        if matches!(&current, Term::NamedNode(n) if n.as_ref() == rdf::NIL) {
            return Ok(items);
        }
        if visited.contains(&current) {
            return Err(ShapeError::invalid_rdf_list(shape.clone(), "cyclic list"));
        }
        let first = object_of(graph, &current, rdf::FIRST)
            .ok_or_else(|| ShapeError::invalid_rdf_list(shape.clone(), "missing rdf:first"))?;
        let rest = object_of(graph, &current, rdf::REST)
            .ok_or_else(|| ShapeError::invalid_rdf_list(shape.clone(), "missing rdf:rest"))?;
        items.push(first);
        visited.push(current);
        current = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Triple;

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.org/{name}"))
    }

    fn person_shape() -> Graph {
        let mut graph = Graph::new();
        let property = BlankNode::default();
        graph.insert(&Triple::new(ex("PersonShape"), rdf::TYPE, sh::NODE_SHAPE));
        graph.insert(&Triple::new(ex("PersonShape"), sh::TARGET_CLASS, ex("Person")));
        graph.insert(&Triple::new(ex("PersonShape"), sh::PROPERTY, property.clone()));
        graph.insert(&Triple::new(property.clone(), sh::PATH, ex("name")));
        graph.insert(&Triple::new(
            property,
            sh::MIN_COUNT,
            Literal::from(1),
        ));
        graph
    }

    #[test]
    fn test_empty_shapes_graph() {
        let shapes = Shapes::from_graph(&Graph::new()).unwrap();
        assert!(shapes.is_empty());
        assert!(shapes.roots().is_empty());
    }

    #[test]
    fn test_load_node_shape_with_property() {
        let shapes = Shapes::from_graph(&person_shape()).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes.roots().len(), 1);
        let root = shapes.shape(shapes.roots()[0]);
        assert_eq!(root.id, ShapeId::Named(ex("PersonShape")));
        assert_eq!(root.targets, vec![Target::Class(vec![ex("Person")])]);
        let property = shapes.shape(root.properties[0]);
        assert_eq!(property.path(), Some(&PropertyPath::predicate(ex("name"))));
        assert!(matches!(
            property.components.as_slice(),
            [ConstraintComponent::MinCount(1)]
        ));
    }

    #[test]
    fn test_duplicate_single_valued_property() {
        let mut graph = person_shape();
        graph.insert(&Triple::new(ex("PersonShape"), sh::DATATYPE, ex("a")));
        graph.insert(&Triple::new(ex("PersonShape"), sh::DATATYPE, ex("b")));
        assert!(matches!(
            Shapes::from_graph(&graph),
            Err(ShaclError::Shape(ShapeError::DuplicateProperty { .. }))
        ));
    }

    #[test]
    fn test_property_shape_without_path() {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(ex("S"), rdf::TYPE, sh::PROPERTY_SHAPE));
        assert!(matches!(
            Shapes::from_graph(&graph),
            Err(ShaclError::Shape(ShapeError::MissingProperty { .. }))
        ));
    }

    #[test]
    fn test_min_count_on_node_shape() {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(ex("S"), sh::TARGET_NODE, ex("a")));
        graph.insert(&Triple::new(ex("S"), sh::MIN_COUNT, Literal::from(1)));
        assert!(matches!(
            Shapes::from_graph(&graph),
            Err(ShaclError::Shape(ShapeError::InvalidShape { .. }))
        ));
    }

    #[test]
    fn test_unsupported_features() {
        let mut graph = person_shape();
        graph.insert(&Triple::new(ex("PersonShape"), sh::CLOSED, Literal::from(true)));
        assert!(matches!(
            Shapes::from_graph(&graph),
            Err(ShaclError::Unsupported { .. })
        ));

        let mut graph = person_shape();
        let path = BlankNode::default();
        graph.insert(&Triple::new(ex("P"), sh::PATH, path.clone()));
        graph.insert(&Triple::new(path, sh::ZERO_OR_MORE_PATH, ex("knows")));
        graph.insert(&Triple::new(ex("PersonShape"), sh::PROPERTY, ex("P")));
        assert!(matches!(
            Shapes::from_graph(&graph),
            Err(ShaclError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_self_referential_shape() {
        let mut graph = Graph::new();
        let property = BlankNode::default();
        graph.insert(&Triple::new(ex("PersonShape"), sh::TARGET_CLASS, ex("Person")));
        graph.insert(&Triple::new(ex("PersonShape"), sh::PROPERTY, property.clone()));
        graph.insert(&Triple::new(property.clone(), sh::PATH, ex("knows")));
        graph.insert(&Triple::new(property, sh::NODE, ex("PersonShape")));
        let shapes = Shapes::from_graph(&graph).unwrap();
        let root_index = shapes.index_of(&ShapeId::Named(ex("PersonShape"))).unwrap();
        let property = shapes.shape(shapes.shape(root_index).properties[0]);
        assert!(matches!(
            property.components.as_slice(),
            [ConstraintComponent::Node(index)] if *index == root_index
        ));
    }

    #[test]
    fn test_pattern_flags() {
        let regex = compile_pattern("^abc$", Some("i")).unwrap();
        assert!(regex.is_match("ABC"));
        compile_pattern("abc", Some("q")).unwrap_err();
        compile_pattern("(", None).unwrap_err();
    }

    #[test]
    fn test_implicit_class_target_and_compound_target() {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(ex("Person"), rdf::TYPE, sh::NODE_SHAPE));
        graph.insert(&Triple::new(ex("Person"), rdf::TYPE, rdfs::CLASS));
        let compound = BlankNode::default();
        graph.insert(&Triple::new(ex("Other"), rsx::COMPOUND_TARGET, compound.clone()));
        graph.insert(&Triple::new(compound.clone(), rsx::TARGET_PREDICATE, ex("worksFor")));
        graph.insert(&Triple::new(compound, rsx::TARGET_CLASS, ex("Company")));
        let shapes = Shapes::from_graph(&graph).unwrap();
        assert_eq!(shapes.roots().len(), 2);
        assert_eq!(
            shapes.get(&ShapeId::Named(ex("Person"))).unwrap().targets,
            vec![Target::Class(vec![ex("Person")])]
        );
        assert_eq!(
            shapes.get(&ShapeId::Named(ex("Other"))).unwrap().targets,
            vec![Target::Compound {
                predicate: ex("worksFor"),
                class: ex("Company")
            }]
        );
    }
}
