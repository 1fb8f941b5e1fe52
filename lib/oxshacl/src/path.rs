//! SHACL property paths.
//!
//! All the path kinds of the SHACL specification are parsed so that shapes using them are
//! reported precisely, but the incremental engine only evaluates predicate paths and inverse
//! predicate paths. See [`PropertyPath::ensure_supported`].

use crate::connections::{ConnectionsGroup, PlanKey, StatementPattern, StatementView};
use crate::error::{ShaclError, ShapeError};
use crate::plan::{Projection, Sort, Sorted, UnorderedSelect};
use crate::shape::{object_of, parse_list};
use crate::vocab::sh;
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Graph, NamedNode, NamedNodeRef, Term, TermRef, Triple};
use std::fmt;

/// A SHACL property path, displayed with the SPARQL property path syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyPath {
    Predicate(NamedNode),
    /// `p1 / p2`, at least two elements.
    Sequence(Vec<PropertyPath>),
    /// `sh:alternativePath`
    Alternative(Vec<PropertyPath>),
    /// `sh:inversePath`
    Inverse(Box<PropertyPath>),
    ZeroOrMore(Box<PropertyPath>),
    OneOrMore(Box<PropertyPath>),
    ZeroOrOne(Box<PropertyPath>),
}

impl PropertyPath {
    pub fn predicate(predicate: impl Into<NamedNode>) -> Self {
        Self::Predicate(predicate.into())
    }

    pub fn sequence(paths: Vec<PropertyPath>) -> Self {
        Self::Sequence(paths)
    }

    pub fn inverse(path: PropertyPath) -> Self {
        Self::Inverse(Box::new(path))
    }

    pub fn zero_or_more(path: PropertyPath) -> Self {
        Self::ZeroOrMore(Box::new(path))
    }

    pub fn one_or_more(path: PropertyPath) -> Self {
        Self::OneOrMore(Box::new(path))
    }

    pub fn zero_or_one(path: PropertyPath) -> Self {
        Self::ZeroOrOne(Box::new(path))
    }

    /// Parses the value of a `sh:path` statement.
    pub fn parse(graph: &Graph, term: TermRef<'_>) -> Result<Self, ShapeError> {
        match term {
            TermRef::NamedNode(node) => Ok(Self::Predicate(node.into_owned())),
            TermRef::BlankNode(bnode) => {
                let node: Term = bnode.into_owned().into();
                if let Some(list) = object_of(graph, &node, sh::ALTERNATIVE_PATH) {
                    return Ok(Self::Alternative(Self::parse_all(graph, list, &node)?));
                }
                for (predicate, build) in [
                    (sh::INVERSE_PATH, Self::inverse as fn(Self) -> Self),
                    (sh::ZERO_OR_MORE_PATH, Self::zero_or_more),
                    (sh::ONE_OR_MORE_PATH, Self::one_or_more),
                    (sh::ZERO_OR_ONE_PATH, Self::zero_or_one),
                ] {
                    if let Some(inner) = object_of(graph, &node, predicate) {
                        return Ok(build(Self::parse(graph, inner.as_ref())?));
                    }
                }
                if object_of(graph, &node, rdf::FIRST).is_some() {
                    let paths = Self::parse_all(graph, node.clone(), &node)?;
                    if paths.len() >= 2 {
                        return Ok(Self::Sequence(paths));
                    }
                }
                Err(ShapeError::invalid_shape(
                    node,
                    "unknown property path structure",
                ))
            }
            _ => Err(ShapeError::invalid_shape(
                term.into_owned(),
                "a property path must be an IRI or a blank node",
            )),
        }
    }

    fn parse_all(graph: &Graph, list: Term, shape: &Term) -> Result<Vec<Self>, ShapeError> {
        parse_list(graph, list, shape)?
            .iter()
            .map(|item| Self::parse(graph, item.as_ref()))
            .collect()
    }

    /// The predicate of a predicate path or of an inverse predicate path, with the inversion flag.
    pub fn as_simple(&self) -> Option<(&NamedNode, bool)> {
        match self {
            Self::Predicate(p) => Some((p, false)),
            Self::Inverse(inner) => match inner.as_ref() {
                Self::Predicate(p) => Some((p, true)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Fails on the paths the incremental engine can't evaluate.
    pub fn ensure_supported(&self, shape: &Term) -> Result<(), ShaclError> {
        if self.as_simple().is_some() {
            Ok(())
        } else {
            Err(ShaclError::unsupported(
                format!("property path {self}"),
                Some(shape.clone()),
            ))
        }
    }

    /// All the predicates appearing in the path.
    pub fn predicates(&self) -> Vec<NamedNode> {
        let mut predicates = Vec::new();
        self.collect_predicates(&mut predicates);
        predicates
    }

    fn collect_predicates(&self, predicates: &mut Vec<NamedNode>) {
        match self {
            Self::Predicate(p) => {
                if !predicates.contains(p) {
                    predicates.push(p.clone());
                }
            }
            Self::Sequence(paths) | Self::Alternative(paths) => {
                for path in paths {
                    path.collect_predicates(predicates);
                }
            }
            Self::Inverse(inner)
            | Self::ZeroOrMore(inner)
            | Self::OneOrMore(inner)
            | Self::ZeroOrOne(inner) => inner.collect_predicates(predicates),
        }
    }

    /// SPARQL triple pattern linking `?subject` to `?value` through the path.
    pub fn query_fragment(&self, subject: &str, value: &str) -> String {
        match self.as_simple() {
            Some((predicate, false)) => format!("?{subject} {predicate} ?{value} ."),
            Some((predicate, true)) => format!("?{value} {predicate} ?{subject} ."),
            None => format!("?{subject} {self} ?{value} ."),
        }
    }

    fn simple(&self) -> Result<(&NamedNode, bool), ShaclError> {
        self.as_simple()
            .ok_or_else(|| ShaclError::unsupported(format!("property path {self}"), None))
    }

    /// All `[start, value=end]` pairs of the path in `view`, ordered by start node.
    pub fn scan_plan<'a>(
        &self,
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
    ) -> Result<Sorted<'a>, ShaclError> {
        let (predicate, inverse) = self.simple()?;
        let pattern = StatementPattern::new().with_predicate(predicate.clone());
        let projection = if inverse {
            Projection::ObjectSubject
        } else {
            Projection::SubjectObject
        };
        connections.cached(
            PlanKey::PathEdges {
                view,
                path: self.clone(),
            },
            || {
                Ok(Sort::new(Box::new(UnorderedSelect::new(
                    connections,
                    view,
                    pattern,
                    projection,
                ))))
            },
        )
    }

    /// The nodes reached from `node` through the path in `view`.
    pub fn values_of(
        &self,
        connections: &ConnectionsGroup<'_>,
        view: StatementView,
        node: &Term,
    ) -> Result<Vec<Term>, ShaclError> {
        let (predicate, inverse) = self.simple()?;
        let pattern = StatementPattern::new().with_predicate(predicate.clone());
        if inverse {
            connections
                .scan(view, &pattern.with_object(node.clone()))?
                .map(|quad| Ok(quad?.subject.into()))
                .collect()
        } else if node.is_literal() {
            Ok(Vec::new())
        } else {
            connections
                .scan(view, &pattern.with_subject(node.clone()))?
                .map(|quad| Ok(quad?.object))
                .collect()
        }
    }

    /// Writes the SHACL description of the path and returns its root node.
    pub fn write_to_graph(&self, graph: &mut Graph) -> Term {
        match self {
            Self::Predicate(p) => p.clone().into(),
            Self::Sequence(paths) => {
                let items = paths.iter().map(|p| p.write_to_graph(graph)).collect();
                write_list(graph, items)
            }
            Self::Alternative(paths) => {
                let items = paths.iter().map(|p| p.write_to_graph(graph)).collect();
                let list = write_list(graph, items);
                write_wrapper(graph, sh::ALTERNATIVE_PATH, list)
            }
            Self::Inverse(inner) => {
                let inner = inner.write_to_graph(graph);
                write_wrapper(graph, sh::INVERSE_PATH, inner)
            }
            Self::ZeroOrMore(inner) => {
                let inner = inner.write_to_graph(graph);
                write_wrapper(graph, sh::ZERO_OR_MORE_PATH, inner)
            }
            Self::OneOrMore(inner) => {
                let inner = inner.write_to_graph(graph);
                write_wrapper(graph, sh::ONE_OR_MORE_PATH, inner)
            }
            Self::ZeroOrOne(inner) => {
                let inner = inner.write_to_graph(graph);
                write_wrapper(graph, sh::ZERO_OR_ONE_PATH, inner)
            }
        }
    }
}

fn write_wrapper(graph: &mut Graph, predicate: NamedNodeRef<'_>, object: Term) -> Term {
    let node = BlankNode::default();
    graph.insert(&Triple::new(node.clone(), predicate, object));
    node.into()
}

fn write_list(graph: &mut Graph, items: Vec<Term>) -> Term {
    let mut rest: Term = rdf::NIL.into_owned().into();
    for item in items.into_iter().rev() {
        let cell = BlankNode::default();
        graph.insert(&Triple::new(cell.clone(), rdf::FIRST, item));
        graph.insert(&Triple::new(cell.clone(), rdf::REST, rest));
        rest = cell.into();
    }
    rest
}

fn write_joined(f: &mut fmt::Formatter<'_>, paths: &[PropertyPath], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    let mut paths = paths.iter();
    if let Some(first) = paths.next() {
        write!(f, "{first}")?;
    }
    for path in paths {
        write!(f, "{separator}{path}")?;
    }
    f.write_str(")")
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(predicate) => write!(f, "{predicate}"),
            Self::Sequence(paths) => write_joined(f, paths, " / "),
            Self::Alternative(paths) => write_joined(f, paths, " | "),
            Self::Inverse(path) => write!(f, "^{path}"),
            Self::ZeroOrMore(path) => write!(f, "{path}*"),
            Self::OneOrMore(path) => write!(f, "{path}+"),
            Self::ZeroOrOne(path) => write!(f, "{path}?"),
        }
    }
}
