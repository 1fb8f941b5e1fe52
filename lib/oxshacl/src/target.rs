//! Shape targets: how the focus nodes of a shape are selected.

use crate::connections::{ConnectionsGroup, PlanKey, StatementPattern, StatementView};
use crate::error::ShaclError;
use crate::plan::{BoxedPlan, Projection, Sort, Sorted, Union, UnorderedSelect, ValuesBacked};
use oxrdf::vocab::rdf;
use oxrdf::{NamedNode, Term};
use std::fmt::{self, Write};

/// Above this number of classes, class targets are queried with a `FILTER(... IN ...)` instead of a `UNION`.
const MAX_UNION_CLASSES: usize = 8;

/// A target declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// `sh:targetClass`, and implicit class targets.
    Class(Vec<NamedNode>),
    /// `sh:targetNode`
    Node(Vec<Term>),
    /// `sh:targetSubjectsOf`
    SubjectsOf(NamedNode),
    /// `sh:targetObjectsOf`
    ObjectsOf(NamedNode),
    /// The subjects of the statements with the given predicate and class as object.
    Compound {
        predicate: NamedNode,
        class: NamedNode,
    },
}

impl Target {
    fn classes(&self, connections: &ConnectionsGroup<'_>) -> Result<Vec<NamedNode>, ShaclError> {
        let Self::Class(classes) = self else {
            return Ok(Vec::new());
        };
        let mut expanded = Vec::new();
        for class in classes {
            for class in connections.backwards_chain(class)? {
                if !expanded.contains(&class) {
                    expanded.push(class);
                }
            }
        }
        Ok(expanded)
    }

    /// The target nodes found in `view`, sorted and without duplicates.
    ///
    /// In the added view these are the nodes that became targets because of the added statements.
    /// Node targets are always returned in full.
    pub fn scan_plan<'a>(
        &self,
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
    ) -> Result<Sorted<'a>, ShaclError> {
        if let Self::Node(nodes) = self {
            return Ok(ValuesBacked::new(nodes.iter().cloned()));
        }
        let classes = self.classes(connections)?;
        connections.cached(
            PlanKey::Targets {
                view,
                target: self.clone(),
            },
            || {
                let select = |pattern, projection| -> BoxedPlan<'a> {
                    Box::new(UnorderedSelect::new(connections, view, pattern, projection))
                };
                let plan: BoxedPlan<'a> = match self {
                    Self::Class(_) => Box::new(Union::new(
                        classes
                            .into_iter()
                            .map(|class| {
                                select(
                                    StatementPattern::new()
                                        .with_predicate(rdf::TYPE)
                                        .with_object(class),
                                    Projection::Subject,
                                )
                            })
                            .collect(),
                    )),
                    Self::SubjectsOf(predicate) => select(
                        StatementPattern::new().with_predicate(predicate.clone()),
                        Projection::Subject,
                    ),
                    Self::ObjectsOf(predicate) => select(
                        StatementPattern::new().with_predicate(predicate.clone()),
                        Projection::Object,
                    ),
                    Self::Compound { predicate, class } => select(
                        StatementPattern::new()
                            .with_predicate(predicate.clone())
                            .with_object(class.clone()),
                        Projection::Subject,
                    ),
                    Self::Node(nodes) => ValuesBacked::new(nodes.iter().cloned()).into_inner(),
                };
                Ok(Sort::new(plan).unique())
            },
        )
    }

    /// Checks if `node` is a target in `view`.
    pub fn contains(
        &self,
        connections: &ConnectionsGroup<'_>,
        view: StatementView,
        node: &Term,
    ) -> Result<bool, ShaclError> {
        match self {
            Self::Node(nodes) => Ok(nodes.contains(node)),
            Self::ObjectsOf(predicate) => connections.has_statement(
                view,
                &StatementPattern::new()
                    .with_predicate(predicate.clone())
                    .with_object(node.clone()),
            ),
            _ if node.is_literal() => Ok(false),
            Self::SubjectsOf(predicate) => connections.has_statement(
                view,
                &StatementPattern::new()
                    .with_subject(node.clone())
                    .with_predicate(predicate.clone()),
            ),
            Self::Compound { predicate, class } => connections.has_statement(
                view,
                &StatementPattern::new()
                    .with_subject(node.clone())
                    .with_predicate(predicate.clone())
                    .with_object(class.clone()),
            ),
            Self::Class(_) => {
                for class in self.classes(connections)? {
                    if connections.has_statement(
                        view,
                        &StatementPattern::new()
                            .with_subject(node.clone())
                            .with_predicate(rdf::TYPE)
                            .with_object(class),
                    )? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// SPARQL graph pattern binding `?var` to the target nodes.
    pub fn query_fragment(
        &self,
        connections: &ConnectionsGroup<'_>,
        var: &str,
    ) -> Result<String, ShaclError> {
        let mut fragment = String::new();
        let write_error = |e: fmt::Error| ShaclError::query_construction(var, e.to_string());
        match self {
            Self::Class(_) => {
                let classes = self.classes(connections)?;
                match classes.as_slice() {
                    [] => fragment.push_str("FILTER(false)"),
                    [class] => write!(fragment, "?{var} a {class} .").map_err(write_error)?,
                    classes if classes.len() <= MAX_UNION_CLASSES => {
                        for (i, class) in classes.iter().enumerate() {
                            if i > 0 {
                                fragment.push_str(" UNION ");
                            }
                            write!(fragment, "{{ ?{var} a {class} . }}").map_err(write_error)?;
                        }
                    }
                    classes => {
                        write!(fragment, "?{var} a ?{var}_type . FILTER(?{var}_type IN (")
                            .map_err(write_error)?;
                        for (i, class) in classes.iter().enumerate() {
                            if i > 0 {
                                fragment.push_str(", ");
                            }
                            write!(fragment, "{class}").map_err(write_error)?;
                        }
                        fragment.push_str("))");
                    }
                }
            }
            Self::Node(nodes) => {
                write!(fragment, "VALUES ?{var} {{").map_err(write_error)?;
                for node in nodes {
                    if node.is_blank_node() {
                        return Err(ShaclError::unsupported(
                            "blank node in sh:targetNode with SPARQL validation",
                            None,
                        ));
                    }
                    write!(fragment, " {node}").map_err(write_error)?;
                }
                fragment.push_str(" }");
            }
            Self::SubjectsOf(predicate) => {
                write!(fragment, "?{var} {predicate} [] .").map_err(write_error)?;
            }
            Self::ObjectsOf(predicate) => {
                write!(fragment, "[] {predicate} ?{var} .").map_err(write_error)?;
            }
            Self::Compound { predicate, class } => {
                write!(fragment, "?{var} {predicate} {class} .").map_err(write_error)?;
            }
        }
        Ok(fragment)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(classes) => {
                f.write_str("class")?;
                for class in classes {
                    write!(f, " {class}")?;
                }
                Ok(())
            }
            Self::Node(nodes) => {
                f.write_str("node")?;
                for node in nodes {
                    write!(f, " {node}")?;
                }
                Ok(())
            }
            Self::SubjectsOf(predicate) => write!(f, "subjects of {predicate}"),
            Self::ObjectsOf(predicate) => write!(f, "objects of {predicate}"),
            Self::Compound { predicate, class } => write!(f, "subjects of {predicate} {class}"),
        }
    }
}
