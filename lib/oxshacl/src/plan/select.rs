//! Plan leaves reading statements.

use super::{CachedPlan, PlanNode, Sorted};
use crate::comparator::cmp_terms;
use crate::connections::{
    ConnectionsGroup, QuadIter, SolutionIter, StatementPattern, StatementView,
};
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use oxrdf::{Quad, Term};
use spargebra::{Query, SparqlParser};

/// How a statement is turned into a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    /// `[subject]`
    Subject,
    /// `[object]`
    Object,
    /// `[subject, value=object]`
    SubjectObject,
    /// `[object, value=subject]`, walking the statement backwards.
    ObjectSubject,
}

impl Projection {
    fn project(self, quad: Quad) -> ValidationTuple {
        match self {
            Self::Subject => ValidationTuple::for_target(quad.subject),
            Self::Object => ValidationTuple::for_target(quad.object),
            Self::SubjectObject => ValidationTuple::with_value(quad.subject, quad.object),
            Self::ObjectSubject => ValidationTuple::with_value(quad.object, quad.subject),
        }
    }
}

/// Statements of a view matching a pattern, in store order.
pub struct UnorderedSelect<'a> {
    connections: &'a ConnectionsGroup<'a>,
    view: StatementView,
    pattern: StatementPattern,
    projection: Projection,
    scan: Option<QuadIter<'a>>,
}

impl<'a> UnorderedSelect<'a> {
    pub fn new(
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
        pattern: StatementPattern,
        projection: Projection,
    ) -> Self {
        Self {
            connections,
            view,
            pattern,
            projection,
            scan: None,
        }
    }
}

impl Iterator for UnorderedSelect<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.scan.is_none() {
            match self.connections.scan(self.view, &self.pattern) {
                Ok(scan) => self.scan = Some(scan),
                Err(error) => return Some(Err(error)),
            }
        }
        let quad = self.scan.as_mut()?.next()?;
        Some(quad.map(|quad| self.projection.project(quad)))
    }
}

impl PlanNode for UnorderedSelect<'_> {
    fn depth(&self) -> usize {
        1
    }
}

/// Solutions of a SPARQL `SELECT` query, each turned into a tuple whose chain is the bound variables in order.
///
/// Solutions leaving one of the variables unbound are skipped.
pub struct Select<'a> {
    connections: &'a ConnectionsGroup<'a>,
    view: StatementView,
    query: Query,
    variables: Vec<String>,
    with_value: bool,
    solutions: Option<SolutionIter<'a>>,
}

impl<'a> Select<'a> {
    /// Parses `query`.
    ///
    /// If `with_value` is set the last variable is the value of a property shape tuple.
    pub fn new(
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
        query: &str,
        variables: Vec<String>,
        with_value: bool,
    ) -> Result<Self, ShaclError> {
        let parsed = SparqlParser::new()
            .parse_query(query)
            .map_err(|e| ShaclError::query_construction(query, e.to_string()))?;
        if connections.settings().log_validation_plans {
            tracing::debug!(%query, "generated SPARQL query");
        }
        Ok(Self {
            connections,
            view,
            query: parsed,
            variables,
            with_value,
            solutions: None,
        })
    }

    fn tuple(&self, solution: &spareval::QuerySolution) -> Result<Option<ValidationTuple>, ShaclError> {
        let Some(chain) = self
            .variables
            .iter()
            .map(|v| solution.get(v.as_str()).cloned())
            .collect::<Option<Vec<Term>>>()
        else {
            return Ok(None);
        };
        let tuple = ValidationTuple::from_target_chain(chain)?;
        Ok(Some(if self.with_value {
            tuple.shift_to_property_shape()?
        } else {
            tuple
        }))
    }
}

impl Iterator for Select<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.solutions.is_none() {
            match self.connections.evaluate(self.view, &self.query) {
                Ok(solutions) => self.solutions = Some(solutions),
                Err(error) => return Some(Err(error)),
            }
        }
        loop {
            let solution = match self.solutions.as_mut()?.next()? {
                Ok(solution) => solution,
                Err(error) => return Some(Err(error)),
            };
            match self.tuple(&solution) {
                Ok(Some(tuple)) => return Some(Ok(tuple)),
                Ok(None) => (),
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

impl PlanNode for Select<'_> {
    fn depth(&self) -> usize {
        1
    }
}

/// A fixed set of targets, like the ones of `sh:targetNode`.
pub struct ValuesBacked;

impl ValuesBacked {
    #[expect(clippy::new_ret_no_self)]
    pub fn new<'a>(values: impl IntoIterator<Item = Term>) -> Sorted<'a> {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(cmp_terms);
        values.dedup();
        Sorted::assume_sorted(Box::new(CachedPlan::new(
            values
                .into_iter()
                .map(ValidationTuple::for_target)
                .collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::{collect, ex, targets};

    #[test]
    fn test_values_backed_is_sorted_and_unique() {
        let plan = ValuesBacked::new([ex("c"), ex("a"), ex("c"), ex("b")]);
        assert_eq!(collect(plan), targets(&["a", "b", "c"]));
    }

    #[test]
    fn test_projections() {
        let quad = Quad::new(
            oxrdf::NamedNode::new_unchecked("http://example.org/s"),
            oxrdf::NamedNode::new_unchecked("http://example.org/p"),
            ex("o"),
            oxrdf::GraphName::DefaultGraph,
        );
        assert_eq!(
            Projection::SubjectObject.project(quad.clone()),
            ValidationTuple::with_value(ex("s"), ex("o"))
        );
        assert_eq!(
            Projection::ObjectSubject.project(quad.clone()),
            ValidationTuple::with_value(ex("o"), ex("s"))
        );
        assert_eq!(
            Projection::Object.project(quad),
            ValidationTuple::for_target(ex("o"))
        );
    }
}
