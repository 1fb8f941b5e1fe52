//! SPARQL queries returning all the violations of a constraint.
//!
//! The queries bind the target chain to `?a0 ... ?an`, `?an` being the focus node, and the
//! property values to `?value`. They are evaluated on the base view.

use crate::connections::ConnectionsGroup;
use crate::constraint::ConstraintComponent;
use crate::error::ShaclError;
use crate::shape::Shape;
use crate::target_chain::TargetChain;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Literal, Term};

const VALUE: &str = "value";

/// A generated query and how to read its solutions.
#[derive(Debug, Clone)]
pub struct ViolationQuery {
    pub text: String,
    /// The target chain variables, followed by `value` if `with_value` is set.
    pub variables: Vec<String>,
    /// Whether the solutions carry the violating property value.
    pub with_value: bool,
}

/// The query finding the violations of `component` in `shape` on the focus nodes of `chain`.
///
/// Returns `None` for the components a single query can't express, like logical constraints.
pub fn violation_query(
    connections: &ConnectionsGroup<'_>,
    shape: &Shape,
    component: &ConstraintComponent,
    chain: &TargetChain,
) -> Result<Option<ViolationQuery>, ShaclError> {
    if !component.supports_sparql() {
        return Ok(None);
    }
    let (targets, variables) = chain.query_fragment(connections)?;
    let Some(focus) = variables.last().cloned() else {
        return Ok(None);
    };
    let path = shape.path().map(|path| path.query_fragment(&focus, VALUE));
    let query = match component {
        ConstraintComponent::MinCount(0) => return Ok(None),
        ConstraintComponent::MinCount(min) => {
            let Some(path) = path else {
                return Ok(None);
            };
            grouped_query(
                &variables,
                &format!("{targets} OPTIONAL {{ {path} }}"),
                &format!("COUNT(DISTINCT ?{VALUE}) < {min}"),
            )
        }
        ConstraintComponent::MaxCount(max) => {
            let Some(path) = path else {
                return Ok(None);
            };
            grouped_query(
                &variables,
                &format!("{targets} {path}"),
                &format!("COUNT(DISTINCT ?{VALUE}) > {max}"),
            )
        }
        ConstraintComponent::UniqueLang => {
            let Some(shape_path) = shape.path() else {
                return Ok(None);
            };
            let other = shape_path.query_fragment(&focus, "other");
            let path = shape_path.query_fragment(&focus, VALUE);
            ViolationQuery {
                text: format!(
                    "SELECT DISTINCT {} WHERE {{ {targets} {path} {other} \
                    FILTER(isLiteral(?{VALUE}) && isLiteral(?other) && lang(?{VALUE}) != \"\" \
                    && LCASE(lang(?{VALUE})) = LCASE(lang(?other)) && !sameTerm(?{VALUE}, ?other)) }}",
                    projection(&variables),
                ),
                variables,
                with_value: false,
            }
        }
        ConstraintComponent::HasValue(expected) => {
            if expected.is_blank_node() {
                return Ok(None);
            }
            let condition = match path {
                Some(path) => format!(
                    "FILTER NOT EXISTS {{ {path} FILTER(sameTerm(?{VALUE}, {expected})) }}"
                ),
                None => format!("FILTER(!sameTerm(?{focus}, {expected}))"),
            };
            ViolationQuery {
                text: format!(
                    "SELECT DISTINCT {} WHERE {{ {targets} {condition} }}",
                    projection(&variables)
                ),
                variables,
                with_value: false,
            }
        }
        ConstraintComponent::Class(class) => {
            let type_path = if connections.settings().rdfs_sub_class_reasoning {
                format!("{}/{}*", rdf::TYPE, rdfs::SUB_CLASS_OF)
            } else {
                rdf::TYPE.to_string()
            };
            let (value, pattern, variables, with_value) =
                value_pattern(&targets, path, &focus, variables);
            ViolationQuery {
                text: format!(
                    "SELECT DISTINCT {} WHERE {{ {pattern} FILTER NOT EXISTS {{ ?{value} {type_path} {class} . }} }}",
                    projection(&variables)
                ),
                variables,
                with_value,
            }
        }
        _ => {
            let (value, pattern, variables, with_value) =
                value_pattern(&targets, path, &focus, variables);
            let Some(condition) = violation_condition(component, &value) else {
                return Ok(None);
            };
            ViolationQuery {
                text: format!(
                    "SELECT DISTINCT {} WHERE {{ {pattern} FILTER({condition}) }}",
                    projection(&variables)
                ),
                variables,
                with_value,
            }
        }
    };
    Ok(Some(query))
}

/// The variable holding the checked values, and the pattern binding it.
fn value_pattern(
    targets: &str,
    path: Option<String>,
    focus: &str,
    mut variables: Vec<String>,
) -> (String, String, Vec<String>, bool) {
    match path {
        Some(path) => {
            variables.push(VALUE.to_owned());
            (VALUE.to_owned(), format!("{targets} {path}"), variables, true)
        }
        None => (focus.to_owned(), targets.to_owned(), variables, false),
    }
}

fn grouped_query(variables: &[String], pattern: &str, having: &str) -> ViolationQuery {
    let projection = projection(variables);
    ViolationQuery {
        text: format!(
            "SELECT {projection} WHERE {{ {pattern} }} GROUP BY {projection} HAVING({having})"
        ),
        variables: variables.to_vec(),
        with_value: false,
    }
}

fn projection(variables: &[String]) -> String {
    variables
        .iter()
        .map(|v| format!("?{v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expression true when `?var` violates a value constraint.
fn violation_condition(component: &ConstraintComponent, var: &str) -> Option<String> {
    Some(match component {
        ConstraintComponent::Datatype(datatype) => {
            format!("!isLiteral(?{var}) || datatype(?{var}) != {datatype}")
        }
        ConstraintComponent::NodeKind(kind) => format!("!{}", kind.sparql_check(var)),
        ConstraintComponent::MinExclusive(bound) => format!("!COALESCE(?{var} > {bound}, false)"),
        ConstraintComponent::MaxExclusive(bound) => format!("!COALESCE(?{var} < {bound}, false)"),
        ConstraintComponent::MinInclusive(bound) => format!("!COALESCE(?{var} >= {bound}, false)"),
        ConstraintComponent::MaxInclusive(bound) => format!("!COALESCE(?{var} <= {bound}, false)"),
        ConstraintComponent::MinLength(bound) => {
            format!("isBlank(?{var}) || STRLEN(STR(?{var})) < {bound}")
        }
        ConstraintComponent::MaxLength(bound) => {
            format!("isBlank(?{var}) || STRLEN(STR(?{var})) > {bound}")
        }
        ConstraintComponent::Pattern { pattern, flags, .. } => {
            let pattern = Literal::new_simple_literal(pattern);
            match flags {
                Some(flags) => format!(
                    "isBlank(?{var}) || !REGEX(STR(?{var}), {pattern}, {})",
                    Literal::new_simple_literal(flags)
                ),
                None => format!("isBlank(?{var}) || !REGEX(STR(?{var}), {pattern})"),
            }
        }
        ConstraintComponent::LanguageIn(ranges) => {
            let matching = ranges
                .iter()
                .map(|range| {
                    format!(
                        "langMatches(lang(?{var}), {})",
                        Literal::new_simple_literal(range)
                    )
                })
                .collect::<Vec<_>>();
            format!("!isLiteral(?{var}) || !({})", disjunction(&matching))
        }
        ConstraintComponent::In(values) => {
            let matching = values
                .iter()
                .map(|value| match value {
                    Term::BlankNode(_) => None,
                    value => Some(format!("sameTerm(?{var}, {value})")),
                })
                .collect::<Option<Vec<_>>>()?;
            format!("!({})", disjunction(&matching))
        }
        _ => return None,
    })
}

fn disjunction(terms: &[String]) -> String {
    if terms.is_empty() {
        "false".to_owned()
    } else {
        terms.join(" || ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::{QuadIter, SolutionIter, StatementPattern, StatementSource, StatementView};
    use crate::settings::ValidationSettings;
    use crate::shape::Shapes;
    use oxrdf::{Graph, NamedNode, Triple};
    use oxrdf::vocab::xsd;
    use spargebra::{Query, SparqlParser};

    struct NoData;

    impl StatementSource for NoData {
        fn scan(
            &self,
            _: StatementView,
            _: &StatementPattern,
        ) -> Result<QuadIter<'_>, ShaclError> {
            Ok(Box::new(std::iter::empty()))
        }

        fn has_added(&self) -> bool {
            false
        }

        fn has_removed(&self) -> bool {
            false
        }

        fn is_base_empty(&self) -> bool {
            true
        }

        fn evaluate(&self, _: StatementView, _: &Query) -> Result<SolutionIter<'_>, ShaclError> {
            Ok(Box::new(std::iter::empty()))
        }
    }

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.org/{name}"))
    }

    fn sh(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://www.w3.org/ns/shacl#{name}"))
    }

    /// A property shape on `ex:p` for the `ex:Person` instances with a single component.
    fn property_shape(predicate: NamedNode, object: impl Into<Term>) -> Shapes {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(ex("S"), rdf::TYPE, sh("PropertyShape")));
        graph.insert(&Triple::new(ex("S"), sh("targetClass"), ex("Person")));
        graph.insert(&Triple::new(ex("S"), sh("path"), ex("p")));
        graph.insert(&Triple::new(ex("S"), predicate, object));
        Shapes::from_graph(&graph).unwrap()
    }

    fn query_for(shapes: &Shapes) -> Option<ViolationQuery> {
        let settings = ValidationSettings::default();
        let connections = ConnectionsGroup::new(&NoData, &settings);
        let (index, shape) = shapes.all().next().unwrap();
        let chain = TargetChain::new(shapes.shape(index).targets.clone());
        violation_query(&connections, shape, &shape.components[0], &chain).unwrap()
    }

    fn assert_parses(query: &ViolationQuery) {
        let parsed = SparqlParser::new().parse_query(&query.text);
        assert!(parsed.is_ok(), "{}", query.text);
    }

    #[test]
    fn test_value_constraint_queries() {
        for (predicate, object) in [
            (sh("datatype"), Term::from(xsd::STRING.into_owned())),
            (sh("nodeKind"), sh("IRI").into()),
            (sh("minInclusive"), Literal::from(18).into()),
            (sh("maxLength"), Literal::from(3).into()),
            (sh("pattern"), Literal::new_simple_literal("^\"a\\d").into()),
            (sh("class"), ex("Address").into()),
        ] {
            let query = query_for(&property_shape(predicate, object)).unwrap();
            assert!(query.with_value);
            assert_eq!(query.variables, ["a0", "value"]);
            assert_parses(&query);
        }
    }

    #[test]
    fn test_count_queries_are_grouped() {
        let query = query_for(&property_shape(sh("minCount"), Literal::from(1))).unwrap();
        assert!(!query.with_value);
        assert!(query.text.contains("OPTIONAL"));
        assert!(query.text.contains("HAVING"));
        assert_parses(&query);
        let query = query_of_max_count();
        assert!(!query.text.contains("OPTIONAL"));
        assert_parses(&query);
    }

    fn query_of_max_count() -> ViolationQuery {
        query_for(&property_shape(sh("maxCount"), Literal::from(2))).unwrap()
    }

    #[test]
    fn test_unique_lang_and_has_value() {
        let query = query_for(&property_shape(sh("uniqueLang"), Literal::from(true))).unwrap();
        assert_parses(&query);
        let query = query_for(&property_shape(sh("hasValue"), ex("v"))).unwrap();
        assert!(query.text.contains("NOT EXISTS"));
        assert_parses(&query);
    }

    #[test]
    fn test_min_count_zero_has_no_query() {
        assert!(query_for(&property_shape(sh("minCount"), Literal::from(0))).is_none());
    }
}
