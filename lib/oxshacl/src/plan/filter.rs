//! Per-tuple predicates and the node splitting a stream with them.

use super::fork::{Outlet, Outlets, Router, fork};
use super::{BoxedPlan, PlanNode};
use crate::comparator::compare_values;
use crate::constraint::NodeKind;
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use oxrdf::{NamedNode, Term};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;

/// A predicate over tuples.
///
/// Value constraints look at [`ValidationTuple::value_or_target`]: the property value, or the
/// focus node itself for node shapes.
pub trait TupleFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError>;
}

impl<F: TupleFilter + ?Sized> TupleFilter for Box<F> {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        (**self).matches(tuple)
    }
}

const TRUE_NODE: usize = 0;
const FALSE_NODE: usize = 1;

struct FilterRouter<'a> {
    parent: BoxedPlan<'a>,
    filter: Box<dyn TupleFilter + 'a>,
}

impl Router for FilterRouter<'_> {
    fn advance(&mut self, outlets: &mut Outlets) -> Result<bool, ShaclError> {
        let Some(tuple) = self.parent.next().transpose()? else {
            return Ok(false);
        };
        if self.filter.matches(&tuple)? {
            outlets.push(TRUE_NODE, tuple);
        } else {
            outlets.push(FALSE_NODE, tuple);
        }
        Ok(true)
    }

    fn depth(&self) -> usize {
        self.parent.depth() + 1
    }
}

/// Splits a stream in the tuples matching a filter and the other ones.
///
/// Both outputs keep the input order.
pub struct FilterNode<'a> {
    true_node: Outlet<'a>,
    false_node: Outlet<'a>,
}

impl<'a> FilterNode<'a> {
    pub fn new(parent: BoxedPlan<'a>, filter: impl TupleFilter + 'a) -> Self {
        let [true_node, false_node] = fork(FilterRouter {
            parent,
            filter: Box::new(filter),
        });
        Self {
            true_node,
            false_node,
        }
    }

    /// The matching tuples.
    pub fn true_node(self) -> Outlet<'a> {
        self.true_node
    }

    /// The tuples not matching.
    pub fn false_node(self) -> Outlet<'a> {
        self.false_node
    }

    /// Both outputs: matching first.
    pub fn split(self) -> (Outlet<'a>, Outlet<'a>) {
        (self.true_node, self.false_node)
    }
}

/// `sh:datatype`: the value is a literal of the given datatype.
pub struct DatatypeFilter {
    datatype: NamedNode,
}

impl DatatypeFilter {
    pub fn new(datatype: NamedNode) -> Self {
        Self { datatype }
    }
}

impl TupleFilter for DatatypeFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        Ok(match tuple.value_or_target() {
            Term::Literal(literal) => literal.datatype() == self.datatype.as_ref(),
            _ => false,
        })
    }
}

/// `sh:nodeKind`
pub struct NodeKindFilter {
    kind: NodeKind,
}

impl NodeKindFilter {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind }
    }
}

impl TupleFilter for NodeKindFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        Ok(self.kind.matches(tuple.value_or_target()))
    }
}

/// `sh:pattern`: the string form of the value matches a regular expression.
///
/// Blank nodes never match.
pub struct PatternFilter {
    regex: Regex,
}

impl PatternFilter {
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }
}

impl TupleFilter for PatternFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        Ok(lexical_form(tuple.value_or_target()).is_some_and(|s| self.regex.is_match(s)))
    }
}

/// `sh:minLength` and `sh:maxLength`, counted in characters.
///
/// Blank nodes never match.
pub struct LengthFilter {
    bound: u64,
    ordering: Ordering,
}

impl LengthFilter {
    /// At least `bound` characters.
    pub fn min(bound: u64) -> Self {
        Self {
            bound,
            ordering: Ordering::Greater,
        }
    }

    /// At most `bound` characters.
    pub fn max(bound: u64) -> Self {
        Self {
            bound,
            ordering: Ordering::Less,
        }
    }
}

impl TupleFilter for LengthFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        Ok(lexical_form(tuple.value_or_target()).is_some_and(|s| {
            let length = u64::try_from(s.chars().count()).unwrap_or(u64::MAX);
            let ordering = length.cmp(&self.bound);
            ordering == Ordering::Equal || ordering == self.ordering
        }))
    }
}

/// Which side of a range a bound is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeBound {
    MinExclusive,
    MinInclusive,
    MaxExclusive,
    MaxInclusive,
}

/// `sh:minInclusive` and friends, using [`compare_values`].
///
/// Values not comparable with the bound never match.
pub struct RangeFilter {
    bound: Term,
    kind: RangeBound,
}

impl RangeFilter {
    pub fn new(kind: RangeBound, bound: Term) -> Self {
        Self { bound, kind }
    }
}

impl TupleFilter for RangeFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        let Some(ordering) = compare_values(tuple.value_or_target(), &self.bound) else {
            return Ok(false);
        };
        Ok(match self.kind {
            RangeBound::MinExclusive => ordering.is_gt(),
            RangeBound::MinInclusive => ordering.is_ge(),
            RangeBound::MaxExclusive => ordering.is_lt(),
            RangeBound::MaxInclusive => ordering.is_le(),
        })
    }
}

/// `sh:languageIn`: the value is a literal whose language tag matches one of the ranges.
pub struct LanguageInFilter {
    ranges: Vec<String>,
}

impl LanguageInFilter {
    pub fn new(ranges: Vec<String>) -> Self {
        Self { ranges }
    }
}

impl TupleFilter for LanguageInFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        let Term::Literal(literal) = tuple.value_or_target() else {
            return Ok(false);
        };
        let Some(language) = literal.language() else {
            return Ok(false);
        };
        Ok(self.ranges.iter().any(|range| lang_matches(language, range)))
    }
}

/// Basic language range matching, as done by the SPARQL `langMatches` function.
pub(crate) fn lang_matches(tag: &str, range: &str) -> bool {
    if tag.is_empty() {
        return false;
    }
    if range == "*" {
        return true;
    }
    tag.len() >= range.len()
        && tag
            .get(..range.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(range))
        && (tag.len() == range.len() || tag.as_bytes().get(range.len()) == Some(&b'-'))
}

/// `sh:in`, and `sh:hasValue` on node shapes: the value is one of the given terms.
pub struct InFilter {
    values: FxHashSet<Term>,
}

impl InFilter {
    pub fn new(values: impl IntoIterator<Item = Term>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl TupleFilter for InFilter {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        Ok(self.values.contains(tuple.value_or_target()))
    }
}

fn lexical_form(term: &Term) -> Option<&str> {
    match term {
        Term::NamedNode(node) => Some(node.as_str()),
        Term::Literal(literal) => Some(literal.value()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::{collect, ex, plan_of, targets};
    use oxrdf::Literal;
    use oxrdf::vocab::xsd;

    fn values(values: Vec<Term>) -> BoxedPlan<'static> {
        plan_of(
            values
                .into_iter()
                .map(|v| ValidationTuple::with_value(ex("focus"), v))
                .collect(),
        )
    }

    fn split(plan: BoxedPlan<'static>, filter: impl TupleFilter + 'static) -> (usize, usize) {
        let (matching, other) = FilterNode::new(plan, filter).split();
        // read the false branch first to check buffering of the true one
        let other = collect(other).len();
        (collect(matching).len(), other)
    }

    #[test]
    fn test_branches_are_complementary() {
        let input = vec![
            Literal::new_typed_literal("1", xsd::INTEGER).into(),
            Literal::new_simple_literal("a").into(),
            ex("iri"),
            Literal::new_typed_literal("2", xsd::INTEGER).into(),
        ];
        let (matching, other) = split(
            values(input.clone()),
            DatatypeFilter::new(xsd::INTEGER.into()),
        );
        assert_eq!((matching, other), (2, 2));
        let (matching, other) = split(values(input), NodeKindFilter::new(NodeKind::Literal));
        assert_eq!((matching, other), (3, 1));
    }

    #[test]
    fn test_filter_on_node_shape_tuples_uses_focus() {
        let (matching, other) = split(
            plan_of(targets(&["a", "b"])),
            InFilter::new([ex("a")]),
        );
        assert_eq!((matching, other), (1, 1));
    }

    #[test]
    fn test_pattern_and_length() {
        let input = || {
            values(vec![
                Literal::new_simple_literal("abc").into(),
                Literal::new_simple_literal("abcdef").into(),
                oxrdf::BlankNode::new_unchecked("b").into(),
            ])
        };
        let regex = Regex::new("^abc$").unwrap();
        assert_eq!(split(input(), PatternFilter::new(regex)), (1, 2));
        assert_eq!(split(input(), LengthFilter::min(4)), (1, 2));
        assert_eq!(split(input(), LengthFilter::max(3)), (1, 2));
        assert_eq!(split(input(), LengthFilter::max(6)), (2, 1));
    }

    #[test]
    fn test_range() {
        let input = || {
            values(vec![
                Literal::new_typed_literal("17", xsd::INTEGER).into(),
                Literal::new_typed_literal("18", xsd::INTEGER).into(),
                Literal::new_typed_literal("18.5", xsd::DECIMAL).into(),
                Literal::new_simple_literal("old").into(),
            ])
        };
        let bound: Term = Literal::new_typed_literal("18", xsd::INTEGER).into();
        assert_eq!(
            split(input(), RangeFilter::new(RangeBound::MinInclusive, bound.clone())),
            (2, 2)
        );
        assert_eq!(
            split(input(), RangeFilter::new(RangeBound::MinExclusive, bound.clone())),
            (1, 3)
        );
        assert_eq!(
            split(input(), RangeFilter::new(RangeBound::MaxInclusive, bound)),
            (2, 2)
        );
    }

    #[test]
    fn test_language_in() {
        let input = values(vec![
            Literal::new_language_tagged_literal_unchecked("a", "en-us").into(),
            Literal::new_language_tagged_literal_unchecked("b", "fr").into(),
            Literal::new_simple_literal("c").into(),
        ]);
        assert_eq!(
            split(input, LanguageInFilter::new(vec!["en".into()])),
            (1, 2)
        );
        assert!(lang_matches("en", "EN"));
        assert!(!lang_matches("eng", "en"));
        assert!(lang_matches("de", "*"));
        assert!(!lang_matches("", "*"));
    }
}
