use super::{PlanNode, Sorted};
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use oxrdf::Term;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// A condition on all the values of a focus node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupCondition {
    /// Fewer distinct values than the bound, `sh:minCount`.
    CountBelow(u64),
    /// More distinct values than the bound, `sh:maxCount`.
    CountAbove(u64),
    /// No value is the given term, `sh:hasValue`.
    Missing(Term),
    /// Two values share a language tag, `sh:uniqueLang`.
    DuplicateLanguage,
}

impl GroupCondition {
    fn holds(&self, values: &[Term]) -> bool {
        let count = || u64::try_from(values.len()).unwrap_or(u64::MAX);
        match self {
            Self::CountBelow(bound) => count() < *bound,
            Self::CountAbove(bound) => count() > *bound,
            Self::Missing(expected) => !values.contains(expected),
            Self::DuplicateLanguage => {
                let mut languages = FxHashSet::default();
                values.iter().any(|value| match value {
                    Term::Literal(literal) => literal
                        .language()
                        .is_some_and(|l| !languages.insert(l.to_ascii_lowercase())),
                    _ => false,
                })
            }
        }
    }
}

/// Groups the tuples by target chain and emits the target chains whose values satisfy a condition.
///
/// Tuples without value count as a focus node without values, as produced by a left outer join.
/// The output is made of node scope tuples, in input order.
pub struct GroupByFilter<'a> {
    parent: Sorted<'a>,
    condition: GroupCondition,
    peek: Option<ValidationTuple>,
    started: bool,
    output: VecDeque<ValidationTuple>,
}

impl<'a> GroupByFilter<'a> {
    #[expect(clippy::new_ret_no_self)]
    pub fn new(parent: Sorted<'a>, condition: GroupCondition) -> Sorted<'a> {
        Sorted::assume_sorted(Box::new(Self {
            parent,
            condition,
            peek: None,
            started: false,
            output: VecDeque::new(),
        }))
    }

    /// Consumes all the tuples sharing the active target of the next one.
    fn next_run(&mut self) -> Result<Vec<ValidationTuple>, ShaclError> {
        if !self.started {
            self.started = true;
            self.peek = self.parent.next().transpose()?;
        }
        let mut run: Vec<ValidationTuple> = Vec::new();
        while let Some(tuple) = self.peek.take() {
            if run
                .first()
                .is_some_and(|first| first.cmp_active_target(&tuple).is_ne())
            {
                self.peek = Some(tuple);
                break;
            }
            run.push(tuple);
            self.peek = self.parent.next().transpose()?;
        }
        Ok(run)
    }

    fn evaluate_run(&mut self, run: Vec<ValidationTuple>) -> Result<(), ShaclError> {
        let mut groups: Vec<(Vec<Term>, Vec<Term>)> = Vec::new();
        let mut positions = FxHashMap::default();
        for tuple in run {
            let position = *positions
                .entry(tuple.target_chain().to_vec())
                .or_insert_with(|| {
                    groups.push((tuple.target_chain().to_vec(), Vec::new()));
                    groups.len() - 1
                });
            if let Some(value) = tuple.value() {
                let values = &mut groups[position].1;
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        for (chain, values) in groups {
            if self.condition.holds(&values) {
                self.output
                    .push_back(ValidationTuple::from_target_chain(chain)?);
            }
        }
        Ok(())
    }
}

impl Iterator for GroupByFilter<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tuple) = self.output.pop_front() {
                return Some(Ok(tuple));
            }
            let run = match self.next_run() {
                Ok(run) => run,
                Err(error) => return Some(Err(error)),
            };
            if run.is_empty() {
                return None;
            }
            if let Err(error) = self.evaluate_run(run) {
                return Some(Err(error));
            }
        }
    }
}

impl PlanNode for GroupByFilter<'_> {
    fn depth(&self) -> usize {
        self.parent.depth() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Sort;
    use crate::plan::tests::{collect, ex, plan_of, targets};
    use oxrdf::Literal;

    fn input() -> Sorted<'static> {
        Sort::new(plan_of(vec![
            ValidationTuple::with_value(ex("a"), ex("1")),
            ValidationTuple::with_value(ex("a"), ex("2")),
            ValidationTuple::for_target(ex("b")),
            ValidationTuple::with_value(ex("c"), ex("1")),
        ]))
    }

    #[test]
    fn test_counts() {
        assert_eq!(
            collect(GroupByFilter::new(input(), GroupCondition::CountBelow(1))),
            targets(&["b"])
        );
        assert_eq!(
            collect(GroupByFilter::new(input(), GroupCondition::CountBelow(2))),
            targets(&["b", "c"])
        );
        assert_eq!(
            collect(GroupByFilter::new(input(), GroupCondition::CountAbove(1))),
            targets(&["a"])
        );
    }

    #[test]
    fn test_missing_value() {
        assert_eq!(
            collect(GroupByFilter::new(
                input(),
                GroupCondition::Missing(ex("2"))
            )),
            targets(&["b", "c"])
        );
    }

    #[test]
    fn test_groups_by_full_chain() {
        let input = Sort::new(plan_of(vec![
            ValidationTuple::from_target_chain(vec![ex("r1"), ex("k"), ex("1")])
                .unwrap()
                .shift_to_property_shape()
                .unwrap(),
            ValidationTuple::from_target_chain(vec![ex("r2"), ex("k")]).unwrap(),
        ]));
        let result = collect(GroupByFilter::new(input, GroupCondition::CountBelow(1)));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chain(), &[ex("r2"), ex("k")]);
    }

    #[test]
    fn test_duplicate_language() {
        let input = Sort::new(plan_of(vec![
            ValidationTuple::with_value(
                ex("a"),
                Literal::new_language_tagged_literal_unchecked("x", "en"),
            ),
            ValidationTuple::with_value(
                ex("a"),
                Literal::new_language_tagged_literal_unchecked("y", "en"),
            ),
            ValidationTuple::with_value(
                ex("b"),
                Literal::new_language_tagged_literal_unchecked("x", "en"),
            ),
            ValidationTuple::with_value(ex("b"), Literal::new_simple_literal("y")),
        ]));
        assert_eq!(
            collect(GroupByFilter::new(input, GroupCondition::DuplicateLanguage)),
            targets(&["a"])
        );
    }
}
