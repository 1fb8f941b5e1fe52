use super::fork::{Outlets, Router, fork};
use super::{Outlet, PlanNode, Sorted};
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use std::cmp::Ordering;

const JOINED: usize = 0;
const DISCARDED_LEFT: usize = 1;
const DISCARDED_RIGHT: usize = 2;

struct MergeJoinRouter<'a> {
    left: Sorted<'a>,
    right: Sorted<'a>,
    left_peek: Option<ValidationTuple>,
    right_peek: Option<ValidationTuple>,
    started: bool,
}

impl MergeJoinRouter<'_> {
    fn pull_left(&mut self) -> Result<(), ShaclError> {
        self.left_peek = self.left.next().transpose()?;
        Ok(())
    }

    fn pull_right(&mut self) -> Result<(), ShaclError> {
        self.right_peek = self.right.next().transpose()?;
        Ok(())
    }

    /// Takes the peeked left tuple and all the following ones with the same active target.
    fn left_group(&mut self) -> Result<Vec<ValidationTuple>, ShaclError> {
        let mut group = Vec::new();
        while let Some(tuple) = self.left_peek.take() {
            if group
                .first()
                .is_some_and(|first: &ValidationTuple| first.cmp_active_target(&tuple).is_ne())
            {
                self.left_peek = Some(tuple);
                break;
            }
            group.push(tuple);
            self.pull_left()?;
        }
        Ok(group)
    }

    fn right_group(&mut self) -> Result<Vec<ValidationTuple>, ShaclError> {
        let mut group = Vec::new();
        while let Some(tuple) = self.right_peek.take() {
            if group
                .first()
                .is_some_and(|first: &ValidationTuple| first.cmp_active_target(&tuple).is_ne())
            {
                self.right_peek = Some(tuple);
                break;
            }
            group.push(tuple);
            self.pull_right()?;
        }
        Ok(group)
    }
}

impl Router for MergeJoinRouter<'_> {
    fn advance(&mut self, outlets: &mut Outlets) -> Result<bool, ShaclError> {
        if !self.started {
            self.started = true;
            self.pull_left()?;
            self.pull_right()?;
        }
        let ordering = match (&self.left_peek, &self.right_peek) {
            (None, None) => return Ok(false),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(left), Some(right)) => left.cmp_active_target(right),
        };
        match ordering {
            Ordering::Less => {
                if let Some(tuple) = self.left_peek.take() {
                    outlets.push(DISCARDED_LEFT, tuple);
                }
                self.pull_left()?;
            }
            Ordering::Greater => {
                if let Some(tuple) = self.right_peek.take() {
                    outlets.push(DISCARDED_RIGHT, tuple);
                }
                self.pull_right()?;
            }
            Ordering::Equal => {
                let lefts = self.left_group()?;
                let rights = self.right_group()?;
                if outlets.is_open(JOINED) {
                    for left in &lefts {
                        for right in &rights {
                            outlets.push(JOINED, left.join_value(right));
                        }
                    }
                }
            }
        }
        Ok(true)
    }

    fn depth(&self) -> usize {
        self.left.depth().max(self.right.depth()) + 1
    }
}

/// Sort-merge join of two plans on their active targets.
///
/// Each joined tuple is the left target chain extended with the right value.
/// When several tuples on both sides share a key, their cross product is emitted.
/// The tuples without a match on the other side are available on the discarded outputs.
/// All three outputs are ordered by active target.
pub struct InnerJoin<'a> {
    joined: Outlet<'a>,
    discarded_left: Outlet<'a>,
    discarded_right: Outlet<'a>,
}

impl<'a> InnerJoin<'a> {
    pub fn new(left: Sorted<'a>, right: Sorted<'a>) -> Self {
        let [joined, discarded_left, discarded_right] = fork(MergeJoinRouter {
            left,
            right,
            left_peek: None,
            right_peek: None,
            started: false,
        });
        Self {
            joined,
            discarded_left,
            discarded_right,
        }
    }

    pub fn joined(self) -> Sorted<'a> {
        Sorted::assume_sorted(Box::new(self.joined))
    }

    pub fn discarded_left(self) -> Sorted<'a> {
        Sorted::assume_sorted(Box::new(self.discarded_left))
    }

    pub fn discarded_right(self) -> Sorted<'a> {
        Sorted::assume_sorted(Box::new(self.discarded_right))
    }

    /// The joined, discarded left and discarded right outputs.
    pub fn into_parts(self) -> (Sorted<'a>, Sorted<'a>, Sorted<'a>) {
        (
            Sorted::assume_sorted(Box::new(self.joined)),
            Sorted::assume_sorted(Box::new(self.discarded_left)),
            Sorted::assume_sorted(Box::new(self.discarded_right)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Sort;
    use crate::plan::tests::{collect, ex, plan_of, targets};

    fn left() -> Sorted<'static> {
        Sort::new(plan_of(targets(&["a", "b", "d"])))
    }

    fn right() -> Sorted<'static> {
        Sort::new(plan_of(vec![
            ValidationTuple::with_value(ex("b"), ex("1")),
            ValidationTuple::with_value(ex("b"), ex("2")),
            ValidationTuple::with_value(ex("c"), ex("3")),
            ValidationTuple::with_value(ex("d"), ex("4")),
        ]))
    }

    #[test]
    fn test_joined() {
        let joined = collect(InnerJoin::new(left(), right()).joined());
        assert_eq!(
            joined,
            vec![
                ValidationTuple::with_value(ex("b"), ex("1")),
                ValidationTuple::with_value(ex("b"), ex("2")),
                ValidationTuple::with_value(ex("d"), ex("4")),
            ]
        );
    }

    #[test]
    fn test_outputs_partition_the_inputs() {
        let (joined, discarded_left, discarded_right) =
            InnerJoin::new(left(), right()).into_parts();
        // consume in reverse order to exercise buffering
        let discarded_right = collect(discarded_right);
        let discarded_left = collect(discarded_left);
        let joined = collect(joined);
        assert_eq!(discarded_left, targets(&["a"]));
        assert_eq!(
            discarded_right,
            vec![ValidationTuple::with_value(ex("c"), ex("3"))]
        );
        assert_eq!(joined.len(), 3);
    }

    #[test]
    fn test_cross_product_per_key() {
        let left = Sort::new(plan_of(vec![
            ValidationTuple::from_target_chain(vec![ex("r1"), ex("k")]).unwrap(),
            ValidationTuple::from_target_chain(vec![ex("r2"), ex("k")]).unwrap(),
        ]));
        let right = Sort::new(plan_of(vec![
            ValidationTuple::with_value(ex("k"), ex("1")),
            ValidationTuple::with_value(ex("k"), ex("2")),
            ValidationTuple::with_value(ex("k"), ex("3")),
        ]));
        let joined = collect(InnerJoin::new(left, right).joined());
        assert_eq!(joined.len(), 6);
        assert_eq!(joined[0].chain(), &[ex("r1"), ex("k"), ex("1")]);
        assert!(joined.iter().all(|t| t.active_target() == &ex("k")));
    }
}
