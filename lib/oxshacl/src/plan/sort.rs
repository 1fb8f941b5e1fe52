use super::{BoxedPlan, PlanNode, Sorted};
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use rayon::slice::ParallelSliceMut;

/// Above this size sorting is done on the rayon thread pool.
const PARALLEL_SORT_THRESHOLD: usize = 8192;

/// Materializes its parent and emits it ordered by active target.
///
/// The sort is stable and skipped when the input is already ordered.
pub struct Sort<'a> {
    parent: Option<BoxedPlan<'a>>,
    sorted: std::vec::IntoIter<ValidationTuple>,
    depth: usize,
}

impl<'a> Sort<'a> {
    #[expect(clippy::new_ret_no_self)]
    pub fn new(parent: BoxedPlan<'a>) -> Sorted<'a> {
        let depth = parent.depth() + 1;
        Sorted::assume_sorted(Box::new(Self {
            parent: Some(parent),
            sorted: Vec::new().into_iter(),
            depth,
        }))
    }

    fn materialize(parent: BoxedPlan<'a>) -> Result<Vec<ValidationTuple>, ShaclError> {
        let mut tuples = parent.collect::<Result<Vec<_>, _>>()?;
        if !tuples
            .windows(2)
            .all(|w| w[0].cmp_active_target(&w[1]).is_le())
        {
            if tuples.len() > PARALLEL_SORT_THRESHOLD {
                tuples.par_sort_by(ValidationTuple::cmp_active_target);
            } else {
                tuples.sort_by(ValidationTuple::cmp_active_target);
            }
        }
        Ok(tuples)
    }
}

impl Iterator for Sort<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(parent) = self.parent.take() {
            match Self::materialize(parent) {
                Ok(tuples) => self.sorted = tuples.into_iter(),
                Err(error) => return Some(Err(error)),
            }
        }
        self.sorted.next().map(Ok)
    }
}

impl PlanNode for Sort<'_> {
    fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::{collect, ex, plan_of, targets};

    #[test]
    fn test_sorts_by_active_target() {
        let sorted = collect(Sort::new(plan_of(targets(&["c", "a", "b"]))));
        assert_eq!(sorted, targets(&["a", "b", "c"]));
    }

    #[test]
    fn test_sort_is_stable_and_idempotent() {
        let input = vec![
            ValidationTuple::with_value(ex("b"), ex("2")),
            ValidationTuple::with_value(ex("a"), ex("9")),
            ValidationTuple::with_value(ex("b"), ex("1")),
        ];
        let once = collect(Sort::new(plan_of(input)));
        assert_eq!(once[0].value(), Some(&ex("9")));
        assert_eq!(once[1].value(), Some(&ex("2")));
        assert_eq!(once[2].value(), Some(&ex("1")));
        let twice = collect(Sort::new(plan_of(once.clone())));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_large_input_uses_same_order() {
        let names = (0..PARALLEL_SORT_THRESHOLD + 10)
            .rev()
            .map(|i| format!("n{i:06}"))
            .collect::<Vec<_>>();
        let input = names
            .iter()
            .map(|n| ValidationTuple::for_target(ex(n)))
            .collect::<Vec<_>>();
        let sorted = collect(Sort::new(plan_of(input)));
        assert!(
            sorted
                .windows(2)
                .all(|w| w[0].cmp_active_target(&w[1]).is_lt())
        );
    }
}
