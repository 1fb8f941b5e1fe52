use super::{BoxedPlan, PlanNode};
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use rustc_hash::FxHashSet;

/// Removes duplicated tuples, keeping the first occurrence.
///
/// The input order is preserved.
pub struct Unique<'a> {
    parent: BoxedPlan<'a>,
    seen: FxHashSet<ValidationTuple>,
}

impl<'a> Unique<'a> {
    pub fn new(parent: BoxedPlan<'a>) -> Self {
        Self {
            parent,
            seen: FxHashSet::default(),
        }
    }
}

impl Iterator for Unique<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let tuple = match self.parent.next()? {
                Ok(tuple) => tuple,
                Err(error) => return Some(Err(error)),
            };
            if !self.seen.contains(&tuple) {
                self.seen.insert(tuple.clone());
                return Some(Ok(tuple));
            }
        }
    }
}

impl PlanNode for Unique<'_> {
    fn depth(&self) -> usize {
        self.parent.depth() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::tests::{collect, plan_of, targets};

    #[test]
    fn test_removes_duplicates_in_order() {
        let unique = collect(Unique::new(plan_of(targets(&["b", "a", "b", "c", "a"]))));
        assert_eq!(unique, targets(&["b", "a", "c"]));
    }
}
