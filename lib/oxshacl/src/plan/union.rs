use super::{BoxedPlan, PlanNode};
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;

/// Concatenates its parents.
pub struct Union<'a> {
    parents: std::vec::IntoIter<BoxedPlan<'a>>,
    current: Option<BoxedPlan<'a>>,
    depth: usize,
}

impl<'a> Union<'a> {
    pub fn new(parents: Vec<BoxedPlan<'a>>) -> Self {
        let depth = parents.iter().map(|p| p.depth()).max().unwrap_or(0) + 1;
        let mut parents = parents.into_iter();
        Self {
            current: parents.next(),
            parents,
            depth,
        }
    }
}

impl Iterator for Union<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tuple) = self.current.as_mut()?.next() {
                return Some(tuple);
            }
            self.current = self.parents.next();
        }
    }
}

impl PlanNode for Union<'_> {
    fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::EmptyPlan;
    use crate::plan::tests::{collect, plan_of, targets};

    #[test]
    fn test_concatenates() {
        let union = Union::new(vec![
            plan_of(targets(&["b"])),
            Box::new(EmptyPlan),
            plan_of(targets(&["a", "b"])),
        ]);
        assert_eq!(union.depth(), 2);
        assert_eq!(collect(union), targets(&["b", "a", "b"]));
        assert_eq!(collect(Union::new(Vec::new())).len(), 0);
    }
}
