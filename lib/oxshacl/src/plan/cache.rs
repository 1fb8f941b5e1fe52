use super::PlanNode;
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use std::sync::Arc;

/// Replays materialized tuples.
pub struct CachedPlan {
    tuples: Arc<[ValidationTuple]>,
    position: usize,
}

impl CachedPlan {
    pub fn new(tuples: Arc<[ValidationTuple]>) -> Self {
        Self {
            tuples,
            position: 0,
        }
    }
}

impl Iterator for CachedPlan {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        let tuple = self.tuples.get(self.position)?.clone();
        self.position += 1;
        Some(Ok(tuple))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tuples.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl PlanNode for CachedPlan {
    fn depth(&self) -> usize {
        1
    }
}
