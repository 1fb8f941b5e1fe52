//! Shared-upstream plan nodes with several outputs.
//!
//! A [`Router`] pulls from its parents and dispatches tuples to numbered outlets.
//! Outputs are buffered only while their [`Outlet`] is alive: dropping an outlet closes its queue
//! and once all the outlets are gone the router, and with it the whole upstream plan, is released.

use super::PlanNode;
use crate::error::ShaclError;
use crate::tuple::ValidationTuple;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Dispatches upstream tuples to outlets.
pub(crate) trait Router {
    /// Pulls upstream once and pushes zero or more tuples.
    ///
    /// Returns `false` when the upstream is exhausted.
    fn advance(&mut self, outlets: &mut Outlets) -> Result<bool, ShaclError>;

    fn depth(&self) -> usize;
}

/// Output queues of a router, `None` marking a closed outlet.
pub(crate) struct Outlets {
    queues: Vec<Option<VecDeque<ValidationTuple>>>,
}

impl Outlets {
    pub fn push(&mut self, index: usize, tuple: ValidationTuple) {
        if let Some(Some(queue)) = self.queues.get_mut(index) {
            queue.push_back(tuple);
        }
    }

    pub fn is_open(&self, index: usize) -> bool {
        matches!(self.queues.get(index), Some(Some(_)))
    }

    fn pop(&mut self, index: usize) -> Option<ValidationTuple> {
        self.queues.get_mut(index)?.as_mut()?.pop_front()
    }

    fn close(&mut self, index: usize) {
        if let Some(queue) = self.queues.get_mut(index) {
            *queue = None;
        }
    }

    fn all_closed(&self) -> bool {
        self.queues.iter().all(Option::is_none)
    }
}

struct Shared<'a> {
    router: Option<Box<dyn Router + 'a>>,
    outlets: Outlets,
    depth: usize,
}

/// One output of a forked plan node.
pub struct Outlet<'a> {
    shared: Rc<RefCell<Shared<'a>>>,
    index: usize,
}

/// Splits `router` into `N` outlets.
pub(crate) fn fork<'a, const N: usize>(router: impl Router + 'a) -> [Outlet<'a>; N] {
    let depth = router.depth();
    let shared = Rc::new(RefCell::new(Shared {
        router: Some(Box::new(router)),
        outlets: Outlets {
            queues: (0..N).map(|_| Some(VecDeque::new())).collect(),
        },
        depth,
    }));
    std::array::from_fn(|index| Outlet {
        shared: Rc::clone(&shared),
        index,
    })
}

impl Iterator for Outlet<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut shared = self.shared.borrow_mut();
        let Shared {
            router, outlets, ..
        } = &mut *shared;
        loop {
            if let Some(tuple) = outlets.pop(self.index) {
                return Some(Ok(tuple));
            }
            match router.as_mut()?.advance(outlets) {
                Ok(true) => (),
                Ok(false) => *router = None,
                Err(error) => {
                    *router = None;
                    return Some(Err(error));
                }
            }
        }
    }
}

impl PlanNode for Outlet<'_> {
    fn depth(&self) -> usize {
        self.shared.borrow().depth
    }
}

impl Drop for Outlet<'_> {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            shared.outlets.close(self.index);
            if shared.outlets.all_closed() {
                shared.router = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::BoxedPlan;
    use crate::plan::tests::{ex, plan_of, targets};

    /// Sends each tuple to outlet 0 and to outlet 1.
    struct Duplicate<'a> {
        parent: BoxedPlan<'a>,
    }

    impl Router for Duplicate<'_> {
        fn advance(&mut self, outlets: &mut Outlets) -> Result<bool, ShaclError> {
            let Some(tuple) = self.parent.next().transpose()? else {
                return Ok(false);
            };
            outlets.push(0, tuple.clone());
            outlets.push(1, tuple);
            Ok(true)
        }

        fn depth(&self) -> usize {
            self.parent.depth() + 1
        }
    }

    #[test]
    fn test_outlets_are_independent() {
        let [first, second] = fork(Duplicate {
            parent: plan_of(targets(&["a", "b", "c"])),
        });
        assert_eq!(first.depth(), 2);
        let first = first.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(first, targets(&["a", "b", "c"]));
        let second = second.collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_dropped_outlet_is_not_buffered() {
        let [mut first, second] = fork(Duplicate {
            parent: plan_of(targets(&["a", "b"])),
        });
        drop(second);
        assert_eq!(first.next().unwrap().unwrap().active_target(), &ex("a"));
        {
            let shared = first.shared.borrow();
            assert!(!shared.outlets.is_open(1));
            assert!(shared.outlets.queues[1].is_none());
        }
        assert_eq!(first.count(), 1);
    }
}
