use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::error::UpdateError;
use crate::node::{Node, NodeId, NodeKind, TypeTag};
use crate::status::Status;

/// How a composite picks and combines its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Composite {
    /// Children in order until one does not succeed.
    Sequence { memory: bool },
    /// Children in order until one does not fail.
    Selector { memory: bool },
    /// Every child, every tick.
    Parallel(ParallelPolicy),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParallelPolicy {
    /// Succeeds once every child has succeeded; fails as soon as one fails.
    ///
    /// With `synchronise`, children that already succeeded are not ticked again until the
    /// parallel resolves.
    SuccessOnAll { synchronise: bool },
    /// Succeeds as soon as one child succeeds; fails only when every child has failed.
    SuccessOnOne,
    /// Succeeds once the children at the given indices have succeeded; fails as soon as any
    /// child fails.
    SuccessOnSelected {
        children: Vec<usize>,
        synchronise: bool,
    },
}

impl ParallelPolicy {
    fn synchronise(&self) -> bool {
        match self {
            Self::SuccessOnAll { synchronise } => *synchronise,
            Self::SuccessOnOne => false,
            Self::SuccessOnSelected { synchronise, .. } => *synchronise,
        }
    }

    fn outcome(&self, statuses: &[Status]) -> Status {
        if statuses.is_empty() {
            return Status::Success;
        }
        let succeeded = |i: &usize| statuses.get(*i) == Some(&Status::Success);
        match self {
            Self::SuccessOnAll { .. } => {
                if statuses.contains(&Status::Failure) {
                    Status::Failure
                } else if statuses.iter().all(|s| *s == Status::Success) {
                    Status::Success
                } else {
                    Status::Running
                }
            }
            Self::SuccessOnOne => {
                if statuses.contains(&Status::Success) {
                    Status::Success
                } else if statuses.iter().all(|s| *s == Status::Failure) {
                    Status::Failure
                } else {
                    Status::Running
                }
            }
            Self::SuccessOnSelected { children, .. } => {
                if statuses.contains(&Status::Failure) {
                    Status::Failure
                } else if children.iter().all(succeeded) {
                    Status::Success
                } else {
                    Status::Running
                }
            }
        }
    }
}

impl Composite {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Sequence { .. } => TypeTag::Sequence,
            Self::Selector { .. } => TypeTag::Selector,
            Self::Parallel(_) => TypeTag::Parallel,
        }
    }

    fn memory(&self) -> bool {
        match self {
            Self::Sequence { memory } | Self::Selector { memory } => *memory,
            Self::Parallel(_) => false,
        }
    }

    pub(crate) fn validate(&self, child_count: usize) -> Result<(), String> {
        match self {
            Self::Parallel(ParallelPolicy::SuccessOnSelected { children, .. }) => {
                if children.is_empty() {
                    return Err("no children selected for success".to_string());
                }
                match children.iter().find(|i| **i >= child_count) {
                    Some(i) => Err(format!(
                        "selected child {i} out of range ({child_count} children)"
                    )),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

impl Arena {
    fn strategy(&self, id: NodeId) -> Option<(&Composite, Option<usize>)> {
        match &self.node(id).kind {
            NodeKind::Composite { strategy, current } => Some((strategy, *current)),
            _ => None,
        }
    }

    /// Sequence and selector share one walk: `pass` is the status that moves on to the next
    /// child (`SUCCESS` for a sequence, `FAILURE` for a selector).
    pub(crate) fn tick_ordered(
        &mut self,
        id: NodeId,
        pass: Status,
        visit: &mut dyn FnMut(&Node),
    ) -> Result<Status, UpdateError> {
        // The cursor was cleared in initialise unless the composite was already RUNNING.
        let start = match self.strategy(id) {
            Some((strategy, current)) if strategy.memory() => current.unwrap_or(0),
            _ => 0,
        };

        let count = self.child_count(id);
        for index in start..count {
            let child = self.child(id, index);
            let status = self.tick(child, visit)?;
            if status == pass {
                continue;
            }
            self.set_current(id, Some(index));
            self.stop_children(id, index + 1);
            return Ok(status);
        }

        self.set_current(id, count.checked_sub(1));
        Ok(pass)
    }

    pub(crate) fn tick_parallel(
        &mut self,
        id: NodeId,
        visit: &mut dyn FnMut(&Node),
    ) -> Result<Status, UpdateError> {
        let synchronise = match self.strategy(id) {
            Some((Composite::Parallel(policy), _)) => policy.synchronise(),
            _ => false,
        };

        let count = self.child_count(id);
        for index in 0..count {
            let child = self.child(id, index);
            if synchronise && self.status(child) == Status::Success {
                continue;
            }
            self.tick(child, visit)?;
        }

        let statuses: Vec<Status> = self
            .node(id)
            .children
            .iter()
            .map(|child| self.status(*child))
            .collect();
        let status = match self.strategy(id) {
            Some((Composite::Parallel(policy), _)) => policy.outcome(&statuses),
            _ => Status::Failure,
        };

        if status != Status::Running {
            for index in 0..count {
                let child = self.child(id, index);
                if self.status(child) == Status::Running {
                    self.stop(child, Status::Invalid);
                }
            }
        }
        self.set_current(id, count.checked_sub(1));
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Status::{Failure, Running, Success};

    #[test]
    fn success_on_all_waits_for_everyone() {
        let policy = ParallelPolicy::SuccessOnAll { synchronise: false };
        assert_eq!(policy.outcome(&[Success, Running]), Running);
        assert_eq!(policy.outcome(&[Success, Success]), Success);
        assert_eq!(policy.outcome(&[Running, Failure]), Failure);
    }

    #[test]
    fn success_on_one_fails_only_when_all_fail() {
        let policy = ParallelPolicy::SuccessOnOne;
        assert_eq!(policy.outcome(&[Failure, Running]), Running);
        assert_eq!(policy.outcome(&[Failure, Success]), Success);
        assert_eq!(policy.outcome(&[Failure, Failure]), Failure);
    }

    #[test]
    fn success_on_selected_ignores_unselected_runners() {
        let policy = ParallelPolicy::SuccessOnSelected {
            children: vec![1],
            synchronise: false,
        };
        assert_eq!(policy.outcome(&[Running, Success]), Success);
        assert_eq!(policy.outcome(&[Success, Running]), Running);
        assert_eq!(policy.outcome(&[Failure, Success]), Failure);
    }

    #[test]
    fn empty_parallel_succeeds() {
        assert_eq!(ParallelPolicy::SuccessOnOne.outcome(&[]), Success);
    }

    #[test]
    fn selected_indices_are_validated() {
        let parallel = |children: Vec<usize>| {
            Composite::Parallel(ParallelPolicy::SuccessOnSelected {
                children,
                synchronise: false,
            })
        };
        assert!(parallel(vec![]).validate(2).is_err());
        assert!(parallel(vec![2]).validate(2).is_err());
        assert!(parallel(vec![0, 1]).validate(2).is_ok());
    }
}
