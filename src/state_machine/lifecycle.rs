//! # Status Lifecycle
//!
//! An ordered, fixed sequence of uniquely named statuses. Answers positional
//! queries (next, previous, arbitrary offsets) and compares two statuses by their
//! position, which is how callers test whether an entity has passed a milestone.

use super::errors::{LifecycleError, LifecycleResult};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Bound for values usable as lifecycle statuses
pub trait LifecycleStatus:
    Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
}

impl<T> LifecycleStatus for T where
    T: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
}

/// Ordered sequence of unique statuses
#[derive(Debug, Clone)]
pub struct StatusLifecycle<S: LifecycleStatus> {
    statuses: Vec<S>,
    positions: HashMap<S, usize>,
}

impl<S: LifecycleStatus> StatusLifecycle<S> {
    /// Build a lifecycle, rejecting empty sequences and duplicate statuses
    pub fn new(statuses: impl IntoIterator<Item = S>) -> LifecycleResult<Self> {
        let statuses: Vec<S> = statuses.into_iter().collect();
        if statuses.is_empty() {
            return Err(LifecycleError::Empty);
        }

        let mut positions = HashMap::with_capacity(statuses.len());
        for (index, status) in statuses.iter().enumerate() {
            if positions.insert(status.clone(), index).is_some() {
                return Err(LifecycleError::DuplicateStatus {
                    status: status.to_string(),
                });
            }
        }

        Ok(Self {
            statuses,
            positions,
        })
    }

    pub fn statuses(&self) -> &[S] {
        &self.statuses
    }

    pub fn first(&self) -> &S {
        &self.statuses[0]
    }

    pub fn last(&self) -> &S {
        &self.statuses[self.statuses.len() - 1]
    }

    pub fn contains(&self, status: &S) -> bool {
        self.positions.contains_key(status)
    }

    /// Whether `status` is the final status of the lifecycle
    pub fn is_terminal(&self, status: &S) -> bool {
        self.last() == status
    }

    /// Zero-based position of a status
    pub fn position(&self, status: &S) -> LifecycleResult<usize> {
        self.positions
            .get(status)
            .copied()
            .ok_or_else(|| LifecycleError::UnknownStatus {
                status: status.to_string(),
            })
    }

    /// Status `offset` positions away from `current`
    pub fn by_offset(&self, current: &S, offset: isize) -> LifecycleResult<S> {
        let position = self.position(current)?;
        position
            .checked_add_signed(offset)
            .and_then(|target| self.statuses.get(target))
            .cloned()
            .ok_or_else(|| LifecycleError::InvalidStatus {
                status: current.to_string(),
                offset,
            })
    }

    /// Like [`by_offset`](Self::by_offset), but yields `None` instead of failing
    pub fn checked_by_offset(&self, current: &S, offset: isize) -> Option<S> {
        self.by_offset(current, offset).ok()
    }

    pub fn next(&self, current: &S) -> LifecycleResult<S> {
        self.by_offset(current, 1)
    }

    pub fn previous(&self, current: &S) -> LifecycleResult<S> {
        self.by_offset(current, -1)
    }

    /// Compare two statuses by lifecycle position
    pub fn compare(&self, a: &S, b: &S) -> LifecycleResult<Ordering> {
        Ok(self.position(a)?.cmp(&self.position(b)?))
    }

    /// Whether `current` is at or beyond `milestone`
    pub fn has_reached(&self, current: &S, milestone: &S) -> LifecycleResult<bool> {
        Ok(self.compare(current, milestone)? != Ordering::Less)
    }
}
