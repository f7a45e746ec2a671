/*!
The sequence of sampled values produced by one run.

A [`Chain`] can only be built by the sampler. While the run is going it is append-only;
once handed back it is immutable. Index 0 always holds the configured initial value.
*/

use ndarray::Array1;
use num_traits::Float;

use crate::stats::ChainSummary;

/// Whether a run reached its configured iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    Complete,
    /// Stopped early by cancellation or a deadline.
    Partial,
}

/// Ordered parameter values of a single run together with acceptance counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain<T> {
    values: Vec<T>,
    accepted: usize,
    degenerate: usize,
    status: ChainStatus,
}

impl<T: Float> Chain<T> {
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for chains returned by the sampler; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn initial(&self) -> T {
        self.values[0]
    }

    pub fn last(&self) -> T {
        self.values[self.values.len() - 1]
    }

    pub fn status(&self) -> ChainStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == ChainStatus::Complete
    }

    /// Number of transitions, i.e. `len() - 1`.
    pub fn transitions(&self) -> usize {
        self.values.len() - 1
    }

    /// Number of transitions that moved to the proposed value.
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Number of transitions where both posterior weights were zero.
    pub fn degenerate_steps(&self) -> usize {
        self.degenerate
    }

    /// Fraction of accepted transitions, or zero for a chain holding only its seed.
    pub fn acceptance_rate(&self) -> f64 {
        match self.transitions() {
            0 => 0.0,
            n => self.accepted as f64 / n as f64,
        }
    }

    /// The values after discarding the first `burn_in` entries.
    pub fn after_burn_in(&self, burn_in: usize) -> &[T] {
        &self.values[burn_in.min(self.values.len())..]
    }

    pub fn to_array(&self) -> Array1<T> {
        Array1::from(self.values.clone())
    }

    /// Summary statistics of the post burn-in values. `None` if nothing is left.
    pub fn summary(&self, burn_in: usize) -> Option<ChainSummary> {
        ChainSummary::from_samples(self.after_burn_in(burn_in))
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Result of a run that may be stopped early.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome<T> {
    Complete(Chain<T>),
    Partial(Chain<T>),
}

impl<T> RunOutcome<T> {
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete(_))
    }

    pub fn chain(&self) -> &Chain<T> {
        match self {
            RunOutcome::Complete(chain) | RunOutcome::Partial(chain) => chain,
        }
    }

    pub fn into_chain(self) -> Chain<T> {
        match self {
            RunOutcome::Complete(chain) | RunOutcome::Partial(chain) => chain,
        }
    }
}

/// Upper bound on the up-front allocation for very long runs.
const MAX_PREALLOC: usize = 1 << 20;

/// Append-only builder the sampler fills during a run.
#[derive(Debug)]
pub(crate) struct ChainRecorder<T> {
    values: Vec<T>,
    target_len: usize,
    accepted: usize,
    degenerate: usize,
}

impl<T: Float> ChainRecorder<T> {
    pub(crate) fn new(initial_value: T, target_len: usize) -> Self {
        let mut values = Vec::with_capacity(target_len.min(MAX_PREALLOC));
        values.push(initial_value);
        Self {
            values,
            target_len,
            accepted: 0,
            degenerate: 0,
        }
    }

    pub(crate) fn current(&self) -> T {
        self.values[self.values.len() - 1]
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.values.len() >= self.target_len
    }

    pub(crate) fn push(&mut self, value: T, accepted: bool, degenerate: bool) {
        debug_assert!(!self.is_full(), "chain already holds every requested value");
        self.values.push(value);
        self.accepted += accepted as usize;
        self.degenerate += degenerate as usize;
    }

    pub(crate) fn finish(self) -> RunOutcome<T> {
        let status = if self.is_full() {
            ChainStatus::Complete
        } else {
            ChainStatus::Partial
        };
        let chain = Chain {
            values: self.values,
            accepted: self.accepted,
            degenerate: self.degenerate,
            status,
        };
        match status {
            ChainStatus::Complete => RunOutcome::Complete(chain),
            ChainStatus::Partial => RunOutcome::Partial(chain),
        }
    }
}
