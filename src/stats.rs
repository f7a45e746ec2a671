//! Summary statistics for finished chains and a rolling acceptance-rate tracker.

use ndarray::prelude::*;
use ndarray_stats::QuantileExt;
use num_traits::Float;
use std::collections::VecDeque;

use crate::chain::Chain;

/// Tracks the acceptance rate over the most recent `window` transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceTracker {
    window: usize,
    n: u64,
    n_accepted: u64,
    p_accept: f32,
    accept_queue: VecDeque<bool>,
}

impl AcceptanceTracker {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            n: 0,
            n_accepted: 0,
            p_accept: 0.0,
            accept_queue: VecDeque::with_capacity(window.max(1) + 1),
        }
    }

    pub fn step(&mut self, accepted: bool) {
        self.n += 1;
        self.n_accepted += accepted as u64;

        let old_len = self.accept_queue.len() as f32;
        self.accept_queue.push_back(accepted);
        let removed = if self.accept_queue.len() > self.window {
            self.accept_queue.pop_front().unwrap_or(false)
        } else {
            false
        };
        let new_len = self.accept_queue.len() as f32;
        self.p_accept = (self.p_accept * old_len + (accepted as i32) as f32
            - (removed as i32) as f32)
            / new_len;
    }

    /// Acceptance rate over the current window.
    pub fn recent_rate(&self) -> f32 {
        self.p_accept
    }

    /// Acceptance rate over every transition seen so far.
    pub fn overall_rate(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.n_accepted as f64 / self.n as f64
        }
    }

    pub fn steps(&self) -> u64 {
        self.n
    }
}

/// Location and spread of a set of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSummary {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (`n - 1` denominator).
    pub sd: f64,
    pub min: f64,
    pub max: f64,
}

impl ChainSummary {
    /// Returns `None` for an empty slice or one holding a NaN.
    pub fn from_samples<T: Float>(samples: &[T]) -> Option<Self> {
        let arr: Array1<f64> = samples.iter().map(|x| x.to_f64()).collect::<Option<_>>()?;
        let mean = arr.mean()?;
        let sd = if arr.len() > 1 { arr.std(1.0) } else { 0.0 };
        let min = *arr.min().ok()?;
        let max = *arr.max().ok()?;
        Some(Self {
            n: arr.len(),
            mean,
            sd,
            min,
            max,
        })
    }
}

/// Summary of the post burn-in values of several chains pooled together.
pub fn pooled_summary<T: Float>(chains: &[Chain<T>], burn_in: usize) -> Option<ChainSummary> {
    let pooled: Vec<T> = chains
        .iter()
        .flat_map(|c| c.after_burn_in(burn_in).iter().copied())
        .collect();
    ChainSummary::from_samples(&pooled)
}
