/*!
# Random-walk Metropolis sampler

Samples a single real parameter from an unnormalized posterior
`w(theta) = likelihood(theta) * prior(theta)`. The likelihood is required, the prior is
optional (a flat prior is assumed when it is absent), and both are opaque [`Density`]
values supplied by the caller.

Each iteration proposes `x' = propose(x, scale)`, compares `log w(x')` with `log w(x)` and
applies the rule in [`metropolis_accept`]. The resulting value is appended to the chain, so
a run configured for `N` iterations returns exactly `N` values, the first of which is the
initial value.

## Overview

- **Configuration**: [`SamplerConfig`] holds the initial value, iteration count, proposal
  scale, zero-weight policy and an optional seed. It is checked once, when the sampler is
  built.
- **Reproducibility**: with a seed set, [`Metropolis::run`] is deterministic. Parallel
  chains from [`Metropolis::run_chains`] use `seed + i` for chain `i`.
- **Early termination**: [`Metropolis::run_cancellable`] and [`Metropolis::run_until`]
  return a [`RunOutcome::Partial`] chain when stopped.

## Example Usage

```rust
use mini_metropolis::distributions::{NormalLikelihood, NormalPrior};
use mini_metropolis::metropolis::{Metropolis, SamplerConfig};

let config = SamplerConfig::new(150.0_f64, 5_000, 2.0).set_seed(42);
let sampler = Metropolis::builder(config)
    .likelihood(NormalLikelihood::new(144.0, 15.0))
    .prior(NormalPrior::new(130.0, 5.0))
    .build()
    .unwrap();

let chain = sampler.run().unwrap();
assert_eq!(chain.len(), 5_000);
assert_eq!(chain.initial(), 150.0);
```
*/

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use num_traits::Float;
use rand::prelude::*;
use rand_distr::{Standard, StandardNormal};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::acceptance::{metropolis_accept, AcceptanceDecision, ZeroWeightPolicy};
use crate::chain::{Chain, ChainRecorder, RunOutcome};
use crate::distributions::{Density, GaussianRandomWalk, Proposal};
use crate::error::{ConfigError, DensityRole, Result, SamplerError};
use crate::stats::AcceptanceTracker;

/// A density shared across worker threads.
pub type BoxedDensity<T> = Box<dyn Density<T> + Send + Sync>;

/// A proposal shared across worker threads.
pub type BoxedProposal<T> = Box<dyn Proposal<T> + Send + Sync>;

const PROGRESS_WINDOW: usize = 100;

pub(crate) fn as_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// Settings of a single run. Checked by [`SamplerConfig::validate`] before sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig<T> {
    /// Value stored at index 0 of the chain.
    pub initial_value: T,
    /// Length of the returned chain, including the initial value.
    pub iterations: usize,
    /// Standard deviation of the random-walk proposal.
    pub proposal_scale: T,
    pub zero_weight_policy: ZeroWeightPolicy,
    /// Seed for [`Metropolis::run`]. Drawn from entropy when `None`.
    pub seed: Option<u64>,
}

impl<T: Float> SamplerConfig<T> {
    pub fn new(initial_value: T, iterations: usize, proposal_scale: T) -> Self {
        Self {
            initial_value,
            iterations,
            proposal_scale,
            zero_weight_policy: ZeroWeightPolicy::default(),
            seed: None,
        }
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn zero_weight_policy(mut self, policy: ZeroWeightPolicy) -> Self {
        self.zero_weight_policy = policy;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::InvalidIterations(self.iterations));
        }
        if !(self.proposal_scale.is_finite() && self.proposal_scale > T::zero()) {
            return Err(ConfigError::InvalidProposalScale(as_f64(self.proposal_scale)));
        }
        if !self.initial_value.is_finite() {
            return Err(ConfigError::InvalidInitialValue(as_f64(self.initial_value)));
        }
        Ok(())
    }
}

/// Cooperative cancellation flag, checked once per iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Collects the pieces of a [`Metropolis`] sampler.
pub struct MetropolisBuilder<T> {
    config: SamplerConfig<T>,
    likelihood: Option<BoxedDensity<T>>,
    prior: Option<BoxedDensity<T>>,
    proposal: Option<BoxedProposal<T>>,
}

impl<T> MetropolisBuilder<T>
where
    T: Float + Send + Sync + 'static,
    Standard: Distribution<T>,
    StandardNormal: Distribution<T>,
{
    pub fn likelihood<L>(mut self, likelihood: L) -> Self
    where
        L: Density<T> + Send + Sync + 'static,
    {
        self.likelihood = Some(Box::new(likelihood));
        self
    }

    pub fn prior<P>(mut self, prior: P) -> Self
    where
        P: Density<T> + Send + Sync + 'static,
    {
        self.prior = Some(Box::new(prior));
        self
    }

    /// Replaces the default [`GaussianRandomWalk`] proposal.
    pub fn proposal<Q>(mut self, proposal: Q) -> Self
    where
        Q: Proposal<T> + Send + Sync + 'static,
    {
        self.proposal = Some(Box::new(proposal));
        self
    }

    pub fn build(self) -> std::result::Result<Metropolis<T>, ConfigError> {
        self.config.validate()?;
        let likelihood = self.likelihood.ok_or(ConfigError::MissingLikelihood)?;
        Ok(Metropolis {
            config: self.config,
            likelihood,
            prior: self.prior,
            proposal: self
                .proposal
                .unwrap_or_else(|| Box::new(GaussianRandomWalk)),
        })
    }
}

/**
The random-walk Metropolis sampler.

A `Metropolis` value is immutable and may be shared between threads; every run owns its
own [`Chain`] and random source.
*/
pub struct Metropolis<T> {
    config: SamplerConfig<T>,
    likelihood: BoxedDensity<T>,
    prior: Option<BoxedDensity<T>>,
    proposal: BoxedProposal<T>,
}

impl<T> Metropolis<T>
where
    T: Float + Send + Sync + 'static,
    Standard: Distribution<T>,
    StandardNormal: Distribution<T>,
{
    pub fn builder(config: SamplerConfig<T>) -> MetropolisBuilder<T> {
        MetropolisBuilder {
            config,
            likelihood: None,
            prior: None,
            proposal: None,
        }
    }

    pub fn config(&self) -> &SamplerConfig<T> {
        &self.config
    }

    /// Unnormalized log posterior weight `log likelihood(theta) + log prior(theta)`.
    ///
    /// Fails if either term is NaN or `+inf`.
    pub fn log_weight(&self, theta: T, iteration: usize) -> Result<T> {
        let lik = checked_log_density(&*self.likelihood, theta, iteration, DensityRole::Likelihood)?;
        let prior = match &self.prior {
            Some(prior) => checked_log_density(&**prior, theta, iteration, DensityRole::Prior)?,
            None => T::zero(),
        };
        Ok(lik + prior)
    }

    /// Runs one chain with a generator seeded from the configured seed, or from entropy.
    pub fn run(&self) -> Result<Chain<T>> {
        let mut rng = self.make_rng(0);
        self.run_with_rng(&mut rng)
    }

    /// Runs one chain drawing proposals and uniforms from `rng`.
    pub fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Chain<T>> {
        self.sample(rng, || false, |_| {}).map(RunOutcome::into_chain)
    }

    /// Runs until complete or until `token` is cancelled, whichever comes first.
    pub fn run_cancellable<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        token: &CancelToken,
    ) -> Result<RunOutcome<T>> {
        self.sample(rng, || token.is_cancelled(), |_| {})
    }

    /// Runs until complete or until `deadline` has passed.
    pub fn run_until<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        deadline: Instant,
    ) -> Result<RunOutcome<T>> {
        self.sample(rng, || Instant::now() >= deadline, |_| {})
    }

    /// Like [`Metropolis::run`], but shows a progress bar with the recent acceptance rate.
    pub fn run_progress(&self) -> Result<Chain<T>> {
        let pb = ProgressBar::new(self.config.iterations.saturating_sub(1) as u64);
        pb.set_style(progress_style());
        pb.set_prefix("Chain 0");
        let mut rng = self.make_rng(0);
        let chain = self.run_with_progress(&mut rng, &pb)?;
        pb.finish_with_message(format!("p(accept)={:.2}", chain.acceptance_rate()));
        Ok(chain)
    }

    /// Runs `n_chains` independent chains in parallel. Chain `i` is seeded with `seed + i`.
    pub fn run_chains(&self, n_chains: usize) -> Result<Vec<Chain<T>>> {
        let seed = self.base_seed();
        trace_info!(n_chains, seed, "running independent chains");
        (0..n_chains)
            .into_par_iter()
            .map(|i| {
                let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(i as u64));
                self.run_with_rng(&mut rng)
            })
            .collect()
    }

    /// Parallel chains with one progress bar each.
    pub fn run_chains_progress(&self, n_chains: usize) -> Result<Vec<Chain<T>>> {
        let seed = self.base_seed();
        let multi = MultiProgress::new();
        let style = progress_style();
        let n_steps = self.config.iterations.saturating_sub(1) as u64;

        (0..n_chains)
            .into_par_iter()
            .map(|i| -> Result<Chain<T>> {
                let pb = multi.add(ProgressBar::new(n_steps));
                pb.set_prefix(format!("Chain {i}"));
                pb.set_style(style.clone());
                let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(i as u64));
                let chain = self.run_with_progress(&mut rng, &pb)?;
                pb.finish_with_message(format!("p(accept)={:.2}", chain.acceptance_rate()));
                Ok(chain)
            })
            .collect()
    }

    fn run_with_progress<R: Rng + ?Sized>(&self, rng: &mut R, pb: &ProgressBar) -> Result<Chain<T>> {
        let mut tracker = AcceptanceTracker::new(PROGRESS_WINDOW);
        self.sample(
            rng,
            || false,
            |decision| {
                tracker.step(decision.accepted);
                pb.inc(1);
                if tracker.steps() % PROGRESS_WINDOW as u64 == 0 {
                    pb.set_message(format!("p(accept)={:.2}", tracker.recent_rate()));
                }
            },
        )
        .map(RunOutcome::into_chain)
    }

    fn base_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(|| thread_rng().gen::<u64>())
    }

    fn make_rng(&self, chain: u64) -> SmallRng {
        match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(chain)),
            None => SmallRng::from_entropy(),
        }
    }

    /// The sampling loop. `stop` is polled before every iteration, `on_step` sees every
    /// acceptance decision.
    fn sample<R, S, F>(&self, mut rng: &mut R, stop: S, mut on_step: F) -> Result<RunOutcome<T>>
    where
        R: Rng + ?Sized,
        S: Fn() -> bool,
        F: FnMut(&AcceptanceDecision<T>),
    {
        let SamplerConfig {
            initial_value,
            iterations,
            proposal_scale,
            zero_weight_policy,
            ..
        } = self.config;

        trace_info!(
            iterations,
            initial_value = as_f64(initial_value),
            proposal_scale = as_f64(proposal_scale),
            policy = ?zero_weight_policy,
            "starting metropolis run"
        );

        let mut recorder = ChainRecorder::new(initial_value, iterations);
        let mut current_lw = self.log_weight(initial_value, 0).inspect_err(log_failure)?;

        while !recorder.is_full() {
            if stop() {
                trace_info!(iteration = recorder.len(), "run stopped early");
                break;
            }
            let iteration = recorder.len();
            let current = recorder.current();
            let proposed = self.proposal.propose(current, proposal_scale, &mut rng);
            let proposed_lw = self.log_weight(proposed, iteration).inspect_err(log_failure)?;
            let decision = metropolis_accept(current_lw, proposed_lw, zero_weight_policy, &mut *rng);

            if decision.degenerate {
                trace_debug!(iteration, current = as_f64(current), proposed = as_f64(proposed), "zero posterior weight on both sides");
                if zero_weight_policy == ZeroWeightPolicy::Fail {
                    let err = SamplerError::DegenerateRatio {
                        iteration,
                        current: as_f64(current),
                        proposed: as_f64(proposed),
                    };
                    log_failure(&err);
                    return Err(err);
                }
            }
            let next = if decision.accepted {
                current_lw = proposed_lw;
                proposed
            } else {
                current
            };
            recorder.push(next, decision.accepted, decision.degenerate);
            on_step(&decision);
        }

        let outcome = recorder.finish();
        trace_info!(
            len = outcome.chain().len(),
            complete = outcome.is_complete(),
            acceptance_rate = outcome.chain().acceptance_rate(),
            "metropolis run finished"
        );
        Ok(outcome)
    }
}

/// Runs a single chain: the one-call form of the sampler.
///
/// `prior` takes any density, closures included. `None` means a flat prior; since the
/// type cannot be inferred from `None` alone, write it as `None::<FlatPrior>`.
///
/// ```rust
/// use mini_metropolis::distributions::{FlatPrior, NormalLikelihood};
/// use mini_metropolis::metropolis::{run, SamplerConfig};
/// use rand::{rngs::SmallRng, SeedableRng};
///
/// let mut rng = SmallRng::seed_from_u64(7);
/// let config = SamplerConfig::new(150.0_f64, 100, 2.0);
/// let chain = run(config, NormalLikelihood::new(144.0, 15.0), None::<FlatPrior>, &mut rng).unwrap();
/// assert_eq!(chain.len(), 100);
///
/// // A closure works as the prior just as it does as the likelihood.
/// let half_line = |theta: f64| if theta > 0.0 { 1.0 } else { 0.0 };
/// let chain = run(config, NormalLikelihood::new(144.0, 15.0), Some(half_line), &mut rng).unwrap();
/// assert!(chain.iter().all(|&x| x > 0.0));
/// ```
pub fn run<T, L, P, R>(
    config: SamplerConfig<T>,
    likelihood: L,
    prior: Option<P>,
    rng: &mut R,
) -> Result<Chain<T>>
where
    T: Float + Send + Sync + 'static,
    L: Density<T> + Send + Sync + 'static,
    P: Density<T> + Send + Sync + 'static,
    R: Rng + ?Sized,
    Standard: Distribution<T>,
    StandardNormal: Distribution<T>,
{
    let mut builder = Metropolis::builder(config).likelihood(likelihood);
    if let Some(prior) = prior {
        builder = builder.prior(prior);
    }
    builder.build()?.run_with_rng(rng)
}

/// The raw density is only re-evaluated on failure, so the error shows what the caller returned.
fn checked_log_density<T, D>(density: &D, theta: T, iteration: usize, role: DensityRole) -> Result<T>
where
    T: Float,
    D: Density<T> + ?Sized,
{
    let log_value = density.log_density(theta);
    if log_value.is_nan() || log_value == T::infinity() {
        return Err(SamplerError::Numerical {
            iteration,
            theta: as_f64(theta),
            role,
            density: as_f64(density.density(theta)),
            log_value: as_f64(log_value),
        });
    }
    Ok(log_value)
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

#[allow(unused_variables)]
fn log_failure(err: &SamplerError) {
    trace_info!(error = %err, "metropolis run failed");
}
