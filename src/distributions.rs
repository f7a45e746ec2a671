/*!
Density providers and proposal generators for the single-parameter Metropolis sampler.

A [`Density`] maps a candidate parameter value to a non-negative, not necessarily
normalized weight. It plays one of two roles in a run: the *likelihood* of fixed observed
data given the parameter, or an optional *prior* over the parameter. Any closure
`Fn(T) -> T` is a density, so callers can pass opaque callables directly.

A [`Proposal`] perturbs the current value. The random source is passed in by the sampler,
so proposals hold no state of their own.

# Examples

```rust
use mini_metropolis::distributions::{Density, NormalLikelihood, NormalPrior};

// One observation of 144 with a known standard deviation of 15.
let likelihood = NormalLikelihood::new(144.0_f64, 15.0);
let prior = NormalPrior::new(130.0_f64, 5.0);

let w = likelihood.density(140.0) * prior.density(140.0);
assert!(w > 0.0);

// Closures work as densities too.
let flat = |_theta: f64| 1.0;
assert_eq!(flat.log_density(3.0), 0.0);
```
*/

use num_traits::Float;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

/// Converts an `f64` literal into the working float type.
pub(crate) fn lit<T: Float>(x: f64) -> T {
    T::from(x).unwrap()
}

/// An unnormalized density over a scalar parameter.
pub trait Density<T: Float> {
    /// Returns the density at `theta`. Must be finite and non-negative.
    fn density(&self, theta: T) -> T;

    /// Returns the log-density at `theta`.
    ///
    /// The default takes the logarithm of [`Density::density`]. Implementations with a
    /// closed form should override it so that far-tail values stay finite instead of
    /// underflowing to `-inf`.
    fn log_density(&self, theta: T) -> T {
        self.density(theta).ln()
    }
}

impl<T, F> Density<T> for F
where
    T: Float,
    F: Fn(T) -> T,
{
    fn density(&self, theta: T) -> T {
        self(theta)
    }
}

/// Generates candidate values for a random-walk Metropolis chain.
pub trait Proposal<T: Float> {
    /// Draws a candidate near `current`. `scale` is the positive tuning width.
    fn propose(&self, current: T, scale: T, rng: &mut dyn RngCore) -> T;
}

fn normal_log_pdf<T: Float>(x: T, mean: T, sd: T) -> T {
    let z = (x - mean) / sd;
    -lit::<T>(0.5) * (lit::<T>(2.0 * PI)).ln() - sd.ln() - lit::<T>(0.5) * z * z
}

/**
Likelihood of a single observation under a normal distribution with unknown mean `theta`
and known standard deviation `sd`.

# Examples

```rust
use mini_metropolis::distributions::{Density, NormalLikelihood};

let lik = NormalLikelihood::new(144.0_f64, 15.0);
// The likelihood peaks where theta equals the observation.
assert!(lik.density(144.0) > lik.density(150.0));
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalLikelihood<T: Float> {
    pub observed: T,
    pub sd: T,
}

impl<T: Float> NormalLikelihood<T> {
    pub fn new(observed: T, sd: T) -> Self {
        Self { observed, sd }
    }

    /// Mean and standard deviation of the posterior under a flat (improper) prior.
    pub fn flat_posterior(&self) -> (T, T) {
        (self.observed, self.sd)
    }

    /// Mean and standard deviation of the posterior under a normal prior over `theta`.
    ///
    /// Uses the usual precision-weighted update for a normal mean with known variance.
    pub fn conjugate_posterior(&self, prior: &NormalPrior<T>) -> (T, T) {
        let tau_lik = (self.sd * self.sd).recip();
        let tau_prior = (prior.sd * prior.sd).recip();
        let tau = tau_lik + tau_prior;
        let mean = (self.observed * tau_lik + prior.mean * tau_prior) / tau;
        (mean, tau.recip().sqrt())
    }
}

impl<T: Float> Density<T> for NormalLikelihood<T> {
    fn density(&self, theta: T) -> T {
        self.log_density(theta).exp()
    }

    fn log_density(&self, theta: T) -> T {
        normal_log_pdf(self.observed, theta, self.sd)
    }
}

/// A normal prior over the parameter itself: `Normal(mean, sd)` evaluated at `theta`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalPrior<T: Float> {
    pub mean: T,
    pub sd: T,
}

impl<T: Float> NormalPrior<T> {
    pub fn new(mean: T, sd: T) -> Self {
        Self { mean, sd }
    }
}

impl<T: Float> Density<T> for NormalPrior<T> {
    fn density(&self, theta: T) -> T {
        self.log_density(theta).exp()
    }

    fn log_density(&self, theta: T) -> T {
        normal_log_pdf(theta, self.mean, self.sd)
    }
}

/**
The prior-weighting used in the textbook walkthrough: a normal density with fixed
hyperparameters evaluated at the *observed value*, not at `theta`.

This is not a Bayesian update. The factor does not depend on `theta`, so it scales the
current and proposed weights equally and leaves every acceptance ratio unchanged. A chain
run with it targets the same posterior as a flat prior. Use [`NormalPrior`] for a prior
that actually shifts the posterior.

# Examples

```rust
use mini_metropolis::distributions::{Density, ObservedPointPrior};

let prior = ObservedPointPrior::new(130.0_f64, 5.0, 144.0);
assert_eq!(prior.density(100.0), prior.density(200.0));
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedPointPrior<T: Float> {
    pub mean: T,
    pub sd: T,
    pub observed: T,
}

impl<T: Float> ObservedPointPrior<T> {
    pub fn new(mean: T, sd: T, observed: T) -> Self {
        Self { mean, sd, observed }
    }
}

impl<T: Float> Density<T> for ObservedPointPrior<T> {
    fn density(&self, theta: T) -> T {
        self.log_density(theta).exp()
    }

    fn log_density(&self, _theta: T) -> T {
        normal_log_pdf(self.observed, self.mean, self.sd)
    }
}

/// Constant density of one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatPrior;

impl<T: Float> Density<T> for FlatPrior {
    fn density(&self, _theta: T) -> T {
        T::one()
    }

    fn log_density(&self, _theta: T) -> T {
        T::zero()
    }
}

/**
Symmetric random-walk proposal: `current + Normal(0, scale)`.

# Examples

```rust
use mini_metropolis::distributions::{GaussianRandomWalk, Proposal};
use rand::{rngs::SmallRng, SeedableRng};

let mut rng = SmallRng::seed_from_u64(42);
let candidate: f64 = GaussianRandomWalk.propose(150.0, 2.0, &mut rng);
assert!(candidate.is_finite());
```
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaussianRandomWalk;

impl<T> Proposal<T> for GaussianRandomWalk
where
    T: Float,
    StandardNormal: Distribution<T>,
{
    fn propose(&self, current: T, scale: T, rng: &mut dyn RngCore) -> T {
        let z: T = StandardNormal.sample(rng);
        current + scale * z
    }
}
