/*!
The Metropolis acceptance rule on log posterior weights.

For a symmetric proposal the move `x -> x'` is accepted with probability
`min(1, w(x') / w(x))`. Working with `log w` keeps the comparison meaningful when the
weights themselves would underflow or overflow: the test becomes

\[
\log u < \log w(x') - \log w(x), \qquad u \sim \text{Uniform}(0, 1).
\]

When `w(x') >= w(x)` the move is accepted outright and no uniform is drawn.
*/

use num_traits::Float;
use rand::Rng;
use rand_distr::{Distribution, Standard};

/// What to do when both the current and the proposed posterior weight are exactly zero,
/// which leaves the ratio `0 / 0` undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroWeightPolicy {
    /// Keep the current value. This is what a literal `0 / 0` comparison ends up doing.
    #[default]
    Reject,
    /// Move to the proposed value, letting the chain walk across a zero-density region.
    Accept,
    /// Abort the run with [`SamplerError::DegenerateRatio`](crate::error::SamplerError::DegenerateRatio).
    Fail,
}

/// Outcome of one accept/reject step. Not stored in the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceDecision<T> {
    pub current_log_weight: T,
    pub proposed_log_weight: T,
    pub accepted: bool,
    /// Whether a uniform variate was consumed to reach the decision.
    pub drew_uniform: bool,
    /// Both weights were zero; `accepted` follows the [`ZeroWeightPolicy`].
    pub degenerate: bool,
}

/// Probability of accepting a move, `min(1, exp(proposed - current))`.
///
/// Returns `None` when both log weights are `-inf`.
pub fn acceptance_probability<T: Float>(current_log_weight: T, proposed_log_weight: T) -> Option<T> {
    if current_log_weight == T::neg_infinity() && proposed_log_weight == T::neg_infinity() {
        return None;
    }
    if proposed_log_weight >= current_log_weight {
        Some(T::one())
    } else {
        Some((proposed_log_weight - current_log_weight).exp())
    }
}

/**
Decides whether to move from the current to the proposed value.

Both log weights must be either finite or `-inf` (a weight of exactly zero); NaN and
`+inf` are rejected by the sampler before this is called.

# Examples

```rust
use mini_metropolis::acceptance::{metropolis_accept, ZeroWeightPolicy};
use rand::{rngs::SmallRng, SeedableRng};

let mut rng = SmallRng::seed_from_u64(42);

// An uphill move is always taken without a random draw.
let d = metropolis_accept(-3.0_f64, -1.0, ZeroWeightPolicy::Reject, &mut rng);
assert!(d.accepted && !d.drew_uniform);

// A downhill move needs a uniform draw.
let d = metropolis_accept(-1.0_f64, -3.0, ZeroWeightPolicy::Reject, &mut rng);
assert!(d.drew_uniform);
```
*/
pub fn metropolis_accept<T, R>(
    current_log_weight: T,
    proposed_log_weight: T,
    policy: ZeroWeightPolicy,
    rng: &mut R,
) -> AcceptanceDecision<T>
where
    T: Float,
    R: Rng + ?Sized,
    Standard: Distribution<T>,
{
    let mut decision = AcceptanceDecision {
        current_log_weight,
        proposed_log_weight,
        accepted: false,
        drew_uniform: false,
        degenerate: false,
    };

    if current_log_weight == T::neg_infinity() && proposed_log_weight == T::neg_infinity() {
        decision.degenerate = true;
        decision.accepted = policy == ZeroWeightPolicy::Accept;
        return decision;
    }

    if proposed_log_weight >= current_log_weight {
        decision.accepted = true;
        return decision;
    }

    let u: T = rng.gen();
    decision.drew_uniform = true;
    decision.accepted = u.ln() < proposed_log_weight - current_log_weight;
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn downhill_frequency_matches_ratio() {
        const TRIALS: usize = 10_000;
        let mut rng = SmallRng::seed_from_u64(42);
        for ratio in [0.05_f64, 0.3, 0.5, 0.9] {
            let current = 2.0_f64.ln();
            let proposed = (2.0 * ratio).ln();
            let accepted = (0..TRIALS)
                .filter(|_| {
                    metropolis_accept(current, proposed, ZeroWeightPolicy::Reject, &mut rng)
                        .accepted
                })
                .count();
            let freq = accepted as f64 / TRIALS as f64;
            assert_abs_diff_eq!(freq, ratio, epsilon = 0.02);
        }
    }

    #[test]
    fn equal_positive_weights_accept_without_draw() {
        let mut rng = SmallRng::seed_from_u64(1);
        let d = metropolis_accept(-4.2_f64, -4.2, ZeroWeightPolicy::Reject, &mut rng);
        assert!(d.accepted);
        assert!(!d.drew_uniform);
        assert!(!d.degenerate);
    }

    #[test]
    fn zero_current_weight_accepts_any_positive_proposal() {
        let mut rng = SmallRng::seed_from_u64(1);
        let d = metropolis_accept(f64::NEG_INFINITY, -700.0, ZeroWeightPolicy::Reject, &mut rng);
        assert!(d.accepted);
        assert!(!d.drew_uniform);
    }

    #[test]
    fn zero_proposed_weight_is_never_accepted() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let d = metropolis_accept(-1.0_f64, f64::NEG_INFINITY, ZeroWeightPolicy::Accept, &mut rng);
            assert!(!d.accepted);
        }
    }

    #[test]
    fn both_zero_follows_policy() {
        let mut rng = SmallRng::seed_from_u64(3);
        let inf = f64::NEG_INFINITY;
        for (policy, expected) in [
            (ZeroWeightPolicy::Reject, false),
            (ZeroWeightPolicy::Accept, true),
            (ZeroWeightPolicy::Fail, false),
        ] {
            let d = metropolis_accept(inf, inf, policy, &mut rng);
            assert!(d.degenerate);
            assert!(!d.drew_uniform);
            assert_eq!(d.accepted, expected);
        }
    }

    #[test]
    fn extreme_log_weights_compare_without_overflow() {
        // exp() of either weight underflows to zero, the difference does not.
        let mut rng = SmallRng::seed_from_u64(5);
        let d = metropolis_accept(-1e6_f64, -1e6 + 1.0, ZeroWeightPolicy::Reject, &mut rng);
        assert!(d.accepted);
        assert_abs_diff_eq!(acceptance_probability(-1e6_f64, -1e6 - 1.0).unwrap(), (-1.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn acceptance_probability_is_capped() {
        assert_eq!(acceptance_probability(-2.0_f64, 0.0), Some(1.0));
        assert_eq!(acceptance_probability(f64::NEG_INFINITY, f64::NEG_INFINITY), None);
        assert_eq!(acceptance_probability(0.0_f64, f64::NEG_INFINITY), Some(0.0));
    }

    proptest! {
        #[test]
        fn uphill_moves_never_consume_randomness(
            current in -1e3_f64..1e3,
            gain in 0.0_f64..1e3,
            seed in any::<u64>(),
        ) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut untouched = rng.clone();
            let d = metropolis_accept(current, current + gain, ZeroWeightPolicy::Reject, &mut rng);
            prop_assert!(d.accepted);
            prop_assert!(!d.drew_uniform);
            prop_assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
        }
    }
}
