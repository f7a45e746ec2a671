//! # mini-metropolis
//!
//! A random-walk Metropolis sampler for a single real parameter, with the likelihood and
//! prior supplied by the caller as plain density functions.
//!
//! The worked example is the posterior of a normal mean with known standard deviation:
//!
//! ```rust
//! use mini_metropolis::distributions::NormalLikelihood;
//! use mini_metropolis::metropolis::{Metropolis, SamplerConfig};
//!
//! let sampler = Metropolis::builder(SamplerConfig::new(150.0_f64, 5_000, 2.0).set_seed(42))
//!     .likelihood(NormalLikelihood::new(144.0, 15.0))
//!     .build()
//!     .unwrap();
//!
//! let chain = sampler.run().unwrap();
//! let summary = chain.summary(1_000).unwrap();
//! println!("posterior mean = {:.1}, sd = {:.1}", summary.mean, summary.sd);
//! ```
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at run start, end and failure | on |
//! | `csv` | [`io::csv`] for writing chains to CSV | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod acceptance;
pub mod chain;
pub mod distributions;
pub mod error;
pub mod io;
pub mod metropolis;
pub mod stats;

pub use acceptance::{AcceptanceDecision, ZeroWeightPolicy};
pub use chain::{Chain, ChainStatus, RunOutcome};
pub use error::{ConfigError, SamplerError};
pub use metropolis::{run, CancelToken, Metropolis, SamplerConfig};
