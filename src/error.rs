//! Error types for sampler configuration and sampling runs.

use thiserror::Error;

/// Which of the two density roles produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityRole {
    Likelihood,
    Prior,
}

impl std::fmt::Display for DensityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DensityRole::Likelihood => write!(f, "likelihood"),
            DensityRole::Prior => write!(f, "prior"),
        }
    }
}

/// Rejected sampler configurations. Raised before any iteration runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("iteration count must be at least 1, got {0}")]
    InvalidIterations(usize),
    #[error("proposal scale must be positive and finite, got {0}")]
    InvalidProposalScale(f64),
    #[error("initial value must be finite, got {0}")]
    InvalidInitialValue(f64),
    #[error("a likelihood function is required")]
    MissingLikelihood,
}

/// Failures of a sampling run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A density evaluation returned NaN, a negative density or `+inf`.
    #[error("{role} returned invalid density {density} (log-density {log_value}) at theta = {theta} (iteration {iteration})")]
    Numerical {
        iteration: usize,
        theta: f64,
        role: DensityRole,
        /// The raw density as returned by the caller.
        density: f64,
        log_value: f64,
    },

    /// Both posterior weights were exactly zero under [`ZeroWeightPolicy::Fail`].
    ///
    /// [`ZeroWeightPolicy::Fail`]: crate::acceptance::ZeroWeightPolicy::Fail
    #[error("posterior weight is zero at both current ({current}) and proposed ({proposed}) values (iteration {iteration})")]
    DegenerateRatio {
        iteration: usize,
        current: f64,
        proposed: f64,
    },
}

pub type Result<T> = std::result::Result<T, SamplerError>;
