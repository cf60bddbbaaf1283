use std::error::Error;
use std::fmt;

/// Possible errors from the density transform and equivalence harness.
#[derive(Debug)]
pub enum SnicarError {
    /// The density profile (or the arrays derived from it) is malformed
    InvalidProfile(ProfileIssue),
    /// Not enough usable samples to compute a regression
    InsufficientData {
        /// Number of samples that were available
        samples: usize,
    },
    /// The radiative transfer solver failed
    Solver(SolverError),
    /// The model configuration is inconsistent
    InvalidConfig(&'static str),
    /// The operation was aborted early
    Cancelled,
    /// An array is not contiguous when it was assumed to be
    NotContiguous,
    /// The worker thread pool could not be created
    ThreadPool(String),
}

/// The specific reason a profile was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileIssue {
    /// No depth increments at all
    Empty,
    /// Thickness and density arrays have different lengths
    LengthMismatch {
        /// Number of thickness entries
        thickness: usize,
        /// Number of density entries
        density: usize,
    },
    /// A thickness is zero, negative, or not finite
    NonPositiveThickness {
        /// Index of the offending increment
        index: usize,
    },
    /// A density is zero, negative, or not finite
    NonPositiveDensity {
        /// Index of the offending increment
        index: usize,
    },
    /// `1000 - density` would give a non-positive grain radius
    UnphysicalGrainRadius {
        /// Index of the offending layer
        index: usize,
        /// The layer density in kg/m³
        density: f64,
    },
    /// The impurity concentration is negative or not finite
    InvalidLoading,
    /// A profile was requested past the end of a batch
    OutOfRange {
        /// Requested profile
        index: usize,
        /// Number of profiles in the batch
        num_profiles: usize,
    },
}

/// A failure reported by the radiative transfer solver.
///
/// The underlying cause is kept as-is and exposed through
/// [`Error::source`].
#[derive(Debug)]
pub struct SolverError(Box<dyn Error + Send + Sync + 'static>);

impl SolverError {
    /// Wrap any error (or a message) coming out of the solver.
    pub fn new(cause: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(cause.into())
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for SolverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.0.as_ref())
    }
}

impl fmt::Display for ProfileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileIssue::Empty => write!(f, "profile has no depth increments"),
            ProfileIssue::LengthMismatch { thickness, density } => write!(
                f,
                "{thickness} thickness values but {density} density values"
            ),
            ProfileIssue::NonPositiveThickness { index } => {
                write!(f, "thickness at increment {index} is not positive")
            }
            ProfileIssue::NonPositiveDensity { index } => {
                write!(f, "density at increment {index} is not positive")
            }
            ProfileIssue::UnphysicalGrainRadius { index, density } => write!(
                f,
                "density {density} kg/m³ in layer {index} gives a non-positive grain radius"
            ),
            ProfileIssue::InvalidLoading => {
                write!(f, "impurity concentration must be finite and non-negative")
            }
            ProfileIssue::OutOfRange {
                index,
                num_profiles,
            } => write!(f, "profile {index} requested from a batch of {num_profiles}"),
        }
    }
}

impl fmt::Display for SnicarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnicarError::InvalidProfile(issue) => write!(f, "invalid density profile: {issue}"),
            SnicarError::InsufficientData { samples } => write!(
                f,
                "cannot compute a regression from {samples} sample(s)"
            ),
            SnicarError::Solver(e) => write!(f, "radiative transfer solver failed: {e}"),
            SnicarError::InvalidConfig(reason) => write!(f, "invalid model configuration: {reason}"),
            SnicarError::Cancelled => write!(f, "operation cancelled early"),
            SnicarError::NotContiguous => write!(f, "array slice not contiguous in memory"),
            SnicarError::ThreadPool(e) => write!(f, "unable to build worker pool: {e}"),
        }
    }
}

impl Error for SnicarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SnicarError::Solver(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProfileIssue> for SnicarError {
    fn from(issue: ProfileIssue) -> Self {
        SnicarError::InvalidProfile(issue)
    }
}

impl From<SolverError> for SnicarError {
    fn from(e: SolverError) -> Self {
        SnicarError::Solver(e)
    }
}
