//! Single-layer equivalence of depth-resolved ice density profiles
//!
//! A weathering-crust model produces densities over a fixed set of depth
//! increments. Before those profiles are fed to a two-stream radiative
//! transfer model they can be collapsed into one equivalent layer. This crate
//! runs both the reduced and the full multilayer profile through the solver
//! and checks, across a batch of profiles, how closely the two broadband
//! albedos agree.
//!
//! The solver itself is external and is reached through the
//! [`RadiativeTransfer`] trait. With the `python` feature the crate builds a
//! Python extension module that drives a Python feeder callable.

pub mod config;
/// Error types.
pub mod error;
pub mod harness;
pub mod lap;
pub mod layers;
pub mod profile;
pub mod solver;

#[cfg(feature = "python")]
mod python;

pub use config::ModelConfig;
pub use error::{ProfileIssue, SnicarError, SolverError};
pub use harness::{
    EquivalenceHarness, EquivalenceReport, HarnessOptions, ProfileComparison, Regression, Scenario,
};
pub use lap::Lap;
pub use layers::{GrainRadiusCheck, LapLoading, LayerParameterSet};
pub use profile::{reduce, DensityBatch, DensityProfile, ReducedLayer};
pub use solver::{ModelInputs, ModelOutputs, RadiativeTransfer};
