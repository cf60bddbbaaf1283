//! Interface to the external two-stream radiative transfer solver.
//!
//! The solver itself is a black box. This module only assembles well-formed
//! inputs, applies the input checks the driver has always applied before
//! calling it, and sanity-checks what comes back.

use log::debug;

use crate::config::{ModelConfig, SolverKind, NUM_WAVELENGTHS};
use crate::error::{SnicarError, SolverError};
use crate::layers::LayerParameterSet;

/// Largest solar zenith angle covered by the incident flux tables, in degrees.
pub const MAX_SOLAR_ZENITH: f64 = 89.;

/// Smallest solar zenith angle for which the Toon solver is valid, in degrees.
pub const TOON_MIN_SOLAR_ZENITH: f64 = 40.;

/// A two-stream radiative transfer solver.
///
/// Implementations must be callable from several worker threads at once.
pub trait RadiativeTransfer: Sync {
    /// Run the solver once. Failures are reported as-is; they are not
    /// retried.
    fn run(&self, inputs: &ModelInputs<'_>) -> Result<ModelOutputs, SolverError>;
}

impl<F> RadiativeTransfer for F
where
    F: Fn(&ModelInputs<'_>) -> Result<ModelOutputs, SolverError> + Sync,
{
    fn run(&self, inputs: &ModelInputs<'_>) -> Result<ModelOutputs, SolverError> {
        self(inputs)
    }
}

/// Everything the solver needs for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct ModelInputs<'a> {
    config: &'a ModelConfig,
    layers: &'a LayerParameterSet,
    /// Solar zenith angle in degrees, limited to [`MAX_SOLAR_ZENITH`].
    solar_zenith: f64,
}

/// Outputs of a single solver invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutputs {
    /// Spectral albedo, one value per wavelength band
    pub albedo: Vec<f64>,
    /// Broadband albedo
    pub bba: f64,
    /// Absorbed solar flux per layer in W/m². May have one extra trailing
    /// entry for the underlying surface.
    pub absorbed_flux: Vec<f64>,
}

impl<'a> ModelInputs<'a> {
    /// Combine the configuration with a layer set, checking that the two are
    /// compatible.
    pub fn new(config: &'a ModelConfig, layers: &'a LayerParameterSet) -> Result<Self, SnicarError> {
        let mut solar_zenith = layers.solar_zenith();
        if !(solar_zenith.is_finite() && solar_zenith >= 0.) {
            return Err(SnicarError::InvalidConfig(
                "solar zenith angle must be between 0 and 90 degrees",
            ));
        }
        if solar_zenith > MAX_SOLAR_ZENITH {
            debug!("limiting solar zenith angle of {solar_zenith}° to {MAX_SOLAR_ZENITH}°");
            solar_zenith = MAX_SOLAR_ZENITH;
        }

        match config.solver {
            SolverKind::Toon => {
                if solar_zenith < TOON_MIN_SOLAR_ZENITH {
                    return Err(SnicarError::InvalidConfig(
                        "solar zenith angle below 40° is outside the valid range of the Toon solver",
                    ));
                }
                if layers.has_solid_layer() {
                    return Err(SnicarError::InvalidConfig(
                        "solid ice layers require the adding-doubling solver",
                    ));
                }
            }
            SolverKind::AddingDoubling => {
                if !layers.has_solid_layer() {
                    debug!("no solid ice layers; the Toon solver would be faster for granular layers only");
                }
            }
        }

        if layers.species().is_theoretical() && layers.mixing_ratio().iter().any(|&m| m > 0.) {
            debug!("{} optical properties are theoretical", layers.species().key());
        }

        Ok(Self {
            config,
            layers,
            solar_zenith,
        })
    }

    /// The fixed model configuration.
    pub fn config(&self) -> &'a ModelConfig {
        self.config
    }

    /// The per-layer parameters.
    pub fn layers(&self) -> &'a LayerParameterSet {
        self.layers
    }

    /// Solar zenith angle in degrees, after limiting to the range of the flux
    /// tables.
    pub fn solar_zenith(&self) -> f64 {
        self.solar_zenith
    }
}

impl ModelOutputs {
    /// Check the outputs are physically meaningful for `num_layers` layers.
    fn check(&self, num_layers: usize) -> Result<(), SolverError> {
        if !(0.0..=1.0).contains(&self.bba) {
            return Err(SolverError::new(format!(
                "broadband albedo {} is outside [0, 1]",
                self.bba
            )));
        }
        if self.albedo.len() != NUM_WAVELENGTHS {
            return Err(SolverError::new(format!(
                "spectral albedo has {} values for {NUM_WAVELENGTHS} wavelength bands",
                self.albedo.len()
            )));
        }
        if let Some(band) = self.albedo.iter().position(|a| !a.is_finite()) {
            return Err(SolverError::new(format!(
                "spectral albedo is not finite in band {band}"
            )));
        }
        let num_flux = self.absorbed_flux.len();
        if num_flux != num_layers && num_flux != num_layers + 1 {
            return Err(SolverError::new(format!(
                "absorbed flux has {num_flux} values for {num_layers} layers"
            )));
        }
        Ok(())
    }
}

/// Run the solver on one layer set with the given configuration.
pub fn invoke<S>(
    solver: &S,
    config: &ModelConfig,
    layers: &LayerParameterSet,
) -> Result<ModelOutputs, SnicarError>
where
    S: RadiativeTransfer + ?Sized,
{
    let inputs = ModelInputs::new(config, layers)?;
    let outputs = solver.run(&inputs)?;
    outputs.check(layers.num_layers())?;

    debug!(
        "solver returned BBA {:.4} for {} layers",
        outputs.bba,
        layers.num_layers()
    );
    Ok(outputs)
}
