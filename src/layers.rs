//! Per-layer parameters for the radiative transfer solver.
//!
//! Two constructions are supported: a reduced profile becomes a thin surface
//! layer over one bulk layer, and a raw profile becomes one layer per depth
//! increment. In both cases the impurity loading is placed on the first layer
//! only and every layer is treated as solid (Fresnel) ice.

use log::debug;
use smallvec::SmallVec;

use crate::error::{ProfileIssue, SnicarError};
use crate::lap::Lap;
use crate::profile::{DensityProfile, ReducedLayer};

/// Thickness of the surface layer that carries the impurity loading in the
/// single-layer construction, in m.
pub const SURFACE_LAYER_THICKNESS: f64 = 0.001;

/// The grain radius proxy is `GRAIN_RADIUS_OFFSET - density`.
pub const GRAIN_RADIUS_OFFSET: f64 = 1000.;

/// Per-layer storage. Profiles rarely have more than a few tens of
/// increments.
pub type LayerVec<T> = SmallVec<[T; 16]>;

/// Optical treatment of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    /// Granular snow, scattering by individual grains
    Granular,
    /// Solid ice with specular (Fresnel) reflection at its upper boundary
    Solid,
}

impl LayerType {
    /// Feeder code (`layer_type`).
    pub fn code(self) -> u8 {
        match self {
            LayerType::Granular => 0,
            LayerType::Solid => 1,
        }
    }
}

/// What to do when a density produces a non-positive grain radius proxy,
/// i.e. a density of 1000 kg/m³ or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrainRadiusCheck {
    /// Reject the layer set
    Strict,
    /// Pass the value through unchanged. The harness warns once per batch;
    /// each layer set only logs it at debug level.
    #[default]
    Warn,
    /// Pass the value through silently
    Off,
}

/// Impurity loading applied to the surface layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapLoading {
    species: Lap,
    concentration: f64,
}

impl LapLoading {
    /// Create a loading. The concentration is in ppb, or in the configured
    /// algae units for glacier algae, and must be finite and non-negative.
    pub fn new(species: Lap, concentration: f64) -> Result<Self, ProfileIssue> {
        if !(concentration.is_finite() && concentration >= 0.) {
            return Err(ProfileIssue::InvalidLoading);
        }
        Ok(Self {
            species,
            concentration,
        })
    }

    /// No impurities at all.
    pub fn clean() -> Self {
        Self {
            species: Lap::GlacierAlgae,
            concentration: 0.,
        }
    }

    /// The impurity species.
    pub fn species(&self) -> Lap {
        self.species
    }

    /// The concentration in the surface layer.
    pub fn concentration(&self) -> f64 {
        self.concentration
    }
}

/// Layer arrays for one solver invocation.
///
/// All arrays have one entry per layer, surface first.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParameterSet {
    /// Density in kg/m³
    density: LayerVec<f64>,
    /// Thickness in m
    thickness: LayerVec<f64>,
    layer_type: LayerVec<LayerType>,
    /// Grain (or bubble) radius proxy, `1000 - density`
    grain_radius: LayerVec<f64>,
    /// Mass mixing ratio of `species`; only the first entry is non-zero
    mixing_ratio: LayerVec<f64>,
    species: Lap,
    /// Solar zenith angle in degrees
    solar_zenith: f64,
}

impl LayerParameterSet {
    /// A thin surface layer of [`SURFACE_LAYER_THICKNESS`] over a bulk layer
    /// of the reduced thickness, both with the reduced density.
    pub fn single_layer(
        reduced: ReducedLayer,
        loading: LapLoading,
        solar_zenith: f64,
        check: GrainRadiusCheck,
    ) -> Result<Self, SnicarError> {
        // Reuse the profile checks for the (public) reduced values
        let ReducedLayer { density, thickness } = reduced;
        DensityProfile::new(&[thickness], &[density])?;

        Self::from_layers(
            LayerVec::from_slice(&[density, density]),
            LayerVec::from_slice(&[SURFACE_LAYER_THICKNESS, thickness]),
            loading,
            solar_zenith,
            check,
        )
    }

    /// One layer per depth increment of the profile.
    pub fn multilayer(
        thickness: &[f64],
        density: &[f64],
        loading: LapLoading,
        solar_zenith: f64,
        check: GrainRadiusCheck,
    ) -> Result<Self, SnicarError> {
        let profile = DensityProfile::new(thickness, density)?;

        Self::from_layers(
            LayerVec::from_slice(profile.density()),
            LayerVec::from_slice(profile.thickness()),
            loading,
            solar_zenith,
            check,
        )
    }

    fn from_layers(
        density: LayerVec<f64>,
        thickness: LayerVec<f64>,
        loading: LapLoading,
        solar_zenith: f64,
        check: GrainRadiusCheck,
    ) -> Result<Self, SnicarError> {
        let num_layers = density.len();

        let grain_radius: LayerVec<f64> =
            density.iter().map(|rho| GRAIN_RADIUS_OFFSET - rho).collect();
        if check != GrainRadiusCheck::Off {
            for (index, (&radius, &rho)) in grain_radius.iter().zip(&density).enumerate() {
                if radius > 0. {
                    continue;
                }
                if check == GrainRadiusCheck::Strict {
                    return Err(ProfileIssue::UnphysicalGrainRadius {
                        index,
                        density: rho,
                    }
                    .into());
                }
                debug!("layer {index} has density {rho} kg/m³, giving a grain radius of {radius}");
            }
        }

        let mut mixing_ratio = LayerVec::from_elem(0., num_layers);
        mixing_ratio[0] = loading.concentration;

        Ok(Self {
            layer_type: LayerVec::from_elem(LayerType::Solid, num_layers),
            density,
            thickness,
            grain_radius,
            mixing_ratio,
            species: loading.species,
            solar_zenith,
        })
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.density.len()
    }

    /// Density of each layer in kg/m³.
    pub fn density(&self) -> &[f64] {
        &self.density
    }

    /// Thickness of each layer in m.
    pub fn thickness(&self) -> &[f64] {
        &self.thickness
    }

    /// Optical type of each layer.
    pub fn layer_type(&self) -> &[LayerType] {
        &self.layer_type
    }

    /// Grain radius proxy of each layer.
    pub fn grain_radius(&self) -> &[f64] {
        &self.grain_radius
    }

    /// The impurity species carried by [`mixing_ratio`](Self::mixing_ratio).
    pub fn species(&self) -> Lap {
        self.species
    }

    /// Mixing ratio of [`species`](Self::species) in each layer.
    pub fn mixing_ratio(&self) -> &[f64] {
        &self.mixing_ratio
    }

    /// Mixing ratio of any species in each layer; zero everywhere for species
    /// other than the loaded one.
    pub fn mixing_ratio_of(&self, lap: Lap) -> LayerVec<f64> {
        if lap == self.species {
            self.mixing_ratio.clone()
        } else {
            LayerVec::from_elem(0., self.num_layers())
        }
    }

    /// Solar zenith angle in degrees.
    pub fn solar_zenith(&self) -> f64 {
        self.solar_zenith
    }

    /// Whether any layer is solid ice.
    pub fn has_solid_layer(&self) -> bool {
        self.layer_type.contains(&LayerType::Solid)
    }
}
