//! Global configuration of the radiative transfer model.
//!
//! These values are held constant while comparing single-layer and multilayer
//! runs, so they live in one explicit structure that is passed to every solver
//! invocation rather than in shared mutable state.

use std::path::PathBuf;

use crate::error::SnicarError;

/// Number of wavelength bands in the feeder's spectral grid.
pub const NUM_WAVELENGTHS: usize = 480;

/// Which two-stream solver the feeder should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverKind {
    /// Toon et al. tridiagonal matrix solver. Faster, but only valid for
    /// granular layers and solar zenith angles of at least 40°.
    Toon,
    /// Adding-doubling solver. Required whenever solid (Fresnel) ice layers
    /// are present.
    #[default]
    AddingDoubling,
}

/// Two-stream approximation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Approximation {
    /// Eddington
    #[default]
    Eddington,
    /// Quadrature
    Quadrature,
    /// Hemispheric mean
    HemisphericMean,
}

impl Approximation {
    /// Feeder code (`APRX_TYP`).
    pub fn code(self) -> u8 {
        match self {
            Approximation::Eddington => 1,
            Approximation::Quadrature => 2,
            Approximation::HemisphericMean => 3,
        }
    }
}

/// Incident radiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Illumination {
    /// Direct beam (clear-sky fluxes)
    #[default]
    Direct,
    /// Diffuse (cloudy-sky fluxes)
    Diffuse,
}

/// Atmospheric profile used for the surface-incident spectral flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncidentFlux {
    /// Mid-latitude winter
    MidLatitudeWinter,
    /// Mid-latitude summer
    MidLatitudeSummer,
    /// Sub-Arctic winter
    SubArcticWinter,
    /// Sub-Arctic summer
    SubArcticSummer,
    /// Summit, Greenland: sub-Arctic summer with a surface pressure of 796 hPa
    #[default]
    Summit,
    /// High mountain summer with a surface pressure of 556 hPa
    HighMountain,
    /// Top of the atmosphere
    TopOfAtmosphere,
}

impl IncidentFlux {
    /// Feeder code (`incoming_i`).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`IncidentFlux::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        use IncidentFlux::*;
        [
            MidLatitudeWinter,
            MidLatitudeSummer,
            SubArcticWinter,
            SubArcticSummer,
            Summit,
            HighMountain,
            TopOfAtmosphere,
        ]
        .get(usize::from(code))
        .copied()
    }
}

/// Source of the ice refractive index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefractiveIndex {
    /// Warren (1984)
    Warren1984,
    /// Warren and Brandt (2008)
    Warren2008,
    /// Picard et al. (2016)
    #[default]
    Picard2016,
}

impl RefractiveIndex {
    /// Feeder code (`rf_ice`).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`RefractiveIndex::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RefractiveIndex::Warren1984),
            1 => Some(RefractiveIndex::Warren2008),
            2 => Some(RefractiveIndex::Picard2016),
            _ => None,
        }
    }
}

/// Ice grain shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrainShape {
    /// Sphere
    #[default]
    Sphere,
    /// Spheroid
    Spheroid,
    /// Hexagonal plate
    HexagonalPlate,
    /// Koch snowflake
    KochSnowflake,
    /// Hexagonal prism, sized by `side_length` and `depth`
    HexagonalPrism,
}

impl GrainShape {
    /// Feeder code (`grain_shp`).
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Grain geometry shared by every layer.
///
/// The grain radius itself is per layer and comes from the layer density.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrainGeometry {
    /// Grain shape
    pub shape: GrainShape,
    /// Radius of an optional liquid water coating in µm (0 for none)
    pub water_coating: f64,
    /// Ratio of nonspherical grain effective radius to that of an
    /// equal-volume sphere; 0 uses the recommended default
    pub shape_factor: f64,
    /// Aspect ratio (width to length); 0 uses the recommended default
    pub aspect_ratio: f64,
    /// Side length for hexagonal prisms in µm
    pub side_length: f64,
    /// Depth for hexagonal prisms in µm
    pub depth: f64,
}

/// Units of glacier algae concentrations (`GA_units`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgaeUnits {
    /// Parts per billion by mass
    #[default]
    Ppb,
    /// Cells per mL
    CellsPerMl,
}

impl AlgaeUnits {
    /// Feeder code (`GA_units`).
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Fixed configuration for the radiative transfer solver.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Base directory of the feeder's data files
    pub data_dir: PathBuf,
    /// Two-stream solver
    pub solver: SolverKind,
    /// Two-stream approximation
    pub approximation: Approximation,
    /// Apply the delta approximation
    pub delta_scaling: bool,
    /// Direct or diffuse incident flux
    pub illumination: Illumination,
    /// Atmospheric profile for the incident flux
    pub incident_flux: IncidentFlux,
    /// Source of the ice refractive index
    pub refractive_index: RefractiveIndex,
    /// Grain geometry for every layer
    pub grain: GrainGeometry,
    /// Reflectance of the underlying surface, one value per wavelength band
    pub surface_reflectance: Vec<f64>,
    /// Concentrating factor accounting for the resolution difference between
    /// field samples and model layers (`Cfactor`)
    pub concentration_factor: f64,
    /// Units of glacier algae concentrations
    pub algae_units: AlgaeUnits,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            solver: SolverKind::AddingDoubling,
            approximation: Approximation::Eddington,
            delta_scaling: true,
            illumination: Illumination::Direct,
            incident_flux: IncidentFlux::Summit,
            refractive_index: RefractiveIndex::Picard2016,
            grain: GrainGeometry::default(),
            surface_reflectance: vec![0.1; NUM_WAVELENGTHS],
            concentration_factor: 10.,
            algae_units: AlgaeUnits::Ppb,
        }
    }
}

impl ModelConfig {
    /// Check the configuration on its own. Checks that depend on the layers
    /// are done in [`ModelInputs::new`](crate::solver::ModelInputs::new).
    pub fn validate(&self) -> Result<(), SnicarError> {
        if self.surface_reflectance.len() != NUM_WAVELENGTHS {
            return Err(SnicarError::InvalidConfig(
                "surface reflectance must have one value per wavelength band",
            ));
        }
        if !self
            .surface_reflectance
            .iter()
            .all(|r| (0.0..=1.0).contains(r))
        {
            return Err(SnicarError::InvalidConfig(
                "surface reflectance must be within [0, 1]",
            ));
        }
        if !(self.concentration_factor.is_finite() && self.concentration_factor > 0.) {
            return Err(SnicarError::InvalidConfig(
                "concentration factor must be positive",
            ));
        }

        let GrainGeometry {
            water_coating,
            shape_factor,
            aspect_ratio,
            side_length,
            depth,
            ..
        } = self.grain;
        if ![water_coating, shape_factor, aspect_ratio, side_length, depth]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.)
        {
            return Err(SnicarError::InvalidConfig(
                "grain geometry values must be non-negative",
            ));
        }
        if shape_factor > 1. {
            return Err(SnicarError::InvalidConfig(
                "grain shape factor must be between 0 and 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn reflectance_must_cover_every_band() {
        let config = ModelConfig {
            surface_reflectance: vec![0.1; NUM_WAVELENGTHS - 1],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SnicarError::InvalidConfig(_))
        ));

        let mut config = ModelConfig::default();
        config.surface_reflectance[17] = 1.2;
        assert!(config.validate().is_err());
        config.surface_reflectance[17] = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_scalars() {
        let config = ModelConfig {
            concentration_factor: 0.,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ModelConfig {
            grain: GrainGeometry {
                shape_factor: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ModelConfig {
            grain: GrainGeometry {
                water_coating: -1.,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn feeder_codes() {
        assert_eq!(IncidentFlux::Summit.code(), 4);
        assert_eq!(IncidentFlux::from_code(6), Some(IncidentFlux::TopOfAtmosphere));
        assert_eq!(IncidentFlux::from_code(7), None);
        assert_eq!(RefractiveIndex::from_code(2), Some(RefractiveIndex::Picard2016));
        assert_eq!(Approximation::Eddington.code(), 1);
        assert_eq!(GrainShape::HexagonalPrism.code(), 4);
    }
}
