//! Depth-resolved density profiles and their reduction to a single layer.

mod reference;

use ndarray::{arr2, Array2, ArrayView2};

use crate::error::{ProfileIssue, SnicarError};

/// A depth-resolved profile of snow/ice density, ordered from the surface
/// downwards.
///
/// Both slices are borrowed from the caller and have the same, non-zero
/// length. Every thickness and density is finite and strictly positive.
#[derive(Debug, Clone, Copy)]
pub struct DensityProfile<'a> {
    /// Thickness of each depth increment in m.
    thickness: &'a [f64],
    /// Density of each depth increment in kg/m³.
    density: &'a [f64],
}

/// A profile collapsed into one equivalent optical layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReducedLayer {
    /// Thickness-weighted mean density in kg/m³.
    pub density: f64,
    /// Total thickness in m.
    pub thickness: f64,
}

impl<'a> DensityProfile<'a> {
    /// Validate a profile.
    ///
    /// Densities above that of pure ice (about 916 kg/m³) are accepted, only
    /// non-positive values are rejected here.
    pub fn new(thickness: &'a [f64], density: &'a [f64]) -> Result<Self, ProfileIssue> {
        if thickness.len() != density.len() {
            return Err(ProfileIssue::LengthMismatch {
                thickness: thickness.len(),
                density: density.len(),
            });
        }
        if thickness.is_empty() {
            return Err(ProfileIssue::Empty);
        }
        if let Some(index) = thickness.iter().position(|&dz| !(dz.is_finite() && dz > 0.)) {
            return Err(ProfileIssue::NonPositiveThickness { index });
        }
        if let Some(index) = density.iter().position(|&rho| !(rho.is_finite() && rho > 0.)) {
            return Err(ProfileIssue::NonPositiveDensity { index });
        }

        Ok(Self { thickness, density })
    }

    /// Thickness of each increment in m.
    pub fn thickness(&self) -> &'a [f64] {
        self.thickness
    }

    /// Density of each increment in kg/m³.
    pub fn density(&self) -> &'a [f64] {
        self.density
    }

    /// Collapse the profile into a single layer of the same total thickness
    /// and the thickness-weighted mean density.
    pub fn reduce(&self) -> ReducedLayer {
        // Accumulate relative to the surface density so that a uniform
        // profile reduces to exactly that density.
        let surface = self.density[0];
        let (total, weighted_excess) = self
            .thickness
            .iter()
            .zip(self.density)
            .fold((0., 0.), |(total, excess), (&dz, &rho)| {
                (total + dz, excess + dz * (rho - surface))
            });

        ReducedLayer {
            density: surface + weighted_excess / total,
            thickness: total,
        }
    }
}

/// Validate a profile and reduce it to a single layer.
pub fn reduce(thickness: &[f64], density: &[f64]) -> Result<ReducedLayer, SnicarError> {
    Ok(DensityProfile::new(thickness, density)?.reduce())
}

/// A batch of test profiles sharing one set of increment thicknesses.
///
/// This is the rectangular table produced by the water-column model: one row
/// per simulated column, one column per depth increment.
#[derive(Debug, Clone)]
pub struct DensityBatch {
    /// Increment thicknesses in m, with a length of `num_increments`.
    thickness: Vec<f64>,
    /// Densities in kg/m³, dimensioned as (`num_profiles`, `num_increments`).
    /// Always in standard (row-major) layout.
    density: Array2<f64>,
}

impl DensityBatch {
    /// Create a batch, checking that the table width matches the thickness
    /// sequence.
    ///
    /// Individual rows are validated when they are turned into a
    /// [`DensityProfile`].
    pub fn new(thickness: Vec<f64>, density: ArrayView2<'_, f64>) -> Result<Self, ProfileIssue> {
        if density.ncols() != thickness.len() {
            return Err(ProfileIssue::LengthMismatch {
                thickness: thickness.len(),
                density: density.ncols(),
            });
        }
        Ok(Self {
            thickness,
            density: density.as_standard_layout().into_owned(),
        })
    }

    /// The batch used to check the single-layer reduction against the full
    /// multilayer model: 32 columns over nine increments totalling 0.64 m,
    /// with densities increasing with depth up to that of pure ice.
    pub fn reference() -> Self {
        Self {
            thickness: reference::THICKNESS.to_vec(),
            density: arr2(&reference::DENSITY),
        }
    }

    /// Number of profiles (rows) in the batch.
    pub fn num_profiles(&self) -> usize {
        self.density.nrows()
    }

    /// Number of depth increments per profile.
    pub fn num_increments(&self) -> usize {
        self.thickness.len()
    }

    /// Shared increment thicknesses in m.
    pub fn thickness(&self) -> &[f64] {
        &self.thickness
    }

    /// The full density table.
    pub fn density(&self) -> ArrayView2<'_, f64> {
        self.density.view()
    }

    /// Validated profile for row `index`.
    pub fn profile(&self, index: usize) -> Result<DensityProfile<'_>, SnicarError> {
        let num_profiles = self.num_profiles();
        if index >= num_profiles {
            return Err(ProfileIssue::OutOfRange {
                index,
                num_profiles,
            }
            .into());
        }

        let width = self.num_increments();
        let table = self.density.as_slice().ok_or(SnicarError::NotContiguous)?;
        let row = table
            .get(index * width..(index + 1) * width)
            .ok_or(SnicarError::NotContiguous)?;

        Ok(DensityProfile::new(&self.thickness, row)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn uniform_density_is_preserved_exactly() {
        let thickness = [0.05, 0.01, 0.15, 0.2, 0.013];
        for rho in [1.0, 123.456, 300.0, 916.0, 999.999] {
            let density = [rho; 5];
            let reduced = reduce(&thickness, &density).unwrap();
            assert_eq!(reduced.density, rho);
        }
    }

    #[test]
    fn total_thickness_is_sum() {
        let thickness = [0.05, 0.05, 0.01, 0.01, 0.01, 0.01, 0.15, 0.15, 0.2];
        let density = [300., 300., 300., 350., 350., 400., 400., 400., 450.];
        let reduced = reduce(&thickness, &density).unwrap();
        assert_relative_eq!(reduced.thickness, thickness.iter().sum::<f64>());
        assert_relative_eq!(reduced.thickness, 0.64, epsilon = 1e-12);
    }

    #[test]
    fn two_equal_increments() {
        let reduced = reduce(&[0.05, 0.05], &[300., 300.]).unwrap();
        assert_eq!(reduced.density, 300.);
        assert_relative_eq!(reduced.thickness, 0.10, epsilon = 1e-15);

        let reduced = reduce(&[0.05, 0.05], &[300., 600.]).unwrap();
        assert_relative_eq!(reduced.density, 450., max_relative = 1e-12);
    }

    #[test]
    fn weighting_follows_thickness() {
        // A thin dense layer over a thick light one
        let reduced = reduce(&[0.01, 0.09], &[900., 400.]).unwrap();
        assert_relative_eq!(reduced.density, 450., max_relative = 1e-12);

        let arithmetic_mean = (900. + 400.) / 2.;
        assert!(reduced.density < arithmetic_mean);
    }

    #[test]
    fn rejects_malformed_profiles() {
        assert_eq!(
            DensityProfile::new(&[0.1, 0.1], &[300.]).unwrap_err(),
            ProfileIssue::LengthMismatch {
                thickness: 2,
                density: 1
            }
        );
        assert_eq!(
            DensityProfile::new(&[], &[]).unwrap_err(),
            ProfileIssue::Empty
        );
        assert_eq!(
            DensityProfile::new(&[0.1, 0.0], &[300., 300.]).unwrap_err(),
            ProfileIssue::NonPositiveThickness { index: 1 }
        );
        assert_eq!(
            DensityProfile::new(&[-0.1], &[300.]).unwrap_err(),
            ProfileIssue::NonPositiveThickness { index: 0 }
        );
        assert_eq!(
            DensityProfile::new(&[0.1, f64::NAN], &[300., 300.]).unwrap_err(),
            ProfileIssue::NonPositiveThickness { index: 1 }
        );
        assert_eq!(
            DensityProfile::new(&[0.1, 0.1], &[300., 0.]).unwrap_err(),
            ProfileIssue::NonPositiveDensity { index: 1 }
        );

        assert!(matches!(
            reduce(&[0.1], &[300., 300.]),
            Err(SnicarError::InvalidProfile(ProfileIssue::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn batch_rows_become_profiles() {
        let density = array![[300., 400.], [500., 600.], [700., 916.]];
        let batch = DensityBatch::new(vec![0.1, 0.3], density.view()).unwrap();
        assert_eq!(batch.num_profiles(), 3);
        assert_eq!(batch.num_increments(), 2);

        let profile = batch.profile(1).unwrap();
        assert_eq!(profile.density(), &[500., 600.]);
        assert_eq!(profile.thickness(), &[0.1, 0.3]);
        assert_relative_eq!(profile.reduce().density, 575., max_relative = 1e-12);
    }

    #[test]
    fn profile_past_end_of_batch() {
        let density = array![[300., 400.], [500., 600.]];
        let batch = DensityBatch::new(vec![0.1, 0.1], density.view()).unwrap();
        assert!(matches!(
            batch.profile(2),
            Err(SnicarError::InvalidProfile(ProfileIssue::OutOfRange {
                index: 2,
                num_profiles: 2
            }))
        ));
        assert!(batch.profile(usize::MAX).is_err());
    }

    #[test]
    fn batch_from_column_major_table() {
        let density = array![[300., 400.], [500., 600.]];
        let transposed = density.t();
        let batch = DensityBatch::new(vec![0.1, 0.1], transposed).unwrap();
        assert_eq!(batch.profile(0).unwrap().density(), &[300., 500.]);
        assert_eq!(batch.profile(1).unwrap().density(), &[400., 600.]);
    }

    #[test]
    fn batch_width_must_match_thickness() {
        let density = array![[300., 400., 500.]];
        assert!(matches!(
            DensityBatch::new(vec![0.1, 0.1], density.view()),
            Err(ProfileIssue::LengthMismatch {
                thickness: 2,
                density: 3
            })
        ));
    }

    #[test]
    fn reference_batch_is_well_formed() {
        let batch = DensityBatch::reference();
        assert_eq!(batch.num_profiles(), 32);
        assert_eq!(batch.num_increments(), 9);
        for index in 0..batch.num_profiles() {
            let profile = batch.profile(index).unwrap();
            let reduced = profile.reduce();
            assert_relative_eq!(reduced.thickness, 0.64, epsilon = 1e-12);
            assert!(profile.density().iter().all(|&rho| rho <= 916.));
            // Densities never decrease with depth
            assert!(profile.density().windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
