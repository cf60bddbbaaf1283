//! Python interface.
//!
//! NOTE: this module is the only one that uses `pyo3`. The feeder, the
//! Python callable that actually solves the radiative transfer problem, is
//! wrapped so that it can be driven by the harness like any other solver.

use std::path::PathBuf;

use log::debug;
use ndarray::Array1;
use numpy::{PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2, ToPyArray};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::{
    Illumination, IncidentFlux, ModelConfig, RefractiveIndex, SolverKind, NUM_WAVELENGTHS,
};
use crate::error::{SnicarError, SolverError};
use crate::harness::{EquivalenceHarness, HarnessOptions, ProfileComparison, Scenario};
use crate::lap::Lap;
use crate::layers::{GrainRadiusCheck, LapLoading};
use crate::profile::{self, DensityBatch};
use crate::solver::{ModelInputs, ModelOutputs, RadiativeTransfer};

impl From<SnicarError> for PyErr {
    fn from(e: SnicarError) -> Self {
        match e {
            SnicarError::Solver(_) => PyRuntimeError::new_err(e.to_string()),
            _ => PyValueError::new_err(e.to_string()),
        }
    }
}

/// A Python feeder callable.
///
/// It is called with a `types.SimpleNamespace` of inputs and must return an
/// object with `albedo`, `BBA`, and `abs_slr` attributes.
#[derive(Debug)]
struct PyFeeder {
    feeder: Py<PyAny>,
}

impl PyFeeder {
    /// Flatten the typed inputs into the feeder's attribute record.
    fn namespace<'py>(py: Python<'py>, inputs: &ModelInputs<'_>) -> PyResult<Bound<'py, PyAny>> {
        let config = inputs.config();
        let layers = inputs.layers();
        let grain = &config.grain;
        let num_layers = layers.num_layers();

        let attrs = PyDict::new(py);

        let mut dir_base = config.data_dir.to_string_lossy().into_owned();
        if !dir_base.ends_with('/') {
            dir_base.push('/');
        }
        attrs.set_item("dir_base", dir_base)?;

        // Radiative transfer configuration
        attrs.set_item("rf_ice", config.refractive_index.code())?;
        attrs.set_item("incoming_i", config.incident_flux.code())?;
        attrs.set_item("DIRECT", i32::from(config.illumination == Illumination::Direct))?;
        attrs.set_item("APRX_TYP", config.approximation.code())?;
        attrs.set_item("DELTA", i32::from(config.delta_scaling))?;
        attrs.set_item("solzen", inputs.solar_zenith())?;
        attrs.set_item("TOON", config.solver == SolverKind::Toon)?;
        attrs.set_item("ADD_DOUBLE", config.solver == SolverKind::AddingDoubling)?;
        attrs.set_item("R_sfc", config.surface_reflectance.to_pyarray(py))?;
        attrs.set_item("nbr_wvl", NUM_WAVELENGTHS)?;

        // Layers
        let layer_type: Vec<i32> = layers
            .layer_type()
            .iter()
            .map(|t| i32::from(t.code()))
            .collect();
        attrs.set_item("nbr_lyr", num_layers)?;
        attrs.set_item("layer_type", layer_type)?;
        attrs.set_item("dz", layers.thickness().to_vec())?;
        attrs.set_item("rho_layers", layers.density().to_vec())?;
        attrs.set_item("grain_rds", layers.grain_radius().to_vec())?;

        // Grains
        attrs.set_item("grain_shp", vec![i32::from(grain.shape.code()); num_layers])?;
        attrs.set_item("rwater", vec![grain.water_coating; num_layers])?;
        attrs.set_item("shp_fctr", vec![grain.shape_factor; num_layers])?;
        attrs.set_item("grain_ar", vec![grain.aspect_ratio; num_layers])?;
        attrs.set_item("side_length", grain.side_length)?;
        attrs.set_item("depth", grain.depth)?;

        // Light-absorbing particles
        attrs.set_item("nbr_aer", Lap::COUNT)?;
        attrs.set_item("GA_units", config.algae_units.code())?;
        attrs.set_item("Cfactor", config.concentration_factor)?;
        for lap in Lap::ALL {
            attrs.set_item(
                format!("mss_cnc_{}", lap.key()),
                layers.mixing_ratio_of(lap).to_vec(),
            )?;
            attrs.set_item(format!("FILE_{}", lap.key()), lap.optics_file())?;
        }

        py.import("types")?
            .getattr("SimpleNamespace")?
            .call((), Some(&attrs))
    }
}

impl RadiativeTransfer for PyFeeder {
    fn run(&self, inputs: &ModelInputs<'_>) -> Result<ModelOutputs, SolverError> {
        Python::with_gil(|py| -> PyResult<_> {
            let namespace = Self::namespace(py, inputs)?;
            let outputs = self.feeder.bind(py).call1((namespace,))?;
            Ok(ModelOutputs {
                albedo: outputs.getattr("albedo")?.extract()?,
                bba: outputs.getattr("BBA")?.extract()?,
                absorbed_flux: outputs.getattr("abs_slr")?.extract()?,
            })
        })
        .map_err(SolverError::new)
    }
}

/// Results of comparing the single-layer and multilayer models.
///
/// The arrays are dimensioned as (`num_profiles`, ).
#[pyclass]
#[derive(Debug)]
struct EquivalenceResults {
    reduced_density: Array1<f64>,
    reduced_thickness: Array1<f64>,
    single_layer_bba: Array1<f64>,
    multilayer_bba: Array1<f64>,
    #[pyo3(get)]
    slope: f64,
    #[pyo3(get)]
    intercept: f64,
    #[pyo3(get)]
    rvalue: f64,
    #[pyo3(get)]
    stderr: f64,
}

#[pymethods]
impl EquivalenceResults {
    #[getter]
    fn reduced_density<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.reduced_density.to_pyarray(py)
    }

    #[getter]
    fn reduced_thickness<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.reduced_thickness.to_pyarray(py)
    }

    #[getter]
    fn single_layer_bba<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.single_layer_bba.to_pyarray(py)
    }

    #[getter]
    fn multilayer_bba<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.multilayer_bba.to_pyarray(py)
    }
}

/// Compare single-layer and multilayer albedo for a batch of density
/// profiles.
///
/// `thickness` has shape (`num_increments`, ) and is shared by every
/// profile. `density` has shape (`num_profiles`, `num_increments`) and is in
/// kg/m³, surface first.
///
/// `feeder` is called with a namespace of inputs for every solver run, twice
/// per profile, and must return an object with `albedo`, `BBA`, and `abs_slr`
/// attributes. It is called from worker threads.
///
/// The impurity given by `species` (a feeder key such as `"glacier_algae"`)
/// is loaded on the surface layer only, at `concentration`.
///
/// `surface_reflectance` has shape (480, ) and defaults to 0.1 in every band.
/// `solver` is either `"adding_doubling"` or `"toon"`. `incident_flux` and
/// `refractive_index` use the feeder's integer codes. With
/// `strict_grain_radius`, densities of 1000 kg/m³ or more are an error;
/// otherwise they are logged as warnings.
///
/// The number of worker threads is controlled by `num_threads`. It must be a
/// positive integer, or `None` to automatically choose the number of threads.
#[pyfunction]
#[pyo3(signature = (thickness, density, feeder, *, species="glacier_algae", concentration=0., solar_zenith=45., surface_reflectance=None, data_dir=None, solver="adding_doubling", incident_flux=4, refractive_index=2, strict_grain_radius=false, num_threads=None))]
#[allow(clippy::too_many_arguments)]
fn compare_layer_models(
    py: Python<'_>,
    thickness: PyReadonlyArray1<'_, f64>,
    density: PyReadonlyArray2<'_, f64>,
    feeder: Py<PyAny>,
    species: &str,
    concentration: f64,
    solar_zenith: f64,
    surface_reflectance: Option<PyReadonlyArray1<'_, f64>>,
    data_dir: Option<PathBuf>,
    solver: &str,
    incident_flux: u8,
    refractive_index: u8,
    strict_grain_radius: bool,
    num_threads: Option<usize>,
) -> PyResult<EquivalenceResults> {
    let species = Lap::from_key(species)
        .ok_or_else(|| PyValueError::new_err(format!("unknown impurity species '{species}'")))?;
    let solver = match solver {
        "adding_doubling" => SolverKind::AddingDoubling,
        "toon" => SolverKind::Toon,
        _ => {
            return Err(PyValueError::new_err(format!(
                "unknown solver '{solver}', expected 'adding_doubling' or 'toon'"
            )))
        }
    };
    let incident_flux = IncidentFlux::from_code(incident_flux)
        .ok_or_else(|| PyValueError::new_err("incident flux code must be between 0 and 6"))?;
    let refractive_index = RefractiveIndex::from_code(refractive_index)
        .ok_or_else(|| PyValueError::new_err("refractive index code must be 0, 1, or 2"))?;

    let mut config = ModelConfig {
        solver,
        incident_flux,
        refractive_index,
        ..Default::default()
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(reflectance) = surface_reflectance {
        config.surface_reflectance = reflectance.as_slice()?.to_vec();
    }

    let batch = DensityBatch::new(thickness.as_slice()?.to_vec(), density.as_array())
        .map_err(SnicarError::from)?;
    debug!(
        "{} profiles of {} increments",
        batch.num_profiles(),
        batch.num_increments()
    );

    let scenario = Scenario {
        loading: LapLoading::new(species, concentration).map_err(SnicarError::from)?,
        solar_zenith,
    };
    let options = HarnessOptions {
        num_threads,
        grain_radius_check: if strict_grain_radius {
            GrainRadiusCheck::Strict
        } else {
            GrainRadiusCheck::Warn
        },
        ..Default::default()
    };

    let feeder = PyFeeder { feeder };
    let harness = EquivalenceHarness::new(&feeder, &config, options)?;

    // Release the GIL so the workers can call the feeder, and check for
    // Ctrl-C at every progress report
    let mut interrupt = None;
    let report = py.allow_threads(|| {
        harness.run_with_monitor(&batch, &scenario, |_, _| {
            match Python::with_gil(|py| py.check_signals()) {
                Ok(()) => true,
                Err(e) => {
                    interrupt = Some(e);
                    false
                }
            }
        })
    });
    if let Some(e) = interrupt {
        return Err(e);
    }
    let report = report?;

    let column = |f: fn(&ProfileComparison) -> f64| -> Array1<f64> {
        report.comparisons.iter().map(f).collect()
    };
    Ok(EquivalenceResults {
        reduced_density: column(|c| c.reduced.density),
        reduced_thickness: column(|c| c.reduced.thickness),
        single_layer_bba: column(|c| c.single_layer_bba),
        multilayer_bba: column(|c| c.multilayer_bba),
        slope: report.regression.slope,
        intercept: report.regression.intercept,
        rvalue: report.regression.correlation,
        stderr: report.regression.slope_stderr,
    })
}

/// Reduce one profile to a single layer.
///
/// Returns the thickness-weighted mean density in kg/m³ and the total
/// thickness in m.
#[pyfunction]
fn reduce_profile(
    thickness: PyReadonlyArray1<'_, f64>,
    density: PyReadonlyArray1<'_, f64>,
) -> PyResult<(f64, f64)> {
    let reduced = profile::reduce(thickness.as_slice()?, density.as_slice()?)?;
    Ok((reduced.density, reduced.thickness))
}

/// The reference batch as (`thickness`, `density`) arrays.
#[pyfunction]
fn reference_batch(py: Python<'_>) -> (Bound<'_, PyArray1<f64>>, Bound<'_, PyArray2<f64>>) {
    let batch = DensityBatch::reference();
    (
        batch.thickness().to_pyarray(py),
        batch.density().to_pyarray(py),
    )
}

/// A Python module implemented in Rust.
#[pymodule]
fn snicar_density(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_function(wrap_pyfunction!(compare_layer_models, m)?)?;
    m.add_function(wrap_pyfunction!(reduce_profile, m)?)?;
    m.add_function(wrap_pyfunction!(reference_batch, m)?)?;
    m.add_class::<EquivalenceResults>()?;
    Ok(())
}
