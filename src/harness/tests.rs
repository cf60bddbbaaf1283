use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use approx::assert_relative_eq;
use ndarray::array;

use super::*;
use crate::config::{ModelConfig, NUM_WAVELENGTHS};
use crate::error::{ProfileIssue, SolverError};
use crate::lap::Lap;
use crate::profile::reduce;
use crate::solver::{ModelInputs, ModelOutputs};

fn solver<F>(f: F) -> F
where
    F: Fn(&ModelInputs<'_>) -> Result<ModelOutputs, SolverError> + Sync,
{
    f
}

fn outputs(bba: f64, num_layers: usize) -> ModelOutputs {
    ModelOutputs {
        albedo: vec![bba; NUM_WAVELENGTHS],
        bba,
        absorbed_flux: vec![0.; num_layers + 1],
    }
}

/// Albedo falls linearly with the thickness-weighted column density, so the
/// two constructions of any profile should agree.
fn column_density_albedo(inputs: &ModelInputs<'_>) -> Result<ModelOutputs, SolverError> {
    let layers = inputs.layers();
    let (mass, depth) = layers
        .thickness()
        .iter()
        .zip(layers.density())
        .fold((0., 0.), |(m, d), (dz, rho)| (m + dz * rho, d + dz));
    let bba = 0.95 - 0.0004 * mass / depth;
    Ok(outputs(bba, layers.num_layers()))
}

fn options() -> HarnessOptions {
    HarnessOptions {
        num_threads: Some(4),
        progress_interval: Duration::from_millis(50),
        grain_radius_check: GrainRadiusCheck::Strict,
    }
}

#[test]
fn reference_batch_agrees() {
    let config = ModelConfig::default();
    let solver = solver(column_density_albedo);
    let harness = EquivalenceHarness::new(&solver, &config, options()).unwrap();
    let batch = DensityBatch::reference();

    let report = harness.run(&batch, &Scenario::default()).unwrap();
    assert_eq!(report.comparisons.len(), 32);

    for (index, comparison) in report.comparisons.iter().enumerate() {
        let profile = batch.profile(index).unwrap();
        assert_eq!(comparison.reduced, profile.reduce());
        // The thin surface layer shares the reduced density, so the column
        // mean is unchanged
        assert_relative_eq!(
            comparison.single_layer_bba,
            comparison.multilayer_bba,
            epsilon = 1e-9
        );
    }

    let fit = report.regression;
    assert_eq!(fit.samples, 32);
    assert_relative_eq!(fit.slope, 1., epsilon = 1e-6);
    assert_relative_eq!(fit.intercept, 0., epsilon = 1e-6);
    assert_relative_eq!(fit.correlation, 1., epsilon = 1e-9);
}

#[test]
fn identical_albedo_gives_identity_fit() {
    // The answer depends only on the surface density, which is the same for
    // both constructions of a uniform profile
    let config = ModelConfig::default();
    let solver = solver(|inputs| {
        let layers = inputs.layers();
        Ok(outputs(0.9 - layers.density()[0] / 2000., layers.num_layers()))
    });
    let harness = EquivalenceHarness::new(&solver, &config, options()).unwrap();
    let density = array![
        [300., 300., 300.],
        [450., 450., 450.],
        [600., 600., 600.],
        [916., 916., 916.],
    ];
    let batch = DensityBatch::new(vec![0.05, 0.1, 0.2], density.view()).unwrap();

    let report = harness.run(&batch, &Scenario::default()).unwrap();
    for comparison in &report.comparisons {
        assert_eq!(comparison.single_layer_bba, comparison.multilayer_bba);
    }
    assert_eq!(report.regression.slope, 1.);
    assert_eq!(report.regression.intercept, 0.);
    assert_relative_eq!(report.regression.correlation, 1., epsilon = 1e-12);
}

#[test]
fn results_follow_batch_order() {
    let config = ModelConfig::default();
    // Single-layer runs see the mean, multilayer runs see the surface
    let solver = solver(|inputs| {
        let layers = inputs.layers();
        let rho = if layers.num_layers() == 2 {
            layers.density()[1]
        } else {
            layers.density()[0]
        };
        Ok(outputs(1. - rho / 1000., layers.num_layers()))
    });
    let batch = DensityBatch::reference();

    let serial = EquivalenceHarness::new(
        &solver,
        &config,
        HarnessOptions {
            num_threads: Some(1),
            ..options()
        },
    )
    .unwrap()
    .run(&batch, &Scenario::default())
    .unwrap();
    let parallel = EquivalenceHarness::new(&solver, &config, options())
        .unwrap()
        .run(&batch, &Scenario::default())
        .unwrap();

    assert_eq!(serial, parallel);
    for (index, comparison) in serial.comparisons.iter().enumerate() {
        let surface = batch.density()[[index, 0]];
        assert_relative_eq!(comparison.multilayer_bba, 1. - surface / 1000.);
    }
}

#[test]
fn solver_sees_both_constructions() {
    let config = ModelConfig::default();
    let seen = Mutex::new(Vec::new());
    let solver = solver(|inputs| {
        let layers = inputs.layers();
        seen.lock().unwrap().push((
            layers.density().to_vec(),
            layers.thickness().to_vec(),
            layers.grain_radius().to_vec(),
            layers.mixing_ratio().to_vec(),
            inputs.solar_zenith(),
        ));
        Ok(outputs(0.6, layers.num_layers()))
    });
    let harness = EquivalenceHarness::new(&solver, &config, options()).unwrap();
    let scenario = Scenario {
        loading: LapLoading::new(Lap::GlacierAlgae, 20000.).unwrap(),
        solar_zenith: 53.,
    };

    let thickness = [0.05, 0.05];
    let density = [300., 600.];
    let profile = DensityProfile::new(&thickness, &density).unwrap();
    let comparison = harness.compare_profile(profile, &scenario).unwrap();
    assert_relative_eq!(comparison.reduced.density, 450., max_relative = 1e-12);
    assert_relative_eq!(comparison.reduced.thickness, 0.1, max_relative = 1e-12);

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 2);

    let (rho, dz, radius, mixing, zenith) = &seen[0];
    assert_eq!(rho.len(), 2);
    assert_relative_eq!(rho[0], 450., max_relative = 1e-12);
    assert_eq!(rho[0], rho[1]);
    assert_eq!(dz[0], 0.001);
    assert_relative_eq!(radius[0], 550., max_relative = 1e-12);
    assert_eq!(mixing, &[20000., 0.]);
    assert_eq!(*zenith, 53.);

    let (rho, dz, radius, mixing, zenith) = &seen[1];
    assert_eq!(rho, &density);
    assert_eq!(dz, &thickness);
    assert_eq!(radius, &[700., 400.]);
    assert_eq!(mixing, &[20000., 0.]);
    assert_eq!(*zenith, 53.);
}

#[test]
fn single_profile_is_not_enough() {
    let config = ModelConfig::default();
    let calls = AtomicUsize::new(0);
    let solver = solver(|inputs| {
        calls.fetch_add(1, Ordering::Relaxed);
        column_density_albedo(inputs)
    });
    let harness = EquivalenceHarness::new(&solver, &config, options()).unwrap();
    let density = array![[300., 400.]];
    let batch = DensityBatch::new(vec![0.05, 0.05], density.view()).unwrap();

    assert!(matches!(
        harness.run(&batch, &Scenario::default()),
        Err(SnicarError::InsufficientData { samples: 1 })
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn solver_failure_fails_batch() {
    let config = ModelConfig::default();
    let solver = solver(|inputs| {
        let layers = inputs.layers();
        if layers.density().contains(&916.) {
            Err(SolverError::new("non-physical optical depth"))
        } else {
            column_density_albedo(inputs)
        }
    });
    let harness = EquivalenceHarness::new(&solver, &config, options()).unwrap();

    match harness.run(&DensityBatch::reference(), &Scenario::default()) {
        Err(SnicarError::Solver(e)) => assert_eq!(e.to_string(), "non-physical optical depth"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn monitor_can_cancel() {
    let config = ModelConfig::default();
    let calls = AtomicUsize::new(0);
    let solver = solver(|inputs| {
        calls.fetch_add(1, Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(20));
        column_density_albedo(inputs)
    });
    let harness = EquivalenceHarness::new(
        &solver,
        &config,
        HarnessOptions {
            num_threads: Some(1),
            progress_interval: Duration::ZERO,
            ..options()
        },
    )
    .unwrap();

    let mut monitor_calls = 0;
    let result = harness.run_with_monitor(
        &DensityBatch::reference(),
        &Scenario::default(),
        |completed, total| {
            monitor_calls += 1;
            assert!(completed <= total);
            false
        },
    );

    assert!(matches!(result, Err(SnicarError::Cancelled)));
    assert_eq!(monitor_calls, 1);
    assert!(calls.load(Ordering::Relaxed) < 64);
}

#[test]
fn no_solver_calls_after_cancelling() {
    let config = ModelConfig::default();
    let stop_requested = AtomicBool::new(false);
    let calls = AtomicUsize::new(0);
    let late_calls = AtomicUsize::new(0);
    let solver = solver(|inputs| {
        calls.fetch_add(1, Ordering::SeqCst);
        if stop_requested.load(Ordering::SeqCst) {
            late_calls.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_millis(200));
        column_density_albedo(inputs)
    });
    let harness = EquivalenceHarness::new(
        &solver,
        &config,
        HarnessOptions {
            num_threads: Some(1),
            progress_interval: Duration::from_millis(20),
            ..options()
        },
    )
    .unwrap();

    // Stop while the single-layer run of the first profile is in flight
    let result = harness.run_with_monitor(&DensityBatch::reference(), &Scenario::default(), |_, _| {
        stop_requested.store(true, Ordering::SeqCst);
        false
    });

    assert!(matches!(result, Err(SnicarError::Cancelled)));
    assert!(calls.load(Ordering::SeqCst) <= 1);
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn compare_profile_runs_both_paths() {
    let config = ModelConfig::default();
    let calls = AtomicUsize::new(0);
    let solver = solver(|inputs| {
        calls.fetch_add(1, Ordering::Relaxed);
        column_density_albedo(inputs)
    });
    let harness = EquivalenceHarness::new(&solver, &config, options()).unwrap();

    let profile = DensityProfile::new(&[0.05, 0.05], &[300., 300.]).unwrap();
    let comparison = harness.compare_profile(profile, &Scenario::default()).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert_eq!(comparison.reduced.density, 300.);
    assert_relative_eq!(comparison.reduced.thickness, 0.1, max_relative = 1e-12);
    assert_relative_eq!(
        comparison.single_layer_bba,
        comparison.multilayer_bba,
        epsilon = 1e-12
    );
}

#[test]
fn batch_wide_conditions_are_warned_once() {
    let config = ModelConfig::default();
    let solver = solver(column_density_albedo);
    let lenient = EquivalenceHarness::new(
        &solver,
        &config,
        HarnessOptions {
            grain_radius_check: GrainRadiusCheck::Warn,
            ..options()
        },
    )
    .unwrap();

    let batch = DensityBatch::reference();
    assert!(lenient.batch_warnings(&batch, &Scenario::default()).is_empty());

    let scenario = Scenario {
        loading: LapLoading::new(Lap::SnowAlgae, 500.).unwrap(),
        solar_zenith: 95.,
    };
    let warnings = lenient.batch_warnings(&batch, &scenario);
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("89°"));
    assert!(warnings[1].contains("snw_alg"));

    // Snow algae without any loading is not worth a warning
    let scenario = Scenario {
        loading: LapLoading::new(Lap::SnowAlgae, 0.).unwrap(),
        ..Default::default()
    };
    assert!(lenient.batch_warnings(&batch, &scenario).is_empty());

    let density = array![[900., 1000.], [1050., 1100.]];
    let dense = DensityBatch::new(vec![0.1, 0.1], density.view()).unwrap();
    let warnings = lenient.batch_warnings(&dense, &Scenario::default());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("3 increments"));

    // Strict batches fail instead
    let strict = EquivalenceHarness::new(&solver, &config, options()).unwrap();
    assert!(strict
        .batch_warnings(&dense, &Scenario::default())
        .is_empty());
}

#[test]
fn unphysical_density_is_rejected_before_solving() {
    let config = ModelConfig::default();
    let calls = AtomicUsize::new(0);
    let solver = solver(|inputs| {
        calls.fetch_add(1, Ordering::Relaxed);
        column_density_albedo(inputs)
    });
    let harness = EquivalenceHarness::new(
        &solver,
        &config,
        HarnessOptions {
            num_threads: Some(1),
            ..options()
        },
    )
    .unwrap();

    let density = array![[1000., 1000.], [1000., 1000.]];
    let batch = DensityBatch::new(vec![0.05, 0.05], density.view()).unwrap();
    assert!(matches!(
        harness.run(&batch, &Scenario::default()),
        Err(SnicarError::InvalidProfile(
            ProfileIssue::UnphysicalGrainRadius { .. }
        ))
    ));
    assert_eq!(calls.load(Ordering::Relaxed), 0);

    let density = array![[300., 400.], [500., -1.]];
    let batch = DensityBatch::new(vec![0.05, 0.05], density.view()).unwrap();
    assert!(matches!(
        harness.run(&batch, &Scenario::default()),
        Err(SnicarError::InvalidProfile(ProfileIssue::NonPositiveDensity {
            index: 1
        }))
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let config = ModelConfig {
        surface_reflectance: vec![0.1; 10],
        ..Default::default()
    };
    let solver = solver(column_density_albedo);
    assert!(matches!(
        EquivalenceHarness::new(&solver, &config, options()),
        Err(SnicarError::InvalidConfig(_))
    ));
}

#[test]
fn reduction_matches_free_function() {
    let batch = DensityBatch::reference();
    for index in 0..batch.num_profiles() {
        let profile = batch.profile(index).unwrap();
        let reduced = reduce(batch.thickness(), profile.density()).unwrap();
        assert_eq!(reduced, profile.reduce());
    }
}
