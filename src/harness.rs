//! Single-layer vs multilayer equivalence harness.
//!
//! Each profile of a batch is run through the solver twice: once reduced to a
//! single equivalent layer and once with every depth increment as its own
//! layer. The multilayer broadband albedo is then regressed against the
//! single-layer one across the batch.

mod regression;

#[cfg(test)]
mod tests;

use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use rayon::prelude::*;

pub use self::regression::Regression;
use crate::config::ModelConfig;
use crate::error::SnicarError;
use crate::layers::{GrainRadiusCheck, LapLoading, LayerParameterSet, GRAIN_RADIUS_OFFSET};
use crate::profile::{DensityBatch, DensityProfile, ReducedLayer};
use crate::solver::{self, RadiativeTransfer, MAX_SOLAR_ZENITH};

/// How often the calling thread checks on the workers.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Options controlling how a batch is run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarnessOptions {
    /// Number of worker threads, or `None` to choose automatically
    pub num_threads: Option<usize>,
    /// Interval between progress reports (and monitor calls)
    pub progress_interval: Duration,
    /// Treatment of densities that give a non-positive grain radius
    pub grain_radius_check: GrainRadiusCheck,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            progress_interval: Duration::from_secs(5),
            grain_radius_check: GrainRadiusCheck::Warn,
        }
    }
}

/// Surface forcing shared by both paths of every profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    /// Impurity loading on the surface layer
    pub loading: LapLoading,
    /// Solar zenith angle in degrees
    pub solar_zenith: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            loading: LapLoading::clean(),
            solar_zenith: 45.,
        }
    }
}

/// Broadband albedo from both paths for one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileComparison {
    /// The single equivalent layer the profile was reduced to
    pub reduced: ReducedLayer,
    /// Broadband albedo of the single-layer model
    pub single_layer_bba: f64,
    /// Broadband albedo of the multilayer model
    pub multilayer_bba: f64,
}

/// Outcome of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceReport {
    /// One comparison per profile, in batch order
    pub comparisons: Vec<ProfileComparison>,
    /// Fit of multilayer BBA (y) against single-layer BBA (x)
    pub regression: Regression,
}

/// Runs both layer constructions through a solver and compares them.
///
/// The same configuration is used for every invocation.
#[derive(Debug)]
pub struct EquivalenceHarness<'a, S: ?Sized> {
    solver: &'a S,
    config: &'a ModelConfig,
    options: HarnessOptions,
}

impl<'a, S> EquivalenceHarness<'a, S>
where
    S: RadiativeTransfer + ?Sized,
{
    /// Create a harness. The configuration is validated once here.
    pub fn new(
        solver: &'a S,
        config: &'a ModelConfig,
        options: HarnessOptions,
    ) -> Result<Self, SnicarError> {
        config.validate()?;
        Ok(Self {
            solver,
            config,
            options,
        })
    }

    /// Run both paths for a single profile.
    pub fn compare_profile(
        &self,
        profile: DensityProfile<'_>,
        scenario: &Scenario,
    ) -> Result<ProfileComparison, SnicarError> {
        self.compare_unless_cancelled(profile, scenario, &AtomicBool::new(false))
    }

    /// Run both paths for a single profile, checking `cancelled` before each
    /// solver invocation.
    fn compare_unless_cancelled(
        &self,
        profile: DensityProfile<'_>,
        scenario: &Scenario,
        cancelled: &AtomicBool,
    ) -> Result<ProfileComparison, SnicarError> {
        let check = self.options.grain_radius_check;
        let reduced = profile.reduce();

        let single = LayerParameterSet::single_layer(
            reduced,
            scenario.loading,
            scenario.solar_zenith,
            check,
        )?;
        let multi = LayerParameterSet::multilayer(
            profile.thickness(),
            profile.density(),
            scenario.loading,
            scenario.solar_zenith,
            check,
        )?;

        let invoke = |layers: &LayerParameterSet| -> Result<f64, SnicarError> {
            if cancelled.load(Ordering::Relaxed) {
                return Err(SnicarError::Cancelled);
            }
            Ok(solver::invoke(self.solver, self.config, layers)?.bba)
        };
        let single_layer_bba = invoke(&single)?;
        let multilayer_bba = invoke(&multi)?;
        debug!(
            "reduced to {:.1} kg/m³ over {:.3} m: single-layer BBA {single_layer_bba:.4}, multilayer BBA {multilayer_bba:.4}",
            reduced.density, reduced.thickness
        );

        Ok(ProfileComparison {
            reduced,
            single_layer_bba,
            multilayer_bba,
        })
    }

    /// Run every profile of the batch and regress the results.
    pub fn run(
        &self,
        batch: &DensityBatch,
        scenario: &Scenario,
    ) -> Result<EquivalenceReport, SnicarError> {
        self.run_with_monitor(batch, scenario, |_, _| true)
    }

    /// Like [`run`](Self::run), but `monitor` is called from the calling
    /// thread at every progress report with the number of completed and
    /// total profiles. Returning `false` cancels the batch: no further solver
    /// invocations are started, those already in flight are allowed to
    /// finish, and the result is [`SnicarError::Cancelled`].
    ///
    /// The first failing profile also stops the batch and its error is
    /// returned.
    pub fn run_with_monitor<M>(
        &self,
        batch: &DensityBatch,
        scenario: &Scenario,
        mut monitor: M,
    ) -> Result<EquivalenceReport, SnicarError>
    where
        M: FnMut(usize, usize) -> bool,
    {
        let num_profiles = batch.num_profiles();
        if num_profiles < 2 {
            return Err(SnicarError::InsufficientData {
                samples: num_profiles,
            });
        }

        for warning in self.batch_warnings(batch, scenario) {
            warn!("{warning}");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.num_threads.unwrap_or(0))
            .build()
            .map_err(|e| SnicarError::ThreadPool(e.to_string()))?;

        // These atomics keep track of how many profiles have finished and
        // whether to stop starting new ones
        let num_completed = AtomicUsize::new(0);
        let cancelled = AtomicBool::new(false);
        let finished = AtomicBool::new(false);

        let mut results = Vec::new();

        info!(
            "Comparing single-layer and multilayer albedo for {num_profiles} profiles of {} increments",
            batch.num_increments()
        );

        pool.in_place_scope(|s| {
            s.spawn(|_| {
                // Set even if a worker panics, so the loop below ends and the
                // panic resurfaces at the end of the scope
                let _finished = SetOnDrop(&finished);

                (0..num_profiles)
                    .into_par_iter()
                    .map(|index| -> Result<_, SnicarError> {
                        let comparison = batch.profile(index).and_then(|profile| {
                            self.compare_unless_cancelled(profile, scenario, &cancelled)
                        });
                        if let Err(e) = &comparison {
                            if !matches!(e, SnicarError::Cancelled) {
                                cancelled.store(true, Ordering::Relaxed);
                            }
                        }
                        comparison
                    })
                    .inspect(|_| {
                        num_completed.fetch_add(1, Ordering::Relaxed);
                    })
                    .collect_into_vec(&mut results);
            });

            // The work is done in the thread pool, but back here in the
            // calling thread, handle progress reporting and checking for
            // early cancellation
            let mut last_report = Instant::now();
            while !finished.load(Ordering::Acquire) {
                let num_completed = num_completed.load(Ordering::Relaxed);
                if last_report.elapsed() >= self.options.progress_interval {
                    let progress = num_completed as f64 / num_profiles as f64 * 100.;
                    info!("Completed {num_completed}/{num_profiles} profiles ({progress:0.2}%)");
                    if !cancelled.load(Ordering::Relaxed) && !monitor(num_completed, num_profiles) {
                        info!("Cancelling remaining profiles");
                        cancelled.store(true, Ordering::Relaxed);
                    }
                    last_report = Instant::now();
                }

                thread::sleep(POLL_INTERVAL);
            }
        });

        // Any real failure takes precedence over the profiles that were
        // skipped because of it
        debug!("collecting comparisons");
        let mut comparisons = Vec::with_capacity(num_profiles);
        let mut skipped = false;
        for result in results {
            match result {
                Ok(comparison) => comparisons.push(comparison),
                Err(SnicarError::Cancelled) => skipped = true,
                Err(e) => return Err(e),
            }
        }
        if skipped {
            return Err(SnicarError::Cancelled);
        }

        let points: Vec<_> = comparisons
            .iter()
            .map(|c| (c.single_layer_bba, c.multilayer_bba))
            .collect();
        let regression = Regression::fit(&points)?;
        info!(
            "multilayer vs single-layer BBA: slope {:.4}, intercept {:.4}, r {:.4}",
            regression.slope, regression.intercept, regression.correlation
        );

        Ok(EquivalenceReport {
            comparisons,
            regression,
        })
    }

    /// Conditions worth a warning that hold for the whole batch. Individual
    /// solver invocations only log these at debug level.
    fn batch_warnings(&self, batch: &DensityBatch, scenario: &Scenario) -> Vec<String> {
        let mut warnings = Vec::new();

        if scenario.solar_zenith > MAX_SOLAR_ZENITH {
            warnings.push(format!(
                "irradiance profiles exist for solar zenith angles below 90°; using {MAX_SOLAR_ZENITH}° instead of {}°",
                scenario.solar_zenith
            ));
        }

        let species = scenario.loading.species();
        if species.is_theoretical() && scenario.loading.concentration() > 0. {
            warnings.push(format!(
                "{} optical properties are theoretical and have not been validated empirically",
                species.key()
            ));
        }

        if self.options.grain_radius_check == GrainRadiusCheck::Warn {
            // The reduced density never exceeds the densest increment
            let num_dense = batch
                .density()
                .iter()
                .filter(|&&rho| rho >= GRAIN_RADIUS_OFFSET)
                .count();
            if num_dense > 0 {
                warnings.push(format!(
                    "{num_dense} increments have a density of at least {GRAIN_RADIUS_OFFSET} kg/m³, giving a non-positive grain radius"
                ));
            }
        }

        warnings
    }
}

/// Raises a flag when dropped.
struct SetOnDrop<'a>(&'a AtomicBool);

impl Drop for SetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}
