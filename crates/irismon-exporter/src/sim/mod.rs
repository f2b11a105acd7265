//! Synthetic telemetry for the Iris model service.
//!
//! Nothing here looks at a real model: each cycle fabricates one request, one
//! prediction and the surrounding gauges from uniform random draws. The random
//! source is a type parameter so tests can drive it with a seeded `StdRng`.

pub mod periodic;

use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use irismon_core::error::{MonError, Result};
use irismon_core::registry::Registry;

use crate::config::{SampleRange, SimulationSection};
use crate::obs::iris::{
    IrisClass, CLASS_LABEL, FEATURE_LABEL, FEATURE_VALUES, MODEL_CONFIDENCE, PREDICTIONS_TOTAL,
    REQUESTS_TOTAL, REQUEST_LATENCY, SYSTEM_CPU, SYSTEM_MEMORY,
};

pub use periodic::PeriodicTask;

/// What one cycle wrote, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub predicted: IrisClass,
    pub latency_seconds: f64,
    /// Confidence per class, in `IrisClass::ALL` order.
    pub confidences: [f64; 3],
}

pub struct Simulator<R> {
    registry: Arc<Registry>,
    settings: SimulationSection,
    rng: R,
}

impl Simulator<StdRng> {
    /// Simulator seeded from `settings.seed`, or from OS entropy when unset.
    pub fn from_config(registry: Arc<Registry>, settings: &SimulationSection) -> Result<Self> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(registry, settings, rng)
    }
}

impl<R: Rng> Simulator<R> {
    pub fn new(registry: Arc<Registry>, settings: &SimulationSection, rng: R) -> Result<Self> {
        // Empty or overflowing ranges would make `gen_range` panic mid-cycle.
        settings.validate()?;
        Ok(Self {
            registry,
            settings: settings.clone(),
            rng,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.settings.interval_ms)
    }

    fn sample(&mut self, range: SampleRange) -> f64 {
        self.rng.gen_range(range.min()..range.max())
    }

    /// Apply one cycle of writes.
    ///
    /// Registry errors that mean an instrument is missing or mistyped are
    /// returned as-is; anything else is wrapped as `SimulationCycle`.
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        self.write_cycle().map_err(|e| {
            if e.is_programming_error() {
                e
            } else {
                MonError::SimulationCycle(e.to_string())
            }
        })
    }

    fn write_cycle(&mut self) -> Result<CycleReport> {
        let reg = Arc::clone(&self.registry);

        reg.inc(REQUESTS_TOTAL, &[])?;

        let latency_seconds = self.sample(self.settings.latency_seconds);
        reg.observe(REQUEST_LATENCY, &[], latency_seconds)?;

        let predicted = IrisClass::ALL[self.rng.gen_range(0..IrisClass::ALL.len())];
        reg.inc(PREDICTIONS_TOTAL, &[(CLASS_LABEL, predicted.as_str())])?;

        let mut confidences = [0.0; 3];
        for (i, class) in IrisClass::ALL.into_iter().enumerate() {
            let range = if class == predicted {
                self.settings.confidence.predicted
            } else {
                self.settings.confidence.other
            };
            let conf = self.sample(range);
            reg.observe(MODEL_CONFIDENCE, &[(CLASS_LABEL, class.as_str())], conf)?;
            confidences[i] = conf;
        }

        for (feature, range) in self.settings.features.ranges() {
            let v = self.sample(range);
            reg.set_gauge(FEATURE_VALUES, &[(FEATURE_LABEL, feature)], v)?;
        }

        let memory = self.sample(self.settings.memory_percent);
        reg.set_gauge(SYSTEM_MEMORY, &[], memory)?;
        let cpu = self.sample(self.settings.cpu_percent);
        reg.set_gauge(SYSTEM_CPU, &[], cpu)?;

        Ok(CycleReport {
            predicted,
            latency_seconds,
            confidences,
        })
    }

    /// Run one cycle and decide whether the loop keeps going.
    ///
    /// Cycle failures (including panics) are logged and skipped. A
    /// programming error stops the loop, since every later cycle would fail
    /// the same way.
    pub fn tick(&mut self) -> ControlFlow<()> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle()))
            .unwrap_or_else(|_| Err(MonError::SimulationCycle("cycle panicked".into())));

        match outcome {
            Ok(report) => {
                tracing::trace!(
                    predicted = report.predicted.as_str(),
                    latency_seconds = report.latency_seconds,
                    "simulation cycle"
                );
                ControlFlow::Continue(())
            }
            Err(e) if e.is_programming_error() => {
                tracing::error!(error = %e, code = e.code(), "simulation stopped: registry is missing instruments");
                ControlFlow::Break(())
            }
            Err(e) => {
                tracing::warn!(error = %e, code = e.code(), "simulation cycle failed");
                ControlFlow::Continue(())
            }
        }
    }
}

impl<R: Rng + Send + 'static> Simulator<R> {
    /// Move the simulator onto a periodic background task.
    pub fn spawn(mut self) -> PeriodicTask {
        let every = self.interval();
        tracing::info!(interval_ms = every.as_millis() as u64, "simulation loop started");
        PeriodicTask::spawn("simulation", every, move || self.tick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irismon_core::registry::MetricKind;

    use crate::obs::register_iris_metrics;

    fn simulator(seed: u64) -> (Arc<Registry>, Simulator<StdRng>) {
        let reg = Arc::new(Registry::new());
        register_iris_metrics(&reg).unwrap();
        let sim = Simulator::new(
            Arc::clone(&reg),
            &SimulationSection::default(),
            StdRng::seed_from_u64(seed),
        )
        .unwrap();
        (reg, sim)
    }

    #[test]
    fn same_seed_same_cycles() {
        let (_, mut a) = simulator(7);
        let (_, mut b) = simulator(7);
        for _ in 0..10 {
            assert_eq!(a.run_cycle().unwrap(), b.run_cycle().unwrap());
        }
    }

    #[test]
    fn values_stay_in_configured_ranges() {
        let (reg, mut sim) = simulator(11);
        let defaults = SimulationSection::default();
        for _ in 0..50 {
            let report = sim.run_cycle().unwrap();
            let lat = defaults.latency_seconds;
            assert!(report.latency_seconds >= lat.min() && report.latency_seconds < lat.max());
            for (class, conf) in IrisClass::ALL.iter().zip(report.confidences) {
                let range = if *class == report.predicted {
                    defaults.confidence.predicted
                } else {
                    defaults.confidence.other
                };
                assert!(conf >= range.min() && conf < range.max());
            }

            let snap = reg.snapshot();
            for (feature, range) in defaults.features.ranges() {
                let v = snap.value(FEATURE_VALUES, &[(FEATURE_LABEL, feature)]).unwrap();
                assert!(v >= range.min() && v < range.max(), "{feature}={v}");
            }
            let mem = snap.value(SYSTEM_MEMORY, &[]).unwrap();
            assert!((40.0..90.0).contains(&mem));
            let cpu = snap.value(SYSTEM_CPU, &[]).unwrap();
            assert!((10.0..80.0).contains(&cpu));
        }
    }

    #[test]
    fn missing_instruments_stop_the_loop() {
        let reg = Arc::new(Registry::new());
        let mut sim = Simulator::new(reg, &SimulationSection::default(), StdRng::seed_from_u64(1))
            .unwrap();
        let err = sim.run_cycle().unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_METRIC");
        assert!(sim.tick().is_break());
    }

    #[test]
    fn recoverable_cycle_error_keeps_the_loop_going() {
        let reg = Arc::new(Registry::new());
        reg.register(PREDICTIONS_TOTAL, MetricKind::Counter, "p", &["class"])
            .unwrap();
        // Requests and latency register before the clash; the rest never do.
        let err = register_iris_metrics(&reg).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_METRIC");

        let mut sim = Simulator::new(
            Arc::clone(&reg),
            &SimulationSection::default(),
            StdRng::seed_from_u64(2),
        )
        .unwrap();
        let err = sim.run_cycle().unwrap_err();
        assert_eq!(err.code(), "SIMULATION_CYCLE");
        assert!(!err.is_programming_error());

        assert!(sim.tick().is_continue());
        assert!(sim.tick().is_continue());
        // Three cycles each got as far as the request counter.
        assert_eq!(reg.snapshot().value(REQUESTS_TOTAL, &[]), Some(3.0));
    }

    #[test]
    fn panicking_cycle_keeps_the_loop_going() {
        let (reg, _) = simulator(4);
        let mut settings = SimulationSection::default();
        // Width overflows to infinity; only constructible by skipping `new`.
        settings.latency_seconds = SampleRange(-1.0e308, 1.0e308);
        let mut sim = Simulator {
            registry: Arc::clone(&reg),
            settings,
            rng: StdRng::seed_from_u64(4),
        };

        assert!(sim.tick().is_continue());
        assert!(sim.tick().is_continue());
        let snap = reg.snapshot();
        assert_eq!(snap.value(REQUESTS_TOTAL, &[]), Some(2.0));
        assert_eq!(
            snap.sample(REQUEST_LATENCY, &[]).and_then(|s| s.sum_count()),
            Some((0.0, 0))
        );
    }

    #[test]
    fn invalid_ranges_are_rejected_up_front() {
        let reg = Arc::new(Registry::new());
        let mut settings = SimulationSection::default();
        settings.cpu_percent = SampleRange(80.0, 10.0);
        assert!(Simulator::new(reg, &settings, StdRng::seed_from_u64(1)).is_err());
    }
}
