//! Trim problem over a single scalar control property.

use crate::dataset::PropertySnapshot;
use crate::oracle::{
    fuel_flow_property, Oracle, OracleError, GUESS_AILERON, GUESS_ALPHA, GUESS_BETA,
    GUESS_ELEVATOR, GUESS_RUDDER, GUESS_THROTTLE, PROP_AILERON_CMD, PROP_ALPHA_RAD,
    PROP_BETA_RAD, PROP_ELEVATOR_CMD, PROP_GAMMA_DEG, PROP_RUDDER_CMD, PROP_THROTTLE_CMD,
    TRIM_MODE_FULL,
};

/// Simulation steps run after a successful trim so that fuel-flow figures
/// settle to steady running values. Immediately post-trim they are not yet
/// converged.
pub const WARMUP_STEPS: usize = 10;

/// Control/attitude values of the last known trim solution, fed into the
/// backend's guess slots before the next attempt. Carrying this between
/// calls lets adjacent trims converge far faster than a cold start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmStart {
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
    pub throttle: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl WarmStart {
    fn capture<O: Oracle>(fdm: &mut O) -> Result<Self, OracleError> {
        Ok(Self {
            aileron: fdm.get_property(PROP_AILERON_CMD)?,
            elevator: fdm.get_property(PROP_ELEVATOR_CMD)?,
            rudder: fdm.get_property(PROP_RUDDER_CMD)?,
            throttle: fdm.get_property(PROP_THROTTLE_CMD)?,
            alpha: fdm.get_property(PROP_ALPHA_RAD)?,
            beta: fdm.get_property(PROP_BETA_RAD)?,
        })
    }

    fn apply<O: Oracle>(&self, fdm: &mut O) -> Result<(), OracleError> {
        fdm.set_property(GUESS_AILERON, self.aileron)?;
        fdm.set_property(GUESS_ELEVATOR, self.elevator)?;
        fdm.set_property(GUESS_RUDDER, self.rudder)?;
        fdm.set_property(GUESS_THROTTLE, self.throttle)?;
        fdm.set_property(GUESS_ALPHA, self.alpha)?;
        fdm.set_property(GUESS_BETA, self.beta)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TrimSolution {
    /// Trim-exact state, except the per-engine fuel-flow keys which carry
    /// the warmed-up steady running values.
    pub snapshot: PropertySnapshot,
    pub warm: WarmStart,
}

/// Result of one trim attempt. Divergence is a signal the bisection steers
/// by, not an error.
#[derive(Debug)]
pub enum TrimOutcome {
    Trimmed(TrimSolution),
    Diverged,
}

/// Binds one scalar oracle property to the trim machinery.
#[derive(Debug, Clone)]
pub struct TrimProblem {
    property: &'static str,
}

impl TrimProblem {
    pub fn new(property: &'static str) -> Self {
        Self { property }
    }

    /// Write a candidate value into the bound property.
    pub fn configure<O: Oracle>(&self, fdm: &mut O, value: f64) -> Result<(), OracleError> {
        fdm.set_property(self.property, value)
    }

    /// Attempt a trim at the currently configured value.
    ///
    /// Oracle faults other than trim divergence propagate; divergence maps
    /// to `TrimOutcome::Diverged` so the caller can steer its bracket.
    pub fn solve<O: Oracle>(
        &self,
        fdm: &mut O,
        warm: Option<&WarmStart>,
    ) -> Result<TrimOutcome, OracleError> {
        if let Some(warm) = warm {
            warm.apply(fdm)?;
        }

        match fdm.do_trim(TRIM_MODE_FULL) {
            Ok(()) => {}
            Err(e) if e.is_trim_divergence() => return Ok(TrimOutcome::Diverged),
            Err(e) => return Err(e),
        }

        let warm = WarmStart::capture(fdm)?;

        // XXX why does gamma need re-applying after trim? Removing this
        // writeback changes the gamma the IC block reports downstream.
        let gamma = fdm.get_property(PROP_GAMMA_DEG)?;
        fdm.set_property(PROP_GAMMA_DEG, gamma)?;

        let mut snapshot = fdm.property_catalog("/")?;

        // Run the engines at trim for a few steps and splice only the
        // settled fuel-flow figures back in. Every other field keeps the
        // exact trim solution.
        let num_engines = fdm.num_engines()?;
        for engine in 0..num_engines {
            fdm.init_engine_running(engine)?;
        }
        for _ in 0..WARMUP_STEPS {
            fdm.run()?;
        }
        let warmed = fdm.property_catalog("/")?;
        for engine in 0..num_engines {
            let key = fuel_flow_property(engine);
            if let Some(rate) = warmed.get(&key) {
                snapshot.insert(key, rate);
            }
        }

        Ok(TrimOutcome::Trimmed(TrimSolution { snapshot, warm }))
    }
}
