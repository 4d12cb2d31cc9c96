use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::Condition;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Root {
    pub dataset: Dataset,
    pub sweep: Sweep,
    #[serde(default)]
    pub solver: Solver,
    pub checkpoint: Checkpoint,
    pub aircraft: Aircraft,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dataset {
    /// Name printed in the PTF header (usually the aircraft type).
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Sweep {
    pub fl_min: u32,
    pub fl_max: u32,
    #[serde(default = "default_fl_step")]
    pub fl_step: u32,
}

fn default_fl_step() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Solver {
    /// Bracket width below which the gamma search stops, in degrees.
    #[serde(default = "default_tol")]
    pub tol: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Upper gamma bound for the climb search, degrees.
    #[serde(default = "default_climb_gamma_max")]
    pub climb_gamma_max: f64,
    /// Lower gamma bound for the descent search, degrees.
    #[serde(default = "default_descent_gamma_min")]
    pub descent_gamma_min: f64,
}

fn default_tol() -> f64 {
    0.1
}

fn default_max_iter() -> usize {
    64
}

fn default_climb_gamma_max() -> f64 {
    50.0
}

fn default_descent_gamma_min() -> f64 {
    -50.0
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            tol: default_tol(),
            max_iter: default_max_iter(),
            climb_gamma_max: default_climb_gamma_max(),
            descent_gamma_min: default_descent_gamma_min(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Checkpoint {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Aircraft {
    /// Flight-dynamics model name, passed to the backend at startup.
    pub model: String,
    /// Root directory holding the backend's aircraft/engine definitions.
    #[serde(default)]
    pub root_dir: String,
    /// Gross weight per condition, lbs.
    pub weight_low_lbs: f64,
    pub weight_nom_lbs: f64,
    pub weight_high_lbs: f64,
}

impl Aircraft {
    pub fn weight_lbs(&self, condition: Condition) -> f64 {
        match condition {
            Condition::Low => self.weight_low_lbs,
            Condition::Nominal => self.weight_nom_lbs,
            Condition::High => self.weight_high_lbs,
        }
    }
}

impl Root {
    pub fn validate(&self) -> Result<()> {
        if self.dataset.name.trim().is_empty() {
            bail!("dataset.name must not be empty");
        }
        if self.sweep.fl_min > self.sweep.fl_max {
            bail!("sweep.fl_min must be <= sweep.fl_max");
        }
        if self.sweep.fl_step == 0 {
            bail!("sweep.fl_step must be >= 1");
        }
        if self.sweep.fl_max > 1_000 {
            bail!("sweep.fl_max must be <= 1000 (100,000 ft)");
        }
        if self.solver.tol <= 0.0 {
            bail!("solver.tol must be positive");
        }
        if self.solver.max_iter == 0 || self.solver.max_iter > 10_000 {
            bail!("solver.max_iter must be in [1, 10000]");
        }
        if self.solver.climb_gamma_max <= 0.0 || self.solver.climb_gamma_max > 90.0 {
            bail!("solver.climb_gamma_max must be in (0, 90]");
        }
        if self.solver.descent_gamma_min >= 0.0 || self.solver.descent_gamma_min < -90.0 {
            bail!("solver.descent_gamma_min must be in [-90, 0)");
        }
        if self.checkpoint.path.trim().is_empty() {
            bail!("checkpoint.path must not be empty");
        }
        if self.aircraft.weight_low_lbs <= 0.0
            || self.aircraft.weight_nom_lbs <= 0.0
            || self.aircraft.weight_high_lbs <= 0.0
        {
            bail!("aircraft weights must be positive");
        }
        if self.aircraft.weight_low_lbs > self.aircraft.weight_nom_lbs
            || self.aircraft.weight_nom_lbs > self.aircraft.weight_high_lbs
        {
            bail!("aircraft weights must be ordered low <= nom <= high");
        }
        Ok(())
    }

    /// Flight levels of the configured sweep, ascending.
    pub fn flight_levels(&self) -> Vec<u32> {
        (self.sweep.fl_min..=self.sweep.fl_max)
            .step_by(self.sweep.fl_step as usize)
            .collect()
    }
}
