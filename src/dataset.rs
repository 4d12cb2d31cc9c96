//! Performance dataset: accumulated trim snapshots per flight level, the
//! checkpointed sweep that fills it, and checkpoint persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::oracle::{Oracle, PROP_ALTITUDE_AGL_FT, PROP_GAMMA_DEG, PROP_WEIGHT_LBS};
use crate::problem::{TrimOutcome, TrimProblem, TrimSolution, WarmStart};
use crate::solver::{BinarySearch, Direction, SolverError};

pub type FlightLevel = u32;

/// Aircraft weight condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Condition {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "nom")]
    Nominal,
    #[serde(rename = "high")]
    High,
}

impl Condition {
    pub const ALL: [Condition; 3] = [Condition::Low, Condition::Nominal, Condition::High];

    pub fn label(self) -> &'static str {
        match self {
            Condition::Low => "low",
            Condition::Nominal => "nom",
            Condition::High => "high",
        }
    }
}

/// A full captured state of the oracle at one instant. Immutable once stored
/// in the dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PropertySnapshot(BTreeMap<String, f64>);

impl PropertySnapshot {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for PropertySnapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub type ConditionSnapshots = BTreeMap<Condition, PropertySnapshot>;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PerformanceDataset {
    /// Intended sweep order. Only successfully processed levels have entries
    /// in the phase maps below.
    pub flight_levels: Vec<FlightLevel>,
    pub cruise: BTreeMap<FlightLevel, ConditionSnapshots>,
    pub climb: BTreeMap<FlightLevel, ConditionSnapshots>,
    pub descent: BTreeMap<FlightLevel, PropertySnapshot>,
    pub num_engines: usize,
}

impl PerformanceDataset {
    pub fn new(flight_levels: Vec<FlightLevel>) -> Self {
        Self {
            flight_levels,
            num_engines: 1,
            ..Default::default()
        }
    }

    /// True when the level holds every snapshot a report row needs.
    pub fn level_complete(&self, fl: FlightLevel) -> bool {
        self.cruise.get(&fl).map_or(false, |c| c.len() == 3)
            && self.climb.get(&fl).map_or(false, |c| c.len() == 3)
            && self.descent.contains_key(&fl)
    }

    /// Atomic full-snapshot overwrite: serialize next to the target and
    /// rename into place, so an interrupted write never leaves a truncated
    /// checkpoint behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).context("serializing checkpoint")?;
        let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
        fs::write(&tmp, &json)
            .with_context(|| format!("writing checkpoint {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("replacing checkpoint {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read(path)
            .with_context(|| format!("reading checkpoint {}", path.display()))?;
        serde_json::from_slice(&json)
            .with_context(|| format!("parsing checkpoint {}", path.display()))
    }
}

/// Clamp a flight level to a trimmable altitude. Trimming at or below ground
/// level is non-physical.
pub(crate) fn altitude_ft(fl: FlightLevel) -> f64 {
    let alt = f64::from(100 * fl);
    if alt <= 10.0 {
        10.0
    } else {
        alt
    }
}

/// Sweep the configured flight levels against the oracle, checkpointing the
/// dataset after every level.
///
/// Failure isolation is per phase: a climb search that finds no feasible
/// gamma does not discard the cruise snapshots already captured for the same
/// level. Only checkpoint I/O errors abort the sweep.
pub fn build<O: Oracle>(
    fdm: &mut O,
    cfg: &config::Root,
    mut data: PerformanceDataset,
) -> Result<PerformanceDataset> {
    data.num_engines = fdm
        .num_engines()
        .map_err(|e| anyhow::anyhow!("querying engine count: {e}"))?;

    let checkpoint = Path::new(&cfg.checkpoint.path);
    let gamma = TrimProblem::new(PROP_GAMMA_DEG);
    let climb_search = BinarySearch {
        direction: Direction::Maximize,
        guess: 0.0,
        lo: 0.0,
        hi: cfg.solver.climb_gamma_max,
        tol: cfg.solver.tol,
        max_iter: cfg.solver.max_iter,
    };
    let descent_search = BinarySearch {
        direction: Direction::Minimize,
        guess: 0.0,
        lo: cfg.solver.descent_gamma_min,
        hi: 0.0,
        tol: cfg.solver.tol,
        max_iter: cfg.solver.max_iter,
    };

    // Warm start chains across conditions and levels; adjacent trims start
    // near the previous solution instead of a cold default.
    let mut warm: Option<WarmStart> = None;

    let levels = data.flight_levels.clone();
    for &fl in &levels {
        if data.level_complete(fl) {
            eprintln!("[ptfgen] FL{fl}: already in checkpoint, skipping");
            continue;
        }

        eprintln!("[ptfgen] FL{fl}: altitude {:.0} ft", altitude_ft(fl));
        if let Err(e) = fdm.set_property(PROP_ALTITUDE_AGL_FT, altitude_ft(fl)) {
            eprintln!("[ptfgen] FL{fl}: skipped, cannot set altitude: {e}");
            continue;
        }

        for condition in Condition::ALL {
            if let Err(e) = fdm.set_property(PROP_WEIGHT_LBS, cfg.aircraft.weight_lbs(condition)) {
                eprintln!("[ptfgen] FL{fl} {}: skipped, cannot set weight: {e}", condition.label());
                continue;
            }

            // Cruise: level trim at gamma 0.
            match cruise_trim(fdm, &gamma, warm.as_ref()) {
                Ok(Some(solution)) => {
                    warm = Some(solution.warm);
                    data.cruise.entry(fl).or_default().insert(condition, solution.snapshot);
                }
                Ok(None) => {
                    eprintln!("[ptfgen] FL{fl} {}: cruise trim diverged", condition.label());
                }
                Err(e) => {
                    eprintln!("[ptfgen] FL{fl} {}: cruise stage failed: {e}", condition.label());
                }
            }

            // Climb: steepest sustainable gamma.
            match climb_search.solve(&gamma, fdm, warm) {
                Ok(found) => {
                    eprintln!(
                        "[ptfgen] FL{fl} {}: max climb gamma {:.2} deg ({} evals)",
                        condition.label(),
                        found.value,
                        found.iterations
                    );
                    warm = Some(found.solution.warm);
                    data.climb.entry(fl).or_default().insert(condition, found.solution.snapshot);
                }
                Err(SolverError::NoFeasibleSolution { .. }) => {
                    eprintln!("[ptfgen] FL{fl} {}: no feasible climb gamma", condition.label());
                }
                Err(e) => {
                    eprintln!("[ptfgen] FL{fl} {}: climb stage failed: {e}", condition.label());
                }
            }
        }

        // Descent: nominal weight only.
        match descent_stage(fdm, cfg, &gamma, &descent_search, warm) {
            Ok(Some((value, solution))) => {
                eprintln!("[ptfgen] FL{fl}: max descent gamma {value:.2} deg");
                warm = Some(solution.warm);
                data.descent.insert(fl, solution.snapshot);
            }
            Ok(None) => {
                eprintln!("[ptfgen] FL{fl}: no feasible descent gamma");
            }
            Err(e) => {
                eprintln!("[ptfgen] FL{fl}: descent stage failed: {e}");
            }
        }

        data.save(checkpoint)
            .with_context(|| format!("checkpointing after FL{fl}"))?;
    }

    data.save(checkpoint).context("final checkpoint")?;
    Ok(data)
}

fn cruise_trim<O: Oracle>(
    fdm: &mut O,
    gamma: &TrimProblem,
    warm: Option<&WarmStart>,
) -> Result<Option<TrimSolution>, SolverError> {
    gamma.configure(fdm, 0.0)?;
    match gamma.solve(fdm, warm)? {
        TrimOutcome::Trimmed(solution) => Ok(Some(solution)),
        TrimOutcome::Diverged => Ok(None),
    }
}

fn descent_stage<O: Oracle>(
    fdm: &mut O,
    cfg: &config::Root,
    gamma: &TrimProblem,
    search: &BinarySearch,
    warm: Option<WarmStart>,
) -> Result<Option<(f64, TrimSolution)>, SolverError> {
    fdm.set_property(PROP_WEIGHT_LBS, cfg.aircraft.weight_lbs(Condition::Nominal))?;
    match search.solve(gamma, fdm, warm) {
        Ok(found) => Ok(Some((found.value, found.solution))),
        Err(SolverError::NoFeasibleSolution { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}
