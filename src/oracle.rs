//! Interface to the external flight-dynamics engine.
//!
//! The engine is one stateful simulation instance; everything here takes
//! `&mut self` and callers are expected to serialize access through a single
//! control loop.

use thiserror::Error;

use crate::dataset::PropertySnapshot;

/// Trim mode passed to the backend. Mode 0 solves the full longitudinal and
/// lateral trim equations.
pub const TRIM_MODE_FULL: i32 = 0;

// Property names in the backend's tree.
pub const PROP_ALTITUDE_AGL_FT: &str = "ic/h-agl-ft";
pub const PROP_GAMMA_DEG: &str = "ic/gamma-deg";
pub const PROP_VT_KTS: &str = "ic/vt-kts";
pub const PROP_VT_FPS: &str = "ic/vt-fps";
pub const PROP_VC_KTS: &str = "ic/vc-kts";
pub const PROP_MACH: &str = "ic/mach";
pub const PROP_WEIGHT_LBS: &str = "inertia/weight-lbs";

pub const PROP_AILERON_CMD: &str = "fcs/aileron-cmd-norm";
pub const PROP_ELEVATOR_CMD: &str = "fcs/elevator-cmd-norm";
pub const PROP_RUDDER_CMD: &str = "fcs/rudder-cmd-norm";
pub const PROP_THROTTLE_CMD: &str = "fcs/throttle-cmd-norm";
pub const PROP_ALPHA_RAD: &str = "aero/alpha-rad";
pub const PROP_BETA_RAD: &str = "aero/beta-rad";

pub const GUESS_AILERON: &str = "trim/solver/aileronGuess";
pub const GUESS_ELEVATOR: &str = "trim/solver/elevatorGuess";
pub const GUESS_RUDDER: &str = "trim/solver/rudderGuess";
pub const GUESS_THROTTLE: &str = "trim/solver/throttleGuess";
pub const GUESS_ALPHA: &str = "trim/solver/alphaGuess";
pub const GUESS_BETA: &str = "trim/solver/betaGuess";

/// Per-engine fuel-flow property. Engine 0 carries no index suffix in the
/// backend's tree.
pub fn fuel_flow_property(engine: usize) -> String {
    if engine == 0 {
        "propulsion/engine/fuel-flow-rate-pps".to_string()
    } else {
        format!("propulsion/engine[{engine}]/fuel-flow-rate-pps")
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    /// The trim solver did not converge for the current state. This is an
    /// expected outcome near the feasibility boundary, not a fault.
    #[error("trim did not converge: {0}")]
    TrimDiverged(String),
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("engine index {0} out of range")]
    BadEngineIndex(usize),
    #[error("flight-dynamics backend fault: {0}")]
    Backend(String),
}

impl OracleError {
    pub fn is_trim_divergence(&self) -> bool {
        matches!(self, Self::TrimDiverged(_))
    }
}

/// The flight-dynamics engine contract consumed by the trim search.
pub trait Oracle {
    fn set_property(&mut self, name: &str, value: f64) -> Result<(), OracleError>;

    fn get_property(&mut self, name: &str) -> Result<f64, OracleError>;

    /// Full named-state capture of the vehicle under `root`.
    fn property_catalog(&mut self, root: &str) -> Result<PropertySnapshot, OracleError>;

    fn do_trim(&mut self, mode: i32) -> Result<(), OracleError>;

    /// Advance the simulation by one step.
    fn run(&mut self) -> Result<(), OracleError>;

    fn num_engines(&mut self) -> Result<usize, OracleError>;

    fn init_engine_running(&mut self, engine: usize) -> Result<(), OracleError>;
}
