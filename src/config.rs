//! Machine parameters and the machine setup file.
//!
//! [`MachineParams`] carries the numbers the kernel cannot know on its own
//! (most importantly the rapid traverse rate). [`MachineSetup`] bundles the
//! parameters with the work-offset and tool-offset tables so a host can load
//! one TOML document per machine:
//!
//! ```toml
//! [machine]
//! rapid_feed = 5000.0
//! max_lines = 200000
//!
//! [machine.travel_limits]
//! min = { x = 0.0, y = 0.0, z = -150.0 }
//! max = { x = 600.0, y = 400.0, z = 0.0 }
//!
//! [work_offsets.G54]
//! x = 100.0
//!
//! [[tool_offsets.length]]
//! register = 1
//! geometry = 50.0
//! ```

use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::models::{ToolOffsetTable, WorkOffsetTable};
use crate::toolpath::BoundingBox;

/// Default allowed difference between an arc's start and end radius (mm).
pub const DEFAULT_ARC_RADIUS_TOLERANCE: f64 = 0.005;

/// Default distance under which an arc's start and end are the same point (mm).
pub const DEFAULT_FULL_CIRCLE_TOLERANCE: f64 = 1e-6;

fn default_arc_radius_tolerance() -> f64 {
    DEFAULT_ARC_RADIUS_TOLERANCE
}

fn default_full_circle_tolerance() -> f64 {
    DEFAULT_FULL_CIRCLE_TOLERANCE
}

/// Machine-level constants used while building a toolpath.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MachineParams {
    /// Rapid traverse rate in mm/min. There is no default: every machine
    /// differs and a guessed value would silently skew time estimates.
    pub rapid_feed: f64,
    #[serde(default = "default_arc_radius_tolerance")]
    pub arc_radius_tolerance: f64,
    #[serde(default = "default_full_circle_tolerance")]
    pub full_circle_tolerance: f64,
    /// Hard cap on program length in lines. `None` means unlimited.
    #[serde(default)]
    pub max_lines: Option<usize>,
    /// Machine travel envelope. Commands leaving it get a `Limit` diagnostic.
    #[serde(default)]
    pub travel_limits: Option<BoundingBox>,
}

impl MachineParams {
    /// Parameters with the given rapid rate and default tolerances.
    pub fn new(rapid_feed: f64) -> Self {
        MachineParams {
            rapid_feed,
            arc_radius_tolerance: DEFAULT_ARC_RADIUS_TOLERANCE,
            full_circle_tolerance: DEFAULT_FULL_CIRCLE_TOLERANCE,
            max_lines: None,
            travel_limits: None,
        }
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines);
        self
    }

    pub fn with_travel_limits(mut self, limits: BoundingBox) -> Self {
        self.travel_limits = Some(limits);
        self
    }

    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), KernelError> {
        if !(self.rapid_feed.is_finite() && self.rapid_feed > 0.0) {
            return Err(KernelError::Config(format!(
                "machine.rapid_feed must be a positive number, got {}",
                self.rapid_feed
            )));
        }
        if !(self.arc_radius_tolerance.is_finite() && self.arc_radius_tolerance > 0.0) {
            return Err(KernelError::Config(
                "machine.arc_radius_tolerance must be positive".to_string(),
            ));
        }
        if !(self.full_circle_tolerance.is_finite() && self.full_circle_tolerance > 0.0) {
            return Err(KernelError::Config(
                "machine.full_circle_tolerance must be positive".to_string(),
            ));
        }
        if self.max_lines == Some(0) {
            return Err(KernelError::Config(
                "machine.max_lines must be at least 1 when set".to_string(),
            ));
        }
        if let Some(limits) = &self.travel_limits {
            if !limits.is_well_formed() {
                return Err(KernelError::Config(
                    "machine.travel_limits min must not exceed max on any axis".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Everything a host needs to build toolpaths for one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MachineSetup {
    pub machine: MachineParams,
    #[serde(default)]
    pub work_offsets: WorkOffsetTable,
    #[serde(default)]
    pub tool_offsets: ToolOffsetTable,
}

/// Parse a TOML string into [`MachineParams`], running validation.
pub fn parse_params(toml_str: &str) -> Result<MachineParams, KernelError> {
    let params: MachineParams = toml::from_str(toml_str)?;
    params.validate()?;
    Ok(params)
}

/// Parse a TOML machine setup document, running validation.
pub fn parse_setup(toml_str: &str) -> Result<MachineSetup, KernelError> {
    let setup: MachineSetup = toml::from_str(toml_str)?;
    setup.machine.validate()?;
    Ok(setup)
}
