//! Program space → machine space.
//!
//! Applied in a fixed order:
//! 1. the active work-offset translation;
//! 2. tool length compensation along the tool axis (the active plane's
//!    normal), when `G43` is active with a non-zero H register. Approach
//!    moves are shifted by `-(geometry + wear)`, retract moves by
//!    `+(geometry + wear)`. A move with no tool-axis travel reuses the sign
//!    of the move before it.
//!
//! Cutter radius compensation (`G41`/`G42`) is **not** applied to the path.
//! A correct offset path needs look-ahead across several commands, which this
//! kernel does not do. The active side and radius are reported through
//! [`CoordinateTransform::cutter_compensation`] and stored on every command so
//! callers can render or warn about it.

use serde::{Deserialize, Serialize};

use crate::interpreter::{CutterComp, ModalState};
use crate::models::{Axis, Position, ToolOffsetTable, WorkOffsetTable};

/// Tool-axis travel at or below this is treated as no travel.
const AXIS_EPSILON: f64 = 1e-9;

/// Direction of a move along the tool axis, selecting the sign of tool
/// length compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAxisMotion {
    /// Toward the part, or level.
    Approach,
    /// Away from the part.
    Retract,
}

impl ToolAxisMotion {
    /// Classifies the program-space move `start → end` along `tool_axis`.
    ///
    /// Returns `None` for a move with no tool-axis travel; such a move keeps
    /// whatever compensation sign the previous move used, so it stays level
    /// in machine space too.
    pub fn between(start: &Position, end: &Position, tool_axis: Axis) -> Option<Self> {
        let travel = end[tool_axis] - start[tool_axis];
        if travel > AXIS_EPSILON {
            Some(ToolAxisMotion::Retract)
        } else if travel < -AXIS_EPSILON {
            Some(ToolAxisMotion::Approach)
        } else {
            None
        }
    }
}

/// Active cutter radius compensation, reported but never applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutterCompensation {
    pub side: CutterComp,
    pub d_register: u32,
    /// Radius from the D register, `(geometry + wear) / 2`.
    pub radius: f64,
}

/// Borrowed snapshot of the offset tables used for one build.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateTransform<'a> {
    work_offsets: &'a WorkOffsetTable,
    tool_offsets: &'a ToolOffsetTable,
}

impl<'a> CoordinateTransform<'a> {
    pub fn new(work_offsets: &'a WorkOffsetTable, tool_offsets: &'a ToolOffsetTable) -> Self {
        CoordinateTransform {
            work_offsets,
            tool_offsets,
        }
    }

    pub fn work_offsets(&self) -> &'a WorkOffsetTable {
        self.work_offsets
    }

    pub fn tool_offsets(&self) -> &'a ToolOffsetTable {
        self.tool_offsets
    }

    /// Resolves a program-space point into machine space.
    pub fn to_machine(
        &self,
        point: &Position,
        modal: &ModalState,
        motion: ToolAxisMotion,
    ) -> Position {
        let mut machine = *point + self.work_offsets.translation(&modal.work_offset);

        if modal.length_comp_active && modal.h_register > 0 {
            let length = self.tool_offsets.length(modal.h_register);
            let axis = modal.plane.normal();
            match motion {
                ToolAxisMotion::Approach => machine[axis] -= length,
                ToolAxisMotion::Retract => machine[axis] += length,
            }
        }

        machine
    }

    /// Translates an in-plane arc center. Centers lie in the plane, so only
    /// the work offset applies; length compensation acts on the normal.
    pub fn center_to_machine(&self, center: [f64; 2], modal: &ModalState) -> [f64; 2] {
        let translation = self.work_offsets.translation(&modal.work_offset);
        let (first, second) = modal.plane.axes();
        [center[0] + translation[first], center[1] + translation[second]]
    }

    /// The cutter compensation in effect, if `G41`/`G42` is active.
    pub fn cutter_compensation(&self, modal: &ModalState) -> Option<CutterCompensation> {
        match modal.cutter_comp {
            CutterComp::Off => None,
            side => Some(CutterCompensation {
                side,
                d_register: modal.d_register,
                radius: self.tool_offsets.radius(modal.d_register),
            }),
        }
    }
}
