//! Toolpath data types produced by the builder.
//!
//! A [`Toolpath`] is the immutable, ordered sequence of resolved
//! [`Command`]s for one program, plus aggregates derived while it was built.
//! Any change to the program text or the offset tables means building a new
//! toolpath; nothing here is mutable after construction.

use serde::Serialize;

use super::bounds::BoundingBox;
use crate::error::KernelError;
use crate::geometry::{ArcGeometry, CutterCompensation, DrillPhase};
use crate::interpreter::{Diagnostic, ModalState, MotionMode};
use crate::models::Position;

/// One resolved machine motion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Position of this command in the toolpath.
    pub index: usize,
    /// 1-based source line. Drill cycles yield several commands per line.
    pub line_number: usize,
    /// The source line, trimmed.
    pub source_text: String,
    pub motion_type: MotionMode,
    /// Machine-space start; always the previous command's `end`.
    pub start: Position,
    /// Machine-space end.
    pub end: Position,
    /// Machine-space arc geometry for circular and helical moves.
    pub arc: Option<ArcGeometry>,
    /// Programmed feed rate in mm/min at this command.
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub is_rapid: bool,
    pub drill_phase: Option<DrillPhase>,
    /// Cutter compensation in effect. Reported only, never applied.
    pub cutter_comp: Option<CutterCompensation>,
    /// Linear path length in mm (arc length for arcs).
    pub length: f64,
    /// Rotary travel in degrees, kept apart from `length`.
    pub rotary_travel: f64,
    /// Seconds from program start to the beginning of this command.
    pub start_time: f64,
    /// Estimated duration in seconds.
    pub duration: f64,
    /// Extents of this command, including the circle envelope of arcs.
    pub bounds: BoundingBox,
    /// Modal state after the source line was applied.
    pub modal: ModalState,
}

impl Command {
    /// `center − start` on the arc plane axes, for arc commands.
    pub fn arc_center_offset(&self) -> Option<Position> {
        self.arc.map(|arc| arc.center_offset(&self.start))
    }

    pub fn arc_radius(&self) -> Option<f64> {
        self.arc.map(|arc| arc.radius)
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Machine position at parameter `t ∈ [0, 1]` along this command.
    ///
    /// `t = 0` and `t = 1` return the exact endpoints. Arcs follow their
    /// angle; everything else is linear on all five axes.
    pub fn position_at(&self, t: f64) -> Position {
        if t <= 0.0 {
            return self.start;
        }
        if t >= 1.0 {
            return self.end;
        }
        match &self.arc {
            Some(arc) => arc.position_at(&self.start, &self.end, t),
            None => self.start.lerp(&self.end, t),
        }
    }
}

/// Summary of a built toolpath.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolpathStats {
    /// `cutting_distance + rapid_distance`, mm.
    pub total_distance: f64,
    pub cutting_distance: f64,
    pub rapid_distance: f64,
    /// Rotary axis travel in degrees; not part of any linear distance.
    pub rotary_travel: f64,
    /// Seconds spent in `G4` dwells.
    pub dwell_time: f64,
    /// Seconds, motion plus dwell.
    pub estimated_time: f64,
    pub bounding_box: BoundingBox,
    pub command_count: usize,
}

/// An immutable, fully resolved program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toolpath {
    commands: Vec<Command>,
    stats: ToolpathStats,
    diagnostics: Vec<Diagnostic>,
}

impl Toolpath {
    /// Assembles a toolpath. Callers go through [`crate::build`]; the
    /// builder guarantees `commands` is non-empty and consistent with `stats`.
    pub(crate) fn new(
        commands: Vec<Command>,
        stats: ToolpathStats,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Toolpath {
            commands,
            stats,
            diagnostics,
        }
    }

    pub fn stats(&self) -> ToolpathStats {
        self.stats
    }

    /// The command at `index`, or [`KernelError::CommandIndexOutOfRange`].
    pub fn command_at(&self, index: usize) -> Result<&Command, KernelError> {
        self.commands.get(index).ok_or_else(|| {
            KernelError::CommandIndexOutOfRange(format!(
                "command index {index} out of range; toolpath has {} commands",
                self.commands.len()
            ))
        })
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Always `false` for a toolpath returned by [`crate::build`].
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Index of the first command produced by source line `line_number`.
    pub fn first_command_for_line(&self, line_number: usize) -> Option<usize> {
        let idx = self
            .commands
            .partition_point(|c| c.line_number < line_number);
        self.commands
            .get(idx)
            .filter(|c| c.line_number == line_number)
            .map(|c| c.index)
    }

    /// Indices of rapid commands that travel below `level` on Z, e.g. to find
    /// rapids that would plunge into stock whose top is at `level`.
    pub fn rapid_moves_below(&self, level: f64) -> Vec<usize> {
        self.commands
            .iter()
            .filter(|c| c.is_rapid && c.bounds.min.z < level)
            .map(|c| c.index)
            .collect()
    }
}
