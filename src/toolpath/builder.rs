//! Program text → [`Toolpath`].
//!
//! [`build`] is a single synchronous fold over the program's lines. Each line
//! is lexed, applied to the modal state, resolved into program-space segments,
//! transformed into machine space and appended as one or more [`Command`]s
//! while the running aggregates are updated.
//!
//! The fold never stops on bad input. Malformed words, unsupported codes and
//! degenerate geometry become diagnostics stored on the toolpath; only
//! structural misuse (an empty program, a line limit overrun, invalid machine
//! parameters) is returned as a [`KernelError`].

use super::bounds::BoundingBox;
use super::types::{Command, Toolpath, ToolpathStats};
use crate::config::MachineParams;
use crate::error::KernelError;
use crate::geometry::{resolve, CoordinateTransform, ResolvedMove, ToolAxisMotion};
use crate::interpreter::{lex_line, CutterComp, DiagnosticKind, Diagnostics, ModalState};
use crate::models::{Position, ToolOffsetTable, WorkOffsetTable};

/// Moves shorter than this (mm) count as having no linear travel.
const LENGTH_EPSILON: f64 = 1e-9;

/// Builds a toolpath from program text and an immutable snapshot of the
/// offset tables.
///
/// Lines are numbered from 1. Returns [`KernelError::EmptyProgram`] when no
/// line produces motion and [`KernelError::LineLimitExceeded`] when the
/// program is longer than `params.max_lines`.
pub fn build(
    text: &str,
    work_offsets: &WorkOffsetTable,
    tool_offsets: &ToolOffsetTable,
    params: &MachineParams,
) -> Result<Toolpath, KernelError> {
    let mut builder = ToolpathBuilder::new(work_offsets, tool_offsets, params)?;
    for line in text.lines() {
        builder.push_line(line)?;
    }
    builder.finish()
}

/// Incremental form of [`build`]: push lines in order, then [`finish`].
///
/// Lines are numbered by the builder as they are pushed, so line numbers on
/// commands and diagnostics always increase.
///
/// [`finish`]: ToolpathBuilder::finish
#[derive(Debug)]
pub struct ToolpathBuilder<'a> {
    transform: CoordinateTransform<'a>,
    params: &'a MachineParams,
    state: ModalState,
    commands: Vec<Command>,
    diags: Diagnostics,
    /// Number of the last pushed line; 0 before the first.
    line_number: usize,
    /// Machine-space end of the last command.
    cursor: Position,
    /// Compensation sign of the last command, reused by level moves.
    last_motion: ToolAxisMotion,
    /// Seconds elapsed, including dwells.
    clock: f64,
    cutting_distance: f64,
    rapid_distance: f64,
    rotary_travel: f64,
    dwell_time: f64,
    bounds: Option<BoundingBox>,
}

impl<'a> ToolpathBuilder<'a> {
    pub fn new(
        work_offsets: &'a WorkOffsetTable,
        tool_offsets: &'a ToolOffsetTable,
        params: &'a MachineParams,
    ) -> Result<Self, KernelError> {
        params.validate()?;
        let transform = CoordinateTransform::new(work_offsets, tool_offsets);
        let state = ModalState::new();
        let cursor = transform.to_machine(&state.position, &state, ToolAxisMotion::Approach);
        Ok(ToolpathBuilder {
            transform,
            params,
            state,
            commands: Vec::new(),
            diags: Diagnostics::new(),
            line_number: 0,
            cursor,
            last_motion: ToolAxisMotion::Approach,
            clock: 0.0,
            cutting_distance: 0.0,
            rapid_distance: 0.0,
            rotary_travel: 0.0,
            dwell_time: 0.0,
            bounds: None,
        })
    }

    /// Modal state after the last pushed line.
    pub fn state(&self) -> &ModalState {
        &self.state
    }

    /// Interprets the next source line.
    ///
    /// Fails with [`KernelError::LineLimitExceeded`] once more lines are
    /// pushed than `params.max_lines` allows.
    pub fn push_line(&mut self, text: &str) -> Result<(), KernelError> {
        let line_number = self.line_number + 1;
        if let Some(max_lines) = self.params.max_lines {
            if line_number > max_lines {
                tracing::warn!(line_number, max_lines, "program exceeds line limit");
                return Err(KernelError::LineLimitExceeded(format!(
                    "line {line_number} is past the limit of {max_lines}"
                )));
            }
        }
        self.line_number = line_number;

        let lexed = lex_line(text);
        for token in &lexed.rejected {
            self.diags.push(
                line_number,
                DiagnosticKind::Lexical,
                format!("unparsable token '{token}' dropped"),
            );
        }
        if lexed.words.is_empty() {
            return Ok(());
        }

        let (next, desc) = self.state.apply_line(line_number, &lexed.words, &mut self.diags);
        self.check_tables(line_number, &next);

        if let Some(seconds) = desc.dwell {
            self.clock += seconds;
            self.dwell_time += seconds;
        }

        let moves = resolve(&desc, &next, self.params, &mut self.diags);
        let source_text = text.trim();
        for mv in &moves {
            self.push_command(line_number, source_text, mv, &next);
        }

        self.state = next;
        Ok(())
    }

    /// Records lookups the new state makes into tables that lack the entry.
    fn check_tables(&mut self, line: usize, next: &ModalState) {
        let prev = &self.state;

        if next.work_offset != prev.work_offset
            && !self.transform.work_offsets().contains(&next.work_offset)
        {
            self.diags.push(
                line,
                DiagnosticKind::Semantic,
                format!(
                    "work offset {} is not in the offset table; using zero translation",
                    next.work_offset
                ),
            );
        }

        let length_comp_changed = next.length_comp_active
            && (!prev.length_comp_active || next.h_register != prev.h_register);
        if length_comp_changed {
            if next.h_register == 0 {
                self.diags.push(
                    line,
                    DiagnosticKind::Semantic,
                    "G43 with H0; no length compensation applied",
                );
            } else if self.transform.tool_offsets().length_entry(next.h_register).is_none() {
                self.diags.push(
                    line,
                    DiagnosticKind::Semantic,
                    format!(
                        "H{} is not in the tool offset table; length compensation is zero",
                        next.h_register
                    ),
                );
            }
        }

        let cutter_comp_changed = next.cutter_comp != CutterComp::Off
            && (next.cutter_comp != prev.cutter_comp || next.d_register != prev.d_register);
        if cutter_comp_changed {
            if let Some(comp) = self.transform.cutter_compensation(next) {
                let code = if comp.side == CutterComp::Left { 41 } else { 42 };
                self.diags.push(
                    line,
                    DiagnosticKind::Semantic,
                    format!(
                        "G{code} D{} (radius {:.4}) is reported only; the path is not offset",
                        comp.d_register, comp.radius
                    ),
                );
            }
            if next.d_register > 0
                && self.transform.tool_offsets().diameter_entry(next.d_register).is_none()
            {
                self.diags.push(
                    line,
                    DiagnosticKind::Semantic,
                    format!("D{} is not in the tool offset table", next.d_register),
                );
            }
        }
    }

    fn push_command(
        &mut self,
        line_number: usize,
        source_text: &str,
        mv: &ResolvedMove,
        modal: &ModalState,
    ) {
        let tool_axis = modal.plane.normal();
        let direction =
            ToolAxisMotion::between(&mv.start, &mv.end, tool_axis).unwrap_or(self.last_motion);
        self.last_motion = direction;
        let start = self.cursor;
        let end = self.transform.to_machine(&mv.end, modal, direction);
        let arc = mv.arc.map(|arc| {
            let center = self.transform.center_to_machine(arc.center, modal);
            arc.rebased(center, &start, &end)
        });

        let length = match &arc {
            Some(arc) => arc.length(),
            None => start.linear_distance(&end),
        };
        let rotary_travel = start.rotary_distance(&end);

        let feed = if mv.is_rapid {
            self.params.rapid_feed
        } else {
            modal.feed_rate
        };
        let distance = if length > LENGTH_EPSILON {
            length
        } else {
            rotary_travel
        };
        let duration = if distance <= LENGTH_EPSILON {
            0.0
        } else if feed > 0.0 {
            distance / feed * 60.0
        } else {
            self.diags.push(
                line_number,
                DiagnosticKind::Semantic,
                "feed move with zero feed rate; no time estimated",
            );
            0.0
        };

        let mut bounds = BoundingBox::from_point(&start);
        bounds.include(&end);
        if let Some(arc) = &arc {
            for (axis, min, max) in arc.circle_envelope() {
                bounds.include_axis(axis, min);
                bounds.include_axis(axis, max);
            }
        }

        if let Some(limits) = &self.params.travel_limits {
            if !bounds.fits_within(limits) {
                self.diags.push(
                    line_number,
                    DiagnosticKind::Limit,
                    format!(
                        "move to X{:.3} Y{:.3} Z{:.3} leaves the machine travel limits",
                        end.x, end.y, end.z
                    ),
                );
            }
        }

        if mv.is_rapid {
            self.rapid_distance += length;
        } else {
            self.cutting_distance += length;
        }
        self.rotary_travel += rotary_travel;
        self.bounds = Some(match self.bounds {
            Some(mut total) => {
                total.union(&bounds);
                total
            }
            None => bounds,
        });

        let command = Command {
            index: self.commands.len(),
            line_number,
            source_text: source_text.to_string(),
            motion_type: mv.motion,
            start,
            end,
            arc,
            feed_rate: modal.feed_rate,
            spindle_speed: modal.spindle_speed,
            is_rapid: mv.is_rapid,
            drill_phase: mv.drill_phase,
            cutter_comp: self.transform.cutter_compensation(modal),
            length,
            rotary_travel,
            start_time: self.clock,
            duration,
            bounds,
            modal: modal.clone(),
        };
        self.clock += duration;
        self.cursor = end;
        self.commands.push(command);
    }

    /// Completes the build. Fails with [`KernelError::EmptyProgram`] when no
    /// line produced motion.
    pub fn finish(self) -> Result<Toolpath, KernelError> {
        let Some(bounding_box) = self.bounds else {
            tracing::warn!(
                diagnostics = self.diags.len(),
                "program produced no motion commands"
            );
            return Err(KernelError::EmptyProgram);
        };

        let stats = ToolpathStats {
            total_distance: self.cutting_distance + self.rapid_distance,
            cutting_distance: self.cutting_distance,
            rapid_distance: self.rapid_distance,
            rotary_travel: self.rotary_travel,
            dwell_time: self.dwell_time,
            estimated_time: self.clock,
            bounding_box,
            command_count: self.commands.len(),
        };

        tracing::info!(
            commands = stats.command_count,
            diagnostics = self.diags.len(),
            total_distance = stats.total_distance,
            estimated_time = stats.estimated_time,
            "toolpath built"
        );

        Ok(Toolpath::new(self.commands, stats, self.diags.into_vec()))
    }
}
