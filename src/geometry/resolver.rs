//! Turns a [`MotionDescriptor`] into concrete program-space segments.

use serde::{Deserialize, Serialize};

use super::arcs::{center_from_radius, plane_coords, ArcDirection, ArcGeometry, RadiusCenter};
use crate::config::MachineParams;
use crate::interpreter::{DiagnosticKind, Diagnostics, ModalState, MotionDescriptor, MotionMode};
use crate::models::Position;

/// Which leg of the synthetic drill-cycle expansion a segment is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillPhase {
    /// Rapid to the hole position at the R plane.
    Position,
    /// Feed from the R plane to depth.
    Plunge,
    /// Rapid back to the retract level.
    Retract,
}

/// One program-space segment, ready for the coordinate transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMove {
    /// Motion type recorded on the resulting command. Arcs that degrade to a
    /// straight move are recorded as [`MotionMode::Linear`].
    pub motion: MotionMode,
    pub is_rapid: bool,
    pub start: Position,
    pub end: Position,
    pub arc: Option<ArcGeometry>,
    pub drill_phase: Option<DrillPhase>,
}

impl ResolvedMove {
    fn straight(motion: MotionMode, is_rapid: bool, start: Position, end: Position) -> Self {
        ResolvedMove {
            motion,
            is_rapid,
            start,
            end,
            arc: None,
            drill_phase: None,
        }
    }
}

/// Resolves one motion line. `modal` is the state after the line.
///
/// Linear and rapid lines yield one segment, arcs one segment (possibly a
/// straight fallback for degenerate input), drill cycles three.
pub fn resolve(
    desc: &MotionDescriptor,
    modal: &ModalState,
    params: &MachineParams,
    diags: &mut Diagnostics,
) -> Vec<ResolvedMove> {
    match desc.motion {
        MotionMode::None => Vec::new(),
        MotionMode::Rapid => vec![ResolvedMove::straight(
            MotionMode::Rapid,
            true,
            desc.start,
            desc.end,
        )],
        MotionMode::Linear => vec![ResolvedMove::straight(
            MotionMode::Linear,
            false,
            desc.start,
            desc.end,
        )],
        MotionMode::ArcCw | MotionMode::ArcCcw => vec![resolve_arc(desc, modal, params, diags)],
        MotionMode::DrillCycle => resolve_drill(desc, modal, diags),
    }
}

fn resolve_arc(
    desc: &MotionDescriptor,
    modal: &ModalState,
    params: &MachineParams,
    diags: &mut Diagnostics,
) -> ResolvedMove {
    let direction = if desc.motion == MotionMode::ArcCw {
        ArcDirection::Clockwise
    } else {
        ArcDirection::CounterClockwise
    };
    let plane = modal.plane;
    let tolerance = params.full_circle_tolerance;
    let start = plane_coords(&desc.start, plane);
    let end = plane_coords(&desc.end, plane);
    let fallback = |diags: &mut Diagnostics, reason: &str| {
        diags.push(
            desc.line,
            DiagnosticKind::Geometric,
            format!("{reason}; resolved as a straight feed move"),
        );
        ResolvedMove::straight(MotionMode::Linear, false, desc.start, desc.end)
    };

    let center = if desc.arc.has_offsets(plane) {
        if desc.arc.r.is_some() {
            diags.push(
                desc.line,
                DiagnosticKind::Semantic,
                "arc has both center offsets and R; center offsets win",
            );
        }
        let (first, second) = plane.offset_letters();
        let offset = [
            desc.arc.offset(first).unwrap_or(0.0),
            desc.arc.offset(second).unwrap_or(0.0),
        ];
        if offset[0].hypot(offset[1]) < tolerance {
            return fallback(diags, "arc has zero radius");
        }
        [start[0] + offset[0], start[1] + offset[1]]
    } else if let Some(r) = desc.arc.r {
        match center_from_radius(start, end, r, direction, tolerance) {
            RadiusCenter::Center(center) => center,
            RadiusCenter::Clamped(center) => {
                diags.push(
                    desc.line,
                    DiagnosticKind::Geometric,
                    format!("R{} is shorter than half the chord; arc clamped to a semicircle", r.abs()),
                );
                center
            }
            RadiusCenter::Undetermined => {
                return fallback(diags, "R-form arc with coincident start and end has no unique center");
            }
        }
    } else {
        let (first, second) = plane.offset_letters();
        return fallback(
            diags,
            &format!("arc has neither {first}/{second} offsets nor R"),
        );
    };

    let arc = ArcGeometry::through(plane, center, &desc.start, &desc.end, direction, tolerance);

    if arc.full_circle {
        diags.push(
            desc.line,
            DiagnosticKind::Geometric,
            "arc start and end coincide; resolved as a full 360° circle",
        );
    } else if (arc.radius - arc.end_radius).abs() > params.arc_radius_tolerance {
        diags.push(
            desc.line,
            DiagnosticKind::Geometric,
            format!(
                "arc start radius {:.4} and end radius {:.4} differ",
                arc.radius, arc.end_radius
            ),
        );
    }

    ResolvedMove {
        motion: desc.motion,
        is_rapid: false,
        start: desc.start,
        end: desc.end,
        arc: Some(arc),
        drill_phase: None,
    }
}

/// Expands one drill hole into rapid-to-R, feed-to-depth, rapid-retract.
fn resolve_drill(
    desc: &MotionDescriptor,
    modal: &ModalState,
    diags: &mut Diagnostics,
) -> Vec<ResolvedMove> {
    let Some(drill) = desc.drill else {
        return Vec::new();
    };
    if drill.depth > drill.r_plane {
        diags.push(
            desc.line,
            DiagnosticKind::Semantic,
            "drill depth is above the R plane",
        );
    }

    let tool_axis = modal.plane.normal();
    let mut at_r = desc.end;
    at_r[tool_axis] = drill.r_plane;
    let mut bottom = desc.end;
    bottom[tool_axis] = drill.depth;

    let legs = [
        (true, desc.start, at_r, DrillPhase::Position),
        (false, at_r, bottom, DrillPhase::Plunge),
        (true, bottom, desc.end, DrillPhase::Retract),
    ];
    legs.into_iter()
        .map(|(is_rapid, start, end, phase)| ResolvedMove {
            drill_phase: Some(phase),
            ..ResolvedMove::straight(MotionMode::DrillCycle, is_rapid, start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::interpreter::lex_line;

    fn params() -> MachineParams {
        MachineParams::new(5000.0)
    }

    /// Runs `lines` through the modal machine and resolves the last one.
    fn resolve_last(lines: &[&str]) -> (Vec<ResolvedMove>, Diagnostics) {
        let mut state = ModalState::new();
        let mut diags = Diagnostics::new();
        let mut last = None;
        for (i, text) in lines.iter().enumerate() {
            let (next, desc) = state.apply_line(i + 1, &lex_line(text).words, &mut diags);
            state = next;
            last = Some(desc);
        }
        let desc = last.expect("at least one line");
        let mut resolve_diags = Diagnostics::new();
        let moves = resolve(&desc, &state, &params(), &mut resolve_diags);
        (moves, resolve_diags)
    }

    #[test]
    fn linear_and_rapid_resolve_to_one_segment() {
        let (moves, _) = resolve_last(&["G00 X5"]);
        assert_eq!(moves.len(), 1);
        assert!(moves[0].is_rapid);
        assert_eq!(moves[0].end, Position::new(5.0, 0.0, 0.0));

        let (moves, _) = resolve_last(&["G01 X5 F10"]);
        assert!(!moves[0].is_rapid);
        assert!(moves[0].arc.is_none());
    }

    #[test]
    fn offset_arc_resolves_center_and_radius() {
        let (moves, diags) = resolve_last(&["G01 X10 F100", "G02 X10 Y10 I0 J5"]);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        let arc = moves[0].arc.expect("arc geometry");
        assert_eq!(arc.center, [10.0, 5.0]);
        assert_eq!(arc.radius, 5.0);
        assert!((arc.sweep() - PI).abs() < 1e-9);
        assert_eq!(arc.direction, ArcDirection::Clockwise);
    }

    #[test]
    fn offset_arc_with_coincident_endpoints_is_full_circle() {
        let (moves, diags) = resolve_last(&["G02 I5 J0 F100"]);
        let arc = moves[0].arc.expect("arc geometry");
        assert!(arc.full_circle);
        assert!((arc.sweep() - 2.0 * PI).abs() < 1e-12);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().map(|d| d.kind), Some(DiagnosticKind::Geometric));
    }

    #[test]
    fn offsets_win_over_radius_with_diagnostic() {
        let (moves, diags) = resolve_last(&["G01 X10 F100", "G03 X0 Y10 I-10 J0 R3"]);
        let arc = moves[0].arc.expect("arc geometry");
        assert_eq!(arc.center, [0.0, 0.0]);
        assert!(diags.iter().any(|d| d.kind == DiagnosticKind::Semantic));
    }

    #[test]
    fn radius_form_arc_resolves() {
        let (moves, diags) = resolve_last(&["G01 X10 F100", "G03 X0 Y10 R10"]);
        assert!(diags.is_empty());
        let arc = moves[0].arc.expect("arc geometry");
        assert!(arc.center[0].abs() < 1e-9 && arc.center[1].abs() < 1e-9);
        assert!((arc.sweep() - PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn arc_without_center_words_falls_back_to_line() {
        let (moves, diags) = resolve_last(&["G01 X10 F100", "G02 Y10"]);
        assert_eq!(moves[0].motion, MotionMode::Linear);
        assert!(moves[0].arc.is_none());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn zero_radius_arc_falls_back_to_line() {
        let (moves, diags) = resolve_last(&["G02 X1 I0 J0 F100"]);
        assert!(moves[0].arc.is_none());
        assert!(diags.iter().any(|d| d.message.contains("zero radius")));
    }

    #[test]
    fn radius_mismatch_is_diagnosed_not_fatal() {
        let (moves, diags) = resolve_last(&["G01 X10 F100", "G03 X0 Y12 I-10 J0"]);
        assert!(moves[0].arc.is_some());
        assert!(diags.iter().any(|d| d.message.contains("differ")));
    }

    #[test]
    fn xz_plane_arc_uses_i_and_k() {
        let (moves, diags) = resolve_last(&["G18 G01 Z10 F100", "G03 X10 Z0 I0 K-10"]);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        let arc = moves[0].arc.expect("arc geometry");
        assert_eq!(arc.center, [0.0, 0.0]);
        assert!((arc.sweep() - PI / 2.0).abs() < 1e-9);
    }

    #[test]
    fn drill_cycle_expands_to_three_legs() {
        let (moves, diags) = resolve_last(&["G00 Z10", "G81 X5 Y5 R2 Z-3 F50"]);
        assert!(diags.is_empty());
        assert_eq!(moves.len(), 3);
        let phases: Vec<_> = moves.iter().filter_map(|m| m.drill_phase).collect();
        assert_eq!(
            phases,
            vec![DrillPhase::Position, DrillPhase::Plunge, DrillPhase::Retract]
        );
        assert_eq!(moves[0].end, Position::new(5.0, 5.0, 2.0));
        assert_eq!(moves[1].end, Position::new(5.0, 5.0, -3.0));
        assert_eq!(moves[2].end, Position::new(5.0, 5.0, 10.0));
        assert!(moves[0].is_rapid && !moves[1].is_rapid && moves[2].is_rapid);
        assert!(moves.iter().all(|m| m.motion == MotionMode::DrillCycle));
    }
}
