//! Persistent interpreter state and the per-line modal update.
//!
//! [`ModalState::apply_line`] is a pure function: it takes the state before a
//! line and that line's words, and returns the state after the line together
//! with a [`MotionDescriptor`] describing the motion (if any) the line asks
//! for. Every field of the state persists until a word on some later line
//! overrides it.

use serde::{Deserialize, Serialize};

use super::diagnostics::{DiagnosticKind, Diagnostics};
use super::lexer::Word;
use crate::models::{Axis, Position};

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Tolerance used when deciding whether a G/M/H/D value is an integer.
const CODE_TOLERANCE: f64 = 1e-6;

/// Active motion mode (modal group 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
    DrillCycle,
    /// No motion mode active (startup state, or after `G80`).
    None,
}

impl MotionMode {
    pub fn is_arc(self) -> bool {
        matches!(self, MotionMode::ArcCw | MotionMode::ArcCcw)
    }
}

/// Arc plane (modal group 2).
///
/// Each plane names its two in-plane axes in right-handed order, so that
/// counter-clockwise is positive when viewed from the positive normal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plane {
    /// G17
    Xy,
    /// G18
    Xz,
    /// G19
    Yz,
}

impl Plane {
    /// The two in-plane axes, right-handed with respect to [`Plane::normal`].
    pub fn axes(self) -> (Axis, Axis) {
        match self {
            Plane::Xy => (Axis::X, Axis::Y),
            Plane::Xz => (Axis::Z, Axis::X),
            Plane::Yz => (Axis::Y, Axis::Z),
        }
    }

    /// The axis normal to the plane; the helical axis for arcs and the tool
    /// axis for length compensation and drilling.
    pub fn normal(self) -> Axis {
        match self {
            Plane::Xy => Axis::Z,
            Plane::Xz => Axis::Y,
            Plane::Yz => Axis::X,
        }
    }

    /// Center-offset letters matching [`Plane::axes`].
    pub fn offset_letters(self) -> (char, char) {
        match self {
            Plane::Xy => ('I', 'J'),
            Plane::Xz => ('K', 'I'),
            Plane::Yz => ('J', 'K'),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    Millimetres,
    Inches,
}

impl Units {
    /// Factor converting a program value in these units to millimetres.
    pub fn to_mm(self) -> f64 {
        match self {
            Units::Millimetres => 1.0,
            Units::Inches => MM_PER_INCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    Absolute,
    Incremental,
}

/// Cutter radius compensation side. Reported to callers, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutterComp {
    Off,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spindle {
    Off,
    Clockwise,
    CounterClockwise,
}

/// Drill-cycle retract level (G98 / G99).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetractMode {
    /// G98: back to the level the tool was at when the cycle started.
    InitialLevel,
    /// G99: back to the R plane.
    RPlane,
}

/// Sticky drill-cycle words. Values are millimetres, as programmed (not yet
/// resolved against the distance mode).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillRegisters {
    pub retract_mode: RetractMode,
    pub r_plane: Option<f64>,
    pub depth: Option<f64>,
    /// Tool-axis level latched by the first hole of a cycle series. Cleared
    /// when the motion mode leaves the drill cycle.
    pub initial_level: Option<f64>,
}

impl Default for DrillRegisters {
    fn default() -> Self {
        DrillRegisters {
            retract_mode: RetractMode::InitialLevel,
            r_plane: None,
            depth: None,
            initial_level: None,
        }
    }
}

/// The complete modal state of the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalState {
    /// Absolute program-space position in millimetres (degrees for A/B),
    /// before work offsets and tool compensation.
    pub position: Position,
    /// Feed rate in mm/min.
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub spindle: Spindle,
    pub motion_mode: MotionMode,
    pub plane: Plane,
    pub distance_mode: DistanceMode,
    pub units: Units,
    /// Key into the [`WorkOffsetTable`](crate::models::WorkOffsetTable).
    pub work_offset: String,
    pub length_comp_active: bool,
    pub h_register: u32,
    pub d_register: u32,
    pub cutter_comp: CutterComp,
    pub tool_number: u32,
    pub drill: DrillRegisters,
}

impl Default for ModalState {
    fn default() -> Self {
        ModalState {
            position: Position::zero(),
            feed_rate: 0.0,
            spindle_speed: 0.0,
            spindle: Spindle::Off,
            motion_mode: MotionMode::None,
            plane: Plane::Xy,
            distance_mode: DistanceMode::Absolute,
            units: Units::Millimetres,
            work_offset: "G54".to_string(),
            length_comp_active: false,
            h_register: 0,
            d_register: 0,
            cutter_comp: CutterComp::Off,
            tool_number: 0,
            drill: DrillRegisters::default(),
        }
    }
}

/// Arc words from one line, converted to millimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcWords {
    pub i: Option<f64>,
    pub j: Option<f64>,
    pub k: Option<f64>,
    pub r: Option<f64>,
}

impl ArcWords {
    pub fn offset(&self, letter: char) -> Option<f64> {
        match letter {
            'I' => self.i,
            'J' => self.j,
            'K' => self.k,
            _ => None,
        }
    }

    /// `true` when either center-offset word of `plane` is present.
    pub fn has_offsets(&self, plane: Plane) -> bool {
        let (first, second) = plane.offset_letters();
        self.offset(first).is_some() || self.offset(second).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.i.is_none() && self.j.is_none() && self.k.is_none() && self.r.is_none()
    }
}

/// One resolved drill hole along the tool axis, absolute program space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillMove {
    pub initial_level: f64,
    pub r_plane: f64,
    pub depth: f64,
    pub retract: f64,
}

/// What a single line asks the machine to do.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionDescriptor {
    pub line: usize,
    /// [`MotionMode::None`] when the line carries no motion.
    pub motion: MotionMode,
    /// Program-space position before the line.
    pub start: Position,
    /// Program-space position after the line.
    pub end: Position,
    pub arc: ArcWords,
    /// Set for [`MotionMode::DrillCycle`] motions.
    pub drill: Option<DrillMove>,
    /// `G4` dwell in seconds.
    pub dwell: Option<f64>,
}

impl MotionDescriptor {
    pub fn is_motion(&self) -> bool {
        self.motion != MotionMode::None
    }
}

/// Modal groups that may appear at most once per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModalGroup {
    Motion,
    Plane,
    Units,
    CutterComp,
    LengthComp,
    WorkOffset,
    Distance,
    Retract,
    Spindle,
}

/// Marks `group` as set on this line; a second claim is a conflict.
fn claim_group(
    seen: &mut Vec<ModalGroup>,
    group: ModalGroup,
    word: &Word,
    line: usize,
    diags: &mut Diagnostics,
) {
    if seen.contains(&group) {
        diags.push(
            line,
            DiagnosticKind::Semantic,
            format!(
                "{}{} conflicts with an earlier word in the same modal group; last one wins",
                word.letter,
                format_code(word.value)
            ),
        );
    } else {
        seen.push(group);
    }
}

/// Returns the integer code of a G/M word, or `None` for fractional or
/// negative values such as `G43.4`.
fn code_number(value: f64) -> Option<u32> {
    let rounded = value.round();
    if value >= 0.0 && (value - rounded).abs() < CODE_TOLERANCE {
        Some(rounded as u32)
    } else {
        None
    }
}

fn format_code(value: f64) -> String {
    match code_number(value) {
        Some(n) => n.to_string(),
        None => value.to_string(),
    }
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one line's words and returns the new state plus the motion the
    /// line describes. Never fails: unrecognized or malformed words become
    /// diagnostics and are otherwise ignored.
    pub fn apply_line(
        &self,
        line: usize,
        words: &[Word],
        diags: &mut Diagnostics,
    ) -> (ModalState, MotionDescriptor) {
        let mut next = self.clone();
        let mut seen = Vec::new();
        let mut passthrough = false;
        let mut dwell_requested = false;
        let mut drill_word = false;

        // ── 1. mode-setting words ────────────────────────────────────────────
        for word in words {
            match word.letter {
                'G' => match code_number(word.value) {
                    Some(code @ (0 | 1 | 2 | 3 | 80 | 81)) => {
                        claim_group(&mut seen, ModalGroup::Motion, word, line, diags);
                        next.motion_mode = match code {
                            0 => MotionMode::Rapid,
                            1 => MotionMode::Linear,
                            2 => MotionMode::ArcCw,
                            3 => MotionMode::ArcCcw,
                            81 => MotionMode::DrillCycle,
                            _ => MotionMode::None,
                        };
                        drill_word = code == 81;
                    }
                    Some(4) => dwell_requested = true,
                    Some(code @ 17..=19) => {
                        claim_group(&mut seen, ModalGroup::Plane, word, line, diags);
                        next.plane = match code {
                            17 => Plane::Xy,
                            18 => Plane::Xz,
                            _ => Plane::Yz,
                        };
                    }
                    Some(code @ (20 | 21)) => {
                        claim_group(&mut seen, ModalGroup::Units, word, line, diags);
                        next.units = if code == 20 {
                            Units::Inches
                        } else {
                            Units::Millimetres
                        };
                    }
                    Some(code @ 40..=42) => {
                        claim_group(&mut seen, ModalGroup::CutterComp, word, line, diags);
                        next.cutter_comp = match code {
                            40 => CutterComp::Off,
                            41 => CutterComp::Left,
                            _ => CutterComp::Right,
                        };
                    }
                    Some(code @ (43 | 49)) => {
                        claim_group(&mut seen, ModalGroup::LengthComp, word, line, diags);
                        next.length_comp_active = code == 43;
                    }
                    Some(code @ 54..=59) => {
                        claim_group(&mut seen, ModalGroup::WorkOffset, word, line, diags);
                        next.work_offset = format!("G{code}");
                    }
                    Some(code @ (90 | 91)) => {
                        claim_group(&mut seen, ModalGroup::Distance, word, line, diags);
                        next.distance_mode = if code == 90 {
                            DistanceMode::Absolute
                        } else {
                            DistanceMode::Incremental
                        };
                    }
                    Some(code @ (98 | 99)) => {
                        claim_group(&mut seen, ModalGroup::Retract, word, line, diags);
                        next.drill.retract_mode = if code == 98 {
                            RetractMode::InitialLevel
                        } else {
                            RetractMode::RPlane
                        };
                    }
                    _ => {
                        passthrough = true;
                        diags.push(
                            line,
                            DiagnosticKind::Semantic,
                            format!(
                                "unsupported code G{}; line passed through without motion",
                                format_code(word.value)
                            ),
                        );
                    }
                },
                'M' => match code_number(word.value) {
                    Some(code @ 3..=5) => {
                        claim_group(&mut seen, ModalGroup::Spindle, word, line, diags);
                        next.spindle = match code {
                            3 => Spindle::Clockwise,
                            4 => Spindle::CounterClockwise,
                            _ => Spindle::Off,
                        };
                    }
                    Some(0 | 1 | 2 | 6 | 7 | 8 | 9 | 30) => {}
                    _ => diags.push(
                        line,
                        DiagnosticKind::Semantic,
                        format!("unsupported code M{} ignored", format_code(word.value)),
                    ),
                },
                'T' => match code_number(word.value) {
                    Some(tool) => next.tool_number = tool,
                    None => invalid_word(word, line, diags),
                },
                _ => {}
            }
        }

        if next.motion_mode != MotionMode::DrillCycle {
            next.drill.initial_level = None;
        }

        // ── 2. feed, speed, registers, arc and dwell words ───────────────────
        let scale = next.units.to_mm();
        let mut arc = ArcWords::default();
        let mut dwell = None;
        for word in words {
            match word.letter {
                'F' if word.value >= 0.0 => next.feed_rate = word.value * scale,
                'S' if word.value >= 0.0 => next.spindle_speed = word.value,
                'H' | 'D' => match code_number(word.value) {
                    Some(register) if word.letter == 'H' => next.h_register = register,
                    Some(register) => next.d_register = register,
                    None => invalid_word(word, line, diags),
                },
                'I' => arc.i = Some(word.value * scale),
                'J' => arc.j = Some(word.value * scale),
                'K' => arc.k = Some(word.value * scale),
                'R' => arc.r = Some(word.value * scale),
                'P' if word.value >= 0.0 => dwell = Some(word.value),
                'F' | 'S' | 'P' => invalid_word(word, line, diags),
                'G' | 'M' | 'T' | 'N' => {}
                letter if Axis::from_letter(letter).is_some() => {}
                _ => diags.push(
                    line,
                    DiagnosticKind::Semantic,
                    format!("unsupported word {}{} ignored", word.letter, word.value),
                ),
            }
        }

        // ── 3. axis words ────────────────────────────────────────────────────
        let mut axis_words: [Option<f64>; 5] = [None; 5];
        for word in words {
            if let Some(axis) = Axis::from_letter(word.letter) {
                let value = if axis.is_rotary() {
                    word.value
                } else {
                    word.value * scale
                };
                axis_words[axis_slot(axis)] = Some(value);
            }
        }
        let has_axis_words = axis_words.iter().any(Option::is_some);

        let mut descriptor = MotionDescriptor {
            line,
            motion: MotionMode::None,
            start: self.position,
            end: self.position,
            arc,
            drill: None,
            dwell: None,
        };

        if dwell_requested {
            match dwell {
                Some(seconds) => descriptor.dwell = Some(seconds),
                None => diags.push(
                    line,
                    DiagnosticKind::Semantic,
                    "G4 without a P word; dwell ignored",
                ),
            }
        }

        if passthrough {
            if has_axis_words {
                diags.push(
                    line,
                    DiagnosticKind::Semantic,
                    "axis words on a passthrough line were ignored",
                );
            }
            return (next, descriptor);
        }

        match next.motion_mode {
            MotionMode::None => {
                if has_axis_words {
                    diags.push(
                        line,
                        DiagnosticKind::Semantic,
                        "axis words with no active motion mode were ignored",
                    );
                }
            }
            MotionMode::DrillCycle => {
                let tool_axis = next.plane.normal();
                if let Some(depth) = axis_words[axis_slot(tool_axis)].take() {
                    next.drill.depth = Some(depth);
                }
                if let Some(r) = arc.r {
                    next.drill.r_plane = Some(r);
                }
                descriptor.arc = ArcWords::default();
                if has_axis_words || (drill_word && arc.r.is_some()) {
                    self.plan_drill(&mut next, &axis_words, &mut descriptor, diags);
                }
            }
            mode => {
                let triggers = has_axis_words || (mode.is_arc() && !arc.is_empty());
                if triggers {
                    let end = apply_axis_words(&self.position, &axis_words, next.distance_mode);
                    next.position = end;
                    descriptor.motion = mode;
                    descriptor.end = end;
                }
            }
        }

        (next, descriptor)
    }

    /// Resolves one drill hole from the sticky registers, or records why it
    /// cannot be drilled.
    fn plan_drill(
        &self,
        next: &mut ModalState,
        axis_words: &[Option<f64>; 5],
        descriptor: &mut MotionDescriptor,
        diags: &mut Diagnostics,
    ) {
        let (Some(r_word), Some(depth_word)) = (next.drill.r_plane, next.drill.depth) else {
            diags.push(
                descriptor.line,
                DiagnosticKind::Semantic,
                "drill cycle needs both R and Z; no hole drilled",
            );
            return;
        };

        let tool_axis = next.plane.normal();
        let initial_level = *next
            .drill
            .initial_level
            .get_or_insert(self.position[tool_axis]);
        let (r_plane, depth) = match next.distance_mode {
            DistanceMode::Absolute => (r_word, depth_word),
            DistanceMode::Incremental => (initial_level + r_word, initial_level + r_word + depth_word),
        };
        let retract = match next.drill.retract_mode {
            RetractMode::InitialLevel => initial_level.max(r_plane),
            RetractMode::RPlane => r_plane,
        };

        let mut end = apply_axis_words(&self.position, axis_words, next.distance_mode);
        end[tool_axis] = retract;

        next.position = end;
        descriptor.motion = MotionMode::DrillCycle;
        descriptor.end = end;
        descriptor.drill = Some(DrillMove {
            initial_level,
            r_plane,
            depth,
            retract,
        });
    }
}

fn invalid_word(word: &Word, line: usize, diags: &mut Diagnostics) {
    diags.push(
        line,
        DiagnosticKind::Semantic,
        format!("invalid value for {}: {}; word ignored", word.letter, word.value),
    );
}

fn axis_slot(axis: Axis) -> usize {
    match axis {
        Axis::X => 0,
        Axis::Y => 1,
        Axis::Z => 2,
        Axis::A => 3,
        Axis::B => 4,
    }
}

/// Absolute words replace an axis, incremental words add to it, and axes
/// without a word keep their value.
fn apply_axis_words(
    start: &Position,
    axis_words: &[Option<f64>; 5],
    mode: DistanceMode,
) -> Position {
    Position::from_fn(|axis| match (axis_words[axis_slot(axis)], mode) {
        (Some(value), DistanceMode::Absolute) => value,
        (Some(delta), DistanceMode::Incremental) => start[axis] + delta,
        (None, _) => start[axis],
    })
}
