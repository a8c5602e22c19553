use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::interpreter::Plane;
use crate::models::{Axis, Position};

/// Travel direction around an arc, viewed from the positive plane normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

impl ArcDirection {
    /// `+1` for counter-clockwise, `-1` for clockwise.
    fn sign(self) -> f64 {
        match self {
            ArcDirection::Clockwise => -1.0,
            ArcDirection::CounterClockwise => 1.0,
        }
    }
}

/// Fully resolved circular (or helical) motion in one plane.
///
/// Angles are radians, measured in the plane's right-handed axis order
/// (see [`Plane::axes`]). `end_angle - start_angle` is the signed sweep:
/// positive counter-clockwise, negative clockwise, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcGeometry {
    pub plane: Plane,
    /// Center in plane coordinates, ordered as [`Plane::axes`].
    pub center: [f64; 2],
    /// Distance from the center to the start point.
    pub radius: f64,
    /// Distance from the center to the end point. Differs from `radius`
    /// only for slightly inconsistent programs; playback blends between them.
    pub end_radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub direction: ArcDirection,
    /// Travel along the plane normal over the whole sweep.
    pub helical_span: f64,
    /// `true` when start and end coincide and the arc sweeps 360°.
    pub full_circle: bool,
}

/// Computes the sweep (radians) traversed from `start_angle` to `end_angle`
/// in the given direction.
///
/// Returns a value in `(0, 2π]`. Equal angles give `2π`: coincident start
/// and end mean a full circle, never a zero-length arc.
pub fn sweep_angle(start_angle: f64, end_angle: f64, direction: ArcDirection) -> f64 {
    let diff = match direction {
        ArcDirection::Clockwise => start_angle - end_angle,
        ArcDirection::CounterClockwise => end_angle - start_angle,
    };
    let sweep = diff.rem_euclid(TAU);
    if sweep == 0.0 {
        TAU
    } else {
        sweep
    }
}

/// Projects `p` onto `plane`, in the plane's axis order.
pub fn plane_coords(p: &Position, plane: Plane) -> [f64; 2] {
    let (first, second) = plane.axes();
    [p[first], p[second]]
}

fn angle_about(center: [f64; 2], point: [f64; 2]) -> f64 {
    (point[1] - center[1]).atan2(point[0] - center[0])
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

/// Outcome of solving the center of an `R`-form arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusCenter {
    Center([f64; 2]),
    /// `|R|` was shorter than half the chord; the center was placed on the
    /// chord midpoint (a semicircle).
    Clamped([f64; 2]),
    /// Start and end coincide, so the center is undetermined.
    Undetermined,
}

/// Solves the center of an arc given in radius form.
///
/// A positive `r` selects the arc of at most 180°, a negative `r` the arc of
/// at least 180°.
pub fn center_from_radius(
    start: [f64; 2],
    end: [f64; 2],
    r: f64,
    direction: ArcDirection,
    tolerance: f64,
) -> RadiusCenter {
    let chord = distance(start, end);
    if chord < tolerance {
        return RadiusCenter::Undetermined;
    }

    let half = chord / 2.0;
    let mid = [(start[0] + end[0]) / 2.0, (start[1] + end[1]) / 2.0];
    // Unit normal to the left of the start → end chord.
    let left = [-(end[1] - start[1]) / chord, (end[0] - start[0]) / chord];

    if r.abs() < half {
        return RadiusCenter::Clamped(mid);
    }

    let h = (r * r - half * half).sqrt();
    let side = direction.sign() * r.signum();
    RadiusCenter::Center([mid[0] + left[0] * h * side, mid[1] + left[1] * h * side])
}

impl ArcGeometry {
    /// Resolves an arc around `center` from `start` to `end`.
    ///
    /// `start` and `end` are full positions; the in-plane components give the
    /// angles and radii and the normal component gives the helical span.
    /// When the in-plane distance between them is under `full_circle_tolerance`
    /// the arc is a full 360° circle.
    pub fn through(
        plane: Plane,
        center: [f64; 2],
        start: &Position,
        end: &Position,
        direction: ArcDirection,
        full_circle_tolerance: f64,
    ) -> ArcGeometry {
        let s = plane_coords(start, plane);
        let e = plane_coords(end, plane);
        let start_angle = angle_about(center, s);
        let full_circle = distance(s, e) < full_circle_tolerance;
        let sweep = if full_circle {
            TAU
        } else {
            sweep_angle(start_angle, angle_about(center, e), direction)
        };

        ArcGeometry {
            plane,
            center,
            radius: distance(center, s),
            end_radius: distance(center, e),
            start_angle,
            end_angle: start_angle + direction.sign() * sweep,
            direction,
            helical_span: end[plane.normal()] - start[plane.normal()],
            full_circle,
        }
    }

    /// Re-anchors this arc on a new center and endpoints while keeping its
    /// signed sweep. Used to carry a program-space arc into machine space.
    pub fn rebased(&self, center: [f64; 2], start: &Position, end: &Position) -> ArcGeometry {
        let s = plane_coords(start, self.plane);
        let e = plane_coords(end, self.plane);
        let start_angle = angle_about(center, s);
        ArcGeometry {
            center,
            radius: distance(center, s),
            end_radius: distance(center, e),
            start_angle,
            end_angle: start_angle + self.signed_sweep(),
            helical_span: end[self.plane.normal()] - start[self.plane.normal()],
            ..*self
        }
    }

    pub fn signed_sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Absolute sweep in radians, in `(0, 2π]`.
    pub fn sweep(&self) -> f64 {
        self.signed_sweep().abs()
    }

    /// Path length of the (possibly helical) arc.
    pub fn length(&self) -> f64 {
        let mean_radius = (self.radius + self.end_radius) / 2.0;
        (mean_radius * self.sweep()).hypot(self.helical_span)
    }

    /// Point on the arc at parameter `t ∈ [0, 1]`.
    ///
    /// The in-plane axes follow the arc angle, the normal axis and the
    /// rotary axes are interpolated linearly between `start` and `end`.
    pub fn position_at(&self, start: &Position, end: &Position, t: f64) -> Position {
        let mut p = start.lerp(end, t);
        let angle = self.start_angle + self.signed_sweep() * t;
        let radius = self.radius + (self.end_radius - self.radius) * t;
        let (first, second) = self.plane.axes();
        p[first] = self.center[0] + radius * angle.cos();
        p[second] = self.center[1] + radius * angle.sin();
        p
    }

    /// `center − start` as an `I/J/K`-style vector on the plane axes.
    pub fn center_offset(&self, start: &Position) -> Position {
        let (first, second) = self.plane.axes();
        let mut offset = Position::zero();
        offset[first] = self.center[0] - start[first];
        offset[second] = self.center[1] - start[second];
        offset
    }

    /// Conservative in-plane envelope of the full circle the arc lies on:
    /// `(axis, min, max)` for both plane axes.
    pub fn circle_envelope(&self) -> [(Axis, f64, f64); 2] {
        let r = self.radius.max(self.end_radius);
        let (first, second) = self.plane.axes();
        [
            (first, self.center[0] - r, self.center[0] + r),
            (second, self.center[1] - r, self.center[1] + r),
        ]
    }
}
