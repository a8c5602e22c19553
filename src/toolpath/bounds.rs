//! Axis-aligned bounds over the five-axis machine space.

use serde::{Deserialize, Serialize};

use crate::models::{Axis, Position};

/// Per-axis `[min, max]` extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min: Position,
    pub max: Position,
}

impl BoundingBox {
    /// A zero-size box at `point`.
    pub fn from_point(point: &Position) -> Self {
        BoundingBox {
            min: *point,
            max: *point,
        }
    }

    pub fn new(min: Position, max: Position) -> Self {
        BoundingBox { min, max }
    }

    pub fn include(&mut self, point: &Position) {
        for axis in Axis::ALL {
            self.include_axis(axis, point[axis]);
        }
    }

    pub fn include_axis(&mut self, axis: Axis, value: f64) {
        self.min[axis] = self.min[axis].min(value);
        self.max[axis] = self.max[axis].max(value);
    }

    pub fn union(&mut self, other: &BoundingBox) {
        self.include(&other.min);
        self.include(&other.max);
    }

    /// `max − min` on `axis`.
    pub fn size(&self, axis: Axis) -> f64 {
        self.max[axis] - self.min[axis]
    }

    /// `true` when `point` lies inside the box on X, Y and Z. Rotary axes are
    /// continuous and never limit containment.
    pub fn contains(&self, point: &Position) -> bool {
        Axis::LINEAR
            .iter()
            .all(|&axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// `true` when this box lies inside `outer` on X, Y and Z.
    pub fn fits_within(&self, outer: &BoundingBox) -> bool {
        outer.contains(&self.min) && outer.contains(&self.max)
    }

    /// `min <= max` on every axis.
    pub fn is_well_formed(&self) -> bool {
        Axis::ALL.iter().all(|&axis| self.min[axis] <= self.max[axis])
    }
}
