//! Axis and position types shared by every stage of the kernel.
//!
//! A [`Position`] is a uniform five-axis pose: three linear axes in
//! millimetres and two rotary axes in degrees. Code that needs to touch every
//! axis iterates [`Axis::ALL`] instead of naming fields, so the linear and
//! rotary axes go through the same interpolation and offset paths.

use std::ops::{Add, Index, IndexMut, Sub};

use serde::{Deserialize, Serialize};

/// One machine axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    A,
    B,
}

impl Axis {
    /// Every axis, linear axes first.
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::A, Axis::B];

    /// The three linear axes.
    pub const LINEAR: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The two rotary axes.
    pub const ROTARY: [Axis; 2] = [Axis::A, Axis::B];

    /// Maps a G-code axis letter (case-insensitive) to its axis.
    pub fn from_letter(letter: char) -> Option<Axis> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'A' => Some(Axis::A),
            'B' => Some(Axis::B),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::A => 'A',
            Axis::B => 'B',
        }
    }

    /// `true` for A and B, whose values are angles and never unit-scaled.
    pub fn is_rotary(self) -> bool {
        matches!(self, Axis::A | Axis::B)
    }
}

/// A point in the five-axis machine space.
///
/// Missing fields deserialize as `0.0`, so a three-axis work offset can be
/// written as `{ x, y, z }` only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub a: f64,
    pub b: f64,
}

impl Position {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Position {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    /// Builds a position by evaluating `f` once per axis.
    pub fn from_fn(mut f: impl FnMut(Axis) -> f64) -> Self {
        let mut p = Self::zero();
        for axis in Axis::ALL {
            p[axis] = f(axis);
        }
        p
    }

    /// Linear interpolation of every axis, `t = 0` → `self`, `t = 1` → `other`.
    pub fn lerp(&self, other: &Position, t: f64) -> Position {
        Position::from_fn(|axis| self[axis] + (other[axis] - self[axis]) * t)
    }

    /// Euclidean distance over X, Y and Z only.
    pub fn linear_distance(&self, other: &Position) -> f64 {
        Axis::LINEAR
            .iter()
            .map(|&axis| (other[axis] - self[axis]).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Euclidean distance over the rotary axes, in degrees.
    pub fn rotary_distance(&self, other: &Position) -> f64 {
        Axis::ROTARY
            .iter()
            .map(|&axis| (other[axis] - self[axis]).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

impl Index<Axis> for Position {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::A => &self.a,
            Axis::B => &self.b,
        }
    }
}

impl IndexMut<Axis> for Position {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::A => &mut self.a,
            Axis::B => &mut self.b,
        }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::from_fn(|axis| self[axis] + rhs[axis])
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::from_fn(|axis| self[axis] - rhs[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_letters_round_trip() {
        for axis in Axis::ALL {
            assert_eq!(Axis::from_letter(axis.letter()), Some(axis));
            assert_eq!(
                Axis::from_letter(axis.letter().to_ascii_lowercase()),
                Some(axis)
            );
        }
        assert_eq!(Axis::from_letter('C'), None);
    }

    #[test]
    fn index_reaches_every_field() {
        let mut p = Position::zero();
        for (i, axis) in Axis::ALL.iter().enumerate() {
            p[*axis] = i as f64 + 1.0;
        }
        assert_eq!(
            p,
            Position {
                x: 1.0,
                y: 2.0,
                z: 3.0,
                a: 4.0,
                b: 5.0
            }
        );
    }

    #[test]
    fn lerp_interpolates_rotary_axes_too() {
        let start = Position::zero();
        let end = Position {
            x: 10.0,
            y: -4.0,
            z: 2.0,
            a: 90.0,
            b: 180.0,
        };
        let mid = start.lerp(&end, 0.5);
        assert_eq!(mid.x, 5.0);
        assert_eq!(mid.y, -2.0);
        assert_eq!(mid.a, 45.0);
        assert_eq!(mid.b, 90.0);
    }

    #[test]
    fn linear_distance_ignores_rotary_axes() {
        let start = Position::zero();
        let end = Position {
            x: 3.0,
            y: 4.0,
            a: 90.0,
            ..Position::zero()
        };
        assert!((start.linear_distance(&end) - 5.0).abs() < 1e-12);
        assert!((start.rotary_distance(&end) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn missing_fields_deserialize_as_zero() {
        let p: Position = toml::from_str("x = 1.5\nz = -2.0").expect("parse position");
        assert_eq!(p, Position::new(1.5, 0.0, -2.0));
    }
}
