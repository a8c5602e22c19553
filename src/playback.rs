//! Read-only scrubbing over a built [`Toolpath`].
//!
//! A [`PlaybackCursor`] is a toolpath reference plus a fractional command
//! position: `2.5` is halfway through command index 2. Cursors are `Copy`
//! values; stepping and seeking return new cursors and never touch the
//! toolpath, so any number of them may query one toolpath from any number of
//! threads. Timers and "is playing" state belong to the caller.

use serde::Serialize;

use crate::interpreter::ModalState;
use crate::toolpath::{Command, Toolpath};

/// Interpolated machine state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub a: f64,
    pub b: f64,
    /// Programmed feed rate (mm/min) of the current command.
    pub feed: f64,
    pub spindle: f64,
    pub is_rapid: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackCursor<'a> {
    toolpath: &'a Toolpath,
    position: f64,
}

impl<'a> PlaybackCursor<'a> {
    /// Cursor at fractional command `position`, clamped to
    /// `[0, command_count]`. NaN is treated as 0.
    pub fn at(toolpath: &'a Toolpath, position: f64) -> Self {
        let position = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, toolpath.len() as f64)
        };
        PlaybackCursor { toolpath, position }
    }

    pub fn start(toolpath: &'a Toolpath) -> Self {
        Self::at(toolpath, 0.0)
    }

    pub fn end(toolpath: &'a Toolpath) -> Self {
        Self::at(toolpath, toolpath.len() as f64)
    }

    /// Cursor at the elapsed program time `seconds`.
    ///
    /// A time inside a dwell maps to the start of the command after it.
    pub fn seek(toolpath: &'a Toolpath, seconds: f64) -> Self {
        let commands = toolpath.commands();
        if seconds.is_nan() || seconds <= 0.0 {
            return Self::start(toolpath);
        }
        let index = commands.partition_point(|c| c.end_time() <= seconds);
        let Some(cmd) = commands.get(index) else {
            return Self::end(toolpath);
        };
        let fraction = if seconds <= cmd.start_time || cmd.duration <= 0.0 {
            0.0
        } else {
            (seconds - cmd.start_time) / cmd.duration
        };
        Self::at(toolpath, index as f64 + fraction)
    }

    /// Cursor at the first command produced by source line `line_number`.
    pub fn for_line(toolpath: &'a Toolpath, line_number: usize) -> Option<Self> {
        toolpath
            .first_command_for_line(line_number)
            .map(|index| Self::at(toolpath, index as f64))
    }

    pub fn toolpath(&self) -> &'a Toolpath {
        self.toolpath
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current command index and the parameter within it. The end position
    /// maps to `t = 1` of the last command.
    fn segment(&self) -> (usize, f64) {
        let last = self.toolpath.len().saturating_sub(1);
        let index = self.position.floor() as usize;
        if index > last {
            (last, 1.0)
        } else {
            (index, self.position - index as f64)
        }
    }

    /// The command the cursor is in. `None` only for an empty toolpath, which
    /// [`crate::build`] never returns.
    pub fn command(&self) -> Option<&'a Command> {
        let (index, _) = self.segment();
        self.toolpath.commands().get(index)
    }

    /// Modal state in effect for the current command.
    pub fn modal(&self) -> Option<&'a ModalState> {
        self.command().map(|c| &c.modal)
    }

    pub fn line_number(&self) -> Option<usize> {
        self.command().map(|c| c.line_number)
    }

    pub fn pose(&self) -> Option<Pose> {
        let (_, t) = self.segment();
        let cmd = self.command()?;
        let p = cmd.position_at(t);
        Some(Pose {
            x: p.x,
            y: p.y,
            z: p.z,
            a: p.a,
            b: p.b,
            feed: cmd.feed_rate,
            spindle: cmd.spindle_speed,
            is_rapid: cmd.is_rapid,
        })
    }

    /// Seconds from program start to the cursor.
    pub fn elapsed_time(&self) -> f64 {
        let (_, t) = self.segment();
        self.command()
            .map(|cmd| cmd.start_time + cmd.duration * t)
            .unwrap_or(0.0)
    }

    /// Start of the first command belonging to the next source line. Several
    /// commands from one line (a drill cycle) are stepped over together.
    pub fn next_line(&self) -> Self {
        let commands = self.toolpath.commands();
        let index = self.position.floor() as usize;
        let Some(current) = commands.get(index) else {
            return *self;
        };
        let next = commands[index + 1..]
            .iter()
            .position(|c| c.line_number != current.line_number)
            .map_or(commands.len(), |offset| index + 1 + offset);
        Self::at(self.toolpath, next as f64)
    }

    /// Start of the source line before the cursor. From the middle of a line
    /// this goes back to that line's start.
    pub fn previous_line(&self) -> Self {
        let ceil = self.position.ceil() as usize;
        let Some(target) = ceil.checked_sub(1) else {
            return *self;
        };
        let index = self
            .toolpath
            .commands()
            .get(target)
            .and_then(|c| self.toolpath.first_command_for_line(c.line_number))
            .unwrap_or(target);
        Self::at(self.toolpath, index as f64)
    }
}
