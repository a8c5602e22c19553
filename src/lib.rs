//! G-code modal interpreter and toolpath simulation kernel.
//!
//! Program text goes in, an immutable [`Toolpath`] comes out:
//!
//! ```text
//! text ─▶ lexer ─▶ modal state ─▶ geometry resolver ─▶ coordinate transform ─▶ toolpath builder
//!                                                                                  │
//!                                                            PlaybackCursor ◀──────┘
//! ```
//!
//! Building is one synchronous fold with no I/O. Work-offset and tool-offset
//! tables are explicit arguments, borrowed for the duration of the build.
//! Malformed input degrades to diagnostics stored on the toolpath; only
//! structural misuse returns a [`KernelError`].
//!
//! ```
//! use gcode_kernel::{build, MachineParams, PlaybackCursor, ToolOffsetTable, WorkOffsetTable};
//!
//! let program = "G90\nG00 X0 Y0\nG01 X10 F100\nG02 X10 Y10 I0 J5 F100";
//! let toolpath = build(
//!     program,
//!     &WorkOffsetTable::new(),
//!     &ToolOffsetTable::new(),
//!     &MachineParams::new(5000.0),
//! )?;
//! assert_eq!(toolpath.stats().command_count, 3);
//!
//! let pose = PlaybackCursor::at(&toolpath, 1.5).pose();
//! assert!(pose.is_some());
//! # Ok::<(), gcode_kernel::KernelError>(())
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod interpreter;
pub mod models;
pub mod playback;
pub mod telemetry;
pub mod toolpath;

pub use config::{parse_params, parse_setup, MachineParams, MachineSetup};
pub use error::KernelError;
pub use interpreter::{Diagnostic, DiagnosticKind, ModalState, MotionMode};
pub use models::{Axis, DiameterOffset, LengthOffset, Position, ToolOffsetTable, WorkOffsetTable};
pub use playback::{PlaybackCursor, Pose};
pub use toolpath::{build, BoundingBox, Command, Toolpath, ToolpathBuilder, ToolpathStats};
