//! Line-level G-code interpretation: lexing, modal state and diagnostics.

pub mod diagnostics;
pub mod lexer;
pub mod modal;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use lexer::{lex_line, LexedLine, Word};
pub use modal::{
    ArcWords, CutterComp, DistanceMode, DrillMove, DrillRegisters, ModalState, MotionDescriptor,
    MotionMode, Plane, RetractMode, Spindle, Units,
};
