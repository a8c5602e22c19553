pub mod offsets;
pub mod position;

pub use offsets::{DiameterOffset, LengthOffset, ToolOffsetTable, WorkOffsetTable};
pub use position::{Axis, Position};
