//! Building and querying resolved toolpaths.

pub mod bounds;
pub mod builder;
pub mod types;

pub use bounds::BoundingBox;
pub use builder::{build, ToolpathBuilder};
pub use types::{Command, Toolpath, ToolpathStats};
