//! Motion geometry: arc solving, segment resolution and the program → machine
//! coordinate transform.
//!
//! ```text
//! geometry/
//! ├── arcs.rs     : arc center/sweep math and parametrisation
//! ├── resolver.rs : MotionDescriptor → program-space segments
//! └── transform.rs: work offsets and tool length compensation
//! ```

pub mod arcs;
pub mod resolver;
pub mod transform;

pub use arcs::{ArcDirection, ArcGeometry};
pub use resolver::{resolve, DrillPhase, ResolvedMove};
pub use transform::{CoordinateTransform, CutterCompensation, ToolAxisMotion};
