pub mod engine;
pub mod frame;
pub mod output;
pub mod plane;
pub mod point;
pub mod scanline;
pub mod shader;

pub use engine::{ScanEngine, ScanStats};
pub use frame::ScanFrame;
pub use output::{HorayProbeOutput, ProbeOutput, TestProbeOutput};
pub use plane::{ScanningPlane, build_scanning_plane};
pub use point::ScanPoint;
pub use scanline::Scanline;
pub use shader::shade_points;
