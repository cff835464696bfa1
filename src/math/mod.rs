pub mod colormap;
pub mod families;
pub mod sampler;

pub use colormap::{Colormap, SolidColor};
pub use families::SurfaceFamily;
pub use sampler::{Axis, MeshBuffers, SurfaceSpec, generate};
