pub mod camera;
pub mod device;
pub mod frame;
pub mod gpu;
pub mod instances;
pub mod pipeline;
pub mod resources;

pub use camera::{Camera, CameraMode, CameraSource};
pub use device::WgpuContext;
pub use frame::{FrameOrchestrator, PlotMode};
pub use gpu::GpuState;
pub use instances::InstanceLayout;
pub use pipeline::{PipelineBuilder, SurfacePipelines};
pub use resources::{MeshCapacity, MeshResources};
