use crate::error::{PlotError, Result};
use crate::math::MeshBuffers;
use crate::renderer::camera::CameraUniform;
use crate::renderer::device::{BufferKind, GraphicsDevice};
use crate::renderer::instances::InstanceRaw;

const FLOAT3: u64 = 3 * 4;
const INDEX: u64 = 4;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub direction: [f32; 4],
    pub eye_position: [f32; 4],
    pub specular_color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

/// Element counts the mesh buffers were sized for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshCapacity {
    pub vertices: usize,
    pub surface_indices: usize,
    pub wireframe_indices: usize,
}

impl MeshCapacity {
    pub fn of(mesh: &MeshBuffers) -> Self {
        Self {
            vertices: mesh.vertex_count(),
            surface_indices: mesh.surface_index_count(),
            wireframe_indices: mesh.wireframe_index_count(),
        }
    }

    /// Upper bound for any family sampled on an `nu x nv` grid.
    pub fn for_grid(nu: usize, nv: usize) -> Self {
        Self {
            vertices: (nu + 1) * (nv + 1),
            surface_indices: 6 * nu * nv,
            wireframe_indices: 2 * (nu * (nv + 1) + nv * (nu + 1)),
        }
    }

    pub fn max(self, other: Self) -> Self {
        Self {
            vertices: self.vertices.max(other.vertices),
            surface_indices: self.surface_indices.max(other.surface_indices),
            wireframe_indices: self.wireframe_indices.max(other.wireframe_indices),
        }
    }

    pub fn check(&self, mesh: &MeshBuffers) -> Result<()> {
        let needed = [
            ("vertices", mesh.vertex_count(), self.vertices),
            ("surface indices", mesh.surface_index_count(), self.surface_indices),
            ("wireframe indices", mesh.wireframe_index_count(), self.wireframe_indices),
        ];
        for (resource, requested, capacity) in needed {
            if requested > capacity {
                return Err(PlotError::CapacityExceeded {
                    resource,
                    requested,
                    capacity,
                });
            }
        }
        Ok(())
    }
}

/// Every GPU buffer one plotted surface needs. Created once; later frames only
/// overwrite contents.
pub struct MeshResources<B> {
    pub positions: B,
    pub normals: B,
    pub surface_colors: B,
    pub wireframe_colors: B,
    pub surface_indices: B,
    pub wireframe_indices: B,
    pub camera: B,
    pub instances: B,
    pub light: B,
    pub material: B,

    capacity: MeshCapacity,
    max_instances: usize,
    surface_index_count: u32,
    wireframe_index_count: u32,
    instance_count: u32,
}

impl<B> MeshResources<B> {
    pub fn allocate<D>(device: &D, mesh: &MeshBuffers, max_instances: usize) -> Result<Self>
    where
        D: GraphicsDevice<Buffer = B>,
    {
        Self::allocate_with_capacity(device, mesh, MeshCapacity::default(), max_instances)
    }

    /// Sizes the mesh buffers for at least `capacity` so later, larger meshes fit.
    pub fn allocate_with_capacity<D>(
        device: &D,
        mesh: &MeshBuffers,
        capacity: MeshCapacity,
        max_instances: usize,
    ) -> Result<Self>
    where
        D: GraphicsDevice<Buffer = B>,
    {
        let capacity = capacity.max(MeshCapacity::of(mesh));
        let max_instances = max_instances.max(1);
        let vertex_bytes = capacity.vertices.max(1) as u64 * FLOAT3;

        let mut resources = Self {
            positions: device.create_buffer("Surface Positions", BufferKind::Vertex, vertex_bytes)?,
            normals: device.create_buffer("Surface Normals", BufferKind::Vertex, vertex_bytes)?,
            surface_colors: device.create_buffer(
                "Surface Colors",
                BufferKind::Vertex,
                vertex_bytes,
            )?,
            wireframe_colors: device.create_buffer(
                "Wireframe Colors",
                BufferKind::Vertex,
                vertex_bytes,
            )?,
            surface_indices: device.create_buffer(
                "Surface Indices",
                BufferKind::Index,
                capacity.surface_indices.max(1) as u64 * INDEX,
            )?,
            wireframe_indices: device.create_buffer(
                "Wireframe Indices",
                BufferKind::Index,
                capacity.wireframe_indices.max(1) as u64 * INDEX,
            )?,
            camera: device.create_buffer(
                "Camera Uniform",
                BufferKind::Uniform,
                std::mem::size_of::<CameraUniform>() as u64,
            )?,
            instances: device.create_buffer(
                "Instance Transforms",
                BufferKind::Storage,
                max_instances as u64 * InstanceRaw::SIZE,
            )?,
            light: device.create_buffer(
                "Light Uniform",
                BufferKind::Uniform,
                std::mem::size_of::<LightUniform>() as u64,
            )?,
            material: device.create_buffer(
                "Material Uniform",
                BufferKind::Uniform,
                std::mem::size_of::<MaterialUniform>() as u64,
            )?,
            capacity,
            max_instances,
            surface_index_count: 0,
            wireframe_index_count: 0,
            instance_count: 0,
        };

        log::info!(
            "mesh resources: {} vertices, {} + {} indices, {} instances",
            capacity.vertices,
            capacity.surface_indices,
            capacity.wireframe_indices,
            max_instances
        );

        resources.update(device, mesh)?;
        Ok(resources)
    }

    /// Overwrites mesh contents. A mesh that does not fit leaves every buffer untouched.
    pub fn update<D>(&mut self, device: &D, mesh: &MeshBuffers) -> Result<()>
    where
        D: GraphicsDevice<Buffer = B>,
    {
        self.capacity.check(mesh)?;

        device.write_buffer(&self.positions, 0, bytemuck::cast_slice(&mesh.positions));
        device.write_buffer(&self.normals, 0, bytemuck::cast_slice(&mesh.normals));
        device.write_buffer(&self.surface_colors, 0, bytemuck::cast_slice(&mesh.colors_surface));
        device.write_buffer(
            &self.wireframe_colors,
            0,
            bytemuck::cast_slice(&mesh.colors_wireframe),
        );
        device.write_buffer(
            &self.surface_indices,
            0,
            bytemuck::cast_slice(&mesh.indices_surface),
        );
        device.write_buffer(
            &self.wireframe_indices,
            0,
            bytemuck::cast_slice(&mesh.indices_wireframe),
        );

        self.surface_index_count = mesh.surface_index_count() as u32;
        self.wireframe_index_count = mesh.wireframe_index_count() as u32;
        Ok(())
    }

    pub fn update_instances<D>(&mut self, device: &D, instances: &[InstanceRaw]) -> Result<()>
    where
        D: GraphicsDevice<Buffer = B>,
    {
        if instances.len() > self.max_instances {
            return Err(PlotError::CapacityExceeded {
                resource: "instances",
                requested: instances.len(),
                capacity: self.max_instances,
            });
        }
        device.write_buffer(&self.instances, 0, bytemuck::cast_slice(instances));
        self.instance_count = instances.len() as u32;
        Ok(())
    }

    pub fn write_camera<D>(&self, device: &D, uniform: &CameraUniform)
    where
        D: GraphicsDevice<Buffer = B>,
    {
        device.write_buffer(&self.camera, 0, bytemuck::bytes_of(uniform));
    }

    pub fn write_light<D>(&self, device: &D, uniform: &LightUniform)
    where
        D: GraphicsDevice<Buffer = B>,
    {
        device.write_buffer(&self.light, 0, bytemuck::bytes_of(uniform));
    }

    pub fn write_material<D>(&self, device: &D, uniform: &MaterialUniform)
    where
        D: GraphicsDevice<Buffer = B>,
    {
        device.write_buffer(&self.material, 0, bytemuck::bytes_of(uniform));
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    pub fn surface_index_count(&self) -> u32 {
        self.surface_index_count
    }

    pub fn wireframe_index_count(&self) -> u32 {
        self.wireframe_index_count
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{SurfaceFamily, SurfaceSpec, generate};
    use crate::renderer::device::recording::RecordingDevice;
    use crate::renderer::instances::{InstanceLayout, InstanceTransforms};

    fn mesh(family: SurfaceFamily, nu: usize, nv: usize) -> MeshBuffers {
        generate(&SurfaceSpec::new(family, nu, nv)).unwrap()
    }

    #[test]
    fn uniform_sizes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 16);
    }

    #[test]
    fn allocate_sizes_and_uploads() {
        let device = RecordingDevice::default();
        let torus = mesh(SurfaceFamily::Torus, 8, 8);
        let resources = MeshResources::allocate(&device, &torus, 1).unwrap();

        assert_eq!(device.allocations(), 10);
        assert_eq!(device.size(resources.positions), 81 * 12);
        assert_eq!(device.size(resources.surface_indices), 384 * 4);
        assert_eq!(device.size(resources.wireframe_indices), 256 * 4);
        assert_eq!(device.size(resources.instances), 128);
        assert_eq!(resources.surface_index_count(), 384);
        assert_eq!(resources.wireframe_index_count(), 256);
        assert_eq!(device.floats(resources.positions, 3), torus.positions[..3].to_vec());
    }

    #[test]
    fn repeated_updates_do_not_allocate() {
        let device = RecordingDevice::default();
        let first = generate(&SurfaceSpec::new(SurfaceFamily::Sinc, 16, 16)).unwrap();
        let mut resources = MeshResources::allocate(&device, &first, 1).unwrap();
        let allocations = device.allocations();

        for step in 1..5 {
            let next = generate(
                &SurfaceSpec::new(SurfaceFamily::Sinc, 16, 16).with_time(step as f32 * 0.25),
            )
            .unwrap();
            resources.update(&device, &next).unwrap();
            assert_eq!(
                device.floats(resources.positions, next.positions.len()),
                next.positions
            );
        }
        assert_eq!(device.allocations(), allocations);
    }

    #[test]
    fn growth_is_rejected_and_contents_kept() {
        let device = RecordingDevice::default();
        let small = mesh(SurfaceFamily::Torus, 8, 8);
        let mut resources = MeshResources::allocate(&device, &small, 1).unwrap();
        let positions = device.bytes(resources.positions);
        let indices = device.bytes(resources.surface_indices);
        let writes = device.writes.get();

        let large = mesh(SurfaceFamily::Torus, 16, 16);
        let err = resources.update(&device, &large).unwrap_err();
        assert_eq!(
            err,
            PlotError::CapacityExceeded {
                resource: "vertices",
                requested: 289,
                capacity: 81,
            }
        );
        assert!(err.is_recoverable());

        assert_eq!(device.writes.get(), writes);
        assert_eq!(device.bytes(resources.positions), positions);
        assert_eq!(device.bytes(resources.surface_indices), indices);
        assert_eq!(resources.surface_index_count(), 384);
    }

    #[test]
    fn grid_capacity_fits_any_family() {
        let device = RecordingDevice::default();
        let first = mesh(SurfaceFamily::Torus, 8, 8);
        let mut resources = MeshResources::allocate_with_capacity(
            &device,
            &first,
            MeshCapacity::for_grid(16, 16),
            1,
        )
        .unwrap();

        for family in SurfaceFamily::ALL {
            let m = mesh(family, 16, 16);
            resources.update(&device, &m).unwrap();
            assert_eq!(resources.wireframe_index_count() as usize, m.wireframe_index_count());
        }
    }

    #[test]
    fn smaller_mesh_reuses_buffers() {
        let device = RecordingDevice::default();
        let big = mesh(SurfaceFamily::Enneper, 16, 16);
        let mut resources = MeshResources::allocate(&device, &big, 1).unwrap();
        let small = mesh(SurfaceFamily::Enneper, 4, 4);

        resources.update(&device, &small).unwrap();
        assert_eq!(resources.surface_index_count(), 96);
        assert_eq!(device.size(resources.positions), 289 * 12);
    }

    #[test]
    fn instance_updates_respect_capacity() {
        let device = RecordingDevice::default();
        let torus = mesh(SurfaceFamily::Torus, 4, 4);
        let mut resources = MeshResources::allocate(&device, &torus, 4).unwrap();

        let grid = InstanceTransforms::new(InstanceLayout::centred_grid(2, 2, 1.0, 0.0));
        resources.update_instances(&device, grid.as_raw()).unwrap();
        assert_eq!(resources.instance_count(), 4);
        assert_eq!(
            device.bytes(resources.instances),
            bytemuck::cast_slice::<InstanceRaw, u8>(grid.as_raw()).to_vec()
        );

        let too_many = InstanceTransforms::new(InstanceLayout::centred_grid(3, 2, 1.0, 0.0));
        let err = resources.update_instances(&device, too_many.as_raw()).unwrap_err();
        assert!(matches!(
            err,
            PlotError::CapacityExceeded { resource: "instances", requested: 6, capacity: 4 }
        ));
        assert_eq!(resources.instance_count(), 4);
    }

    #[test]
    fn device_refusal_surfaces_as_error() {
        let device = RecordingDevice::with_max_buffer_size(64);
        let torus = mesh(SurfaceFamily::Torus, 8, 8);
        let err = MeshResources::allocate(&device, &torus, 1).err().unwrap();
        assert!(matches!(err, PlotError::DeviceResourceCreationFailed { .. }));
        assert!(!err.is_recoverable());
    }
}
