use glam::{Mat4, Vec3};

use crate::error::{PlotError, Result};
use crate::math::{SurfaceSpec, generate};
use crate::renderer::camera::{CameraSource, CameraUniform};
use crate::renderer::device::GraphicsDevice;
use crate::renderer::instances::{InstanceLayout, InstanceTransforms};
use crate::renderer::resources::{MeshCapacity, MeshResources};
use crate::ui::state::SurfaceParams;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlotMode {
    Surface,
    Wireframe,
    #[default]
    Both,
}

impl PlotMode {
    pub const ALL: [PlotMode; 3] = [PlotMode::Surface, PlotMode::Wireframe, PlotMode::Both];

    pub fn name(self) -> &'static str {
        match self {
            PlotMode::Surface => "surface",
            PlotMode::Wireframe => "wireframe",
            PlotMode::Both => "surface + wireframe",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshPass {
    Surface,
    Wireframe,
}

/// Receives the draw calls for one frame.
pub trait DrawTarget {
    fn draw_mesh(&mut self, pass: MeshPass, index_count: u32, instance_count: u32);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Rendering,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 2.0 * std::f32::consts::PI / 5.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-4), self.near, self.far)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    pub projection: Mat4,
    pub view: Mat4,
    pub view_projection: Mat4,
    pub eye: Vec3,
    pub aspect: f32,
    pub elapsed: f32,
    pub frame: u64,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            eye: Vec3::ZERO,
            aspect: 0.0,
            elapsed: 0.0,
            frame: 0,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct FrameReport {
    pub camera_updated: bool,
    pub regenerated: bool,
    pub error: Option<PlotError>,
}

/// Drives one plotted surface: per frame it refreshes the camera, the instance
/// matrices and, when needed, the mesh, then issues draw calls.
pub struct FrameOrchestrator<B> {
    resources: MeshResources<B>,
    instances: InstanceTransforms,
    projection: Projection,
    frame: FrameState,
    state: OrchestratorState,
    current: SurfaceSpec,
}

impl<B> FrameOrchestrator<B> {
    pub fn new<D>(
        device: &D,
        params: &SurfaceParams,
        layout: InstanceLayout,
        capacity: MeshCapacity,
    ) -> Result<Self>
    where
        D: GraphicsDevice<Buffer = B>,
    {
        let spec = params.spec(0.0);
        let mesh = generate(&spec)?;
        let instances = InstanceTransforms::new(layout);
        let mut resources =
            MeshResources::allocate_with_capacity(device, &mesh, capacity, instances.count())?;
        resources.update_instances(device, instances.as_raw())?;
        resources.write_material(device, &params.lighting.material());

        log::info!(
            "plotting {} on {}x{} grid, {} instance(s)",
            spec.family.name(),
            spec.nu,
            spec.nv,
            instances.count()
        );

        Ok(Self {
            resources,
            instances,
            projection: Projection::default(),
            frame: FrameState::default(),
            state: OrchestratorState::Idle,
            current: spec,
        })
    }

    pub fn tick<D, C>(
        &mut self,
        device: &D,
        camera: &mut C,
        params: &mut SurfaceParams,
        aspect: f32,
        elapsed: f32,
    ) -> FrameReport
    where
        D: GraphicsDevice<Buffer = B>,
        C: CameraSource,
    {
        self.state = OrchestratorState::Rendering;
        let mut report = FrameReport::default();

        let first = self.frame.frame == 0;
        let aspect_changed = aspect != self.frame.aspect;
        if aspect_changed {
            self.frame.aspect = aspect;
            self.frame.projection = self.projection.matrix(aspect);
        }

        if camera.tick() || aspect_changed || first {
            self.frame.view = camera.view_matrix();
            self.frame.eye = camera.eye();
            self.frame.view_projection = self.frame.projection * self.frame.view;
            self.resources
                .write_camera(device, &CameraUniform::new(self.frame.view_projection));
            report.camera_updated = true;
        }

        self.resources
            .write_light(device, &params.lighting.light(self.frame.eye));
        self.resources
            .write_material(device, &params.lighting.material());

        self.frame.elapsed = elapsed;
        self.instances.recompute(elapsed * params.rotation_speed);
        if let Err(err) = self
            .resources
            .update_instances(device, self.instances.as_raw())
        {
            log::warn!("instance update skipped: {err}");
            report.error = Some(err);
        }

        let edited = params.take_changed();
        if edited || params.family.is_animated() {
            let spec = params.spec(elapsed * params.animate_speed);
            let uploaded = generate(&spec).and_then(|mesh| self.resources.update(device, &mesh));
            match uploaded {
                Ok(()) => {
                    if edited {
                        log::debug!(
                            "regenerated {} {}x{} ({} vertices)",
                            spec.family.name(),
                            spec.nu,
                            spec.nv,
                            spec.vertex_count()
                        );
                    }
                    self.current = spec;
                    report.regenerated = true;
                }
                Err(err) => {
                    log::warn!("keeping previous mesh: {err}");
                    report.error = Some(err);
                }
            }
        }

        self.frame.frame += 1;
        report
    }

    pub fn draw<T: DrawTarget>(&self, target: &mut T, mode: PlotMode) {
        match mode {
            PlotMode::Surface => self.draw_surface(target),
            PlotMode::Wireframe => self.draw_wireframe(target),
            PlotMode::Both => {
                self.draw_surface(target);
                self.draw_wireframe(target);
            }
        }
    }

    pub fn draw_surface<T: DrawTarget>(&self, target: &mut T) {
        let count = self.resources.surface_index_count();
        if count > 0 {
            target.draw_mesh(MeshPass::Surface, count, self.resources.instance_count());
        }
    }

    pub fn draw_wireframe<T: DrawTarget>(&self, target: &mut T) {
        let count = self.resources.wireframe_index_count();
        if count > 0 {
            target.draw_mesh(MeshPass::Wireframe, count, self.resources.instance_count());
        }
    }

    pub fn resources(&self) -> &MeshResources<B> {
        &self.resources
    }

    pub fn frame(&self) -> &FrameState {
        &self.frame
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn current(&self) -> &SurfaceSpec {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SurfaceFamily;
    use crate::renderer::device::recording::RecordingDevice;

    struct ScriptedCamera {
        eye: Vec3,
        pending: bool,
    }

    impl ScriptedCamera {
        fn new() -> Self {
            Self {
                eye: Vec3::new(2.0, 2.0, 4.0),
                pending: true,
            }
        }

        fn move_to(&mut self, eye: Vec3) {
            self.eye = eye;
            self.pending = true;
        }
    }

    impl CameraSource for ScriptedCamera {
        fn tick(&mut self) -> bool {
            std::mem::take(&mut self.pending)
        }

        fn view_matrix(&self) -> Mat4 {
            Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y)
        }

        fn eye(&self) -> Vec3 {
            self.eye
        }
    }

    #[derive(Default)]
    struct RecordingTarget {
        calls: Vec<(MeshPass, u32, u32)>,
    }

    impl DrawTarget for RecordingTarget {
        fn draw_mesh(&mut self, pass: MeshPass, index_count: u32, instance_count: u32) {
            self.calls.push((pass, index_count, instance_count));
        }
    }

    fn params(family: SurfaceFamily, nu: usize, nv: usize) -> SurfaceParams {
        SurfaceParams::from_spec(&SurfaceSpec::new(family, nu, nv))
    }

    fn orchestrator(
        device: &RecordingDevice,
        params: &SurfaceParams,
        capacity: MeshCapacity,
    ) -> FrameOrchestrator<usize> {
        FrameOrchestrator::new(device, params, InstanceLayout::single(), capacity).unwrap()
    }

    fn camera_matrix(device: &RecordingDevice, orchestrator: &FrameOrchestrator<usize>) -> Vec<f32> {
        device.floats(orchestrator.resources().camera, 16)
    }

    #[test]
    fn first_frame_uploads_camera_and_enters_rendering() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Torus, 8, 8);
        let mut orch = orchestrator(&device, &params, MeshCapacity::default());
        let mut camera = ScriptedCamera::new();
        assert_eq!(orch.state(), OrchestratorState::Idle);

        let report = orch.tick(&device, &mut camera, &mut params, 1.5, 0.0);
        assert!(report.camera_updated);
        assert!(!report.regenerated);
        assert_eq!(report.error, None);
        assert_eq!(orch.state(), OrchestratorState::Rendering);

        let expected = orch.projection.matrix(1.5) * camera.view_matrix();
        assert_eq!(camera_matrix(&device, &orch), expected.to_cols_array().to_vec());
    }

    #[test]
    fn still_camera_is_not_rewritten() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Torus, 8, 8);
        let mut orch = orchestrator(&device, &params, MeshCapacity::default());
        let mut camera = ScriptedCamera::new();

        orch.tick(&device, &mut camera, &mut params, 1.5, 0.0);
        let uploaded = camera_matrix(&device, &orch);

        camera.eye = Vec3::new(9.0, 9.0, 9.0);
        let report = orch.tick(&device, &mut camera, &mut params, 1.5, 0.1);
        assert!(!report.camera_updated);
        assert_eq!(camera_matrix(&device, &orch), uploaded);

        camera.move_to(Vec3::new(0.0, 3.0, 3.0));
        let report = orch.tick(&device, &mut camera, &mut params, 1.5, 0.2);
        assert!(report.camera_updated);
        assert_ne!(camera_matrix(&device, &orch), uploaded);
        assert_eq!(orch.frame().eye, Vec3::new(0.0, 3.0, 3.0));
    }

    #[test]
    fn resize_refreshes_projection() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Torus, 8, 8);
        let mut orch = orchestrator(&device, &params, MeshCapacity::default());
        let mut camera = ScriptedCamera::new();

        orch.tick(&device, &mut camera, &mut params, 1.5, 0.0);
        let report = orch.tick(&device, &mut camera, &mut params, 0.75, 0.016);
        assert!(report.camera_updated);
        assert_eq!(orch.frame().projection, orch.projection.matrix(0.75));
    }

    #[test]
    fn edit_regenerates_once_and_clears_flag() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Torus, 8, 8);
        let mut orch = orchestrator(&device, &params, MeshCapacity::for_grid(16, 16));
        let mut camera = ScriptedCamera::new();

        params.family = SurfaceFamily::Enneper;
        params.mark_changed();
        let report = orch.tick(&device, &mut camera, &mut params, 1.0, 0.0);
        assert!(report.regenerated);
        assert!(!params.is_changed());
        assert_eq!(orch.resources().wireframe_index_count(), 288);
        assert_eq!(orch.current().family, SurfaceFamily::Enneper);

        let report = orch.tick(&device, &mut camera, &mut params, 1.0, 0.016);
        assert!(!report.regenerated);
    }

    #[test]
    fn animated_family_regenerates_every_frame() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Sinc, 16, 16);
        let mut orch = orchestrator(&device, &params, MeshCapacity::default());
        let mut camera = ScriptedCamera::new();
        let positions = orch.resources().positions;
        let count = 17 * 17 * 3;

        let mut previous = device.floats(positions, count);
        for frame in 1..4 {
            let report = orch.tick(&device, &mut camera, &mut params, 1.0, frame as f32 * 0.3);
            assert!(report.regenerated);
            let current = device.floats(positions, count);
            assert_ne!(current, previous);
            previous = current;
        }
        assert!((orch.current().t - 0.9).abs() < 1e-6);
    }

    #[test]
    fn oversized_edit_keeps_previous_mesh() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Torus, 8, 8);
        let mut orch = orchestrator(&device, &params, MeshCapacity::default());
        let mut camera = ScriptedCamera::new();
        let before = device.bytes(orch.resources().positions);

        params.nu = 16;
        params.nv = 16;
        params.mark_changed();
        let report = orch.tick(&device, &mut camera, &mut params, 1.0, 0.0);

        assert!(!report.regenerated);
        assert!(matches!(report.error, Some(PlotError::CapacityExceeded { .. })));
        assert!(!params.is_changed());
        assert_eq!(device.bytes(orch.resources().positions), before);
        assert_eq!(orch.resources().surface_index_count(), 384);
        assert_eq!(orch.current().nu, 8);

        let mut target = RecordingTarget::default();
        orch.draw(&mut target, PlotMode::Surface);
        assert_eq!(target.calls, vec![(MeshPass::Surface, 384, 1)]);
    }

    #[test]
    fn draw_calls_follow_plot_mode() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Torus, 8, 8);
        let mut orch = FrameOrchestrator::new(
            &device,
            &params,
            InstanceLayout::centred_grid(4, 5, 2.0, 2.0),
            MeshCapacity::default(),
        )
        .unwrap();
        let mut camera = ScriptedCamera::new();
        orch.tick(&device, &mut camera, &mut params, 1.0, 0.0);

        let mut target = RecordingTarget::default();
        orch.draw(&mut target, PlotMode::Wireframe);
        assert_eq!(target.calls, vec![(MeshPass::Wireframe, 256, 20)]);

        let mut target = RecordingTarget::default();
        orch.draw(&mut target, PlotMode::Both);
        assert_eq!(
            target.calls,
            vec![(MeshPass::Surface, 384, 20), (MeshPass::Wireframe, 256, 20)]
        );
    }

    #[test]
    fn instances_rotate_with_time() {
        let device = RecordingDevice::default();
        let mut params = params(SurfaceFamily::Torus, 4, 4);
        let mut orch = orchestrator(&device, &params, MeshCapacity::default());
        let mut camera = ScriptedCamera::new();
        let instances = orch.resources().instances;

        orch.tick(&device, &mut camera, &mut params, 1.0, 0.0);
        let at_start = device.bytes(instances);
        orch.tick(&device, &mut camera, &mut params, 1.0, 2.0);
        assert_ne!(device.bytes(instances), at_start);

        params.rotation_speed = 0.0;
        orch.tick(&device, &mut camera, &mut params, 1.0, 3.0);
        let frozen = device.bytes(instances);
        orch.tick(&device, &mut camera, &mut params, 1.0, 4.0);
        assert_eq!(device.bytes(instances), frozen);
    }
}
