use crate::math::{Axis, Colormap, SolidColor, SurfaceFamily, SurfaceSpec};
use crate::renderer::{CameraMode, PlotMode};
use crate::renderer::resources::{LightUniform, MaterialUniform};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
    pub specular_color: [f32; 3],
    pub direction: [f32; 3],
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.1,
            diffuse: 0.7,
            specular: 0.4,
            shininess: 30.0,
            specular_color: [0xaa as f32 / 255.0; 3],
            direction: [-0.5, -0.5, -0.5],
        }
    }
}

impl Lighting {
    pub fn material(&self) -> MaterialUniform {
        MaterialUniform {
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            shininess: self.shininess,
        }
    }

    pub fn light(&self, eye: glam::Vec3) -> LightUniform {
        let [r, g, b] = self.specular_color;
        LightUniform {
            direction: glam::Vec3::from(self.direction).extend(0.0).to_array(),
            eye_position: eye.extend(1.0).to_array(),
            specular_color: [r, g, b, 1.0],
        }
    }
}

/// Everything the panel edits about the plotted surface. `changed` is raised by
/// the panel and consumed by the frame loop.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceParams {
    pub family: SurfaceFamily,
    pub nu: usize,
    pub nv: usize,
    pub scale: f32,
    pub colormap: Colormap,
    pub wireframe_color: SolidColor,
    pub color_axis: Axis,
    pub plot_mode: PlotMode,
    pub rotation_speed: f32,
    pub animate_speed: f32,
    pub lighting: Lighting,
    changed: bool,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self::from_spec(
            &SurfaceSpec::new(SurfaceFamily::KleinBottle, 64, 16).with_scale(3.5),
        )
    }
}

impl SurfaceParams {
    pub fn from_spec(spec: &SurfaceSpec) -> Self {
        Self {
            family: spec.family,
            nu: spec.nu,
            nv: spec.nv,
            scale: spec.scale,
            colormap: spec.colormap,
            wireframe_color: spec.wireframe_color,
            color_axis: spec.color_axis,
            plot_mode: PlotMode::Both,
            rotation_speed: 1.0,
            animate_speed: 1.0,
            lighting: Lighting::default(),
            changed: false,
        }
    }

    /// Sampling request for the current parameters at animation time `t`.
    pub fn spec(&self, t: f32) -> SurfaceSpec {
        SurfaceSpec::new(self.family, self.nu, self.nv)
            .with_scale(self.scale)
            .with_time(t)
            .with_colors(self.colormap, self.wireframe_color)
            .with_color_axis(self.color_axis)
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Returns and clears the edit flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

pub struct UiState {
    pub camera_mode: CameraMode,
    pub vsync_enabled: bool,
    pub show_stats: bool,
    pub fps_cap_enabled: bool,
    pub fps_cap: u32,
    pub last_error: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            camera_mode: CameraMode::Orbital,
            vsync_enabled: false,
            show_stats: true,
            fps_cap_enabled: false,
            fps_cap: 144,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_flag_is_consumed_once() {
        let mut params = SurfaceParams::default();
        assert!(!params.take_changed());

        params.mark_changed();
        assert!(params.is_changed());
        assert!(params.take_changed());
        assert!(!params.is_changed());
    }

    #[test]
    fn spec_carries_every_field() {
        let mut params = SurfaceParams::default();
        params.family = SurfaceFamily::Sinc;
        params.nu = 20;
        params.nv = 30;
        params.colormap = Colormap::Hot;
        params.wireframe_color = SolidColor::Yellow;
        params.color_axis = Axis::Z;

        let spec = params.spec(1.25);
        assert_eq!(spec.family, SurfaceFamily::Sinc);
        assert_eq!((spec.nu, spec.nv), (20, 30));
        assert_eq!(spec.scale, 3.5);
        assert_eq!(spec.t, 1.25);
        assert_eq!(spec.colormap, Colormap::Hot);
        assert_eq!(spec.wireframe_color, SolidColor::Yellow);
        assert_eq!(spec.color_axis, Axis::Z);
    }

    #[test]
    fn lighting_uniforms() {
        let lighting = Lighting::default();
        let light = lighting.light(glam::Vec3::new(2.0, 2.0, 4.0));
        assert_eq!(light.eye_position, [2.0, 2.0, 4.0, 1.0]);
        assert_eq!(light.direction[3], 0.0);

        let material = lighting.material();
        assert_eq!(material.shininess, 30.0);
        assert_eq!(material.ambient, 0.1);
    }
}
