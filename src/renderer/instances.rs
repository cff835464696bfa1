use glam::{Mat4, Vec3};

/// Per-instance matrices as the shader reads them from the storage buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub const SIZE: u64 = std::mem::size_of::<InstanceRaw>() as u64;

    pub fn from_model(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: normal_matrix(model).to_cols_array_2d(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InstanceLayout {
    Single {
        translation: Vec3,
    },
    /// `x_num * z_num` copies on the XZ plane, `spacing` apart, starting at `origin`.
    Grid {
        x_num: u32,
        z_num: u32,
        spacing: f32,
        origin: Vec3,
    },
}

impl InstanceLayout {
    pub fn single() -> Self {
        InstanceLayout::Single {
            translation: Vec3::new(0.0, 0.5, 0.0),
        }
    }

    /// Grid centred on the origin in X and Z, lifted to `y`.
    pub fn centred_grid(x_num: u32, z_num: u32, spacing: f32, y: f32) -> Self {
        let x_num = x_num.max(1);
        let z_num = z_num.max(1);
        InstanceLayout::Grid {
            x_num,
            z_num,
            spacing,
            origin: Vec3::new(
                -0.5 * spacing * (x_num - 1) as f32,
                y,
                -0.5 * spacing * (z_num - 1) as f32,
            ),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            InstanceLayout::Single { .. } => 1,
            InstanceLayout::Grid { x_num, z_num, .. } => (*x_num as usize) * (*z_num as usize),
        }
    }
}

pub fn model_matrix(translation: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_z(rotation.z)
        * Mat4::from_scale(scale)
}

pub fn normal_matrix(model: Mat4) -> Mat4 {
    model.inverse().transpose()
}

/// Owns the instance matrices for a layout; recomputed in place every frame.
pub struct InstanceTransforms {
    layout: InstanceLayout,
    raw: Vec<InstanceRaw>,
}

impl InstanceTransforms {
    pub fn new(layout: InstanceLayout) -> Self {
        let mut transforms = Self {
            layout,
            raw: vec![bytemuck::Zeroable::zeroed(); layout.count()],
        };
        transforms.recompute(0.0);
        transforms
    }

    pub fn count(&self) -> usize {
        self.raw.len()
    }

    pub fn as_raw(&self) -> &[InstanceRaw] {
        &self.raw
    }

    /// `phase` is elapsed seconds times rotation speed.
    pub fn recompute(&mut self, phase: f32) {
        match self.layout {
            InstanceLayout::Single { translation } => {
                let rotation = Vec3::new(phase.sin(), phase.cos(), 0.0);
                self.raw[0] = InstanceRaw::from_model(model_matrix(translation, rotation, Vec3::ONE));
            }
            InstanceLayout::Grid {
                x_num,
                z_num,
                spacing,
                origin,
            } => {
                let total = (x_num * z_num) as f32;
                for i in 0..x_num {
                    for j in 0..z_num {
                        let (fi, fj) = (i as f32, j as f32);
                        let translation = origin + Vec3::new(spacing * fi, 0.0, spacing * fj);
                        let rotation = Vec3::new(
                            (phase * fi / x_num as f32).sin(),
                            (phase * fj / z_num as f32).sin(),
                            (phase * fi * fj / total).cos(),
                        );
                        self.raw[(i * z_num + j) as usize] =
                            InstanceRaw::from_model(model_matrix(translation, rotation, Vec3::ONE));
                    }
                }
            }
        }
    }
}
