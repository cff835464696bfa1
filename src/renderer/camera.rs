use glam::{Mat4, Vec2, Vec3};

/// Anything that can drive the view each frame.
pub trait CameraSource {
    /// Advances the controller; true when the view changed since the last tick.
    fn tick(&mut self) -> bool;
    fn view_matrix(&self) -> Mat4;
    fn eye(&self) -> Vec3;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    Free,
    Orbital,
}

pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,

    pub target: Vec3,
    pub orbital_distance: f32,

    pub mode: CameraMode,

    pub move_speed: f32,
    pub mouse_sensitivity: f32,
    pub zoom_speed: f32,

    moved: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::orbiting(Vec3::new(2.0, 2.0, 4.0), Vec3::ZERO)
    }
}

impl Camera {
    pub fn orbiting(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(1e-3);
        let dir = offset / distance;

        Self {
            position: eye,
            yaw: dir.z.atan2(dir.x),
            pitch: dir.y.clamp(-1.0, 1.0).asin(),
            target,
            orbital_distance: distance,
            mode: CameraMode::Orbital,
            move_speed: 2.0,
            mouse_sensitivity: 0.004,
            zoom_speed: 0.25,
            moved: true,
        }
    }

    pub fn front(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    pub fn process_keyboard(&mut self, forward: f32, right: f32, up: f32, dt: f32) {
        if self.mode != CameraMode::Free || (forward == 0.0 && right == 0.0 && up == 0.0) {
            return;
        }

        let speed = self.move_speed * dt;
        let front = self.front();
        let right_vec = self.right();

        self.position += front * forward * speed;
        self.position += right_vec * right * speed;
        self.position.y += up * speed;
        self.moved = true;
    }

    pub fn process_mouse_movement(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }

        // Orbiting looks back at the target, so dragging right swings the eye left.
        let sign = match self.mode {
            CameraMode::Free => 1.0,
            CameraMode::Orbital => -1.0,
        };
        self.yaw += sign * delta.x * self.mouse_sensitivity;
        self.pitch -= sign * delta.y * self.mouse_sensitivity;

        let max_pitch = 89.0_f32.to_radians();
        self.pitch = self.pitch.clamp(-max_pitch, max_pitch);

        if self.mode == CameraMode::Orbital {
            self.update_orbital_position();
        }
        self.moved = true;
    }

    pub fn process_scroll(&mut self, delta: f32) {
        if delta == 0.0 {
            return;
        }
        match self.mode {
            CameraMode::Free => {
                self.move_speed = (self.move_speed + delta * self.zoom_speed).clamp(0.25, 200.0);
            }
            CameraMode::Orbital => {
                self.orbital_distance =
                    (self.orbital_distance - delta * self.zoom_speed).clamp(0.5, 500.0);
                self.update_orbital_position();
                self.moved = true;
            }
        }
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        if self.mode == mode {
            return;
        }

        match mode {
            CameraMode::Free => {
                let dir = (self.target - self.position).normalize();
                self.yaw = dir.z.atan2(dir.x);
                self.pitch = dir.y.asin();
                self.mode = CameraMode::Free;
            }
            CameraMode::Orbital => {
                self.mode = CameraMode::Orbital;
                self.orbital_distance = self.position.distance(self.target);

                let dir = (self.position - self.target).normalize();
                self.yaw = dir.z.atan2(dir.x);
                self.pitch = dir.y.asin();

                self.update_orbital_position();
            }
        }
        self.moved = true;
    }

    fn update_orbital_position(&mut self) {
        self.position = self.target
            + Vec3::new(
                self.orbital_distance * self.yaw.cos() * self.pitch.cos(),
                self.orbital_distance * self.pitch.sin(),
                self.orbital_distance * self.yaw.sin() * self.pitch.cos(),
            );
    }
}

impl CameraSource for Camera {
    fn tick(&mut self) -> bool {
        std::mem::take(&mut self.moved)
    }

    fn view_matrix(&self) -> Mat4 {
        match self.mode {
            CameraMode::Free => {
                Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
            }
            CameraMode::Orbital => Mat4::look_at_rh(self.position, self.target, Vec3::Y),
        }
    }

    fn eye(&self) -> Vec3 {
        self.position
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_reports_change_then_settles() {
        let mut camera = Camera::default();
        assert!(camera.tick());
        assert!(!camera.tick());
    }

    #[test]
    fn orbiting_keeps_eye_on_sphere() {
        let mut camera = Camera::orbiting(Vec3::new(3.0, 4.5, 5.2), Vec3::ZERO);
        let distance = camera.eye().length();
        camera.tick();

        camera.process_mouse_movement(Vec2::new(40.0, -25.0));
        assert!(camera.tick());
        assert!((camera.eye().length() - distance).abs() < 1e-4);
    }

    #[test]
    fn idle_input_does_not_dirty() {
        let mut camera = Camera::default();
        camera.tick();
        camera.process_mouse_movement(Vec2::ZERO);
        camera.process_keyboard(0.0, 0.0, 0.0, 0.016);
        camera.process_scroll(0.0);
        assert!(!camera.tick());
    }

    #[test]
    fn free_mode_moves_along_front() {
        let mut camera = Camera::default();
        camera.set_mode(CameraMode::Free);
        camera.tick();

        let start = camera.eye();
        let front = camera.front();
        camera.process_keyboard(1.0, 0.0, 0.0, 0.5);
        assert!(camera.tick());
        assert!((camera.eye() - start).normalize().abs_diff_eq(front, 1e-4));
    }

    #[test]
    fn orbital_view_looks_at_target() {
        let camera = Camera::orbiting(Vec3::new(2.0, 2.0, 4.0), Vec3::ZERO);
        let target_in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(target_in_view.x.abs() < 1e-5);
        assert!(target_in_view.y.abs() < 1e-5);
        assert!(target_in_view.z < 0.0);
    }
}
