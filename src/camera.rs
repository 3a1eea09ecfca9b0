use crate::math;
use nalgebra_glm::{Mat4, Vec3, vec3};

pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 45.0;
const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Free-flying first person camera driven by yaw and pitch in degrees.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub world_up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pub near: f32,
    pub far: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            world_up: vec3(0.0, 1.0, 0.0),
            yaw,
            pitch,
            fov: MAX_FOV,
            speed: 5.0,
            sensitivity: 0.1,
            near: 0.1,
            far: 100.0,
            front: vec3(0.0, 0.0, -1.0),
            right: vec3(1.0, 0.0, 0.0),
            up: vec3(0.0, 1.0, 0.0),
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view(&self) -> Mat4 {
        nalgebra_glm::look_at_rh(&self.position, &(self.position + self.front), &self.up)
    }

    /// Right handed, zero-to-one depth. Y is not flipped here.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };

        nalgebra_glm::perspective_rh_zo(aspect, math::deg_to_rad(self.fov), self.near, self.far)
    }

    pub fn process_keyboard(&mut self, direction: Movement, delta: f32) {
        let velocity = self.speed * delta;

        match direction {
            Movement::Forward => self.position += self.front * velocity,
            Movement::Backward => self.position -= self.front * velocity,
            Movement::Left => self.position -= self.right * velocity,
            Movement::Right => self.position += self.right * velocity,
            Movement::Up => self.position += self.world_up * velocity,
            Movement::Down => self.position -= self.world_up * velocity,
        }
    }

    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.sensitivity;
        self.pitch += y_offset * self.sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        self.update_vectors();
    }

    pub fn zoom(&mut self, offset: f32) {
        self.fov = (self.fov - offset).clamp(MIN_FOV, MAX_FOV);
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let yaw = math::deg_to_rad(self.yaw);
        let pitch = math::deg_to_rad(self.pitch);

        self.front = nalgebra_glm::normalize(&vec3(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()));
        self.right = nalgebra_glm::normalize(&self.front.cross(&self.world_up));
        self.up = nalgebra_glm::normalize(&self.right.cross(&self.front));
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(vec3(0.0, 0.0, 3.0), -90.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::vec4;

    fn approx_vec(a: &Vec3, b: &Vec3) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn default_looks_down_negative_z() {
        let c = Camera::default();

        assert!(approx_vec(&c.front(), &vec3(0.0, 0.0, -1.0)));
        assert!(approx_vec(&c.right(), &vec3(1.0, 0.0, 0.0)));
        assert!(approx_vec(&c.up(), &vec3(0.0, 1.0, 0.0)));
        assert_eq!(c.fov, 45.0);
        assert_eq!(c.position, vec3(0.0, 0.0, 3.0));
    }

    #[test]
    fn keyboard_moves_along_axes() {
        let mut c = Camera::default();
        c.process_keyboard(Movement::Forward, 0.5);
        assert!(approx_vec(&c.position, &vec3(0.0, 0.0, 0.5)));

        c.process_keyboard(Movement::Right, 0.2);
        assert!(approx_vec(&c.position, &vec3(1.0, 0.0, 0.5)));

        c.process_keyboard(Movement::Up, 0.1);
        assert!(approx_vec(&c.position, &vec3(1.0, 0.5, 0.5)));
    }

    #[test]
    fn pitch_is_constrained() {
        let mut c = Camera::default();
        c.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(c.pitch, 89.0);

        c.process_mouse_movement(0.0, -10_000.0, false);
        assert!(c.pitch < -89.0);
    }

    #[test]
    fn mouse_turns_by_sensitivity() {
        let mut c = Camera::default();
        c.process_mouse_movement(900.0, 0.0, true);

        assert!((c.yaw - 0.0).abs() < 1e-4);
        assert!(approx_vec(&c.front(), &vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut c = Camera::default();
        c.zoom(-10.0);
        assert_eq!(c.fov, MAX_FOV);

        c.zoom(100.0);
        assert_eq!(c.fov, MIN_FOV);
    }

    #[test]
    fn view_moves_target_in_front() {
        let c = Camera::default();
        let p = c.view() * vec4(0.0, 0.0, 0.0, 1.0);

        // origin sits 3 units down the camera's -Z
        assert!((p.z + 3.0).abs() < 1e-5);
    }

    #[test]
    fn projection_maps_near_plane_to_zero() {
        let c = Camera::default();
        let p = c.projection(16.0 / 9.0) * vec4(0.0, 0.0, -c.near, 1.0);

        assert!((p.z / p.w).abs() < 1e-5);
    }

    #[test]
    fn degenerate_aspect_falls_back() {
        let c = Camera::default();
        let m = c.projection(0.0);
        assert!(m.iter().all(|v| v.is_finite()));
    }
}
