use crate::camera::{Camera, Movement};
use sdl2::keyboard::{KeyboardState, Scancode};
use std::collections::HashMap;
use std::hash::Hash;

pub struct InputMapper<K: Eq + Hash + Copy> {
    inner_state: HashMap<K, f32>,
    configuration: HashMap<Scancode, Vec<(K, f32)>>,
}

impl<K: Eq + Hash + Copy> InputMapper<K> {
    pub fn with_configuration(configuration: impl Into<HashMap<Scancode, Vec<(K, f32)>>>) -> Self {
        let configuration = configuration.into();

        let mut inner_state = HashMap::new();

        for value in configuration.values() {
            for (name, _) in value {
                inner_state.insert(*name, 0.0);
            }
        }

        Self {
            configuration,
            inner_state,
        }
    }

    pub fn update(&mut self, keyboard_state: KeyboardState) {
        self.update_with(|scancode| keyboard_state.is_scancode_pressed(scancode));
    }

    pub fn update_with(&mut self, is_pressed: impl Fn(Scancode) -> bool) {
        let mut new_inputs = self.inner_state.keys().map(|&k| (k, 0.0)).collect::<HashMap<_, _>>();

        for (key, rules) in &self.configuration {
            if is_pressed(*key) {
                for (axis, value) in rules {
                    *new_inputs.entry(*axis).or_default() += *value;
                }
            }
        }

        self.inner_state = new_inputs;
    }

    pub fn clear(&mut self) {
        self.inner_state.values_mut().for_each(|v| *v = 0.0);
    }

    pub fn get_value(&self, axis: K) -> f32 {
        *self.inner_state.get(&axis).unwrap_or(&0.0)
    }
}

#[derive(Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum InputAxes {
    Forward,
    Right,
    Up,
}

impl InputAxes {
    /// WASD moves on the ground plane, Q and E go down and up.
    pub fn default_mapper() -> InputMapper<InputAxes> {
        InputMapper::with_configuration([
            (Scancode::W, vec![(InputAxes::Forward, 1.0)]),
            (Scancode::S, vec![(InputAxes::Forward, -1.0)]),
            (Scancode::A, vec![(InputAxes::Right, -1.0)]),
            (Scancode::D, vec![(InputAxes::Right, 1.0)]),
            (Scancode::Q, vec![(InputAxes::Up, -1.0)]),
            (Scancode::E, vec![(InputAxes::Up, 1.0)]),
        ])
    }
}

/// Moves the camera along every axis that has a non zero value.
pub fn drive_camera(mapper: &InputMapper<InputAxes>, camera: &mut Camera, delta: f32) {
    let axes = [
        (InputAxes::Forward, Movement::Forward, Movement::Backward),
        (InputAxes::Right, Movement::Right, Movement::Left),
        (InputAxes::Up, Movement::Up, Movement::Down),
    ];

    for (axis, positive, negative) in axes {
        let value = mapper.get_value(axis);

        if value > 0.0 {
            camera.process_keyboard(positive, delta * value);
        } else if value < 0.0 {
            camera.process_keyboard(negative, delta * -value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::vec3;

    #[test]
    fn opposite_keys_cancel_out() {
        let mut mapper = InputAxes::default_mapper();

        mapper.update_with(|s| s == Scancode::W || s == Scancode::S || s == Scancode::E);

        assert_eq!(mapper.get_value(InputAxes::Forward), 0.0);
        assert_eq!(mapper.get_value(InputAxes::Up), 1.0);
        assert_eq!(mapper.get_value(InputAxes::Right), 0.0);
    }

    #[test]
    fn released_keys_reset_axes() {
        let mut mapper = InputAxes::default_mapper();

        mapper.update_with(|s| s == Scancode::A);
        assert_eq!(mapper.get_value(InputAxes::Right), -1.0);

        mapper.update_with(|_| false);
        assert_eq!(mapper.get_value(InputAxes::Right), 0.0);
    }

    #[test]
    fn forward_axis_moves_along_front() {
        let mut mapper = InputAxes::default_mapper();
        let mut camera = Camera::new(vec3(0.0, 0.0, 0.0), -90.0, 0.0);
        camera.set_speed(2.0);

        mapper.update_with(|s| s == Scancode::W);
        drive_camera(&mapper, &mut camera, 0.5);

        assert!((camera.position - vec3(0.0, 0.0, -1.0)).norm() < 1e-5);
    }

    #[test]
    fn down_axis_lowers_camera() {
        let mut mapper = InputAxes::default_mapper();
        let mut camera = Camera::new(vec3(0.0, 0.0, 0.0), -90.0, 0.0);
        camera.set_speed(1.0);

        mapper.update_with(|s| s == Scancode::Q);
        drive_camera(&mapper, &mut camera, 1.0);

        assert!(camera.position.y < 0.0);
    }
}
