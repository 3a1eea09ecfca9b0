use nalgebra_glm::{Vec3, vec3};

pub const MAX_POINT_LIGHTS: usize = 8;

const AMBIENT_FACTOR: f32 = 0.2;
const DIFFUSE_FACTOR: f32 = 0.5;

fn derive_terms(color: &Vec3, intensity: f32) -> (Vec3, Vec3, Vec3) {
    (
        color * intensity * AMBIENT_FACTOR,
        color * intensity * DIFFUSE_FACTOR,
        *color,
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    color: Vec3,
    intensity: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        let (ambient, diffuse, specular) = derive_terms(&color, intensity);

        Self {
            direction,
            color,
            intensity,
            ambient,
            diffuse,
            specular,
        }
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
        self.recompute();
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
        self.recompute();
    }

    fn recompute(&mut self) {
        (self.ambient, self.diffuse, self.specular) = derive_terms(&self.color, self.intensity);
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(vec3(-0.2, -1.0, -0.3), vec3(1.0, 1.0, 1.0), 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub name: String,
    pub position: Vec3,
    color: Vec3,
    intensity: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub enabled: bool,
}

impl PointLight {
    pub fn new(name: impl Into<String>, position: Vec3, color: Vec3, intensity: f32) -> Self {
        let (ambient, diffuse, specular) = derive_terms(&color, intensity);

        Self {
            name: name.into(),
            position,
            color,
            intensity,
            ambient,
            diffuse,
            specular,
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            enabled: true,
        }
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
        self.recompute();
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
        self.recompute();
    }

    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    fn recompute(&mut self) {
        (self.ambient, self.diffuse, self.specular) = derive_terms(&self.color, self.intensity);
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new("Point light", vec3(1.2, 1.0, 2.0), vec3(1.0, 1.0, 1.0), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_defaults() {
        let l = DirectionalLight::default();

        assert_eq!(l.direction, vec3(-0.2, -1.0, -0.3));
        assert_eq!(l.ambient, vec3(0.2, 0.2, 0.2));
        assert_eq!(l.diffuse, vec3(0.5, 0.5, 0.5));
        assert_eq!(l.specular, vec3(1.0, 1.0, 1.0));
    }

    #[test]
    fn color_and_intensity_rederive_terms() {
        let mut l = DirectionalLight::default();
        l.set_color(vec3(1.0, 0.0, 0.5));
        l.set_intensity(2.0);

        assert_eq!(l.ambient, vec3(0.4, 0.0, 0.2));
        assert_eq!(l.diffuse, vec3(1.0, 0.0, 0.5));
        assert_eq!(l.specular, vec3(1.0, 0.0, 0.5));
        assert_eq!(l.intensity(), 2.0);
    }

    #[test]
    fn point_light_attenuation() {
        let l = PointLight::default();

        assert_eq!(l.attenuation(0.0), 1.0);
        let expected = 1.0 / (1.0 + 0.09 * 10.0 + 0.032 * 100.0);
        assert!((l.attenuation(10.0) - expected).abs() < 1e-6);
        assert!(l.attenuation(20.0) < l.attenuation(10.0));
    }

    #[test]
    fn point_light_recompute() {
        let mut l = PointLight::new("p", Vec3::zeros(), vec3(0.0, 1.0, 0.0), 0.5);
        assert_eq!(l.diffuse, vec3(0.0, 0.25, 0.0));

        l.set_color(vec3(1.0, 1.0, 1.0));
        assert_eq!(l.ambient, vec3(0.1, 0.1, 0.1));
        assert!(l.enabled);
    }
}
