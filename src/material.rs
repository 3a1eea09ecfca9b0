use crate::texture::{Texture, TextureKind};
use nalgebra_glm::{Vec3, vec3};
use std::rc::Rc;

pub const MIN_SHININESS: f32 = 1.0;
pub const MAX_SHININESS: f32 = 256.0;

pub const MAP_DIFFUSE: u32 = 1;
pub const MAP_SPECULAR: u32 = 2;
pub const MAP_EMISSION: u32 = 4;

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    shininess: f32,
    pub diffuse_map: Option<Rc<Texture>>,
    pub specular_map: Option<Rc<Texture>>,
    pub emission_map: Option<Rc<Texture>>,
}

/// Per-draw material values in the layout the shaders read them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialUniforms {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
    pub map_mask: u32,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ambient: vec3(1.0, 1.0, 1.0),
            diffuse: vec3(1.0, 1.0, 1.0),
            specular: vec3(0.5, 0.5, 0.5),
            shininess: 32.0,
            diffuse_map: None,
            specular_map: None,
            emission_map: None,
        }
    }

    pub fn colored(name: impl Into<String>, ambient: Vec3, diffuse: Vec3, specular: Vec3, shininess: f32) -> Self {
        let mut material = Self {
            ambient,
            diffuse,
            specular,
            ..Self::new(name)
        };
        material.set_shininess(shininess);
        material
    }

    pub fn textured(
        name: impl Into<String>,
        diffuse_map: Option<Rc<Texture>>,
        specular_map: Option<Rc<Texture>>,
        emission_map: Option<Rc<Texture>>,
        shininess: f32,
    ) -> Self {
        let mut material = Self {
            diffuse_map,
            specular_map,
            emission_map,
            ..Self::new(name)
        };
        material.set_shininess(shininess);
        material
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.shininess = shininess.clamp(MIN_SHININESS, MAX_SHININESS);
    }

    pub fn map(&self, kind: TextureKind) -> Option<&Rc<Texture>> {
        match kind {
            TextureKind::Diffuse => self.diffuse_map.as_ref(),
            TextureKind::Specular => self.specular_map.as_ref(),
            TextureKind::Emission => self.emission_map.as_ref(),
        }
    }

    pub fn set_map(&mut self, kind: TextureKind, texture: Option<Rc<Texture>>) {
        match kind {
            TextureKind::Diffuse => self.diffuse_map = texture,
            TextureKind::Specular => self.specular_map = texture,
            TextureKind::Emission => self.emission_map = texture,
        }
    }

    pub fn map_mask(&self) -> u32 {
        let mut mask = 0;

        if self.diffuse_map.is_some() {
            mask |= MAP_DIFFUSE;
        }
        if self.specular_map.is_some() {
            mask |= MAP_SPECULAR;
        }
        if self.emission_map.is_some() {
            mask |= MAP_EMISSION;
        }

        mask
    }

    pub fn uniforms(&self) -> MaterialUniforms {
        MaterialUniforms {
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            shininess: self.shininess,
            map_mask: self.map_mask(),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let m = Material::default();

        assert_eq!(m.name, "Default");
        assert_eq!(m.ambient, vec3(1.0, 1.0, 1.0));
        assert_eq!(m.diffuse, vec3(1.0, 1.0, 1.0));
        assert_eq!(m.specular, vec3(0.5, 0.5, 0.5));
        assert_eq!(m.shininess(), 32.0);
        assert_eq!(m.map_mask(), 0);
    }

    #[test]
    fn shininess_is_clamped() {
        let mut m = Material::default();

        m.set_shininess(0.0);
        assert_eq!(m.shininess(), MIN_SHININESS);

        m.set_shininess(1000.0);
        assert_eq!(m.shininess(), MAX_SHININESS);

        let c = Material::colored("c", Vec3::zeros(), Vec3::zeros(), Vec3::zeros(), -5.0);
        assert_eq!(c.shininess(), MIN_SHININESS);
    }

    #[test]
    fn map_mask_tracks_maps() {
        let tex = Rc::new(Texture::solid("t", [255; 4]));
        let mut m = Material::textured("tex", Some(tex.clone()), None, Some(tex.clone()), 64.0);

        assert_eq!(m.map_mask(), MAP_DIFFUSE | MAP_EMISSION);
        assert_eq!(m.uniforms().shininess, 64.0);

        m.set_map(TextureKind::Emission, None);
        m.set_map(TextureKind::Specular, Some(tex));

        assert_eq!(m.uniforms().map_mask, MAP_DIFFUSE | MAP_SPECULAR);
        assert!(m.map(TextureKind::Emission).is_none());
    }
}
