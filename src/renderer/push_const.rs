use crate::material::MaterialUniforms;
use nalgebra_glm::{Mat4, Vec3};

/// Size of the `Object` push constant block.
pub const DRAW_CONSTANTS_SIZE: usize = 128;

pub struct PushConstBuilder {
    storage: Vec<u8>,
}

impl PushConstBuilder {
    pub fn new() -> Self {
        Self { storage: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity),
        }
    }

    pub fn add_u32(mut self, value: u32) -> Self {
        self.storage.extend(value.to_le_bytes());
        self
    }

    pub fn add_f32(mut self, value: f32) -> Self {
        self.storage.extend(value.to_le_bytes());
        self
    }

    pub fn add_vec4(self, v: &Vec3, w: f32) -> Self {
        self.add_f32(v.x).add_f32(v.y).add_f32(v.z).add_f32(w)
    }

    pub fn add_uvec4(self, v: [u32; 4]) -> Self {
        v.into_iter().fold(self, |b, x| b.add_u32(x))
    }

    pub fn add_mat(mut self, mat4: Mat4) -> Self {
        for value in mat4.data.as_slice() {
            self.storage.extend(value.to_le_bytes());
        }
        self
    }

    pub fn build(self) -> Box<[u8]> {
        self.storage.into_boxed_slice()
    }
}

/// Model matrix followed by the material, laid out like the `Object` block in `common.glsl`.
pub fn draw_constants(model: Mat4, material: &MaterialUniforms) -> Box<[u8]> {
    PushConstBuilder::with_capacity(DRAW_CONSTANTS_SIZE)
        .add_mat(model)
        .add_vec4(&material.ambient, 1.0)
        .add_vec4(&material.diffuse, 1.0)
        .add_vec4(&material.specular, material.shininess)
        .add_uvec4([material.map_mask, 0, 0, 0])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::{translation, vec3};

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn draw_constants_fill_block() {
        let material = MaterialUniforms {
            ambient: vec3(0.1, 0.2, 0.3),
            diffuse: vec3(0.4, 0.5, 0.6),
            specular: vec3(0.7, 0.8, 0.9),
            shininess: 64.0,
            map_mask: 5,
        };

        let bytes = draw_constants(translation(&vec3(1.0, 2.0, 3.0)), &material);

        assert_eq!(bytes.len(), DRAW_CONSTANTS_SIZE);
        // column major, translation lives in the last column
        assert_eq!(f32_at(&bytes, 48), 1.0);
        assert_eq!(f32_at(&bytes, 56), 3.0);
        assert_eq!(f32_at(&bytes, 64), 0.1);
        assert_eq!(f32_at(&bytes, 84), 0.5);
        assert_eq!(f32_at(&bytes, 108), 64.0);
        assert_eq!(u32::from_le_bytes(bytes[112..116].try_into().unwrap()), 5);
    }

    #[test]
    fn scalars_are_little_endian() {
        let bytes = PushConstBuilder::new().add_u32(1).add_f32(2.0).build();

        assert_eq!(&bytes[..4], &[1, 0, 0, 0]);
        assert_eq!(f32_at(&bytes, 4), 2.0);
    }
}
