use crate::light::{DirectionalLight, MAX_POINT_LIGHTS, PointLight};
use crate::material::MaterialUniforms;
use crate::mesh::MeshResource;
use crate::object::ObjectId;
use crate::shader::ShadingModel;
use crate::texture::{Texture, TextureKind};
use nalgebra_glm::{Mat4, Vec3};
use std::rc::Rc;

/// Everything one frame needs, independent of the GPU API that draws it.
pub struct FramePacket {
    pub uniforms: FrameUniforms,
    pub draws: Vec<DrawCall>,
    pub clear_color: [f32; 4],
}

#[derive(Clone)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub dir_light: DirectionalLight,
    pub point_lights: Vec<PointLight>,
}

impl FrameUniforms {
    pub fn point_light_count(&self) -> usize {
        self.point_lights.len().min(MAX_POINT_LIGHTS)
    }

    /// std140 image of the `Frame` uniform block.
    pub fn to_bytes(&self, flip_y: bool) -> Vec<u8> {
        let mut projection = self.projection;
        if flip_y {
            projection.m22 *= -1.0;
        }

        let mut point_lights = [PointLightGpu::default(); MAX_POINT_LIGHTS];
        for (gpu, light) in point_lights.iter_mut().zip(&self.point_lights) {
            *gpu = PointLightGpu {
                position: vec4(&light.position, 1.0),
                ambient: vec4(&light.ambient, 0.0),
                diffuse: vec4(&light.diffuse, 0.0),
                specular: vec4(&light.specular, 0.0),
                attenuation: [light.constant, light.linear, light.quadratic, 0.0],
            };
        }

        let gpu = FrameUniformsGpu {
            view: self.view,
            projection,
            camera_position: vec4(&self.camera_position, 1.0),
            dir_light: DirLightGpu {
                direction: vec4(&self.dir_light.direction, 0.0),
                ambient: vec4(&self.dir_light.ambient, 0.0),
                diffuse: vec4(&self.dir_light.diffuse, 0.0),
                specular: vec4(&self.dir_light.specular, 0.0),
            },
            point_lights,
            counts: [self.point_light_count() as i32, 0, 0, 0],
        };

        let size = size_of::<FrameUniformsGpu>();
        unsafe { core::slice::from_raw_parts(&gpu as *const FrameUniformsGpu as *const u8, size).to_owned() }
    }
}

fn vec4(v: &Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}

#[repr(C)]
#[derive(Copy, Clone, Default)]
struct DirLightGpu {
    direction: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Default)]
struct PointLightGpu {
    position: [f32; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 4],
    attenuation: [f32; 4],
}

#[repr(C)]
struct FrameUniformsGpu {
    view: Mat4,
    projection: Mat4,
    camera_position: [f32; 4],
    dir_light: DirLightGpu,
    point_lights: [PointLightGpu; MAX_POINT_LIGHTS],
    counts: [i32; 4],
}

pub const FRAME_UNIFORMS_SIZE: usize = size_of::<FrameUniformsGpu>();

pub struct DrawCall {
    /// `None` for light gizmos.
    pub object_id: Option<ObjectId>,
    pub mesh: Rc<MeshResource>,
    pub shading: ShadingModel,
    pub wireframe: bool,
    pub model: Mat4,
    pub material: MaterialUniforms,
    pub textures: [Option<Rc<Texture>>; 3],
}

impl DrawCall {
    pub fn mesh_id(&self) -> u64 {
        self.mesh.id
    }

    pub fn draw_count(&self) -> u32 {
        self.mesh.draw_count()
    }

    pub fn indexed(&self) -> bool {
        self.mesh.is_indexed()
    }

    pub fn texture(&self, kind: TextureKind) -> Option<&Rc<Texture>> {
        self.textures[kind.slot()].as_ref()
    }

    pub fn texture_ids(&self) -> [Option<u64>; 3] {
        [0, 1, 2].map(|i| self.textures[i].as_ref().map(|t| t.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_glm::vec3;

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn uniforms(lights: usize) -> FrameUniforms {
        FrameUniforms {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            camera_position: vec3(1.0, 2.0, 3.0),
            dir_light: DirectionalLight::default(),
            point_lights: (0..lights).map(|_| PointLight::default()).collect(),
        }
    }

    #[test]
    fn block_matches_std140_size() {
        // 2 mat4 + vec4 + 4 vec4 + 8 * 5 vec4 + ivec4
        assert_eq!(FRAME_UNIFORMS_SIZE, 128 + 16 + 64 + 8 * 80 + 16);
        assert_eq!(uniforms(0).to_bytes(false).len(), FRAME_UNIFORMS_SIZE);
    }

    #[test]
    fn camera_and_count_land_at_their_offsets() {
        let bytes = uniforms(3).to_bytes(false);

        assert_eq!(read_f32(&bytes, 128), 1.0);
        assert_eq!(read_f32(&bytes, 132), 2.0);
        assert_eq!(read_f32(&bytes, 136), 3.0);

        let count_offset = FRAME_UNIFORMS_SIZE - 16;
        assert_eq!(i32::from_le_bytes(bytes[count_offset..count_offset + 4].try_into().unwrap()), 3);
    }

    #[test]
    fn point_light_attenuation_is_packed() {
        let bytes = uniforms(1).to_bytes(false);
        let attenuation = 128 + 16 + 64 + 64;

        assert_eq!(read_f32(&bytes, attenuation), 1.0);
        assert_eq!(read_f32(&bytes, attenuation + 4), 0.09);
        assert_eq!(read_f32(&bytes, attenuation + 8), 0.032);
    }

    #[test]
    fn flip_negates_projection_y() {
        let bytes = uniforms(0).to_bytes(true);
        // column 1, row 1 of the projection matrix
        assert_eq!(read_f32(&bytes, 64 + 5 * 4), -1.0);
    }

    #[test]
    fn count_is_capped() {
        assert_eq!(uniforms(12).point_light_count(), MAX_POINT_LIGHTS);
    }
}
