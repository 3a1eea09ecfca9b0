use crate::frame::DrawCall;
use crate::mesh::MeshResource;
use crate::texture::{Texture, TextureKind};
use crate::vulkan::{CommandPool, Device, VulkanError, VulkanMesh, VulkanTexture, texture_format};
use ash::vk;
use gpu_allocator::vulkan::Allocator;
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// GPU copies of scene meshes and textures, keyed by resource id.
/// A texture used in both colour and data slots gets one image per format.
pub struct GpuResources {
    meshes: HashMap<u64, VulkanMesh>,
    textures: HashMap<(u64, vk::Format), VulkanTexture>,
    white: VulkanTexture,
    allocator: Arc<Mutex<Allocator>>,
    device: Rc<Device>,
}

impl GpuResources {
    pub fn new(device: Rc<Device>, allocator: Arc<Mutex<Allocator>>, cmd_pool: &CommandPool) -> Result<Self, VulkanError> {
        let white = VulkanTexture::new(
            device.clone(),
            allocator.clone(),
            cmd_pool,
            &Texture::solid("white", [255, 255, 255, 255]),
            vk::Format::R8G8B8A8_UNORM,
        )?;

        Ok(Self {
            meshes: HashMap::new(),
            textures: HashMap::new(),
            white,
            allocator,
            device,
        })
    }

    /// Uploads every mesh and texture `draws` reference that is not on the GPU yet.
    pub fn upload(&mut self, draws: &[DrawCall], cmd_pool: &CommandPool) -> Result<(), VulkanError> {
        for draw in draws {
            self.upload_mesh(&draw.mesh, cmd_pool)?;

            for (kind, texture) in TextureKind::ALL.into_iter().zip(&draw.textures) {
                if let Some(texture) = texture {
                    self.upload_texture(texture, texture_format(kind), cmd_pool)?;
                }
            }
        }

        Ok(())
    }

    fn upload_mesh(&mut self, mesh: &MeshResource, cmd_pool: &CommandPool) -> Result<(), VulkanError> {
        if self.meshes.contains_key(&mesh.id) {
            return Ok(());
        }

        let gpu = VulkanMesh::new(self.device.clone(), self.allocator.clone(), cmd_pool, mesh)?;
        debug!("uploaded mesh {} ({} elements)", mesh.name, gpu.draw_count);
        self.meshes.insert(mesh.id, gpu);

        Ok(())
    }

    fn upload_texture(&mut self, texture: &Texture, format: vk::Format, cmd_pool: &CommandPool) -> Result<(), VulkanError> {
        let key = (texture.id, format);
        if self.textures.contains_key(&key) {
            return Ok(());
        }

        let gpu = VulkanTexture::new(self.device.clone(), self.allocator.clone(), cmd_pool, texture, format)?;
        debug!("uploaded texture {} {}x{} as {format:?}", texture.name, texture.width, texture.height);
        self.textures.insert(key, gpu);

        Ok(())
    }

    pub fn mesh(&self, id: u64) -> Option<&VulkanMesh> {
        self.meshes.get(&id)
    }

    /// Image infos for the three material slots; empty slots sample the white texture.
    pub fn image_infos(&self, ids: [Option<u64>; 3]) -> [vk::DescriptorImageInfo; 3] {
        std::array::from_fn(|slot| {
            let format = texture_format(TextureKind::ALL[slot]);
            ids[slot]
                .and_then(|id| self.textures.get(&(id, format)))
                .unwrap_or(&self.white)
                .descriptor_info()
        })
    }
}
