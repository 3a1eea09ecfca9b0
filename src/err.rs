use crate::config::ConfigError;
use crate::import::ImportError;
use crate::mesh::MeshError;
use crate::renderer::ShaderError;
use crate::scene::SceneError;
use crate::texture::TextureError;
use crate::vulkan::VulkanError;
use gpu_allocator::AllocationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    VulkanError(#[from] VulkanError),
    #[error("{0}")]
    VulkanAllocatorError(#[from] AllocationError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("{0}")]
    Other(String),
}
