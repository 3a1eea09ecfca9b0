use crate::mesh::{Indices, MeshResource};
use crate::vulkan::{Buffer, CommandPool, DebugMarker, Device, VulkanError};
use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::Allocator;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// Device local copy of a [`MeshResource`].
pub struct VulkanMesh {
    pub vertex_buffer: Buffer,
    pub index_buffer: Option<(Buffer, vk::IndexType)>,
    pub draw_count: u32,
}

impl VulkanMesh {
    pub fn new(
        device: Rc<Device>,
        allocator: Arc<Mutex<Allocator>>,
        cmd_pool: &CommandPool,
        mesh: &MeshResource,
    ) -> Result<Self, VulkanError> {
        let vertex_bytes = unsafe {
            std::slice::from_raw_parts(
                mesh.vertices.as_ptr() as *const u8,
                std::mem::size_of_val(mesh.vertices.as_slice()),
            )
        };

        let vertex_buffer = upload(
            device.clone(),
            allocator.clone(),
            cmd_pool,
            vertex_bytes,
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;
        vertex_buffer.name(format!("{} vertices", mesh.name))?;

        let index_buffer = match &mesh.indices {
            Some(indices) => {
                let (bytes, index_type) = index_bytes(indices);
                let buffer = upload(device, allocator, cmd_pool, bytes, vk::BufferUsageFlags::INDEX_BUFFER)?;
                buffer.name(format!("{} indices", mesh.name))?;

                Some((buffer, index_type))
            }
            None => None,
        };

        Ok(Self {
            vertex_buffer,
            index_buffer,
            draw_count: mesh.draw_count(),
        })
    }
}

fn index_bytes(indices: &Indices) -> (&[u8], vk::IndexType) {
    match indices {
        Indices::U16(v) => (
            unsafe { std::slice::from_raw_parts(v.as_ptr() as *const u8, std::mem::size_of_val(v.as_slice())) },
            vk::IndexType::UINT16,
        ),
        Indices::U32(v) => (
            unsafe { std::slice::from_raw_parts(v.as_ptr() as *const u8, std::mem::size_of_val(v.as_slice())) },
            vk::IndexType::UINT32,
        ),
    }
}

/// Copies `data` to a new device local buffer through a host visible staging buffer.
fn upload(
    device: Rc<Device>,
    allocator: Arc<Mutex<Allocator>>,
    cmd_pool: &CommandPool,
    data: &[u8],
    usage: vk::BufferUsageFlags,
) -> Result<Buffer, VulkanError> {
    // zero sized buffers are invalid
    let size = data.len().max(4) as u64;

    let mut staging = Buffer::new(
        device.clone(),
        allocator.clone(),
        MemoryLocation::CpuToGpu,
        vk::BufferUsageFlags::TRANSFER_SRC,
        size,
    )?;
    staging.fill_host(data)?;

    let buffer = Buffer::new(
        device,
        allocator,
        MemoryLocation::GpuOnly,
        usage | vk::BufferUsageFlags::TRANSFER_DST,
        size,
    )?;

    cmd_pool.one_time_submit(|cmd| cmd.copy_buffer(&staging, &buffer, size))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_bytes_keep_width() {
        let small = Indices::U16(vec![0, 1, 2]);
        let (bytes, ty) = index_bytes(&small);
        assert_eq!(bytes.len(), 6);
        assert_eq!(ty, vk::IndexType::UINT16);

        let wide = Indices::U32(vec![0, 1, 2]);
        let (bytes, ty) = index_bytes(&wide);
        assert_eq!(bytes.len(), 12);
        assert_eq!(ty, vk::IndexType::UINT32);
    }
}
