use crate::err::AppError;
use crate::frame::{DrawCall, FRAME_UNIFORMS_SIZE, FramePacket};
use crate::vulkan::{Buffer, CommandBuffer, DescriptorSet, Fence, ImageBarrier, IntoVulkanError, Semaphore};
use ash::vk;
use gpu_allocator::MemoryLocation;
use log::{error, info, warn};
use sdl2::video::Window;
use std::io::Cursor;
use std::rc::Rc;
use zip::ZipArchive;

mod context;
use context::VulkanContext;

mod descriptors;
use descriptors::{DescLayout, DescriptorWriter, RendererDescriptors};

mod pipeline_builder;
use pipeline_builder::PipelineBuilder;

mod push_const;

mod render_target;
use render_target::{DEPTH_FORMAT, RenderTarget};

mod resources;
use resources::GpuResources;

mod shader_archive;
pub use shader_archive::ShaderError;
use shader_archive::ShaderArchive;

pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

static SHADER_ARCHIVE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/shaders.zip"));

pub struct VulkanRenderer {
    pipelines: PipelineBuilder,
    descriptors: RendererDescriptors,
    resources: GpuResources,
    uniform_buffers: Vec<Buffer>,
    depth: RenderTarget,
    command_buffers: Vec<CommandBuffer>,
    img_available: Vec<Semaphore>,
    render_finished: Vec<Semaphore>,
    in_flight: Vec<Fence>,
    current_frame: usize,
    context: Rc<VulkanContext>,
}

impl VulkanRenderer {
    pub fn init(window: &Window, imgui: &mut imgui::Context, validation: bool, vsync: bool) -> Result<Self, AppError> {
        let context = Rc::new(VulkanContext::init(window, imgui, validation, vsync)?);
        let device = context.device.clone();

        let archive = ZipArchive::new(Cursor::new(SHADER_ARCHIVE)).map_err(ShaderError::from)?;
        let shaders = ShaderArchive::from_zip(archive)?;

        let descriptors = RendererDescriptors::build(device.clone(), MAX_FRAMES_IN_FLIGHT as u32)?;

        let (color_format, extent, image_count) = {
            let swap_chain = context.swap_chain.borrow();
            (swap_chain.format.format, swap_chain.extent, swap_chain.images.len())
        };

        let pipelines = PipelineBuilder::build(
            &shaders,
            device.clone(),
            color_format,
            DEPTH_FORMAT,
            &[
                descriptors.get_layout(DescLayout::Frame),
                descriptors.get_layout(DescLayout::Material),
            ],
        )?;

        let resources = GpuResources::new(device.clone(), context.allocator.clone(), &context.graphics_command_pool)?;

        let uniform_buffers = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| {
                Buffer::new(
                    device.clone(),
                    context.allocator.clone(),
                    MemoryLocation::CpuToGpu,
                    vk::BufferUsageFlags::UNIFORM_BUFFER,
                    FRAME_UNIFORMS_SIZE as u64,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let writes = descriptors
            .frame_sets
            .iter()
            .zip(&uniform_buffers)
            .map(|(set, buffer)| set.update_frame(buffer))
            .collect();
        DescriptorWriter::batch_write(&device, writes);

        let depth = RenderTarget::new_depth(device.clone(), context.allocator.clone(), extent)?;

        let command_buffers = context
            .graphics_command_pool
            .allocate_cmd_buffers(MAX_FRAMES_IN_FLIGHT as u32)?;

        let img_available = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| Semaphore::new(device.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let render_finished = (0..image_count)
            .map(|_| Semaphore::new(device.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let in_flight = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| Fence::new(device.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        info!("renderer ready, {} swapchain images", image_count);

        Ok(Self {
            pipelines,
            descriptors,
            resources,
            uniform_buffers,
            depth,
            command_buffers,
            img_available,
            render_finished,
            in_flight,
            current_frame: 0,
            context,
        })
    }

    pub fn render_frame(
        &mut self,
        packet: &FramePacket,
        draw_data: &imgui::DrawData,
        drawable_size: (u32, u32),
    ) -> Result<(), AppError> {
        if drawable_size.0 == 0 || drawable_size.1 == 0 {
            return Ok(());
        }

        self.in_flight[self.current_frame].wait()?;

        self.resources
            .upload(&packet.draws, &self.context.graphics_command_pool)?;

        let material_sets = packet
            .draws
            .iter()
            .map(|draw| {
                let ids = draw.texture_ids();
                self.descriptors.material_set(ids, self.resources.image_infos(ids))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let acquired = self
            .context
            .swap_chain
            .borrow()
            .acquire_next_image(&self.img_available[self.current_frame]);

        let image_index = match acquired {
            Ok((index, _)) => index,
            Err(e) if e.is_out_of_date() => {
                self.resize(drawable_size)?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.in_flight[self.current_frame].reset()?;

        self.uniform_buffers[self.current_frame].fill_host(&packet.uniforms.to_bytes(true))?;

        let command_buffer = &self.command_buffers[self.current_frame];
        command_buffer.reset()?;
        command_buffer.begin()?;

        self.record_frame(command_buffer, packet, &material_sets, image_index, draw_data)?;

        command_buffer.end()?;

        let wait_semaphores = [self.img_available[self.current_frame].inner];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.render_finished[image_index as usize].inner];

        let submit_info = vk::SubmitInfo {
            wait_semaphore_count: 1,
            p_wait_semaphores: wait_semaphores.as_ptr(),
            p_wait_dst_stage_mask: wait_stages.as_ptr(),
            command_buffer_count: 1,
            p_command_buffers: &command_buffer.inner,
            signal_semaphore_count: 1,
            p_signal_semaphores: signal_semaphores.as_ptr(),
            ..Default::default()
        };

        unsafe {
            self.context
                .device
                .inner
                .queue_submit(
                    self.context.device.graphics_queue,
                    &[submit_info],
                    self.in_flight[self.current_frame].inner,
                )
                .map_to_err("failed to submit to queue")?
        };

        let presented = self.context.swap_chain.borrow().present(
            self.context.device.present_queue,
            image_index,
            &self.render_finished[image_index as usize],
        );

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        match presented {
            Ok(false) => Ok(()),
            Ok(true) => self.resize(drawable_size),
            Err(e) if e.is_out_of_date() => self.resize(drawable_size),
            Err(e) => Err(e.into()),
        }
    }

    pub fn resize(&mut self, drawable_size: (u32, u32)) -> Result<(), AppError> {
        if drawable_size.0 == 0 || drawable_size.1 == 0 {
            return Ok(());
        }

        self.context.recreate_swapchain(drawable_size)?;

        let (extent, image_count) = {
            let swap_chain = self.context.swap_chain.borrow();
            (swap_chain.extent, swap_chain.images.len())
        };

        self.depth.resize(extent)?;

        if image_count != self.render_finished.len() {
            self.render_finished = (0..image_count)
                .map(|_| Semaphore::new(self.context.device.clone()))
                .collect::<Result<Vec<_>, _>>()?;
        }

        info!("resized to {}x{}", extent.width, extent.height);

        Ok(())
    }

    fn record_frame(
        &self,
        command_buffer: &CommandBuffer,
        packet: &FramePacket,
        material_sets: &[DescriptorSet],
        image_index: u32,
        draw_data: &imgui::DrawData,
    ) -> Result<(), AppError> {
        let device = &self.context.device;
        let swap_chain = self.context.swap_chain.borrow();
        let image = swap_chain.images[image_index as usize];
        let views = self.context.swap_chain_image_views.borrow();
        let view = views[image_index as usize].inner;
        let extent = swap_chain.extent;

        command_buffer.image_barrier(ImageBarrier {
            image,
            aspect: vk::ImageAspectFlags::COLOR,
            old_layout: vk::ImageLayout::UNDEFINED,
            new_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            src_access: vk::AccessFlags::empty(),
            dst_access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            src_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        });

        command_buffer.image_barrier(ImageBarrier {
            image: self.depth.image.inner,
            aspect: vk::ImageAspectFlags::DEPTH,
            old_layout: vk::ImageLayout::UNDEFINED,
            new_layout: vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
            src_access: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dst_access: vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            src_stage: vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
            dst_stage: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        });

        let render_area = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        };

        device.begin_label("scene", command_buffer);

        let color_attachment = vk::RenderingAttachmentInfo {
            image_view: view,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: packet.clear_color,
                },
            },
            ..Default::default()
        };

        let depth_attachment = vk::RenderingAttachmentInfo {
            image_view: self.depth.view.inner,
            image_layout: vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::DONT_CARE,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
            ..Default::default()
        };

        command_buffer.begin_rendering(&vk::RenderingInfo {
            render_area,
            layer_count: 1,
            color_attachment_count: 1,
            p_color_attachments: &color_attachment,
            p_depth_attachment: &depth_attachment,
            ..Default::default()
        });

        command_buffer.set_viewport(vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        command_buffer.set_scissor(render_area);

        let frame_set = &self.descriptors.frame_sets[self.current_frame].inner;

        for (draw, material_set) in packet.draws.iter().zip(material_sets) {
            self.record_draw(command_buffer, draw, frame_set, material_set);
        }

        command_buffer.end_rendering();
        device.end_label(command_buffer);

        device.begin_label("ui", command_buffer);

        let ui_attachment = vk::RenderingAttachmentInfo {
            image_view: view,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            load_op: vk::AttachmentLoadOp::LOAD,
            store_op: vk::AttachmentStoreOp::STORE,
            ..Default::default()
        };

        command_buffer.begin_rendering(&vk::RenderingInfo {
            render_area,
            layer_count: 1,
            color_attachment_count: 1,
            p_color_attachments: &ui_attachment,
            ..Default::default()
        });

        self.context
            .imgui_renderer
            .borrow_mut()
            .cmd_draw(command_buffer.inner, draw_data)
            .map_err(|e| AppError::Other(format!("cannot draw ui: {e}")))?;

        command_buffer.end_rendering();
        device.end_label(command_buffer);

        command_buffer.image_barrier(ImageBarrier {
            image,
            aspect: vk::ImageAspectFlags::COLOR,
            old_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            new_layout: vk::ImageLayout::PRESENT_SRC_KHR,
            src_access: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access: vk::AccessFlags::empty(),
            src_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            dst_stage: vk::PipelineStageFlags::BOTTOM_OF_PIPE,
        });

        Ok(())
    }

    fn record_draw(
        &self,
        command_buffer: &CommandBuffer,
        draw: &DrawCall,
        frame_set: &DescriptorSet,
        material_set: &DescriptorSet,
    ) {
        let Some(pipeline) = self.pipelines.get(draw.shading, draw.wireframe) else {
            warn!("no pipeline for {:?}", draw.shading);
            return;
        };

        let Some(mesh) = self.resources.mesh(draw.mesh_id()) else {
            warn!("mesh {} was not uploaded", draw.mesh.name);
            return;
        };

        command_buffer.bind_graphics_pipeline(pipeline);
        command_buffer.bind_descriptor_sets(pipeline, 0, &[frame_set, material_set]);
        command_buffer.push_constants(pipeline, &push_const::draw_constants(draw.model, &draw.material));
        command_buffer.bind_vertex_buffer(&mesh.vertex_buffer, 0);

        match &mesh.index_buffer {
            Some((buffer, index_type)) => {
                command_buffer.bind_index_buffer(buffer, 0, *index_type);
                command_buffer.draw_indexed(mesh.draw_count);
            }
            None => command_buffer.draw(mesh.draw_count),
        }
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.context.device.wait_idle() {
            error!("cannot wait for device before teardown: {e}");
        }
    }
}
