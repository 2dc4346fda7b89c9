use wgpu::{util::DeviceExt, Buffer, BufferAsyncError};
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::readback::read_staging_buffer;

/// A typed GPU buffer that keeps a CPU copy of what was last uploaded or downloaded.
#[derive(Debug)]
pub struct GpuBuffer<T> {
    data: Vec<T>,
    buffer: wgpu::Buffer,
}

impl<T: bytemuck::Pod> GpuBuffer<T>{
    pub fn new(wgpu_context: &WgpuContext, label: &str, data: Vec<T>, usage: wgpu::BufferUsages) -> Self {
        let buffer = wgpu_context.get_device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data),
            usage: usage | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC,
        });

        Self { data, buffer }
    }

    /// Downloads data from the GPU buffer to the CPU-side `Vec`.
    /// This method will overwrite the contents of `self.data`.
    pub fn download(&mut self, wgpu_context: &WgpuContext) -> Result<&Vec<T>, BufferAsyncError> {
        let device = wgpu_context.get_device();

        let size = std::mem::size_of_val(self.data.as_slice()) as u64;
        if size == 0 {
            return Ok(&self.data);
        }

        // A MAP_READ buffer the CPU can read, filled by a GPU-side copy.
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer (Download)"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Download Encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.buffer, 0, &staging_buffer, 0, size);
        wgpu_context.get_queue().submit(Some(encoder.finish()));

        self.data = read_staging_buffer(wgpu_context, &staging_buffer)?;
        Ok(&self.data)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
