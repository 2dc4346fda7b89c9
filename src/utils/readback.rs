use wgpu::BufferAsyncError;
use crate::renderer::wgpu_context::WgpuContext;

/// Blocks until `staging` (a `MAP_READ` buffer whose copy is already
/// submitted) is mapped and returns its contents as `T`s.
pub fn read_staging_buffer<T: bytemuck::Pod>(wgpu_context: &WgpuContext, staging: &wgpu::Buffer) -> Result<Vec<T>, BufferAsyncError> {
    let buffer_slice = staging.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver outlives the poll below, so a failed send means nobody is waiting.
        let _ = sender.send(result);
    });

    // Blocks the thread until the copy and the mapping have finished.
    wgpu_context.get_device().poll(wgpu::PollType::Wait).map_err(|_| BufferAsyncError)?;

    receiver.recv().map_err(|_| BufferAsyncError)??;

    let mapped_range = buffer_slice.get_mapped_range();
    let data = bytemuck::pod_collect_to_vec::<u8, T>(&mapped_range);
    drop(mapped_range);
    staging.unmap();
    Ok(data)
}

/// Copies a single-layer texture to the CPU, dropping the row padding wgpu
/// requires for texture-to-buffer copies.
pub fn download_texture<T: bytemuck::Pod>(wgpu_context: &WgpuContext, texture: &wgpu::Texture) -> Result<Vec<T>, BufferAsyncError> {
    let device = wgpu_context.get_device();
    let texel_size = texture.format().block_copy_size(None).ok_or(BufferAsyncError)?;
    let width = texture.width();
    let height = texture.height();

    let unpadded_bytes_per_row = width * texel_size;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Staging Buffer (Texture Download)"),
        size: (padded_bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Texture Download Encoder"),
    });
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &staging_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    wgpu_context.get_queue().submit(Some(encoder.finish()));

    let padded: Vec<u8> = read_staging_buffer(wgpu_context, &staging_buffer)?;
    let mut texels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
    for row in padded.chunks_exact(padded_bytes_per_row as usize) {
        texels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
    }
    Ok(bytemuck::pod_collect_to_vec::<u8, T>(&texels))
}
