use glam::Vec4;
use wgpu::BufferAsyncError;

use crate::error::PipelineError;
use crate::renderer::wgpu_context::WgpuContext;
use crate::utils::readback::download_texture;

/// Texel format of the simulation state: xyz is the world position, w is 1.
pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

const STATE_TEXEL_SIZE: u32 = 16;

/// Ring slot written at `tick`.
pub fn write_slot(tick: u64, history: u32) -> usize {
    (tick % history as u64) as usize
}

/// Ring slot holding the state `offset` ticks before `tick`.
pub fn read_slot(tick: u64, offset: u32, history: u32) -> usize {
    debug_assert!(
        offset >= 1 && offset < history,
        "read offset {offset} is outside [1, {history})"
    );
    let history = history as u64;
    ((tick % history + history - offset as u64) % history) as usize
}

/// Lattice positions on the unit sphere, with θ = i/N·2π and φ = j/N·2π.
pub fn sphere_seed(grid_size: u32) -> impl Fn(u32, u32) -> Vec4 {
    move |i, j| {
        let theta = i as f32 / grid_size as f32 * std::f32::consts::TAU;
        let phi = j as f32 / grid_size as f32 * std::f32::consts::TAU;
        Vec4::new(
            theta.cos() * phi.cos(),
            theta.sin() * phi.cos(),
            phi.sin(),
            1.0,
        )
    }
}

/// Evaluates `seed_fn` for every lattice index in texel order:
/// particle (i, j) lives at texel x = i, y = j.
pub fn seed_texels(grid_size: u32, seed_fn: impl Fn(u32, u32) -> Vec4) -> Vec<Vec4> {
    (0..grid_size)
        .flat_map(|j| (0..grid_size).map(move |i| (i, j)))
        .map(|(i, j)| seed_fn(i, j))
        .collect()
}

pub struct StateTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl StateTexture {
    fn new(wgpu_context: &WgpuContext, grid_size: u32, slot: usize) -> Self {
        let texture = wgpu_context.get_device().create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("State Texture {slot}")),
            size: Self::extent(grid_size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STATE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn extent(grid_size: u32) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: grid_size,
            height: grid_size,
            depth_or_array_layers: 1,
        }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// The last T simulation states, kept as an arena of textures indexed by
/// `tick mod T`. The slot written at a tick is never one of the two it reads.
pub struct StateTextureRing {
    slots: Box<[StateTexture]>,
    grid_size: u32,
}

impl StateTextureRing {
    /// Creates `history` N×N state textures, all seeded with `seed_fn` so the
    /// swarm starts at rest.
    pub async fn allocate(
        wgpu_context: &WgpuContext,
        history: u32,
        grid_size: u32,
        seed_fn: impl Fn(u32, u32) -> Vec4,
    ) -> Result<Self, PipelineError> {
        if history < 3 {
            return Err(PipelineError::InvalidConfig(format!(
                "a state ring needs at least 3 slots, got {history}"
            )));
        }
        let max_dimension = wgpu_context.get_device().limits().max_texture_dimension_2d;
        if grid_size == 0 || grid_size > max_dimension {
            return Err(PipelineError::InvalidConfig(format!(
                "grid size {grid_size} is outside [1, {max_dimension}]"
            )));
        }

        let device = wgpu_context.get_device();
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let slots: Box<[StateTexture]> = (0..history as usize)
            .map(|slot| StateTexture::new(wgpu_context, grid_size, slot))
            .collect();
        if let Some(error) = device.pop_error_scope().await {
            return Err(PipelineError::ResourceExhausted(error.to_string()));
        }

        let ring = Self { slots, grid_size };
        ring.reseed(wgpu_context, seed_fn);
        log::info!("Allocated {history} state textures of {grid_size}x{grid_size}");
        Ok(ring)
    }

    /// Writes the same seed into every slot, resetting all history.
    pub fn reseed(&self, wgpu_context: &WgpuContext, seed_fn: impl Fn(u32, u32) -> Vec4) {
        let texels = seed_texels(self.grid_size, seed_fn);
        for slot in self.slots.iter() {
            self.upload(wgpu_context, slot, &texels);
        }
    }

    /// Overwrites one slot, e.g. to stage a specific history.
    pub fn write_slot_texels(&self, wgpu_context: &WgpuContext, slot: usize, texels: &[Vec4]) {
        self.upload(wgpu_context, &self.slots[slot], texels);
    }

    fn upload(&self, wgpu_context: &WgpuContext, slot: &StateTexture, texels: &[Vec4]) {
        assert_eq!(
            texels.len(),
            (self.grid_size * self.grid_size) as usize,
            "state upload must cover the whole lattice"
        );
        wgpu_context.get_queue().write_texture(
            slot.texture.as_image_copy(),
            bytemuck::cast_slice(texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.grid_size * STATE_TEXEL_SIZE),
                rows_per_image: Some(self.grid_size),
            },
            StateTexture::extent(self.grid_size),
        );
    }

    pub fn buffer_for_write(&self, tick: u64) -> &StateTexture {
        &self.slots[self.write_slot(tick)]
    }

    pub fn buffer_for_read(&self, tick: u64, offset: u32) -> &StateTexture {
        &self.slots[self.read_slot(tick, offset)]
    }

    pub fn write_slot(&self, tick: u64) -> usize {
        write_slot(tick, self.history())
    }

    pub fn read_slot(&self, tick: u64, offset: u32) -> usize {
        read_slot(tick, offset, self.history())
    }

    pub fn slot(&self, index: usize) -> &StateTexture {
        &self.slots[index]
    }

    pub fn history(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Reads a slot back in texel order (see [`seed_texels`]).
    pub fn download(&self, wgpu_context: &WgpuContext, slot: usize) -> Result<Vec<Vec4>, BufferAsyncError> {
        download_texture(wgpu_context, &self.slots[slot].texture)
    }
}
