use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

/// Two triangles spanning the local quad, in draw order.
const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [1.0, 1.0],
];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BillboardVertex {
    /// Local quad corner in {-1, 1}².
    pub corner: [f32; 2],
    /// UV key of the particle this quad draws: (i/N, j/N).
    pub id: [f32; 2],
    /// Half size of the quad in view space.
    pub size: f32,
}

impl BillboardVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BillboardVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Static quads for the whole lattice, six vertices per particle.
#[derive(Debug, Clone)]
pub struct BillboardGeometry {
    vertices: Vec<BillboardVertex>,
}

impl BillboardGeometry {
    /// `sizes` holds one half size per particle, in lattice order (i major).
    pub fn new(grid_size: u32, sizes: &[f32]) -> Self {
        assert_eq!(
            sizes.len(),
            (grid_size * grid_size) as usize,
            "one billboard size per particle"
        );

        let mut vertices = Vec::with_capacity(sizes.len() * QUAD_CORNERS.len());
        let lattice = (0..grid_size).flat_map(|i| (0..grid_size).map(move |j| (i, j)));
        for ((i, j), &size) in lattice.zip(sizes) {
            let id = [i as f32 / grid_size as f32, j as f32 / grid_size as f32];
            vertices.extend(QUAD_CORNERS.iter().map(|&corner| BillboardVertex { corner, id, size }));
        }

        Self { vertices }
    }

    /// Lattice geometry with sizes drawn once from `[0, max_size)`.
    pub fn random(grid_size: u32, max_size: f32, seed: Option<u64>) -> Self {
        let count = (grid_size * grid_size) as usize;
        let sizes = match seed {
            Some(seed) => random_sizes(&mut StdRng::seed_from_u64(seed), count, max_size),
            None => random_sizes(&mut rand::rng(), count, max_size),
        };
        Self::new(grid_size, &sizes)
    }

    pub fn vertices(&self) -> &[BillboardVertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

fn random_sizes(rng: &mut impl Rng, count: usize, max_size: f32) -> Vec<f32> {
    (0..count).map(|_| rng.random::<f32>() * max_size).collect()
}

/// CPU statement of the fragment rule: a texel whose darkest channel still
/// reaches `threshold` counts as background and is not drawn.
pub fn is_chroma_keyed(color: Vec3, threshold: f32) -> bool {
    color.min_element() >= threshold
}
