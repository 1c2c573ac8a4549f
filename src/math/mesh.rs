use bytemuck::{Pod, Zeroable};

use crate::error::MeshError;
use crate::math::surface::SurfaceParams;

pub const DEFAULT_NORMAL_LENGTH: f32 = 0.2;

/// Deepest tessellation level whose vertex count still fits 32-bit indices.
pub const MAX_TESSELLATION: u32 = 15;

/// Interleaved vertex for the fixed pipeline: position followed by normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LitVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Raw surface coordinate for the programmable pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct UvVertex {
    pub uv: [f32; 2],
}

/// One endpoint of a normal-visualisation segment.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
}

/// Sample counts along u and v. Always at least 2x2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridResolution {
    count_u: usize,
    count_v: usize,
}

impl GridResolution {
    pub const MIN_COUNT: usize = 2;

    pub fn new(count_u: usize, count_v: usize) -> Result<Self, MeshError> {
        if count_u < Self::MIN_COUNT || count_v < Self::MIN_COUNT {
            return Err(MeshError::InvalidResolution { count_u, count_v });
        }

        match count_u.checked_mul(count_v) {
            Some(count) if count <= u32::MAX as usize => Ok(Self { count_u, count_v }),
            Some(count) => Err(MeshError::TooManyVertices { count }),
            None => Err(MeshError::TooManyVertices { count: usize::MAX }),
        }
    }

    /// `2^level + 1` samples on both axes.
    pub fn from_tessellation(level: u32) -> Result<Self, MeshError> {
        let count = 1usize
            .checked_shl(level)
            .and_then(|n| n.checked_add(1))
            .ok_or(MeshError::TooManyVertices { count: usize::MAX })?;
        Self::new(count, count)
    }

    pub fn count_u(&self) -> usize {
        self.count_u
    }

    pub fn count_v(&self) -> usize {
        self.count_v
    }

    pub fn vertex_count(&self) -> usize {
        self.count_u * self.count_v
    }

    pub fn index_count(&self) -> usize {
        (self.count_v - 1) * (self.count_u * 2 + 2)
    }

    /// Row-major with stride `count_v`.
    pub fn index(&self, i: usize, j: usize) -> u32 {
        (i * self.count_v + j) as u32
    }
}

/// Range of (u, v) swept by the sampling grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvDomain {
    pub u: (f32, f32),
    pub v: (f32, f32),
}

impl Default for UvDomain {
    fn default() -> Self {
        Self {
            u: (0.0, 1.0),
            v: (0.0, 1.0),
        }
    }
}

impl UvDomain {
    pub fn u_at(&self, i: usize, resolution: &GridResolution) -> f32 {
        lerp_step(self.u, i, resolution.count_u)
    }

    pub fn v_at(&self, j: usize, resolution: &GridResolution) -> f32 {
        lerp_step(self.v, j, resolution.count_v)
    }
}

fn lerp_step(range: (f32, f32), step: usize, count: usize) -> f32 {
    let t = step as f32 / (count - 1) as f32;
    range.0 + (range.1 - range.0) * t
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshVariant {
    /// Positions and normals computed here, plus normal-visualisation lines.
    CpuLit,
    /// Only raw (u, v) per vertex; the shader evaluates the surface.
    ShaderDriven,
}

/// Explicit inputs for a build besides the shape and resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshConfig {
    pub variant: MeshVariant,
    pub normal_length: f32,
    pub domain: UvDomain,
    /// Threads used for grid sampling. 1 samples on the calling thread.
    pub workers: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            variant: MeshVariant::CpuLit,
            normal_length: DEFAULT_NORMAL_LENGTH,
            domain: UvDomain::default(),
            workers: 1,
        }
    }
}

pub struct LitMeshData {
    pub vertices: Vec<LitVertex>,
    pub normal_lines: Vec<LineVertex>,
    pub indices: Vec<u32>,
}

pub struct UvMeshData {
    pub vertices: Vec<UvVertex>,
    pub indices: Vec<u32>,
}

/// CPU-side staging arrays for one build, dropped once uploaded.
pub enum MeshData {
    Lit(LitMeshData),
    Uv(UvMeshData),
}

impl MeshData {
    pub fn indices(&self) -> &[u32] {
        match self {
            MeshData::Lit(data) => &data.indices,
            MeshData::Uv(data) => &data.indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            MeshData::Lit(data) => data.vertices.len(),
            MeshData::Uv(data) => data.vertices.len(),
        }
    }
}

pub fn build_mesh_data(
    params: &SurfaceParams,
    resolution: GridResolution,
    config: &MeshConfig,
) -> Result<MeshData, MeshError> {
    let data = match config.variant {
        MeshVariant::CpuLit => MeshData::Lit(build_lit_data(params, resolution, config)?),
        MeshVariant::ShaderDriven => MeshData::Uv(build_uv_data(resolution, config)?),
    };

    log::debug!(
        "sampled {:?} at {}x{}: {} vertices, {} indices",
        params.kind(),
        resolution.count_u(),
        resolution.count_v(),
        data.vertex_count(),
        data.indices().len(),
    );

    Ok(data)
}

pub fn build_lit_data(
    params: &SurfaceParams,
    resolution: GridResolution,
    config: &MeshConfig,
) -> Result<LitMeshData, MeshError> {
    let count_v = resolution.count_v();
    let domain = config.domain;

    let mut vertices = staging::<LitVertex>(resolution.vertex_count())?;
    fill_rows(&mut vertices, count_v, config.workers, |i, row| {
        let u = domain.u_at(i, &resolution);
        for (j, vertex) in row.iter_mut().enumerate() {
            let sample = params.evaluate(u, domain.v_at(j, &resolution));
            *vertex = LitVertex {
                position: sample.position.to_array(),
                normal: sample.normal.to_array(),
            };
        }
    })?;

    let length = config.normal_length;
    let mut normal_lines = staging::<LineVertex>(resolution.vertex_count() * 2)?;
    {
        let vertices = &vertices;
        fill_rows(&mut normal_lines, count_v * 2, config.workers, |i, row| {
            let samples = &vertices[i * count_v..(i + 1) * count_v];
            for (segment, vertex) in row.chunks_exact_mut(2).zip(samples) {
                let base = glam::Vec3::from_array(vertex.position);
                let tip = base + glam::Vec3::from_array(vertex.normal) * length;
                segment[0].position = vertex.position;
                segment[1].position = tip.to_array();
            }
        })?;
    }

    Ok(LitMeshData {
        vertices,
        normal_lines,
        indices: strip_indices(resolution)?,
    })
}

pub fn build_uv_data(
    resolution: GridResolution,
    config: &MeshConfig,
) -> Result<UvMeshData, MeshError> {
    let domain = config.domain;

    let mut vertices = staging::<UvVertex>(resolution.vertex_count())?;
    fill_rows(&mut vertices, resolution.count_v(), config.workers, |i, row| {
        let u = domain.u_at(i, &resolution);
        for (j, vertex) in row.iter_mut().enumerate() {
            vertex.uv = [u, domain.v_at(j, &resolution)];
        }
    })?;

    Ok(UvMeshData {
        vertices,
        indices: strip_indices(resolution)?,
    })
}

/// Index sequence drawing the whole grid as one triangle strip.
///
/// Each row of cells is a zig-zag between columns `j` and `j + 1`, opened and
/// closed by a repeated index so the zero-area triangles bridge to the next row.
pub fn strip_indices(resolution: GridResolution) -> Result<Vec<u32>, MeshError> {
    let (count_u, count_v) = (resolution.count_u(), resolution.count_v());
    debug_assert!(count_u >= GridResolution::MIN_COUNT && count_v >= GridResolution::MIN_COUNT);

    let mut indices = Vec::new();
    indices.try_reserve_exact(resolution.index_count())?;

    for j in 0..count_v - 1 {
        indices.push(resolution.index(0, j));
        for i in 0..count_u {
            indices.push(resolution.index(i, j));
            indices.push(resolution.index(i, j + 1));
        }
        indices.push(resolution.index(count_u - 1, j + 1));
    }

    debug_assert_eq!(indices.len(), resolution.index_count());
    Ok(indices)
}

fn staging<T: Zeroable + Clone>(len: usize) -> Result<Vec<T>, MeshError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, T::zeroed());
    Ok(data)
}

/// Calls `fill(i, row)` for every `row_len`-sized row of `data`, splitting
/// contiguous runs of rows across scoped worker threads.
fn fill_rows<T, F>(data: &mut [T], row_len: usize, workers: usize, fill: F) -> Result<(), MeshError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    let rows = data.len() / row_len;
    let workers = workers.clamp(1, rows.max(1));

    if workers == 1 {
        for (i, row) in data.chunks_exact_mut(row_len).enumerate() {
            fill(i, row);
        }
        return Ok(());
    }

    let rows_per_worker = rows.div_ceil(workers);
    let fill = &fill;

    crossbeam::thread::scope(|scope| {
        for (chunk_index, chunk) in data.chunks_mut(rows_per_worker * row_len).enumerate() {
            let first_row = chunk_index * rows_per_worker;
            scope.spawn(move |_| {
                for (offset, row) in chunk.chunks_exact_mut(row_len).enumerate() {
                    fill(first_row + offset, row);
                }
            });
        }
    })
    .map_err(|_| MeshError::WorkerPanicked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::collections::HashMap;

    fn res(count_u: usize, count_v: usize) -> GridResolution {
        GridResolution::new(count_u, count_v).unwrap()
    }

    fn lit(params: SurfaceParams, resolution: GridResolution, workers: usize) -> LitMeshData {
        let config = MeshConfig {
            workers,
            ..MeshConfig::default()
        };
        build_lit_data(&params, resolution, &config).unwrap()
    }

    #[test]
    fn tessellation_level_maps_to_power_of_two_plus_one() {
        let r = GridResolution::from_tessellation(1).unwrap();
        assert_eq!((r.count_u(), r.count_v()), (3, 3));
        let r = GridResolution::from_tessellation(4).unwrap();
        assert_eq!((r.count_u(), r.count_v()), (17, 17));
        let r = GridResolution::from_tessellation(0).unwrap();
        assert_eq!((r.count_u(), r.count_v()), (2, 2));
    }

    #[test]
    fn resolution_below_minimum_is_rejected() {
        assert!(matches!(
            GridResolution::new(1, 5),
            Err(MeshError::InvalidResolution { count_u: 1, count_v: 5 })
        ));
        assert!(GridResolution::new(4, 0).is_err());
    }

    #[test]
    fn oversized_resolution_is_rejected() {
        assert!(matches!(
            GridResolution::new(1 << 17, 1 << 17),
            Err(MeshError::TooManyVertices { .. })
        ));
        assert!(GridResolution::from_tessellation(MAX_TESSELLATION).is_ok());
        assert!(GridResolution::from_tessellation(MAX_TESSELLATION + 1).is_err());
    }

    #[test]
    fn index_count_matches_formula() {
        for (count_u, count_v) in [(2, 2), (3, 3), (5, 2), (2, 7), (9, 4), (17, 33)] {
            let r = res(count_u, count_v);
            let indices = strip_indices(r).unwrap();
            assert_eq!(indices.len(), (count_v - 1) * (count_u * 2 + 2));
            assert!(indices.iter().all(|&i| (i as usize) < count_u * count_v));
        }
    }

    #[test]
    fn strip_bridges_rows_with_repeated_indices() {
        let indices = strip_indices(res(3, 3)).unwrap();
        assert_eq!(
            indices,
            vec![0, 0, 1, 3, 4, 6, 7, 7, 1, 1, 2, 4, 5, 7, 8, 8]
        );
    }

    #[test]
    fn strip_covers_every_cell_exactly_once() {
        for (count_u, count_v) in [(2, 2), (3, 3), (4, 6), (7, 3)] {
            let r = res(count_u, count_v);
            let indices = strip_indices(r).unwrap();
            let cell_of = |index: u32| (index as usize / count_v, index as usize % count_v);

            let mut cells: HashMap<(usize, usize), Vec<[u32; 3]>> = HashMap::new();
            for window in indices.windows(3) {
                let (a, b, c) = (window[0], window[1], window[2]);
                if a == b || b == c || a == c {
                    continue;
                }
                let corners = [cell_of(a), cell_of(b), cell_of(c)];
                let min_i = corners.iter().map(|c| c.0).min().unwrap();
                let max_i = corners.iter().map(|c| c.0).max().unwrap();
                let min_j = corners.iter().map(|c| c.1).min().unwrap();
                let max_j = corners.iter().map(|c| c.1).max().unwrap();
                assert_eq!(max_i - min_i, 1, "triangle {window:?} spans more than one column");
                assert_eq!(max_j - min_j, 1, "triangle {window:?} spans more than one row");

                let mut tri = [a, b, c];
                tri.sort_unstable();
                cells.entry((min_i, min_j)).or_default().push(tri);
            }

            assert_eq!(cells.len(), (count_u - 1) * (count_v - 1));
            for (cell, tris) in &cells {
                assert_eq!(tris.len(), 2, "cell {cell:?}");
                assert_ne!(tris[0], tris[1], "cell {cell:?}");
            }
        }
    }

    #[test]
    fn grid_at_level_one() {
        let data = lit(SurfaceParams::Grid, GridResolution::from_tessellation(1).unwrap(), 1);
        assert_eq!(data.vertices.len(), 9);
        assert_eq!(data.indices.len(), 16);
        assert_eq!(data.vertices[0].position, [-1.0, -1.0, 0.0]);
        assert_eq!(data.vertices[4].position, [0.0, 0.0, 0.0]);
        assert_eq!(data.vertices[8].position, [1.0, 1.0, 0.0]);
        assert!(data.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn samples_are_row_major_with_v_stride() {
        let data = lit(SurfaceParams::Grid, res(3, 5), 1);
        // i = 1, j = 4 -> u = 0.5, v = 1.0
        let vertex = data.vertices[5 + 4];
        assert_abs_diff_eq!(vertex.position[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(vertex.position[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn normal_lines_pair_each_vertex_with_its_tip() {
        let params = SurfaceParams::Sphere { radius: 2.0 };
        let data = lit(params, res(5, 4), 1);
        assert_eq!(data.normal_lines.len(), data.vertices.len() * 2);

        for (segment, vertex) in data.normal_lines.chunks_exact(2).zip(&data.vertices) {
            assert_eq!(segment[0].position, vertex.position);
            let base = glam::Vec3::from_array(vertex.position);
            let tip = glam::Vec3::from_array(segment[1].position);
            assert_abs_diff_eq!(tip.distance(base), DEFAULT_NORMAL_LENGTH, epsilon = 1e-5);
        }
    }

    #[test]
    fn normal_length_is_configurable() {
        let config = MeshConfig {
            normal_length: 0.5,
            ..MeshConfig::default()
        };
        let data = build_lit_data(&SurfaceParams::Grid, res(2, 2), &config).unwrap();
        assert_eq!(data.normal_lines[1].position, [-1.0, -1.0, 0.5]);
    }

    #[test]
    fn uv_variant_stores_raw_coordinates() {
        let data = build_uv_data(res(3, 2), &MeshConfig::default()).unwrap();
        let uvs: Vec<[f32; 2]> = data.vertices.iter().map(|v| v.uv).collect();
        assert_eq!(
            uvs,
            vec![[0.0, 0.0], [0.0, 1.0], [0.5, 0.0], [0.5, 1.0], [1.0, 0.0], [1.0, 1.0]]
        );
        assert_eq!(data.indices, strip_indices(res(3, 2)).unwrap());
    }

    #[test]
    fn custom_domain_spreads_samples_linearly() {
        let config = MeshConfig {
            domain: UvDomain {
                u: (0.25, 0.75),
                v: (0.0, 0.5),
            },
            ..MeshConfig::default()
        };
        let data = build_uv_data(res(3, 3), &config).unwrap();
        assert_eq!(data.vertices[0].uv, [0.25, 0.0]);
        assert_eq!(data.vertices[4].uv, [0.5, 0.25]);
        assert_eq!(data.vertices[8].uv, [0.75, 0.5]);
    }

    #[test]
    fn rebuilds_are_byte_identical() {
        let params = SurfaceParams::Torus {
            major_radius: 1.0,
            minor_radius: 0.4,
        };
        let r = GridResolution::from_tessellation(4).unwrap();
        let a = lit(params, r, 1);
        let b = lit(params, r, 1);
        assert_eq!(
            bytemuck::cast_slice::<_, u8>(&a.vertices),
            bytemuck::cast_slice::<_, u8>(&b.vertices)
        );
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn parallel_sampling_matches_sequential() {
        let params = SurfaceParams::Sphere { radius: 1.3 };
        let r = res(33, 17);
        let sequential = lit(params, r, 1);
        for workers in [2, 3, 8, 64] {
            let parallel = lit(params, r, workers);
            assert_eq!(
                bytemuck::cast_slice::<_, u8>(&sequential.vertices),
                bytemuck::cast_slice::<_, u8>(&parallel.vertices),
                "{workers} workers"
            );
            assert_eq!(
                bytemuck::cast_slice::<_, u8>(&sequential.normal_lines),
                bytemuck::cast_slice::<_, u8>(&parallel.normal_lines),
                "{workers} workers"
            );
        }
    }

    #[test]
    fn variant_selects_staging_layout() {
        let config = MeshConfig {
            variant: MeshVariant::ShaderDriven,
            ..MeshConfig::default()
        };
        let data = build_mesh_data(&SurfaceParams::Grid, res(4, 4), &config).unwrap();
        assert!(matches!(data, MeshData::Uv(_)));
        assert_eq!(data.vertex_count(), 16);
        assert_eq!(data.indices().len(), 3 * 10);
    }
}
