//! Terrain subsystem: the TerrainSource trait, a chunk-cached heightmap
//! backend, and asynchronous chunk loading.

use crate::error::TerrainError;
use crate::types::{BlockPos, BlockState, ChunkCoord, CHUNK_SIZE};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Completion of a chunk load. Resolves on whichever thread finished the work.
pub type ChunkLoad = Pin<Box<dyn Future<Output = Result<(), TerrainError>> + Send + 'static>>;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Block-level view of the world terrain.
///
/// `block_at` is only called from inside the world context. `load_chunk` may
/// be called from anywhere; the chunk counts as resident once the returned
/// future resolves `Ok`.
pub trait TerrainSource: Send + Sync {
    fn block_at(&self, pos: BlockPos) -> Result<BlockState, TerrainError>;

    fn load_chunk(&self, chunk: ChunkCoord) -> ChunkLoad;
}

// ---------------------------------------------------------------------------
// Column chunk
// ---------------------------------------------------------------------------

const COLUMNS: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

pub const STONE: u16 = 1;
pub const GRASS: u16 = 2;
pub const WATER: u8 = 1;

/// Surface heights for every column of one chunk.
pub struct ColumnChunk {
    pub coord: ChunkCoord,
    heights: Vec<i32>,
}

impl ColumnChunk {
    fn index(x: i32, z: i32) -> usize {
        let lx = x.rem_euclid(CHUNK_SIZE);
        let lz = z.rem_euclid(CHUNK_SIZE);
        (lz * CHUNK_SIZE + lx) as usize
    }

    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.heights[Self::index(x, z)]
    }
}

// ---------------------------------------------------------------------------
// Heightmap terrain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct HeightmapParams {
    pub seed: u64,
    /// Mean surface height.
    pub base_height: i32,
    /// Peak deviation from `base_height`.
    pub amplitude: f64,
    /// Columns whose surface is below this are flooded up to it.
    pub sea_level: i32,
    /// Lowest addressable Y.
    pub min_y: i32,
    /// Highest addressable Y.
    pub max_y: i32,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 42,
            base_height: 64,
            amplitude: 24.0,
            sea_level: 62,
            min_y: -64,
            max_y: 319,
        }
    }
}

/// In-memory heightmap world. Chunks become resident through
/// [`TerrainSource::load_chunk`], which generates them on the blocking pool.
pub struct HeightmapTerrain {
    pub params: HeightmapParams,
    cache: Arc<RwLock<HashMap<ChunkCoord, Arc<ColumnChunk>>>>,
}

impl HeightmapTerrain {
    pub fn new(params: HeightmapParams) -> Self {
        Self {
            params,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Constant-height terrain with no water.
    pub fn flat(height: i32) -> Self {
        Self::new(HeightmapParams {
            base_height: height,
            amplitude: 0.0,
            sea_level: i32::MIN,
            ..Default::default()
        })
    }

    pub fn is_resident(&self, chunk: ChunkCoord) -> bool {
        self.cache.read().contains_key(&chunk)
    }

    pub fn resident_chunks(&self) -> usize {
        self.cache.read().len()
    }

    /// Surface height straight from the generator, bypassing the cache.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        sample_height(&self.params, x, z)
    }
}

fn generate_chunk(params: &HeightmapParams, coord: ChunkCoord) -> ColumnChunk {
    let (ox, oz) = coord.origin();
    let mut heights = vec![0; COLUMNS];
    for lz in 0..CHUNK_SIZE {
        for lx in 0..CHUNK_SIZE {
            heights[(lz * CHUNK_SIZE + lx) as usize] = sample_height(params, ox + lx, oz + lz);
        }
    }
    ColumnChunk { coord, heights }
}

/// Placeholder noise: a seeded sine/cosine swell.
fn sample_height(params: &HeightmapParams, x: i32, z: i32) -> i32 {
    if params.amplitude == 0.0 {
        return params.base_height;
    }
    let scale = 0.01;
    let s = (params.seed.wrapping_mul(6364136223846793005).wrapping_add(1) >> 40) as f64 * 1e-3;
    let swell = (x as f64 * scale + s).sin() * (z as f64 * scale + s).cos();
    params.base_height + (swell * params.amplitude).round() as i32
}

impl TerrainSource for HeightmapTerrain {
    fn block_at(&self, pos: BlockPos) -> Result<BlockState, TerrainError> {
        if pos.y < self.params.min_y || pos.y > self.params.max_y {
            return Err(TerrainError::OutOfBounds(pos));
        }
        let coord = pos.chunk();
        let chunk = self
            .cache
            .read()
            .get(&coord)
            .cloned()
            .ok_or(TerrainError::ChunkNotLoaded(coord))?;

        let surface = chunk.surface_height(pos.x, pos.z);
        let state = if pos.y < surface {
            BlockState::solid(STONE)
        } else if pos.y == surface {
            BlockState::solid(GRASS)
        } else if pos.y <= self.params.sea_level {
            BlockState::fluid(WATER)
        } else {
            BlockState::AIR
        };
        Ok(state)
    }

    fn load_chunk(&self, chunk: ChunkCoord) -> ChunkLoad {
        let cache = self.cache.clone();
        let params = self.params;
        Box::pin(async move {
            if cache.read().contains_key(&chunk) {
                return Ok(());
            }
            let generated = tokio::task::spawn_blocking(move || generate_chunk(&params, chunk))
                .await
                .map_err(|e| TerrainError::LoadFailed {
                    chunk,
                    reason: e.to_string(),
                })?;
            cache
                .write()
                .entry(chunk)
                .or_insert_with(|| Arc::new(generated));
            Ok(())
        })
    }
}
