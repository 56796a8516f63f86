//! Core world types shared across all modules.

use serde::{Deserialize, Serialize};

/// Edge length of a terrain chunk in blocks.
pub const CHUNK_SIZE: i32 = 16;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Euclidean distance to `other` over all three axes.
    pub fn distance(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Player identity
// ---------------------------------------------------------------------------

/// Stable player identifier.
///
/// Never a live handle: every access to the player's state resolves the id
/// afresh inside the world context.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Block addressing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// `None` when any axis would leave the `i32` range.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }

    pub fn chunk(&self) -> ChunkCoord {
        ChunkCoord::containing(self.x, self.z)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{},{},{}>", self.x, self.y, self.z)
    }
}

/// Contents of a single block: a block id (0 = air) and a fluid id (0 = dry).
///
/// Fluid is tracked separately from the block id, so a block can be air and
/// still be submerged.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockState {
    pub block: u16,
    pub fluid: u8,
}

impl BlockState {
    pub const AIR: BlockState = BlockState { block: 0, fluid: 0 };

    pub fn solid(block: u16) -> Self {
        Self { block, fluid: 0 }
    }

    pub fn fluid(fluid: u8) -> Self {
        Self { block: 0, fluid }
    }

    pub fn is_air(&self) -> bool {
        self.block == 0
    }

    pub fn is_solid(&self) -> bool {
        self.block != 0
    }

    pub fn has_fluid(&self) -> bool {
        self.fluid != 0
    }
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the block column `(x, z)`. Floors toward negative
    /// infinity so that block -1 lives in chunk -1.
    pub fn containing(x: i32, z: i32) -> Self {
        Self::new(x.div_euclid(CHUNK_SIZE), z.div_euclid(CHUNK_SIZE))
    }

    /// Self plus its eight neighbours, row by row.
    pub fn neighborhood(&self) -> [ChunkCoord; 9] {
        let mut out = [*self; 9];
        let mut i = 0;
        for dx in -1..=1 {
            for dz in -1..=1 {
                out[i] = ChunkCoord::new(self.x + dx, self.z + dz);
                i += 1;
            }
        }
        out
    }

    /// World-space block coordinate of this chunk's minimum corner.
    pub fn origin(&self) -> (i32, i32) {
        (self.x * CHUNK_SIZE, self.z * CHUNK_SIZE)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.z)
    }
}
