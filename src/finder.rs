//! Safe landing search.
//!
//! Each attempt samples a fresh point in the distance band, loads the 3×3
//! chunk neighbourhood around it, waits for the terrain to settle, then scans
//! the column top-down inside the world context. A failed attempt resamples
//! rather than nudging the same point, so one ocean or cliff face cannot eat
//! every attempt.

use crate::config::SafetyRule;
use crate::error::{RtpError, TerrainError};
use crate::terrain::TerrainSource;
use crate::tier::{DistanceBand, HeightBand};
use crate::types::{BlockPos, ChunkCoord, Vec3};
use crate::world::WorldHandle;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::time::Duration;

/// One sampled point. Exists only for the duration of an attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportCandidate {
    pub origin_x: f64,
    pub origin_z: f64,
    pub angle: f64,
    pub distance: f64,
    pub target_x: f64,
    pub target_z: f64,
    pub attempt: u32,
}

impl TeleportCandidate {
    /// Block column containing the target point.
    pub fn column(&self) -> (i32, i32) {
        (self.target_x.floor() as i32, self.target_z.floor() as i32)
    }

    pub fn chunk(&self) -> ChunkCoord {
        let (x, z) = self.column();
        ChunkCoord::containing(x, z)
    }
}

/// A validated landing position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeSpot {
    /// Where the player is placed: on top of the footing block.
    pub position: Vec3,
    /// Y of the solid footing block.
    pub ground_y: i32,
    /// Sampled horizontal distance from the origin.
    pub distance: f64,
    /// Attempt that found this spot, starting at 1.
    pub attempts: u32,
}

pub struct SafeLocationFinder {
    world: WorldHandle,
    rng: Mutex<StdRng>,
    settle_delay: Duration,
    rule: SafetyRule,
}

impl SafeLocationFinder {
    pub fn new(world: WorldHandle, settle_delay: Duration, rule: SafetyRule) -> Self {
        Self::with_rng(world, settle_delay, rule, StdRng::from_os_rng())
    }

    /// Deterministic sampling, for reproducible searches.
    pub fn with_seed(world: WorldHandle, settle_delay: Duration, rule: SafetyRule, seed: u64) -> Self {
        Self::with_rng(world, settle_delay, rule, StdRng::seed_from_u64(seed))
    }

    fn with_rng(world: WorldHandle, settle_delay: Duration, rule: SafetyRule, rng: StdRng) -> Self {
        Self {
            world,
            rng: Mutex::new(rng),
            settle_delay,
            rule,
        }
    }

    pub fn rule(&self) -> SafetyRule {
        self.rule
    }

    /// Uniform angle in `[0, 2π)` and uniform distance in `[min, max)`.
    pub fn sample(&self, origin: (f64, f64), band: DistanceBand, attempt: u32) -> TeleportCandidate {
        let mut rng = self.rng.lock();
        let distance = if band.max > band.min {
            rng.random_range(band.min..band.max)
        } else {
            band.min
        };
        let angle = rng.random_range(0.0..TAU);
        TeleportCandidate {
            origin_x: origin.0,
            origin_z: origin.1,
            angle,
            distance,
            target_x: origin.0 + angle.cos() * distance,
            target_z: origin.1 + angle.sin() * distance,
            attempt,
        }
    }

    /// Search for a landing spot, making at most `max_attempts` samples.
    ///
    /// `on_attempt(attempt, max_attempts)` runs before each sample. The search
    /// cannot be cancelled once started.
    pub async fn find_safe_spot<F>(
        &self,
        origin: (f64, f64),
        distance: DistanceBand,
        height: HeightBand,
        max_attempts: u32,
        mut on_attempt: F,
    ) -> Result<SafeSpot, RtpError>
    where
        F: FnMut(u32, u32) + Send,
    {
        for attempt in 1..=max_attempts {
            on_attempt(attempt, max_attempts);

            let candidate = self.sample(origin, distance, attempt);
            let (x, z) = candidate.column();
            debug!(
                "Attempt {}/{}: X={} Z={} ({:.0} from origin)",
                attempt, max_attempts, x, z, candidate.distance
            );

            let chunks = candidate.chunk().neighborhood();
            let loads = self.world.load_chunks(&chunks).await;
            for (chunk, result) in chunks.iter().zip(loads) {
                if let Err(e) = result {
                    warn!("Chunk {} failed to load, scanning anyway: {}", chunk, e);
                }
            }

            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }

            let rule = self.rule;
            let found = self
                .world
                .call(move |state| scan_column(state.terrain(), x, z, height, rule))
                .await?;

            if let Some(ground_y) = found {
                info!("Found safe ground at Y={} on attempt {}", ground_y, attempt);
                return Ok(SafeSpot {
                    position: Vec3::new(
                        candidate.target_x,
                        ground_y as f64 + 1.0,
                        candidate.target_z,
                    ),
                    ground_y,
                    distance: candidate.distance,
                    attempts: attempt,
                });
            }
            debug!("Attempt {} failed: no safe spot in column", attempt);
        }

        info!("No safe spot after {} attempts", max_attempts);
        Err(RtpError::SearchExhausted {
            attempts: max_attempts,
        })
    }
}

/// Highest Y in `band` at column `(x, z)` that passes `rule`.
///
/// A block query that fails marks that Y unsafe; the scan carries on below.
pub fn scan_column(
    terrain: &dyn TerrainSource,
    x: i32,
    z: i32,
    band: HeightBand,
    rule: SafetyRule,
) -> Option<i32> {
    for y in (band.min..=band.max).rev() {
        match is_safe_footing(terrain, BlockPos::new(x, y, z), rule) {
            Ok(true) => return Some(y),
            Ok(false) => {}
            Err(e) => trace!("Y={} unsafe: {}", y, e),
        }
    }
    None
}

const SIDES: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Neighbouring block, or `OutOfBounds` at the edge of the coordinate space.
fn neighbour(pos: BlockPos, dx: i32, dy: i32, dz: i32) -> Result<BlockPos, TerrainError> {
    pos.offset(dx, dy, dz).ok_or(TerrainError::OutOfBounds(pos))
}

/// Whether a player can stand on top of `ground`.
pub fn is_safe_footing(
    terrain: &dyn TerrainSource,
    ground: BlockPos,
    rule: SafetyRule,
) -> Result<bool, TerrainError> {
    if !terrain.block_at(ground)?.is_solid() {
        return Ok(false);
    }

    for dy in 1..=2 {
        let head = terrain.block_at(neighbour(ground, 0, dy, 0)?)?;
        if !head.is_air() {
            return Ok(false);
        }
        if rule == SafetyRule::Strict && head.has_fluid() {
            return Ok(false);
        }
    }

    if rule == SafetyRule::Strict {
        for (dx, dz) in SIDES {
            if !terrain.block_at(neighbour(ground, dx, 0, dz)?)?.is_solid() {
                return Ok(false);
            }
        }
    }

    Ok(true)
}
