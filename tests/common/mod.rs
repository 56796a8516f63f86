//! Shared doubles for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use world_rtp::{
    config::RtpConfig,
    cooldown::Clock,
    error::TerrainError,
    messages::{CommandSender, MessageSink},
    service::RtpService,
    terrain::{ChunkLoad, TerrainSource},
    types::{BlockPos, BlockState, ChunkCoord, PlayerId, Vec3},
    world::{PlayerEntity, World, WorldHandle},
};

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Terrain defined by a closure. Every chunk load succeeds immediately.
pub struct FnTerrain<F> {
    f: F,
    loads: AtomicUsize,
}

impl<F> FnTerrain<F>
where
    F: Fn(BlockPos) -> BlockState + Send + Sync + 'static,
{
    pub fn new(f: F) -> Arc<Self> {
        Arc::new(Self {
            f,
            loads: AtomicUsize::new(0),
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl<F> TerrainSource for FnTerrain<F>
where
    F: Fn(BlockPos) -> BlockState + Send + Sync + 'static,
{
    fn block_at(&self, pos: BlockPos) -> Result<BlockState, TerrainError> {
        Ok((self.f)(pos))
    }

    fn load_chunk(&self, _chunk: ChunkCoord) -> ChunkLoad {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

/// Solid up to and including `height`, air above.
pub fn flat(height: i32) -> Arc<FnTerrain<impl Fn(BlockPos) -> BlockState + Send + Sync + 'static>> {
    FnTerrain::new(move |pos| {
        if pos.y <= height {
            BlockState::solid(1)
        } else {
            BlockState::AIR
        }
    })
}

/// Nothing to stand on anywhere.
pub fn void() -> Arc<FnTerrain<impl Fn(BlockPos) -> BlockState + Send + Sync + 'static>> {
    FnTerrain::new(|_| BlockState::AIR)
}

// ---------------------------------------------------------------------------
// Messages + clock
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(CommandSender, String)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<(CommandSender, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_for(&self, to: &CommandSender) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(r, _)| r == to)
            .map(|(_, t)| t)
            .collect()
    }

    pub fn last(&self) -> Option<String> {
        self.messages().last().map(|(_, t)| t.clone())
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages()
            .iter()
            .filter(|(_, t)| t.contains(needle))
            .count()
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, to: &CommandSender, text: &str) {
        self.sent.lock().unwrap().push((to.clone(), text.to_string()));
    }
}

/// Wall clock that only moves when told to.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn at(millis: u64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicU64::new(millis),
        })
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub const T0: u64 = 1_700_000_000_000;

pub struct Harness {
    pub service: RtpService,
    pub world: WorldHandle,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(config: RtpConfig, terrain: Arc<dyn TerrainSource>) -> Self {
        let world = World::spawn("overworld", terrain);
        let sink = RecordingSink::new();
        let clock = ManualClock::at(T0);
        let service = RtpService::new(config, world.clone(), sink.clone(), clock.clone(), Some(7));
        Self {
            service,
            world,
            sink,
            clock,
        }
    }

    pub async fn join(&self, name: &str, permissions: &[&str]) -> PlayerId {
        let id = PlayerId::new(name.to_ascii_lowercase());
        let entity = PlayerEntity::new(id.clone(), name, Vec3::new(0.0, 65.0, 0.0))
            .with_permissions(permissions.iter().copied());
        self.service.player_joined(entity).await.unwrap();
        id
    }

    pub async fn position(&self, id: &PlayerId) -> Vec3 {
        let id = id.clone();
        self.world
            .call(move |state| state.player(&id).map(|p| p.position))
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn move_to(&self, id: &PlayerId, position: Vec3) {
        let id = id.clone();
        self.world
            .call(move |state| state.move_player(&id, position))
            .await
            .unwrap()
            .unwrap();
    }
}

/// Defaults with a short search band so candidates stay near the origin.
pub fn test_config() -> RtpConfig {
    let mut config = RtpConfig::default();
    config.policy.min_distance = 100;
    config.policy.max_distance = 200;
    config
}
