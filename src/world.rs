//! The serialized world context.
//!
//! All entity and terrain state lives in a [`WorldState`] owned by a single
//! tokio task. Other threads never touch it directly: they submit closures
//! through a [`WorldHandle`], and the task runs them one at a time in
//! submission order. Timer callbacks and chunk-load completions hop in
//! here before reading player positions or blocks.

use crate::error::{RtpError, TerrainError};
use crate::protocol::{EntityTeleported, WorldEvent};
use crate::terrain::TerrainSource;
use crate::tier::PermissionSource;
use crate::types::{ChunkCoord, PlayerId, Vec3};
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Capacity of the teleport broadcast before slow subscribers lag.
const EVENT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlayerEntity {
    pub id: PlayerId,
    pub name: String,
    pub position: Vec3,
    pub permissions: HashSet<String>,
}

impl PlayerEntity {
    pub fn new(id: PlayerId, name: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            permissions: HashSet::new(),
        }
    }

    pub fn with_permissions<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(nodes.into_iter().map(Into::into));
        self
    }
}

impl PermissionSource for PlayerEntity {
    fn has_permission(&self, node: &str) -> bool {
        self.permissions.contains(node)
    }
}

// ---------------------------------------------------------------------------
// World state (only reachable from inside the world task)
// ---------------------------------------------------------------------------

pub struct WorldState {
    name: String,
    players: HashMap<PlayerId, PlayerEntity>,
    terrain: Arc<dyn TerrainSource>,
    events: broadcast::Sender<WorldEvent<EntityTeleported>>,
    frame: u64,
}

impl WorldState {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn terrain(&self) -> &dyn TerrainSource {
        self.terrain.as_ref()
    }

    pub fn add_player(&mut self, entity: PlayerEntity) {
        info!("{} joined {} at {}", entity.name, self.name, entity.position);
        self.players.insert(entity.id.clone(), entity);
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> Option<PlayerEntity> {
        self.players.remove(id)
    }

    /// Resolve `id` to its live entity.
    pub fn player(&self, id: &PlayerId) -> Result<&PlayerEntity, RtpError> {
        self.players
            .get(id)
            .ok_or_else(|| RtpError::EntityGone(id.clone()))
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Result<&mut PlayerEntity, RtpError> {
        self.players
            .get_mut(id)
            .ok_or_else(|| RtpError::EntityGone(id.clone()))
    }

    /// Case-insensitive lookup by display name.
    pub fn find_player_by_name(&self, name: &str) -> Option<&PlayerEntity> {
        self.players
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Ordinary movement; no event is published.
    pub fn move_player(&mut self, id: &PlayerId, position: Vec3) -> Result<(), RtpError> {
        self.player_mut(id)?.position = position;
        Ok(())
    }

    /// Apply an absolute position and publish it to subscribers.
    pub fn teleport(&mut self, id: &PlayerId, position: Vec3) -> Result<(), RtpError> {
        self.player_mut(id)?.position = position;
        let event = WorldEvent::new(
            self.name.clone(),
            self.frame,
            EntityTeleported {
                entity_id: id.to_string(),
                x: position.x,
                y: position.y,
                z: position.z,
            },
        );
        // No subscribers is not an error.
        let _ = self.events.send(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// World task + handle
// ---------------------------------------------------------------------------

type WorldTask = Box<dyn FnOnce(&mut WorldState) + Send>;

enum WorldCommand {
    Run(WorldTask),
    Stop,
}

pub struct World;

impl World {
    /// Start the world task on the current tokio runtime.
    pub fn spawn(name: impl Into<String>, terrain: Arc<dyn TerrainSource>) -> WorldHandle {
        let name: String = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<WorldCommand>();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut state = WorldState {
            name: name.clone(),
            players: HashMap::new(),
            terrain: terrain.clone(),
            events: events.clone(),
            frame: 0,
        };

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    WorldCommand::Run(task) => {
                        state.frame += 1;
                        task(&mut state);
                    }
                    WorldCommand::Stop => break,
                }
            }
            debug!("World '{}' stopped after {} tasks", state.name, state.frame);
        });

        WorldHandle {
            name: Arc::from(name),
            tx,
            terrain,
            events,
        }
    }
}

/// Cloneable entry point into a world context.
#[derive(Clone)]
pub struct WorldHandle {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<WorldCommand>,
    terrain: Arc<dyn TerrainSource>,
    events: broadcast::Sender<WorldEvent<EntityTeleported>>,
}

impl WorldHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `task` and return without waiting for it.
    pub fn execute<F>(&self, task: F) -> Result<(), RtpError>
    where
        F: FnOnce(&mut WorldState) + Send + 'static,
    {
        self.tx
            .send(WorldCommand::Run(Box::new(task)))
            .map_err(|_| RtpError::WorldClosed)
    }

    /// Queue `task` and await its result.
    pub async fn call<F, R>(&self, task: F) -> Result<R, RtpError>
    where
        F: FnOnce(&mut WorldState) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.execute(move |state| {
            let _ = reply_tx.send(task(state));
        })?;
        reply_rx.await.map_err(|_| RtpError::WorldClosed)
    }

    /// Request every chunk and wait until all of them have finished, in
    /// success or failure. Results are in request order.
    pub async fn load_chunks(&self, chunks: &[ChunkCoord]) -> Vec<Result<(), TerrainError>> {
        let loads = chunks.iter().map(|c| self.terrain.load_chunk(*c));
        futures_util::future::join_all(loads).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorldEvent<EntityTeleported>> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop the world task once the tasks queued before this call have run.
    pub fn shutdown(&self) {
        let _ = self.tx.send(WorldCommand::Stop);
    }
}
