//! `world.*` outbound wire protocol.
//!
//! Everything the teleport core tells the outside world: absolute position
//! updates for teleported players and rendered feedback messages.
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. Every outbound event includes `frame: u64` and `world: String`.
//! 3. A teleport is a single absolute position; clients must not interpolate
//!    towards it.

use serde::{Deserialize, Serialize};

use crate::messages::CommandSender;

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound message is wrapped in this envelope.
///
/// `frame` is the world context's task counter when the event was produced,
/// so interleaved streams can be ordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldEvent<T> {
    pub world: String,
    pub frame: u64,
    pub payload: T,
}

impl<T> WorldEvent<T> {
    pub fn new(world: impl Into<String>, frame: u64, payload: T) -> Self {
        Self {
            world: world.into(),
            frame,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity events  (subjects: world.entity.*)
// ---------------------------------------------------------------------------

/// Apply an absolute position to an entity. Sent once per applied teleport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityTeleported {
    pub entity_id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// ---------------------------------------------------------------------------
// Feedback  (subject: world.player.message)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerMessage {
    pub recipient: CommandSender,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

pub mod subjects {
    pub const ENTITY_TELEPORTED: &str = "world.entity.teleported";
    pub const PLAYER_MESSAGE: &str = "world.player.message";
}
