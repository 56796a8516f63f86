//! Error types for policy checks, the world context and terrain access.

use crate::messages::MessageKind;
use crate::types::{BlockPos, ChunkCoord, PlayerId};

/// Failure of a teleport request, or of one of its steps.
#[derive(Debug, thiserror::Error)]
pub enum RtpError {
    /// The player teleported too recently.
    #[error("cooldown active for another {remaining_ms} ms")]
    CooldownActive { remaining_ms: u64 },

    /// The sender lacks the permission node the request needs.
    #[error("missing permission")]
    NoPermission,

    /// The sender may not teleport other players.
    #[error("missing permission to teleport others")]
    NoPermissionOther,

    /// `rtp <player>` named a player who is not online.
    #[error("target player '{0}' not found")]
    TargetNotFound(String),

    /// The player moved during the warmup.
    #[error("warmup cancelled by movement")]
    WarmupCancelled,

    /// Every sampled candidate failed the safety check.
    #[error("no safe location found after {attempts} attempts")]
    SearchExhausted { attempts: u32 },

    /// The requester is not attached to a world.
    #[error("requester has no active world")]
    NoActiveWorld,

    /// The entity was removed between scheduling and execution.
    #[error("entity {0} is gone")]
    EntityGone(PlayerId),

    /// The world context stopped accepting work.
    #[error("world context is closed")]
    WorldClosed,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

impl RtpError {
    /// Player-facing message used to report this failure.
    pub fn message_kind(&self) -> MessageKind {
        match self {
            RtpError::CooldownActive { .. } => MessageKind::CooldownBlocked,
            RtpError::NoPermission => MessageKind::NoPermission,
            RtpError::NoPermissionOther => MessageKind::NoPermissionOther,
            RtpError::TargetNotFound(_) => MessageKind::TargetNotFound,
            RtpError::WarmupCancelled => MessageKind::WarmupCancelled,
            RtpError::SearchExhausted { .. } => MessageKind::NoSafeSpot,
            RtpError::NoActiveWorld => MessageKind::NoWorld,
            RtpError::EntityGone(_)
            | RtpError::WorldClosed
            | RtpError::InvalidConfig(_)
            | RtpError::Config(_) => MessageKind::GenericError,
        }
    }
}

/// A single terrain access that could not be served.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TerrainError {
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkCoord),

    #[error("block {0} is outside the world")]
    OutOfBounds(BlockPos),

    #[error("failed to load chunk {chunk}: {reason}")]
    LoadFailed { chunk: ChunkCoord, reason: String },
}
