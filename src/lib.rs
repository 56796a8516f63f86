//! World RTP
//!
//! Random safe teleport for a multiplayer world server.
//!
//! ## Architecture
//!
//! ```text
//! ConsoleAgent  (console.rs)
//!   └── RtpService  (service.rs)          ← request pipeline
//!         ├── TierPolicyResolver  (tier.rs)
//!         ├── CooldownTracker     (cooldown.rs)
//!         ├── WarmupScheduler     (warmup.rs)   ← timers + movement checks
//!         ├── SafeLocationFinder  (finder.rs)   ← chunk loads + column scan
//!         └── WorldHandle         (world.rs)    ← serialized world context
//!               └── HeightmapTerrain  (terrain.rs)
//! ```
//!
//! Entity state is only touched from inside the world task. Timers, chunk
//! loads and command handlers hop into it through [`WorldHandle::call`].

// Policy, message and protocol types are always available (no server feature needed).
pub mod config;
pub mod error;
pub mod messages;
pub mod protocol;
pub mod tier;
pub mod types;

// Runtime modules require the `server` feature.
#[cfg(feature = "server")]
pub mod console;
#[cfg(feature = "server")]
pub mod cooldown;
#[cfg(feature = "server")]
pub mod finder;
#[cfg(feature = "server")]
pub mod service;
#[cfg(feature = "server")]
pub mod terrain;
#[cfg(feature = "server")]
pub mod warmup;
#[cfg(feature = "server")]
pub mod world;

pub use config::{RtpConfig, SafetyRule, TierPolicy};
pub use error::{RtpError, TerrainError};
pub use messages::{CommandSender, MessageKind, MessageSink, MessageTemplates};
pub use tier::{EffectivePolicy, PermissionSource, TierPolicyResolver};
pub use types::{BlockPos, BlockState, ChunkCoord, PlayerId, Vec3};

// Convenience re-exports (server only)
#[cfg(feature = "server")]
pub use console::{ConsoleAgent, ConsoleSink};
#[cfg(feature = "server")]
pub use cooldown::{Clock, CooldownStatus, CooldownTracker, SystemClock};
#[cfg(feature = "server")]
pub use finder::{SafeLocationFinder, SafeSpot};
#[cfg(feature = "server")]
pub use service::{Dispatch, RtpService, RtpStats, TeleportReport};
#[cfg(feature = "server")]
pub use terrain::{HeightmapParams, HeightmapTerrain, TerrainSource};
#[cfg(feature = "server")]
pub use warmup::{WarmupScheduler, WarmupStart};
#[cfg(feature = "server")]
pub use world::{PlayerEntity, World, WorldHandle, WorldState};
