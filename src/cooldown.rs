//! Per-player teleport cooldowns.

use crate::types::PlayerId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock source in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Allowed,
    Blocked { remaining_ms: u64 },
}

/// Last successful teleport per player.
///
/// Entries are overwritten on every teleport and never removed, so a player
/// who reconnects is still subject to their cooldown.
#[derive(Default)]
pub struct CooldownTracker {
    last_teleport: RwLock<HashMap<PlayerId, u64>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `player` may teleport at `now`. Reads only.
    pub fn check(&self, player: &PlayerId, now: u64, cooldown_seconds: u64) -> CooldownStatus {
        let cooldown_ms = cooldown_seconds.saturating_mul(1000);
        let Some(&last) = self.last_teleport.read().get(player) else {
            return CooldownStatus::Allowed;
        };

        let elapsed = now.saturating_sub(last);
        if elapsed < cooldown_ms {
            CooldownStatus::Blocked {
                remaining_ms: cooldown_ms - elapsed,
            }
        } else {
            CooldownStatus::Allowed
        }
    }

    pub fn record(&self, player: &PlayerId, now: u64) {
        self.last_teleport.write().insert(player.clone(), now);
    }

    pub fn last_teleport(&self, player: &PlayerId) -> Option<u64> {
        self.last_teleport.read().get(player).copied()
    }

    pub fn len(&self) -> usize {
        self.last_teleport.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_teleport.read().is_empty()
    }
}
