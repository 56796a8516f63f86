//! Permission tiers → effective per-request policy.
//!
//! Cooldown, warmup, distance band and height band are each resolved on
//! their own scan of the tier list. With tiers that are not nested supersets
//! of each other, a player can therefore end up with fields from different
//! tiers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{PermissionNodes, PolicyDefaults, RtpConfig, TierPolicy};

/// Boolean permission lookup for a player.
pub trait PermissionSource {
    fn has_permission(&self, node: &str) -> bool;
}

impl PermissionSource for HashSet<String> {
    fn has_permission(&self, node: &str) -> bool {
        self.contains(node)
    }
}

impl<T: PermissionSource + ?Sized> PermissionSource for &T {
    fn has_permission(&self, node: &str) -> bool {
        (**self).has_permission(node)
    }
}

/// Horizontal distance from the origin, `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    pub min: f64,
    pub max: f64,
}

/// Candidate footing heights, `[min, max]`, scanned top-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightBand {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectivePolicy {
    pub cooldown_seconds: u64,
    pub warmup_seconds: u64,
    pub distance: DistanceBand,
    pub height: HeightBand,
}

impl EffectivePolicy {
    /// Policy for admin-targeted teleports: default bands, no cooldown, no
    /// warmup.
    pub fn admin(defaults: &PolicyDefaults) -> Self {
        Self {
            cooldown_seconds: 0,
            warmup_seconds: 0,
            distance: DistanceBand {
                min: defaults.min_distance as f64,
                max: defaults.max_distance as f64,
            },
            height: HeightBand {
                min: defaults.min_height,
                max: defaults.max_height,
            },
        }
    }
}

pub struct TierPolicyResolver<'a> {
    tiers: &'a [TierPolicy],
    defaults: &'a PolicyDefaults,
    nodes: &'a PermissionNodes,
}

impl<'a> TierPolicyResolver<'a> {
    pub fn new(
        tiers: &'a [TierPolicy],
        defaults: &'a PolicyDefaults,
        nodes: &'a PermissionNodes,
    ) -> Self {
        Self {
            tiers,
            defaults,
            nodes,
        }
    }

    pub fn from_config(config: &'a RtpConfig) -> Self {
        Self::new(&config.tiers, &config.policy, &config.permissions)
    }

    /// First tier, in list order, whose permission the player holds.
    fn first_match(&self, player: &impl PermissionSource) -> Option<&'a TierPolicy> {
        self.tiers
            .iter()
            .find(|tier| player.has_permission(&tier.permission))
    }

    pub fn cooldown_seconds(&self, player: &impl PermissionSource) -> u64 {
        if player.has_permission(&self.nodes.bypass_cooldown) {
            return 0;
        }
        self.first_match(player)
            .and_then(|tier| tier.cooldown_seconds)
            .unwrap_or(self.defaults.cooldown_seconds)
    }

    pub fn warmup_seconds(&self, player: &impl PermissionSource) -> u64 {
        if player.has_permission(&self.nodes.bypass_warmup) {
            return 0;
        }
        self.first_match(player)
            .and_then(|tier| tier.warmup_seconds)
            .unwrap_or(self.defaults.warmup_seconds)
    }

    pub fn distance_band(&self, player: &impl PermissionSource) -> DistanceBand {
        let tier = self.first_match(player);
        let min = tier
            .and_then(|t| t.min_distance)
            .unwrap_or(self.defaults.min_distance);
        let max = tier
            .and_then(|t| t.max_distance)
            .unwrap_or(self.defaults.max_distance);
        DistanceBand {
            min: min as f64,
            max: max as f64,
        }
    }

    pub fn height_band(&self, player: &impl PermissionSource) -> HeightBand {
        let tier = self.first_match(player);
        HeightBand {
            min: tier
                .and_then(|t| t.min_height)
                .unwrap_or(self.defaults.min_height),
            max: tier
                .and_then(|t| t.max_height)
                .unwrap_or(self.defaults.max_height),
        }
    }

    pub fn resolve(&self, player: &impl PermissionSource) -> EffectivePolicy {
        EffectivePolicy {
            cooldown_seconds: self.cooldown_seconds(player),
            warmup_seconds: self.warmup_seconds(player),
            distance: self.distance_band(player),
            height: self.height_band(player),
        }
    }
}
