//! Teleport configuration: default policy, permission tiers, search and
//! warmup tuning, and message templates.
//!
//! Every section is `#[serde(default)]`, so a partial file (or none at all)
//! yields a working configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RtpError;
use crate::messages::MessageTemplates;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RtpConfig {
    /// Policy applied when no tier matches, and per-field fallback for tiers.
    pub policy: PolicyDefaults,
    /// Permission tiers, highest privilege first.
    pub tiers: Vec<TierPolicy>,
    pub permissions: PermissionNodes,
    pub search: SearchConfig,
    pub warmup: WarmupConfig,
    pub messages: MessageTemplates,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyDefaults {
    pub cooldown_seconds: u64,
    pub warmup_seconds: u64,
    /// Inclusive lower bound of the sampled distance from the origin.
    pub min_distance: u32,
    /// Exclusive upper bound of the sampled distance from the origin.
    pub max_distance: u32,
    /// Lowest Y considered as footing.
    pub min_height: i32,
    /// Highest Y considered as footing; the scan starts here.
    pub max_height: i32,
}

impl Default for PolicyDefaults {
    fn default() -> Self {
        Self {
            cooldown_seconds: 3600,
            warmup_seconds: 5,
            min_distance: 5000,
            max_distance: 9000,
            min_height: 0,
            max_height: 256,
        }
    }
}

/// A permission-gated override bundle. Unset fields inherit from
/// [`PolicyDefaults`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TierPolicy {
    pub name: String,
    /// Permission node a player must hold for this tier to apply.
    pub permission: String,
    pub cooldown_seconds: Option<u64>,
    pub warmup_seconds: Option<u64>,
    pub min_distance: Option<u32>,
    pub max_distance: Option<u32>,
    pub min_height: Option<i32>,
    pub max_height: Option<i32>,
}

impl TierPolicy {
    pub fn new(name: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permission: permission.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PermissionNodes {
    /// Required for `rtp` on oneself. Empty disables the check.
    pub use_node: String,
    pub bypass_cooldown: String,
    pub bypass_warmup: String,
    /// Required for `rtp <player>`.
    pub teleport_other: String,
}

impl Default for PermissionNodes {
    fn default() -> Self {
        Self {
            use_node: "rtp.use".into(),
            bypass_cooldown: "rtp.bypass.cooldown".into(),
            bypass_warmup: "rtp.bypass.warmup".into(),
            teleport_other: "rtp.other".into(),
        }
    }
}

/// Which footing check the search applies. One rule per search; the two are
/// never combined.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SafetyRule {
    /// Solid footing, two dry air blocks above, four solid neighbours.
    #[default]
    Strict,
    /// Solid footing and two air blocks above.
    Relaxed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidates sampled before the request fails.
    pub max_attempts: u32,
    /// Pause between chunk loads completing and the first block query.
    pub settle_delay_ms: u64,
    pub origin_x: f64,
    pub origin_z: f64,
    pub rule: SafetyRule,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            settle_delay_ms: 500,
            origin_x: 0.0,
            origin_z: 0.0,
            rule: SafetyRule::Strict,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarmupConfig {
    /// Displacement (blocks) that cancels a warmup.
    pub movement_threshold: f64,
    pub check_interval_ms: u64,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            movement_threshold: 0.5,
            check_interval_ms: 500,
        }
    }
}

/// Largest horizontal distance or absolute height a band may reach. Keeps
/// every candidate block and its neighbours inside the `i32` range.
pub const MAX_COORDINATE: i64 = 30_000_000;

fn within_world(field: &str, value: i64) -> Result<(), RtpError> {
    if value.abs() > MAX_COORDINATE {
        return Err(RtpError::InvalidConfig(format!(
            "{} {} is beyond the world limit of {}",
            field, value, MAX_COORDINATE
        )));
    }
    Ok(())
}

impl RtpConfig {
    /// Layer an optional config file (TOML, JSON, … by extension) and
    /// `RTP__SECTION__KEY` environment variables over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, RtpError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let cfg: RtpConfig = builder
            .add_source(
                config::Environment::with_prefix("RTP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), RtpError> {
        let p = &self.policy;
        if p.min_distance > p.max_distance {
            return Err(RtpError::InvalidConfig(format!(
                "policy.min_distance {} exceeds max_distance {}",
                p.min_distance, p.max_distance
            )));
        }
        if p.min_height > p.max_height {
            return Err(RtpError::InvalidConfig(format!(
                "policy.min_height {} exceeds max_height {}",
                p.min_height, p.max_height
            )));
        }
        within_world("policy.max_distance", p.max_distance.into())?;
        within_world("policy.min_height", p.min_height.into())?;
        within_world("policy.max_height", p.max_height.into())?;
        for (field, origin) in [
            ("search.origin_x", self.search.origin_x),
            ("search.origin_z", self.search.origin_z),
        ] {
            if !origin.is_finite() || origin.abs() > MAX_COORDINATE as f64 {
                return Err(RtpError::InvalidConfig(format!(
                    "{} {} is beyond the world limit of {}",
                    field, origin, MAX_COORDINATE
                )));
            }
        }
        if self.search.max_attempts == 0 {
            return Err(RtpError::InvalidConfig(
                "search.max_attempts must be at least 1".into(),
            ));
        }
        if self.warmup.check_interval_ms == 0 {
            return Err(RtpError::InvalidConfig(
                "warmup.check_interval_ms must be positive".into(),
            ));
        }
        for tier in &self.tiers {
            if tier.permission.is_empty() {
                return Err(RtpError::InvalidConfig(format!(
                    "tier '{}' has no permission node",
                    tier.name
                )));
            }
            if let Some(d) = tier.max_distance {
                within_world(&format!("tier '{}' max_distance", tier.name), d.into())?;
            }
            for h in [tier.min_height, tier.max_height].into_iter().flatten() {
                within_world(&format!("tier '{}' height", tier.name), h.into())?;
            }
            if let (Some(lo), Some(hi)) = (tier.min_distance, tier.max_distance) {
                if lo > hi {
                    return Err(RtpError::InvalidConfig(format!(
                        "tier '{}' min_distance {} exceeds max_distance {}",
                        tier.name, lo, hi
                    )));
                }
            }
            if let (Some(lo), Some(hi)) = (tier.min_height, tier.max_height) {
                if lo > hi {
                    return Err(RtpError::InvalidConfig(format!(
                        "tier '{}' min_height {} exceeds max_height {}",
                        tier.name, lo, hi
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RtpConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.policy.cooldown_seconds, 3600);
        assert_eq!(cfg.policy.warmup_seconds, 5);
        assert_eq!(cfg.warmup.movement_threshold, 0.5);
    }

    #[test]
    fn inverted_distance_band_is_rejected() {
        let mut cfg = RtpConfig::default();
        cfg.policy.min_distance = 10;
        cfg.policy.max_distance = 5;
        assert!(matches!(cfg.validate(), Err(RtpError::InvalidConfig(_))));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let mut cfg = RtpConfig::default();
        cfg.search.max_attempts = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bands_past_world_limit_are_rejected() {
        let mut cfg = RtpConfig::default();
        cfg.policy.max_distance = 3_000_000_000;
        assert!(matches!(cfg.validate(), Err(RtpError::InvalidConfig(_))));

        let mut cfg = RtpConfig::default();
        cfg.policy.min_height = i32::MIN;
        assert!(cfg.validate().is_err());

        let mut cfg = RtpConfig::default();
        cfg.search.origin_x = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = RtpConfig::default();
        let mut tier = TierPolicy::new("far", "rtp.tier.far");
        tier.max_distance = Some(u32::MAX);
        cfg.tiers.push(tier);
        assert!(cfg.validate().is_err());

        let mut cfg = RtpConfig::default();
        cfg.policy.max_distance = MAX_COORDINATE as u32;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg: RtpConfig = serde_json::from_str(
            r#"{
                "policy": { "cooldown_seconds": 60 },
                "tiers": [{ "name": "gold", "permission": "rtp.tier.gold", "warmup_seconds": 1 }],
                "search": { "rule": "relaxed" }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.policy.cooldown_seconds, 60);
        assert_eq!(cfg.policy.max_distance, 9000);
        assert_eq!(cfg.tiers[0].warmup_seconds, Some(1));
        assert_eq!(cfg.tiers[0].cooldown_seconds, None);
        assert_eq!(cfg.search.rule, SafetyRule::Relaxed);
        assert_eq!(cfg.search.max_attempts, 5);
    }
}
