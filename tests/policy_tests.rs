//! Tier resolution and cooldown tests

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use world_rtp::{
        config::{PermissionNodes, PolicyDefaults, RtpConfig, TierPolicy},
        cooldown::{CooldownStatus, CooldownTracker},
        tier::{DistanceBand, HeightBand, TierPolicyResolver},
        types::PlayerId,
    };

    fn perms(nodes: &[&str]) -> HashSet<String> {
        nodes.iter().map(|n| n.to_string()).collect()
    }

    fn tiers() -> Vec<TierPolicy> {
        let mut gold = TierPolicy::new("gold", "rtp.tier.gold");
        gold.cooldown_seconds = Some(600);
        gold.min_distance = Some(1000);
        gold.max_distance = Some(20_000);

        let mut silver = TierPolicy::new("silver", "rtp.tier.silver");
        silver.cooldown_seconds = Some(1800);
        silver.warmup_seconds = Some(3);
        silver.max_height = Some(120);

        vec![gold, silver]
    }

    // -----------------------------------------------------------------------
    // Tier resolution
    // -----------------------------------------------------------------------

    #[test]
    fn no_tiers_yields_defaults() {
        let defaults = PolicyDefaults::default();
        let nodes = PermissionNodes::default();
        let resolver = TierPolicyResolver::new(&[], &defaults, &nodes);

        let policy = resolver.resolve(&perms(&["rtp.tier.gold"]));
        assert_eq!(policy.cooldown_seconds, 3600);
        assert_eq!(policy.warmup_seconds, 5);
        assert_eq!(
            policy.distance,
            DistanceBand {
                min: 5000.0,
                max: 9000.0
            }
        );
        assert_eq!(policy.height, HeightBand { min: 0, max: 256 });
    }

    #[test]
    fn first_matching_tier_wins() {
        let defaults = PolicyDefaults::default();
        let nodes = PermissionNodes::default();
        let tiers = tiers();
        let resolver = TierPolicyResolver::new(&tiers, &defaults, &nodes);

        let both = perms(&["rtp.tier.silver", "rtp.tier.gold"]);
        assert_eq!(resolver.cooldown_seconds(&both), 600);
        let silver = perms(&["rtp.tier.silver"]);
        assert_eq!(resolver.cooldown_seconds(&silver), 1800);
    }

    #[test]
    fn unset_tier_fields_fall_back_to_defaults() {
        let defaults = PolicyDefaults::default();
        let nodes = PermissionNodes::default();
        let tiers = tiers();
        let resolver = TierPolicyResolver::new(&tiers, &defaults, &nodes);

        let gold = resolver.resolve(&perms(&["rtp.tier.gold", "rtp.tier.silver"]));
        // Gold sets no warmup; the default applies even though silver sets one.
        assert_eq!(gold.warmup_seconds, 5);
        assert_eq!(gold.distance.min, 1000.0);
        assert_eq!(gold.distance.max, 20_000.0);
        assert_eq!(gold.height, HeightBand { min: 0, max: 256 });

        let silver = resolver.resolve(&perms(&["rtp.tier.silver"]));
        assert_eq!(silver.warmup_seconds, 3);
        assert_eq!(silver.distance.min, 5000.0);
        assert_eq!(silver.height.max, 120);
    }

    #[test]
    fn bypass_nodes_zero_timers() {
        let config = RtpConfig {
            tiers: tiers(),
            ..Default::default()
        };
        let resolver = TierPolicyResolver::from_config(&config);

        let player = perms(&["rtp.tier.silver", "rtp.bypass.cooldown", "rtp.bypass.warmup"]);
        let policy = resolver.resolve(&player);
        assert_eq!(policy.cooldown_seconds, 0);
        assert_eq!(policy.warmup_seconds, 0);
        assert_eq!(policy.height.max, 120);
    }

    // -----------------------------------------------------------------------
    // Cooldowns
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_player_is_allowed() {
        let cooldowns = CooldownTracker::new();
        assert_eq!(
            cooldowns.check(&PlayerId::new("a"), 1_000, 3600),
            CooldownStatus::Allowed
        );
        assert!(cooldowns.is_empty());
    }

    #[test]
    fn blocked_until_cooldown_elapses() {
        let cooldowns = CooldownTracker::new();
        let a = PlayerId::new("a");
        cooldowns.record(&a, 100_000);

        assert_eq!(
            cooldowns.check(&a, 110_000, 3600),
            CooldownStatus::Blocked {
                remaining_ms: 3_590_000
            }
        );
        let later = cooldowns.check(&a, 1_000_000, 3600);
        assert_eq!(
            later,
            CooldownStatus::Blocked {
                remaining_ms: 2_700_000
            }
        );
        assert_eq!(
            cooldowns.check(&a, 100_000 + 3_600_000, 3600),
            CooldownStatus::Allowed
        );
        assert_eq!(cooldowns.check(&a, 100_001, 0), CooldownStatus::Allowed);
    }

    #[test]
    fn check_does_not_record() {
        let cooldowns = CooldownTracker::new();
        let a = PlayerId::new("a");
        cooldowns.check(&a, 5, 10);
        assert_eq!(cooldowns.last_teleport(&a), None);

        cooldowns.record(&a, 5);
        cooldowns.record(&a, 9);
        assert_eq!(cooldowns.last_teleport(&a), Some(9));
        assert_eq!(cooldowns.len(), 1);
    }

    #[test]
    fn clock_behind_record_counts_as_zero_elapsed() {
        let cooldowns = CooldownTracker::new();
        let a = PlayerId::new("a");
        cooldowns.record(&a, 10_000);
        assert_eq!(
            cooldowns.check(&a, 9_000, 5),
            CooldownStatus::Blocked {
                remaining_ms: 5_000
            }
        );
    }
}
