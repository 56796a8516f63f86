//! SafeLocationFinder tests

mod common;

#[cfg(test)]
mod tests {
    use super::common::{flat, void, FnTerrain};
    use std::time::Duration;
    use world_rtp::{
        config::SafetyRule,
        error::RtpError,
        finder::SafeLocationFinder,
        tier::{DistanceBand, HeightBand},
        types::BlockState,
        world::World,
    };

    const BAND: DistanceBand = DistanceBand {
        min: 100.0,
        max: 200.0,
    };
    const HEIGHT: HeightBand = HeightBand { min: 0, max: 256 };

    // -----------------------------------------------------------------------
    // Sampling
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn samples_stay_in_band() {
        let world = World::spawn("w", flat(64));
        let finder = SafeLocationFinder::with_seed(world, Duration::ZERO, SafetyRule::Strict, 1);

        for attempt in 1..=200 {
            let c = finder.sample((10.0, -20.0), BAND, attempt);
            assert!(c.distance >= 100.0 && c.distance < 200.0);
            assert!(c.angle >= 0.0 && c.angle < std::f64::consts::TAU);
            let dx = c.target_x - 10.0;
            let dz = c.target_z + 20.0;
            assert!(((dx * dx + dz * dz).sqrt() - c.distance).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn empty_band_uses_minimum() {
        let world = World::spawn("w", flat(64));
        let finder = SafeLocationFinder::with_seed(world, Duration::ZERO, SafetyRule::Strict, 1);
        let band = DistanceBand {
            min: 300.0,
            max: 300.0,
        };
        assert_eq!(finder.sample((0.0, 0.0), band, 1).distance, 300.0);
    }

    #[tokio::test]
    async fn seeded_finders_agree() {
        let world = World::spawn("w", flat(64));
        let a = SafeLocationFinder::with_seed(world.clone(), Duration::ZERO, SafetyRule::Strict, 99);
        let b = SafeLocationFinder::with_seed(world, Duration::ZERO, SafetyRule::Strict, 99);
        assert_eq!(a.sample((0.0, 0.0), BAND, 1), b.sample((0.0, 0.0), BAND, 1));
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn flat_ground_succeeds_first_try() {
        let terrain = flat(64);
        let world = World::spawn("w", terrain.clone());
        let finder =
            SafeLocationFinder::with_seed(world, Duration::from_millis(500), SafetyRule::Strict, 3);

        let mut seen = Vec::new();
        let spot = finder
            .find_safe_spot((0.0, 0.0), BAND, HEIGHT, 5, |a, m| seen.push((a, m)))
            .await
            .unwrap();

        assert_eq!(seen, vec![(1, 5)]);
        assert_eq!(spot.ground_y, 64);
        assert_eq!(spot.position.y, 65.0);
        assert_eq!(spot.attempts, 1);
        assert_eq!(terrain.loads(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn makes_exactly_max_attempts() {
        let terrain = void();
        let world = World::spawn("w", terrain.clone());
        let finder = SafeLocationFinder::with_seed(world, Duration::ZERO, SafetyRule::Strict, 3);

        let mut attempts = 0;
        let err = finder
            .find_safe_spot((0.0, 0.0), BAND, HEIGHT, 4, |_, _| attempts += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, RtpError::SearchExhausted { attempts: 4 }));
        assert_eq!(attempts, 4);
        assert_eq!(terrain.loads(), 36);
    }

    #[tokio::test(start_paused = true)]
    async fn flooded_world_only_passes_relaxed_rule() {
        let flooded = || {
            FnTerrain::new(|pos| match pos.y {
                y if y <= 64 => BlockState::solid(1),
                65 | 66 => BlockState::fluid(1),
                _ => BlockState::AIR,
            })
        };

        let strict = SafeLocationFinder::with_seed(
            World::spawn("w", flooded()),
            Duration::ZERO,
            SafetyRule::Strict,
            3,
        );
        assert!(strict
            .find_safe_spot((0.0, 0.0), BAND, HEIGHT, 3, |_, _| {})
            .await
            .is_err());

        let relaxed = SafeLocationFinder::with_seed(
            World::spawn("w", flooded()),
            Duration::ZERO,
            SafetyRule::Relaxed,
            3,
        );
        let spot = relaxed
            .find_safe_spot((0.0, 0.0), BAND, HEIGHT, 3, |_, _| {})
            .await
            .unwrap();
        assert_eq!(spot.ground_y, 64);
    }

    #[tokio::test(start_paused = true)]
    async fn topmost_safe_ground_wins() {
        // A floating slab at 100 over ground at 64.
        let terrain = FnTerrain::new(|pos| {
            if pos.y <= 64 || pos.y == 100 {
                BlockState::solid(1)
            } else {
                BlockState::AIR
            }
        });
        let finder = SafeLocationFinder::with_seed(
            World::spawn("w", terrain),
            Duration::ZERO,
            SafetyRule::Strict,
            3,
        );

        let spot = finder
            .find_safe_spot((0.0, 0.0), BAND, HEIGHT, 1, |_, _| {})
            .await
            .unwrap();
        assert_eq!(spot.ground_y, 100);

        let low = HeightBand { min: 0, max: 80 };
        let spot = finder
            .find_safe_spot((0.0, 0.0), BAND, low, 1, |_, _| {})
            .await
            .unwrap();
        assert_eq!(spot.ground_y, 64);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_world_fails_search() {
        let world = World::spawn("w", flat(64));
        let finder = SafeLocationFinder::with_seed(world.clone(), Duration::ZERO, SafetyRule::Strict, 3);
        world.shutdown();

        let err = finder
            .find_safe_spot((0.0, 0.0), BAND, HEIGHT, 3, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, RtpError::WorldClosed));
    }
}
