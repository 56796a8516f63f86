//! World context and console tests

mod common;

#[cfg(test)]
mod tests {
    use super::common::{flat, test_config, Harness};
    use tokio_test::{assert_err, assert_ok};
    use world_rtp::{
        console::{parse_line, ConsoleAgent},
        error::RtpError,
        types::{PlayerId, Vec3},
        world::{PlayerEntity, World},
    };

    // -----------------------------------------------------------------------
    // World context
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn tasks_run_in_submission_order() {
        let world = World::spawn("w", flat(64));
        let id = PlayerId::new("a");
        let entity = PlayerEntity::new(id.clone(), "A", Vec3::zero());
        assert_ok!(world.execute(move |s| s.add_player(entity)));

        for x in 1..=10 {
            let id = id.clone();
            assert_ok!(world.execute(move |s| {
                let _ = s.move_player(&id, Vec3::new(x as f64, 0.0, 0.0));
            }));
        }

        let (pos, frame) = world
            .call(move |s| (s.player(&id).map(|p| p.position), s.frame()))
            .await
            .unwrap();
        assert_eq!(pos.unwrap().x, 10.0);
        assert_eq!(frame, 12);
    }

    #[tokio::test]
    async fn missing_entity_is_gone() {
        let world = World::spawn("w", flat(64));
        let ghost = PlayerId::new("ghost");
        let result = world
            .call(move |s| s.teleport(&ghost, Vec3::zero()))
            .await
            .unwrap();
        assert!(matches!(result, Err(RtpError::EntityGone(ref id)) if id.as_str() == "ghost"));
    }

    #[tokio::test]
    async fn name_lookup_ignores_case() {
        let world = World::spawn("w", flat(64));
        let entity = PlayerEntity::new(PlayerId::new("p1"), "Steve", Vec3::zero());
        world.call(move |s| s.add_player(entity)).await.unwrap();

        let found = world
            .call(|s| s.find_player_by_name("sTEVE").map(|p| p.id.clone()))
            .await
            .unwrap();
        assert_eq!(found, Some(PlayerId::new("p1")));
    }

    #[tokio::test]
    async fn closed_world_refuses_work() {
        let world = World::spawn("w", flat(64));
        world.shutdown();
        let result = world.call(|s| s.player_count()).await;
        assert!(matches!(result, Err(RtpError::WorldClosed)));

        tokio::task::yield_now().await;
        assert!(world.is_closed());
        assert_err!(world.execute(|_| {}));
    }

    // -----------------------------------------------------------------------
    // Console
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn console_commands_drive_the_world() {
        let h = Harness::new(test_config(), flat(64));
        let console = ConsoleAgent::new(h.service.clone(), h.world.clone(), Vec3::new(0.0, 65.0, 0.0));

        for line in ["join Steve rtp.use", "move steve 4 65 -2"] {
            assert_ok!(console.execute(parse_line(line).unwrap()).await);
        }
        assert_eq!(h.position(&PlayerId::new("steve")).await, Vec3::new(4.0, 65.0, -2.0));
        assert_ok!(console.execute(parse_line("where steve").unwrap()).await);
        assert_ok!(console.execute(parse_line("stats").unwrap()).await);

        assert_ok!(console.execute(parse_line("leave steve").unwrap()).await);
        assert_err!(console.execute(parse_line("leave steve").unwrap()).await);
        assert_err!(console.execute(parse_line("where steve").unwrap()).await);
    }
}
