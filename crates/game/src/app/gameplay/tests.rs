    use super::*;
    use engine::{Intent, Session, TerrainBand, TerrainKind, WorldBounds};

    fn walled_field(radius: i32, kind: TerrainKind) -> WorldConfig {
        WorldConfig {
            bounds: WorldBounds::Bordered { radius },
            terrain_bands: vec![TerrainBand { below: 1.0, kind }],
            ..WorldConfig::default()
        }
    }

    fn loaded(
        config: &WorldConfig,
        seed: u64,
        npc_count: u32,
    ) -> (RoguelikeScene, World, MessageLog) {
        let mut world = World::new(config).expect("world");
        let mut log = MessageLog::with_capacity(config.log_capacity);
        let mut scene = RoguelikeScene::new(seed, npc_count);
        scene.load(&mut world, &mut log).expect("scene load");
        (scene, world, log)
    }

    fn positions(world: &World, handles: &[EntityHandle]) -> Vec<Position> {
        handles
            .iter()
            .map(|handle| world.entity(*handle).expect("live wanderer").position)
            .collect()
    }

    #[test]
    fn load_places_player_and_wanderers() {
        let config = walled_field(16, TerrainKind::Ground);
        let (scene, world, log) = loaded(&config, 7, 5);

        let player = world.entity(world.player()).expect("player");
        assert_eq!(player.kind(), Some(&HUMAN));
        assert_eq!(player.position, Position::ORIGIN);
        assert_eq!(scene.npcs.len(), 5);
        assert_eq!(world.entities().live_count(), 6);
        assert_eq!(log.latest(), Some("Welcome to Mahou."));

        let spots = positions(&world, &scene.npcs);
        for (index, spot) in spots.iter().enumerate() {
            assert!(config.bounds.contains(spot.x, spot.y));
            assert_ne!(*spot, player.position);
            assert!(!spots[index + 1..].contains(spot), "two wanderers share {spot:?}");
        }
    }

    #[test]
    fn wanderer_types_cycle_rats_and_goblins() {
        let names: Vec<&str> = (0..6)
            .map(|index| RoguelikeScene::wanderer_type(index).name)
            .collect();
        assert_eq!(names, ["rat", "rat", "goblin", "rat", "rat", "goblin"]);
    }

    #[test]
    fn same_seed_gives_same_layout_and_walk() {
        let config = walled_field(8, TerrainKind::Grass);
        let (mut first, mut first_world, mut first_log) = loaded(&config, 42, 6);
        let (mut second, mut second_world, mut second_log) = loaded(&config, 42, 6);
        assert_eq!(
            positions(&first_world, &first.npcs),
            positions(&second_world, &second.npcs)
        );

        for turn in 1..=20 {
            first.on_turn(turn, &mut first_world, &mut first_log);
            second.on_turn(turn, &mut second_world, &mut second_log);
        }
        assert_eq!(
            positions(&first_world, &first.npcs),
            positions(&second_world, &second.npcs)
        );
    }

    #[test]
    fn wanderers_only_step_onto_free_tiles() {
        let config = walled_field(3, TerrainKind::Ground);
        let (mut scene, mut world, mut log) = loaded(&config, 3, 8);
        let start = positions(&world, &scene.npcs);

        for turn in 1..=200 {
            scene.on_turn(turn, &mut world, &mut log);
        }

        let end = positions(&world, &scene.npcs);
        assert_ne!(start, end, "nobody moved in 200 turns");
        for (handle, spot) in scene.npcs.iter().zip(&end) {
            assert!(config.bounds.contains(spot.x, spot.y));
            assert_eq!(world.tile_at(*spot).occupant, *handle);
        }
        let player = world.player_position().expect("player");
        assert_eq!(world.tile_at(player).occupant, world.player());
    }

    #[test]
    fn killed_wanderers_are_forgotten() {
        let config = walled_field(16, TerrainKind::Ground);
        let (mut scene, mut world, mut log) = loaded(&config, 11, 3);
        let victim = scene.npcs[1];

        assert!(world.kill(victim));
        scene.on_turn(1, &mut world, &mut log);

        assert_eq!(scene.npcs.len(), 2);
        assert!(!scene.npcs.contains(&victim));
    }

    #[test]
    fn load_fails_when_no_tile_is_free() {
        let config = walled_field(4, TerrainKind::Rock);
        let mut world = World::new(&config).expect("world");
        let mut log = MessageLog::with_capacity(4);
        let mut scene = RoguelikeScene::new(1, 2);

        let error = scene.load(&mut world, &mut log).expect_err("solid rock");
        assert!(matches!(
            error,
            SceneError::NoFreeTile {
                radius: PLAYER_SPAWN_SEARCH_RADIUS,
                ..
            }
        ));
        assert!(world.entities().is_empty());
    }

    #[test]
    fn full_entity_table_stops_wanderer_spawns() {
        let config = WorldConfig {
            entity_capacity: 3,
            ..walled_field(16, TerrainKind::Ground)
        };
        let (scene, world, _log) = loaded(&config, 5, 6);

        assert_eq!(scene.npcs.len(), 2);
        assert_eq!(world.entities().len(), 3);
    }

    #[test]
    fn blocked_moves_explain_themselves() {
        let config = walled_field(16, TerrainKind::Ground);
        let (mut scene, world, mut log) = loaded(&config, 9, 3);

        scene.on_player_blocked(MoveOutcome::Occupied(scene.npcs[2]), &world, &mut log);
        assert_eq!(log.latest(), Some("A goblin blocks the way."));

        scene.on_player_blocked(MoveOutcome::Impassable, &world, &mut log);
        assert_eq!(log.latest(), Some("The rock does not budge."));

        let before = log.len();
        scene.on_player_blocked(MoveOutcome::Absent, &world, &mut log);
        assert_eq!(log.len(), before);
    }

    #[test]
    fn debug_title_reports_turn_and_position() {
        let config = walled_field(16, TerrainKind::Ground);
        let (scene, world, _log) = loaded(&config, 9, 1);

        assert_eq!(
            scene.debug_title(&world, 12).as_deref(),
            Some("Mahou | turn 12 | (0, 0) | 2 alive")
        );
    }

    #[test]
    fn session_walks_player_into_border() {
        let config = walled_field(2, TerrainKind::Ground);
        let mut session = Session::new(&config, build_scene(&config)).expect("session");
        session.start().expect("start");

        let report = session.apply_intents([Intent::Move { dx: 0, dy: -1 }; 6]);

        assert!(report.turns_advanced <= 2);
        assert_eq!(session.turn(), report.turns_advanced);
        let player = session.world().player_position().expect("player");
        assert!(player.y >= -2);
        assert!(!report.quit);
        assert!(session.log().len() > 2);
    }
