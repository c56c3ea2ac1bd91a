use std::time::Duration;

use avian2d::prelude::LayerMask;
use bevy::prelude::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::definition::*;
use super::projectile::*;
use super::resolve::*;
use super::*;
use crate::common::layers::{mask_of, Layer};
use crate::common::test_utils::{entities, run_system_once, CircleSpace};

fn rng() -> Pcg32 {
    Pcg32::seed_from_u64(42)
}

fn hitscan(pellets: u32, spread_degrees: f32) -> WeaponDefinition {
    WeaponDefinition {
        pellets,
        spread_degrees,
        range: 200.0,
        ..WeaponDefinition::rifle()
    }
}

fn rotate(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

// -----------------------------------------------------------------------------
// Spread
// -----------------------------------------------------------------------------

#[test]
fn zero_spread_returns_direction_unchanged() {
    let dir = Vec2::new(0.6, 0.8);
    assert_eq!(apply_spread(dir, 0.0, &mut rng()), dir);
    assert_eq!(apply_spread(dir, -5.0, &mut rng()), dir);
}

proptest! {
    #[test]
    fn spread_stays_inside_cone(spread in 0.1f32..180.0, heading in 0.0f32..360.0, seed in any::<u64>()) {
        let dir = rotate(Vec2::X, heading);
        let out = apply_spread(dir, spread, &mut Pcg32::seed_from_u64(seed));
        prop_assert!((out.length() - 1.0).abs() < 1e-4);
        prop_assert!(angle_between_degrees(dir, out) <= spread * 0.5 + 1e-2);
    }

    #[test]
    fn wedge_is_symmetric(half in 1.0f32..170.0, offset in 0.0f32..180.0, heading in 0.0f32..360.0) {
        let aim = rotate(Vec2::X, heading);
        let left = in_wedge(aim, rotate(aim, offset), half);
        let right = in_wedge(aim, rotate(aim, -offset), half);
        prop_assert_eq!(left, right);
    }
}

// -----------------------------------------------------------------------------
// Hitscan
// -----------------------------------------------------------------------------

#[test]
fn zero_spread_pellets_all_follow_the_aim() {
    let aim = Vec2::new(0.0, 1.0);
    let traces = fire_hitscan(
        &CircleSpace::default(),
        &hitscan(3, 0.0),
        Vec2::ZERO,
        aim,
        &mut rng(),
        |_| true,
    );

    assert_eq!(traces.len(), 3);
    for t in &traces {
        assert_eq!(t.dir, aim);
        assert_eq!(t.end, aim * 200.0);
        assert_eq!(t.damaged, None);
    }
}

#[test]
fn pellet_count_has_a_floor_of_one() {
    let traces = fire_hitscan(
        &CircleSpace::default(),
        &hitscan(0, 0.0),
        Vec2::ZERO,
        Vec2::X,
        &mut rng(),
        |_| true,
    );
    assert_eq!(traces.len(), 1);
}

#[test]
fn first_hit_takes_damage_and_cuts_the_tracer() {
    let mut world = World::new();
    let ids = entities(&mut world, 2);
    let (near, far) = (ids[0], ids[1]);
    let space = CircleSpace::default()
        .with(far, Vec2::new(150.0, 0.0), 10.0, Layer::Enemy)
        .with(near, Vec2::new(100.0, 0.0), 10.0, Layer::Enemy);

    let traces = fire_hitscan(&space, &hitscan(1, 0.0), Vec2::ZERO, Vec2::X, &mut rng(), |_| true);

    assert_eq!(traces[0].damaged, Some(near));
    assert!((traces[0].end - Vec2::new(90.0, 0.0)).length() < 1e-3);
}

#[test]
fn walls_occlude_targets_behind_them() {
    let mut world = World::new();
    let ids = entities(&mut world, 2);
    let (wall, enemy) = (ids[0], ids[1]);
    let space = CircleSpace::default()
        .with(wall, Vec2::new(50.0, 0.0), 5.0, Layer::World)
        .with(enemy, Vec2::new(100.0, 0.0), 10.0, Layer::Enemy);

    let traces = fire_hitscan(&space, &hitscan(1, 0.0), Vec2::ZERO, Vec2::X, &mut rng(), |e| {
        e == enemy
    });

    assert_eq!(traces[0].damaged, None);
    assert!((traces[0].end - Vec2::new(45.0, 0.0)).length() < 1e-3);

    // Without a block mask the wall is invisible to the ray.
    let no_block = WeaponDefinition { block_layers: vec![], ..hitscan(1, 0.0) };
    let traces = fire_hitscan(&space, &no_block, Vec2::ZERO, Vec2::X, &mut rng(), |e| e == enemy);
    assert_eq!(traces[0].damaged, Some(enemy));
}

#[test]
fn hit_without_health_sink_only_stops_the_tracer() {
    let mut world = World::new();
    let prop = entities(&mut world, 1)[0];
    let space = CircleSpace::default().with(prop, Vec2::new(60.0, 0.0), 10.0, Layer::Enemy);

    let traces = fire_hitscan(&space, &hitscan(1, 0.0), Vec2::ZERO, Vec2::X, &mut rng(), |_| false);
    assert_eq!(traces[0].damaged, None);
    assert!((traces[0].end - Vec2::new(50.0, 0.0)).length() < 1e-3);
}

// -----------------------------------------------------------------------------
// Melee
// -----------------------------------------------------------------------------

#[test]
fn wedge_edges_are_inclusive_and_tight() {
    let aim = Vec2::X;
    for half in [15.0, 45.0, 50.0, 90.0] {
        assert!(in_wedge(aim, rotate(aim, half), half), "+{half}");
        assert!(in_wedge(aim, rotate(aim, -half), half), "-{half}");
        assert!(!in_wedge(aim, rotate(aim, half + 0.01), half), "+{half}+e");
        assert!(!in_wedge(aim, rotate(aim, -(half + 0.01)), half), "-{half}-e");
    }
}

#[test]
fn wedge_edge_has_no_visible_slack() {
    for heading in [0.0, 33.0, 210.0] {
        let aim = rotate(Vec2::X, heading);
        for half in [30.0, 50.0, 90.0] {
            assert!(in_wedge(aim, rotate(aim, half), half), "{heading}: +{half}");
            assert!(!in_wedge(aim, rotate(aim, half + 0.0005), half), "{heading}: +{half}+0.0005");
            assert!(!in_wedge(aim, rotate(aim, -(half + 0.0005)), half), "{heading}: -{half}-0.0005");
        }
    }
}

#[test]
fn melee_keeps_only_targets_inside_the_arc() {
    let mut world = World::new();
    let ids = entities(&mut world, 3);
    let (ahead, side, behind) = (ids[0], ids[1], ids[2]);
    let positions = [
        (ahead, Vec2::new(30.0, 5.0)),
        (side, Vec2::new(0.0, 30.0)),
        (behind, Vec2::new(-10.0, 0.0)),
    ];
    let space = positions
        .iter()
        .fold(CircleSpace::default(), |s, &(e, p)| s.with(e, p, 8.0, Layer::Enemy));

    let swing = MeleeSwing {
        origin: Vec2::ZERO,
        aim: Vec2::X,
        arc_degrees: 100.0,
        range: 48.0,
        hit_mask: mask_of(&[Layer::Enemy]),
    };
    let position_of = |e: Entity| positions.iter().find(|(id, _)| *id == e).map(|(_, p)| *p);

    let hit = melee_targets(&space, &swing, position_of, |_| true);
    assert_eq!(hit, vec![ahead]);

    // A wider swing reaches the flank (90 degrees off aim).
    let wide = MeleeSwing { arc_degrees: 180.0, ..swing };
    let mut hit = melee_targets(&space, &wide, position_of, |_| true);
    hit.sort();
    let mut expected = vec![ahead, side];
    expected.sort();
    assert_eq!(hit, expected);
}

#[test]
fn melee_query_circle_sits_ahead_of_the_swinger() {
    let swing = MeleeSwing {
        origin: Vec2::new(10.0, 10.0),
        aim: Vec2::Y,
        arc_degrees: 90.0,
        range: 50.0,
        hit_mask: LayerMask::ALL,
    };
    assert_eq!(swing.query_center(), Vec2::new(10.0, 40.0));
}

// -----------------------------------------------------------------------------
// Holder: fire-rate gate and switching
// -----------------------------------------------------------------------------

fn armed() -> WeaponHolder {
    let mut h = WeaponHolder::new(Loadout::default());
    h.firing = true;
    h
}

#[test]
fn fire_rate_gates_shots() {
    let mut h = armed();
    // Rifle: 8 shots/s -> 0.125 s between shots.
    let fired: Vec<bool> = (0..5).map(|_| h.trigger(0.05).is_some()).collect();
    assert_eq!(fired, vec![true, false, false, true, false]);
}

#[test]
fn no_fire_without_trigger_held() {
    let mut h = WeaponHolder::new(Loadout::default());
    assert_eq!(h.trigger(1.0), None);
}

#[test]
fn switching_resets_cooldown_and_wraps() {
    let mut h = armed();
    assert_eq!(h.trigger(0.0), Some(0));
    assert!(h.cooldown() > 0.0);

    h.next();
    assert_eq!(h.current_index(), 1);
    assert_eq!(h.cooldown(), 0.0);
    assert_eq!(h.trigger(0.0), Some(1));

    h.prev();
    h.prev();
    assert_eq!(h.current_index(), 3);
    h.next();
    assert_eq!(h.current_index(), 0);

    h.select(99);
    assert_eq!(h.current_index(), 3);
    assert_eq!(h.current().map(|w| w.name.as_str()), Some("Blade"));
}

#[test]
fn empty_loadout_or_disabled_holder_is_inert() {
    let mut empty = WeaponHolder::new(Loadout::new(vec![]));
    empty.firing = true;
    empty.next();
    empty.prev();
    empty.select(2);
    assert_eq!(empty.trigger(1.0), None);

    let mut h = armed();
    h.disable();
    assert!(!h.firing);
    assert_eq!(h.trigger(1.0), None);
}

// -----------------------------------------------------------------------------
// Definitions
// -----------------------------------------------------------------------------

#[test]
fn cooldown_has_a_rate_floor() {
    let slow = WeaponDefinition { fire_rate: 0.0001, ..WeaponDefinition::rifle() };
    assert_eq!(slow.cooldown_secs(), 100.0);
}

#[test]
fn pitch_scales_with_fire_rate_within_clamp() {
    let audio = WeaponAudio::default();
    assert!((audio.pitch_for(10.0) - 1.0).abs() < 1e-6);
    assert!((audio.pitch_for(11.0) - 1.1).abs() < 1e-6);
    assert!((audio.pitch_for(100.0) - 1.3).abs() < 1e-6);
    assert!((audio.pitch_for(1.0) - 0.7).abs() < 1e-6);

    let no_ref = WeaponAudio { pitch_ref_fire_rate: 0.0, ..audio };
    assert_eq!(no_ref.pitch_for(5.0), 1.0);
}

#[test]
fn default_loadout_has_one_of_each_kind() {
    let l = Loadout::default();
    assert_eq!(l.len(), 4);
    assert!(matches!(l.get(0).unwrap().kind, WeaponKind::Hitscan));
    assert!(l.get(1).unwrap().pellet_count() > 1);
    assert!(matches!(
        l.get(2).unwrap().kind,
        WeaponKind::Projectile { explosion_radius: Some(_), .. }
    ));
    assert!(matches!(l.get(3).unwrap().kind, WeaponKind::Melee { .. }));
}

#[test]
fn loadout_parses_from_json() {
    let json = r#"[
        {"name": "Pistol", "kind": "Hitscan", "fire_rate": 4.0, "damage": 1,
         "range": 300.0, "hit_layers": ["Enemy"], "block_layers": ["World"]},
        {"name": "Grenade", "kind": "Projectile", "speed": 200.0, "lifetime": 1.5,
         "explosion_radius": 40.0, "fire_rate": 1.0, "damage": 2, "hit_layers": ["Enemy"]}
    ]"#;

    let l = Loadout::from_json(json).unwrap();
    assert_eq!(l.len(), 2);

    let pistol = l.get(0).unwrap();
    assert_eq!(pistol.pellet_count(), 1);
    assert_eq!(pistol.audio, WeaponAudio::default());

    let grenade = l.get(1).unwrap();
    assert_eq!(
        grenade.kind,
        WeaponKind::Projectile {
            speed: 200.0,
            lifetime: 1.5,
            radius: 5.0,
            explosion_radius: Some(40.0),
        }
    );
    assert_eq!(grenade.block_mask(), LayerMask::NONE);
}

#[test]
fn loadout_rejects_bad_input() {
    let parse = Loadout::from_json("not json").unwrap_err();
    assert!(matches!(parse, LoadoutError::Parse(_)));
    assert!(std::error::Error::source(&parse).is_some());
    assert!(parse.to_string().starts_with("loadout parse error"));

    let zero_rate = r#"[{"name": "Dud", "kind": "Hitscan", "fire_rate": 0.0,
        "damage": 1, "hit_layers": []}]"#;
    let err = Loadout::from_json(zero_rate).unwrap_err();
    assert!(matches!(err, LoadoutError::InvalidWeapon { ref name, .. } if name == "Dud"));
    assert!(err.to_string().contains("fire_rate"));
}

// -----------------------------------------------------------------------------
// Projectiles
// -----------------------------------------------------------------------------

fn direct_projectile() -> Projectile {
    Projectile {
        kind: ProjectileKind::Direct,
        dir: Vec2::X,
        speed: 100.0,
        damage: 2,
        radius: 5.0,
        hit_mask: mask_of(&[Layer::Enemy]),
        block_mask: mask_of(&[Layer::World]),
        explosion_volume: 0.4,
    }
}

#[test]
fn rocket_definition_builds_area_projectile() {
    let p = Projectile::from_definition(&WeaponDefinition::rocket_launcher(), Vec2::new(0.0, 3.0))
        .unwrap();
    assert_eq!(p.kind, ProjectileKind::AreaOfEffect { radius: 60.0 });
    assert_eq!(p.dir, Vec2::Y);
    assert_eq!(p.damage, 3);
    assert!(Projectile::from_definition(&WeaponDefinition::rifle(), Vec2::X).is_none());
}

#[test]
fn direct_impact_damages_one_target() {
    let mut world = World::new();
    let ids = entities(&mut world, 2);
    let space = CircleSpace::default()
        .with(ids[0], Vec2::new(3.0, 0.0), 4.0, Layer::Enemy)
        .with(ids[1], Vec2::new(-3.0, 0.0), 4.0, Layer::Enemy);

    let impact = resolve_impact(&space, Vec2::ZERO, &direct_projectile(), |_| true).unwrap();
    assert_eq!(impact.damaged.len(), 1);
    assert_eq!(impact.explosion, None);
}

#[test]
fn targets_without_health_do_not_stop_a_projectile() {
    let mut world = World::new();
    let prop = entities(&mut world, 1)[0];
    let space = CircleSpace::default().with(prop, Vec2::ZERO, 4.0, Layer::Enemy);

    assert_eq!(resolve_impact(&space, Vec2::ZERO, &direct_projectile(), |_| false), None);
    assert_eq!(
        resolve_impact(&CircleSpace::default(), Vec2::ZERO, &direct_projectile(), |_| true),
        None
    );
}

#[test]
fn walls_stop_projectiles_without_damage() {
    let mut world = World::new();
    let wall = entities(&mut world, 1)[0];
    let space = CircleSpace::default().with(wall, Vec2::new(4.0, 0.0), 2.0, Layer::World);

    let impact = resolve_impact(&space, Vec2::ZERO, &direct_projectile(), |_| true).unwrap();
    assert!(impact.damaged.is_empty());
}

#[test]
fn area_impact_splashes_everything_in_radius() {
    let mut world = World::new();
    let ids = entities(&mut world, 4);
    let space = CircleSpace::default()
        .with(ids[0], Vec2::new(3.0, 0.0), 4.0, Layer::Enemy)
        .with(ids[1], Vec2::new(30.0, 0.0), 4.0, Layer::Enemy)
        .with(ids[2], Vec2::new(0.0, -40.0), 4.0, Layer::Enemy)
        .with(ids[3], Vec2::new(500.0, 0.0), 4.0, Layer::Enemy);
    let rocket = Projectile {
        kind: ProjectileKind::AreaOfEffect { radius: 40.0 },
        ..direct_projectile()
    };

    let impact = resolve_impact(&space, Vec2::ZERO, &rocket, |_| true).unwrap();
    let mut damaged = impact.damaged;
    damaged.sort();
    let mut expected = ids[..3].to_vec();
    expected.sort();
    assert_eq!(damaged, expected);
    assert_eq!(impact.explosion, Some(Vec2::ZERO));
}

#[test]
fn projectiles_fly_straight_and_expire() {
    let mut world = World::new();
    let mut time = Time::<()>::default();
    time.advance_by(Duration::from_secs_f32(0.5));
    world.insert_resource(time);

    let def = WeaponDefinition::rocket_launcher();
    let e = run_system_once(&mut world, move |mut commands: Commands| {
        spawn_projectile(&mut commands, &def, Vec2::new(1.0, 2.0), Vec2::Y)
    })
    .unwrap();

    run_system_once(&mut world, advance_projectiles);
    let pos = world.get::<Transform>(e).unwrap().translation.truncate();
    assert!((pos - Vec2::new(1.0, 212.0)).length() < 1e-3);

    // 2.5 s lifetime: five half-second ticks.
    for _ in 0..4 {
        run_system_once(&mut world, expire_projectiles);
    }
    assert!(world.get_entity(e).is_ok());
    run_system_once(&mut world, expire_projectiles);
    assert!(world.get_entity(e).is_err());
}

#[test]
fn unchecked_lifetimes_expire_at_once() {
    let mut world = World::new();
    let mut time = Time::<()>::default();
    time.advance_by(Duration::from_millis(16));
    world.insert_resource(time);

    let spawned: Vec<Entity> = [-1.0, f32::NAN, f32::INFINITY]
        .into_iter()
        .filter_map(|lifetime| {
            let def = WeaponDefinition {
                kind: WeaponKind::Projectile {
                    speed: 100.0,
                    lifetime,
                    radius: 5.0,
                    explosion_radius: None,
                },
                ..WeaponDefinition::rifle()
            };
            run_system_once(&mut world, move |mut commands: Commands| {
                spawn_projectile(&mut commands, &def, Vec2::ZERO, Vec2::X)
            })
        })
        .collect();
    assert_eq!(spawned.len(), 3);

    run_system_once(&mut world, expire_projectiles);
    assert!(spawned.iter().all(|&e| world.get_entity(e).is_err()));
}
