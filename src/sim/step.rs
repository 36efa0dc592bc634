/// The step function: advances the world by one frame of `dt` seconds.
///
/// Processing order:
///   1. Player movement (and footstep cue)
///   2. Player attack against world objects, then enemies
///   3. Enemy AI against the live player body
///   4. Prune destroyed enemies
///   5. Object animations (shake, break timers)
///   6. Prune destroyed objects
///   7. Camera
///
/// A paused or finished world does not advance.

use rand::Rng;
use tracing::{debug, info};

use crate::domain::ai::{self, Surroundings};
use crate::domain::entity::InputSnapshot;
use crate::domain::object::HitOutcome;
use crate::domain::player;
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step<R: Rng + ?Sized>(
    world: &mut WorldState,
    input: &InputSnapshot,
    dt: f32,
    rng: &mut R,
) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused { return vec![]; }

    let dt = dt.min(world.max_dt).max(0.0);
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.elapsed += dt;

    resolve_player_movement(world, input, dt, &mut events);
    resolve_attack(world, input, &mut events);
    resolve_enemies(world, dt, rng, &mut events);
    prune_enemies(world, &mut events);
    resolve_object_timers(world, dt);
    prune_objects(world, &mut events);
    world.follow_player();

    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, input: &InputSnapshot, dt: f32, events: &mut Vec<GameEvent>) {
    let cue = player::update(
        &mut world.player,
        input,
        dt,
        &world.grid,
        &world.objects,
        &world.tuning.player,
    );
    if let Some(surface) = cue {
        events.push(GameEvent::TerrainCue(surface));
    }
}

fn resolve_attack(world: &mut WorldState, input: &InputSnapshot, events: &mut Vec<GameEvent>) {
    if !input.attack { return; }
    let hits = match player::attack(
        &mut world.player,
        (input.cursor_x, input.cursor_y),
        &mut world.objects,
        &mut world.enemies,
        &world.tuning.player,
    ) {
        Some(h) => h,
        None => return,
    };
    events.push(GameEvent::AttackSwung { hits: hits.len() });

    for &(i, outcome) in &hits.objects {
        let (x, y) = (world.objects[i].body.x, world.objects[i].body.y);
        match outcome {
            HitOutcome::Damaged => events.push(GameEvent::ObjectHit { x, y }),
            HitOutcome::Breaking => events.push(GameEvent::CrateBreaking { x, y }),
            // Removal is reported when the object is pruned.
            HitOutcome::Destroyed | HitOutcome::Ignored => {}
        }
    }
    for &i in &hits.enemies {
        let e = &world.enemies[i].body;
        if !e.is_destroyed() {
            events.push(GameEvent::EnemyHit { x: e.x, y: e.y });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies<R: Rng + ?Sized>(world: &mut WorldState, dt: f32, rng: &mut R, events: &mut Vec<GameEvent>) {
    let env = Surroundings {
        grid: &world.grid,
        objects: &world.objects,
        world_px: (world.grid.width_px(), world.grid.height_px()),
    };

    for enemy in world.enemies.iter_mut() {
        if enemy.body.is_destroyed() { continue; }
        let Some(damage) = ai::update(enemy, &world.player.body, dt, &env, &world.tuning.enemy, rng) else {
            continue;
        };
        if world.player.body.is_destroyed() { continue; }
        world.player.body.take_damage(damage);
        events.push(GameEvent::PlayerHurt { health: world.player.body.health() });
        if world.player.body.is_destroyed() {
            events.push(GameEvent::PlayerKilled);
            world.phase = Phase::GameOver;
            info!(tick = world.tick, kills = world.kills, "player killed");
        }
    }
}

fn prune_enemies(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let before = world.enemies.len();
    for e in world.enemies.iter().filter(|e| e.body.is_destroyed()) {
        events.push(GameEvent::EnemyKilled { x: e.body.x, y: e.body.y });
    }
    world.enemies.retain(|e| !e.body.is_destroyed());
    let killed = before - world.enemies.len();
    if killed > 0 {
        world.kills += killed as u32;
        debug!(killed, remaining = world.enemies.len(), "enemies pruned");
    }
}

// ══════════════════════════════════════════════════════════════
// World objects
// ══════════════════════════════════════════════════════════════

fn resolve_object_timers(world: &mut WorldState, dt: f32) {
    for obj in world.objects.iter_mut() {
        obj.update(dt);
    }
}

fn prune_objects(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let before = world.objects.len();
    for o in world.objects.iter().filter(|o| o.is_destroyed()) {
        events.push(GameEvent::ObjectDestroyed { x: o.body.x, y: o.body.y });
    }
    world.objects.retain(|o| !o.is_destroyed());
    world.objects_cleared += (before - world.objects.len()) as u32;
}
