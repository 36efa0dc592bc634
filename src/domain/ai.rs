/// Enemy AI: a three-state machine re-evaluated every frame.
///
///   - **Attack** if the player is within `attack_range`
///   - **Chase** if within `detection_range`
///   - **Idle** otherwise
///
/// Distance is measured between the top-left corners of the two bodies.
/// There is no hysteresis: an enemy on a range boundary may switch state
/// every frame.
///
/// Idle enemies either wander (a random cardinal direction, re-rolled every
/// wander interval) or, when they carry a `PathFollower`, walk toward the
/// follower's position scaled to the world. Both move at half speed.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::EnemyTuning;
use super::collision::{move_axis_separated, normalize};
use super::entity::{Direction, EnemyState, Entity, EntityKind, Pose};
use super::grid::TileGrid;
use super::object::{GameObject, WorldObject};

/// Shared read-only context for one enemy update.
pub struct Surroundings<'a> {
    pub grid: &'a TileGrid,
    pub objects: &'a [WorldObject],
    /// World size in pixels, for scaling patrol waypoints.
    pub world_px: (f32, f32),
}

/// State for the given corner-to-corner distance.
pub fn classify(distance: f32, tuning: &EnemyTuning) -> EnemyState {
    if distance <= tuning.attack_range {
        EnemyState::Attack
    } else if distance <= tuning.detection_range {
        EnemyState::Chase
    } else {
        EnemyState::Idle
    }
}

/// Advance one enemy by `dt` seconds against the current player body.
/// Returns the damage dealt to the player this frame, if any.
pub fn update<R: Rng + ?Sized>(
    enemy: &mut Entity,
    player: &GameObject,
    dt: f32,
    env: &Surroundings,
    tuning: &EnemyTuning,
    rng: &mut R,
) -> Option<i32> {
    enemy.tick_attack_timers(dt, tuning.attack_anim);
    enemy.tick_flinch(dt);

    let dx = player.x - enemy.body.x;
    let dy = player.y - enemy.body.y;
    let state = classify((dx * dx + dy * dy).sqrt(), tuning);

    let EntityKind::Enemy(brain) = &mut enemy.kind else { return None };
    brain.state = state;

    let mut moved = false;
    let mut damage = None;
    match state {
        EnemyState::Idle => {
            let half = tuning.move_speed * 0.5;
            let step = if let Some(path) = brain.patrol.as_mut() {
                path.update(dt * 1000.0);
                if path.has_reached_end() {
                    path.reset();
                }
                let (px, py) = path.current_position();
                let tx = px * env.world_px.0 - enemy.body.x;
                let ty = py * env.world_px.1 - enemy.body.y;
                let dist = (tx * tx + ty * ty).sqrt();
                if dist > 0.0 {
                    enemy.direction = Direction::toward(tx, ty);
                }
                // Never overshoot the target.
                let len = (half * dt).min(dist);
                let (ux, uy) = normalize(tx, ty);
                (ux * len, uy * len)
            } else {
                brain.idle_elapsed += dt;
                if brain.idle_elapsed > brain.wander_interval {
                    brain.idle_elapsed = 0.0;
                    if let Some(&dir) = Direction::ALL.choose(rng) {
                        enemy.direction = dir;
                    }
                }
                let (ux, uy) = enemy.direction.unit();
                (ux * half * dt, uy * half * dt)
            };
            let (mx, my) = move_axis_separated(env.grid, env.objects, &mut enemy.body, step.0, step.1);
            moved = mx || my;
        }
        EnemyState::Chase => {
            // Chase only runs beyond attack range, so the distance is non-zero.
            let (ux, uy) = normalize(dx, dy);
            enemy.direction = Direction::toward(ux, uy);
            let speed = tuning.move_speed * dt;
            let (mx, my) = move_axis_separated(env.grid, env.objects, &mut enemy.body, ux * speed, uy * speed);
            moved = mx || my;
        }
        EnemyState::Attack => {
            if enemy.can_attack() {
                enemy.begin_attack(tuning.attack_cooldown);
                damage = Some(tuning.attack_damage);
            }
            enemy.direction = Direction::toward(dx, dy);
        }
    }

    enemy.pose = if enemy.is_attacking() {
        Pose::Attack
    } else if moved {
        Pose::Walk
    } else {
        Pose::Idle
    };
    damage
}

/// Wander interval for a freshly spawned enemy.
pub fn wander_interval<R: Rng + ?Sized>(tuning: &EnemyTuning, rng: &mut R) -> f32 {
    if tuning.randomize_wander {
        let (lo, hi) = tuning.wander_range;
        if hi > lo { rng.gen_range(lo..hi) } else { lo }
    } else {
        tuning.wander_interval
    }
}
