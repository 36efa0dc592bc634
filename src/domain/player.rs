/// Player update: movement, terrain cues and the radial attack.
///
/// Movement keys each add one unit on their axis; the sum is normalized so a
/// diagonal is no faster than a straight line, then resolved axis by axis.
/// Facing follows the keys in the order up, down, left, right, so with two
/// keys held the later one in that list wins.

use crate::config::PlayerTuning;
use super::collision::{in_slowing_cover, move_axis_separated, normalize};
use super::entity::{Direction, Entity, EntityKind, InputSnapshot, Pose, Surface};
use super::grid::TileGrid;
use super::object::{HitOutcome, WorldObject};

/// Result of one swing. Indices point into the slices passed to `attack`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttackHits {
    pub objects: Vec<(usize, HitOutcome)>,
    pub enemies: Vec<usize>,
}

impl AttackHits {
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.enemies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.enemies.len()
    }
}

/// Advance the player by `dt` seconds. Returns the footstep cue to play,
/// if one is due.
pub fn update(
    player: &mut Entity,
    input: &InputSnapshot,
    dt: f32,
    grid: &TileGrid,
    objects: &[WorldObject],
    tuning: &PlayerTuning,
) -> Option<Surface> {
    player.tick_attack_timers(dt, tuning.attack_anim);

    let (mut dx, mut dy) = (0.0, 0.0);
    if input.up {
        dy -= 1.0;
        player.direction = Direction::Up;
    }
    if input.down {
        dy += 1.0;
        player.direction = Direction::Down;
    }
    if input.left {
        dx -= 1.0;
        player.direction = Direction::Left;
    }
    if input.right {
        dx += 1.0;
        player.direction = Direction::Right;
    }
    let (dx, dy) = normalize(dx, dy);

    let b = &player.body;
    let in_bush = in_slowing_cover(objects, b.x, b.y, b.width, b.height);
    let speed = if in_bush {
        tuning.move_speed / tuning.bush_slow_divisor
    } else {
        tuning.move_speed
    };

    let (mx, my) = move_axis_separated(grid, objects, &mut player.body, dx * speed * dt, dy * speed * dt);

    player.pose = if player.is_attacking() {
        Pose::Attack
    } else if mx || my {
        Pose::Walk
    } else {
        Pose::Idle
    };

    let EntityKind::Player(brain) = &mut player.kind else { return None };
    brain.cue_elapsed += dt;
    if !input.is_moving() {
        return None;
    }
    let surface = if in_bush { Surface::Bush } else { Surface::Grass };
    if brain.last_cue != Some(surface) || brain.cue_elapsed >= tuning.cue_debounce {
        brain.last_cue = Some(surface);
        brain.cue_elapsed = 0.0;
        Some(surface)
    } else {
        None
    }
}

/// Swing toward the cursor.
///
/// `None` when the swing is refused (cooldown running or already attacking).
/// Otherwise every live object and enemy whose center is strictly closer than
/// `attack_radius` to the player's center takes 1 damage.
pub fn attack(
    player: &mut Entity,
    cursor: (f32, f32),
    objects: &mut [WorldObject],
    enemies: &mut [Entity],
    tuning: &PlayerTuning,
) -> Option<AttackHits> {
    if !player.can_attack() {
        return None;
    }
    player.begin_attack(tuning.attack_cooldown);
    player.pose = Pose::Attack;
    let (cx, cy) = player.body.center();
    player.direction = Direction::toward(cursor.0 - cx, cursor.1 - cy);

    let mut hits = AttackHits::default();
    for (i, obj) in objects.iter_mut().enumerate() {
        if obj.is_destroyed() || player.body.center_distance(&obj.body) >= tuning.attack_radius {
            continue;
        }
        let outcome = obj.take_damage(1);
        if outcome != HitOutcome::Ignored {
            hits.objects.push((i, outcome));
        }
    }
    for (i, enemy) in enemies.iter_mut().enumerate() {
        if enemy.body.is_destroyed() || player.body.center_distance(&enemy.body) >= tuning.attack_radius {
            continue;
        }
        enemy.hurt(1);
        hits.enemies.push(i);
    }
    Some(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnemyTuning;

    fn open_field() -> TileGrid {
        TileGrid::bordered(12, 12)
    }

    fn held(up: bool, down: bool, left: bool, right: bool) -> InputSnapshot {
        InputSnapshot { up, down, left, right, ..InputSnapshot::default() }
    }

    #[test]
    fn moves_at_base_speed() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        update(&mut p, &held(false, false, false, true), 0.1, &open_field(), &[], &t);
        assert!((p.body.x - 180.0).abs() < 1e-4);
        assert_eq!(p.body.y, 160.0);
        assert_eq!(p.pose, Pose::Walk);
        assert_eq!(p.direction, Direction::Right);
    }

    #[test]
    fn diagonal_is_not_faster() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        update(&mut p, &held(false, true, false, true), 0.1, &open_field(), &[], &t);
        let (dx, dy) = (p.body.x - 160.0, p.body.y - 160.0);
        assert!(((dx * dx + dy * dy).sqrt() - 20.0).abs() < 1e-3);
        assert!((dx - dy).abs() < 1e-4);
    }

    #[test]
    fn facing_order_last_key_wins() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        update(&mut p, &held(true, false, true, false), 0.01, &open_field(), &[], &t);
        assert_eq!(p.direction, Direction::Left);
        update(&mut p, &held(true, true, false, false), 0.01, &open_field(), &[], &t);
        assert_eq!(p.direction, Direction::Down);
    }

    #[test]
    fn blocked_player_is_idle() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(32.0, 32.0, &t);
        update(&mut p, &held(true, false, true, false), 0.1, &open_field(), &[], &t);
        assert_eq!((p.body.x, p.body.y), (32.0, 32.0));
        assert_eq!(p.pose, Pose::Idle);
    }

    #[test]
    fn bush_slows_and_cues_are_debounced() {
        let t = PlayerTuning::default();
        let bushes = [WorldObject::bush_at(160.0, 160.0, 1)];
        let mut p = Entity::player(160.0, 160.0, &t);
        let right = held(false, false, false, true);

        assert_eq!(update(&mut p, &right, 0.03, &open_field(), &bushes, &t), Some(Surface::Bush));
        // 200 / 3 px/s for 0.03s
        assert!((p.body.x - 162.0).abs() < 1e-3);
        assert_eq!(update(&mut p, &right, 0.03, &open_field(), &bushes, &t), None);

        // Out of the bush: a different cue fires at once.
        let mut q = Entity::player(160.0, 160.0, &t);
        update(&mut q, &right, 0.01, &open_field(), &bushes, &t);
        q.body.x = 256.0;
        assert_eq!(update(&mut q, &right, 0.01, &open_field(), &bushes, &t), Some(Surface::Grass));
    }

    #[test]
    fn same_cue_repeats_after_debounce() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        let right = held(false, false, false, true);
        assert_eq!(update(&mut p, &right, 0.125, &open_field(), &[], &t), Some(Surface::Grass));
        assert_eq!(update(&mut p, &right, 0.125, &open_field(), &[], &t), None);
        assert_eq!(update(&mut p, &right, 0.125, &open_field(), &[], &t), None);
        assert_eq!(update(&mut p, &right, 0.125, &open_field(), &[], &t), Some(Surface::Grass));
    }

    #[test]
    fn no_cue_without_movement_input() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        assert_eq!(update(&mut p, &InputSnapshot::default(), 1.0, &open_field(), &[], &t), None);
    }

    #[test]
    fn attack_with_nothing_in_range_hits_nothing() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        let mut objects = [WorldObject::crate_at(320.0, 320.0, 2, 0.5)];
        let hits = attack(&mut p, (0.0, 0.0), &mut objects, &mut [], &t).unwrap();
        assert!(hits.is_empty());
        assert!(p.is_attacking());
        assert_eq!(p.pose, Pose::Attack);
    }

    #[test]
    fn attack_radius_is_strict() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        let mut objects = [
            WorldObject::crate_at(240.0, 160.0, 2, 0.5), // exactly 80px away
            WorldObject::crate_at(160.0, 239.0, 2, 0.5), // 79px away
        ];
        let hits = attack(&mut p, (300.0, 170.0), &mut objects, &mut [], &t).unwrap();
        assert_eq!(hits.objects, vec![(1, HitOutcome::Damaged)]);
        assert_eq!(objects[0].body.health(), 2);
        assert_eq!(objects[1].body.health(), 1);
        assert_eq!(p.direction, Direction::Right);
    }

    #[test]
    fn attack_damages_enemies_and_respects_cooldown() {
        let t = PlayerTuning::default();
        let mut p = Entity::player(160.0, 160.0, &t);
        let mut enemies = [Entity::enemy(180.0, 160.0, &EnemyTuning::default(), 2.0)];
        let hits = attack(&mut p, (175.0, 300.0), &mut [], &mut enemies, &t).unwrap();
        assert_eq!(hits.enemies, vec![0]);
        assert_eq!(enemies[0].body.health(), 2);
        assert_eq!(enemies[0].flinch_offset(), -5.0);
        assert_eq!(p.direction, Direction::Down);

        assert!(attack(&mut p, (0.0, 0.0), &mut [], &mut enemies, &t).is_none());
        assert_eq!(enemies[0].body.health(), 2);
    }
}
