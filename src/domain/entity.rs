/// Entities: the player and the enemies.
///
/// Both share one flat struct: a `GameObject` body, facing, pose and the
/// attack timers. What differs lives in `EntityKind`, and the step function
/// dispatches on it with `match`. Entities never hold references to each
/// other; the enemy is handed the player's body on every update.

use crate::config::{EnemyTuning, PlayerTuning};
use super::grid::TILE_SIZE;
use super::object::GameObject;
use super::path::PathFollower;

/// How long a struck enemy hops, and how high.
const FLINCH_SECS: f32 = 0.1;
const FLINCH_HOP: f32 = 5.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Facing toward `(dx, dy)`: the larger absolute axis wins, ties go vertical.
    pub fn toward(dx: f32, dy: f32) -> Self {
        if dx.abs() > dy.abs() {
            if dx > 0.0 { Direction::Right } else { Direction::Left }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    pub fn unit(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];
}

/// Visual pose, render-only.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pose {
    Idle,
    Walk,
    Attack,
}

/// One tick of player intent. The cursor is in world pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub attack: bool,
    pub cursor_x: f32,
    pub cursor_y: f32,
}

impl InputSnapshot {
    pub fn is_moving(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// What the player is walking through, for footstep cues.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Surface {
    Grass,
    Bush,
}

#[derive(Clone, Debug, Default)]
pub struct PlayerBrain {
    pub(crate) last_cue: Option<Surface>,
    pub(crate) cue_elapsed: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyState {
    Idle,
    Chase,
    Attack,
}

#[derive(Clone, Debug)]
pub struct EnemyBrain {
    pub state: EnemyState,
    pub(crate) idle_elapsed: f32,
    pub(crate) wander_interval: f32,
    pub patrol: Option<PathFollower>,
}

#[derive(Clone, Debug)]
pub enum EntityKind {
    Player(PlayerBrain),
    Enemy(EnemyBrain),
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub body: GameObject,
    pub direction: Direction,
    pub pose: Pose,
    pub(crate) attack_cooldown: f32,
    pub(crate) attack_elapsed: f32,
    pub(crate) attacking: bool,
    pub(crate) flinch_left: f32,
    pub kind: EntityKind,
}

impl Entity {
    /// Player with its top-left corner at pixel `(x, y)`.
    pub fn player(x: f32, y: f32, tuning: &PlayerTuning) -> Self {
        Entity::new(
            GameObject::new(x, y, TILE_SIZE, TILE_SIZE, tuning.health, true),
            EntityKind::Player(PlayerBrain::default()),
        )
    }

    /// Enemy at pixel `(x, y)`, wandering every `wander_interval` seconds
    /// while idle.
    pub fn enemy(x: f32, y: f32, tuning: &EnemyTuning, wander_interval: f32) -> Self {
        Entity::new(
            GameObject::new(x, y, TILE_SIZE, TILE_SIZE, tuning.health, true),
            EntityKind::Enemy(EnemyBrain {
                state: EnemyState::Idle,
                idle_elapsed: 0.0,
                wander_interval,
                patrol: None,
            }),
        )
    }

    fn new(body: GameObject, kind: EntityKind) -> Self {
        Entity {
            body,
            direction: Direction::Down,
            pose: Pose::Idle,
            attack_cooldown: 0.0,
            attack_elapsed: 0.0,
            attacking: false,
            flinch_left: 0.0,
            kind,
        }
    }

    #[cfg(test)]
    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn enemy_state(&self) -> Option<EnemyState> {
        match &self.kind {
            EntityKind::Enemy(brain) => Some(brain.state),
            EntityKind::Player(_) => None,
        }
    }

    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    /// Attack animation progress 0.0 → 1.0, `None` when not attacking.
    pub fn attack_progress(&self, anim: f32) -> Option<f32> {
        if !self.attacking { return None; }
        if anim <= 0.0 { return Some(1.0); }
        Some((self.attack_elapsed / anim).min(1.0))
    }

    /// Count down the cooldown and run the attack animation clock.
    /// The animation ends after `anim` seconds whatever the cooldown says.
    pub(crate) fn tick_attack_timers(&mut self, dt: f32, anim: f32) {
        if self.attack_cooldown > 0.0 {
            self.attack_cooldown -= dt;
        }
        if self.attacking {
            self.attack_elapsed += dt;
            if self.attack_elapsed >= anim {
                self.attacking = false;
                self.attack_elapsed = 0.0;
            }
        }
    }

    /// Ready to swing: cooldown elapsed and no animation running.
    pub(crate) fn can_attack(&self) -> bool {
        self.attack_cooldown <= 0.0 && !self.attacking
    }

    /// Take a hit and start the flinch hop.
    pub(crate) fn hurt(&mut self, amount: i32) {
        self.body.take_damage(amount);
        self.flinch_left = FLINCH_SECS;
    }

    pub(crate) fn tick_flinch(&mut self, dt: f32) {
        self.flinch_left = (self.flinch_left - dt).max(0.0);
    }

    /// Vertical draw offset while flinching. Render-only: the body does not move.
    pub fn flinch_offset(&self) -> f32 {
        if self.flinch_left > 0.0 { -FLINCH_HOP } else { 0.0 }
    }

    pub(crate) fn begin_attack(&mut self, cooldown: f32) {
        self.attacking = true;
        self.attack_elapsed = 0.0;
        self.attack_cooldown = cooldown;
    }
}
