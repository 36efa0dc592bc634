/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and the log.

use crate::domain::entity::Surface;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// The player swung; `hits` counts everything damaged.
    AttackSwung { hits: usize },
    /// A world object lost health but survived.
    ObjectHit { x: f32, y: f32 },
    /// A crate took its last hit and started its break animation.
    CrateBreaking { x: f32, y: f32 },
    /// A world object was removed this frame.
    ObjectDestroyed { x: f32, y: f32 },
    EnemyHit { x: f32, y: f32 },
    EnemyKilled { x: f32, y: f32 },
    PlayerHurt { health: i32 },
    PlayerKilled,
    TerrainCue(Surface),
}
