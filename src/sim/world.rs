/// WorldState: the complete snapshot of a running session.
///
/// ## Ownership
///
/// The world owns the tile grid, the object list, the player and the
/// enemies. Nothing else keeps a handle on them; systems borrow what they
/// need for the duration of one call.
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate, both in pixels:
///   - `camera`: viewport into the world (top-left corner + size)
///   - Renderer maps: `screen(sx, sy) = world(camera.x + sx, camera.y + sy)`
///   - Camera stays centered on the player, clamped to the world
///   - Maps smaller than the viewport are centered

use rand::Rng;
use tracing::{debug, info};

use crate::config::{GameConfig, Tuning};
use crate::domain::ai;
use crate::domain::entity::{EntityKind, Entity};
use crate::domain::grid::{tile_origin, TileGrid, Viewport};
use crate::domain::object::WorldObject;
use crate::domain::path::{MapRegistry, PathFollower};
use crate::domain::tile::TileKind;
use crate::error::GameError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
}

/// Camera: a viewport into the world, in pixels.
///
/// `(x, y)` is the world position of the top-left visible pixel (negative
/// when a small map is centered). `(view_w, view_h)` is set by the renderer
/// from the terminal size.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub view_w: f32,
    pub view_h: f32,
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Snap the camera to center on a position, clamped to the world.
    pub fn center_on(&mut self, target_x: f32, target_y: f32, world_w: f32, world_h: f32) {
        if self.view_w <= 0.0 || self.view_h <= 0.0 { return; }
        self.x = center_axis(target_x, self.view_w, world_w);
        self.y = center_axis(target_y, self.view_h, world_h);
    }

    pub fn viewport(&self) -> Viewport {
        Viewport { x: self.x, y: self.y, width: self.view_w, height: self.view_h }
    }

    /// Screen pixel to world pixel.
    pub fn to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        (self.x + sx, self.y + sy)
    }
}

fn center_axis(target: f32, view: f32, world: f32) -> f32 {
    if world <= view {
        -((view - world) / 2.0).floor()
    } else {
        (target - view / 2.0).clamp(0.0, world - view)
    }
}

pub struct WorldState {
    // ── Terrain + objects ──
    pub grid: TileGrid,
    pub objects: Vec<WorldObject>,

    // ── Entities ──
    pub player: Entity,
    pub enemies: Vec<Entity>,

    // ── Config ──
    pub tuning: Tuning,
    /// Upper bound for one step's `dt`, in seconds.
    pub max_dt: f32,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,
    pub seed: u64,
    pub tick: u64,
    pub elapsed: f32,
    pub kills: u32,
    pub objects_cleared: u32,
    /// Named path idle enemies patrol along, if any.
    pub patrol_map: Option<String>,

    // ── Camera / Viewport ──
    pub camera: Camera,
}

// ── Construction ──

impl WorldState {
    /// Generate a fresh map and populate it.
    ///
    /// An unknown or empty `patrol_map` fails before anything is generated.
    pub fn new_session<R: Rng + ?Sized>(
        config: &GameConfig,
        seed: u64,
        rng: &mut R,
        patrol_map: Option<&str>,
    ) -> Result<Self, GameError> {
        let registry = MapRegistry::with_paths(&config.paths);
        let patrol = match patrol_map {
            Some(id) => Some(PathFollower::new(&registry, id, config.tuning.enemy.patrol_speed)?),
            None => None,
        };

        let tuning = config.tuning.clone();
        let map = TileGrid::generate(&tuning.map, rng);
        let mut grid = map.grid;

        let (pc, pr) = spawn_tile(&grid, tuning.player.spawn);
        grid.set(pc as i32, pr as i32, TileKind::Grass);
        let (px, py) = tile_origin(pc, pr);
        let player = Entity::player(px, py, &tuning.player);

        let mut enemies = Vec::with_capacity(tuning.enemy.spawns.len());
        for &spawn in &tuning.enemy.spawns {
            let (c, r) = spawn_tile(&grid, spawn);
            grid.set(c as i32, r as i32, TileKind::Grass);
            let (x, y) = tile_origin(c, r);
            let mut enemy = Entity::enemy(x, y, &tuning.enemy, ai::wander_interval(&tuning.enemy, rng));
            if let EntityKind::Enemy(brain) = &mut enemy.kind {
                brain.patrol = patrol.clone();
            }
            debug!(col = c, row = r, "enemy spawned");
            enemies.push(enemy);
        }

        info!(
            seed,
            width = grid.width(),
            height = grid.height(),
            objects = map.objects.len(),
            enemies = enemies.len(),
            patrol = patrol_map.unwrap_or("-"),
            "session started"
        );

        let mut world = WorldState::from_parts(grid, map.objects, player, enemies, config);
        world.seed = seed;
        world.patrol_map = patrol_map.map(str::to_string);
        Ok(world)
    }

    /// Assemble a world from prepared parts.
    pub fn from_parts(
        grid: TileGrid,
        objects: Vec<WorldObject>,
        player: Entity,
        enemies: Vec<Entity>,
        config: &GameConfig,
    ) -> Self {
        WorldState {
            grid,
            objects,
            player,
            enemies,
            tuning: config.tuning.clone(),
            max_dt: config.timing.max_frame_secs,
            phase: Phase::Playing,
            paused: false,
            seed: 0,
            tick: 0,
            elapsed: 0.0,
            kills: 0,
            objects_cleared: 0,
            patrol_map: None,
            camera: Camera::new(),
        }
    }

    /// Re-center the camera on the player.
    pub fn follow_player(&mut self) {
        let (cx, cy) = self.player.body.center();
        self.camera.center_on(cx, cy, self.grid.width_px(), self.grid.height_px());
    }
}

/// Spawn tile clamped into the grid interior.
fn spawn_tile(grid: &TileGrid, (col, row): (i32, i32)) -> (usize, usize) {
    let max_c = (grid.width() as i32 - 2).max(1);
    let max_r = (grid.height() as i32 - 2).max(1);
    (col.clamp(1, max_c) as usize, row.clamp(1, max_r) as usize)
}
