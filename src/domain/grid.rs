/// Tile grid: the fixed-size terrain matrix and its generator.
///
/// ## Coordinates
///
/// Grid coordinates are `(col, row)`; pixel coordinates are `(x, y)`.
/// `TILE_SIZE` maps one onto the other: tile `(c, r)` covers pixels
/// `[c * TILE_SIZE, (c + 1) * TILE_SIZE)` horizontally, likewise vertically.
///
/// ## Generation
///
///   1. Wall border ring.
///   2. Interior walls, then interior water, at uniformly sampled tiles.
///      Later writes win on overlap; nothing is re-rolled.
///   3. Bushes, then crates, at uniformly sampled interior tiles. A sample is
///      kept only if the tile is still Grass, otherwise it is skipped.
///      Two objects may land on the same tile.
///
/// Objects never change the tile under them; crates block through object
/// collision, not through the grid.

use std::ops::Range;

use rand::Rng;
use tracing::debug;

use crate::config::MapTuning;
use super::object::WorldObject;
use super::tile::TileKind;

pub const TILE_SIZE: f32 = 32.0;

/// A pixel-space rectangle, typically the camera's view of the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<Vec<TileKind>>,
}

/// Output of map generation: the terrain plus the objects scattered on it.
pub struct GeneratedMap {
    pub grid: TileGrid,
    pub objects: Vec<WorldObject>,
}

/// Tile index containing pixel coordinate `p`.
#[inline]
pub fn tile_of(p: f32) -> i32 {
    (p / TILE_SIZE).floor() as i32
}

impl TileGrid {
    /// All-grass grid with a wall border ring.
    pub fn bordered(width: usize, height: usize) -> Self {
        let mut tiles = vec![vec![TileKind::Grass; width]; height];
        if width > 0 && height > 0 {
            for x in 0..width {
                tiles[0][x] = TileKind::Wall;
                tiles[height - 1][x] = TileKind::Wall;
            }
            for row in tiles.iter_mut() {
                row[0] = TileKind::Wall;
                row[width - 1] = TileKind::Wall;
            }
        }
        TileGrid { width, height, tiles }
    }

    /// Generate terrain and scatter world objects.
    pub fn generate<R: Rng + ?Sized>(tuning: &MapTuning, rng: &mut R) -> GeneratedMap {
        let mut grid = TileGrid::bordered(tuning.width, tuning.height);
        let mut objects = Vec::new();

        // Grids below 3x3 are all border.
        if tuning.width < 3 || tuning.height < 3 {
            return GeneratedMap { grid, objects };
        }

        for _ in 0..tuning.walls {
            let (c, r) = grid.sample_interior(rng);
            grid.tiles[r][c] = TileKind::Wall;
        }
        for _ in 0..tuning.water {
            let (c, r) = grid.sample_interior(rng);
            grid.tiles[r][c] = TileKind::Water;
        }

        for _ in 0..tuning.bushes {
            let (c, r) = grid.sample_interior(rng);
            if grid.tiles[r][c] == TileKind::Grass {
                let (x, y) = tile_origin(c, r);
                objects.push(WorldObject::bush_at(x, y, tuning.bush_health));
            }
        }
        let (lo, hi) = tuning.crate_health;
        for _ in 0..tuning.crates {
            let (c, r) = grid.sample_interior(rng);
            if grid.tiles[r][c] == TileKind::Grass {
                let (x, y) = tile_origin(c, r);
                let health = rng.gen_range(lo..=hi);
                objects.push(WorldObject::crate_at(x, y, health, tuning.crate_break_secs));
            }
        }

        debug!(
            width = tuning.width,
            height = tuning.height,
            objects = objects.len(),
            "map generated"
        );
        GeneratedMap { grid, objects }
    }

    fn sample_interior<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        (rng.gen_range(1..self.width - 1), rng.gen_range(1..self.height - 1))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width_px(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn height_px(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    /// Tile at `(col, row)`, `None` out of bounds.
    #[inline]
    pub fn kind_at(&self, col: i32, row: i32) -> Option<TileKind> {
        if col < 0 || row < 0 { return None; }
        let (c, r) = (col as usize, row as usize);
        if c >= self.width || r >= self.height { return None; }
        Some(self.tiles[r][c])
    }

    /// Out of bounds is blocking (fail-safe closed).
    #[inline]
    pub fn is_blocking(&self, col: i32, row: i32) -> bool {
        self.kind_at(col, row).map_or(true, TileKind::is_blocking)
    }

    fn is_border(&self, col: usize, row: usize) -> bool {
        col == 0 || row == 0 || col + 1 == self.width || row + 1 == self.height
    }

    /// Overwrite an interior tile. Border tiles are never changed, so the
    /// wall ring survives. Returns whether the tile was written.
    pub fn set(&mut self, col: i32, row: i32, kind: TileKind) -> bool {
        if self.kind_at(col, row).is_none() { return false; }
        let (c, r) = (col as usize, row as usize);
        if self.is_border(c, r) { return false; }
        self.tiles[r][c] = kind;
        true
    }

    /// Tile columns and rows intersecting `view`, clamped to the grid.
    pub fn visible_range(&self, view: Viewport) -> (Range<usize>, Range<usize>) {
        let clamp = |v: i32, max: usize| v.clamp(0, max as i32) as usize;
        let c0 = clamp(tile_of(view.x), self.width);
        let r0 = clamp(tile_of(view.y), self.height);
        let c1 = clamp(((view.x + view.width) / TILE_SIZE).ceil() as i32, self.width);
        let r1 = clamp(((view.y + view.height) / TILE_SIZE).ceil() as i32, self.height);
        (c0..c1.max(c0), r0..r1.max(r0))
    }

    /// Build from a string diagram.
    /// Legend:  '#'=Wall  '~'=Water  anything else=Grass
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let mut tiles = vec![vec![TileKind::Grass; width]; height];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                tiles[y][x] = match ch {
                    '#' => TileKind::Wall,
                    '~' => TileKind::Water,
                    _ => TileKind::Grass,
                };
            }
        }
        TileGrid { width, height, tiles }
    }
}

/// Pixel position of the top-left corner of tile `(col, row)`.
#[inline]
pub fn tile_origin(col: usize, row: usize) -> (f32, f32) {
    (col as f32 * TILE_SIZE, row as f32 * TILE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn border_is_wall(g: &TileGrid) -> bool {
        let (w, h) = (g.width() as i32, g.height() as i32);
        (0..w).all(|x| g.kind_at(x, 0) == Some(TileKind::Wall) && g.kind_at(x, h - 1) == Some(TileKind::Wall))
            && (0..h).all(|y| g.kind_at(0, y) == Some(TileKind::Wall) && g.kind_at(w - 1, y) == Some(TileKind::Wall))
    }

    #[test]
    fn out_of_bounds_is_blocking() {
        let g = TileGrid::from_rows(&["...", "...", "..."]);
        assert!(!g.is_blocking(1, 1));
        for (c, r) in [(-1, 0), (0, -1), (3, 0), (0, 3), (-5, -5), (100, 1)] {
            assert!(g.is_blocking(c, r), "({c},{r}) should block");
        }
    }

    #[test]
    fn wall_and_water_block() {
        let g = TileGrid::from_rows(&["#~."]);
        assert!(g.is_blocking(0, 0));
        assert!(g.is_blocking(1, 0));
        assert!(!g.is_blocking(2, 0));
    }

    #[test]
    fn border_ring_after_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for (w, h) in [(3, 3), (4, 7), (25, 19), (40, 3)] {
            for _ in 0..20 {
                let tuning = MapTuning { width: w, height: h, walls: 50, water: 50, ..MapTuning::default() };
                let map = TileGrid::generate(&tuning, &mut rng);
                assert!(border_is_wall(&map.grid), "{w}x{h}");
            }
        }
    }

    #[test]
    fn tiny_grids_generate_without_scatter() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tuning = MapTuning { width: 2, height: 2, ..MapTuning::default() };
        let map = TileGrid::generate(&tuning, &mut rng);
        assert!(map.objects.is_empty());
        assert!(border_is_wall(&map.grid));
    }

    #[test]
    fn objects_only_on_grass_and_inside() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let map = TileGrid::generate(&MapTuning::default(), &mut rng);
        assert!(!map.objects.is_empty());
        for obj in &map.objects {
            let (c, r) = (tile_of(obj.body.x), tile_of(obj.body.y));
            assert_eq!(map.grid.kind_at(c, r), Some(TileKind::Grass));
            assert!(c >= 1 && r >= 1);
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = TileGrid::generate(&MapTuning::default(), &mut ChaCha8Rng::seed_from_u64(5));
        let b = TileGrid::generate(&MapTuning::default(), &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(a.grid.tiles, b.grid.tiles);
        assert_eq!(a.objects.len(), b.objects.len());
    }

    #[test]
    fn crate_health_drawn_from_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let tuning = MapTuning { crates: 200, bushes: 0, crate_health: (1, 5), ..MapTuning::default() };
        let map = TileGrid::generate(&tuning, &mut rng);
        assert!(map.objects.iter().all(|o| (1..=5).contains(&o.body.health())));
    }

    #[test]
    fn set_keeps_border() {
        let mut g = TileGrid::bordered(5, 5);
        assert!(!g.set(0, 2, TileKind::Grass));
        assert!(g.set(2, 2, TileKind::Water));
        assert_eq!(g.kind_at(2, 2), Some(TileKind::Water));
        assert!(!g.set(9, 9, TileKind::Grass));
    }

    #[test]
    fn visible_range_clips_to_view_and_grid() {
        let g = TileGrid::bordered(25, 19);
        let view = Viewport { x: 40.0, y: 0.0, width: 100.0, height: 64.0 };
        let (cols, rows) = g.visible_range(view);
        assert_eq!(cols, 1..5);
        assert_eq!(rows, 0..2);

        let past_edge = Viewport { x: 700.0, y: 500.0, width: 400.0, height: 400.0 };
        let (cols, rows) = g.visible_range(past_edge);
        assert_eq!(cols, 21..25);
        assert_eq!(rows, 15..19);

        let before_origin = Viewport { x: -64.0, y: -64.0, width: 96.0, height: 96.0 };
        let (cols, rows) = g.visible_range(before_origin);
        assert_eq!(cols, 0..1);
        assert_eq!(rows, 0..1);
    }
}
