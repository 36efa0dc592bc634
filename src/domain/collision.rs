/// Collision resolver: corner sampling against the tile grid, plus solid
/// world objects.
///
/// ## Box test
///
/// The four corners of a box are pulled inward by `MARGIN` so that a body
/// touching a wall edge is not counted as inside it. Each corner maps to a
/// tile with `floor(p / TILE_SIZE)`; the box collides if ANY corner tile is
/// blocking (out of bounds included).
///
/// ## Axis-separated movement
///
/// A proposed move `(dx, dy)` resolves X first, then Y:
///   - X applies if the box at `(x + dx, y)` is free
///   - Y applies if the box at `(resolved x, y + dy)` is free
///
/// A blocked axis does not cancel the other, so bodies slide along walls.

use super::grid::{tile_of, TileGrid};
use super::object::{GameObject, WorldObject};

/// Corner inset in pixels.
pub const MARGIN: f32 = 4.0;

/// The four inset corners of a box, TL / TR / BL / BR.
fn corners(x: f32, y: f32, w: f32, h: f32) -> [(f32, f32); 4] {
    [
        (x + MARGIN, y + MARGIN),
        (x + w - MARGIN, y + MARGIN),
        (x + MARGIN, y + h - MARGIN),
        (x + w - MARGIN, y + h - MARGIN),
    ]
}

/// Does the box at `(x, y, w, h)` touch a blocking tile?
pub fn check_collision(grid: &TileGrid, x: f32, y: f32, w: f32, h: f32) -> bool {
    corners(x, y, w, h)
        .iter()
        .any(|&(px, py)| grid.is_blocking(tile_of(px), tile_of(py)))
}

/// Is any inset corner of the box inside a live object that slows movement?
pub fn in_slowing_cover(objects: &[WorldObject], x: f32, y: f32, w: f32, h: f32) -> bool {
    let pts = corners(x, y, w, h);
    objects.iter()
        .filter(|o| o.slows_movement() && !o.is_destroyed())
        .any(|o| pts.iter().any(|&(px, py)| o.body.contains_point(px, py)))
}

/// Scale a direction to unit length. Zero stays zero.
pub fn normalize(dx: f32, dy: f32) -> (f32, f32) {
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 { (0.0, 0.0) } else { (dx / len, dy / len) }
}

/// Would `body` placed at `(nx, ny)` be blocked by terrain or a solid object?
///
/// A solid object the body already overlaps does not block it, so anything
/// that ends up inside a crate can still walk out.
fn blocked(grid: &TileGrid, objects: &[WorldObject], body: &GameObject, nx: f32, ny: f32) -> bool {
    if check_collision(grid, nx, ny, body.width, body.height) {
        return true;
    }
    let (ix, iy) = (nx + MARGIN, ny + MARGIN);
    let (iw, ih) = (body.width - 2.0 * MARGIN, body.height - 2.0 * MARGIN);
    objects.iter()
        .filter(|o| o.blocks_movement() && !o.is_destroyed())
        .any(|o| {
            o.body.overlaps_box(ix, iy, iw, ih)
                && !o.body.overlaps_box(body.x + MARGIN, body.y + MARGIN, iw, ih)
        })
}

/// Apply `(dx, dy)` to `body` one axis at a time.
/// Returns `(moved_x, moved_y)`.
pub fn move_axis_separated(
    grid: &TileGrid,
    objects: &[WorldObject],
    body: &mut GameObject,
    dx: f32,
    dy: f32,
) -> (bool, bool) {
    let new_x = body.x + dx;
    let new_y = body.y + dy;

    let moved_x = dx != 0.0 && !blocked(grid, objects, body, new_x, body.y);
    if moved_x {
        body.x = new_x;
    }
    let moved_y = dy != 0.0 && !blocked(grid, objects, body, body.x, new_y);
    if moved_y {
        body.y = new_y;
    }
    (moved_x, moved_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::TILE_SIZE;

    fn open_room() -> TileGrid {
        TileGrid::from_rows(&[
            "#####",
            "#...#",
            "#...#",
            "#...#",
            "#####",
        ])
    }

    fn body_at(x: f32, y: f32) -> GameObject {
        GameObject::new(x, y, TILE_SIZE, TILE_SIZE, 1, true)
    }

    #[test]
    fn free_box_does_not_collide() {
        let g = open_room();
        assert!(!check_collision(&g, 32.0, 32.0, 32.0, 32.0));
        assert!(!check_collision(&g, 64.0, 64.0, 32.0, 32.0));
    }

    #[test]
    fn margin_lets_edges_touch_walls() {
        let g = open_room();
        // Box edge 3px into the left wall: inset corner still on grass.
        assert!(!check_collision(&g, 29.0, 32.0, 32.0, 32.0));
        // 5px in: inset corner reaches the wall tile.
        assert!(check_collision(&g, 27.0, 32.0, 32.0, 32.0));
    }

    #[test]
    fn any_single_corner_collides() {
        let g = TileGrid::from_rows(&[
            "....",
            "....",
            "..~.",
            "....",
        ]);
        // Only bottom-right corner lands on water at (2,2).
        assert!(check_collision(&g, 40.0, 40.0, 32.0, 32.0));
        assert!(!check_collision(&g, 20.0, 20.0, 32.0, 32.0));
    }

    #[test]
    fn outside_grid_collides() {
        let g = TileGrid::from_rows(&["..", ".."]);
        assert!(check_collision(&g, -20.0, 0.0, 32.0, 32.0));
        assert!(check_collision(&g, 0.0, 50.0, 32.0, 32.0));
    }

    #[test]
    fn blocked_axis_is_not_applied() {
        let g = open_room();
        let mut b = body_at(32.0, 32.0);
        let moved = move_axis_separated(&g, &[], &mut b, -10.0, 0.0);
        assert_eq!(moved, (false, false));
        assert_eq!((b.x, b.y), (32.0, 32.0));
    }

    #[test]
    fn slides_along_wall() {
        let g = open_room();
        let mut b = body_at(32.0, 40.0);
        // Down-left into the wall: X is blocked by the left wall, Y is free.
        let moved = move_axis_separated(&g, &[], &mut b, -10.0, 5.0);
        assert_eq!(moved, (false, true));
        assert_eq!((b.x, b.y), (32.0, 45.0));
    }

    #[test]
    fn free_axis_always_moves() {
        let g = open_room();
        let mut b = body_at(48.0, 48.0);
        assert_eq!(move_axis_separated(&g, &[], &mut b, 3.0, -3.0), (true, true));
        assert_eq!((b.x, b.y), (51.0, 45.0));
    }

    #[test]
    fn crate_blocks_but_bush_does_not() {
        let g = TileGrid::bordered(8, 5);
        let crates = [WorldObject::crate_at(96.0, 32.0, 2, 0.5)];
        let mut b = body_at(60.0, 32.0);
        assert_eq!(move_axis_separated(&g, &crates, &mut b, 10.0, 0.0), (false, false));

        let bushes = [WorldObject::bush_at(96.0, 32.0, 1)];
        assert_eq!(move_axis_separated(&g, &bushes, &mut b, 10.0, 0.0), (true, false));
    }

    #[test]
    fn can_walk_out_of_a_crate() {
        let g = TileGrid::bordered(8, 5);
        let crates = [WorldObject::crate_at(64.0, 64.0, 2, 0.5)];
        let mut b = body_at(64.0, 64.0);
        assert_eq!(move_axis_separated(&g, &crates, &mut b, 5.0, 0.0), (true, false));
    }

    #[test]
    fn slowing_cover_uses_corners() {
        let bushes = [WorldObject::bush_at(64.0, 64.0, 1)];
        assert!(in_slowing_cover(&bushes, 40.0, 40.0, 32.0, 32.0));
        assert!(!in_slowing_cover(&bushes, 0.0, 0.0, 32.0, 32.0));
        let crates = [WorldObject::crate_at(64.0, 64.0, 1, 0.5)];
        assert!(!in_slowing_cover(&crates, 40.0, 40.0, 32.0, 32.0));
    }

    #[test]
    fn normalize_diagonal() {
        let (x, y) = normalize(1.0, 1.0);
        assert!(((x * x + y * y).sqrt() - 1.0).abs() < 1e-6);
        assert_eq!(normalize(0.0, 0.0), (0.0, 0.0));
        assert_eq!(normalize(-1.0, 0.0), (-1.0, 0.0));
    }
}
