/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    Grass,
    Wall,  // Solid, forms the border ring
    Water, // Impassable, but not a wall
}

impl TileKind {
    /// Does this tile stop entity movement?
    pub fn is_blocking(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Water)
    }

    /// Sprite name looked up in the sprite sheet.
    pub fn sprite_name(self) -> &'static str {
        match self {
            TileKind::Grass => "tile_grass",
            TileKind::Wall => "tile_wall",
            TileKind::Water => "tile_water",
        }
    }

    /// Flat fill used when the sprite sheet has no handle for this tile.
    pub fn fallback_color(self) -> (u8, u8, u8) {
        match self {
            TileKind::Grass => (0x8f, 0xbc, 0x8f),
            TileKind::Wall => (0x44, 0x44, 0x44),
            TileKind::Water => (0x46, 0x82, 0xb4),
        }
    }
}

impl Default for TileKind {
    fn default() -> Self {
        TileKind::Grass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_grass_is_walkable() {
        assert!(!TileKind::Grass.is_blocking());
        assert!(TileKind::Wall.is_blocking());
        assert!(TileKind::Water.is_blocking());
    }
}
