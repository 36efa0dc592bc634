pub mod ai;
pub mod collision;
pub mod entity;
pub mod grid;
pub mod object;
pub mod path;
pub mod player;
pub mod tile;
