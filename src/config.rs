/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or
/// `~/.local/share/thicket`, unless `--config` names a file.
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::GameError;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub tuning: Tuning,
    pub gamepad: GamepadConfig,
    /// Extra named waypoint paths, merged over the built-in ones.
    pub paths: BTreeMap<String, Vec<(f32, f32)>>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub max_frame_secs: f32, // dt clamp after a stall
}

/// Everything the simulation reads. Cloned into `WorldState`.
#[derive(Clone, Debug, Default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub map: MapTuning,
}

#[derive(Clone, Debug)]
pub struct PlayerTuning {
    pub spawn: (i32, i32),       // tile coordinates
    pub health: i32,
    pub move_speed: f32,         // px/s
    pub bush_slow_divisor: f32,  // speed / divisor while inside a bush
    pub attack_radius: f32,      // px, center to center, strict
    pub attack_cooldown: f32,    // s
    pub attack_anim: f32,        // s
    pub cue_debounce: f32,       // s
}

#[derive(Clone, Debug)]
pub struct EnemyTuning {
    pub spawns: Vec<(i32, i32)>, // tile coordinates
    pub health: i32,
    pub move_speed: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub attack_damage: i32,
    pub attack_cooldown: f32,
    pub attack_anim: f32,
    pub wander_interval: f32,
    pub randomize_wander: bool,  // per-enemy interval drawn from wander_range
    pub wander_range: (f32, f32),
    pub patrol_speed: f32,       // waypoint progress per millisecond
}

#[derive(Clone, Debug)]
pub struct MapTuning {
    pub width: usize,
    pub height: usize,
    pub walls: usize,
    pub water: usize,
    pub bushes: usize,
    pub crates: usize,
    pub crate_health: (i32, i32), // inclusive range
    pub bush_health: i32,
    pub crate_break_secs: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub attack: Vec<String>,
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    enemy: TomlEnemy,
    #[serde(default)]
    map: TomlMap,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    paths: BTreeMap<String, TomlPath>,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_max_frame")]
    max_frame_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_player_spawn")]
    spawn: (i32, i32),
    #[serde(default = "default_player_health")]
    health: i32,
    #[serde(default = "default_player_speed")]
    move_speed: f32,
    #[serde(default = "default_bush_slow")]
    bush_slow_divisor: f32,
    #[serde(default = "default_attack_radius")]
    attack_radius: f32,
    #[serde(default = "default_player_cooldown")]
    attack_cooldown: f32,
    #[serde(default = "default_attack_anim")]
    attack_anim: f32,
    #[serde(default = "default_cue_debounce")]
    cue_debounce: f32,
}

#[derive(Deserialize, Debug)]
struct TomlEnemy {
    #[serde(default = "default_enemy_spawns")]
    spawns: Vec<(i32, i32)>,
    #[serde(default = "default_enemy_health")]
    health: i32,
    #[serde(default = "default_enemy_speed")]
    move_speed: f32,
    #[serde(default = "default_detection_range")]
    detection_range: f32,
    #[serde(default = "default_enemy_attack_range")]
    attack_range: f32,
    #[serde(default = "default_enemy_damage")]
    attack_damage: i32,
    #[serde(default = "default_enemy_cooldown")]
    attack_cooldown: f32,
    #[serde(default = "default_attack_anim")]
    attack_anim: f32,
    #[serde(default = "default_wander_interval")]
    wander_interval: f32,
    #[serde(default)]
    randomize_wander: bool,
    #[serde(default = "default_wander_range")]
    wander_range: (f32, f32),
    #[serde(default = "default_patrol_speed")]
    patrol_speed: f32,
}

#[derive(Deserialize, Debug)]
struct TomlMap {
    #[serde(default = "default_map_width")]
    width: usize,
    #[serde(default = "default_map_height")]
    height: usize,
    #[serde(default = "default_walls")]
    walls: usize,
    #[serde(default = "default_water")]
    water: usize,
    #[serde(default = "default_bushes")]
    bushes: usize,
    #[serde(default = "default_crates")]
    crates: usize,
    #[serde(default = "default_crate_health")]
    crate_health: (i32, i32),
    #[serde(default = "default_bush_health")]
    bush_health: i32,
    #[serde(default = "default_crate_break")]
    crate_break_secs: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_attack")]
    attack: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlPath {
    waypoints: Vec<(f32, f32)>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }      // ~60 Hz
fn default_max_frame() -> f32 { 0.1 }

/// `v` when it is a finite positive number, `fallback` otherwise.
fn positive_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { fallback }
}
fn default_player_spawn() -> (i32, i32) { (12, 9) }
fn default_player_health() -> i32 { 5 }
fn default_player_speed() -> f32 { 200.0 }
fn default_bush_slow() -> f32 { 3.0 }
fn default_attack_radius() -> f32 { 80.0 } // legacy variant: 2 tile diagonals
fn default_player_cooldown() -> f32 { 0.5 }
fn default_attack_anim() -> f32 { 0.3 }
fn default_cue_debounce() -> f32 { 0.3 }
fn default_enemy_spawns() -> Vec<(i32, i32)> {
    vec![(5, 15), (18, 5), (20, 15), (3, 3), (22, 12)]
}
fn default_enemy_health() -> i32 { 3 }
fn default_enemy_speed() -> f32 { 80.0 }
fn default_detection_range() -> f32 { 200.0 }
fn default_enemy_attack_range() -> f32 { 40.0 }
fn default_enemy_damage() -> i32 { 1 }
fn default_enemy_cooldown() -> f32 { 1.0 }
fn default_wander_interval() -> f32 { 2.0 }
fn default_wander_range() -> (f32, f32) { (1.0, 3.0) }
fn default_patrol_speed() -> f32 { 0.001 }
fn default_map_width() -> usize { 25 }
fn default_map_height() -> usize { 19 }
fn default_walls() -> usize { 10 }
fn default_water() -> usize { 5 }
fn default_bushes() -> usize { 30 }
fn default_crates() -> usize { 15 }
fn default_crate_health() -> (i32, i32) { (2, 2) } // legacy variant: (1, 5)
fn default_bush_health() -> i32 { 1 }
fn default_crate_break() -> f32 { 0.5 }

fn default_pad_attack() -> Vec<String> { vec!["A".into(), "X".into(), "R1".into()] }
fn default_pad_pause() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            max_frame_secs: default_max_frame(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            spawn: default_player_spawn(),
            health: default_player_health(),
            move_speed: default_player_speed(),
            bush_slow_divisor: default_bush_slow(),
            attack_radius: default_attack_radius(),
            attack_cooldown: default_player_cooldown(),
            attack_anim: default_attack_anim(),
            cue_debounce: default_cue_debounce(),
        }
    }
}

impl Default for TomlEnemy {
    fn default() -> Self {
        TomlEnemy {
            spawns: default_enemy_spawns(),
            health: default_enemy_health(),
            move_speed: default_enemy_speed(),
            detection_range: default_detection_range(),
            attack_range: default_enemy_attack_range(),
            attack_damage: default_enemy_damage(),
            attack_cooldown: default_enemy_cooldown(),
            attack_anim: default_attack_anim(),
            wander_interval: default_wander_interval(),
            randomize_wander: false,
            wander_range: default_wander_range(),
            patrol_speed: default_patrol_speed(),
        }
    }
}

impl Default for TomlMap {
    fn default() -> Self {
        TomlMap {
            width: default_map_width(),
            height: default_map_height(),
            walls: default_walls(),
            water: default_water(),
            bushes: default_bushes(),
            crates: default_crates(),
            crate_health: default_crate_health(),
            bush_health: default_bush_health(),
            crate_break_secs: default_crate_break(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            attack: default_pad_attack(),
            pause: default_pad_pause(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        TomlPlayer::default().into()
    }
}

impl Default for EnemyTuning {
    fn default() -> Self {
        TomlEnemy::default().into()
    }
}

impl Default for MapTuning {
    fn default() -> Self {
        TomlMap::default().into()
    }
}

impl From<TomlPlayer> for PlayerTuning {
    fn from(t: TomlPlayer) -> Self {
        PlayerTuning {
            spawn: t.spawn,
            health: t.health.max(1),
            move_speed: t.move_speed,
            bush_slow_divisor: t.bush_slow_divisor.max(1.0),
            attack_radius: t.attack_radius,
            attack_cooldown: t.attack_cooldown,
            attack_anim: t.attack_anim,
            cue_debounce: t.cue_debounce,
        }
    }
}

impl From<TomlEnemy> for EnemyTuning {
    fn from(t: TomlEnemy) -> Self {
        let (lo, hi) = t.wander_range;
        let wander_range = if lo <= hi { (lo, hi) } else { (hi, lo) };
        EnemyTuning {
            spawns: t.spawns,
            health: t.health.max(1),
            move_speed: t.move_speed,
            detection_range: t.detection_range,
            attack_range: t.attack_range,
            attack_damage: t.attack_damage,
            attack_cooldown: t.attack_cooldown,
            attack_anim: t.attack_anim,
            wander_interval: t.wander_interval,
            randomize_wander: t.randomize_wander,
            wander_range,
            patrol_speed: t.patrol_speed,
        }
    }
}

impl From<TomlMap> for MapTuning {
    fn from(t: TomlMap) -> Self {
        let (lo, hi) = t.crate_health;
        let lo = lo.max(1);
        MapTuning {
            width: t.width,
            height: t.height,
            walls: t.walls,
            water: t.water,
            bushes: t.bushes,
            crates: t.crates,
            crate_health: (lo, hi.max(lo)),
            bush_health: t.bush_health.max(1),
            crate_break_secs: t.crate_break_secs,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/thicket`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        GameConfig::from_toml(load_toml(&search_dirs))
    }

    /// Load from an explicit path. Unlike `load()`, an unreadable file is an error.
    pub fn load_from(path: &Path) -> Result<Self, GameError> {
        let text = std::fs::read_to_string(path).map_err(|source| GameError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(GameConfig::from_toml(parse_or_default(&text, path)))
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let paths = toml_cfg
            .paths
            .into_iter()
            .map(|(name, p)| (name, p.waypoints))
            .collect();

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                max_frame_secs: positive_or(toml_cfg.timing.max_frame_secs, default_max_frame()),
            },
            tuning: Tuning {
                player: toml_cfg.player.into(),
                enemy: toml_cfg.enemy.into(),
                map: toml_cfg.map.into(),
            },
            gamepad: GamepadConfig {
                attack: toml_cfg.gamepad.attack,
                pause: toml_cfg.gamepad.pause,
                quit: toml_cfg.gamepad.quit,
            },
            paths,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/thicket)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/thicket");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_or_default(&text, &path),
                Err(e) => {
                    warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_or_default(text: &str, path: &Path) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => {
            info!("loaded {}", path.display());
            cfg
        }
        Err(e) => {
            warn!("{} parse error, using default settings: {e}", path.display());
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> GameConfig {
        GameConfig::from_toml(toml::from_str(text).unwrap())
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.tuning.map.width, 25);
        assert_eq!(cfg.tuning.map.height, 19);
        assert_eq!(cfg.tuning.player.spawn, (12, 9));
        assert_eq!(cfg.tuning.enemy.spawns.len(), 5);
        assert_eq!(cfg.tuning.map.crate_health, (2, 2));
        assert!(cfg.paths.is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = parse("[player]\nattack_radius = 128.0\n");
        assert_eq!(cfg.tuning.player.attack_radius, 128.0);
        assert_eq!(cfg.tuning.player.attack_cooldown, 0.5);
        assert_eq!(cfg.tuning.enemy.detection_range, 200.0);
    }

    #[test]
    fn legacy_crate_range_and_custom_path() {
        let cfg = parse(
            "[map]\ncrate_health = [1, 5]\n\n[paths.ridge]\nwaypoints = [[0.0, 0.5], [1.0, 0.5]]\n",
        );
        assert_eq!(cfg.tuning.map.crate_health, (1, 5));
        assert_eq!(cfg.paths["ridge"], vec![(0.0, 0.5), (1.0, 0.5)]);
    }

    #[test]
    fn nonsense_ranges_are_repaired() {
        let cfg = parse("[map]\ncrate_health = [0, -3]\n[enemy]\nwander_range = [3.0, 1.0]\n");
        assert_eq!(cfg.tuning.map.crate_health, (1, 1));
        assert_eq!(cfg.tuning.enemy.wander_range, (1.0, 3.0));
    }

    #[test]
    fn bad_frame_clamp_uses_default() {
        assert_eq!(parse("[timing]\nmax_frame_secs = -0.5\n").timing.max_frame_secs, 0.1);
        assert_eq!(parse("[timing]\nmax_frame_secs = nan\n").timing.max_frame_secs, 0.1);
        assert_eq!(parse("[timing]\nmax_frame_secs = 0.0\n").timing.max_frame_secs, 0.1);
        assert_eq!(parse("[timing]\nmax_frame_secs = 0.25\n").timing.max_frame_secs, 0.25);
    }

    #[test]
    fn malformed_text_falls_back() {
        let cfg = GameConfig::from_toml(parse_or_default("[player\n", Path::new("x.toml")));
        assert_eq!(cfg.tuning.player.move_speed, 200.0);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = GameConfig::load_from(Path::new("/definitely/not/here/config.toml")).unwrap_err();
        assert!(matches!(err, GameError::Config { .. }));
    }
}
