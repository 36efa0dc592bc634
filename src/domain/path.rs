/// Waypoint paths: named maps of normalized waypoints and a follower that
/// walks them at a fixed rate.
///
/// Waypoints live in `[0, 1]²`; callers scale the follower's position to
/// whatever space they move in. Progress between two waypoints runs
/// 0.0 → 1.0; reaching 1.0 hands over to the next segment with progress
/// back at 0 (overflow is dropped). On the last waypoint the follower
/// parks with progress clamped at 1.0.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::GameError;

pub type Waypoint = (f32, f32);

/// Built-in patrol route, left edge to top-right.
const LAVA_HELL: [Waypoint; 10] = [
    (0.05, 0.6),
    (0.15, 0.6),
    (0.25, 0.7),
    (0.35, 0.8),
    (0.45, 0.7),
    (0.55, 0.6),
    (0.65, 0.5),
    (0.75, 0.4),
    (0.85, 0.3),
    (0.95, 0.2),
];

/// Named waypoint lists.
#[derive(Clone, Debug)]
pub struct MapRegistry {
    maps: BTreeMap<String, Vec<Waypoint>>,
}

impl Default for MapRegistry {
    fn default() -> Self {
        let mut maps = BTreeMap::new();
        maps.insert("lava_hell".to_string(), LAVA_HELL.to_vec());
        MapRegistry { maps }
    }
}

impl MapRegistry {
    /// Built-ins plus `extra`; an extra entry with a built-in name replaces it.
    pub fn with_paths(extra: &BTreeMap<String, Vec<Waypoint>>) -> Self {
        let mut reg = MapRegistry::default();
        for (name, points) in extra {
            reg.maps.insert(name.clone(), points.clone());
        }
        reg
    }

    pub fn get(&self, map_id: &str) -> Option<&[Waypoint]> {
        self.maps.get(map_id).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }
}

#[derive(Clone, Debug)]
pub struct PathFollower {
    waypoints: Vec<Waypoint>,
    index: usize,
    progress: f32,
    speed: f32,
}

impl PathFollower {
    /// `speed` is progress per millisecond.
    pub fn new(registry: &MapRegistry, map_id: &str, speed: f32) -> Result<Self, GameError> {
        let Some(points) = registry.get(map_id) else {
            let known: Vec<&str> = registry.names().collect();
            warn!(map = map_id, ?known, "no such path map");
            return Err(GameError::UnknownMap(map_id.to_string()));
        };
        if points.is_empty() {
            return Err(GameError::EmptyPath(map_id.to_string()));
        }
        debug!(map = map_id, waypoints = points.len(), "path follower created");
        Ok(PathFollower { waypoints: points.to_vec(), index: 0, progress: 0.0, speed })
    }

    fn last(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// Interpolated position on the current segment.
    pub fn current_position(&self) -> Waypoint {
        let a = self.waypoints[self.index];
        if self.index >= self.last() {
            return a;
        }
        let b = self.waypoints[self.index + 1];
        let t = self.progress;
        (a.0 * (1.0 - t) + b.0 * t, a.1 * (1.0 - t) + b.1 * t)
    }

    pub fn update(&mut self, delta_ms: f32) {
        self.progress += self.speed * delta_ms.max(0.0);
        if self.progress >= 1.0 {
            if self.index < self.last() {
                self.index += 1;
                self.progress = 0.0;
            }
            if self.index >= self.last() {
                self.progress = 1.0;
            }
        }
    }

    pub fn has_reached_end(&self) -> bool {
        self.index >= self.last() && self.progress >= 1.0
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.progress = 0.0;
    }

    #[cfg(test)]
    pub fn index(&self) -> usize {
        self.index
    }

    #[cfg(test)]
    pub fn progress(&self) -> f32 {
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower(points: &[Waypoint], speed: f32) -> PathFollower {
        let mut extra = BTreeMap::new();
        extra.insert("test".to_string(), points.to_vec());
        PathFollower::new(&MapRegistry::with_paths(&extra), "test", speed).unwrap()
    }

    #[test]
    fn unknown_map_is_an_error() {
        let err = PathFollower::new(&MapRegistry::default(), "nowhere", 0.001).unwrap_err();
        assert!(matches!(err, GameError::UnknownMap(ref id) if id == "nowhere"));
    }

    #[test]
    fn empty_map_is_an_error() {
        let mut extra = BTreeMap::new();
        extra.insert("void".to_string(), Vec::new());
        let reg = MapRegistry::with_paths(&extra);
        assert!(matches!(PathFollower::new(&reg, "void", 0.001), Err(GameError::EmptyPath(_))));
    }

    #[test]
    fn builtin_route_starts_at_first_waypoint() {
        let f = PathFollower::new(&MapRegistry::default(), "lava_hell", 0.001).unwrap();
        assert_eq!(f.current_position(), (0.05, 0.6));
        assert!(!f.has_reached_end());
    }

    #[test]
    fn interpolates_midway() {
        let mut f = follower(&[(0.0, 0.0), (1.0, 0.5)], 0.001);
        f.update(500.0);
        let (x, y) = f.current_position();
        assert!((x - 0.5).abs() < 1e-6);
        assert!((y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn segment_handover_drops_overflow() {
        let mut f = follower(&[(0.0, 0.0), (0.5, 0.0), (1.0, 0.0)], 0.001);
        f.update(1500.0);
        assert_eq!(f.index(), 1);
        assert_eq!(f.progress(), 0.0);
        assert_eq!(f.current_position(), (0.5, 0.0));
    }

    #[test]
    fn clamps_at_the_end() {
        let mut f = follower(&[(0.0, 0.0), (1.0, 1.0)], 0.001);
        f.update(1000.0);
        assert!(f.has_reached_end());
        assert_eq!(f.current_position(), (1.0, 1.0));
        f.update(5000.0);
        assert_eq!(f.current_position(), (1.0, 1.0));
        assert_eq!(f.progress(), 1.0);
    }

    #[test]
    fn single_waypoint_stays_put() {
        let mut f = follower(&[(0.3, 0.4)], 0.001);
        assert_eq!(f.current_position(), (0.3, 0.4));
        f.update(2000.0);
        assert!(f.has_reached_end());
        assert_eq!(f.current_position(), (0.3, 0.4));
    }

    #[test]
    fn reset_returns_to_start() {
        let mut f = follower(&[(0.0, 0.0), (1.0, 1.0)], 0.001);
        f.update(1000.0);
        f.reset();
        assert_eq!(f.current_position(), (0.0, 0.0));
        assert!(!f.has_reached_end());
    }
}
