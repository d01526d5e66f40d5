//! Obstacles and the registry that spawns, scrolls, and retires them.

use alloc::vec::Vec;

use crate::rng::Rng;
use crate::{GROUND_Y, PLAYFIELD_W};

/// Obstacle body width.
pub const OBSTACLE_W: f32 = 24.0;
/// Vertical size of the passable gap, identical for every obstacle.
pub const GAP_HEIGHT: f32 = 48.0;
/// Gaps never start closer than this to the playfield edges.
const GAP_MARGIN: f32 = 10.0;

/// Horizontal scroll per tick.
pub const SCROLL_SPEED: f32 = 2.0;
/// Interval between spawns once the field is running.
const SPAWN_INTERVAL_MS: u64 = 1800;
/// Grace period between round start and the first obstacle.
pub const FIRST_SPAWN_DELAY_MS: u64 = 500;

pub struct Obstacle {
    pub x: f32,
    /// Top of the passable gap; the band is `gap_y..gap_y + GAP_HEIGHT`.
    pub gap_y: f32,
    /// Set once the obstacle has been scored.
    pub passed: bool,
}

/// The round's obstacle registry: live obstacles in spawn order plus the
/// absolute timestamp of the next spawn.
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    next_spawn_at: u64,
    rng: Rng,
}

impl ObstacleField {
    pub fn new(now_ms: u64, seed: u32) -> Self {
        Self {
            obstacles: Vec::new(),
            next_spawn_at: now_ms + FIRST_SPAWN_DELAY_MS,
            rng: Rng::new(seed),
        }
    }

    /// Append a new obstacle at the right edge when the spawn timer has
    /// elapsed, then push the timer forward by the fixed interval.
    pub fn maybe_spawn(&mut self, now_ms: u64) {
        if now_ms <= self.next_spawn_at {
            return;
        }
        let span = (GROUND_Y - GAP_HEIGHT - 2.0 * GAP_MARGIN) as u32;
        let gap_y = GAP_MARGIN + self.rng.range(span) as f32;
        self.obstacles.push(Obstacle {
            x: PLAYFIELD_W,
            gap_y,
            passed: false,
        });
        self.next_spawn_at += SPAWN_INTERVAL_MS;
    }

    /// Scroll every obstacle left and drop the ones fully off-screen.
    pub fn advance(&mut self) {
        for ob in &mut self.obstacles {
            ob.x -= SCROLL_SPEED;
        }
        self.obstacles.retain(|ob| ob.x + OBSTACLE_W > 0.0);
    }

    /// The obstacle strictly ahead of `x` with the smallest distance, if
    /// any. Read-only; used by the autopilot.
    pub fn nearest_ahead(&self, x: f32) -> Option<&Obstacle> {
        let mut nearest = None;
        let mut min_distance = f32::MAX;
        for ob in &self.obstacles {
            let distance = ob.x - x;
            if distance > 0.0 && distance < min_distance {
                min_distance = distance;
                nearest = Some(ob);
            }
        }
        nearest
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut [Obstacle] {
        &mut self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, ob: Obstacle) {
        self.obstacles.push(ob);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_spawn_before_timer() {
        let mut field = ObstacleField::new(1000, 7);
        field.maybe_spawn(1000 + FIRST_SPAWN_DELAY_MS);
        assert!(field.is_empty());
    }

    #[test]
    fn test_spawn_after_timer_at_right_edge() {
        let mut field = ObstacleField::new(1000, 7);
        field.maybe_spawn(1000 + FIRST_SPAWN_DELAY_MS + 1);
        assert_eq!(field.len(), 1);
        let ob = &field.obstacles()[0];
        assert_eq!(ob.x, PLAYFIELD_W);
        assert!(!ob.passed);
    }

    #[test]
    fn test_spawn_interval_advances() {
        let mut field = ObstacleField::new(0, 7);
        let t1 = FIRST_SPAWN_DELAY_MS + 1;
        field.maybe_spawn(t1);
        assert_eq!(field.len(), 1);
        // Timer moved forward by one interval; the same instant spawns
        // nothing more.
        field.maybe_spawn(t1);
        assert_eq!(field.len(), 1);
        field.maybe_spawn(t1 + SPAWN_INTERVAL_MS);
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn test_gap_always_leaves_room() {
        let mut field = ObstacleField::new(0, 0xC0FF_EE01);
        let mut t = FIRST_SPAWN_DELAY_MS + 1;
        for _ in 0..100 {
            field.maybe_spawn(t);
            t += SPAWN_INTERVAL_MS;
        }
        for ob in field.obstacles() {
            assert!(ob.gap_y >= GAP_MARGIN);
            assert!(ob.gap_y + GAP_HEIGHT <= GROUND_Y - GAP_MARGIN);
        }
    }

    #[test]
    fn test_advance_scrolls_left() {
        let mut field = ObstacleField::new(0, 7);
        field.maybe_spawn(FIRST_SPAWN_DELAY_MS + 1);
        field.advance();
        assert_eq!(field.obstacles()[0].x, PLAYFIELD_W - SCROLL_SPEED);
    }

    #[test]
    fn test_removed_exactly_when_off_screen() {
        let mut field = ObstacleField::new(0, 7);
        field.push(Obstacle {
            x: -OBSTACLE_W + SCROLL_SPEED + 0.5,
            gap_y: 50.0,
            passed: true,
        });
        field.advance();
        // Right edge still past zero: kept.
        assert_eq!(field.len(), 1);
        field.advance();
        // Now fully off-screen: gone.
        assert!(field.is_empty());
    }

    #[test]
    fn test_registry_stays_bounded_over_long_session() {
        let mut field = ObstacleField::new(0, 7);
        let mut t = 0;
        for _ in 0..10_000 {
            t += 20;
            field.maybe_spawn(t);
            field.advance();
        }
        // Spawn interval and scroll speed bound the number of live
        // obstacles to what fits on screen.
        let per_screen = (PLAYFIELD_W / (SCROLL_SPEED * SPAWN_INTERVAL_MS as f32 / 20.0)) as usize;
        assert!(field.len() <= per_screen + 2);
    }

    #[test]
    fn test_nearest_ahead_ignores_behind() {
        let mut field = ObstacleField::new(0, 7);
        field.push(Obstacle {
            x: 10.0,
            gap_y: 50.0,
            passed: true,
        });
        field.push(Obstacle {
            x: 200.0,
            gap_y: 50.0,
            passed: false,
        });
        field.push(Obstacle {
            x: 120.0,
            gap_y: 50.0,
            passed: false,
        });
        let nearest = field.nearest_ahead(64.0).unwrap();
        assert_eq!(nearest.x, 120.0);
    }

    #[test]
    fn test_nearest_ahead_none_when_empty_or_all_behind() {
        let mut field = ObstacleField::new(0, 7);
        assert!(field.nearest_ahead(64.0).is_none());
        field.push(Obstacle {
            x: 64.0,
            gap_y: 50.0,
            passed: false,
        });
        // Distance must be strictly positive.
        assert!(field.nearest_ahead(64.0).is_none());
    }
}
