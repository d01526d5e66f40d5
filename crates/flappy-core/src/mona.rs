//! Mona, the player character.
//!
//! Mona sits in a fixed horizontal lane and only moves vertically: gravity
//! pulls her down every tick, a jump replaces her velocity with a fixed
//! upward impulse. She dies by leaving the playfield or touching the solid
//! part of an obstacle, after which a short death animation plays out
//! before the round is allowed to end.

use crate::GROUND_Y;
use crate::obstacle::{GAP_HEIGHT, OBSTACLE_W, Obstacle};

/// Mona's fixed x lane (her center).
pub const MONA_X: f32 = 64.0;
/// Horizontal extent used for collision.
pub const MONA_W: f32 = 16.0;

const GRAVITY: f32 = 0.18;
const JUMP_IMPULSE: f32 = -2.6;
const MAX_FALL_SPEED: f32 = 4.0;

/// Ticks the death animation runs before `is_done_dying` reports true,
/// long enough for the seven-frame ghost to play out.
pub const DYING_TICKS: u32 = 35;
/// Frames in the ghost animation, for the renderer.
pub const GHOST_FRAMES: u32 = 7;

pub struct Mona {
    y: f32,
    velocity: f32,
    alive: bool,
    dying_ticks: u32,
    score: u32,
}

impl Mona {
    pub fn new() -> Self {
        Self {
            y: GROUND_Y * 0.4,
            velocity: 0.0,
            alive: true,
            dying_ticks: 0,
            score: 0,
        }
    }

    /// Replace the current velocity with the jump impulse. Jumps do not
    /// accumulate, and a dead Mona no longer responds.
    pub fn jump(&mut self) {
        if self.alive {
            self.velocity = JUMP_IMPULSE;
        }
    }

    /// One tick of simulation. While alive: integrate physics, flip the
    /// `passed` flag (and score) for obstacles that fell behind, then check
    /// playfield bounds and obstacle collision. While dead: advance the
    /// death animation.
    pub fn update(&mut self, obstacles: &mut [Obstacle]) {
        if !self.alive {
            self.dying_ticks = (self.dying_ticks + 1).min(DYING_TICKS);
            return;
        }

        self.velocity = (self.velocity + GRAVITY).min(MAX_FALL_SPEED);
        self.y += self.velocity;

        for ob in obstacles.iter_mut() {
            if !ob.passed && ob.x + OBSTACLE_W < MONA_X {
                ob.passed = true;
                self.score += 1;
            }
        }

        if self.y < 0.0 || self.y > GROUND_Y {
            self.alive = false;
            return;
        }
        if obstacles.iter().any(|ob| self.collides(ob)) {
            self.alive = false;
        }
    }

    /// Solid contact: horizontal extents overlap and Mona's y is outside
    /// the gap band.
    fn collides(&self, ob: &Obstacle) -> bool {
        let half = MONA_W / 2.0;
        let overlaps_x = MONA_X + half > ob.x && MONA_X - half < ob.x + OBSTACLE_W;
        overlaps_x && !(self.y >= ob.gap_y && self.y <= ob.gap_y + GAP_HEIGHT)
    }

    pub fn is_dead(&self) -> bool {
        !self.alive
    }

    /// True once the death animation has run to completion. Death and
    /// done-dying are distinct so the ghost can play before the session
    /// moves to GAME_OVER.
    pub fn is_done_dying(&self) -> bool {
        !self.alive && self.dying_ticks >= DYING_TICKS
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Current ghost animation frame, `0..GHOST_FRAMES`.
    pub fn dying_frame(&self) -> u32 {
        (self.dying_ticks * GHOST_FRAMES / DYING_TICKS).min(GHOST_FRAMES - 1)
    }

    #[cfg(test)]
    pub(crate) fn with_state(y: f32, velocity: f32) -> Self {
        Self {
            y,
            velocity,
            alive: true,
            dying_ticks: 0,
            score: 0,
        }
    }
}

impl Default for Mona {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_obstacles() -> [Obstacle; 0] {
        []
    }

    #[test]
    fn test_gravity_accelerates_and_integrates() {
        let mut mona = Mona::new();
        let y0 = mona.y();
        mona.update(&mut no_obstacles());
        assert_eq!(mona.velocity(), GRAVITY);
        assert!(mona.y() > y0);
        mona.update(&mut no_obstacles());
        assert_eq!(mona.velocity(), 2.0 * GRAVITY);
    }

    #[test]
    fn test_jump_overrides_velocity() {
        let mut mona = Mona::with_state(60.0, MAX_FALL_SPEED);
        mona.jump();
        assert_eq!(mona.velocity(), JUMP_IMPULSE);
        // A second jump replaces again rather than stacking.
        mona.jump();
        assert_eq!(mona.velocity(), JUMP_IMPULSE);
    }

    #[test]
    fn test_fall_speed_is_clamped() {
        let mut mona = Mona::with_state(10.0, 0.0);
        for _ in 0..100 {
            mona.update(&mut no_obstacles());
            if mona.is_dead() {
                break;
            }
        }
        assert!(mona.velocity() <= MAX_FALL_SPEED);
    }

    #[test]
    fn test_dies_on_ground_contact() {
        let mut mona = Mona::with_state(GROUND_Y - 1.0, MAX_FALL_SPEED);
        mona.update(&mut no_obstacles());
        assert!(mona.is_dead());
        assert!(!mona.is_done_dying());
    }

    #[test]
    fn test_dies_above_playfield() {
        let mut mona = Mona::with_state(0.5, JUMP_IMPULSE);
        mona.update(&mut no_obstacles());
        assert!(mona.is_dead());
    }

    #[test]
    fn test_jump_is_noop_when_dead() {
        let mut mona = Mona::with_state(GROUND_Y - 0.1, MAX_FALL_SPEED);
        mona.update(&mut no_obstacles());
        assert!(mona.is_dead());
        let v = mona.velocity();
        mona.jump();
        assert_eq!(mona.velocity(), v);
    }

    #[test]
    fn test_done_dying_after_fixed_ticks() {
        let mut mona = Mona::with_state(GROUND_Y - 0.1, MAX_FALL_SPEED);
        mona.update(&mut no_obstacles());
        assert!(mona.is_dead());
        for _ in 0..DYING_TICKS - 1 {
            assert!(!mona.is_done_dying());
            mona.update(&mut no_obstacles());
        }
        mona.update(&mut no_obstacles());
        assert!(mona.is_done_dying());
        assert_eq!(mona.dying_frame(), GHOST_FRAMES - 1);
    }

    #[test]
    fn test_safe_inside_gap() {
        // Mona strictly within the gap band at the obstacle's x never dies
        // at that obstacle.
        let gap_y = 50.0;
        let mut obstacles = [Obstacle {
            x: MONA_X - OBSTACLE_W / 2.0,
            gap_y,
            passed: false,
        }];
        let mut mona = Mona::with_state(gap_y + GAP_HEIGHT / 2.0, 0.0);
        mona.update(&mut obstacles);
        assert!(!mona.is_dead());
    }

    #[test]
    fn test_dies_outside_gap() {
        let gap_y = 50.0;
        let mut obstacles = [Obstacle {
            x: MONA_X - OBSTACLE_W / 2.0,
            gap_y,
            passed: false,
        }];
        let mut mona = Mona::with_state(gap_y + GAP_HEIGHT + 10.0, 0.0);
        mona.update(&mut obstacles);
        assert!(mona.is_dead());
    }

    #[test]
    fn test_no_collision_when_clear_of_obstacle() {
        let mut obstacles = [Obstacle {
            x: MONA_X + MONA_W, // strictly ahead, no horizontal overlap
            gap_y: 50.0,
            passed: false,
        }];
        let mut mona = Mona::with_state(10.0, 0.0);
        mona.update(&mut obstacles);
        assert!(!mona.is_dead());
    }

    #[test]
    fn test_score_increments_once_per_obstacle() {
        let mut obstacles = [Obstacle {
            x: MONA_X - OBSTACLE_W - 1.0, // right edge already behind Mona
            gap_y: 50.0,
            passed: false,
        }];
        let mut mona = Mona::with_state(60.0, 0.0);
        mona.update(&mut obstacles);
        assert_eq!(mona.score(), 1);
        assert!(obstacles[0].passed);
        // Same obstacle never scores again.
        mona.update(&mut obstacles);
        assert_eq!(mona.score(), 1);
    }

    #[test]
    fn test_score_is_monotonic() {
        let mut obstacles = [
            Obstacle {
                x: MONA_X - OBSTACLE_W - 1.0,
                gap_y: 50.0,
                passed: false,
            },
            Obstacle {
                x: MONA_X + 100.0,
                gap_y: 50.0,
                passed: false,
            },
        ];
        let mut mona = Mona::with_state(60.0, 0.0);
        let mut last = 0;
        for _ in 0..30 {
            mona.update(&mut obstacles);
            assert!(mona.score() >= last);
            last = mona.score();
            // Drag the second obstacle past Mona.
            obstacles[1].x -= 10.0;
        }
        assert_eq!(mona.score(), 2);
    }
}
