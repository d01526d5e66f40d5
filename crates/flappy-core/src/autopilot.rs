//! The rule-based pilot that plays demo mode.
//!
//! A reactive heuristic, not a planner: every tick it re-reads Mona and the
//! single nearest obstacle ahead and decides jump / no-jump from scratch.
//! The only state it keeps is the timestamp of its own last jump, used to
//! keep it from hammering the button.

use crate::mona::{MONA_X, Mona};
use crate::obstacle::{GAP_HEIGHT, ObstacleField};

/// Obstacles farther than this are ignored in favor of altitude holding.
const LOOK_AHEAD: f32 = 80.0;
/// Inside this range the pilot switches to short-horizon prediction.
const NEAR: f32 = 40.0;
/// Safety margin below the gap center before committing to a jump.
const JUMP_BUFFER: f32 = 5.0;
/// When the prediction lands this far above the gap center, let gravity work.
const HOLD_MARGIN: f32 = 10.0;
/// With nothing ahead, jump whenever Mona sinks below this altitude.
const SAFE_ALTITUDE: f32 = 60.0;
/// Simulated steps for the position prediction.
const PREDICT_STEPS: f32 = 5.0;
/// Minimum gap between two autopilot jumps.
const JUMP_COOLDOWN_MS: u64 = 200;

pub struct Autopilot {
    last_jump_at: u64,
}

impl Autopilot {
    pub fn new() -> Self {
        Self { last_jump_at: 0 }
    }

    /// Decide whether Mona should jump this tick. Deterministic in
    /// `(mona, field, now_ms)` plus the cooldown state; every `true`
    /// stamps the cooldown.
    pub fn should_jump(&mut self, mona: &Mona, field: &ObstacleField, now_ms: u64) -> bool {
        if mona.is_dead() {
            return false;
        }
        if now_ms.saturating_sub(self.last_jump_at) < JUMP_COOLDOWN_MS {
            return false;
        }

        let y = mona.y();
        let velocity = mona.velocity();

        let Some(ob) = field.nearest_ahead(MONA_X) else {
            return self.altitude_hold(y, now_ms);
        };
        let distance = ob.x - MONA_X;
        if distance > LOOK_AHEAD {
            return self.altitude_hold(y, now_ms);
        }

        let gap_center = ob.gap_y + GAP_HEIGHT / 2.0;

        if distance < NEAR {
            // Close in: steer off a short prediction of where Mona will be.
            let predicted = y + velocity * PREDICT_STEPS;

            // Above the center and falling into it: gravity is doing the work.
            if predicted < gap_center - HOLD_MARGIN && velocity > 0.0 {
                return false;
            }
            if predicted > gap_center + JUMP_BUFFER {
                self.last_jump_at = now_ms;
                return true;
            }
            // Dropping fast below the center line: bail out.
            if velocity > 1.0 && y > gap_center {
                self.last_jump_at = now_ms;
                return true;
            }
        } else if y > gap_center + JUMP_BUFFER && velocity > -1.0 {
            // Still have room: drift toward the gap center, jumping only
            // when sagging below it without already rising.
            self.last_jump_at = now_ms;
            return true;
        }

        false
    }

    /// Fallback with no obstacle in range: keep a safe altitude.
    fn altitude_hold(&mut self, y: f32, now_ms: u64) -> bool {
        if y > SAFE_ALTITUDE {
            self.last_jump_at = now_ms;
            return true;
        }
        false
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::Obstacle;

    fn empty_field() -> ObstacleField {
        ObstacleField::new(0, 7)
    }

    fn field_with(x: f32, gap_y: f32) -> ObstacleField {
        let mut field = ObstacleField::new(0, 7);
        field.push(Obstacle {
            x,
            gap_y,
            passed: false,
        });
        field
    }

    fn dead_mona() -> Mona {
        let mut mona = Mona::with_state(crate::GROUND_Y - 0.1, 4.0);
        mona.update(&mut []);
        assert!(mona.is_dead());
        mona
    }

    #[test]
    fn test_never_jumps_when_dead() {
        let mut ap = Autopilot::new();
        // Even with geometry that would otherwise demand a jump.
        let field = field_with(MONA_X + 30.0, 10.0);
        assert!(!ap.should_jump(&dead_mona(), &field, 10_000));
    }

    #[test]
    fn test_altitude_hold_without_obstacles() {
        let mut ap = Autopilot::new();
        let low = Mona::with_state(SAFE_ALTITUDE + 1.0, 0.0);
        assert!(ap.should_jump(&low, &empty_field(), 10_000));

        let mut ap = Autopilot::new();
        let high = Mona::with_state(SAFE_ALTITUDE - 1.0, 0.0);
        assert!(!ap.should_jump(&high, &empty_field(), 10_000));
    }

    #[test]
    fn test_distant_obstacle_falls_back_to_altitude_hold() {
        let mut ap = Autopilot::new();
        // Obstacle beyond look-ahead; gap location must not matter.
        let field = field_with(MONA_X + LOOK_AHEAD + 1.0, 10.0);
        let low = Mona::with_state(SAFE_ALTITUDE + 1.0, 0.0);
        assert!(ap.should_jump(&low, &field, 10_000));
    }

    #[test]
    fn test_cooldown_suppresses_jumps() {
        let mut ap = Autopilot::new();
        let low = Mona::with_state(SAFE_ALTITUDE + 20.0, 2.0);
        let field = empty_field();
        assert!(ap.should_jump(&low, &field, 10_000));
        // Two follow-up calls inside the cooldown window return false
        // regardless of geometry.
        assert!(!ap.should_jump(&low, &field, 10_000 + 100));
        assert!(!ap.should_jump(&low, &field, 10_000 + JUMP_COOLDOWN_MS - 1));
        // And clear again once the window has passed.
        assert!(ap.should_jump(&low, &field, 10_000 + JUMP_COOLDOWN_MS));
    }

    #[test]
    fn test_near_obstacle_jumps_when_predicted_below_gap() {
        let mut ap = Autopilot::new();
        let gap_y = 40.0;
        let gap_center = gap_y + GAP_HEIGHT / 2.0;
        let field = field_with(MONA_X + NEAR - 5.0, gap_y);
        // Falling; prediction lands well below the center.
        let mona = Mona::with_state(gap_center + 5.0, 2.0);
        assert!(ap.should_jump(&mona, &field, 10_000));
    }

    #[test]
    fn test_near_obstacle_holds_when_falling_into_gap_from_above() {
        let mut ap = Autopilot::new();
        let gap_y = 80.0;
        let gap_center = gap_y + GAP_HEIGHT / 2.0;
        let field = field_with(MONA_X + NEAR - 5.0, gap_y);
        // Above the center, falling gently: predicted position stays above
        // the hold margin, so gravity is left to do the approach.
        let mona = Mona::with_state(gap_center - 25.0, 1.0);
        assert!(!ap.should_jump(&mona, &field, 10_000));
    }

    #[test]
    fn test_near_obstacle_jumps_when_dropping_past_center() {
        let mut ap = Autopilot::new();
        let gap_y = 40.0;
        let gap_center = gap_y + GAP_HEIGHT / 2.0;
        let field = field_with(MONA_X + NEAR - 5.0, gap_y);
        // Just below center and dropping: must not hold.
        let mona = Mona::with_state(gap_center + 1.0, 1.2);
        assert!(ap.should_jump(&mona, &field, 10_000));
    }

    #[test]
    fn test_far_obstacle_aims_for_gap_center() {
        let mut ap = Autopilot::new();
        let gap_y = 40.0;
        let gap_center = gap_y + GAP_HEIGHT / 2.0;
        let field = field_with(MONA_X + NEAR + 10.0, gap_y);
        // Sagging below the center without rising: jump.
        let mona = Mona::with_state(gap_center + JUMP_BUFFER + 1.0, 0.0);
        assert!(ap.should_jump(&mona, &field, 10_000));

        // Already rising strongly: hold even below the center.
        let mut ap = Autopilot::new();
        let rising = Mona::with_state(gap_center + JUMP_BUFFER + 1.0, -2.0);
        assert!(!ap.should_jump(&rising, &field, 10_000));

        // Above the center: hold.
        let mut ap = Autopilot::new();
        let above = Mona::with_state(gap_center - 1.0, 0.0);
        assert!(!ap.should_jump(&above, &field, 10_000));
    }

    #[test]
    fn test_decision_is_deterministic() {
        let field = field_with(MONA_X + 30.0, 40.0);
        let mona = Mona::with_state(90.0, 1.5);
        let mut first = Autopilot::new();
        let mut second = Autopilot::new();
        // Identical inputs and cooldown state produce identical outputs.
        assert_eq!(
            first.should_jump(&mona, &field, 10_000),
            second.should_jump(&mona, &field, 10_000)
        );
        assert_eq!(
            first.should_jump(&mona, &field, 10_000 + 300),
            second.should_jump(&mona, &field, 10_000 + 300)
        );
    }
}
