//! Top-level session: INTRO → PLAYING → GAME_OVER and back.
//!
//! One `Session` owns everything a running game needs: the current phase,
//! the demo flag, the round (Mona + obstacles + autopilot), the
//! leaderboard, and the handful of timers the phases use. The driver calls
//! [`Session::update`] once per tick with the monotonic clock and the
//! edge-triggered button state, then renders from the accessors.

use crate::autopilot::Autopilot;
use crate::leaderboard::{Leaderboard, PlayerKind, ScoreStore};
use crate::mona::Mona;
use crate::obstacle::{Obstacle, ObstacleField};
use crate::rng::Rng;

/// Dwell on the intro screen before a demo round auto-starts.
const INTRO_DWELL_MS: u64 = 1500;
/// Pause on the game-over screen before a demo round auto-restarts.
const RESTART_DELAY_MS: u64 = 2000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Intro,
    Playing,
    GameOver,
}

/// Edge-triggered button state for one tick.
#[derive(Clone, Copy, Default)]
pub struct Controls {
    /// A was pressed this tick: flap / start / restart.
    pub action: bool,
    /// SELECT was pressed this tick: toggle demo mode (intro screen only).
    pub toggle_demo: bool,
}

struct Round {
    mona: Mona,
    field: ObstacleField,
    autopilot: Option<Autopilot>,
}

pub struct Session<S: ScoreStore> {
    phase: Phase,
    demo_mode: bool,
    rng: Rng,
    round: Option<Round>,
    leaderboard: Leaderboard<S>,
    high_score: u32,
    intro_entered_at: Option<u64>,
    restart_at: Option<u64>,
    background_offset: u32,
    score_saved: bool,
}

impl<S: ScoreStore> Session<S> {
    /// Boots on the intro screen, in demo mode, with the high score read
    /// back from the store.
    pub fn new(store: S, seed: u32) -> Self {
        let mut leaderboard = Leaderboard::new(store);
        let high_score = leaderboard.high_score();
        Self {
            phase: Phase::Intro,
            demo_mode: true,
            rng: Rng::new(seed),
            round: None,
            leaderboard,
            high_score,
            intro_entered_at: None,
            restart_at: None,
            background_offset: 0,
            score_saved: false,
        }
    }

    /// One tick of the whole game.
    pub fn update(&mut self, now_ms: u64, controls: Controls) {
        self.scroll_background();
        match self.phase {
            Phase::Intro => self.intro(now_ms, controls),
            Phase::Playing => self.play(now_ms, controls),
            Phase::GameOver => self.game_over(now_ms, controls),
        }
    }

    /// The parallax background keeps moving on the intro screen and while
    /// Mona lives; it freezes the moment she dies.
    fn scroll_background(&mut self) {
        let scrolling = match &self.round {
            None => true,
            Some(round) => !round.mona.is_dead() || self.phase == Phase::Intro,
        };
        if scrolling {
            self.background_offset = self.background_offset.wrapping_add(1);
        }
    }

    fn intro(&mut self, now_ms: u64, controls: Controls) {
        let entered = *self.intro_entered_at.get_or_insert(now_ms);

        if controls.toggle_demo {
            self.demo_mode = !self.demo_mode;
        }

        let start = if self.demo_mode {
            now_ms - entered > INTRO_DWELL_MS
        } else {
            controls.action
        };
        if start {
            self.intro_entered_at = None;
            self.start_round(now_ms);
        }
    }

    /// The single reset point for per-round state.
    fn start_round(&mut self, now_ms: u64) {
        self.phase = Phase::Playing;
        self.score_saved = false;
        self.restart_at = None;
        let seed = self.rng.next();
        self.round = Some(Round {
            mona: Mona::new(),
            field: ObstacleField::new(now_ms, seed),
            autopilot: self.demo_mode.then(Autopilot::new),
        });
    }

    fn play(&mut self, now_ms: u64, controls: Controls) {
        let Some(round) = self.round.as_mut() else {
            return;
        };

        if !round.mona.is_dead() {
            let jump = match round.autopilot.as_mut() {
                Some(pilot) => pilot.should_jump(&round.mona, &round.field, now_ms),
                None => controls.action,
            };
            if jump {
                round.mona.jump();
            }
        }

        // Pass order: Mona first, so collision and scoring run against the
        // positions the obstacles were drawn at; then spawn and advance,
        // both suspended once she is dead.
        round.mona.update(round.field.obstacles_mut());

        if !round.mona.is_dead() {
            round.field.maybe_spawn(now_ms);
            round.field.advance();
        }

        if round.mona.is_dead() && round.mona.is_done_dying() {
            self.phase = Phase::GameOver;
            self.persist_score();
        }
    }

    /// Runs exactly once per round, on the PLAYING → GAME_OVER edge.
    fn persist_score(&mut self) {
        if self.score_saved {
            return;
        }
        self.score_saved = true;

        let score = self.score();
        if score > 0 {
            let kind = if self.demo_mode {
                PlayerKind::Demo
            } else {
                PlayerKind::Human
            };
            self.leaderboard.save_score(score, kind);
            self.high_score = self.leaderboard.high_score();
        }
    }

    fn game_over(&mut self, now_ms: u64, controls: Controls) {
        if self.demo_mode {
            let restart_at = *self.restart_at.get_or_insert(now_ms + RESTART_DELAY_MS);
            if now_ms >= restart_at {
                self.restart_at = None;
                self.phase = Phase::Intro;
            }
        } else if controls.action {
            self.phase = Phase::Intro;
        }
    }

    // ── Accessors for the renderer ──────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    pub fn background_offset(&self) -> u32 {
        self.background_offset
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn mona(&self) -> Option<&Mona> {
        self.round.as_ref().map(|round| &round.mona)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.round
            .as_ref()
            .map_or(&[], |round| round.field.obstacles())
    }

    /// Score of the current (or just-finished) round.
    pub fn score(&self) -> u32 {
        self.round.as_ref().map_or(0, |round| round.mona.score())
    }

    /// Milliseconds until the demo-mode auto-restart, while counting down.
    pub fn restart_countdown_ms(&self, now_ms: u64) -> Option<u64> {
        self.restart_at.map(|at| at.saturating_sub(now_ms))
    }
}
