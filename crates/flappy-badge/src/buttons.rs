//! Game controls — polled once per tick with press-edge detection.
//!
//! The game uses two of the badge's buttons: A (flap / start / restart)
//! and SELECT (demo-mode toggle). [`Buttons::poll`] samples both and
//! reports the just-pressed edges the session consumes; holding a button
//! produces a single edge.

use esp_hal::gpio::{
    Input,
    InputConfig,
    Pull,
};
use flappy_core::Controls;

use crate::ButtonResources;

pub struct Buttons {
    a: Input<'static>,
    select: Input<'static>,
    a_was_down: bool,
    select_was_down: bool,
}

impl From<ButtonResources<'static>> for Buttons {
    fn from(res: ButtonResources<'static>) -> Self {
        Self {
            a: Input::new(res.a, InputConfig::default().with_pull(Pull::Up)),
            select: Input::new(res.select, InputConfig::default().with_pull(Pull::Down)),
            a_was_down: false,
            select_was_down: false,
        }
    }
}

impl Buttons {
    /// Sample both buttons and report press edges since the previous poll.
    /// A is active low; SELECT is wired active high.
    pub fn poll(&mut self) -> Controls {
        let a_down = self.a.is_low();
        let select_down = self.select.is_high();
        let controls = Controls {
            action: a_down && !self.a_was_down,
            toggle_demo: select_down && !self.select_was_down,
        };
        self.a_was_down = a_down;
        self.select_was_down = select_down;
        controls
    }
}
