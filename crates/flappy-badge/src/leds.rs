//! WS2812 status LEDs via the RMT peripheral.
//!
//! The badge's ten RGB LEDs sit in two five-LED bars flanking the display.
//! The game treats them as one symmetric meter: score while playing, red
//! flashes on a crash.

extern crate alloc;

use defmt::error;
use embassy_time::{
    Duration,
    Timer,
};
use esp_hal::{
    Blocking,
    gpio::Level,
    rmt::{
        PulseCode,
        Tx,
    },
};
use palette::Srgb;

/// Total WS2812 LEDs on the badge.
pub const LED_COUNT: usize = 10;
/// LEDs per bar. Hardware indices 0–4 run bottom-to-top on the right bar,
/// 5–9 top-to-bottom on the left.
pub const BAR_COUNT: usize = 5;

/// WS2812 strip driver with an in-memory framebuffer, flushed to the
/// hardware with [`update`](Leds::update).
pub struct Leds<'a> {
    channel: Option<esp_hal::rmt::Channel<'a, Blocking, Tx>>,
    framebuffer: [Srgb<u8>; LED_COUNT],
}

impl<'a> Leds<'a> {
    pub const fn new(channel: esp_hal::rmt::Channel<'a, Blocking, Tx>) -> Self {
        Self {
            channel: Some(channel),
            framebuffer: [Srgb::new(0, 0, 0); LED_COUNT],
        }
    }

    /// Flush the framebuffer to the physical LEDs.
    pub async fn update(&mut self) {
        let Some(channel) = self.channel.take() else {
            error!("RMT channel lost during previous transmission");
            return;
        };

        let pulses = self
            .framebuffer
            .iter()
            .flat_map(|color| {
                let c: palette::rgb::Rgb<palette::encoding::Srgb, u8> = color.into_format::<u8>();
                // WS2812 expects GRB byte order
                [
                    Self::byte_to_pulses(c.green),
                    Self::byte_to_pulses(c.red),
                    Self::byte_to_pulses(c.blue),
                ]
                .into_iter()
                .flatten()
            })
            .chain(core::iter::once(PulseCode::end_marker()))
            .collect::<alloc::vec::Vec<_>>();

        let transaction = match channel.transmit(&pulses) {
            Ok(t) => t,
            Err(e) => {
                error!("RMT transmit failed: {}", e);
                return;
            }
        };

        self.channel = Some(match transaction.wait() {
            Ok(ch) => ch,
            Err((err, ch)) => {
                error!("RMT transaction failed: {}", err);
                ch
            }
        });

        // WS2812 reset time
        Timer::after(Duration::from_micros(50)).await;
    }

    /// Fill every LED with one colour.
    pub fn fill(&mut self, color: Srgb<u8>) {
        self.framebuffer.fill(color);
    }

    /// Turn everything off.
    pub fn clear(&mut self) {
        self.fill(Srgb::new(0, 0, 0));
    }

    /// Set both bars to the same colours, ordered bottom-to-top. The left
    /// bar's hardware order is mirrored internally so the two sides light
    /// symmetrically.
    pub fn set_bars(&mut self, colors: &[Srgb<u8>; BAR_COUNT]) {
        self.framebuffer[..BAR_COUNT].copy_from_slice(colors);
        for i in 0..BAR_COUNT {
            self.framebuffer[BAR_COUNT + i] = colors[BAR_COUNT - 1 - i];
        }
    }

    // ── Internal helpers ────────────────────────────────────────────────

    /// WS2812 bit timing at 40 MHz RMT clock.
    const fn bit_to_pulse(bit: bool) -> PulseCode {
        if bit {
            // '1': 0.8 µs high (32 ticks), 0.45 µs low (18 ticks)
            PulseCode::new(Level::High, 32, Level::Low, 18)
        } else {
            // '0': 0.4 µs high (16 ticks), 0.85 µs low (34 ticks)
            PulseCode::new(Level::High, 16, Level::Low, 34)
        }
    }

    fn byte_to_pulses(byte: u8) -> [PulseCode; 8] {
        let mut pulses = [PulseCode::default(); 8];
        for (i, pulse) in pulses.iter_mut().enumerate() {
            *pulse = Self::bit_to_pulse((byte >> (7 - i)) & 1 != 0);
        }
        pulses
    }
}
