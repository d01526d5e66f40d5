//! Flappy Mona for the ESP32-S3 badge.
//!
//! - A flaps (and starts / restarts a round)
//! - SELECT toggles demo mode: the autopilot flies and rounds cycle on
//!   their own
//! - LEDs meter the score and flash red on a crash
//! - Top-10 scores persist in flash

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Timer};
use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle, iso_8859_1::{FONT_6X10, FONT_10X20}},
    pixelcolor::Rgb565,
    prelude::*,
    text::Text,
};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;
#[allow(clippy::wildcard_imports)]
use flappy_badge::*;
use flappy_core::{
    GROUND_Y, Mona, Obstacle, Phase, Session,
    mona::MONA_X,
    obstacle::{GAP_HEIGHT, OBSTACLE_W},
};
use palette::Srgb;

esp_bootloader_esp_idf::esp_app_desc!();

type GameSession = Session<FlashScoreStore>;

// Game tick rate. A full-frame SPI push eats most of each tick.
const TICK_MS: u64 = 30;

const W: i32 = SCREEN_W;
const H: i32 = SCREEN_H;
const GROUND: i32 = GROUND_Y as i32;

// Obstacle pipes
const CAP_H: i32 = 6;
const CAP_EXTRA: i32 = 2;

// ── Palette ─────────────────────────────────────────────────────────────────

const HILL: Rgb565 = Rgb565::new(15, 48, 9);
const CLOUD: Rgb565 = Rgb565::new(30, 62, 31);
const GRASS: Rgb565 = Rgb565::new(10, 42, 6);
const GRASS_LIGHT: Rgb565 = Rgb565::new(13, 50, 8);
const DIRT: Rgb565 = Rgb565::new(26, 46, 13);
const DIRT_DARK: Rgb565 = Rgb565::new(23, 40, 11);
const PIPE_DARK: Rgb565 = Rgb565::new(9, 30, 3);
const PIPE_MID: Rgb565 = Rgb565::new(12, 42, 5);
const PIPE_LIGHT: Rgb565 = Rgb565::new(14, 47, 5);
const PIPE_EDGE: Rgb565 = Rgb565::new(7, 25, 2);
const MONA_BODY: Rgb565 = Rgb565::new(18, 32, 20);
const MONA_DARK: Rgb565 = Rgb565::new(13, 24, 15);
const MONA_BELLY: Rgb565 = Rgb565::new(24, 46, 24);
const MONA_EYE: Rgb565 = Rgb565::new(31, 63, 31);
const MONA_PUPIL: Rgb565 = Rgb565::new(2, 4, 2);
const GHOST: Rgb565 = Rgb565::new(28, 58, 30);
const TEXT_SHADOW: Rgb565 = Rgb565::new(3, 8, 9);

// ── Background ──────────────────────────────────────────────────────────────

fn draw_background(frame: &mut Frame, offset: u32) {
    // Sky gradient, bright cyan up top paling toward the horizon.
    for y in 0..GROUND {
        let t = y * 256 / GROUND;
        let r = 9 + 14 * t / 256;
        let g = 54 + 4 * t / 256;
        let b = 31 - t / 200;
        frame.hline(0, W, y, Rgb565::new(r as u8, g as u8, b as u8));
    }

    // Rolling hills, slowest parallax layer.
    let hill_shift = offset / 8;
    for x in 0..W {
        let phase = ((x as u32 + hill_shift) % 128) as i32;
        let h = if phase < 64 { phase } else { 128 - phase } / 3;
        for y in (GROUND - 4 - h)..GROUND {
            frame.put(x, y, HILL);
        }
    }

    // Clouds drift at the same rate as the hills.
    let cloud_shift = ((offset / 8) % 120) as i32;
    for i in 0..4 {
        let cx = i * 120 - cloud_shift;
        let cy = 24 + (i % 2) * 16;
        frame.fill_rect(cx, cy + 4, 36, 8, CLOUD);
        frame.fill_rect(cx + 7, cy, 22, 6, CLOUD);
    }

    // Grass strip and striped dirt, the fastest layer.
    let ground_shift = offset / 4;
    for x in 0..W {
        let alt = ((x as u32 + ground_shift) / 8) % 2 == 0;
        frame.put(x, GROUND, if alt { GRASS_LIGHT } else { GRASS });
        frame.put(x, GROUND + 1, if alt { GRASS_LIGHT } else { GRASS });
        frame.put(x, GROUND + 2, GRASS);
        frame.put(x, GROUND + 3, GRASS);
    }
    for y in (GROUND + 4)..H {
        for x in 0..W {
            let stripe = ((x as u32 + ground_shift) + (y - GROUND) as u32 * 2) % 12 < 6;
            frame.put(x, y, if stripe { DIRT } else { DIRT_DARK });
        }
    }
}

// ── Obstacles ───────────────────────────────────────────────────────────────

fn pipe_body(frame: &mut Frame, px: i32, y0: i32, y1: i32) {
    if y1 <= y0 {
        return;
    }
    let h = y1 - y0;
    let pw = OBSTACLE_W as i32;
    frame.fill_rect(px, y0, 4, h, PIPE_DARK);
    frame.fill_rect(px + 4, y0, 10, h, PIPE_MID);
    frame.fill_rect(px + 14, y0, 6, h, PIPE_LIGHT);
    frame.fill_rect(px + 20, y0, pw - 20, h, PIPE_DARK);
}

fn pipe_cap(frame: &mut Frame, px: i32, y: i32) {
    let cw = OBSTACLE_W as i32 + 2 * CAP_EXTRA;
    frame.fill_rect(px - CAP_EXTRA, y, cw, CAP_H, PIPE_MID);
    frame.fill_rect(px - CAP_EXTRA + 4, y + 1, 8, CAP_H - 2, PIPE_LIGHT);
    frame.hline(px - CAP_EXTRA, px - CAP_EXTRA + cw, y, PIPE_EDGE);
    frame.hline(px - CAP_EXTRA, px - CAP_EXTRA + cw, y + CAP_H - 1, PIPE_EDGE);
}

fn draw_obstacles(frame: &mut Frame, obstacles: &[Obstacle]) {
    for ob in obstacles {
        let px = ob.x as i32;
        let gap_top = ob.gap_y as i32;
        let gap_bot = (ob.gap_y + GAP_HEIGHT) as i32;
        pipe_body(frame, px, 0, gap_top - CAP_H);
        pipe_cap(frame, px, gap_top - CAP_H);
        pipe_cap(frame, px, gap_bot);
        pipe_body(frame, px, gap_bot + CAP_H, GROUND);
    }
}

// ── Mona ────────────────────────────────────────────────────────────────────

fn draw_mona(frame: &mut Frame, mona: &Mona, now_ms: u64) {
    let x = MONA_X as i32;
    let y = mona.y() as i32;

    if mona.is_dead() {
        draw_ghost(frame, x, y, mona.dying_frame());
        return;
    }

    let tilt = (mona.velocity() as i32 / 2).clamp(-2, 2);

    // Body, slightly rounded by the overlap of two rects.
    frame.fill_rect(x - 8, y - 4, 16, 8, MONA_BODY);
    frame.fill_rect(x - 6, y - 6, 12, 12, MONA_BODY);

    // Ears
    frame.fill_rect(x - 6, y - 9, 3, 4, MONA_BODY);
    frame.fill_rect(x + 3, y - 9, 3, 4, MONA_BODY);

    // Belly patch
    frame.fill_rect(x - 2, y - 1, 8, 6, MONA_BELLY);

    // Flapping arm
    let wing_off = if (now_ms / 120) % 2 == 0 { -1 } else { 1 };
    frame.fill_rect(x - 7, y + wing_off, 5, 4, MONA_DARK);

    // Eye
    frame.fill_rect(x + 1, y - 4, 3, 3, MONA_EYE);
    frame.put(x + 3, y - 3, MONA_PUPIL);

    // Tail trails behind, tipping with the dive.
    frame.fill_rect(x - 11, y - 1 + tilt, 3, 2, MONA_DARK);
}

fn draw_ghost(frame: &mut Frame, x: i32, y: i32, dying_frame: u32) {
    // The ghost floats up as the animation advances.
    let gy = y - dying_frame as i32 * 2;
    frame.fill_rect(x - 7, gy - 6, 14, 11, GHOST);
    // Wavy hem
    frame.fill_rect(x - 7, gy + 5, 3, 2, GHOST);
    frame.fill_rect(x - 2, gy + 5, 3, 2, GHOST);
    frame.fill_rect(x + 4, gy + 5, 3, 2, GHOST);
    // Hollow eyes
    frame.fill_rect(x - 4, gy - 3, 2, 3, TEXT_SHADOW);
    frame.fill_rect(x + 2, gy - 3, 2, 3, TEXT_SHADOW);
}

// ── Text helpers ────────────────────────────────────────────────────────────

/// Format a u32 into a string buffer, returns the slice.
fn format_u32(mut n: u32, buf: &mut [u8; 16]) -> &str {
    if n == 0 {
        buf[0] = b'0';
        return unsafe { core::str::from_utf8_unchecked(&buf[..1]) };
    }
    let mut i = 0;
    let mut tmp = [0u8; 10];
    while n > 0 {
        tmp[i] = b'0' + (n % 10) as u8;
        n /= 10;
        i += 1;
    }
    for j in 0..i {
        buf[j] = tmp[i - 1 - j];
    }
    unsafe { core::str::from_utf8_unchecked(&buf[..i]) }
}

/// Concatenate string parts into a stack buffer, truncating past the end.
fn compose<'a>(buf: &'a mut [u8; 48], parts: &[&str]) -> &'a str {
    let mut len = 0;
    for part in parts {
        let bytes = part.as_bytes();
        let end = (len + bytes.len()).min(buf.len());
        buf[len..end].copy_from_slice(&bytes[..end - len]);
        len = end;
    }
    unsafe { core::str::from_utf8_unchecked(&buf[..len]) }
}

fn shadow_text(
    frame: &mut Frame,
    text: &str,
    x: i32,
    y: i32,
    font: &'static MonoFont<'static>,
    color: Rgb565,
) {
    Text::new(text, Point::new(x + 1, y + 1), MonoTextStyle::new(font, TEXT_SHADOW))
        .draw(frame)
        .unwrap();
    Text::new(text, Point::new(x, y), MonoTextStyle::new(font, color))
        .draw(frame)
        .unwrap();
}

fn center_text(
    frame: &mut Frame,
    text: &str,
    y: i32,
    font: &'static MonoFont<'static>,
    color: Rgb565,
) {
    let w = text.len() as i32 * font.character_size.width as i32;
    shadow_text(frame, text, (W - w) / 2, y, font, color);
}

// ── Screens ─────────────────────────────────────────────────────────────────

fn draw_intro(frame: &mut Frame, session: &GameSession, now_ms: u64) {
    center_text(frame, "FLAPPY MONA", 64, &FONT_10X20, Rgb565::CSS_YELLOW);
    if session.demo_mode() {
        center_text(frame, "DEMO MODE", 88, &FONT_6X10, Rgb565::WHITE);
    } else if (now_ms / 500) % 2 == 1 {
        center_text(frame, "Press A to start", 98, &FONT_6X10, Rgb565::WHITE);
    }
}

fn draw_hud(frame: &mut Frame, session: &GameSession) {
    let mut num = [0u8; 16];
    let mut buf = [0u8; 48];
    let text = compose(&mut buf, &["Score: ", format_u32(session.score(), &mut num)]);
    shadow_text(frame, text, 3, 10, &FONT_6X10, Rgb565::WHITE);
    if session.demo_mode() {
        shadow_text(frame, "DEMO", 3, 22, &FONT_6X10, Rgb565::WHITE);
    }
}

fn draw_game_over(frame: &mut Frame, session: &GameSession, now_ms: u64) {
    center_text(frame, "GAME OVER!", 52, &FONT_10X20, Rgb565::WHITE);

    let mut num = [0u8; 16];
    let mut buf = [0u8; 48];
    let text = compose(&mut buf, &["Final score: ", format_u32(session.score(), &mut num)]);
    center_text(frame, text, 80, &FONT_6X10, Rgb565::WHITE);

    if session.high_score() > 0 {
        let mut num = [0u8; 16];
        let mut buf = [0u8; 48];
        let text = compose(
            &mut buf,
            &["High score: ", format_u32(session.high_score(), &mut num)],
        );
        center_text(frame, text, 94, &FONT_6X10, Rgb565::WHITE);
    }

    if session.demo_mode() {
        if let Some(ms_left) = session.restart_countdown_ms(now_ms) {
            if ms_left > 0 {
                let mut num = [0u8; 16];
                let mut buf = [0u8; 48];
                let secs = (ms_left / 1000 + 1) as u32;
                let text = compose(
                    &mut buf,
                    &["Restarting in ", format_u32(secs, &mut num), "..."],
                );
                center_text(frame, text, 120, &FONT_6X10, Rgb565::WHITE);
            }
        }
    } else if (now_ms / 500) % 2 == 1 {
        center_text(frame, "Press A to restart", 120, &FONT_6X10, Rgb565::WHITE);
    }
}

fn render(frame: &mut Frame, session: &GameSession, now_ms: u64) {
    draw_background(frame, session.background_offset());
    match session.phase() {
        Phase::Intro => draw_intro(frame, session, now_ms),
        Phase::Playing => {
            draw_obstacles(frame, session.obstacles());
            if let Some(mona) = session.mona() {
                draw_mona(frame, mona, now_ms);
            }
            draw_hud(frame, session);
        }
        Phase::GameOver => draw_game_over(frame, session, now_ms),
    }
}

// ── Tasks ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum LedEvent {
    Score(u32),
    Crash,
}

static LED_CHANNEL: Channel<CriticalSectionRawMutex, LedEvent, 4> = Channel::new();

#[embassy_executor::task]
async fn led_task(leds: &'static mut Leds<'static>) {
    info!("LED task started");
    loop {
        match LED_CHANNEL.receive().await {
            LedEvent::Score(score) => {
                let lit = (score as usize).min(BAR_COUNT);
                let mut bar = [Srgb::new(0u8, 0, 0); BAR_COUNT];
                for slot in bar.iter_mut().take(lit) {
                    *slot = Srgb::new(0, 6, 2);
                }
                leds.set_bars(&bar);
                leds.update().await;
            }
            LedEvent::Crash => {
                for _ in 0..3 {
                    leds.fill(Srgb::new(20, 0, 0));
                    leds.update().await;
                    Timer::after(Duration::from_millis(300)).await;
                    leds.clear();
                    leds.update().await;
                    Timer::after(Duration::from_millis(300)).await;
                }
            }
        }
    }
}

#[embassy_executor::task]
async fn game_task(
    display: &'static mut Display<'static>,
    backlight: &'static mut Backlight,
    buttons: &'static mut Buttons,
) {
    info!("Flappy Mona started");
    backlight.on();

    let mut frame = Frame::claim().unwrap();

    let seed = Instant::now().as_micros() as u32 | 1;
    let mut session = Session::new(FlashScoreStore::new(), seed);
    info!("High score from flash: {}", session.high_score());

    let tick = Duration::from_millis(TICK_MS);
    let mut next_frame = Instant::now() + tick;
    let mut prev_phase = session.phase();
    let mut prev_score = 0u32;

    loop {
        let now_ms = Instant::now().as_millis();
        let controls = buttons.poll();
        session.update(now_ms, controls);

        let phase = session.phase();
        if phase != prev_phase {
            match phase {
                Phase::Playing => {
                    info!("Round started (demo: {})", session.demo_mode());
                    prev_score = 0;
                    LED_CHANNEL.try_send(LedEvent::Score(0)).ok();
                }
                Phase::GameOver => {
                    info!(
                        "Game over! Score: {} (high: {})",
                        session.score(),
                        session.high_score()
                    );
                    LED_CHANNEL.try_send(LedEvent::Crash).ok();
                }
                Phase::Intro => {}
            }
            prev_phase = phase;
        }
        if session.score() != prev_score {
            prev_score = session.score();
            LED_CHANNEL.try_send(LedEvent::Score(prev_score)).ok();
        }

        render(&mut frame, &session, now_ms);
        frame.flush(display);

        Timer::at(next_frame).await;
        next_frame += tick;
    }
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = flappy_badge::init();
    let resources = split_resources!(peripherals);

    esp_alloc::heap_allocator!(size: 64 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let display = mk_static!(Display<'static>, resources.display.into());
    let backlight = mk_static!(Backlight, resources.backlight.into());
    let leds = mk_static!(Leds<'static>, resources.leds.into());
    let buttons = mk_static!(Buttons, resources.buttons.into());

    spawner.must_spawn(led_task(leds));
    spawner.must_spawn(game_task(display, backlight, buttons));

    loop {
        Timer::after(Duration::from_secs(600)).await;
    }
}
