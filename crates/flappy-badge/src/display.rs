//! ST7789 display — 320×170 LCD over SPI with DMA — and the full-screen
//! frame the game renders into.
//!
//! The game redraws every pixel every tick (the background scrolls), so
//! instead of incremental erase/redraw it composes a [`Frame`] in RAM and
//! pushes the whole thing with one `fill_contiguous` per tick.

use core::cell::UnsafeCell;
use core::sync::atomic::{
    AtomicBool,
    Ordering,
};

use embedded_graphics::{
    Pixel,
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Async,
    dma::{
        DmaRxBuf,
        DmaTxBuf,
    },
    dma_buffers,
    gpio::{
        Level,
        Output,
        OutputConfig,
    },
    spi::master::Spi,
    time::Rate,
};

use crate::DisplayResources;

pub const SCREEN_W: i32 = 320;
pub const SCREEN_H: i32 = 170;
const PIXELS: usize = (SCREEN_W * SCREEN_H) as usize;

type SpiInterface<'a> = mipidsi::interface::SpiInterface<
    'a,
    ExclusiveDevice<esp_hal::spi::master::SpiDmaBus<'a, Async>, Output<'a>, esp_hal::delay::Delay>,
    Output<'a>,
>;

/// The badge's ST7789 display, ready to draw on with `embedded-graphics`.
pub type Display<'a> = mipidsi::Display<SpiInterface<'a>, mipidsi::models::ST7789, Output<'a>>;

/// StaticCell helper (local to this module to avoid macro import issues).
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}

impl<'a> From<DisplayResources<'a>> for Display<'a> {
    fn from(res: DisplayResources<'a>) -> Self {
        let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(32000);
        let dma_rx_buf = DmaRxBuf::new(rx_descriptors, rx_buffer).unwrap();
        let dma_tx_buf = DmaTxBuf::new(tx_descriptors, tx_buffer).unwrap();

        let mut delay = esp_hal::delay::Delay::new();

        let dc = Output::new(res.dc, Level::Low, OutputConfig::default());
        let mut rst = Output::new(res.rst, Level::Low, OutputConfig::default());
        rst.set_high();

        let spi = Spi::new(
            res.spi,
            esp_hal::spi::master::Config::default().with_frequency(Rate::from_mhz(80)),
        )
        .unwrap()
        .with_sck(res.sck)
        .with_mosi(res.mosi)
        .with_miso(res.miso)
        .with_dma(res.dma)
        .with_buffers(dma_rx_buf, dma_tx_buf)
        .into_async();

        let cs = Output::new(res.cs, Level::High, OutputConfig::default());
        let spi_device = ExclusiveDevice::new(spi, cs, delay).unwrap();

        let buffer = mk_static!([u8; 32000], [0_u8; 32000]);
        let di = mipidsi::interface::SpiInterface::new(spi_device, dc, buffer);

        mipidsi::Builder::new(mipidsi::models::ST7789, di)
            .reset_pin(rst)
            .display_size(170, 320)
            .invert_colors(mipidsi::options::ColorInversion::Inverted)
            .orientation(
                mipidsi::options::Orientation::new().rotate(mipidsi::options::Rotation::Deg90),
            )
            .display_offset(35, 0)
            .init(&mut delay)
            .unwrap()
    }
}

// ── Frame ───────────────────────────────────────────────────────────────────

struct FrameCell(UnsafeCell<[Rgb565; PIXELS]>);
// Handed out at most once, through `Frame::claim`.
unsafe impl Sync for FrameCell {}

static FRAME: FrameCell = FrameCell(UnsafeCell::new([Rgb565::BLACK; PIXELS]));
static FRAME_CLAIMED: AtomicBool = AtomicBool::new(false);

/// The single full-screen framebuffer.
pub struct Frame {
    buf: &'static mut [Rgb565; PIXELS],
}

impl Frame {
    /// Claim the framebuffer. Returns `None` after the first claim.
    pub fn claim() -> Option<Self> {
        if FRAME_CLAIMED.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(Self {
            buf: unsafe { &mut *FRAME.0.get() },
        })
    }

    pub fn put(&mut self, x: i32, y: i32, color: Rgb565) {
        if x >= 0 && x < SCREEN_W && y >= 0 && y < SCREEN_H {
            self.buf[(y * SCREEN_W + x) as usize] = color;
        }
    }

    /// Filled rectangle, clipped to the screen.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, w: i32, h: i32, color: Rgb565) {
        let x1 = x0.max(0);
        let y1 = y0.max(0);
        let x2 = (x0 + w).min(SCREEN_W);
        let y2 = (y0 + h).min(SCREEN_H);
        for y in y1..y2 {
            let off = (y * SCREEN_W) as usize;
            for x in x1..x2 {
                self.buf[off + x as usize] = color;
            }
        }
    }

    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, color: Rgb565) {
        if y < 0 || y >= SCREEN_H {
            return;
        }
        let xa = x0.max(0);
        let xb = x1.min(SCREEN_W);
        let off = (y * SCREEN_W) as usize;
        for x in xa..xb {
            self.buf[off + x as usize] = color;
        }
    }

    /// Push the whole frame to the panel.
    pub fn flush(&mut self, display: &mut Display<'_>) {
        let area = Rectangle::new(
            Point::zero(),
            Size::new(SCREEN_W as u32, SCREEN_H as u32),
        );
        display
            .fill_contiguous(&area, self.buf.iter().copied())
            .unwrap();
    }
}

// Text and primitives from `embedded-graphics` draw straight into the frame.
impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(SCREEN_W as u32, SCREEN_H as u32)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.put(point.x, point.y, color);
        }
        Ok(())
    }
}
