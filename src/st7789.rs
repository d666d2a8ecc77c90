// ST7789V panel driver (4-wire SPI, D/C pin, RGB565).
// Works with any embedded-hal 1.0 SpiDevice and embedded-graphics.
//
// Wiring on the T5 IPEX board (240 x 320):
//   CS  -> SpiDevice (ExclusiveDevice owns it)
//   D/C -> SpiInterface
//   RST, BL -> plain OutputPins owned here
//
// Protocol:
//   command byte with D/C low, then its parameter bytes with D/C high.
//   Example: [0x3A] [0x55]       -> Pixel Format = 16bpp (RGB565)
//            [0x2A] [x0, x1 BE]  -> column window
//            [0x2C] [pixels...]  -> memory write, runs until the next command
// Geometry: panel is 240 x 320, portrait, row-major from the top-left.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{ContainsPoint, PointsIter, Rectangle},
};
use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin},
    spi::{self, SpiDevice},
};
use log::{debug, trace, warn};

use crate::error::{Error, InvalidArgument};
use crate::interface::SpiInterface;

pub const ST7789_WIDTH: u16 = 240;
pub const ST7789_HEIGHT: u16 = 320;

/// Command opcodes used by this driver.
pub mod command {
    pub const SWRESET: u8 = 0x01;
    pub const SLPIN: u8 = 0x10;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const PORCTRL: u8 = 0xB2;
    pub const GCTRL: u8 = 0xB7;
    pub const VCOMS: u8 = 0xBB;
    pub const LCMCTRL: u8 = 0xC0;
    pub const VDVVRHEN: u8 = 0xC2;
    pub const VRHS: u8 = 0xC3;
    pub const VDVS: u8 = 0xC4;
    pub const FRCTRL2: u8 = 0xC6;
    pub const PWCTRL1: u8 = 0xD0;
    pub const PVGAMCTRL: u8 = 0xE0;
    pub const NVGAMCTRL: u8 = 0xE1;
}

// Datasheet minimums. Shortening any of these breaks init on some boards.
pub const RESET_PULSE_MS: u32 = 10;
pub const RESET_SETTLE_MS: u32 = 120;
pub const SWRESET_SETTLE_MS: u32 = 150;
pub const SLPOUT_SETTLE_MS: u32 = 10;
pub const NORON_SETTLE_MS: u32 = 10;
pub const DISPON_SETTLE_MS: u32 = 100;
pub const SLEEP_SETTLE_MS: u32 = 120;

/// Bytes streamed per data burst by the solid-fill and iterator paths.
pub const FILL_CHUNK: usize = 512;

/// One register write: command byte plus its fixed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register {
    pub cmd: u8,
    pub params: &'static [u8],
}

const fn reg(cmd: u8, params: &'static [u8]) -> Register {
    Register { cmd, params }
}

/// Register configuration issued between SLPOUT and NORON.
///
/// Order is part of the protocol: VRHS/VDVS only take effect after
/// VDVVRHEN, and the gamma tables assume the power settings above them.
pub const REGISTER_TABLE: [Register; 15] = {
    use command::*;
    [
        reg(COLMOD, &[0x55]),                         // 16-bit RGB565
        reg(MADCTL, &[0x00]),                         // normal orientation
        reg(CASET, &[0x00, 0x00, 0x00, 0xEF]),        // columns 0..=239
        reg(RASET, &[0x00, 0x00, 0x01, 0x3F]),        // rows 0..=319
        reg(PORCTRL, &[0x0C, 0x0C, 0x00, 0x33, 0x33]),
        reg(GCTRL, &[0x35]),
        reg(VCOMS, &[0x19]),
        reg(LCMCTRL, &[0x2C]),
        reg(VDVVRHEN, &[0x01]),
        reg(VRHS, &[0x12]),
        reg(VDVS, &[0x20]),
        reg(FRCTRL2, &[0x0F]),
        reg(PWCTRL1, &[0xA4, 0xA1]),
        reg(
            PVGAMCTRL,
            &[
                0xD0, 0x04, 0x0D, 0x11, 0x13, 0x2B, 0x3F, 0x54, 0x4C, 0x18, 0x0D, 0x0B, 0x1F,
                0x23,
            ],
        ),
        reg(
            NVGAMCTRL,
            &[
                0xD0, 0x04, 0x0C, 0x11, 0x13, 0x2C, 0x3F, 0x44, 0x51, 0x2F, 0x1F, 0x1F, 0x20,
                0x23,
            ],
        ),
    ]
};

/// Inclusive rectangle in panel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Window {
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Whole panel of the given size. `width` and `height` must be non-zero.
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width - 1, height - 1)
    }

    // Widened so a full-range window (0..=u16::MAX) cannot overflow.
    #[inline]
    pub fn width(&self) -> u32 {
        u32::from(self.x1.wrapping_sub(self.x0)) + 1
    }

    #[inline]
    pub fn height(&self) -> u32 {
        u32::from(self.y1.wrapping_sub(self.y0)) + 1
    }

    pub fn pixel_count(&self) -> usize {
        (self.width() as usize).saturating_mul(self.height() as usize)
    }

    /// RGB565 payload size for this window.
    pub fn byte_len(&self) -> usize {
        self.pixel_count().saturating_mul(2)
    }

    /// Check ordering first, then the panel edge.
    pub fn validate(&self, width: u16, height: u16) -> Result<(), InvalidArgument> {
        if self.x0 > self.x1 || self.y0 > self.y1 {
            return Err(InvalidArgument::InvertedWindow);
        }
        if self.x1 >= width || self.y1 >= height {
            return Err(InvalidArgument::OutOfBounds {
                x1: self.x1,
                y1: self.y1,
                width,
                height,
            });
        }
        Ok(())
    }

    /// CASET/RASET parameter bytes: start and end, big-endian.
    pub fn column_bytes(&self) -> [u8; 4] {
        be_pair(self.x0, self.x1)
    }

    pub fn row_bytes(&self) -> [u8; 4] {
        be_pair(self.y0, self.y1)
    }

    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x0 as i32, self.y0 as i32),
            Size::new(self.width(), self.height()),
        )
    }
}

impl TryFrom<Rectangle> for Window {
    type Error = InvalidArgument;

    fn try_from(area: Rectangle) -> Result<Self, Self::Error> {
        let br = area.bottom_right().ok_or(InvalidArgument::Unrepresentable)?;
        let tl = area.top_left;
        let coord = |v: i32| u16::try_from(v).map_err(|_| InvalidArgument::Unrepresentable);
        Ok(Self::new(coord(tl.x)?, coord(tl.y)?, coord(br.x)?, coord(br.y)?))
    }
}

#[inline]
fn be_pair(a: u16, b: u16) -> [u8; 4] {
    let [a_hi, a_lo] = a.to_be_bytes();
    let [b_hi, b_lo] = b.to_be_bytes();
    [a_hi, a_lo, b_hi, b_lo]
}

/// Error type produced by a driver built on `SPI` and `DC`.
pub type DriverError<SPI, DC> =
    Error<<SPI as spi::ErrorType>::Error, <DC as digital::ErrorType>::Error>;

/// ST7789V controller driver.
///
/// Constructing it runs the whole power-up sequence, so a value of this
/// type always refers to a configured, displaying panel.
pub struct St7789<SPI, DC, RST, BL> {
    iface: SpiInterface<SPI, DC>,
    rst: RST,
    bl: BL,
}

impl<SPI, DC, RST, BL> St7789<SPI, DC, RST, BL>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin<Error = DC::Error>,
    BL: OutputPin<Error = DC::Error>,
{
    /// Create + init the panel. Call once at startup.
    ///
    /// * `iface` - bus framer owning the SPI device and D/C line
    /// * `rst` - reset line, active low
    /// * `bl` - backlight enable, active high
    /// * `delay` - platform blocking sleep; timing below is load-bearing
    pub fn new(
        iface: SpiInterface<SPI, DC>,
        rst: RST,
        bl: BL,
        delay: &mut impl DelayNs,
    ) -> Result<Self, DriverError<SPI, DC>> {
        let mut this = Self { iface, rst, bl };
        this.run_init(delay)?;
        Ok(this)
    }

    /// Full recovery path after a transport failure: hardware reset and the
    /// complete init sequence. There is no partial re-init.
    pub fn reinit(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<SPI, DC>> {
        self.run_init(delay)
    }

    fn run_init(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<SPI, DC>> {
        self.hardware_reset(delay)?;

        debug!("st7789: backlight on");
        self.bl.set_high().map_err(Error::Pin)?;

        debug!("st7789: software reset");
        self.iface.send_command(command::SWRESET)?;
        delay.delay_ms(SWRESET_SETTLE_MS);

        debug!("st7789: sleep out");
        self.iface.send_command(command::SLPOUT)?;
        delay.delay_ms(SLPOUT_SETTLE_MS);

        debug!("st7789: programming {} registers", REGISTER_TABLE.len());
        for r in REGISTER_TABLE.iter() {
            self.iface.send_command_with_args(r.cmd, r.params)?;
        }

        debug!("st7789: normal display mode");
        self.iface.send_command(command::NORON)?;
        delay.delay_ms(NORON_SETTLE_MS);

        debug!("st7789: display on");
        self.iface.send_command(command::DISPON)?;
        delay.delay_ms(DISPON_SETTLE_MS);

        Ok(())
    }

    /// RST low for the minimum pulse, then high and wait out the settle time.
    pub fn hardware_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<SPI, DC>> {
        debug!("st7789: hardware reset");
        self.rst.set_low().map_err(Error::Pin)?;
        delay.delay_ms(RESET_PULSE_MS);
        self.rst.set_high().map_err(Error::Pin)?;
        delay.delay_ms(RESET_SETTLE_MS);
        Ok(())
    }

    // Panel width in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        ST7789_WIDTH
    }

    // Panel height in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        ST7789_HEIGHT
    }

    /// Program CASET/RASET and arm RAMWR. Every data byte until the next
    /// command lands in `window`, row-major.
    pub fn set_window(&mut self, window: &Window) -> Result<(), DriverError<SPI, DC>> {
        window.validate(ST7789_WIDTH, ST7789_HEIGHT)?;
        self.set_window_raw(window)
    }

    fn set_window_raw(&mut self, window: &Window) -> Result<(), DriverError<SPI, DC>> {
        trace!(
            "st7789: window ({}, {})..=({}, {})",
            window.x0,
            window.y0,
            window.x1,
            window.y1
        );
        self.iface
            .send_command_with_args(command::CASET, &window.column_bytes())?;
        self.iface
            .send_command_with_args(command::RASET, &window.row_bytes())?;
        self.iface.send_command(command::RAMWR)
    }

    /// Write `pixels` (big-endian RGB565, row-major) into `window`.
    ///
    /// The window and buffer length are checked before any bus activity; the
    /// pixels go out as a single data burst.
    pub fn blit(&mut self, window: &Window, pixels: &[u8]) -> Result<(), DriverError<SPI, DC>> {
        if let Err(e) = check_blit(window, pixels) {
            warn!("st7789: blit rejected: {}", e);
            return Err(e.into());
        }
        self.set_window_raw(window)?;
        trace!("st7789: blit {} bytes", pixels.len());
        self.iface.send_data_block(pixels)
    }

    /// Fill `window` with one color, streamed in `FILL_CHUNK` bursts.
    pub fn fill_window(&mut self, window: &Window, color: Rgb565) -> Result<(), DriverError<SPI, DC>> {
        window.validate(ST7789_WIDTH, ST7789_HEIGHT)?;
        self.set_window_raw(window)?;

        let [hi, lo] = color.into_storage().to_be_bytes();
        let mut chunk = [0u8; FILL_CHUNK];
        for px in chunk.chunks_exact_mut(2) {
            px[0] = hi;
            px[1] = lo;
        }

        let mut remaining = window.byte_len();
        while remaining > 0 {
            let take = remaining.min(FILL_CHUNK);
            self.iface.send_data_block(&chunk[..take])?;
            remaining -= take;
        }
        Ok(())
    }

    // ---- Power control ----

    pub fn sleep_in(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<SPI, DC>> {
        debug!("st7789: sleep in");
        self.iface.send_command(command::SLPIN)?;
        delay.delay_ms(SLEEP_SETTLE_MS);
        Ok(())
    }

    pub fn sleep_out(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<SPI, DC>> {
        debug!("st7789: sleep out");
        self.iface.send_command(command::SLPOUT)?;
        delay.delay_ms(SLEEP_SETTLE_MS);
        Ok(())
    }

    // Quick blank/unblank without sleep; panel RAM is kept.
    pub fn display_off(&mut self) -> Result<(), DriverError<SPI, DC>> {
        debug!("st7789: display off");
        self.iface.send_command(command::DISPOFF)
    }

    pub fn display_on(&mut self, delay: &mut impl DelayNs) -> Result<(), DriverError<SPI, DC>> {
        debug!("st7789: display on");
        self.iface.send_command(command::DISPON)?;
        delay.delay_ms(DISPON_SETTLE_MS);
        Ok(())
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), DriverError<SPI, DC>> {
        debug!("st7789: backlight {}", if on { "on" } else { "off" });
        if on {
            self.bl.set_high().map_err(Error::Pin)
        } else {
            self.bl.set_low().map_err(Error::Pin)
        }
    }

    /// Give back the bus framer, reset and backlight pins.
    pub fn release(self) -> (SpiInterface<SPI, DC>, RST, BL) {
        (self.iface, self.rst, self.bl)
    }
}

/// Blit preconditions: window inside the panel, buffer exactly w*h*2 bytes.
pub fn check_blit(window: &Window, pixels: &[u8]) -> Result<(), InvalidArgument> {
    window.validate(ST7789_WIDTH, ST7789_HEIGHT)?;
    let expected = window.byte_len();
    if pixels.len() != expected {
        return Err(InvalidArgument::BufferLength {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

// Convenience builder that wraps the SPI device and D/C pin and runs init.
pub fn new_with_defaults<SPI, DC, RST, BL>(
    spi: SPI,
    dc: DC,
    rst: RST,
    bl: BL,
    delay: &mut impl DelayNs,
) -> Result<St7789<SPI, DC, RST, BL>, DriverError<SPI, DC>>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin<Error = DC::Error>,
    BL: OutputPin<Error = DC::Error>,
{
    St7789::new(SpiInterface::new(spi, dc), rst, bl, delay)
}

// -------------------- embedded-graphics integration --------------------
impl<SPI, DC, RST, BL> OriginDimensions for St7789<SPI, DC, RST, BL> {
    fn size(&self) -> Size {
        Size::new(ST7789_WIDTH as u32, ST7789_HEIGHT as u32)
    }
}

impl<SPI, DC, RST, BL> DrawTarget for St7789<SPI, DC, RST, BL>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin<Error = DC::Error>,
    BL: OutputPin<Error = DC::Error>,
{
    type Color = Rgb565;
    type Error = DriverError<SPI, DC>;

    // Slow path: one 1x1 window per pixel.
    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        let bounds = self.bounding_box();
        for Pixel(p, c) in pixels {
            if !bounds.contains(p) {
                continue;
            }
            let (x, y) = (p.x as u16, p.y as u16);
            self.set_window_raw(&Window::new(x, y, x, y))?;
            self.iface.send_data_block(&c.into_storage().to_be_bytes())?;
        }
        Ok(())
    }

    // Row streaming for images: clip once, then chunked bursts under one RAMWR.
    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Rgb565>,
    {
        let visible = area.intersection(&self.bounding_box());
        let Ok(window) = Window::try_from(visible) else {
            return Ok(());
        };
        self.set_window_raw(&window)?;

        let mut chunk: heapless::Vec<u8, FILL_CHUNK> = heapless::Vec::new();
        for (p, c) in area.points().zip(colors) {
            if !visible.contains(p) {
                continue;
            }
            if chunk.is_full() {
                self.iface.send_data_block(&chunk)?;
                chunk.clear();
            }
            // FILL_CHUNK is even, so a pixel never straddles a flush.
            let _ = chunk.extend_from_slice(&c.into_storage().to_be_bytes());
        }
        self.iface.send_data_block(&chunk)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        let visible = area.intersection(&self.bounding_box());
        match Window::try_from(visible) {
            Ok(window) => self.fill_window(&window, color),
            Err(_) => Ok(()),
        }
    }

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.fill_window(&Window::full(ST7789_WIDTH, ST7789_HEIGHT), color)
    }
}
