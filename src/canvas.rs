// Partial draw buffer, the way a widget toolkit drives this panel:
// render a band of lines into a caller-owned buffer with embedded-graphics,
// then hand the band to `Blit` in one burst.
//
// Typical size is ST7789_WIDTH * 10 pixels (4800 bytes), i.e. 32 bands
// for a full 240 x 320 frame.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{ContainsPoint, Rectangle},
};

use crate::error::InvalidArgument;
use crate::flush::{Blit, FlushRelease};
use crate::st7789::{Window, ST7789_HEIGHT, ST7789_WIDTH};

/// Big-endian RGB565 pixels for one window, backed by borrowed bytes.
pub struct Canvas<'buf> {
    buf: &'buf mut [u8],
    area: Window,
}

impl<'buf> Canvas<'buf> {
    /// `buf` must hold at least `area.byte_len()` bytes.
    pub fn new(buf: &'buf mut [u8], area: Window) -> Result<Self, InvalidArgument> {
        check_capacity(buf.len(), &area)?;
        Ok(Self { buf, area })
    }

    /// Move or resize the canvas. Pixel contents are left as they are.
    pub fn set_area(&mut self, area: Window) -> Result<(), InvalidArgument> {
        check_capacity(self.buf.len(), &area)?;
        self.area = area;
        Ok(())
    }

    pub fn area(&self) -> Window {
        self.area
    }

    /// Bytes covering exactly the current area.
    pub fn pixels(&self) -> &[u8] {
        &self.buf[..self.area.byte_len()]
    }

    fn pixels_mut(&mut self) -> &mut [[u8; 2]] {
        let len = self.area.byte_len();
        bytemuck::cast_slice_mut(&mut self.buf[..len])
    }

    /// Send the current area through `target`.
    pub fn flush<B, R>(&self, target: &mut B, release: &mut R) -> Result<(), B::Error>
    where
        B: Blit + ?Sized,
        R: FlushRelease,
    {
        target.blit(&self.area, self.pixels(), release)
    }

    #[inline]
    fn index(&self, p: Point) -> usize {
        let dx = (p.x - self.area.x0 as i32) as usize;
        let dy = (p.y - self.area.y0 as i32) as usize;
        dy * self.area.width() as usize + dx
    }
}

// Areas live in panel coordinates, so anything off the panel is refused
// before its byte size is computed.
fn check_capacity(capacity: usize, area: &Window) -> Result<(), InvalidArgument> {
    area.validate(ST7789_WIDTH, ST7789_HEIGHT)?;
    let expected = area.byte_len();
    if capacity < expected {
        return Err(InvalidArgument::BufferLength {
            expected,
            actual: capacity,
        });
    }
    Ok(())
}

impl Dimensions for Canvas<'_> {
    fn bounding_box(&self) -> Rectangle {
        self.area.to_rectangle()
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        let bounds = self.bounding_box();
        for Pixel(p, c) in pixels {
            if bounds.contains(p) {
                let i = self.index(p);
                self.pixels_mut()[i] = c.into_storage().to_be_bytes();
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        let visible = area.intersection(&self.bounding_box());
        let Some(br) = visible.bottom_right() else {
            return Ok(());
        };
        let be = color.into_storage().to_be_bytes();
        let w = visible.size.width as usize;
        for y in visible.top_left.y..=br.y {
            let start = self.index(Point::new(visible.top_left.x, y));
            self.pixels_mut()[start..start + w].fill(be);
        }
        Ok(())
    }

    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.pixels_mut().fill(color.into_storage().to_be_bytes());
        Ok(())
    }
}

/// Render the whole panel top to bottom in bands of `lines` rows.
///
/// `draw` is called once per band with the canvas positioned over it, in
/// panel coordinates, so the same drawing code paints every band and
/// embedded-graphics clips to the band. Each band is flushed before the
/// next one reuses `buf`.
pub fn render_bands<B, F>(
    target: &mut B,
    buf: &mut [u8],
    lines: u16,
    mut draw: F,
) -> Result<(), B::Error>
where
    B: Blit + ?Sized,
    B::Error: From<InvalidArgument>,
    F: FnMut(&mut Canvas<'_>),
{
    if lines == 0 {
        return Err(InvalidArgument::Unrepresentable.into());
    }
    let lines = lines.min(ST7789_HEIGHT);
    let first = Window::new(0, 0, ST7789_WIDTH - 1, lines - 1);
    let mut canvas = Canvas::new(buf, first)?;

    let mut y0 = 0u16;
    while y0 < ST7789_HEIGHT {
        let y1 = (y0 + lines - 1).min(ST7789_HEIGHT - 1);
        canvas.set_area(Window::new(0, y0, ST7789_WIDTH - 1, y1))?;
        draw(&mut canvas);
        canvas.flush(target, &mut || {})?;
        y0 = y1 + 1;
    }
    Ok(())
}
