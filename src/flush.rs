//! Seam between a graphics toolkit and the panel.
//!
//! A toolkit that owns the draw buffer holds a `&mut impl Blit` and calls
//! [`Blit::blit`] once per dirty area. The buffer stays borrowed until the
//! data burst has finished on the bus; only then is the toolkit told, through
//! [`FlushRelease::release`], that it may reuse or overwrite the bytes.

use embedded_hal::{digital::OutputPin, spi::SpiDevice};

use crate::st7789::{DriverError, St7789, Window};

/// Buffer-release notification. Called at most once per successful blit,
/// synchronously, after the last pixel byte has been written.
pub trait FlushRelease {
    fn release(&mut self);
}

impl<F: FnMut()> FlushRelease for F {
    fn release(&mut self) {
        self()
    }
}

/// Rectangular pixel write. `pixels` is big-endian RGB565, row-major,
/// exactly `area.byte_len()` bytes.
pub trait Blit {
    type Error;

    /// Write `pixels` into `area` and notify `release` once the transfer is
    /// done. On error nothing is released; the caller still holds the buffer
    /// once this returns.
    fn blit<R: FlushRelease>(
        &mut self,
        area: &Window,
        pixels: &[u8],
        release: &mut R,
    ) -> Result<(), Self::Error>;
}

impl<SPI, DC, RST, BL> Blit for St7789<SPI, DC, RST, BL>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin<Error = DC::Error>,
    BL: OutputPin<Error = DC::Error>,
{
    type Error = DriverError<SPI, DC>;

    fn blit<R: FlushRelease>(
        &mut self,
        area: &Window,
        pixels: &[u8],
        release: &mut R,
    ) -> Result<(), Self::Error> {
        St7789::blit(self, area, pixels)?;
        release.release();
        Ok(())
    }
}

impl<T: Blit + ?Sized> Blit for &mut T {
    type Error = T::Error;

    fn blit<R: FlushRelease>(
        &mut self,
        area: &Window,
        pixels: &[u8],
        release: &mut R,
    ) -> Result<(), Self::Error> {
        T::blit(self, area, pixels, release)
    }
}
