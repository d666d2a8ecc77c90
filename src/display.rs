//! Display setup and initialization module.
//
// - `setup_display` brings up SPI2 and runs the ST7789V power-up sequence.
// - Timing goes through esp-hal's blocking `Delay`, not a spin loop, so the
//   reset and settle times hold at any CPU clock.

use esp_hal::{
    delay::Delay,
    gpio::Output,
    spi::master::{Config, ConfigError, Spi},
    spi::Mode,
    time::Rate,
    Blocking,
};

use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};

use crate::st7789::{self, DriverError, St7789};
use crate::wiring::DisplayPins;

/// SPI clock for the panel. 40 MHz is stable on the T5 board.
pub const SPI_FREQ_MHZ: u32 = 40;

// This matches wiring: Spi<'a, Blocking> + CS pin + NoDelay
pub type SpiDev<'a> = ExclusiveDevice<Spi<'a, Blocking>, Output<'a>, NoDelay>;

// Ready-to-use display type (shares lifetime with the peripherals)
pub type DisplayType<'a> = St7789<SpiDev<'a>, Output<'a>, Output<'a>, Output<'a>>;

#[derive(Debug)]
pub enum SetupError<'a> {
    SpiConfig(ConfigError),
    Display(DriverError<SpiDev<'a>, Output<'a>>),
}

pub fn setup_display<'a>(display_pins: DisplayPins<'a>) -> Result<DisplayType<'a>, SetupError<'a>> {
    let DisplayPins {
        spi2,
        sck,
        mosi,
        cs,
        dc,
        rst,
        bl,
    } = display_pins;

    // SPI @ 40 MHz, Mode 0
    let spi = Spi::new(
        spi2,
        Config::default()
            .with_frequency(Rate::from_mhz(SPI_FREQ_MHZ))
            .with_mode(Mode::_0),
    )
    .map_err(SetupError::SpiConfig)?
    .with_sck(sck)
    .with_mosi(mosi);

    // CS is an esp-hal Output, setting it cannot fail.
    let Ok(spi_dev) = ExclusiveDevice::new(spi, cs, NoDelay);

    let mut delay = Delay::new();
    st7789::new_with_defaults(spi_dev, dc, rst, bl, &mut delay).map_err(SetupError::Display)
}
