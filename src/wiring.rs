// This module handles board-specific pin mappings and initialization.
//! The following wiring is assumed (T5 IPEX dev board, ST7789V module):
//! - LCD CS   => GPIO9
//! - LCD DC   => GPIO8
//! - LCD RST  => GPIO14
//! - LCD BL   => GPIO2
//! - SPI SCK  => GPIO10
//! - SPI MOSI => GPIO11
//! - BOOT button => GPIO0 (pull-up, low when pressed)
//! - GND => GND
//! - 3.3V => 3.3V

use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{Peripherals, GPIO10, GPIO11, SPI2};

pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub sck: GPIO10<'a>,
    pub mosi: GPIO11<'a>,
    pub cs: Output<'a>,
    pub dc: Output<'a>,
    pub rst: Output<'a>,
    pub bl: Output<'a>,
}

pub struct BoardPins<'a> {
    pub display: DisplayPins<'a>,
    pub boot_btn: Input<'a>,
}

// Every control line starts as a push-pull output in its idle level:
// CS deasserted, DC on command, RST released, backlight off until init.
pub fn init_board_pins<'a>(p: Peripherals) -> BoardPins<'a> {
    let cs = Output::new(p.GPIO9, Level::High, OutputConfig::default());
    let dc = Output::new(p.GPIO8, Level::Low, OutputConfig::default());
    let rst = Output::new(p.GPIO14, Level::High, OutputConfig::default());
    let bl = Output::new(p.GPIO2, Level::Low, OutputConfig::default());

    let boot_btn = Input::new(p.GPIO0, InputConfig::default().with_pull(Pull::Up));

    BoardPins {
        display: DisplayPins {
            spi2: p.SPI2,
            sck: p.GPIO10,
            mosi: p.GPIO11,
            cs,
            dc,
            rst,
            bl,
        },
        boot_btn,
    }
}
