//! Door Sign Demo
//! ========================================
//! Brings up the ST7789V panel, paints the "DO NOT DISTURB" page and
//! toggles to "PLEASE DISTURB" (and back) on every BOOT button press.
//!
//! Rendering goes through a 10-line band buffer, the same way a widget
//! toolkit with a partial draw buffer drives the panel.
//! ========================================

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Define the application description, which is placed in a special section of the binary.
// This is used by the bootloader to verify the application.
// The macro automatically fills in the fields.
esp_bootloader_esp_idf::esp_app_desc!();

use esp_backtrace as _;
use esp_hal::{delay::Delay, main, Config};
use log::{error, info};

use st7789v_lcd::{
    display::setup_display,
    render_bands,
    ui::{draw_page, Page},
    wiring::{init_board_pins, BoardPins},
    ST7789_WIDTH,
};

// Band height in lines; the band buffer is ST7789_WIDTH * BAND_LINES pixels.
const BAND_LINES: u16 = 10;
const BAND_BYTES: usize = ST7789_WIDTH as usize * BAND_LINES as usize * 2;

// Button polling
const POLL_MS: u32 = 10;
const DEBOUNCE_MS: u32 = 50;

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(Config::default());
    let BoardPins { display, boot_btn } = init_board_pins(peripherals);

    let mut delay = Delay::new();

    let mut lcd = match setup_display(display) {
        Ok(lcd) => lcd,
        Err(e) => {
            error!("display init failed: {:?}", e);
            loop {
                delay.delay_millis(1000);
            }
        }
    };
    info!("display ready");

    let mut band = [0u8; BAND_BYTES];
    let mut page = Page::DoNotDisturb;
    let mut needs_redraw = true;
    let mut was_pressed = false;

    loop {
        if needs_redraw {
            let result = render_bands(&mut lcd, &mut band, BAND_LINES, |canvas| {
                // Canvas drawing cannot fail.
                let _ = draw_page(canvas, page);
            });
            match result {
                Ok(()) => info!("drew {:?}", page),
                Err(e) => {
                    // Transport failure: only a full reset brings the panel back.
                    error!("flush failed: {}", e);
                    if let Err(e) = lcd.reinit(&mut delay) {
                        error!("re-init failed: {}", e);
                    }
                }
            }
            needs_redraw = false;
        }

        // BOOT is active low; act on the press edge only.
        let pressed = boot_btn.is_low();
        if pressed && !was_pressed {
            delay.delay_millis(DEBOUNCE_MS);
            if boot_btn.is_low() {
                page = page.toggle();
                needs_redraw = true;
            }
        }
        was_pressed = pressed;

        delay.delay_millis(POLL_MS);
    }
}
