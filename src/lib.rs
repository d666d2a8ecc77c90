#![cfg_attr(not(test), no_std)]

pub mod canvas;
pub mod error;
pub mod flush;
pub mod interface;
pub mod st7789;
pub mod ui;

#[cfg(feature = "esp32s3")]
pub mod display;
#[cfg(feature = "esp32s3")]
pub mod wiring;

pub use canvas::{render_bands, Canvas};
pub use error::{Error, InvalidArgument};
pub use flush::{Blit, FlushRelease};
pub use interface::SpiInterface;
pub use st7789::{St7789, Window, ST7789_HEIGHT, ST7789_WIDTH};
