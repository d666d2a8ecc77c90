//! Door-sign pages for the demo application.
//!
//! Two full-screen pages, each a colored background, a centered caption and
//! a button outline near the bottom edge. Drawing is plain embedded-graphics,
//! so a page can be rendered straight to the panel or band by band through
//! a [`Canvas`](crate::canvas::Canvas).

use embedded_graphics::{
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use crate::st7789::{ST7789_HEIGHT, ST7789_WIDTH};

// Display configuration, (0,0) is top-left corner
pub const CENTER_X: i32 = ST7789_WIDTH as i32 / 2;
pub const CENTER_Y: i32 = ST7789_HEIGHT as i32 / 2;

const BUTTON_SIZE: Size = Size::new(120, 50);
const BUTTON_BOTTOM_MARGIN: i32 = 20;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Page {
    DoNotDisturb,
    PleaseDisturb,
}

impl Page {
    pub fn toggle(self) -> Self {
        match self {
            Page::DoNotDisturb => Page::PleaseDisturb,
            Page::PleaseDisturb => Page::DoNotDisturb,
        }
    }

    pub fn background(self) -> Rgb565 {
        match self {
            Page::DoNotDisturb => Rgb565::new(4, 37, 29),  // material blue
            Page::PleaseDisturb => Rgb565::new(9, 44, 10), // material green
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            Page::DoNotDisturb => "DO NOT DISTURB",
            Page::PleaseDisturb => "PLEASE DISTURB",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Page::DoNotDisturb => "Next",
            Page::PleaseDisturb => "Back",
        }
    }
}

/// Button outline, bottom-center.
pub fn button_area() -> Rectangle {
    let top_left = Point::new(
        CENTER_X - BUTTON_SIZE.width as i32 / 2,
        ST7789_HEIGHT as i32 - BUTTON_BOTTOM_MARGIN - BUTTON_SIZE.height as i32,
    );
    Rectangle::new(top_left, BUTTON_SIZE)
}

pub fn draw_page<D>(target: &mut D, page: Page) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(page.background())?;

    let centered = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    let white = MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE);

    // Caption sits a bit above center.
    Text::with_text_style(page.caption(), Point::new(CENTER_X, CENTER_Y - 50), white, centered)
        .draw(target)?;

    let button = button_area();
    button
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(Rgb565::WHITE)
                .stroke_color(Rgb565::BLACK)
                .stroke_width(2)
                .build(),
        )
        .draw(target)?;
    Text::with_text_style(
        page.button_label(),
        button.center(),
        MonoTextStyle::new(&FONT_10X20, page.background()),
        centered,
    )
    .draw(target)?;

    // Thin divider under the caption.
    Rectangle::new(Point::new(CENTER_X - 70, CENTER_Y - 30), Size::new(140, 2))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
        .draw(target)?;

    Ok(())
}
