//! Error taxonomy shared by the bus framer and the controller driver.

use core::fmt;

/// Caller contract violations. Always raised before any bus activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidArgument {
    /// `x0 > x1` or `y0 > y1`.
    InvertedWindow,
    /// Empty, negative, or wider than 16-bit panel coordinates.
    Unrepresentable,
    /// The window reaches past the panel edge.
    OutOfBounds {
        x1: u16,
        y1: u16,
        width: u16,
        height: u16,
    },
    /// Pixel buffer length is not `width * height * 2`.
    BufferLength { expected: usize, actual: usize },
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedWindow => f.write_str("window start lies after window end"),
            Self::Unrepresentable => f.write_str("area has no panel coordinates"),
            Self::OutOfBounds { x1, y1, width, height } => write!(
                f,
                "window end ({x1}, {y1}) outside {width}x{height} panel"
            ),
            Self::BufferLength { expected, actual } => write!(
                f,
                "pixel buffer is {actual} bytes, window needs {expected}"
            ),
        }
    }
}

/// Error type that wraps SPI and GPIO errors.
///
/// `Spi` and `Pin` are transport failures: the operation in progress is
/// abandoned and the controller needs a hardware reset plus a full
/// re-initialization before it can be trusted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
    InvalidArgument(InvalidArgument),
}

impl<SpiE, PinE> Error<SpiE, PinE> {
    /// True for bus or control-line failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Spi(_) | Self::Pin(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl<SpiE, PinE> From<InvalidArgument> for Error<SpiE, PinE> {
    fn from(e: InvalidArgument) -> Self {
        Self::InvalidArgument(e)
    }
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for Error<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "spi transfer failed: {e:?}"),
            Self::Pin(e) => write!(f, "control line write failed: {e:?}"),
            Self::InvalidArgument(e) => write!(f, "invalid argument: {e}"),
        }
    }
}
