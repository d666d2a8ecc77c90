// Command/data framing for a 4-wire SPI panel.
//
// Every byte the controller receives is classified by the D/C line:
//   D/C low  -> command byte
//   D/C high -> parameter or pixel data
// CS is handled by the `SpiDevice` implementation: one `write` is one
// CS-asserted transaction, so CS never stays asserted across calls and
// is released by the device even when the transfer fails.
//
// Example (COLMOD = RGB565):
//   D/C=0 CS[0x3A]   D/C=1 CS[0x55]

use embedded_hal::{digital::OutputPin, spi::SpiDevice};

use crate::error::Error;

/// Owns the SPI device and the D/C line. Not `Clone`: there is exactly one
/// holder of the bus for the lifetime of the panel.
pub struct SpiInterface<SPI, DC> {
    spi: SPI,
    dc: DC,
}

impl<SPI, DC> SpiInterface<SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    /// Send one command byte (D/C low) in its own CS bracket.
    pub fn send_command(&mut self, cmd: u8) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.dc.set_low().map_err(Error::Pin)?;
        self.spi.write(&[cmd]).map_err(Error::Spi)
    }

    /// Send a single data byte (D/C high).
    pub fn send_data(&mut self, byte: u8) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.send_data_block(&[byte])
    }

    /// Send a run of data bytes as one CS-asserted burst.
    ///
    /// An empty block issues no bus activity at all.
    pub fn send_data_block(&mut self, bytes: &[u8]) -> Result<(), Error<SPI::Error, DC::Error>> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.dc.set_high().map_err(Error::Pin)?;
        self.spi.write(bytes).map_err(Error::Spi)
    }

    /// Command byte followed by its parameter block.
    pub fn send_command_with_args(
        &mut self,
        cmd: u8,
        args: &[u8],
    ) -> Result<(), Error<SPI::Error, DC::Error>> {
        self.send_command(cmd)?;
        self.send_data_block(args)
    }

    /// Give back the SPI device and D/C pin.
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use embedded_hal_mock::eh1::MockError;
    use std::vec::Vec;

    fn spi_device_write(data: &[u8]) -> [SpiTransaction<u8>; 3] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(data.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    #[test]
    fn command_drives_dc_low_then_one_transaction() {
        let mut spi = SpiMock::new(&spi_device_write(&[0x11]));
        let mut dc = PinMock::new(&[PinTransaction::set(PinState::Low)]);

        let mut bus = SpiInterface::new(spi.clone(), dc.clone());
        bus.send_command(0x11).unwrap();

        spi.done();
        dc.done();
    }

    #[test]
    fn data_block_is_a_single_burst() {
        let mut spi = SpiMock::new(&spi_device_write(&[0xA4, 0xA1]));
        let mut dc = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut bus = SpiInterface::new(spi.clone(), dc.clone());
        bus.send_data_block(&[0xA4, 0xA1]).unwrap();

        spi.done();
        dc.done();
    }

    #[test]
    fn single_data_byte_raises_dc_and_sends_one_byte() {
        let mut spi = SpiMock::new(&spi_device_write(&[0x55]));
        let mut dc = PinMock::new(&[PinTransaction::set(PinState::High)]);

        let mut bus = SpiInterface::new(spi.clone(), dc.clone());
        bus.send_data(0x55).unwrap();

        spi.done();
        dc.done();
    }

    #[test]
    fn empty_block_touches_nothing() {
        let mut spi = SpiMock::new(&[]);
        let mut dc = PinMock::new(&[]);

        let mut bus = SpiInterface::new(spi.clone(), dc.clone());
        bus.send_data_block(&[]).unwrap();

        spi.done();
        dc.done();
    }

    #[test]
    fn command_with_args_splits_into_two_brackets() {
        let expectations: Vec<SpiTransaction<u8>> = [
            &spi_device_write(&[0xD0]) as &[_],
            &spi_device_write(&[0xA4, 0xA1]),
        ]
        .iter()
        .flat_map(|s| s.iter().cloned())
        .collect();
        let mut spi = SpiMock::new(&expectations);
        let mut dc = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut bus = SpiInterface::new(spi.clone(), dc.clone());
        bus.send_command_with_args(0xD0, &[0xA4, 0xA1]).unwrap();

        spi.done();
        dc.done();
    }

    #[test]
    fn dc_failure_aborts_before_the_transfer() {
        let mut spi = SpiMock::new(&[]);
        let mut dc = PinMock::new(&[PinTransaction::set(PinState::Low)
            .with_error(MockError::Io(std::io::ErrorKind::NotConnected))]);

        let mut bus = SpiInterface::new(spi.clone(), dc.clone());
        let err = bus.send_command(0x29).unwrap_err();
        assert!(err.is_transport());

        spi.done();
        dc.done();
    }
}
