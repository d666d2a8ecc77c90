//! Recording fake for the panel bus.
//!
//! `FakeSpi`, `FakePin` and `FakeDelay` share one `Bus` log. Delays advance a
//! virtual clock instead of sleeping, every SPI transaction (one CS bracket)
//! becomes one `Transfer` tagged with the D/C level it went out under, and
//! line writes are kept alongside so reset/backlight timing can be checked.

#![allow(dead_code)]

use std::{cell::RefCell, convert::Infallible, rc::Rc};

use embedded_hal::{
    delay::DelayNs,
    digital::{self, OutputPin},
    spi::{self, ErrorKind, Operation, SpiDevice},
};
use st7789v_lcd::{st7789, St7789};

pub const MS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Dc,
    Rst,
    Bl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Command,
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Transfer { kind: Kind, bytes: Vec<u8>, at_ns: u64 },
    Line { line: Line, high: bool, at_ns: u64 },
}

/// One CS bracket as seen on the wire, with the time since the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub kind: Kind,
    pub bytes: Vec<u8>,
    pub gap_ns: u64,
}

#[derive(Debug, Default)]
pub struct Bus {
    pub now_ns: u64,
    pub dc_high: bool,
    pub events: Vec<Event>,
    /// Fail the transfer with this zero-based index.
    pub fail_at: Option<usize>,
    pub transfers_seen: usize,
}

impl Bus {
    pub fn transfers(&self) -> Vec<Transfer> {
        let mut prev: Option<u64> = None;
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Transfer { kind, bytes, at_ns } => {
                    let gap_ns = prev.map_or(*at_ns, |p| at_ns - p);
                    prev = Some(*at_ns);
                    Some(Transfer {
                        kind: *kind,
                        bytes: bytes.clone(),
                        gap_ns,
                    })
                }
                Event::Line { .. } => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<u8> {
        self.transfers()
            .iter()
            .filter(|t| t.kind == Kind::Command)
            .map(|t| t.bytes[0])
            .collect()
    }

    /// Time of the first transfer that is command `cmd`.
    pub fn command_at(&self, cmd: u8) -> Option<u64> {
        self.events.iter().find_map(|e| match e {
            Event::Transfer {
                kind: Kind::Command,
                bytes,
                at_ns,
            } if bytes[..] == [cmd] => Some(*at_ns),
            _ => None,
        })
    }

    pub fn line_events(&self, which: Line) -> Vec<(bool, u64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Line { line, high, at_ns } if *line == which => Some((*high, *at_ns)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

pub type SharedBus = Rc<RefCell<Bus>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeSpiError;

impl spi::Error for FakeSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct FakeSpi {
    bus: SharedBus,
}

impl spi::ErrorType for FakeSpi {
    type Error = FakeSpiError;
}

impl SpiDevice<u8> for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut bus = self.bus.borrow_mut();
        let index = bus.transfers_seen;
        bus.transfers_seen += 1;
        if bus.fail_at == Some(index) {
            return Err(FakeSpiError);
        }

        let mut bytes = Vec::new();
        for op in operations.iter() {
            if let Operation::Write(buf) = op {
                bytes.extend_from_slice(buf);
            }
        }
        let kind = if bus.dc_high { Kind::Data } else { Kind::Command };
        let at_ns = bus.now_ns;
        bus.events.push(Event::Transfer { kind, bytes, at_ns });
        Ok(())
    }
}

pub struct FakePin {
    line: Line,
    bus: SharedBus,
}

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl FakePin {
    fn set(&mut self, high: bool) {
        let mut bus = self.bus.borrow_mut();
        if self.line == Line::Dc {
            bus.dc_high = high;
        }
        let at_ns = bus.now_ns;
        bus.events.push(Event::Line {
            line: self.line,
            high,
            at_ns,
        });
    }
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

pub struct FakeDelay {
    bus: SharedBus,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.bus.borrow_mut().now_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.bus.borrow_mut().now_ns += u64::from(ms) * MS;
    }
}

pub type FakePanel = St7789<FakeSpi, FakePin, FakePin, FakePin>;

pub struct Rig {
    pub bus: SharedBus,
    pub spi: FakeSpi,
    pub dc: FakePin,
    pub rst: FakePin,
    pub bl: FakePin,
    pub delay: FakeDelay,
}

pub fn rig() -> Rig {
    rig_with(Bus::default())
}

pub fn rig_with(bus: Bus) -> Rig {
    let bus = Rc::new(RefCell::new(bus));
    Rig {
        spi: FakeSpi { bus: bus.clone() },
        dc: FakePin {
            line: Line::Dc,
            bus: bus.clone(),
        },
        rst: FakePin {
            line: Line::Rst,
            bus: bus.clone(),
        },
        bl: FakePin {
            line: Line::Bl,
            bus: bus.clone(),
        },
        delay: FakeDelay { bus: bus.clone() },
        bus,
    }
}

/// Initialized panel with an empty log.
pub fn ready_panel() -> (SharedBus, FakePanel, FakeDelay) {
    let Rig {
        bus,
        spi,
        dc,
        rst,
        bl,
        mut delay,
    } = rig();
    let panel = match st7789::new_with_defaults(spi, dc, rst, bl, &mut delay) {
        Ok(panel) => panel,
        Err(e) => panic!("init failed on the fake bus: {e}"),
    };
    bus.borrow_mut().clear();
    (bus, panel, delay)
}
