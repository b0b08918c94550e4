#![no_std]
#![doc = include_str!("../README.md")]
#![allow(async_fn_in_trait)]

use core::fmt;

mod macros;

pub mod bus;
pub mod config;
pub mod gate;
pub mod mcp4728;
pub mod pca9685;
pub mod shield;
pub mod tmp;

#[cfg(all(feature = "linux", target_os = "linux"))]
pub mod linux;

pub use bus::{BlockingAsync, Bus, BusProvider, DeviceId, Functionality, I2cBus};
pub use config::BoardConfig;
pub use mcp4728::{Bank, Channel, ChannelIndex, DacState, PowerDown};
pub use shield::{DeviceRecord, HpLedShield, Stage};

/// The three chips sharing the shield's bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// PCA9685 PWM/LED driver
    Pca,
    /// MCP4728 quad DAC
    Mcp,
    /// Temperature sensor
    Tmp,
}

impl Role {
    /// Discovery order.
    pub const ALL: [Self; 3] = [Self::Pca, Self::Mcp, Self::Tmp];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pca => "pca",
            Self::Mcp => "mcp",
            Self::Tmp => "tmp",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Pca => 0,
            Self::Mcp => 1,
            Self::Tmp => 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reads whose length is checked against what the chip is expected to return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    Status,
    Mode1,
    Temperature,
}

impl Operation {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Mode1 => "mode1",
            Self::Temperature => "temperature",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Propagated unmodified from the bus.
    I2cError(E),
    /// The bus lacks plain I2C read/write (an SMBus-only controller, for instance).
    UnsupportedTransport,
    /// Nothing answered a scan of the configured address.
    DeviceNotFound { role: Role, address: u8 },
    UnexpectedReadLength {
        actual: usize,
        expected: usize,
        role: Role,
        operation: Operation,
    },
    /// The controller has not completed [`HpLedShield::init`] or
    /// [`HpLedShield::verify`].
    NotReady,
    /// A configured address lies outside `0x08..=0x77`.
    AddressOutOfRange(u8),
    ArgumentError,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::I2cError(error)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2cError(error) => write!(f, "i2c error: {error:?}"),
            Self::UnsupportedTransport => f.write_str("unexpected non-i2c bus"),
            Self::DeviceNotFound { role, address } => {
                write!(f, "could not scan device {role} at {address:#04x}")
            }
            Self::UnexpectedReadLength {
                actual,
                expected,
                role,
                operation,
            } => write!(
                f,
                "unexpected {actual} bytes read from {role} {}, expected {expected}",
                operation.name()
            ),
            Self::NotReady => f.write_str("shield is not ready"),
            Self::AddressOutOfRange(address) => {
                write!(f, "address {address:#04x} outside 0x08..=0x77")
            }
            Self::ArgumentError => f.write_str("argument out of range"),
        }
    }
}

/// Failure of [`HpLedShield::connect`]: either the bus could not be opened or
/// the opened bus failed validation or discovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectError<P, E> {
    Open(P),
    Shield(Error<E>),
}

impl<P, E> From<Error<E>> for ConnectError<P, E> {
    fn from(error: Error<E>) -> Self {
        Self::Shield(error)
    }
}

impl<P: fmt::Debug, E: fmt::Debug> fmt::Display for ConnectError<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(error) => write!(f, "could not open bus: {error:?}"),
            Self::Shield(error) => error.fmt(f),
        }
    }
}
