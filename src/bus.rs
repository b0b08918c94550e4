//! The bus primitives a shield needs, and adapters providing them on top of `embedded-hal`.
//!
//! [`Bus`] is the capability set the controller consumes: a capability query, address scan,
//! device-ID query and raw block read/write.  [`I2cBus`] implements it for any
//! [`embedded_hal_async::i2c::I2c`]; wrap a blocking [`embedded_hal::i2c::I2c`] (such as
//! `linux_embedded_hal::I2cdev`) in [`BlockingAsync`] first.

pub use embassy_embedded_hal::adapter::BlockingAsync;
use embedded_hal_async::i2c::{Error as _, ErrorKind, ErrorType, I2c};

/// Reserved address answering the device-ID transaction.
const DEVICE_ID_ADDRESS: u8 = 0x7C;
const HIGHEST_ADDRESS: u8 = 0x7F;

/// Addresses reported present by [`Bus::scan`].
pub type Addresses = heapless::Vec<u8, 128>;

/// What a bus controller can do, as reported by the adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Functionality {
    /// Plain I2C read/write transfers
    pub i2c: bool,
}

impl Functionality {
    /// A full I2C master.
    pub const I2C: Self = Self { i2c: true };

    /// An SMBus-only controller without raw I2C transfers.
    pub const SMBUS: Self = Self { i2c: false };
}

/// The 24-bit word returned by the I2C device-ID transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    /// 12-bit manufacturer code
    pub manufacturer: u16,
    /// 9-bit part identification
    pub part: u16,
    /// 3-bit die revision
    pub revision: u8,
}

impl DeviceId {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        let word = (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32;
        Self {
            manufacturer: (word >> 12) as u16,
            part: ((word >> 3) & 0x1FF) as u16,
            revision: (word & 0x7) as u8,
        }
    }
}

pub trait Bus: ErrorType {
    async fn functionality(&mut self) -> Result<Functionality, Self::Error>;

    /// Lists the addresses in `first..=last` that acknowledge.
    async fn scan(&mut self, first: u8, last: u8) -> Result<Addresses, Self::Error>;

    async fn device_id(&mut self, address: u8) -> Result<DeviceId, Self::Error>;

    /// Reads into `buffer`, returning the number of bytes the device delivered.
    async fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    async fn write(&mut self, address: u8, buffer: &[u8]) -> Result<(), Self::Error>;
}

/// Opens numbered buses.  This is the only place a shield touches the host platform.
pub trait BusProvider {
    type Bus: Bus;
    /// Transport specific options, carried by [`BoardConfig`](crate::BoardConfig).
    type Options;
    type Error;

    async fn open(
        &mut self,
        bus_number: u8,
        options: Option<&Self::Options>,
    ) -> Result<Self::Bus, Self::Error>;
}

/// [`Bus`] on top of an async I2C master.
pub struct I2cBus<I2C> {
    i2c: I2C,
    functionality: Functionality,
}

impl<I2C> I2cBus<I2C> {
    /// Wraps a full I2C master.
    pub fn new(i2c: I2C) -> Self {
        Self::with_functionality(i2c, Functionality::I2C)
    }

    /// Wraps a controller whose capabilities are known to differ from a full I2C master.
    pub fn with_functionality(i2c: I2C, functionality: Functionality) -> Self {
        Self { i2c, functionality }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: ErrorType> ErrorType for I2cBus<I2C> {
    type Error = I2C::Error;
}

impl<I2C: I2c> Bus for I2cBus<I2C> {
    async fn functionality(&mut self) -> Result<Functionality, Self::Error> {
        Ok(self.functionality)
    }

    async fn scan(&mut self, first: u8, last: u8) -> Result<Addresses, Self::Error> {
        let mut found = Addresses::new();
        for address in first..=last.min(HIGHEST_ADDRESS) {
            let mut probe: [u8; 1] = [0];
            match self.i2c.read(address, &mut probe).await {
                // at most 128 addresses, never full
                Ok(()) => found.push(address).unwrap_or_default(),
                Err(error) if matches!(error.kind(), ErrorKind::NoAcknowledge(_)) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(found)
    }

    async fn device_id(&mut self, address: u8) -> Result<DeviceId, Self::Error> {
        let mut data: [u8; 3] = [0; 3];
        self.i2c
            .write_read(DEVICE_ID_ADDRESS, &[address << 1], &mut data)
            .await?;
        Ok(DeviceId::from_bytes(data))
    }

    async fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        self.i2c.read(address, buffer).await?;
        Ok(buffer.len())
    }

    async fn write(&mut self, address: u8, buffer: &[u8]) -> Result<(), Self::Error> {
        self.i2c.write(address, buffer).await
    }
}


#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
mod test {
    extern crate std;
    use std::vec;
    extern crate embedded_hal;
    extern crate embedded_hal_mock;
    use embassy_futures::block_on;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use crate::bus::{BlockingAsync, Bus, DeviceId, Functionality, I2cBus};

    #[test]
    pub fn device_id_fields() {
        assert_eq!(
            DeviceId::from_bytes([0x00, 0x81, 0x0A]),
            DeviceId {
                manufacturer: 0x008,
                part: 0x021,
                revision: 0x2,
            }
        );
        assert_eq!(
            DeviceId::from_bytes([0xFF, 0xFF, 0xFF]),
            DeviceId {
                manufacturer: 0xFFF,
                part: 0x1FF,
                revision: 0x7,
            }
        );
    }

    #[test]
    pub fn functionality() {
        let expectations = [];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        assert_eq!(block_on(bus.functionality()), Ok(Functionality::I2C));

        let mut bus = I2cBus::with_functionality(bus.release(), Functionality::SMBUS);
        assert!(!block_on(bus.functionality()).unwrap().i2c);

        i2c_clone.done();
    }

    #[test]
    pub fn scan_single_address() {
        let expectations = [I2cTransaction::read(0x60, vec![0x00])];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        assert_eq!(block_on(bus.scan(0x60, 0x60)).unwrap().as_slice(), &[0x60]);

        i2c_clone.done();
    }

    #[test]
    pub fn scan_skips_unacknowledged() {
        let expectations = [
            I2cTransaction::read(0x48, vec![0x00])
                .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
            I2cTransaction::read(0x49, vec![0x00]),
            I2cTransaction::read(0x4A, vec![0x00])
                .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        assert_eq!(block_on(bus.scan(0x48, 0x4A)).unwrap().as_slice(), &[0x49]);

        i2c_clone.done();
    }

    #[test]
    pub fn scan_propagates_bus_error() {
        let expectations =
            [I2cTransaction::read(0x48, vec![0x00]).with_error(ErrorKind::ArbitrationLoss)];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        assert_eq!(
            block_on(bus.scan(0x48, 0x49)),
            Err(ErrorKind::ArbitrationLoss)
        );

        i2c_clone.done();
    }

    #[test]
    pub fn scan_empty_range() {
        let expectations = [];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        assert!(block_on(bus.scan(0x50, 0x4F)).unwrap().is_empty());

        i2c_clone.done();
    }

    #[test]
    pub fn device_id() {
        let expectations = [I2cTransaction::write_read(
            0x7C,
            vec![0x80],
            vec![0x00, 0x81, 0x0A],
        )];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        assert_eq!(
            block_on(bus.device_id(0x40)),
            Ok(DeviceId::from_bytes([0x00, 0x81, 0x0A]))
        );

        i2c_clone.done();
    }

    #[test]
    pub fn read_reports_length() {
        let expectations = [I2cTransaction::read(0x4C, vec![0x19, 0x80])];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        let mut data: [u8; 2] = [0; 2];
        assert_eq!(block_on(bus.read(0x4C, &mut data)), Ok(2));
        assert_eq!(data, [0x19, 0x80]);

        i2c_clone.done();
    }

    #[test]
    pub fn write() {
        let expectations = [I2cTransaction::write(0x60, vec![0x00, 0x20])];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bus = I2cBus::new(BlockingAsync::new(i2c));
        assert_eq!(block_on(bus.write(0x60, &[0x00, 0x20])), Ok(()));

        i2c_clone.done();
    }
}
