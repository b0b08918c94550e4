//! Opens `/dev/i2c-N` through `linux-embedded-hal`.
extern crate std;
use std::format;

use linux_embedded_hal::{i2cdev::linux::LinuxI2CError, I2cdev};

use crate::bus::{BlockingAsync, BusProvider, I2cBus};

#[derive(Clone, Copy, Debug, Default)]
pub struct LinuxProvider;

impl BusProvider for LinuxProvider {
    type Bus = I2cBus<BlockingAsync<I2cdev>>;
    type Options = ();
    type Error = LinuxI2CError;

    async fn open(
        &mut self,
        bus_number: u8,
        _options: Option<&Self::Options>,
    ) -> Result<Self::Bus, Self::Error> {
        let i2c = I2cdev::new(format!("/dev/i2c-{bus_number}"))?;
        Ok(I2cBus::new(BlockingAsync::new(i2c)))
    }
}
