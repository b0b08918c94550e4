//! # HP LED shield controller
//!
//! [`HpLedShield`] owns the bus shared by the shield's PCA9685 LED driver, MCP4728 DAC and
//! temperature sensor.  A controller starts out [`Stage::Pending`]; [`HpLedShield::init`] checks
//! the bus and finds all three chips before it becomes [`Stage::Ready`].  Board operations on a
//! controller that is not ready fail with [`Error::NotReady`].
//!
//! Every bus access takes the controller's mutex for its duration, so operations never interleave
//! on the wire even while the three device discoveries run concurrently.

use embassy_futures::join::join3;
use embassy_sync::{
    blocking_mutex::raw::{NoopRawMutex, RawMutex},
    mutex::Mutex,
};
use fixed::types::I8F8;

use crate::{
    bus::{Bus, BusProvider, DeviceId},
    config::BoardConfig,
    gate,
    macros::{debug, info, warn},
    mcp4728::{self, Channel, ChannelIndex, DacState, STATUS_LEN, VALUE_MAX},
    pca9685, tmp, ConnectError, Error, Operation, Role,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Bus opened but not yet checked.
    Pending,
    /// Bus passed the capability check; devices not (or no longer) confirmed.
    Validated,
    /// All three chips answered.
    Ready,
}

/// Where a chip was found and how it identified itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceRecord {
    pub address: u8,
    pub id: DeviceId,
}

pub struct HpLedShield<B, O = (), M: RawMutex = NoopRawMutex> {
    bus: Mutex<M, B>,
    config: BoardConfig<O>,
    stage: Stage,
    devices: [Option<DeviceRecord>; 3],
    dac: DacState,
}

impl<B: Bus, O, M: RawMutex> HpLedShield<B, O, M> {
    /// Takes ownership of an opened bus without touching it.  Call [`HpLedShield::init`] before
    /// anything else.
    ///
    /// # Errors
    ///
    /// [`Error::AddressOutOfRange`]: a configured address is outside `0x08..=0x77`
    pub fn new(bus: B, config: BoardConfig<O>) -> Result<Self, Error<B::Error>> {
        config.check()?;
        Ok(Self {
            bus: Mutex::new(bus),
            config,
            stage: Stage::Pending,
            devices: [None; 3],
            dac: DacState::default(),
        })
    }

    /// Opens the configured bus through `provider` and returns a ready controller.
    ///
    /// # Errors
    ///
    /// - [`ConnectError::Open`]: the provider could not open the bus
    /// - [`ConnectError::Shield`]: see [`HpLedShield::new`] and [`HpLedShield::init`]
    pub async fn connect<P>(
        provider: &mut P,
        config: BoardConfig<O>,
    ) -> Result<Self, ConnectError<P::Error, B::Error>>
    where
        P: BusProvider<Bus = B, Options = O>,
    {
        let bus = provider
            .open(config.bus_number, config.bus_options.as_ref())
            .await
            .map_err(ConnectError::Open)?;
        Ok(Self::new(bus, config)?.init().await?)
    }

    /// Validates the bus and discovers the chips.  Only a ready controller is returned.
    ///
    /// # Errors
    ///
    /// See [`HpLedShield::verify`].
    pub async fn init(mut self) -> Result<Self, Error<B::Error>> {
        self.verify().await?;
        Ok(self)
    }

    /// Re-checks the bus and re-discovers every chip, refreshing the device records.  DAC state is
    /// left alone.  The controller is not ready again until this succeeds.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedTransport`]: the bus cannot do plain I2C
    /// - [`Error::DeviceNotFound`]: the first chip, in [`Role::ALL`] order, that did not answer
    /// - [`Error::I2cError`]: any bus failure
    pub async fn verify(&mut self) -> Result<(), Error<B::Error>> {
        self.stage = Stage::Pending;
        gate::validate(&mut *self.bus.lock().await).await?;
        self.stage = Stage::Validated;
        self.load_devices().await?;
        info!("shield ready");
        Ok(())
    }

    /// Scans each configured address and records the device ID found there.  The three
    /// discoveries run concurrently; records are only replaced when all of them succeed.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`]: the bus has not been validated
    /// - [`Error::DeviceNotFound`]: the first chip, in [`Role::ALL`] order, that did not answer
    /// - [`Error::I2cError`]: any bus failure
    pub async fn load_devices(&mut self) -> Result<(), Error<B::Error>> {
        if self.stage == Stage::Pending {
            return Err(Error::NotReady);
        }
        self.stage = Stage::Validated;

        let (pca, mcp, tmp) = join3(
            discover(&self.bus, Role::Pca, self.config.pca_address),
            discover(&self.bus, Role::Mcp, self.config.mcp_address),
            discover(&self.bus, Role::Tmp, self.config.tmp_address),
        )
        .await;
        self.devices = [Some(pca?), Some(mcp?), Some(tmp?)];

        self.stage = Stage::Ready;
        Ok(())
    }

    /// Brings the board into a known state: read the DAC, reset all channels to the internal
    /// reference, write them back and wake the LED driver.
    ///
    /// A failure leaves the chips in an indeterminate state and the controller
    /// [`Stage::Pending`]; [`HpLedShield::verify`] has to succeed before trying again.
    ///
    /// # Errors
    ///
    /// Whatever the failing step reported.
    pub async fn begin(&mut self) -> Result<(), Error<B::Error>> {
        self.ensure_ready()?;
        let result = self.begin_steps().await;
        if result.is_err() {
            warn!("begin failed, shield needs verifying");
            self.stage = Stage::Pending;
        }
        result
    }

    async fn begin_steps(&mut self) -> Result<(), Error<B::Error>> {
        self.get_status().await?;
        self.reset_mode();
        self.write_mcp().await?;
        self.wake_pca().await
    }

    /// Reads the DAC status from the configured MCP4728 address.
    ///
    /// # Errors
    ///
    /// See [`HpLedShield::get_status_at`].
    pub async fn get_status(&mut self) -> Result<(), Error<B::Error>> {
        self.get_status_at(self.config.mcp_address).await
    }

    /// Reads the 24-byte status of the MCP4728 at `address` into the live and EEPROM banks.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`]
    /// - [`Error::UnexpectedReadLength`]: the chip returned other than 24 bytes; no channel is
    ///   updated
    /// - [`Error::I2cError`]
    pub async fn get_status_at(&mut self, address: u8) -> Result<(), Error<B::Error>> {
        self.ensure_ready()?;
        let mut data: [u8; STATUS_LEN] = [0; STATUS_LEN];
        let actual = self.bus.lock().await.read(address, &mut data).await?;
        if actual != STATUS_LEN {
            warn!("unexpected {} bytes read from mcp status", actual);
            return Err(Error::UnexpectedReadLength {
                actual,
                expected: STATUS_LEN,
                role: Role::Mcp,
                operation: Operation::Status,
            });
        }
        mcp4728::decode_status(&data, &mut self.dac);
        debug!("mcp status read");
        Ok(())
    }

    /// Puts every live channel on the internal 2.048 V reference with unity gain, normal power
    /// and a zero output code.  Nothing is written until [`HpLedShield::write_mcp`].
    pub fn reset_mode(&mut self) {
        for index in ChannelIndex::ALL {
            self.dac.live[index] = Channel::BASELINE;
        }
    }

    /// Sends the live bank to the DAC with a single multi-write.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`]
    /// - [`Error::I2cError`]
    pub async fn write_mcp(&mut self) -> Result<(), Error<B::Error>> {
        self.ensure_ready()?;
        let data = mcp4728::encode_multi_write(&self.dac.live);
        self.bus
            .lock()
            .await
            .write(self.config.mcp_address, &data)
            .await?;
        Ok(())
    }

    /// Clears the SLEEP bit of the PCA9685, keeping the rest of MODE1.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`]
    /// - [`Error::UnexpectedReadLength`]: MODE1 did not read back as one byte
    /// - [`Error::I2cError`]
    pub async fn wake_pca(&mut self) -> Result<(), Error<B::Error>> {
        self.ensure_ready()?;
        let address = self.config.pca_address;
        let mut bus = self.bus.lock().await;

        bus.write(address, &[pca9685::REG_MODE1]).await?;
        let mut data: [u8; 1] = [0];
        let actual = bus.read(address, &mut data).await?;
        if actual != data.len() {
            return Err(Error::UnexpectedReadLength {
                actual,
                expected: data.len(),
                role: Role::Pca,
                operation: Operation::Mode1,
            });
        }
        bus.write(address, &[pca9685::REG_MODE1, pca9685::awake(data[0])])
            .await?;
        Ok(())
    }

    /// Board temperature in degrees Celsius.
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`]
    /// - [`Error::UnexpectedReadLength`]
    /// - [`Error::I2cError`]
    pub async fn read_temperature(&mut self) -> Result<I8F8, Error<B::Error>> {
        self.ensure_ready()?;
        let address = self.config.tmp_address;
        let mut bus = self.bus.lock().await;

        bus.write(address, &[tmp::REG_TEMPERATURE]).await?;
        let mut data: [u8; tmp::TEMPERATURE_LEN] = [0; tmp::TEMPERATURE_LEN];
        let actual = bus.read(address, &mut data).await?;
        if actual != tmp::TEMPERATURE_LEN {
            return Err(Error::UnexpectedReadLength {
                actual,
                expected: tmp::TEMPERATURE_LEN,
                role: Role::Tmp,
                operation: Operation::Temperature,
            });
        }
        Ok(tmp::celsius_from(data))
    }

    /// Changes a live channel locally.  Send it with [`HpLedShield::write_mcp`].
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentError`]: `channel.value` exceeds 12 bits
    pub fn set_channel(
        &mut self,
        index: ChannelIndex,
        channel: Channel,
    ) -> Result<(), Error<B::Error>> {
        if channel.value > VALUE_MAX {
            return Err(Error::ArgumentError);
        }
        self.dac.live[index] = channel;
        Ok(())
    }

    #[must_use]
    pub fn channel(&self, index: ChannelIndex) -> Channel {
        self.dac.live[index]
    }

    #[must_use]
    pub fn eeprom_channel(&self, index: ChannelIndex) -> Channel {
        self.dac.eeprom[index]
    }

    #[must_use]
    pub fn status(&self) -> &DacState {
        &self.dac
    }

    /// Where `role` was last found.  `None` unless the controller is ready.
    #[must_use]
    pub fn device(&self, role: Role) -> Option<&DeviceRecord> {
        if self.stage != Stage::Ready {
            return None;
        }
        self.devices[role.index()].as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig<O> {
        &self.config
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Gives the bus back.
    pub fn release(self) -> B {
        self.bus.into_inner()
    }

    fn ensure_ready(&self) -> Result<(), Error<B::Error>> {
        if self.stage == Stage::Ready {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }
}

async fn discover<M: RawMutex, B: Bus>(
    bus: &Mutex<M, B>,
    role: Role,
    address: u8,
) -> Result<DeviceRecord, Error<B::Error>> {
    let found = bus.lock().await.scan(address, address).await?;
    if !found.contains(&address) {
        warn!("could not scan device {} at {:#x}", role, address);
        return Err(Error::DeviceNotFound { role, address });
    }
    let id = bus.lock().await.device_id(address).await?;
    debug!("found {} at {:#x}", role, address);
    Ok(DeviceRecord { address, id })
}
