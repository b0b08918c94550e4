use crate::{
    bus::Bus,
    macros::{trace, warn},
    Error,
};

/// Rejects buses that cannot perform plain I2C transfers.  The query is repeated on every call.
///
/// # Errors
///
/// - [`Error::UnsupportedTransport`]: the bus reports no I2C capability
/// - [`Error::I2cError`]: the capability query itself failed
pub async fn validate<B: Bus>(bus: &mut B) -> Result<(), Error<B::Error>> {
    let functionality = bus.functionality().await?;
    if !functionality.i2c {
        warn!("unexpected non-i2c bus");
        return Err(Error::UnsupportedTransport);
    }
    trace!("bus supports i2c");
    Ok(())
}

#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
mod test {
    extern crate std;
    use std::vec;
    use embassy_futures::block_on;

    use crate::{
        bus::fake::{Event, FakeBus},
        gate::validate,
        Error, Functionality,
    };

    #[test]
    pub fn accepts_i2c() {
        let mut bus = FakeBus::new(&[]);
        assert_eq!(block_on(validate(&mut bus)), Ok(()));
    }

    #[test]
    pub fn rejects_smbus() {
        let mut bus = FakeBus::new(&[]);
        bus.functionality = Functionality::SMBUS;
        assert_eq!(
            block_on(validate(&mut bus)),
            Err(Error::UnsupportedTransport)
        );
    }

    #[test]
    pub fn queries_every_time() {
        let mut bus = FakeBus::new(&[]);
        block_on(validate(&mut bus)).unwrap();
        block_on(validate(&mut bus)).unwrap();
        assert_eq!(bus.events, vec![Event::Functionality, Event::Functionality]);

        bus.functionality = Functionality::SMBUS;
        assert_eq!(
            block_on(validate(&mut bus)),
            Err(Error::UnsupportedTransport)
        );
    }
}
