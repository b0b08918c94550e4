use crate::{Error, Role};

pub const DEFAULT_PCA_ADDRESS: u8 = 0x60;
pub const DEFAULT_MCP_ADDRESS: u8 = 0x40;
pub const DEFAULT_TMP_ADDRESS: u8 = 0x4C;

/// Where to find the shield: which bus to open, with which transport options, and the address of
/// each chip on it.
///
/// `O` is the option type of the [`BusProvider`](crate::BusProvider) that opens the bus.  The
/// configuration is handed to [`HpLedShield`](crate::HpLedShield) by value and never changes
/// afterwards; derive variations from [`BoardConfig::default`] with the `with_*` methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig<O = ()> {
    pub bus_number: u8,
    pub bus_options: Option<O>,
    pub pca_address: u8,
    pub mcp_address: u8,
    pub tmp_address: u8,
}

impl<O> Default for BoardConfig<O> {
    fn default() -> Self {
        Self {
            bus_number: 0,
            bus_options: None,
            pca_address: DEFAULT_PCA_ADDRESS,
            mcp_address: DEFAULT_MCP_ADDRESS,
            tmp_address: DEFAULT_TMP_ADDRESS,
        }
    }
}

impl<O> BoardConfig<O> {
    #[must_use]
    pub fn with_bus_number(self, bus_number: u8) -> Self {
        Self { bus_number, ..self }
    }

    #[must_use]
    pub fn with_bus_options(self, bus_options: O) -> Self {
        Self {
            bus_options: Some(bus_options),
            ..self
        }
    }

    #[must_use]
    pub fn with_pca_address(self, pca_address: u8) -> Self {
        Self {
            pca_address,
            ..self
        }
    }

    #[must_use]
    pub fn with_mcp_address(self, mcp_address: u8) -> Self {
        Self {
            mcp_address,
            ..self
        }
    }

    #[must_use]
    pub fn with_tmp_address(self, tmp_address: u8) -> Self {
        Self {
            tmp_address,
            ..self
        }
    }

    /// The configured address of `role`.
    #[must_use]
    pub const fn address(&self, role: Role) -> u8 {
        match role {
            Role::Pca => self.pca_address,
            Role::Mcp => self.mcp_address,
            Role::Tmp => self.tmp_address,
        }
    }

    /// Checks every address against the allowed range `0x08..=0x77`.
    ///
    /// # Errors
    ///
    /// [`Error::AddressOutOfRange`]: the first offending address in discovery order
    pub fn check<E>(&self) -> Result<(), Error<E>> {
        for role in Role::ALL {
            let address = self.address(role);
            if !(0x08..=0x77).contains(&address) {
                return Err(Error::AddressOutOfRange(address));
            }
        }
        Ok(())
    }
}

#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
mod test {
    use crate::{config::BoardConfig, Error, Role};

    #[test]
    pub fn defaults() {
        let config: BoardConfig = BoardConfig::default();
        assert_eq!(config.bus_number, 0);
        assert_eq!(config.bus_options, None);
        assert_eq!(config.address(Role::Pca), 0x60);
        assert_eq!(config.address(Role::Mcp), 0x40);
        assert_eq!(config.address(Role::Tmp), 0x4C);
    }

    #[test]
    pub fn builder_leaves_other_fields() {
        let config = BoardConfig::default()
            .with_bus_number(1)
            .with_bus_options(7_u32)
            .with_mcp_address(0x61);
        assert_eq!(config.bus_number, 1);
        assert_eq!(config.bus_options, Some(7));
        assert_eq!(config.pca_address, 0x60);
        assert_eq!(config.mcp_address, 0x61);
        assert_eq!(config.tmp_address, 0x4C);
    }

    #[test]
    pub fn check_in_range() {
        let config: BoardConfig = BoardConfig::default();
        assert_eq!(config.check::<()>(), Ok(()));
    }

    #[test]
    pub fn check_out_of_range() {
        let config: BoardConfig = BoardConfig::default()
            .with_tmp_address(0x07)
            .with_pca_address(0x78);
        assert_eq!(config.check::<()>(), Err(Error::AddressOutOfRange(0x78)));
    }
}
