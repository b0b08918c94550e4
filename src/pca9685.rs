//! # PCA9685 MODE1 handling
//!
//! The shield only needs the LED driver out of sleep; PWM programming is left to a dedicated
//! driver.
//!
//! [Datasheet]: https://www.nxp.com/docs/en/data-sheet/PCA9685.pdf

pub const REG_MODE1: u8 = 0x00;

pub const MODE1_AUTO_INCREMENT: u8 = 0b0010_0000;
pub const MODE1_SLEEP: u8 = 0b0001_0000;
pub const MODE1_ALLCALL: u8 = 0b0000_0001;

/// MODE1 with the oscillator running.  All other bits are kept.
#[must_use]
pub const fn awake(mode1: u8) -> u8 {
    mode1 & !MODE1_SLEEP
}

#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
mod test {
    use crate::pca9685::{awake, MODE1_ALLCALL, MODE1_AUTO_INCREMENT, MODE1_SLEEP};

    #[test]
    pub fn power_on_default() {
        // SLEEP and ALLCALL after reset
        assert_eq!(awake(MODE1_SLEEP | MODE1_ALLCALL), MODE1_ALLCALL);
    }

    #[test]
    pub fn already_awake() {
        assert_eq!(
            awake(MODE1_AUTO_INCREMENT | MODE1_ALLCALL),
            MODE1_AUTO_INCREMENT | MODE1_ALLCALL
        );
    }
}
