//! # TMP75 / LM75 temperature register
//!
//! The temperature register holds a left-justified two's complement reading in big-endian order.
//! Read as an `i16` it is degrees Celsius scaled by 256, whatever the configured resolution.
use fixed::types::I8F8;

pub const REG_TEMPERATURE: u8 = 0x00;
pub const TEMPERATURE_LEN: usize = 2;

#[must_use]
pub const fn celsius_from(data: [u8; TEMPERATURE_LEN]) -> I8F8 {
    I8F8::from_bits(i16::from_be_bytes(data))
}
