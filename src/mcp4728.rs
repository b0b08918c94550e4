//! # MCP4728 register layout
//!
//! A plain read of the MCP4728 returns 24 bytes: for every channel, the 3-byte DAC input register
//! followed by its 3-byte EEPROM copy.  Each record is `[device id, high byte, low byte]`:
//!
//! ```text
//! device id:  RDY/BSY POR DAC1 DAC0 EEPROM A2  A1  A0
//! high byte:  VREF    PD1 PD0  GAIN D11    D10 D9  D8
//! low byte:   D7      D6  D5   D4   D3     D2  D1  D0
//! ```
//!
//! The multi-write command takes the same high and low bytes behind a command byte
//! `0 1 0 0 0 DAC1 DAC0 UDAC`.
//!
//! [Datasheet]: https://ww1.microchip.com/downloads/en/DeviceDoc/22187E.pdf

use core::ops::{Index, IndexMut};

use fixed::types::U20F12;
use num_enum::{FromPrimitive, IntoPrimitive};

/// Bytes returned by a status read.
pub const STATUS_LEN: usize = 24;
pub const RECORD_LEN: usize = 3;
pub const CHANNELS: usize = 4;
pub const VALUE_MAX: u16 = 0x0FFF;

const ID_EEPROM: u8 = 0b0000_1000;
const ID_CHANNEL: u8 = 0b0011_0000;
const ID_CHANNEL_SHIFT: u8 = 4;

const HI_VREF: u8 = 0b1000_0000;
const HI_POWER_DOWN: u8 = 0b0110_0000;
const HI_POWER_DOWN_SHIFT: u8 = 5;
const HI_GAIN: u8 = 0b0001_0000;
const HI_VALUE: u8 = 0b0000_1111;

const CMD_MULTI_WRITE: u8 = 0b0100_0000;
const CMD_CHANNEL_SHIFT: u8 = 1;

/// Bytes of a multi-write covering all channels.
pub const MULTI_WRITE_LEN: usize = RECORD_LEN * CHANNELS;

/// Output stage state.  Anything other than [`PowerDown::Normal`] disconnects the output and pulls
/// it to ground through the given resistor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerDown {
    #[num_enum(default)]
    Normal = 0b00,
    Resistor1k = 0b01,
    Resistor100k = 0b10,
    Resistor500k = 0b11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    /// `true` selects the internal 2.048 V reference, `false` uses VDD.
    pub internal_vref: bool,
    /// `true` doubles the output; only effective with the internal reference.
    pub gain: bool,
    pub power_down: PowerDown,
    /// 12-bit output code
    pub value: u16,
}

impl Channel {
    /// State every channel is put into by [`HpLedShield::reset_mode`](crate::HpLedShield::reset_mode).
    pub const BASELINE: Self = Self {
        internal_vref: true,
        gain: false,
        power_down: PowerDown::Normal,
        value: 0,
    };

    /// Output in volts, or `None` when referenced to the (unknown) supply voltage.
    #[must_use]
    pub fn volts(&self) -> Option<U20F12> {
        if !self.internal_vref {
            return None;
        }
        if self.power_down != PowerDown::Normal {
            return Some(U20F12::ZERO);
        }
        let multiplier: u32 = if self.gain { 2 } else { 1 };
        // 2.048 V / 4096 steps
        Some(U20F12::from_num(self.value & VALUE_MAX) * multiplier / 2000)
    }

    fn high_byte(&self) -> u8 {
        let mut hi = (self.value >> 8) as u8 & HI_VALUE;
        hi |= u8::from(self.power_down) << HI_POWER_DOWN_SHIFT;
        if self.internal_vref {
            hi |= HI_VREF;
        }
        if self.gain {
            hi |= HI_GAIN;
        }
        hi
    }

    fn low_byte(&self) -> u8 {
        self.value.to_be_bytes()[1]
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            internal_vref: false,
            gain: false,
            power_down: PowerDown::Normal,
            value: 0,
        }
    }
}

/// One of the four DAC outputs, `A` to `D`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelIndex(u8);

impl ChannelIndex {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const ALL: [Self; CHANNELS] = [Self::A, Self::B, Self::C, Self::D];

    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < CHANNELS as u8 {
            Some(Self(index))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b11)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bank(pub [Channel; CHANNELS]);

impl Bank {
    pub fn iter(&self) -> impl Iterator<Item = (ChannelIndex, &Channel)> {
        ChannelIndex::ALL.into_iter().zip(self.0.iter())
    }
}

impl Index<ChannelIndex> for Bank {
    type Output = Channel;

    fn index(&self, index: ChannelIndex) -> &Channel {
        &self.0[usize::from(index.0)]
    }
}

impl IndexMut<ChannelIndex> for Bank {
    fn index_mut(&mut self, index: ChannelIndex) -> &mut Channel {
        &mut self.0[usize::from(index.0)]
    }
}

/// Volatile DAC registers alongside their EEPROM copies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacState {
    pub live: Bank,
    pub eeprom: Bank,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record {
    pub eeprom: bool,
    pub index: ChannelIndex,
    pub channel: Channel,
}

impl Record {
    #[must_use]
    pub fn decode(record: [u8; RECORD_LEN]) -> Self {
        let [device_id, hi, lo] = record;
        Self {
            eeprom: device_id & ID_EEPROM != 0,
            index: ChannelIndex::from_bits((device_id & ID_CHANNEL) >> ID_CHANNEL_SHIFT),
            channel: Channel {
                internal_vref: hi & HI_VREF != 0,
                gain: hi & HI_GAIN != 0,
                power_down: PowerDown::from((hi & HI_POWER_DOWN) >> HI_POWER_DOWN_SHIFT),
                value: u16::from(hi & HI_VALUE) << 8 | u16::from(lo),
            },
        }
    }
}

/// Applies every record of a status read to the bank it names.
pub fn decode_status(status: &[u8; STATUS_LEN], state: &mut DacState) {
    for chunk in status.chunks_exact(RECORD_LEN) {
        let record = Record::decode([chunk[0], chunk[1], chunk[2]]);
        let bank = if record.eeprom {
            &mut state.eeprom
        } else {
            &mut state.live
        };
        bank[record.index] = record.channel;
    }
}

/// Multi-write frames updating the input registers of all channels at once.
#[must_use]
pub fn encode_multi_write(bank: &Bank) -> [u8; MULTI_WRITE_LEN] {
    let mut data: [u8; MULTI_WRITE_LEN] = [0; MULTI_WRITE_LEN];
    for ((index, channel), frame) in bank.iter().zip(data.chunks_exact_mut(RECORD_LEN)) {
        frame[0] = CMD_MULTI_WRITE | index.get() << CMD_CHANNEL_SHIFT;
        frame[1] = channel.high_byte();
        frame[2] = channel.low_byte();
    }
    data
}
