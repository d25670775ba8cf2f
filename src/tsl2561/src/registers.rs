//! Register map and command-byte layout of the TSL2561.
//!
//! Every access to a register goes through the command register: the
//! register address is ORed with [`COMMAND_BIT`], and word-sized transfers
//! additionally set [`WORD_BIT`] so the sensor auto-increments across the
//! low/high byte pair.

/// Control register (power state).
pub const REGISTER_CONTROL: u8 = 0x00;
/// Timing register (gain and integration time).
pub const REGISTER_TIMING: u8 = 0x01;
/// Low interrupt threshold, low byte.
pub const REGISTER_THRESHLOWLOW: u8 = 0x02;
/// Low interrupt threshold, high byte.
pub const REGISTER_THRESHLOWHIGH: u8 = 0x03;
/// High interrupt threshold, low byte.
pub const REGISTER_THRESHHIGHLOW: u8 = 0x04;
/// High interrupt threshold, high byte.
pub const REGISTER_THRESHHIGHHIGH: u8 = 0x05;
/// Interrupt control register.
pub const REGISTER_INTERRUPT: u8 = 0x06;
/// Block-read CRC register.
pub const REGISTER_CRC: u8 = 0x08;
/// Part number / revision ID register.
pub const REGISTER_ID: u8 = 0x0A;
/// Broadband channel data, low byte.
pub const REGISTER_CHAN0_LOW: u8 = 0x0C;
/// Broadband channel data, high byte.
pub const REGISTER_CHAN0_HIGH: u8 = 0x0D;
/// Infrared channel data, low byte.
pub const REGISTER_CHAN1_LOW: u8 = 0x0E;
/// Infrared channel data, high byte.
pub const REGISTER_CHAN1_HIGH: u8 = 0x0F;

/// Must be set on every command-register write.
pub const COMMAND_BIT: u8 = 0x80;
/// Clears any pending interrupt.
pub const CLEAR_BIT: u8 = 0x40;
/// Selects a word (two-byte) transfer.
pub const WORD_BIT: u8 = 0x20;
/// Selects a block transfer.
pub const BLOCK_BIT: u8 = 0x10;

/// Control register value powering the oscillator up.
pub const CONTROL_POWERON: u8 = 0x03;
/// Control register value powering the device down.
pub const CONTROL_POWEROFF: u8 = 0x00;
