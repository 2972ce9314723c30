pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const SUBADR1: u8 = 0x02;
pub const SUBADR2: u8 = 0x03;
pub const SUBADR3: u8 = 0x04;
pub const ALLCALLADR: u8 = 0x05;

/// First of the four registers of channel 0. Each channel spans `LED_STRIDE` registers:
/// ON_L, ON_H, OFF_L, OFF_H.
pub const LED0_ON_L: u8 = 0x06;
pub const LED_STRIDE: u8 = 4;

pub const ALL_LED_ON_L: u8 = 0xFA;
pub const ALL_LED_ON_H: u8 = 0xFB;
pub const ALL_LED_OFF_L: u8 = 0xFC;
pub const ALL_LED_OFF_H: u8 = 0xFD;
pub const PRE_SCALE: u8 = 0xFE;
