pub const DEFAULT_I2C_ADDRESS: u8 = 0x40;

pub const CHANNEL_COUNT: u8 = 16;

/// Internal oscillator, datasheet p. 1
pub const OSCILLATOR_HZ: f64 = 25_000_000.;

/// Resolution of the PWM counter (12 bits)
pub const COUNTER_TICKS: u16 = 4096;

// MODE1
pub const RESTART: u8 = 0b1000_0000;
pub const EXTCLK: u8 = 0b0100_0000;
pub const AI: u8 = 0b0010_0000;
pub const SLEEP: u8 = 0b0001_0000;
pub const ALLCALL: u8 = 0b0000_0001;

// MODE2
pub const INVRT: u8 = 0b0001_0000;
pub const OUTDRV: u8 = 0b0000_0100;

/// Bit 4 of LEDn_ON_H and LEDn_OFF_H
pub const LED_FULL: u8 = 0b0001_0000;

/// Datasheet p. 25, values below 3 are forced to 3
pub const PRESCALE_MIN: u8 = 3;
pub const PRESCALE_MAX: u8 = 255;

/// Value of PRE_SCALE after power on (200 Hz)
pub const PRESCALE_RESET: u8 = 0x1E;
