//! Output drivers.

pub mod pwm;
