//! Application core: brightness domain logic with no direct I/O.
//!
//! This module contains the fade algorithm and the controller that owns
//! the target brightness. All interaction with the PWM device happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real hardware.

pub mod commands;
pub mod controller;
pub mod events;
pub mod fade;
pub mod ports;
