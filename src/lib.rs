//! PWM light library.
//!
//! Exposes the controller, adapters and bridge for the daemon binary
//! and for integration testing. Nothing here assumes real sysfs: the
//! attribute backend is chosen by the caller.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bridge;
pub mod config;
pub mod drivers;
pub mod error;

pub use error::{Error, Result};
