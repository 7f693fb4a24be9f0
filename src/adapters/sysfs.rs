//! Linux sysfs PWM attribute backend.
//!
//! Layout of one channel under a PWM chip directory:
//!
//! ```text
//! /sys/class/pwm/pwmchip0/
//! ├── export            (write-only, allocates pwm<N>)
//! └── pwm0/
//!     ├── period
//!     ├── duty_cycle
//!     └── enable
//! ```
//!
//! Every call is one whole-file read or write; the kernel applies a
//! write when the file is written, so nothing is buffered here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::trace;

use crate::app::ports::{Attribute, PwmAttributes};
use crate::config::ChannelConfig;

#[derive(Debug, Clone)]
pub struct SysfsAttributes {
    chip: PathBuf,
    channel_dir: PathBuf,
}

impl SysfsAttributes {
    pub fn new(chip: impl Into<PathBuf>, index: u32) -> Self {
        let chip = chip.into();
        let channel_dir = chip.join(format!("pwm{index}"));
        Self { chip, channel_dir }
    }

    pub fn from_config(config: &ChannelConfig) -> Self {
        Self::new(&config.chip, config.index)
    }

    pub fn chip(&self) -> &Path {
        &self.chip
    }

    /// Absolute path of an attribute file.
    pub fn path(&self, attribute: Attribute) -> PathBuf {
        match attribute {
            Attribute::Export => self.chip.join(attribute.file_name()),
            _ => self.channel_dir.join(attribute.file_name()),
        }
    }
}

impl PwmAttributes for SysfsAttributes {
    fn write(&mut self, attribute: Attribute, value: &str) -> io::Result<()> {
        let path = self.path(attribute);
        trace!("sysfs write {} <- {}", path.display(), value);
        fs::write(path, value)
    }

    fn read(&self, attribute: Attribute) -> io::Result<String> {
        fs::read_to_string(self.path(attribute))
    }
}
