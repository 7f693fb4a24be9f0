//! In-memory PWM attribute backend.
//!
//! Mirrors the sysfs behaviour closely enough for host-side runs and
//! tests: values read back with a trailing newline, `export` is
//! write-only, and exporting an already-exported channel fails with
//! `EBUSY`. Individual attributes can be told to fail.

use std::collections::{HashMap, HashSet};
use std::io;

use crate::app::ports::{Attribute, PwmAttributes};

/// Linux `EBUSY`, returned by the kernel for a repeated export.
const EBUSY: i32 = 16;

#[derive(Debug, Default)]
pub struct MemoryAttributes {
    values: HashMap<Attribute, String>,
    exported: bool,
    failing_writes: HashSet<Attribute>,
    failing_reads: HashSet<Attribute>,
    writes: Vec<(Attribute, String)>,
}

impl MemoryAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel some earlier process already exported.
    pub fn exported() -> Self {
        Self {
            exported: true,
            ..Self::default()
        }
    }

    pub fn fail_writes(&mut self, attribute: Attribute) {
        self.failing_writes.insert(attribute);
    }

    pub fn fail_reads(&mut self, attribute: Attribute) {
        self.failing_reads.insert(attribute);
    }

    /// Clear every injected failure.
    pub fn heal(&mut self) {
        self.failing_writes.clear();
        self.failing_reads.clear();
    }

    /// Overwrite an attribute without recording a write.
    pub fn set(&mut self, attribute: Attribute, value: &str) {
        self.values.insert(attribute, value.to_owned());
    }

    pub fn value(&self, attribute: Attribute) -> Option<&str> {
        self.values.get(&attribute).map(String::as_str)
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> &[(Attribute, String)] {
        &self.writes
    }

    /// Successful duty-cycle writes as numbers.
    pub fn duty_writes(&self) -> Vec<u64> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == Attribute::DutyCycle)
            .filter_map(|(_, v)| v.parse().ok())
            .collect()
    }
}

impl PwmAttributes for MemoryAttributes {
    fn write(&mut self, attribute: Attribute, value: &str) -> io::Result<()> {
        if self.failing_writes.contains(&attribute) {
            return Err(io::Error::other(format!("simulated {attribute} write failure")));
        }
        if attribute == Attribute::Export {
            if self.exported {
                return Err(io::Error::from_raw_os_error(EBUSY));
            }
            self.exported = true;
        }
        self.values.insert(attribute, value.to_owned());
        self.writes.push((attribute, value.to_owned()));
        Ok(())
    }

    fn read(&self, attribute: Attribute) -> io::Result<String> {
        if attribute == Attribute::Export {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        if self.failing_reads.contains(&attribute) {
            return Err(io::Error::other(format!("simulated {attribute} read failure")));
        }
        self.values
            .get(&attribute)
            .map(|v| format!("{v}\n"))
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}
