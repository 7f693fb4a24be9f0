//! Mock hardware adapters for integration tests.
//!
//! Records every channel call so tests can assert on the full write
//! history without touching sysfs.

use std::cell::RefCell;
use std::future::Future;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use pwmlight::app::controller::{BrightnessController, FadeConfig};
use pwmlight::app::events::LightEvent;
use pwmlight::app::ports::{Attribute, EventSink, LightChannel, StepDelay};
use pwmlight::error::{Error, ReadFailure, Result};

// ── MockChannel ───────────────────────────────────────────────

/// A channel with period 100, so duty equals percent.
pub struct MockChannel {
    pub duty: u64,
    pub enabled: bool,
    /// Every percent the controller tried to write.
    pub attempts: Vec<u8>,
    /// Percents that reached the device.
    pub writes: Vec<u8>,
    pub fail_writes: bool,
    pub fail_reads: bool,
}

pub const MOCK_PERIOD: u64 = 100;

#[allow(dead_code)]
impl MockChannel {
    pub fn at(percent: u8) -> Self {
        Self {
            duty: u64::from(percent),
            enabled: false,
            attempts: Vec::new(),
            writes: Vec::new(),
            fail_writes: false,
            fail_reads: false,
        }
    }
}

impl LightChannel for MockChannel {
    fn enable(&mut self) -> Result<()> {
        self.enabled = true;
        Ok(())
    }

    fn write_duty_cycle(&mut self, percent: u8) -> Result<u64> {
        self.attempts.push(percent);
        let duty = u64::from(percent);
        if self.fail_writes {
            return Err(Error::DeviceWrite {
                duty,
                source: io::Error::other("mock write failure"),
            });
        }
        self.duty = duty;
        self.writes.push(percent);
        Ok(duty)
    }

    fn read_period(&self) -> Result<u64> {
        if self.fail_reads {
            return Err(Error::DeviceRead {
                attribute: Attribute::Period,
                reason: ReadFailure::Io(io::Error::other("mock read failure")),
            });
        }
        Ok(MOCK_PERIOD)
    }

    fn read_duty_cycle(&self) -> Result<u64> {
        if self.fail_reads {
            return Err(Error::DeviceRead {
                attribute: Attribute::DutyCycle,
                reason: ReadFailure::Io(io::Error::other("mock read failure")),
            });
        }
        Ok(self.duty)
    }
}

// ── YieldDelay ────────────────────────────────────────────────

/// Records each requested delay and yields exactly once, so one
/// `poll_once` of a fade performs exactly one step.
#[derive(Clone, Default)]
pub struct YieldDelay {
    pub waits: Rc<RefCell<Vec<Duration>>>,
}

impl StepDelay for YieldDelay {
    fn wait(&self, duration: Duration) -> impl Future<Output = ()> {
        self.waits.borrow_mut().push(duration);
        futures_lite::future::yield_now()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<LightEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&LightEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &LightEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub type MockController = BrightnessController<MockChannel, YieldDelay, RecordingSink>;

pub struct Rig {
    pub controller: Rc<MockController>,
    pub delay: YieldDelay,
    pub sink: RecordingSink,
}

/// Controller over a mock channel currently at `percent`.
pub fn rig(percent: u8) -> Rig {
    let delay = YieldDelay::default();
    let sink = RecordingSink::default();
    let controller = BrightnessController::new(
        MockChannel::at(percent),
        delay.clone(),
        sink.clone(),
        FadeConfig::default(),
    );
    Rig {
        controller,
        delay,
        sink,
    }
}
