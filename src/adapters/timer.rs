//! Reactor-driven step delay.
//!
//! Implements [`StepDelay`] with `async-io-mini` timers, so a waiting
//! fade parks on the reactor instead of blocking the executor thread.
//! Other bridge callbacks keep running while it sleeps.

use core::future::Future;
use core::time::Duration;

use crate::app::ports::StepDelay;

/// Step delay backed by [`async_io_mini::Timer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReactorDelay;

impl ReactorDelay {
    pub fn new() -> Self {
        Self
    }
}

impl StepDelay for ReactorDelay {
    fn wait(&self, duration: Duration) -> impl Future<Output = ()> {
        async move {
            async_io_mini::Timer::after(duration).await;
        }
    }
}
