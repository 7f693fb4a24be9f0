//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements    | Connects to                 |
//! |------------|---------------|-----------------------------|
//! | `sysfs`    | PwmAttributes | `/sys/class/pwm` files      |
//! | `memory`   | PwmAttributes | In-memory simulation        |
//! | `timer`    | StepDelay     | `async-io-mini` reactor     |
//! | `log_sink` | EventSink     | `log` facade                |

pub mod log_sink;
pub mod memory;
pub mod sysfs;
pub mod timer;
