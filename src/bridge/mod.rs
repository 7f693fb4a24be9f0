//! Bridge layer: the accessory surface and the local control endpoint.
//!
//! Everything here runs on one [`Executor`]. Client sessions are its
//! only spawned tasks; the fade driver and the accept loop run inside
//! [`io_task::serve`]. None of them blocks the others.

pub mod accessory;
pub mod io_task;
pub mod protocol;

/// Capacity of the executor's run queue. A task occupies at most one
/// entry, so this bounds concurrent client sessions.
pub const MAX_TASKS: usize = 8;

const _: () = assert!(io_task::MAX_CLIENTS <= MAX_TASKS);

/// The single cooperative executor shared by client tasks.
pub type Executor = edge_executor::LocalExecutor<'static, MAX_TASKS>;
