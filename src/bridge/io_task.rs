//! Async bridge I/O: reactor-timed TCP accept and per-client reads.
//!
//! Runs on the shared [`Executor`](super::Executor). Sockets are
//! non-blocking and polled on `async-io-mini` timers, so a quiet client
//! never stalls a fade:
//!
//! 1. **Accept** polls `accept()` every 50 ms and spawns one client task
//!    per connection, up to [`MAX_CLIENTS`]
//! 2. **Client** polls `read()` every 10 ms, decodes lines and writes
//!    one response line per request
//! 3. **Fade driver** runs inside [`serve`] itself, so requests never
//!    spawn tasks
//!
//! ```text
//!  ┌───────────────────────────────────────────────────────┐
//!  │  edge_executor::LocalExecutor                         │
//!  │                                                       │
//!  │  ┌─────────┐  ┌──────────┐ ┌──────────┐  ┌─────────┐  │
//!  │  │ Accept  │  │ Client 1 │ │ Client N │  │  Fades  │  │
//!  │  │ 50ms ⏱  │  │ 10ms ⏱   │ │ 10ms ⏱   │  │ step ⏱  │  │
//!  │  └─────────┘  └──────────┘ └──────────┘  └─────────┘  │
//!  └───────────────────────────────────────────────────────┘
//! ```

use core::cell::Cell;
use core::time::Duration;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::rc::Rc;

use async_io_mini::Timer;
use futures_lite::future;
use log::{debug, info, warn};

use super::Executor;
use super::accessory::LightAccessory;
use super::protocol::{Decoded, LineDecoder, Response};
use crate::app::ports::{EventSink, LightChannel, StepDelay};

/// Concurrent bridge clients.
pub const MAX_CLIENTS: usize = 4;

const ACCEPT_INTERVAL: Duration = Duration::from_millis(50);
const READ_INTERVAL: Duration = Duration::from_millis(10);
const WRITE_RETRY: Duration = Duration::from_millis(1);
const READ_BUF_SIZE: usize = 256;

// ── Client slots ─────────────────────────────────────────────

/// Holds one of the [`MAX_CLIENTS`] slots until dropped.
struct ClientSlot {
    active: Rc<Cell<usize>>,
}

impl ClientSlot {
    fn claim(active: &Rc<Cell<usize>>) -> Option<Self> {
        if active.get() >= MAX_CLIENTS {
            return None;
        }
        active.set(active.get() + 1);
        Some(Self {
            active: Rc::clone(active),
        })
    }
}

impl Drop for ClientSlot {
    fn drop(&mut self) {
        self.active.set(self.active.get().saturating_sub(1));
    }
}

// ── Accept loop ──────────────────────────────────────────────

/// Serve the line protocol on `listener` and drive the accessory's
/// fades, spawning client sessions onto `executor`. Returns only on a
/// listener setup error.
pub async fn serve<C, D, S>(
    listener: TcpListener,
    accessory: Rc<LightAccessory<C, D, S>>,
    executor: &Executor,
) -> io::Result<()>
where
    C: LightChannel + 'static,
    D: StepDelay + 'static,
    S: EventSink + 'static,
{
    listener.set_nonblocking(true)?;
    info!(
        "Bridge listening on {} ({} max clients)",
        listener.local_addr()?,
        MAX_CLIENTS
    );

    let fades = async {
        accessory.drive_fades().await;
        Ok(())
    };
    future::or(fades, accept_loop(listener, &accessory, executor)).await
}

async fn accept_loop<C, D, S>(
    listener: TcpListener,
    accessory: &Rc<LightAccessory<C, D, S>>,
    executor: &Executor,
) -> io::Result<()>
where
    C: LightChannel + 'static,
    D: StepDelay + 'static,
    S: EventSink + 'static,
{
    let active = Rc::new(Cell::new(0usize));
    loop {
        match listener.accept() {
            Ok((stream, peer)) => accept_client(stream, peer, accessory, executor, &active),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => warn!("Bridge: accept failed: {}", e),
        }
        Timer::after(ACCEPT_INTERVAL).await;
    }
}

fn accept_client<C, D, S>(
    mut stream: TcpStream,
    peer: SocketAddr,
    accessory: &Rc<LightAccessory<C, D, S>>,
    executor: &Executor,
    active: &Rc<Cell<usize>>,
) where
    C: LightChannel + 'static,
    D: StepDelay + 'static,
    S: EventSink + 'static,
{
    let Some(slot) = ClientSlot::claim(active) else {
        warn!("Bridge: rejecting {}, {} clients connected", peer, MAX_CLIENTS);
        let notice = Response::error("too many clients").to_line();
        if let Err(e) = stream.write_all(notice.as_bytes()) {
            debug!("Bridge: reject notice to {} failed: {}", peer, e);
        }
        return;
    };
    if let Err(e) = stream.set_nonblocking(true) {
        warn!("Bridge: cannot configure {}: {}", peer, e);
        return;
    }
    info!("Bridge: client {} connected", peer);
    executor
        .spawn(client_loop(stream, peer, Rc::clone(accessory), slot))
        .detach();
}

// ── Client loop ──────────────────────────────────────────────

async fn client_loop<C, D, S>(
    mut stream: TcpStream,
    peer: SocketAddr,
    accessory: Rc<LightAccessory<C, D, S>>,
    _slot: ClientSlot,
) where
    C: LightChannel + 'static,
    D: StepDelay + 'static,
    S: EventSink + 'static,
{
    let mut decoder = LineDecoder::new();
    let mut read_buf = [0u8; READ_BUF_SIZE];

    loop {
        match stream.read(&mut read_buf) {
            Ok(0) => {
                info!("Bridge: client {} disconnected", peer);
                return;
            }
            Ok(n) => {
                for decoded in decoder.feed(&read_buf[..n]) {
                    let response = match decoded {
                        Decoded::Line(line) => {
                            debug!("Bridge[{}] <- {}", peer, line);
                            accessory.handle_line(&line)
                        }
                        Decoded::TooLong => Response::error("line too long"),
                        Decoded::NotUtf8 => Response::error("invalid UTF-8"),
                    };
                    if let Err(e) = write_line(&mut stream, &response.to_line()).await {
                        warn!("Bridge: write to {} failed, disconnecting: {}", peer, e);
                        return;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Bridge: client {} read error, disconnecting: {}", peer, e);
                return;
            }
        }
        Timer::after(READ_INTERVAL).await;
    }
}

/// Write a whole line on a non-blocking socket.
async fn write_line(stream: &mut TcpStream, line: &str) -> io::Result<()> {
    let mut remaining = line.as_bytes();
    while !remaining.is_empty() {
        match stream.write(remaining) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(n) => remaining = &remaining[n..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                Timer::after(WRITE_RETRY).await;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
