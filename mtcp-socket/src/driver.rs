//
// driver.rs - Native Stack Seam
//
// Purpose:
//   This module defines the boundary between the socket/event layer and the
//   kernel-bypass TCP engine underneath it. The engine (a run-to-completion,
//   per-core polling stack driven by a poll-mode packet-I/O framework) is
//   opaque to this crate and is consumed exclusively through the StackDriver
//   trait.
//
// How it works:
//   - StackDriver mirrors the engine's native entry points one-to-one:
//     init-with-configuration, per-core context management, TCP socket
//     creation, IPv4 connect, and the epoll-like readiness descriptor
//     operations.
//   - All driver methods use the engine's status convention: a non-negative
//     value is success (and often an id), a negative value is a native error
//     code with errno magnitude. The layer never interprets these codes, it
//     converts them verbatim into io::Error.
//   - Event is the wire-compatible record the engine fills on wait.
//

use crate::config::DpdkConfig;
use crate::shutdown::ShutdownToken;
use static_assertions::const_assert_eq;
use std::io;

/// Socket is ready for reading.
pub const EV_IN: u32 = 0x001;
/// Socket is ready for writing.
pub const EV_OUT: u32 = 0x004;
/// An error condition is pending on the socket.
pub const EV_ERR: u32 = 0x008;
/// The peer closed the connection.
pub const EV_HUP: u32 = 0x010;

/// One readiness record as filled by the engine's descriptor.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Event {
    pub events: u32,
    pub sockid: i32,
}

// layout must match the engine's native event record
const_assert_eq!(size_of::<Event>(), 8);

impl Event {
    pub fn new(sockid: i32, events: u32) -> Self {
        Event { events, sockid }
    }

    pub fn readable(&self) -> bool {
        self.events & EV_IN != 0
    }

    pub fn writable(&self) -> bool {
        self.events & EV_OUT != 0
    }

    pub fn error(&self) -> bool {
        self.events & EV_ERR != 0
    }

    pub fn hangup(&self) -> bool {
        self.events & EV_HUP != 0
    }
}

/// The engine's native entry points.
///
/// Implementations front a real engine (linked into the embedding
/// application) or a simulated one for tests. Every method uses the native
/// status convention: non-negative on success, negative errno-magnitude code
/// on failure. Implementations must be callable from any worker thread; the
/// per-context threading discipline is enforced above this seam.
pub trait StackDriver: Send + Sync {
    /// Latches the interface table and tuning fields of `cfg` and starts
    /// the engine's per-core machinery. Called once per process.
    fn init(&self, cfg: &DpdkConfig) -> i32;

    /// Makes the engine's polling loops observe shutdown requests on
    /// `token`, typically by returning early from a pending wait.
    fn register_shutdown(&self, token: &ShutdownToken);

    /// Creates the execution context bound to worker core `core` and
    /// returns its id.
    fn create_context(&self, core: usize) -> i32;

    /// Tears down a context previously returned by `create_context`.
    fn destroy_context(&self, ctx: i32) -> i32;

    /// Creates a TCP endpoint scoped to `ctx` and returns its socket id.
    fn tcp_socket(&self, ctx: i32) -> i32;

    /// Starts an outbound connection of `sockid` to `addr`. Whether the
    /// call blocks is inherited from the socket's prior configuration.
    fn connect(&self, ctx: i32, sockid: i32, addr: libc::sockaddr_in) -> i32;

    /// Opens a readiness descriptor scoped to `ctx`, sized for batches of
    /// up to `maxevents` records, and returns its id.
    fn epoll_create(&self, ctx: i32, maxevents: usize) -> i32;

    /// Registers `sockid` on descriptor `ep` for the conditions in
    /// `events`. Registering the same socket twice fails.
    fn epoll_add(&self, ctx: i32, ep: i32, sockid: i32, events: u32) -> i32;

    /// Removes the registration of `sockid` from descriptor `ep`.
    fn epoll_del(&self, ctx: i32, ep: i32, sockid: i32) -> i32;

    /// Blocks up to `timeout_ms` milliseconds (0 polls, negative blocks
    /// indefinitely) until a registered socket is ready, fills `events`
    /// from the front and returns the number of filled records.
    fn epoll_wait(&self, ctx: i32, ep: i32, events: &mut [Event], timeout_ms: i32) -> i32;

    /// Closes a descriptor previously returned by `epoll_create`.
    fn epoll_close(&self, ctx: i32, ep: i32) -> i32;
}

/// Converts a native status into an `io::Result`, surfacing negative codes
/// verbatim as raw OS errors.
pub fn check(status: i32) -> io::Result<i32> {
    if status < 0 {
        Err(io::Error::from_raw_os_error(-status))
    } else {
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_predicates_match_bits() {
        let ev = Event::new(7, EV_IN | EV_OUT);
        assert!(ev.readable());
        assert!(ev.writable());
        assert!(!ev.error());
        assert!(!ev.hangup());
        assert_eq!(ev.sockid, 7);
    }

    #[test]
    fn check_passes_ids_through() {
        assert_eq!(check(0).unwrap(), 0);
        assert_eq!(check(42).unwrap(), 42);
    }

    #[test]
    fn check_surfaces_native_codes_verbatim() {
        let err = check(-libc::ECONNREFUSED).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ECONNREFUSED));
    }
}
