//! # TCP Socket Creation and Connect
//!
//! Socket handles are small integers scoped to one execution context; there
//! is no wrapper object. A handle is created here, registered with an event
//! queue for readiness, and implicitly invalidated when the engine closes
//! or resets the connection.

use crate::driver::check;
use crate::stack::ExecutionContext;
use std::io;
use std::net::Ipv4Addr;

/// Creates a TCP endpoint scoped to `ctx` and returns its socket id.
pub fn create_tcp_socket(ctx: &ExecutionContext) -> io::Result<i32> {
    let sockid = check(ctx.driver.tcp_socket(ctx.ctx))?;
    log::debug!("created tcp socket {sockid} on core {}", ctx.core());
    Ok(sockid)
}

/// Starts an outbound IPv4 connection and returns `sockid` on success, so
/// creation and connect chain in one expression:
///
/// ```ignore
/// let sock = connect_ipv4(&ctx, create_tcp_socket(&ctx)?, peer, 8080)?;
/// ```
///
/// The address and port are converted to network byte order internally;
/// callers must not pre-convert. Whether the call blocks until the
/// handshake completes is inherited from the socket's prior configuration.
pub fn connect_ipv4(
    ctx: &ExecutionContext,
    sockid: i32,
    ip: Ipv4Addr,
    port: u16,
) -> io::Result<i32> {
    let addr = libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: port.to_be(),
        sin_addr: libc::in_addr {
            s_addr: u32::from_be_bytes(ip.octets()).to_be(),
        },
        sin_zero: [0; 8],
    };
    check(ctx.driver.connect(ctx.ctx, sockid, addr))?;
    Ok(sockid)
}
