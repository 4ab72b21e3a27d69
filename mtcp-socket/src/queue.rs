//! # Event Queue
//!
//! ## Purpose
//!
//! This module multiplexes readiness notifications across many sockets of
//! one execution context, analogous to a classic level-triggered readiness
//! demultiplexer. A worker loop alternates between waiting on the queue and
//! issuing socket operations on whatever became ready.
//!
//! ## How it works
//!
//! Creating a queue opens one readiness descriptor scoped to the context
//! and allocates a fixed-capacity buffer of event records; the capacity
//! bounds the worst-case batch a single wait can return and cannot grow
//! afterwards. Sockets are registered with an interest bitmask, and `wait`
//! blocks the calling worker until at least one registered socket is ready
//! or the timeout elapses, then returns exactly the filled prefix of the
//! buffer as a slice. Dropping the queue closes the descriptor again, so
//! creation and destruction are symmetric.
//!
//! A queue borrows its execution context: it cannot outlive the context,
//! and its operations cannot be issued through any other context.
//!
//! ## Main components
//!
//! - `EventQueue`: Descriptor plus event buffer, one per context in
//!   typical use.
//! - `wait`: The only suspending operation in this crate.

use crate::driver::{Event, check};
use crate::stack::ExecutionContext;
use std::io;
use std::time::Duration;

/// Readiness demultiplexer scoped to one [`ExecutionContext`].
pub struct EventQueue<'ctx> {
    ctx: &'ctx ExecutionContext,
    ep: i32,
    events: Vec<Event>,
}

impl<'ctx> EventQueue<'ctx> {
    /// Opens a readiness descriptor on `ctx` with room for batches of up
    /// to `maxevents` records.
    ///
    /// `maxevents` must be positive; the capacity is fixed for the
    /// lifetime of the queue.
    pub fn new(ctx: &'ctx ExecutionContext, maxevents: usize) -> io::Result<EventQueue<'ctx>> {
        if maxevents == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "event queue capacity must be positive",
            ));
        }
        let ep = check(ctx.driver.epoll_create(ctx.ctx, maxevents))?;
        log::debug!("opened event descriptor {ep} on core {}", ctx.core());
        Ok(EventQueue {
            ctx,
            ep,
            events: vec![Event::default(); maxevents],
        })
    }

    /// Maximum number of records a single `wait` can return.
    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    /// Registers `sockid` for interest in the conditions of `events`
    /// (a bitmask of [`EV_IN`](crate::EV_IN), [`EV_OUT`](crate::EV_OUT),
    /// ...). Registering a socket that is already present on this queue's
    /// descriptor fails with the engine's duplicate-registration code.
    pub fn add_socket(&self, sockid: i32, events: u32) -> io::Result<()> {
        check(self.ctx.driver.epoll_add(self.ctx.ctx, self.ep, sockid, events))?;
        Ok(())
    }

    /// Removes the registration of `sockid`. Fails with the engine's
    /// not-registered code if the socket is absent.
    pub fn remove_socket(&self, sockid: i32) -> io::Result<()> {
        check(self.ctx.driver.epoll_del(self.ctx.ctx, self.ep, sockid))?;
        Ok(())
    }

    /// Blocks the calling worker until at least one registered socket is
    /// ready or the timeout elapses, and returns the batch of readiness
    /// records.
    ///
    /// `Some(Duration::ZERO)` polls without blocking, `None` blocks
    /// indefinitely. A timeout yields an empty batch. Records in one batch
    /// carry no defined relative order and no fairness guarantee across
    /// sockets.
    ///
    /// A process-wide shutdown request observed by the engine makes a
    /// pending wait return early with an empty or short batch; loops must
    /// re-check their [`ShutdownToken`](crate::ShutdownToken) after every
    /// wait.
    pub fn wait(&mut self, timeout: Option<Duration>) -> io::Result<&[Event]> {
        let timeout_ms = timeout_to_ms(timeout);
        let n = check(
            self.ctx
                .driver
                .epoll_wait(self.ctx.ctx, self.ep, &mut self.events, timeout_ms),
        )? as usize;
        debug_assert!(n <= self.events.len());
        Ok(&self.events[..n.min(self.events.len())])
    }
}

impl Drop for EventQueue<'_> {
    fn drop(&mut self) {
        let status = self.ctx.driver.epoll_close(self.ctx.ctx, self.ep);
        if status < 0 {
            log::error!(
                "failed to close event descriptor {}: {}",
                self.ep,
                io::Error::from_raw_os_error(-status)
            );
        }
    }
}

/// Maps the timeout onto the engine's millisecond convention: 0 polls,
/// negative blocks indefinitely.
fn timeout_to_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(d) => d.as_millis().min(i32::MAX as u128) as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_mapping_follows_engine_convention() {
        assert_eq!(timeout_to_ms(None), -1);
        assert_eq!(timeout_to_ms(Some(Duration::ZERO)), 0);
        assert_eq!(timeout_to_ms(Some(Duration::from_millis(1500))), 1500);
        assert_eq!(timeout_to_ms(Some(Duration::from_secs(1u64 << 40))), i32::MAX);
    }
}
