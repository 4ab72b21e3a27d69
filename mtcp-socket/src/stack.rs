//! # Stack Initialization and Execution Contexts
//!
//! ## Purpose
//!
//! This module performs the one-time handshake with the kernel-bypass
//! engine and hands out the per-core execution contexts every socket and
//! event-queue operation is issued through.
//!
//! ## How it works
//!
//! [`Stack::init`] passes the finished [`DpdkConfig`] directly to the
//! engine, which copies the interface table and tuning fields into its
//! native state. On success a [`ShutdownToken`] is created and registered
//! with the engine so its internal polling loops observe shutdown requests.
//! Worker threads then call [`Stack::create_context`], one per core; the
//! returned [`ExecutionContext`] is deliberately neither `Send` nor `Sync`,
//! so every operation bound to it stays on the thread that created it.
//!
//! ## Main components
//!
//! - `Stack`: Owner of the initialized engine handle and the shutdown token.
//! - `ExecutionContext`: Per-core handle, torn down on drop.

use crate::config::DpdkConfig;
use crate::driver::{StackDriver, check};
use crate::shutdown::ShutdownToken;
use std::io;
use std::marker::PhantomData;
use std::sync::Arc;

/// Handle to the initialized kernel-bypass stack.
pub struct Stack {
    driver: Arc<dyn StackDriver>,
    shutdown: ShutdownToken,
}

impl Stack {
    /// Initializes the engine from `cfg` and registers a shutdown token
    /// with it.
    ///
    /// The interface table is latched into the engine's internal state
    /// here; mutating `cfg` afterwards has no effect. Native failure codes
    /// are surfaced verbatim with no added classification.
    ///
    /// The engine supports one initialization per process; calling `init`
    /// twice is a contract violation the engine reports, not this layer.
    pub fn init(driver: Arc<dyn StackDriver>, cfg: &DpdkConfig) -> io::Result<Stack> {
        check(driver.init(cfg))?;
        let shutdown = ShutdownToken::new();
        driver.register_shutdown(&shutdown);
        log::info!(
            "stack initialized: {} interface(s), {} core(s)",
            cfg.configured_interfaces(),
            cfg.num_cores
        );
        Ok(Stack { driver, shutdown })
    }

    /// Returns a clone of the token registered with the engine. Worker
    /// loops must poll it after every wait to implement graceful shutdown.
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Creates the execution context for worker core `core`.
    ///
    /// Must be called on the thread that will run the core's worker loop;
    /// the returned context cannot leave that thread.
    pub fn create_context(&self, core: usize) -> io::Result<ExecutionContext> {
        let ctx = check(self.driver.create_context(core))?;
        log::debug!("created execution context {ctx} on core {core}");
        Ok(ExecutionContext {
            driver: self.driver.clone(),
            ctx,
            core,
            _not_thread_safe: PhantomData,
        })
    }
}

/// One worker core's private handle into the engine.
///
/// All socket and event-queue operations are issued through a context, and
/// a context must only ever be used from the thread that created it. The
/// raw-pointer marker makes the type neither `Send` nor `Sync`, so the
/// compiler rejects cross-thread sharing.
pub struct ExecutionContext {
    pub(crate) driver: Arc<dyn StackDriver>,
    pub(crate) ctx: i32,
    core: usize,
    _not_thread_safe: PhantomData<*const ()>,
}

impl ExecutionContext {
    /// The worker core this context is bound to.
    pub fn core(&self) -> usize {
        self.core
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        let status = self.driver.destroy_context(self.ctx);
        if status < 0 {
            log::error!(
                "failed to destroy context {} on core {}: {}",
                self.ctx,
                self.core,
                io::Error::from_raw_os_error(-status)
            );
        }
    }
}
