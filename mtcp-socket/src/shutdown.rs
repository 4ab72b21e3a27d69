//! # Shutdown Token
//!
//! Replaces the process-global "is running" flag of classic signal handling
//! with an owned object: a single owner creates the token, hands clones to
//! the engine and to its worker loops, and anyone holding a clone can
//! request or observe shutdown. Long-running loops built on the event queue
//! must poll [`ShutdownToken::should_run`] after every wait.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle to a shared shutdown flag.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        ShutdownToken::default()
    }

    /// Requests shutdown. Visible to every clone of the token.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// The "keep running" predicate for worker loops.
    pub fn should_run(&self) -> bool {
        !self.is_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_visible_to_clones() {
        let token = ShutdownToken::new();
        let clone = token.clone();
        assert!(token.should_run());
        clone.request();
        assert!(token.is_requested());
        assert!(!token.should_run());
    }
}
