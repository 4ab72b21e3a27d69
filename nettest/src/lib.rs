//! # Network Test Support
//!
//! Test environment for the socket/event layer: a simulated kernel-bypass
//! stack that runs entirely in memory, so the layer can be exercised
//! end-to-end without bypass-capable hardware or elevated privileges.

pub mod sim;

pub use sim::SimStack;
