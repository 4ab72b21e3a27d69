//! # Stack and Interface Configuration
//!
//! ## Purpose
//!
//! This module builds the per-process configuration consumed by the stack
//! initializer: one slot per bypass-capable network interface plus the
//! stack-wide tuning defaults the userspace TCP engine requires.
//!
//! ## How it works
//!
//! `DpdkConfig::new()` allocates a zero-filled interface table and populates
//! the engine's default tuning values. Interfaces are then assigned with
//! `configure_interface`, which converts the addresses from their wire form
//! into host byte order before storing them, together with the id of the
//! underlying poll-mode NIC device. The configuration is handed to
//! `Stack::init` exactly once; the interface table is latched into the
//! engine's internal state at that point and later mutation has no effect.
//!
//! ## Main components
//!
//! - `DpdkConfig`: The owning configuration record.
//! - `InterfaceConfig`: One interface slot (address, netmask, device id).
//! - `MAX_INTERFACES`: Capacity of the engine's interface table.

use std::io;
use std::net::Ipv4Addr;

/// Capacity of the stack's interface table.
pub const MAX_INTERFACES: usize = 16;

/// One slot of the interface table.
///
/// Addresses are stored in host byte order, as the engine's interface table
/// expects them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub ip_addr: u32,
    pub netmask: u32,
    /// Id of the poll-mode NIC device bound to this interface.
    pub device_id: u8,
}

impl InterfaceConfig {
    /// Returns `true` if this slot has never been assigned.
    pub fn is_unset(&self) -> bool {
        self.ip_addr == 0
    }
}

/// Per-process configuration of the kernel-bypass stack.
///
/// Created with defaults, mutated during the configuration phase, then
/// consumed read-only by [`crate::Stack::init`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpdkConfig {
    pub interfaces: [InterfaceConfig; MAX_INTERFACES],
    /// Number of worker cores the engine runs its per-core contexts on.
    pub num_cores: usize,
    /// Per-core cap on concurrent connections.
    pub max_concurrency: u32,
    /// Per-core cap on packet buffers.
    pub max_num_buffers: u32,
    pub rcvbuf_size: u32,
    pub sndbuf_size: u32,
    pub tcp_timeout_s: u32,
    pub tcp_timewait_s: u32,
}

impl Default for DpdkConfig {
    fn default() -> Self {
        DpdkConfig::new()
    }
}

impl DpdkConfig {
    /// Creates a configuration with an empty interface table and the
    /// engine's stack-wide tuning defaults.
    pub fn new() -> Self {
        DpdkConfig {
            interfaces: [InterfaceConfig::default(); MAX_INTERFACES],
            num_cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            max_concurrency: 10_000,
            max_num_buffers: 10_000,
            rcvbuf_size: 8192,
            sndbuf_size: 8192,
            tcp_timeout_s: 30,
            tcp_timewait_s: 0,
        }
    }

    /// Assigns the interface slot at `index`.
    ///
    /// The addresses are converted from their network-byte-order wire form
    /// into host byte order at assignment time. No well-formedness check is
    /// performed on the addresses themselves; the slot index is bounds
    /// checked against [`MAX_INTERFACES`].
    ///
    /// # Arguments
    /// * `index` - Caller-assigned slot in the engine's interface table.
    /// * `ip` - Interface address.
    /// * `netmask` - Interface netmask.
    /// * `device_id` - Id of the underlying poll-mode NIC device.
    pub fn configure_interface(
        &mut self,
        index: usize,
        ip: Ipv4Addr,
        netmask: Ipv4Addr,
        device_id: u8,
    ) -> io::Result<()> {
        let Some(slot) = self.interfaces.get_mut(index) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("interface index {index} exceeds table capacity {MAX_INTERFACES}"),
            ));
        };
        slot.ip_addr = u32::from_be_bytes(ip.octets());
        slot.netmask = u32::from_be_bytes(netmask.octets());
        slot.device_id = device_id;
        Ok(())
    }

    /// Number of interface slots that have been assigned.
    pub fn configured_interfaces(&self) -> usize {
        self.interfaces.iter().filter(|i| !i.is_unset()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_addresses_in_host_byte_order() {
        let mut cfg = DpdkConfig::new();
        cfg.configure_interface(
            0,
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(255, 255, 255, 0),
            3,
        )
        .unwrap();
        assert_eq!(cfg.interfaces[0].ip_addr, 0x0A00_0002);
        assert_eq!(cfg.interfaces[0].netmask, 0xFFFF_FF00);
        assert_eq!(cfg.interfaces[0].device_id, 3);
        // host-order value equals the byte-swapped wire form
        let wire = u32::from_ne_bytes(Ipv4Addr::new(10, 0, 0, 2).octets());
        assert_eq!(cfg.interfaces[0].ip_addr, u32::from_be(wire));
    }

    #[test]
    fn last_slot_is_reachable() {
        let mut cfg = DpdkConfig::new();
        cfg.configure_interface(
            MAX_INTERFACES - 1,
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::new(255, 255, 0, 0),
            0,
        )
        .unwrap();
        assert_eq!(cfg.configured_interfaces(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut cfg = DpdkConfig::new();
        let err = cfg
            .configure_interface(
                MAX_INTERFACES,
                Ipv4Addr::new(10, 0, 0, 2),
                Ipv4Addr::new(255, 255, 255, 0),
                0,
            )
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn defaults_are_populated() {
        let cfg = DpdkConfig::new();
        assert!(cfg.num_cores >= 1);
        assert_eq!(cfg.max_concurrency, 10_000);
        assert_eq!(cfg.rcvbuf_size, 8192);
        assert_eq!(cfg.configured_interfaces(), 0);
    }
}
