// Public modules and re-exports
pub mod config;
pub mod driver;
pub mod queue;
pub mod shutdown;
pub mod socket;
pub mod stack;

pub use config::{DpdkConfig, InterfaceConfig, MAX_INTERFACES};
pub use driver::{EV_ERR, EV_HUP, EV_IN, EV_OUT, Event, StackDriver};
pub use queue::EventQueue;
pub use shutdown::ShutdownToken;
pub use socket::{connect_ipv4, create_tcp_socket};
pub use stack::{ExecutionContext, Stack};
