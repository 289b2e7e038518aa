//! External tools: service control and iproute2.

pub mod ip;
pub mod runner;
pub mod service;

pub use ip::IpControl;
pub use runner::{CommandRunner, SystemRunner};
pub use service::ServiceControl;
