//! Interface address and link control via iproute2.

use std::path::PathBuf;

use tracing::info;

use super::CommandRunner;
use crate::error::Result;

/// Gateway address, broadcast and prefix for `192.168.<subnet>.0/24`.
pub fn subnet_addresses(subnet: u8) -> (String, String) {
    (
        format!("192.168.{}.1/24", subnet),
        format!("192.168.{}.255", subnet),
    )
}

/// Wraps `ip addr` and `ip link` for one binary path.
pub struct IpControl<'a, R> {
    runner: &'a R,
    ip_bin: PathBuf,
}

impl<'a, R: CommandRunner> IpControl<'a, R> {
    pub fn new(runner: &'a R, ip_bin: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            ip_bin: ip_bin.into(),
        }
    }

    /// Assign the subnet's gateway address to `iface`.
    pub async fn add_address(&self, iface: &str, subnet: u8) -> Result<()> {
        let (addr, broadcast) = subnet_addresses(subnet);
        info!("setting {} on {}", addr, iface);
        self.ip(&["addr", "add", &addr, "broadcast", &broadcast, "dev", iface])
            .await
    }

    /// Remove every address from `iface`.
    pub async fn flush(&self, iface: &str) -> Result<()> {
        info!("flushing addresses of {}", iface);
        self.ip(&["addr", "flush", "dev", iface]).await
    }

    pub async fn link_up(&self, iface: &str) -> Result<()> {
        info!("bringing {} up", iface);
        self.ip(&["link", "set", "up", iface]).await
    }

    pub async fn link_down(&self, iface: &str) -> Result<()> {
        info!("bringing {} down", iface);
        self.ip(&["link", "set", "down", iface]).await
    }

    async fn ip(&self, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.runner.run(&self.ip_bin, &args).await.map(|_| ())
    }
}
