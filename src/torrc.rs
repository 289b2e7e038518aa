//! Toggling the Tor listener lines for a subnet.
//!
//! The torrc ships with both lines commented out for every subnet:
//!
//! ```text
//! #TransPort 192.168.42.1:9040
//! #DNSPort 192.168.42.1:5353
//! ```
//!
//! Enabling swaps the leading `#` for a space, disabling swaps it back. Only the
//! first exact occurrence of each line is touched; the width of the line never
//! changes.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{NetconfError, Result};
use crate::event::Action;

const ENABLED_PREFIX: &str = " ";
const DISABLED_PREFIX: &str = "#";

/// The Tor configuration file and the ports bound per subnet.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    path: PathBuf,
    trans_port: u16,
    dns_port: u16,
}

impl ProxyConfig {
    pub fn new(path: impl Into<PathBuf>, trans_port: u16, dns_port: u16) -> Self {
        Self {
            path: path.into(),
            trans_port,
            dns_port,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The two managed lines for `subnet`, without prefix.
    pub fn lines(&self, subnet: u8) -> [String; 2] {
        [
            format!("TransPort 192.168.{}.1:{}", subnet, self.trans_port),
            format!("DNSPort 192.168.{}.1:{}", subnet, self.dns_port),
        ]
    }

    /// Return `contents` with the subnet's lines switched for `action`.
    pub fn toggle(&self, contents: &str, subnet: u8, action: Action) -> String {
        let (from, to) = match action {
            Action::Start => (DISABLED_PREFIX, ENABLED_PREFIX),
            Action::Stop => (ENABLED_PREFIX, DISABLED_PREFIX),
        };

        let mut out = contents.to_string();
        for line in self.lines(subnet) {
            out = out.replacen(&format!("{}{}", from, line), &format!("{}{}", to, line), 1);
        }
        out
    }

    /// Rewrite the file in place. Returns whether anything changed.
    pub async fn apply(&self, subnet: u8, action: Action) -> Result<bool> {
        info!("configuring subnet {} as {}", subnet, action);

        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| NetconfError::ProxyConfig {
                    path: self.path.clone(),
                    source: e,
                })?;

        let updated = self.toggle(&contents, subnet, action);
        if updated == contents {
            debug!("{} already in desired state", self.path.display());
            return Ok(false);
        }

        tokio::fs::write(&self.path, updated)
            .await
            .map_err(|e| NetconfError::ProxyConfig {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(true)
    }
}
