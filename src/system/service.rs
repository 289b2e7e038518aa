//! Service control through the SysV `service` wrapper.

use std::path::PathBuf;

use tracing::info;

use super::CommandRunner;
use crate::error::Result;

/// Starts and stops services (hostapd, isc-dhcp-server) via `service NAME VERB`.
pub struct ServiceControl<'a, R> {
    runner: &'a R,
    service_bin: PathBuf,
}

impl<'a, R: CommandRunner> ServiceControl<'a, R> {
    pub fn new(runner: &'a R, service_bin: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            service_bin: service_bin.into(),
        }
    }

    pub async fn start(&self, service: &str) -> Result<()> {
        info!("starting {}", service);
        self.invoke(service, "start").await
    }

    pub async fn stop(&self, service: &str) -> Result<()> {
        info!("stopping {}", service);
        self.invoke(service, "stop").await
    }

    async fn invoke(&self, service: &str, verb: &str) -> Result<()> {
        self.runner
            .run(&self.service_bin, &[service.to_string(), verb.to_string()])
            .await
            .map(|_| ())
    }
}
