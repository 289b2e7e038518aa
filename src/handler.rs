//! The reconfiguration sequence run for a relevant event.
//!
//! hostapd is finicky about addresses configured behind its back, so the
//! access-point interface is reset to a bare state and configured manually
//! once hostapd has settled.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::event::{Action, HotplugEvent};
use crate::system::{CommandRunner, IpControl, ServiceControl};
use crate::torrc::ProxyConfig;

pub struct Handler<R> {
    runner: R,
    proxy: ProxyConfig,
    config: Config,
}

impl<R: CommandRunner> Handler<R> {
    pub fn new(runner: R, config: Config) -> Self {
        let proxy = ProxyConfig::new(&config.torrc_path, config.trans_port, config.dns_port);
        Self {
            runner,
            proxy,
            config,
        }
    }

    /// Apply `event`. Only a failure to update the proxy config is returned;
    /// service and interface failures are logged and the sequence continues.
    pub async fn handle(&self, event: &HotplugEvent) -> Result<()> {
        let changed = self.proxy.apply(event.subnet, event.action).await?;
        if changed {
            info!("updated {}", self.proxy.path().display());
        }

        let services = ServiceControl::new(&self.runner, &self.config.service_bin);
        let ip = IpControl::new(&self.runner, &self.config.ip_bin);

        logged(services.stop(&self.config.dhcp_service).await);

        if event.wireless {
            let iface = event.interface.as_str();

            // Reset to unconfigured state
            logged(services.stop(&self.config.ap_service).await);
            logged(ip.link_down(iface).await);
            logged(ip.flush(iface).await);

            if event.action == Action::Start {
                logged(services.start(&self.config.ap_service).await);
                settle(self.config.ap_settle()).await;
                logged(ip.add_address(iface, event.subnet).await);
                logged(ip.link_up(iface).await);
            }
        }

        logged(services.start(&self.config.dhcp_service).await);
        Ok(())
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        info!("waiting {}s for access point to settle", delay.as_secs());
        tokio::time::sleep(delay).await;
    }
}

fn logged(result: Result<()>) {
    if let Err(e) = result {
        warn!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetconfError;
    use crate::system::runner::describe;
    use std::path::Path;
    use std::sync::Mutex;

    const TORRC: &str = "#TransPort 192.168.42.1:9040\n#DNSPort 192.168.42.1:5353\n\
#TransPort 192.168.43.1:9040\n#DNSPort 192.168.43.1:5353\n";

    /// Records command lines; fails any whose line contains `fail_on`.
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl CommandRunner for RecordingRunner {
        async fn run(&self, program: &Path, args: &[String]) -> Result<String> {
            let line = describe(program, args);
            self.calls.lock().unwrap().push(line.clone());
            match self.fail_on {
                Some(pattern) if line.contains(pattern) => Err(NetconfError::CommandFailed {
                    command: line,
                    message: "exit status: 1".to_string(),
                }),
                _ => Ok(String::new()),
            }
        }
    }

    fn setup(runner: RecordingRunner) -> (tempfile::TempDir, Handler<RecordingRunner>) {
        let dir = tempfile::tempdir().unwrap();
        let torrc = dir.path().join("torrc");
        std::fs::write(&torrc, TORRC).unwrap();
        let config = Config {
            torrc_path: torrc,
            service_bin: "service".into(),
            ip_bin: "ip".into(),
            ap_settle_secs: 0,
            ..Config::default()
        };
        (dir, Handler::new(runner, config))
    }

    fn event(interface: &str, subnet: u8, wireless: bool, action: Action) -> HotplugEvent {
        HotplugEvent {
            interface: interface.to_string(),
            subnet,
            wireless,
            action,
        }
    }

    fn calls(handler: &Handler<RecordingRunner>) -> Vec<String> {
        handler.runner.calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_wireless_start_sequence() {
        let (dir, handler) = setup(RecordingRunner::default());
        handler
            .handle(&event("wlan0", 42, true, Action::Start))
            .await
            .unwrap();

        assert_eq!(
            calls(&handler),
            vec![
                "service isc-dhcp-server stop",
                "service hostapd stop",
                "ip link set down wlan0",
                "ip addr flush dev wlan0",
                "service hostapd start",
                "ip addr add 192.168.42.1/24 broadcast 192.168.42.255 dev wlan0",
                "ip link set up wlan0",
                "service isc-dhcp-server start",
            ]
        );
        let torrc = std::fs::read_to_string(dir.path().join("torrc")).unwrap();
        assert!(torrc.starts_with(" TransPort 192.168.42.1:9040\n DNSPort 192.168.42.1:5353\n#"));
    }

    #[tokio::test]
    async fn test_wireless_stop_leaves_interface_bare() {
        let (_dir, handler) = setup(RecordingRunner::default());
        handler
            .handle(&event("wlan0", 42, true, Action::Stop))
            .await
            .unwrap();

        assert_eq!(
            calls(&handler),
            vec![
                "service isc-dhcp-server stop",
                "service hostapd stop",
                "ip link set down wlan0",
                "ip addr flush dev wlan0",
                "service isc-dhcp-server start",
            ]
        );
    }

    #[tokio::test]
    async fn test_wired_only_cycles_dhcp() {
        let (dir, handler) = setup(RecordingRunner::default());
        handler
            .handle(&event("eth1", 43, false, Action::Start))
            .await
            .unwrap();

        assert_eq!(
            calls(&handler),
            vec!["service isc-dhcp-server stop", "service isc-dhcp-server start"]
        );
        let torrc = std::fs::read_to_string(dir.path().join("torrc")).unwrap();
        assert!(torrc.contains("\n TransPort 192.168.43.1:9040\n DNSPort 192.168.43.1:5353\n"));
        assert!(torrc.starts_with("#TransPort 192.168.42.1:9040"));
    }

    #[tokio::test]
    async fn test_command_failures_do_not_abort() {
        let (_dir, handler) = setup(RecordingRunner {
            fail_on: Some("ip "),
            ..RecordingRunner::default()
        });
        handler
            .handle(&event("wlan0", 42, true, Action::Start))
            .await
            .unwrap();

        let calls = calls(&handler);
        assert_eq!(calls.len(), 8);
        assert_eq!(calls.last().unwrap(), "service isc-dhcp-server start");
    }

    #[tokio::test]
    async fn test_proxy_failure_runs_no_commands() {
        let (dir, handler) = setup(RecordingRunner::default());
        std::fs::remove_file(dir.path().join("torrc")).unwrap();

        let err = handler
            .handle(&event("wlan0", 42, true, Action::Start))
            .await
            .unwrap_err();
        assert!(matches!(err, NetconfError::ProxyConfig { .. }));
        assert!(calls(&handler).is_empty());
    }
}
