//! hotplug-netconf - hotplug handler for a Tor access point
//!
//! Invoked by udev or ifupdown when the access-point (wlan0) or tethering
//! (eth1) interface comes or goes. Binds Tor's transparent proxy and DNS
//! listeners to that interface's subnet and cycles hostapd and the DHCP server.

mod config;
mod error;
mod event;
mod handler;
mod lock;
mod logging;
mod system;
mod torrc;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use config::Config;
use event::{Classification, HotplugEvent};
use handler::Handler;
use lock::InstanceLock;
use system::SystemRunner;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logging needs the config, so report load errors after init
    let (config, source, load_error) = match Config::load() {
        Ok((config, source)) => (config, source, None),
        Err(e) => (Config::default(), None, Some(e)),
    };
    logging::init(&config);

    info!("interface event, running hotplug-netconf {}", VERSION);
    if let Some(e) = load_error {
        error!("{}", e);
        return ExitCode::FAILURE;
    }
    if let Some(path) = source {
        info!("using config {}", path.display());
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

async fn run(config: Config) -> Result<()> {
    let event = match HotplugEvent::from_process_env(&config.interfaces) {
        Classification::Relevant(event) => event,
        Classification::NotOurInterface => {
            info!("not our interface");
            return Ok(());
        }
        Classification::UnknownAction => {
            info!("unknown action");
            return Ok(());
        }
    };
    info!("{} {} (subnet {})", event.action, event.interface, event.subnet);

    if !is_root() {
        warn!("not running as root; service and interface changes will likely fail");
    }

    let lock = InstanceLock::acquire_async(&config.lock_path).await?;
    debug!("holding {}", lock.path().display());

    let handler = Handler::new(SystemRunner, config);
    handler
        .handle(&event)
        .await
        .context("Failed to apply proxy configuration")?;

    info!("done");
    drop(lock);
    Ok(())
}
