//! Classification of hotplug events from the environment.
//!
//! ifupdown hooks export `IFACE` and `MODE` (`start`/`stop`); udev exports
//! `INTERFACE` and `ACTION` (`add`/`remove`). Each configured interface is
//! bound to the variable its event source uses, so the wired tether is only
//! recognised from ifupdown and the access point only from udev. The udev
//! variables win when both match.

use std::fmt;

use crate::config::InterfaceConfig;

/// Interface variables in precedence order (later wins).
pub const INTERFACE_VARS: [&str; 2] = ["IFACE", "INTERFACE"];

/// Whether the interface is coming up or going away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start => f.write_str("start"),
            Action::Stop => f.write_str("stop"),
        }
    }
}

/// A relevant event on one of the configured interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotplugEvent {
    pub interface: String,
    pub subnet: u8,
    pub wireless: bool,
    pub action: Action,
}

/// Outcome of inspecting the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Relevant(HotplugEvent),
    NotOurInterface,
    UnknownAction,
}

impl HotplugEvent {
    /// Classify an event using `lookup` to read variables.
    pub fn from_env<F>(lookup: F, interfaces: &[InterfaceConfig]) -> Classification
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut matched: Option<&InterfaceConfig> = None;
        for var in INTERFACE_VARS {
            if let Some(value) = lookup(var) {
                if let Some(iface) = interfaces
                    .iter()
                    .find(|i| i.env_var == var && i.name == value)
                {
                    matched = Some(iface);
                }
            }
        }
        let Some(iface) = matched else {
            return Classification::NotOurInterface;
        };

        let mut action = None;
        if let Some(mode) = lookup("MODE") {
            match mode.as_str() {
                "start" => action = Some(Action::Start),
                "stop" => action = Some(Action::Stop),
                _ => {}
            }
        }
        if let Some(udev) = lookup("ACTION") {
            match udev.as_str() {
                "add" => action = Some(Action::Start),
                "remove" => action = Some(Action::Stop),
                _ => {}
            }
        }
        let Some(action) = action else {
            return Classification::UnknownAction;
        };

        Classification::Relevant(HotplugEvent {
            interface: iface.name.clone(),
            subnet: iface.subnet,
            wireless: iface.wireless,
            action,
        })
    }

    /// Classify using the process environment.
    pub fn from_process_env(interfaces: &[InterfaceConfig]) -> Classification {
        Self::from_env(|name| std::env::var(name).ok(), interfaces)
    }
}
