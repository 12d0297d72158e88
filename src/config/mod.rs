use std::env;
use std::fmt;
use std::net::IpAddr;

use anyhow::{bail, Result};

use crate::utils::is_valid_hostname;

/// Where and how to reach the device.
#[derive(Clone)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// The values to apply, kept as the operator wrote them. Each step parses
/// the ones it needs when it renders, so a bad value fails that step.
#[derive(Debug, Clone)]
pub struct Settings {
    pub vlan_id: String,
    pub vlan_name: String,
    pub interface: String,
    pub ip_address: String,
    pub ip_subnet: String,
    pub ospf_router: String,
    pub ospf_network: String,
    pub ospf_wildcard: String,
    pub ospf_area: String,
}

/// How the final run report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub device: DeviceEndpoint,
    pub settings: Settings,
    pub dry_run: bool,
    pub report_format: ReportFormat,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            device: DeviceEndpoint {
                host: get("NETCONF_HOST", "192.0.2.1"),
                port: get("NETCONF_PORT", "830").parse().unwrap_or(830),
                username: get("NETCONF_USER", "user_name"),
                password: get("NETCONF_PASSWORD", "$ecret"),
                timeout_secs: get("NETCONF_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            },
            settings: Settings {
                vlan_id: get("VLAN_ID", "164"),
                vlan_name: get("VLAN_NAME", "Vendor VLAN Brown"),
                interface: get("TRUNK_INTERFACE", "Gi1/0/13"),
                ip_address: get("SVI_IP_ADDRESS", "10.3.164.1"),
                ip_subnet: get("SVI_IP_SUBNET", "255.255.255.0"),
                ospf_router: get("OSPF_ROUTER", "38"),
                ospf_network: get("OSPF_NETWORK", "10.3.164.0"),
                ospf_wildcard: get("OSPF_WILDCARD", "0.0.0.255"),
                ospf_area: get("OSPF_AREA", "0"),
            },
            dry_run: parse_bool(&get("DRY_RUN", "false")),
            report_format: match get("REPORT_FORMAT", "text").to_ascii_lowercase().as_str() {
                "json" => ReportFormat::Json,
                _ => ReportFormat::Text,
            },
        }
    }

    /// Reject endpoint settings that cannot possibly open a session.
    pub fn validate(&self) -> Result<()> {
        let device = &self.device;
        if device.host.parse::<IpAddr>().is_err() && !is_valid_hostname(&device.host) {
            bail!("Invalid NETCONF_HOST: {:?}", device.host);
        }
        if device.port == 0 {
            bail!("Invalid NETCONF_PORT: 0");
        }
        if device.username.is_empty() || device.password.is_empty() {
            bail!("No NETCONF credentials configured (NETCONF_USER / NETCONF_PASSWORD)");
        }
        if device.timeout_secs == 0 {
            bail!("NETCONF_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
