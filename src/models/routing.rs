use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::InterfaceRef;

/// Parse a dotted-quad IPv4 address, reporting failures against `param`.
pub fn parse_ipv4(param: &'static str, value: &str) -> Result<Ipv4Addr> {
    value
        .trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| Error::invalid(param, value, "not a dotted-quad IPv4 address"))
}

/// A contiguous, non-zero IPv4 subnet mask (`255.255.255.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Netmask(Ipv4Addr);

impl Netmask {
    pub fn new(mask: Ipv4Addr) -> Result<Self> {
        let bits = u32::from(mask);
        // contiguous ones from the top: inverting gives 0..01..1
        if bits == 0 || (!bits).wrapping_add(1) & !bits != 0 {
            return Err(Error::invalid(
                "subnet mask",
                &mask.to_string(),
                "not a contiguous netmask",
            ));
        }
        Ok(Self(mask))
    }
}

impl FromStr for Netmask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(parse_ipv4("subnet mask", s)?)
    }
}

impl fmt::Display for Netmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary IPv4 address for an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Assignment {
    pub interface: InterfaceRef,
    pub address: Ipv4Addr,
    pub mask: Netmask,
}

impl Ipv4Assignment {
    pub fn new(interface: InterfaceRef, address: Ipv4Addr, mask: Netmask) -> Result<Self> {
        if address.is_unspecified() || address.is_broadcast() || address.is_multicast() {
            return Err(Error::invalid(
                "ip address",
                &address.to_string(),
                "not a usable host address",
            ));
        }
        Ok(Self {
            interface,
            address,
            mask,
        })
    }
}

/// OSPF process id, 1-65535.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OspfProcessId(u16);

impl FromStr for OspfProcessId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().parse::<u16>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(Error::invalid("ospf router id", s, "must be between 1 and 65535")),
        }
    }
}

impl fmt::Display for OspfProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OSPF area, written either as a decimal id or in dotted-quad form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OspfArea {
    Id(u32),
    Dotted(Ipv4Addr),
}

impl FromStr for OspfArea {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s_trim = s.trim();
        if let Ok(id) = s_trim.parse::<u32>() {
            return Ok(OspfArea::Id(id));
        }
        s_trim
            .parse::<Ipv4Addr>()
            .map(OspfArea::Dotted)
            .map_err(|_| Error::invalid("ospf area", s, "expected a number or dotted-quad"))
    }
}

impl fmt::Display for OspfArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OspfArea::Id(id) => write!(f, "{}", id),
            OspfArea::Dotted(addr) => write!(f, "{}", addr),
        }
    }
}

/// A `network <ip> <wildcard> area <area>` statement under an OSPF process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspfNetworkEntry {
    pub process: OspfProcessId,
    pub network: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub area: OspfArea,
}
