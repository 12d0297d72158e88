use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::{Error, Result};

/// A non-digit type prefix followed by a digit-leading location path
/// (`Gi` + `1/0/13`, `Vlan` + `19`, `Po` + `10.100`).
static IFNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\d]+)(\d[\d/.]*)$").expect("interface name pattern is a valid regex")
});

/// Interface containers of the IOS-XE native model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    FastEthernet,
    GigabitEthernet,
    FiveGigabitEthernet,
    PortChannel,
    TenGigabitEthernet,
    TwentyFiveGigE,
    FortyGigabitEthernet,
    TwoGigabitEthernet,
    HundredGigE,
    Vlan,
}

impl InterfaceType {
    /// Resolution order for short prefixes. The first tag that starts with the
    /// prefix wins, so `Te` is TenGigabitEthernet and `Tw` is TwentyFiveGigE;
    /// TwoGigabitEthernet needs at least `Two`. Do not reorder.
    pub const ALL: [InterfaceType; 10] = [
        InterfaceType::FastEthernet,
        InterfaceType::GigabitEthernet,
        InterfaceType::FiveGigabitEthernet,
        InterfaceType::PortChannel,
        InterfaceType::TenGigabitEthernet,
        InterfaceType::TwentyFiveGigE,
        InterfaceType::FortyGigabitEthernet,
        InterfaceType::TwoGigabitEthernet,
        InterfaceType::HundredGigE,
        InterfaceType::Vlan,
    ];

    /// The XML element name used under `native/interface`.
    pub fn as_str(self) -> &'static str {
        match self {
            InterfaceType::FastEthernet => "FastEthernet",
            InterfaceType::GigabitEthernet => "GigabitEthernet",
            InterfaceType::FiveGigabitEthernet => "FiveGigabitEthernet",
            InterfaceType::PortChannel => "Port-channel",
            InterfaceType::TenGigabitEthernet => "TenGigabitEthernet",
            InterfaceType::TwentyFiveGigE => "TwentyFiveGigE",
            InterfaceType::FortyGigabitEthernet => "FortyGigabitEthernet",
            InterfaceType::TwoGigabitEthernet => "TwoGigabitEthernet",
            InterfaceType::HundredGigE => "HundredGigE",
            InterfaceType::Vlan => "Vlan",
        }
    }

    /// Case-insensitive leading-substring match against [`InterfaceType::ALL`].
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        let prefix = prefix.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_ascii_lowercase().starts_with(&prefix))
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interface resolved from a human short name such as `Gi1/0/13`.
///
/// The YANG model wants `Gi1/0/13` as an outer `<GigabitEthernet>` element
/// with an inner `<name>1/0/13</name>`, which is exactly the split kept here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceRef {
    kind: InterfaceType,
    location: String,
}

impl InterfaceRef {
    /// Resolve a short interface name into its canonical type and location.
    pub fn parse(name: &str) -> Result<Self> {
        let caps = IFNAME_RE
            .captures(name)
            .ok_or_else(|| Error::MalformedInterfaceName(name.to_string()))?;

        let prefix = &caps[1];
        let location = &caps[2];

        let kind = InterfaceType::from_prefix(prefix).ok_or_else(|| Error::UnknownInterfaceType {
            prefix: prefix.to_string(),
            name: name.to_string(),
        })?;

        Ok(Self {
            kind,
            location: location.to_string(),
        })
    }

    /// Slot/port path, e.g. `1/0/13`.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn xml_tag(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl FromStr for InterfaceRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str) -> (&'static str, String) {
        let iface = InterfaceRef::parse(name).unwrap();
        (iface.xml_tag(), iface.location().to_string())
    }

    #[test]
    fn test_resolves_common_short_names() {
        assert_eq!(pair("Gi1/0/13"), ("GigabitEthernet", "1/0/13".to_string()));
        assert_eq!(pair("Te2/1"), ("TenGigabitEthernet", "2/1".to_string()));
        assert_eq!(pair("Vlan19"), ("Vlan", "19".to_string()));
        assert_eq!(pair("Po10"), ("Port-channel", "10".to_string()));
        assert_eq!(pair("Hu1/0/49"), ("HundredGigE", "1/0/49".to_string()));
        assert_eq!(pair("Fo1/1/1"), ("FortyGigabitEthernet", "1/1/1".to_string()));
        assert_eq!(pair("Fi1/0/1"), ("FiveGigabitEthernet", "1/0/1".to_string()));
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        assert_eq!(pair("fa0/1"), ("FastEthernet", "0/1".to_string()));
        assert_eq!(pair("GIGABITETHERNET1/0/1"), ("GigabitEthernet", "1/0/1".to_string()));
        assert_eq!(pair("vlan164"), ("Vlan", "164".to_string()));
    }

    #[test]
    fn test_first_match_wins_in_declared_order() {
        // "F" fits three tags, FastEthernet is declared first
        assert_eq!(pair("F0/1").0, "FastEthernet");
        // "Tw" fits TwentyFiveGigE and TwoGigabitEthernet
        assert_eq!(pair("Tw1/0/1").0, "TwentyFiveGigE");
        assert_eq!(pair("Two1/0/1").0, "TwoGigabitEthernet");
        assert_eq!(pair("T1/0/1").0, "TenGigabitEthernet");
    }

    #[test]
    fn test_location_allows_dots_and_single_digit() {
        assert_eq!(pair("Gi0/1.100"), ("GigabitEthernet", "0/1.100".to_string()));
        assert_eq!(pair("Vlan5"), ("Vlan", "5".to_string()));
    }

    #[test]
    fn test_malformed_names() {
        for name in ["", "Gi", "1/0/13", "Gi1/0/13x", "Gi1-0-13", "Gi1/0/13 "] {
            assert!(
                matches!(InterfaceRef::parse(name), Err(Error::MalformedInterfaceName(_))),
                "{name:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_unknown_interface_type() {
        let err = InterfaceRef::parse("Loopback0").unwrap_err();
        assert_eq!(
            err,
            Error::UnknownInterfaceType {
                prefix: "Loopback".to_string(),
                name: "Loopback0".to_string(),
            }
        );
        assert!(matches!(
            InterfaceRef::parse("Gi 1/0/1"),
            Err(Error::UnknownInterfaceType { .. })
        ));
    }

    #[test]
    fn test_display_and_from_str() {
        let iface: InterfaceRef = "Gi1/0/13".parse().unwrap();
        assert_eq!(iface.to_string(), "GigabitEthernet1/0/13");
        assert_eq!(iface.xml_tag(), InterfaceType::GigabitEthernet.as_str());
        assert_eq!(InterfaceRef::parse("gi1/0/13").unwrap(), iface);
    }
}
