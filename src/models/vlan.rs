use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Longest VLAN name accepted by the IOS-XE vlan-list model.
pub const MAX_VLAN_NAME_LEN: usize = 128;

/// An 802.1Q VLAN identifier in the configurable range 1-4094.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VlanId(u16);

impl VlanId {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 4094;

    pub fn new(id: u16) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(Self(id))
        } else {
            Err(Error::invalid(
                "vlan id",
                &id.to_string(),
                format!("must be between {} and {}", Self::MIN, Self::MAX),
            ))
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl FromStr for VlanId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id = s
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::invalid("vlan id", s, "not a number"))?;
        Self::new(id)
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A VLAN to create: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanSpec {
    pub id: VlanId,
    pub name: String,
}

impl VlanSpec {
    pub fn new(id: VlanId, name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::invalid("vlan name", name, "must not be empty"));
        }
        if name.chars().count() > MAX_VLAN_NAME_LEN {
            return Err(Error::invalid(
                "vlan name",
                name,
                format!("longer than {} characters", MAX_VLAN_NAME_LEN),
            ));
        }
        if name.chars().any(char::is_control) {
            return Err(Error::invalid("vlan name", name, "contains control characters"));
        }
        Ok(Self {
            id,
            name: name.to_string(),
        })
    }
}

/// One entry of a trunk allowed-VLAN list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlanListEntry {
    Single(VlanId),
    Range(VlanId, VlanId),
}

/// A trunk VLAN list such as `164` or `10,20-30`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanList(Vec<VlanListEntry>);

impl From<VlanId> for VlanList {
    fn from(id: VlanId) -> Self {
        VlanList(vec![VlanListEntry::Single(id)])
    }
}

impl FromStr for VlanList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(Error::invalid("vlan list", s, "empty entry"));
            }

            let entry = match part.split_once('-') {
                Some((start, end)) => {
                    let start: VlanId = start.parse()?;
                    let end: VlanId = end.parse()?;
                    if start > end {
                        return Err(Error::invalid(
                            "vlan list",
                            s,
                            format!("range {}-{} is descending", start, end),
                        ));
                    }
                    if start == end {
                        VlanListEntry::Single(start)
                    } else {
                        VlanListEntry::Range(start, end)
                    }
                }
                None => VlanListEntry::Single(part.parse()?),
            };
            entries.push(entry);
        }

        Ok(VlanList(entries))
    }
}

impl fmt::Display for VlanList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match entry {
                VlanListEntry::Single(id) => write!(f, "{}", id)?,
                VlanListEntry::Range(start, end) => write!(f, "{}-{}", start, end)?,
            }
        }
        Ok(())
    }
}
