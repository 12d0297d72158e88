mod interface;
mod qos;
mod routing;
mod vlan;

pub use interface::InterfaceRef;
pub use qos::ClassMap;
pub use routing::{parse_ipv4, Ipv4Assignment, OspfNetworkEntry, OspfProcessId};
pub use vlan::{VlanId, VlanList, VlanSpec};
