//! Configuration steps.
//!
//! A step carries its parameters exactly as configured. They are parsed into
//! typed values only when the step renders, so a bad value fails that step
//! (and everything after it is skipped) rather than the whole plan.

use crate::config::Settings;
use crate::error::Result;
use crate::models::{
    parse_ipv4, ClassMap, InterfaceRef, Ipv4Assignment, OspfNetworkEntry, VlanList, VlanSpec,
};
use crate::snippets::{Fragment, Snippets};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateVlan {
        id: String,
        name: String,
    },
    MarkTrunk {
        interface: String,
    },
    AddVlansToTrunk {
        interface: String,
        vlans: String,
    },
    CreateSvi {
        id: String,
        description: String,
    },
    AssignIp {
        interface: String,
        address: String,
        mask: String,
    },
    AddOspfNetwork {
        router: String,
        network: String,
        wildcard: String,
        area: String,
    },
    #[allow(dead_code)]
    DeleteVlan {
        id: String,
    },
    #[allow(dead_code)]
    DeleteOspfRouter {
        router: String,
    },
    #[allow(dead_code)]
    CreateClassMap {
        name: String,
        description: String,
    },
}

impl Step {
    /// Human-readable description used in step records.
    pub fn label(&self) -> String {
        match self {
            Step::CreateVlan { id, name } => format!("create vlan {} (\"{}\")", id, name),
            Step::MarkTrunk { interface } => format!("create trunk interface {}", interface),
            Step::AddVlansToTrunk { interface, vlans } => {
                format!("add vlan {} to trunk interface {}", vlans, interface)
            }
            Step::CreateSvi { id, .. } => format!("create svi {}", id),
            Step::AssignIp {
                interface,
                address,
                mask,
            } => match interface.strip_prefix("Vlan") {
                Some(id) => format!("assign IP address {} {} to svi {}", address, mask, id),
                None => format!("assign IP address {} {} to interface {}", address, mask, interface),
            },
            Step::AddOspfNetwork {
                router, network, ..
            } => format!("add subnet {} to OSPF router {}", network, router),
            Step::DeleteVlan { id } => format!("delete vlan {}", id),
            Step::DeleteOspfRouter { router } => format!("delete OSPF router {}", router),
            Step::CreateClassMap { name, .. } => format!("create class-map {}", name),
        }
    }

    /// Parse this step's parameters and render its fragment.
    pub fn render(&self, snippets: &Snippets) -> Result<Fragment> {
        match self {
            Step::CreateVlan { id, name } => snippets.create_vlan(&VlanSpec::new(id.parse()?, name)?),
            Step::MarkTrunk { interface } => snippets.mark_trunk(&InterfaceRef::parse(interface)?),
            Step::AddVlansToTrunk { interface, vlans } => {
                let vlans: VlanList = vlans.parse()?;
                snippets.add_vlans_to_trunk(&InterfaceRef::parse(interface)?, &vlans)
            }
            Step::CreateSvi { id, description } => snippets.create_svi(id.parse()?, description),
            Step::AssignIp {
                interface,
                address,
                mask,
            } => {
                let assignment = Ipv4Assignment::new(
                    InterfaceRef::parse(interface)?,
                    parse_ipv4("ip address", address)?,
                    mask.parse()?,
                )?;
                snippets.assign_ip(&assignment)
            }
            Step::AddOspfNetwork {
                router,
                network,
                wildcard,
                area,
            } => {
                let entry = OspfNetworkEntry {
                    process: router.parse()?,
                    network: parse_ipv4("ospf network", network)?,
                    wildcard: parse_ipv4("ospf wildcard", wildcard)?,
                    area: area.parse()?,
                };
                snippets.add_ospf_network(&entry)
            }
            Step::DeleteVlan { id } => snippets.delete_vlan(id.parse()?),
            Step::DeleteOspfRouter { router } => snippets.delete_ospf_router(router.parse()?),
            Step::CreateClassMap { name, description } => {
                snippets.create_classmap(&ClassMap::new(name, description)?)
            }
        }
    }
}

/// The six steps that provision a routed VLAN.
pub fn provisioning_plan(settings: &Settings) -> Vec<Step> {
    vec![
        Step::CreateVlan {
            id: settings.vlan_id.clone(),
            name: settings.vlan_name.clone(),
        },
        Step::MarkTrunk {
            interface: settings.interface.clone(),
        },
        Step::AddVlansToTrunk {
            interface: settings.interface.clone(),
            vlans: settings.vlan_id.clone(),
        },
        Step::CreateSvi {
            id: settings.vlan_id.clone(),
            description: format!("Internet gateway for {}", settings.vlan_name),
        },
        Step::AssignIp {
            interface: format!("Vlan{}", settings.vlan_id),
            address: settings.ip_address.clone(),
            mask: settings.ip_subnet.clone(),
        },
        Step::AddOspfNetwork {
            router: settings.ospf_router.clone(),
            network: settings.ospf_network.clone(),
            wildcard: settings.ospf_wildcard.clone(),
            area: settings.ospf_area.clone(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Error;

    fn default_settings() -> Settings {
        Config::load_from(|_| None).settings
    }

    #[test]
    fn test_provisioning_plan_labels() {
        let labels: Vec<String> = provisioning_plan(&default_settings())
            .iter()
            .map(Step::label)
            .collect();
        assert_eq!(
            labels,
            vec![
                "create vlan 164 (\"Vendor VLAN Brown\")",
                "create trunk interface Gi1/0/13",
                "add vlan 164 to trunk interface Gi1/0/13",
                "create svi 164",
                "assign IP address 10.3.164.1 255.255.255.0 to svi 164",
                "add subnet 10.3.164.0 to OSPF router 38",
            ]
        );
    }

    #[test]
    fn test_provisioning_plan_renders() {
        let snippets = Snippets::new().unwrap();
        let plan = provisioning_plan(&default_settings());

        let fragments: Vec<Fragment> = plan.iter().map(|s| s.render(&snippets).unwrap()).collect();
        assert!(fragments[0].as_str().contains("<name>Vendor VLAN Brown</name>"));
        assert!(fragments[1].as_str().contains("<GigabitEthernet>"));
        assert!(fragments[2].as_str().contains("<add>164</add>"));
        assert!(fragments[3]
            .as_str()
            .contains("<description>Internet gateway for Vendor VLAN Brown</description>"));
        assert!(fragments[4].as_str().contains("<address>10.3.164.1</address>"));
        assert!(fragments[5].as_str().contains("<mask>0.0.0.255</mask>"));
    }

    #[test]
    fn test_bad_parameters_fail_at_render() {
        let snippets = Snippets::new().unwrap();

        let step = Step::MarkTrunk {
            interface: "Loopback0".to_string(),
        };
        assert!(matches!(
            step.render(&snippets),
            Err(Error::UnknownInterfaceType { .. })
        ));

        let step = Step::MarkTrunk {
            interface: "Gi".to_string(),
        };
        assert!(matches!(
            step.render(&snippets),
            Err(Error::MalformedInterfaceName(_))
        ));

        let step = Step::CreateVlan {
            id: "4095".to_string(),
            name: "x".to_string(),
        };
        assert!(matches!(
            step.render(&snippets),
            Err(Error::InvalidParameter { param: "vlan id", .. })
        ));

        let step = Step::AssignIp {
            interface: "Vlan164".to_string(),
            address: "10.3.164.1".to_string(),
            mask: "255.0.255.0".to_string(),
        };
        assert!(matches!(
            step.render(&snippets),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_extra_step_variants() {
        let snippets = Snippets::new().unwrap();

        let delete = Step::DeleteVlan {
            id: "164".to_string(),
        };
        assert_eq!(delete.label(), "delete vlan 164");
        assert!(delete.render(&snippets).unwrap().as_str().contains("delete"));

        let delete = Step::DeleteOspfRouter {
            router: "38".to_string(),
        };
        assert_eq!(delete.label(), "delete OSPF router 38");
        assert!(delete.render(&snippets).is_ok());

        let classmap = Step::CreateClassMap {
            name: "VOICE".to_string(),
            description: "Voice bearer".to_string(),
        };
        assert_eq!(classmap.label(), "create class-map VOICE");
        assert!(classmap.render(&snippets).is_ok());
    }

    #[test]
    fn test_assign_ip_label_for_physical_interface() {
        let step = Step::AssignIp {
            interface: "Gi1/0/1".to_string(),
            address: "192.0.2.1".to_string(),
            mask: "255.255.255.252".to_string(),
        };
        assert_eq!(
            step.label(),
            "assign IP address 192.0.2.1 255.255.255.252 to interface Gi1/0/1"
        );
    }
}
