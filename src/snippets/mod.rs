//! Configuration fragment generators.
//!
//! One function per configuration intent, each rendering an embedded
//! IOS-XE native-model template into a `<config>` element ready for
//! `<edit-config>`. Rendering is pure: same parameters, same bytes.

use std::fmt;

use tera::{Context, Tera};

use crate::error::Result;
use crate::models::{
    ClassMap, InterfaceRef, Ipv4Assignment, OspfNetworkEntry, OspfProcessId, VlanId, VlanList,
    VlanSpec,
};

const TEMPLATES: &[(&str, &str)] = &[
    ("native.xml", include_str!("templates/native.xml")),
    ("vlan_create.xml", include_str!("templates/vlan_create.xml")),
    ("vlan_delete.xml", include_str!("templates/vlan_delete.xml")),
    ("classmap_create.xml", include_str!("templates/classmap_create.xml")),
    ("ospf_network_add.xml", include_str!("templates/ospf_network_add.xml")),
    ("ospf_router_delete.xml", include_str!("templates/ospf_router_delete.xml")),
    ("trunk_mode.xml", include_str!("templates/trunk_mode.xml")),
    ("trunk_vlans_add.xml", include_str!("templates/trunk_vlans_add.xml")),
    ("svi_create.xml", include_str!("templates/svi_create.xml")),
    ("interface_ip.xml", include_str!("templates/interface_ip.xml")),
];

/// A rendered `<config>` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fragment {
    fn from(xml: String) -> Self {
        Self(xml)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_xml(input: &str) -> String {
    quick_xml::escape::escape(input).into_owned()
}

/// Compiled fragment templates.
pub struct Snippets {
    tera: Tera,
}

impl Snippets {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        // every interpolated value is element text
        tera.autoescape_on(vec![".xml"]);
        tera.set_escape_fn(escape_xml);
        Ok(Self { tera })
    }

    fn render(&self, template: &str, context: &Context) -> Result<Fragment> {
        let xml = self.tera.render(template, context)?;
        Ok(Fragment(xml))
    }

    fn interface_context(iface: &InterfaceRef) -> Context {
        let mut context = Context::new();
        context.insert("if_type", iface.xml_tag());
        context.insert("if_location", iface.location());
        context
    }

    pub fn create_vlan(&self, vlan: &VlanSpec) -> Result<Fragment> {
        let mut context = Context::new();
        context.insert("vlan_id", &vlan.id.get());
        context.insert("vlan_name", &vlan.name);
        self.render("vlan_create.xml", &context)
    }

    pub fn delete_vlan(&self, id: VlanId) -> Result<Fragment> {
        let mut context = Context::new();
        context.insert("vlan_id", &id.get());
        self.render("vlan_delete.xml", &context)
    }

    pub fn create_classmap(&self, class_map: &ClassMap) -> Result<Fragment> {
        let mut context = Context::new();
        context.insert("name", &class_map.name);
        context.insert("description", &class_map.description);
        self.render("classmap_create.xml", &context)
    }

    pub fn add_ospf_network(&self, entry: &OspfNetworkEntry) -> Result<Fragment> {
        let mut context = Context::new();
        context.insert("process_id", &entry.process.to_string());
        context.insert("network", &entry.network.to_string());
        context.insert("wildcard", &entry.wildcard.to_string());
        context.insert("area", &entry.area.to_string());
        self.render("ospf_network_add.xml", &context)
    }

    pub fn delete_ospf_router(&self, process: OspfProcessId) -> Result<Fragment> {
        let mut context = Context::new();
        context.insert("process_id", &process.to_string());
        self.render("ospf_router_delete.xml", &context)
    }

    /// Put the interface into `switchport mode trunk`.
    pub fn mark_trunk(&self, iface: &InterfaceRef) -> Result<Fragment> {
        self.render("trunk_mode.xml", &Self::interface_context(iface))
    }

    /// Append VLANs to the trunk's allowed list. Uses the `add` leaf, so VLANs
    /// already allowed on the trunk are kept.
    pub fn add_vlans_to_trunk(&self, iface: &InterfaceRef, vlans: &VlanList) -> Result<Fragment> {
        let mut context = Self::interface_context(iface);
        context.insert("vlan_list", &vlans.to_string());
        self.render("trunk_vlans_add.xml", &context)
    }

    /// Create the `interface Vlan<id>` SVI and remove any `shutdown`.
    pub fn create_svi(&self, id: VlanId, description: &str) -> Result<Fragment> {
        let mut context = Context::new();
        context.insert("vlan_id", &id.get());
        context.insert("description", description);
        self.render("svi_create.xml", &context)
    }

    pub fn assign_ip(&self, assignment: &Ipv4Assignment) -> Result<Fragment> {
        let mut context = Self::interface_context(&assignment.interface);
        context.insert("address", &assignment.address.to_string());
        context.insert("mask", &assignment.mask.to_string());
        self.render("interface_ip.xml", &context)
    }
}
