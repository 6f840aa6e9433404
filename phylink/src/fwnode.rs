//! Firmware description of the link, shaped like a device tree node.
//!
//! Properties used here:
//!
//! - `fixed-link`: either a child node (`speed`, `full-duplex`, `pause`,
//!   `asym-pause`, `link-gpios`) or a five cell property.
//! - `managed = "in-band-status"`: the MAC reports link state itself.
//! - `phy-handle` / `phy` / `phy-device`: phandle of the PHY.
//! - `phy-mode` / `phy-connection-type`: the MAC to PHY interface.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scheme::LinkGpio;
use crate::state::PhyInterface;
use crate::{PhylinkError, PhylinkResult};

/// Read access to one node of the firmware description.
pub trait FwNode {
    fn name(&self) -> &str;
    fn has_prop(&self, name: &str) -> bool;
    fn prop_u32(&self, name: &str) -> Option<u32>;
    fn prop_cells(&self, name: &str) -> Option<Vec<u32>>;
    fn prop_str(&self, name: &str) -> Option<&str>;
    fn child(&self, name: &str) -> Option<&Self>;

    /// The input line referenced by the `name` property, if it can be
    /// resolved.
    fn gpio(&self, _name: &str) -> Option<Arc<dyn LinkGpio>> {
        None
    }
}

/// Read `phy-mode`, falling back to `phy-connection-type`.
pub fn phy_mode<N: FwNode>(node: &N) -> PhylinkResult<PhyInterface> {
    node.prop_str("phy-mode")
        .or_else(|| node.prop_str("phy-connection-type"))
        .ok_or(PhylinkError::InvalidConfig)?
        .parse()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PropValue {
    Empty,
    Cells(Vec<u32>),
    Str(String),
}

/// An in-memory node, built by board code or tests.
#[derive(Default)]
pub struct PropNode {
    name: String,
    props: BTreeMap<String, PropValue>,
    children: Vec<PropNode>,
    gpios: BTreeMap<String, Arc<dyn LinkGpio>>,
}

impl PropNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// A boolean property.
    pub fn with_flag(mut self, name: &str) -> Self {
        self.props.insert(name.to_string(), PropValue::Empty);
        self
    }

    pub fn with_u32(self, name: &str, value: u32) -> Self {
        self.with_cells(name, &[value])
    }

    pub fn with_cells(mut self, name: &str, cells: &[u32]) -> Self {
        self.props
            .insert(name.to_string(), PropValue::Cells(cells.to_vec()));
        self
    }

    pub fn with_str(mut self, name: &str, value: &str) -> Self {
        self.props
            .insert(name.to_string(), PropValue::Str(value.to_string()));
        self
    }

    pub fn with_child(mut self, child: PropNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_gpio(mut self, name: &str, gpio: Arc<dyn LinkGpio>) -> Self {
        self.props.insert(name.to_string(), PropValue::Empty);
        self.gpios.insert(name.to_string(), gpio);
        self
    }
}

impl FwNode for PropNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_prop(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    fn prop_u32(&self, name: &str) -> Option<u32> {
        match self.props.get(name)? {
            PropValue::Cells(cells) if cells.len() == 1 => Some(cells[0]),
            _ => None,
        }
    }

    fn prop_cells(&self, name: &str) -> Option<Vec<u32>> {
        match self.props.get(name)? {
            PropValue::Cells(cells) => Some(cells.clone()),
            _ => None,
        }
    }

    fn prop_str(&self, name: &str) -> Option<&str> {
        match self.props.get(name)? {
            PropValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    fn gpio(&self, name: &str) -> Option<Arc<dyn LinkGpio>> {
        self.gpios.get(name).cloned()
    }
}

#[cfg(feature = "devicetree")]
mod devicetree {
    use device_tree::Node;

    use super::FwNode;

    // TODO: resolve `link-gpios` once a GPIO controller registry exists.
    // Until then the fixed-link parser warns and keeps the link up.
    impl FwNode for Node {
        fn name(&self) -> &str {
            &self.name
        }

        fn has_prop(&self, name: &str) -> bool {
            Node::has_prop(self, name)
        }

        fn prop_u32(&self, name: &str) -> Option<u32> {
            Node::prop_u32(self, name).ok()
        }

        fn prop_cells(&self, name: &str) -> Option<Vec<u32>> {
            Node::prop_cells(self, name).ok()
        }

        fn prop_str(&self, name: &str) -> Option<&str> {
            Node::prop_str(self, name).ok()
        }

        fn child(&self, name: &str) -> Option<&Self> {
            self.children.iter().find(|c| c.name == name)
        }
    }
}
