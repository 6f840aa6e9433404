//! Link management between an Ethernet MAC and whatever decides its link
//! parameters: an attached PHY, a fixed link described by firmware, or the
//! in-band status of an SGMII / 1000BASE-X serdes.
//!
//! The MAC driver creates one [`Phylink`] per interface and implements
//! [`MacScheme`]. From then on it only sees `mac_config`, `mac_link_up` and
//! `mac_link_down` calls; the PHY may come and go underneath.

#[macro_use]
extern crate log;

pub mod ethtool;
pub mod fixed_link;
pub mod fwnode;
pub mod link_mode;
pub mod mii;
pub mod scheme;
pub mod settings;
pub mod state;
pub mod swphy;
pub mod utils;

mod phylink;
mod resolve;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use crate::ethtool::{LinkKsettings, PauseParam};
pub use crate::fwnode::{FwNode, PropNode};
pub use crate::link_mode::{Autoneg, Duplex, LinkModes, Port};
pub use crate::mii::{MiiCmd, MiiIoctlData};
pub use crate::phylink::{Carrier, Phylink, PhylinkConfig};
pub use crate::scheme::{LinkGpio, MacScheme, PhyLinkChange, PhyScheme, Scheme};
pub use crate::state::{AnMode, DisableReason, LinkState, Pause, PhyInterface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhylinkError {
    /// Conflicting or malformed firmware description.
    InvalidConfig,
    /// Validation left no usable link modes.
    UnsupportedCapabilitySet,
    /// A required PHY could not be found.
    DeviceNotFound,
    /// The requested speed/duplex is not a known link mode.
    SettingNotRecognized,
    /// The request is not allowed in the current mode.
    InvalidRequest,
    /// The operation needs hardware that is not present.
    NotSupported,
    /// Failure reported by the PHY driver.
    IoFailure,
}

pub type PhylinkResult<T = ()> = core::result::Result<T, PhylinkError>;
