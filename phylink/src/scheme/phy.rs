use std::sync::Weak;

use super::Scheme;
use crate::ethtool::LinkKsettings;
use crate::link_mode::{Duplex, LinkModes};
use crate::state::Pause;
use crate::PhylinkResult;

/// The one call a PHY makes back into its link manager.
pub trait PhyLinkChange: Send + Sync {
    /// The PHY finished (re)negotiating, or lost its link.
    ///
    /// Called from the PHY driver's own context; must not block.
    fn phy_link_change(&self, up: bool, speed: i32, duplex: Duplex, pause: Pause);
}

/// Operations of a PHY driver used by the link manager.
///
/// The link manager never touches PHY registers itself; it only goes through
/// these calls.
pub trait PhyScheme: Scheme {
    /// Start delivering link changes to `notify`.
    fn attach(&self, notify: Weak<dyn PhyLinkChange>) -> PhylinkResult;

    /// Stop the state machine and forget the notifier.
    fn detach(&self);

    fn supported(&self) -> LinkModes;
    fn advertising(&self) -> LinkModes;
    fn set_advertising(&self, advertising: LinkModes);

    fn ksettings_get(&self, kset: &mut LinkKsettings);
    fn ksettings_set(&self, kset: &LinkKsettings) -> PhylinkResult;

    /// Begin autonomous link monitoring.
    fn start_machine(&self);
    fn start(&self);
    fn stop(&self);
    fn restart_aneg(&self) -> PhylinkResult;

    fn mdio_addr(&self) -> u16;
    fn mdio_read(&self, phy_id: u16, reg: u16) -> PhylinkResult<u16>;
    fn mdio_write(&self, phy_id: u16, reg: u16, val: u16) -> PhylinkResult;
}
