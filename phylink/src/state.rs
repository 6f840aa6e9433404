//! Link state, autoneg modes and MAC-PHY interface types.

use core::{fmt, str::FromStr};

use bitflags::bitflags;

use crate::link_mode::*;
use crate::PhylinkError;

bitflags! {
    /// Flow control, as advertised (`SYM`/`ASYM`) and as resolved (`TX`/`RX`).
    #[derive(Default)]
    pub struct Pause: u8 {
        const ASYM = 1 << 0;
        const SYM = 1 << 1;
        const RX = 1 << 2;
        const TX = 1 << 3;
        /// Flow control follows the negotiation result.
        const AN = 1 << 4;
    }
}

impl Pause {
    pub fn txrx() -> Self {
        Self::TX | Self::RX
    }

    pub fn to_str(self) -> &'static str {
        match (self.contains(Self::RX), self.contains(Self::TX)) {
            (true, true) => "rx/tx",
            (true, false) => "rx",
            (false, true) => "tx",
            (false, false) => "off",
        }
    }
}

bitflags! {
    /// Reasons that force the resolved link down.
    #[derive(Default)]
    pub struct DisableReason: u8 {
        /// Not started, or stopped by the MAC driver.
        const STOPPED = 1 << 0;
    }
}

/// Where the link parameters come from. Chosen once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnMode {
    /// Reported by the attached PHY.
    Phy,
    /// Described by firmware, no negotiation.
    Fixed,
    /// SGMII in-band status, optionally gated by a copper PHY.
    InBandSgmii,
    /// 1000BASE-X / 2500BASE-X in-band status.
    InBand1000BaseX,
}

impl AnMode {
    pub fn is_inband(self) -> bool {
        matches!(self, Self::InBandSgmii | Self::InBand1000BaseX)
    }
}

impl fmt::Display for AnMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Phy => "phy",
            Self::Fixed => "fixed",
            Self::InBandSgmii => "SGMII",
            Self::InBand1000BaseX => "802.3z",
        })
    }
}

/// The MAC to PHY interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyInterface {
    NA,
    Mii,
    Gmii,
    Sgmii,
    Tbi,
    Rmii,
    Rgmii,
    RgmiiId,
    RgmiiRxid,
    RgmiiTxid,
    Base1000X,
    Base2500X,
    Xgmii,
}

impl Default for PhyInterface {
    fn default() -> Self {
        Self::NA
    }
}

impl PhyInterface {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NA => "",
            Self::Mii => "mii",
            Self::Gmii => "gmii",
            Self::Sgmii => "sgmii",
            Self::Tbi => "tbi",
            Self::Rmii => "rmii",
            Self::Rgmii => "rgmii",
            Self::RgmiiId => "rgmii-id",
            Self::RgmiiRxid => "rgmii-rxid",
            Self::RgmiiTxid => "rgmii-txid",
            Self::Base1000X => "1000base-x",
            Self::Base2500X => "2500base-x",
            Self::Xgmii => "xgmii",
        }
    }

    /// Whether in-band status on this interface is 802.3 clause 37 style.
    pub fn is_8023z(self) -> bool {
        matches!(self, Self::Base1000X | Self::Base2500X)
    }

    /// Link modes an in-band link on this interface can carry.
    pub fn inband_link_modes(self) -> Option<LinkModes> {
        match self {
            Self::Sgmii => Some(LinkModes::ethernet_basic()),
            Self::Base1000X => Some(LinkModes::BASE1000X_FULL),
            Self::Base2500X => Some(LinkModes::BASE2500X_FULL),
            _ => None,
        }
    }
}

impl fmt::Display for PhyInterface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhyInterface {
    type Err = PhylinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" => Self::NA,
            "mii" => Self::Mii,
            "gmii" => Self::Gmii,
            "sgmii" => Self::Sgmii,
            "tbi" => Self::Tbi,
            "rmii" => Self::Rmii,
            "rgmii" => Self::Rgmii,
            "rgmii-id" => Self::RgmiiId,
            "rgmii-rxid" => Self::RgmiiRxid,
            "rgmii-txid" => Self::RgmiiTxid,
            "1000base-x" => Self::Base1000X,
            "2500base-x" => Self::Base2500X,
            "xgmii" => Self::Xgmii,
            _ => return Err(PhylinkError::InvalidConfig),
        })
    }
}

/// A resolved (or configured) link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    pub interface: PhyInterface,
    /// Mbps, or [`SPEED_UNKNOWN`].
    pub speed: i32,
    pub duplex: Duplex,
    pub pause: Pause,
    pub advertising: LinkModes,
    /// Only meaningful for in-band modes.
    pub lp_advertising: LinkModes,
    pub link: bool,
    pub an_enabled: bool,
    pub an_complete: bool,
}

impl Default for LinkState {
    fn default() -> Self {
        LinkState {
            interface: PhyInterface::NA,
            speed: SPEED_UNKNOWN,
            duplex: Duplex::Unknown,
            pause: Pause::empty(),
            advertising: LinkModes::empty(),
            lp_advertising: LinkModes::empty(),
            link: false,
            an_enabled: false,
            an_complete: false,
        }
    }
}

/// Resolve TX/RX flow control in `state` against the configured policy.
///
/// With [`Pause::AN`] configured, the local `PAUSE`/`ASYM_PAUSE`
/// advertisement is matched against the partner's `SYM`/`ASYM` ability in
/// `state.pause`. Otherwise the forced TX/RX bits of `config` apply.
pub fn resolve_flow(config: &LinkState, state: &mut LinkState) {
    let new_pause = if config.pause.contains(Pause::AN) {
        let mut pause = Pause::empty();
        if config.advertising.contains(LinkModes::PAUSE) {
            pause |= Pause::SYM;
        }
        if config.advertising.contains(LinkModes::ASYM_PAUSE) {
            pause |= Pause::ASYM;
        }
        pause &= state.pause;
        if pause.contains(Pause::SYM) {
            Pause::txrx()
        } else if pause.contains(Pause::ASYM) {
            if state.pause.contains(Pause::SYM) {
                Pause::RX
            } else {
                Pause::TX
            }
        } else {
            Pause::empty()
        }
    } else {
        config.pause & Pause::txrx()
    };
    state.pause.remove(Pause::txrx());
    state.pause |= new_pause;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pause: Pause, advertising: LinkModes) -> LinkState {
        LinkState {
            pause,
            advertising,
            ..Default::default()
        }
    }

    #[test]
    fn flow_negotiated_symmetric() {
        let cfg = config(Pause::AN, LinkModes::PAUSE | LinkModes::ASYM_PAUSE);
        let mut state = LinkState {
            pause: Pause::SYM,
            ..Default::default()
        };
        resolve_flow(&cfg, &mut state);
        assert_eq!(state.pause, Pause::SYM | Pause::TX | Pause::RX);
    }

    #[test]
    fn flow_negotiated_asymmetric() {
        let cfg = config(Pause::AN, LinkModes::ASYM_PAUSE);
        let mut state = LinkState {
            pause: Pause::SYM | Pause::ASYM,
            ..Default::default()
        };
        resolve_flow(&cfg, &mut state);
        assert_eq!(state.pause & Pause::txrx(), Pause::RX);

        let mut state = LinkState {
            pause: Pause::ASYM,
            ..Default::default()
        };
        resolve_flow(&cfg, &mut state);
        assert_eq!(state.pause & Pause::txrx(), Pause::TX);
    }

    #[test]
    fn flow_forced() {
        let cfg = config(Pause::TX, LinkModes::PAUSE);
        let mut state = LinkState {
            pause: Pause::SYM | Pause::RX,
            ..Default::default()
        };
        resolve_flow(&cfg, &mut state);
        assert_eq!(state.pause, Pause::SYM | Pause::TX);
    }

    #[test]
    fn interface_names() {
        for intf in [
            PhyInterface::Sgmii,
            PhyInterface::Base1000X,
            PhyInterface::RgmiiId,
            PhyInterface::Xgmii,
        ] {
            assert_eq!(intf.as_str().parse::<PhyInterface>(), Ok(intf));
        }
        assert_eq!(
            "qsgmii".parse::<PhyInterface>(),
            Err(PhylinkError::InvalidConfig)
        );
    }

    #[test]
    fn inband_modes() {
        assert_eq!(
            PhyInterface::Sgmii.inband_link_modes(),
            Some(LinkModes::ethernet_basic())
        );
        assert_eq!(PhyInterface::Rgmii.inband_link_modes(), None);
        assert!(PhyInterface::Base2500X.is_8023z());
        assert!(!PhyInterface::Sgmii.is_8023z());
    }
}
