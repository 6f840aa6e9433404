//! Link settings and pause parameters as seen by management tools.

use crate::link_mode::{Autoneg, Duplex, LinkModes, Port, SPEED_UNKNOWN};
use crate::phylink::{Carrier, Phylink};
use crate::settings;
use crate::state::{resolve_flow, AnMode, DisableReason, LinkState, Pause};
use crate::{PhylinkError, PhylinkResult};

/// Link settings, in the shape of `ethtool_link_ksettings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkKsettings {
    pub supported: LinkModes,
    pub advertising: LinkModes,
    pub lp_advertising: LinkModes,
    pub speed: i32,
    pub duplex: Duplex,
    /// Raw [`Autoneg`] value.
    pub autoneg: u8,
    pub port: Port,
    pub link: bool,
}

impl Default for LinkKsettings {
    fn default() -> Self {
        Self {
            supported: LinkModes::empty(),
            advertising: LinkModes::empty(),
            lp_advertising: LinkModes::empty(),
            speed: SPEED_UNKNOWN,
            duplex: Duplex::Unknown,
            autoneg: Autoneg::Disable as u8,
            port: Port::default(),
            link: false,
        }
    }
}

impl LinkKsettings {
    /// Overlay `state`, keeping the port bits already in `advertising`.
    fn merge(&mut self, state: &LinkState) {
        self.advertising = self.advertising.merge(state.advertising);
        self.lp_advertising = state.lp_advertising;
        self.speed = state.speed;
        self.duplex = state.duplex;
        let autoneg = if state.an_enabled {
            Autoneg::Enable
        } else {
            Autoneg::Disable
        };
        self.autoneg = autoneg as u8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseParam {
    pub autoneg: bool,
    pub rx_pause: bool,
    pub tx_pause: bool,
}

impl Phylink {
    pub fn ksettings_get(&self) -> LinkKsettings {
        let config = self.config.lock();
        let mut kset = LinkKsettings::default();
        let (phy, link_config) = {
            let state = self.state.lock();
            (state.phydev.clone(), state.link_config.clone())
        };
        match &phy {
            Some(phy) => phy.ksettings_get(&mut kset),
            None => {
                kset.port = config.link_port;
                kset.advertising = link_config.advertising;
            }
        }
        kset.supported = config.supported;

        match self.an_mode {
            AnMode::Fixed => kset.merge(&self.fixed_state(&link_config)),
            AnMode::InBandSgmii if phy.is_some() => {}
            AnMode::InBandSgmii | AnMode::InBand1000BaseX => {
                kset.merge(&self.mac_state(&link_config))
            }
            AnMode::Phy => {}
        }
        kset.link = self.state.lock().carrier_ok;
        kset
    }

    /// Apply `kset`. Nothing changes unless every check passes.
    pub fn ksettings_set(&self, kset: &LinkKsettings) -> PhylinkResult {
        let config = self.config.lock();
        let autoneg = Autoneg::try_from(kset.autoneg).map_err(|_| PhylinkError::InvalidRequest)?;
        let link_config = self.state.lock().link_config.clone();

        let mut advertising = self.mac.validate_advert(
            self.an_mode,
            config.supported,
            kset.advertising & config.supported,
        );
        let (speed, duplex) = match autoneg {
            Autoneg::Disable => {
                if self.an_mode == AnMode::Fixed
                    && (kset.speed != link_config.speed || kset.duplex != link_config.duplex)
                {
                    return Err(PhylinkError::InvalidRequest);
                }
                let s = settings::lookup(kset.speed, kset.duplex, config.supported, true)
                    .ok_or(PhylinkError::SettingNotRecognized)?;
                advertising.remove(LinkModes::AUTONEG);
                (s.speed, s.duplex)
            }
            Autoneg::Enable => {
                if self.an_mode == AnMode::Fixed || advertising.link_modes().is_empty() {
                    return Err(PhylinkError::InvalidRequest);
                }
                advertising.insert(LinkModes::AUTONEG);
                (SPEED_UNKNOWN, Duplex::Unknown)
            }
        };

        let ours = LinkKsettings {
            advertising,
            speed,
            duplex,
            autoneg: autoneg as u8,
            ..kset.clone()
        };
        if let Some(phy) = self.phydev() {
            phy.ksettings_set(&ours)?;
        }

        let mut state = self.state.lock();
        let lc = &mut state.link_config;
        lc.advertising = advertising;
        lc.speed = speed;
        lc.duplex = duplex;
        lc.an_enabled = autoneg == Autoneg::Enable;
        debug!(
            "{}: settings {}/{} autoneg {}",
            self.mac.name(),
            speed,
            duplex,
            lc.an_enabled
        );
        if !self.disabled().contains(DisableReason::STOPPED) {
            self.mac.mac_config(self.an_mode, lc);
            if lc.an_enabled {
                self.mac.mac_an_restart(self.an_mode);
            }
        }
        Ok(())
    }

    pub fn pauseparam_get(&self) -> PauseParam {
        let _config = self.config.lock();
        let pause = self.state.lock().link_config.pause;
        PauseParam {
            autoneg: pause.contains(Pause::AN),
            rx_pause: pause.contains(Pause::RX),
            tx_pause: pause.contains(Pause::TX),
        }
    }

    pub fn pauseparam_set(&self, param: &PauseParam) -> PhylinkResult {
        let config = self.config.lock();
        if !config
            .supported
            .intersects(LinkModes::PAUSE | LinkModes::ASYM_PAUSE)
        {
            return Err(PhylinkError::NotSupported);
        }
        if !config.supported.contains(LinkModes::ASYM_PAUSE)
            && !param.autoneg
            && param.rx_pause != param.tx_pause
        {
            return Err(PhylinkError::InvalidRequest);
        }

        let mut state = self.state.lock();
        let lc = &mut state.link_config;
        lc.pause.remove(Pause::AN | Pause::txrx());
        if param.autoneg {
            lc.pause.insert(Pause::AN);
        }
        if param.rx_pause {
            lc.pause.insert(Pause::RX);
        }
        if param.tx_pause {
            lc.pause.insert(Pause::TX);
        }

        if self.disabled().contains(DisableReason::STOPPED) {
            return Ok(());
        }
        match self.an_mode {
            AnMode::Phy => {
                // Force a fresh link up so the MAC is reprogrammed.
                let was_up = std::mem::replace(&mut state.carrier_ok, false);
                drop(state);
                if was_up {
                    self.carrier.trigger(Carrier::Off);
                }
                self.run_resolve();
            }
            AnMode::Fixed => {
                let cfg = lc.clone();
                resolve_flow(&cfg, lc);
                self.mac.mac_config(self.an_mode, lc);
            }
            AnMode::InBandSgmii | AnMode::InBand1000BaseX => {
                self.mac.mac_config(self.an_mode, lc);
                self.mac.mac_an_restart(self.an_mode);
            }
        }
        Ok(())
    }

    /// Restart negotiation on the PHY and the MAC.
    pub fn nway_reset(&self) -> PhylinkResult {
        let _config = self.config.lock();
        let ret = match self.phydev() {
            Some(phy) => phy.restart_aneg(),
            None => Ok(()),
        };
        if self.state.lock().link_config.an_enabled {
            self.mac.mac_an_restart(self.an_mode);
        }
        ret
    }

    /// Whether the MAC was last told the link is up.
    pub fn get_link(&self) -> bool {
        self.state.lock().carrier_ok
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::fwnode::PropNode;
    use crate::link_mode::*;
    use crate::mock::{MacCall, MockMac, MockPhy};
    use crate::phylink::PhylinkConfig;
    use crate::state::PhyInterface;

    fn phy_mode(mac: Arc<MockMac>) -> Arc<Phylink> {
        let cfg = PhylinkConfig {
            interface: PhyInterface::Rgmii,
            port: Port::Tp,
        };
        Phylink::new(&PropNode::new("eth0"), cfg, mac).unwrap()
    }

    fn fixed_1000(mac: Arc<MockMac>) -> Arc<Phylink> {
        let node = PropNode::new("eth0").with_cells("fixed-link", &[1, 1, 1000, 0, 0]);
        let cfg = PhylinkConfig {
            interface: PhyInterface::Rgmii,
            port: Port::Mii,
        };
        Phylink::new(&node, cfg, mac).unwrap()
    }

    fn inband(mac: Arc<MockMac>, interface: PhyInterface) -> Arc<Phylink> {
        let node = PropNode::new("eth0").with_str("managed", "in-band-status");
        let cfg = PhylinkConfig {
            interface,
            port: Port::Fibre,
        };
        Phylink::new(&node, cfg, mac).unwrap()
    }

    fn request(autoneg: Autoneg, speed: i32, duplex: Duplex) -> LinkKsettings {
        LinkKsettings {
            advertising: LinkModes::all(),
            speed,
            duplex,
            autoneg: autoneg as u8,
            ..Default::default()
        }
    }

    #[test]
    fn rejected_set_changes_nothing() {
        let mac = Arc::new(MockMac::new("eth0"));
        let pl = phy_mode(mac.clone());
        let phy = Arc::new(MockPhy::new(
            "phy0",
            0,
            LinkModes::BASE100T_FULL | LinkModes::BASE1000T_FULL | LinkModes::AUTONEG,
        ));
        pl.connect_phy(phy.clone()).unwrap();
        let before = pl.ksettings_get();

        let mut bad = request(Autoneg::Enable, SPEED_UNKNOWN, Duplex::Unknown);
        bad.autoneg = 7;
        assert_eq!(pl.ksettings_set(&bad), Err(PhylinkError::InvalidRequest));
        assert_eq!(
            pl.ksettings_set(&request(Autoneg::Disable, SPEED_10, Duplex::Half)),
            Err(PhylinkError::SettingNotRecognized)
        );
        let mut empty = request(Autoneg::Enable, SPEED_UNKNOWN, Duplex::Unknown);
        empty.advertising = LinkModes::AUTONEG | LinkModes::TP;
        assert_eq!(pl.ksettings_set(&empty), Err(PhylinkError::InvalidRequest));
        phy.set_fail_set(true);
        assert_eq!(
            pl.ksettings_set(&request(Autoneg::Disable, SPEED_100, Duplex::Full)),
            Err(PhylinkError::IoFailure)
        );

        assert_eq!(pl.ksettings_get(), before);
        assert!(phy.last_set().is_none());
        assert!(mac.take_calls().is_empty());
    }

    #[test]
    fn missing_setting_without_phy() {
        let mac = Arc::new(MockMac::new("eth0").with_allowed(
            LinkModes::BASE100T_FULL | LinkModes::BASE1000T_FULL | LinkModes::MII,
        ));
        let pl = phy_mode(mac);
        let before = pl.state.lock().link_config.clone();
        assert_eq!(
            pl.ksettings_set(&request(Autoneg::Disable, SPEED_10, Duplex::Half)),
            Err(PhylinkError::SettingNotRecognized)
        );
        assert_eq!(pl.state.lock().link_config, before);
    }

    #[test]
    fn set_then_get() {
        let mac = Arc::new(MockMac::new("eth0"));
        mac.set_inband(LinkState {
            link: true,
            speed: SPEED_100,
            duplex: Duplex::Full,
            ..Default::default()
        });
        let pl = inband(mac.clone(), PhyInterface::Sgmii);

        pl.ksettings_set(&request(Autoneg::Disable, SPEED_100, Duplex::Full))
            .unwrap();
        let lc = pl.state.lock().link_config.clone();
        assert_eq!(lc.speed, SPEED_100);
        assert_eq!(lc.duplex, Duplex::Full);
        assert!(!lc.an_enabled);
        assert!(!lc.advertising.contains(LinkModes::AUTONEG));
        let kset = pl.ksettings_get();
        assert_eq!(kset.speed, SPEED_100);
        assert_eq!(kset.duplex, Duplex::Full);
        assert_eq!(kset.autoneg, Autoneg::Disable as u8);
        assert!(kset.advertising.contains(LinkModes::FIBRE));
        // Stopped, so the MAC is left alone.
        assert!(mac.take_calls().is_empty());

        pl.start();
        pl.flush();
        mac.take_calls();
        pl.ksettings_set(&request(Autoneg::Enable, SPEED_UNKNOWN, Duplex::Unknown))
            .unwrap();
        let kset = pl.ksettings_get();
        assert_eq!(kset.autoneg, Autoneg::Enable as u8);
        assert!(kset.advertising.contains(LinkModes::AUTONEG));
        let calls = mac.take_calls();
        assert!(matches!(calls[0], MacCall::Config(AnMode::InBandSgmii, _)));
        assert_eq!(calls[1], MacCall::AnRestart);
    }

    #[test]
    fn fixed_link_is_frozen() {
        let mac = Arc::new(MockMac::new("eth0"));
        let pl = fixed_1000(mac.clone());
        let before = pl.ksettings_get();
        for req in [
            request(Autoneg::Enable, SPEED_UNKNOWN, Duplex::Unknown),
            request(Autoneg::Disable, SPEED_100, Duplex::Full),
            request(Autoneg::Disable, SPEED_1000, Duplex::Half),
            request(Autoneg::Disable, SPEED_10, Duplex::Half),
        ] {
            assert_eq!(pl.ksettings_set(&req), Err(PhylinkError::InvalidRequest));
            assert_eq!(pl.ksettings_get(), before);
        }
        assert_eq!(
            pl.ksettings_set(&request(Autoneg::Disable, SPEED_1000, Duplex::Full)),
            Ok(())
        );
        let kset = pl.ksettings_get();
        assert_eq!(kset.speed, SPEED_1000);
        assert_eq!(kset.duplex, Duplex::Full);
    }

    #[test]
    fn get_reports_configured_port_without_phy() {
        let mac = Arc::new(MockMac::new("eth0"));
        mac.set_inband(LinkState {
            link: true,
            speed: SPEED_1000,
            duplex: Duplex::Full,
            lp_advertising: LinkModes::BASE1000X_FULL,
            an_complete: true,
            ..Default::default()
        });
        let sgmii = inband(mac.clone(), PhyInterface::Sgmii).ksettings_get();
        assert_eq!(sgmii.port, Port::Fibre);
        assert_eq!(sgmii.speed, SPEED_1000);
        assert_eq!(sgmii.lp_advertising, LinkModes::BASE1000X_FULL);
        assert_eq!(sgmii.autoneg, Autoneg::Enable as u8);
        assert!(!sgmii.link);

        let basex = inband(mac, PhyInterface::Base1000X).ksettings_get();
        assert_eq!(basex.port, sgmii.port);
        assert_eq!(basex.speed, sgmii.speed);
        assert_eq!(basex.lp_advertising, sgmii.lp_advertising);
    }

    #[test]
    fn get_with_phy_uses_phy_values() {
        let mac = Arc::new(MockMac::new("eth0"));
        let pl = inband(mac, PhyInterface::Sgmii);
        let phy = Arc::new(MockPhy::new("phy0", 2, LinkModes::ethernet_basic()));
        pl.connect_phy(phy.clone()).unwrap();
        phy.link_change(true, SPEED_100, Duplex::Half, Pause::empty());
        let kset = pl.ksettings_get();
        assert_eq!(kset.port, Port::Tp);
        assert_eq!(kset.speed, SPEED_100);
        assert_eq!(kset.duplex, Duplex::Half);
        assert_eq!(kset.supported, LinkModes::ethernet_basic());
    }

    #[test]
    fn pause_parameters() {
        let mac = Arc::new(MockMac::new("eth0"));
        let pl = fixed_1000(mac.clone());
        assert_eq!(
            pl.pauseparam_get(),
            PauseParam {
                autoneg: true,
                rx_pause: false,
                tx_pause: false
            }
        );
        pl.start();
        pl.flush();
        mac.take_calls();

        let forced = PauseParam {
            autoneg: false,
            rx_pause: true,
            tx_pause: false,
        };
        pl.pauseparam_set(&forced).unwrap();
        assert_eq!(pl.pauseparam_get(), forced);
        match mac.take_calls().as_slice() {
            [MacCall::Config(AnMode::Fixed, state)] => {
                assert_eq!(state.pause & Pause::txrx(), Pause::RX)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pause_needs_support() {
        let mac = Arc::new(MockMac::new("eth0").with_allowed(
            LinkModes::ethernet_basic() | LinkModes::PAUSE | LinkModes::TP,
        ));
        let pl = phy_mode(mac);
        pl.connect_phy(Arc::new(MockPhy::new("phy0", 0, LinkModes::all())))
            .unwrap();
        assert_eq!(
            pl.supported(),
            LinkModes::ethernet_basic() | LinkModes::PAUSE | LinkModes::TP
        );
        let param = PauseParam {
            autoneg: false,
            rx_pause: true,
            tx_pause: false,
        };
        assert_eq!(pl.pauseparam_set(&param), Err(PhylinkError::InvalidRequest));
        let both = PauseParam {
            tx_pause: true,
            ..param
        };
        assert_eq!(pl.pauseparam_set(&both), Ok(()));

        let mac = Arc::new(MockMac::new("eth0").with_allowed(LinkModes::ethernet_basic()));
        let pl = phy_mode(mac);
        pl.connect_phy(Arc::new(MockPhy::new("phy0", 0, LinkModes::all())))
            .unwrap();
        assert_eq!(pl.pauseparam_set(&both), Err(PhylinkError::NotSupported));
    }

    #[test]
    fn pause_change_relinks_phy() {
        let mac = Arc::new(MockMac::new("eth0"));
        let pl = phy_mode(mac.clone());
        let phy = Arc::new(MockPhy::new("phy0", 0, LinkModes::all()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        pl.subscribe_carrier(Box::new(move |c| s.lock().unwrap().push(*c)), false);
        pl.connect_phy(phy.clone()).unwrap();
        pl.start();
        phy.link_change(true, SPEED_1000, Duplex::Full, Pause::SYM);
        pl.flush();
        assert!(pl.get_link());
        mac.take_calls();

        let param = PauseParam {
            autoneg: false,
            rx_pause: true,
            tx_pause: true,
        };
        pl.pauseparam_set(&param).unwrap();
        pl.flush();
        assert!(pl.get_link());
        let calls = mac.take_calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            MacCall::Config(AnMode::Phy, state) => {
                assert_eq!(state.pause & Pause::txrx(), Pause::txrx())
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(calls[1], MacCall::LinkUp);
        assert_eq!(
            *seen.lock().unwrap(),
            [Carrier::On, Carrier::Off, Carrier::On]
        );
    }

    #[test]
    fn nway_reset_restarts_both() {
        let mac = Arc::new(MockMac::new("eth0"));
        let pl = inband(mac.clone(), PhyInterface::Sgmii);
        let phy = Arc::new(MockPhy::new("phy0", 0, LinkModes::ethernet_basic()));
        pl.connect_phy(phy.clone()).unwrap();
        assert_eq!(pl.nway_reset(), Ok(()));
        assert_eq!(phy.events().last(), Some(&"restart_aneg"));
        assert_eq!(mac.take_calls(), [MacCall::AnRestart]);
    }
}
